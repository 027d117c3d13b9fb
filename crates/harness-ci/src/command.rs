//! External command definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happens to a child's stdout/stderr.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Collect output so it can be reported.
    #[default]
    Capture,

    /// Let the child write straight to the console.
    Stream,
}

/// One external command invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Human-readable name used in logs and errors.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,

    pub output: OutputMode,

    /// Directory to run in (inherits the harness cwd when `None`).
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command,
            timeout_secs: 0,
            output: OutputMode::Capture,
            working_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Shell-ish rendering for log lines and operator hints.
    pub fn display(&self) -> String {
        self.command.join(" ")
    }
}

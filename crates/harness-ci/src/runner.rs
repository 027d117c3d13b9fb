//! External command execution with timeouts.

use crate::command::{CommandSpec, OutputMode};
use crate::error::{ExecError, ExecResult};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Output of a command that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,

    /// Captured stdout (empty when streamed).
    pub stdout: String,

    /// Captured stderr (empty when streamed).
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether output went to the console instead of being captured.
    pub streamed: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stderr, or stdout when stderr is empty.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs a [`CommandSpec`] to completion.
pub struct CommandRunner;

impl CommandRunner {
    /// Execute a command and wait for it, honouring its timeout.
    ///
    /// On timeout the child is killed before `ExecError::Timeout` is
    /// returned.
    pub async fn execute(spec: &CommandSpec) -> ExecResult<CommandOutput> {
        let start = Instant::now();

        let Some((exe, args)) = spec.command.split_first() else {
            return Err(ExecError::EmptyCommand {
                name: spec.name.clone(),
            });
        };

        let mut cmd = Command::new(exe);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }
        match spec.output {
            OutputMode::Capture => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Stream => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
        }

        debug!(command = %spec.display(), timeout_secs = spec.timeout_secs, "Spawning command");

        let child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: exe.clone(),
            source,
        })?;

        // Dropping the child future on timeout kills the process.
        let output = if spec.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(spec.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ExecError::Timeout {
                name: spec.name.clone(),
                secs: spec.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(command = %spec.name, exit_code, duration_ms, "Command finished");

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
            streamed: spec.output == OutputMode::Stream,
        })
    }
}

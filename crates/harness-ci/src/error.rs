//! Errors raised while running external commands.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Command {name} is empty")]
    EmptyCommand { name: String },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command outlived its timeout and was killed.
    #[error("Command {name} timed out after {secs} seconds")]
    Timeout { name: String, secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }
}

/// Result type for command execution
pub type ExecResult<T> = std::result::Result<T, ExecError>;

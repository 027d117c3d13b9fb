//! Run-level error types.
//!
//! Every variant aborts the run. Per-input compile problems are not errors;
//! they are recorded as [`crate::OutcomeKind`] values and the batch goes on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// The backend failed to start; carries its diagnostic stream.
    #[error("Failed to start environment: {diagnostic}")]
    Bootstrap { diagnostic: String },

    /// The readiness endpoint never answered 200 before the deadline.
    #[error("Backend at {endpoint} did not become ready within {waited_secs}s")]
    ReadinessTimeout { endpoint: String, waited_secs: u64 },

    /// Discovery found nothing to compile.
    #[error("No test configurations found in {}", dir.display())]
    NoInputsFound { dir: PathBuf },

    #[error("Failed to scan {}: {source}", dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run interrupted")]
    Interrupted,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

//! Machine-readable record of a finished run.

use super::input::TestInput;
use super::outcome::TestOutcome;
use super::summary::RunSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

/// JSON report written after the batch has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    /// SHA-256 digest of the ordered input names (deterministic).
    pub suite_digest: String,

    pub outcomes: Vec<TestOutcome>,

    pub summary: RunSummary,

    /// Overall verdict, same rule as [`RunSummary::success`].
    pub success: bool,
}

impl RunReport {
    pub fn new(
        started_at: DateTime<Utc>,
        inputs: &[TestInput],
        outcomes: Vec<TestOutcome>,
    ) -> Self {
        let summary = RunSummary::from_outcomes(&outcomes);
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            suite_digest: compute_suite_digest(inputs),
            success: summary.success(),
            outcomes,
            summary,
        }
    }

    /// Serialize as pretty JSON into `path`.
    pub fn write_to(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Compute deterministic digest of ordered input names.
pub fn compute_suite_digest(inputs: &[TestInput]) -> String {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.name.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

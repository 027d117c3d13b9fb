//! Aggregate over a run's outcomes.

use super::outcome::TestOutcome;
use serde::{Deserialize, Serialize};

/// Characters of failure detail shown in the console summary.
pub const DETAIL_DISPLAY_CHARS: usize = 100;

/// Derived counts for a set of outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[TestOutcome]) -> Self {
        let passed = outcomes.iter().filter(|o| o.success).count();
        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
        }
    }

    /// A run passes only if something ran and nothing failed.
    pub fn success(&self) -> bool {
        self.total > 0 && self.failed == 0
    }
}

/// First [`DETAIL_DISPLAY_CHARS`] characters of `detail`, cut on a char
/// boundary.
pub fn truncate_detail(detail: &str) -> &str {
    match detail.char_indices().nth(DETAIL_DISPLAY_CHARS) {
        Some((idx, _)) => &detail[..idx],
        None => detail,
    }
}

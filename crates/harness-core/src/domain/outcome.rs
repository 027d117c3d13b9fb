//! Per-input compile outcomes.

use serde::{Deserialize, Serialize};

/// Detail recorded when a compile exceeds its timeout.
pub const TIMEOUT_DETAIL: &str = "Timeout";

/// How a single compile ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Compile command exited zero.
    Passed,

    /// Compile command exited non-zero.
    CompileFailed,

    /// Compile command exceeded its timeout and was killed.
    TimedOut,

    /// Compile command could not be run at all.
    InvocationError,
}

impl OutcomeKind {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeKind::Passed)
    }
}

/// Result of compiling one test input. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Name of the input this outcome belongs to.
    pub name: String,

    /// Whether the compile passed.
    pub success: bool,

    pub kind: OutcomeKind,

    /// Full diagnostic text; truncated only when rendered.
    pub detail: Option<String>,

    /// Wall-clock time spent on this input.
    pub duration_ms: u64,
}

impl TestOutcome {
    fn new(name: impl Into<String>, kind: OutcomeKind, detail: Option<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            success: kind.is_success(),
            kind,
            detail,
            duration_ms,
        }
    }

    pub fn passed(name: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(name, OutcomeKind::Passed, None, duration_ms)
    }

    pub fn compile_failed(name: impl Into<String>, detail: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(name, OutcomeKind::CompileFailed, Some(detail.into()), duration_ms)
    }

    pub fn timed_out(name: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(
            name,
            OutcomeKind::TimedOut,
            Some(TIMEOUT_DETAIL.to_string()),
            duration_ms,
        )
    }

    pub fn invocation_error(name: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(name, OutcomeKind::InvocationError, Some(error.into()), duration_ms)
    }
}

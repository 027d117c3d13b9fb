//! Compile Harness Core
//!
//! Shared building blocks for the compile harness:
//! - Domain model for test inputs, outcomes and run summaries
//! - Run-level error taxonomy
//! - Tracing initialisation for harness binaries

pub mod domain;
pub mod error;
pub mod telemetry;

pub use domain::input::TestInput;
pub use domain::outcome::{OutcomeKind, TestOutcome, TIMEOUT_DETAIL};
pub use domain::report::RunReport;
pub use domain::summary::{truncate_detail, RunSummary};
pub use error::{HarnessError, Result};
pub use telemetry::init_tracing;

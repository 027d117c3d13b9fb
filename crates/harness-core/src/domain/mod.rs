//! Domain model for a harness run.
//!
//! - `TestInput`: one declarative config file to validate
//! - `TestOutcome`: recorded result of compiling one input
//! - `RunSummary`: aggregate derived from all outcomes
//! - `RunReport`: machine-readable record of a finished run

pub mod input;
pub mod outcome;
pub mod report;
pub mod summary;

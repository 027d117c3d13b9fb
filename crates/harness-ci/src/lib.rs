//! Compile Harness CI - integration testing of declarative configs
//!
//! Provides a run orchestrator that:
//! - Brings up the containerized build backend and always tears it down
//! - Polls the backend until it is ready or a deadline passes
//! - Compiles every discovered test config with a per-input timeout
//! - Summarizes outcomes and decides the exit status

pub mod backend;
pub mod batch;
pub mod command;
pub mod config;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod fakes;
pub mod pipeline;
pub mod readiness;
pub mod report;
pub mod runner;

// Re-export key types
pub use backend::{BackendConfig, ComposeBackend};
pub use batch::{BatchCompiler, Compiler};
pub use command::{CommandSpec, OutputMode};
pub use config::HarnessConfig;
pub use discovery::{discover, DiscoveryConfig};
pub use environment::{with_environment, Environment, EnvironmentMode};
pub use error::ExecError;
pub use pipeline::{Orchestrator, PipelineResult};
pub use readiness::{wait_ready, HttpProber, Prober, ReadinessConfig};
pub use report::ReportAggregator;
pub use runner::{CommandOutput, CommandRunner};

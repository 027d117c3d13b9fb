//! Run orchestration: bootstrap, readiness, batch compile, report.

use crate::backend::ComposeBackend;
use crate::batch::{BatchCompiler, Compiler};
use crate::config::HarnessConfig;
use crate::discovery::discover;
use crate::environment::{with_environment, Environment, EnvironmentMode};
use crate::readiness::{wait_ready, HttpProber, Prober};
use crate::report::{self, ReportAggregator};
use chrono::Utc;
use harness_core::{HarnessError, Result, RunReport, RunSummary, TestInput, TestOutcome};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a run that got as far as compiling.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Inputs in the order they were compiled.
    pub inputs: Vec<TestInput>,

    /// One outcome per input.
    pub outcomes: Vec<TestOutcome>,

    pub summary: RunSummary,

    /// JSON report location, when one was written.
    pub report_path: Option<PathBuf>,
}

impl PipelineResult {
    pub fn success(&self) -> bool {
        self.summary.success()
    }

    /// Process exit code for this result.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// Drives one harness run from bootstrap to report.
pub struct Orchestrator {
    config: HarnessConfig,
    environment: Arc<dyn Environment>,
    prober: Arc<dyn Prober>,
    compiler: Arc<dyn Compiler>,
}

impl Orchestrator {
    pub fn new(
        config: HarnessConfig,
        environment: Arc<dyn Environment>,
        prober: Arc<dyn Prober>,
        compiler: Arc<dyn Compiler>,
    ) -> Self {
        Self {
            config,
            environment,
            prober,
            compiler,
        }
    }

    /// Orchestrator backed by Docker Compose and an HTTP readiness probe.
    pub fn compose(config: HarnessConfig) -> Result<Self> {
        let backend = Arc::new(ComposeBackend::new(
            config.backend.clone(),
            config.backend_dir(),
        ));
        let prober = Arc::new(HttpProber::new(&config.readiness)?);
        Ok(Self::new(config, backend.clone(), prober, backend))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every stage in order.
    ///
    /// Bootstrap and readiness failures abort the run with an error; compile
    /// failures end up in the returned result. The environment is released
    /// on every path. `shutdown` resolving aborts the run.
    pub async fn run<S>(&self, shutdown: S) -> Result<PipelineResult>
    where
        S: Future<Output = ()>,
    {
        self.config.validate()?;
        debug!(config = ?self.config, "Harness configuration");

        report::header(&mut io::stdout(), "Compile Harness Integration Test Suite")?;
        if matches!(self.config.mode, EnvironmentMode::Managed { .. }) {
            report::step(&mut io::stdout(), "Building and starting environment...")?;
        }

        with_environment(
            self.environment.as_ref(),
            self.config.mode,
            shutdown,
            || self.run_stages(),
        )
        .await
    }

    async fn run_stages(&self) -> Result<PipelineResult> {
        if matches!(self.config.mode, EnvironmentMode::Managed { .. }) {
            println!("✓ Environment started");
        }

        report::step(&mut io::stdout(), "Waiting for backend to be ready...")?;
        let readiness = &self.config.readiness;
        if !wait_ready(self.prober.as_ref(), readiness.deadline(), readiness.interval()).await {
            println!("✗ Backend did not become ready in time");
            self.show_logs().await;
            return Err(HarnessError::ReadinessTimeout {
                endpoint: self.prober.endpoint(),
                waited_secs: readiness.deadline_secs,
            });
        }
        println!("✓ Backend is ready");

        report::step(&mut io::stdout(), "Running Compilation Tests")?;
        let dir = self.config.inputs_dir();
        let inputs = discover(&self.config.discovery, &self.config.working_dir)?;
        info!(count = inputs.len(), dir = %dir.display(), "Discovered test inputs");

        let started_at = Utc::now();
        let outcomes = BatchCompiler::new(self.compiler.clone(), &dir)
            .run_all(&inputs)
            .await?;

        let summary = ReportAggregator::render(&mut io::stdout(), &outcomes)?;
        let report_path = self.write_report(RunReport::new(started_at, &inputs, outcomes.clone()));

        if !summary.success() {
            self.show_logs().await;
        }
        ReportAggregator::banner(&mut io::stdout(), summary.success())?;
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "Run finished"
        );

        Ok(PipelineResult {
            inputs,
            outcomes,
            summary,
            report_path,
        })
    }

    fn write_report(&self, run_report: RunReport) -> Option<PathBuf> {
        let path = self.config.report_json.as_ref()?;
        match run_report.write_to(path) {
            Ok(()) => {
                info!(path = %path.display(), run_id = %run_report.run_id, "Wrote run report");
                Some(path.clone())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write run report");
                None
            }
        }
    }

    async fn show_logs(&self) {
        let tail = self.config.log_tail_lines;
        match self.environment.logs(tail).await {
            Ok(logs) => {
                if let Err(e) = ReportAggregator::render_logs(&mut io::stdout(), tail, &logs) {
                    warn!(error = %e, "Failed to print backend logs");
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not retrieve backend logs");
                println!("Could not retrieve logs: {e}");
            }
        }
    }
}

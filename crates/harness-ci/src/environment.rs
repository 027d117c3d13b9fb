//! Backend environment lifecycle and scoped teardown.
//!
//! [`with_environment`] starts the environment, runs a body against it and
//! releases the environment exactly once afterwards, whatever the body did:
//! returned an error, panicked, or was cut short by the shutdown signal.

use crate::error::ExecResult;
use async_trait::async_trait;
use futures::FutureExt;
use harness_core::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{info, warn};

/// A runtime environment hosting the build backend.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Build and launch the backend services.
    async fn start(&self) -> Result<()>;

    /// Tear the backend down. Callers treat failures as warnings.
    async fn stop(&self) -> ExecResult<()>;

    /// Last `tail` lines of the backend service log.
    async fn logs(&self, tail: usize) -> ExecResult<String>;

    /// Command an operator can run to tear the environment down by hand.
    fn teardown_hint(&self) -> String;
}

/// How the harness owns the environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum EnvironmentMode {
    /// Start the environment and tear it down at the end unless
    /// `keep_running` is set.
    Managed { keep_running: bool },

    /// Use an environment someone else started; never start or stop it.
    Attached,
}

impl Default for EnvironmentMode {
    fn default() -> Self {
        EnvironmentMode::Managed {
            keep_running: false,
        }
    }
}

/// Run `body` inside a started environment and release it afterwards.
///
/// `stop()` runs exactly once in `Managed { keep_running: false }` mode,
/// including when `start()` fails, and zero times otherwise. When
/// `shutdown` resolves first the body is dropped and the run ends with
/// [`HarnessError::Interrupted`]. Panics in the body are re-raised after
/// teardown.
pub async fn with_environment<E, F, Fut, S, T>(
    env: &E,
    mode: EnvironmentMode,
    shutdown: S,
    body: F,
) -> Result<T>
where
    E: Environment + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: Future<Output = ()>,
{
    let guarded = async {
        if matches!(mode, EnvironmentMode::Managed { .. }) {
            env.start().await?;
        }
        body().await
    };

    let outcome = AssertUnwindSafe(async {
        tokio::select! {
            result = guarded => result,
            _ = shutdown => {
                warn!("Shutdown requested, aborting run");
                Err(HarnessError::Interrupted)
            }
        }
    })
    .catch_unwind()
    .await;

    release(env, mode).await;

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

async fn release<E: Environment + ?Sized>(env: &E, mode: EnvironmentMode) {
    match mode {
        EnvironmentMode::Managed {
            keep_running: false,
        } => {
            println!("\nCleaning up environment...");
            match env.stop().await {
                Ok(()) => {
                    info!("Environment stopped");
                    println!("✓ Cleanup complete");
                }
                Err(e) => {
                    warn!(error = %e, "Environment teardown failed");
                    println!("Warning: Cleanup failed: {e}");
                }
            }
        }
        EnvironmentMode::Managed { keep_running: true } => {
            info!("Leaving environment running");
            println!("\nNote: Environment is still running (KEEP_RUNNING=true)");
            println!("To stop it manually, run: {}", env.teardown_hint());
        }
        EnvironmentMode::Attached => {}
    }
}

//! Readiness probing for the build backend.
//!
//! [`wait_ready`] polls a [`Prober`] on a fixed interval until it reports
//! ready or the deadline passes. Probe failures only mean "not yet".

use async_trait::async_trait;
use harness_core::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Readiness probe settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub host: String,

    pub port: u16,

    /// Give up after this many seconds.
    pub deadline_secs: u64,

    /// Sleep between attempts.
    pub interval_secs: u64,

    /// Network timeout of a single attempt.
    pub attempt_timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6052,
            deadline_secs: 60,
            interval_secs: 2,
            attempt_timeout_secs: 2,
        }
    }
}

impl ReadinessConfig {
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// A single liveness check.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `true` when the backend answered healthy.
    async fn probe(&self) -> bool;

    /// Human-readable address of what is probed.
    fn endpoint(&self) -> String;
}

/// Probes an HTTP endpoint; healthy means status 200.
pub struct HttpProber {
    url: String,
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(config: &ReadinessConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.attempt_timeout_secs))
            .user_agent(concat!("compile-harness/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(|e| HarnessError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: config.endpoint(),
            client,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Probe answered");
                response.status() == reqwest::StatusCode::OK
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Probe failed");
                false
            }
        }
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// Poll `prober` every `interval` until it succeeds or `deadline` elapses.
///
/// Returns as soon as a probe succeeds. A probe is never started once the
/// deadline has passed, so a never-ready backend is given up on within one
/// interval after the deadline.
pub async fn wait_ready<P>(prober: &P, deadline: Duration, interval: Duration) -> bool
where
    P: Prober + ?Sized,
{
    info!(endpoint = %prober.endpoint(), deadline_secs = deadline.as_secs(), "Waiting for backend");
    let start = Instant::now();
    let mut attempts = 0u32;

    while start.elapsed() < deadline {
        attempts += 1;
        if prober.probe().await {
            info!(attempts, elapsed_ms = start.elapsed().as_millis() as u64, "Backend is ready");
            return true;
        }

        tokio::time::sleep(interval).await;
        println!("  Still waiting...");
    }

    warn!(attempts, "Backend did not become ready in time");
    false
}

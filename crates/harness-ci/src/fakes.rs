//! Scripted test doubles for the harness seams.
//!
//! Provides `FakeEnvironment`, `ScriptedProber` and `ScriptedCompiler`,
//! which satisfy the trait contracts without Docker, a network or a real
//! compiler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use harness_core::{HarnessError, Result, TestInput};

use crate::batch::Compiler;
use crate::environment::Environment;
use crate::error::{ExecError, ExecResult};
use crate::readiness::Prober;
use crate::runner::CommandOutput;

// ---------------------------------------------------------------------------
// FakeEnvironment
// ---------------------------------------------------------------------------

/// Environment that counts lifecycle calls.
#[derive(Debug, Default)]
pub struct FakeEnvironment {
    start_error: Option<String>,
    stop_fails: bool,
    logs: String,
    starts: AtomicUsize,
    stops: AtomicUsize,
    log_requests: AtomicUsize,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment whose `start()` fails with `diagnostic`.
    pub fn failing_start(diagnostic: &str) -> Self {
        Self {
            start_error: Some(diagnostic.to_string()),
            ..Self::default()
        }
    }

    pub fn with_failing_stop(mut self) -> Self {
        self.stop_fails = true;
        self
    }

    pub fn with_logs(mut self, logs: &str) -> Self {
        self.logs = logs.to_string();
        self
    }

    pub fn start_calls(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Environment for FakeEnvironment {
    async fn start(&self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        match &self.start_error {
            Some(diagnostic) => Err(HarnessError::Bootstrap {
                diagnostic: diagnostic.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn stop(&self) -> ExecResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.stop_fails {
            return Err(ExecError::Io(std::io::Error::other("compose down failed")));
        }
        Ok(())
    }

    async fn logs(&self, _tail: usize) -> ExecResult<String> {
        self.log_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.logs.clone())
    }

    fn teardown_hint(&self) -> String {
        "fake down".to_string()
    }
}

// ---------------------------------------------------------------------------
// ScriptedProber
// ---------------------------------------------------------------------------

/// Prober that turns ready on a given attempt (1-based), or never.
#[derive(Debug)]
pub struct ScriptedProber {
    ready_on: Option<usize>,
    attempts: AtomicUsize,
}

impl ScriptedProber {
    pub fn never_ready() -> Self {
        Self {
            ready_on: None,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn ready_on(attempt: usize) -> Self {
        Self {
            ready_on: Some(attempt),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.ready_on.is_some_and(|n| attempt >= n)
    }

    fn endpoint(&self) -> String {
        "scripted://backend".to_string()
    }
}

// ---------------------------------------------------------------------------
// ScriptedCompiler
// ---------------------------------------------------------------------------

/// Scripted result of compiling one input.
#[derive(Debug, Clone)]
pub enum Script {
    Exit { code: i32, stderr: String },
    Streamed { code: i32 },
    Timeout { secs: u64 },
    SpawnError(String),
    /// Sleep this long before exiting zero.
    Slow(Duration),
}

impl Script {
    pub fn ok() -> Self {
        Script::Exit {
            code: 0,
            stderr: String::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Script::Exit {
            code,
            stderr: stderr.to_string(),
        }
    }
}

/// Compiler answering from a per-input script; unscripted inputs pass.
#[derive(Debug, Default)]
pub struct ScriptedCompiler {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    /// Input names in the order they were compiled.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Compiler for ScriptedCompiler {
    async fn compile(&self, input: &TestInput) -> ExecResult<CommandOutput> {
        self.calls.lock().unwrap().push(input.name.clone());
        match self.scripts.get(&input.name).cloned().unwrap_or_else(Script::ok) {
            Script::Exit { code, stderr } => Ok(CommandOutput {
                exit_code: code,
                stderr,
                ..Default::default()
            }),
            Script::Streamed { code } => Ok(CommandOutput {
                exit_code: code,
                streamed: true,
                ..Default::default()
            }),
            Script::Timeout { secs } => Err(ExecError::Timeout {
                name: input.name.clone(),
                secs,
            }),
            Script::SpawnError(message) => Err(ExecError::Spawn {
                program: "compile".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            }),
            Script::Slow(duration) => {
                tokio::time::sleep(duration).await;
                Ok(CommandOutput::default())
            }
        }
    }
}

//! Sequential compilation of every discovered test input.

use crate::error::ExecResult;
use crate::runner::CommandOutput;
use async_trait::async_trait;
use harness_core::{HarnessError, Result, TestInput, TestOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Detail recorded for a streamed compile that failed.
pub const STREAMED_FAILURE_DETAIL: &str = "See output above";

/// Characters of stderr echoed right after a captured compile fails.
const STDERR_ECHO_CHARS: usize = 500;

/// Compiles a single input against the backend.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, input: &TestInput) -> ExecResult<CommandOutput>;
}

/// Runs the compiler over a batch of inputs, one at a time.
pub struct BatchCompiler {
    compiler: Arc<dyn Compiler>,
    source_dir: PathBuf,
}

impl BatchCompiler {
    /// `source_dir` is where the inputs were discovered; it is named in the
    /// empty-suite error.
    pub fn new(compiler: Arc<dyn Compiler>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            source_dir: source_dir.into(),
        }
    }

    /// Compile every input in order and record one outcome per input.
    ///
    /// A failing input never stops the batch. An empty input set is an
    /// error, not a passing batch.
    pub async fn run_all(&self, inputs: &[TestInput]) -> Result<Vec<TestOutcome>> {
        if inputs.is_empty() {
            return Err(HarnessError::NoInputsFound {
                dir: self.source_dir.clone(),
            });
        }

        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            println!("\nTesting: {}", input.name);
            println!("{}", "-".repeat(70));
            info!(input = %input.name, "Compiling");

            let start = Instant::now();
            let result = self.compiler.compile(input).await;
            let outcome = classify(input, result, start.elapsed().as_millis() as u64);
            announce(&outcome);
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

/// Map a compile invocation result onto exactly one outcome.
pub fn classify(input: &TestInput, result: ExecResult<CommandOutput>, elapsed_ms: u64) -> TestOutcome {
    match result {
        Ok(output) if output.success() => TestOutcome::passed(&input.name, elapsed_ms),
        Ok(output) if output.streamed => {
            TestOutcome::compile_failed(&input.name, STREAMED_FAILURE_DETAIL, elapsed_ms)
        }
        Ok(output) => {
            let diagnostic = output.diagnostic();
            if !diagnostic.is_empty() {
                println!("Error output:\n{}", tail_chars(diagnostic, STDERR_ECHO_CHARS));
            }
            TestOutcome::compile_failed(&input.name, diagnostic.trim_end(), elapsed_ms)
        }
        Err(e) if e.is_timeout() => TestOutcome::timed_out(&input.name, elapsed_ms),
        Err(e) => TestOutcome::invocation_error(&input.name, e.to_string(), elapsed_ms),
    }
}

fn announce(outcome: &TestOutcome) {
    use harness_core::OutcomeKind;

    match outcome.kind {
        OutcomeKind::Passed => {
            info!(input = %outcome.name, duration_ms = outcome.duration_ms, "Compiled");
            println!("✓ {} compiled successfully", outcome.name);
        }
        OutcomeKind::CompileFailed => {
            warn!(input = %outcome.name, "Compile failed");
            println!("✗ {} failed to compile", outcome.name);
        }
        OutcomeKind::TimedOut => {
            warn!(input = %outcome.name, duration_ms = outcome.duration_ms, "Compile timed out");
            println!("✗ {} compilation timed out", outcome.name);
        }
        OutcomeKind::InvocationError => {
            let detail = outcome.detail.as_deref().unwrap_or_default();
            warn!(input = %outcome.name, error = %detail, "Compile could not run");
            println!("✗ {} error: {}", outcome.name, detail);
        }
    }
}

/// Last `n` characters of `text`.
fn tail_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }
    match text.char_indices().nth(count - n) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{Script, ScriptedCompiler};
    use harness_core::{OutcomeKind, RunSummary};
    use std::time::Duration;

    fn inputs(names: &[&str]) -> Vec<TestInput> {
        names
            .iter()
            .map(|n| TestInput::new(*n, format!("test_configs/{n}")))
            .collect()
    }

    fn batch_with(compiler: ScriptedCompiler) -> (Arc<ScriptedCompiler>, BatchCompiler) {
        let compiler = Arc::new(compiler);
        let batch = BatchCompiler::new(compiler.clone(), "test_configs");
        (compiler, batch)
    }

    #[tokio::test]
    async fn test_mixed_batch_records_every_outcome() {
        let (_, batch) = batch_with(ScriptedCompiler::new().with("b.yaml", Script::fail(1, "syntax error")));

        let outcomes = batch.run_all(&inputs(&["a.yaml", "b.yaml"])).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "a.yaml");
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].detail, None);
        assert_eq!(outcomes[1].name, "b.yaml");
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].detail.as_deref(), Some("syntax error"));

        let summary = RunSummary::from_outcomes(&outcomes);
        assert_eq!((summary.total, summary.passed, summary.failed), (2, 1, 1));
        assert!(!summary.success());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_batch() {
        let (compiler, batch) = batch_with(
            ScriptedCompiler::new()
                .with("a.yaml", Script::Timeout { secs: 900 })
                .with("b.yaml", Script::SpawnError("docker not found".to_string()))
                .with("c.yaml", Script::fail(2, "bad pin")),
        );

        let outcomes = batch
            .run_all(&inputs(&["a.yaml", "b.yaml", "c.yaml", "d.yaml"]))
            .await
            .unwrap();

        assert_eq!(compiler.calls(), vec!["a.yaml", "b.yaml", "c.yaml", "d.yaml"]);
        let kinds: Vec<_> = outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OutcomeKind::TimedOut,
                OutcomeKind::InvocationError,
                OutcomeKind::CompileFailed,
                OutcomeKind::Passed,
            ]
        );
        assert_eq!(outcomes[0].detail.as_deref(), Some("Timeout"));
        assert!(outcomes[1].detail.as_deref().unwrap().contains("docker not found"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let (compiler, batch) = batch_with(ScriptedCompiler::new());
        let err = batch.run_all(&[]).await.unwrap_err();
        assert!(matches!(err, HarnessError::NoInputsFound { .. }));
        assert!(err.to_string().contains("No test configurations found"));
        assert!(compiler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_streamed_failure_detail() {
        let (_, batch) = batch_with(ScriptedCompiler::new().with("a.yaml", Script::Streamed { code: 1 }));
        let outcomes = batch.run_all(&inputs(&["a.yaml"])).await.unwrap();
        assert_eq!(outcomes[0].detail.as_deref(), Some(STREAMED_FAILURE_DETAIL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_is_recorded() {
        let (_, batch) = batch_with(
            ScriptedCompiler::new().with("a.yaml", Script::Slow(Duration::from_secs(3))),
        );
        let outcomes = batch.run_all(&inputs(&["a.yaml"])).await.unwrap();
        assert!(outcomes[0].success);
        assert!(outcomes[0].duration_ms >= 3_000);
    }

    #[test]
    fn test_classify_uses_stdout_when_stderr_empty() {
        let input = TestInput::new("a.yaml", "a.yaml");
        let output = CommandOutput {
            exit_code: 1,
            stdout: "Failed config\n".to_string(),
            ..Default::default()
        };
        let outcome = classify(&input, Ok(output), 5);
        assert_eq!(outcome.detail.as_deref(), Some("Failed config"));
        assert_eq!(outcome.duration_ms, 5);
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("ab", 3), "ab");
        assert_eq!(tail_chars("ééé", 2), "éé");
    }
}

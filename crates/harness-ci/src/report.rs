//! Console rendering of run results.

use harness_core::{truncate_detail, RunSummary, TestOutcome};
use std::io::{self, Write};

const RULE_WIDTH: usize = 70;

/// Summarizes outcomes and writes the human-readable report.
pub struct ReportAggregator;

impl ReportAggregator {
    pub fn summarize(outcomes: &[TestOutcome]) -> RunSummary {
        RunSummary::from_outcomes(outcomes)
    }

    /// Write counts and a truncated detail line per failure.
    pub fn render<W: Write>(out: &mut W, outcomes: &[TestOutcome]) -> io::Result<RunSummary> {
        let summary = Self::summarize(outcomes);

        header(out, "Test Summary")?;
        writeln!(out, "Total: {} tests", summary.total)?;
        writeln!(out, "✓ Passed: {}", summary.passed)?;
        writeln!(out, "✗ Failed: {}", summary.failed)?;

        if summary.failed > 0 {
            writeln!(out, "\nFailed tests:")?;
            for outcome in outcomes.iter().filter(|o| !o.success) {
                writeln!(out, "  - {}", outcome.name)?;
                if let Some(detail) = outcome.detail.as_deref().filter(|d| !d.is_empty()) {
                    writeln!(out, "    Error: {}...", truncate_detail(detail))?;
                }
            }
        }

        Ok(summary)
    }

    /// Final verdict banner.
    pub fn banner<W: Write>(out: &mut W, success: bool) -> io::Result<()> {
        let verdict = if success { "PASSED" } else { "FAILED" };
        header(out, &format!("Integration Test Suite: {verdict}"))
    }

    /// Backend log tail shown after a failure.
    pub fn render_logs<W: Write>(out: &mut W, tail: usize, logs: &str) -> io::Result<()> {
        writeln!(out, "\nBackend logs (last {tail} lines):")?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(out, "{}", logs.trim_end())
    }
}

/// Section header framed by `=` rules.
pub fn header<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "\n{rule}\n{message}\n{rule}\n")
}

/// Step title underlined with `-`.
pub fn step<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "\n{message}\n{}", "-".repeat(RULE_WIDTH))
}

//! Console report.
//!
//! Status lines go through `tracing`; the delimited trace and debug blocks and the
//! summary table are written verbatim to the wrapped writer.

use std::io::{self, Write};

use crate::collector::Provider;
use crate::harness::{RunSummary, TestResult};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

const RULE_WIDTH: usize = 120;
const DESCRIPTION_WIDTH: usize = 35;
const ERROR_WIDTH: usize = 15;
const ELLIPSIS: &str = "...";

/// Shorten `text` to fit `width` characters, ending in `...` when cut.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Renders test outcomes for one run.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    provider: Provider,
    debug: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, provider: Provider, debug: bool) -> Self {
        Self {
            out,
            provider,
            debug,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Log the status line and, where applicable, the trace and debug blocks.
    pub fn test_finished(&mut self, result: &TestResult) -> io::Result<()> {
        let name = &result.case.name;
        if result.passed {
            tracing::info!(
                "Test PASSED: {} (duration: {:?}, metrics: {})",
                name,
                result.duration,
                result.metrics_count
            );
        } else {
            let error = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no metrics collected".to_string());
            tracing::info!(
                "Test FAILED: {} (duration: {:?}, error: {})",
                name,
                result.duration,
                error
            );
            writeln!(self.out, "\n=== FAILED TEST TRACE: {} ===", name)?;
            writeln!(self.out, "{}", result.trace)?;
            writeln!(self.out, "=== END TRACE ===\n")?;
        }

        if self.debug && !result.metrics.is_empty() {
            writeln!(self.out, "\n=== DEBUG METRICS: {} ===", name)?;
            for (i, metric) in result.metrics.iter().enumerate() {
                if i > 0 {
                    writeln!(self.out, "---")?;
                }
                writeln!(self.out, "Metric: {}", metric.desc)?;
                write!(self.out, "{}", metric)?;
            }
            writeln!(self.out, "=== END DEBUG METRICS ===\n")?;
        }
        Ok(())
    }

    /// Print the results table and aggregate footer.
    pub fn summary_table(&mut self, results: &[TestResult]) -> io::Result<RunSummary> {
        let summary = RunSummary::from_results(results);
        let rule = "=".repeat(RULE_WIDTH);
        let divider = "-".repeat(RULE_WIDTH);

        writeln!(self.out, "\n{}", rule)?;
        writeln!(
            self.out,
            "{:<25} {:<35} {:<8} {:<12} {:<10} {:<15}",
            "TEST NAME", "DESCRIPTION", "STATUS", "DURATION", "METRICS", "ERROR"
        )?;
        writeln!(self.out, "{}", divider)?;

        for result in results {
            let (color, status) = if result.passed {
                (GREEN, "PASS")
            } else {
                (RED, "FAIL")
            };
            let error = result
                .error
                .as_ref()
                .map(|e| truncate(&e.to_string(), ERROR_WIDTH))
                .unwrap_or_default();
            writeln!(
                self.out,
                "{:<25} {:<35} {}{:<8}{} {:<12} {:<10} {:<15}",
                result.case.name,
                truncate(&result.case.description, DESCRIPTION_WIDTH),
                color,
                status,
                RESET,
                format!("{:?}", result.duration),
                result.metrics_count,
                error
            )?;
        }

        writeln!(self.out, "{}", divider)?;
        writeln!(
            self.out,
            "SUMMARY: {} PASSED, {} FAILED, {} TOTAL",
            summary.passed, summary.failed, summary.total
        )?;
        writeln!(self.out, "TOTAL DURATION: {:?}", summary.total_duration)?;
        writeln!(self.out, "IMPLEMENTATION: {}", self.provider)?;
        writeln!(self.out, "{}", rule)?;
        self.out.flush()?;
        Ok(summary)
    }
}

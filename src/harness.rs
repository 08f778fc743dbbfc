//! Self-test harness.
//!
//! Runs every registered collector once against a target, drains what it
//! emits, classifies the outcome and renders a report.
//!
//! # Architecture
//!
//! - [`TestRunner`]: Executes, converts and drains one test case at a time
//! - [`Reporter`]: Per-test status lines, trace/debug blocks and the summary table
//! - [`RunSummary`]: Aggregate counts behind the summary line and exit status

mod report;
mod runner;
mod summary;

pub use report::Reporter;
pub use runner::{MetricSummary, RunOptions, TestError, TestResult, TestRunner};
pub use summary::RunSummary;

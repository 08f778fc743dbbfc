//! Aggregate outcome of a run.

use std::process::ExitCode;
use std::time::Duration;

use crate::harness::TestResult;

/// Pass/fail counts and cumulative duration, derived from the result list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub total_duration: Duration,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            if result.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            summary.total += 1;
            summary.total_duration += result.duration;
            summary
        })
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Non-zero iff any test failed.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

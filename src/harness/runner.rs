//! Per-test orchestration: execute, convert, drain, classify.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::collector::{CollectError, Provider, TestCase};
use crate::executor::{CommandExecutor, Invocation};
use crate::harness::{Reporter, RunSummary};
use crate::metric::Desc;
use crate::sink::{self, DEFAULT_SINK_CAPACITY};

/// Why a test did not pass, beyond a zero-metric yield.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestError {
    /// The collector signalled a failure.
    #[error("{0}")]
    Collect(#[from] CollectError),

    /// The collector reported a different count than it pushed.
    #[error("collector reported {reported} metrics but {drained} were drained")]
    DrainMismatch { reported: usize, drained: usize },

    /// The conversion task panicked or was cancelled.
    #[error("collector task failed: {0}")]
    Panicked(String),
}

/// Run-wide settings fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub provider: Provider,
    /// Capture descriptor details and a raw output sample for every metric.
    pub debug: bool,
    pub sink_capacity: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            debug: false,
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

/// Structural view of one drained metric, captured in debug mode.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub desc: Arc<Desc>,
    pub command: String,
    pub args: Vec<String>,
    /// Rendered result of re-running the command.
    pub raw_output: String,
}

impl MetricSummary {
    pub fn name(&self) -> &str {
        self.desc.fq_name()
    }

    pub fn help(&self) -> &str {
        self.desc.help()
    }

    pub fn labels(&self) -> &[String] {
        self.desc.variable_labels()
    }
}

impl fmt::Display for MetricSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Metric Name: {}", self.name())?;
        writeln!(f, "Description: {}", self.help())?;
        if !self.labels().is_empty() {
            writeln!(f, "Available Labels: {}", self.desc.label_list())?;
        }
        writeln!(f, "IPMI Command Output:")?;
        writeln!(f, "  Command: {}", self.command)?;
        writeln!(f, "  Args: {:?}", self.args)?;
        writeln!(f, "  Raw Output: {}", self.raw_output)
    }
}

/// Outcome of one test case.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub case: TestCase,
    /// `error.is_none() && metrics_count > 0`.
    pub passed: bool,
    pub duration: Duration,
    pub error: Option<TestError>,
    pub trace: String,
    pub metrics_count: usize,
    /// Empty unless debug mode is on.
    pub metrics: Vec<MetricSummary>,
}

/// Runs test cases one at a time and keeps their results.
pub struct TestRunner {
    executor: Arc<dyn CommandExecutor>,
    options: RunOptions,
    results: Vec<TestResult>,
}

impl TestRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>, options: RunOptions) -> Self {
        Self {
            executor,
            options,
            results: Vec::new(),
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results)
    }

    /// Execute, convert and drain a single test case.
    ///
    /// Conversion runs on the blocking pool while this task drains the sink, so
    /// the sink capacity never bounds how many metrics a collector may emit.
    pub async fn run_test(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();
        tracing::info!(test = %case.name, description = %case.description, "Running test");

        let invocation = Invocation::for_collector(case.collector.as_ref(), &case.target);
        let output = self.executor.execute(&invocation).await;

        let (sink, mut receiver) = sink::channel(self.options.sink_capacity);
        let collector = Arc::clone(&case.collector);
        let target = case.target.clone();
        let producer =
            tokio::task::spawn_blocking(move || collector.convert(output, &sink, &target));

        let debug = self.options.debug;
        let mut descs: Vec<Arc<Desc>> = Vec::new();
        let drained = receiver
            .drain_with(|metric| {
                if debug {
                    descs.push(Arc::clone(metric.desc()));
                }
            })
            .await;

        let outcome = match producer.await {
            Ok(Ok(reported)) if reported == drained => Ok(reported),
            Ok(Ok(reported)) => Err(TestError::DrainMismatch { reported, drained }),
            Ok(Err(e)) => Err(TestError::Collect(e)),
            Err(e) => Err(TestError::Panicked(e.to_string())),
        };

        let (metrics_count, error) = match outcome {
            Ok(count) => (count, None),
            Err(e) => {
                tracing::debug!(test = %case.name, drained, "Abandoning drained metrics");
                descs.clear();
                (0, Some(e))
            }
        };

        let trace = match &error {
            None => format!("Command: {}\nMetrics collected: {}", invocation, metrics_count),
            Some(e) => format!("Command: {}\nCollection failed: {}", invocation, e),
        };

        let metrics = if descs.is_empty() {
            Vec::new()
        } else {
            // one best-effort sample shared by every metric of this test
            let raw_output = self.executor.execute(&invocation).await.to_string();
            descs
                .into_iter()
                .map(|desc| MetricSummary {
                    desc,
                    command: invocation.command().to_string(),
                    args: invocation.display_args(),
                    raw_output: raw_output.clone(),
                })
                .collect()
        };

        TestResult {
            case: case.clone(),
            passed: error.is_none() && metrics_count > 0,
            duration: start.elapsed(),
            error,
            trace,
            metrics_count,
            metrics,
        }
    }

    /// Run every case in order, reporting each result as soon as it is known.
    pub async fn run_all<W: std::io::Write>(
        &mut self,
        cases: &[TestCase],
        reporter: &mut Reporter<W>,
    ) -> std::io::Result<RunSummary> {
        tracing::info!(
            total = cases.len(),
            provider = %self.options.provider,
            "Starting IPMI test suite"
        );
        for case in cases {
            let result = self.run_test(case).await;
            reporter.test_finished(&result)?;
            self.results.push(result);
        }
        Ok(self.summary())
    }
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("options", &self.options)
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::collector::{Collector, CollectorName, Target};
    use crate::executor::ExecutionResult;
    use crate::metric::Metric;
    use crate::sink::MetricSink;

    struct EchoExecutor;

    #[async_trait]
    impl CommandExecutor for EchoExecutor {
        async fn execute(&self, invocation: &Invocation) -> ExecutionResult {
            ExecutionResult::completed(invocation.command())
        }
    }

    /// Pushes `push` metrics but reports `report`.
    struct Lying {
        push: usize,
        report: usize,
    }

    impl Collector for Lying {
        fn name(&self) -> CollectorName {
            CollectorName::Bmc
        }

        fn provider(&self) -> Provider {
            Provider::FreeIpmi
        }

        fn command(&self) -> &'static str {
            "lying"
        }

        fn arguments(&self) -> Vec<String> {
            Vec::new()
        }

        fn convert(
            &self,
            _result: ExecutionResult,
            sink: &MetricSink,
            _target: &Target,
        ) -> Result<usize, CollectError> {
            let desc = Arc::new(Desc::new("ipmi_lying", "Lies about its count.", &["id"]));
            for i in 0..self.push {
                sink.push(Metric::gauge(&desc, i as f64, &[i.to_string().as_str()]))?;
            }
            Ok(self.report)
        }
    }

    fn case(collector: impl Collector) -> TestCase {
        TestCase {
            name: "lying".to_string(),
            description: "Lying collector".to_string(),
            collector: Arc::new(collector),
            target: Target::local(),
            module: "default".to_string(),
            expected: "nothing".to_string(),
        }
    }

    fn runner(debug: bool) -> TestRunner {
        let options = RunOptions {
            debug,
            sink_capacity: 1,
            ..Default::default()
        };
        TestRunner::new(Arc::new(EchoExecutor), options)
    }

    #[tokio::test]
    async fn test_count_mismatch_fails() {
        let result = runner(false).run_test(&case(Lying { push: 3, report: 2 })).await;
        assert!(!result.passed);
        assert_eq!(result.metrics_count, 0);
        assert_eq!(
            result.error,
            Some(TestError::DrainMismatch {
                reported: 2,
                drained: 3
            })
        );
        assert!(result.trace.contains("Collection failed"));
    }

    #[tokio::test]
    async fn test_debug_captures_one_summary_per_metric() {
        let result = runner(true).run_test(&case(Lying { push: 4, report: 4 })).await;
        assert!(result.passed);
        assert_eq!(result.metrics.len(), 4);
        let summary = &result.metrics[0];
        assert_eq!(summary.name(), "ipmi_lying");
        assert_eq!(summary.command, "lying");
        assert!(summary.raw_output.contains("success: true"));
        assert!(summary.to_string().contains("Available Labels: {id}"));
    }

    #[tokio::test]
    async fn test_trace_names_command() {
        let result = runner(false).run_test(&case(Lying { push: 1, report: 1 })).await;
        assert!(result.passed);
        assert!(result.metrics.is_empty());
        assert_eq!(result.trace, "Command: lying []\nMetrics collected: 1");
    }
}

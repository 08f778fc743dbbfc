//! IPMI Harness - Collector Self-Test Library
//!
//! This crate runs every IPMI collector once against a target, drains the
//! metrics it emits and reports a pass/fail verdict per collector. It can be
//! used as a library, or run as the standalone `ipmi-harness` binary.
//!
//! # Architecture
//!
//! - **Executor**: Runs provider commands (FreeIPMI or ipmitool) with a timeout
//! - **Collectors**: Turn provider output into metrics pushed onto a bounded sink
//! - **Harness**: Orchestrates, classifies and reports the self-test run
//! - **Config**: YAML module configuration describing how to reach a BMC
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ipmi_harness::{
//!     CollectorRegistry, ProcessExecutor, Provider, Reporter, RunOptions, Target, TestRunner,
//! };
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let registry = CollectorRegistry::new(Provider::FreeIpmi);
//!     let cases = registry.test_cases(&Target::local(), "default");
//!
//!     let executor = Arc::new(ProcessExecutor::default());
//!     let mut runner = TestRunner::new(executor, RunOptions::default());
//!     let mut reporter = Reporter::new(std::io::stdout(), Provider::FreeIpmi, false);
//!     runner.run_all(&cases, &mut reporter).await?;
//!     reporter.summary_table(runner.results())?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod executor;
pub mod harness;
pub mod metric;
pub mod sink;

pub use collector::{
    CollectError, Collector, CollectorName, CollectorRegistry, Provider, Target, TestCase,
};
pub use config::{AppConfig, ConfigError, ModuleConfig};
pub use executor::{CommandExecutor, ExecutionError, ExecutionResult, Invocation, ProcessExecutor};
pub use harness::{
    MetricSummary, Reporter, RunOptions, RunSummary, TestError, TestResult, TestRunner,
};
pub use metric::{Desc, Metric, MetricKind};
pub use sink::{MetricReceiver, MetricSink, SinkError};

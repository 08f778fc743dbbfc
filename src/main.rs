//! IPMI Harness Binary Entry Point
//!
//! Runs the collector self-test against a local or remote BMC and exits non-zero
//! if any collector failed. Core functionality lives in the `ipmi_harness` library.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ipmi_harness::{
    AppConfig, CollectorRegistry, Invocation, ProcessExecutor, Provider, Reporter, RunOptions,
    Target, TestRunner,
    config::DEFAULT_MODULE,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// IPMI Harness - collector self-test
#[derive(Parser, Debug)]
#[command(name = "ipmi-harness", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, env = "IPMI_HARNESS_CONFIG")]
    config: Option<String>,

    /// Config module describing how to reach the BMC
    #[arg(short, long, default_value = DEFAULT_MODULE, env = "IPMI_HARNESS_MODULE")]
    module: String,

    /// Remote BMC host (local in-band interface when omitted)
    #[arg(short, long, default_value = "", env = "IPMI_HARNESS_TARGET")]
    target: String,

    /// Provider toolchain: freeipmi or ipmitool
    #[arg(long, default_value = "freeipmi", env = "IPMI_HARNESS_PROVIDER")]
    provider: Provider,

    /// Use the alternate provider (same as --provider ipmitool)
    #[arg(long)]
    native: bool,

    /// Dump descriptor details and raw output for every metric
    #[arg(short, long)]
    debug: bool,

    /// List the test cases and exit
    #[arg(long)]
    list: bool,

    /// Per-command timeout (overrides config file), e.g. "10s"
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "info,ipmi_harness=debug"
    } else {
        "info,ipmi_harness=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    // CLI > ENV > config file
    if let Some(timeout) = cli.timeout {
        config.harness.command_timeout = timeout;
    }
    config.validate()?;

    let provider = if cli.native {
        Provider::IpmiTool
    } else {
        cli.provider
    };
    let module = config.module(&cli.module)?;
    let target = Target::new(cli.target.clone(), module);

    let registry = CollectorRegistry::new(provider);
    let cases = registry.test_cases(&target, &cli.module);

    if cli.list {
        for case in &cases {
            let invocation = Invocation::for_collector(case.collector.as_ref(), &case.target);
            println!("{:<25} {:<45} {}", case.name, case.description, invocation);
        }
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!(
        "Implementation: {}, target: {}, module: {}, timeout: {:?}",
        provider,
        if target.is_local() { "local" } else { target.host.as_str() },
        cli.module,
        config.harness.command_timeout,
    );

    let executor = Arc::new(ProcessExecutor::new(config.harness.command_timeout));
    let options = RunOptions {
        provider,
        debug: cli.debug,
        sink_capacity: config.harness.sink_capacity,
    };
    let mut runner = TestRunner::new(executor, options);
    let mut reporter = Reporter::new(std::io::stdout(), provider, cli.debug);

    runner.run_all(&cases, &mut reporter).await?;
    let summary = reporter.summary_table(runner.results())?;

    if summary.is_success() {
        tracing::info!("All {} tests passed", summary.total);
    } else {
        tracing::error!("{} of {} tests failed", summary.failed, summary.total);
    }
    Ok(summary.exit_code())
}

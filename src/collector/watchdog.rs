//! BMC watchdog timer.

use std::sync::Arc;

use crate::collector::parse::{Fields, boolean, number};
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

const TIMER_USES: [&str; 5] = ["BIOS FRB2", "BIOS/POST", "OS Load", "SMS/OS", "OEM"];
const TIMEOUT_ACTIONS: [&str; 4] = ["None", "Hard Reset", "Power Down", "Power Cycle"];
const PRETIMEOUT_INTERRUPTS: [&str; 4] = [
    "None",
    "SMI",
    "NMI / Diagnostic Interrupt",
    "Messaging Interrupt",
];

#[derive(Debug, Clone, PartialEq)]
struct WatchdogState {
    running: bool,
    timer_use: String,
    logging: bool,
    timeout_action: String,
    pretimeout_interrupt: String,
    pretimeout_interval: f64,
    initial_countdown: f64,
    current_countdown: f64,
}

/// Collects `ipmi_bmc_watchdog_*`.
#[derive(Debug, Clone)]
pub struct WatchdogCollector {
    provider: Provider,
}

impl WatchdogCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for WatchdogCollector {
    fn name(&self) -> CollectorName {
        CollectorName::BmcWatchdog
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "bmc-watchdog",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self.provider {
            Provider::FreeIpmi => args(&["--get"]),
            Provider::IpmiTool => args(&["mc", "watchdog", "get"]),
        }
    }

    fn convert(
        &self,
        result: ExecutionResult,
        sink: &MetricSink,
        _target: &Target,
    ) -> Result<usize, CollectError> {
        let text = result.into_text()?;
        let fields = Fields::parse(&text);
        let state = match self.provider {
            Provider::FreeIpmi => parse_freeipmi(&fields)?,
            Provider::IpmiTool => parse_ipmitool(&fields)?,
        };
        emit(&state, sink)
    }
}

fn flag(value: &str, name: &'static str) -> Result<bool, CollectError> {
    boolean(value)
        .ok_or_else(|| CollectError::Parse(format!("{}: unexpected state '{}'", name, value)))
}

fn parse_freeipmi(fields: &Fields) -> Result<WatchdogState, CollectError> {
    Ok(WatchdogState {
        running: flag(fields.require("Timer", "timer")?, "timer")?,
        timer_use: fields.require("Timer Use", "timer_use")?.to_string(),
        logging: flag(fields.require("Logging", "logging")?, "logging")?,
        timeout_action: fields
            .require("Timeout Action", "timeout_action")?
            .to_string(),
        pretimeout_interrupt: fields
            .require("Pre-Timeout Interrupt", "pretimeout_interrupt")?
            .to_string(),
        pretimeout_interval: number(
            fields.require("Pre-Timeout Interval", "pretimeout_interval")?,
            "pretimeout_interval",
        )?,
        initial_countdown: number(
            fields.require("Initial Countdown", "initial_countdown")?,
            "initial_countdown",
        )?,
        current_countdown: number(
            fields.require("Current Countdown", "current_countdown")?,
            "current_countdown",
        )?,
    })
}

/// Split `"SMS/OS (0x44)"` into its text and raw byte.
fn described_byte(value: &str, name: &'static str) -> Result<(String, u8), CollectError> {
    let parsed = value.split_once('(').and_then(|(text, raw)| {
        let raw = raw.trim_end_matches(')').trim();
        let raw = raw.trim_start_matches("0x").trim_start_matches("0X");
        u8::from_str_radix(raw, 16)
            .ok()
            .map(|byte| (text.trim().to_string(), byte))
    });
    parsed.ok_or_else(|| {
        CollectError::Parse(format!("{}: expected 'text (0xNN)', got '{}'", name, value))
    })
}

fn parse_ipmitool(fields: &Fields) -> Result<WatchdogState, CollectError> {
    let (timer_use, use_byte) =
        described_byte(fields.require("Watchdog Timer Use", "timer_use")?, "timer_use")?;
    let (action, action_byte) = described_byte(
        fields.require("Watchdog Timer Actions", "timeout_action")?,
        "timeout_action",
    )?;
    let interrupt = PRETIMEOUT_INTERRUPTS
        .get(usize::from((action_byte >> 4) & 0x07))
        .ok_or_else(|| {
            CollectError::Parse(format!("unknown pre-timeout interrupt in 0x{:02x}", action_byte))
        })?;
    let timeout_action = if action.eq_ignore_ascii_case("No action") {
        "None".to_string()
    } else {
        action
    };

    Ok(WatchdogState {
        running: flag(fields.require("Watchdog Timer Is", "timer")?, "timer")?,
        timer_use,
        // bit 7 of the timer use byte is "don't log"
        logging: use_byte & 0x80 == 0,
        timeout_action,
        pretimeout_interrupt: interrupt.to_string(),
        pretimeout_interval: number(
            fields.require("Pre-timeout interval", "pretimeout_interval")?,
            "pretimeout_interval",
        )?,
        initial_countdown: number(
            fields.require("Initial Countdown", "initial_countdown")?,
            "initial_countdown",
        )?,
        current_countdown: number(
            fields.require("Present Countdown", "current_countdown")?,
            "current_countdown",
        )?,
    })
}

/// Compare names ignoring case, spacing and separators (`BIOS POST` == `BIOS/POST`).
fn same_name(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    normalize(a) == normalize(b)
}

fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn push_one_hot(
    sink: &MetricSink,
    desc: &Arc<Desc>,
    choices: &[&str],
    current: &str,
) -> Result<usize, CollectError> {
    for &choice in choices {
        let value = bool_value(same_name(choice, current));
        sink.push(Metric::gauge(desc, value, &[choice]))?;
    }
    Ok(choices.len())
}

fn emit(state: &WatchdogState, sink: &MetricSink) -> Result<usize, CollectError> {
    let gauge = |name: &str, help: &str, labels: &[&str]| Arc::new(Desc::new(name, help, labels));

    let timer = gauge(
        "ipmi_bmc_watchdog_timer_state",
        "Watchdog timer running (1: running, 0: stopped)",
        &[],
    );
    let timer_use = gauge(
        "ipmi_bmc_watchdog_timer_use_state",
        "Watchdog timer use (1: active, 0: inactive)",
        &["name"],
    );
    let logging = gauge(
        "ipmi_bmc_watchdog_logging_state",
        "Watchdog log flag (1: Enabled, 0: Disabled)",
        &[],
    );
    let action = gauge(
        "ipmi_bmc_watchdog_timeout_action_state",
        "Watchdog timeout action (1: active, 0: inactive)",
        &["action"],
    );
    let interrupt = gauge(
        "ipmi_bmc_watchdog_pretimeout_interrupt_state",
        "Watchdog pre-timeout interrupt (1: active, 0: inactive)",
        &["interrupt"],
    );
    let interval = gauge(
        "ipmi_bmc_watchdog_pretimeout_interval_seconds",
        "Watchdog pre-timeout interval in seconds",
        &[],
    );
    let initial = gauge(
        "ipmi_bmc_watchdog_initial_countdown_seconds",
        "Watchdog initial countdown in seconds",
        &[],
    );
    let current = gauge(
        "ipmi_bmc_watchdog_current_countdown_seconds",
        "Watchdog current countdown in seconds",
        &[],
    );

    let mut count = 0;
    sink.push(Metric::gauge(&timer, bool_value(state.running), &[]))?;
    count += 1;
    count += push_one_hot(sink, &timer_use, &TIMER_USES, &state.timer_use)?;
    sink.push(Metric::gauge(&logging, bool_value(state.logging), &[]))?;
    count += 1;
    count += push_one_hot(sink, &action, &TIMEOUT_ACTIONS, &state.timeout_action)?;
    count += push_one_hot(sink, &interrupt, &PRETIMEOUT_INTERRUPTS, &state.pretimeout_interrupt)?;
    for (desc, value) in [
        (&interval, state.pretimeout_interval),
        (&initial, state.initial_countdown),
        (&current, state.current_countdown),
    ] {
        sink.push(Metric::gauge(desc, value, &[]))?;
        count += 1;
    }
    Ok(count)
}

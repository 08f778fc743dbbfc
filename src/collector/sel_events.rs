//! System Event Log entries.
//!
//! Counts all events and, for every matcher configured on the target's module,
//! the events whose description matches plus the newest matching timestamp.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::collector::parse::columns;
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelEvent {
    timestamp: Option<NaiveDateTime>,
    description: String,
}

/// Collects `ipmi_sel_events_*`.
#[derive(Debug, Clone)]
pub struct SelEventsCollector {
    provider: Provider,
}

impl SelEventsCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for SelEventsCollector {
    fn name(&self) -> CollectorName {
        CollectorName::SelEvents
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "ipmi-sel",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self.provider {
            Provider::FreeIpmi => args(&[
                "-Q",
                "--comma-separated-output",
                "--no-header-output",
                "--output-event-state",
                "--interpret-oem-data",
                "--entity-sensor-names",
            ]),
            Provider::IpmiTool => args(&["sel", "elist"]),
        }
    }

    fn convert(
        &self,
        result: ExecutionResult,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError> {
        let text = result.into_text()?;
        let events = match self.provider {
            Provider::FreeIpmi => parse_freeipmi(&text)?,
            Provider::IpmiTool => parse_ipmitool(&text)?,
        };
        emit(&events, target, sink)
    }
}

fn parse_timestamp(date: &str, time: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), format).ok()
}

/// `ID,Date,Time,Name,Type,State,Event`
fn parse_freeipmi(text: &str) -> Result<Vec<SelEvent>, CollectError> {
    let mut events = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let cols = columns(line, ',');
        if cols.len() < 7 {
            return Err(CollectError::Parse(format!("unexpected SEL line: '{}'", line)));
        }
        events.push(SelEvent {
            timestamp: parse_timestamp(cols[1], cols[2], "%b-%d-%Y %H:%M:%S"),
            description: cols[6..].join(","),
        });
    }
    Ok(events)
}

/// `1 | 10/10/2023 | 12:00:00 | Memory #0x01 | Correctable ECC | Asserted`
fn parse_ipmitool(text: &str) -> Result<Vec<SelEvent>, CollectError> {
    let mut events = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let cols = columns(line, '|');
        if cols.len() < 5 {
            return Err(CollectError::Parse(format!("unexpected SEL line: '{}'", line)));
        }
        events.push(SelEvent {
            timestamp: parse_timestamp(cols[1], cols[2], "%m/%d/%Y %H:%M:%S"),
            description: cols[4..].join(" "),
        });
    }
    Ok(events)
}

fn emit(events: &[SelEvent], target: &Target, sink: &MetricSink) -> Result<usize, CollectError> {
    let total_desc = Arc::new(Desc::new(
        "ipmi_sel_events_total",
        "Current number of events in the SEL.",
        &[],
    ));
    sink.push(Metric::gauge(&total_desc, events.len() as f64, &[]))?;
    let mut count = 1;

    let matchers = &target.config.sel_events;
    if matchers.is_empty() {
        return Ok(count);
    }

    let count_desc = Arc::new(Desc::new(
        "ipmi_sel_events_count_by_name",
        "Current number of custom events in the SEL by name.",
        &["name"],
    ));
    let latest_desc = Arc::new(Desc::new(
        "ipmi_sel_events_latest_timestamp",
        "Latest timestamp of custom events in the SEL by name.",
        &["name"],
    ));

    for matcher in matchers {
        let regex = matcher
            .compile()
            .map_err(|e| CollectError::Parse(format!("sel_events '{}': {}", matcher.name, e)))?;
        let matching: Vec<&SelEvent> = events
            .iter()
            .filter(|e| regex.is_match(&e.description))
            .collect();
        let latest = matching
            .iter()
            .filter_map(|e| e.timestamp)
            .max()
            .map(|ts| ts.and_utc().timestamp() as f64)
            .unwrap_or(0.0);

        sink.push(Metric::gauge(&count_desc, matching.len() as f64, &[matcher.name.as_str()]))?;
        sink.push(Metric::gauge(&latest_desc, latest, &[matcher.name.as_str()]))?;
        count += 2;
    }
    Ok(count)
}

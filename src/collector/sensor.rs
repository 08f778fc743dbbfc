//! Sensor readings.
//!
//! Each sensor yields a state gauge (0=nominal, 1=warning, 2=critical, NaN=unknown)
//! and, when it has a numeric reading, a value gauge named after its unit.

use std::collections::HashMap;
use std::sync::Arc;

use crate::collector::parse::{columns, leading_number};
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

/// Unit family of a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Unit {
    Celsius,
    Rpm,
    Volts,
    Amperes,
    Watts,
    Other,
}

impl Unit {
    fn parse(units: &str) -> Self {
        match units.trim().to_lowercase().as_str() {
            "c" | "degrees c" => Self::Celsius,
            "rpm" => Self::Rpm,
            "v" | "volts" => Self::Volts,
            "a" | "amps" => Self::Amperes,
            "w" | "watts" => Self::Watts,
            _ => Self::Other,
        }
    }

    fn desc(&self) -> Desc {
        match self {
            Self::Celsius => Desc::new(
                "ipmi_temperature_celsius",
                "Temperature reading in degree Celsius.",
                &["id", "name"],
            ),
            Self::Rpm => Desc::new(
                "ipmi_fan_speed_rpm",
                "Fan speed in rotations per minute.",
                &["id", "name"],
            ),
            Self::Volts => Desc::new(
                "ipmi_voltage_volts",
                "Voltage reading in Volts.",
                &["id", "name"],
            ),
            Self::Amperes => Desc::new(
                "ipmi_current_amperes",
                "Current reading in Amperes.",
                &["id", "name"],
            ),
            Self::Watts => Desc::new(
                "ipmi_power_watts",
                "Power reading in Watts.",
                &["id", "name"],
            ),
            Self::Other => Desc::new(
                "ipmi_sensor_value",
                "Generic data read from an IPMI sensor of unknown type, relying on labels for context.",
                &["id", "name", "type"],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SensorReading {
    id: String,
    name: String,
    kind: String,
    state: f64,
    value: Option<f64>,
    unit: Unit,
}

/// Collects per-sensor state and value gauges.
#[derive(Debug, Clone)]
pub struct SensorCollector {
    provider: Provider,
}

impl SensorCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for SensorCollector {
    fn name(&self) -> CollectorName {
        CollectorName::Ipmi
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "ipmimonitoring",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self.provider {
            Provider::FreeIpmi => args(&[
                "-Q",
                "--ignore-unrecognized-events",
                "--comma-separated-output",
                "--no-header-output",
                "--sdr-cache-recreate",
                "--output-event-bitmask",
                "--output-sensor-state",
            ]),
            Provider::IpmiTool => args(&["sdr", "elist", "full"]),
        }
    }

    fn convert(
        &self,
        result: ExecutionResult,
        sink: &MetricSink,
        _target: &Target,
    ) -> Result<usize, CollectError> {
        let text = result.into_text()?;
        let readings = match self.provider {
            Provider::FreeIpmi => parse_freeipmi(&text)?,
            Provider::IpmiTool => parse_ipmitool(&text)?,
        };
        emit(&readings, sink)
    }
}

fn freeipmi_state(state: &str) -> f64 {
    match state.to_lowercase().as_str() {
        "nominal" => 0.0,
        "warning" => 1.0,
        "critical" => 2.0,
        _ => f64::NAN,
    }
}

/// `ID,Name,Type,State,Reading,Units,Event`
fn parse_freeipmi(text: &str) -> Result<Vec<SensorReading>, CollectError> {
    let mut readings = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let cols = columns(line, ',');
        if cols.len() < 6 {
            return Err(CollectError::Parse(format!(
                "unexpected sensor line: '{}'",
                line
            )));
        }
        readings.push(SensorReading {
            id: cols[0].to_string(),
            name: cols[1].to_string(),
            kind: cols[2].to_string(),
            state: freeipmi_state(cols[3]),
            value: cols[4].parse().ok(),
            unit: Unit::parse(cols[5]),
        });
    }
    Ok(readings)
}

fn ipmitool_state(status: &str) -> f64 {
    match status.to_lowercase().as_str() {
        "ok" => 0.0,
        "nc" => 1.0,
        "cr" | "nr" => 2.0,
        _ => f64::NAN,
    }
}

/// `Name | 30h | ok | 3.1 | 45 degrees C`
fn parse_ipmitool(text: &str) -> Result<Vec<SensorReading>, CollectError> {
    let mut readings = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let cols = columns(line, '|');
        if cols.len() < 5 {
            return Err(CollectError::Parse(format!(
                "unexpected sensor line: '{}'",
                line
            )));
        }
        let id = u8::from_str_radix(cols[1].trim_end_matches('h'), 16)
            .map(|n| n.to_string())
            .unwrap_or_else(|_| cols[1].to_string());
        let reading = cols[4];
        let value = leading_number(reading);
        let units = match value {
            Some(_) => reading.split_once(' ').map(|(_, u)| u).unwrap_or(""),
            None => "",
        };
        readings.push(SensorReading {
            id,
            name: cols[0].to_string(),
            kind: "N/A".to_string(),
            state: ipmitool_state(cols[2]),
            value,
            unit: Unit::parse(units),
        });
    }
    Ok(readings)
}

fn emit(readings: &[SensorReading], sink: &MetricSink) -> Result<usize, CollectError> {
    let state_desc = Arc::new(Desc::new(
        "ipmi_sensor_state",
        "Indicates the severity of the state reported by an IPMI sensor (0=nominal, 1=warning, 2=critical).",
        &["id", "name", "type"],
    ));
    let mut value_descs: HashMap<Unit, Arc<Desc>> = HashMap::new();

    let mut count = 0;
    for reading in readings {
        sink.push(Metric::gauge(
            &state_desc,
            reading.state,
            &[reading.id.as_str(), reading.name.as_str(), reading.kind.as_str()],
        ))?;
        count += 1;

        let Some(value) = reading.value else {
            continue;
        };
        let desc = value_descs
            .entry(reading.unit)
            .or_insert_with(|| Arc::new(reading.unit.desc()));
        let (id, name, kind) = (
            reading.id.as_str(),
            reading.name.as_str(),
            reading.kind.as_str(),
        );
        let metric = match reading.unit {
            Unit::Other => Metric::gauge(desc, value, &[id, name, kind]),
            _ => Metric::gauge(desc, value, &[id, name]),
        };
        sink.push(metric)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::testing::{convert_text, find};

    const FREEIPMI_OUTPUT: &str = "\
1,CPU Temp,Temperature,Nominal,45.00,C,'OK'
2,FAN1,Fan,Warning,300.00,RPM,'Lower Non-critical - going low'
3,12V,Voltage,Nominal,12.19,V,'OK'
4,PS1 Status,Power Supply,Critical,N/A,N/A,'Power Supply Failure detected'
5,Chassis Intru,Physical Security,Nominal,1.00,N/A,'OK'
";

    const IPMITOOL_OUTPUT: &str = "\
CPU Temp         | 01h | ok  |  3.1 | 45 degrees C
FAN1             | 41h | nc  | 29.1 | 300 RPM
12V              | 30h | ok  |  7.1 | 12.19 Volts
PS1 Status       | 0Ah | ns  | 10.1 | No Reading
";

    #[test]
    fn test_freeipmi_sensors() {
        let collector = SensorCollector::new(Provider::FreeIpmi);
        let metrics = convert_text(&collector, FREEIPMI_OUTPUT, &Target::local()).unwrap();
        // 5 states + 4 numeric readings
        assert_eq!(metrics.len(), 9);

        let temp = find(&metrics, "ipmi_temperature_celsius", &["1", "CPU Temp"]);
        assert_eq!(temp.value(), 45.0);
        assert_eq!(
            temp.desc().variable_labels(),
            ["id".to_string(), "name".to_string()]
        );
        assert_eq!(
            find(&metrics, "ipmi_sensor_state", &["2", "FAN1", "Fan"]).value(),
            1.0
        );
        assert_eq!(
            find(&metrics, "ipmi_sensor_state", &["4", "PS1 Status", "Power Supply"]).value(),
            2.0
        );
        assert_eq!(
            find(
                &metrics,
                "ipmi_sensor_value",
                &["5", "Chassis Intru", "Physical Security"]
            )
            .value(),
            1.0
        );
    }

    #[test]
    fn test_value_descriptors_are_shared() {
        let output = "1,FAN1,Fan,Nominal,3000,RPM,'OK'\n2,FAN2,Fan,Nominal,3100,RPM,'OK'\n";
        let collector = SensorCollector::new(Provider::FreeIpmi);
        let metrics = convert_text(&collector, output, &Target::local()).unwrap();
        let fans: Vec<_> = metrics
            .iter()
            .filter(|m| m.desc().fq_name() == "ipmi_fan_speed_rpm")
            .collect();
        assert_eq!(fans.len(), 2);
        assert!(Arc::ptr_eq(fans[0].desc(), fans[1].desc()));
    }

    #[test]
    fn test_ipmitool_sensors() {
        let collector = SensorCollector::new(Provider::IpmiTool);
        let metrics = convert_text(&collector, IPMITOOL_OUTPUT, &Target::local()).unwrap();
        // 4 states + 3 numeric readings
        assert_eq!(metrics.len(), 7);
        assert_eq!(find(&metrics, "ipmi_fan_speed_rpm", &["65", "FAN1"]).value(), 300.0);
        assert_eq!(find(&metrics, "ipmi_voltage_volts", &["48", "12V"]).value(), 12.19);
        assert!(
            find(&metrics, "ipmi_sensor_state", &["10", "PS1 Status", "N/A"])
                .value()
                .is_nan()
        );
    }

    #[test]
    fn test_malformed_sensor_line() {
        let collector = SensorCollector::new(Provider::FreeIpmi);
        let err = convert_text(&collector, "garbage\n", &Target::local()).unwrap_err();
        assert!(matches!(err, CollectError::Parse(_)));
    }

    #[test]
    fn test_no_sensors_is_zero_metrics() {
        let collector = SensorCollector::new(Provider::FreeIpmi);
        let metrics = convert_text(&collector, "\n", &Target::local()).unwrap();
        assert!(metrics.is_empty());
    }
}

//! Chassis power and fault status.

use std::sync::Arc;

use crate::collector::parse::{Fields, boolean};
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChassisStatus {
    power_on: bool,
    drive_fault: Option<bool>,
    cooling_fault: Option<bool>,
}

/// Collects `ipmi_chassis_*` state gauges.
#[derive(Debug, Clone)]
pub struct ChassisCollector {
    provider: Provider,
}

impl ChassisCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for ChassisCollector {
    fn name(&self) -> CollectorName {
        CollectorName::Chassis
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "ipmi-chassis",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self.provider {
            Provider::FreeIpmi => args(&["--get-chassis-status"]),
            Provider::IpmiTool => args(&["chassis", "status"]),
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
        let cooling_key = match self.provider {
            Provider::FreeIpmi => "Cooling/fan fault detected",
            Provider::IpmiTool => "Cooling/Fan Fault",
        };

        let power = fields.require("System Power", "system_power")?;
        let status = ChassisStatus {
            power_on: boolean(power).ok_or_else(|| {
                CollectError::Parse(format!("unexpected system power state '{}'", power))
            })?,
            drive_fault: fields.get("Drive Fault").and_then(boolean),
            cooling_fault: fields.get(cooling_key).and_then(boolean),
        };

        emit(status, sink)
    }
}

fn emit(status: ChassisStatus, sink: &MetricSink) -> Result<usize, CollectError> {
    let gauge = |name: &str, help: &str, value: bool| -> Result<(), CollectError> {
        let desc = Arc::new(Desc::new(name, help, &[]));
        sink.push(Metric::gauge(&desc, f64::from(u8::from(value)), &[]))?;
        Ok(())
    };

    let mut count = 0;
    gauge(
        "ipmi_chassis_power_state",
        "Current power state (1=on, 0=off).",
        status.power_on,
    )?;
    count += 1;

    if let Some(fault) = status.drive_fault {
        gauge(
            "ipmi_chassis_drive_fault_state",
            "Current drive fault state (1=false, 0=true).",
            !fault,
        )?;
        count += 1;
    }

    if let Some(fault) = status.cooling_fault {
        gauge(
            "ipmi_chassis_cooling_fault_state",
            "Current cooling/fan fault state (1=false, 0=true).",
            !fault,
        )?;
        count += 1;
    }

    Ok(count)
}

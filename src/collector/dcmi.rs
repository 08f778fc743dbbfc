//! DCMI power consumption.

use std::sync::Arc;

use crate::collector::parse::{Fields, number};
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

/// Collects `ipmi_dcmi_power_consumption_watts`.
///
/// Emits nothing while the BMC reports power measurement as inactive.
#[derive(Debug, Clone)]
pub struct DcmiCollector {
    provider: Provider,
}

impl DcmiCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for DcmiCollector {
    fn name(&self) -> CollectorName {
        CollectorName::Dcmi
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "ipmi-dcmi",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self.provider {
            Provider::FreeIpmi => args(&["--get-system-power-statistics"]),
            Provider::IpmiTool => args(&["dcmi", "power", "reading"]),
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
        let (reading_key, state_key, active) = match self.provider {
            Provider::FreeIpmi => ("Current Power", "Power Measurement", "active"),
            Provider::IpmiTool => (
                "Instantaneous power reading",
                "Power reading state is",
                "activated",
            ),
        };

        let state = fields.require(state_key, "power_measurement")?;
        if !state.eq_ignore_ascii_case(active) {
            tracing::debug!(state = %state, "DCMI power measurement inactive");
            return Ok(0);
        }

        let watts = number(fields.require(reading_key, "current_power")?, "current_power")?;
        let desc = Arc::new(Desc::new(
            "ipmi_dcmi_power_consumption_watts",
            "Current power consumption in Watts.",
            &[],
        ));
        sink.push(Metric::gauge(&desc, watts, &[]))?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::testing::{convert_text, find};

    #[test]
    fn test_freeipmi_power_reading() {
        let output = "\
Current Power                        : 254 Watts
Minimum Power over sampling duration : 6 watts
Power Measurement                    : Active
";
        let collector = DcmiCollector::new(Provider::FreeIpmi);
        let metrics = convert_text(&collector, output, &Target::local()).unwrap();
        assert_eq!(
            find(&metrics, "ipmi_dcmi_power_consumption_watts", &[]).value(),
            254.0
        );
    }

    #[test]
    fn test_ipmitool_power_reading() {
        let output = "
    Instantaneous power reading:                   180 Watts
    Minimum during sampling period:                  6 Watts
    Power reading state is:                   activated
";
        let collector = DcmiCollector::new(Provider::IpmiTool);
        let metrics = convert_text(&collector, output, &Target::local()).unwrap();
        assert_eq!(metrics[0].value(), 180.0);
    }

    #[test]
    fn test_inactive_measurement_emits_nothing() {
        let output = "Current Power : 0 Watts\nPower Measurement : Not Available\n";
        let collector = DcmiCollector::new(Provider::FreeIpmi);
        let metrics = convert_text(&collector, output, &Target::local()).unwrap();
        assert!(metrics.is_empty());
    }
}

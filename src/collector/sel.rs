//! System Event Log capacity.

use std::sync::Arc;

use crate::collector::parse::{Fields, number};
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

/// Collects `ipmi_sel_logs_count` and `ipmi_sel_free_space_bytes`.
#[derive(Debug, Clone)]
pub struct SelCollector {
    provider: Provider,
}

impl SelCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for SelCollector {
    fn name(&self) -> CollectorName {
        CollectorName::Sel
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
            Provider::FreeIpmi => args(&["--info"]),
            Provider::IpmiTool => args(&["sel", "info"]),
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
        let (entries_key, free_key) = match self.provider {
            Provider::FreeIpmi => ("Number of log entries", "Free space remaining"),
            Provider::IpmiTool => ("Entries", "Free Space"),
        };

        let entries = number(fields.require(entries_key, "entries")?, "entries")?;
        let free = number(fields.require(free_key, "free_space")?, "free_space")?;

        let entries_desc = Arc::new(Desc::new(
            "ipmi_sel_logs_count",
            "Current number of log entries in the SEL.",
            &[],
        ));
        let free_desc = Arc::new(Desc::new(
            "ipmi_sel_free_space_bytes",
            "Current free space remaining for new SEL entries.",
            &[],
        ));
        sink.push(Metric::gauge(&entries_desc, entries, &[]))?;
        sink.push(Metric::gauge(&free_desc, free, &[]))?;
        Ok(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::testing::{convert_text, find};

    #[test]
    fn test_freeipmi_sel_info() {
        let output = "\
SEL version                                       : 1.5
Number of log entries                             : 42
Free space remaining                              : 15696 bytes
";
        let collector = SelCollector::new(Provider::FreeIpmi);
        let metrics = convert_text(&collector, output, &Target::local()).unwrap();
        assert_eq!(find(&metrics, "ipmi_sel_logs_count", &[]).value(), 42.0);
        assert_eq!(find(&metrics, "ipmi_sel_free_space_bytes", &[]).value(), 15696.0);
    }

    #[test]
    fn test_ipmitool_sel_info() {
        let output = "\
SEL Information
Version          : 1.5 (v1.5, v2 compliant)
Entries          : 7
Free Space       : 16272 bytes
";
        let collector = SelCollector::new(Provider::IpmiTool);
        let metrics = convert_text(&collector, output, &Target::local()).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(find(&metrics, "ipmi_sel_logs_count", &[]).value(), 7.0);
    }

    #[test]
    fn test_sel_info_non_numeric() {
        let output = "Number of log entries : many\nFree space remaining : 1 bytes\n";
        let collector = SelCollector::new(Provider::FreeIpmi);
        let err = convert_text(&collector, output, &Target::local()).unwrap_err();
        assert!(matches!(err, CollectError::Parse(_)));
    }
}

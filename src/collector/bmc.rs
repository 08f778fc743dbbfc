//! BMC device information.

use std::sync::Arc;

use crate::collector::parse::Fields;
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

/// Identity reported by the BMC.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BmcInfo {
    firmware_revision: String,
    manufacturer_id: String,
    system_firmware_version: String,
}

/// Collects `ipmi_bmc_info`.
#[derive(Debug, Clone)]
pub struct BmcCollector {
    provider: Provider,
}

impl BmcCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for BmcCollector {
    fn name(&self) -> CollectorName {
        CollectorName::Bmc
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "bmc-info",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self.provider {
            Provider::FreeIpmi => Vec::new(),
            Provider::IpmiTool => args(&["mc", "info"]),
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
        let info = match self.provider {
            Provider::FreeIpmi => parse_freeipmi(&fields)?,
            Provider::IpmiTool => parse_ipmitool(&fields)?,
        };

        let desc = Arc::new(Desc::new(
            "ipmi_bmc_info",
            "Constant metric with value '1' providing details about the BMC.",
            &["firmware_revision", "manufacturer_id", "system_firmware_version"],
        ));
        sink.push(Metric::gauge(
            &desc,
            1.0,
            &[
                info.firmware_revision.as_str(),
                info.manufacturer_id.as_str(),
                info.system_firmware_version.as_str(),
            ],
        ))?;
        Ok(1)
    }
}

fn parse_freeipmi(fields: &Fields) -> Result<BmcInfo, CollectError> {
    Ok(BmcInfo {
        firmware_revision: fields
            .require("Firmware Revision", "firmware_revision")?
            .to_string(),
        manufacturer_id: fields
            .require("Manufacturer ID", "manufacturer_id")?
            .to_string(),
        system_firmware_version: fields
            .get("System Firmware Version")
            .unwrap_or("N/A")
            .to_string(),
    })
}

fn parse_ipmitool(fields: &Fields) -> Result<BmcInfo, CollectError> {
    let id = fields.require("Manufacturer ID", "manufacturer_id")?;
    let manufacturer_id = match fields.get("Manufacturer Name") {
        Some(name) => format!("{} ({})", name, id),
        None => id.to_string(),
    };
    Ok(BmcInfo {
        firmware_revision: fields
            .require("Firmware Revision", "firmware_revision")?
            .to_string(),
        manufacturer_id,
        system_firmware_version: "N/A".to_string(),
    })
}

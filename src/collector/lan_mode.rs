//! Supermicro shared/dedicated LAN mode via a raw OEM request.

use std::sync::Arc;

use crate::collector::parse::hex_bytes;
use crate::collector::traits::args;
use crate::collector::{CollectError, Collector, CollectorName, Provider, Target};
use crate::executor::ExecutionResult;
use crate::metric::{Desc, Metric};
use crate::sink::MetricSink;

/// NetFn 0x30, command 0x70, sub-command 0x0c (get LAN mode).
const REQUEST: [&str; 4] = ["0x30", "0x70", "0x0c", "0x00"];

/// Collects `ipmi_config_lan_mode`.
#[derive(Debug, Clone)]
pub struct LanModeCollector {
    provider: Provider,
}

impl LanModeCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

impl Collector for LanModeCollector {
    fn name(&self) -> CollectorName {
        CollectorName::SmLanMode
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn command(&self) -> &'static str {
        match self.provider {
            Provider::FreeIpmi => "ipmi-raw",
            Provider::IpmiTool => "ipmitool",
        }
    }

    fn arguments(&self) -> Vec<String> {
        let mut list = match self.provider {
            // ipmi-raw takes the LUN first
            Provider::FreeIpmi => args(&["0x0"]),
            Provider::IpmiTool => args(&["raw"]),
        };
        list.extend(args(&REQUEST));
        list
    }

    fn convert(
        &self,
        result: ExecutionResult,
        sink: &MetricSink,
        _target: &Target,
    ) -> Result<usize, CollectError> {
        let text = result.into_text()?;
        let mode = match self.provider {
            Provider::FreeIpmi => parse_freeipmi(&text)?,
            Provider::IpmiTool => parse_ipmitool(&text)?,
        };
        if mode > 2 {
            return Err(CollectError::Parse(format!("unknown LAN mode 0x{:02x}", mode)));
        }

        let desc = Arc::new(Desc::new(
            "ipmi_config_lan_mode",
            "Returns configured LAN mode (0=dedicated, 1=shared, 2=failover).",
            &[],
        ));
        sink.push(Metric::gauge(&desc, f64::from(mode), &[]))?;
        Ok(1)
    }
}

/// `rcvd: 0C 00 01`: echoed command, completion code, data.
fn parse_freeipmi(text: &str) -> Result<u8, CollectError> {
    let bytes = hex_bytes(text);
    match bytes.as_slice() {
        [_, 0x00, mode, ..] => Ok(*mode),
        [_, code, ..] if *code != 0 => Err(CollectError::Unavailable(format!(
            "LAN mode request rejected with completion code 0x{:02x}",
            code
        ))),
        _ => Err(CollectError::Parse(format!("short raw response: '{}'", text.trim()))),
    }
}

/// ipmitool prints only the data bytes.
fn parse_ipmitool(text: &str) -> Result<u8, CollectError> {
    hex_bytes(text)
        .first()
        .copied()
        .ok_or_else(|| CollectError::Parse(format!("empty raw response: '{}'", text.trim())))
}

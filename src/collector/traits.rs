//! Core collector traits and types.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::config::ModuleConfig;
use crate::executor::{ExecutionError, ExecutionResult, Secret};
use crate::sink::{MetricSink, SinkError};

/// Errors that can occur while converting provider output into metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    /// The provider command did not complete successfully.
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// Provider output could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// A required field was missing from provider output.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The queried feature is not available on this hardware.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Failed to hand a metric to the sink.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Logical information category served by a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum CollectorName {
    Bmc,
    Chassis,
    Dcmi,
    Ipmi,
    Sel,
    SelEvents,
    BmcWatchdog,
    SmLanMode,
}

/// Provider toolchain a collector shells out to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    /// FreeIPMI tools (`ipmimonitoring`, `bmc-info`, ...).
    #[default]
    #[strum(serialize = "freeipmi", to_string = "FreeIPMI")]
    FreeIpmi,
    /// `ipmitool`.
    #[strum(serialize = "ipmitool", to_string = "ipmitool")]
    IpmiTool,
}

impl Provider {
    /// Suffix appended to test case names for this provider.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            Self::FreeIpmi => "",
            Self::IpmiTool => "_ipmitool",
        }
    }

    /// Qualifier appended to test case descriptions for this provider.
    pub fn description_qualifier(&self) -> &'static str {
        match self {
            Self::FreeIpmi => "",
            Self::IpmiTool => " (ipmitool)",
        }
    }

    /// Global options selecting and authenticating against a remote BMC.
    pub fn connection_args(&self, target: &Target) -> Vec<String> {
        let config = &target.config;
        let mut args = Vec::new();
        match self {
            Self::FreeIpmi => {
                args.extend(["-h".to_string(), target.host.clone()]);
                if !config.user.is_empty() {
                    args.extend(["-u".to_string(), config.user.clone()]);
                }
                args.extend(["-l".to_string(), config.privilege.as_ref().to_uppercase()]);
                if let Some(driver) = &config.driver {
                    args.extend(["-D".to_string(), driver.clone()]);
                }
                if !config.workaround_flags.is_empty() {
                    args.extend(["-W".to_string(), config.workaround_flags.join(",")]);
                }
                if let Some(timeout) = config.timeout {
                    args.push(format!("--session-timeout={}", timeout.as_millis()));
                }
            }
            Self::IpmiTool => {
                let interface = config.driver.as_deref().unwrap_or("lanplus");
                args.extend(["-I".to_string(), interface.to_string()]);
                args.extend(["-H".to_string(), target.host.clone()]);
                if !config.user.is_empty() {
                    args.extend(["-U".to_string(), config.user.clone()]);
                }
                let level = match config.privilege {
                    crate::config::Privilege::Admin => "ADMINISTRATOR".to_string(),
                    other => other.as_ref().to_uppercase(),
                };
                args.extend(["-L".to_string(), level]);
                if let Some(timeout) = config.timeout {
                    args.extend(["-N".to_string(), timeout.as_secs().max(1).to_string()]);
                }
            }
        }
        args
    }

    /// Credential file for the configured password, if any.
    pub fn secret(&self, target: &Target) -> Option<Secret> {
        let pass = &target.config.pass;
        if pass.is_empty() {
            return None;
        }
        Some(match self {
            Self::FreeIpmi => Secret::new("--config-file", format!("password {}\n", pass)),
            Self::IpmiTool => Secret::new("-f", pass.clone()),
        })
    }
}

/// A BMC-reachable host plus its connection configuration.
///
/// An empty host addresses the local BMC through the in-band interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub config: ModuleConfig,
}

impl Target {
    pub fn new(host: impl Into<String>, config: ModuleConfig) -> Self {
        Self {
            host: host.into(),
            config,
        }
    }

    /// Local target with default configuration.
    pub fn local() -> Self {
        Self::default()
    }

    pub fn is_local(&self) -> bool {
        self.host.is_empty()
    }
}

/// Contract between the harness and one category of provider output.
///
/// `command()` and `arguments()` are deterministic. `convert()` runs synchronously
/// on a blocking thread and pushes every metric before returning; the returned
/// count must equal the number of successful pushes.
pub trait Collector: Send + Sync + 'static {
    /// Information category served.
    fn name(&self) -> CollectorName;

    /// Provider this instance shells out to.
    fn provider(&self) -> Provider;

    /// Executable to invoke.
    fn command(&self) -> &'static str;

    /// Ordered arguments for the invocation.
    fn arguments(&self) -> Vec<String>;

    /// Interpret `result` and push metrics to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `CollectError` for failed execution, unparsable output, absent
    /// features, or a rejected sink write.
    fn convert(
        &self,
        result: ExecutionResult,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError>;
}

/// Build an owned argument list from string literals.
pub(crate) fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| (*a).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use super::*;
    use crate::config::Privilege;

    #[test]
    fn test_collector_name_round_trip() {
        assert_eq!(CollectorName::SelEvents.as_ref(), "sel-events");
        assert_eq!(
            CollectorName::from_str("bmc-watchdog").unwrap(),
            CollectorName::BmcWatchdog
        );
        assert!(CollectorName::from_str("bogus").is_err());
    }

    #[test]
    fn test_provider_parse_and_label() {
        assert_eq!(Provider::from_str("FreeIPMI").unwrap(), Provider::FreeIpmi);
        assert_eq!(Provider::from_str("IPMITOOL").unwrap(), Provider::IpmiTool);
        assert_eq!(Provider::FreeIpmi.to_string(), "FreeIPMI");
        assert_eq!(Provider::IpmiTool.name_suffix(), "_ipmitool");
    }

    #[test]
    fn test_freeipmi_connection_args() {
        let config = ModuleConfig {
            user: "admin".to_string(),
            privilege: Privilege::Admin,
            driver: Some("LAN_2_0".to_string()),
            timeout: Some(Duration::from_secs(2)),
            workaround_flags: vec!["authcap".to_string(), "idzero".to_string()],
            ..Default::default()
        };
        let target = Target::new("bmc-01", config);
        let args = Provider::FreeIpmi.connection_args(&target);
        assert_eq!(
            args,
            [
                "-h",
                "bmc-01",
                "-u",
                "admin",
                "-l",
                "ADMIN",
                "-D",
                "LAN_2_0",
                "-W",
                "authcap,idzero",
                "--session-timeout=2000"
            ]
        );
    }

    #[test]
    fn test_ipmitool_admin_privilege_name() {
        let config = ModuleConfig {
            privilege: Privilege::Admin,
            ..Default::default()
        };
        let args = Provider::IpmiTool.connection_args(&Target::new("bmc-01", config));
        assert_eq!(args, ["-I", "lanplus", "-H", "bmc-01", "-L", "ADMINISTRATOR"]);
    }

    #[test]
    fn test_secret_only_with_password() {
        let target = Target::new("bmc-01", ModuleConfig::default());
        assert!(Provider::FreeIpmi.secret(&target).is_none());

        let config = ModuleConfig {
            pass: "calvin".to_string(),
            ..Default::default()
        };
        let target = Target::new("bmc-01", config);
        let secret = Provider::FreeIpmi.secret(&target).unwrap();
        assert_eq!(secret.flag(), "--config-file");
        assert_eq!(secret.contents(), "password calvin\n");
        assert_eq!(Provider::IpmiTool.secret(&target).unwrap().contents(), "calvin");
    }
}

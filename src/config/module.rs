//! Per-module target configuration.
//!
//! A module bundles the connection settings used for every command run against a
//! target: credentials, privilege level, provider driver, session timeout, plus
//! per-collector command overrides and SEL event matchers.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::collector::CollectorName;

use super::error::ConfigError;

/// `${IPMI_PASS}` or `${IPMI_PASS:-fallback}` inside a credential.
static CREDENTIAL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("credential reference pattern")
});

/// Substitute environment references so passwords need not live in the file.
/// Unset variables without a fallback become empty.
fn resolve_credential(raw: &str) -> String {
    CREDENTIAL_REF
        .replace_all(raw, |caps: &Captures| {
            let fallback = caps.get(2).map_or("", |m| m.as_str());
            std::env::var(&caps[1]).unwrap_or_else(|_| fallback.to_string())
        })
        .into_owned()
}

/// Session privilege level requested from the BMC.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Privilege {
    #[default]
    User,
    Operator,
    Admin,
}

/// Named regular expression used to count matching SEL events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelEventMatcher {
    /// Value of the `name` label on emitted metrics.
    pub name: String,
    /// Pattern matched against the event description.
    pub regex: String,
}

impl SelEventMatcher {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
        }
    }

    /// Compile the pattern.
    pub fn compile(&self) -> Result<regex::Regex, regex::Error> {
        regex::Regex::new(&self.regex)
    }
}

/// Connection and collection settings for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// BMC user name (empty for local access).
    pub user: String,

    /// BMC password; supports `${VAR}` and `${VAR:-default}` expansion.
    pub pass: String,

    /// Requested privilege level (default: user).
    pub privilege: Privilege,

    /// Provider driver / interface, e.g. `LAN_2_0` or `lanplus`.
    pub driver: Option<String>,

    /// Provider session timeout (e.g. "10s").
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// FreeIPMI workaround flags.
    pub workaround_flags: Vec<String>,

    /// Collector name -> executable replacing the collector's own command.
    pub collector_cmd: BTreeMap<String, String>,

    /// Collector name -> arguments prepended to the collector's own arguments.
    pub custom_args: BTreeMap<String, Vec<String>>,

    /// SEL event matchers for the `sel-events` collector.
    pub sel_events: Vec<SelEventMatcher>,
}

impl ModuleConfig {
    /// Replacement executable configured for `collector`, if any.
    pub fn command_override(&self, collector: CollectorName) -> Option<&str> {
        self.collector_cmd
            .get(collector.as_ref())
            .map(String::as_str)
            .filter(|cmd| !cmd.is_empty())
    }

    /// Extra arguments configured for `collector`.
    pub fn custom_args(&self, collector: CollectorName) -> &[String] {
        self.custom_args
            .get(collector.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Expand environment references in credentials.
    pub(crate) fn expand_env(&mut self) {
        self.user = resolve_credential(&self.user);
        self.pass = resolve_credential(&self.pass);
    }

    /// Validate collector references and SEL patterns.
    pub fn validate(&self, module: &str) -> Result<(), ConfigError> {
        for name in self.collector_cmd.keys().chain(self.custom_args.keys()) {
            if CollectorName::from_str(name).is_err() {
                return Err(ConfigError::UnknownCollector {
                    module: module.to_string(),
                    collector: name.clone(),
                });
            }
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidModule {
                module: module.to_string(),
                reason: "timeout must be positive",
            });
        }

        for matcher in &self.sel_events {
            if matcher.name.is_empty() {
                return Err(ConfigError::InvalidModule {
                    module: module.to_string(),
                    reason: "sel_events entry without a name",
                });
            }
            matcher
                .compile()
                .map_err(|e| ConfigError::InvalidSelMatcher {
                    module: module.to_string(),
                    matcher: matcher.name.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_defaults() {
        let module = ModuleConfig::default();
        assert_eq!(module.privilege, Privilege::User);
        assert!(module.user.is_empty());
        assert!(module.timeout.is_none());
        assert!(module.custom_args(CollectorName::Ipmi).is_empty());
        assert!(module.command_override(CollectorName::Ipmi).is_none());
    }

    #[test]
    fn test_module_from_yaml() {
        let yaml = r#"
user: admin
privilege: operator
driver: LAN_2_0
timeout: 10s
collector_cmd:
  ipmi: sudo
custom_args:
  ipmi: ["ipmimonitoring"]
sel_events:
  - name: memory
    regex: "Correctable memory.*"
"#;
        let module: ModuleConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(module.privilege, Privilege::Operator);
        assert_eq!(module.timeout, Some(Duration::from_secs(10)));
        assert_eq!(module.command_override(CollectorName::Ipmi), Some("sudo"));
        assert_eq!(
            module.custom_args(CollectorName::Ipmi),
            ["ipmimonitoring".to_string()]
        );
        assert!(module.validate("default").is_ok());
    }

    #[test]
    fn test_module_unknown_collector_rejected() {
        let mut module = ModuleConfig::default();
        module
            .collector_cmd
            .insert("not-a-collector".to_string(), "sudo".to_string());
        let err = module.validate("default").unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::UnknownCollector { collector, .. } if collector == "not-a-collector"
        ));
        assert!(err.to_string().contains("unknown collector 'not-a-collector'"));
    }

    #[test]
    fn test_module_invalid_sel_regex_rejected() {
        let module = ModuleConfig {
            sel_events: vec![SelEventMatcher::new("broken", "([")],
            ..Default::default()
        };
        let err = module.validate("default").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelMatcher { .. }));
        assert!(err.to_string().contains("sel_events 'broken'"));
    }

    #[test]
    fn test_unnamed_sel_matcher_rejected() {
        let module = ModuleConfig {
            sel_events: vec![SelEventMatcher::new("", "Fan.*")],
            ..Default::default()
        };
        assert!(matches!(
            module.validate("rack-7"),
            Err(ConfigError::InvalidModule { module: ref name, .. }) if name == "rack-7"
        ));
    }

    #[test]
    fn test_credential_fallback_when_unset() {
        assert_eq!(
            resolve_credential("${IPMI_HARNESS_UNSET_PASSWORD_4711:-calvin}"),
            "calvin"
        );
        assert_eq!(resolve_credential("${IPMI_HARNESS_UNSET_PASSWORD_4711}"), "");
        assert_eq!(resolve_credential("plain-ADMIN"), "plain-ADMIN");
    }

    #[test]
    fn test_credential_from_environment() {
        // SAFETY: variable is unique to this test.
        unsafe {
            std::env::set_var("IPMI_HARNESS_TEST_PASS", "s3cret");
        }
        let mut module = ModuleConfig {
            user: "root".to_string(),
            pass: "${IPMI_HARNESS_TEST_PASS:-unused}".to_string(),
            ..Default::default()
        };
        module.expand_env();
        assert_eq!(module.pass, "s3cret");
        assert_eq!(module.user, "root");
        // SAFETY: removes the variable set above.
        unsafe {
            std::env::remove_var("IPMI_HARNESS_TEST_PASS");
        }
    }
}

//! Command line resolution for a collector run.

use std::fmt;
use std::path::Path;

use crate::collector::{Collector, Target};

/// Credential material passed to the provider through a private file.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    flag: &'static str,
    contents: String,
}

impl Secret {
    pub fn new(flag: &'static str, contents: impl Into<String>) -> Self {
        Self {
            flag,
            contents: contents.into(),
        }
    }

    /// Provider flag that takes the credential file path.
    pub fn flag(&self) -> &'static str {
        self.flag
    }

    /// File contents understood by the provider.
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("flag", &self.flag)
            .finish_non_exhaustive()
    }
}

/// A resolved provider command line.
///
/// Arguments are assembled as: custom args, connection args, credential file, collector args.
/// Provider global options therefore always precede the collector's subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    command: String,
    custom_args: Vec<String>,
    connection_args: Vec<String>,
    args: Vec<String>,
    secret: Option<Secret>,
}

impl Invocation {
    /// Build an invocation from raw parts.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            custom_args: Vec::new(),
            connection_args: Vec::new(),
            args,
            secret: None,
        }
    }

    /// Resolve the command line for `collector` against `target`.
    ///
    /// Applies the module's command override and custom arguments, and adds the
    /// provider's connection arguments and credential file for remote targets.
    pub fn for_collector(collector: &dyn Collector, target: &Target) -> Self {
        let name = collector.name();
        let provider = collector.provider();
        let config = &target.config;

        let command = config
            .command_override(name)
            .unwrap_or(collector.command())
            .to_string();

        let (connection_args, secret) = if target.is_local() {
            (Vec::new(), None)
        } else {
            (provider.connection_args(target), provider.secret(target))
        };

        Self {
            command,
            custom_args: config.custom_args(name).to_vec(),
            connection_args,
            args: collector.arguments(),
            secret,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn secret(&self) -> Option<&Secret> {
        self.secret.as_ref()
    }

    /// Final argument vector, with `secret_path` substituted for the credential file.
    pub fn argv(&self, secret_path: Option<&Path>) -> Vec<String> {
        let mut argv = Vec::with_capacity(
            self.custom_args.len() + self.connection_args.len() + self.args.len() + 2,
        );
        argv.extend(self.custom_args.iter().cloned());
        argv.extend(self.connection_args.iter().cloned());
        if let (Some(secret), Some(path)) = (&self.secret, secret_path) {
            argv.push(secret.flag.to_string());
            argv.push(path.display().to_string());
        }
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Arguments as shown in traces, with the credential file masked.
    pub fn display_args(&self) -> Vec<String> {
        let mut argv = self.argv(None);
        if let Some(secret) = &self.secret {
            let at = self.custom_args.len() + self.connection_args.len();
            argv.splice(at..at, [secret.flag.to_string(), "<secret>".to_string()]);
        }
        argv
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.command, self.display_args())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::collector::{BmcCollector, Provider, SensorCollector};
    use crate::config::ModuleConfig;

    #[test]
    fn test_local_invocation_has_no_connection_args() {
        let collector = BmcCollector::new(Provider::FreeIpmi);
        let invocation = Invocation::for_collector(&collector, &Target::local());
        assert_eq!(invocation.command(), "bmc-info");
        assert!(invocation.secret().is_none());
        assert_eq!(invocation.argv(None), collector.arguments());
    }

    #[test]
    fn test_command_override_and_custom_args() {
        let mut config = ModuleConfig::default();
        config
            .collector_cmd
            .insert("ipmi".to_string(), "sudo".to_string());
        config
            .custom_args
            .insert("ipmi".to_string(), vec!["ipmimonitoring".to_string()]);
        let target = Target::new("", config);
        let collector = SensorCollector::new(Provider::FreeIpmi);

        let invocation = Invocation::for_collector(&collector, &target);
        assert_eq!(invocation.command(), "sudo");
        let argv = invocation.argv(None);
        assert_eq!(argv[0], "ipmimonitoring");
        assert_eq!(&argv[1..], collector.arguments().as_slice());
    }

    #[test]
    fn test_remote_ipmitool_options_precede_subcommand() {
        let config = ModuleConfig {
            user: "admin".to_string(),
            pass: "calvin".to_string(),
            ..Default::default()
        };
        let target = Target::new("10.0.0.5", config);
        let collector = BmcCollector::new(Provider::IpmiTool);
        let invocation = Invocation::for_collector(&collector, &target);

        let argv = invocation.argv(Some(&PathBuf::from("/tmp/pw")));
        let host = argv.iter().position(|a| a == "-H").unwrap();
        let file = argv.iter().position(|a| a == "-f").unwrap();
        let subcommand = argv.iter().position(|a| a == "mc").unwrap();
        assert_eq!(argv[host + 1], "10.0.0.5");
        assert_eq!(argv[file + 1], "/tmp/pw");
        assert!(host < subcommand && file < subcommand);
        assert!(!argv.iter().any(|a| a.contains("calvin")));
    }

    #[test]
    fn test_display_masks_secret() {
        let config = ModuleConfig {
            pass: "calvin".to_string(),
            ..Default::default()
        };
        let target = Target::new("bmc-01", config);
        let collector = BmcCollector::new(Provider::FreeIpmi);
        let invocation = Invocation::for_collector(&collector, &target);
        let shown = invocation.to_string();
        assert!(shown.starts_with("bmc-info "));
        assert!(shown.contains("<secret>"));
        assert!(!shown.contains("calvin"));
        assert!(!format!("{:?}", invocation).contains("calvin"));
    }
}

//! Errors raised while loading a harness configuration.

use thiserror::Error;

/// Why a configuration file or module was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read harness config: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed harness config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `harness:` setting is out of range.
    #[error("invalid harness setting: {0}")]
    Harness(&'static str),

    /// `--module` names a module absent from the file (only `default` is implicit).
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    /// `collector_cmd` / `custom_args` keyed by something that is not a collector.
    #[error("module '{module}': unknown collector '{collector}'")]
    UnknownCollector { module: String, collector: String },

    #[error("module '{module}': sel_events '{matcher}': {reason}")]
    InvalidSelMatcher {
        module: String,
        matcher: String,
        reason: String,
    },

    #[error("module '{module}': {reason}")]
    InvalidModule {
        module: String,
        reason: &'static str,
    },
}

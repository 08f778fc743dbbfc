//! Configuration for the harness.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Harness settings (command timeout, sink capacity)
//! - Per-module target settings (credentials, driver, command overrides, SEL matchers)

mod app;
mod error;
mod module;

pub use app::{AppConfig, DEFAULT_COMMAND_TIMEOUT, DEFAULT_MODULE, HarnessConfig};
pub use error::ConfigError;
pub use module::{ModuleConfig, Privilege, SelEventMatcher};

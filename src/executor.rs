//! Provider command execution.
//!
//! - [`Invocation`]: fully resolved command line for one collector against one target
//! - [`CommandExecutor`]: seam for running an invocation (real processes or test doubles)
//! - [`ProcessExecutor`]: spawns the provider tool with a timeout
//! - [`ExecutionResult`]: raw output plus success/failure, consumed by a collector

mod invocation;
mod process;

pub use invocation::{Invocation, Secret};
pub use process::{CommandExecutor, ExecutionError, ExecutionResult, ProcessExecutor};

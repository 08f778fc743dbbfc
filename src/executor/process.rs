//! Process-backed command execution.

use std::fmt;
use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::DEFAULT_COMMAND_TIMEOUT;
use crate::executor::{Invocation, Secret};

/// Why a provider command did not complete successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The process could not be started.
    #[error("failed to start '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// The process ran but exited unsuccessfully.
    #[error("'{command}' exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    /// The process did not finish in time and was killed.
    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The credential file could not be prepared.
    #[error("credential file error: {0}")]
    Credential(String),
}

/// Raw outcome of one provider command.
///
/// Produced by a [`CommandExecutor`] and consumed exactly once by a collector's
/// conversion step; the harness itself never looks inside.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Command exited successfully.
    Completed { output: Vec<u8> },
    /// Command could not run, failed, or timed out. `output` holds whatever stdout was captured.
    Failed {
        output: Vec<u8>,
        error: ExecutionError,
    },
}

impl ExecutionResult {
    pub fn completed(output: impl Into<Vec<u8>>) -> Self {
        Self::Completed {
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<Vec<u8>>, error: ExecutionError) -> Self {
        Self::Failed {
            output: output.into(),
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Captured standard output regardless of outcome.
    pub fn output(&self) -> &[u8] {
        match self {
            Self::Completed { output } | Self::Failed { output, .. } => output,
        }
    }

    /// Consume the result, yielding stdout as text on success.
    pub fn into_text(self) -> Result<String, ExecutionError> {
        match self {
            Self::Completed { output } => Ok(String::from_utf8_lossy(&output).into_owned()),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(self.output());
        match self {
            Self::Completed { .. } => write!(f, "{{success: true, output: {:?}}}", text),
            Self::Failed { error, .. } => {
                write!(f, "{{success: false, error: {:?}, output: {:?}}}", error.to_string(), text)
            }
        }
    }
}

/// Runs resolved provider invocations.
///
/// Implementations never fail: every problem is encoded in the returned
/// [`ExecutionResult`]. One call spawns at most one process and never retries.
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync + 'static {
    async fn execute(&self, invocation: &Invocation) -> ExecutionResult;
}

/// Executor spawning real provider processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Write credential material to a private temporary file.
///
/// The file is removed when the returned handle is dropped.
fn write_secret(secret: &Secret) -> Result<NamedTempFile, ExecutionError> {
    let mut file = NamedTempFile::new().map_err(|e| ExecutionError::Credential(e.to_string()))?;
    file.write_all(secret.contents().as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| ExecutionError::Credential(e.to_string()))?;
    Ok(file)
}

#[async_trait::async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> ExecutionResult {
        let command = invocation.command().to_string();

        let secret_file = match invocation.secret().map(write_secret).transpose() {
            Ok(file) => file,
            Err(e) => return ExecutionResult::failed(Vec::new(), e),
        };
        let argv = invocation.argv(secret_file.as_ref().map(NamedTempFile::path));

        tracing::debug!(
            command = %command,
            args = ?invocation.display_args(),
            "Executing provider command"
        );

        let mut cmd = Command::new(&command);
        cmd.args(&argv).stdin(Stdio::null()).kill_on_drop(true);

        let start = Instant::now();
        let result = timeout(self.timeout, cmd.output()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(output)) if output.status.success() => {
                tracing::debug!(
                    command = %command,
                    elapsed_ms = elapsed.as_millis(),
                    bytes = output.stdout.len(),
                    "Provider command completed"
                );
                ExecutionResult::completed(output.stdout)
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                tracing::warn!(
                    command = %command,
                    status = %output.status,
                    stderr = %stderr,
                    "Provider command failed"
                );
                ExecutionResult::failed(
                    output.stdout,
                    ExecutionError::Exit {
                        command,
                        status: output.status.to_string(),
                        stderr,
                    },
                )
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    command = %command,
                    error = %e,
                    "Provider command could not be started"
                );
                ExecutionResult::failed(
                    Vec::new(),
                    ExecutionError::Spawn {
                        command,
                        reason: e.to_string(),
                    },
                )
            }
            Err(_) => {
                tracing::warn!(
                    command = %command,
                    timeout_ms = self.timeout.as_millis(),
                    "Provider command timed out"
                );
                ExecutionResult::failed(
                    Vec::new(),
                    ExecutionError::Timeout {
                        command,
                        timeout: self.timeout,
                    },
                )
            }
        }
    }
}

//! Shell-backed [`CommandRunner`].

use super::probe::{CommandRunner, ProbeError};
use crate::config::Config;
use crate::flags::{FeatureFlags, SHARED_COMMAND_TIMEOUT};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs commands through `sh -c` (or `cmd.exe /C` on Windows).
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    cwd: PathBuf,
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            timeout: None,
        }
    }

    /// Kill the command if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a runner for the project in `config`.
    ///
    /// The timeout only applies when `shared_command_timeout` is enabled.
    #[must_use]
    pub fn from_config(config: &Config, flags: &dyn FeatureFlags) -> Self {
        let timeout = flags
            .enabled(SHARED_COMMAND_TIMEOUT)
            .then(|| config.command_timeout());
        Self::new(config.cwd.clone()).with_timeout(timeout)
    }
}

impl SystemCommandRunner {
    async fn run_async(&self, command: &str, tag: &str) -> Result<String, ProbeError> {
        let (shell, shell_arg) = if cfg!(windows) {
            ("cmd.exe", "/C")
        } else {
            ("sh", "-c")
        };

        tracing::debug!(tag, command, cwd = %self.cwd.display(), "running command");

        let io_err = |source: io::Error| ProbeError::Io {
            command: command.to_string(),
            source,
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // output() drains both pipes while waiting
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| {
                    tracing::debug!(tag, command, "command timed out");
                    ProbeError::Timeout {
                        command: command.to_string(),
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    }
                })?,
            None => cmd.output().await,
        }
        .map_err(io_err)?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandRunner for SystemCommandRunner {
    /// Runs on a private current-thread runtime, so it must not be called
    /// from inside another tokio runtime.
    fn run(&self, command: &str, tag: &str) -> Result<String, ProbeError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| ProbeError::Io {
                command: command.to_string(),
                source,
            })?;
        runtime.block_on(self.run_async(command, tag))
    }
}

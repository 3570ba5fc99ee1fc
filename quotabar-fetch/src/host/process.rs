//! Subprocess execution for companion CLI tools.
//!
//! Used for short, read-only probes such as `npm root -g` or
//! `gcloud config get-value project`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ProcessError;

// ============================================================================
// Process Output
// ============================================================================

/// Output from a process execution.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Standard output content.
    pub stdout: String,
    /// Standard error content.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
    /// How long the command took to execute.
    pub duration: Duration,
}

impl ProcessOutput {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the trimmed stdout if successful and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::NonZeroExit` if the command failed.
    pub fn trimmed_stdout(&self) -> Result<Option<&str>, ProcessError> {
        if !self.success() {
            return Err(ProcessError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr.clone(),
            });
        }
        let out = self.stdout.trim();
        Ok((!out.is_empty()).then_some(out))
    }
}

// ============================================================================
// Process Runner
// ============================================================================

/// API for running subprocesses (CLI tools).
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    pub fn new() -> Self {
        Self
    }

    /// Run a command with timeout and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is not on `PATH`, cannot be spawned,
    /// or does not finish within `timeout`.
    #[instrument(skip(self), fields(cmd = %cmd, timeout = ?timeout))]
    pub async fn run_with_timeout(
        &self,
        cmd: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        debug!(args = ?args, "Running command");

        let cmd_path = self.which(cmd).ok_or_else(|| {
            debug!(cmd = %cmd, "Command not found");
            ProcessError::NotFound(cmd.to_string())
        })?;

        let start = Instant::now();

        let mut command = Command::new(&cmd_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(cmd = %cmd, timeout = ?timeout, "Command timed out");
                return Err(ProcessError::Timeout(timeout));
            }
        };

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            duration,
        };

        debug!(
            exit_code = exit_code,
            duration = ?duration,
            stdout_len = result.stdout.len(),
            "Command completed"
        );

        Ok(result)
    }

    /// Find the path to a command.
    pub fn which(&self, cmd: &str) -> Option<PathBuf> {
        which::which(cmd).ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

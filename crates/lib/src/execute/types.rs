//! Types for command execution.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The shell could not be started.
  #[error("failed to spawn '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// Command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed {
    cmd: String,
    code: Option<i32>,
    /// Last lines of stderr, for diagnostics.
    stderr: String,
  },

  /// Command did not finish in time and was killed.
  #[error("command timed out after {timeout:?}: {cmd}")]
  TimedOut { cmd: String, timeout: Duration },
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Exit code, `None` when the process was terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }

  /// Convert a non-zero exit into `ExecuteError::CmdFailed`.
  pub fn check(self, cmd: &str) -> Result<Self, ExecuteError> {
    if self.success() {
      return Ok(self);
    }
    Err(ExecuteError::CmdFailed {
      cmd: cmd.to_string(),
      code: self.code,
      stderr: tail_lines(&self.stderr, STDERR_TAIL_LINES),
    })
  }
}

const STDERR_TAIL_LINES: usize = 20;

fn tail_lines(text: &str, count: usize) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let start = lines.len().saturating_sub(count);
  lines[start..].join("\n")
}

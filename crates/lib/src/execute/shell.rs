//! Shell command execution.
//!
//! Commands run through `/bin/sh -c` in the given working directory. Install
//! commands and [`quote`] assume POSIX shell syntax. The caller's environment is inherited, since
//! virtualenv and pip need the host `PATH` and `HOME`.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::CommandExecutor;
use crate::execute::types::{CommandOutput, ExecuteError};

const SHELL: &str = "/bin/sh";

/// Runs commands through `/bin/sh`.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
  env: BTreeMap<String, String>,
  timeout: Option<Duration>,
}

impl ShellExecutor {
  pub fn new() -> Self {
    Self::default()
  }

  /// Extra environment variables set for every command.
  pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
    self.env = env;
    self
  }

  /// Kill commands that run longer than `timeout`.
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
  async fn execute(&self, cmd: &str, cwd: &Path) -> Result<CommandOutput, ExecuteError> {
    info!(cmd = %cmd, cwd = %cwd.display(), "executing command");

    let mut command = Command::new(SHELL);
    command
      .arg("-c")
      .arg(cmd)
      .current_dir(cwd)
      .envs(&self.env)
      .stdin(Stdio::null())
      .kill_on_drop(true);

    debug!(shell = SHELL, "spawning process");

    let running = command.output();
    let output = match self.timeout {
      Some(timeout) => tokio::time::timeout(timeout, running)
        .await
        .map_err(|_| ExecuteError::TimedOut {
          cmd: cmd.to_string(),
          timeout,
        })?,
      None => running.await,
    }
    .map_err(|source| ExecuteError::Spawn {
      cmd: cmd.to_string(),
      source,
    })?;

    let result = CommandOutput {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !result.stderr.is_empty() {
      debug!(stderr = %result.stderr, "command stderr");
    }
    if !result.stdout.is_empty() {
      debug!(stdout = %result.stdout, "command stdout");
    }
    debug!(code = ?result.code, "command finished");

    Ok(result)
  }
}

/// Quote a single argument for a POSIX shell.
pub fn quote(arg: &str) -> String {
  let safe = !arg.is_empty()
    && arg
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '+' | ','));
  if safe {
    return arg.to_string();
  }
  format!("'{}'", arg.replace('\'', r"'\''"))
}

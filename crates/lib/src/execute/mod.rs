//! Command execution.
//!
//! Every subprocess the pipeline starts goes through a `CommandExecutor`, which
//! reports the exit code and captured output instead of failing on a non-zero
//! exit. Callers decide what counts as failure with `CommandOutput::check`.

pub mod shell;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

pub use shell::ShellExecutor;
pub use types::{CommandOutput, ExecuteError};

/// Runs a shell command in a working directory.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
  /// Run `cmd` in `cwd` and capture its result.
  ///
  /// Only failures to start or finish the process are errors; a non-zero exit
  /// is reported through `CommandOutput::code`.
  async fn execute(&self, cmd: &str, cwd: &Path) -> Result<CommandOutput, ExecuteError>;
}

/// Run a command and turn a non-zero exit into an error.
pub async fn execute_checked(
  executor: &dyn CommandExecutor,
  cmd: &str,
  cwd: &Path,
) -> Result<CommandOutput, ExecuteError> {
  executor.execute(cmd, cwd).await?.check(cmd)
}

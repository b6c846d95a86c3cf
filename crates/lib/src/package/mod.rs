//! Native package emission.
//!
//! Packages are produced by fpm from an installed project tree. The emitter
//! runs through a `CommandExecutor` like every other build step.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::artifact::Artifact;
use crate::execute::shell::quote;
use crate::execute::{CommandExecutor, ExecuteError, execute_checked};

/// Produces a native package from a source tree.
#[async_trait]
pub trait PackageEmitter: Send + Sync {
  async fn emit(&self, name: &str, version: &str, source: &Path) -> Result<Artifact, ExecuteError>;
}

/// Builds packages with `fpm -s dir`.
pub struct FpmEmitter<'a> {
  executor: &'a dyn CommandExecutor,
  output_dir: PathBuf,
  package_type: String,
  overwrite: bool,
}

impl<'a> FpmEmitter<'a> {
  pub fn new(executor: &'a dyn CommandExecutor, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      executor,
      output_dir: output_dir.into(),
      package_type: "deb".to_string(),
      overwrite: true,
    }
  }

  pub fn package_type(mut self, package_type: impl Into<String>) -> Self {
    self.package_type = package_type.into();
    self
  }

  pub fn overwrite(mut self, overwrite: bool) -> Self {
    self.overwrite = overwrite;
    self
  }

  /// The fpm invocation for one package.
  pub fn command(&self, name: &str, version: &str, source: &Path) -> String {
    let mut cmd = format!(
      "fpm -s dir -t {} -n {} -v {}",
      quote(&self.package_type),
      quote(name),
      quote(version)
    );
    if self.overwrite {
      cmd.push_str(" -f");
    }
    cmd.push(' ');
    cmd.push_str(&quote(&source.to_string_lossy()));
    cmd
  }
}

#[async_trait]
impl PackageEmitter for FpmEmitter<'_> {
  async fn emit(&self, name: &str, version: &str, source: &Path) -> Result<Artifact, ExecuteError> {
    info!(name, version, source = %source.display(), "building package");

    let cmd = self.command(name, version, source);
    execute_checked(self.executor, &cmd, &self.output_dir).await?;

    Ok(Artifact::Package {
      output_dir: self.output_dir.clone(),
      name: name.to_string(),
      version: version.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::FakeExecutor;

  #[test]
  fn command_line() {
    let executor = FakeExecutor::new();
    let emitter = FpmEmitter::new(&executor, "/out").package_type("rpm");

    assert_eq!(
      emitter.command("openstack-nova", "2014.2", Path::new("/opt/openstack/nova")),
      "fpm -s dir -t rpm -n openstack-nova -v 2014.2 -f /opt/openstack/nova"
    );
  }

  #[test]
  fn command_line_without_overwrite_quotes_paths() {
    let executor = FakeExecutor::new();
    let emitter = FpmEmitter::new(&executor, "/out").overwrite(false);

    assert_eq!(
      emitter.command("nova", "1.0", Path::new("/opt/my builds/nova")),
      "fpm -s dir -t deb -n nova -v 1.0 '/opt/my builds/nova'"
    );
  }

  #[tokio::test]
  async fn emit_runs_in_output_dir() {
    let executor = FakeExecutor::new();
    let emitter = FpmEmitter::new(&executor, "/out");

    let artifact = emitter.emit("nova", "1.0", Path::new("/opt/nova")).await.unwrap();

    assert_eq!(
      artifact,
      Artifact::Package {
        output_dir: PathBuf::from("/out"),
        name: "nova".to_string(),
        version: "1.0".to_string(),
      }
    );
    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.starts_with("fpm -s dir"));
    assert_eq!(calls[0].1, PathBuf::from("/out"));
  }

  #[tokio::test]
  async fn failing_fpm_is_an_error() {
    let executor = FakeExecutor::new().fail_on("fpm");
    let emitter = FpmEmitter::new(&executor, "/out");

    let err = emitter.emit("nova", "1.0", Path::new("/opt/nova")).await.unwrap_err();

    assert!(matches!(err, ExecuteError::CmdFailed { code: Some(1), .. }));
  }
}

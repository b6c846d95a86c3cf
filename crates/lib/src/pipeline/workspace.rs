//! Per-project working directories.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::consts::APP_NAME;
use crate::pipeline::types::BuildError;

/// Where a project is fetched and built.
#[derive(Debug)]
pub enum Workspace {
  /// A configured install path, created fresh and left in place.
  InstallPath(PathBuf),
  /// A temporary build context, removed once the build ends.
  Temporary(TempDir),
}

impl Workspace {
  /// Create `path`, which must not already exist. Missing parents are created.
  pub fn create_install_path(path: &Path) -> Result<Self, BuildError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| BuildError::Workspace {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    match std::fs::create_dir(path) {
      Ok(()) => Ok(Workspace::InstallPath(path.to_path_buf())),
      Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(BuildError::PathConflict(path.to_path_buf())),
      Err(source) => Err(BuildError::Workspace {
        path: path.to_path_buf(),
        source,
      }),
    }
  }

  pub fn temporary() -> Result<Self, BuildError> {
    tempfile::Builder::new()
      .prefix(&format!("{}-", APP_NAME))
      .tempdir()
      .map(Workspace::Temporary)
      .map_err(|source| BuildError::Workspace {
        path: std::env::temp_dir(),
        source,
      })
  }

  pub fn path(&self) -> &Path {
    match self {
      Workspace::InstallPath(path) => path,
      Workspace::Temporary(dir) => dir.path(),
    }
  }

  /// Finish with the workspace. Temporary directories are deleted; a
  /// directory that is already gone counts as deleted.
  pub fn release(self) -> Result<(), BuildError> {
    let Workspace::Temporary(dir) = self else {
      return Ok(());
    };

    let path = dir.path().to_path_buf();
    debug!(path = %path.display(), "removing workspace");
    match dir.close() {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(source) => Err(BuildError::Cleanup { path, source }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn install_path_is_created_with_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("opt").join("nova");

    let workspace = Workspace::create_install_path(&path).unwrap();

    assert!(path.is_dir());
    assert_eq!(workspace.path(), path);
  }

  #[test]
  fn existing_install_path_conflicts() {
    let temp = TempDir::new().unwrap();

    let err = Workspace::create_install_path(temp.path()).unwrap_err();

    assert!(matches!(err, BuildError::PathConflict(p) if p == temp.path()));
  }

  #[test]
  fn install_path_survives_release() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nova");

    Workspace::create_install_path(&path).unwrap().release().unwrap();

    assert!(path.is_dir());
  }

  #[test]
  fn temporary_is_removed_on_release() {
    let workspace = Workspace::temporary().unwrap();
    let path = workspace.path().to_path_buf();
    std::fs::write(path.join("Dockerfile"), "FROM scratch\n").unwrap();

    workspace.release().unwrap();

    assert!(!path.exists());
  }

  #[test]
  fn already_removed_temporary_is_not_an_error() {
    let workspace = Workspace::temporary().unwrap();
    std::fs::remove_dir_all(workspace.path()).unwrap();

    assert!(workspace.release().is_ok());
  }

  #[test]
  fn failed_removal_is_a_cleanup_error() {
    let workspace = Workspace::temporary().unwrap();
    let path = workspace.path().to_path_buf();
    std::fs::remove_dir_all(&path).unwrap();
    std::fs::write(&path, "not a directory").unwrap();

    let err = workspace.release().unwrap_err();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(err, BuildError::Cleanup { path: p, .. } if p == path));
  }
}

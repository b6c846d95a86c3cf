//! Build outputs.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// The deployable result of building one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
  /// A native package written to `output_dir`.
  Package {
    output_dir: PathBuf,
    name: String,
    version: String,
  },

  /// An image held by the container daemon.
  Image { id: String, tag: String },
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Artifact::Package {
        output_dir,
        name,
        version,
      } => write!(f, "package {} {} in {}", name, version, output_dir.display()),
      Artifact::Image { id, tag } => write!(f, "image {} ({})", tag, id),
    }
  }
}

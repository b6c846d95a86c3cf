//! Error and result types for pipeline runs.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::container::ContainerError;
use crate::execute::ExecuteError;
use crate::fetch::FetchError;
use crate::review::ReviewError;
use crate::template::TemplateError;

/// Errors that can occur while building a single project.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The install path existed before the build started.
  #[error("install path '{0}' already exists")]
  PathConflict(PathBuf),

  /// The workspace directory could not be created.
  #[error("failed to create workspace '{path}': {source}")]
  Workspace {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Review(#[from] ReviewError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  /// A provisioning, install or packaging command failed.
  #[error(transparent)]
  CommandExecution(#[from] ExecuteError),

  #[error("failed to write build descriptor '{path}': {source}")]
  Descriptor {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Container(#[from] ContainerError),

  /// Removing a temporary workspace failed for a reason other than it
  /// already being gone.
  #[error("failed to remove workspace '{path}': {source}")]
  Cleanup {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A run stopped at the first failing project.
#[derive(Debug, Error)]
#[error("build of project '{project}' failed: {source}")]
pub struct PipelineError {
  pub project: String,
  /// Projects that finished before the failure.
  pub completed: usize,
  #[source]
  pub source: BuildError,
}

/// Which kind of artifact a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  Package,
  Container,
}

impl Mode {
  pub fn as_str(self) -> &'static str {
    match self {
      Mode::Package => "package",
      Mode::Container => "container",
    }
  }
}

/// Outcome of one project in a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectOutcome {
  pub project: String,
  /// `None` when per-project artifacts are disabled.
  pub artifact: Option<Artifact>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub mode: Mode,
  pub projects: Vec<ProjectOutcome>,
}

impl RunReport {
  pub fn new(mode: Mode) -> Self {
    Self {
      mode,
      projects: Vec::new(),
    }
  }

  /// Artifacts produced, in build order.
  pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
    self.projects.iter().filter_map(|p| p.artifact.as_ref())
  }
}

//! Build progress reporting.
//!
//! The pipeline reports progress through a `BuildObserver` it is handed,
//! rather than logging directly, so runs can be observed in tests.

use std::fmt;
use std::path::Path;

use tracing::{error, info};

use crate::artifact::Artifact;
use crate::pipeline::types::{BuildError, Mode};
use crate::spec::Project;

/// A stage within a project build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  Fetch,
  Review,
  Provision,
  Dependencies,
  Install,
  Descriptor,
  Package,
  Image,
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Step::Fetch => "fetching source code",
      Step::Review => "resolving review dependencies",
      Step::Provision => "creating the virtualenv",
      Step::Dependencies => "installing pip dependencies to the virtualenv",
      Step::Install => "installing project to the virtualenv",
      Step::Descriptor => "writing build descriptor",
      Step::Package => "building package",
      Step::Image => "building image",
    };
    f.write_str(text)
  }
}

/// Receives pipeline progress events.
pub trait BuildObserver: Send + Sync {
  fn project_started(&self, project: &Project, mode: Mode, workspace: &Path);

  fn step(&self, project: &Project, step: Step);

  fn project_finished(&self, project: &Project, artifact: Option<&Artifact>);

  fn project_failed(&self, project: &Project, error: &BuildError);
}

/// Reports progress as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BuildObserver for TracingObserver {
  fn project_started(&self, project: &Project, mode: Mode, workspace: &Path) {
    info!(
      project = %project.name,
      mode = mode.as_str(),
      workspace = %workspace.display(),
      "beginning build"
    );
  }

  fn step(&self, project: &Project, step: Step) {
    info!(project = %project.name, "{}", step);
  }

  fn project_finished(&self, project: &Project, artifact: Option<&Artifact>) {
    match artifact {
      Some(artifact) => info!(project = %project.name, artifact = %artifact, "build complete"),
      None => info!(project = %project.name, "build complete, artifact deferred to all-in-one"),
    }
  }

  fn project_failed(&self, project: &Project, error: &BuildError) {
    error!(project = %project.name, error = %error, "build failed");
  }
}

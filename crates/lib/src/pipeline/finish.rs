//! Mode-specific build stages.
//!
//! Both modes share fetching and review resolution. They differ in where the
//! source is placed and in what happens to it afterwards, which a `Finisher`
//! supplies.

use std::path::Path;

use async_trait::async_trait;

use crate::artifact::Artifact;
use crate::consts::DESCRIPTOR_FILE;
use crate::container::{ContainerEngine, descriptor};
use crate::execute::{CommandExecutor, execute_checked};
use crate::package::PackageEmitter;
use crate::pipeline::observe::{BuildObserver, Step};
use crate::pipeline::types::{BuildError, Mode};
use crate::pipeline::workspace::Workspace;
use crate::review::ReviewMetadata;
use crate::spec::{Project, Settings};
use crate::template;

/// Everything a finisher needs once the source is in place.
pub struct FinishContext<'a> {
  pub project: &'a Project,
  pub settings: &'a Settings,
  pub workspace: &'a Path,
  pub review: &'a ReviewMetadata,
  pub observer: &'a dyn BuildObserver,
}

#[async_trait]
pub trait Finisher: Send + Sync {
  fn mode(&self) -> Mode;

  /// Create the directory the project is fetched into.
  fn prepare(&self, project: &Project) -> Result<Workspace, BuildError>;

  /// Turn fetched source into an artifact. Returns `None` when the settings
  /// defer artifacts to an all-in-one build.
  async fn finish(&self, cx: FinishContext<'_>) -> Result<Option<Artifact>, BuildError>;
}

/// Installs into the project's install path and packages the result.
pub struct PackageFinisher<'a> {
  executor: &'a dyn CommandExecutor,
  emitter: &'a dyn PackageEmitter,
}

impl<'a> PackageFinisher<'a> {
  pub fn new(executor: &'a dyn CommandExecutor, emitter: &'a dyn PackageEmitter) -> Self {
    Self { executor, emitter }
  }
}

#[async_trait]
impl Finisher for PackageFinisher<'_> {
  fn mode(&self) -> Mode {
    Mode::Package
  }

  fn prepare(&self, project: &Project) -> Result<Workspace, BuildError> {
    Workspace::create_install_path(&project.install_path)
  }

  async fn finish(&self, cx: FinishContext<'_>) -> Result<Option<Artifact>, BuildError> {
    let project = cx.project;

    cx.observer.step(project, Step::Provision);
    execute_checked(self.executor, &project.venv_command, cx.workspace).await?;

    let install = template::substitute(&project.install_command, &cx.review.render_dependencies())?;
    cx.observer.step(project, Step::Dependencies);
    execute_checked(self.executor, &install, cx.workspace).await?;

    cx.observer.step(project, Step::Install);
    execute_checked(self.executor, &project.project_install_command, cx.workspace).await?;

    if cx.settings.all_in_one {
      return Ok(None);
    }

    cx.observer.step(project, Step::Package);
    let artifact = self
      .emitter
      .emit(&project.package_name, &project.version, cx.workspace)
      .await?;
    Ok(Some(artifact))
  }
}

/// Renders a descriptor into a temporary context and builds an image from it.
pub struct ContainerFinisher<'a> {
  engine: ContainerEngine<'a>,
}

impl<'a> ContainerFinisher<'a> {
  pub fn new(engine: ContainerEngine<'a>) -> Self {
    Self { engine }
  }
}

#[async_trait]
impl Finisher for ContainerFinisher<'_> {
  fn mode(&self) -> Mode {
    Mode::Container
  }

  fn prepare(&self, _project: &Project) -> Result<Workspace, BuildError> {
    Workspace::temporary()
  }

  async fn finish(&self, cx: FinishContext<'_>) -> Result<Option<Artifact>, BuildError> {
    let project = cx.project;

    cx.observer.step(project, Step::Descriptor);
    let rendered = descriptor::render(project, cx.settings, &cx.review.render_dependencies())?;
    descriptor::write(cx.workspace, &rendered).map_err(|source| BuildError::Descriptor {
      path: cx.workspace.join(DESCRIPTOR_FILE),
      source,
    })?;

    if cx.settings.all_in_one {
      return Ok(None);
    }

    cx.observer.step(project, Step::Image);
    let image = self.engine.build(&project.name, &project.version, cx.workspace).await?;
    Ok(Some(Artifact::Image {
      id: image.id,
      tag: image.tag,
    }))
  }
}

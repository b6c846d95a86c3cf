//! Build orchestration.
//!
//! Projects are built one at a time in manifest order. Each build fetches the
//! project's source, resolves review metadata, then hands off to a
//! [`Finisher`] for the mode-specific stages. The first failing project stops
//! the run.

pub mod finish;
pub mod observe;
pub mod types;
pub mod workspace;

use std::path::Path;

use tracing::warn;

pub use finish::{ContainerFinisher, FinishContext, Finisher, PackageFinisher};
pub use observe::{BuildObserver, Step, TracingObserver};
pub use types::{BuildError, Mode, PipelineError, ProjectOutcome, RunReport};
pub use workspace::Workspace;

use crate::artifact::Artifact;
use crate::container::{BuildDaemon, ContainerEngine};
use crate::execute::CommandExecutor;
use crate::fetch::SourceFetcher;
use crate::package::PackageEmitter;
use crate::review::ReviewResolver;
use crate::spec::{BuildSpec, Project, Settings};

/// Drives builds for every project in a spec.
pub struct Pipeline<'a> {
  fetcher: &'a dyn SourceFetcher,
  resolver: &'a dyn ReviewResolver,
  observer: &'a dyn BuildObserver,
}

impl<'a> Pipeline<'a> {
  pub fn new(fetcher: &'a dyn SourceFetcher, resolver: &'a dyn ReviewResolver, observer: &'a dyn BuildObserver) -> Self {
    Self {
      fetcher,
      resolver,
      observer,
    }
  }

  /// Build every project into a native package.
  pub async fn run_native(
    &self,
    spec: &BuildSpec,
    executor: &dyn CommandExecutor,
    emitter: &dyn PackageEmitter,
  ) -> Result<RunReport, PipelineError> {
    let finisher = PackageFinisher::new(executor, emitter);
    self.run(spec, &finisher).await
  }

  /// Build every project into a container image.
  pub async fn run_container(&self, spec: &BuildSpec, daemon: &dyn BuildDaemon) -> Result<RunReport, PipelineError> {
    let engine = ContainerEngine::new(daemon)
      .no_cache(spec.settings.no_cache)
      .build_timeout(spec.settings.build_timeout());
    let finisher = ContainerFinisher::new(engine);
    self.run(spec, &finisher).await
  }

  /// Build every project with `finisher`, stopping at the first failure.
  pub async fn run(&self, spec: &BuildSpec, finisher: &dyn Finisher) -> Result<RunReport, PipelineError> {
    let mut report = RunReport::new(finisher.mode());

    for project in &spec.projects {
      match self.build_project(project, &spec.settings, finisher).await {
        Ok(artifact) => {
          self.observer.project_finished(project, artifact.as_ref());
          report.projects.push(ProjectOutcome {
            project: project.name.clone(),
            artifact,
          });
        }
        Err(source) => {
          self.observer.project_failed(project, &source);
          return Err(PipelineError {
            project: project.name.clone(),
            completed: report.projects.len(),
            source,
          });
        }
      }
    }

    Ok(report)
  }

  async fn build_project(
    &self,
    project: &Project,
    settings: &Settings,
    finisher: &dyn Finisher,
  ) -> Result<Option<Artifact>, BuildError> {
    let workspace = finisher.prepare(project)?;
    self.observer.project_started(project, finisher.mode(), workspace.path());

    let outcome = self.build_in(project, settings, finisher, workspace.path()).await;
    let released = workspace.release();

    match (outcome, released) {
      (Ok(artifact), Ok(())) => Ok(artifact),
      (Ok(_), Err(cleanup)) => Err(cleanup),
      (Err(e), Ok(())) => Err(e),
      (Err(e), Err(cleanup)) => {
        warn!(project = %project.name, error = %cleanup, "workspace cleanup failed after build error");
        Err(e)
      }
    }
  }

  async fn build_in(
    &self,
    project: &Project,
    settings: &Settings,
    finisher: &dyn Finisher,
    workspace: &Path,
  ) -> Result<Option<Artifact>, BuildError> {
    self.observer.step(project, Step::Fetch);
    let source = self.fetcher.fetch(&project.giturl, &project.gitref, workspace).await?;

    self.observer.step(project, Step::Review);
    let review = self.resolver.resolve(source.change_id.as_deref(), project).await?;

    finisher
      .finish(FinishContext {
        project,
        settings,
        workspace,
        review: &review,
        observer: self.observer,
      })
      .await
  }
}

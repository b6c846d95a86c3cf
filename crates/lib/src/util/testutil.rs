//! Test doubles for the pipeline's collaborators.
//!
//! Each fake records what it was asked to do so tests can assert on call
//! order and arguments without touching git, Gerrit, fpm or a daemon.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::artifact::Artifact;
use crate::consts::DESCRIPTOR_FILE;
use crate::container::{BuildDaemon, BuildRequest, BuildResponse, DaemonError};
use crate::execute::{CommandExecutor, CommandOutput, ExecuteError};
use crate::fetch::{FetchError, FetchedSource, SourceFetcher};
use crate::package::PackageEmitter;
use crate::pipeline::{BuildError, BuildObserver, Mode, Step};
use crate::review::{ReviewError, ReviewMetadata, ReviewResolver};
use crate::spec::Project;

/// A fully resolved project with the default commands.
pub fn project(name: &str) -> Project {
  Project {
    name: name.to_string(),
    giturl: format!("https://github.com/openstack/{}.git", name),
    gitref: "master".to_string(),
    version: "2014.2".to_string(),
    install_path: PathBuf::from("/tmp/giftwrap-test").join(name),
    package_name: name.to_string(),
    gerrit_project: format!("openstack/{}", name),
    venv_command: "virtualenv .venv".to_string(),
    install_command: ".venv/bin/pip install %s".to_string(),
    project_install_command: ".venv/bin/python setup.py install".to_string(),
  }
}

/// Records commands; succeeds unless the command contains `fail_on`.
#[derive(Default)]
pub struct FakeExecutor {
  fail_on: Option<String>,
  calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeExecutor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_on(mut self, needle: &str) -> Self {
    self.fail_on = Some(needle.to_string());
    self
  }

  pub fn calls(&self) -> Vec<(String, PathBuf)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
  async fn execute(&self, cmd: &str, cwd: &Path) -> Result<CommandOutput, ExecuteError> {
    self.calls.lock().unwrap().push((cmd.to_string(), cwd.to_path_buf()));
    let failed = self.fail_on.as_deref().is_some_and(|needle| cmd.contains(needle));
    Ok(CommandOutput {
      code: Some(if failed { 1 } else { 0 }),
      stdout: String::new(),
      stderr: if failed { "boom\n".to_string() } else { String::new() },
    })
  }
}

/// Writes a `setup.py` into the destination instead of cloning.
#[derive(Default)]
pub struct FakeFetcher {
  change_id: Option<String>,
  failing: bool,
  calls: Mutex<Vec<(String, String, PathBuf)>>,
}

impl FakeFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing() -> Self {
    Self {
      failing: true,
      ..Self::default()
    }
  }

  pub fn with_change_id(mut self, change_id: &str) -> Self {
    self.change_id = Some(change_id.to_string());
    self
  }

  /// `(url, gitref, dest)` per call.
  pub fn calls(&self) -> Vec<(String, String, PathBuf)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
  async fn fetch(&self, url: &str, gitref: &str, dest: &Path) -> Result<FetchedSource, FetchError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((url.to_string(), gitref.to_string(), dest.to_path_buf()));

    if self.failing {
      return Err(FetchError::Clone {
        url: url.to_string(),
        source: "repository not found".into(),
      });
    }

    std::fs::write(dest.join("setup.py"), "").unwrap();
    Ok(FetchedSource {
      path: dest.to_path_buf(),
      commit: "0".repeat(40),
      change_id: self.change_id.clone(),
    })
  }
}

/// Returns a fixed dependency list.
pub struct FakeResolver {
  dependencies: Vec<String>,
  change_ids: Mutex<Vec<Option<String>>>,
}

impl FakeResolver {
  pub fn with_dependencies(dependencies: &[&str]) -> Self {
    Self {
      dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
      change_ids: Mutex::new(Vec::new()),
    }
  }

  pub fn change_ids(&self) -> Vec<Option<String>> {
    self.change_ids.lock().unwrap().clone()
  }
}

#[async_trait]
impl ReviewResolver for FakeResolver {
  async fn resolve(&self, change_id: Option<&str>, _project: &Project) -> Result<ReviewMetadata, ReviewError> {
    let change_id = change_id.map(str::to_string);
    self.change_ids.lock().unwrap().push(change_id.clone());
    Ok(ReviewMetadata::new(change_id, self.dependencies.clone()))
  }
}

/// Records package requests.
#[derive(Default)]
pub struct FakeEmitter {
  calls: Mutex<Vec<(String, String, PathBuf)>>,
}

impl FakeEmitter {
  /// `(name, version, source)` per call.
  pub fn calls(&self) -> Vec<(String, String, PathBuf)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl PackageEmitter for FakeEmitter {
  async fn emit(&self, name: &str, version: &str, source: &Path) -> Result<Artifact, ExecuteError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((name.to_string(), version.to_string(), source.to_path_buf()));
    Ok(Artifact::Package {
      output_dir: PathBuf::from("/out"),
      name: name.to_string(),
      version: version.to_string(),
    })
  }
}

enum DaemonReply {
  Respond(BuildResponse),
  Unreachable,
}

/// Replays a canned response and captures the descriptor it was sent.
pub struct FakeDaemon {
  reply: DaemonReply,
  delay: Option<Duration>,
  requests: Mutex<Vec<BuildRequest>>,
  descriptors: Mutex<Vec<String>>,
}

impl FakeDaemon {
  fn new(reply: DaemonReply) -> Self {
    Self {
      reply,
      delay: None,
      requests: Mutex::new(Vec::new()),
      descriptors: Mutex::new(Vec::new()),
    }
  }

  /// Streams a short log ending in the success marker for `id`.
  pub fn succeeding(id: &str) -> Self {
    Self::responding(BuildResponse::Streamed(vec![
      serde_json::json!({ "stream": "Step 1 : FROM python:2\n" }).to_string(),
      serde_json::json!({ "stream": format!("Successfully built {}\n", id) }).to_string(),
    ]))
  }

  pub fn responding(response: BuildResponse) -> Self {
    Self::new(DaemonReply::Respond(response))
  }

  pub fn unreachable() -> Self {
    Self::new(DaemonReply::Unreachable)
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn requests(&self) -> Vec<BuildRequest> {
    self.requests.lock().unwrap().clone()
  }

  /// Descriptor contents as they were when each build was requested.
  pub fn descriptors(&self) -> Vec<String> {
    self.descriptors.lock().unwrap().clone()
  }
}

#[async_trait]
impl BuildDaemon for FakeDaemon {
  async fn build(&self, request: &BuildRequest) -> Result<BuildResponse, DaemonError> {
    self.requests.lock().unwrap().push(request.clone());
    let descriptor = std::fs::read_to_string(request.context.join(DESCRIPTOR_FILE)).unwrap_or_default();
    self.descriptors.lock().unwrap().push(descriptor);

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    match &self.reply {
      DaemonReply::Respond(response) => Ok(response.clone()),
      DaemonReply::Unreachable => Err(DaemonError::Request(
        bollard::errors::Error::DockerResponseServerError {
          status_code: 500,
          message: "daemon unreachable".to_string(),
        },
      )),
    }
  }
}

/// An observed pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Started(String, Mode),
  Step(String, Step),
  Finished(String),
  Failed(String),
}

#[derive(Default)]
pub struct RecordingObserver {
  events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
  pub fn events(&self) -> Vec<Event> {
    self.events.lock().unwrap().clone()
  }

  pub fn failures(&self) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        Event::Failed(name) => Some(name),
        _ => None,
      })
      .collect()
  }
}

impl BuildObserver for RecordingObserver {
  fn project_started(&self, project: &Project, mode: Mode, _workspace: &Path) {
    self.events.lock().unwrap().push(Event::Started(project.name.clone(), mode));
  }

  fn step(&self, project: &Project, step: Step) {
    self.events.lock().unwrap().push(Event::Step(project.name.clone(), step));
  }

  fn project_finished(&self, project: &Project, _artifact: Option<&Artifact>) {
    self.events.lock().unwrap().push(Event::Finished(project.name.clone()));
  }

  fn project_failed(&self, project: &Project, _error: &BuildError) {
    self.events.lock().unwrap().push(Event::Failed(project.name.clone()));
  }
}

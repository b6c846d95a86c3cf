//! Manifest and build specification types.
//!
//! `SpecFile` mirrors the YAML manifest as written by users. It is resolved
//! into a `BuildSpec`, where every `Project` carries concrete values for all of
//! its fields.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_CONNECT_TIMEOUT_SECS;

/// The manifest as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecFile {
  #[serde(default)]
  pub settings: Settings,
  #[serde(default)]
  pub projects: Vec<ProjectDef>,
}

/// Global settings shared by every project in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  /// Skip per-project artifacts in favor of one aggregate artifact.
  pub all_in_one: bool,

  /// Default version for projects that do not set their own.
  pub version: Option<String>,

  /// Parent directory for install paths that are not set explicitly.
  pub base_path: PathBuf,

  /// Package name pattern; `{name}` is replaced with the project name.
  pub package_name_format: String,

  /// Native package format handed to fpm (`deb`, `rpm`, ...).
  pub package_type: String,

  /// Directory packages are written to.
  pub output_dir: PathBuf,

  /// Overwrite existing package files.
  pub force_overwrite: bool,

  /// Resolve extra pip dependencies from code review.
  pub gerrit_dependencies: bool,

  pub gerrit_url: String,

  /// Base image for generated build descriptors.
  pub base_image: String,

  /// System packages installed into the image before the project.
  pub system_packages: Vec<String>,

  pub docker_socket: String,

  /// Disable layer cache reuse when building images.
  pub no_cache: bool,

  pub connect_timeout_secs: u64,
  pub build_timeout_secs: Option<u64>,
  pub command_timeout_secs: Option<u64>,

  /// Extra environment variables for every command.
  pub environment: BTreeMap<String, String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      all_in_one: false,
      version: None,
      base_path: PathBuf::from("/opt/openstack"),
      package_name_format: "openstack-{name}".to_string(),
      package_type: "deb".to_string(),
      output_dir: PathBuf::from("."),
      force_overwrite: true,
      gerrit_dependencies: true,
      gerrit_url: "https://review.openstack.org".to_string(),
      base_image: "python:2".to_string(),
      system_packages: vec!["git".to_string(), "wget".to_string(), "curl".to_string()],
      docker_socket: "unix:///var/run/docker.sock".to_string(),
      no_cache: true,
      connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
      build_timeout_secs: None,
      command_timeout_secs: None,
      environment: BTreeMap::new(),
    }
  }
}

impl Settings {
  pub fn connect_timeout(&self) -> Duration {
    Duration::from_secs(self.connect_timeout_secs)
  }

  pub fn build_timeout(&self) -> Option<Duration> {
    self.build_timeout_secs.map(Duration::from_secs)
  }

  pub fn command_timeout(&self) -> Option<Duration> {
    self.command_timeout_secs.map(Duration::from_secs)
  }
}

/// A project entry as written in the manifest. Only `name` is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDef {
  pub name: String,
  pub giturl: Option<String>,
  pub gitref: Option<String>,
  pub version: Option<String>,
  pub install_path: Option<PathBuf>,
  pub package_name: Option<String>,
  pub gerrit_project: Option<String>,
  pub venv_command: Option<String>,
  pub install_command: Option<String>,
  pub project_install_command: Option<String>,
}

/// A fully resolved unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
  pub name: String,
  pub giturl: String,
  pub gitref: String,
  pub version: String,
  pub install_path: PathBuf,
  pub package_name: String,
  /// Project path on the review server, e.g. `openstack/nova`.
  pub gerrit_project: String,
  /// Creates the isolated Python environment.
  pub venv_command: String,
  /// Installs dependencies; has one `%s` slot for the dependency list.
  pub install_command: String,
  /// Installs the project itself into the environment.
  pub project_install_command: String,
}

/// Root configuration for a build run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSpec {
  pub settings: Settings,
  pub projects: Vec<Project>,
}

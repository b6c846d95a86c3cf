//! Build manifest loading.
//!
//! A manifest is a YAML document with a `settings` table and an ordered list of
//! `projects`. Loading resolves every project's defaults against the settings
//! and validates the result, so the pipeline only ever sees complete projects.

mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::template::{self, TemplateError};

pub use types::{BuildSpec, Project, ProjectDef, Settings, SpecFile};

const DEFAULT_GITREF: &str = "master";
const DEFAULT_VENV_COMMAND: &str = "virtualenv .venv";
const DEFAULT_INSTALL_COMMAND: &str = ".venv/bin/pip install %s";
const DEFAULT_PROJECT_INSTALL_COMMAND: &str = ".venv/bin/python setup.py install";

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum SpecError {
  #[error("failed to read manifest '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid manifest '{path}': {source}")]
  Manifest {
    path: PathBuf,
    #[source]
    source: Box<SpecError>,
  },

  #[error("failed to parse manifest: {0}")]
  Parse(#[from] serde_yaml::Error),

  #[error("project #{0} has an empty name")]
  EmptyName(usize),

  #[error("project '{0}' is declared more than once")]
  DuplicateProject(String),

  #[error("project '{0}' has no version and settings.version is not set")]
  MissingVersion(String),

  #[error("project '{project}' has an invalid install_command: {source}")]
  InstallCommand {
    project: String,
    #[source]
    source: TemplateError,
  },
}

impl BuildSpec {
  /// Load and resolve a manifest file.
  pub fn load(path: &Path) -> Result<Self, SpecError> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded manifest");
    Self::from_yaml(&content).map_err(|e| SpecError::Manifest {
      path: path.to_path_buf(),
      source: Box::new(e),
    })
  }

  /// Parse and resolve a manifest from YAML text.
  pub fn from_yaml(content: &str) -> Result<Self, SpecError> {
    let file: SpecFile = serde_yaml::from_str(content)?;
    Self::resolve(file)
  }

  /// Fill project defaults from the settings and validate the result.
  pub fn resolve(file: SpecFile) -> Result<Self, SpecError> {
    let SpecFile { settings, projects } = file;
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(projects.len());

    for (index, def) in projects.into_iter().enumerate() {
      let project = resolve_project(def, &settings, index)?;
      if !seen.insert(project.name.clone()) {
        return Err(SpecError::DuplicateProject(project.name));
      }
      resolved.push(project);
    }

    Ok(Self {
      settings,
      projects: resolved,
    })
  }

  /// Find a project by name.
  pub fn project(&self, name: &str) -> Option<&Project> {
    self.projects.iter().find(|p| p.name == name)
  }
}

fn resolve_project(def: ProjectDef, settings: &Settings, index: usize) -> Result<Project, SpecError> {
  let name = def.name.trim().to_string();
  if name.is_empty() {
    return Err(SpecError::EmptyName(index));
  }

  let version = def
    .version
    .or_else(|| settings.version.clone())
    .ok_or_else(|| SpecError::MissingVersion(name.clone()))?;

  let install_command = def
    .install_command
    .unwrap_or_else(|| DEFAULT_INSTALL_COMMAND.to_string());
  template::validate(&install_command).map_err(|source| SpecError::InstallCommand {
    project: name.clone(),
    source,
  })?;

  Ok(Project {
    giturl: def
      .giturl
      .unwrap_or_else(|| format!("https://github.com/openstack/{}.git", name)),
    gitref: def.gitref.unwrap_or_else(|| DEFAULT_GITREF.to_string()),
    install_path: def.install_path.unwrap_or_else(|| settings.base_path.join(&name)),
    package_name: def
      .package_name
      .unwrap_or_else(|| settings.package_name_format.replace("{name}", &name)),
    gerrit_project: def.gerrit_project.unwrap_or_else(|| format!("openstack/{}", name)),
    venv_command: def.venv_command.unwrap_or_else(|| DEFAULT_VENV_COMMAND.to_string()),
    project_install_command: def
      .project_install_command
      .unwrap_or_else(|| DEFAULT_PROJECT_INSTALL_COMMAND.to_string()),
    install_command,
    version,
    name,
  })
}

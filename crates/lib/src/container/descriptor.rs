//! Build descriptor (Dockerfile) generation.

use std::path::Path;

use tracing::info;

use crate::consts::{DESCRIPTOR_FILE, IMAGE_SOURCE_ROOT};
use crate::spec::{Project, Settings};
use crate::template::{self, TemplateError};

/// Render the descriptor for a project.
///
/// The directives are, in order: the base image, a system package install,
/// a copy of the build context to `/opt/<name>`, a matching working
/// directory, then the environment, dependency and project install steps.
/// `dependencies` is substituted into the project's install command.
pub fn render(project: &Project, settings: &Settings, dependencies: &str) -> Result<String, TemplateError> {
  let install_command = template::substitute(&project.install_command, dependencies)?;
  let source_dir = format!("{}/{}", IMAGE_SOURCE_ROOT, project.name);

  let lines = [
    format!("FROM {}", settings.base_image),
    format!(
      "RUN apt-get -yqq update && apt-get -yqq install {}",
      settings.system_packages.join(" ")
    ),
    format!("ADD . {}", source_dir),
    format!("WORKDIR {}", source_dir),
    format!("RUN {}", project.venv_command),
    format!("RUN {}", install_command),
    format!("RUN {}", project.project_install_command),
  ];

  let mut descriptor = lines.join("\n");
  descriptor.push_str("\n\n");
  Ok(descriptor)
}

/// Write a rendered descriptor into a build context directory.
pub fn write(context: &Path, descriptor: &str) -> std::io::Result<()> {
  let path = context.join(DESCRIPTOR_FILE);
  info!(path = %path.display(), "writing build descriptor");
  std::fs::write(path, descriptor)
}

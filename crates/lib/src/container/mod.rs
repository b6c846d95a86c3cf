//! Container image builds.
//!
//! A project's workspace becomes a build context: a descriptor is rendered
//! into it, the daemon builds it, and the daemon's response is parsed for the
//! resulting image id.

pub mod daemon;
pub mod descriptor;
pub mod engine;
pub mod parse;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use daemon::DockerDaemon;
pub use engine::{BuildDaemon, BuildRequest, BuiltImage, ContainerEngine};
pub use parse::{BuildResponse, ParsedBuild, StreamShape, parse_build_response};

/// Errors talking to the build daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
  #[error("failed to connect to the container daemon: {0}")]
  Connect(#[source] bollard::errors::Error),

  #[error("build request failed: {0}")]
  Request(#[source] bollard::errors::Error),

  #[error("failed to archive build context '{path}': {source}")]
  Context {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("build task failed: {0}")]
  Task(String),
}

/// Errors from building an image.
#[derive(Debug, Error)]
pub enum ContainerError {
  /// The build finished without announcing an image id.
  #[error("image build for '{tag}' did not report a built image ({} log lines)", .logs.len())]
  ImageBuildFailed { tag: String, logs: Vec<String> },

  #[error("image build for '{tag}' timed out after {timeout:?}")]
  TimedOut { tag: String, timeout: Duration },

  #[error(transparent)]
  Daemon(#[from] DaemonError),
}

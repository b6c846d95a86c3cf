//! Container image builds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::container::parse::{BuildResponse, parse_build_response};
use crate::container::{ContainerError, DaemonError};

/// What the engine asks the daemon to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  /// Directory holding the descriptor and everything it copies.
  pub context: PathBuf,
  pub tag: String,
  /// Disable layer cache reuse.
  pub no_cache: bool,
  /// Remove intermediate containers after a successful build.
  pub remove_intermediate: bool,
  /// Report log records as they arrive instead of only at the end.
  pub stream: bool,
}

/// A daemon that can build images from a context directory.
#[async_trait]
pub trait BuildDaemon: Send + Sync {
  async fn build(&self, request: &BuildRequest) -> Result<BuildResponse, DaemonError>;
}

/// A successfully built image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
  pub id: String,
  pub tag: String,
}

/// Drives a build daemon and interprets its response.
pub struct ContainerEngine<'a> {
  daemon: &'a dyn BuildDaemon,
  no_cache: bool,
  build_timeout: Option<Duration>,
}

impl<'a> ContainerEngine<'a> {
  pub fn new(daemon: &'a dyn BuildDaemon) -> Self {
    Self {
      daemon,
      no_cache: true,
      build_timeout: None,
    }
  }

  pub fn no_cache(mut self, no_cache: bool) -> Self {
    self.no_cache = no_cache;
    self
  }

  /// Upper bound on a single build; `None` waits indefinitely.
  pub fn build_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.build_timeout = timeout;
    self
  }

  /// Build `context` into an image tagged `name:version`.
  pub async fn build(&self, name: &str, version: &str, context: &Path) -> Result<BuiltImage, ContainerError> {
    let tag = format!("{}:{}", name, version);
    let request = BuildRequest {
      context: context.to_path_buf(),
      tag: tag.clone(),
      no_cache: self.no_cache,
      remove_intermediate: true,
      stream: false,
    };

    info!(tag = %tag, context = %context.display(), "building image");

    let response = match self.build_timeout {
      Some(timeout) => tokio::time::timeout(timeout, self.daemon.build(&request))
        .await
        .map_err(|_| ContainerError::TimedOut {
          tag: tag.clone(),
          timeout,
        })??,
      None => self.daemon.build(&request).await?,
    };

    let parsed = parse_build_response(response);
    debug!(fragments = parsed.logs.len(), "parsed build response");

    match parsed.image_id {
      Some(id) => {
        info!(tag = %tag, id = %id, "built image");
        Ok(BuiltImage { id, tag })
      }
      None => {
        info!("build logs: \n {}", parsed.logs.concat());
        Err(ContainerError::ImageBuildFailed { tag, logs: parsed.logs })
      }
    }
  }
}

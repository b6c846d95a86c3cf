//! Docker daemon client.
//!
//! The build context directory is archived and sent to the daemon's build
//! endpoint. Every log record the daemon streams back is kept as one JSON line,
//! so the response reaches the parser in its wire form.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bollard::image::BuildImageOptions;
use bollard::models::BuildInfo;
use bollard::{API_DEFAULT_VERSION, Docker};
use futures::StreamExt;
use tracing::debug;

use crate::consts::DESCRIPTOR_FILE;
use crate::container::DaemonError;
use crate::container::engine::{BuildDaemon, BuildRequest};
use crate::container::parse::BuildResponse;

/// Builds images through a local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerDaemon {
  socket: String,
  connect_timeout: Duration,
}

impl DockerDaemon {
  pub fn new(socket: impl Into<String>, connect_timeout: Duration) -> Self {
    Self {
      socket: socket.into(),
      connect_timeout,
    }
  }

  /// Open a fresh client; connections are not reused between builds.
  fn connect(&self) -> Result<Docker, DaemonError> {
    Docker::connect_with_unix(&self.socket, self.connect_timeout.as_secs(), API_DEFAULT_VERSION)
      .map_err(DaemonError::Connect)
  }
}

#[async_trait]
impl BuildDaemon for DockerDaemon {
  async fn build(&self, request: &BuildRequest) -> Result<BuildResponse, DaemonError> {
    let docker = self.connect()?;

    let context = request.context.clone();
    let archive = tokio::task::spawn_blocking(move || archive_context(&context))
      .await
      .map_err(|e| DaemonError::Task(e.to_string()))?
      .map_err(|source| DaemonError::Context {
        path: request.context.clone(),
        source,
      })?;

    let options = BuildImageOptions {
      dockerfile: DESCRIPTOR_FILE.to_string(),
      t: request.tag.clone(),
      q: false,
      nocache: request.no_cache,
      rm: request.remove_intermediate,
      ..Default::default()
    };

    debug!(tag = %request.tag, bytes = archive.len(), "sending build context");

    let mut records = std::pin::pin!(docker.build_image(options, None, Some(archive.into())));
    let mut lines = Vec::new();

    while let Some(item) = records.next().await {
      let line = match item {
        Ok(info) => encode_record(&info),
        // The daemon reports build step failures in-band.
        Err(bollard::errors::Error::DockerStreamError { error }) => serde_json::json!({ "error": error }).to_string(),
        Err(e) => return Err(DaemonError::Request(e)),
      };
      if request.stream {
        debug!(record = %line, "build record");
      }
      lines.push(line);
    }

    Ok(BuildResponse::Streamed(lines))
  }
}

/// Re-encode a decoded build record as the JSON line the daemon sent.
fn encode_record(info: &BuildInfo) -> String {
  let mut record = serde_json::Map::new();
  if let Some(stream) = &info.stream {
    record.insert("stream".to_string(), stream.clone().into());
  }
  if let Some(status) = &info.status {
    record.insert("status".to_string(), status.clone().into());
  }
  if let Some(error) = &info.error {
    record.insert("error".to_string(), error.clone().into());
  }
  serde_json::Value::Object(record).to_string()
}

/// Tar up a build context directory.
fn archive_context(path: &Path) -> std::io::Result<Vec<u8>> {
  let mut builder = tar::Builder::new(Vec::new());
  builder.follow_symlinks(false);
  builder.append_dir_all(".", path)?;
  builder.into_inner()
}

//! Gerrit-backed review resolution.
//!
//! The dependencies a change was tested with are recovered from CI: the newest
//! successful `gate-<project>-python27` run is located through the change's
//! review messages, and every `name==version` pin printed in that job's
//! console log becomes a dependency.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::consts::APP_NAME;
use crate::fetch::is_commit_id;
use crate::review::{ReviewError, ReviewMetadata, ReviewResolver};
use crate::spec::Project;

/// Gerrit prefixes JSON responses with this line to defeat XSSI.
const XSSI_PREFIX: &str = ")]}'";

static PIN_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)^(?:.*\|\s*)?([A-Za-z0-9][A-Za-z0-9._\-]*==[A-Za-z0-9][A-Za-z0-9._+!\-]*)\s*$")
    .expect("pin regex is valid")
});

#[derive(Debug, Deserialize)]
struct ChangeDetail {
  #[serde(default)]
  messages: Vec<ChangeMessage>,
}

#[derive(Debug, Deserialize)]
struct ChangeMessage {
  #[serde(default)]
  message: String,
}

/// Resolves patch-set dependencies from a Gerrit server.
#[derive(Debug, Clone)]
pub struct GerritResolver {
  base_url: String,
  client: reqwest::Client,
  enabled: bool,
}

impl GerritResolver {
  pub fn new(base_url: impl Into<String>) -> Self {
    let client = reqwest::Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .build()
      .unwrap_or_default();

    Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      client,
      enabled: true,
    }
  }

  /// Turn dependency lookups off; changes still report their id.
  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  async fn get_text(&self, url: &str) -> Result<String, ReviewError> {
    debug!(url, "requesting");
    let response = self.client.get(url).send().await.map_err(|e| ReviewError::Request {
      url: url.to_string(),
      message: e.to_string(),
    })?;

    if !response.status().is_success() {
      return Err(ReviewError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    response.text().await.map_err(|e| ReviewError::Request {
      url: url.to_string(),
      message: e.to_string(),
    })
  }

  /// `GET /changes/{id}/detail`, with the id percent-encoded as one segment.
  fn detail_url(&self, lookup_id: &str) -> Result<reqwest::Url, ReviewError> {
    let request_err = |message: String| ReviewError::Request {
      url: self.base_url.clone(),
      message,
    };

    let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| request_err(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|()| request_err("base URL cannot carry a path".to_string()))?
      .pop_if_empty()
      .extend(["changes", lookup_id, "detail"]);
    Ok(url)
  }

  async fn change_detail(&self, change_id: &str, project: &Project) -> Result<ChangeDetail, ReviewError> {
    let url = self.detail_url(&lookup_id(change_id, project))?;
    let body = self.get_text(url.as_str()).await?;
    let json = body.strip_prefix(XSSI_PREFIX).unwrap_or(&body);

    serde_json::from_str(json).map_err(|source| ReviewError::Decode {
      change_id: change_id.to_string(),
      source,
    })
  }
}

#[async_trait]
impl ReviewResolver for GerritResolver {
  async fn resolve(&self, change_id: Option<&str>, project: &Project) -> Result<ReviewMetadata, ReviewError> {
    let Some(change_id) = change_id else {
      debug!(project = %project.name, "no change id, skipping review lookup");
      return Ok(ReviewMetadata::default());
    };

    if !self.enabled {
      return Ok(ReviewMetadata::new(Some(change_id.to_string()), Vec::new()));
    }

    let detail = self.change_detail(change_id, project).await?;
    let job = gate_job_name(&project.name);

    let Some(log_url) = latest_job_log_url(&detail.messages, &job) else {
      warn!(project = %project.name, change_id, job = %job, "no successful gate run found, using no extra dependencies");
      return Ok(ReviewMetadata::new(Some(change_id.to_string()), Vec::new()));
    };

    let console = self
      .get_text(&format!("{}/console.html", log_url.trim_end_matches('/')))
      .await?;
    let dependencies = pinned_dependencies(&console, &project.name);

    info!(
      project = %project.name,
      change_id,
      count = dependencies.len(),
      "resolved review dependencies"
    );

    Ok(ReviewMetadata::new(Some(change_id.to_string()), dependencies))
  }
}

/// The change lookup id. A Change-Id alone can match one change per project
/// and branch, so it is qualified as `project~branch~Change-Id`. Commit ids
/// and non-branch refs name no branch and fall back to `project~Change-Id`.
fn lookup_id(change_id: &str, project: &Project) -> String {
  match branch_name(&project.gitref) {
    Some(branch) => format!("{}~{}~{}", project.gerrit_project, branch, change_id),
    None => format!("{}~{}", project.gerrit_project, change_id),
  }
}

fn branch_name(gitref: &str) -> Option<&str> {
  if let Some(branch) = gitref.strip_prefix("refs/heads/") {
    return Some(branch);
  }
  if gitref.starts_with("refs/") || is_commit_id(gitref) {
    return None;
  }
  Some(gitref)
}

fn gate_job_name(project: &str) -> String {
  format!("gate-{}-python27", project)
}

/// Find the log URL of the newest successful run of `job`.
fn latest_job_log_url(messages: &[ChangeMessage], job: &str) -> Option<String> {
  let pattern = format!(r"{}\s+(\S+)\s*:\s*SUCCESS", regex::escape(job));
  let re = Regex::new(&pattern).ok()?;

  messages
    .iter()
    .rev()
    .find_map(|m| re.captures(&m.message).map(|c| c[1].to_string()))
}

/// Collect `name==version` pins from a console log, skipping the project itself.
fn pinned_dependencies(console: &str, project: &str) -> Vec<String> {
  let own_name = normalize_name(project);
  let mut seen = HashSet::new();

  PIN_RE
    .captures_iter(console)
    .map(|c| c[1].to_string())
    .filter(|pin| {
      let name = pin.split("==").next().unwrap_or_default();
      normalize_name(name) != own_name
    })
    .filter(|pin| seen.insert(pin.clone()))
    .collect()
}

fn normalize_name(name: &str) -> String {
  name.to_ascii_lowercase().replace('_', "-")
}

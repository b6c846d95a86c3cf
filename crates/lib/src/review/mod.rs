//! Code-review metadata.
//!
//! A project checked out from a pending review may need dependency versions
//! that differ from what its requirements files say. A `ReviewResolver` looks
//! the change up and reports those extra pip requirements.

pub mod gerrit;

use async_trait::async_trait;
use thiserror::Error;

use crate::spec::Project;

pub use gerrit::GerritResolver;

/// Errors that can occur while resolving review metadata.
#[derive(Debug, Error)]
pub enum ReviewError {
  #[error("request to '{url}' failed: {message}")]
  Request { url: String, message: String },

  #[error("unexpected response from '{url}': HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("failed to decode change '{change_id}': {source}")]
  Decode {
    change_id: String,
    #[source]
    source: serde_json::Error,
  },
}

/// What a review contributes to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewMetadata {
  pub change_id: Option<String>,
  /// Extra pip requirement specifiers, in install order.
  pub dependencies: Vec<String>,
}

impl ReviewMetadata {
  pub fn new(change_id: Option<String>, dependencies: Vec<String>) -> Self {
    Self {
      change_id,
      dependencies,
    }
  }

  /// The dependency list as it is substituted into install commands.
  pub fn render_dependencies(&self) -> String {
    self.dependencies.join(" ")
  }
}

/// Resolves review metadata for a fetched project.
#[async_trait]
pub trait ReviewResolver: Send + Sync {
  async fn resolve(&self, change_id: Option<&str>, project: &Project) -> Result<ReviewMetadata, ReviewError>;
}

/// Resolver that never contributes dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReview;

#[async_trait]
impl ReviewResolver for NoReview {
  async fn resolve(&self, change_id: Option<&str>, _project: &Project) -> Result<ReviewMetadata, ReviewError> {
    Ok(ReviewMetadata::new(change_id.map(str::to_string), Vec::new()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_space_separated() {
    let review = ReviewMetadata::new(None, vec!["six==1.8.0".to_string(), "pbr==0.10.0".to_string()]);
    assert_eq!(review.render_dependencies(), "six==1.8.0 pbr==0.10.0");
  }

  #[test]
  fn renders_empty_list_as_empty_string() {
    assert_eq!(ReviewMetadata::default().render_dependencies(), "");
  }
}

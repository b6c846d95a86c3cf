//! Source fetching.
//!
//! A `SourceFetcher` puts a project's repository into its workspace at the
//! configured ref and reports which commit was checked out, along with the
//! commit's `Change-Id` footer when it carries one.

pub mod git;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use git::{GitFetcher, request_interrupt};

/// Errors that can occur during fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to clone a git repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to open an existing git repository.
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  /// The ref is not a valid reference name.
  #[error("invalid git ref '{gitref}': {source}")]
  InvalidRef {
    gitref: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The ref named a commit that the clone does not contain.
  #[error("revision '{0}' not found in repository")]
  RevisionNotFound(String),

  /// Failed to check out the worktree.
  #[error("failed to checkout '{gitref}': {source}")]
  Checkout {
    gitref: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to resolve HEAD after checkout.
  #[error("failed to resolve HEAD: {0}")]
  ResolveHead(String),

  /// The blocking fetch task panicked or was cancelled.
  #[error("fetch task failed: {0}")]
  Task(String),
}

/// A checked-out source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
  pub path: PathBuf,
  /// Commit hash of HEAD.
  pub commit: String,
  /// Review change identifier from the HEAD commit message.
  pub change_id: Option<String>,
}

/// Clones a remote repository at a ref into a directory.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
  async fn fetch(&self, url: &str, gitref: &str, dest: &Path) -> Result<FetchedSource, FetchError>;
}

/// Extract the `Change-Id` footer from a commit message.
///
/// Footers live at the end of the message, so the last matching line wins.
pub fn change_id_from_message(message: &str) -> Option<String> {
  message
    .lines()
    .rev()
    .filter_map(|line| line.trim().strip_prefix("Change-Id:"))
    .map(str::trim)
    .find(|id| is_change_id(id))
    .map(str::to_string)
}

/// Whether a git ref is an abbreviated or full commit hash rather than a
/// branch, tag or ref name.
pub fn is_commit_id(gitref: &str) -> bool {
  (7..=40).contains(&gitref.len()) && gitref.chars().all(|c| c.is_ascii_hexdigit())
}

/// Change ids are `I` followed by 40 lowercase hex digits.
fn is_change_id(id: &str) -> bool {
  id.len() == 41
    && id.starts_with('I')
    && id[1..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[cfg(test)]
mod tests {
  use super::*;

  const CHANGE_ID: &str = "I0123456789abcdef0123456789abcdef01234567";

  #[test]
  fn change_id_from_footer() {
    let message = format!(
      "Fix quota rounding\n\nLonger description.\n\nCloses-Bug: #1234\nChange-Id: {}\n",
      CHANGE_ID
    );
    assert_eq!(change_id_from_message(&message).as_deref(), Some(CHANGE_ID));
  }

  #[test]
  fn last_change_id_wins() {
    let other = "Iffffffffffffffffffffffffffffffffffffffff";
    let message = format!("Squashed\n\nChange-Id: {}\n\nChange-Id: {}\n", other, CHANGE_ID);
    assert_eq!(change_id_from_message(&message).as_deref(), Some(CHANGE_ID));
  }

  #[test]
  fn commit_ids_are_recognized() {
    assert!(is_commit_id("4f7a2b9"));
    assert!(is_commit_id("4f7a2b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a"));
    assert!(!is_commit_id("master"));
    assert!(!is_commit_id("stable/juno"));
    assert!(!is_commit_id("abc12"));
    assert!(!is_commit_id("refs/changes/12/3412/2"));
  }

  #[test]
  fn no_footer() {
    assert_eq!(change_id_from_message("Initial commit\n"), None);
  }

  #[test]
  fn malformed_ids_are_ignored() {
    assert_eq!(change_id_from_message("x\n\nChange-Id: Ideadbeef\n"), None);
    assert_eq!(
      change_id_from_message("x\n\nChange-Id: I0123456789ABCDEF0123456789abcdef01234567\n"),
      None
    );
  }
}

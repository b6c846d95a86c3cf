//! Git clone and checkout with gix.
//!
//! Repositories are cloned straight into the project's workspace. A workspace
//! that already holds a `.git` directory is opened instead of cloned, so
//! fetching is idempotent.

use std::path::Path;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use gix::refs::transaction::PreviousValue;
use tracing::{debug, info};

use crate::fetch::{FetchError, FetchedSource, SourceFetcher, change_id_from_message, is_commit_id};

/// Fetches sources with gix.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFetcher;

impl GitFetcher {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
  async fn fetch(&self, url: &str, gitref: &str, dest: &Path) -> Result<FetchedSource, FetchError> {
    let url = url.to_string();
    let gitref = gitref.to_string();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || fetch_git(&url, &gitref, &dest))
      .await
      .map_err(|e| FetchError::Task(e.to_string()))?
  }
}

/// Clone `url` at `gitref` into `dest`, or open an existing clone there.
pub fn fetch_git(url: &str, gitref: &str, dest: &Path) -> Result<FetchedSource, FetchError> {
  let repo = if dest.join(".git").exists() {
    debug!(path = %dest.display(), "repository already cloned");
    gix::open(dest).map_err(|e| FetchError::Open {
      path: dest.to_path_buf(),
      source: Box::new(e),
    })?
  } else {
    info!(url, gitref, path = %dest.display(), "cloning repository");
    clone_repo(url, gitref, dest)?
  };

  let mut head = repo.head().map_err(|e| FetchError::ResolveHead(e.to_string()))?;
  let commit = head
    .peel_to_commit()
    .map_err(|e| FetchError::ResolveHead(e.to_string()))?;

  let message = commit.message_raw_sloppy().to_string();
  let change_id = change_id_from_message(&message);

  debug!(commit = %commit.id, change_id = ?change_id, "resolved checkout");

  Ok(FetchedSource {
    path: dest.to_path_buf(),
    commit: commit.id.to_string(),
    change_id,
  })
}

/// Clone a repository, checking out `gitref` as HEAD.
///
/// Branch and tag names are handed to gix as the ref to check out. Commit ids
/// are resolved after the fetch and HEAD is detached at that commit.
fn clone_repo(url: &str, gitref: &str, dest: &Path) -> Result<gix::Repository, FetchError> {
  let clone_err = |e: Box<dyn std::error::Error + Send + Sync>| FetchError::Clone {
    url: url.to_string(),
    source: e,
  };

  let mut prepared = gix::prepare_clone(url, dest).map_err(|e| clone_err(Box::new(e)))?;
  if !is_commit_id(gitref) {
    prepared = prepared
      .with_ref_name(Some(gitref))
      .map_err(|e| FetchError::InvalidRef {
        gitref: gitref.to_string(),
        source: Box::new(e),
      })?;
  }

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| clone_err(Box::new(e)))?;

  if is_commit_id(gitref) {
    detach_head(checkout.repo(), gitref)?;
  }

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Checkout {
      gitref: gitref.to_string(),
      source: Box::new(e),
    })?;

  Ok(repo)
}

/// Point HEAD straight at the commit `rev` names.
fn detach_head(repo: &gix::Repository, rev: &str) -> Result<(), FetchError> {
  let id = repo
    .rev_parse_single(rev)
    .map_err(|_| FetchError::RevisionNotFound(rev.to_string()))?
    .detach();
  repo
    .find_commit(id)
    .map_err(|_| FetchError::RevisionNotFound(rev.to_string()))?;

  debug!(commit = %id, "detaching HEAD");
  repo
    .reference("HEAD", id, PreviousValue::Any, format!("checkout: moving to {rev}"))
    .map_err(|e| FetchError::Checkout {
      gitref: rev.to_string(),
      source: Box::new(e),
    })?;
  Ok(())
}

/// Ask in-flight clones and checkouts to stop at their next check.
pub fn request_interrupt() {
  gix::interrupt::IS_INTERRUPTED.store(true, Ordering::SeqCst);
}

//! giftwrap-lib: build OpenStack projects into deployable artifacts.
//!
//! A manifest lists projects and global settings. For each project the
//! pipeline fetches source at a git ref, resolves any pinned dependencies from
//! the project's code review, installs it into a Python virtualenv, and
//! produces either a native package or a container image.
//!
//! - `spec`: manifest loading and project defaults
//! - `pipeline`: per-project orchestration for both build modes
//! - `container`: descriptor rendering, the daemon client and response parsing
//! - `review`: Gerrit dependency lookup

pub mod artifact;
pub mod consts;
pub mod container;
pub mod execute;
pub mod fetch;
pub mod package;
pub mod pipeline;
pub mod review;
pub mod spec;
pub mod template;
pub mod util;

//! Dynamic version resolution from git state
//!
//! A manifest that lists `version` under `dynamic` delegates the value to
//! the repository: the nearest tag, the distance to it, and the working-tree
//! state together produce the version string. No repository means no
//! version; that failure aborts the caller.

pub mod git;
pub mod scheme;

use std::path::PathBuf;
use thiserror::Error;

pub use git::{describe, locate_git, GitDescribe};
pub use scheme::{short_version, version_from_describe};

/// Errors raised while deriving a version from repository state
#[derive(Error, Debug)]
pub enum ScmError {
    #[error("git executable not found: {0}")]
    GitNotFound(String),

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("git describe failed: {0}")]
    DescribeFailed(String),

    #[error("unexpected describe output '{0}'")]
    DescribeParse(String),

    #[error("tag '{0}' is not a valid version")]
    InvalidTag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Describe the repository at `repo` and format the resulting version
pub fn resolve_version(
    repo: &std::path::Path,
    configured_git: Option<&str>,
) -> Result<String, ScmError> {
    let described = describe(repo, configured_git)?;
    version_from_describe(&described)
}

//! # Workspace Module
//!
//! This module defines the workspace root that levelheadered operates on.
//! The root anchors configuration discovery, `.headerignore` lookup and the
//! include/exclude globs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::Repository;
use tracing::debug;

/// Workspace root selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workspace {
  /// Workspace rooted at a git work tree.
  Git { root: PathBuf },
  /// Workspace rooted at a directory.
  Directory { root: PathBuf },
}

impl Workspace {
  pub fn root(&self) -> &Path {
    match self {
      Self::Git { root } | Self::Directory { root } => root.as_path(),
    }
  }

  pub const fn is_git(&self) -> bool {
    matches!(self, Self::Git { .. })
  }
}

/// Resolve the current workspace based on the current directory and patterns.
///
/// The enclosing git work tree wins; otherwise the first pattern naming an
/// existing directory (or a file's parent), and finally the current
/// directory.
pub fn resolve_workspace(patterns: &[String]) -> Result<Workspace> {
  let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
  resolve_workspace_from(patterns, &current_dir)
}

/// Like [`resolve_workspace`], starting from an explicit directory.
pub fn resolve_workspace_from(patterns: &[String], current_dir: &Path) -> Result<Workspace> {
  if let Some(root) = discover_repo_root(current_dir) {
    debug!("Using git work tree as workspace root: {}", root.display());
    return Ok(Workspace::Git { root });
  }

  if let Some(root) = resolve_workspace_from_patterns(patterns, current_dir) {
    debug!("Using pattern directory as workspace root: {}", root.display());
    return Ok(Workspace::Directory { root });
  }

  Ok(Workspace::Directory {
    root: current_dir.to_path_buf(),
  })
}

/// Finds the work tree of the git repository containing `dir`.
///
/// Bare repositories have no work tree and yield `None`.
fn discover_repo_root(dir: &Path) -> Option<PathBuf> {
  let repo = Repository::discover(dir).ok()?;
  let workdir = repo.workdir()?;
  Some(strip_trailing_separator(workdir))
}

/// Drops the trailing separator git2 leaves on work tree paths.
fn strip_trailing_separator(path: &Path) -> PathBuf {
  path.components().collect()
}

fn resolve_workspace_from_patterns(patterns: &[String], current_dir: &Path) -> Option<PathBuf> {
  for pattern in patterns {
    let candidate = PathBuf::from(pattern);
    if candidate.exists() {
      if candidate.is_dir() {
        return Some(abs_path_or_current(&candidate, current_dir));
      }

      if candidate.is_file()
        && let Some(parent) = candidate.parent()
      {
        return Some(abs_path_or_current(parent, current_dir));
      }
    }
  }

  None
}

fn abs_path_or_current(path: &Path, current_dir: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    current_dir.join(path)
  }
}

//! # Ignore Module
//!
//! Handling of `.headerignore` files, which exclude paths from header
//! management using gitignore syntax.
//!
//! For a file, every `.headerignore` from the workspace root down to the
//! file's directory applies, with files closer to the target taking
//! precedence. Patterns are relative to the directory holding the ignore
//! file. Each ignore file is parsed once and cached.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::verbose_log;

/// Name of the per-directory ignore file.
pub const IGNORE_FILENAME: &str = ".headerignore";

/// Resolves `.headerignore` rules for paths under a workspace root.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
///
/// use levelheadered::ignore::IgnoreManager;
///
/// # fn main() -> anyhow::Result<()> {
/// let manager = IgnoreManager::new(Path::new("."));
///
/// // Paths are relative to the workspace root
/// if manager.is_ignored(Path::new("vendor/lib.c"))? {
///   println!("skipped");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IgnoreManager {
  /// Workspace root; `.headerignore` files above it are not consulted
  root_dir: PathBuf,

  /// Parsed ignore files keyed by directory, `None` where there is none
  cache: Mutex<HashMap<PathBuf, Option<Arc<Gitignore>>>>,
}

impl IgnoreManager {
  /// Creates a manager for the given workspace root.
  pub fn new(root_dir: &Path) -> Self {
    Self {
      root_dir: root_dir.to_path_buf(),
      cache: Mutex::new(HashMap::new()),
    }
  }

  pub fn root_dir(&self) -> &Path {
    &self.root_dir
  }

  /// Checks whether a path is excluded by a `.headerignore` file.
  ///
  /// Ignore files are consulted from the file's directory upwards; the first
  /// one with a matching rule (ignore or `!` whitelist) decides.
  ///
  /// # Parameters
  ///
  /// * `rel_path` - Path relative to the workspace root
  ///
  /// # Errors
  ///
  /// Returns an error if a `.headerignore` file exists but cannot be read or
  /// contains an invalid pattern.
  pub fn is_ignored(&self, rel_path: &Path) -> Result<bool> {
    if rel_path.is_absolute() {
      // Outside the workspace root; no ignore files apply.
      return Ok(false);
    }

    let abs_path = self.root_dir.join(rel_path);
    let mut dir = rel_path.parent();

    while let Some(rel_dir) = dir {
      if let Some(gitignore) = self.matcher_for(rel_dir)? {
        let matched = gitignore.matched_path_or_any_parents(&abs_path, false);
        if matched.is_ignore() {
          verbose_log!("Skipping: {} (matches {} pattern)", rel_path.display(), IGNORE_FILENAME);
          return Ok(true);
        }
        if matched.is_whitelist() {
          return Ok(false);
        }
      }
      dir = rel_dir.parent();
    }

    Ok(false)
  }

  /// Returns the matcher for the `.headerignore` in a directory relative to
  /// the root, loading it on first use.
  fn matcher_for(&self, rel_dir: &Path) -> Result<Option<Arc<Gitignore>>> {
    if let Ok(cache) = self.cache.lock()
      && let Some(entry) = cache.get(rel_dir)
    {
      return Ok(entry.clone());
    }

    let entry = self.load_ignore_file(&self.root_dir.join(rel_dir))?.map(Arc::new);
    if let Ok(mut cache) = self.cache.lock() {
      cache.insert(rel_dir.to_path_buf(), entry.clone());
    }
    Ok(entry)
  }

  fn load_ignore_file(&self, dir: &Path) -> Result<Option<Gitignore>> {
    let ignore_path = dir.join(IGNORE_FILENAME);
    if !ignore_path.is_file() {
      return Ok(None);
    }

    verbose_log!("Loading {} file: {}", IGNORE_FILENAME, ignore_path.display());
    let content = fs::read_to_string(&ignore_path)
      .with_context(|| format!("Failed to read {} file: {}", IGNORE_FILENAME, ignore_path.display()))?;

    let mut builder = GitignoreBuilder::new(dir);
    for line in content.lines() {
      if !line.trim().is_empty() && !line.trim().starts_with('#') {
        builder
          .add_line(Some(ignore_path.clone()), line)
          .with_context(|| format!("Invalid pattern in {}: {}", ignore_path.display(), line))?;
      }
    }

    let gitignore = builder
      .build()
      .with_context(|| format!("Failed to build matcher for {}", ignore_path.display()))?;
    Ok(Some(gitignore))
  }
}

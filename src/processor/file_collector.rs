//! # File Collector Module
//!
//! Expands the user's patterns (files, directories, globs) into the list of
//! candidate files, and maps paths into the workspace-relative form used by
//! the filters.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::verbose_log;

/// File collector for pattern expansion and directory traversal.
///
/// Symlinks are never followed or collected, and `.git` directories are not
/// entered.
pub struct FileCollector {
  /// Root of the workspace
  workspace_root: PathBuf,
}

impl FileCollector {
  /// Creates a new FileCollector with the specified workspace root.
  pub const fn new(workspace_root: PathBuf) -> Self {
    Self { workspace_root }
  }

  /// Expands patterns into a sorted, de-duplicated list of files.
  ///
  /// # Parameters
  ///
  /// * `patterns` - File paths, directory paths or glob patterns
  ///
  /// # Errors
  ///
  /// Returns an error if a glob pattern is invalid.
  pub fn collect(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let start_time = std::time::Instant::now();
    let mut files = BTreeSet::new();

    for pattern in patterns {
      let path = PathBuf::from(pattern);

      if is_symlink(&path) {
        verbose_log!("Skipping: {} (symlink)", path.display());
      } else if path.is_file() {
        files.insert(clean_path(&path));
      } else if path.is_dir() {
        files.extend(self.traverse_directory(&path));
      } else {
        let entries = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        let mut matched = false;

        for entry in entries {
          match entry {
            Ok(entry) if is_symlink(&entry) => {
              verbose_log!("Skipping: {} (symlink)", entry.display());
            }
            Ok(entry) if entry.is_file() => {
              matched = true;
              files.insert(clean_path(&entry));
            }
            Ok(entry) if entry.is_dir() => {
              matched = true;
              files.extend(self.traverse_directory(&entry));
            }
            Ok(_) => {}
            Err(e) => warn!("Error with glob pattern {}: {}", pattern, e),
          }
        }

        if !matched {
          warn!("Pattern matched no files: {}", pattern);
        }
      }
    }

    debug!(
      "Collected {} files in {}ms",
      files.len(),
      start_time.elapsed().as_millis()
    );

    Ok(files.into_iter().collect())
  }

  /// Traverses a directory recursively and collects all regular files.
  pub fn traverse_directory(&self, dir: &Path) -> Vec<PathBuf> {
    debug!("Scanning directory: {}", dir.display());

    WalkDir::new(dir)
      .follow_links(false)
      .into_iter()
      .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == ".git"))
      .filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
          warn!("Error reading directory entry: {}", e);
          None
        }
      })
      .filter(|entry| entry.file_type().is_file())
      .map(|entry| clean_path(entry.path()))
      .collect()
  }

  /// Converts a collected path to a path relative to the workspace root.
  ///
  /// Paths outside the workspace are returned as absolute paths.
  pub fn relative_to_root(&self, path: &Path) -> PathBuf {
    let absolute = match absolutize_path(path) {
      Ok(abs) => abs,
      Err(_) => return path.to_path_buf(),
    };

    if let Ok(stripped) = absolute.strip_prefix(&self.workspace_root) {
      return clean_path(stripped);
    }

    // The root may have been reported through a different spelling (for
    // example with symlinks resolved), so compare canonical forms too.
    if let (Ok(canonical), Ok(root)) = (absolute.canonicalize(), self.workspace_root.canonicalize())
      && let Ok(stripped) = canonical.strip_prefix(&root)
    {
      return clean_path(stripped);
    }

    match pathdiff::diff_paths(&absolute, &self.workspace_root) {
      Some(rel) if !rel.starts_with("..") => rel,
      _ => absolute,
    }
  }
}

fn is_symlink(path: &Path) -> bool {
  std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Converts a potentially relative path to an absolute path.
pub fn absolutize_path(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    Ok(path.to_path_buf())
  } else {
    let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
    Ok(current_dir.join(path))
  }
}

/// Removes `.` components and resolves `..` where a preceding component
/// exists.
pub fn clean_path(path: &Path) -> PathBuf {
  let mut cleaned = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if matches!(cleaned.components().next_back(), Some(Component::Normal(_))) {
          cleaned.pop();
        } else {
          cleaned.push(component.as_os_str());
        }
      }
      other => cleaned.push(other.as_os_str()),
    }
  }

  if cleaned.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    cleaned
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_clean_path() {
    assert_eq!(clean_path(Path::new("./src/main.rs")), PathBuf::from("src/main.rs"));
    assert_eq!(clean_path(Path::new("a/b/../c")), PathBuf::from("a/c"));
    assert_eq!(clean_path(Path::new("../a")), PathBuf::from("../a"));
    assert_eq!(clean_path(Path::new(".")), PathBuf::from("."));
  }

  #[test]
  fn test_absolutize_path_already_absolute() {
    let path = PathBuf::from("/absolute/path");
    assert_eq!(absolutize_path(&path).unwrap(), path);
  }

  #[test]
  fn test_traverse_skips_git_dir() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join(".git/objects")).unwrap();
    fs::write(root.join(".git/config"), "").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/a.rs"), "").unwrap();

    let collector = FileCollector::new(root.to_path_buf());
    let files = collector.traverse_directory(root);

    assert_eq!(files, vec![root.join("src/a.rs")]);
  }

  #[cfg(unix)]
  #[test]
  fn test_symlinks_are_not_collected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("real.rs"), "").unwrap();
    std::os::unix::fs::symlink(root.join("real.rs"), root.join("link.rs")).unwrap();

    let collector = FileCollector::new(root.to_path_buf());
    let files = collector.collect(&[root.to_string_lossy().to_string()]).unwrap();

    assert_eq!(files, vec![root.join("real.rs")]);
  }

  #[test]
  fn test_collect_deduplicates_overlapping_patterns() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/a.rs"), "").unwrap();
    fs::write(root.join("src/b.py"), "").unwrap();

    let collector = FileCollector::new(root.to_path_buf());
    let files = collector
      .collect(&[
        root.join("src").to_string_lossy().to_string(),
        root.join("src/a.rs").to_string_lossy().to_string(),
        format!("{}/src/*.py", root.display()),
      ])
      .unwrap();

    assert_eq!(files, vec![root.join("src/a.rs"), root.join("src/b.py")]);
  }

  #[test]
  fn test_relative_to_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/a.rs"), "").unwrap();

    let collector = FileCollector::new(root.to_path_buf());
    assert_eq!(collector.relative_to_root(&root.join("src/a.rs")), PathBuf::from("src/a.rs"));

    let outside = PathBuf::from("/definitely/elsewhere/x.rs");
    assert_eq!(collector.relative_to_root(&outside), outside);
  }
}

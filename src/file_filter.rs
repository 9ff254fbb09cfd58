//! # File Filter Module
//!
//! Path-based filters deciding which discovered files are managed at all:
//! include globs, exclude globs and `.headerignore` files. Filtered-out
//! files never produce a record.
//!
//! Every filter sees paths relative to the workspace root.

use std::path::Path;

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::{ConfigError, DEFAULT_CONFIG_FILENAME};
use crate::ignore::{IGNORE_FILENAME, IgnoreManager};
use crate::verbose_log;

/// Result of a file filtering operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
  /// Whether the file should be processed
  pub should_process: bool,
  /// Reason why the file should not be processed (if any)
  pub reason: Option<String>,
}

impl FilterResult {
  /// Creates a new FilterResult indicating the file should be processed.
  pub const fn process() -> Self {
    Self {
      should_process: true,
      reason: None,
    }
  }

  /// Creates a new FilterResult indicating the file should be skipped.
  pub fn skip(reason: impl Into<String>) -> Self {
    Self {
      should_process: false,
      reason: Some(reason.into()),
    }
  }
}

/// Trait for components that filter files based on certain criteria.
pub trait FileFilter: Send + Sync {
  /// Determines whether a file should be processed.
  ///
  /// # Parameters
  ///
  /// * `rel_path` - Path of the file relative to the workspace root
  fn should_process(&self, rel_path: &Path) -> Result<FilterResult>;
}

/// Builds a glob set from user patterns.
///
/// A pattern ending in `/` matches everything below that directory, and a
/// plain name without wildcards matches that file or directory anywhere.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPattern`] for a pattern that does not
/// compile.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
  let mut builder = GlobSetBuilder::new();

  let add = |b: &mut GlobSetBuilder, original: &str, p: &str| -> Result<(), ConfigError> {
    let glob = Glob::new(p).map_err(|e| ConfigError::InvalidPattern {
      pattern: original.to_string(),
      source: e,
    })?;
    b.add(glob);
    Ok(())
  };

  for original in patterns {
    let pattern = original.replace('\\', "/");

    if let Some(dir) = pattern.strip_suffix('/') {
      add(&mut builder, original, &format!("{dir}/**"))?;
      add(&mut builder, original, &format!("**/{dir}/**"))?;
    } else if !pattern.contains(['*', '?', '[', '{']) {
      add(&mut builder, original, &pattern)?;
      add(&mut builder, original, &format!("**/{pattern}"))?;
      add(&mut builder, original, &format!("{pattern}/**"))?;
      add(&mut builder, original, &format!("**/{pattern}/**"))?;
    } else {
      add(&mut builder, original, &pattern)?;
    }
  }

  builder.build().map_err(|e| ConfigError::InvalidPattern {
    pattern: patterns.join(", "),
    source: e,
  })
}

/// Filter that keeps only files matching at least one include glob.
pub struct IncludeFilter {
  globs: GlobSet,
}

impl IncludeFilter {
  pub fn from_patterns(patterns: &[String]) -> Result<Self, ConfigError> {
    Ok(Self {
      globs: build_glob_set(patterns)?,
    })
  }
}

impl FileFilter for IncludeFilter {
  fn should_process(&self, rel_path: &Path) -> Result<FilterResult> {
    if self.globs.is_match(rel_path) {
      Ok(FilterResult::process())
    } else {
      verbose_log!("Skipping: {} (not included)", rel_path.display());
      Ok(FilterResult::skip("Does not match any include pattern"))
    }
  }
}

/// Filter that drops files matching any exclude glob.
pub struct ExcludeFilter {
  globs: GlobSet,
}

impl ExcludeFilter {
  pub fn from_patterns(patterns: &[String]) -> Result<Self, ConfigError> {
    Ok(Self {
      globs: build_glob_set(patterns)?,
    })
  }
}

impl FileFilter for ExcludeFilter {
  fn should_process(&self, rel_path: &Path) -> Result<FilterResult> {
    if self.globs.is_match(rel_path) {
      verbose_log!("Skipping: {} (matches exclude pattern)", rel_path.display());
      Ok(FilterResult::skip("Matches exclude pattern"))
    } else {
      Ok(FilterResult::process())
    }
  }
}

/// Filter that drops levelheadered's own config and ignore files.
pub struct ToolFileFilter;

impl FileFilter for ToolFileFilter {
  fn should_process(&self, rel_path: &Path) -> Result<FilterResult> {
    match rel_path.file_name() {
      Some(name) if name == DEFAULT_CONFIG_FILENAME || name == IGNORE_FILENAME => {
        Ok(FilterResult::skip("levelheadered configuration file"))
      }
      _ => Ok(FilterResult::process()),
    }
  }
}

/// Filter that excludes files matched by `.headerignore` files.
pub struct IgnoreFilter {
  ignore_manager: IgnoreManager,
}

impl IgnoreFilter {
  /// Creates a new IgnoreFilter with the given IgnoreManager.
  pub const fn new(ignore_manager: IgnoreManager) -> Self {
    Self { ignore_manager }
  }
}

impl FileFilter for IgnoreFilter {
  fn should_process(&self, rel_path: &Path) -> Result<FilterResult> {
    if self.ignore_manager.is_ignored(rel_path)? {
      Ok(FilterResult::skip("Matches .headerignore pattern"))
    } else {
      Ok(FilterResult::process())
    }
  }
}

/// Filter that combines multiple filters.
///
/// The first filter that rejects a file decides.
pub struct CompositeFilter {
  filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
  /// Creates a new CompositeFilter with the given filters.
  pub fn new(filters: Vec<Box<dyn FileFilter>>) -> Self {
    Self { filters }
  }

  /// Adds a filter to this CompositeFilter.
  pub fn add_filter(&mut self, filter: Box<dyn FileFilter>) {
    self.filters.push(filter);
  }
}

impl FileFilter for CompositeFilter {
  fn should_process(&self, rel_path: &Path) -> Result<FilterResult> {
    for filter in &self.filters {
      let result = filter.should_process(rel_path)?;
      if !result.should_process {
        return Ok(result);
      }
    }
    Ok(FilterResult::process())
  }
}

/// Constructs the standard filter chain.
///
/// The tool's own `.levelheadered.toml` and `.headerignore` files are always
/// skipped.
///
/// # Parameters
///
/// * `workspace_root` - Root that `.headerignore` lookup stops at
/// * `include` - Include globs; an empty list includes everything
/// * `exclude` - Exclude globs
pub fn create_default_filter(
  workspace_root: &Path,
  include: &[String],
  exclude: &[String],
) -> Result<CompositeFilter, ConfigError> {
  let mut filters: Vec<Box<dyn FileFilter>> = vec![Box::new(ToolFileFilter)];

  if !include.is_empty() {
    filters.push(Box::new(IncludeFilter::from_patterns(include)?));
  }
  if !exclude.is_empty() {
    filters.push(Box::new(ExcludeFilter::from_patterns(exclude)?));
  }
  filters.push(Box::new(IgnoreFilter::new(IgnoreManager::new(workspace_root))));

  Ok(CompositeFilter::new(filters))
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn patterns(p: &[&str]) -> Vec<String> {
    p.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_exclude_filter() {
    let filter = ExcludeFilter::from_patterns(&patterns(&["*.bak", "tmp/", "generated"])).unwrap();

    assert!(filter.should_process(Path::new("src/main.rs")).unwrap().should_process);

    let result = filter.should_process(Path::new("src/main.rs.bak")).unwrap();
    assert!(!result.should_process);
    assert!(result.reason.is_some());

    assert!(!filter.should_process(Path::new("tmp/a.rs")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("src/tmp/a.rs")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("src/generated/a.rs")).unwrap().should_process);
  }

  #[test]
  fn test_include_filter() {
    let filter = IncludeFilter::from_patterns(&patterns(&["src/**/*.kt"])).unwrap();

    assert!(filter.should_process(Path::new("src/main/App.kt")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("build/App.kt")).unwrap().should_process);
  }

  #[test]
  fn test_invalid_pattern() {
    let result = ExcludeFilter::from_patterns(&patterns(&["src/[abc"]));
    assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
  }

  #[test]
  fn test_exclude_wins_over_include() {
    let temp_dir = TempDir::new().unwrap();
    let filter = create_default_filter(temp_dir.path(), &patterns(&["src/**"]), &patterns(&["**/gen/**"])).unwrap();

    assert!(filter.should_process(Path::new("src/a.rs")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("src/gen/a.rs")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("docs/a.md")).unwrap().should_process);
  }

  #[test]
  fn test_tool_files_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let filter = create_default_filter(temp_dir.path(), &[], &[]).unwrap();

    assert!(!filter.should_process(Path::new(".levelheadered.toml")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("src/.headerignore")).unwrap().should_process);
    assert!(filter.should_process(Path::new("Cargo.toml")).unwrap().should_process);
  }

  #[test]
  fn test_composite_filter() {
    let mut composite = CompositeFilter::new(Vec::new());

    // Only processes files with "pass" in their name
    struct MockFilter;
    impl FileFilter for MockFilter {
      fn should_process(&self, path: &Path) -> Result<FilterResult> {
        let path_str = path.to_string_lossy();
        if path_str.contains("pass") {
          Ok(FilterResult::process())
        } else {
          Ok(FilterResult::skip("Not a pass file".to_string()))
        }
      }
    }

    composite.add_filter(Box::new(MockFilter));

    assert!(composite.should_process(Path::new("src/pass_test.rs")).unwrap().should_process);
    assert!(!composite.should_process(Path::new("src/fail_test.rs")).unwrap().should_process);
  }
}

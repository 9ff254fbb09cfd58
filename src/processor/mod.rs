//! # Processor Module
//!
//! Orchestrates a run: collects candidate files, filters them, evaluates
//! every file in parallel and gathers the records into a [`RunResult`].
//!
//! The module is organized into several submodules:
//! - [`content_transformer`] - Line-ending detection and preserved first lines
//! - [`file_collector`] - Pattern expansion and directory traversal
//!
//! The [`Processor`] struct is the main entry point, shared by both
//! [`Mode::Check`] and [`Mode::Apply`].

pub mod content_transformer;
mod file_collector;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
pub use file_collector::{FileCollector, absolutize_path, clean_path};
use futures::stream::{self, StreamExt};
use tracing::{debug, trace};

use crate::applier::{ApplyError, apply_rewrite};
use crate::classifier::FileClassifier;
use crate::config::ConfigError;
use crate::diff::DiffManager;
use crate::file_filter::{CompositeFilter, FileFilter, create_default_filter};
use crate::matcher::HeaderMatcher;
use crate::report::{FileAction, FileRecord, HeaderStatus, RunResult};

/// Whether a run only reports or also rewrites files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
  /// Report header status without touching files
  #[default]
  Check,
  /// Insert or replace headers in place
  Apply,
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Mode::Check => write!(f, "check"),
      Mode::Apply => write!(f, "apply"),
    }
  }
}

/// Configuration for creating a Processor instance.
pub struct ProcessorConfig {
  /// Rendered header text, without comment markers
  pub header_text: String,
  pub classifier: FileClassifier,
  pub workspace_root: PathBuf,
  pub mode: Mode,

  // Path selection
  pub include: Vec<String>,
  pub exclude: Vec<String>,

  /// Maximum number of files evaluated at once; defaults to the CPU count
  pub jobs: Option<usize>,
  pub diff_manager: Option<DiffManager>,
}

impl ProcessorConfig {
  /// Creates a new ProcessorConfig with required fields and sensible defaults.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ProcessorConfig {
  ///     mode: Mode::Apply,
  ///     ..ProcessorConfig::new(header_text, workspace_root)
  /// }
  /// ```
  pub fn new(header_text: impl Into<String>, workspace_root: PathBuf) -> Self {
    Self {
      header_text: header_text.into(),
      classifier: FileClassifier::default(),
      workspace_root,
      mode: Mode::Check,
      include: vec![],
      exclude: vec![],
      jobs: None,
      diff_manager: None,
    }
  }
}

/// Per-file evaluation, shared read-only across worker tasks.
struct Evaluator {
  matcher: HeaderMatcher,
  classifier: FileClassifier,
  mode: Mode,
  diff_manager: DiffManager,
}

impl Evaluator {
  /// Evaluates one file and, in apply mode, writes the rewrite.
  fn evaluate(&self, path: PathBuf) -> FileRecord {
    let style = match self.classifier.comment_style(&path) {
      Ok(style) => style,
      Err(reason) => {
        debug!("Unsupported: {} ({})", path.display(), reason);
        return FileRecord::unsupported(path, reason);
      }
    };

    let mut record = FileRecord::new(path);
    record.comment_style = Some(style.clone());

    let bytes = match std::fs::read(&record.path) {
      Ok(bytes) => bytes,
      Err(e) => {
        record.error = Some(ApplyError::read(&record.path, e).to_string());
        return record;
      }
    };

    let content = match self.classifier.eligible_text(&bytes) {
      Ok(content) => content,
      Err(reason) => {
        debug!("Unsupported: {} ({})", record.path.display(), reason);
        record.status = HeaderStatus::Unsupported;
        record.skip_reason = Some(reason);
        return record;
      }
    };

    let rewrite = match self.matcher.plan(content, &style) {
      Ok(rewrite) => rewrite,
      Err(e) => {
        record.error = Some(e.to_string());
        return record;
      }
    };

    record.status = rewrite.status();
    record.existing_header = rewrite.existing_header().map(str::to_string);
    trace!("{}: {}", record.path.display(), record.status);

    match self.mode {
      Mode::Check => {
        if let Some(new_content) = rewrite.new_content()
          && let Err(e) = self.diff_manager.display_diff(&record.path, content, new_content)
        {
          eprintln!("Warning: Failed to display diff for {}: {}", record.path.display(), e);
        }
      }
      Mode::Apply => match apply_rewrite(&record.path, &rewrite) {
        Ok(true) => {
          record.action = Some(if record.status == HeaderStatus::Stale {
            FileAction::Replaced
          } else {
            FileAction::Inserted
          });
          record.status = HeaderStatus::Matched;
        }
        Ok(false) => {}
        Err(e) => record.error = Some(e.to_string()),
      },
    }

    record.expected_header = Some(rewrite.expected_header);
    record
  }
}

/// Processor for checking and applying headers.
///
/// The `Processor` is responsible for:
/// - Expanding patterns into candidate files
/// - Dropping files excluded by include/exclude globs and `.headerignore`
/// - Evaluating files in parallel on the blocking thread pool
/// - Collecting the per-file records
pub struct Processor {
  /// Root of the current workspace.
  workspace_root: PathBuf,

  mode: Mode,

  /// Maximum number of in-flight evaluations
  jobs: usize,

  /// Include, exclude and `.headerignore` filters
  file_filter: CompositeFilter,

  /// File collector for pattern expansion and directory traversal
  file_collector: FileCollector,

  evaluator: Arc<Evaluator>,
}

impl Processor {
  /// Creates a new processor with the specified configuration.
  ///
  /// # Errors
  ///
  /// Returns an error if any include or exclude pattern is invalid.
  pub fn new(config: ProcessorConfig) -> Result<Self, ConfigError> {
    let file_filter = create_default_filter(&config.workspace_root, &config.include, &config.exclude)?;
    let jobs = config.jobs.filter(|&j| j > 0).unwrap_or_else(num_cpus::get);

    let evaluator = Evaluator {
      matcher: HeaderMatcher::new(config.header_text),
      classifier: config.classifier,
      mode: config.mode,
      diff_manager: config.diff_manager.unwrap_or_else(DiffManager::disabled),
    };

    Ok(Self {
      file_collector: FileCollector::new(config.workspace_root.clone()),
      workspace_root: config.workspace_root,
      mode: config.mode,
      jobs,
      file_filter,
      evaluator: Arc::new(evaluator),
    })
  }

  pub fn workspace_root(&self) -> &Path {
    &self.workspace_root
  }

  pub const fn mode(&self) -> Mode {
    self.mode
  }

  /// Expands patterns and drops files that are excluded.
  ///
  /// # Errors
  ///
  /// Returns an error for invalid glob patterns or unreadable
  /// `.headerignore` files.
  pub fn collect_files(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let files = self.file_collector.collect(patterns)?;
    let total = files.len();

    let mut selected = Vec::with_capacity(total);
    for file in files {
      let rel_path = self.file_collector.relative_to_root(&file);
      let result = self.file_filter.should_process(&rel_path)?;
      if result.should_process {
        selected.push(file);
      } else {
        trace!(
          "Skipping: {} ({})",
          file.display(),
          result.reason.as_deref().unwrap_or("filtered")
        );
      }
    }

    debug!("Selected {} of {} files", selected.len(), total);
    Ok(selected)
  }

  /// Collects and evaluates all files matching `patterns`.
  pub async fn run(&self, patterns: &[String]) -> Result<RunResult> {
    let files = self.collect_files(patterns)?;
    Ok(self.process_files(files).await)
  }

  /// Evaluates already collected files.
  ///
  /// At most `jobs` files are evaluated at once. Records come back sorted
  /// by path regardless of completion order.
  pub async fn process_files(&self, files: Vec<PathBuf>) -> RunResult {
    debug!("Evaluating {} files with {} jobs in {} mode", files.len(), self.jobs, self.mode);

    let records: Vec<FileRecord> = stream::iter(files)
      .map(|path| {
        let evaluator = Arc::clone(&self.evaluator);
        async move {
          let fallback = path.clone();
          match tokio::task::spawn_blocking(move || evaluator.evaluate(path)).await {
            Ok(record) => record,
            Err(e) => FileRecord {
              error: Some(format!("evaluation task failed: {e}")),
              ..FileRecord::new(fallback)
            },
          }
        }
      })
      .buffer_unordered(self.jobs)
      .collect()
      .await;

    RunResult::new(self.mode, records)
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;
  use crate::classifier::SkipReason;

  fn processor(root: &Path, mode: Mode) -> Processor {
    Processor::new(ProcessorConfig {
      mode,
      jobs: Some(2),
      ..ProcessorConfig::new("Copyright 2024", root.to_path_buf())
    })
    .unwrap()
  }

  #[tokio::test]
  async fn test_check_reports_statuses() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("ok.rs"), "// Copyright 2024\nfn main() {}\n").unwrap();
    fs::write(root.join("old.rs"), "// Copyright 2023\nfn main() {}\n").unwrap();
    fs::write(root.join("none.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join("blob.bin"), [0u8, 1, 2]).unwrap();

    let result = processor(root, Mode::Check)
      .run(&[root.to_string_lossy().to_string()])
      .await
      .unwrap();

    let statuses: Vec<_> = result
      .records()
      .iter()
      .map(|r| (r.path.file_name().unwrap().to_string_lossy().to_string(), r.status))
      .collect();
    assert_eq!(
      statuses,
      vec![
        ("blob.bin".to_string(), HeaderStatus::Unsupported),
        ("none.rs".to_string(), HeaderStatus::Missing),
        ("ok.rs".to_string(), HeaderStatus::Matched),
        ("old.rs".to_string(), HeaderStatus::Stale),
      ]
    );
    assert!(!result.success());

    // Check never writes.
    assert_eq!(fs::read_to_string(root.join("none.rs")).unwrap(), "fn main() {}\n");
  }

  #[tokio::test]
  async fn test_apply_then_check_is_clean() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("old.rs"), "// Copyright 2023\nfn main() {}\n").unwrap();
    fs::write(root.join("none.py"), "print(1)\n").unwrap();

    let patterns = [root.to_string_lossy().to_string()];
    let applied = processor(root, Mode::Apply).run(&patterns).await.unwrap();
    assert!(applied.success());

    let actions: Vec<_> = applied.records().iter().map(|r| (r.status, r.action)).collect();
    assert_eq!(
      actions,
      vec![
        (HeaderStatus::Matched, Some(FileAction::Inserted)),
        (HeaderStatus::Matched, Some(FileAction::Replaced)),
      ]
    );

    let checked = processor(root, Mode::Check).run(&patterns).await.unwrap();
    assert!(checked.success());
    assert!(checked.records().iter().all(|r| r.status == HeaderStatus::Matched));
  }

  #[tokio::test]
  async fn test_mixed_line_endings_recorded_as_error() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let original = "// a\r\n// b\nfn main() {}\n";
    fs::write(root.join("mixed.rs"), original).unwrap();

    let result = processor(root, Mode::Apply)
      .run(&[root.to_string_lossy().to_string()])
      .await
      .unwrap();

    let record = &result.records()[0];
    assert_eq!(record.error.as_deref(), Some("multiple line endings detected"));
    assert!(!result.success());
    assert_eq!(fs::read_to_string(root.join("mixed.rs")).unwrap(), original);
  }

  #[tokio::test]
  async fn test_generated_files_are_unsupported() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("gen.go"), "// Code generated by x. DO NOT EDIT.\npackage x\n").unwrap();

    let result = processor(root, Mode::Check)
      .run(&[root.to_string_lossy().to_string()])
      .await
      .unwrap();

    let record = &result.records()[0];
    assert_eq!(record.status, HeaderStatus::Unsupported);
    assert_eq!(record.skip_reason, Some(SkipReason::Generated));
    assert!(result.success());
  }

  #[tokio::test]
  async fn test_excluded_files_produce_no_records() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("vendor")).unwrap();
    fs::write(root.join("vendor/lib.rs"), "fn f() {}\n").unwrap();
    fs::write(root.join("main.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join(".headerignore"), "*.md\n").unwrap();
    fs::write(root.join("README.md"), "# hi\n").unwrap();

    let processor = Processor::new(ProcessorConfig {
      exclude: vec!["vendor/".to_string()],
      ..ProcessorConfig::new("Copyright 2024", root.to_path_buf())
    })
    .unwrap();

    let files = processor.collect_files(&[root.to_string_lossy().to_string()]).unwrap();
    let names: Vec<_> = files
      .iter()
      .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
      .collect();
    assert_eq!(names, vec!["main.rs".to_string()]);
  }

  #[test]
  fn test_mode_display() {
    assert_eq!(Mode::Check.to_string(), "check");
    assert_eq!(Mode::Apply.to_string(), "apply");
    assert_eq!(Mode::default(), Mode::Check);
  }
}

//! # Report Module
//!
//! Per-file outcomes of a run and their aggregation.
//!
//! Every managed file produces a [`FileRecord`]. A [`RunResult`] holds all
//! records sorted by path together with the overall success flag, and
//! [`ReportGenerator`] writes them out as JSON or CSV.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::classifier::SkipReason;
use crate::processor::Mode;
use crate::templates::CommentStyle;

/// Header status of a file.
///
/// Every record starts as `Unscanned` and moves to exactly one of the other
/// states once evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeaderStatus {
  Unscanned,
  /// No comment style, binary or generated; never fails a run
  Unsupported,
  /// Starts with the expected header
  Matched,
  /// Starts with a different header
  Stale,
  /// Has no leading header
  Missing,
}

impl HeaderStatus {
  pub const fn as_str(self) -> &'static str {
    match self {
      HeaderStatus::Unscanned => "UNSCANNED",
      HeaderStatus::Unsupported => "UNSUPPORTED",
      HeaderStatus::Matched => "MATCHED",
      HeaderStatus::Stale => "STALE",
      HeaderStatus::Missing => "MISSING",
    }
  }

  /// Whether the file does not carry the expected header.
  pub const fn is_nonconforming(self) -> bool {
    matches!(self, HeaderStatus::Stale | HeaderStatus::Missing)
  }
}

impl fmt::Display for HeaderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

/// Action taken on a file in apply mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
  /// Header was inserted at the top
  Inserted,
  /// An outdated header was replaced
  Replaced,
}

impl fmt::Display for FileAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FileAction::Inserted => write!(f, "inserted"),
      FileAction::Replaced => write!(f, "replaced"),
    }
  }
}

/// The outcome of evaluating one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
  #[serde(with = "path_serialization")]
  pub path: PathBuf,
  #[serde(with = "style_serialization")]
  pub comment_style: Option<CommentStyle>,
  pub status: HeaderStatus,
  pub action: Option<FileAction>,
  pub skip_reason: Option<SkipReason>,
  pub error: Option<String>,
  pub existing_header: Option<String>,
  pub expected_header: Option<String>,
}

impl FileRecord {
  /// A record for a file that has not been evaluated yet.
  pub const fn new(path: PathBuf) -> Self {
    Self {
      path,
      comment_style: None,
      status: HeaderStatus::Unscanned,
      action: None,
      skip_reason: None,
      error: None,
      existing_header: None,
      expected_header: None,
    }
  }

  /// A record for a file that is skipped.
  pub fn unsupported(path: PathBuf, reason: SkipReason) -> Self {
    Self {
      status: HeaderStatus::Unsupported,
      skip_reason: Some(reason),
      ..Self::new(path)
    }
  }

  /// Whether this record makes the run fail.
  ///
  /// Errors always fail; STALE and MISSING only fail a check.
  pub fn is_failure(&self, mode: Mode) -> bool {
    self.error.is_some() || (mode == Mode::Check && self.status.is_nonconforming())
  }
}

/// Helper module for serializing PathBuf
mod path_serialization {
  use serde::Serializer;

  pub fn serialize<S>(path: &std::path::Path, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&path.to_string_lossy())
  }
}

/// Comment styles are reported in their short display form, e.g. `//`.
mod style_serialization {
  use serde::Serializer;

  use crate::templates::CommentStyle;

  pub fn serialize<S>(style: &Option<CommentStyle>, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match style {
      Some(style) => serializer.collect_str(style),
      None => serializer.serialize_none(),
    }
  }
}

/// All records of a run, sorted by path, and whether the run succeeded.
#[derive(Debug, Clone)]
pub struct RunResult {
  mode: Mode,
  records: Vec<FileRecord>,
  success: bool,
}

impl RunResult {
  pub fn new(mode: Mode, mut records: Vec<FileRecord>) -> Self {
    records.sort_by(|a, b| a.path.cmp(&b.path));
    let success = !records.iter().any(|r| r.is_failure(mode));
    Self { mode, records, success }
  }

  pub const fn mode(&self) -> Mode {
    self.mode
  }

  pub fn records(&self) -> &[FileRecord] {
    &self.records
  }

  pub const fn success(&self) -> bool {
    self.success
  }

  /// Records that make the run fail.
  pub fn failures(&self) -> impl Iterator<Item = &FileRecord> {
    self.records.iter().filter(|r| r.is_failure(self.mode))
  }

  pub fn summary(&self, processing_time: Duration) -> RunSummary {
    RunSummary::from_records(&self.records, processing_time)
  }
}

/// Counts over the records of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
  pub total_files: usize,
  pub matched: usize,
  pub stale: usize,
  pub missing: usize,
  pub unsupported: usize,
  pub failed: usize,
  pub inserted: usize,
  pub replaced: usize,
  #[serde(skip_serializing)]
  pub processing_time: Duration,
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
}

impl RunSummary {
  pub fn from_records(records: &[FileRecord], processing_time: Duration) -> Self {
    let mut summary = Self {
      total_files: records.len(),
      matched: 0,
      stale: 0,
      missing: 0,
      unsupported: 0,
      failed: 0,
      inserted: 0,
      replaced: 0,
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
    };

    for record in records {
      match record.status {
        HeaderStatus::Matched => summary.matched += 1,
        HeaderStatus::Stale => summary.stale += 1,
        HeaderStatus::Missing => summary.missing += 1,
        HeaderStatus::Unsupported => summary.unsupported += 1,
        HeaderStatus::Unscanned => {}
      }
      if record.error.is_some() {
        summary.failed += 1;
      }
      match record.action {
        Some(FileAction::Inserted) => summary.inserted += 1,
        Some(FileAction::Replaced) => summary.replaced += 1,
        None => {}
      }
    }

    summary
  }
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  /// JSON format for machine readability
  Json,
  /// CSV format for spreadsheet compatibility
  Csv,
}

impl fmt::Display for ReportFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReportFormat::Json => write!(f, "JSON"),
      ReportFormat::Csv => write!(f, "CSV"),
    }
  }
}

/// Writes a [`RunResult`] to disk.
pub struct ReportGenerator<'a> {
  format: ReportFormat,
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  /// Create a new report generator
  ///
  /// # Parameters
  ///
  /// * `format` - The format to use for the report
  /// * `output_path` - The path where the report will be saved
  pub const fn new(format: ReportFormat, output_path: &'a Path) -> Self {
    Self { format, output_path }
  }

  /// Renders the report and writes it to the output path.
  pub fn generate(&self, result: &RunResult, summary: &RunSummary) -> Result<()> {
    let content = self.render(result, summary)?;

    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }

  /// Renders the report without writing it.
  pub fn render(&self, result: &RunResult, summary: &RunSummary) -> Result<String> {
    match self.format {
      ReportFormat::Json => generate_json(result, summary),
      ReportFormat::Csv => Ok(generate_csv(result, summary)),
    }
  }
}

fn generate_json(result: &RunResult, summary: &RunSummary) -> Result<String> {
  let report = serde_json::json!({
    "mode": result.mode().to_string(),
    "success": result.success(),
    "generated_at": Local::now().to_rfc3339(),
    "summary": summary,
    "files": result.records(),
  });

  serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
}

fn generate_csv(result: &RunResult, summary: &RunSummary) -> String {
  let mut csv = String::from("path,status,comment_style,action,notes\n");

  for record in result.records() {
    let style = record.comment_style.as_ref().map(ToString::to_string).unwrap_or_default();
    let action = record.action.map(|a| a.to_string()).unwrap_or_default();
    let note = match (&record.error, record.skip_reason) {
      (Some(error), _) => error.clone(),
      (None, Some(reason)) => reason.to_string(),
      (None, None) => String::new(),
    };

    csv.push_str(&format!(
      "{},{},{},{},{}\n",
      csv_field(&record.path.to_string_lossy()),
      record.status,
      csv_field(&style),
      action,
      csv_field(&note)
    ));
  }

  csv.push_str("\n# Summary\n");
  csv.push_str(&format!("Total files,{}\n", summary.total_files));
  csv.push_str(&format!("Matched,{}\n", summary.matched));
  csv.push_str(&format!("Stale,{}\n", summary.stale));
  csv.push_str(&format!("Missing,{}\n", summary.missing));
  csv.push_str(&format!("Unsupported,{}\n", summary.unsupported));
  csv.push_str(&format!("Failed,{}\n", summary.failed));
  csv.push_str(&format!("Inserted,{}\n", summary.inserted));
  csv.push_str(&format!("Replaced,{}\n", summary.replaced));
  csv.push_str(&format!(
    "Processing time (seconds),{:.2}\n",
    summary.processing_time.as_secs_f64()
  ));
  csv.push_str(&format!("Generated on,{}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));

  csv
}

/// Quotes a CSV field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

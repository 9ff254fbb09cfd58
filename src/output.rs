//! # Output Module
//!
//! This module centralizes all user-facing output for levelheadered.
//!
//! - stdout carries one `STATUS  path` line per file, sorted by path, then a
//!   summary line. With `-q` it carries only the paths of failing files.
//! - stderr carries per-file errors and diagnostics.

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::processor::Mode;
use crate::report::{FileRecord, HeaderStatus, RunResult, RunSummary};

/// Symbols used in output
pub mod symbols {
  /// Success
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Header written
  pub const UPDATED: &str = "\u{21bb}"; // ↻
}

/// Width of the status column, wide enough for `UNSUPPORTED`.
const STATUS_WIDTH: usize = 11;

/// Formats the plain (uncolored) status line of a record.
///
/// Returns `None` for records that are not listed: unscanned files, and
/// unsupported files outside verbose mode.
pub fn format_record_line(record: &FileRecord, verbose: bool) -> Option<String> {
  match record.status {
    HeaderStatus::Unscanned => None,
    HeaderStatus::Unsupported if !verbose => None,
    status => {
      let mut line = format!("{:<width$} {}", status, record.path.display(), width = STATUS_WIDTH);
      if let Some(action) = record.action {
        line.push_str(&format!(" ({action})"));
      } else if let Some(reason) = record.skip_reason
        && verbose
      {
        line.push_str(&format!(" ({reason})"));
      }
      Some(line)
    }
  }
}

/// Prints the per-file report.
///
/// Errors recorded against files are printed to stderr in every mode.
pub fn print_records(result: &RunResult) {
  let mode = result.mode();

  for record in result.records() {
    if let Some(error) = &record.error {
      eprintln!(
        "{} {}: {}",
        "error:".if_supports_color(Stream::Stderr, |s| s.red()),
        record.path.display(),
        error
      );
    }

    if is_quiet() {
      if record.is_failure(mode) {
        println!("{}", record.path.display());
      }
      continue;
    }

    let Some(line) = format_record_line(record, is_verbose()) else {
      continue;
    };
    let status = &line[..STATUS_WIDTH];
    let rest = &line[STATUS_WIDTH..];
    println!("{}{}", colorize_status(record, mode, status), rest);
  }
}

fn colorize_status(record: &FileRecord, mode: Mode, status: &str) -> String {
  if record.action.is_some() {
    return status.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string();
  }

  match record.status {
    HeaderStatus::Matched => status.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    HeaderStatus::Stale | HeaderStatus::Missing if mode == Mode::Check => {
      status.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
    }
    HeaderStatus::Unsupported => status.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
    _ => status.to_string(),
  }
}

/// Formats the summary line without colors.
pub fn format_summary(summary: &RunSummary, mode: Mode) -> String {
  let mut line = format!(
    "Summary: {} matched, {} stale, {} missing, {} unsupported, {} failed",
    summary.matched, summary.stale, summary.missing, summary.unsupported, summary.failed
  );

  if mode == Mode::Apply {
    line.push_str(&format!(" ({} inserted, {} replaced)", summary.inserted, summary.replaced));
  }

  line
}

/// Prints the summary line, with timing in verbose mode.
pub fn print_summary(summary: &RunSummary, mode: Mode, success: bool) {
  if is_quiet() {
    return;
  }

  let symbol = if success {
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
  } else {
    symbols::FAILURE.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  };

  let mut line = format_summary(summary, mode);
  if is_verbose() {
    line.push_str(&format!(" in {:.2}s", summary.processing_time.as_secs_f64()));
  }

  println!();
  println!("{symbol} {line}");
  if mode == Mode::Apply && summary.inserted + summary.replaced > 0 {
    println!(
      "{} Wrote headers to {} files",
      symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.yellow()),
      summary.inserted + summary.replaced
    );
  }
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

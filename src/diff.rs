//! # Diff Module
//!
//! Unified-style diffs of what `apply` would change, shown on stderr with
//! `--show-diff` and/or collected into a file with `--save-diff`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::{ChangeTag, TextDiff};

/// Manages diff creation and rendering for header changes.
///
/// Diffs from concurrently evaluated files are written whole, one file at a
/// time, so output never interleaves.
#[derive(Debug)]
pub struct DiffManager {
  /// Whether to print diffs to stderr
  show_diff: bool,

  /// File collecting all diffs of the run
  save_diff: Option<(PathBuf, Mutex<File>)>,

  /// Serializes stderr output
  stderr_lock: Mutex<()>,
}

impl DiffManager {
  /// Creates a new DiffManager.
  ///
  /// The save file is created (or truncated) immediately.
  ///
  /// # Parameters
  ///
  /// * `show_diff` - Whether to print diffs to stderr
  /// * `save_diff_path` - File to write all diffs to
  pub fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Result<Self> {
    let save_diff = save_diff_path
      .map(|path| {
        let file = File::create(&path).with_context(|| format!("Failed to create diff file: {}", path.display()))?;
        Ok::<_, anyhow::Error>((path, Mutex::new(file)))
      })
      .transpose()?;

    Ok(Self {
      show_diff,
      save_diff,
      stderr_lock: Mutex::new(()),
    })
  }

  /// A manager that never renders anything.
  pub fn disabled() -> Self {
    Self {
      show_diff: false,
      save_diff: None,
      stderr_lock: Mutex::new(()),
    }
  }

  /// Whether any diff output was requested.
  pub const fn is_enabled(&self) -> bool {
    self.show_diff || self.save_diff.is_some()
  }

  /// Renders the diff between the original and new content of a file.
  ///
  /// # Parameters
  ///
  /// * `path` - Path shown in the diff header
  /// * `original` - Current file content
  /// * `new` - Content after applying the header
  pub fn render(path: &Path, original: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(original, new);
    let mut out = format!("--- {}\n+++ {}\n", path.display(), path.display());

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
      out.push_str(&format!("{}\n", hunk.header()));
      for change in hunk.iter_changes() {
        let sign = match change.tag() {
          ChangeTag::Delete => '-',
          ChangeTag::Insert => '+',
          ChangeTag::Equal => ' ',
        };
        out.push(sign);
        out.push_str(change.as_str().unwrap_or_default());
        if change.missing_newline() {
          out.push_str("\n\\ No newline at end of file\n");
        }
      }
    }

    out
  }

  /// Displays and/or saves the diff for one file.
  pub fn display_diff(&self, path: &Path, original: &str, new: &str) -> Result<()> {
    if !self.is_enabled() {
      return Ok(());
    }

    let diff = Self::render(path, original, new);

    if self.show_diff {
      let _guard = self.stderr_lock.lock();
      for line in diff.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.green()));
        } else if line.starts_with('-') && !line.starts_with("---") {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.red()));
        } else if line.starts_with("@@") {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.cyan()));
        } else {
          eprintln!("{line}");
        }
      }
    }

    if let Some((diff_path, file)) = &self.save_diff {
      let mut file = file
        .lock()
        .map_err(|_| anyhow::anyhow!("Diff file lock poisoned: {}", diff_path.display()))?;
      file
        .write_all(diff.as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}

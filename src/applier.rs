//! # Header Applier
//!
//! Writes rewritten file content back to disk. Writes go to a temporary
//! file in the same directory which then replaces the original, so a failed
//! write never leaves a partially written file behind.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::matcher::Rewrite;

/// A file could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
  #[error("failed to read {path}: {source}")]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write {path}: {source}")]
  Write { path: PathBuf, source: std::io::Error },
}

impl ApplyError {
  pub fn read(path: &Path, source: std::io::Error) -> Self {
    ApplyError::Read {
      path: path.to_path_buf(),
      source,
    }
  }

  pub fn write(path: &Path, source: std::io::Error) -> Self {
    ApplyError::Write {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// Writes the planned rewrite of a file.
///
/// Does nothing when the rewrite is a no-op.
///
/// # Returns
///
/// `true` if the file was written.
pub fn apply_rewrite(path: &Path, rewrite: &Rewrite) -> Result<bool, ApplyError> {
  match rewrite.new_content() {
    Some(content) => {
      write_atomic(path, content.as_bytes())?;
      Ok(true)
    }
    None => Ok(false),
  }
}

/// Replaces a file's content atomically, keeping its permissions.
///
/// # Errors
///
/// Returns [`ApplyError::Write`] if the temporary file cannot be created,
/// written or moved into place. The original file is unchanged in that case.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ApplyError> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };

  let permissions = fs::metadata(path).map_err(|e| ApplyError::read(path, e))?.permissions();

  let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ApplyError::write(path, e))?;
  tmp.write_all(content).map_err(|e| ApplyError::write(path, e))?;
  tmp.as_file().sync_all().map_err(|e| ApplyError::write(path, e))?;
  fs::set_permissions(tmp.path(), permissions).map_err(|e| ApplyError::write(path, e))?;

  tmp.persist(path).map_err(|e| ApplyError::write(path, e.error))?;
  debug!("Wrote {} bytes to {}", content.len(), path.display());

  Ok(())
}

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use assert_cmd::prelude::*;

/// Writes a file below `root`, creating parent directories.
pub fn write_file(root: &Path, rel_path: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
  let path = root.join(rel_path);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}

/// Reads a file below `root` as a string.
pub fn read_file(root: &Path, rel_path: &str) -> Result<String> {
  let path = root.join(rel_path);
  fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

/// The levelheadered binary, run from `dir` with colors and environment
/// config discovery disabled.
pub fn levelheadered(dir: &Path) -> Result<Command> {
  let mut cmd = Command::cargo_bin("levelheadered")?;
  cmd
    .current_dir(dir)
    .env_remove("LEVELHEADERED_CONFIG")
    .env_remove("LEVELHEADERED_LOG")
    .env("NO_COLOR", "1");
  Ok(cmd)
}

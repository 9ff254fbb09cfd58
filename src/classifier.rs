//! # File Classifier
//!
//! Resolves the [`CommentStyle`] for a file from its name or extension and
//! decides whether its content is eligible for a header at all. Files that
//! cannot be handled are skipped with a [`SkipReason`]; that is never an
//! error.
//!
//! Lookup order for a path:
//! 1. exact file name, case-insensitive (`Makefile`, `CMakeLists.txt`)
//! 2. configured file-name globs (`*.cmake.in`)
//! 3. the compound extension from the first dot, then each shorter suffix
//!    (`build.gradle.kts` tries `gradle.kts`, then `kts`)

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use serde::Serialize;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::templates::CommentStyle;

/// Number of leading bytes searched for NUL bytes.
pub const BINARY_SNIFF_LIMIT: usize = 8 * 1024;

/// Number of leading bytes searched for generated-file markers.
pub const GENERATED_SNIFF_LIMIT: usize = 1024;

const GENERATED_MARKERS: &[&str] = &["@generated", "DO NOT EDIT"];

/// Why a file was classified as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
  NoCommentStyle,
  Binary,
  Generated,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let reason = match self {
      SkipReason::NoCommentStyle => "no comment style for this file type",
      SkipReason::Binary => "binary file",
      SkipReason::Generated => "generated file",
    };
    f.write_str(reason)
  }
}

/// Looks up the comment style for a path.
pub trait CommentStyleResolver: Send + Sync {
  /// Returns the comment style for `path`, or `None` if the file type is
  /// unsupported.
  fn resolve(&self, path: &Path) -> Option<CommentStyle>;
}

/// Comment styles keyed by file name, file-name glob and extension.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
  by_name: HashMap<String, CommentStyle>,
  name_globs: Vec<(GlobMatcher, CommentStyle)>,
  by_extension: HashMap<String, CommentStyle>,
}

impl StyleTable {
  /// An empty table that resolves nothing.
  pub fn new() -> Self {
    Self::default()
  }

  /// The built-in table of common languages.
  pub fn builtin() -> Self {
    let mut table = Self::new();

    let c_block = CommentStyle::block("/*", " * ", " */");
    for ext in [
      "c", "h", "java", "scala", "kt", "kts", "groovy", "gradle", "js", "mjs", "cjs", "jsx", "ts", "tsx", "css", "scss",
    ] {
      table.insert_extension(ext, c_block.clone());
    }

    let slashes = CommentStyle::line("// ");
    for ext in [
      "cc", "cpp", "cs", "go", "hh", "hpp", "proto", "rs", "swift", "dart", "php",
    ] {
      table.insert_extension(ext, slashes.clone());
    }

    let hash = CommentStyle::line("# ");
    for ext in ["py", "sh", "bash", "yaml", "yml", "rb", "toml", "tf", "pl"] {
      table.insert_extension(ext, hash.clone());
    }
    for name in ["Makefile", "Dockerfile", "CMakeLists.txt"] {
      table.insert_name(name, hash.clone());
    }

    let dashes = CommentStyle::line("-- ");
    for ext in ["sql", "hs", "lua"] {
      table.insert_extension(ext, dashes.clone());
    }

    let markup = CommentStyle::block("<!--", "  ", "-->");
    for ext in ["html", "xml", "vue"] {
      table.insert_extension(ext, markup.clone());
    }

    for ext in ["el", "lisp"] {
      table.insert_extension(ext, CommentStyle::line(";; "));
    }
    table.insert_extension("erl", CommentStyle::line("% "));

    table
  }

  /// Builds the table for a configuration.
  ///
  /// Starts from the built-in table unless `builtin-styles = false`, then
  /// layers the configured extensions and file names on top.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidPattern`] for a file-name glob that does
  /// not compile.
  pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
    let mut table = if config.builtin_styles {
      Self::builtin()
    } else {
      debug!("Built-in comment styles disabled");
      Self::new()
    };

    for (ext, style) in &config.comment_styles {
      table.insert_extension(ext, CommentStyle::from(style));
    }

    let mut filenames: Vec<_> = config.filenames.iter().collect();
    filenames.sort_by(|a, b| a.0.cmp(b.0));
    for (name, style) in filenames {
      if name.contains(['*', '?', '[', '{']) {
        table.insert_glob(name, CommentStyle::from(style))?;
      } else {
        table.insert_name(name, CommentStyle::from(style));
      }
    }

    Ok(table)
  }

  pub fn insert_extension(&mut self, ext: &str, style: CommentStyle) {
    self
      .by_extension
      .insert(ext.trim_start_matches('.').to_lowercase(), style);
  }

  pub fn insert_name(&mut self, name: &str, style: CommentStyle) {
    self.by_name.insert(name.to_lowercase(), style);
  }

  /// Adds a file-name glob, matched case-insensitively against the file
  /// name only.
  pub fn insert_glob(&mut self, pattern: &str, style: CommentStyle) -> Result<(), ConfigError> {
    let glob = GlobBuilder::new(pattern)
      .case_insensitive(true)
      .literal_separator(true)
      .build()
      .map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
      })?;
    self.name_globs.push((glob.compile_matcher(), style));
    Ok(())
  }
}

impl CommentStyleResolver for StyleTable {
  fn resolve(&self, path: &Path) -> Option<CommentStyle> {
    let file_name = path.file_name()?.to_str()?;
    let lowered = file_name.to_lowercase();

    if let Some(style) = self.by_name.get(&lowered) {
      return Some(style.clone());
    }

    if let Some((_, style)) = self.name_globs.iter().find(|(glob, _)| glob.is_match(file_name)) {
      return Some(style.clone());
    }

    let mut rest = lowered.as_str();
    while let Some(dot) = rest.find('.') {
      rest = &rest[dot + 1..];
      if let Some(style) = self.by_extension.get(rest) {
        return Some(style.clone());
      }
    }

    None
  }
}

/// Classifies files into a comment style and eligible text, or a skip
/// reason.
pub struct FileClassifier {
  resolver: Box<dyn CommentStyleResolver>,
  skip_generated: bool,
}

impl FileClassifier {
  pub fn new(resolver: Box<dyn CommentStyleResolver>, skip_generated: bool) -> Self {
    Self {
      resolver,
      skip_generated,
    }
  }

  /// Builds a classifier from configuration.
  pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
    Ok(Self::new(Box::new(StyleTable::from_config(config)?), config.skip_generated))
  }

  /// Resolves the comment style for a path.
  pub fn comment_style(&self, path: &Path) -> Result<CommentStyle, SkipReason> {
    self.resolver.resolve(path).ok_or(SkipReason::NoCommentStyle)
  }

  /// Checks that file bytes are text a header can be added to.
  ///
  /// # Returns
  ///
  /// The content as UTF-8 text, or the reason the file is skipped.
  pub fn eligible_text<'a>(&self, bytes: &'a [u8]) -> Result<&'a str, SkipReason> {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LIMIT)];
    if sniff.contains(&0) {
      return Err(SkipReason::Binary);
    }

    let text = std::str::from_utf8(bytes).or(Err(SkipReason::Binary))?;

    if self.skip_generated {
      let head = &bytes[..bytes.len().min(GENERATED_SNIFF_LIMIT)];
      let head = String::from_utf8_lossy(head);
      if GENERATED_MARKERS.iter().any(|marker| head.contains(marker)) {
        return Err(SkipReason::Generated);
      }
    }

    Ok(text)
  }
}

impl Default for FileClassifier {
  fn default() -> Self {
    Self::new(Box::new(StyleTable::builtin()), true)
  }
}

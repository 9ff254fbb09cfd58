//! # Templates Module
//!
//! Loading and rendering of the header template, and wrapping the rendered
//! text in a file type's comment syntax.
//!
//! The module includes:
//! - [`HeaderTemplate`] for loading a template and resolving its variables
//! - [`TemplateVariables`] for the values substituted into `${name}` slots
//! - [`CommentStyle`] for describing how header lines become comments
//!
//! ## Example
//!
//! ```rust
//! use levelheadered::templates::{CommentStyle, HeaderTemplate, TemplateVariables};
//!
//! # fn main() -> anyhow::Result<()> {
//! let template = HeaderTemplate::from_text("Copyright ${year} ${owner}");
//!
//! let mut variables = TemplateVariables::new("2025");
//! variables.insert("owner", "ACME");
//!
//! let header = template.render(&variables)?;
//! assert_eq!(header, "Copyright 2025 ACME");
//!
//! let comment = CommentStyle::line("// ").format(&header, "\n")?;
//! assert_eq!(comment, "// Copyright 2025 ACME");
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use serde::Serialize;

use crate::config::{CommentStyleConfig, ConfigError};
use crate::matcher::RewriteError;
use crate::verbose_log;

/// Matches `\$` escapes, `${name}` and `$name` slots.
static VARIABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\\\$|\$\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}|\$([A-Za-z_][A-Za-z0-9_]*)")
    .expect("variable regex must compile")
});

/// Values available to `${name}` slots in a header template.
///
/// Always carries `year`, which defaults to the current calendar year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariables {
  values: BTreeMap<String, String>,
}

impl TemplateVariables {
  /// Creates a variable set holding only `year`.
  pub fn new(year: impl Into<String>) -> Self {
    let mut values = BTreeMap::new();
    values.insert("year".to_string(), year.into());
    Self { values }
  }

  /// Creates a variable set whose `year` is the current local year.
  pub fn with_current_year() -> Self {
    Self::new(chrono::Local::now().year().to_string())
  }

  /// Sets a variable, replacing any previous value.
  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.values.insert(name.into(), value.into());
  }

  /// Looks up a variable.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }
}

impl Extend<(String, String)> for TemplateVariables {
  fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
    self.values.extend(iter);
  }
}

/// A header template, loaded once per run and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplate {
  /// Where the template came from, if it was read from disk
  source: Option<PathBuf>,
  /// The raw, unrendered template text
  text: String,
}

impl HeaderTemplate {
  /// Loads a template from a file.
  ///
  /// # Parameters
  ///
  /// * `path` - Path to the template file (e.g. `HEADER.txt`)
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::TemplateRead`] if the file is missing,
  /// unreadable or not valid UTF-8.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading header template from: {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateRead {
      path: path.to_path_buf(),
      source: e,
    })?;

    Ok(Self {
      source: Some(path.to_path_buf()),
      text,
    })
  }

  /// Creates a template from inline text.
  pub fn from_text(text: impl Into<String>) -> Self {
    Self {
      source: None,
      text: text.into(),
    }
  }

  /// The file the template was loaded from, if any.
  pub fn source(&self) -> Option<&Path> {
    self.source.as_deref()
  }

  /// The raw template text.
  pub fn text(&self) -> &str {
    &self.text
  }

  /// Renders the template with the given variables.
  ///
  /// `${name}` and `$name` are replaced by the variable's value and `\$`
  /// produces a literal `$`. A `$` that does not start a slot is kept as is.
  /// The result is trimmed of surrounding whitespace.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::UndefinedVariable`] if a slot has no value, and
  /// [`ConfigError::EmptyTemplate`] if nothing but whitespace remains.
  pub fn render(&self, variables: &TemplateVariables) -> Result<String, ConfigError> {
    let mut rendered = String::with_capacity(self.text.len());
    let mut last = 0;

    for caps in VARIABLE_REGEX.captures_iter(&self.text) {
      let Some(whole) = caps.get(0) else { continue };
      rendered.push_str(&self.text[last..whole.start()]);
      last = whole.end();

      match caps.get(1).or_else(|| caps.get(2)) {
        Some(name) => {
          let value = variables.get(name.as_str()).ok_or_else(|| ConfigError::UndefinedVariable {
            name: name.as_str().to_string(),
          })?;
          rendered.push_str(value);
        }
        None => rendered.push('$'),
      }
    }
    rendered.push_str(&self.text[last..]);

    let rendered = rendered.trim();
    if rendered.is_empty() {
      return Err(ConfigError::EmptyTemplate);
    }

    verbose_log!("Rendered header:\n{}", rendered);
    Ok(rendered.to_string())
  }
}

/// How header lines are turned into comments for one file type.
///
/// # Fields
///
/// * `top` - Opening marker of a block comment (e.g. "/*"), empty for line
///   styles
/// * `middle` - Prefix for every header line (e.g. " * " or "// ")
/// * `bottom` - Closing marker of a block comment (e.g. " */"), empty for line
///   styles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommentStyle {
  pub top: String,
  pub middle: String,
  pub bottom: String,
}

impl CommentStyle {
  /// Create a line-comment style (no top/bottom markers).
  ///
  /// # Arguments
  ///
  /// * `prefix` - The prefix to use for each line (e.g., "// " or "# ")
  pub fn line(prefix: &str) -> Self {
    Self {
      top: String::new(),
      middle: prefix.to_string(),
      bottom: String::new(),
    }
  }

  /// Create a block-comment style.
  ///
  /// # Arguments
  ///
  /// * `top` - The string to start the comment block (e.g., "/*")
  /// * `middle` - The prefix for each line (e.g., " * ")
  /// * `bottom` - The string to end the comment block (e.g., " */")
  pub fn block(top: &str, middle: &str, bottom: &str) -> Self {
    Self {
      top: top.to_string(),
      middle: middle.to_string(),
      bottom: bottom.to_string(),
    }
  }

  /// Whether this style wraps the header in opening and closing markers.
  pub fn is_block(&self) -> bool {
    !self.top.trim().is_empty()
  }

  /// The opening marker without surrounding whitespace, e.g. `/*`.
  pub fn opening_marker(&self) -> &str {
    self.top.trim()
  }

  /// The closing marker without surrounding whitespace, e.g. `*/`.
  pub fn closing_marker(&self) -> &str {
    self.bottom.trim()
  }

  /// The per-line marker without surrounding whitespace, e.g. `//`.
  pub fn line_marker(&self) -> &str {
    self.middle.trim()
  }

  /// Wraps rendered header text in this comment style.
  ///
  /// Lines keep their order; trailing whitespace is stripped from each
  /// emitted line and blank lines become the bare marker. Lines are joined
  /// with `line_ending` and the result has no trailing line ending.
  ///
  /// # Errors
  ///
  /// Returns [`RewriteError::HeaderContainsClosingMarker`] if a block style's
  /// closing marker appears inside the header text, since the emitted comment
  /// would end early.
  pub fn format(&self, header_text: &str, line_ending: &str) -> Result<String, RewriteError> {
    let mut lines = Vec::new();

    if self.is_block() {
      lines.push(self.top.trim_end().to_string());
    }

    for line in header_text.trim().lines() {
      if self.is_block() && line.contains(self.closing_marker()) {
        return Err(RewriteError::HeaderContainsClosingMarker {
          marker: self.closing_marker().to_string(),
        });
      }

      if line.trim().is_empty() {
        lines.push(self.middle.trim_end().to_string());
      } else {
        lines.push(format!("{}{}", self.middle, line.trim_end()));
      }
    }

    if self.is_block() {
      lines.push(self.bottom.trim_end().to_string());
    }

    Ok(lines.join(line_ending))
  }
}

impl fmt::Display for CommentStyle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_block() {
      write!(f, "{} {}", self.opening_marker(), self.closing_marker())
    } else {
      write!(f, "{}", self.line_marker())
    }
  }
}

impl From<&CommentStyleConfig> for CommentStyle {
  fn from(config: &CommentStyleConfig) -> Self {
    Self {
      top: config.top.clone(),
      middle: config.middle.clone(),
      bottom: config.bottom.clone(),
    }
  }
}

//! # Configuration Module
//!
//! Configuration support for levelheadered: the header template source,
//! template variables, comment styles per extension or file name, and the
//! include/exclude globs that select files.
//!
//! Configuration is read from a `.levelheadered.toml` file, located via the
//! `--config` flag, the `LEVELHEADERED_CONFIG` environment variable, or the
//! workspace root. Command-line values are merged on top through
//! [`CliOverrides`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".levelheadered.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "LEVELHEADERED_CONFIG";

/// Hint printed after a failed check when the config does not set one.
pub const DEFAULT_APPLY_HINT: &str = "Run `levelheadered apply` to fix this.";

/// User-defined comment style.
///
/// A style with empty `top` and `bottom` is a line style: every header line
/// is prefixed with `middle`. Otherwise `top` and `bottom` open and close a
/// block comment and `middle` prefixes the lines in between.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CommentStyleConfig {
  /// Opening marker of a block comment (e.g. "/*"). Empty for line styles.
  #[serde(default)]
  pub top: String,

  /// Prefix for each header line (e.g. " * " or "// ").
  pub middle: String,

  /// Closing marker of a block comment (e.g. " */"). Empty for line styles.
  #[serde(default)]
  pub bottom: String,
}

impl CommentStyleConfig {
  /// Create a new line-comment style (no top/bottom markers).
  pub fn line(prefix: &str) -> Self {
    Self {
      top: String::new(),
      middle: prefix.to_string(),
      bottom: String::new(),
    }
  }

  /// Create a new block-comment style.
  pub fn block(top: &str, middle: &str, bottom: &str) -> Self {
    Self {
      top: top.to_string(),
      middle: middle.to_string(),
      bottom: bottom.to_string(),
    }
  }

  fn check(&self, key: &str) -> Result<(), ConfigError> {
    if self.middle.trim().is_empty() {
      return Err(ConfigError::InvalidCommentStyle {
        key: key.to_string(),
        message: "middle field cannot be empty".to_string(),
      });
    }

    if self.top.trim().is_empty() != self.bottom.trim().is_empty() {
      return Err(ConfigError::InvalidCommentStyle {
        key: key.to_string(),
        message: "block styles need both top and bottom markers".to_string(),
      });
    }

    Ok(())
  }
}

/// Include/exclude globs selecting the files to manage.
///
/// Globs are matched against paths relative to the workspace root. When
/// `include` is non-empty, only matching files are considered; `exclude`
/// always wins.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
  #[serde(default)]
  pub include: Vec<String>,

  #[serde(default)]
  pub exclude: Vec<String>,
}

/// Main configuration struct, loaded from `.levelheadered.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// Path to the header template, relative to the config file.
  pub header_template: Option<PathBuf>,

  /// Inline header template, used instead of `header-template`.
  pub header: Option<String>,

  /// Advice printed when a check fails.
  pub apply_hint: Option<String>,

  /// Whether the built-in comment style table is consulted.
  #[serde(default = "default_true")]
  pub builtin_styles: bool,

  /// Whether files marked as generated are skipped.
  #[serde(default = "default_true")]
  pub skip_generated: bool,

  /// Template variables.
  #[serde(default)]
  pub variables: BTreeMap<String, String>,

  /// Comment styles keyed by extension without the leading dot
  /// (e.g. "kt", "gradle.kts").
  #[serde(default)]
  pub comment_styles: HashMap<String, CommentStyleConfig>,

  /// Comment styles keyed by exact file name or file-name glob
  /// (e.g. "Justfile", "*.cmake.in").
  #[serde(default)]
  pub filenames: HashMap<String, CommentStyleConfig>,

  /// File selection globs.
  #[serde(default)]
  pub files: FilesConfig,

  /// Directory of the loaded config file, for resolving relative paths.
  #[serde(skip)]
  pub base_dir: Option<PathBuf>,
}

const fn default_true() -> bool {
  true
}

impl Default for Config {
  fn default() -> Self {
    Self {
      header_template: None,
      header: None,
      apply_hint: None,
      builtin_styles: true,
      skip_generated: true,
      variables: BTreeMap::new(),
      comment_styles: HashMap::new(),
      filenames: HashMap::new(),
      files: FilesConfig::default(),
      base_dir: None,
    }
  }
}

/// Errors that abort a run before any file is scanned.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// A comment style configuration is invalid.
  #[error("Invalid comment style for '{key}': {message}")]
  InvalidCommentStyle { key: String, message: String },

  /// Both `header-template` and `header` were configured.
  #[error("Config file '{path}' sets both header-template and header; pick one")]
  ConflictingTemplateSources { path: PathBuf },

  /// No header template was configured anywhere.
  #[error("No header template configured. Pass --header-template or set header-template in .levelheadered.toml")]
  MissingTemplate,

  /// The header template file could not be read.
  #[error("Failed to read header template '{path}': {source}")]
  TemplateRead { path: PathBuf, source: std::io::Error },

  /// The rendered header is empty.
  #[error("Header template renders to empty text")]
  EmptyTemplate,

  /// The template references a variable that has no value.
  #[error("Header template references undefined variable '{name}'")]
  UndefinedVariable { name: String },

  /// An include or exclude glob is invalid.
  #[error("Invalid glob pattern '{pattern}': {source}")]
  InvalidPattern { pattern: String, source: globset::Error },

  /// A command-line override could not be parsed.
  #[error("Invalid {flag} value '{value}': {message}")]
  InvalidOverride {
    flag: &'static str,
    value: String,
    message: String,
  },
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError`] if the file cannot be read, is not valid TOML,
  /// or fails validation.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    if config.header_template.is_some() && config.header.is_some() {
      return Err(ConfigError::ConflictingTemplateSources {
        path: path.to_path_buf(),
      });
    }

    config.validate()?;
    config.normalize();
    config.base_dir = path.parent().map(Path::to_path_buf);

    verbose_log!(
      "Loaded {} extension and {} file name comment styles",
      config.comment_styles.len(),
      config.filenames.len()
    );

    Ok(config)
  }

  /// Checks comment style tables: non-empty `middle`, matching block
  /// markers, and extension keys without a leading dot.
  fn validate(&self) -> Result<(), ConfigError> {
    for (ext, style) in &self.comment_styles {
      if ext.is_empty() || ext.starts_with('.') {
        return Err(ConfigError::InvalidCommentStyle {
          key: ext.clone(),
          message: "extension must be non-empty and should not include leading dot".to_string(),
        });
      }
      style.check(ext)?;
    }

    for (filename, style) in &self.filenames {
      style.check(filename)?;
    }

    Ok(())
  }

  /// Lowercases style keys so lookups are case-insensitive.
  fn normalize(&mut self) {
    self.comment_styles = std::mem::take(&mut self.comment_styles)
      .into_iter()
      .map(|(k, v)| (k.to_lowercase(), v))
      .collect();
    self.filenames = std::mem::take(&mut self.filenames)
      .into_iter()
      .map(|(k, v)| (k.to_lowercase(), v))
      .collect();
  }

  /// The configured template path, resolved against the config directory.
  pub fn template_path(&self) -> Option<PathBuf> {
    let path = self.header_template.as_ref()?;
    match &self.base_dir {
      Some(base) if path.is_relative() => Some(base.join(path)),
      _ => Some(path.clone()),
    }
  }

  /// The hint printed after a failed check.
  pub fn apply_hint(&self) -> &str {
    self.apply_hint.as_deref().unwrap_or(DEFAULT_APPLY_HINT)
  }

  /// Merges command-line overrides on top of this configuration.
  ///
  /// CLI comment styles replace config entries with the same key; CLI
  /// variables replace config variables with the same name.
  pub fn merge_cli_overrides(&mut self, overrides: CliOverrides) {
    self.comment_styles.extend(overrides.comment_styles);
    self.variables.extend(overrides.variables);
  }
}

/// Values given on the command line that override configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliOverrides {
  /// Line styles from `--comment-style EXT:PREFIX`.
  pub comment_styles: HashMap<String, CommentStyleConfig>,
  /// Variables from `--var KEY=VALUE`.
  pub variables: BTreeMap<String, String>,
}

impl CliOverrides {
  /// Parses `--comment-style` and `--var` arguments.
  ///
  /// # Arguments
  ///
  /// * `comment_styles` - Values of the form `EXT:PREFIX`, e.g. `kt:// `
  /// * `variables` - Values of the form `KEY=VALUE`, e.g. `owner=ACME`
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidOverride`] for malformed values.
  pub fn from_cli_args(comment_styles: &[String], variables: &[String]) -> Result<Self, ConfigError> {
    let mut overrides = Self::default();

    for arg in comment_styles {
      let Some((ext, prefix)) = arg.split_once(':') else {
        return Err(ConfigError::InvalidOverride {
          flag: "--comment-style",
          value: arg.clone(),
          message: "expected EXT:PREFIX".to_string(),
        });
      };
      let ext = ext.trim().to_lowercase();
      if ext.is_empty() || ext.starts_with('.') || prefix.trim().is_empty() {
        return Err(ConfigError::InvalidOverride {
          flag: "--comment-style",
          value: arg.clone(),
          message: "extension (without leading dot) and prefix must be non-empty".to_string(),
        });
      }
      overrides.comment_styles.insert(ext, CommentStyleConfig::line(prefix));
    }

    for arg in variables {
      let Some((key, value)) = arg.split_once('=') else {
        return Err(ConfigError::InvalidOverride {
          flag: "--var",
          value: arg.clone(),
          message: "expected KEY=VALUE".to_string(),
        });
      };
      let key = key.trim();
      let valid_key = key.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
      if !valid_key {
        return Err(ConfigError::InvalidOverride {
          flag: "--var",
          value: arg.clone(),
          message: "variable names are letters, digits and underscores".to_string(),
        });
      }
      overrides.variables.insert(key.to_string(), value.to_string());
    }

    Ok(overrides)
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `LEVELHEADERED_CONFIG` environment variable
/// 3. `.levelheadered.toml` in the workspace root
///
/// An explicit path is returned even if it does not exist, so that loading
/// reports the missing file instead of silently running without it.
pub fn discover_config_path(explicit_path: Option<&Path>, workspace_root: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    verbose_log!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let workspace_config = workspace_root.join(DEFAULT_CONFIG_FILENAME);
  if workspace_config.exists() {
    verbose_log!("Using workspace config: {}", workspace_config.display());
    return Some(workspace_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workspace_root` - The workspace root directory
/// * `no_config` - If true, skip config file discovery
///
/// # Returns
///
/// The loaded configuration, or `None` if no config file applies.
pub fn load_config(
  explicit_path: Option<&Path>,
  workspace_root: &Path,
  no_config: bool,
) -> Result<Option<Config>, ConfigError> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(None);
  }

  discover_config_path(explicit_path, workspace_root)
    .map(|path| Config::load(&path))
    .transpose()
}

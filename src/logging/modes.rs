use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the tracing filter derived from `-v`/`-q`.
pub const LOG_ENV_VAR: &str = "LEVELHEADERED_LOG";

/// Global output mode shared by the logging macros and the output module.
///
/// Starts as [`OutputMode::Normal`] until [`set_verbose`] or [`set_quiet`] is
/// called.
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
  Normal = 0,
  Quiet = 1,
  Verbose = 2,
}

impl OutputMode {
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => OutputMode::Quiet,
      2 => OutputMode::Verbose,
      _ => OutputMode::Normal,
    }
  }
}

/// When to colorize terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
  /// Colorize when the output stream supports it
  #[default]
  Auto,
  /// Never use colors
  Never,
  /// Always use colors
  Always,
}

impl ColorMode {
  /// Installs this mode as the process-wide color policy for `owo-colors`.
  ///
  /// `Auto` leaves the decision to `owo-colors`' stream detection, which
  /// also honors `NO_COLOR` and `FORCE_COLOR`.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Sets the global output mode to verbose.
///
/// When verbose, [`verbose_log!`](crate::verbose_log) prints to stderr and
/// the output module lists every file, including unsupported ones.
pub fn set_verbose() {
  OUTPUT_MODE.store(OutputMode::Verbose as u8, Ordering::SeqCst);
}

/// Sets the global output mode to quiet.
pub fn set_quiet() {
  OUTPUT_MODE.store(OutputMode::Quiet as u8, Ordering::SeqCst);
}

/// Checks if verbose output is enabled.
pub fn is_verbose() -> bool {
  matches!(
    OutputMode::from_u8(OUTPUT_MODE.load(Ordering::SeqCst)),
    OutputMode::Verbose
  )
}

/// Checks if quiet mode is enabled.
///
/// # Returns
///
/// `true` if quiet mode is enabled, `false` otherwise.
pub fn is_quiet() -> bool {
  matches!(OutputMode::from_u8(OUTPUT_MODE.load(Ordering::SeqCst)), OutputMode::Quiet)
}

/// Installs the global `tracing` subscriber.
///
/// Events go to stderr. The filter comes from [`LOG_ENV_VAR`] when set,
/// otherwise from the verbosity flags: quiet maps to `error`, no flag to
/// `warn`, `-v` to `info`, `-vv` to `debug` and anything higher to `trace`.
/// Calling this more than once is harmless; later calls are ignored.
///
/// # Parameters
///
/// * `quiet` - Whether `-q` was given
/// * `verbose` - Number of `-v` flags
pub fn init_tracing(quiet: bool, verbose: u8) {
  let level = if quiet {
    "error"
  } else {
    match verbose {
      0 => "warn",
      1 => "info",
      2 => "debug",
      _ => "trace",
    }
  };

  let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(format!("levelheadered={level}")));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .try_init();
}

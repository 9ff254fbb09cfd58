//! # Logging Module
//!
//! User-facing logging helpers for levelheadered:
//! - [`verbose_log!`](crate::verbose_log) for detail that only shows with `-v`
//! - [`info_log!`](crate::info_log) for notices that are hidden with `-q`
//!
//! Structured diagnostics go through `tracing`; [`init_tracing`] installs the
//! subscriber. Verbose logs and tracing events are written to stderr so that
//! stdout only carries the per-file status report.
//!
//! ## Example
//!
//! ```rust
//! use levelheadered::logging::{ColorMode, set_verbose};
//! use levelheadered::{info_log, verbose_log};
//!
//! set_verbose();
//! ColorMode::Never.apply();
//!
//! verbose_log!("Evaluating: {}", "src/App.java");
//! info_log!("Wrote report to {}", "report.json");
//! ```

mod modes;

pub use modes::{ColorMode, LOG_ENV_VAR, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
use owo_colors::{OwoColorize, Stream};

/// Logs a message to stderr if verbose mode is enabled.
///
/// Takes the same format string syntax as [`eprintln!`].
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Logs a notice to stdout unless quiet mode is enabled.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        if !$crate::logging::is_quiet() {
            $crate::logging::print_info_log(&format!($($arg)*));
        }
    };
}

/// Prints an [`info_log!`](crate::info_log) message, colored when stdout
/// supports it.
///
/// # Parameters
///
/// * `message` - The message to print
pub fn print_info_log(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow()));
}

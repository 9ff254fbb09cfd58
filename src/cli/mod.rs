//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing; `check` and `apply` are subcommands
//! sharing one set of arguments, and the bare command runs with `--mode`.

mod run;

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Parser, Subcommand};
pub use run::{RunArgs, run};

use crate::processor::Mode;

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about,
  styles = CUSTOM_STYLES,
  args_conflicts_with_subcommands = true,
  after_help = "Examples:
  # Check headers in the current directory
  levelheadered check -t HEADER.txt

  # Insert missing headers and replace stale ones
  levelheadered apply -t HEADER.txt src/ tests/

  # Render the template with extra variables
  levelheadered check -t HEADER.txt --var owner=\"ACME Corp\" --year 2024 .

  # Use a line style for an extension without a built-in style
  levelheadered apply -t HEADER.txt --comment-style \"kt:// \" .

  # Preview what apply would change
  levelheadered check --show-diff -t HEADER.txt src/

  # Write a machine-readable report
  levelheadered check --report-json headers.json -t HEADER.txt .
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Command>,

  #[command(flatten)]
  pub run_args: RunArgs,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
  /// Report header status without modifying files (default)
  Check(RunArgs),
  /// Insert missing headers and replace stale ones
  Apply(RunArgs),
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// The effective run arguments, with the mode taken from the subcommand
  /// when one is given.
  pub fn into_run_args(self) -> RunArgs {
    match self.command {
      Some(Command::Check(args)) => RunArgs {
        mode: Mode::Check,
        ..args
      },
      Some(Command::Apply(args)) => RunArgs {
        mode: Mode::Apply,
        ..args
      },
      None => self.run_args,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_subcommand_selects_mode() {
    let cli = Cli::try_parse_from(["levelheadered", "apply", "-t", "H.txt", "src"]).unwrap();
    let args = cli.into_run_args();
    assert_eq!(args.mode, Mode::Apply);
    assert_eq!(args.patterns, vec!["src".to_string()]);
  }

  #[test]
  fn test_mode_flag_without_subcommand() {
    let cli = Cli::try_parse_from(["levelheadered", "--mode", "apply", "-t", "H.txt"]).unwrap();
    assert_eq!(cli.into_run_args().mode, Mode::Apply);

    let cli = Cli::try_parse_from(["levelheadered", "-t", "H.txt"]).unwrap();
    let args = cli.into_run_args();
    assert_eq!(args.mode, Mode::Check);
    assert_eq!(args.patterns, vec![".".to_string()]);
  }

  #[test]
  fn test_quiet_conflicts_with_verbose() {
    assert!(Cli::try_parse_from(["levelheadered", "-q", "-v"]).is_err());
  }
}

//! # Run Command
//!
//! Implements `check` and `apply`: resolves the workspace and configuration,
//! renders the header, evaluates every selected file and reports.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::classifier::FileClassifier;
use crate::config::{CliOverrides, Config, ConfigError, load_config};
use crate::diff::DiffManager;
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{print_hint, print_records, print_summary};
use crate::processor::{Mode, Processor, ProcessorConfig};
use crate::report::{ReportFormat, ReportGenerator};
use crate::templates::{HeaderTemplate, TemplateVariables};
use crate::workspace::resolve_workspace;

/// Arguments shared by `check` and `apply`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
  /// Files, directories (processed recursively) or glob patterns
  #[arg(default_value = ".")]
  pub patterns: Vec<String>,

  /// Whether to only report or also rewrite files
  #[arg(long, value_enum, default_value_t = Mode::Check)]
  pub mode: Mode,

  /// Header template file (overrides header-template from the config)
  #[arg(long, short = 't', value_name = "FILE")]
  pub header_template: Option<PathBuf>,

  /// Template variable (repeatable, format: KEY=VALUE)
  #[arg(long = "var", value_name = "KEY=VALUE")]
  pub vars: Vec<String>,

  /// Value of the `year` template variable [default: current year]
  #[arg(long)]
  pub year: Option<String>,

  /// Only manage files matching these globs (repeatable)
  #[arg(long, value_name = "GLOB")]
  pub include: Vec<String>,

  /// Never manage files matching these globs (repeatable)
  #[arg(long, value_name = "GLOB")]
  pub exclude: Vec<String>,

  /// Line comment style for an extension (repeatable, format: EXT:PREFIX)
  /// Example: --comment-style "kt:// " --comment-style "xyz:# "
  #[arg(long, value_name = "EXT:PREFIX")]
  pub comment_style: Vec<String>,

  /// Path to config file (default: .levelheadered.toml in workspace root)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Number of files evaluated in parallel [default: number of CPUs]
  #[arg(long, short = 'j', value_name = "N")]
  pub jobs: Option<usize>,

  /// Print a diff of what apply would change to stderr
  #[arg(long)]
  pub show_diff: bool,

  /// Save a diff of what apply would change to a file
  #[arg(long, value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Write a JSON report to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Write a CSV report to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_csv: Option<PathBuf>,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Only print the paths of failing files
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

/// Picks the header template: the command line wins over the config file.
fn resolve_template(args: &RunArgs, config: &Config) -> Result<HeaderTemplate, ConfigError> {
  if let Some(path) = &args.header_template {
    return HeaderTemplate::load(path);
  }

  if let Some(path) = config.template_path() {
    return HeaderTemplate::load(&path);
  }

  match &config.header {
    Some(text) => Ok(HeaderTemplate::from_text(text.clone())),
    None => Err(ConfigError::MissingTemplate),
  }
}

/// Template variables: config values, then `--var`, then `--year`.
fn resolve_variables(args: &RunArgs, config: &Config) -> TemplateVariables {
  let mut variables = TemplateVariables::with_current_year();
  variables.extend(config.variables.clone());
  if let Some(year) = &args.year {
    variables.insert("year", year.clone());
  }
  variables
}

/// Everything that must be settled before a file is scanned.
///
/// Any error here is fatal for the run.
fn prepare(args: &RunArgs, workspace_root: PathBuf) -> Result<(ProcessorConfig, Config)> {
  let mut config = load_config(args.config.as_deref(), &workspace_root, args.no_config)?.unwrap_or_default();

  let overrides = CliOverrides::from_cli_args(&args.comment_style, &args.vars)?;
  config.merge_cli_overrides(overrides);

  let template = resolve_template(args, &config)?;
  if let Some(source) = template.source() {
    debug!("Using header template: {}", source.display());
  }
  let header_text = template.render(&resolve_variables(args, &config))?;

  let classifier = FileClassifier::from_config(&config)?;

  let mut include = config.files.include.clone();
  include.extend(args.include.iter().cloned());
  let mut exclude = config.files.exclude.clone();
  exclude.extend(args.exclude.iter().cloned());

  let diff_manager = if args.mode == Mode::Check && (args.show_diff || args.save_diff.is_some()) {
    Some(DiffManager::new(args.show_diff, args.save_diff.clone())?)
  } else {
    None
  };

  let processor_config = ProcessorConfig {
    classifier,
    mode: args.mode,
    include,
    exclude,
    jobs: args.jobs,
    diff_manager,
    ..ProcessorConfig::new(header_text, workspace_root)
  };

  Ok((processor_config, config))
}

/// Run `check` or `apply` with the given arguments.
///
/// Exits the process with status 1 when the run fails.
pub async fn run(args: RunArgs) -> Result<()> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  if args.mode == Mode::Apply && (args.show_diff || args.save_diff.is_some()) {
    debug!("Diffs are only produced in check mode; ignoring --show-diff/--save-diff");
  }

  let workspace = resolve_workspace(&args.patterns)?;
  let workspace_root = workspace.root().to_path_buf();
  debug!(
    "Using {} workspace root: {}",
    if workspace.is_git() { "git" } else { "directory" },
    workspace_root.display()
  );

  let prepared = prepare(&args, workspace_root)
    .and_then(|(processor_config, config)| Ok((Processor::new(processor_config)?, config)));
  let (processor, config) = match prepared {
    Ok(prepared) => prepared,
    Err(e) => {
      eprintln!("ERROR: {e:#}");
      process::exit(1);
    }
  };

  let start_time = Instant::now();
  let result = processor
    .run(&args.patterns)
    .await
    .with_context(|| "Failed to collect files")?;
  let summary = result.summary(start_time.elapsed());

  print_records(&result);
  print_summary(&summary, result.mode(), result.success());

  if !result.success() && result.mode() == Mode::Check && result.failures().any(|r| r.error.is_none()) {
    print_hint(config.apply_hint());
  }

  let reports = [
    (ReportFormat::Json, args.report_json.as_ref()),
    (ReportFormat::Csv, args.report_csv.as_ref()),
  ];
  for (format, output_path) in reports {
    let Some(output_path) = output_path else {
      continue;
    };
    let report_generator = ReportGenerator::new(format, output_path);
    if let Err(e) = report_generator.generate(&result, &summary) {
      eprintln!("Error generating {} report: {:#}", format, e);
    } else {
      info_log!("Generated {} report at {}", format, output_path.display());
    }
  }

  if !result.success() {
    process::exit(1);
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use clap::Parser;
  use tempfile::TempDir;

  use super::*;
  use crate::cli::Cli;

  fn parse(args: &[&str]) -> RunArgs {
    let mut argv = vec!["levelheadered"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().into_run_args()
  }

  #[test]
  fn test_cli_template_beats_config() {
    let temp_dir = TempDir::new().unwrap();
    let cli_template = temp_dir.path().join("CLI.txt");
    fs::write(&cli_template, "From CLI").unwrap();

    let args = parse(&["-t", cli_template.to_str().unwrap()]);
    let config = Config {
      header: Some("From config".to_string()),
      ..Config::default()
    };

    assert_eq!(resolve_template(&args, &config).unwrap().text(), "From CLI");
  }

  #[test]
  fn test_missing_template_is_an_error() {
    let args = parse(&[]);
    let err = resolve_template(&args, &Config::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingTemplate));
  }

  #[test]
  fn test_year_flag_overrides_config_variable() {
    let args = parse(&["--year", "1999"]);
    let mut config = Config::default();
    config.variables.insert("year".to_string(), "2001".to_string());
    config.variables.insert("owner".to_string(), "ACME".to_string());

    let variables = resolve_variables(&args, &config);
    assert_eq!(variables.get("year"), Some("1999"));
    assert_eq!(variables.get("owner"), Some("ACME"));
  }

  #[test]
  fn test_prepare_renders_header_with_cli_vars() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("HEADER.txt");
    fs::write(&template, "Copyright ${year} $owner\n").unwrap();

    let args = parse(&[
      "--no-config",
      "-t",
      template.to_str().unwrap(),
      "--var",
      "owner=ACME",
      "--year",
      "2024",
    ]);
    let (processor_config, _) = prepare(&args, temp_dir.path().to_path_buf()).unwrap();

    assert_eq!(processor_config.header_text, "Copyright 2024 ACME");
  }
}

//! # levelheadered
//!
//! A tool that verifies and applies license/copyright headers across a
//! source tree.

use anyhow::Result;
use levelheadered::cli::{Cli, run};

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse_args();
  run(cli.into_run_args()).await
}

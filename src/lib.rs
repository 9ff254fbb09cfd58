//! # levelheadered
//!
//! Verifies and applies license/copyright headers across a source tree.
//!
//! Every file is classified by type, its leading comment is compared to the
//! rendered header template, and it is reported as `MATCHED`, `STALE`,
//! `MISSING` or `UNSUPPORTED`. In apply mode, stale headers are replaced
//! and missing ones inserted, with each file rewritten atomically.
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use levelheadered::processor::{Mode, Processor, ProcessorConfig};
//! use levelheadered::templates::{HeaderTemplate, TemplateVariables};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let template = HeaderTemplate::load("HEADER.txt".as_ref())?;
//!     let header_text = template.render(&TemplateVariables::new("2024"))?;
//!
//!     let processor = Processor::new(ProcessorConfig {
//!         mode: Mode::Apply,
//!         ..ProcessorConfig::new(header_text, PathBuf::from("."))
//!     })?;
//!
//!     let result = processor.run(&["src".to_string()]).await?;
//!     for record in result.records() {
//!         println!("{} {}", record.status, record.path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`templates`] - Header templates and comment styles
//! * [`classifier`] - Comment style resolution and binary/generated detection
//! * [`matcher`] - Header comparison and rewrite planning
//! * [`applier`] - Atomic file rewrites
//! * [`report`] - Per-file records, summaries and JSON/CSV reports
//! * [`processor`] - Collection, filtering and parallel evaluation
//! * [`cli`] - The `check` and `apply` commands behind the binary

pub mod applier;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod diff;
pub mod file_filter;
pub mod ignore;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod processor;
pub mod report;
pub mod templates;
pub mod workspace;

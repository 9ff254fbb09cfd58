mod common;

use std::path::{Path, PathBuf};

use anyhow::Result;
use common::{read_file, write_file};
use levelheadered::classifier::{FileClassifier, StyleTable};
use levelheadered::config::Config;
use levelheadered::processor::{Mode, Processor, ProcessorConfig};
use levelheadered::report::{FileAction, HeaderStatus};
use levelheadered::templates::{CommentStyle, HeaderTemplate, TemplateVariables};
use tempfile::tempdir;

fn processor(root: &Path, header: &str, mode: Mode) -> Result<Processor> {
  Ok(Processor::new(ProcessorConfig {
    mode,
    ..ProcessorConfig::new(header, root.to_path_buf())
  })?)
}

fn pattern(root: &Path) -> Vec<String> {
  vec![root.to_string_lossy().to_string()]
}

#[tokio::test]
async fn test_missing_then_apply_then_check() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "src/App.java", "package app;\n\nclass App {}\n")?;
  write_file(root, "scripts/build.py", "print('build')\n")?;

  let checked = processor(root, "Copyright 2024 ACME", Mode::Check)?
    .run(&pattern(root))
    .await?;
  assert!(!checked.success());
  assert!(
    checked
      .records()
      .iter()
      .all(|r| r.status == HeaderStatus::Missing)
  );

  let applied = processor(root, "Copyright 2024 ACME", Mode::Apply)?
    .run(&pattern(root))
    .await?;
  assert!(applied.success());
  assert!(
    applied
      .records()
      .iter()
      .all(|r| r.action == Some(FileAction::Inserted))
  );

  assert_eq!(
    read_file(root, "src/App.java")?,
    "/*\n * Copyright 2024 ACME\n */\n\npackage app;\n\nclass App {}\n"
  );
  assert_eq!(
    read_file(root, "scripts/build.py")?,
    "# Copyright 2024 ACME\n\nprint('build')\n"
  );

  let rechecked = processor(root, "Copyright 2024 ACME", Mode::Check)?
    .run(&pattern(root))
    .await?;
  assert!(rechecked.success());
  assert!(
    rechecked
      .records()
      .iter()
      .all(|r| r.status == HeaderStatus::Matched)
  );

  Ok(())
}

#[tokio::test]
async fn test_apply_is_idempotent() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "a.rs", "// Copyright 2023\nfn a() {}\n")?;
  write_file(root, "b.go", "package b\n")?;

  processor(root, "Copyright 2024", Mode::Apply)?
    .run(&pattern(root))
    .await?;
  let first_a = read_file(root, "a.rs")?;
  let first_b = read_file(root, "b.go")?;

  let second = processor(root, "Copyright 2024", Mode::Apply)?
    .run(&pattern(root))
    .await?;

  assert!(second.records().iter().all(|r| r.action.is_none()));
  assert_eq!(read_file(root, "a.rs")?, first_a);
  assert_eq!(read_file(root, "b.go")?, first_b);

  Ok(())
}

#[tokio::test]
async fn test_stale_replace_keeps_following_bytes() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  let tail = "\npackage lib\n\n/* not the header */\nfunc F() {}\n";
  write_file(root, "lib.go", format!("// Copyright 2019 Old Corp\n// All rights reserved.{tail}"))?;

  let result = processor(root, "Copyright 2024 New Corp", Mode::Apply)?
    .run(&pattern(root))
    .await?;

  let record = &result.records()[0];
  assert_eq!(record.action, Some(FileAction::Replaced));
  assert_eq!(
    record.existing_header.as_deref(),
    Some("// Copyright 2019 Old Corp\n// All rights reserved.")
  );
  assert_eq!(
    read_file(root, "lib.go")?,
    format!("// Copyright 2024 New Corp{tail}")
  );

  Ok(())
}

#[tokio::test]
async fn test_header_in_middle_is_missing() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "mid.py", "import os\n# Copyright 2024\n")?;

  let result = processor(root, "Copyright 2024", Mode::Check)?
    .run(&pattern(root))
    .await?;

  assert_eq!(result.records()[0].status, HeaderStatus::Missing);

  Ok(())
}

#[tokio::test]
async fn test_records_sorted_by_path() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  for name in ["z.rs", "m/b.rs", "a.rs", "m/a.rs", "k.py"] {
    write_file(root, name, "fn f() {}\n")?;
  }

  let processor = Processor::new(ProcessorConfig {
    jobs: Some(4),
    ..ProcessorConfig::new("Copyright 2024", root.to_path_buf())
  })?;
  let result = processor.run(&pattern(root)).await?;

  let paths: Vec<PathBuf> = result.records().iter().map(|r| r.path.clone()).collect();
  let mut sorted = paths.clone();
  sorted.sort();
  assert_eq!(paths, sorted);
  assert_eq!(paths.len(), 5);

  Ok(())
}

#[tokio::test]
async fn test_custom_classifier_from_config() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "build.xyz", "thing\n")?;
  write_file(root, "main.rs", "fn main() {}\n")?;

  let mut table = StyleTable::new();
  table.insert_extension("xyz", CommentStyle::line("%% "));
  let classifier = FileClassifier::new(Box::new(table), true);

  let processor = Processor::new(ProcessorConfig {
    classifier,
    mode: Mode::Apply,
    ..ProcessorConfig::new("Copyright 2024", root.to_path_buf())
  })?;
  let result = processor.run(&pattern(root)).await?;

  // Without the built-in table, Rust files have no style.
  let statuses: Vec<_> = result.records().iter().map(|r| r.status).collect();
  assert_eq!(statuses, vec![HeaderStatus::Matched, HeaderStatus::Unsupported]);
  assert_eq!(read_file(root, "build.xyz")?, "%% Copyright 2024\n\nthing\n");
  assert_eq!(read_file(root, "main.rs")?, "fn main() {}\n");

  Ok(())
}

#[tokio::test]
async fn test_builtin_styles_can_be_disabled_in_config() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "main.rs", "fn main() {}\n")?;

  let config: Config = toml::from_str("builtin-styles = false\n")?;
  let processor = Processor::new(ProcessorConfig {
    classifier: FileClassifier::from_config(&config)?,
    ..ProcessorConfig::new("Copyright 2024", root.to_path_buf())
  })?;
  let result = processor.run(&pattern(root)).await?;

  assert_eq!(result.records()[0].status, HeaderStatus::Unsupported);
  assert!(result.success());

  Ok(())
}

#[tokio::test]
async fn test_rendered_template_with_block_style() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  let template_path = write_file(root, "templates/HEADER.txt", "Copyright ${year} $owner\n\nLicensed under MIT.\n")?;
  write_file(root, "src/index.ts", "export const x = 1;\n")?;

  let mut variables = TemplateVariables::new("2024");
  variables.insert("owner", "ACME");
  let header = HeaderTemplate::load(&template_path)?.render(&variables)?;

  processor(root, &header, Mode::Apply)?
    .run(&[root.join("src").to_string_lossy().to_string()])
    .await?;

  assert_eq!(
    read_file(root, "src/index.ts")?,
    "/*\n * Copyright 2024 ACME\n *\n * Licensed under MIT.\n */\n\nexport const x = 1;\n"
  );

  Ok(())
}

#[tokio::test]
async fn test_glob_patterns_select_files() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "src/a.rs", "fn a() {}\n")?;
  write_file(root, "src/b.py", "b = 1\n")?;

  let processor = processor(root, "Copyright 2024", Mode::Check)?;
  let files = processor.collect_files(&[format!("{}/src/*.rs", root.display())])?;

  assert_eq!(files, vec![root.join("src/a.rs")]);

  Ok(())
}

#[tokio::test]
async fn test_invalid_exclude_glob_is_rejected() -> Result<()> {
  let temp_dir = tempdir()?;

  let result = Processor::new(ProcessorConfig {
    exclude: vec!["src/[".to_string()],
    ..ProcessorConfig::new("Copyright 2024", temp_dir.path().to_path_buf())
  });

  assert!(result.is_err());

  Ok(())
}

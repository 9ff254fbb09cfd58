//! # Content Transformer Module
//!
//! Low-level text helpers shared by the matcher: line-ending detection and
//! splitting off first lines that must stay first (shebangs, XML
//! declarations, encoding directives and similar).

use crate::matcher::RewriteError;

/// The line ending used by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
  Lf,
  CrLf,
}

impl LineEnding {
  /// The line ending native to the current platform.
  pub const fn platform_default() -> Self {
    if cfg!(windows) { LineEnding::CrLf } else { LineEnding::Lf }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      LineEnding::Lf => "\n",
      LineEnding::CrLf => "\r\n",
    }
  }

  /// Detects the line ending of `content`.
  ///
  /// Content without any line ending gets [`LineEnding::platform_default`].
  ///
  /// # Errors
  ///
  /// Returns [`RewriteError::MixedLineEndings`] when both `\n` and `\r\n`
  /// terminated lines are present.
  pub fn detect(content: &str) -> Result<Self, RewriteError> {
    let mut lf = 0usize;
    let mut crlf = 0usize;

    let bytes = content.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
      if *b == b'\n' {
        if i > 0 && bytes[i - 1] == b'\r' {
          crlf += 1;
        } else {
          lf += 1;
        }
      }
    }

    match (lf, crlf) {
      (0, 0) => Ok(Self::platform_default()),
      (_, 0) => Ok(LineEnding::Lf),
      (0, _) => Ok(LineEnding::CrLf),
      _ => Err(RewriteError::MixedLineEndings),
    }
  }
}

/// Leading-line markers that must stay ahead of any header.
///
/// Compared case-insensitively against the start of each line.
const PRESERVED_PREFIXES: &[&str] = &[
  "#!",                       // shebang
  "<?xml",                    // XML declaration
  "<!doctype",                // HTML doctype
  "<?php",                    // PHP opening tag
  "# encoding:",              // Ruby encoding
  "# -*- coding",             // Python/Emacs coding cookie
  "# frozen_string_literal:", // Ruby interpreter instruction
  "# syntax=",                // Dockerfile directive
  "# escape=",                // Dockerfile directive
];

const BOM: char = '\u{feff}';

fn is_preserved_line(line: &str, first: bool) -> bool {
  let lowered = line.to_lowercase();

  if lowered.starts_with("#!") {
    // Rust inner attributes (`#![...]`) are not shebangs.
    return first && !lowered.starts_with("#![");
  }

  PRESERVED_PREFIXES.iter().any(|p| lowered.starts_with(p))
}

/// Splits off the leading lines that have to remain first in the file.
///
/// A byte order mark is always kept. After it, every consecutive line that
/// starts with a preserved marker is kept too, so a shebang followed by an
/// encoding cookie or `# frozen_string_literal:` stays together. A shebang
/// only counts on the very first line.
///
/// Returns the preserved text (any kept line terminated with
/// `line_ending`) and the rest of the content. When nothing is special, the
/// prefix is empty and the content is returned unchanged.
///
/// # Parameters
///
/// * `content` - The file content
/// * `line_ending` - Line ending appended to an unterminated prefix line
pub fn split_preserved_prefix(content: &str, line_ending: LineEnding) -> (String, &str) {
  let mut end = if content.starts_with(BOM) { BOM.len_utf8() } else { 0 };
  let mut kept_lines = 0usize;

  for line in content[end..].split_inclusive('\n') {
    if !is_preserved_line(line, kept_lines == 0) {
      break;
    }
    end += line.len();
    kept_lines += 1;
  }

  let mut prefix = content[..end].to_string();
  if kept_lines > 0 && !prefix.ends_with('\n') {
    prefix.push_str(line_ending.as_str());
  }

  (prefix, &content[end..])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_detect_line_endings() {
    assert_eq!(LineEnding::detect("a\nb\n").unwrap(), LineEnding::Lf);
    assert_eq!(LineEnding::detect("a\r\nb\r\n").unwrap(), LineEnding::CrLf);
    assert_eq!(LineEnding::detect("no newline").unwrap(), LineEnding::platform_default());
    assert_eq!(LineEnding::detect("").unwrap(), LineEnding::platform_default());
  }

  #[test]
  fn test_detect_mixed_line_endings() {
    let err = LineEnding::detect("a\r\nb\nc").unwrap_err();
    assert!(matches!(err, RewriteError::MixedLineEndings));
  }

  #[test]
  fn test_lone_carriage_return_is_not_a_line_ending() {
    assert_eq!(LineEnding::detect("a\rb\n").unwrap(), LineEnding::Lf);
  }

  #[test]
  fn test_split_shebang() {
    let (prefix, rest) = split_preserved_prefix("#!/bin/bash\necho hello", LineEnding::Lf);
    assert_eq!(prefix, "#!/bin/bash\n");
    assert_eq!(rest, "echo hello");
  }

  #[test]
  fn test_split_keeps_crlf_terminator() {
    let (prefix, rest) = split_preserved_prefix("#!/usr/bin/env python3\r\n\r\nprint(1)\r\n", LineEnding::CrLf);
    assert_eq!(prefix, "#!/usr/bin/env python3\r\n");
    assert_eq!(rest, "\r\nprint(1)\r\n");
  }

  #[test]
  fn test_split_xml_and_doctype_case_insensitive() {
    let (prefix, rest) = split_preserved_prefix("<?xml version=\"1.0\"?>\n<root/>", LineEnding::Lf);
    assert_eq!(prefix, "<?xml version=\"1.0\"?>\n");
    assert_eq!(rest, "<root/>");

    let (prefix, rest) = split_preserved_prefix("<!DOCTYPE html>\n<html></html>", LineEnding::Lf);
    assert_eq!(prefix, "<!DOCTYPE html>\n");
    assert_eq!(rest, "<html></html>");
  }

  #[test]
  fn test_split_directives() {
    for line in [
      "<?php",
      "# encoding: utf-8",
      "# -*- coding: utf-8 -*-",
      "# frozen_string_literal: true",
      "# syntax=docker/dockerfile:1",
      "# escape=`",
    ] {
      let content = format!("{line}\nbody");
      let (prefix, rest) = split_preserved_prefix(&content, LineEnding::Lf);
      assert_eq!(prefix, format!("{line}\n"), "prefix for {line:?}");
      assert_eq!(rest, "body");
    }
  }

  #[test]
  fn test_split_unterminated_prefix_line() {
    let (prefix, rest) = split_preserved_prefix("#!/bin/sh", LineEnding::CrLf);
    assert_eq!(prefix, "#!/bin/sh\r\n");
    assert_eq!(rest, "");
  }

  #[test]
  fn test_rust_inner_attribute_is_not_preserved() {
    let content = "#![allow(dead_code)]\nfn main() {}";
    let (prefix, rest) = split_preserved_prefix(content, LineEnding::Lf);
    assert_eq!(prefix, "");
    assert_eq!(rest, content);
  }

  #[test]
  fn test_split_shebang_followed_by_directives() {
    let content = "#!/usr/bin/env ruby\n# frozen_string_literal: true\n\nclass A; end\n";
    let (prefix, rest) = split_preserved_prefix(content, LineEnding::Lf);
    assert_eq!(prefix, "#!/usr/bin/env ruby\n# frozen_string_literal: true\n");
    assert_eq!(rest, "\nclass A; end\n");

    let content = "#!/usr/bin/env python\r\n# -*- coding: latin-1 -*-\r\nimport os\r\n";
    let (prefix, rest) = split_preserved_prefix(content, LineEnding::CrLf);
    assert_eq!(prefix, "#!/usr/bin/env python\r\n# -*- coding: latin-1 -*-\r\n");
    assert_eq!(rest, "import os\r\n");
  }

  #[test]
  fn test_shebang_only_counts_on_first_line() {
    let content = "# encoding: utf-8\n#!/bin/sh\nx\n";
    let (prefix, rest) = split_preserved_prefix(content, LineEnding::Lf);
    assert_eq!(prefix, "# encoding: utf-8\n");
    assert_eq!(rest, "#!/bin/sh\nx\n");
  }

  #[test]
  fn test_split_byte_order_mark() {
    let (prefix, rest) = split_preserved_prefix("\u{feff}<?xml version=\"1.0\"?>\n<root/>\n", LineEnding::Lf);
    assert_eq!(prefix, "\u{feff}<?xml version=\"1.0\"?>\n");
    assert_eq!(rest, "<root/>\n");

    let (prefix, rest) = split_preserved_prefix("\u{feff}fn main() {}\n", LineEnding::Lf);
    assert_eq!(prefix, "\u{feff}");
    assert_eq!(rest, "fn main() {}\n");
  }

  #[test]
  fn test_plain_comment_is_not_preserved() {
    let content = "# just a comment\nx = 1";
    let (prefix, rest) = split_preserved_prefix(content, LineEnding::Lf);
    assert_eq!(prefix, "");
    assert_eq!(rest, content);
  }
}

//! # Header Matcher
//!
//! Decides whether a file starts with the expected header and computes the
//! exact rewrite that would make it do so. Check and apply both go through
//! [`HeaderMatcher::plan`], so a file is reported MATCHED exactly when
//! applying would leave it untouched.
//!
//! Only the leading region of a file is inspected. A header further down the
//! file does not count.

use tracing::trace;

use crate::processor::content_transformer::{LineEnding, split_preserved_prefix};
use crate::report::HeaderStatus;
use crate::templates::CommentStyle;

/// Errors that prevent computing a rewrite for one file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
  #[error("multiple line endings detected")]
  MixedLineEndings,

  #[error("header text contains the closing comment marker '{marker}'")]
  HeaderContainsClosingMarker { marker: String },
}

/// What has to happen to a file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteKind {
  /// The file already starts with the expected header.
  Unchanged,
  /// An existing leading header is replaced.
  Replace { existing_header: String, content: String },
  /// The header is inserted at the top.
  Insert { content: String },
}

/// The outcome of matching one file against the expected header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
  /// The header comment as it should appear in this file.
  pub expected_header: String,
  pub kind: RewriteKind,
}

impl Rewrite {
  /// The status this rewrite corresponds to.
  pub const fn status(&self) -> HeaderStatus {
    match self.kind {
      RewriteKind::Unchanged => HeaderStatus::Matched,
      RewriteKind::Replace { .. } => HeaderStatus::Stale,
      RewriteKind::Insert { .. } => HeaderStatus::Missing,
    }
  }

  /// The full new file content, or `None` when nothing changes.
  pub fn new_content(&self) -> Option<&str> {
    match &self.kind {
      RewriteKind::Unchanged => None,
      RewriteKind::Replace { content, .. } | RewriteKind::Insert { content } => Some(content),
    }
  }

  /// The header block currently at the top of the file, if there is one.
  pub fn existing_header(&self) -> Option<&str> {
    match &self.kind {
      RewriteKind::Unchanged => Some(&self.expected_header),
      RewriteKind::Replace { existing_header, .. } => Some(existing_header),
      RewriteKind::Insert { .. } => None,
    }
  }
}

/// Matches file contents against a rendered header.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
  /// Rendered header text with `\n` line breaks and no comment markers
  header_text: String,
}

impl HeaderMatcher {
  pub fn new(header_text: impl Into<String>) -> Self {
    Self {
      header_text: header_text.into(),
    }
  }

  pub fn header_text(&self) -> &str {
    &self.header_text
  }

  /// Computes the rewrite for `content` in the given comment style.
  ///
  /// The header is wrapped in `style` using the file's own line ending.
  /// Preserved leading lines (byte order mark, shebang, encoding directives,
  /// XML declaration, ...) stay first, and whitespace before the header is
  /// tolerated.
  ///
  /// # Errors
  ///
  /// Returns a [`RewriteError`] if the content mixes LF and CRLF line
  /// endings, or if a block style's closing marker appears in the header.
  pub fn plan(&self, content: &str, style: &CommentStyle) -> Result<Rewrite, RewriteError> {
    let line_ending = LineEnding::detect(content)?;
    let eol = line_ending.as_str();
    let header = style.format(&self.header_text, eol)?;

    let (prefix, body) = split_preserved_prefix(content, line_ending);
    let rest = body.trim_start();
    let leading_ws = &body[..body.len() - rest.len()];

    let kind = if rest.is_empty() {
      trace!("Empty body, inserting header");
      RewriteKind::Insert {
        content: format!("{prefix}{header}{eol}{body}"),
      }
    } else if starts_with_header(rest, &header, style, eol) {
      RewriteKind::Unchanged
    } else if style.is_block() && rest.starts_with(style.opening_marker()) {
      plan_block(&prefix, leading_ws, rest, &header, style, eol)
    } else if !style.is_block() && rest.starts_with(style.line_marker()) && !is_line_doc_comment(rest, style) {
      plan_line_run(&prefix, leading_ws, rest, &header, style.line_marker(), eol)
    } else {
      let separator = if leading_ws.contains('\n') {
        eol.to_string()
      } else {
        format!("{eol}{eol}")
      };
      RewriteKind::Insert {
        content: format!("{prefix}{header}{separator}{body}"),
      }
    };

    Ok(Rewrite {
      expected_header: header,
      kind,
    })
  }
}

fn starts_with_header(rest: &str, header: &str, style: &CommentStyle, eol: &str) -> bool {
  match rest.strip_prefix(header) {
    Some(_) if style.is_block() => true,
    Some(after) => after.is_empty() || after.starts_with(eol),
    None => false,
  }
}

/// A line comment whose marker is doubled or followed by `!`, like `///`
/// and `//!`.
fn is_line_doc_comment(rest: &str, style: &CommentStyle) -> bool {
  let marker = style.line_marker();
  let after = &rest[marker.len()..];
  match marker.chars().last() {
    Some(last) => after.starts_with(last) || after.starts_with('!'),
    None => false,
  }
}

fn plan_block(prefix: &str, leading_ws: &str, rest: &str, header: &str, style: &CommentStyle, eol: &str) -> RewriteKind {
  let open = style.opening_marker();
  let close = style.closing_marker();
  let after_open = &rest[open.len()..];

  let is_doc_comment = open.ends_with('*') && after_open.starts_with('*') && !after_open.starts_with(close);

  if !is_doc_comment {
    if let Some(idx) = after_open.find(close) {
      let end = open.len() + idx + close.len();
      trace!("Found leading block comment of {} bytes", end);
      return RewriteKind::Replace {
        existing_header: rest[..end].to_string(),
        content: format!("{prefix}{leading_ws}{header}{}", &rest[end..]),
      };
    }
  }

  RewriteKind::Insert {
    content: format!("{prefix}{leading_ws}{header}{eol}{eol}{rest}"),
  }
}

fn plan_line_run(prefix: &str, leading_ws: &str, rest: &str, header: &str, marker: &str, eol: &str) -> RewriteKind {
  let mut end = 0;
  for line in rest.split_inclusive('\n') {
    if !line.starts_with(marker) {
      break;
    }
    end += line.len();
  }

  let run = &rest[..end];
  let existing = run.strip_suffix(eol).unwrap_or(run);
  trace!("Found {} bytes of leading line comments", existing.len());

  RewriteKind::Replace {
    existing_header: existing.to_string(),
    content: format!("{prefix}{leading_ws}{header}{}", &rest[existing.len()..]),
  }
}

//! Comment annotations embedded in filter labels
//!
//! A label such as `Year /* inverseOrder, ignoreNow */` carries extra
//! parameters for the filter. Two comment forms are recognised:
//!
//! ```text
//! /* a, b */     block comment, may span lines
//! // a, b        line comment, runs to the end of the line
//! ```
//!
//! Only the first comment contributes directives, but every comment is
//! removed from the label.

use std::ops::Range;

/// Kind of comment found in a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Block,
    Line,
}

/// A comment token with its byte span in the label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment<'a> {
    pub kind: CommentKind,
    pub span: Range<usize>,
    /// Text between the comment delimiters
    pub body: &'a str,
}

/// Known filter directives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Reverse the order of the candidate values
    InverseOrder,
    /// Drop the "now" member from the candidate values
    IgnoreNow,
    Unknown(String),
}

impl From<&str> for Directive {
    fn from(s: &str) -> Self {
        match s {
            "inverseorder" => Directive::InverseOrder,
            "ignorenow" => Directive::IgnoreNow,
            other => Directive::Unknown(other.to_string()),
        }
    }
}

/// Result of scanning a label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Lower-cased directive words of the first comment
    pub params: Vec<String>,
    /// Label with every comment removed
    pub label: String,
}

impl Annotation {
    pub fn directives(&self) -> impl Iterator<Item = Directive> + '_ {
        self.params.iter().map(|p| Directive::from(p.as_str()))
    }

    pub fn has(&self, directive: &Directive) -> bool {
        self.directives().any(|d| &d == directive)
    }
}

/// Split a label into its comment tokens.
///
/// An unterminated `/*` is plain text.
pub fn lex_comments(label: &str) -> Vec<Comment<'_>> {
    let bytes = label.as_bytes();
    let mut comments = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'/' {
            i += 1;
            continue;
        }

        match bytes[i + 1] {
            b'*' => {
                if let Some(rel) = label[i + 2..].find("*/") {
                    let end = i + 2 + rel + 2;
                    comments.push(Comment {
                        kind: CommentKind::Block,
                        span: i..end,
                        body: &label[i + 2..end - 2],
                    });
                    i = end;
                } else {
                    i += 1;
                }
            }
            b'/' => {
                let end = label[i..]
                    .find(['\n', '\r'])
                    .map(|rel| i + rel)
                    .unwrap_or(label.len());
                comments.push(Comment {
                    kind: CommentKind::Line,
                    span: i..end,
                    body: &label[i + 2..end],
                });
                i = end;
            }
            _ => i += 1,
        }
    }

    comments
}

/// Parse the directives of a label and strip its comments.
pub fn parse_label(label: &str) -> Annotation {
    let comments = lex_comments(label);

    let params = comments
        .first()
        .map(|c| {
            c.body
                .to_lowercase()
                .trim()
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut stripped = String::with_capacity(label.len());
    let mut last = 0;
    for comment in &comments {
        stripped.push_str(&label[last..comment.span.start]);
        last = comment.span.end;
    }
    stripped.push_str(&label[last..]);

    Annotation {
        params,
        label: stripped.trim().to_string(),
    }
}

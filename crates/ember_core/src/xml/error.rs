//! Errors produced while loading and parsing markup files.

use thiserror::Error;

/// Errors that can occur while loading or parsing a markup document.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed markup in {path} at line {line}, column {column}: {kind}")]
    Malformed {
        path: String,
        /// Byte offset into the document
        offset: usize,
        /// 1-based line of `offset`
        line: usize,
        /// 1-based column (in characters) of `offset`
        column: usize,
        kind: MalformedKind,
    },
}

impl XmlError {
    /// Build a structural error, locating `offset` within `text`.
    pub(crate) fn malformed(path: &str, text: &str, offset: usize, kind: MalformedKind) -> Self {
        let (line, column) = line_column(text, offset);
        XmlError::Malformed {
            path: path.to_string(),
            offset,
            line,
            column,
            kind,
        }
    }

    /// The structural failure, if this is not an IO error.
    pub fn kind(&self) -> Option<&MalformedKind> {
        match self {
            XmlError::Malformed { kind, .. } => Some(kind),
            XmlError::Io { .. } => None,
        }
    }

    /// Byte offset of a structural failure.
    pub fn offset(&self) -> Option<usize> {
        match self {
            XmlError::Malformed { offset, .. } => Some(*offset),
            XmlError::Io { .. } => None,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, XmlError::Io { .. })
    }
}

/// What structural expectation a document violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    #[error("no '>' closing the tag before end of input")]
    BracketNotFound,

    #[error("unexpected '<' inside a tag")]
    UnexpectedOpenBracket,

    #[error("tag has no name")]
    MissingName,

    #[error("invalid tag name '{name}'")]
    InvalidName { name: String },

    #[error("invalid attribute: {detail}")]
    InvalidAttribute { detail: String },

    #[error("duplicate attribute '{key}'")]
    DuplicateAttribute { key: String },

    #[error("trailer </{name}> not found before end of input")]
    TrailerNotFound { name: String },

    #[error("trailer </{found}> does not match open node <{expected}>")]
    TrailerMismatch { expected: String, found: String },

    #[error("trailer </{name}> has no open node")]
    UnexpectedTrailer { name: String },

    #[error("node <{name}> mixes text with child nodes")]
    MixedContent { name: String },

    #[error("nesting deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("unexpected text outside the root node")]
    ContentOutsideRoot,

    #[error("document contains no nodes")]
    EmptyDocument,
}

/// Result type for markup operations.
pub type ParseResult<T> = Result<T, XmlError>;

fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let before = &text[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

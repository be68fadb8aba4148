//! Front-end errors.

use std::ops::Range;

use thiserror::Error;

/// Byte range into the parsed source.
pub type Span = Range<usize>;

/// What went wrong while reading the source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character `{0}`")]
    InvalidCharacter(String),

    #[error("invalid integer literal `{0}`")]
    InvalidLiteral(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("bit-field `{field}` is not supported")]
    BitField { field: String },

    #[error("array extent is not a constant expression: {0}")]
    InvalidExtent(String),

    #[error("cannot evaluate `sizeof({0})`")]
    UnknownSizeof(String),

    #[error("unsupported declarator: {0}")]
    UnsupportedDeclarator(String),
}

/// A front-end error with the source location it applies to.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    /// Optional hint shown under the report.
    pub help: Option<String>,
}

impl ParseError {
    #[cold]
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError {
            kind,
            span,
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

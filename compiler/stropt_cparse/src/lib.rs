//! C front-end for stropt.
//!
//! Reads C source text and collects every struct, union and enum
//! definition into an [`AggregateIndex`], along with the typedef names
//! that refer to them.
//!
//! # Pipeline
//!
//! ```text
//! source ──► lex() ──► tokens (object-like macros expanded)
//!                          │
//!                          ▼
//!                       Parser ──► AggregateIndex
//! ```
//!
//! The front-end understands declarations, not C as a whole: function
//! bodies, initializers and prototypes are skipped by bracket matching,
//! and only `#define`/`#undef` are honored among the preprocessor
//! directives. Bit-fields are rejected with an error.

mod cursor;
mod error;
mod lexer;
mod parser;

use stropt_layout::{AggregateIndex, TypeCatalog};

pub use error::{ParseError, ParseErrorKind, Span};
pub use lexer::{lex, Token, TokenKind};

use parser::Parser;

/// Parse `source` with the default 64-bit catalog for `sizeof`.
pub fn parse_source(source: &str) -> Result<AggregateIndex, ParseError> {
    parse_source_with(source, &TypeCatalog::new())
}

/// Parse `source`, evaluating `sizeof` in array extents against `catalog`.
///
/// The index contains every aggregate defined in the source, anonymous
/// ones included. Anonymous aggregates without a typedef are reachable as
/// `(anonymous struct@N)`, where `N` is the byte offset of their keyword.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn parse_source_with(source: &str, catalog: &TypeCatalog) -> Result<AggregateIndex, ParseError> {
    let tokens = lex(source)?;
    tracing::trace!(tokens = tokens.len(), "lexed");

    let index = Parser::new(tokens, catalog).parse()?;
    tracing::debug!(aggregates = index.len(), "parsed");
    Ok(index)
}

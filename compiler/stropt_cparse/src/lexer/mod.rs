//! Tokenizer.
//!
//! `RawToken` is the logos-derived tokenizer output. It is converted into
//! owned [`Token`]s carrying identifier text and literal values, with
//! preprocessor directives consumed on the way (see [`preprocess`]).

mod preprocess;

use std::fmt;

use logos::Logos;

use crate::{ParseError, ParseErrorKind, Span};

use preprocess::Macros;

/// Raw token from logos (before conversion).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\x0C]+")] // Skip whitespace
#[logos(skip r"\\\r?\n")] // Line continuations outside directives
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum RawToken {
    /// A whole preprocessor line, continuations included.
    #[regex(r"#([^\n\\]|\\[^\n]|\\\r?\n)*")]
    Directive,

    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,
    #[token("typedef")]
    Typedef,
    #[token("sizeof")]
    Sizeof,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F]+[uUlL]*")]
    #[regex(r"[0-9]+[uUlL]*")]
    Int,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?")]
    Float,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("...")]
    Ellipsis,

    /// Operators that only ever appear in skipped code.
    #[regex(r"->|\+\+|--|<<=|>>=|[<>!=]=|&&|\|\||[-+*/%&|^]=|[.&|^~!?<>]")]
    Punct,
}

/// Token kind with its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Struct,
    Union,
    Enum,
    Typedef,
    Sizeof,
    Ident(String),
    Int(u64),
    Float,
    Str,
    Char,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Star,
    Colon,
    Eq,
    Plus,
    Minus,
    Slash,
    Percent,
    Shl,
    Shr,
    Ellipsis,
    Punct,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            TokenKind::Ident(name) => return write!(f, "identifier `{name}`"),
            TokenKind::Int(value) => return write!(f, "integer `{value}`"),
            TokenKind::Eof => return f.write_str("end of input"),
            TokenKind::Float => return f.write_str("floating-point literal"),
            TokenKind::Str => return f.write_str("string literal"),
            TokenKind::Char => return f.write_str("character literal"),
            TokenKind::Punct => return f.write_str("operator"),
            TokenKind::Struct => "struct",
            TokenKind::Union => "union",
            TokenKind::Enum => "enum",
            TokenKind::Typedef => "typedef",
            TokenKind::Sizeof => "sizeof",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Star => "*",
            TokenKind::Colon => ":",
            TokenKind::Eq => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Ellipsis => "...",
        };
        write!(f, "`{symbol}`")
    }
}

/// A token and the source range it was read from.
///
/// Tokens produced by macro expansion carry the span of the macro use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Tokenize `source`, applying object-like `#define`s.
///
/// The returned list always ends with a [`TokenKind::Eof`] token.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut macros = Macros::default();
    let mut tokens = Vec::new();

    let mut lexer = RawToken::lexer(source);
    while let Some(raw) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let raw = raw.map_err(|()| invalid_character(slice, span.clone()))?;

        if raw == RawToken::Directive {
            macros.directive(slice, span)?;
            continue;
        }
        let token = Token {
            kind: convert(raw, slice, &span)?,
            span,
        };
        macros.expand(token, &mut tokens);
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: source.len()..source.len(),
    });
    Ok(tokens)
}

/// Tokenize a fragment without directive handling (macro bodies).
///
/// Spans are shifted by `offset` so they point into the full source.
fn tokenize_fragment(text: &str, offset: usize) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(text);
    while let Some(raw) = lexer.next() {
        let local = lexer.span();
        let span = local.start + offset..local.end + offset;
        let slice = lexer.slice();
        let kind = match raw.map_err(|()| invalid_character(slice, span.clone()))? {
            // Stringizing and pasting inside a body.
            RawToken::Directive => TokenKind::Punct,
            raw => convert(raw, slice, &span)?,
        };
        tokens.push(Token { kind, span });
    }
    Ok(tokens)
}

#[cold]
fn invalid_character(slice: &str, span: Span) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidCharacter(slice.to_owned()), span)
}

fn convert(raw: RawToken, slice: &str, span: &Span) -> Result<TokenKind, ParseError> {
    Ok(match raw {
        RawToken::Struct => TokenKind::Struct,
        RawToken::Union => TokenKind::Union,
        RawToken::Enum => TokenKind::Enum,
        RawToken::Typedef => TokenKind::Typedef,
        RawToken::Sizeof => TokenKind::Sizeof,
        RawToken::Ident => TokenKind::Ident(slice.to_owned()),
        RawToken::Int => TokenKind::Int(parse_int(slice, span)?),
        RawToken::Float => TokenKind::Float,
        RawToken::Str => TokenKind::Str,
        RawToken::Char => TokenKind::Char,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Star => TokenKind::Star,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Shl => TokenKind::Shl,
        RawToken::Shr => TokenKind::Shr,
        RawToken::Ellipsis => TokenKind::Ellipsis,
        RawToken::Directive | RawToken::Punct => TokenKind::Punct,
    })
}

/// Parse a C integer literal: decimal, `0x` hex or leading-zero octal,
/// with any `u`/`l` suffix.
fn parse_int(slice: &str, span: &Span) -> Result<u64, ParseError> {
    let digits = slice.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));

    let parsed = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse()
    };

    parsed.map_err(|_| ParseError::new(ParseErrorKind::InvalidLiteral(slice.to_owned()), span.clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

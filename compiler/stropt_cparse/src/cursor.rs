//! Token cursor for navigating the token stream.

use std::mem::discriminant;

use crate::{ParseError, ParseErrorKind, Span, Token, TokenKind};

/// Cursor over a lexed token list.
///
/// The list always ends with [`TokenKind::Eof`] and the cursor never moves
/// past it, so `current()` is always valid.
pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token list must end with EOF"
        );
        Cursor { tokens, pos: 0 }
    }

    #[inline]
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    #[inline]
    pub(crate) fn span(&self) -> Span {
        self.current().span.clone()
    }

    /// Kind of the token after the current one.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        let next = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[next].kind
    }

    /// Span of the last consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span.clone(),
            None => 0..0,
        }
    }

    pub(crate) fn previous_kind(&self) -> Option<&TokenKind> {
        self.pos.checked_sub(1).map(|prev| &self.tokens[prev].kind)
    }

    #[inline]
    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Whether the current token has the same kind as `kind`, ignoring
    /// payloads.
    #[inline]
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        discriminant(self.kind()) == discriminant(kind)
    }

    /// The current identifier, if the current token is one.
    #[inline]
    pub(crate) fn ident(&self) -> Option<&str> {
        match self.kind() {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the current token is the identifier `word`.
    pub(crate) fn check_word(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }

    /// Advance and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches `kind`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` or fail describing what was `expected`.
    pub(crate) fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<Span, ParseError> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Consume an identifier and return its text and span.
    pub(crate) fn expect_ident(&mut self, expected: &'static str) -> Result<(String, Span), ParseError> {
        match self.advance_if_ident() {
            Some(found) => Ok(found),
            None => Err(self.unexpected(expected)),
        }
    }

    fn advance_if_ident(&mut self) -> Option<(String, Span)> {
        let name = self.ident()?.to_owned();
        let span = self.advance().span;
        Some((name, span))
    }

    /// Error for the current token not being what was `expected`.
    #[cold]
    #[inline(never)]
    pub(crate) fn unexpected(&self, expected: &'static str) -> ParseError {
        let kind = match self.kind() {
            TokenKind::Eof => ParseErrorKind::UnexpectedEof { expected },
            found => ParseErrorKind::UnexpectedToken {
                expected,
                found: found.to_string(),
            },
        };
        ParseError::new(kind, self.span())
    }

    /// Skip a bracketed group starting at the current opener, nested groups
    /// included.
    pub(crate) fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let open = self.span();
        let mut closers = Vec::new();

        loop {
            let closer = match self.kind() {
                TokenKind::LBrace => Some(TokenKind::RBrace),
                TokenKind::LParen => Some(TokenKind::RParen),
                TokenKind::LBracket => Some(TokenKind::RBracket),
                _ => None,
            };

            if let Some(closer) = closer {
                closers.push(closer);
            } else if self.is_at_end() {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEof {
                        expected: "a closing delimiter",
                    },
                    self.span(),
                )
                .with_help(format!("the group opened at byte {} is never closed", open.start)));
            } else if closers.last() == Some(self.kind()) {
                closers.pop();
                if closers.is_empty() {
                    self.advance();
                    return Ok(());
                }
            } else if matches!(self.kind(), TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket) {
                return Err(self.unexpected("a matching closing delimiter"));
            }
            self.advance();
        }
    }

    /// Skip tokens up to (not including) the first of `stops` found outside
    /// any bracketed group.
    pub(crate) fn skip_until(&mut self, stops: &[TokenKind], expected: &'static str) -> Result<(), ParseError> {
        loop {
            if stops.iter().any(|stop| self.check(stop)) {
                return Ok(());
            }
            match self.kind() {
                TokenKind::Eof => return Err(self.unexpected(expected)),
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => self.skip_balanced()?,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    return Err(self.unexpected(expected));
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lex;

    fn cursor(source: &str) -> Cursor {
        Cursor::new(lex(source).unwrap())
    }

    #[test]
    fn never_moves_past_eof() {
        let mut cursor = cursor("x");
        cursor.advance();
        cursor.advance();
        cursor.advance();

        assert!(cursor.is_at_end());
        assert_eq!(cursor.previous_span(), 0..1);
    }

    #[test]
    fn expect_reports_the_found_token() {
        let mut cursor = cursor("struct }");
        cursor.advance();
        let err = cursor.expect(&TokenKind::LBrace, "`{`").unwrap_err();

        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: "`{`",
                found: "`}`".to_owned(),
            }
        );
        assert_eq!(err.span, 7..8);
    }

    #[test]
    fn skip_balanced_handles_nesting() {
        let mut cursor = cursor("{ a ( b [ c ] ) { } } tail");
        cursor.skip_balanced().unwrap();

        assert_eq!(cursor.ident(), Some("tail"));
    }

    #[test]
    fn skip_balanced_rejects_mismatched_closers() {
        let mut cursor = cursor("( a ] )");
        assert!(cursor.skip_balanced().is_err());
    }

    #[test]
    fn skip_until_stops_outside_groups() {
        let mut cursor = cursor("(1, 2) + f(3, 4), next");
        cursor.skip_until(&[TokenKind::Comma], "`,`").unwrap();
        cursor.advance();

        assert_eq!(cursor.ident(), Some("next"));
    }

    #[test]
    fn unterminated_group() {
        let mut cursor = cursor("{ a ;");
        let err = cursor.skip_balanced().unwrap_err();

        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof { .. }));
        assert!(err.help.is_some());
    }
}

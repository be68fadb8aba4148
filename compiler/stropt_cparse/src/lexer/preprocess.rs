//! Minimal preprocessing: object-like macros.
//!
//! `#define NAME body` records `body` and later uses of `NAME` are replaced
//! by it, recursively. `#undef NAME` forgets it. Conditionals, includes and
//! function-like macros are not evaluated; those lines are dropped.

use rustc_hash::FxHashMap;

use super::{tokenize_fragment, Token, TokenKind};
use crate::{ParseError, Span};

#[derive(Default)]
pub(super) struct Macros {
    table: FxHashMap<String, Vec<Token>>,
}

impl Macros {
    /// Interpret one directive line (starting with `#`).
    pub(super) fn directive(&mut self, text: &str, span: Span) -> Result<(), ParseError> {
        let body = text[1..].trim_start_matches(|c: char| c == ' ' || c == '\t');

        if let Some(rest) = keyword(body, "define") {
            let name_len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let (name, replacement) = rest.split_at(name_len);

            if name.is_empty() {
                tracing::debug!(directive = text, "malformed #define skipped");
                return Ok(());
            }
            if replacement.starts_with('(') {
                tracing::debug!(name, "function-like macro skipped");
                return Ok(());
            }

            let offset = span.end - replacement.len();
            let tokens = tokenize_fragment(replacement, offset)?;
            tracing::trace!(name, tokens = tokens.len(), "macro defined");
            self.table.insert(name.to_owned(), tokens);
        } else if let Some(rest) = keyword(body, "undef") {
            self.table.remove(rest.trim());
        } else {
            tracing::debug!(directive = text.trim_end(), "preprocessor line skipped");
        }
        Ok(())
    }

    /// Push `token` onto `out`, replacing defined macro names by their body.
    pub(super) fn expand(&self, token: Token, out: &mut Vec<Token>) {
        let mut active = Vec::new();
        self.expand_guarded(token, &mut active, out);
    }

    fn expand_guarded<'m>(&'m self, token: Token, active: &mut Vec<&'m str>, out: &mut Vec<Token>) {
        let definition = match &token.kind {
            TokenKind::Ident(name) => self.table.get_key_value(name.as_str()),
            _ => None,
        };
        // A macro never expands inside its own expansion.
        let Some((name, body)) = definition.filter(|(name, _)| !active.contains(&name.as_str())) else {
            out.push(token);
            return;
        };

        active.push(name.as_str());
        for replacement in body {
            let replacement = Token {
                kind: replacement.kind.clone(),
                span: token.span.clone(),
            };
            self.expand_guarded(replacement, active, out);
        }
        active.pop();
    }
}

/// Strip a directive keyword and the whitespace that must follow it.
fn keyword<'t>(body: &'t str, word: &str) -> Option<&'t str> {
    let rest = body.strip_prefix(word)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '\\' => {
            Some(rest.trim_start_matches(|c: char| c.is_whitespace() || c == '\\'))
        }
        Some(_) => None,
    }
}

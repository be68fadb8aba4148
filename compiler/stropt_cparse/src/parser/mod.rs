//! Recursive-descent parser for aggregate declarations.
//!
//! Only what matters for layout is kept: struct, union and enum
//! definitions, and typedefs. Everything else at file scope (variables,
//! prototypes, function bodies) is skipped by balanced-bracket scanning.
//!
//! # Typedefs
//!
//! - A typedef naming an aggregate (`typedef struct s s_t;`, or a typedef
//!   wrapping a definition) becomes an alias in the [`AggregateIndex`], so
//!   the optimizer's reorder is visible through it.
//! - Any other typedef (scalars, pointers, arrays, function pointers) is
//!   remembered and expanded in place wherever it is used as a field type.

mod declarator;
mod expr;

use rustc_hash::FxHashMap;
use stropt_layout::{ensure_sufficient_stack, Aggregate, AggregateIndex, AggregateKind, Field, TypeCatalog};

use crate::cursor::Cursor;
use crate::{ParseError, ParseErrorKind, Token, TokenKind};

use declarator::{into_field, Declarator, Shape, Specifiers, TypeAlias};

pub(crate) struct Parser<'c> {
    cursor: Cursor,
    /// Sizes used by `sizeof` in array extents.
    catalog: &'c TypeCatalog,
    index: AggregateIndex,
    /// Non-aggregate typedefs, expanded at use.
    typedefs: FxHashMap<String, TypeAlias>,
    /// Aggregate typedefs whose target was not defined yet: (alias, target).
    pending_aliases: Vec<(String, String)>,
}

/// A struct, union or enum specifier, before it is indexed.
struct AggregateSpec {
    kind: AggregateKind,
    tag: Option<String>,
    /// `None` for a reference without a body (`struct s`).
    fields: Option<Vec<Field>>,
    /// Byte offset of the keyword, used to name anonymous aggregates.
    offset: usize,
}

impl AggregateSpec {
    fn reference(&self) -> Option<String> {
        self.tag
            .as_ref()
            .map(|tag| format!("{} {tag}", self.kind.keyword()))
    }
}

impl<'c> Parser<'c> {
    pub(crate) fn new(tokens: Vec<Token>, catalog: &'c TypeCatalog) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            catalog,
            index: AggregateIndex::new(),
            typedefs: FxHashMap::default(),
            pending_aliases: Vec::new(),
        }
    }

    /// Parse the whole translation unit.
    pub(crate) fn parse(mut self) -> Result<AggregateIndex, ParseError> {
        while !self.cursor.is_at_end() {
            self.external_declaration()?;
        }
        Ok(self.finish())
    }

    fn finish(mut self) -> AggregateIndex {
        for (alias, target) in std::mem::take(&mut self.pending_aliases) {
            match self.index.resolve_name(&target) {
                Some(id) => self.index.add_alias(alias, id),
                None => tracing::debug!(%alias, %target, "typedef of an undefined aggregate"),
            }
        }
        self.index
    }

    fn external_declaration(&mut self) -> Result<(), ParseError> {
        // `extern "C" {` and its closing brace, left over from C++ guards
        // whose `#ifdef` was not evaluated.
        if self.cursor.check_word("extern") && matches!(self.cursor.peek_kind(), TokenKind::Str) {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.eat(&TokenKind::LBrace);
            return Ok(());
        }

        match self.cursor.kind() {
            TokenKind::Semicolon | TokenKind::RBrace => {
                self.cursor.advance();
                Ok(())
            }
            TokenKind::Typedef => self.typedef_declaration(),
            TokenKind::Struct | TokenKind::Union | TokenKind::Enum | TokenKind::Ident(_) => {
                let specifiers = self.specifiers("a declaration")?;
                self.index_inline(specifiers);
                self.skip_declaration()
            }
            _ => self.skip_declaration(),
        }
    }

    /// Skip the rest of a file-scope declaration or function definition.
    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        loop {
            match self.cursor.kind() {
                TokenKind::Semicolon => {
                    self.cursor.advance();
                    return Ok(());
                }
                TokenKind::LBrace => {
                    let function_body = matches!(self.cursor.previous_kind(), Some(TokenKind::RParen));
                    self.cursor.skip_balanced()?;
                    if function_body {
                        return Ok(());
                    }
                }
                TokenKind::LParen | TokenKind::LBracket => self.cursor.skip_balanced()?,
                TokenKind::Eof | TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    return Err(self.cursor.unexpected("`;`"));
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn typedef_declaration(&mut self) -> Result<(), ParseError> {
        self.cursor.advance();
        let Specifiers { mut words, mut defined } = self.specifiers("a type after `typedef`")?;

        loop {
            let declarator = self.declarator()?;

            // An aggregate defined in this typedef is named by the first
            // declarator when that declarator is a plain name.
            let names_definition = match defined.take() {
                Some((position, spec)) => {
                    let plain = declarator.shape == Shape::Value;
                    let typedef = plain.then(|| declarator.name.clone());
                    words[position] = self.index_aggregate(spec, typedef);
                    plain
                }
                None => false,
            };
            if !names_definition {
                self.register_typedef(&words, declarator)?;
            }

            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.cursor.expect(&TokenKind::Semicolon, "`;` after typedef")?;
        Ok(())
    }

    fn register_typedef(&mut self, words: &[String], declarator: Declarator) -> Result<(), ParseError> {
        let Declarator { name, span, shape } = declarator;

        if shape == Shape::Value {
            if let Some(target) = self.aggregate_target(words) {
                self.typedefs.remove(&name);
                match self.index.resolve_name(&target) {
                    Some(id) => self.index.add_alias(name, id),
                    None => self.pending_aliases.push((name, target)),
                }
                return Ok(());
            }
        }

        let (words, shape) = self.expand_typedef(words, shape, &span)?;
        tracing::trace!(%name, ?words, ?shape, "type alias");
        self.typedefs.insert(name, TypeAlias { words, shape });
        Ok(())
    }

    /// The aggregate a specifier list names, if it names one.
    fn aggregate_target(&self, words: &[String]) -> Option<String> {
        let word = declarator::type_word(words)?;
        let tagged = ["struct ", "union ", "enum ", "(anonymous "]
            .iter()
            .any(|prefix| word.starts_with(prefix));
        let aliased = !self.typedefs.contains_key(word)
            && (self.index.resolve_name(word).is_some()
                || self.pending_aliases.iter().any(|(alias, _)| alias == word));

        (tagged || aliased).then(|| word.to_owned())
    }

    /// Store an aggregate defined inline and return the name that refers to
    /// it. Anonymous aggregates without a typedef get a synthetic alias.
    fn index_aggregate(&mut self, spec: AggregateSpec, typedef: Option<String>) -> String {
        let AggregateSpec {
            kind,
            tag,
            fields,
            offset,
        } = spec;
        if let Some(typedef) = &typedef {
            self.typedefs.remove(typedef);
        }

        let aggregate = Aggregate::new(kind, tag, typedef, fields.unwrap_or_default());
        let reference = aggregate
            .qualified_name()
            .or_else(|| aggregate.typedef.clone());
        let id = self.index.insert(aggregate);

        reference.unwrap_or_else(|| {
            let synthetic = format!("(anonymous {kind}@{offset})");
            self.index.add_alias(synthetic.clone(), id);
            synthetic
        })
    }

    /// Index the aggregate defined inside `specifiers`, if any, and return
    /// the final specifier words.
    fn index_inline(&mut self, specifiers: Specifiers) -> Vec<String> {
        let Specifiers { mut words, defined } = specifiers;
        if let Some((position, spec)) = defined {
            words[position] = self.index_aggregate(spec, None);
        }
        words
    }

    /// `struct|union|enum [tag] [{ body }]`, keyword at the cursor.
    fn aggregate_specifier(&mut self) -> Result<AggregateSpec, ParseError> {
        let keyword = self.cursor.advance();
        let kind = match keyword.kind {
            TokenKind::Union => AggregateKind::Union,
            TokenKind::Enum => AggregateKind::Enum,
            _ => AggregateKind::Struct,
        };
        self.skip_attributes()?;

        let tag = match self.cursor.ident() {
            Some(tag) => {
                let tag = tag.to_owned();
                self.cursor.advance();
                Some(tag)
            }
            None => None,
        };

        let fields = if self.cursor.check(&TokenKind::LBrace) {
            let body = ensure_sufficient_stack(|| match kind {
                AggregateKind::Enum => self.enumerators(),
                AggregateKind::Struct | AggregateKind::Union => self.members(),
            })?;
            Some(body)
        } else {
            None
        };

        if tag.is_none() && fields.is_none() {
            return Err(self.cursor.unexpected("a tag name or `{`"));
        }
        Ok(AggregateSpec {
            kind,
            tag,
            fields,
            offset: keyword.span.start,
        })
    }

    fn members(&mut self) -> Result<Vec<Field>, ParseError> {
        self.cursor.expect(&TokenKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.cursor.eat(&TokenKind::RBrace) {
            if self.cursor.is_at_end() {
                return Err(self.cursor.unexpected("`}`"));
            }
            self.member_declaration(&mut fields)?;
        }
        Ok(fields)
    }

    fn member_declaration(&mut self, fields: &mut Vec<Field>) -> Result<(), ParseError> {
        if self.cursor.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        if self.cursor.check_word("_Static_assert") || self.cursor.check_word("static_assert") {
            self.cursor.skip_until(&[TokenKind::Semicolon], "`;`")?;
            self.cursor.advance();
            return Ok(());
        }

        let specifiers = self.specifiers("a field type")?;

        let no_declarator = self.cursor.check(&TokenKind::Semicolon) || self.cursor.check(&TokenKind::RBrace);
        if no_declarator {
            // Only an untagged definition is an anonymous member; a tagged
            // one merely declares the type.
            let anonymous = matches!(&specifiers.defined, Some((_, spec)) if spec.tag.is_none());
            let words = self.index_inline(specifiers);
            if anonymous {
                fields.push(into_field(words, Shape::Value, String::new()));
            }
            self.cursor.eat(&TokenKind::Semicolon);
            return Ok(());
        }

        let words = self.index_inline(specifiers);
        loop {
            let declarator = self.declarator()?;
            if self.cursor.check(&TokenKind::Colon) {
                return Err(ParseError::new(
                    ParseErrorKind::BitField {
                        field: declarator.name,
                    },
                    declarator.span.start..self.cursor.span().end,
                )
                .with_help("bit-field packing is compiler specific and is not modelled"));
            }
            fields.push(self.build_field(&words, declarator)?);

            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }

        // The last member may omit its `;`.
        if !self.cursor.check(&TokenKind::RBrace) {
            self.cursor.expect(&TokenKind::Semicolon, "`;` after field")?;
        }
        Ok(())
    }

    fn enumerators(&mut self) -> Result<Vec<Field>, ParseError> {
        self.cursor.expect(&TokenKind::LBrace, "`{`")?;
        let mut entries = Vec::new();

        while !self.cursor.check(&TokenKind::RBrace) {
            let (name, _) = self.cursor.expect_ident("an enumerator name")?;
            self.skip_attributes()?;
            if self.cursor.eat(&TokenKind::Eq) {
                self.cursor
                    .skip_until(&[TokenKind::Comma, TokenKind::RBrace], "`,` or `}`")?;
            }
            entries.push(Field::EnumEntry(name));

            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.cursor.expect(&TokenKind::RBrace, "`}` after enumerators")?;
        Ok(entries)
    }
}

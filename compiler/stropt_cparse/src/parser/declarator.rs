//! Specifier lists, declarators and typedef expansion.

use stropt_layout::{Array, Basic, Field, FuncPointer, Pointer};

use super::{AggregateSpec, Parser};
use crate::{ParseError, ParseErrorKind, Span, TokenKind};

/// Storage classes and type qualifiers. Kept in the spelling only.
const QUALIFIERS: &[&str] = &[
    "const", "volatile", "restrict", "_Atomic", "static", "extern", "register", "auto",
];

/// Qualifiers allowed after a `*`.
const POINTER_QUALIFIERS: &[&str] = &["const", "volatile", "restrict", "_Atomic"];

/// Arithmetic type keywords; any number of them form one type.
const ARITHMETIC: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool", "_Complex",
];

/// Specifiers dropped entirely.
const IGNORED: &[&str] = &[
    "inline",
    "__inline",
    "__inline__",
    "_Noreturn",
    "__extension__",
    "_Thread_local",
    "thread_local",
];

/// Extensions followed by an optional parenthesized argument, skipped.
const ATTRIBUTES: &[&str] = &[
    "__attribute__",
    "__attribute",
    "__declspec",
    "_Alignas",
    "alignas",
    "__asm__",
    "__asm",
    "asm",
];

/// How a declarator shapes its base type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Shape {
    Value,
    Pointer { depth: u32, qualifiers: Vec<String> },
    /// Multi-dimensional arrays are flattened into one element count.
    Array { elements: u64, element: Element },
    FuncPointer { return_stars: u32, args: Vec<String> },
    /// A function type; only valid as a typedef target.
    Function { return_stars: u32, args: Vec<String> },
}

/// Element of an array shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Element {
    Value,
    Pointer(u32),
    FuncPointer { return_stars: u32, args: Vec<String> },
}

/// A non-aggregate typedef: its specifier words and its shape.
pub(super) struct TypeAlias {
    pub(super) words: Vec<String>,
    pub(super) shape: Shape,
}

pub(super) struct Declarator {
    pub(super) name: String,
    pub(super) span: Span,
    pub(super) shape: Shape,
}

/// A specifier list.
///
/// An aggregate defined inside it is held back in `defined` until the
/// caller knows whether a typedef names it; `words[position]` is its
/// placeholder.
pub(super) struct Specifiers {
    pub(super) words: Vec<String>,
    pub(super) defined: Option<(usize, AggregateSpec)>,
}

impl Parser<'_> {
    pub(super) fn specifiers(&mut self, expected: &'static str) -> Result<Specifiers, ParseError> {
        let mut words = Vec::new();
        let mut defined = None;
        let mut has_type = false;

        loop {
            if matches!(self.cursor.kind(), TokenKind::Struct | TokenKind::Union | TokenKind::Enum) {
                if has_type {
                    break;
                }
                let spec = self.aggregate_specifier()?;
                match spec.reference() {
                    Some(reference) if spec.fields.is_none() => words.push(reference),
                    _ => {
                        defined = Some((words.len(), spec));
                        words.push(String::new());
                    }
                }
                has_type = true;
                continue;
            }

            let Some(word) = self.cursor.ident() else {
                break;
            };
            if ATTRIBUTES.contains(&word) {
                self.skip_attributes()?;
                continue;
            }
            if IGNORED.contains(&word) {
                self.cursor.advance();
                continue;
            }

            let word = normalize(word);
            if ARITHMETIC.contains(&word.as_str()) {
                has_type = true;
            } else if !QUALIFIERS.contains(&word.as_str()) {
                // A typedef name, unless the type is already spelled out
                // and this is the declarator name.
                if has_type {
                    break;
                }
                has_type = true;
            }
            words.push(word);
            self.cursor.advance();
        }

        if !has_type {
            return Err(self.cursor.unexpected(expected));
        }
        Ok(Specifiers { words, defined })
    }

    pub(super) fn skip_attributes(&mut self) -> Result<(), ParseError> {
        while let Some(word) = self.cursor.ident() {
            if !ATTRIBUTES.contains(&word) {
                break;
            }
            let span = self.cursor.advance().span;
            tracing::debug!(?span, "attribute ignored");
            if self.cursor.check(&TokenKind::LParen) {
                self.cursor.skip_balanced()?;
            }
        }
        Ok(())
    }

    /// Leading `*`s, with the qualifiers that follow the last one.
    pub(super) fn pointer_prefix(&mut self) -> (u32, Vec<String>) {
        let mut depth = 0;
        let mut qualifiers = Vec::new();

        while self.cursor.eat(&TokenKind::Star) {
            depth += 1;
            qualifiers.clear();
            while let Some(word) = self.cursor.ident().map(normalize) {
                if !POINTER_QUALIFIERS.contains(&word.as_str()) {
                    break;
                }
                qualifiers.push(word);
                self.cursor.advance();
            }
        }
        (depth, qualifiers)
    }

    pub(super) fn declarator(&mut self) -> Result<Declarator, ParseError> {
        let (depth, qualifiers) = self.pointer_prefix();
        if self.cursor.check(&TokenKind::LParen) {
            return self.nested_declarator(depth);
        }

        let (name, span) = self.cursor.expect_ident("a declarator name")?;
        let extents = self.array_extents()?;
        let shape = if self.cursor.check(&TokenKind::LParen) {
            Shape::Function {
                return_stars: depth,
                args: self.parameters()?,
            }
        } else {
            shape_of(depth, qualifiers, extents)
        };
        self.skip_attributes()?;

        Ok(Declarator { name, span, shape })
    }

    /// `(*name)(params)`, `(*name[n])(params)` or `(*name)[n]`, at the `(`.
    fn nested_declarator(&mut self, return_stars: u32) -> Result<Declarator, ParseError> {
        let open = self.cursor.expect(&TokenKind::LParen, "`(`")?;
        let (depth, qualifiers) = self.pointer_prefix();
        if depth == 0 {
            return Err(ParseError::new(
                ParseErrorKind::UnsupportedDeclarator("parenthesized declarator without `*`".to_owned()),
                open,
            ));
        }

        let (name, span) = self.cursor.expect_ident("a declarator name")?;
        let extents = self.array_extents()?;
        self.cursor.expect(&TokenKind::RParen, "`)`")?;

        let shape = if self.cursor.check(&TokenKind::LParen) {
            let args = self.parameters()?;
            match (extents, depth) {
                (Some(elements), _) => Shape::Array {
                    elements,
                    element: Element::FuncPointer { return_stars, args },
                },
                (None, 1) => Shape::FuncPointer { return_stars, args },
                (None, depth) => Shape::Pointer { depth, qualifiers },
            }
        } else {
            // Pointer to array; the pointee's extents do not matter.
            self.array_extents()?;
            match extents {
                Some(elements) => Shape::Array {
                    elements,
                    element: Element::Pointer(depth),
                },
                None => Shape::Pointer { depth, qualifiers },
            }
        };

        Ok(Declarator { name, span, shape })
    }

    /// Zero or more `[extent]` suffixes, multiplied together. `[]` counts
    /// as zero elements.
    pub(super) fn array_extents(&mut self) -> Result<Option<u64>, ParseError> {
        let mut total: Option<u64> = None;
        while self.cursor.check(&TokenKind::LBracket) {
            let open = self.cursor.advance().span;
            let extent = if self.cursor.check(&TokenKind::RBracket) {
                0
            } else {
                self.constant_expression()?
            };
            let close = self.cursor.expect(&TokenKind::RBracket, "`]`")?;

            let elements = total
                .unwrap_or(1)
                .checked_mul(extent)
                .ok_or_else(|| invalid_extent("array is too large", open.start..close.end))?;
            total = Some(elements);
        }
        Ok(total)
    }

    /// Parameter type spellings of a function declarator, at the `(`.
    fn parameters(&mut self) -> Result<Vec<String>, ParseError> {
        self.cursor.expect(&TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.cursor.eat(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            if self.cursor.eat(&TokenKind::Ellipsis) {
                args.push("...".to_owned());
            } else {
                let specifiers = self.specifiers("a parameter type")?;
                let words = self.index_inline(specifiers);
                let (stars, _) = self.pointer_prefix();
                // Parameter names and suffixes are not kept.
                self.cursor
                    .skip_until(&[TokenKind::Comma, TokenKind::RParen], "`,` or `)`")?;
                args.push(spelling(&words, stars));
            }

            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.cursor.expect(&TokenKind::RParen, "`)` after parameters")?;
        Ok(args)
    }

    pub(super) fn build_field(&self, words: &[String], declarator: Declarator) -> Result<Field, ParseError> {
        let Declarator { name, span, shape } = declarator;
        let (words, shape) = self.expand_typedef(words, shape, &span)?;

        if let Shape::Function { .. } = shape {
            return Err(ParseError::new(
                ParseErrorKind::UnsupportedDeclarator(format!("`{name}` has function type")),
                span,
            )
            .with_help("declare a pointer to the function instead"));
        }
        Ok(into_field(words, shape, name))
    }

    /// Splice the first typedef name in `words` and compose its shape with
    /// the declarator's.
    ///
    /// Pointers and function pointers are left alone: their size does not
    /// depend on what they point to, and the typedef name reads better.
    pub(super) fn expand_typedef(
        &self,
        words: &[String],
        shape: Shape,
        span: &Span,
    ) -> Result<(Vec<String>, Shape), ParseError> {
        let found = words
            .iter()
            .enumerate()
            .find_map(|(position, word)| self.typedefs.get(word).map(|alias| (position, alias)));
        let Some((position, alias)) = found else {
            return Ok((words.to_vec(), shape));
        };

        let shape = match shape {
            Shape::Value => alias.shape.clone(),
            Shape::Array {
                elements,
                element: Element::Value,
            } => match &alias.shape {
                Shape::Value => Shape::Array {
                    elements,
                    element: Element::Value,
                },
                Shape::Pointer { depth, .. } => Shape::Array {
                    elements,
                    element: Element::Pointer(*depth),
                },
                Shape::Array {
                    elements: inner,
                    element,
                } => Shape::Array {
                    elements: elements
                        .checked_mul(*inner)
                        .ok_or_else(|| invalid_extent("array is too large", span.clone()))?,
                    element: element.clone(),
                },
                Shape::FuncPointer { return_stars, args } => Shape::Array {
                    elements,
                    element: Element::FuncPointer {
                        return_stars: *return_stars,
                        args: args.clone(),
                    },
                },
                function @ Shape::Function { .. } => function.clone(),
            },
            shape => return Ok((words.to_vec(), shape)),
        };

        let mut expanded = words[..position].to_vec();
        expanded.extend(alias.words.iter().cloned());
        expanded.extend(words[position + 1..].iter().cloned());
        Ok((expanded, shape))
    }
}

/// Build a field from specifier words; the last word is the type name.
pub(super) fn into_field(mut words: Vec<String>, shape: Shape, name: String) -> Field {
    match shape {
        Shape::FuncPointer { return_stars, args } | Shape::Function { return_stars, args } => {
            FuncPointer::new(spelling(&words, return_stars), name, args).into()
        }
        Shape::Array {
            elements,
            element: Element::FuncPointer { return_stars, args },
        } => {
            let type_name = format!("{} (*)({})", spelling(&words, return_stars), args.join(", "));
            Array::new(Basic::new(Vec::new(), type_name, name), elements).into()
        }
        shape => {
            let type_name = words.pop().unwrap_or_default();
            let qualifiers = words;
            match shape {
                Shape::Pointer { depth, qualifiers: pointer_qualifiers } => {
                    Pointer::new(Basic::new(qualifiers, type_name, name), pointer_qualifiers)
                        .with_depth(depth)
                        .into()
                }
                Shape::Array {
                    elements,
                    element: Element::Pointer(depth),
                } => {
                    let type_name = format!("{type_name} {}", "*".repeat(depth as usize));
                    Array::new(Basic::new(qualifiers, type_name, name), elements).into()
                }
                Shape::Array { elements, .. } => Array::new(Basic::new(qualifiers, type_name, name), elements).into(),
                _ => Basic::new(qualifiers, type_name, name).into(),
            }
        }
    }
}

/// Shape of a plain declarator from its pointer depth and extents.
pub(super) fn shape_of(depth: u32, qualifiers: Vec<String>, extents: Option<u64>) -> Shape {
    match (depth, extents) {
        (0, None) => Shape::Value,
        (depth, None) => Shape::Pointer { depth, qualifiers },
        (0, Some(elements)) => Shape::Array {
            elements,
            element: Element::Value,
        },
        (depth, Some(elements)) => Shape::Array {
            elements,
            element: Element::Pointer(depth),
        },
    }
}

/// The type-bearing word of a specifier list: the last non-qualifier.
pub(super) fn type_word(words: &[String]) -> Option<&str> {
    words
        .iter()
        .rev()
        .map(String::as_str)
        .find(|word| !QUALIFIERS.contains(word))
}

/// `words` joined, followed by `stars` asterisks.
pub(super) fn spelling(words: &[String], stars: u32) -> String {
    let mut spelling = words.join(" ");
    if stars > 0 {
        spelling.push(' ');
        spelling.push_str(&"*".repeat(stars as usize));
    }
    spelling
}

pub(super) fn invalid_extent(message: impl Into<String>, span: Span) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidExtent(message.into()), span)
}

/// GNU spellings of the standard qualifiers.
fn normalize(word: &str) -> String {
    match word {
        "__const" => "const",
        "__volatile" | "__volatile__" => "volatile",
        "__restrict" | "__restrict__" => "restrict",
        other => other,
    }
    .to_owned()
}

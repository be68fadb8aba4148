//! Integer constant expressions in array extents.
//!
//! Precedence, lowest first:
//!
//! ```text
//! shift          := additive (("<<" | ">>") additive)*
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/" | "%") unary)*
//! unary          := ("+" | "-") unary | primary
//! primary        := INT | "(" shift ")" | "sizeof" "(" type-name ")"
//! ```
//!
//! Arithmetic is done in `i128` with overflow checks, so any value that
//! fits an extent is computed exactly.

use stropt_layout::{resolve, AggregateKind, Basic, FieldType};

use super::declarator::{invalid_extent, shape_of, spelling, Element, Shape};
use super::Parser;
use crate::{ParseError, ParseErrorKind, Span, TokenKind};

#[derive(Clone, Copy, Debug)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
}

impl BinaryOp {
    fn apply(self, lhs: i128, rhs: i128, span: Span) -> Result<i128, ParseError> {
        let shift = || u32::try_from(rhs).ok().filter(|bits| *bits < 64);
        let result = match self {
            BinaryOp::Add => lhs.checked_add(rhs),
            BinaryOp::Sub => lhs.checked_sub(rhs),
            BinaryOp::Mul => lhs.checked_mul(rhs),
            BinaryOp::Div | BinaryOp::Rem if rhs == 0 => {
                return Err(invalid_extent("division by zero", span));
            }
            BinaryOp::Div => lhs.checked_div(rhs),
            BinaryOp::Rem => lhs.checked_rem(rhs),
            BinaryOp::Shl => shift().and_then(|bits| lhs.checked_mul(1_i128 << bits)),
            BinaryOp::Shr => shift().map(|bits| lhs >> bits),
        };
        result.ok_or_else(|| invalid_extent("arithmetic overflow", span))
    }
}

impl Parser<'_> {
    /// Evaluate an extent; it must not be negative.
    pub(super) fn constant_expression(&mut self) -> Result<u64, ParseError> {
        let start = self.cursor.span().start;
        let value = self.shift()?;
        let span = start..self.cursor.previous_span().end;
        u64::try_from(value).map_err(|_| invalid_extent(format!("extent evaluates to {value}"), span))
    }

    fn shift(&mut self) -> Result<i128, ParseError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => return Ok(lhs),
            };
            let span = self.cursor.advance().span;
            let rhs = self.additive()?;
            lhs = op.apply(lhs, rhs, span)?;
        }
    }

    fn additive(&mut self) -> Result<i128, ParseError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let span = self.cursor.advance().span;
            let rhs = self.multiplicative()?;
            lhs = op.apply(lhs, rhs, span)?;
        }
    }

    fn multiplicative(&mut self) -> Result<i128, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            let span = self.cursor.advance().span;
            let rhs = self.unary()?;
            lhs = op.apply(lhs, rhs, span)?;
        }
    }

    fn unary(&mut self) -> Result<i128, ParseError> {
        match self.cursor.kind() {
            TokenKind::Minus => {
                let span = self.cursor.advance().span;
                let operand = self.unary()?;
                operand
                    .checked_neg()
                    .ok_or_else(|| invalid_extent("arithmetic overflow", span))
            }
            TokenKind::Plus => {
                self.cursor.advance();
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<i128, ParseError> {
        match self.cursor.kind() {
            TokenKind::Int(value) => {
                let value = i128::from(*value);
                self.cursor.advance();
                Ok(value)
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let value = self.shift()?;
                self.cursor.expect(&TokenKind::RParen, "`)`")?;
                Ok(value)
            }
            TokenKind::Sizeof => self.sizeof(),
            TokenKind::Ident(name) => Err(invalid_extent(
                format!("`{name}` is not a defined constant"),
                self.cursor.span(),
            )),
            _ => Err(self.cursor.unexpected("a constant expression")),
        }
    }

    /// `sizeof(type-name)`, keyword at the cursor.
    fn sizeof(&mut self) -> Result<i128, ParseError> {
        let start = self.cursor.advance().span.start;
        self.cursor.expect(&TokenKind::LParen, "`(` after `sizeof`")?;
        let specifiers = self.specifiers("a type name")?;
        let words = self.index_inline(specifiers);
        let (depth, qualifiers) = self.pointer_prefix();
        let extents = self.array_extents()?;
        let end = self.cursor.expect(&TokenKind::RParen, "`)` after type name")?.end;

        let span = start..end;
        let size = self.size_of(&words, shape_of(depth, qualifiers, extents), &span)?;
        tracing::trace!(size, "sizeof");
        Ok(i128::from(size))
    }

    fn size_of(&self, words: &[String], shape: Shape, span: &Span) -> Result<u64, ParseError> {
        let unknown = || {
            ParseError::new(
                ParseErrorKind::UnknownSizeof(spelling(words, 0)),
                span.clone(),
            )
        };
        let (words, shape) = self.expand_typedef(words, shape, span)?;
        let pointer = self.catalog.pointer().size;

        let (elements, element_size) = match shape {
            Shape::Pointer { .. } | Shape::FuncPointer { .. } => (1, pointer),
            Shape::Array {
                elements,
                element: Element::Pointer(_) | Element::FuncPointer { .. },
            } => (elements, pointer),
            Shape::Array {
                elements,
                element: Element::Value,
            } => (elements, self.value_size(&words).ok_or_else(unknown)?),
            Shape::Value => (1, self.value_size(&words).ok_or_else(unknown)?),
            Shape::Function { .. } => return Err(unknown()),
        };

        elements
            .checked_mul(element_size)
            .ok_or_else(|| invalid_extent("arithmetic overflow", span.clone()))
    }

    /// Size of a value type: a primitive, an enum, or an aggregate resolved
    /// from what has been parsed so far.
    fn value_size(&self, words: &[String]) -> Option<u64> {
        let (type_name, qualifiers) = words.split_last()?;
        let unqualified = Basic::new(qualifiers.to_vec(), type_name.as_str(), "").unqualified_type();

        if let Some(meta) = self.catalog.lookup(&unqualified) {
            return Some(meta.size);
        }
        let aggregate = self.index.lookup(&unqualified)?;
        if aggregate.kind == AggregateKind::Enum {
            return Some(self.catalog.enumeration().size);
        }
        resolve(&self.index, self.catalog, &unqualified)
            .map(|meta| meta.size)
            .ok()
    }
}

//! Aggregate declarations.

use std::fmt;

use crate::Field;

/// The kind of an aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AggregateKind {
    Struct,
    Union,
    Enum,
}

impl AggregateKind {
    /// The C keyword introducing this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            AggregateKind::Struct => "struct",
            AggregateKind::Union => "union",
            AggregateKind::Enum => "enum",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A struct, union or enum definition.
///
/// Field order is significant: it is the declaration order, and the
/// optimizer rewrites it in place.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aggregate {
    /// Bare tag (`s1` for `struct s1`), absent for anonymous aggregates.
    pub name: Option<String>,
    /// Typedef alias, if the aggregate was declared through one.
    pub typedef: Option<String>,
    pub kind: AggregateKind,
    pub fields: Vec<Field>,
}

impl Aggregate {
    pub fn new(kind: AggregateKind, name: Option<String>, typedef: Option<String>, fields: Vec<Field>) -> Self {
        Aggregate {
            name,
            typedef,
            kind,
            fields,
        }
    }

    /// Qualified tag name, `struct s1`.
    pub fn qualified_name(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|name| format!("{} {name}", self.kind.keyword()))
    }

    /// Every name the aggregate can be referred to by: qualified tag,
    /// bare tag and typedef alias, whichever exist.
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers = Vec::with_capacity(3);
        if let Some(qualified) = self.qualified_name() {
            identifiers.push(qualified);
        }
        if let Some(name) = &self.name {
            identifiers.push(name.clone());
        }
        if let Some(typedef) = &self.typedef {
            identifiers.push(typedef.clone());
        }
        identifiers
    }

    /// The preferred display name: qualified tag, else typedef.
    pub fn display_name(&self) -> String {
        self.qualified_name()
            .or_else(|| self.typedef.clone())
            .unwrap_or_else(|| format!("{} <anonymous>", self.kind.keyword()))
    }

    #[inline]
    pub fn is_struct(&self) -> bool {
        self.kind == AggregateKind::Struct
    }
}

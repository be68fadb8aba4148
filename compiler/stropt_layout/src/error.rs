//! Errors raised while configuring the catalog or resolving layouts.

use thiserror::Error;

/// Error raised while configuring a [`TypeCatalog`](crate::TypeCatalog).
///
/// These surface at configuration time, before any resolution runs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A setter received a zero size or alignment.
    #[error("invalid size/alignment for `{category}`: both must be greater than zero")]
    InvalidSizeAlignment { category: String },

    /// The preset name is not one of `64bit`, `32bit`, `avr8`.
    #[error("unknown platform preset `{0}` (expected one of: 64bit, 32bit, avr8)")]
    UnknownPreset(String),

    /// The category name does not name a primitive category.
    #[error("unknown type category `{0}`")]
    UnknownCategory(String),
}

/// Error raised while resolving or optimizing an aggregate layout.
///
/// Missing symbols and depth overruns are reported against the name the
/// caller asked for, even when they occur deep inside a nested field. The
/// structural errors name the aggregate that is malformed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A field type is neither a catalog primitive nor a known aggregate.
    #[error("cannot find symbol `{symbol}` while resolving `{aggregate}`")]
    SymbolNotFound { aggregate: String, symbol: String },

    /// A struct or union declares no fields.
    #[error("`{aggregate}` has no fields, its layout is undefined")]
    EmptyAggregate { aggregate: String },

    /// An aggregate contains itself by value.
    #[error("`{aggregate}` contains itself by value")]
    RecursiveAggregate { aggregate: String },

    /// Nesting exceeded the resolver's depth limit.
    #[error("nesting of `{aggregate}` exceeds the depth limit of {limit}")]
    RecursionLimit { aggregate: String, limit: usize },

    /// A computed size does not fit in 64 bits.
    #[error("size of `{aggregate}` overflows")]
    SizeOverflow { aggregate: String },

    /// A field reorder was not a permutation of the existing fields.
    #[error("invalid field permutation for `{aggregate}`")]
    InvalidPermutation { aggregate: String },

    /// The metadata handed to the optimizer no longer matches the aggregate.
    #[error("layout passed for `{aggregate}` does not match its current fields")]
    StaleLayout { aggregate: String },
}

impl LayoutError {
    /// The aggregate name the error is reported against.
    pub fn aggregate(&self) -> &str {
        match self {
            LayoutError::SymbolNotFound { aggregate, .. }
            | LayoutError::EmptyAggregate { aggregate }
            | LayoutError::RecursiveAggregate { aggregate }
            | LayoutError::RecursionLimit { aggregate, .. }
            | LayoutError::SizeOverflow { aggregate }
            | LayoutError::InvalidPermutation { aggregate }
            | LayoutError::StaleLayout { aggregate } => aggregate,
        }
    }
}

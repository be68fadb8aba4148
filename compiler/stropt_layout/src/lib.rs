//! Layout resolution for C aggregates.
//!
//! Given a graph of aggregate declarations ([`AggregateIndex`]) and a table
//! of primitive sizes and alignments ([`TypeCatalog`]), this crate computes
//! the size, alignment and per-field padding of a struct, union or enum,
//! and reorders struct fields to reduce padding.
//!
//! # Flow
//!
//! ```text
//! AggregateIndex + TypeCatalog
//!         │
//!         ▼
//!     resolve()  ──►  AggregateMeta
//!         │
//!         ▼
//!    optimize()  ──►  AggregateMeta (reordered fields, written back)
//! ```
//!
//! The catalog is only ever lent immutably to [`resolve`] and [`optimize`],
//! so it cannot change while a resolution is in flight. The index is
//! mutated exclusively by [`optimize`], which needs `&mut`.

mod aggregate;
mod catalog;
mod error;
mod field;
mod index;
mod optimize;
mod resolve;
mod stack;

pub use aggregate::{Aggregate, AggregateKind};
pub use catalog::{Category, Preset, TypeCatalog, TypeMeta};
pub use error::{CatalogError, LayoutError};
pub use field::{Array, Basic, Field, FieldType, FuncPointer, Pointer};
pub(crate) use field::is_pointer_spelling;
pub use index::{AggregateId, AggregateIndex};
pub use optimize::optimize;
pub use resolve::{resolve, AggregateMeta, Layout, LayoutResolver, DEFAULT_MAX_DEPTH};
pub use stack::ensure_sufficient_stack;

/// Bytes needed after `offset` to reach the next multiple of `align`.
///
/// An alignment of zero needs no padding; the catalog rejects zero
/// alignments, so this only guards against hand-built metadata.
#[inline]
pub fn padding_to(offset: u64, align: u64) -> u64 {
    if align == 0 {
        return 0;
    }
    (align - offset % align) % align
}

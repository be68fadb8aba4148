//! Layout resolution.
//!
//! Turns an aggregate name into its [`AggregateMeta`]: total size, alignment
//! and one [`Layout`] row per field, with nested rows for fields whose type
//! is itself an aggregate.
//!
//! # Algorithm
//!
//! Each field is first *measured* on its own (catalog primitive, pointer,
//! enum, or a recursive resolution of a nested aggregate). The measured
//! members are then *placed*:
//!
//! - **struct**: fields in declaration order; after each field, padding
//!   rounds the running size up to the alignment of the next field, and
//!   after the last one up to the struct alignment (the largest field
//!   alignment).
//! - **union**: the largest member (first one on ties) is padded up to the
//!   union alignment; every other member reports zero padding.
//! - **enum**: the catalog's enum size and alignment, no rows.
//!
//! Nothing is cached: every call recomputes the whole tree.

use crate::{
    ensure_sufficient_stack, is_pointer_spelling, padding_to, Aggregate, AggregateId,
    AggregateIndex, AggregateKind, Basic, Field, FieldType, LayoutError, TypeCatalog, TypeMeta,
};

/// Default bound on aggregate nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Resolved placement of one field.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    pub field: Field,
    pub size: u64,
    pub alignment: u64,
    /// Bytes inserted right after this field.
    pub padding: u64,
    /// The nested aggregate's own rows, when the field type is a struct or
    /// union (for arrays, the rows of one element).
    pub sub_layout: Option<Vec<Layout>>,
}

impl Layout {
    /// Row label: the field name, with extents for arrays.
    pub fn declaration(&self) -> String {
        self.field.declaration()
    }
}

/// Resolved metadata of one aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateMeta {
    pub kind: AggregateKind,
    pub size: u64,
    pub alignment: u64,
    pub layout: Vec<Layout>,
}

impl AggregateMeta {
    /// Sum of the padding of every row.
    pub fn total_padding(&self) -> u64 {
        self.layout.iter().map(|row| row.padding).sum()
    }

    /// Byte offset of every row: cumulative for structs, zero for unions.
    pub fn field_offsets(&self) -> Vec<u64> {
        match self.kind {
            AggregateKind::Struct => {
                let mut offset = 0;
                self.layout
                    .iter()
                    .map(|row| {
                        let at = offset;
                        offset += row.size + row.padding;
                        at
                    })
                    .collect()
            }
            AggregateKind::Union | AggregateKind::Enum => vec![0; self.layout.len()],
        }
    }
}

/// Resolve `name` against `index` with the sizes of `catalog`.
///
/// Shorthand for `LayoutResolver::new(index, catalog).resolve(name)`.
pub fn resolve(index: &AggregateIndex, catalog: &TypeCatalog, name: &str) -> Result<AggregateMeta, LayoutError> {
    LayoutResolver::new(index, catalog).resolve(name)
}

/// Recursive layout resolver over a borrowed index and catalog.
pub struct LayoutResolver<'a> {
    index: &'a AggregateIndex,
    catalog: &'a TypeCatalog,
    max_depth: usize,
}

/// A field measured in isolation, before placement.
struct Member {
    size: u64,
    alignment: u64,
    sub_layout: Option<Vec<Layout>>,
}

impl Member {
    fn scalar(meta: TypeMeta) -> Self {
        Member {
            size: meta.size,
            alignment: meta.alignment,
            sub_layout: None,
        }
    }
}

/// Per-call resolution state.
struct Walk<'n> {
    /// The name the caller asked for; errors are reported against it.
    root: &'n str,
    /// Aggregates currently being resolved, outermost first.
    active: Vec<AggregateId>,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(index: &'a AggregateIndex, catalog: &'a TypeCatalog) -> Self {
        LayoutResolver {
            index,
            catalog,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Bound the nesting depth; deeper graphs fail with
    /// [`LayoutError::RecursionLimit`].
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Resolve the aggregate known by `name` (any alias).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn resolve(&self, name: &str) -> Result<AggregateMeta, LayoutError> {
        let mut walk = Walk {
            root: name,
            active: Vec::new(),
        };
        let id = self
            .index
            .resolve_name(name)
            .ok_or_else(|| LayoutError::SymbolNotFound {
                aggregate: name.to_owned(),
                symbol: name.to_owned(),
            })?;

        let meta = self.resolve_id(id, &mut walk)?;
        tracing::debug!(size = meta.size, alignment = meta.alignment, "resolved");
        Ok(meta)
    }

    fn resolve_id(&self, id: AggregateId, walk: &mut Walk<'_>) -> Result<AggregateMeta, LayoutError> {
        let aggregate = self.index.get(id);

        if walk.active.contains(&id) {
            return Err(LayoutError::RecursiveAggregate {
                aggregate: aggregate.display_name(),
            });
        }
        if walk.active.len() >= self.max_depth {
            return Err(LayoutError::RecursionLimit {
                aggregate: walk.root.to_owned(),
                limit: self.max_depth,
            });
        }

        walk.active.push(id);
        let result = ensure_sufficient_stack(|| self.resolve_aggregate(aggregate, walk));
        walk.active.pop();
        result
    }

    fn resolve_aggregate(&self, aggregate: &Aggregate, walk: &mut Walk<'_>) -> Result<AggregateMeta, LayoutError> {
        if aggregate.kind == AggregateKind::Enum {
            let meta = self.catalog.enumeration();
            return Ok(AggregateMeta {
                kind: AggregateKind::Enum,
                size: meta.size,
                alignment: meta.alignment,
                layout: Vec::new(),
            });
        }

        if aggregate.fields.is_empty() {
            return Err(LayoutError::EmptyAggregate {
                aggregate: aggregate.display_name(),
            });
        }

        let members = aggregate
            .fields
            .iter()
            .map(|field| self.measure(field, aggregate, walk))
            .collect::<Result<Vec<_>, _>>()?;

        if aggregate.kind == AggregateKind::Union {
            place_union(aggregate, members)
        } else {
            place_struct(aggregate, members)
        }
    }

    /// First pass: size and alignment of one field in isolation.
    fn measure(&self, field: &Field, owner: &Aggregate, walk: &mut Walk<'_>) -> Result<Member, LayoutError> {
        match field {
            Field::Pointer(_) | Field::FuncPointer(_) => Ok(Member::scalar(self.catalog.pointer())),
            Field::EnumEntry(_) => Ok(Member::scalar(self.catalog.enumeration())),
            Field::Basic(basic) => self.measure_value(basic, 1, owner, walk),
            Field::Array(array) => self.measure_value(&array.basic, array.elements, owner, walk),
        }
    }

    fn measure_value(
        &self,
        basic: &Basic,
        elements: u64,
        owner: &Aggregate,
        walk: &mut Walk<'_>,
    ) -> Result<Member, LayoutError> {
        let type_name = basic.unqualified_type();

        let mut member = if is_pointer_spelling(&type_name) {
            Member::scalar(self.catalog.pointer())
        } else if let Some(meta) = self.catalog.lookup(&type_name) {
            Member::scalar(meta)
        } else {
            let id = self
                .index
                .resolve_name(&type_name)
                .ok_or_else(|| LayoutError::SymbolNotFound {
                    aggregate: walk.root.to_owned(),
                    symbol: type_name.clone(),
                })?;

            if self.index.get(id).kind == AggregateKind::Enum {
                Member::scalar(self.catalog.enumeration())
            } else {
                let nested = self.resolve_id(id, walk)?;
                Member {
                    size: nested.size,
                    alignment: nested.alignment,
                    sub_layout: Some(nested.layout),
                }
            }
        };

        member.size = member
            .size
            .checked_mul(elements)
            .ok_or_else(|| LayoutError::SizeOverflow {
                aggregate: owner.display_name(),
            })?;

        tracing::trace!(
            field = %basic.name,
            ty = %type_name,
            size = member.size,
            alignment = member.alignment,
            "measured field"
        );
        Ok(member)
    }
}

/// Second pass for structs: place fields in order and insert padding.
fn place_struct(aggregate: &Aggregate, members: Vec<Member>) -> Result<AggregateMeta, LayoutError> {
    let max_align = members.iter().map(|m| m.alignment).max().unwrap_or(1);
    let next_aligns: Vec<u64> = members
        .iter()
        .skip(1)
        .map(|m| m.alignment)
        .chain(std::iter::once(max_align))
        .collect();

    let overflow = || LayoutError::SizeOverflow {
        aggregate: aggregate.display_name(),
    };

    let mut total: u64 = 0;
    let mut layout = Vec::with_capacity(members.len());
    for ((field, member), next_align) in aggregate.fields.iter().zip(members).zip(next_aligns) {
        total = total.checked_add(member.size).ok_or_else(overflow)?;
        let padding = padding_to(total, next_align);
        total = total.checked_add(padding).ok_or_else(overflow)?;

        layout.push(Layout {
            field: field.clone(),
            size: member.size,
            alignment: member.alignment,
            padding,
            sub_layout: member.sub_layout,
        });
    }

    Ok(AggregateMeta {
        kind: AggregateKind::Struct,
        size: total,
        alignment: max_align,
        layout,
    })
}

/// Second pass for unions: pad the largest member up to the alignment.
fn place_union(aggregate: &Aggregate, members: Vec<Member>) -> Result<AggregateMeta, LayoutError> {
    let alignment = members.iter().map(|m| m.alignment).max().unwrap_or(1);

    let mut selected = 0;
    for (idx, member) in members.iter().enumerate() {
        if member.size > members[selected].size {
            selected = idx;
        }
    }
    let max_size = members[selected].size;
    let padding = padding_to(max_size, alignment);
    let size = max_size
        .checked_add(padding)
        .ok_or_else(|| LayoutError::SizeOverflow {
            aggregate: aggregate.display_name(),
        })?;

    let layout = aggregate
        .fields
        .iter()
        .zip(members)
        .enumerate()
        .map(|(idx, (field, member))| Layout {
            field: field.clone(),
            size: member.size,
            alignment: member.alignment,
            padding: if idx == selected { padding } else { 0 },
            sub_layout: member.sub_layout,
        })
        .collect();

    Ok(AggregateMeta {
        kind: AggregateKind::Union,
        size,
        alignment,
        layout,
    })
}

//! Index of aggregate declarations.
//!
//! Aggregates live in an arena and are addressed by [`AggregateId`]. Every
//! name an aggregate can be referenced by maps to the same id, so a field
//! reorder performed through one alias is visible through all of them.
//!
//! # Alias strength
//!
//! - Qualified tags (`struct s`) and typedef names are *strong*: a later
//!   strong registration of the same name wins.
//! - Bare tags (`s` for `struct s`) are *weak*: they are only registered
//!   when the name is free, and any strong alias displaces them.
//!
//! This keeps `typedef struct b a;` pointing at `struct b` even when a
//! `struct a` also exists.

use rustc_hash::FxHashMap;

use crate::{Aggregate, LayoutError};

/// Stable handle to an aggregate stored in an [`AggregateIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateId(u32);

impl AggregateId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug)]
struct Alias {
    id: AggregateId,
    strong: bool,
}

/// Arena of aggregates plus the alias table resolving names to them.
#[derive(Clone, Debug, Default)]
pub struct AggregateIndex {
    aggregates: Vec<Aggregate>,
    aliases: FxHashMap<String, Alias>,
}

impl AggregateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `aggregate` and register all of its identifiers.
    pub fn insert(&mut self, aggregate: Aggregate) -> AggregateId {
        let raw = u32::try_from(self.aggregates.len()).unwrap_or(u32::MAX);
        let id = AggregateId(raw);

        if let Some(qualified) = aggregate.qualified_name() {
            self.register(qualified, id, true);
        }
        if let Some(name) = aggregate.name.clone() {
            self.register(name, id, false);
        }
        if let Some(typedef) = aggregate.typedef.clone() {
            self.register(typedef, id, true);
        }

        tracing::trace!(name = %aggregate.display_name(), ?id, "indexed aggregate");
        self.aggregates.push(aggregate);
        id
    }

    /// Register an extra strong alias for an existing aggregate
    /// (`typedef struct s s_t;` after `struct s` was defined).
    pub fn add_alias(&mut self, alias: impl Into<String>, id: AggregateId) {
        self.register(alias.into(), id, true);
    }

    fn register(&mut self, alias: String, id: AggregateId, strong: bool) {
        match self.aliases.get(&alias).copied() {
            Some(existing) if !strong => {
                tracing::trace!(%alias, ?existing.id, "bare tag shadowed by an existing name");
            }
            Some(existing) if existing.strong && existing.id != id => {
                tracing::debug!(%alias, old = ?existing.id, new = ?id, "alias redefined");
                self.aliases.insert(alias, Alias { id, strong });
            }
            _ => {
                self.aliases.insert(alias, Alias { id, strong });
            }
        }
    }

    /// Resolve any alias to its aggregate handle.
    #[inline]
    pub fn resolve_name(&self, name: &str) -> Option<AggregateId> {
        self.aliases.get(name).map(|alias| alias.id)
    }

    /// The aggregate behind `id`.
    ///
    /// Ids are only minted by [`insert`](Self::insert), so they are always
    /// in bounds for the index that produced them.
    #[inline]
    pub fn get(&self, id: AggregateId) -> &Aggregate {
        &self.aggregates[id.index()]
    }

    /// Resolve `name` and return the aggregate behind it.
    pub fn lookup(&self, name: &str) -> Option<&Aggregate> {
        self.resolve_name(name).map(|id| self.get(id))
    }

    /// Every alias resolving to `id`, sorted.
    pub fn aliases_of(&self, id: AggregateId) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, alias)| alias.id == id)
            .map(|(name, _)| name.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    /// Reorder the fields of `id` so that new position `i` holds the field
    /// previously at `order[i]`.
    ///
    /// `order` must be a permutation of `0..fields.len()`; otherwise the
    /// aggregate is left untouched.
    pub fn permute_fields(&mut self, id: AggregateId, order: &[usize]) -> Result<(), LayoutError> {
        let aggregate = &mut self.aggregates[id.index()];
        let len = aggregate.fields.len();

        let mut seen = vec![false; len];
        let is_permutation = order.len() == len
            && order
                .iter()
                .all(|&from| from < len && !std::mem::replace(&mut seen[from], true));
        if !is_permutation {
            return Err(LayoutError::InvalidPermutation {
                aggregate: aggregate.display_name(),
            });
        }

        let mut old: Vec<Option<crate::Field>> = aggregate.fields.drain(..).map(Some).collect();
        aggregate.fields = order.iter().filter_map(|&from| old[from].take()).collect();
        Ok(())
    }

    /// Iterate over every stored aggregate, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (AggregateId, &Aggregate)> {
        self.aggregates
            .iter()
            .enumerate()
            .map(|(idx, aggregate)| (AggregateId(u32::try_from(idx).unwrap_or(u32::MAX)), aggregate))
    }

    /// Number of distinct aggregates (not aliases).
    #[inline]
    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

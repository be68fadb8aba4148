//! Struct field reordering.
//!
//! Fields are sorted by descending alignment. When every alignment divides
//! the larger ones (power-of-two alignments, as in all presets) this is
//! optimal: each field starts at an offset that is already a multiple of
//! its own alignment. With other alignments it is only a heuristic. The
//! reorder is written back into the index, so every alias of the struct
//! sees it.
//!
//! The rewrite is transactional. If the re-resolution fails, or if unusual
//! catalog overrides make the reordered struct larger, the original field
//! order is restored.

use crate::{resolve, AggregateIndex, AggregateKind, AggregateMeta, LayoutError, TypeCatalog};

/// Reorder the fields of `name` to minimize padding and return the new
/// metadata.
///
/// `resolved` must be the current resolution of `name`; it provides the
/// per-field alignments the reorder is computed from. Unions and enums have
/// no order to optimize and are simply re-resolved.
#[tracing::instrument(level = "debug", skip(index, catalog, resolved), fields(size = resolved.size))]
pub fn optimize(
    index: &mut AggregateIndex,
    catalog: &TypeCatalog,
    name: &str,
    resolved: &AggregateMeta,
) -> Result<AggregateMeta, LayoutError> {
    let id = index
        .resolve_name(name)
        .ok_or_else(|| LayoutError::SymbolNotFound {
            aggregate: name.to_owned(),
            symbol: name.to_owned(),
        })?;

    let aggregate = index.get(id);
    if !aggregate.is_struct() {
        return resolve(index, catalog, name);
    }
    if resolved.kind != AggregateKind::Struct || resolved.layout.len() != aggregate.fields.len() {
        return Err(LayoutError::StaleLayout {
            aggregate: aggregate.display_name(),
        });
    }

    let order = descending_alignment_order(resolved);
    if order.iter().enumerate().all(|(to, &from)| to == from) {
        tracing::debug!("field order already optimal");
        return resolve(index, catalog, name);
    }

    index.permute_fields(id, &order)?;
    let restore = inverse(&order);

    match resolve(index, catalog, name) {
        Ok(optimized) if optimized.size <= resolved.size => {
            tracing::debug!(
                before = resolved.size,
                after = optimized.size,
                saved = resolved.size - optimized.size,
                "reordered fields"
            );
            Ok(optimized)
        }
        Ok(optimized) => {
            tracing::debug!(
                before = resolved.size,
                after = optimized.size,
                "reorder grew the struct, keeping the declared order"
            );
            index.permute_fields(id, &restore)?;
            Ok(resolved.clone())
        }
        Err(err) => {
            index.permute_fields(id, &restore)?;
            Err(err)
        }
    }
}

/// Field positions stably sorted by descending alignment.
fn descending_alignment_order(resolved: &AggregateMeta) -> Vec<usize> {
    let mut order: Vec<usize> = (0..resolved.layout.len()).collect();
    order.sort_by_key(|&idx| std::cmp::Reverse(resolved.layout[idx].alignment));
    order
}

/// The permutation undoing `order`.
fn inverse(order: &[usize]) -> Vec<usize> {
    let mut undo = vec![0; order.len()];
    for (to, &from) in order.iter().enumerate() {
        undo[from] = to;
    }
    undo
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

//! Property-based tests for layout resolution and optimization.
//!
//! Random structs of primitive, pointer and array fields are resolved under
//! every preset and checked for:
//! 1. Struct invariants: size is a multiple of the alignment, alignment is
//!    the largest field alignment, rows add up to the size
//! 2. Optimization never grows a struct and only permutes its fields
//! 3. A nested struct lays out exactly like the same struct at top level

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    reason = "Proptest macros generate code with these patterns"
)]

use proptest::prelude::*;
use stropt_layout::{
    optimize, resolve, Aggregate, AggregateIndex, AggregateKind, Array, Basic, Field, FieldType,
    Pointer, Preset, TypeCatalog,
};

// -- Strategies --

const PRIMITIVES: &[&str] = &[
    "char",
    "unsigned char",
    "short",
    "int",
    "unsigned int",
    "long",
    "long long",
    "float",
    "double",
    "long double",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "_Bool",
];

fn preset_strategy() -> impl Strategy<Value = Preset> {
    prop::sample::select(Preset::ALL.to_vec())
}

/// A single field, named after its position.
fn field_strategy() -> impl Strategy<Value = (usize, u8, u64)> {
    // (primitive index, shape: 0 value / 1 pointer / 2 array, array length)
    (0..PRIMITIVES.len(), 0u8..3, 1u64..6)
}

fn build_field(position: usize, (ty, shape, len): (usize, u8, u64)) -> Field {
    let basic = Basic::new(vec![], PRIMITIVES[ty], format!("f{position}"));
    match shape {
        0 => basic.into(),
        1 => Pointer::new(basic, vec![]).into(),
        _ => Array::new(basic, len).into(),
    }
}

fn struct_strategy() -> impl Strategy<Value = Vec<Field>> {
    prop::collection::vec(field_strategy(), 1..12).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(position, spec)| build_field(position, spec))
            .collect()
    })
}

fn index_of(fields: Vec<Field>) -> AggregateIndex {
    let mut index = AggregateIndex::new();
    index.insert(Aggregate::new(
        AggregateKind::Struct,
        Some("generated".to_owned()),
        None,
        fields,
    ));
    index
}

// -- Property Tests --

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// Size, alignment and row totals agree for any struct.
    #[test]
    fn prop_struct_invariants(fields in struct_strategy(), preset in preset_strategy()) {
        let catalog = TypeCatalog::with_preset(preset);
        let index = index_of(fields);
        let meta = resolve(&index, &catalog, "generated").unwrap();

        let max_align = meta.layout.iter().map(|row| row.alignment).max().unwrap();
        let total: u64 = meta.layout.iter().map(|row| row.size + row.padding).sum();

        prop_assert_eq!(meta.size % meta.alignment, 0);
        prop_assert_eq!(meta.alignment, max_align);
        prop_assert_eq!(total, meta.size);
        for row in &meta.layout {
            prop_assert!(row.padding < meta.alignment);
        }
    }

    /// Optimizing never grows the struct, and keeps every field exactly once.
    #[test]
    fn prop_optimize_is_a_shrinking_permutation(
        fields in struct_strategy(),
        preset in preset_strategy(),
    ) {
        let catalog = TypeCatalog::with_preset(preset);
        let mut declared: Vec<String> = fields.iter().map(ToString::to_string).collect();
        let mut index = index_of(fields);
        let before = resolve(&index, &catalog, "generated").unwrap();

        let after = optimize(&mut index, &catalog, "generated", &before).unwrap();

        prop_assert!(after.size <= before.size);
        prop_assert_eq!(after.alignment, before.alignment);

        let mut reordered: Vec<String> = index
            .lookup("generated")
            .unwrap()
            .fields
            .iter()
            .map(ToString::to_string)
            .collect();
        declared.sort();
        reordered.sort();
        prop_assert_eq!(reordered, declared);
    }

    /// Optimizing an optimized struct leaves it as it is.
    #[test]
    fn prop_optimize_is_idempotent(fields in struct_strategy(), preset in preset_strategy()) {
        let catalog = TypeCatalog::with_preset(preset);
        let mut index = index_of(fields);
        let before = resolve(&index, &catalog, "generated").unwrap();

        let once = optimize(&mut index, &catalog, "generated", &before).unwrap();
        let twice = optimize(&mut index, &catalog, "generated", &once).unwrap();

        prop_assert_eq!(twice, once);
    }

    /// A struct embedded in another lays out like the same struct alone.
    #[test]
    fn prop_nested_matches_top_level(
        fields in struct_strategy(),
        preset in preset_strategy(),
        lead in 0..PRIMITIVES.len(),
    ) {
        let catalog = TypeCatalog::with_preset(preset);
        let mut index = index_of(fields);
        index.insert(Aggregate::new(
            AggregateKind::Struct,
            Some("outer".to_owned()),
            None,
            vec![
                Basic::new(vec![], PRIMITIVES[lead], "lead").into(),
                Basic::new(vec![], "struct generated", "inner").into(),
            ],
        ));

        let alone = resolve(&index, &catalog, "struct generated").unwrap();
        let outer = resolve(&index, &catalog, "struct outer").unwrap();
        let row = &outer.layout[1];

        prop_assert_eq!(row.field.unqualified_type(), "struct generated");
        prop_assert_eq!(row.size, alone.size);
        prop_assert_eq!(row.alignment, alone.alignment);
        prop_assert_eq!(row.sub_layout.as_ref(), Some(&alone.layout));
        prop_assert_eq!(outer.field_offsets()[1] % alone.alignment, 0);
    }
}

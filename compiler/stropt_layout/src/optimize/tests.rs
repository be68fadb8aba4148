use super::*;
use crate::{Aggregate, Array, Basic, Category, Field, FieldType};
use pretty_assertions::assert_eq;

fn basic(ty: &str, name: &str) -> Field {
    Basic::new(vec![], ty, name).into()
}

fn index_with(kind: AggregateKind, tag: &str, typedef: Option<&str>, fields: Vec<Field>) -> AggregateIndex {
    let mut index = AggregateIndex::new();
    index.insert(Aggregate::new(
        kind,
        Some(tag.to_owned()),
        typedef.map(str::to_owned),
        fields,
    ));
    index
}

fn field_names(index: &AggregateIndex, name: &str) -> Vec<String> {
    index
        .lookup(name)
        .expect("aggregate exists")
        .fields
        .iter()
        .map(|field| field.name().to_owned())
        .collect()
}

#[test]
fn reorder_removes_padding() {
    let mut index = index_with(
        AggregateKind::Struct,
        "loose",
        None,
        vec![basic("char", "a"), basic("int64_t", "b"), basic("char", "c")],
    );
    let catalog = TypeCatalog::new();
    let before = resolve(&index, &catalog, "loose").unwrap();
    assert_eq!(before.size, 24);

    let after = optimize(&mut index, &catalog, "loose", &before).unwrap();

    assert_eq!(after.size, 16);
    assert_eq!(after.total_padding(), 6);
    assert_eq!(field_names(&index, "loose"), vec!["b", "a", "c"]);
}

#[test]
fn mixed_width_struct_keeps_its_minimum() {
    let mut index = index_with(
        AggregateKind::Struct,
        "a2",
        None,
        vec![
            basic("int32_t", "a"),
            basic("int64_t", "b"),
            basic("int8_t", "c"),
            basic("int32_t", "d"),
        ],
    );
    let catalog = TypeCatalog::new();
    let before = resolve(&index, &catalog, "a2").unwrap();

    let after = optimize(&mut index, &catalog, "a2", &before).unwrap();

    assert!(after.size <= before.size);
    assert_eq!(after.size, 24);
    assert_eq!(field_names(&index, "a2"), vec!["b", "a", "d", "c"]);
    assert_eq!(
        after.layout.iter().map(|row| row.padding).collect::<Vec<_>>(),
        vec![0, 0, 0, 7]
    );
}

#[test]
fn optimizing_twice_changes_nothing() {
    let mut index = index_with(
        AggregateKind::Struct,
        "a1",
        None,
        vec![
            basic("int32_t", "a"),
            basic("int8_t", "b"),
            basic("int16_t", "c"),
            basic("int32_t", "d"),
            basic("int64_t", "e"),
        ],
    );
    let catalog = TypeCatalog::new();
    let before = resolve(&index, &catalog, "a1").unwrap();

    let first = optimize(&mut index, &catalog, "a1", &before).unwrap();
    let order = field_names(&index, "a1");
    let second = optimize(&mut index, &catalog, "a1", &first).unwrap();

    assert_eq!(first.size, 24);
    assert_eq!(second, first);
    assert_eq!(field_names(&index, "a1"), order);
}

#[test]
fn result_is_a_permutation_of_the_fields() {
    let fields = vec![
        basic("char", "a"),
        Array::new(Basic::new(vec![], "short", "b"), 3).into(),
        basic("double", "c"),
        basic("int", "d"),
        basic("char", "e"),
    ];
    let mut index = index_with(AggregateKind::Struct, "p", None, fields.clone());
    let catalog = TypeCatalog::new();
    let before = resolve(&index, &catalog, "p").unwrap();

    let after = optimize(&mut index, &catalog, "p", &before).unwrap();

    let mut expected: Vec<String> = fields.iter().map(Field::declaration).collect();
    let mut got: Vec<String> = after.layout.iter().map(|row| row.declaration()).collect();
    expected.sort();
    got.sort();
    assert_eq!(got, expected);
    assert!(after.size <= before.size);
}

#[test]
fn reorder_is_visible_through_every_alias() {
    let mut index = index_with(
        AggregateKind::Struct,
        "node",
        Some("node_t"),
        vec![basic("char", "tag"), basic("double", "weight")],
    );
    let catalog = TypeCatalog::new();
    let before = resolve(&index, &catalog, "node_t").unwrap();

    optimize(&mut index, &catalog, "node_t", &before).unwrap();

    for alias in ["struct node", "node", "node_t"] {
        assert_eq!(field_names(&index, alias), vec!["weight", "tag"], "{alias}");
    }
}

#[test]
fn unions_are_only_re_resolved() {
    let mut index = index_with(
        AggregateKind::Union,
        "u2",
        None,
        vec![
            Array::new(Basic::new(vec![], "char", "arr"), 9).into(),
            basic("double", "b"),
        ],
    );
    let catalog = TypeCatalog::new();
    let before = resolve(&index, &catalog, "u2").unwrap();

    let after = optimize(&mut index, &catalog, "u2", &before).unwrap();

    assert_eq!(after, before);
    assert_eq!(field_names(&index, "u2"), vec!["arr", "b"]);
}

#[test]
fn stale_layout_is_rejected() {
    let mut index = index_with(
        AggregateKind::Struct,
        "s",
        None,
        vec![basic("char", "a"), basic("int", "b")],
    );
    let catalog = TypeCatalog::new();
    let mut stale = resolve(&index, &catalog, "s").unwrap();
    stale.layout.pop();

    let err = optimize(&mut index, &catalog, "s", &stale).unwrap_err();

    assert_eq!(
        err,
        LayoutError::StaleLayout {
            aggregate: "struct s".to_owned()
        }
    );
    assert_eq!(field_names(&index, "s"), vec!["a", "b"]);
}

#[test]
fn larger_result_rolls_back() {
    // Alignments recorded under a skewed catalog put the chars first; under
    // the real catalog that order is larger than the recorded size.
    let mut index = index_with(
        AggregateKind::Struct,
        "odd",
        None,
        vec![basic("int", "a"), basic("char", "b"), basic("char", "c")],
    );
    let mut skewed = TypeCatalog::new();
    skewed.set(Category::Char, 1, 8).unwrap();
    let mut resolved = resolve(&index, &TypeCatalog::new(), "odd").unwrap();
    let skewed_meta = resolve(&index, &skewed, "odd").unwrap();
    for (row, skewed_row) in resolved.layout.iter_mut().zip(&skewed_meta.layout) {
        row.alignment = skewed_row.alignment;
    }
    resolved.size = 6;

    let after = optimize(&mut index, &TypeCatalog::new(), "odd", &resolved).unwrap();

    assert_eq!(after, resolved);
    assert_eq!(field_names(&index, "odd"), vec!["a", "b", "c"]);
}

#[test]
fn unknown_name_is_reported() {
    let mut index = AggregateIndex::new();
    let meta = AggregateMeta {
        kind: AggregateKind::Struct,
        size: 1,
        alignment: 1,
        layout: vec![],
    };

    assert!(matches!(
        optimize(&mut index, &TypeCatalog::new(), "ghost", &meta),
        Err(LayoutError::SymbolNotFound { .. })
    ));
}

#[test]
fn inverse_undoes_the_permutation() {
    let order = vec![2, 0, 3, 1];
    let undo = inverse(&order);
    let restored: Vec<usize> = undo.iter().map(|&idx| order[idx]).collect();

    assert_eq!(restored, vec![0, 1, 2, 3]);
}

use super::*;
use crate::{AggregateKind, Basic, Field};
use pretty_assertions::assert_eq;

fn int_field(name: &str) -> Field {
    Basic::new(vec![], "int", name).into()
}

fn structure(name: Option<&str>, typedef: Option<&str>, fields: Vec<Field>) -> Aggregate {
    Aggregate::new(
        AggregateKind::Struct,
        name.map(str::to_owned),
        typedef.map(str::to_owned),
        fields,
    )
}

#[test]
fn every_identifier_resolves_to_the_same_record() {
    let mut index = AggregateIndex::new();
    let id = index.insert(structure(Some("s"), Some("s_t"), vec![int_field("a")]));

    assert_eq!(index.resolve_name("struct s"), Some(id));
    assert_eq!(index.resolve_name("s"), Some(id));
    assert_eq!(index.resolve_name("s_t"), Some(id));
    assert_eq!(index.resolve_name("struct s_t"), None);
    assert_eq!(index.aliases_of(id), vec!["s", "s_t", "struct s"]);
    assert_eq!(index.len(), 1);
}

#[test]
fn added_alias_shares_the_record() {
    let mut index = AggregateIndex::new();
    let id = index.insert(structure(Some("node"), None, vec![int_field("v")]));
    index.add_alias("node_t", id);

    assert_eq!(index.lookup("node_t"), index.lookup("struct node"));
    assert_eq!(index.aliases_of(id), vec!["node", "node_t", "struct node"]);
}

#[test]
fn bare_tag_never_displaces_a_typedef() {
    let mut index = AggregateIndex::new();
    let b = index.insert(structure(Some("b"), Some("a"), vec![int_field("x")]));
    let a = index.insert(structure(Some("a"), None, vec![int_field("y")]));

    assert_eq!(index.resolve_name("a"), Some(b));
    assert_eq!(index.resolve_name("struct a"), Some(a));
}

#[test]
fn typedef_displaces_an_earlier_bare_tag() {
    let mut index = AggregateIndex::new();
    let a = index.insert(structure(Some("a"), None, vec![int_field("y")]));
    let b = index.insert(structure(Some("b"), Some("a"), vec![int_field("x")]));

    assert_eq!(index.resolve_name("a"), Some(b));
    assert_eq!(index.resolve_name("struct a"), Some(a));
}

#[test]
fn permute_fields_is_visible_through_every_alias() {
    let mut index = AggregateIndex::new();
    let id = index.insert(structure(
        Some("p"),
        Some("p_t"),
        vec![int_field("a"), int_field("b"), int_field("c")],
    ));

    index.permute_fields(id, &[2, 0, 1]).unwrap();

    for alias in ["struct p", "p", "p_t"] {
        let names: Vec<&str> = index
            .lookup(alias)
            .expect("alias resolves")
            .fields
            .iter()
            .map(Field::name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"], "through {alias}");
    }
}

#[test]
fn permute_fields_rejects_non_permutations() {
    let mut index = AggregateIndex::new();
    let id = index.insert(structure(Some("q"), None, vec![int_field("a"), int_field("b")]));
    let before = index.get(id).clone();

    for order in [&[0usize][..], &[0, 0], &[0, 2], &[1, 0, 2]] {
        let err = index.permute_fields(id, order).unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidPermutation {
                aggregate: "struct q".to_owned()
            }
        );
    }
    assert_eq!(index.get(id), &before);
}

#[test]
fn iter_yields_insertion_order() {
    let mut index = AggregateIndex::new();
    let first = index.insert(structure(Some("one"), None, vec![]));
    let second = index.insert(structure(None, Some("two"), vec![]));

    let ids: Vec<AggregateId> = index.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(!index.is_empty());
}

//! Parse C headers and lay out what they declare.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use stropt_cparse::{parse_source, parse_source_with};
use stropt_layout::{optimize, resolve, AggregateMeta, LayoutError, Preset, TypeCatalog};

const HEADER: &str = r"
#include <stdint.h>

#define NAME_LEN 9

/* Loosely packed on purpose. */
struct a1 {
    int32_t a;
    int8_t b;
    int16_t c;
    int32_t d;
    int64_t e;
};

struct a2 {
    int32_t a;
    int64_t b;
    int8_t c;
    int32_t d;
};

struct t1 { int16_t x; int8_t y; };
struct s1 { int32_t a; struct t1 t; int32_t d; };

typedef struct { char *str; int a; } p1;

union u2 {
    char arr[NAME_LEN];
    double b;
};

static inline int unused(int x) { return x * 2; }
";

fn paddings(meta: &AggregateMeta) -> Vec<u64> {
    meta.layout.iter().map(|row| row.padding).collect()
}

fn names(meta: &AggregateMeta) -> Vec<String> {
    meta.layout.iter().map(|row| row.field.name().to_owned()).collect()
}

#[test]
fn header_scenarios() {
    let index = parse_source(HEADER).unwrap();
    let catalog = TypeCatalog::new();

    let a1 = resolve(&index, &catalog, "struct a1").unwrap();
    assert_eq!((a1.size, a1.alignment), (24, 8));
    assert_eq!(paddings(&a1), vec![0, 1, 0, 4, 0]);

    let a2 = resolve(&index, &catalog, "struct a2").unwrap();
    assert_eq!((a2.size, a2.alignment), (24, 8));
    assert_eq!(paddings(&a2), vec![4, 0, 3, 0]);

    let s1 = resolve(&index, &catalog, "s1").unwrap();
    assert_eq!((s1.size, s1.alignment), (12, 4));
    let nested = s1.layout[1].sub_layout.as_ref().unwrap();
    assert_eq!(nested.iter().map(|row| row.padding).collect::<Vec<_>>(), vec![0, 1]);

    let p1 = resolve(&index, &catalog, "p1").unwrap();
    assert_eq!((p1.size, p1.alignment), (16, 8));
    assert_eq!(paddings(&p1), vec![0, 4]);

    let u2 = resolve(&index, &catalog, "union u2").unwrap();
    assert_eq!((u2.size, u2.alignment), (16, 8));
    // Only the largest member is padded.
    assert_eq!(paddings(&u2), vec![7, 0]);
}

#[test]
fn optimizing_a_parsed_struct() {
    let mut index = parse_source(
        "typedef struct loose { char a; double b; char c; } loose_t;",
    )
    .unwrap();
    let catalog = TypeCatalog::new();

    let before = resolve(&index, &catalog, "loose_t").unwrap();
    let after = optimize(&mut index, &catalog, "loose_t", &before).unwrap();

    assert_eq!(before.size, 24);
    assert_eq!(after.size, 16);
    assert_eq!(names(&after), vec!["b", "a", "c"]);

    // The reorder is visible through the tag as well.
    let through_tag = resolve(&index, &catalog, "struct loose").unwrap();
    assert_eq!(names(&through_tag), vec!["b", "a", "c"]);
}

#[test]
fn anonymous_members_lay_out_inline() {
    let index = parse_source(
        "struct tagged {
            int kind;
            union { char small; double big; };
        };",
    )
    .unwrap();

    let meta = resolve(&index, &TypeCatalog::new(), "struct tagged").unwrap();
    assert_eq!((meta.size, meta.alignment), (16, 8));
    assert_eq!(paddings(&meta), vec![4, 0]);
}

#[test]
fn presets_change_both_sizeof_and_layout() {
    let source = "struct rec { long id; char name[sizeof(long) * 2]; void *next; };";
    let catalog = TypeCatalog::with_preset(Preset::Bits32);
    let index = parse_source_with(source, &catalog).unwrap();

    let meta = resolve(&index, &catalog, "struct rec").unwrap();
    assert_eq!((meta.size, meta.alignment), (16, 4));
}

#[test]
fn forward_references_fail_at_layout_time() {
    let index = parse_source("struct outer { struct missing m; };").unwrap();

    let err = resolve(&index, &TypeCatalog::new(), "struct outer").unwrap_err();
    assert_eq!(
        err,
        LayoutError::SymbolNotFound {
            aggregate: "struct outer".into(),
            symbol: "struct missing".into(),
        }
    );
}

#[test]
fn self_referential_lists_resolve() {
    let index = parse_source(
        "typedef struct node node_t;
         struct node { int value; node_t *next; struct node *prev; };",
    )
    .unwrap();

    let meta = resolve(&index, &TypeCatalog::new(), "node_t").unwrap();
    assert_eq!((meta.size, meta.alignment), (24, 8));
}

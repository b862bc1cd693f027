//! Tests for literals and constructors: numbers, strings, Ion, lists,
//! bags, and structs.

mod common;
use common::*;

use partiql_core::ast::{ExprKind, SeqKind};
use partiql_core::lexer::LiteralValue;

#[test]
fn numeric_literals() {
    assert_int(&parse("42"), 42);
    let node = parse("3.25");
    assert!(matches!(
        node.kind,
        ExprKind::Lit(LiteralValue::Real(x)) if x == 3.25
    ));
}

#[test]
fn string_literal_with_escaped_quote() {
    let node = parse("'it''s'");
    assert!(matches!(
        &node.kind,
        ExprKind::Lit(LiteralValue::Text(s)) if s == "it's"
    ));
}

#[test]
fn boolean_and_null_literals() {
    assert!(matches!(
        parse("TRUE").kind,
        ExprKind::Lit(LiteralValue::Boolean(true))
    ));
    assert!(matches!(parse("NULL").kind, ExprKind::Lit(LiteralValue::Null)));
}

#[test]
fn missing_is_its_own_node() {
    assert!(matches!(parse("MISSING").kind, ExprKind::Missing));
}

#[test]
fn ion_literal_is_opaque() {
    let node = parse("`{a: 1}`");
    assert!(matches!(
        &node.kind,
        ExprKind::Lit(LiteralValue::Ion(s)) if s == "{a: 1}"
    ));
}

#[test]
fn list_literal() {
    let node = parse("[1, 2, 3]");
    match &node.kind {
        ExprKind::Seq { kind, items } => {
            assert_eq!(*kind, SeqKind::List);
            assert_eq!(items.len(), 3);
        }
        other => panic!("Expected list, got {other:?}"),
    }
}

#[test]
fn empty_list_and_bag() {
    assert!(matches!(
        parse("[]").kind,
        ExprKind::Seq { kind: SeqKind::List, ref items } if items.is_empty()
    ));
    assert!(matches!(
        parse("<<>>").kind,
        ExprKind::Seq { kind: SeqKind::Bag, ref items } if items.is_empty()
    ));
}

#[test]
fn bag_literal() {
    let node = parse("<<1, 'a', TRUE>>");
    match &node.kind {
        ExprKind::Seq { kind, items } => {
            assert_eq!(*kind, SeqKind::Bag);
            assert_eq!(items.len(), 3);
        }
        other => panic!("Expected bag, got {other:?}"),
    }
}

#[test]
fn struct_literal() {
    let node = parse("{'a': 1, 'b': [2]}");
    match &node.kind {
        ExprKind::Struct { fields } => {
            assert_eq!(fields.len(), 2);
            assert!(matches!(
                &fields[0].0.kind,
                ExprKind::Lit(LiteralValue::Text(s)) if s == "a"
            ));
        }
        other => panic!("Expected struct, got {other:?}"),
    }
}

#[test]
fn empty_struct() {
    assert!(matches!(
        parse("{}").kind,
        ExprKind::Struct { ref fields } if fields.is_empty()
    ));
}

#[test]
fn nested_constructors() {
    let node = parse("[{'a': <<1>>}]");
    let ExprKind::Seq { items, .. } = &node.kind else {
        panic!("Expected list");
    };
    assert!(matches!(items[0].kind, ExprKind::Struct { .. }));
}

#[test]
fn seq_constructor_calls_fold_to_literals() {
    assert!(matches!(
        parse("list(1, 2)").kind,
        ExprKind::Seq { kind: SeqKind::List, ref items } if items.len() == 2
    ));
    assert!(matches!(
        parse("bag(1)").kind,
        ExprKind::Seq { kind: SeqKind::Bag, ref items } if items.len() == 1
    ));
    assert!(matches!(
        parse("sexp()").kind,
        ExprKind::Seq { kind: SeqKind::Sexp, ref items } if items.is_empty()
    ));
}

#[test]
fn values_rows_build_a_bag_of_lists() {
    let node = parse("VALUES (1, 2), (3, 4)");
    match &node.kind {
        ExprKind::Seq { kind, items } => {
            assert_eq!(*kind, SeqKind::Bag);
            assert_eq!(items.len(), 2);
            assert!(matches!(
                items[0].kind,
                ExprKind::Seq {
                    kind: SeqKind::List,
                    ..
                }
            ));
        }
        other => panic!("Expected bag of rows, got {other:?}"),
    }
}

#[test]
fn negative_number_folding_keeps_reals() {
    let node = parse("-2.5");
    assert!(matches!(
        node.kind,
        ExprKind::Lit(LiteralValue::Real(x)) if x == -2.5
    ));
}

//! Tests for expression operators: precedence, associativity, and the
//! context-sensitive IS / IN / BETWEEN / LIKE forms.

mod common;
use common::*;

use partiql_core::ast::{ExprKind, NAryOp, SeqKind, TypeName, TypedOp};

#[test]
fn multiplication_binds_tighter_than_addition() {
    let node = parse("1 + 2 * 3");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Add);
    assert_int(&operands[0], 1);
    let (inner, factors) = nary(&operands[1]);
    assert_eq!(inner, NAryOp::Mul);
    assert_int(&factors[0], 2);
    assert_int(&factors[1], 3);
}

#[test]
fn subtraction_is_left_associative() {
    let node = parse("10 - 4 - 3");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Sub);
    let (inner, inner_operands) = nary(&operands[0]);
    assert_eq!(inner, NAryOp::Sub);
    assert_int(&inner_operands[0], 10);
    assert_int(&inner_operands[1], 4);
    assert_int(&operands[1], 3);
}

#[test]
fn and_binds_tighter_than_or() {
    let node = parse("a OR b AND c");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Or);
    let (inner, _) = nary(&operands[1]);
    assert_eq!(inner, NAryOp::And);
}

#[test]
fn comparison_binds_tighter_than_and() {
    let node = parse("a = 1 AND b = 2");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::And);
    assert_eq!(nary(&operands[0]).0, NAryOp::Eq);
    assert_eq!(nary(&operands[1]).0, NAryOp::Eq);
}

#[test]
fn concat_sits_between_addition_and_comparison() {
    let node = parse("a + b || c");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Concat);
    assert_eq!(nary(&operands[0]).0, NAryOp::Add);

    let node = parse("a || b = c");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Eq);
    assert_eq!(nary(&operands[0]).0, NAryOp::Concat);
}

#[test]
fn parentheses_override_precedence() {
    let node = parse("(1 + 2) * 3");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Mul);
    assert_eq!(nary(&operands[0]).0, NAryOp::Add);
}

#[test]
fn row_constructor_builds_a_list() {
    let node = parse("(1, 2)");
    match &node.kind {
        ExprKind::Seq { kind, items } => {
            assert_eq!(*kind, SeqKind::List);
            assert_eq!(items.len(), 2);
        }
        other => panic!("Expected list, got {other:?}"),
    }
}

#[test]
fn between_is_a_ternary() {
    let node = parse("a BETWEEN 1 AND 2");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Between);
    assert_eq!(operands.len(), 3);
    assert_var(&operands[0], "a");
    assert_int(&operands[1], 1);
    assert_int(&operands[2], 2);
}

#[test]
fn not_between_rewrites_to_not_with_legacy_meta() {
    let node = parse("a NOT BETWEEN 1 AND 2");
    assert!(node.meta.legacy_logical_not);
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Not);
    let (inner, inner_operands) = nary(&operands[0]);
    assert_eq!(inner, NAryOp::Between);
    assert_eq!(inner_operands.len(), 3);
}

#[test]
fn between_and_does_not_capture_boolean_and() {
    // The AND directly after the BETWEEN bound terminates the ternary;
    // the second AND is the boolean conjunction.
    let node = parse("a BETWEEN 1 AND 2 AND b LIKE 'x%' ESCAPE '\\'");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::And);
    assert_eq!(nary(&operands[0]).0, NAryOp::Between);
    let (like, like_operands) = nary(&operands[1]);
    assert_eq!(like, NAryOp::Like);
    assert_eq!(like_operands.len(), 3);
}

#[test]
fn like_without_escape_is_binary() {
    let node = parse("a LIKE 'x%'");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Like);
    assert_eq!(operands.len(), 2);
}

#[test]
fn not_like_rewrites_to_not() {
    let node = parse("a NOT LIKE 'x%'");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Not);
    assert_eq!(nary(&operands[0]).0, NAryOp::Like);
}

#[test]
fn in_with_parenthesized_values_builds_a_list() {
    let node = parse("x IN (1, 2, 3)");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::In);
    match &operands[1].kind {
        ExprKind::Seq { kind, items } => {
            assert_eq!(*kind, SeqKind::List);
            assert_eq!(items.len(), 3);
        }
        other => panic!("Expected list, got {other:?}"),
    }
}

#[test]
fn in_with_single_value_still_builds_a_list() {
    let node = parse("x IN (1)");
    let (_, operands) = nary(&node);
    assert!(matches!(
        operands[1].kind,
        ExprKind::Seq {
            kind: SeqKind::List,
            ..
        }
    ));
}

#[test]
fn in_with_subquery_falls_through_to_the_query() {
    let node = parse("x IN (SELECT a FROM t)");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::In);
    assert!(matches!(operands[1].kind, ExprKind::Select(_)));
}

#[test]
fn not_in_rewrites_to_not() {
    let node = parse("x NOT IN (1, 2)");
    assert!(node.meta.legacy_logical_not);
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Not);
    assert_eq!(nary(&operands[0]).0, NAryOp::In);
}

#[test]
fn is_takes_a_type_on_the_right() {
    let node = parse("x IS NULL");
    match &node.kind {
        ExprKind::Typed {
            op: TypedOp::Is,
            data_type,
            ..
        } => assert_eq!(data_type.name, TypeName::Null),
        other => panic!("Expected IS, got {other:?}"),
    }
}

#[test]
fn is_not_rewrites_to_not() {
    let node = parse("x IS NOT MISSING");
    assert!(node.meta.legacy_logical_not);
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Not);
    assert!(matches!(
        &operands[0].kind,
        ExprKind::Typed {
            op: TypedOp::Is,
            ..
        }
    ));
}

#[test]
fn unary_minus_folds_into_the_literal() {
    assert_int(&parse("-5"), -5);
    assert_int(&parse("+5"), 5);
}

#[test]
fn unary_minus_on_variable_stays_an_operator() {
    let node = parse("-x");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Neg);
    assert_var(&operands[0], "x");
}

#[test]
fn not_binds_looser_than_comparison() {
    let node = parse("NOT a = b");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::Not);
    assert_eq!(nary(&operands[0]).0, NAryOp::Eq);
}

#[test]
fn union_all_joins_two_queries() {
    let node = parse("SELECT a FROM t UNION ALL SELECT b FROM u");
    let (op, operands) = nary(&node);
    assert_eq!(op, NAryOp::UnionAll);
    assert!(matches!(operands[0].kind, ExprKind::Select(_)));
    assert!(matches!(operands[1].kind, ExprKind::Select(_)));
}

#[test]
fn parameters_carry_ordinals() {
    let node = parse("? + ?");
    let (_, operands) = nary(&node);
    assert!(matches!(operands[0].kind, ExprKind::Parameter { ordinal: 1 }));
    assert!(matches!(operands[1].kind, ExprKind::Parameter { ordinal: 2 }));
}

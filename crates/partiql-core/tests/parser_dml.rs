//! Tests for DML statements: INSERT, SET/UPDATE, REMOVE, DELETE,
//! FROM-prefixed DML, ON CONFLICT, and RETURNING.

mod common;
use common::*;

use partiql_core::ast::{
    ConflictAction, DmlOp, ExprKind, FromSource, NAryOp, ReturningColumn, ReturningMapping,
    SeqKind,
};

#[test]
fn insert_with_values_rows() {
    let dml = parse_dml("INSERT INTO foo VALUES (1, 2), (3, 4)");
    assert_eq!(dml.ops.len(), 1);
    match &dml.ops[0] {
        DmlOp::Insert { target, values } => {
            assert_var(target, "foo");
            assert!(matches!(
                values.kind,
                ExprKind::Seq {
                    kind: SeqKind::Bag,
                    ..
                }
            ));
        }
        other => panic!("Expected INSERT, got {other:?}"),
    }
}

#[test]
fn insert_with_subquery() {
    let dml = parse_dml("INSERT INTO foo SELECT a FROM t");
    assert!(matches!(
        &dml.ops[0],
        DmlOp::Insert { values, .. } if matches!(values.kind, ExprKind::Select(_))
    ));
}

#[test]
fn insert_value_minimal() {
    let dml = parse_dml("INSERT INTO foo VALUE 1");
    match &dml.ops[0] {
        DmlOp::InsertValue {
            target,
            value,
            position,
            on_conflict,
        } => {
            assert_var(target, "foo");
            assert_int(value, 1);
            assert!(position.is_none());
            assert!(on_conflict.is_none());
        }
        other => panic!("Expected INSERT VALUE, got {other:?}"),
    }
}

#[test]
fn insert_value_with_position_conflict_and_returning() {
    let dml = parse_dml(
        "INSERT INTO foo VALUE {'a': 1} AT 0 \
         ON CONFLICT WHERE foo.a = 1 DO NOTHING RETURNING MODIFIED NEW *",
    );
    match &dml.ops[0] {
        DmlOp::InsertValue {
            value,
            position,
            on_conflict,
            ..
        } => {
            assert!(matches!(value.kind, ExprKind::Struct { .. }));
            assert_int(position.as_ref().unwrap(), 0);
            let conflict = on_conflict.as_ref().unwrap();
            assert_eq!(conflict.action, ConflictAction::DoNothing);
            assert!(matches!(
                conflict.condition.kind,
                ExprKind::NAry {
                    op: NAryOp::Eq,
                    ..
                }
            ));
        }
        other => panic!("Expected INSERT VALUE, got {other:?}"),
    }
    assert_eq!(dml.returning.len(), 1);
    assert_eq!(dml.returning[0].mapping, ReturningMapping::ModifiedNew);
    assert!(matches!(dml.returning[0].column, ReturningColumn::Wildcard));
}

#[test]
fn on_conflict_requires_where_and_an_action() {
    assert_eq!(
        error_code("INSERT INTO foo VALUE 1 ON CONFLICT foo.a = 1 DO NOTHING"),
        "expected_keyword"
    );
    assert_eq!(
        error_code("INSERT INTO foo VALUE 1 ON CONFLICT WHERE foo.a = 1"),
        "expected_conflict_action"
    );
}

#[test]
fn bare_set_with_multiple_assignments() {
    let dml = parse_dml("SET x = 1, y.z = 2");
    match &dml.ops[0] {
        DmlOp::Set { assignments } => {
            assert_eq!(assignments.len(), 2);
            assert_var(&assignments[0].target, "x");
            assert_int(&assignments[0].value, 1);
            assert!(matches!(assignments[1].target.kind, ExprKind::Path { .. }));
        }
        other => panic!("Expected SET, got {other:?}"),
    }
}

#[test]
fn set_requires_an_assignment() {
    assert_eq!(error_code("SET"), "missing_set_assignment");
    assert_eq!(error_code("UPDATE foo"), "missing_set_assignment");
}

#[test]
fn set_lvalue_brackets_must_be_literals() {
    let dml = parse_dml("SET a[1] = 2");
    assert!(matches!(&dml.ops[0], DmlOp::Set { .. }));

    assert_eq!(error_code("SET a[b] = 2"), "invalid_path_component");
}

#[test]
fn bare_remove() {
    let dml = parse_dml("REMOVE a.b");
    assert!(matches!(
        &dml.ops[0],
        DmlOp::Remove { target } if matches!(target.kind, ExprKind::Path { .. })
    ));
}

#[test]
fn legacy_update_collects_ops_where_and_returning() {
    let dml = parse_dml("UPDATE foo SET a = 1 REMOVE b WHERE a > 0 RETURNING ALL OLD a");
    assert_eq!(dml.ops.len(), 2);
    assert!(matches!(dml.ops[0], DmlOp::Set { .. }));
    assert!(matches!(dml.ops[1], DmlOp::Remove { .. }));
    match dml.from.as_ref().unwrap() {
        FromSource::Expr { expr, .. } => assert_var(expr, "foo"),
        other => panic!("Expected target source, got {other:?}"),
    }
    assert!(dml.where_clause.is_some());
    assert_eq!(dml.returning.len(), 1);
    assert_eq!(dml.returning[0].mapping, ReturningMapping::AllOld);
}

#[test]
fn update_target_accepts_aliases() {
    let dml = parse_dml("UPDATE foo AS f SET f.a = 1");
    match dml.from.as_ref().unwrap() {
        FromSource::Expr { aliases, .. } => {
            assert_eq!(aliases.as_alias.as_deref(), Some("f"));
        }
        other => panic!("Expected target source, got {other:?}"),
    }
}

#[test]
fn update_accepts_nested_insert_op() {
    let dml = parse_dml("UPDATE foo INSERT INTO foo.bar VALUE 1");
    assert!(matches!(dml.ops[0], DmlOp::InsertValue { .. }));
}

#[test]
fn delete_from_with_alias_and_where() {
    let dml = parse_dml("DELETE FROM y AS z WHERE z.a = 1");
    assert_eq!(dml.ops.len(), 1);
    assert!(matches!(dml.ops[0], DmlOp::Delete));
    match dml.from.as_ref().unwrap() {
        FromSource::Expr { aliases, .. } => {
            assert_eq!(aliases.as_alias.as_deref(), Some("z"));
        }
        other => panic!("Expected target source, got {other:?}"),
    }
    assert!(dml.where_clause.is_some());
}

#[test]
fn delete_requires_from() {
    assert_eq!(error_code("DELETE y"), "expected_keyword");
}

#[test]
fn from_prefixed_dml() {
    let dml = parse_dml("FROM x AT i SET a = 1, b = 2 WHERE a > 0");
    assert!(dml.from.is_some());
    assert!(matches!(
        &dml.ops[0],
        DmlOp::Set { assignments } if assignments.len() == 2
    ));
    assert!(dml.where_clause.is_some());
}

#[test]
fn returning_mappings() {
    let dml = parse_dml(
        "UPDATE foo SET a = 1 \
         RETURNING MODIFIED OLD a, MODIFIED NEW a, ALL OLD b, ALL NEW *",
    );
    let mappings: Vec<_> = dml.returning.iter().map(|e| e.mapping).collect();
    assert_eq!(
        mappings,
        vec![
            ReturningMapping::ModifiedOld,
            ReturningMapping::ModifiedNew,
            ReturningMapping::AllOld,
            ReturningMapping::AllNew,
        ]
    );
}

#[test]
fn returning_path_is_limited_to_two_components() {
    let dml = parse_dml("UPDATE foo SET a = 1 RETURNING MODIFIED OLD a.b");
    assert!(matches!(
        &dml.returning[0].column,
        ReturningColumn::Expr(expr) if matches!(expr.kind, ExprKind::Path { .. })
    ));

    assert_eq!(
        error_code("UPDATE foo SET a = 1 RETURNING MODIFIED OLD a.b.c"),
        "invalid_path_component"
    );
}

#[test]
fn returning_requires_a_mapping() {
    assert_eq!(
        error_code("UPDATE foo SET a = 1 RETURNING a"),
        "expected_keyword"
    );
}

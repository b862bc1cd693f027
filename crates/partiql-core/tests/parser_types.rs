//! Tests for CAST, type parameters, and DATE / TIME literals.

mod common;
use common::*;

use partiql_core::ast::{ExprKind, TypeName, TypedOp};

fn cast_type(source: &str) -> partiql_core::ast::DataType {
    match parse(source).kind {
        ExprKind::Typed {
            op: TypedOp::Cast,
            data_type,
            ..
        } => data_type,
        other => panic!("Expected CAST, got {other:?}"),
    }
}

#[test]
fn cast_to_plain_type() {
    let ty = cast_type("CAST(x AS INT)");
    assert_eq!(ty.name, TypeName::Integer);
    assert!(ty.args.is_empty());
}

#[test]
fn cast_to_parameterized_type() {
    let ty = cast_type("CAST(x AS DECIMAL(10, 2))");
    assert_eq!(ty.name, TypeName::Decimal);
    assert_eq!(ty.args, vec![10, 2]);

    let ty = cast_type("CAST(x AS VARCHAR(5))");
    assert_eq!(ty.name, TypeName::CharacterVarying);
    assert_eq!(ty.args, vec![5]);
}

#[test]
fn cast_arity_is_checked() {
    assert_eq!(error_code("CAST(x AS INT(1))"), "cast_arity_mismatch");
    assert_eq!(
        error_code("CAST(x AS DECIMAL(1, 2, 3))"),
        "cast_arity_mismatch"
    );
}

#[test]
fn type_parameters_must_be_unsigned_integers() {
    assert_eq!(error_code("CAST(x AS VARCHAR(-1))"), "invalid_type_parameter");
    assert_eq!(error_code("CAST(x AS VARCHAR('a'))"), "invalid_type_parameter");
}

#[test]
fn cast_requires_as_and_a_type_name() {
    assert_eq!(error_code("CAST(x INT)"), "expected_token");
    assert_eq!(error_code("CAST(x AS frobnicate)"), "expected_type_name");
}

#[test]
fn time_type_with_time_zone_is_rewritten() {
    let ty = cast_type("CAST(x AS TIME WITH TIME ZONE)");
    assert_eq!(ty.name, TypeName::TimeWithTimeZone);

    let ty = cast_type("CAST(x AS TIME (3) WITH TIME ZONE)");
    assert_eq!(ty.name, TypeName::TimeWithTimeZone);
    assert_eq!(ty.args, vec![3]);
}

#[test]
fn time_type_precision_range() {
    assert_eq!(
        error_code("CAST(x AS TIME (10))"),
        "invalid_precision_for_time"
    );
}

#[test]
fn is_with_core_types() {
    for source in ["x IS BOOLEAN", "x IS STRING", "x IS BAG", "x IS NULL"] {
        let node = parse(source);
        assert!(
            matches!(
                node.kind,
                ExprKind::Typed {
                    op: TypedOp::Is,
                    ..
                }
            ),
            "failed for {source}"
        );
    }
}

#[test]
fn date_literal_extracts_fields() {
    let node = parse("DATE '2021-02-28'");
    match node.kind {
        ExprKind::DateLit(date) => {
            assert_eq!(date.year, 2021);
            assert_eq!(date.month, 2);
            assert_eq!(date.day, 28);
        }
        other => panic!("Expected date literal, got {other:?}"),
    }
}

#[test]
fn date_literal_must_be_calendar_valid() {
    assert_eq!(error_code("DATE '2021-02-30'"), "invalid_date_string");
}

#[test]
fn date_literal_shape_is_strict() {
    assert_eq!(error_code("DATE '+99999-01-01'"), "invalid_date_string");
    assert_eq!(error_code("DATE '2021-2-1'"), "invalid_date_string");
}

#[test]
fn time_literal_derives_precision_from_fraction() {
    let node = parse("TIME '23:59:59.25'");
    match node.kind {
        ExprKind::TimeLit(time) => {
            assert_eq!(time.hour, 23);
            assert_eq!(time.minute, 59);
            assert_eq!(time.second, 59);
            assert_eq!(time.nanosecond, 250_000_000);
            assert_eq!(time.precision, 2);
            assert!(!time.with_time_zone);
            assert!(time.tz_offset_minutes.is_none());
        }
        other => panic!("Expected time literal, got {other:?}"),
    }
}

#[test]
fn time_literal_explicit_precision_wins() {
    let node = parse("TIME (4) '10:00:00.25'");
    match node.kind {
        ExprKind::TimeLit(time) => assert_eq!(time.precision, 4),
        other => panic!("Expected time literal, got {other:?}"),
    }
}

#[test]
fn time_with_time_zone_keeps_explicit_offset() {
    let node = parse("TIME WITH TIME ZONE '10:00:00+05:30'");
    match node.kind {
        ExprKind::TimeLit(time) => {
            assert!(time.with_time_zone);
            assert_eq!(time.tz_offset_minutes, Some(330));
        }
        other => panic!("Expected time literal, got {other:?}"),
    }
}

#[test]
fn zoneless_time_with_time_zone_takes_the_system_offset() {
    let node = parse("TIME WITH TIME ZONE '10:00:00'");
    match node.kind {
        ExprKind::TimeLit(time) => {
            assert!(time.with_time_zone);
            assert!(time.tz_offset_minutes.is_some());
        }
        other => panic!("Expected time literal, got {other:?}"),
    }
}

#[test]
fn time_literal_precision_out_of_range() {
    assert_eq!(error_code("TIME (10) '10:00:00'"), "invalid_precision_for_time");
}

#[test]
fn time_literal_rejects_invalid_strings() {
    assert_eq!(error_code("TIME '24:00:00'"), "invalid_time_string");
    assert_eq!(error_code("TIME '10:00:00+19:00'"), "invalid_time_string");
    assert_eq!(
        error_code("TIME '10:00:00.0123456789'"),
        "invalid_time_string"
    );
}

#[test]
fn extract_and_date_arithmetic_calls() {
    let node = parse("extract(year FROM d)");
    match &node.kind {
        ExprKind::Call { name, args } => {
            assert_eq!(name, "extract");
            assert_eq!(args.len(), 2);
        }
        other => panic!("Expected call, got {other:?}"),
    }

    let node = parse("date_add(hour, 1, ts)");
    match &node.kind {
        ExprKind::Call { name, args } => {
            assert_eq!(name, "date_add");
            assert_eq!(args.len(), 3);
        }
        other => panic!("Expected call, got {other:?}"),
    }
}

#[test]
fn substring_both_spellings() {
    for source in ["substring(s FROM 2 FOR 3)", "substring(s, 2, 3)"] {
        let node = parse(source);
        match &node.kind {
            ExprKind::Call { name, args } => {
                assert_eq!(name, "substring");
                assert_eq!(args.len(), 3, "failed for {source}");
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }
}

#[test]
fn substring_requires_a_delimiter() {
    assert_eq!(error_code("substring(s)"), "expected_argument_delimiter");
}

#[test]
fn trim_forms() {
    for (source, arity) in [
        ("trim(s)", 1),
        ("trim(FROM s)", 1),
        ("trim(both FROM s)", 2),
        ("trim(leading 'x' FROM s)", 3),
        ("trim('x' FROM s)", 2),
    ] {
        let node = parse(source);
        match &node.kind {
            ExprKind::Call { name, args } => {
                assert_eq!(name, "trim");
                assert_eq!(args.len(), arity, "failed for {source}");
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }
}

#[test]
fn trim_specification_requires_from() {
    assert_eq!(error_code("trim(leading s)"), "expected_keyword");
}

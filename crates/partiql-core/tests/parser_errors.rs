//! Tests for the error surface: codes, spans, trailing-token handling,
//! and cooperative interruption.

mod common;
use common::*;

use partiql_core::{InterruptHandle, Parser};

#[test]
fn empty_input() {
    assert_eq!(error_code(""), "expected_expression");
}

#[test]
fn bare_select() {
    assert_eq!(error_code("SELECT"), "expected_expression");
}

#[test]
fn empty_select_list() {
    assert_eq!(error_code("SELECT FROM t"), "unexpected_token");
}

#[test]
fn unclosed_paren() {
    assert_eq!(error_code("(1 + 2"), "expected_2_token_types");
}

#[test]
fn empty_parens_are_not_an_expression() {
    assert_eq!(error_code("()"), "expected_expression");
}

#[test]
fn trailing_tokens_after_statement() {
    assert_eq!(error_code("SELECT a FROM t 1"), "unexpected_token");
}

#[test]
fn extra_tokens_after_semicolon_are_distinguished() {
    assert_eq!(
        error_code("SELECT a FROM t; SELECT b FROM u"),
        "extra_tokens_after_semicolon"
    );
}

#[test]
fn unexpected_keyword_as_statement() {
    assert_eq!(error_code("THEN"), "unexpected_keyword");
}

#[test]
fn unexpected_operator_reports_its_spelling() {
    let err = parse_err("SELECT a FROM t WHERE AND");
    assert_eq!(err.code(), "unexpected_operator");
}

#[test]
fn unterminated_string() {
    assert_eq!(error_code("'abc"), "unterminated_literal");
}

#[test]
fn unexpected_character() {
    assert_eq!(error_code("a ^ b"), "unexpected_character");
}

#[test]
fn case_requires_when_and_then() {
    assert_eq!(error_code("CASE x END"), "expected_keyword");
    assert_eq!(error_code("CASE WHEN a TRUE END"), "expected_keyword");
}

#[test]
fn struct_member_requires_colon() {
    assert_eq!(error_code("{1, 2}"), "expected_token");
}

#[test]
fn between_requires_and() {
    assert_eq!(error_code("a BETWEEN 1 OR 2"), "expected_keyword");
}

#[test]
fn aggregate_argument_rules() {
    assert_eq!(error_code("SUM(a, b)"), "non_unary_aggregate_function_call");
    assert_eq!(error_code("SUM(*)"), "unsupported_call_with_star");
    assert_eq!(error_code("COUNT(DISTINCT *)"), "unsupported_call_with_star");
    assert_eq!(error_code("foo(*)"), "unsupported_call_with_star");
}

#[test]
fn count_star_is_accepted() {
    assert!(matches!(
        parse("COUNT(*)").kind,
        partiql_core::ast::ExprKind::CountStar
    ));
}

#[test]
fn errors_carry_line_and_column() {
    let err = parse_err("SELECT a\nFROM t WHERE");
    let span = err.span();
    assert_eq!(span.line, 2);
    assert!(span.column >= 1);
}

#[test]
fn select_list_alias_must_be_an_identifier() {
    assert_eq!(error_code("SELECT a AS 1 FROM t"), "expected_ident_for_alias");
}

#[test]
fn interrupted_parse_reports_interrupted() {
    let handle = InterruptHandle::new();
    let parser = Parser::with_interrupt(handle.clone());
    handle.interrupt();
    let err = parser.parse_expr_node("SELECT a FROM t").unwrap_err();
    assert_eq!(err.code(), "interrupted");

    // Clearing the flag lets the same parser succeed.
    handle.clear();
    assert!(parser.parse_expr_node("SELECT a FROM t").is_ok());
}

#[test]
fn parenthesized_join_groups_cannot_be_aliased() {
    assert_eq!(
        error_code("SELECT x FROM (a, b) AS ab"),
        "unsupported_syntax"
    );
}

#[test]
fn first_error_stops_the_parse() {
    // The bad GROUP BY literal is reported even though a later clause
    // is also malformed.
    assert_eq!(
        error_code("SELECT a FROM t GROUP BY 1 HAVING"),
        "unsupported_literals_group_by"
    );
}

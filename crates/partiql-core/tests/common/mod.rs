#![allow(dead_code)]

use partiql_core::ast::{Dml, ExprKind, ExprNode, Select};
use partiql_core::{ParseError, Parser};

pub fn parse(source: &str) -> ExprNode {
    Parser::new()
        .parse_expr_node(source)
        .unwrap_or_else(|e| panic!("Failed to parse: {source}\nError: {e:?}"))
}

pub fn parse_err(source: &str) -> ParseError {
    Parser::new()
        .parse_expr_node(source)
        .expect_err(&format!("Expected parse error for: {source}"))
}

pub fn error_code(source: &str) -> &'static str {
    parse_err(source).code()
}

pub fn parse_select(source: &str) -> Select {
    match parse(source).kind {
        ExprKind::Select(select) => *select,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

pub fn parse_dml(source: &str) -> Dml {
    match parse(source).kind {
        ExprKind::Dml(dml) => *dml,
        other => panic!("Expected DML, got {other:?}"),
    }
}

pub fn sexp(source: &str) -> String {
    Parser::new()
        .parse(source)
        .unwrap_or_else(|e| panic!("Failed to parse: {source}\nError: {e:?}"))
        .to_string()
}

/// Unwraps an n-ary operator application.
pub fn nary(node: &ExprNode) -> (partiql_core::ast::NAryOp, &[ExprNode]) {
    match &node.kind {
        ExprKind::NAry { op, operands } => (*op, operands.as_slice()),
        other => panic!("Expected operator application, got {other:?}"),
    }
}

/// Asserts that a node is a case-insensitive unqualified variable.
pub fn assert_var(node: &ExprNode, name: &str) {
    match &node.kind {
        ExprKind::VarRef {
            name: actual,
            case: partiql_core::ast::CaseSensitivity::CaseInsensitive,
            qualifier: partiql_core::ast::ScopeQualifier::Unqualified,
        } => assert_eq!(actual, name),
        other => panic!("Expected variable `{name}`, got {other:?}"),
    }
}

/// Asserts that a node is an integer literal.
pub fn assert_int(node: &ExprNode, value: i64) {
    match &node.kind {
        ExprKind::Lit(partiql_core::lexer::LiteralValue::Integer(actual)) => {
            assert_eq!(*actual, value);
        }
        other => panic!("Expected integer {value}, got {other:?}"),
    }
}

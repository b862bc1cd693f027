//! Operator precedence table for the Pratt expression parser.

use crate::lexer::{Token, TokenKind};

/// Minimum precedence passed at the top level of an expression.
pub const TOP_LEVEL: i32 = -1;

/// Prefix `+` / `-`.
pub const UNARY: i32 = 50;
/// `*`, `/`, `%`.
pub const MULTIPLY: i32 = 45;
/// Infix `+`, `-`.
pub const ADDITION: i32 = 40;
/// `||`.
pub const CONCAT: i32 = 35;
/// `<`, `<=`, `>`, `>=`, `=`, `<>`.
pub const COMPARISON: i32 = 30;
/// `is`, `like`, `between`, `in` and their negated forms.
pub const TYPE_TEST: i32 = 25;
/// Prefix boolean `not`.
pub const LOGICAL_NOT: i32 = 20;
/// `and`.
pub const LOGICAL_AND: i32 = 15;
/// `or`.
pub const LOGICAL_OR: i32 = 10;
/// `union`, `intersect`, `except` and their ALL forms.
pub const SET: i32 = 5;

/// Set operators, accepted by the query-level expression parser.
const QUERY_OPERATORS: &[&str] = &[
    "except",
    "except_all",
    "intersect",
    "intersect_all",
    "union",
    "union_all",
];

/// Returns the prefix precedence of a token, or `None` if the token
/// is not a unary operator.
#[must_use]
pub fn prefix_precedence(token: &Token) -> Option<i32> {
    if token.kind != TokenKind::Operator {
        return None;
    }
    match token.text()? {
        "+" | "-" => Some(UNARY),
        "not" => Some(LOGICAL_NOT),
        _ => None,
    }
}

/// Returns the infix precedence of a token, or `None` if the token
/// is not a binary operator.
///
/// All binary operators are left-associative: the parser consumes an
/// operator only while its precedence strictly exceeds the caller's
/// minimum and parses the right-hand side at the operator's own level.
#[must_use]
pub fn infix_precedence(token: &Token) -> Option<i32> {
    if token.kind == TokenKind::Star {
        return Some(MULTIPLY);
    }
    if token.kind != TokenKind::Operator {
        return None;
    }
    match token.text()? {
        "/" | "%" => Some(MULTIPLY),
        "+" | "-" => Some(ADDITION),
        "||" => Some(CONCAT),
        "<" | "<=" | ">" | ">=" | "=" | "<>" => Some(COMPARISON),
        "is" | "is_not" | "like" | "not_like" | "between" | "not_between" | "in" | "not_in" => {
            Some(TYPE_TEST)
        }
        "and" => Some(LOGICAL_AND),
        "or" => Some(LOGICAL_OR),
        "union" | "union_all" | "intersect" | "intersect_all" | "except" | "except_all" => Some(SET),
        _ => None,
    }
}

/// Returns true if the token is a unary operator.
#[must_use]
pub fn is_unary_operator(token: &Token) -> bool {
    prefix_precedence(token).is_some()
}

/// Returns true if the token is a binary operator.
#[must_use]
pub fn is_binary_operator(token: &Token) -> bool {
    infix_precedence(token).is_some()
}

/// Returns true if the token is a query-level (set) operator.
#[must_use]
pub fn is_query_operator(token: &Token) -> bool {
    token.kind == TokenKind::Operator
        && token
            .text()
            .is_some_and(|t| QUERY_OPERATORS.binary_search(&t).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    fn op(text: &str) -> Token {
        Token::with_text(TokenKind::Operator, text, Span::default())
    }

    #[test]
    fn test_precedence_ordering() {
        let mul = infix_precedence(&op("/")).unwrap();
        let add = infix_precedence(&op("+")).unwrap();
        let concat = infix_precedence(&op("||")).unwrap();
        let cmp = infix_precedence(&op("=")).unwrap();
        let between = infix_precedence(&op("between")).unwrap();
        let and = infix_precedence(&op("and")).unwrap();
        let or = infix_precedence(&op("or")).unwrap();
        let union = infix_precedence(&op("union")).unwrap();

        assert!(mul > add);
        assert!(add > concat);
        assert!(concat > cmp);
        assert!(cmp > between);
        assert!(between > and);
        assert!(and > or);
        assert!(or > union);
        assert!(union > TOP_LEVEL);
    }

    #[test]
    fn test_star_is_multiplication() {
        let star = Token::new(TokenKind::Star, Span::default());
        assert_eq!(infix_precedence(&star), Some(MULTIPLY));
    }

    #[test]
    fn test_prefix_not_binds_above_and() {
        let not = prefix_precedence(&op("not")).unwrap();
        let and = infix_precedence(&op("and")).unwrap();
        let cmp = infix_precedence(&op("=")).unwrap();
        assert!(not > and);
        assert!(cmp > not);
    }

    #[test]
    fn test_unary_classification() {
        assert!(is_unary_operator(&op("-")));
        assert!(is_unary_operator(&op("not")));
        assert!(!is_unary_operator(&op("/")));
    }

    #[test]
    fn test_query_operator_classification() {
        assert!(is_query_operator(&op("union_all")));
        assert!(is_query_operator(&op("except")));
        assert!(!is_query_operator(&op("and")));
    }
}

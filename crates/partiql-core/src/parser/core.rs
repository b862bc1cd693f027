//! The recursive-descent parser producing the intermediate parse tree.
//!
//! Statements and clauses are parsed by dedicated methods; expressions
//! use a Pratt (top-down operator precedence) loop with
//! context-sensitive right-hand rules for IS, IN, BETWEEN, and LIKE.
//! Every sub-parser is a pure function of a [`TokenView`]: it returns a
//! [`ParseNode`] whose `remaining` view is the unconsumed suffix of its
//! input.

use crate::lexer::{LiteralValue, Token, TokenKind};

use super::error::ParseError;
use super::node::{NodeKind, ParseNode};
use super::pratt;
use super::types;
use super::view::TokenView;
use super::InterruptHandle;

type ParseResult<'a> = Result<ParseNode<'a>, ParseError>;

/// Path parsing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PathMode {
    /// All components allowed.
    Full,
    /// No wildcard or unpivot components; identifier root only.
    Query,
    /// DML lvalues: identifier root, literal-only bracket components.
    Simple,
}

/// Aggregate function names (exactly one argument, optional DISTINCT).
const AGGREGATE_NAMES: &[&str] = &["any", "avg", "count", "every", "max", "min", "some", "sum"];

/// Keywords that name ordinary functions.
const FUNCTION_KEYWORDS: &[&str] = &[
    "bag",
    "char_length",
    "character_length",
    "coalesce",
    "exists",
    "list",
    "lower",
    "nullif",
    "octet_length",
    "sexp",
    "size",
    "upper",
];

/// One parsing pass over a token sequence.
pub(super) struct Session<'s> {
    /// Cooperative interrupt flag, checked at each expression entry.
    pub(super) interrupt: Option<&'s InterruptHandle>,
}

impl Session<'_> {
    // === Statement entry ===

    /// Parses one statement and rejects trailing tokens.
    pub(super) fn parse_statement_tree<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let node = self.parse_expression(view, pratt::TOP_LEVEL)?;
        let mut rest = node.remaining;
        if rest.only_end_of_statement() {
            return Ok(node);
        }
        let mut saw_semicolon = false;
        while rest.kind() == TokenKind::Semicolon {
            saw_semicolon = true;
            rest = rest.tail();
        }
        if saw_semicolon {
            Err(ParseError::ExtraTokensAfterSemicolon { span: rest.span() })
        } else {
            Err(unexpected(rest))
        }
    }

    // === Expressions (Pratt) ===

    /// Parses an expression at the given minimum precedence.
    ///
    /// Consumes infix operators only while their precedence strictly
    /// exceeds `min_prec`; the right-hand side is parsed at the
    /// operator's own level, which makes every operator
    /// left-associative.
    pub(super) fn parse_expression<'a>(
        &self,
        view: TokenView<'a>,
        min_prec: i32,
    ) -> ParseResult<'a> {
        self.check_interrupt(view)?;
        let mut node = self.parse_unary(view)?;
        loop {
            let rest = node.remaining;
            if !rest.is_binary_operator() {
                break;
            }
            let prec = rest.infix_precedence().expect("binary operator precedence");
            if prec <= min_prec {
                break;
            }
            node = self.parse_infix(node, prec)?;
        }
        Ok(node)
    }

    /// Parses a query-level expression: a term joined only by set
    /// operators. Used for WITH bindings and the WITH body so that
    /// recursive references resolve per query, not per operand.
    pub(super) fn parse_query_expression<'a>(
        &self,
        view: TokenView<'a>,
        min_prec: i32,
    ) -> ParseResult<'a> {
        self.check_interrupt(view)?;
        let mut node = self.parse_unary(view)?;
        loop {
            let rest = node.remaining;
            if !rest.head().is_some_and(pratt::is_query_operator) {
                break;
            }
            let Some(prec) = rest.infix_precedence() else {
                break;
            };
            if prec <= min_prec {
                break;
            }
            node = self.parse_infix(node, prec)?;
        }
        Ok(node)
    }

    /// Parses one infix operator application with `lhs` on the left.
    fn parse_infix<'a>(&self, lhs: ParseNode<'a>, prec: i32) -> ParseResult<'a> {
        let view = lhs.remaining;
        let op = view
            .head()
            .cloned()
            .ok_or(ParseError::ExpectedExpression { span: view.span() })?;
        let rest = view.tail();

        match op.text().unwrap_or_default() {
            // The right-hand side of IS is a type, not an expression.
            "is" | "is_not" => {
                let ty = types::parse_type(rest)?;
                let remaining = ty.remaining;
                Ok(ParseNode::with_token(NodeKind::Binary, op, remaining)
                    .with_children(vec![lhs, ty]))
            }
            // A parenthesized IN list is a LIST literal unless it opens
            // a sub-query.
            "in" | "not_in" => {
                let in_list = rest.kind() == TokenKind::LeftParen
                    && !rest
                        .nth(1)
                        .is_some_and(|t| t.is_keyword("select") || t.is_keyword("values"));
                let rhs = if in_list {
                    self.parse_paren_list(rest)?
                } else {
                    self.parse_expression(rest, prec)?
                };
                let remaining = rhs.remaining;
                Ok(ParseNode::with_token(NodeKind::Binary, op, remaining)
                    .with_children(vec![lhs, rhs]))
            }
            // BETWEEN requires `AND` and a third operand at the same
            // precedence.
            "between" | "not_between" => {
                let low = self.parse_expression(rest, prec)?;
                let after_and = low.remaining.expect_operator("and")?;
                let high = self.parse_expression(after_and, prec)?;
                let remaining = high.remaining;
                Ok(ParseNode::with_token(NodeKind::Ternary, op, remaining)
                    .with_children(vec![lhs, low, high]))
            }
            // LIKE takes an optional ESCAPE operand.
            "like" | "not_like" => {
                let pattern = self.parse_expression(rest, prec)?;
                if pattern.remaining.is_keyword("escape") {
                    let escape = self.parse_expression(pattern.remaining.tail(), prec)?;
                    let remaining = escape.remaining;
                    Ok(ParseNode::with_token(NodeKind::Ternary, op, remaining)
                        .with_children(vec![lhs, pattern, escape]))
                } else {
                    let remaining = pattern.remaining;
                    Ok(ParseNode::with_token(NodeKind::Binary, op, remaining)
                        .with_children(vec![lhs, pattern]))
                }
            }
            _ => {
                let rhs = self.parse_expression(rest, prec)?;
                let remaining = rhs.remaining;
                Ok(ParseNode::with_token(NodeKind::Binary, op, remaining)
                    .with_children(vec![lhs, rhs]))
            }
        }
    }

    /// Parses a unary term: a prefix operator application or a path term.
    fn parse_unary<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        if !view.is_unary_operator() {
            return self.parse_path_term(view, PathMode::Full);
        }
        let prec = view.prefix_precedence().expect("unary operator precedence");
        let op = view.head().expect("prefix operator token").clone();
        let operand = self.parse_expression(view.tail(), prec)?;

        // Fold +/- applied directly to a numeric literal.
        let sign = op.text().unwrap_or_default();
        if (sign == "+" || sign == "-") && is_numeric_atom(&operand) {
            if sign == "+" {
                return Ok(operand);
            }
            return Ok(negate_literal(operand));
        }

        let remaining = operand.remaining;
        Ok(ParseNode::with_token(NodeKind::Unary, op, remaining).with_children(vec![operand]))
    }

    // === Paths ===

    /// Parses a term followed by path components.
    fn parse_path_term<'a>(&self, view: TokenView<'a>, mode: PathMode) -> ParseResult<'a> {
        let root = match mode {
            PathMode::Full => self.parse_term(view)?,
            PathMode::Query | PathMode::Simple => match view.kind() {
                TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                    let token = view.head().expect("identifier token").clone();
                    atom(token, view.tail())
                }
                found => {
                    return Err(ParseError::ExpectedToken {
                        expected: TokenKind::Identifier,
                        found,
                        span: view.span(),
                    });
                }
            },
        };

        let mut components: Vec<ParseNode<'a>> = Vec::new();
        let mut rest = root.remaining;
        loop {
            match rest.kind() {
                TokenKind::Dot => {
                    let after = rest.tail();
                    let token = after.head().cloned();
                    match after.kind() {
                        TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                            let token = token.expect("identifier token");
                            let next = after.tail();
                            let child = atom(token, next);
                            components.push(
                                ParseNode::new(NodeKind::PathDot, next)
                                    .with_children(vec![child]),
                            );
                            rest = next;
                        }
                        TokenKind::Star if mode == PathMode::Full => {
                            let next = after.tail();
                            components.push(ParseNode::with_token(
                                NodeKind::PathUnpivot,
                                token.expect("star token"),
                                next,
                            ));
                            rest = next;
                        }
                        _ => {
                            return Err(ParseError::InvalidPathComponent { span: after.span() });
                        }
                    }
                }
                TokenKind::LeftBracket => {
                    let after = rest.tail();
                    if after.kind() == TokenKind::Star
                        && after.nth(1).is_some_and(|t| t.kind == TokenKind::RightBracket)
                    {
                        if mode != PathMode::Full {
                            return Err(ParseError::InvalidPathComponent { span: after.span() });
                        }
                        let star = after.head().expect("star token").clone();
                        let next = after.tail().tail();
                        components.push(ParseNode::with_token(NodeKind::PathWildcard, star, next));
                        rest = next;
                    } else {
                        let index = self.parse_expression(after, pratt::TOP_LEVEL)?;
                        if mode == PathMode::Simple && !is_literal_atom(&index) {
                            return Err(ParseError::InvalidPathComponent { span: index.span() });
                        }
                        let (_, next) = index.remaining.expect(TokenKind::RightBracket)?;
                        components.push(
                            ParseNode::new(NodeKind::PathSqb, next).with_children(vec![index]),
                        );
                        rest = next;
                    }
                }
                _ => break,
            }
        }

        if components.is_empty() {
            return Ok(root);
        }
        let mut children = Vec::with_capacity(components.len() + 1);
        children.push(root);
        children.extend(components);
        Ok(ParseNode::new(NodeKind::Path, rest).with_children(children))
    }

    // === Terms ===

    /// Parses a term, dispatching on the head token.
    fn parse_term<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        match view.kind() {
            TokenKind::Operator if view.is_operator("@") => {
                let at = view.head().expect("@ token").clone();
                let after = view.tail();
                match after.kind() {
                    TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                        let name = after.head().expect("identifier token").clone();
                        let next = after.tail();
                        let child = atom(name, next);
                        Ok(ParseNode::with_token(NodeKind::Unary, at, next)
                            .with_children(vec![child]))
                    }
                    _ => Err(ParseError::MissingIdentAfterAt { span: view.span() }),
                }
            }
            TokenKind::Keyword => self.parse_keyword_term(view),
            TokenKind::LeftParen => self.parse_paren_term(view),
            TokenKind::LeftBracket => {
                self.parse_seq_literal(view, TokenKind::RightBracket, NodeKind::List)
            }
            TokenKind::LeftDoubleAngle => {
                self.parse_seq_literal(view, TokenKind::RightDoubleAngle, NodeKind::Bag)
            }
            TokenKind::LeftCurly => self.parse_struct_literal(view),
            TokenKind::Identifier => {
                let token = view.head().expect("identifier token").clone();
                if view.nth(1).is_some_and(|t| t.kind == TokenKind::LeftParen) {
                    self.parse_call(token, view.tail())
                } else {
                    Ok(atom(token, view.tail()))
                }
            }
            TokenKind::QuotedIdentifier => {
                let token = view.head().expect("identifier token").clone();
                Ok(atom(token, view.tail()))
            }
            TokenKind::QuestionMark => {
                let token = view.head().expect("parameter token").clone();
                Ok(ParseNode::with_token(
                    NodeKind::Parameter,
                    token,
                    view.tail(),
                ))
            }
            TokenKind::Literal
            | TokenKind::IonLiteral
            | TokenKind::Null
            | TokenKind::Missing
            | TokenKind::TrimSpecification => {
                let token = view.head().expect("literal token").clone();
                Ok(atom(token, view.tail()))
            }
            TokenKind::Operator => Err(ParseError::UnexpectedOperator {
                operator: String::from(view.text().unwrap_or_default()),
                span: view.span(),
            }),
            _ => Err(ParseError::ExpectedExpression { span: view.span() }),
        }
    }

    /// Parses a keyword-introduced term.
    fn parse_keyword_term<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let keyword = view.text().unwrap_or_default();
        match keyword {
            "select" => self.parse_select(view),
            "pivot" => self.parse_pivot(view),
            "with" => self.parse_with(view),
            "case" => self.parse_case(view),
            "cast" => self.parse_cast(view),
            "values" => self.parse_values(view),
            "substring" => self.parse_substring(view),
            "trim" => self.parse_trim(view),
            "extract" => self.parse_extract(view),
            "date_add" | "date_diff" => self.parse_date_function(view),
            "date" => self.parse_date_literal(view),
            "time" => self.parse_time_literal(view),
            "exec" => self.parse_exec(view),
            "insert_into" => self.parse_insert_statement(view),
            "set" => self.parse_set_statement(view),
            "update" => self.parse_update_statement(view),
            "remove" => self.parse_remove_statement(view),
            "delete" => self.parse_delete_statement(view),
            "from" => self.parse_from_dml_statement(view),
            "create" => self.parse_create(view),
            "drop" => self.parse_drop(view),
            _ if AGGREGATE_NAMES.binary_search(&keyword).is_ok() => {
                let token = view.head().expect("keyword token").clone();
                self.parse_aggregate_call(token, view.tail())
            }
            _ if FUNCTION_KEYWORDS.binary_search(&keyword).is_ok() => {
                let token = view.head().expect("keyword token").clone();
                self.parse_call(token, view.tail())
            }
            _ => Err(ParseError::UnexpectedKeyword {
                keyword: String::from(keyword),
                span: view.span(),
            }),
        }
    }

    /// Parses `( expr, ... )` as grouping (one element) or a row
    /// constructor (several).
    fn parse_paren_term<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let list = self.parse_paren_list(view)?;
        if list.children.len() == 1 {
            let remaining = list.remaining;
            let inner = list.children.into_iter().next().expect("one element");
            Ok(inner.with_remaining(remaining))
        } else {
            Ok(list)
        }
    }

    /// Parses `( expr, ... )` always producing a LIST node.
    ///
    /// Zero elements is an error: `()` cannot start an expression.
    fn parse_paren_list<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let (_, mut rest) = view.expect(TokenKind::LeftParen)?;
        if rest.kind() == TokenKind::RightParen {
            return Err(ParseError::ExpectedExpression { span: rest.span() });
        }
        let mut items = Vec::new();
        loop {
            let item = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            rest = item.remaining;
            items.push(item);
            match rest.kind() {
                TokenKind::Comma => rest = rest.tail(),
                TokenKind::RightParen => {
                    rest = rest.tail();
                    break;
                }
                found => {
                    return Err(ParseError::Expected2TokenTypes {
                        first: TokenKind::Comma,
                        second: TokenKind::RightParen,
                        found,
                        span: rest.span(),
                    });
                }
            }
        }
        Ok(ParseNode::new(NodeKind::List, rest).with_children(items))
    }

    /// Parses a list (`[...]`) or bag (`<< ... >>`) literal.
    fn parse_seq_literal<'a>(
        &self,
        view: TokenView<'a>,
        close: TokenKind,
        kind: NodeKind,
    ) -> ParseResult<'a> {
        let mut rest = view.tail();
        let mut items = Vec::new();
        if rest.kind() == close {
            return Ok(ParseNode::new(kind, rest.tail()));
        }
        loop {
            let item = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            rest = item.remaining;
            items.push(item);
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else if rest.kind() == close {
                rest = rest.tail();
                break;
            } else {
                return Err(ParseError::Expected2TokenTypes {
                    first: TokenKind::Comma,
                    second: close,
                    found: rest.kind(),
                    span: rest.span(),
                });
            }
        }
        Ok(ParseNode::new(kind, rest).with_children(items))
    }

    /// Parses a struct literal: `{ key: value, ... }`.
    fn parse_struct_literal<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view.tail();
        let mut members = Vec::new();
        if rest.kind() == TokenKind::RightCurly {
            return Ok(ParseNode::new(NodeKind::Struct, rest.tail()));
        }
        loop {
            let key = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            let (_, after_colon) = key.remaining.expect(TokenKind::Colon)?;
            let value = self.parse_expression(after_colon, pratt::TOP_LEVEL)?;
            rest = value.remaining;
            members.push(
                ParseNode::new(NodeKind::Member, rest).with_children(vec![key, value]),
            );
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else if rest.kind() == TokenKind::RightCurly {
                rest = rest.tail();
                break;
            } else {
                return Err(ParseError::Expected2TokenTypes {
                    first: TokenKind::Comma,
                    second: TokenKind::RightCurly,
                    found: rest.kind(),
                    span: rest.span(),
                });
            }
        }
        Ok(ParseNode::new(NodeKind::Struct, rest).with_children(members))
    }

    // === Calls ===

    /// Parses a regular call: `name ( args )`.
    fn parse_call<'a>(&self, name: Token, view: TokenView<'a>) -> ParseResult<'a> {
        let (_, mut rest) = view.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if rest.kind() == TokenKind::RightParen {
            return Ok(ParseNode::with_token(NodeKind::Call, name, rest.tail()));
        }
        loop {
            if rest.kind() == TokenKind::Star {
                return Err(ParseError::UnsupportedCallWithStar {
                    name: name.text().unwrap_or_default().to_ascii_lowercase(),
                    span: rest.span(),
                });
            }
            let arg = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            rest = arg.remaining;
            args.push(arg);
            match rest.kind() {
                TokenKind::Comma => rest = rest.tail(),
                TokenKind::RightParen => {
                    rest = rest.tail();
                    break;
                }
                found => {
                    return Err(ParseError::Expected2TokenTypes {
                        first: TokenKind::Comma,
                        second: TokenKind::RightParen,
                        found,
                        span: rest.span(),
                    });
                }
            }
        }
        Ok(ParseNode::with_token(NodeKind::Call, name, rest).with_children(args))
    }

    /// Parses an aggregate call with its ALL/DISTINCT quantifier.
    ///
    /// `COUNT(*)` is the only `*` form; every aggregate takes exactly
    /// one argument.
    fn parse_aggregate_call<'a>(&self, name: Token, view: TokenView<'a>) -> ParseResult<'a> {
        let (_, rest) = view.expect(TokenKind::LeftParen)?;
        let agg_name = name.text().unwrap_or_default().to_ascii_lowercase();

        if agg_name == "count" && rest.kind() == TokenKind::Star {
            let (_, after) = rest.tail().expect(TokenKind::RightParen)?;
            return Ok(ParseNode::with_token(NodeKind::CallAggWildcard, name, after));
        }

        let (distinct, rest) = if rest.is_keyword("distinct") {
            (true, rest.tail())
        } else if rest.is_keyword("all") {
            (false, rest.tail())
        } else {
            (false, rest)
        };

        if rest.kind() == TokenKind::Star {
            return Err(ParseError::UnsupportedCallWithStar {
                name: agg_name,
                span: rest.span(),
            });
        }

        let arg = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        match arg.remaining.kind() {
            TokenKind::RightParen => {}
            TokenKind::Comma => {
                return Err(ParseError::NonUnaryAggregateFunctionCall {
                    name: agg_name,
                    span: arg.remaining.span(),
                });
            }
            found => {
                return Err(ParseError::ExpectedToken {
                    expected: TokenKind::RightParen,
                    found,
                    span: arg.remaining.span(),
                });
            }
        }
        let remaining = arg.remaining.tail();
        let kind = if distinct {
            NodeKind::CallDistinctAgg
        } else {
            NodeKind::CallAgg
        };
        Ok(ParseNode::with_token(kind, name, remaining).with_children(vec![arg]))
    }

    /// Parses `substring(s FROM p [FOR l])` or `substring(s, p [, l])`.
    fn parse_substring<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let name = view.head().expect("substring token").clone();
        let (_, rest) = view.tail().expect(TokenKind::LeftParen)?;
        let source = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        let mut args = Vec::new();
        let mut rest = source.remaining;
        args.push(source);

        if rest.is_keyword("from") {
            let start = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = start.remaining;
            args.push(start);
            if rest.kind() == TokenKind::For {
                let length = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
                rest = length.remaining;
                args.push(length);
            }
        } else if rest.kind() == TokenKind::Comma {
            let start = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = start.remaining;
            args.push(start);
            if rest.kind() == TokenKind::Comma {
                let length = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
                rest = length.remaining;
                args.push(length);
            }
        } else {
            return Err(ParseError::ExpectedArgumentDelimiter { span: rest.span() });
        }

        let (_, remaining) = rest.expect(TokenKind::RightParen)?;
        Ok(ParseNode::with_token(NodeKind::Call, name, remaining).with_children(args))
    }

    /// Parses `trim([[spec] [chars] FROM] source)`.
    fn parse_trim<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let name = view.head().expect("trim token").clone();
        let (_, mut rest) = view.tail().expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();

        let has_spec = rest.kind() == TokenKind::TrimSpecification;
        if has_spec {
            let spec = rest.head().expect("trim specification").clone();
            rest = rest.tail();
            args.push(ParseNode::with_token(NodeKind::Atom, spec, rest));
        }

        if rest.is_keyword("from") {
            let source = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = source.remaining;
            args.push(source);
        } else {
            let first = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            rest = first.remaining;
            if rest.is_keyword("from") {
                let source = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
                rest = source.remaining;
                args.push(first);
                args.push(source);
            } else if has_spec {
                return Err(ParseError::ExpectedKeyword {
                    keyword: String::from("from"),
                    span: rest.span(),
                });
            } else {
                args.push(first);
            }
        }

        let (_, remaining) = rest.expect(TokenKind::RightParen)?;
        Ok(ParseNode::with_token(NodeKind::Call, name, remaining).with_children(args))
    }

    /// Parses `extract(date_part FROM expr)`.
    fn parse_extract<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let name = view.head().expect("extract token").clone();
        let (_, rest) = view.tail().expect(TokenKind::LeftParen)?;
        let (part, rest) = rest.expect(TokenKind::DatePart)?;
        let part_node = ParseNode::with_token(NodeKind::Atom, part.clone(), rest);
        let rest = rest.expect_keyword("from")?;
        let source = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        let (_, remaining) = source.remaining.expect(TokenKind::RightParen)?;
        Ok(ParseNode::with_token(NodeKind::Call, name, remaining)
            .with_children(vec![part_node, source]))
    }

    /// Parses `date_add(date_part, a, b)` / `date_diff(date_part, a, b)`.
    fn parse_date_function<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let name = view.head().expect("date function token").clone();
        let (_, rest) = view.tail().expect(TokenKind::LeftParen)?;
        let (part, rest) = rest.expect(TokenKind::DatePart)?;
        let part_node = ParseNode::with_token(NodeKind::Atom, part.clone(), rest);
        let (_, rest) = rest.expect(TokenKind::Comma)?;
        let first = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        let (_, rest) = first.remaining.expect(TokenKind::Comma)?;
        let second = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        let (_, remaining) = second.remaining.expect(TokenKind::RightParen)?;
        Ok(ParseNode::with_token(NodeKind::Call, name, remaining)
            .with_children(vec![part_node, first, second]))
    }

    /// Parses `DATE 'YYYY-MM-DD'`.
    fn parse_date_literal<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let rest = view.tail();
        let Some(literal) = rest.head().filter(|t| {
            t.kind == TokenKind::Literal && t.value.as_ref().is_some_and(LiteralValue::is_text)
        }) else {
            return Err(ParseError::ExpectedToken {
                expected: TokenKind::Literal,
                found: rest.kind(),
                span: rest.span(),
            });
        };
        let text = literal
            .value
            .as_ref()
            .and_then(LiteralValue::as_str)
            .unwrap_or_default();
        types::validate_date(text, literal.span)?;
        Ok(ParseNode::with_token(
            NodeKind::Date,
            literal.clone(),
            rest.tail(),
        ))
    }

    /// Parses `TIME [(p)] [WITH TIME ZONE] 'HH:MM:SS[.frac][±HH:MM]'`.
    fn parse_time_literal<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view.tail();
        let mut precision_node = None;
        let mut precision = None;

        if rest.kind() == TokenKind::LeftParen {
            let inner = rest.tail();
            let value = inner
                .head()
                .filter(|t| t.kind == TokenKind::Literal)
                .and_then(|t| t.value.as_ref())
                .and_then(LiteralValue::as_i64);
            match value {
                Some(p) if (0..=9).contains(&p) => {
                    let token = inner.head().expect("precision token").clone();
                    let (_, after) = inner.tail().expect(TokenKind::RightParen)?;
                    precision_node =
                        Some(ParseNode::with_token(NodeKind::Precision, token, after));
                    precision = Some(p as u32);
                    rest = after;
                }
                _ => {
                    return Err(ParseError::InvalidPrecisionForTime { span: inner.span() });
                }
            }
        }

        let with_time_zone = rest.is_keyword("with");
        if with_time_zone {
            rest = rest.tail().expect_keyword("time")?.expect_keyword("zone")?;
        }

        let Some(literal) = rest.head().filter(|t| {
            t.kind == TokenKind::Literal && t.value.as_ref().is_some_and(LiteralValue::is_text)
        }) else {
            return Err(ParseError::ExpectedToken {
                expected: TokenKind::Literal,
                found: rest.kind(),
                span: rest.span(),
            });
        };
        let text = literal
            .value
            .as_ref()
            .and_then(LiteralValue::as_str)
            .unwrap_or_default();
        types::validate_time(text, precision, with_time_zone, literal.span)?;

        let kind = if with_time_zone {
            NodeKind::TimeWithTimeZone
        } else {
            NodeKind::Time
        };
        let mut node = ParseNode::with_token(kind, literal.clone(), rest.tail());
        if let Some(precision_node) = precision_node {
            node = node.with_children(vec![precision_node]);
        }
        Ok(node)
    }

    /// Parses a CASE expression (simple or searched).
    fn parse_case<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let case_token = view.head().expect("case token").clone();
        let mut rest = view.tail();
        let mut children = Vec::new();

        if !rest.is_keyword("when") {
            let operand = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            rest = operand.remaining;
            children.push(operand);
        }

        if !rest.is_keyword("when") {
            return Err(ParseError::ExpectedKeyword {
                keyword: String::from("when"),
                span: rest.span(),
            });
        }
        while rest.is_keyword("when") {
            let condition = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            let after_then = condition.remaining.expect_keyword("then")?;
            let result = self.parse_expression(after_then, pratt::TOP_LEVEL)?;
            rest = result.remaining;
            children
                .push(ParseNode::new(NodeKind::When, rest).with_children(vec![condition, result]));
        }

        if rest.is_keyword("else") {
            let result = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = result.remaining;
            children.push(ParseNode::new(NodeKind::Else, rest).with_children(vec![result]));
        }

        let rest = rest.expect_keyword("end")?;
        Ok(ParseNode::with_token(NodeKind::Case, case_token, rest).with_children(children))
    }

    /// Parses `CAST ( expr AS type )`.
    fn parse_cast<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let cast_token = view.head().expect("cast token").clone();
        let (_, rest) = view.tail().expect(TokenKind::LeftParen)?;
        let operand = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        let (_, rest) = operand.remaining.expect(TokenKind::As)?;
        let ty = types::parse_type(rest)?;
        let (_, remaining) = ty.remaining.expect(TokenKind::RightParen)?;
        Ok(ParseNode::with_token(NodeKind::Cast, cast_token, remaining)
            .with_children(vec![operand, ty]))
    }

    /// Parses `VALUES (row), (row), ...` as a bag of lists.
    fn parse_values<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view.tail();
        let mut rows = Vec::new();
        loop {
            let row = self.parse_paren_list(rest)?;
            rest = row.remaining;
            rows.push(row);
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }
        Ok(ParseNode::new(NodeKind::Bag, rest).with_children(rows))
    }

    // === SELECT / PIVOT / WITH ===

    /// Parses a SELECT query.
    fn parse_select<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let select_token = view.head().expect("select token").clone();
        let mut rest = view.tail();

        let distinct = if rest.is_keyword("distinct") {
            rest = rest.tail();
            true
        } else {
            if rest.is_keyword("all") {
                rest = rest.tail();
            }
            false
        };

        let (kind, projection) = if rest.is_keyword("value") {
            let value = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            (NodeKind::SelectValue, value)
        } else {
            let list = self.parse_select_list(rest)?;
            (NodeKind::SelectList, list)
        };
        rest = projection.remaining;

        let projection = if distinct {
            ParseNode::new(NodeKind::Distinct, rest).with_children(vec![projection])
        } else {
            projection
        };

        let (clauses, rest) = self.parse_select_trailing(rest)?;
        let mut children = vec![projection];
        children.extend(clauses);
        Ok(ParseNode::with_token(kind, select_token, rest).with_children(children))
    }

    /// Parses the projection list of a SELECT.
    fn parse_select_list<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view;
        let mut items = Vec::new();
        loop {
            if rest.kind() == TokenKind::Star {
                let star = rest.head().expect("star token").clone();
                rest = rest.tail();
                items.push(ParseNode::with_token(NodeKind::ProjectAll, star, rest));
            } else {
                let expr = self.parse_expression(rest, pratt::TOP_LEVEL)?;
                rest = expr.remaining;
                let item = match rest.kind() {
                    TokenKind::As => {
                        let after = rest.tail();
                        let name = after
                            .head()
                            .filter(|t| {
                                matches!(
                                    t.kind,
                                    TokenKind::Identifier | TokenKind::QuotedIdentifier
                                )
                            })
                            .ok_or(ParseError::ExpectedIdentForAlias { span: after.span() })?
                            .clone();
                        rest = after.tail();
                        ParseNode::with_token(NodeKind::AsAlias, name, rest)
                            .with_children(vec![expr])
                    }
                    TokenKind::Identifier => {
                        let name = rest.head().expect("alias token").clone();
                        rest = rest.tail();
                        ParseNode::with_token(NodeKind::AsAlias, name, rest)
                            .with_children(vec![expr])
                    }
                    _ => expr,
                };
                items.push(item);
            }
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }
        Ok(ParseNode::new(NodeKind::ArgList, rest).with_children(items))
    }

    /// Parses the clauses after a SELECT/PIVOT projection, in their
    /// fixed textual order: FROM, LET, WHERE, GROUP [PARTIAL] BY,
    /// HAVING, ORDER BY, LIMIT. FROM is optional so that plain
    /// expression selects (`SELECT 1 + 1`) parse.
    fn parse_select_trailing<'a>(
        &self,
        view: TokenView<'a>,
    ) -> Result<(Vec<ParseNode<'a>>, TokenView<'a>), ParseError> {
        let mut rest = view;
        let mut clauses = Vec::new();
        if rest.is_keyword("from") {
            let source = self.parse_from_source_list(rest.tail())?;
            rest = source.remaining;
            clauses.push(ParseNode::new(NodeKind::FromClause, rest).with_children(vec![source]));
        }

        if rest.is_keyword("let") {
            let let_clause = self.parse_let(rest)?;
            rest = let_clause.remaining;
            clauses.push(let_clause);
        }
        if rest.is_keyword("where") {
            let condition = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = condition.remaining;
            clauses.push(ParseNode::new(NodeKind::Where, rest).with_children(vec![condition]));
        }
        if rest.is_keyword("group") {
            let group = self.parse_group(rest)?;
            rest = group.remaining;
            clauses.push(group);
        }
        if rest.is_keyword("having") {
            let condition = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = condition.remaining;
            clauses.push(ParseNode::new(NodeKind::Having, rest).with_children(vec![condition]));
        }
        if rest.is_keyword("order") {
            let order = self.parse_order_by(rest)?;
            rest = order.remaining;
            clauses.push(order);
        }
        if rest.is_keyword("limit") {
            let limit = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = limit.remaining;
            clauses.push(ParseNode::new(NodeKind::Limit, rest).with_children(vec![limit]));
        }
        Ok((clauses, rest))
    }

    /// Parses `LET expr AS name, ...`.
    fn parse_let<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view.tail();
        let mut bindings = Vec::new();
        loop {
            let expr = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            let (_, after_as) = expr.remaining.expect(TokenKind::As)?;
            let name = after_as
                .head()
                .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier))
                .ok_or(ParseError::ExpectedIdentForAlias {
                    span: after_as.span(),
                })?
                .clone();
            rest = after_as.tail();
            bindings
                .push(ParseNode::with_token(NodeKind::AsAlias, name, rest).with_children(vec![expr]));
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }
        Ok(ParseNode::new(NodeKind::Let, rest).with_children(bindings))
    }

    /// Parses `GROUP [PARTIAL] BY items [GROUP AS name]`.
    fn parse_group<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view.tail();
        let kind = if rest.is_keyword("partial") {
            rest = rest.tail();
            NodeKind::GroupPartial
        } else {
            NodeKind::Group
        };
        let (_, mut rest) = rest.expect(TokenKind::By)?;

        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            if is_literal_atom(&expr) {
                return Err(ParseError::UnsupportedLiteralsGroupBy { span: expr.span() });
            }
            rest = expr.remaining;
            let item = if rest.kind() == TokenKind::As {
                let after = rest.tail();
                let name = after
                    .head()
                    .filter(|t| {
                        matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier)
                    })
                    .ok_or(ParseError::ExpectedIdentForAlias { span: after.span() })?
                    .clone();
                rest = after.tail();
                ParseNode::with_token(NodeKind::AsAlias, name, rest).with_children(vec![expr])
            } else {
                expr
            };
            items.push(item);
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }

        let arg_list = ParseNode::new(NodeKind::ArgList, rest).with_children(items);
        let mut children = vec![arg_list];

        if rest.is_keyword("group") {
            let (_, after_as) = rest.tail().expect(TokenKind::As)?;
            let name = after_as
                .head()
                .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier))
                .ok_or(ParseError::ExpectedIdentForAlias {
                    span: after_as.span(),
                })?
                .clone();
            rest = after_as.tail();
            children.push(ParseNode::with_token(NodeKind::AsAlias, name, rest));
        }

        Ok(ParseNode::new(kind, rest).with_children(children))
    }

    /// Parses `ORDER BY expr [ASC|DESC], ...`.
    fn parse_order_by<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let (_, mut rest) = view.tail().expect(TokenKind::By)?;
        let mut specs = Vec::new();
        loop {
            let expr = self.parse_expression(rest, pratt::TOP_LEVEL)?;
            rest = expr.remaining;
            let mut children = vec![expr];
            if matches!(rest.kind(), TokenKind::Asc | TokenKind::Desc) {
                let token = rest.head().expect("ordering token").clone();
                rest = rest.tail();
                children.push(ParseNode::with_token(NodeKind::OrderingSpec, token, rest));
            }
            specs.push(ParseNode::new(NodeKind::SortSpec, rest).with_children(children));
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }
        Ok(ParseNode::new(NodeKind::OrderBy, rest).with_children(specs))
    }

    /// Parses `PIVOT value AT name FROM ...`.
    fn parse_pivot<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let pivot_token = view.head().expect("pivot token").clone();
        let value = self.parse_expression(view.tail(), pratt::TOP_LEVEL)?;
        let (_, rest) = value.remaining.expect(TokenKind::At)?;
        let at = self.parse_expression(rest, pratt::TOP_LEVEL)?;
        let (clauses, rest) = self.parse_select_trailing(at.remaining)?;
        let mut children = vec![value, at];
        children.extend(clauses);
        Ok(ParseNode::with_token(NodeKind::Pivot, pivot_token, rest).with_children(children))
    }

    /// Parses `WITH [RECURSIVE] name AS [NOT] MATERIALIZED (query), ... query`.
    fn parse_with<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let with_token = view.head().expect("with token").clone();
        let mut rest = view.tail();
        let mut children = Vec::new();

        if rest.is_keyword("recursive") {
            let token = rest.head().expect("recursive token").clone();
            rest = rest.tail();
            children.push(ParseNode::with_token(NodeKind::Recursive, token, rest));
        }

        loop {
            let name = rest
                .head()
                .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier))
                .ok_or(ParseError::ExpectedToken {
                    expected: TokenKind::Identifier,
                    found: rest.kind(),
                    span: rest.span(),
                })?
                .clone();
            let (_, after_as) = rest.tail().expect(TokenKind::As)?;

            let materialized_token = if after_as.is_keyword("materialized") {
                Some(after_as.head().expect("materialized token").clone())
            } else if after_as.is_keyword("not_materialized") {
                Some(after_as.head().expect("not materialized token").clone())
            } else {
                None
            };
            let after_marker = if materialized_token.is_some() {
                after_as.tail()
            } else {
                after_as
            };

            let (_, body_view) = after_marker.expect(TokenKind::LeftParen)?;
            let query = self.parse_query_expression(body_view, pratt::TOP_LEVEL)?;
            let (_, after) = query.remaining.expect(TokenKind::RightParen)?;
            rest = after;

            let binding_child = match materialized_token {
                Some(token) => ParseNode::with_token(NodeKind::Materialized, token, rest)
                    .with_children(vec![query]),
                None => query,
            };
            children.push(
                ParseNode::with_token(NodeKind::AsAlias, name, rest)
                    .with_children(vec![binding_child]),
            );

            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }

        let body = self.parse_query_expression(rest, pratt::TOP_LEVEL)?;
        let remaining = body.remaining;
        children.push(body);
        Ok(ParseNode::with_token(NodeKind::With, with_token, remaining).with_children(children))
    }

    // === FROM sources ===

    /// Parses a FROM source list into a left-associative join tree.
    fn parse_from_source_list<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut left = self.parse_from_source(view)?;
        loop {
            let rest = left.remaining;
            if rest.kind() == TokenKind::Comma {
                let comma = rest.head().expect("comma token").clone();
                let right = self.parse_from_source(rest.tail())?;
                let remaining = right.remaining;
                left = ParseNode::with_token(NodeKind::InnerJoin, comma, remaining)
                    .with_children(vec![left, right]);
                continue;
            }
            let Some(join_keyword) = rest.head().filter(|t| t.kind == TokenKind::Keyword) else {
                break;
            };
            let (kind, is_cross) = match join_keyword.text().unwrap_or_default() {
                "join" | "inner_join" => (NodeKind::InnerJoin, false),
                "cross_join" => (NodeKind::InnerJoin, true),
                "left_join" => (NodeKind::LeftJoin, false),
                "left_cross_join" => (NodeKind::LeftJoin, true),
                "right_join" => (NodeKind::RightJoin, false),
                "right_cross_join" => (NodeKind::RightJoin, true),
                "outer_join" => (NodeKind::OuterJoin, false),
                "outer_cross_join" => (NodeKind::OuterJoin, true),
                _ => break,
            };
            let token = join_keyword.clone();
            let right = self.parse_from_source(rest.tail())?;
            let mut children = vec![left, right];
            let remaining = if is_cross {
                children[1].remaining
            } else {
                let after = children[1].remaining;
                if !after.is_keyword("on") {
                    return Err(ParseError::MalformedJoin { span: after.span() });
                }
                let condition = self.parse_expression(after.tail(), pratt::TOP_LEVEL)?;
                let remaining = condition.remaining;
                children.push(condition);
                remaining
            };
            left = ParseNode::with_token(kind, token, remaining).with_children(children);
        }
        Ok(left)
    }

    /// Parses a single FROM source with its optional AS/AT/BY aliases.
    fn parse_from_source<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        if view.is_keyword("unpivot") {
            let token = view.head().expect("unpivot token").clone();
            let expr = self.parse_expression(view.tail(), pratt::SET)?;
            let remaining = expr.remaining;
            let node = ParseNode::with_token(NodeKind::Unpivot, token, remaining)
                .with_children(vec![expr]);
            return self.parse_source_aliases(node);
        }

        if view.kind() == TokenKind::LeftParen && !paren_starts_expression(view) {
            let inner = self.parse_from_source_list(view.tail())?;
            let (_, rest) = inner.remaining.expect(TokenKind::RightParen)?;
            // Aliases cannot be attached to a parenthesized join group.
            if matches!(
                rest.kind(),
                TokenKind::As | TokenKind::At | TokenKind::By | TokenKind::Identifier
            ) {
                return Err(ParseError::UnsupportedSyntax { span: rest.span() });
            }
            return Ok(
                ParseNode::new(NodeKind::FromSourceJoin, rest).with_children(vec![inner])
            );
        }

        let expr = self.parse_expression(view, pratt::SET)?;
        self.parse_source_aliases(expr)
    }

    /// Wraps a source in AS, AT, and BY alias nodes, in that order.
    fn parse_source_aliases<'a>(&self, source: ParseNode<'a>) -> ParseResult<'a> {
        let mut node = source;
        let rest = node.remaining;
        match rest.kind() {
            TokenKind::As => {
                let after = rest.tail();
                let name = after
                    .head()
                    .filter(|t| {
                        matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier)
                    })
                    .ok_or(ParseError::ExpectedIdentForAlias { span: after.span() })?
                    .clone();
                let remaining = after.tail();
                node = ParseNode::with_token(NodeKind::AsAlias, name, remaining)
                    .with_children(vec![node]);
            }
            TokenKind::Identifier => {
                let name = rest.head().expect("alias token").clone();
                let remaining = rest.tail();
                node = ParseNode::with_token(NodeKind::AsAlias, name, remaining)
                    .with_children(vec![node]);
            }
            _ => {}
        }

        if node.remaining.kind() == TokenKind::At {
            let after = node.remaining.tail();
            let name = after
                .head()
                .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier))
                .ok_or(ParseError::ExpectedIdentForAlias { span: after.span() })?
                .clone();
            let remaining = after.tail();
            node =
                ParseNode::with_token(NodeKind::AtAlias, name, remaining).with_children(vec![node]);
        }

        if node.remaining.kind() == TokenKind::By {
            let after = node.remaining.tail();
            let name = after
                .head()
                .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier))
                .ok_or(ParseError::ExpectedIdentForAlias { span: after.span() })?
                .clone();
            let remaining = after.tail();
            node =
                ParseNode::with_token(NodeKind::ByAlias, name, remaining).with_children(vec![node]);
        }

        Ok(node)
    }

    // === DML ===

    /// Parses a bare INSERT statement with an optional RETURNING.
    fn parse_insert_statement<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let op = self.parse_insert_op(view)?;
        if !op.remaining.is_keyword("returning") {
            return Ok(op);
        }
        let returning = self.parse_returning(op.remaining)?;
        let remaining = returning.remaining;
        Ok(ParseNode::new(NodeKind::DmlList, remaining).with_children(vec![op, returning]))
    }

    /// Parses one INSERT operation (either form, no RETURNING).
    fn parse_insert_op<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let token = view.head().expect("insert token").clone();
        let target = self.parse_path_term(view.tail(), PathMode::Simple)?;

        if !target.remaining.is_keyword("value") {
            let values = self.parse_expression(target.remaining, pratt::TOP_LEVEL)?;
            let remaining = values.remaining;
            return Ok(ParseNode::with_token(NodeKind::Insert, token, remaining)
                .with_children(vec![target, values]));
        }

        let value = self.parse_expression(target.remaining.tail(), pratt::TOP_LEVEL)?;
        let mut rest = value.remaining;
        let mut children = vec![target, value];

        if rest.kind() == TokenKind::At {
            let position = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = position.remaining;
            children.push(position);
        }

        if rest.is_keyword("on_conflict") {
            let after_where = rest.tail().expect_keyword("where")?;
            let condition = self.parse_expression(after_where, pratt::TOP_LEVEL)?;
            rest = condition.remaining;
            if !rest.is_keyword("do_nothing") {
                return Err(ParseError::ExpectedConflictAction { span: rest.span() });
            }
            let action_token = rest.head().expect("conflict action token").clone();
            rest = rest.tail();
            let check =
                ParseNode::new(NodeKind::Check, condition.remaining).with_children(vec![condition]);
            let action = ParseNode::with_token(NodeKind::ConflictAction, action_token, rest);
            children.push(
                ParseNode::new(NodeKind::OnConflict, rest).with_children(vec![check, action]),
            );
        }

        Ok(ParseNode::with_token(NodeKind::InsertValue, token, rest).with_children(children))
    }

    /// Parses a bare SET statement.
    fn parse_set_statement<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let op = self.parse_set_clause(view)?;
        self.finish_dml(Vec::new(), vec![op])
    }

    /// Parses `SET path = expr, ...` into a SET op node.
    fn parse_set_clause<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let set_token = view.head().expect("set token").clone();
        let mut rest = view.tail();
        if !matches!(
            rest.kind(),
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) {
            return Err(ParseError::MissingSetAssignment { span: rest.span() });
        }
        let mut assignments = Vec::new();
        loop {
            let target = self.parse_path_term(rest, PathMode::Simple)?;
            let after_eq = target.remaining.expect_operator("=")?;
            let value = self.parse_expression(after_eq, pratt::TOP_LEVEL)?;
            rest = value.remaining;
            assignments.push(
                ParseNode::new(NodeKind::Assignment, rest).with_children(vec![target, value]),
            );
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }
        Ok(ParseNode::with_token(NodeKind::Set, set_token, rest).with_children(assignments))
    }

    /// Parses a bare REMOVE statement.
    fn parse_remove_statement<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let op = self.parse_remove_op(view)?;
        self.finish_dml(Vec::new(), vec![op])
    }

    /// Parses `REMOVE path` into a REMOVE op node.
    fn parse_remove_op<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let token = view.head().expect("remove token").clone();
        let target = self.parse_path_term(view.tail(), PathMode::Simple)?;
        let remaining = target.remaining;
        Ok(ParseNode::with_token(NodeKind::Remove, token, remaining).with_children(vec![target]))
    }

    /// Parses the legacy `UPDATE target op+ [WHERE] [RETURNING]` form.
    fn parse_update_statement<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let token = view.head().expect("update token").clone();
        let target = self.parse_dml_target(view.tail())?;
        let remaining = target.remaining;
        let wrapper = ParseNode::with_token(NodeKind::Update, token, remaining)
            .with_children(vec![target]);
        let ops = self.parse_dml_ops(remaining)?;
        if ops.is_empty() {
            return Err(ParseError::MissingSetAssignment { span: remaining.span() });
        }
        self.finish_dml(vec![wrapper], ops)
    }

    /// Parses the legacy `DELETE FROM target [WHERE] [RETURNING]` form.
    fn parse_delete_statement<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let token = view.head().expect("delete token").clone();
        let rest = view.tail().expect_keyword("from")?;
        let target = self.parse_dml_target(rest)?;
        let remaining = target.remaining;
        let op = ParseNode::with_token(NodeKind::Delete, token, remaining)
            .with_children(vec![target]);
        self.finish_dml(Vec::new(), vec![op])
    }

    /// Parses the `FROM target op+ [WHERE] [RETURNING]` form.
    fn parse_from_dml_statement<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let token = view.head().expect("from token").clone();
        let target = self.parse_from_source_list(view.tail())?;
        let remaining = target.remaining;
        let wrapper =
            ParseNode::with_token(NodeKind::From, token, remaining).with_children(vec![target]);
        let ops = self.parse_dml_ops(remaining)?;
        if ops.is_empty() {
            return Err(unexpected(remaining));
        }
        self.finish_dml(vec![wrapper], ops)
    }

    /// Parses consecutive base DML operations (SET / INSERT INTO / REMOVE).
    fn parse_dml_ops<'a>(
        &self,
        view: TokenView<'a>,
    ) -> Result<Vec<ParseNode<'a>>, ParseError> {
        let mut ops = Vec::new();
        let mut rest = view;
        loop {
            let op = if rest.is_keyword("set") {
                self.parse_set_clause(rest)?
            } else if rest.is_keyword("insert_into") {
                self.parse_insert_op(rest)?
            } else if rest.is_keyword("remove") {
                self.parse_remove_op(rest)?
            } else {
                break;
            };
            rest = op.remaining;
            ops.push(op);
        }
        Ok(ops)
    }

    /// Parses a DML target: a simple path with optional AS/AT/BY aliases.
    fn parse_dml_target<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let path = self.parse_path_term(view, PathMode::Simple)?;
        self.parse_source_aliases(path)
    }

    /// Attaches optional WHERE and RETURNING, then wraps multi-part
    /// statements in a DML_LIST.
    fn finish_dml<'a>(
        &self,
        mut prefix: Vec<ParseNode<'a>>,
        mut ops: Vec<ParseNode<'a>>,
    ) -> ParseResult<'a> {
        let mut rest = ops.last().expect("at least one DML op").remaining;
        let mut trailing = Vec::new();

        if rest.is_keyword("where") {
            let condition = self.parse_expression(rest.tail(), pratt::TOP_LEVEL)?;
            rest = condition.remaining;
            trailing.push(ParseNode::new(NodeKind::Where, rest).with_children(vec![condition]));
        }
        if rest.is_keyword("returning") {
            let returning = self.parse_returning(rest)?;
            rest = returning.remaining;
            trailing.push(returning);
        }

        if prefix.is_empty() && ops.len() == 1 && trailing.is_empty() {
            return Ok(ops.pop().expect("single op"));
        }

        let mut children = Vec::new();
        children.append(&mut prefix);
        children.append(&mut ops);
        children.extend(trailing);
        Ok(ParseNode::new(NodeKind::DmlList, rest).with_children(children))
    }

    /// Parses `RETURNING (MODIFIED|ALL) (OLD|NEW) (* | path), ...`.
    fn parse_returning<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let mut rest = view.tail();
        let mut elems = Vec::new();
        loop {
            let mapping_token = rest
                .head()
                .filter(|t| {
                    t.kind == TokenKind::Keyword
                        && matches!(
                            t.text().unwrap_or_default(),
                            "modified_old" | "modified_new" | "all_old" | "all_new"
                        )
                })
                .ok_or(ParseError::ExpectedKeyword {
                    keyword: String::from("returning mapping"),
                    span: rest.span(),
                })?
                .clone();
            rest = rest.tail();
            let mapping = ParseNode::with_token(NodeKind::ReturningMapping, mapping_token, rest);

            let column = if rest.kind() == TokenKind::Star {
                let star = rest.head().expect("star token").clone();
                rest = rest.tail();
                ParseNode::with_token(NodeKind::ReturningWildcard, star, rest)
            } else {
                let path = self.parse_path_term(rest, PathMode::Query)?;
                // RETURNING paths are limited to two components.
                if path.kind == NodeKind::Path && path.children.len() > 2 {
                    return Err(ParseError::InvalidPathComponent {
                        span: path.children[2].span(),
                    });
                }
                rest = path.remaining;
                path
            };

            elems.push(
                ParseNode::new(NodeKind::ReturningElem, rest)
                    .with_children(vec![mapping, column]),
            );
            if rest.kind() == TokenKind::Comma {
                rest = rest.tail();
            } else {
                break;
            }
        }
        Ok(ParseNode::new(NodeKind::Returning, rest).with_children(elems))
    }

    // === DDL / EXEC ===

    /// Parses `CREATE TABLE name` / `CREATE INDEX ON table (path, ...)`.
    fn parse_create<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let rest = view.tail();
        if rest.is_keyword("table") {
            let after = rest.tail();
            let name = expect_identifier(after)?;
            let node = ParseNode::with_token(NodeKind::CreateTable, name.clone(), after.tail());
            return self.require_statement_end(node);
        }
        if rest.is_keyword("index") {
            let after = rest.tail().expect_keyword("on")?;
            let table = expect_identifier(after)?;
            let (_, mut rest) = after.tail().expect(TokenKind::LeftParen)?;
            let mut children = vec![atom(table.clone(), rest)];
            loop {
                let key = self.parse_path_term(rest, PathMode::Simple)?;
                rest = key.remaining;
                children.push(key);
                match rest.kind() {
                    TokenKind::Comma => rest = rest.tail(),
                    TokenKind::RightParen => {
                        rest = rest.tail();
                        break;
                    }
                    found => {
                        return Err(ParseError::Expected2TokenTypes {
                            first: TokenKind::Comma,
                            second: TokenKind::RightParen,
                            found,
                            span: rest.span(),
                        });
                    }
                }
            }
            let node = ParseNode::new(NodeKind::CreateIndex, rest).with_children(children);
            return self.require_statement_end(node);
        }
        Err(unexpected(rest))
    }

    /// Parses `DROP TABLE name` / `DROP INDEX name ON table`.
    fn parse_drop<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let rest = view.tail();
        if rest.is_keyword("table") {
            let after = rest.tail();
            let name = expect_identifier(after)?;
            let node = ParseNode::with_token(NodeKind::DropTable, name.clone(), after.tail());
            return self.require_statement_end(node);
        }
        if rest.is_keyword("index") {
            let after = rest.tail();
            let name = expect_identifier(after)?;
            let after_on = after.tail().expect_keyword("on")?;
            let table = expect_identifier(after_on)?;
            let remaining = after_on.tail();
            let node = ParseNode::new(NodeKind::DropIndex, remaining).with_children(vec![
                atom(name.clone(), after.tail()),
                atom(table.clone(), remaining),
            ]);
            return self.require_statement_end(node);
        }
        Err(unexpected(rest))
    }

    /// Parses `EXEC name [expr, ...]`.
    ///
    /// The argument list is comma-separated without parentheses; a `(`
    /// directly after the procedure name is rejected, and zero
    /// arguments are accepted only at the end of the statement.
    fn parse_exec<'a>(&self, view: TokenView<'a>) -> ParseResult<'a> {
        let rest = view.tail();
        let Some(name) = rest.head().filter(|t| t.kind == TokenKind::Identifier) else {
            return Err(ParseError::NoStoredProcedureProvided { span: view.span() });
        };
        let name = name.clone();
        let mut rest = rest.tail();

        if rest.kind() == TokenKind::LeftParen {
            return Err(ParseError::UnexpectedToken {
                kind: TokenKind::LeftParen,
                span: rest.span(),
            });
        }

        let mut args = Vec::new();
        if !rest.only_end_of_statement() {
            loop {
                let arg = self.parse_expression(rest, pratt::TOP_LEVEL)?;
                rest = arg.remaining;
                args.push(arg);
                if rest.kind() == TokenKind::Comma {
                    rest = rest.tail();
                } else {
                    break;
                }
            }
        }
        if rest.is_keyword("exec") {
            return Err(ParseError::UnexpectedTerm { span: rest.span() });
        }
        Ok(ParseNode::with_token(NodeKind::Exec, name, rest).with_children(args))
    }

    // === Helpers ===

    /// DDL statements forbid any trailing tokens.
    fn require_statement_end<'a>(&self, node: ParseNode<'a>) -> ParseResult<'a> {
        if node.remaining.only_end_of_statement() {
            Ok(node)
        } else {
            Err(unexpected(node.remaining))
        }
    }

    /// Fails with `Interrupted` when the cooperative flag is set.
    fn check_interrupt(&self, view: TokenView<'_>) -> Result<(), ParseError> {
        if self.interrupt.is_some_and(InterruptHandle::is_interrupted) {
            Err(ParseError::Interrupted { span: view.span() })
        } else {
            Ok(())
        }
    }
}

/// Builds an atom node, choosing case sensitivity from the token kind.
fn atom(token: Token, remaining: TokenView<'_>) -> ParseNode<'_> {
    let kind = match token.kind {
        TokenKind::Identifier => NodeKind::CaseInsensitiveAtom,
        TokenKind::QuotedIdentifier => NodeKind::CaseSensitiveAtom,
        _ => NodeKind::Atom,
    };
    ParseNode::with_token(kind, token, remaining)
}

/// Requires an identifier token and returns it.
fn expect_identifier(view: TokenView<'_>) -> Result<Token, ParseError> {
    view.head()
        .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier))
        .cloned()
        .ok_or(ParseError::ExpectedToken {
            expected: TokenKind::Identifier,
            found: view.kind(),
            span: view.span(),
        })
}

/// Classifies the error for a token that cannot appear here.
fn unexpected(view: TokenView<'_>) -> ParseError {
    let span = view.span();
    match view.kind() {
        TokenKind::Keyword => ParseError::UnexpectedKeyword {
            keyword: String::from(view.text().unwrap_or_default()),
            span,
        },
        TokenKind::Operator => ParseError::UnexpectedOperator {
            operator: String::from(view.text().unwrap_or_default()),
            span,
        },
        kind => ParseError::UnexpectedToken { kind, span },
    }
}

/// True for atoms carrying a numeric literal.
fn is_numeric_atom(node: &ParseNode<'_>) -> bool {
    node.kind == NodeKind::Atom
        && node.children.is_empty()
        && node
            .token
            .as_ref()
            .and_then(|t| t.value.as_ref())
            .is_some_and(LiteralValue::is_numeric)
}

/// True for atoms carrying any literal value.
fn is_literal_atom(node: &ParseNode<'_>) -> bool {
    node.kind == NodeKind::Atom
        && node
            .token
            .as_ref()
            .is_some_and(|t| matches!(t.kind, TokenKind::Literal | TokenKind::Null))
}

/// Negates the numeric literal inside an atom.
fn negate_literal(node: ParseNode<'_>) -> ParseNode<'_> {
    let mut node = node;
    if let Some(token) = &mut node.token {
        token.value = match token.value.take() {
            Some(LiteralValue::Integer(n)) => Some(LiteralValue::Integer(-n)),
            Some(LiteralValue::Real(x)) => Some(LiteralValue::Real(-x)),
            other => other,
        };
    }
    node
}

/// True when a `(` in FROM position opens an expression (sub-query or
/// row value) rather than a nested source.
fn paren_starts_expression(view: TokenView<'_>) -> bool {
    match view.nth(1) {
        Some(token) => match token.kind {
            TokenKind::Keyword => {
                matches!(
                    token.text().unwrap_or_default(),
                    "select" | "pivot" | "values" | "with"
                )
            }
            TokenKind::Literal | TokenKind::IonLiteral | TokenKind::Null | TokenKind::Missing => {
                true
            }
            _ => false,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn with_tokens<T>(input: &str, f: impl FnOnce(TokenView<'_>) -> T) -> T {
        let tokens = Lexer::new(input).tokenize().expect("tokenize failed");
        f(TokenView::new(&tokens))
    }

    #[test]
    fn test_left_associative_binary() {
        with_tokens("1 + 2 + 3", |view| {
            let session = Session { interrupt: None };
            let node = session.parse_expression(view, pratt::TOP_LEVEL).unwrap();
            assert_eq!(node.kind, NodeKind::Binary);
            // Left child is itself the (1 + 2) application.
            assert_eq!(node.children[0].kind, NodeKind::Binary);
            assert_eq!(node.children[1].kind, NodeKind::Atom);
        });
    }

    #[test]
    fn test_unary_minus_folds_literal() {
        with_tokens("-5", |view| {
            let session = Session { interrupt: None };
            let node = session.parse_expression(view, pratt::TOP_LEVEL).unwrap();
            assert_eq!(node.kind, NodeKind::Atom);
            assert_eq!(
                node.token.as_ref().unwrap().value,
                Some(LiteralValue::Integer(-5))
            );
        });
    }

    #[test]
    fn test_path_components() {
        with_tokens("a.b[0].*", |view| {
            let session = Session { interrupt: None };
            let node = session.parse_expression(view, pratt::TOP_LEVEL).unwrap();
            assert_eq!(node.kind, NodeKind::Path);
            assert_eq!(node.children.len(), 4);
            assert_eq!(node.children[0].kind, NodeKind::CaseInsensitiveAtom);
            assert_eq!(node.children[1].kind, NodeKind::PathDot);
            assert_eq!(node.children[2].kind, NodeKind::PathSqb);
            assert_eq!(node.children[3].kind, NodeKind::PathUnpivot);
        });
    }

    #[test]
    fn test_between_is_ternary() {
        with_tokens("a BETWEEN 1 AND 2", |view| {
            let session = Session { interrupt: None };
            let node = session.parse_expression(view, pratt::TOP_LEVEL).unwrap();
            assert_eq!(node.kind, NodeKind::Ternary);
            assert_eq!(node.children.len(), 3);
        });
    }

    #[test]
    fn test_interrupt_aborts() {
        let handle = InterruptHandle::default();
        handle.interrupt();
        with_tokens("1 + 2", |view| {
            let session = Session {
                interrupt: Some(&handle),
            };
            let err = session.parse_expression(view, pratt::TOP_LEVEL).unwrap_err();
            assert_eq!(err.code(), "interrupted");
        });
    }
}

//! Parser error types.

use crate::lexer::{Span, TokenKind};

/// Errors raised while tokenizing or parsing a statement.
///
/// Every variant carries the span of the failing token; [`code`] exposes
/// a stable machine identifier for each variant and [`span`] the source
/// location, so callers can report errors without matching variants.
///
/// [`code`]: ParseError::code
/// [`span`]: ParseError::span
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A character that cannot start any token.
    #[error("unexpected character `{character}` at {span}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Location of the character.
        span: Span,
    },

    /// A string, quoted identifier, or Ion literal without a closing quote.
    #[error("unterminated literal at {span}")]
    UnterminatedLiteral {
        /// Location where the literal started.
        span: Span,
    },

    /// An expression was required but the next token cannot start one.
    #[error("expected expression at {span}")]
    ExpectedExpression {
        /// Location of the offending token.
        span: Span,
    },

    /// A specific token type was required.
    #[error("expected {expected}, found {found} at {span}")]
    ExpectedToken {
        /// The required token type.
        expected: TokenKind,
        /// The token type actually found.
        found: TokenKind,
        /// Location of the offending token.
        span: Span,
    },

    /// One of two token types was required.
    #[error("expected {first} or {second}, found {found} at {span}")]
    Expected2TokenTypes {
        /// The first acceptable token type.
        first: TokenKind,
        /// The second acceptable token type.
        second: TokenKind,
        /// The token type actually found.
        found: TokenKind,
        /// Location of the offending token.
        span: Span,
    },

    /// A specific keyword was required.
    #[error("expected `{keyword}` at {span}")]
    ExpectedKeyword {
        /// The required keyword, normalized.
        keyword: String,
        /// Location of the offending token.
        span: Span,
    },

    /// A type name was required (after IS or CAST ... AS).
    #[error("expected type name at {span}")]
    ExpectedTypeName {
        /// Location of the offending token.
        span: Span,
    },

    /// An identifier was required for an alias.
    #[error("expected identifier for alias at {span}")]
    ExpectedIdentForAlias {
        /// Location of the offending token.
        span: Span,
    },

    /// Mixed or misplaced argument delimiters in a bespoke call form.
    #[error("expected argument delimiter at {span}")]
    ExpectedArgumentDelimiter {
        /// Location of the offending token.
        span: Span,
    },

    /// A path component that is not valid in the current path mode.
    #[error("invalid path component at {span}")]
    InvalidPathComponent {
        /// Location of the offending token.
        span: Span,
    },

    /// A bare `*` appeared alongside other select-list items.
    #[error("`*` must be the only element of the select list at {span}")]
    AsteriskNotAloneInSelectList {
        /// Location of the offending item.
        span: Span,
    },

    /// `[*]` or a non-final `.*` appeared in a select-list path.
    #[error("cannot mix `[]` and `*` in a select list at {span}")]
    CannotMixWildcardsInSelectList {
        /// Location of the offending item.
        span: Span,
    },

    /// A literal (including an ordinal) appeared in GROUP BY.
    #[error("literals are not supported in GROUP BY at {span}")]
    UnsupportedLiteralsGroupBy {
        /// Location of the offending item.
        span: Span,
    },

    /// An aggregate call with an argument count other than one.
    #[error("aggregate function `{name}` takes exactly one argument at {span}")]
    NonUnaryAggregateFunctionCall {
        /// The aggregate function name.
        name: String,
        /// Location of the call.
        span: Span,
    },

    /// `*` passed to a call that is not `COUNT`.
    #[error("`*` is not a supported argument for `{name}` at {span}")]
    UnsupportedCallWithStar {
        /// The function name.
        name: String,
        /// Location of the call.
        span: Span,
    },

    /// A type was parameterized with the wrong number of arguments.
    #[error("`{type_name}` takes {min} to {max} type parameters, found {found} at {span}")]
    CastArityMismatch {
        /// The type name.
        type_name: String,
        /// Minimum accepted arity.
        min: usize,
        /// Maximum accepted arity.
        max: usize,
        /// Number of parameters found.
        found: usize,
        /// Location of the type.
        span: Span,
    },

    /// A type parameter that is not an unsigned integer literal.
    #[error("invalid type parameter at {span}")]
    InvalidTypeParameter {
        /// Location of the parameter.
        span: Span,
    },

    /// A TIME precision outside [0, 9].
    #[error("invalid precision for TIME at {span}")]
    InvalidPrecisionForTime {
        /// Location of the precision.
        span: Span,
    },

    /// A DATE literal string that is not a valid calendar date.
    #[error("invalid date string `{literal}` at {span}")]
    InvalidDateString {
        /// The rejected literal text.
        literal: String,
        /// Location of the literal.
        span: Span,
    },

    /// A TIME literal string that is not a valid time of day.
    #[error("invalid time string `{literal}` at {span}")]
    InvalidTimeString {
        /// The rejected literal text.
        literal: String,
        /// Location of the literal.
        span: Span,
    },

    /// `@` not followed by an identifier.
    #[error("expected identifier after `@` at {span}")]
    MissingIdentAfterAt {
        /// Location of the `@`.
        span: Span,
    },

    /// A keyword in a position where it cannot appear.
    #[error("unexpected keyword `{keyword}` at {span}")]
    UnexpectedKeyword {
        /// The keyword, normalized.
        keyword: String,
        /// Location of the keyword.
        span: Span,
    },

    /// An operator in a position where it cannot appear.
    #[error("unexpected operator `{operator}` at {span}")]
    UnexpectedOperator {
        /// The operator, normalized.
        operator: String,
        /// Location of the operator.
        span: Span,
    },

    /// A term (statement or sub-expression) in a position where it
    /// cannot appear, e.g. DML below the top level.
    #[error("unexpected term at {span}")]
    UnexpectedTerm {
        /// Location of the term.
        span: Span,
    },

    /// A token in a position where it cannot appear.
    #[error("unexpected token {kind} at {span}")]
    UnexpectedToken {
        /// The token kind.
        kind: TokenKind,
        /// Location of the token.
        span: Span,
    },

    /// A join without the required ON condition, or an unknown join form.
    #[error("malformed join at {span}")]
    MalformedJoin {
        /// Location of the join.
        span: Span,
    },

    /// Syntax recognized but not supported.
    #[error("unsupported syntax at {span}")]
    UnsupportedSyntax {
        /// Location of the construct.
        span: Span,
    },

    /// SET or UPDATE without any assignment.
    #[error("missing SET assignment at {span}")]
    MissingSetAssignment {
        /// Location of the clause.
        span: Span,
    },

    /// EXEC without a procedure name.
    #[error("no stored procedure provided at {span}")]
    NoStoredProcedureProvided {
        /// Location of the EXEC keyword.
        span: Span,
    },

    /// ON CONFLICT without a recognized conflict action.
    #[error("expected conflict action at {span}")]
    ExpectedConflictAction {
        /// Location of the offending token.
        span: Span,
    },

    /// Tokens after the statement-terminating semicolon.
    #[error("unexpected tokens after semicolon at {span}")]
    ExtraTokensAfterSemicolon {
        /// Location of the first extra token.
        span: Span,
    },

    /// An internal-contract violation in the intermediate parse tree.
    ///
    /// This is a bug in the parser, never a user error.
    #[error("malformed parse tree: {message} at {span}")]
    MalformedParseTree {
        /// Description of the violated invariant.
        message: String,
        /// Location of the offending node, when known.
        span: Span,
    },

    /// Parsing was aborted by the cooperative interrupt flag.
    #[error("parsing was interrupted at {span}")]
    Interrupted {
        /// Location reached when the interrupt was observed.
        span: Span,
    },
}

impl ParseError {
    /// Returns the stable machine identifier for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedCharacter { .. } => "unexpected_character",
            Self::UnterminatedLiteral { .. } => "unterminated_literal",
            Self::ExpectedExpression { .. } => "expected_expression",
            Self::ExpectedToken { .. } => "expected_token",
            Self::Expected2TokenTypes { .. } => "expected_2_token_types",
            Self::ExpectedKeyword { .. } => "expected_keyword",
            Self::ExpectedTypeName { .. } => "expected_type_name",
            Self::ExpectedIdentForAlias { .. } => "expected_ident_for_alias",
            Self::ExpectedArgumentDelimiter { .. } => "expected_argument_delimiter",
            Self::InvalidPathComponent { .. } => "invalid_path_component",
            Self::AsteriskNotAloneInSelectList { .. } => "asterisk_not_alone_in_select_list",
            Self::CannotMixWildcardsInSelectList { .. } => "cannot_mix_wildcards_in_select_list",
            Self::UnsupportedLiteralsGroupBy { .. } => "unsupported_literals_group_by",
            Self::NonUnaryAggregateFunctionCall { .. } => "non_unary_aggregate_function_call",
            Self::UnsupportedCallWithStar { .. } => "unsupported_call_with_star",
            Self::CastArityMismatch { .. } => "cast_arity_mismatch",
            Self::InvalidTypeParameter { .. } => "invalid_type_parameter",
            Self::InvalidPrecisionForTime { .. } => "invalid_precision_for_time",
            Self::InvalidDateString { .. } => "invalid_date_string",
            Self::InvalidTimeString { .. } => "invalid_time_string",
            Self::MissingIdentAfterAt { .. } => "missing_ident_after_at",
            Self::UnexpectedKeyword { .. } => "unexpected_keyword",
            Self::UnexpectedOperator { .. } => "unexpected_operator",
            Self::UnexpectedTerm { .. } => "unexpected_term",
            Self::UnexpectedToken { .. } => "unexpected_token",
            Self::MalformedJoin { .. } => "malformed_join",
            Self::UnsupportedSyntax { .. } => "unsupported_syntax",
            Self::MissingSetAssignment { .. } => "missing_set_assignment",
            Self::NoStoredProcedureProvided { .. } => "no_stored_procedure_provided",
            Self::ExpectedConflictAction { .. } => "expected_conflict_action",
            Self::ExtraTokensAfterSemicolon { .. } => "extra_tokens_after_semicolon",
            Self::MalformedParseTree { .. } => "malformed_parse_tree",
            Self::Interrupted { .. } => "interrupted",
        }
    }

    /// Returns the source location of the error.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::UnexpectedCharacter { span, .. }
            | Self::UnterminatedLiteral { span }
            | Self::ExpectedExpression { span }
            | Self::ExpectedToken { span, .. }
            | Self::Expected2TokenTypes { span, .. }
            | Self::ExpectedKeyword { span, .. }
            | Self::ExpectedTypeName { span }
            | Self::ExpectedIdentForAlias { span }
            | Self::ExpectedArgumentDelimiter { span }
            | Self::InvalidPathComponent { span }
            | Self::AsteriskNotAloneInSelectList { span }
            | Self::CannotMixWildcardsInSelectList { span }
            | Self::UnsupportedLiteralsGroupBy { span }
            | Self::NonUnaryAggregateFunctionCall { span, .. }
            | Self::UnsupportedCallWithStar { span, .. }
            | Self::CastArityMismatch { span, .. }
            | Self::InvalidTypeParameter { span }
            | Self::InvalidPrecisionForTime { span }
            | Self::InvalidDateString { span, .. }
            | Self::InvalidTimeString { span, .. }
            | Self::MissingIdentAfterAt { span }
            | Self::UnexpectedKeyword { span, .. }
            | Self::UnexpectedOperator { span, .. }
            | Self::UnexpectedTerm { span }
            | Self::UnexpectedToken { span, .. }
            | Self::MalformedJoin { span }
            | Self::UnsupportedSyntax { span }
            | Self::MissingSetAssignment { span }
            | Self::NoStoredProcedureProvided { span }
            | Self::ExpectedConflictAction { span }
            | Self::ExtraTokensAfterSemicolon { span }
            | Self::MalformedParseTree { span, .. }
            | Self::Interrupted { span } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_is_stable() {
        let err = ParseError::ExpectedExpression {
            span: Span::new(2, 5, 1),
        };
        assert_eq!(err.code(), "expected_expression");
        assert_eq!(err.span(), Span::new(2, 5, 1));
    }

    #[test]
    fn test_error_display_includes_location() {
        let err = ParseError::ExpectedKeyword {
            keyword: String::from("and"),
            span: Span::new(1, 10, 3),
        };
        assert_eq!(err.to_string(), "expected `and` at line 1, column 10");
    }
}

//! A purely functional view over the lexer's token sequence.

use crate::lexer::{Span, Token, TokenKind};

use super::error::ParseError;
use super::pratt;

/// A lightweight cursor over an EOF-terminated token slice.
///
/// The view never mutates: advancing returns a new view, so sub-parsers
/// can be pure functions of `(view) -> (node, remaining view)`. The
/// final EOF token is never consumed; [`tail`](TokenView::tail) at EOF
/// returns the view unchanged.
#[derive(Debug, Clone, Copy)]
pub struct TokenView<'a> {
    tokens: &'a [Token],
}

impl<'a> TokenView<'a> {
    /// Creates a view over an EOF-terminated token slice.
    #[must_use]
    pub const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }

    /// Returns the head token without advancing.
    #[must_use]
    pub fn head(&self) -> Option<&'a Token> {
        self.tokens.first()
    }

    /// Returns the token `n` positions past the head.
    #[must_use]
    pub fn nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(n)
    }

    /// Returns the head token's kind, or EOF when exhausted.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.head().map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Returns the head token's normalized text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.head().and_then(Token::text)
    }

    /// Returns the head token's span, or a default span when exhausted.
    #[must_use]
    pub fn span(&self) -> Span {
        self.head().map_or_else(Span::default, |t| t.span)
    }

    /// Returns a view advanced past the head token.
    #[must_use]
    pub fn tail(self) -> Self {
        if self.tokens.len() > 1 {
            Self {
                tokens: &self.tokens[1..],
            }
        } else {
            self
        }
    }

    /// Returns true if the head is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.head().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Returns true if the head is the given operator.
    #[must_use]
    pub fn is_operator(&self, operator: &str) -> bool {
        self.head().is_some_and(|t| t.is_operator(operator))
    }

    /// Requires the head to be of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `ExpectedToken` when the head has a different kind.
    pub fn expect(&self, kind: TokenKind) -> Result<(&'a Token, Self), ParseError> {
        match self.head() {
            Some(token) if token.kind == kind => Ok((token, self.tail())),
            _ => Err(ParseError::ExpectedToken {
                expected: kind,
                found: self.kind(),
                span: self.span(),
            }),
        }
    }

    /// Requires the head to be the given keyword.
    ///
    /// # Errors
    ///
    /// Returns `ExpectedKeyword` when the head is anything else.
    pub fn expect_keyword(&self, keyword: &str) -> Result<Self, ParseError> {
        if self.is_keyword(keyword) {
            Ok(self.tail())
        } else {
            Err(ParseError::ExpectedKeyword {
                keyword: String::from(keyword),
                span: self.span(),
            })
        }
    }

    /// Requires the head to be the given operator.
    ///
    /// # Errors
    ///
    /// Returns `ExpectedKeyword` (operators share the keyword surface
    /// in messages) when the head is anything else.
    pub fn expect_operator(&self, operator: &str) -> Result<Self, ParseError> {
        if self.is_operator(operator) {
            Ok(self.tail())
        } else {
            Err(ParseError::ExpectedKeyword {
                keyword: String::from(operator),
                span: self.span(),
            })
        }
    }

    /// Returns true if only semicolons and EOF remain.
    #[must_use]
    pub fn only_end_of_statement(&self) -> bool {
        self.tokens
            .iter()
            .all(|t| matches!(t.kind, TokenKind::Semicolon | TokenKind::Eof))
    }

    /// Returns true if the head is a unary operator.
    #[must_use]
    pub fn is_unary_operator(&self) -> bool {
        self.head().is_some_and(pratt::is_unary_operator)
    }

    /// Returns true if the head is a binary operator.
    #[must_use]
    pub fn is_binary_operator(&self) -> bool {
        self.head().is_some_and(pratt::is_binary_operator)
    }

    /// Returns the head's prefix precedence, if it is a unary operator.
    #[must_use]
    pub fn prefix_precedence(&self) -> Option<i32> {
        self.head().and_then(pratt::prefix_precedence)
    }

    /// Returns the head's infix precedence, if it is a binary operator.
    #[must_use]
    pub fn infix_precedence(&self) -> Option<i32> {
        self.head().and_then(pratt::infix_precedence)
    }
}

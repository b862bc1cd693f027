//! PartiQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression
//! parsing for PartiQL: SQL extended with nested and semi-structured
//! data, bags, path navigation, and PIVOT/UNPIVOT.
//!
//! # Parsing approach
//!
//! Parsing runs in two stages. The token stream is first parsed into a
//! uniform intermediate tree whose nodes carry a categorical kind, the
//! originating token, ordered children, and the unconsumed token
//! suffix; a second pass validates the tree structurally and rewrites
//! it into the typed AST. Statements and clauses are parsed by
//! dedicated recursive-descent methods; expressions use a Pratt
//! (top-down operator precedence) loop.
//!
//! # Supported statements
//!
//! | Statement | Notes |
//! |-----------|-------|
//! | `SELECT`  | `DISTINCT`, `VALUE`, FROM join trees with AS/AT/BY aliases, `LET`, `WHERE`, `GROUP [PARTIAL] BY ... [GROUP AS]`, `HAVING`, `ORDER BY`, `LIMIT` |
//! | `PIVOT`   | `PIVOT value AT name FROM ...` with the same trailing clauses |
//! | `WITH`    | `[RECURSIVE]`, `[NOT] MATERIALIZED` bindings |
//! | DML       | `INSERT INTO`, `INSERT INTO ... VALUE ... AT ... ON CONFLICT`, `SET`/`UPDATE`, `REMOVE`, `DELETE FROM`, FROM-prefixed DML, `RETURNING` |
//! | DDL       | `CREATE TABLE`, `DROP TABLE`, `CREATE INDEX`, `DROP INDEX` |
//! | `EXEC`    | bare procedure name with unparenthesized arguments |
//!
//! Any expression is also a valid statement: literals, paths, list /
//! bag / struct constructors, operator applications, sub-queries.
//!
//! # Errors
//!
//! Every failure carries a stable machine code ([`ParseError::code`])
//! and the line/column of the failing token ([`ParseError::span`]).
//! The first error stops the parse; no recovery is attempted.
//!
//! # Cancellation
//!
//! A caller-supplied [`InterruptHandle`] is checked at each entry to
//! the expression parser; once the flag is raised, parsing aborts with
//! an `interrupted` error.

mod build;
mod core;
mod error;
mod node;
mod pratt;
mod types;
mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::ast::{sexp, ExprNode, Sexp, Statement};
use crate::lexer::Lexer;

pub use error::ParseError;

use view::TokenView;

/// A cloneable cooperative-cancellation flag.
///
/// Clones share the flag: raising it from any clone aborts the parse
/// that observes it next.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    /// Creates a new, unraised handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true if the flag has been raised.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Lowers the flag so the handle can be reused.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// PartiQL parser.
///
/// The parser is stateless across calls; each method tokenizes its
/// input, parses a single statement, validates top-level placement,
/// and rejects trailing tokens.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    interrupt: Option<InterruptHandle>,
}

impl Parser {
    /// Creates a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that checks the given interrupt handle at each
    /// expression-parser entry.
    #[must_use]
    pub fn with_interrupt(interrupt: InterruptHandle) -> Self {
        Self {
            interrupt: Some(interrupt),
        }
    }

    /// Parses a single statement into a typed AST node.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the input is not a single valid
    /// statement, with "extra tokens after semicolon" distinguished
    /// from other trailing-token errors.
    pub fn parse_expr_node(&self, source: &str) -> Result<ExprNode, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        debug!(tokens = tokens.len(), "parsing statement");
        let session = core::Session {
            interrupt: self.interrupt.as_ref(),
        };
        let result = session
            .parse_statement_tree(TokenView::new(&tokens))
            .and_then(|tree| build::build_statement(&tree));
        match &result {
            Ok(_) => debug!("statement parsed"),
            Err(e) => debug!(code = e.code(), "parse failed"),
        }
        result
    }

    /// Parses a single statement into the public statement enum.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the input is not a single valid
    /// statement.
    pub fn parse_ast_statement(&self, source: &str) -> Result<Statement, ParseError> {
        Ok(build::classify(self.parse_expr_node(source)?))
    }

    /// Parses a single statement and serializes it to the canonical
    /// s-expression form (version V0).
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the input is not a single valid
    /// statement.
    pub fn parse(&self, source: &str) -> Result<Sexp, ParseError> {
        Ok(sexp::to_sexp(&self.parse_expr_node(source)?))
    }
}

//! # partiql-core
//!
//! A hand-written recursive descent parser for PartiQL, the
//! SQL-compatible query language extended for nested and schemaless
//! data: bags, permissive path navigation, and PIVOT/UNPIVOT.
//!
//! This crate provides:
//! - A tokenizer producing span-annotated tokens with normalized
//!   keyword text
//! - A Pratt (top-down operator precedence) expression parser fused
//!   with keyword-driven statement sub-parsers
//! - A typed AST with source locations on every node
//! - A canonical s-expression serialization of the AST (version V0)
//!
//! ## Parsing a statement
//!
//! ```
//! use partiql_core::{Parser, Statement};
//!
//! let parser = Parser::new();
//! let statement = parser
//!     .parse_ast_statement("SELECT a, b FROM t WHERE a > 1")
//!     .expect("valid query");
//! assert!(matches!(statement, Statement::Query(_)));
//! ```
//!
//! ## Inspecting the AST
//!
//! ```
//! use partiql_core::ast::{ExprKind, NAryOp};
//! use partiql_core::Parser;
//!
//! let node = Parser::new().parse_expr_node("1 + 2 * 3").expect("valid");
//! let ExprKind::NAry { op, operands } = &node.kind else {
//!     panic!("expected operator application");
//! };
//! assert_eq!(*op, NAryOp::Add);
//! assert_eq!(operands.len(), 2);
//! ```
//!
//! ## Canonical s-expression form
//!
//! ```
//! use partiql_core::Parser;
//!
//! let sexp = Parser::new().parse("a + 1").expect("valid");
//! assert_eq!(
//!     sexp.to_string(),
//!     "(+ (id \"a\" case_insensitive unqualified) (lit 1))"
//! );
//! ```
//!
//! ## Cancellation
//!
//! Long parses can be aborted cooperatively: the flag is checked at
//! each entry to the expression parser.
//!
//! ```
//! use partiql_core::{InterruptHandle, Parser};
//!
//! let handle = InterruptHandle::new();
//! let parser = Parser::with_interrupt(handle.clone());
//! handle.interrupt();
//! assert_eq!(parser.parse("1 + 1").unwrap_err().code(), "interrupted");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Sexp, Statement};
pub use parser::{InterruptHandle, ParseError, Parser};

//! Typed AST emitted by the parser.
//!
//! The AST is a sum type over expressions, queries, DML, DDL, and WITH
//! nodes. Every node carries a [`Meta`] container attaching at minimum
//! its source location. [`sexp`] provides the fixed V0 mapping to a
//! canonical s-expression form.

mod expr;
mod meta;
pub mod sexp;
mod statement;
mod types;
mod with;

pub use expr::{
    Aliases, CaseSensitivity, DateValue, ExprKind, ExprNode, FromSource, GroupBy, GroupByItem,
    GroupingStrategy, Join, JoinKind, LetBinding, NAryOp, OrderingSpec, PathComponent, Projection,
    ScopeQualifier, Select, SelectItem, SeqKind, SetQuantifier, SortSpec, TimeValue, TypedOp,
};
pub use meta::Meta;
pub use sexp::Sexp;
pub use statement::{
    Assignment, ConflictAction, Ddl, Dml, DmlOp, OnConflict, ReturningColumn, ReturningElem,
    ReturningMapping, Statement,
};
pub use types::{DataType, TypeName};
pub use with::{With, WithBinding};

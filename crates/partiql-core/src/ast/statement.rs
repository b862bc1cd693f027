//! DML and DDL AST types and the public statement enum.

use super::expr::{ExprNode, FromSource};

/// One SET assignment: `<path> = <expr>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The assignment target (a simple path).
    pub target: ExprNode,
    /// The assigned value.
    pub value: ExprNode,
}

/// The action of an ON CONFLICT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// DO NOTHING.
    DoNothing,
}

/// An ON CONFLICT clause: `ON CONFLICT WHERE <expr> DO NOTHING`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// The conflict condition.
    pub condition: ExprNode,
    /// The action taken on conflict.
    pub action: ConflictAction,
}

/// A single data-manipulation operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DmlOp {
    /// `INSERT INTO <target> <values>`.
    Insert {
        /// The insertion target (a simple path).
        target: ExprNode,
        /// The inserted values expression.
        values: ExprNode,
    },
    /// `INSERT INTO <target> VALUE <expr> [AT <expr>] [ON CONFLICT ...]`.
    InsertValue {
        /// The insertion target (a simple path).
        target: ExprNode,
        /// The inserted value.
        value: ExprNode,
        /// The AT position.
        position: Option<ExprNode>,
        /// The ON CONFLICT clause.
        on_conflict: Option<OnConflict>,
    },
    /// `SET <path> = <expr>, ...`.
    Set {
        /// The assignments, in order.
        assignments: Vec<Assignment>,
    },
    /// `REMOVE <path>`.
    Remove {
        /// The removal target (a simple path).
        target: ExprNode,
    },
    /// `DELETE`.
    Delete,
}

/// RETURNING mapping selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturningMapping {
    /// MODIFIED OLD.
    ModifiedOld,
    /// MODIFIED NEW.
    ModifiedNew,
    /// ALL OLD.
    AllOld,
    /// ALL NEW.
    AllNew,
}

impl ReturningMapping {
    /// Looks up a mapping from normalized keyword text.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "modified_old" => Some(Self::ModifiedOld),
            "modified_new" => Some(Self::ModifiedNew),
            "all_old" => Some(Self::AllOld),
            "all_new" => Some(Self::AllNew),
            _ => None,
        }
    }

    /// Returns the normalized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ModifiedOld => "modified_old",
            Self::ModifiedNew => "modified_new",
            Self::AllOld => "all_old",
            Self::AllNew => "all_new",
        }
    }
}

/// The column selector of a RETURNING element.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturningColumn {
    /// `*`.
    Wildcard,
    /// A path of at most two components.
    Expr(ExprNode),
}

/// One RETURNING element.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturningElem {
    /// Which rows the element maps over.
    pub mapping: ReturningMapping,
    /// The returned column.
    pub column: ReturningColumn,
}

/// A data-manipulation statement: an ordered operation list plus the
/// shared FROM target, WHERE condition, and RETURNING clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Dml {
    /// The operations, in source order.
    pub ops: Vec<DmlOp>,
    /// The target source of the legacy UPDATE / DELETE / FROM forms.
    pub from: Option<FromSource>,
    /// The WHERE condition.
    pub where_clause: Option<ExprNode>,
    /// RETURNING elements, in order.
    pub returning: Vec<ReturningElem>,
}

/// A data-definition statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Ddl {
    /// `CREATE TABLE <name>`.
    CreateTable {
        /// The table name.
        name: String,
    },
    /// `DROP TABLE <name>`.
    DropTable {
        /// The table name.
        name: String,
    },
    /// `CREATE INDEX ON <table> (<path>, ...)`.
    CreateIndex {
        /// The indexed table.
        table: String,
        /// The key paths.
        keys: Vec<ExprNode>,
    },
    /// `DROP INDEX <name> ON <table>`.
    DropIndex {
        /// The index name.
        name: String,
        /// The indexed table.
        table: String,
    },
}

/// A parsed top-level statement, classified for callers that do not
/// want to match on [`ExprNode`](super::expr::ExprNode) kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A query or bare expression.
    Query(ExprNode),
    /// A data-manipulation statement.
    Dml(ExprNode),
    /// A data-definition statement.
    Ddl(ExprNode),
    /// An EXEC statement.
    Exec(ExprNode),
}

impl Statement {
    /// Returns the underlying AST node.
    #[must_use]
    pub const fn node(&self) -> &ExprNode {
        match self {
            Self::Query(node) | Self::Dml(node) | Self::Ddl(node) | Self::Exec(node) => node,
        }
    }
}

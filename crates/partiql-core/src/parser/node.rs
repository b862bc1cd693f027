//! The intermediate parse tree produced by the recursive-descent parser.
//!
//! Every sub-parser returns a [`ParseNode`]: a categorical kind, an
//! optional originating token, ordered children, and the unconsumed
//! token suffix. The AST builder consumes this tree; it is one level
//! more abstract than the token stream and one less than the typed AST.

use crate::lexer::{Span, Token};

use super::error::ParseError;
use super::view::TokenView;

/// The categorical kind of a parse node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Literal or other leaf carried entirely by its token.
    Atom,
    /// Quoted identifier leaf.
    CaseSensitiveAtom,
    /// Regular identifier leaf.
    CaseInsensitiveAtom,
    /// `*` in a select list, or a path demoted from a trailing `.*`.
    ProjectAll,
    /// `[*]` path component.
    PathWildcard,
    /// `.*` path component.
    PathUnpivot,
    /// LET clause.
    Let,
    /// Projection list.
    SelectList,
    /// SELECT VALUE projection.
    SelectValue,
    /// PIVOT projection.
    Pivot,
    /// DISTINCT set quantifier wrapper.
    Distinct,
    /// RECURSIVE marker in WITH.
    Recursive,
    /// MATERIALIZED / NOT MATERIALIZED marker in WITH.
    Materialized,
    /// INNER or CROSS join.
    InnerJoin,
    /// LEFT [OUTER|CROSS] join.
    LeftJoin,
    /// RIGHT [OUTER|CROSS] join.
    RightJoin,
    /// OUTER [CROSS] join.
    OuterJoin,
    /// FROM-prefixed DML target.
    From,
    /// FROM clause; exactly one child, the source tree root.
    FromClause,
    /// Parenthesized nested FROM source.
    FromSourceJoin,
    /// WHERE clause.
    Where,
    /// ORDER BY clause.
    OrderBy,
    /// One ORDER BY item.
    SortSpec,
    /// ASC / DESC marker.
    OrderingSpec,
    /// GROUP BY clause.
    Group,
    /// GROUP PARTIAL BY clause.
    GroupPartial,
    /// HAVING clause.
    Having,
    /// LIMIT clause.
    Limit,
    /// UNPIVOT source.
    Unpivot,
    /// Regular function call.
    Call,
    /// Aggregate call with implicit or explicit ALL.
    CallAgg,
    /// Aggregate call with DISTINCT.
    CallDistinctAgg,
    /// COUNT(*).
    CallAggWildcard,
    /// DATE literal.
    Date,
    /// TIME literal or type.
    Time,
    /// TIME WITH TIME ZONE literal or type.
    TimeWithTimeZone,
    /// Argument or item list container.
    ArgList,
    /// AS alias wrapper (token carries the name).
    AsAlias,
    /// AT alias wrapper (token carries the name).
    AtAlias,
    /// BY alias wrapper (token carries the name).
    ByAlias,
    /// Path navigation; children are the root and its components.
    Path,
    /// Dot path component; exactly one child.
    PathDot,
    /// Bracket path component; exactly one child.
    PathSqb,
    /// Unary operator application.
    Unary,
    /// Binary operator application.
    Binary,
    /// Ternary operator application (BETWEEN, LIKE ... ESCAPE).
    Ternary,
    /// List literal or row constructor.
    List,
    /// Bag literal.
    Bag,
    /// Struct literal.
    Struct,
    /// Struct member; exactly two children.
    Member,
    /// CAST; children are the operand and the type.
    Cast,
    /// Type reference; token carries the name, children the parameters.
    Type,
    /// CASE expression.
    Case,
    /// WHEN arm; exactly two children.
    When,
    /// ELSE arm; exactly one child.
    Else,
    /// INSERT INTO ... <values>.
    Insert,
    /// INSERT INTO ... VALUE ... [AT ...] [ON CONFLICT ...].
    InsertValue,
    /// REMOVE op.
    Remove,
    /// SET op with ASSIGNMENT children.
    Set,
    /// Legacy UPDATE target wrapper.
    Update,
    /// DELETE op.
    Delete,
    /// One SET assignment; exactly two children.
    Assignment,
    /// CHECK wrapper for ON CONFLICT conditions.
    Check,
    /// ON CONFLICT clause.
    OnConflict,
    /// Conflict action (token carries `do_nothing`).
    ConflictAction,
    /// Container for consecutive DML operations.
    DmlList,
    /// RETURNING clause.
    Returning,
    /// One RETURNING element; mapping and column children.
    ReturningElem,
    /// RETURNING mapping (token carries `modified_old` etc.).
    ReturningMapping,
    /// `*` column in RETURNING.
    ReturningWildcard,
    /// CREATE TABLE; token carries the table name.
    CreateTable,
    /// DROP TABLE; token carries the table name.
    DropTable,
    /// DROP INDEX; children are the index and table identifiers.
    DropIndex,
    /// CREATE INDEX; children are the table identifier and key paths.
    CreateIndex,
    /// Positional parameter.
    Parameter,
    /// EXEC; token carries the procedure name, children the arguments.
    Exec,
    /// TIME precision wrapper (token carries the integer literal).
    Precision,
    /// WITH query.
    With,
}

impl NodeKind {
    /// Returns true for join nodes.
    #[must_use]
    pub const fn is_join(&self) -> bool {
        matches!(
            self,
            Self::InnerJoin | Self::LeftJoin | Self::RightJoin | Self::OuterJoin
        )
    }

    /// Returns true for tags that may appear only at the top level of a
    /// statement (or, for DML, directly beneath a `DmlList`).
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        matches!(
            self,
            Self::Insert
                | Self::InsertValue
                | Self::Remove
                | Self::Set
                | Self::Update
                | Self::Delete
                | Self::DmlList
                | Self::CreateTable
                | Self::DropTable
                | Self::CreateIndex
                | Self::DropIndex
                | Self::Exec
        )
    }

    /// Returns true for data-manipulation tags.
    #[must_use]
    pub const fn is_dml(&self) -> bool {
        matches!(
            self,
            Self::Insert
                | Self::InsertValue
                | Self::Remove
                | Self::Set
                | Self::Update
                | Self::Delete
                | Self::DmlList
        )
    }
}

/// A node of the intermediate parse tree.
///
/// Nodes are immutable once produced; sub-parsers return a new node
/// with a new token suffix rather than mutating their input. The
/// `remaining` view is always a suffix of the ancestor's input.
#[derive(Debug, Clone)]
pub struct ParseNode<'a> {
    /// The categorical kind.
    pub kind: NodeKind,
    /// The originating token, when one identifies the node.
    pub token: Option<Token>,
    /// Ordered children, produced left to right.
    pub children: Vec<ParseNode<'a>>,
    /// The unconsumed token suffix.
    pub remaining: TokenView<'a>,
}

impl<'a> ParseNode<'a> {
    /// Creates a leaf node with no token.
    #[must_use]
    pub const fn new(kind: NodeKind, remaining: TokenView<'a>) -> Self {
        Self {
            kind,
            token: None,
            children: Vec::new(),
            remaining,
        }
    }

    /// Creates a leaf node carrying its originating token.
    #[must_use]
    pub const fn with_token(kind: NodeKind, token: Token, remaining: TokenView<'a>) -> Self {
        Self {
            kind,
            token: Some(token),
            children: Vec::new(),
            remaining,
        }
    }

    /// Returns a copy of this node with the given children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<ParseNode<'a>>) -> Self {
        self.children = children;
        self
    }

    /// Returns a copy of this node with a new token suffix.
    #[must_use]
    pub fn with_remaining(mut self, remaining: TokenView<'a>) -> Self {
        self.remaining = remaining;
        self
    }

    /// Returns the span of the originating token, or of the first
    /// descendant that has one.
    #[must_use]
    pub fn span(&self) -> Span {
        if let Some(token) = &self.token {
            return token.span;
        }
        self.children
            .iter()
            .map(ParseNode::span)
            .next()
            .unwrap_or_default()
    }

    /// Returns the `i`-th child or a `malformed parse tree` error.
    ///
    /// # Errors
    ///
    /// Returns `MalformedParseTree` when the child is absent; this is
    /// an implementation-contract error, never a user-facing one.
    pub fn child(&self, i: usize) -> Result<&ParseNode<'a>, ParseError> {
        self.children.get(i).ok_or_else(|| self.malformed("missing child"))
    }

    /// Creates a `malformed parse tree` error anchored at this node.
    #[must_use]
    pub fn malformed(&self, message: &str) -> ParseError {
        ParseError::MalformedParseTree {
            message: format!("{message} in {:?} node", self.kind),
            span: self.span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_attributes() {
        assert!(NodeKind::LeftJoin.is_join());
        assert!(!NodeKind::FromClause.is_join());

        assert!(NodeKind::CreateTable.is_top_level());
        assert!(NodeKind::Exec.is_top_level());
        assert!(!NodeKind::SelectList.is_top_level());

        assert!(NodeKind::DmlList.is_dml());
        assert!(NodeKind::Set.is_dml());
        assert!(!NodeKind::CreateTable.is_dml());
        assert!(!NodeKind::Exec.is_dml());
    }

    #[test]
    fn test_child_access() {
        let tokens = vec![crate::lexer::Token::new(
            crate::lexer::TokenKind::Eof,
            Span::default(),
        )];
        let view = TokenView::new(&tokens);
        let leaf = ParseNode::new(NodeKind::Atom, view);
        let parent = ParseNode::new(NodeKind::PathDot, view).with_children(vec![leaf]);

        assert!(parent.child(0).is_ok());
        let err = parent.child(1).unwrap_err();
        assert_eq!(err.code(), "malformed_parse_tree");
    }
}

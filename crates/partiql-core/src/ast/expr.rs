//! Expression and query AST types.

use core::fmt;

use crate::lexer::LiteralValue;

use super::meta::Meta;
use super::statement::{Ddl, Dml};
use super::types::DataType;
use super::with::With;

/// Case sensitivity of a variable reference or path component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    /// Matches bindings exactly.
    CaseSensitive,
    /// Matches bindings ignoring case.
    CaseInsensitive,
}

/// Scope qualifier of a variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeQualifier {
    /// Normal lookup.
    Unqualified,
    /// `@`-qualified: lexical scope is searched first.
    LocalsFirst,
}

/// Set quantifier on SELECT and aggregate calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetQuantifier {
    /// ALL (the default).
    #[default]
    All,
    /// DISTINCT.
    Distinct,
}

/// The kind of a sequence literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqKind {
    /// Ordered list (`[...]`).
    List,
    /// Unordered bag (`<< ... >>`).
    Bag,
    /// S-expression sequence.
    Sexp,
}

impl SeqKind {
    /// Returns the normalized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Bag => "bag",
            Self::Sexp => "sexp",
        }
    }
}

/// N-ary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NAryOp {
    /// Unary negation.
    Neg,
    /// Logical NOT.
    Not,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Modulo.
    Mod,
    /// String concatenation.
    Concat,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// Membership test.
    In,
    /// Range test (three operands).
    Between,
    /// Pattern match (two or three operands).
    Like,
    /// UNION.
    Union,
    /// UNION ALL.
    UnionAll,
    /// INTERSECT.
    Intersect,
    /// INTERSECT ALL.
    IntersectAll,
    /// EXCEPT.
    Except,
    /// EXCEPT ALL.
    ExceptAll,
}

impl NAryOp {
    /// Returns the canonical operator spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "not",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Concat => "||",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::In => "in",
            Self::Between => "between",
            Self::Like => "like",
            Self::Union => "union",
            Self::UnionAll => "union_all",
            Self::Intersect => "intersect",
            Self::IntersectAll => "intersect_all",
            Self::Except => "except",
            Self::ExceptAll => "except_all",
        }
    }
}

impl fmt::Display for NAryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed operators carrying a data type operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedOp {
    /// CAST(expr AS type).
    Cast,
    /// expr IS type.
    Is,
}

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathComponent {
    /// `.field` or `[expr]`.
    Expr {
        /// The component expression (a string literal for dot steps).
        expr: Box<ExprNode>,
        /// How the component matches bindings.
        case: CaseSensitivity,
    },
    /// `[*]`.
    Wildcard,
    /// `.*`.
    Unpivot,
}

/// A DATE literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    /// Year.
    pub year: i32,
    /// Month (1-12).
    pub month: u32,
    /// Day of month (1-31, calendar-valid).
    pub day: u32,
}

/// A TIME literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeValue {
    /// Hour (0-23).
    pub hour: u32,
    /// Minute (0-59).
    pub minute: u32,
    /// Second (0-59).
    pub second: u32,
    /// Nanoseconds within the second.
    pub nanosecond: u32,
    /// Fractional-second precision, explicit or derived (0-9).
    pub precision: u32,
    /// True for TIME WITH TIME ZONE.
    pub with_time_zone: bool,
    /// UTC offset in minutes, when the value carries one.
    pub tz_offset_minutes: Option<i32>,
}

/// An expression AST node with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    /// The node kind.
    pub kind: ExprKind,
    /// Attached metadata (at minimum the source location).
    pub meta: Meta,
}

impl ExprNode {
    /// Creates a node with the given kind and metadata.
    #[must_use]
    pub const fn new(kind: ExprKind, meta: Meta) -> Self {
        Self { kind, meta }
    }
}

/// The closed set of expression, query, and statement node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal value.
    Lit(LiteralValue),
    /// The MISSING literal.
    Missing,
    /// A variable reference.
    VarRef {
        /// The referenced name, as written.
        name: String,
        /// How the name matches bindings.
        case: CaseSensitivity,
        /// Scope qualifier (`@`).
        qualifier: ScopeQualifier,
    },
    /// A positional parameter (`?`).
    Parameter {
        /// 1-based ordinal.
        ordinal: i64,
    },
    /// An n-ary operator application.
    NAry {
        /// The operator.
        op: NAryOp,
        /// The operands, left to right.
        operands: Vec<ExprNode>,
    },
    /// A typed operator (CAST / IS).
    Typed {
        /// The operator.
        op: TypedOp,
        /// The operand expression.
        expr: Box<ExprNode>,
        /// The type operand.
        data_type: DataType,
    },
    /// Path navigation.
    Path {
        /// The root expression.
        root: Box<ExprNode>,
        /// The navigation steps, in order.
        components: Vec<PathComponent>,
    },
    /// A CASE expression; simple when `operand` is present, searched
    /// otherwise.
    Case {
        /// Comparison operand of a simple CASE.
        operand: Option<Box<ExprNode>>,
        /// WHEN/THEN arms.
        whens: Vec<(ExprNode, ExprNode)>,
        /// ELSE result.
        else_clause: Option<Box<ExprNode>>,
    },
    /// A sequence literal.
    Seq {
        /// List, bag, or sexp.
        kind: SeqKind,
        /// The elements.
        items: Vec<ExprNode>,
    },
    /// A struct literal.
    Struct {
        /// Key/value members, in source order.
        fields: Vec<(ExprNode, ExprNode)>,
    },
    /// A function call.
    Call {
        /// The function name, normalized.
        name: String,
        /// The arguments.
        args: Vec<ExprNode>,
    },
    /// An aggregate call.
    CallAgg {
        /// The aggregate name, normalized.
        name: String,
        /// ALL or DISTINCT.
        quantifier: SetQuantifier,
        /// The single argument.
        arg: Box<ExprNode>,
    },
    /// `COUNT(*)`.
    CountStar,
    /// A DATE literal.
    DateLit(DateValue),
    /// A TIME literal.
    TimeLit(TimeValue),
    /// A SELECT (or PIVOT) query.
    Select(Box<Select>),
    /// A WITH query.
    With(Box<With>),
    /// A data-manipulation statement.
    Dml(Box<Dml>),
    /// A data-definition statement.
    Ddl(Ddl),
    /// An EXEC statement.
    Exec {
        /// The stored-procedure name.
        procedure: String,
        /// The arguments.
        args: Vec<ExprNode>,
    },
}

/// The projection of a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A list of projection items.
    List(Vec<SelectItem>),
    /// SELECT VALUE.
    Value(ExprNode),
    /// PIVOT value AT name.
    Pivot {
        /// The value expression.
        value: ExprNode,
        /// The name expression.
        at: ExprNode,
    },
}

/// One item of a projection list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// An expression with an optional alias.
    Expr {
        /// The projected expression.
        expr: ExprNode,
        /// Alias, when one was written.
        alias: Option<String>,
    },
    /// `*` (when `expr` is absent) or `path.*`.
    ProjectAll {
        /// The path before the trailing `.*`, if any.
        expr: Option<ExprNode>,
    },
}

/// AS/AT/BY aliases attached to a FROM source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aliases {
    /// AS alias (the AS keyword is optional in the grammar).
    pub as_alias: Option<String>,
    /// AT alias.
    pub at_alias: Option<String>,
    /// BY alias.
    pub by_alias: Option<String>,
}

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER (and CROSS) join.
    Inner,
    /// LEFT [OUTER] join.
    Left,
    /// RIGHT [OUTER] join.
    Right,
    /// OUTER join.
    Outer,
}

impl JoinKind {
    /// Returns the normalized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Outer => "outer",
        }
    }
}

/// A join between two FROM sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// The join kind.
    pub kind: JoinKind,
    /// The left source.
    pub left: FromSource,
    /// The right source.
    pub right: FromSource,
    /// The join condition; a synthesized `true` for cross joins.
    pub on: ExprNode,
    /// Metadata; `implicit_cross_join` is set for comma joins.
    pub meta: Meta,
}

/// A source in the FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    /// An expression source with its aliases.
    Expr {
        /// The source expression.
        expr: Box<ExprNode>,
        /// AS/AT/BY aliases.
        aliases: Aliases,
    },
    /// UNPIVOT of an expression.
    Unpivot {
        /// The unpivoted expression.
        expr: Box<ExprNode>,
        /// AS/AT/BY aliases.
        aliases: Aliases,
    },
    /// A join of two sources.
    Join(Box<Join>),
}

/// A LET binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    /// The bound expression.
    pub expr: ExprNode,
    /// The introduced name.
    pub name: String,
}

/// Grouping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingStrategy {
    /// GROUP BY.
    #[default]
    Full,
    /// GROUP PARTIAL BY.
    Partial,
}

/// One GROUP BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByItem {
    /// The grouping expression.
    pub expr: ExprNode,
    /// Optional AS alias.
    pub alias: Option<String>,
}

/// The GROUP BY clause.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    /// FULL or PARTIAL grouping.
    pub strategy: GroupingStrategy,
    /// The grouping items.
    pub items: Vec<GroupByItem>,
    /// GROUP AS collection name.
    pub group_as: Option<String>,
}

/// Ordering direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingSpec {
    /// Ascending (the default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl OrderingSpec {
    /// Returns the normalized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    /// The sort expression.
    pub expr: ExprNode,
    /// The direction.
    pub ordering: OrderingSpec,
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// ALL or DISTINCT.
    pub quantifier: SetQuantifier,
    /// The projection.
    pub projection: Projection,
    /// The FROM source tree.
    pub from: Option<FromSource>,
    /// LET bindings, in order.
    pub let_bindings: Vec<LetBinding>,
    /// The WHERE condition.
    pub where_clause: Option<ExprNode>,
    /// The GROUP BY clause.
    pub group_by: Option<GroupBy>,
    /// The HAVING condition.
    pub having: Option<ExprNode>,
    /// ORDER BY items.
    pub order_by: Vec<SortSpec>,
    /// The LIMIT expression.
    pub limit: Option<ExprNode>,
}

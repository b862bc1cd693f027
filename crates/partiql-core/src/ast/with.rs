//! WITH query AST types.

use super::expr::ExprNode;

/// One WITH binding: `<name> AS [NOT] MATERIALIZED ( <query> )`.
#[derive(Debug, Clone, PartialEq)]
pub struct WithBinding {
    /// The introduced name.
    pub name: String,
    /// False only when NOT MATERIALIZED was written.
    pub materialized: bool,
    /// The bound query.
    pub query: ExprNode,
}

/// A WITH query: `WITH [RECURSIVE] <binding>, ... <query>`.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    /// True when RECURSIVE was written.
    pub recursive: bool,
    /// The bindings, in order.
    pub bindings: Vec<WithBinding>,
    /// The final query.
    pub body: ExprNode,
}

//! AST construction from the intermediate parse tree.
//!
//! Every parse-node tag has a deterministic rewrite into AST nodes.
//! Structural violations (wrong child count, wrong child kind) raise
//! `malformed parse tree`; those are implementation-contract errors,
//! never user-facing ones. User-facing checks performed here are the
//! select-list star rules, GROUP BY literal rejection, and top-level
//! statement placement.

use crate::ast::{
    Aliases, Assignment, CaseSensitivity, ConflictAction, DataType, Ddl, Dml, DmlOp, ExprKind,
    ExprNode, FromSource, GroupBy, GroupByItem, GroupingStrategy, Join, JoinKind, LetBinding, Meta,
    NAryOp, OnConflict, OrderingSpec, PathComponent, Projection, ReturningColumn, ReturningElem,
    ReturningMapping, ScopeQualifier, Select, SelectItem, SeqKind, SetQuantifier, SortSpec,
    Statement, TypeName, TypedOp, With, WithBinding,
};
use crate::lexer::{LiteralValue, TokenKind};

use super::error::ParseError;
use super::node::{NodeKind, ParseNode};
use super::types;

type BuildResult = Result<ExprNode, ParseError>;

/// Validates top-level placement and builds the typed AST.
pub(super) fn build_statement(root: &ParseNode<'_>) -> BuildResult {
    validate_top_level(root)?;
    build_expr(root)
}

/// Classifies a built node into the public statement enum.
pub(super) fn classify(node: ExprNode) -> Statement {
    match node.kind {
        ExprKind::Dml(_) => Statement::Dml(node),
        ExprKind::Ddl(_) => Statement::Ddl(node),
        ExprKind::Exec { .. } => Statement::Exec(node),
        _ => Statement::Query(node),
    }
}

// === Top-level validation ===

/// A top-level-only tag may appear only at the tree root, or directly
/// beneath a root DML_LIST for DML tags.
fn validate_top_level(root: &ParseNode<'_>) -> Result<(), ParseError> {
    for child in &root.children {
        let allowed = root.kind == NodeKind::DmlList && child.kind.is_dml();
        if child.kind.is_top_level() && !allowed {
            return Err(ParseError::UnexpectedTerm { span: child.span() });
        }
        validate_no_top_level(child)?;
    }
    Ok(())
}

fn validate_no_top_level(node: &ParseNode<'_>) -> Result<(), ParseError> {
    for child in &node.children {
        if child.kind.is_top_level() {
            return Err(ParseError::UnexpectedTerm { span: child.span() });
        }
        validate_no_top_level(child)?;
    }
    Ok(())
}

// === Expressions ===

fn meta_of(node: &ParseNode<'_>) -> Meta {
    Meta::at(node.span())
}

fn token_text(node: &ParseNode<'_>) -> String {
    node.token
        .as_ref()
        .and_then(|t| t.text())
        .unwrap_or_default()
        .to_owned()
}

fn synthesized_true() -> ExprNode {
    ExprNode::new(ExprKind::Lit(LiteralValue::Boolean(true)), Meta::none())
}

fn build_expr(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    match node.kind {
        NodeKind::Atom => build_atom(node),
        NodeKind::CaseInsensitiveAtom => Ok(ExprNode::new(
            ExprKind::VarRef {
                name: token_text(node),
                case: CaseSensitivity::CaseInsensitive,
                qualifier: ScopeQualifier::Unqualified,
            },
            meta,
        )),
        NodeKind::CaseSensitiveAtom => Ok(ExprNode::new(
            ExprKind::VarRef {
                name: token_text(node),
                case: CaseSensitivity::CaseSensitive,
                qualifier: ScopeQualifier::Unqualified,
            },
            meta,
        )),
        NodeKind::Parameter => {
            let ordinal = node
                .token
                .as_ref()
                .and_then(|t| t.value.as_ref())
                .and_then(LiteralValue::as_i64)
                .ok_or_else(|| node.malformed("parameter without ordinal"))?;
            Ok(ExprNode::new(ExprKind::Parameter { ordinal }, meta))
        }
        NodeKind::Unary => build_unary(node),
        NodeKind::Binary => build_binary(node),
        NodeKind::Ternary => build_ternary(node),
        NodeKind::Path => build_path(node),
        NodeKind::List => build_seq(node, SeqKind::List),
        NodeKind::Bag => build_seq(node, SeqKind::Bag),
        NodeKind::Struct => build_struct(node),
        NodeKind::Call => build_call(node),
        NodeKind::CallAgg => build_call_agg(node, SetQuantifier::All),
        NodeKind::CallDistinctAgg => build_call_agg(node, SetQuantifier::Distinct),
        NodeKind::CallAggWildcard => Ok(ExprNode::new(ExprKind::CountStar, meta)),
        NodeKind::Cast => {
            let operand = build_expr(node.child(0)?)?;
            let data_type = build_data_type(node.child(1)?)?;
            Ok(ExprNode::new(
                ExprKind::Typed {
                    op: TypedOp::Cast,
                    expr: Box::new(operand),
                    data_type,
                },
                meta,
            ))
        }
        NodeKind::Case => build_case(node),
        NodeKind::Date => build_date(node),
        NodeKind::Time | NodeKind::TimeWithTimeZone => build_time(node),
        NodeKind::SelectList | NodeKind::SelectValue | NodeKind::Pivot => build_select(node),
        NodeKind::With => build_with(node),
        NodeKind::Insert
        | NodeKind::InsertValue
        | NodeKind::Set
        | NodeKind::Remove
        | NodeKind::Delete
        | NodeKind::DmlList => build_dml(node),
        NodeKind::CreateTable => Ok(ExprNode::new(
            ExprKind::Ddl(Ddl::CreateTable {
                name: token_text(node),
            }),
            meta,
        )),
        NodeKind::DropTable => Ok(ExprNode::new(
            ExprKind::Ddl(Ddl::DropTable {
                name: token_text(node),
            }),
            meta,
        )),
        NodeKind::CreateIndex => {
            let table = token_text(node.child(0)?);
            let keys = node.children[1..]
                .iter()
                .map(build_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ExprNode::new(
                ExprKind::Ddl(Ddl::CreateIndex { table, keys }),
                meta,
            ))
        }
        NodeKind::DropIndex => {
            let name = token_text(node.child(0)?);
            let table = token_text(node.child(1)?);
            Ok(ExprNode::new(
                ExprKind::Ddl(Ddl::DropIndex { name, table }),
                meta,
            ))
        }
        NodeKind::Exec => {
            let args = node
                .children
                .iter()
                .map(build_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ExprNode::new(
                ExprKind::Exec {
                    procedure: token_text(node),
                    args,
                },
                meta,
            ))
        }
        _ => Err(node.malformed("node is not an expression")),
    }
}

fn build_atom(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let token = node
        .token
        .as_ref()
        .ok_or_else(|| node.malformed("atom without token"))?;
    let kind = match token.kind {
        TokenKind::Literal | TokenKind::IonLiteral => {
            let value = token
                .value
                .clone()
                .ok_or_else(|| node.malformed("literal without value"))?;
            ExprKind::Lit(value)
        }
        TokenKind::Null => ExprKind::Lit(LiteralValue::Null),
        TokenKind::Missing => ExprKind::Missing,
        TokenKind::TrimSpecification | TokenKind::DatePart => ExprKind::Lit(LiteralValue::Text(
            token.text().unwrap_or_default().to_owned(),
        )),
        _ => return Err(node.malformed("unexpected atom token")),
    };
    Ok(ExprNode::new(kind, meta))
}

fn build_unary(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let operand = build_expr(node.child(0)?)?;
    match node.token.as_ref().and_then(|t| t.text()).unwrap_or_default() {
        // `@` rewrites its identifier into a lexically scoped reference.
        "@" => match operand.kind {
            ExprKind::VarRef { name, case, .. } => Ok(ExprNode::new(
                ExprKind::VarRef {
                    name,
                    case,
                    qualifier: ScopeQualifier::LocalsFirst,
                },
                meta,
            )),
            _ => Err(node.malformed("@ applied to non-identifier")),
        },
        "not" => Ok(nary(NAryOp::Not, vec![operand], meta)),
        "-" => Ok(nary(NAryOp::Neg, vec![operand], meta)),
        "+" => Ok(operand),
        _ => Err(node.malformed("unknown unary operator")),
    }
}

fn nary(op: NAryOp, operands: Vec<ExprNode>, meta: Meta) -> ExprNode {
    ExprNode::new(ExprKind::NAry { op, operands }, meta)
}

/// Wraps a positive operator application in NOT, preserving the
/// negated surface form for later lowering passes.
fn negated(op: NAryOp, operands: Vec<ExprNode>, meta: Meta) -> ExprNode {
    let positive = nary(op, operands, meta);
    ExprNode::new(
        ExprKind::NAry {
            op: NAryOp::Not,
            operands: vec![positive],
        },
        meta.with_legacy_logical_not(),
    )
}

fn build_binary(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let op_text = node.token.as_ref().and_then(|t| t.text()).unwrap_or_default();

    if op_text == "is" || op_text == "is_not" {
        let operand = build_expr(node.child(0)?)?;
        let data_type = build_data_type(node.child(1)?)?;
        let is_node = ExprNode::new(
            ExprKind::Typed {
                op: TypedOp::Is,
                expr: Box::new(operand),
                data_type,
            },
            meta,
        );
        if op_text == "is" {
            return Ok(is_node);
        }
        return Ok(ExprNode::new(
            ExprKind::NAry {
                op: NAryOp::Not,
                operands: vec![is_node],
            },
            meta.with_legacy_logical_not(),
        ));
    }

    let left = build_expr(node.child(0)?)?;
    let right = build_expr(node.child(1)?)?;
    let operands = vec![left, right];
    let built = match op_text {
        "+" => nary(NAryOp::Add, operands, meta),
        "-" => nary(NAryOp::Sub, operands, meta),
        "/" => nary(NAryOp::Div, operands, meta),
        "%" => nary(NAryOp::Mod, operands, meta),
        "||" => nary(NAryOp::Concat, operands, meta),
        "=" => nary(NAryOp::Eq, operands, meta),
        "<>" => nary(NAryOp::Ne, operands, meta),
        "<" => nary(NAryOp::Lt, operands, meta),
        "<=" => nary(NAryOp::Lte, operands, meta),
        ">" => nary(NAryOp::Gt, operands, meta),
        ">=" => nary(NAryOp::Gte, operands, meta),
        "and" => nary(NAryOp::And, operands, meta),
        "or" => nary(NAryOp::Or, operands, meta),
        "in" => nary(NAryOp::In, operands, meta),
        "not_in" => negated(NAryOp::In, operands, meta),
        "like" => nary(NAryOp::Like, operands, meta),
        "not_like" => negated(NAryOp::Like, operands, meta),
        "union" => nary(NAryOp::Union, operands, meta),
        "union_all" => nary(NAryOp::UnionAll, operands, meta),
        "intersect" => nary(NAryOp::Intersect, operands, meta),
        "intersect_all" => nary(NAryOp::IntersectAll, operands, meta),
        "except" => nary(NAryOp::Except, operands, meta),
        "except_all" => nary(NAryOp::ExceptAll, operands, meta),
        _ => {
            // `*` carries no text; the token kind identifies it.
            if node.token.as_ref().is_some_and(|t| t.kind == TokenKind::Star) {
                nary(NAryOp::Mul, operands, meta)
            } else {
                return Err(node.malformed("unknown binary operator"));
            }
        }
    };
    Ok(built)
}

fn build_ternary(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let first = build_expr(node.child(0)?)?;
    let second = build_expr(node.child(1)?)?;
    let third = build_expr(node.child(2)?)?;
    let operands = vec![first, second, third];
    match node.token.as_ref().and_then(|t| t.text()).unwrap_or_default() {
        "between" => Ok(nary(NAryOp::Between, operands, meta)),
        "not_between" => Ok(negated(NAryOp::Between, operands, meta)),
        "like" => Ok(nary(NAryOp::Like, operands, meta)),
        "not_like" => Ok(negated(NAryOp::Like, operands, meta)),
        _ => Err(node.malformed("unknown ternary operator")),
    }
}

fn build_path(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let root = build_expr(node.child(0)?)?;
    let mut components = Vec::with_capacity(node.children.len() - 1);
    for component in &node.children[1..] {
        components.push(build_path_component(component)?);
    }
    Ok(ExprNode::new(
        ExprKind::Path {
            root: Box::new(root),
            components,
        },
        meta,
    ))
}

fn build_path_component(node: &ParseNode<'_>) -> Result<PathComponent, ParseError> {
    match node.kind {
        NodeKind::PathDot => {
            let child = node.child(0)?;
            let case = match child.kind {
                NodeKind::CaseSensitiveAtom => CaseSensitivity::CaseSensitive,
                NodeKind::CaseInsensitiveAtom => CaseSensitivity::CaseInsensitive,
                _ => return Err(node.malformed("dot component without identifier")),
            };
            let name = token_text(child);
            Ok(PathComponent::Expr {
                expr: Box::new(ExprNode::new(
                    ExprKind::Lit(LiteralValue::Text(name)),
                    meta_of(child),
                )),
                case,
            })
        }
        NodeKind::PathSqb => Ok(PathComponent::Expr {
            expr: Box::new(build_expr(node.child(0)?)?),
            case: CaseSensitivity::CaseSensitive,
        }),
        NodeKind::PathWildcard => Ok(PathComponent::Wildcard),
        NodeKind::PathUnpivot => Ok(PathComponent::Unpivot),
        _ => Err(node.malformed("unexpected path component")),
    }
}

fn build_seq(node: &ParseNode<'_>, kind: SeqKind) -> BuildResult {
    let items = node
        .children
        .iter()
        .map(build_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExprNode::new(ExprKind::Seq { kind, items }, meta_of(node)))
}

fn build_struct(node: &ParseNode<'_>) -> BuildResult {
    let mut fields = Vec::with_capacity(node.children.len());
    for member in &node.children {
        if member.kind != NodeKind::Member || member.children.len() != 2 {
            return Err(node.malformed("struct member must have key and value"));
        }
        let key = build_expr(&member.children[0])?;
        let value = build_expr(&member.children[1])?;
        fields.push((key, value));
    }
    Ok(ExprNode::new(ExprKind::Struct { fields }, meta_of(node)))
}

fn build_call(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let name = node
        .token
        .as_ref()
        .and_then(|t| t.text())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let args = node
        .children
        .iter()
        .map(build_expr)
        .collect::<Result<Vec<_>, _>>()?;

    // list/bag/sexp constructors fold into sequence literals.
    let seq_kind = match name.as_str() {
        "list" => Some(SeqKind::List),
        "bag" => Some(SeqKind::Bag),
        "sexp" => Some(SeqKind::Sexp),
        _ => None,
    };
    if let Some(kind) = seq_kind {
        return Ok(ExprNode::new(ExprKind::Seq { kind, items: args }, meta));
    }
    Ok(ExprNode::new(ExprKind::Call { name, args }, meta))
}

fn build_call_agg(node: &ParseNode<'_>, quantifier: SetQuantifier) -> BuildResult {
    let name = node
        .token
        .as_ref()
        .and_then(|t| t.text())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if node.children.len() != 1 {
        return Err(node.malformed("aggregate call must have one argument"));
    }
    let arg = build_expr(&node.children[0])?;
    Ok(ExprNode::new(
        ExprKind::CallAgg {
            name,
            quantifier,
            arg: Box::new(arg),
        },
        meta_of(node),
    ))
}

fn build_case(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let mut operand = None;
    let mut whens = Vec::new();
    let mut else_clause = None;

    for child in &node.children {
        match child.kind {
            NodeKind::When => {
                let condition = build_expr(child.child(0)?)?;
                let result = build_expr(child.child(1)?)?;
                whens.push((condition, result));
            }
            NodeKind::Else => {
                else_clause = Some(Box::new(build_expr(child.child(0)?)?));
            }
            _ if whens.is_empty() && operand.is_none() && else_clause.is_none() => {
                operand = Some(Box::new(build_expr(child)?));
            }
            _ => return Err(node.malformed("unexpected CASE child")),
        }
    }
    if whens.is_empty() {
        return Err(node.malformed("CASE without WHEN arms"));
    }
    Ok(ExprNode::new(
        ExprKind::Case {
            operand,
            whens,
            else_clause,
        },
        meta,
    ))
}

fn build_date(node: &ParseNode<'_>) -> BuildResult {
    let token = node
        .token
        .as_ref()
        .ok_or_else(|| node.malformed("date literal without token"))?;
    let text = token
        .value
        .as_ref()
        .and_then(LiteralValue::as_str)
        .unwrap_or_default();
    let value = types::validate_date(text, token.span)?;
    Ok(ExprNode::new(ExprKind::DateLit(value), meta_of(node)))
}

fn build_time(node: &ParseNode<'_>) -> BuildResult {
    let token = node
        .token
        .as_ref()
        .ok_or_else(|| node.malformed("time literal without token"))?;
    let text = token
        .value
        .as_ref()
        .and_then(LiteralValue::as_str)
        .unwrap_or_default();
    let precision = match node.children.first() {
        Some(child) if child.kind == NodeKind::Precision => child
            .token
            .as_ref()
            .and_then(|t| t.value.as_ref())
            .and_then(LiteralValue::as_i64)
            .map(|p| p as u32),
        Some(other) => return Err(other.malformed("unexpected time literal child")),
        None => None,
    };
    let with_time_zone = node.kind == NodeKind::TimeWithTimeZone;
    let value = types::validate_time(text, precision, with_time_zone, token.span)?;
    Ok(ExprNode::new(ExprKind::TimeLit(value), meta_of(node)))
}

fn build_data_type(node: &ParseNode<'_>) -> Result<DataType, ParseError> {
    if node.kind != NodeKind::Type {
        return Err(node.malformed("expected type node"));
    }
    let text = node.token.as_ref().and_then(|t| t.text()).unwrap_or_default();
    let name = if text == "time_with_time_zone" {
        TypeName::TimeWithTimeZone
    } else {
        TypeName::from_keyword(text).ok_or_else(|| node.malformed("unknown type name"))?
    };
    let mut args = Vec::with_capacity(node.children.len());
    for child in &node.children {
        let value = child
            .token
            .as_ref()
            .and_then(|t| t.value.as_ref())
            .and_then(LiteralValue::as_i64)
            .ok_or_else(|| child.malformed("type parameter without value"))?;
        args.push(value as u64);
    }
    Ok(DataType::with_args(name, args))
}

// === SELECT ===

fn build_select(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let mut quantifier = SetQuantifier::All;
    let mut clause_start = 1;

    let projection = match node.kind {
        NodeKind::Pivot => {
            let value = build_expr(node.child(0)?)?;
            let at = build_expr(node.child(1)?)?;
            clause_start = 2;
            Projection::Pivot { value, at }
        }
        NodeKind::SelectList | NodeKind::SelectValue => {
            let mut proj_node = node.child(0)?;
            if proj_node.kind == NodeKind::Distinct {
                quantifier = SetQuantifier::Distinct;
                proj_node = proj_node.child(0)?;
            }
            if node.kind == NodeKind::SelectValue {
                Projection::Value(build_expr(proj_node)?)
            } else {
                Projection::List(build_select_items(proj_node)?)
            }
        }
        _ => return Err(node.malformed("expected select node")),
    };

    let mut select = Select {
        quantifier,
        projection,
        from: None,
        let_bindings: Vec::new(),
        where_clause: None,
        group_by: None,
        having: None,
        order_by: Vec::new(),
        limit: None,
    };

    for clause in &node.children[clause_start..] {
        match clause.kind {
            NodeKind::FromClause => {
                if clause.children.len() != 1 {
                    return Err(clause.malformed("FROM clause must have one source root"));
                }
                select.from = Some(build_from_source(clause.child(0)?)?);
            }
            NodeKind::Let => select.let_bindings = build_let(clause)?,
            NodeKind::Where => select.where_clause = Some(build_expr(clause.child(0)?)?),
            NodeKind::Group | NodeKind::GroupPartial => {
                select.group_by = Some(build_group(clause)?);
            }
            NodeKind::Having => select.having = Some(build_expr(clause.child(0)?)?),
            NodeKind::OrderBy => select.order_by = build_order_by(clause)?,
            NodeKind::Limit => select.limit = Some(build_expr(clause.child(0)?)?),
            _ => return Err(clause.malformed("unexpected SELECT clause")),
        }
    }

    Ok(ExprNode::new(ExprKind::Select(Box::new(select)), meta))
}

/// Builds select-list items, enforcing the star rules: a bare `*` must
/// be alone, `[*]` never appears in a select-list path, and `.*` is
/// only valid as the trailing component of a bracket-free path (where
/// it demotes the path to a projection of all its fields).
fn build_select_items(arg_list: &ParseNode<'_>) -> Result<Vec<SelectItem>, ParseError> {
    if arg_list.kind != NodeKind::ArgList {
        return Err(arg_list.malformed("expected select list"));
    }
    let total = arg_list.children.len();
    let mut items = Vec::with_capacity(total);
    for child in &arg_list.children {
        match child.kind {
            NodeKind::ProjectAll => {
                if total > 1 {
                    return Err(ParseError::AsteriskNotAloneInSelectList { span: child.span() });
                }
                items.push(SelectItem::ProjectAll { expr: None });
            }
            NodeKind::AsAlias => {
                let alias = token_text(child);
                let inner = child.child(0)?;
                check_select_item_path(inner)?;
                items.push(SelectItem::Expr {
                    expr: build_expr(inner)?,
                    alias: Some(alias),
                });
            }
            _ => {
                if let Some(item) = demote_project_all(child)? {
                    items.push(item);
                } else {
                    items.push(SelectItem::Expr {
                        expr: build_expr(child)?,
                        alias: None,
                    });
                }
            }
        }
    }
    Ok(items)
}

/// Rejects `[*]` and non-trailing `.*` inside a select-list path.
fn check_select_item_path(node: &ParseNode<'_>) -> Result<(), ParseError> {
    if node.kind != NodeKind::Path {
        return Ok(());
    }
    let last = node.children.len() - 1;
    for (i, component) in node.children.iter().enumerate().skip(1) {
        match component.kind {
            NodeKind::PathWildcard => {
                return Err(ParseError::CannotMixWildcardsInSelectList {
                    span: component.span(),
                });
            }
            NodeKind::PathUnpivot if i != last => {
                return Err(ParseError::CannotMixWildcardsInSelectList {
                    span: component.span(),
                });
            }
            NodeKind::PathUnpivot => {
                // A trailing `.*` under an alias has nothing to bind
                // the alias to.
                return Err(ParseError::AsteriskNotAloneInSelectList {
                    span: component.span(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Demotes a path with a trailing `.*` (and no bracket components) to
/// a PROJECT_ALL item. Returns `None` when the node is a regular item.
fn demote_project_all(node: &ParseNode<'_>) -> Result<Option<SelectItem>, ParseError> {
    if node.kind != NodeKind::Path {
        return Ok(None);
    }
    let last = node.children.len() - 1;
    let mut has_bracket = false;
    let mut trailing_unpivot = false;
    for (i, component) in node.children.iter().enumerate().skip(1) {
        match component.kind {
            NodeKind::PathWildcard => {
                return Err(ParseError::CannotMixWildcardsInSelectList {
                    span: component.span(),
                });
            }
            NodeKind::PathSqb => has_bracket = true,
            NodeKind::PathUnpivot if i == last => trailing_unpivot = true,
            NodeKind::PathUnpivot => {
                return Err(ParseError::CannotMixWildcardsInSelectList {
                    span: component.span(),
                });
            }
            _ => {}
        }
    }
    if !trailing_unpivot {
        return Ok(None);
    }
    if has_bracket {
        return Err(ParseError::CannotMixWildcardsInSelectList { span: node.span() });
    }

    // Rebuild the path without its trailing `.*`.
    let root = build_expr(node.child(0)?)?;
    let inner_components = &node.children[1..last];
    let expr = if inner_components.is_empty() {
        root
    } else {
        let mut components = Vec::with_capacity(inner_components.len());
        for component in inner_components {
            components.push(build_path_component(component)?);
        }
        ExprNode::new(
            ExprKind::Path {
                root: Box::new(root),
                components,
            },
            meta_of(node),
        )
    };
    Ok(Some(SelectItem::ProjectAll { expr: Some(expr) }))
}

fn build_let(node: &ParseNode<'_>) -> Result<Vec<LetBinding>, ParseError> {
    let mut bindings = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if child.kind != NodeKind::AsAlias {
            return Err(child.malformed("LET binding without alias"));
        }
        bindings.push(LetBinding {
            expr: build_expr(child.child(0)?)?,
            name: token_text(child),
        });
    }
    Ok(bindings)
}

fn build_group(node: &ParseNode<'_>) -> Result<GroupBy, ParseError> {
    let strategy = if node.kind == NodeKind::GroupPartial {
        GroupingStrategy::Partial
    } else {
        GroupingStrategy::Full
    };
    let arg_list = node.child(0)?;
    if arg_list.kind != NodeKind::ArgList {
        return Err(node.malformed("GROUP BY without item list"));
    }
    let mut items = Vec::with_capacity(arg_list.children.len());
    for child in &arg_list.children {
        let item = if child.kind == NodeKind::AsAlias {
            GroupByItem {
                expr: build_expr(child.child(0)?)?,
                alias: Some(token_text(child)),
            }
        } else {
            GroupByItem {
                expr: build_expr(child)?,
                alias: None,
            }
        };
        items.push(item);
    }
    let group_as = match node.children.get(1) {
        Some(child) if child.kind == NodeKind::AsAlias && child.children.is_empty() => {
            Some(token_text(child))
        }
        Some(child) => return Err(child.malformed("unexpected GROUP BY child")),
        None => None,
    };
    Ok(GroupBy {
        strategy,
        items,
        group_as,
    })
}

fn build_order_by(node: &ParseNode<'_>) -> Result<Vec<SortSpec>, ParseError> {
    let mut specs = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if child.kind != NodeKind::SortSpec {
            return Err(child.malformed("expected sort spec"));
        }
        let expr = build_expr(child.child(0)?)?;
        let ordering = match child.children.get(1) {
            Some(spec) if spec.kind == NodeKind::OrderingSpec => {
                match spec.token.as_ref().map(|t| t.kind) {
                    Some(TokenKind::Desc) => OrderingSpec::Desc,
                    _ => OrderingSpec::Asc,
                }
            }
            Some(other) => return Err(other.malformed("unexpected sort spec child")),
            None => OrderingSpec::Asc,
        };
        specs.push(SortSpec { expr, ordering });
    }
    Ok(specs)
}

// === FROM sources ===

fn build_from_source(node: &ParseNode<'_>) -> Result<FromSource, ParseError> {
    // Unwrap alias layers (BY around AT around AS).
    let mut aliases = Aliases::default();
    let mut current = node;
    loop {
        match current.kind {
            NodeKind::ByAlias => {
                aliases.by_alias = Some(token_text(current));
                current = current.child(0)?;
            }
            NodeKind::AtAlias => {
                aliases.at_alias = Some(token_text(current));
                current = current.child(0)?;
            }
            NodeKind::AsAlias => {
                aliases.as_alias = Some(token_text(current));
                current = current.child(0)?;
            }
            _ => break,
        }
    }

    match current.kind {
        NodeKind::Unpivot => Ok(FromSource::Unpivot {
            expr: Box::new(build_expr(current.child(0)?)?),
            aliases,
        }),
        NodeKind::FromSourceJoin => {
            if aliases != Aliases::default() {
                return Err(current.malformed("aliases on parenthesized join"));
            }
            build_from_source(current.child(0)?)
        }
        NodeKind::InnerJoin | NodeKind::LeftJoin | NodeKind::RightJoin | NodeKind::OuterJoin => {
            if aliases != Aliases::default() {
                return Err(current.malformed("aliases on join"));
            }
            build_join(current)
        }
        _ => Ok(FromSource::Expr {
            expr: Box::new(build_expr(current)?),
            aliases,
        }),
    }
}

fn build_join(node: &ParseNode<'_>) -> Result<FromSource, ParseError> {
    let kind = match node.kind {
        NodeKind::InnerJoin => JoinKind::Inner,
        NodeKind::LeftJoin => JoinKind::Left,
        NodeKind::RightJoin => JoinKind::Right,
        NodeKind::OuterJoin => JoinKind::Outer,
        _ => return Err(node.malformed("expected join node")),
    };
    let left = build_from_source(node.child(0)?)?;
    let right = build_from_source(node.child(1)?)?;
    let implicit = node
        .token
        .as_ref()
        .is_some_and(|t| t.kind == TokenKind::Comma);
    let on = match node.children.get(2) {
        Some(condition) => build_expr(condition)?,
        None => synthesized_true(),
    };
    let mut meta = meta_of(node);
    if implicit {
        meta = meta.with_implicit_cross_join();
    }
    Ok(FromSource::Join(Box::new(Join {
        kind,
        left,
        right,
        on,
        meta,
    })))
}

// === WITH ===

fn build_with(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let mut recursive = false;
    let mut bindings = Vec::new();
    let mut body = None;

    for child in &node.children {
        match child.kind {
            NodeKind::Recursive => recursive = true,
            NodeKind::AsAlias => {
                let name = token_text(child);
                let inner = child.child(0)?;
                let (materialized, query_node) = if inner.kind == NodeKind::Materialized {
                    let not_materialized = inner
                        .token
                        .as_ref()
                        .is_some_and(|t| t.is_keyword("not_materialized"));
                    (!not_materialized, inner.child(0)?)
                } else {
                    (true, inner)
                };
                bindings.push(WithBinding {
                    name,
                    materialized,
                    query: build_expr(query_node)?,
                });
            }
            _ => body = Some(build_expr(child)?),
        }
    }

    let body = body.ok_or_else(|| node.malformed("WITH without body"))?;
    Ok(ExprNode::new(
        ExprKind::With(Box::new(With {
            recursive,
            bindings,
            body,
        })),
        meta,
    ))
}

// === DML ===

fn build_dml(node: &ParseNode<'_>) -> BuildResult {
    let meta = meta_of(node);
    let mut dml = Dml {
        ops: Vec::new(),
        from: None,
        where_clause: None,
        returning: Vec::new(),
    };

    if node.kind == NodeKind::DmlList {
        for child in &node.children {
            match child.kind {
                NodeKind::Update | NodeKind::From => {
                    dml.from = Some(build_from_source(child.child(0)?)?);
                }
                NodeKind::Delete => {
                    dml.ops.push(DmlOp::Delete);
                    if let Some(target) = child.children.first() {
                        dml.from = Some(build_from_source(target)?);
                    }
                }
                NodeKind::Where => dml.where_clause = Some(build_expr(child.child(0)?)?),
                NodeKind::Returning => dml.returning = build_returning(child)?,
                _ => dml.ops.push(build_dml_op(child)?),
            }
        }
    } else if node.kind == NodeKind::Delete {
        dml.ops.push(DmlOp::Delete);
        if let Some(target) = node.children.first() {
            dml.from = Some(build_from_source(target)?);
        }
    } else {
        dml.ops.push(build_dml_op(node)?);
    }

    Ok(ExprNode::new(ExprKind::Dml(Box::new(dml)), meta))
}

fn build_dml_op(node: &ParseNode<'_>) -> Result<DmlOp, ParseError> {
    match node.kind {
        NodeKind::Insert => Ok(DmlOp::Insert {
            target: build_expr(node.child(0)?)?,
            values: build_expr(node.child(1)?)?,
        }),
        NodeKind::InsertValue => {
            let target = build_expr(node.child(0)?)?;
            let value = build_expr(node.child(1)?)?;
            let mut position = None;
            let mut on_conflict = None;
            for child in &node.children[2..] {
                if child.kind == NodeKind::OnConflict {
                    let check = child.child(0)?;
                    if check.kind != NodeKind::Check {
                        return Err(check.malformed("expected conflict condition"));
                    }
                    let condition = build_expr(check.child(0)?)?;
                    let action = child.child(1)?;
                    if action.kind != NodeKind::ConflictAction {
                        return Err(action.malformed("expected conflict action"));
                    }
                    on_conflict = Some(OnConflict {
                        condition,
                        action: ConflictAction::DoNothing,
                    });
                } else {
                    position = Some(build_expr(child)?);
                }
            }
            Ok(DmlOp::InsertValue {
                target,
                value,
                position,
                on_conflict,
            })
        }
        NodeKind::Set => {
            let mut assignments = Vec::with_capacity(node.children.len());
            for child in &node.children {
                if child.kind != NodeKind::Assignment || child.children.len() != 2 {
                    return Err(child.malformed("expected assignment"));
                }
                assignments.push(Assignment {
                    target: build_expr(&child.children[0])?,
                    value: build_expr(&child.children[1])?,
                });
            }
            Ok(DmlOp::Set { assignments })
        }
        NodeKind::Remove => Ok(DmlOp::Remove {
            target: build_expr(node.child(0)?)?,
        }),
        NodeKind::Delete => Ok(DmlOp::Delete),
        _ => Err(node.malformed("expected DML operation")),
    }
}

fn build_returning(node: &ParseNode<'_>) -> Result<Vec<ReturningElem>, ParseError> {
    let mut elems = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if child.kind != NodeKind::ReturningElem || child.children.len() != 2 {
            return Err(child.malformed("expected returning element"));
        }
        let mapping_node = &child.children[0];
        let mapping = mapping_node
            .token
            .as_ref()
            .and_then(|t| t.text())
            .and_then(ReturningMapping::from_keyword)
            .ok_or_else(|| mapping_node.malformed("unknown returning mapping"))?;
        let column_node = &child.children[1];
        let column = if column_node.kind == NodeKind::ReturningWildcard {
            ReturningColumn::Wildcard
        } else {
            ReturningColumn::Expr(build_expr(column_node)?)
        };
        elems.push(ReturningElem { mapping, column });
    }
    Ok(elems)
}

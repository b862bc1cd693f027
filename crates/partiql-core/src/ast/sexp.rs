//! Canonical s-expression serialization of the AST (version V0).
//!
//! The mapping is fixed: every AST node has exactly one rendering, so
//! two equal ASTs always serialize to the same text. The forms are:
//!
//! | Node | Form |
//! |------|------|
//! | literal | `(lit 1)`, `(lit "a")`, `(lit true)`, `(lit null)` |
//! | missing | `(missing)` |
//! | variable | `(id "name" case_insensitive unqualified)` |
//! | parameter | `(parameter 1)` |
//! | operator | `(+ a b)`, `(not x)`, `(between a b c)` |
//! | cast / is | `(cast e (type decimal 10 2))`, `(is e (type null))` |
//! | path | `(path root (case_insensitive (lit "f")) (star))` |
//! | case | `(searched_case (when c v) (else e))`, `(simple_case op ...)` |
//! | sequence | `(list ...)`, `(bag ...)`, `(sexp ...)` |
//! | struct | `(struct (pair k v) ...)` |
//! | call | `(call name args...)`, `(call_agg sum all e)`, `(count_star)` |
//! | datetime | `(date 2021 2 1)`, `(time h m s nano precision [offset])` |
//! | select | `(select (project ...) (from ...) (where e) ...)` |
//! | with | `(with ...)` |
//! | dml/ddl | `(dml (operations ...) ...)`, `(create_table name)` |

use core::fmt;

use crate::lexer::LiteralValue;

use super::expr::{
    Aliases, CaseSensitivity, ExprKind, ExprNode, FromSource, GroupingStrategy, PathComponent,
    Projection, ScopeQualifier, SelectItem, SetQuantifier,
};
use super::statement::{Ddl, Dml, DmlOp, ReturningColumn};
use super::with::With;

/// An s-expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    /// A bare symbol.
    Symbol(String),
    /// A quoted string.
    String(String),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A parenthesized list.
    List(Vec<Sexp>),
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => f.write_str(s),
            Self::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn sym(s: &str) -> Sexp {
    Sexp::Symbol(String::from(s))
}

fn list(items: Vec<Sexp>) -> Sexp {
    Sexp::List(items)
}

/// Serializes an AST node to its canonical s-expression form.
#[must_use]
pub fn to_sexp(node: &ExprNode) -> Sexp {
    expr(node)
}

fn literal(value: &LiteralValue) -> Sexp {
    let inner = match value {
        LiteralValue::Integer(n) => Sexp::Int(*n),
        LiteralValue::Real(x) => Sexp::Float(*x),
        LiteralValue::Text(s) => Sexp::String(s.clone()),
        LiteralValue::Boolean(b) => Sexp::Bool(*b),
        LiteralValue::Null => sym("null"),
        LiteralValue::Ion(s) => list(vec![sym("ion"), Sexp::String(s.clone())]),
    };
    list(vec![sym("lit"), inner])
}

fn case_name(case: CaseSensitivity) -> Sexp {
    match case {
        CaseSensitivity::CaseSensitive => sym("case_sensitive"),
        CaseSensitivity::CaseInsensitive => sym("case_insensitive"),
    }
}

fn expr(node: &ExprNode) -> Sexp {
    match &node.kind {
        ExprKind::Lit(value) => literal(value),
        ExprKind::Missing => list(vec![sym("missing")]),
        ExprKind::VarRef {
            name,
            case,
            qualifier,
        } => {
            let scope = match qualifier {
                ScopeQualifier::Unqualified => sym("unqualified"),
                ScopeQualifier::LocalsFirst => sym("locals_first"),
            };
            list(vec![
                sym("id"),
                Sexp::String(name.clone()),
                case_name(*case),
                scope,
            ])
        }
        ExprKind::Parameter { ordinal } => list(vec![sym("parameter"), Sexp::Int(*ordinal)]),
        ExprKind::NAry { op, operands } => {
            let mut items = vec![sym(op.as_str())];
            items.extend(operands.iter().map(expr));
            list(items)
        }
        ExprKind::Typed {
            op,
            expr: operand,
            data_type,
        } => {
            let head = match op {
                super::expr::TypedOp::Cast => "cast",
                super::expr::TypedOp::Is => "is",
            };
            let mut ty = vec![sym("type"), sym(data_type.name.as_str())];
            ty.extend(data_type.args.iter().map(|&a| Sexp::Int(a as i64)));
            list(vec![sym(head), expr(operand), list(ty)])
        }
        ExprKind::Path { root, components } => {
            let mut items = vec![sym("path"), expr(root)];
            for component in components {
                items.push(match component {
                    PathComponent::Expr { expr: e, case } => list(vec![case_name(*case), expr(e)]),
                    PathComponent::Wildcard => list(vec![sym("star")]),
                    PathComponent::Unpivot => list(vec![sym("star"), sym("unpivot")]),
                });
            }
            list(items)
        }
        ExprKind::Case {
            operand,
            whens,
            else_clause,
        } => {
            let mut items = vec![match operand {
                Some(_) => sym("simple_case"),
                None => sym("searched_case"),
            }];
            if let Some(op) = operand {
                items.push(expr(op));
            }
            for (condition, result) in whens {
                items.push(list(vec![sym("when"), expr(condition), expr(result)]));
            }
            if let Some(else_result) = else_clause {
                items.push(list(vec![sym("else"), expr(else_result)]));
            }
            list(items)
        }
        ExprKind::Seq { kind, items } => {
            let mut out = vec![sym(kind.as_str())];
            out.extend(items.iter().map(expr));
            list(out)
        }
        ExprKind::Struct { fields } => {
            let mut out = vec![sym("struct")];
            for (key, value) in fields {
                out.push(list(vec![sym("pair"), expr(key), expr(value)]));
            }
            list(out)
        }
        ExprKind::Call { name, args } => {
            let mut out = vec![sym("call"), sym(name)];
            out.extend(args.iter().map(expr));
            list(out)
        }
        ExprKind::CallAgg {
            name,
            quantifier,
            arg,
        } => {
            let quant = match quantifier {
                SetQuantifier::All => sym("all"),
                SetQuantifier::Distinct => sym("distinct"),
            };
            list(vec![sym("call_agg"), sym(name), quant, expr(arg)])
        }
        ExprKind::CountStar => list(vec![sym("count_star")]),
        ExprKind::DateLit(date) => list(vec![
            sym("date"),
            Sexp::Int(i64::from(date.year)),
            Sexp::Int(i64::from(date.month)),
            Sexp::Int(i64::from(date.day)),
        ]),
        ExprKind::TimeLit(time) => {
            let head = if time.with_time_zone {
                "time_with_time_zone"
            } else {
                "time"
            };
            let mut out = vec![
                sym(head),
                Sexp::Int(i64::from(time.hour)),
                Sexp::Int(i64::from(time.minute)),
                Sexp::Int(i64::from(time.second)),
                Sexp::Int(i64::from(time.nanosecond)),
                Sexp::Int(i64::from(time.precision)),
            ];
            if let Some(offset) = time.tz_offset_minutes {
                out.push(Sexp::Int(i64::from(offset)));
            }
            list(out)
        }
        ExprKind::Select(select) => select_sexp(select),
        ExprKind::With(with) => with_sexp(with),
        ExprKind::Dml(dml) => dml_sexp(dml),
        ExprKind::Ddl(ddl) => ddl_sexp(ddl),
        ExprKind::Exec { procedure, args } => {
            let mut out = vec![sym("exec"), sym(procedure)];
            out.extend(args.iter().map(expr));
            list(out)
        }
    }
}

fn aliased(inner: Sexp, aliases: &Aliases) -> Sexp {
    let mut out = inner;
    if let Some(name) = &aliases.as_alias {
        out = list(vec![sym("as"), Sexp::String(name.clone()), out]);
    }
    if let Some(name) = &aliases.at_alias {
        out = list(vec![sym("at"), Sexp::String(name.clone()), out]);
    }
    if let Some(name) = &aliases.by_alias {
        out = list(vec![sym("by"), Sexp::String(name.clone()), out]);
    }
    out
}

fn from_source(source: &FromSource) -> Sexp {
    match source {
        FromSource::Expr {
            expr: source_expr,
            aliases,
        } => aliased(expr(source_expr), aliases),
        FromSource::Unpivot {
            expr: source_expr,
            aliases,
        } => aliased(list(vec![sym("unpivot"), expr(source_expr)]), aliases),
        FromSource::Join(join) => {
            let head = format!("{}_join", join.kind.as_str());
            list(vec![
                sym(&head),
                from_source(&join.left),
                from_source(&join.right),
                expr(&join.on),
            ])
        }
    }
}

fn select_sexp(select: &super::expr::Select) -> Sexp {
    let projection = match &select.projection {
        Projection::List(items) => {
            let mut out = vec![sym("list")];
            for item in items {
                out.push(match item {
                    SelectItem::Expr { expr: e, alias } => match alias {
                        Some(name) => list(vec![sym("as"), Sexp::String(name.clone()), expr(e)]),
                        None => expr(e),
                    },
                    SelectItem::ProjectAll { expr: e } => match e {
                        Some(path) => list(vec![sym("project_all"), expr(path)]),
                        None => list(vec![sym("project_all")]),
                    },
                });
            }
            list(out)
        }
        Projection::Value(e) => list(vec![sym("value"), expr(e)]),
        Projection::Pivot { value, at } => list(vec![sym("pivot"), expr(at), expr(value)]),
    };
    let project_head = match select.quantifier {
        SetQuantifier::All => "project",
        SetQuantifier::Distinct => "project_distinct",
    };
    let mut out = vec![sym("select"), list(vec![sym(project_head), projection])];

    if let Some(from) = &select.from {
        out.push(list(vec![sym("from"), from_source(from)]));
    }
    if !select.let_bindings.is_empty() {
        let mut bindings = vec![sym("let")];
        for binding in &select.let_bindings {
            bindings.push(list(vec![
                sym("as"),
                Sexp::String(binding.name.clone()),
                expr(&binding.expr),
            ]));
        }
        out.push(list(bindings));
    }
    if let Some(where_clause) = &select.where_clause {
        out.push(list(vec![sym("where"), expr(where_clause)]));
    }
    if let Some(group_by) = &select.group_by {
        let head = match group_by.strategy {
            GroupingStrategy::Full => "group",
            GroupingStrategy::Partial => "group_partial",
        };
        let mut group = vec![sym(head)];
        for item in &group_by.items {
            group.push(match &item.alias {
                Some(name) => list(vec![sym("as"), Sexp::String(name.clone()), expr(&item.expr)]),
                None => expr(&item.expr),
            });
        }
        if let Some(name) = &group_by.group_as {
            group.push(list(vec![sym("group_as"), Sexp::String(name.clone())]));
        }
        out.push(list(group));
    }
    if let Some(having) = &select.having {
        out.push(list(vec![sym("having"), expr(having)]));
    }
    if !select.order_by.is_empty() {
        let mut order = vec![sym("order_by")];
        for spec in &select.order_by {
            order.push(list(vec![
                sym("sort"),
                expr(&spec.expr),
                sym(spec.ordering.as_str()),
            ]));
        }
        out.push(list(order));
    }
    if let Some(limit) = &select.limit {
        out.push(list(vec![sym("limit"), expr(limit)]));
    }
    list(out)
}

fn with_sexp(with: &With) -> Sexp {
    let head = if with.recursive {
        "with_recursive"
    } else {
        "with"
    };
    let mut out = vec![sym(head)];
    for binding in &with.bindings {
        let materialized = if binding.materialized {
            "materialized"
        } else {
            "not_materialized"
        };
        out.push(list(vec![
            sym("binding"),
            Sexp::String(binding.name.clone()),
            sym(materialized),
            expr(&binding.query),
        ]));
    }
    out.push(expr(&with.body));
    list(out)
}

fn dml_sexp(dml: &Dml) -> Sexp {
    let mut ops = vec![sym("operations")];
    for op in &dml.ops {
        ops.push(match op {
            DmlOp::Insert { target, values } => {
                list(vec![sym("insert"), expr(target), expr(values)])
            }
            DmlOp::InsertValue {
                target,
                value,
                position,
                on_conflict,
            } => {
                let mut out = vec![sym("insert_value"), expr(target), expr(value)];
                if let Some(position) = position {
                    out.push(list(vec![sym("at"), expr(position)]));
                }
                if let Some(on_conflict) = on_conflict {
                    out.push(list(vec![
                        sym("on_conflict"),
                        expr(&on_conflict.condition),
                        sym("do_nothing"),
                    ]));
                }
                list(out)
            }
            DmlOp::Set { assignments } => {
                let mut out = vec![sym("set")];
                for assignment in assignments {
                    out.push(list(vec![
                        sym("assignment"),
                        expr(&assignment.target),
                        expr(&assignment.value),
                    ]));
                }
                list(out)
            }
            DmlOp::Remove { target } => list(vec![sym("remove"), expr(target)]),
            DmlOp::Delete => list(vec![sym("delete")]),
        });
    }
    let mut out = vec![sym("dml"), list(ops)];
    if let Some(from) = &dml.from {
        out.push(list(vec![sym("from"), from_source(from)]));
    }
    if let Some(where_clause) = &dml.where_clause {
        out.push(list(vec![sym("where"), expr(where_clause)]));
    }
    if !dml.returning.is_empty() {
        let mut returning = vec![sym("returning")];
        for elem in &dml.returning {
            let column = match &elem.column {
                ReturningColumn::Wildcard => list(vec![sym("returning_wildcard")]),
                ReturningColumn::Expr(e) => expr(e),
            };
            returning.push(list(vec![
                sym("returning_elem"),
                sym(elem.mapping.as_str()),
                column,
            ]));
        }
        out.push(list(returning));
    }
    list(out)
}

fn ddl_sexp(ddl: &Ddl) -> Sexp {
    match ddl {
        Ddl::CreateTable { name } => list(vec![sym("create_table"), Sexp::String(name.clone())]),
        Ddl::DropTable { name } => list(vec![sym("drop_table"), Sexp::String(name.clone())]),
        Ddl::CreateIndex { table, keys } => {
            let mut out = vec![sym("create_index"), Sexp::String(table.clone())];
            out.extend(keys.iter().map(expr));
            list(out)
        }
        Ddl::DropIndex { name, table } => list(vec![
            sym("drop_index"),
            Sexp::String(name.clone()),
            Sexp::String(table.clone()),
        ]),
    }
}

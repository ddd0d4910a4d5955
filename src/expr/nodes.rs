//! Concrete expression-tree node variants.
//!
//! Grounded on `drizzle-core`'s `expr/*.rs` family, collapsed from one
//! phantom-typed `SQLExpr<'a, V, T, N, A>` struct per operator into a closed
//! set of plain structs implementing the shared [`ExprNode`] trait — the
//! "tagged sum type with a shared rendering operation" called for in
//! SPEC_FULL.md's Design Notes.

use super::{Expr, ExprNode};
use crate::types::{Nullability, SqlType};
use crate::value::Value;

/// A literal value, or a typed `NULL` when `value` is `None`.
#[derive(Debug, Clone)]
pub struct Literal {
    pub(super) value: Option<Value>,
    pub(super) sql_type: SqlType,
}

impl ExprNode for Literal {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        match self.value {
            Some(_) => Nullability::Never,
            None => Nullability::Sometimes,
        }
    }

    fn render(&self, _grouped: bool) -> String {
        match &self.value {
            Some(v) => v.render(),
            None => "NULL".to_string(),
        }
    }
}

/// `table_alias.column_name`, typed and nulled from the declared schema column.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    pub table_alias: String,
    pub column_name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl ExprNode for ColumnRef {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        if self.nullable {
            Nullability::Sometimes
        } else {
            Nullability::Never
        }
    }

    fn render(&self, _grouped: bool) -> String {
        format!("{}.{}", self.table_alias, self.column_name)
    }
}

/// `IS NULL` / `IS NOT NULL`. Always `BOOLEAN`, always `Never`-null.
#[derive(Debug, Clone)]
pub struct NullCheck {
    pub child: Expr,
    pub negate: bool,
}

impl ExprNode for NullCheck {
    fn sql_type(&self) -> SqlType {
        SqlType::Boolean
    }

    fn nullability(&self) -> Nullability {
        Nullability::Never
    }

    fn render(&self, _grouped: bool) -> String {
        let keyword = if self.negate { "IS NOT NULL" } else { "IS NULL" };
        format!("{} {keyword}", self.child.render(true))
    }
}

/// A prefix/suffix-wrapped single-child operator, e.g. `NOT (…)`.
#[derive(Debug, Clone)]
pub struct UnaryOp {
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub child: Expr,
    pub sql_type: SqlType,
    pub nullability: Nullability,
}

impl UnaryOp {
    /// True when `prefix`/`suffix` already fully parenthesize the result,
    /// so outer grouping never needs to add a second wrap.
    fn self_parenthesized(&self) -> bool {
        self.prefix.ends_with('(') && self.suffix == ")"
    }
}

impl ExprNode for UnaryOp {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        self.nullability
    }

    fn render(&self, grouped: bool) -> String {
        let inner = format!("{}{}{}", self.prefix, self.child.render(false), self.suffix);
        if grouped && !self.self_parenthesized() {
            format!("({inner})")
        } else {
            inner
        }
    }
}

/// An n-ary infix chain: comparisons, arithmetic, `AND`/`OR`, `CONCAT`.
///
/// Rendering follows spec.md §4.2: children always render fully grouped
/// once there is more than one of them, and the whole node parenthesizes
/// itself only when the caller asked for grouping. A single child is a
/// transparent passthrough — no separator, no added parentheses.
#[derive(Debug, Clone)]
pub struct InfixOp {
    pub separator: &'static str,
    pub children: Vec<Expr>,
    pub sql_type: SqlType,
    pub nullability: Nullability,
}

impl ExprNode for InfixOp {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        self.nullability
    }

    fn render(&self, grouped: bool) -> String {
        match self.children.len() {
            0 => String::new(),
            1 => self.children[0].render(grouped),
            _ => {
                let body = self
                    .children
                    .iter()
                    .map(|c| c.render(true))
                    .collect::<Vec<_>>()
                    .join(self.separator);
                if grouped {
                    format!("({body})")
                } else {
                    body
                }
            }
        }
    }
}

/// A function call: `NAME(a,b,…)`. Already atomic by virtue of its own
/// parentheses, so it ignores the outer `grouped` hint.
#[derive(Debug, Clone)]
pub struct FuncCall {
    pub name: &'static str,
    pub args: Vec<Expr>,
    pub sql_type: SqlType,
    pub nullability: Nullability,
}

impl ExprNode for FuncCall {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        self.nullability
    }

    fn render(&self, _grouped: bool) -> String {
        let args = self
            .args
            .iter()
            .map(|a| a.render(false))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({args})", self.name)
    }
}

/// `lhs IN(a,b,c)`. Always `BOOLEAN`, always `Never`-null.
#[derive(Debug, Clone)]
pub struct InList {
    pub lhs: Expr,
    pub items: Vec<Expr>,
}

impl ExprNode for InList {
    fn sql_type(&self) -> SqlType {
        SqlType::Boolean
    }

    fn nullability(&self) -> Nullability {
        Nullability::Never
    }

    fn render(&self, _grouped: bool) -> String {
        let items = self
            .items
            .iter()
            .map(|i| i.render(false))
            .collect::<Vec<_>>()
            .join(",");
        format!("{} IN({items})", self.lhs.render(true))
    }
}

/// `lhs IN (SELECT …)`. Always `BOOLEAN`, always `Never`-null — unlike the
/// scalar subquery wrapper itself, presence/absence of the lhs in the
/// subquery result is a definite true/false, never unknown.
#[derive(Debug, Clone)]
pub struct InSubquery {
    pub lhs: Expr,
    pub subquery: Expr,
}

impl ExprNode for InSubquery {
    fn sql_type(&self) -> SqlType {
        SqlType::Boolean
    }

    fn nullability(&self) -> Nullability {
        Nullability::Never
    }

    fn render(&self, _grouped: bool) -> String {
        format!("{} IN {}", self.lhs.render(true), self.subquery.render(false))
    }
}

/// `CASE WHEN … THEN … [ELSE …] END`. Atomic; ignores `grouped`.
#[derive(Debug, Clone)]
pub struct Case {
    pub branches: Vec<(Expr, Expr)>,
    pub else_branch: Option<Expr>,
    pub sql_type: SqlType,
    pub nullability: Nullability,
}

impl ExprNode for Case {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        self.nullability
    }

    fn render(&self, _grouped: bool) -> String {
        let mut out = String::from("CASE");
        for (when, then) in &self.branches {
            out.push_str(" WHEN ");
            out.push_str(&when.render(false));
            out.push_str(" THEN ");
            out.push_str(&then.render(false));
        }
        if let Some(else_branch) = &self.else_branch {
            out.push_str(" ELSE ");
            out.push_str(&else_branch.render(false));
        }
        out.push_str(" END");
        out
    }
}

/// A pre-rendered `SELECT` wrapped as a scalar expression: `(SELECT …)`.
/// Atomic; ignores `grouped`. Always `Sometimes`-null — result presence
/// is not statically known.
#[derive(Debug, Clone)]
pub struct Subquery {
    pub rendered: String,
    pub sql_type: SqlType,
}

impl ExprNode for Subquery {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn nullability(&self) -> Nullability {
        Nullability::Sometimes
    }

    fn render(&self, _grouped: bool) -> String {
        format!("({})", self.rendered)
    }
}

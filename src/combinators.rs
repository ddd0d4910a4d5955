//! Operator and function combinators built on top of the node set in
//! `expr::nodes`.
//!
//! Grounded on `drizzle-core`'s `expr/ops.rs`/`expr/null.rs`/`expr/case.rs`,
//! collapsed from per-operator generic impls keyed on phantom type
//! parameters into plain functions that compute `SqlType`/`Nullability` at
//! call time and hand back an opaque [`Expr`].

use crate::error::QueryError;
use crate::expr::{Case, Expr, FuncCall, InList, InSubquery, InfixOp, NullCheck, UnaryOp};
use crate::types::{Nullability, SqlType};

fn infix(separator: &'static str, sql_type: SqlType, children: Vec<Expr>) -> Expr {
    let nullability = Nullability::combine_any(children.iter().map(Expr::nullability));
    Expr::new(InfixOp {
        separator,
        children,
        sql_type,
        nullability,
    })
}

fn compare(op: &'static str, lhs: Expr, rhs: Expr) -> Expr {
    infix(op, SqlType::Boolean, vec![lhs, rhs])
}

fn arithmetic(op: &'static str, lhs: Expr, rhs: Expr) -> Result<Expr, QueryError> {
    if !lhs.sql_type().is_numeric() || !rhs.sql_type().is_numeric() {
        return Err(QueryError::TypeMismatch(format!(
            "arithmetic operands must be INTEGER/REAL, found {} and {}",
            lhs.sql_type(),
            rhs.sql_type()
        )));
    }
    let sql_type = if lhs.sql_type() == SqlType::Real || rhs.sql_type() == SqlType::Real {
        SqlType::Real
    } else {
        SqlType::Integer
    };
    Ok(infix(op, sql_type, vec![lhs, rhs]))
}

/// `lhs = rhs`
pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    compare("=", lhs, rhs)
}
/// `lhs != rhs`
pub fn ne(lhs: Expr, rhs: Expr) -> Expr {
    compare("!=", lhs, rhs)
}
/// `lhs < rhs`
pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    compare("<", lhs, rhs)
}
/// `lhs <= rhs`
pub fn le(lhs: Expr, rhs: Expr) -> Expr {
    compare("<=", lhs, rhs)
}
/// `lhs > rhs`
pub fn gt(lhs: Expr, rhs: Expr) -> Expr {
    compare(">", lhs, rhs)
}
/// `lhs >= rhs`
pub fn ge(lhs: Expr, rhs: Expr) -> Expr {
    compare(">=", lhs, rhs)
}

/// `lhs + rhs`. Both operands must be numeric (`INTEGER`/`REAL`).
pub fn add(lhs: Expr, rhs: Expr) -> Result<Expr, QueryError> {
    arithmetic("+", lhs, rhs)
}
/// `lhs - rhs`. Both operands must be numeric (`INTEGER`/`REAL`).
pub fn sub(lhs: Expr, rhs: Expr) -> Result<Expr, QueryError> {
    arithmetic("-", lhs, rhs)
}
/// `lhs * rhs`. Both operands must be numeric (`INTEGER`/`REAL`).
pub fn mul(lhs: Expr, rhs: Expr) -> Result<Expr, QueryError> {
    arithmetic("*", lhs, rhs)
}
/// `lhs / rhs`. Division always yields `REAL` regardless of operand types —
/// SQLite integer division truncation is not the semantics this crate
/// exposes. Both operands must be numeric (`INTEGER`/`REAL`).
pub fn div(lhs: Expr, rhs: Expr) -> Result<Expr, QueryError> {
    if !lhs.sql_type().is_numeric() || !rhs.sql_type().is_numeric() {
        return Err(QueryError::TypeMismatch(format!(
            "division operands must be INTEGER/REAL, found {} and {}",
            lhs.sql_type(),
            rhs.sql_type()
        )));
    }
    Ok(infix("/", SqlType::Real, vec![lhs, rhs]))
}

/// Variadic `AND` over one or more boolean operands. Every operand must be
/// `BOOLEAN`.
pub fn and(children: Vec<Expr>) -> Result<Expr, QueryError> {
    if let Some(bad) = children.iter().find(|c| c.sql_type() != SqlType::Boolean) {
        return Err(QueryError::TypeMismatch(format!(
            "AND operands must be BOOLEAN, found {}",
            bad.sql_type()
        )));
    }
    Ok(infix(" AND ", SqlType::Boolean, children))
}
/// Variadic `OR` over one or more boolean operands. Every operand must be
/// `BOOLEAN`.
pub fn or(children: Vec<Expr>) -> Result<Expr, QueryError> {
    if let Some(bad) = children.iter().find(|c| c.sql_type() != SqlType::Boolean) {
        return Err(QueryError::TypeMismatch(format!(
            "OR operands must be BOOLEAN, found {}",
            bad.sql_type()
        )));
    }
    Ok(infix(" OR ", SqlType::Boolean, children))
}
/// `NOT (child)`. `child` must be `BOOLEAN`.
pub fn not(child: Expr) -> Result<Expr, QueryError> {
    if child.sql_type() != SqlType::Boolean {
        return Err(QueryError::TypeMismatch(format!(
            "NOT operand must be BOOLEAN, found {}",
            child.sql_type()
        )));
    }
    Ok(Expr::new(UnaryOp {
        prefix: "NOT (",
        suffix: ")",
        nullability: child.nullability(),
        child,
        sql_type: SqlType::Boolean,
    }))
}

/// Variadic `||` string concatenation. Result is `TEXT`.
pub fn concat(children: Vec<Expr>) -> Expr {
    infix("||", SqlType::Text, children)
}

/// `COALESCE(a,b,…)`. `Sometimes`-null only if every argument is.
pub fn coalesce(args: Vec<Expr>) -> Expr {
    let sql_type = args.first().map(Expr::sql_type).unwrap_or(SqlType::Text);
    let nullability = Nullability::combine_all(args.iter().map(Expr::nullability));
    Expr::new(FuncCall {
        name: "COALESCE",
        args,
        sql_type,
        nullability,
    })
}

/// `child IS NULL`
pub fn is_null(child: Expr) -> Expr {
    Expr::new(NullCheck {
        child,
        negate: false,
    })
}
/// `child IS NOT NULL`
pub fn is_not_null(child: Expr) -> Expr {
    Expr::new(NullCheck {
        child,
        negate: true,
    })
}

/// `lhs IN(items…)`
pub fn in_list(lhs: Expr, items: Vec<Expr>) -> Expr {
    Expr::new(InList { lhs, items })
}

/// `lhs IN (subquery)`
pub fn in_subquery(lhs: Expr, subquery: Expr) -> Expr {
    Expr::new(InSubquery { lhs, subquery })
}

/// `includes(haystack, needle)` — sugar for `haystack LIKE '%needle%'`,
/// rendered as `INSTR(haystack, needle) > 0` to avoid LIKE-pattern escaping
/// pitfalls with user-supplied needles. `haystack` must be `TEXT`/`VARCHAR`.
pub fn includes(haystack: Expr, needle: Expr) -> Result<Expr, QueryError> {
    if !haystack.sql_type().is_textual() {
        return Err(QueryError::TypeMismatch(format!(
            "includes() lhs must be TEXT/VARCHAR, found {}",
            haystack.sql_type()
        )));
    }
    let instr = Expr::new(FuncCall {
        name: "INSTR",
        args: vec![haystack, needle],
        sql_type: SqlType::Integer,
        nullability: Nullability::Never,
    });
    Ok(gt(instr, crate::expr::expr(0i64)))
}

/// Builder for a `CASE WHEN … THEN … [ELSE …] END` expression. All `THEN`/
/// `ELSE` branches must agree on `SqlType`; mismatches surface as
/// `TypeMismatch` from [`CaseBuilder::build`].
pub struct CaseBuilder {
    branches: Vec<(Expr, Expr)>,
    else_branch: Option<Expr>,
}

/// `case()` — start a `CASE` expression builder.
pub fn case() -> CaseBuilder {
    CaseBuilder {
        branches: Vec::new(),
        else_branch: None,
    }
}

impl CaseBuilder {
    /// Add a `WHEN condition THEN result` branch. `condition` must be
    /// `BOOLEAN`.
    pub fn when(mut self, condition: Expr, result: Expr) -> Self {
        self.branches.push((condition, result));
        self
    }

    /// Add the trailing `ELSE` branch.
    pub fn otherwise(mut self, result: Expr) -> Self {
        self.else_branch = Some(result);
        self
    }

    /// Finalize the expression, checking that every branch's condition is
    /// boolean and every result shares one common `SqlType`.
    pub fn build(self) -> Result<Expr, crate::error::QueryError> {
        for (condition, _) in &self.branches {
            if condition.sql_type() != SqlType::Boolean {
                return Err(crate::error::QueryError::TypeMismatch(format!(
                    "CASE WHEN condition must be BOOLEAN, found {}",
                    condition.sql_type()
                )));
            }
        }
        let mut result_types = self.branches.iter().map(|(_, r)| r.sql_type());
        let sql_type = result_types
            .next()
            .or_else(|| self.else_branch.as_ref().map(Expr::sql_type))
            .unwrap_or(SqlType::Text);
        for (_, result) in &self.branches {
            if !result.sql_type().compatible_with(sql_type) {
                return Err(crate::error::QueryError::TypeMismatch(format!(
                    "CASE branch result type {} does not match {}",
                    result.sql_type(),
                    sql_type
                )));
            }
        }
        if let Some(else_branch) = &self.else_branch {
            if !else_branch.sql_type().compatible_with(sql_type) {
                return Err(crate::error::QueryError::TypeMismatch(format!(
                    "CASE ELSE result type {} does not match {}",
                    else_branch.sql_type(),
                    sql_type
                )));
            }
        }
        let mut nullabilities: Vec<Nullability> =
            self.branches.iter().map(|(_, r)| r.nullability()).collect();
        match &self.else_branch {
            Some(else_branch) => nullabilities.push(else_branch.nullability()),
            None => nullabilities.push(Nullability::Sometimes),
        }
        let nullability = Nullability::combine_any(nullabilities);
        Ok(Expr::new(Case {
            branches: self.branches,
            else_branch: self.else_branch,
            sql_type,
            nullability,
        }))
    }
}

impl Expr {
    pub fn eq(self, rhs: Expr) -> Expr {
        eq(self, rhs)
    }
    pub fn ne(self, rhs: Expr) -> Expr {
        ne(self, rhs)
    }
    pub fn lt(self, rhs: Expr) -> Expr {
        lt(self, rhs)
    }
    pub fn le(self, rhs: Expr) -> Expr {
        le(self, rhs)
    }
    pub fn gt(self, rhs: Expr) -> Expr {
        gt(self, rhs)
    }
    pub fn ge(self, rhs: Expr) -> Expr {
        ge(self, rhs)
    }
    pub fn add(self, rhs: Expr) -> Result<Expr, QueryError> {
        add(self, rhs)
    }
    pub fn sub(self, rhs: Expr) -> Result<Expr, QueryError> {
        sub(self, rhs)
    }
    pub fn mul(self, rhs: Expr) -> Result<Expr, QueryError> {
        mul(self, rhs)
    }
    pub fn div(self, rhs: Expr) -> Result<Expr, QueryError> {
        div(self, rhs)
    }
    pub fn and(self, rhs: Expr) -> Result<Expr, QueryError> {
        and(vec![self, rhs])
    }
    pub fn or(self, rhs: Expr) -> Result<Expr, QueryError> {
        or(vec![self, rhs])
    }
    pub fn not(self) -> Result<Expr, QueryError> {
        not(self)
    }
    pub fn is_null(self) -> Expr {
        is_null(self)
    }
    pub fn is_not_null(self) -> Expr {
        is_not_null(self)
    }
    pub fn in_list(self, items: Vec<Expr>) -> Expr {
        in_list(self, items)
    }
    pub fn in_subquery(self, subquery: Expr) -> Expr {
        in_subquery(self, subquery)
    }
    pub fn includes(self, needle: Expr) -> Result<Expr, QueryError> {
        includes(self, needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::expr;

    #[test]
    fn infix_comparison_is_always_boolean() {
        let e = eq(expr(1i64), expr(2i64));
        assert_eq!(e.sql_type(), SqlType::Boolean);
        assert_eq!(e.to_sql(), "1=2");
    }

    #[test]
    fn and_of_three_wraps_children_individually_when_grouped() {
        let e = and(vec![expr(true), expr(false), expr(true)]).unwrap();
        assert_eq!(e.render(true), "(1 AND 0 AND 1)");
        assert_eq!(e.render(false), "1 AND 0 AND 1");
    }

    #[test]
    fn single_child_infix_is_a_transparent_passthrough() {
        let e = and(vec![expr(true)]).unwrap();
        assert_eq!(e.render(true), "1");
    }

    #[test]
    fn and_rejects_non_boolean_operand() {
        assert!(matches!(
            and(vec![expr(true), expr(1i64)]),
            Err(QueryError::TypeMismatch(_))
        ));
    }

    #[test]
    fn arithmetic_rejects_non_numeric_operand() {
        assert!(matches!(
            add(expr("x"), expr(true)),
            Err(QueryError::TypeMismatch(_))
        ));
    }

    #[test]
    fn includes_rejects_non_textual_haystack() {
        assert!(matches!(
            includes(expr(1i64), expr("a")),
            Err(QueryError::TypeMismatch(_))
        ));
    }

    #[test]
    fn coalesce_is_sometimes_null_only_if_every_arg_is() {
        let null_int = crate::expr::literal(SqlType::Integer, None).unwrap();
        let e = coalesce(vec![null_int.clone(), expr(1i64)]);
        assert_eq!(e.nullability(), Nullability::Never);
        let e = coalesce(vec![null_int.clone(), null_int]);
        assert_eq!(e.nullability(), Nullability::Sometimes);
    }

    #[test]
    fn case_rejects_mismatched_branch_types() {
        let built = case()
            .when(expr(true), expr(1i64))
            .otherwise(expr("nope"))
            .build();
        assert!(built.is_err());
    }

    #[test]
    fn case_renders_when_then_else_end() {
        let e = case()
            .when(eq(expr(1i64), expr(1i64)), expr("yes"))
            .otherwise(expr("no"))
            .build()
            .unwrap();
        assert_eq!(e.to_sql(), "CASE WHEN 1=1 THEN 'yes' ELSE 'no' END");
    }
}

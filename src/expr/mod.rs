//! The expression tree: the typed SQL scalar/boolean algebra.
//!
//! Grounded on `drizzle-core`'s `expr/` module family. The teacher encodes
//! `SqlType`/`Nullability` in the Rust type system itself
//! (`SQLExpr<'a, V, T, N, A>`); per SPEC_FULL.md's Design Notes this crate
//! carries the same algebra at the value level instead — a closed node enum
//! behind one object-safe [`ExprNode`] trait, matching the "interface with a
//! single `render(grouped) -> String` method plus data-bearing fields"
//! idiom the Design Notes call for.

mod nodes;

pub use nodes::*;

use core::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::error::QueryError;
use crate::types::{Nullability, SqlType};
use crate::value::Value;

/// Shared behavior every expression-tree node implements: its declared SQL
/// type, its nullability, and a rendering procedure that honors the
/// `grouped` parenthesization hint (spec.md §4.2).
pub trait ExprNode: fmt::Debug {
    fn sql_type(&self) -> SqlType;
    fn nullability(&self) -> Nullability;
    fn render(&self, grouped: bool) -> String;
}

/// A typed SQL expression. Cheap to clone (an `Rc` to the underlying node),
/// immutable once constructed, and pure to render — see spec.md §5 on the
/// value-like lifecycle of expression trees.
#[derive(Clone, Debug)]
pub struct Expr(Rc<dyn ExprNode>);

impl Expr {
    pub fn new(node: impl ExprNode + 'static) -> Self {
        Expr(Rc::new(node))
    }

    /// The expression's immutable declared SQL type.
    pub fn sql_type(&self) -> SqlType {
        self.0.sql_type()
    }

    /// Whether this expression may evaluate to `NULL`.
    pub fn nullability(&self) -> Nullability {
        self.0.nullability()
    }

    /// Render with an explicit grouping hint — `true` asks the node to
    /// self-parenthesize unless it is already syntactically atomic.
    pub fn render(&self, grouped: bool) -> String {
        self.0.render(grouped)
    }

    /// Top-level rendering: equivalent to `render(false)`.
    pub fn to_sql(&self) -> String {
        self.render(false)
    }

    /// Assert this expression is `BOOLEAN`, or fail with `TypeMismatch`.
    pub fn assert_is_boolean(self) -> Result<Expr, QueryError> {
        if self.sql_type() == SqlType::Boolean {
            Ok(self)
        } else {
            Err(QueryError::TypeMismatch(format!(
                "expected BOOLEAN, found {}",
                self.sql_type()
            )))
        }
    }

    /// Assert this expression is `TEXT`/`VARCHAR`, or fail with `TypeMismatch`.
    pub fn assert_is_text(self) -> Result<Expr, QueryError> {
        if self.sql_type().is_textual() {
            Ok(self)
        } else {
            Err(QueryError::TypeMismatch(format!(
                "expected TEXT/VARCHAR, found {}",
                self.sql_type()
            )))
        }
    }

    /// Assert this expression is `INTEGER`/`REAL`, or fail with `TypeMismatch`.
    pub fn assert_is_numeric(self) -> Result<Expr, QueryError> {
        if self.sql_type().is_numeric() {
            Ok(self)
        } else {
            Err(QueryError::TypeMismatch(format!(
                "expected INTEGER/REAL, found {}",
                self.sql_type()
            )))
        }
    }
}

// =============================================================================
// Expression factory — typed half (infallible, native Rust scalars)
// =============================================================================

/// Coerces a native Rust value (or an existing [`Expr`]) into an expression.
/// Infallible: Rust's type system already closes the set of acceptable
/// inputs at compile time, so the `InvalidLiteral` failure mode described in
/// spec.md §4.3 is reachable only through the dynamic half, [`expr_dyn`].
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Text(self.to_string())),
            sql_type: SqlType::Text,
        })
    }
}

impl IntoExpr for String {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Text(self)),
            sql_type: SqlType::Text,
        })
    }
}

macro_rules! impl_into_expr_int {
    ($($t:ty),+ $(,)?) => {
        $(impl IntoExpr for $t {
            fn into_expr(self) -> Expr {
                Expr::new(Literal { value: Some(Value::Integer(self as i64)), sql_type: SqlType::Integer })
            }
        })+
    };
}
impl_into_expr_int!(i8, i16, i32, i64, isize, u8, u16, u32);

impl IntoExpr for f32 {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Real(self as f64)),
            sql_type: SqlType::Real,
        })
    }
}

impl IntoExpr for f64 {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Real(self)),
            sql_type: SqlType::Real,
        })
    }
}

impl IntoExpr for bool {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Boolean(self)),
            sql_type: SqlType::Boolean,
        })
    }
}

impl IntoExpr for DateTime<Utc> {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Timestamp(self)),
            sql_type: SqlType::Timestamp,
        })
    }
}

impl IntoExpr for Vec<u8> {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Blob(self)),
            sql_type: SqlType::Blob,
        })
    }
}

impl IntoExpr for &[u8] {
    fn into_expr(self) -> Expr {
        Expr::new(Literal {
            value: Some(Value::Blob(self.to_vec())),
            sql_type: SqlType::Blob,
        })
    }
}

/// `expr(x)` — coerce a native Rust value into a typed expression.
pub fn expr(x: impl IntoExpr) -> Expr {
    x.into_expr()
}

// =============================================================================
// Expression factory — dynamic half (fallible, closed-set dispatch)
// =============================================================================

/// `expr(x)`'s dynamic counterpart: coerce a loosely-typed [`Value`] into an
/// expression. `Value::Null` is rejected here — use [`literal`] to build a
/// typed `NULL`. This is the entry point that actually exercises
/// `InvalidLiteral` at a call site: construct a `Value` from untyped input
/// (e.g. `Value::try_from(json_value)`) and the unsupported-shape failure
/// surfaces before it ever reaches this function.
pub fn expr_dyn(x: Value) -> Result<Expr, QueryError> {
    match x {
        Value::Null => Err(QueryError::InvalidLiteral(
            "NULL is not a valid input to expr(); use literal(type, None) for a typed NULL"
                .to_string(),
        )),
        Value::Text(s) => Ok(Expr::new(Literal {
            value: Some(Value::Text(s)),
            sql_type: SqlType::Text,
        })),
        Value::Integer(i) => Ok(Expr::new(Literal {
            value: Some(Value::Integer(i)),
            sql_type: SqlType::Integer,
        })),
        Value::Real(r) => Ok(Expr::new(Literal {
            value: Some(Value::Real(r)),
            sql_type: SqlType::Real,
        })),
        Value::Boolean(b) => Ok(Expr::new(Literal {
            value: Some(Value::Boolean(b)),
            sql_type: SqlType::Boolean,
        })),
        Value::Timestamp(t) => Ok(Expr::new(Literal {
            value: Some(Value::Timestamp(t)),
            sql_type: SqlType::Timestamp,
        })),
        Value::Blob(b) => Ok(Expr::new(Literal {
            value: Some(Value::Blob(b)),
            sql_type: SqlType::Blob,
        })),
    }
}

/// `literal(type, value)` — force a target SQL type, accepting an explicit
/// `None`/`Value::Null` to produce a typed `NULL` literal (nullability
/// `Sometimes`). A concrete value must match the declared type (modulo the
/// `TEXT`/`VARCHAR` equivalence) or construction fails with `TypeMismatch`.
pub fn literal(sql_type: SqlType, value: Option<Value>) -> Result<Expr, QueryError> {
    match value {
        None | Some(Value::Null) => Ok(Expr::new(Literal {
            value: None,
            sql_type,
        })),
        Some(v) => {
            if let Some(natural) = v.natural_type() {
                if !sql_type.compatible_with(natural) {
                    return Err(QueryError::TypeMismatch(format!(
                        "literal value of type {natural} does not match declared type {sql_type}"
                    )));
                }
            }
            Ok(Expr::new(Literal {
                value: Some(v),
                sql_type,
            }))
        }
    }
}

// =============================================================================
// typeOf — descend through nested lists/holes to find the first concrete type
// =============================================================================

/// Implemented by anything `type_of` can search: a single expression, an
/// `Option` around one, or a list of them — composing so that nested lists
/// and nullish holes are transparently skipped, per spec.md §4.3.
pub trait TypeOfSource {
    fn first_sql_type(&self) -> Option<SqlType>;
}

impl TypeOfSource for Expr {
    fn first_sql_type(&self) -> Option<SqlType> {
        Some(self.sql_type())
    }
}

impl<T: TypeOfSource> TypeOfSource for Option<T> {
    fn first_sql_type(&self) -> Option<SqlType> {
        self.as_ref().and_then(TypeOfSource::first_sql_type)
    }
}

impl<T: TypeOfSource> TypeOfSource for Vec<T> {
    fn first_sql_type(&self) -> Option<SqlType> {
        self.iter().find_map(TypeOfSource::first_sql_type)
    }
}

impl<T: TypeOfSource> TypeOfSource for [T] {
    fn first_sql_type(&self) -> Option<SqlType> {
        self.iter().find_map(TypeOfSource::first_sql_type)
    }
}

/// `typeOf(...)` — find the SQL type of the first concrete expression
/// reachable through `source`, descending through any nesting it composes.
pub fn type_of<T: TypeOfSource>(source: T) -> Option<SqlType> {
    source.first_sql_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_roundtrips_through_render() {
        assert_eq!(expr("bar").to_sql(), "'bar'");
        assert_eq!(expr(123i64).to_sql(), "123");
        assert_eq!(expr(true).to_sql(), "1");
    }

    #[test]
    fn typed_null_is_sometimes_nullable() {
        let null_int = literal(SqlType::Integer, None).unwrap();
        assert_eq!(null_int.nullability(), Nullability::Sometimes);
        assert_eq!(null_int.to_sql(), "NULL");
    }

    #[test]
    fn literal_type_mismatch_is_rejected() {
        let err = literal(SqlType::Integer, Some(Value::Text("nope".into())));
        assert!(matches!(err, Err(QueryError::TypeMismatch(_))));
    }

    #[test]
    fn type_of_descends_through_nested_options_and_lists() {
        let nested: Vec<Option<Expr>> = vec![None, None, Some(expr(5i64))];
        assert_eq!(type_of(nested), Some(SqlType::Integer));
    }

    #[test]
    fn expr_dyn_rejects_null() {
        assert!(matches!(
            expr_dyn(Value::Null),
            Err(QueryError::InvalidLiteral(_))
        ));
    }
}

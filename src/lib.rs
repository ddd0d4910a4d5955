//! A statically-typed SQL expression algebra and query builder for SQLite.
//!
//! Application code declares a [`schema::Schema`], asks it for a
//! [`select::Select`] builder, binds tables via `from`/`join` (yielding
//! per-alias column handles), combines those columns and literals with the
//! operator combinators in [`combinators`] into boolean/numeric/text
//! expressions, attaches them to projections/`WHERE`/`ORDER BY`, and
//! renders the whole statement with `to_sql()`. [`db::Database`] is the
//! thin asynchronous boundary that actually runs the rendered SQL.

pub mod combinators;
pub mod db;
pub mod error;
pub mod expr;
pub mod schema;
pub mod select;
pub mod types;
pub mod value;

pub use combinators::{
    and, case, coalesce, concat, eq, ge, gt, in_list, in_subquery, includes, is_not_null, is_null,
    le, lt, ne, not, or, CaseBuilder,
};
pub use db::{Database, DatabaseConfig, Row, TableInfo};
pub use error::{QueryError, Result};
pub use expr::{expr, expr_dyn, literal, type_of, Expr, IntoExpr, TypeOfSource};
pub use schema::{Column, FromTable, Schema, Table};
pub use select::{JoinKind, OrderDir, Select};
pub use types::{Nullability, SqlType};
pub use value::Value;

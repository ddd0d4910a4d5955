//! The SELECT builder: projections, joined FROM, WHERE, ORDER BY, LIMIT/OFFSET.
//!
//! Grounded on `drizzle-core`'s `query/builder.rs`/`query/handle.rs`,
//! collapsed from a typestate builder keyed on phantom markers
//! (`NoWhere`/`HasWhere`, `NoLimit`/`HasLimit`, …) to a plain mutable
//! struct — see SPEC_FULL.md's Design Notes on why the compile-time
//! row-shape/clause-presence encoding is not reproduced here.

use crate::combinators::and;
use crate::error::QueryError;
use crate::expr::{Expr, IntoExpr};
use crate::schema::{FromTable, Schema};
use crate::types::SqlType;

/// The kind of join introducing a non-base `FROM` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// `ASC`/`DESC` for an `ORDER BY` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    fn keyword(self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }
}

struct JoinEntry {
    table: FromTable,
    join_kind: Option<JoinKind>,
    on_expr: Option<Expr>,
}

/// A mutable SELECT statement builder bound to a [`Schema`]. Mutating
/// methods take `&mut self` and return `&mut Self` for chaining; `from`/
/// `join` instead return the freshly-bound [`FromTable`] handle so callers
/// can reach its column expressions.
pub struct Select<'s> {
    schema: &'s Schema,
    projections: Vec<(String, Expr)>,
    joins: Vec<JoinEntry>,
    wheres: Vec<Expr>,
    order_by: Vec<(Expr, OrderDir)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl<'s> Select<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Select {
            schema,
            projections: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Bind the base table of the `FROM` clause. Must be called before any
    /// `join`.
    pub fn from(&mut self, table_name: &str, alias: &str) -> Result<FromTable, QueryError> {
        let table = self.schema.from_table(table_name, alias)?;
        self.joins.push(JoinEntry {
            table: table.clone(),
            join_kind: None,
            on_expr: None,
        });
        Ok(table)
    }

    /// Append a joined table. `on` is invoked with the freshly-bound table
    /// reference so callers can express the ON-predicate symmetrically
    /// against previously bound aliases.
    pub fn join(
        &mut self,
        table_name: &str,
        alias: &str,
        kind: JoinKind,
        on: impl FnOnce(&FromTable) -> Expr,
    ) -> Result<FromTable, QueryError> {
        let table = self.schema.from_table(table_name, alias)?;
        let on_expr = on(&table).assert_is_boolean()?;
        self.joins.push(JoinEntry {
            table: table.clone(),
            join_kind: Some(kind),
            on_expr: Some(on_expr),
        });
        Ok(table)
    }

    /// Append or replace the projection bound to `alias`.
    pub fn select(&mut self, alias: &str, value: impl IntoExpr) -> &mut Self {
        let value = value.into_expr();
        if let Some(existing) = self.projections.iter_mut().find(|(a, _)| a == alias) {
            existing.1 = value;
        } else {
            self.projections.push((alias.to_string(), value));
        }
        self
    }

    /// Shorthand for `select(column_name, table.col[column_name])`.
    pub fn pass_through(&mut self, table: &FromTable, column_name: &str) -> Result<&mut Self, QueryError> {
        let column = table
            .col
            .get(column_name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownColumn(table.table_name.clone(), column_name.to_string()))?;
        Ok(self.select(column_name, column))
    }

    /// Append a `BOOLEAN` expression to the `WHERE` conjunction.
    pub fn where_(&mut self, condition: Expr) -> Result<&mut Self, QueryError> {
        self.wheres.push(condition.assert_is_boolean()?);
        Ok(self)
    }

    /// Append an `ORDER BY` element.
    pub fn order_by(&mut self, value: impl IntoExpr, dir: OrderDir) -> &mut Self {
        self.order_by.push((value.into_expr(), dir));
        self
    }

    /// Set `LIMIT`.
    pub fn set_limit(&mut self, n: i64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// Set `OFFSET`.
    pub fn set_offset(&mut self, n: i64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Whether rendering already produces a `LIMIT` clause (`set_limit` or
    /// `set_offset` was called — offset alone also renders one, per the
    /// `LIMIT -1 OFFSET n` resolution). Used by the facade's non-mutating
    /// `selectOne` to decide whether to append `LIMIT 1` at render time
    /// instead of mutating the builder (SPEC_FULL.md's resolution of the
    /// `selectOne` Open Question).
    pub fn has_limit(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Adapt this SELECT as a scalar expression: `(…this SELECT…)`. The
    /// declared type is that of the projection bound to `alias`;
    /// nullability is always `Sometimes`.
    pub fn as_subquery(&self, alias: &str) -> Result<Expr, QueryError> {
        let sql_type = self
            .projections
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, e)| e.sql_type())
            .ok_or_else(|| QueryError::MissingProjection(alias.to_string()))?;
        Ok(Expr::new(crate::expr::Subquery {
            rendered: self.to_sql(),
            sql_type,
        }))
    }

    fn render_select_clause(&self) -> String {
        if self.projections.is_empty() {
            return "SELECT 1".to_string();
        }
        let list = self
            .projections
            .iter()
            .map(|(alias, value)| format!("{} AS {alias}", value.render(false)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {list}")
    }

    fn render_from_clause(&self) -> Option<String> {
        let (base, rest) = self.joins.split_first()?;
        let mut out = format!("FROM {} {}", base.table.table_name, base.table.alias);
        for entry in rest {
            let kind = entry.join_kind.expect("non-base join entry carries a join kind");
            let on_expr = entry
                .on_expr
                .as_ref()
                .expect("non-base join entry carries an on-predicate");
            out.push_str(&format!(
                " {} {} {} ON {}",
                kind.keyword(),
                entry.table.table_name,
                entry.table.alias,
                on_expr.render(true)
            ));
        }
        Some(out)
    }

    fn render_where_clause(&self) -> Option<String> {
        if self.wheres.is_empty() {
            return None;
        }
        let anded = and(self.wheres.clone())
            .expect("where_() only ever stores expressions already checked BOOLEAN");
        Some(format!("WHERE {}", anded.render(false)))
    }

    fn render_order_by_clause(&self) -> Option<String> {
        if self.order_by.is_empty() {
            return None;
        }
        let list = self
            .order_by
            .iter()
            .map(|(value, dir)| format!("{} {}", value.render(false), dir.keyword()))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("ORDER BY {list}"))
    }

    fn render_limit_clause(&self) -> Option<String> {
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => Some(format!("LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => Some(format!("LIMIT {limit}")),
            (None, Some(offset)) => Some(format!("LIMIT -1 OFFSET {offset}")),
            (None, None) => None,
        }
    }

    /// Render the full statement: present clauses newline-joined, in
    /// `SELECT`/`FROM`/`WHERE`/`ORDER BY`/`LIMIT` order.
    pub fn to_sql(&self) -> String {
        if self.projections.is_empty() {
            return self.render_select_clause();
        }
        [
            Some(self.render_select_clause()),
            self.render_from_clause(),
            self.render_where_clause(),
            self.render_order_by_clause(),
            self.render_limit_clause(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Declared type of an `Expr`, exposed as a standalone query so callers can
/// inspect a `Select`'s row shape without a compile-time encoding of it.
pub fn projection_type(select: &Select, alias: &str) -> Option<SqlType> {
    select
        .projections
        .iter()
        .find(|(a, _)| a == alias)
        .map(|(_, e)| e.sql_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::expr;
    use crate::schema::{Column, Table};

    fn user_schema() -> Schema {
        Schema::new(vec![Table::new(
            "user",
            vec![
                Column::new("id", SqlType::Integer).primary_key(),
                Column::new("login", SqlType::Text),
                Column::new("apiKey", SqlType::Text).nullable(),
                Column::new("isAdmin", SqlType::Boolean),
            ],
        )])
    }

    #[test]
    fn projection_only_select_renders_single_line() {
        let schema = user_schema();
        let mut select = Select::new(&schema);
        select.select("foo", expr("bar"));
        assert_eq!(select.to_sql(), "SELECT 'bar' AS foo");
    }

    #[test]
    fn order_by_and_limit_render_on_their_own_lines() {
        let schema = user_schema();
        let mut select = Select::new(&schema);
        select
            .select("foo", expr("bar"))
            .order_by(expr("foo"), OrderDir::Asc)
            .order_by(expr("bar"), OrderDir::Desc)
            .set_limit(10);
        assert_eq!(
            select.to_sql(),
            "SELECT 'bar' AS foo\nORDER BY 'foo' ASC, 'bar' DESC\nLIMIT 10"
        );
    }

    #[test]
    fn join_and_where_render_self_qualified_join_predicate() {
        let schema = user_schema();
        let mut select = Select::new(&schema);
        let u1 = select.from("user", "u1").unwrap();
        let u2 = select
            .join("user", "u2", JoinKind::Inner, |t| {
                t.col["login"].clone().eq(u1.col["login"].clone())
            })
            .unwrap();
        select.select("dup_login", u2.col["login"].clone());
        select
            .where_(u1.col["id"].clone().ne(u2.col["id"].clone()))
            .unwrap();
        assert_eq!(
            select.to_sql(),
            "SELECT u2.login AS dup_login\nFROM user u1 JOIN user u2 ON (u2.login=u1.login)\nWHERE u1.id!=u2.id"
        );
    }

    #[test]
    fn in_subquery_wraps_scalar_subquery_in_parens() {
        let schema = user_schema();
        let mut sub = Select::new(&schema);
        sub.select("id", expr(123i64));
        let sub_expr = sub.as_subquery("id").unwrap();

        let mut outer = Select::new(&schema);
        outer.select("title", expr("hi"));
        outer
            .where_(expr(456i64).in_subquery(sub_expr))
            .unwrap();
        assert_eq!(
            outer.to_sql(),
            "SELECT 'hi' AS title\nWHERE 456 IN (SELECT 123 AS id)"
        );
    }

    #[test]
    fn as_subquery_on_unknown_alias_is_missing_projection() {
        let schema = user_schema();
        let select = Select::new(&schema);
        assert!(matches!(
            select.as_subquery("nope"),
            Err(QueryError::MissingProjection(_))
        ));
    }

    #[test]
    fn offset_without_limit_emits_sqlite_unlimited_sentinel() {
        let schema = user_schema();
        let mut select = Select::new(&schema);
        select.select("foo", expr("bar")).set_offset(5);
        assert_eq!(select.to_sql(), "SELECT 'bar' AS foo\nLIMIT -1 OFFSET 5");
    }

    #[test]
    fn no_projections_renders_select_1_sentinel() {
        let schema = user_schema();
        let select = Select::new(&schema);
        assert_eq!(select.to_sql(), "SELECT 1");
    }
}

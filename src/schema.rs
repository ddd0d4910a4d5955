//! Declarative table/column definitions and their DDL/DML emission.
//!
//! Grounded on `drizzle-core`'s `schema.rs`, collapsed from macro-derived
//! per-table structs to a plain runtime `Schema`/`Table`/`Column` value
//! tree — table/column resolution happens at call time rather than through
//! a macro-checked row type, which is why [`crate::error::QueryError::UnknownTable`]
//! and [`crate::error::QueryError::UnknownColumn`] exist in this port.

use std::collections::HashMap;

use crate::error::QueryError;
use crate::expr::{literal, ColumnRef, Expr};
use crate::types::SqlType;
use crate::value::Value;

/// One declared column: its SQL type, nullability, and primary-key flag.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub pk: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Column {
            name: name.into(),
            sql_type,
            nullable: false,
            pk: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.pk = true;
        self
    }
}

/// A named table: its columns in declared order. Column order governs
/// `CREATE TABLE` layout and `INSERT` column/value ordering.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Table {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A bound table reference inside a `FROM`/`JOIN` clause: the table's
/// alias, plus a column-reference expression for every declared column.
#[derive(Debug, Clone)]
pub struct FromTable {
    pub alias: String,
    pub table_name: String,
    pub col: HashMap<String, Expr>,
}

impl FromTable {
    fn new(alias: &str, table: &Table) -> Self {
        let col = table
            .columns
            .iter()
            .map(|c| {
                let node = ColumnRef {
                    table_alias: alias.to_string(),
                    column_name: c.name.clone(),
                    sql_type: c.sql_type,
                    nullable: c.nullable,
                };
                (c.name.clone(), Expr::new(node))
            })
            .collect();
        FromTable {
            alias: alias.to_string(),
            table_name: table.name.clone(),
            col,
        }
    }
}

/// A named set of tables, immutable once constructed.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: HashMap<String, Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Schema {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn table(&self, name: &str) -> Result<&Table, QueryError> {
        self.tables
            .get(name)
            .ok_or_else(|| QueryError::UnknownTable(name.to_string()))
    }

    /// Bind a table to an alias, yielding per-column expression handles.
    pub fn from_table(&self, table_name: &str, alias: &str) -> Result<FromTable, QueryError> {
        let table = self.table(table_name)?;
        Ok(FromTable::new(alias, table))
    }

    /// `CREATE TABLE [IF NOT EXISTS ] <table> ( c1 TYPE1[ NOT NULL][ PRIMARY KEY], … )`
    pub fn create_table_sql(&self, table_name: &str, if_not_exists: bool) -> Result<String, QueryError> {
        let table = self.table(table_name)?;
        let prefix = if if_not_exists {
            "CREATE TABLE IF NOT EXISTS "
        } else {
            "CREATE TABLE "
        };
        let cols = table
            .columns
            .iter()
            .map(|c| {
                let mut piece = format!("{} {}", c.name, c.sql_type.ddl_keyword());
                if !c.nullable {
                    piece.push_str(" NOT NULL");
                }
                if c.pk {
                    piece.push_str(" PRIMARY KEY");
                }
                piece
            })
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("{prefix}{} ( {cols} )", table.name))
    }

    /// `INSERT INTO <table> (cols…) VALUES\n(vals…),\n(vals…)`. Empty/missing
    /// `rows` renders to an empty string. Row field order is irrelevant —
    /// the emitted column list and value tuples both follow schema order.
    pub fn insert_rows_sql(
        &self,
        table_name: &str,
        rows: &[HashMap<String, Value>],
    ) -> Result<String, QueryError> {
        if rows.is_empty() {
            return Ok(String::new());
        }
        let table = self.table(table_name)?;
        let cols = table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                let value = row.get(&column.name).cloned();
                values.push(literal(column.sql_type, value)?.to_sql());
            }
            tuples.push(format!("({})", values.join(",")));
        }
        Ok(format!(
            "INSERT INTO {} ({cols}) VALUES\n{}",
            table.name,
            tuples.join(",\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn create_table_emits_not_null_before_primary_key() {
        let sql = user_schema().create_table_sql("user", true).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS user ( id INTEGER NOT NULL PRIMARY KEY, login TEXT NOT NULL, apiKey TEXT, isAdmin BOOLEAN NOT NULL )"
        );
    }

    #[test]
    fn insert_rows_follows_schema_column_order_regardless_of_row_field_order() {
        let mut row1 = HashMap::new();
        row1.insert("login".to_string(), Value::Text("myname".into()));
        row1.insert("id".to_string(), Value::Integer(123));
        row1.insert("isAdmin".to_string(), Value::Boolean(true));
        row1.insert("apiKey".to_string(), Value::Null);

        let mut row2 = HashMap::new();
        row2.insert("id".to_string(), Value::Integer(321));
        row2.insert("login".to_string(), Value::Text("yourname".into()));
        row2.insert("apiKey".to_string(), Value::Null);
        row2.insert("isAdmin".to_string(), Value::Boolean(false));

        let sql = user_schema()
            .insert_rows_sql("user", &[row1, row2])
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO user (id,login,apiKey,isAdmin) VALUES\n(123,'myname',NULL,1),\n(321,'yourname',NULL,0)"
        );
    }

    #[test]
    fn insert_rows_with_no_rows_is_empty_string() {
        assert_eq!(user_schema().insert_rows_sql("user", &[]).unwrap(), "");
    }

    #[test]
    fn unknown_table_is_a_typed_error() {
        assert!(matches!(
            user_schema().table("missing"),
            Err(QueryError::UnknownTable(_))
        ));
    }
}

//! The asynchronous database facade: the only component that actually talks
//! to SQLite.
//!
//! Grounded on `drizzle-rs`'s `src/drizzle/sqlite/rusqlite.rs`, which wraps
//! `rusqlite::Connection` directly and relies on the borrow checker for
//! exclusivity in its synchronous API. This port needs an asynchronous,
//! `Clone`-able facade (per SPEC_FULL.md §5), so the connection is instead
//! owned behind `Arc<tokio::sync::Mutex<_>>` — the same per-connection,
//! single-owner serialization the teacher's `turso`/`libsql` backends get
//! for free from their async clients.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::QueryError;
use crate::schema::Schema;
use crate::select::Select;
use crate::value::Value;

/// Connection parameters for [`Database::open`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Filesystem path, or `:memory:` for a private in-memory database.
    pub path: String,
    /// Forwarded to `PRAGMA busy_timeout`; `None` leaves SQLite's default.
    pub busy_timeout_ms: Option<u32>,
}

impl DatabaseConfig {
    pub fn memory() -> Self {
        DatabaseConfig {
            path: ":memory:".to_string(),
            busy_timeout_ms: None,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        DatabaseConfig {
            path: path.into(),
            busy_timeout_ms: None,
        }
    }

    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }
}

/// One SQLite table's name and its `CREATE TABLE` statement, as reported by
/// `sqlite_master`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub sql: String,
}

/// A single returned row: column name to dynamic [`Value`].
pub type Row = HashMap<String, Value>;

/// Async facade over a single SQLite connection. Cloning shares the
/// underlying connection and its mutex — all clones serialize through the
/// same critical section, per SPEC_FULL.md §5.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl Database {
    /// Open (or create) the database described by `config`.
    #[instrument(skip(config), fields(path = %config.path))]
    pub fn open(config: DatabaseConfig) -> Result<Self, QueryError> {
        let conn = rusqlite::Connection::open(&config.path)?;
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(std::time::Duration::from_millis(ms as u64))?;
        }
        debug!("opened sqlite connection");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// `queryAll(sql)` — run `sql` and collect every row.
    #[instrument(skip(self))]
    pub async fn query_all(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        let conn = self.conn.lock().await;
        run_query_all(&conn, sql)
    }

    /// `queryOne(sql)` — run `sql`, returning the first row if any.
    #[instrument(skip(self))]
    pub async fn query_one(&self, sql: &str) -> Result<Option<Row>, QueryError> {
        let conn = self.conn.lock().await;
        let mut rows = run_query_all(&conn, sql)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// `queryCol(sql, name)` — run `sql`, collecting just one column's values.
    #[instrument(skip(self))]
    pub async fn query_col(&self, sql: &str, name: &str) -> Result<Vec<Value>, QueryError> {
        let rows = self.query_all(sql).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove(name))
            .collect())
    }

    /// Execute a rendered `CREATE TABLE` statement.
    #[instrument(skip(self, schema))]
    pub async fn create_table(
        &self,
        schema: &Schema,
        table_name: &str,
        if_not_exists: bool,
    ) -> Result<(), QueryError> {
        let sql = schema.create_table_sql(table_name, if_not_exists)?;
        let conn = self.conn.lock().await;
        conn.execute_batch(&sql).map_err(|err| {
            warn!(%err, "create_table failed");
            QueryError::from(err)
        })?;
        Ok(())
    }

    /// Execute a rendered `INSERT` statement. A no-op for empty `rows`.
    #[instrument(skip(self, schema, rows))]
    pub async fn insert(
        &self,
        schema: &Schema,
        table_name: &str,
        rows: &[Row],
    ) -> Result<(), QueryError> {
        let sql = schema.insert_rows_sql(table_name, rows)?;
        if sql.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock().await;
        conn.execute_batch(&sql).map_err(|err| {
            warn!(%err, "insert failed");
            QueryError::from(err)
        })?;
        debug!(rows = rows.len(), "inserted rows");
        Ok(())
    }

    /// `getTables()` — list every user table known to `sqlite_master`.
    #[instrument(skip(self))]
    pub async fn get_tables(&self) -> Result<Vec<TableInfo>, QueryError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master WHERE type='table' ORDER BY name",
        )?;
        let infos = stmt
            .query_map([], |row| {
                Ok(TableInfo {
                    name: row.get(0)?,
                    sql: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(infos)
    }

    /// Render `select` and run it, collecting every row.
    pub async fn select_all(&self, select: &Select<'_>) -> Result<Vec<Row>, QueryError> {
        self.query_all(&select.to_sql()).await
    }

    /// Render `select` with an appended `LIMIT 1` (without mutating the
    /// caller's builder, per SPEC_FULL.md's resolution of the `selectOne`
    /// Open Question) and run it, returning the first row if any.
    pub async fn select_one(&self, select: &Select<'_>) -> Result<Option<Row>, QueryError> {
        let mut sql = select.to_sql();
        if !select.has_limit() {
            sql.push_str("\nLIMIT 1");
        }
        self.query_one(&sql).await
    }

    /// Close the connection. Waits for any in-flight/queued call to finish
    /// before dropping it, so close never races an in-progress query.
    pub async fn close(self) -> Result<(), QueryError> {
        let _guard = self.conn.lock().await;
        Ok(())
    }
}

fn run_query_all(conn: &rusqlite::Connection, sql: &str) -> Result<Vec<Row>, QueryError> {
    let mut stmt = conn.prepare(sql).map_err(|err| {
        warn!(%err, "prepare failed");
        QueryError::from(err)
    })?;
    let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map([], |row| {
            let mut out = Row::new();
            for (idx, name) in column_names.iter().enumerate() {
                out.insert(name.clone(), rusqlite_value_to_value(row, idx)?);
            }
            Ok(out)
        })
        .map_err(|err| {
            warn!(%err, "query failed");
            QueryError::from(err)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(sql, rows = rows.len(), "query executed");
    Ok(rows)
}

fn rusqlite_value_to_value(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    use rusqlite::types::ValueRef;
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

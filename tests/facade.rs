use sqlkit::{Column, Database, DatabaseConfig, Schema, SqlType, Table, Value};
use std::collections::HashMap;

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

#[tokio::test]
async fn create_insert_and_query_round_trip() {
    let schema = user_schema();
    let db = Database::open(DatabaseConfig::memory()).unwrap();

    db.create_table(&schema, "user", true).await.unwrap();

    let mut row = HashMap::new();
    row.insert("id".to_string(), Value::Integer(1));
    row.insert("login".to_string(), Value::Text("alice".to_string()));
    row.insert("apiKey".to_string(), Value::Null);
    row.insert("isAdmin".to_string(), Value::Boolean(true));
    db.insert(&schema, "user", &[row]).await.unwrap();

    let mut select = sqlkit::Select::new(&schema);
    let u = select.from("user", "u").unwrap();
    select.pass_through(&u, "login").unwrap();

    let rows = db.select_all(&select).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("login"), Some(&Value::Text("alice".to_string())));
}

#[tokio::test]
async fn select_one_appends_limit_without_mutating_builder() {
    let schema = user_schema();
    let db = Database::open(DatabaseConfig::memory()).unwrap();
    db.create_table(&schema, "user", true).await.unwrap();

    let mut rows = Vec::new();
    for i in 0..3 {
        let mut row = HashMap::new();
        row.insert("id".to_string(), Value::Integer(i));
        row.insert("login".to_string(), Value::Text(format!("user{i}")));
        row.insert("apiKey".to_string(), Value::Null);
        row.insert("isAdmin".to_string(), Value::Boolean(false));
        rows.push(row);
    }
    db.insert(&schema, "user", &rows).await.unwrap();

    let mut select = sqlkit::Select::new(&schema);
    let u = select.from("user", "u").unwrap();
    select.pass_through(&u, "id").unwrap();
    select.order_by(u.col["id"].clone(), sqlkit::OrderDir::Asc);

    let one = db.select_one(&select).await.unwrap();
    assert!(one.is_some());
    // the builder itself was never mutated with a LIMIT
    assert!(!select.to_sql().contains("LIMIT"));
}

#[tokio::test]
async fn get_tables_reports_created_table() {
    let schema = user_schema();
    let db = Database::open(DatabaseConfig::memory()).unwrap();
    db.create_table(&schema, "user", true).await.unwrap();

    let tables = db.get_tables().await.unwrap();
    assert!(tables.iter().any(|t| t.name == "user"));
}

#[tokio::test]
async fn empty_insert_rows_is_a_no_op() {
    let schema = user_schema();
    let db = Database::open(DatabaseConfig::memory()).unwrap();
    db.create_table(&schema, "user", true).await.unwrap();
    db.insert(&schema, "user", &[]).await.unwrap();

    let mut select = sqlkit::Select::new(&schema);
    let u = select.from("user", "u").unwrap();
    select.pass_through(&u, "id").unwrap();
    let rows = db.select_all(&select).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn pass_through_on_unknown_column_is_a_typed_error() {
    let schema = user_schema();
    let mut select = sqlkit::Select::new(&schema);
    let u = select.from("user", "u").unwrap();
    assert!(select.pass_through(&u, "not_a_column").is_err());
}

//! Native value carrier used by dynamic literal coercion and row insertion.
//!
//! `Expr` literal nodes store their rendered text directly; `Value` is the
//! loosely-typed bridge application code uses to hand over insert rows and
//! dynamically-sourced scalars before they become typed literal [`crate::expr::Expr`] nodes.

use core::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::QueryError;
use crate::types::SqlType;

/// A dynamically-typed native value, mirroring the SQL type enumeration
/// plus an explicit `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Blob(Vec<u8>),
    Null,
}

impl Value {
    /// The `SqlType` a concrete (non-`Null`) value naturally carries.
    pub fn natural_type(&self) -> Option<SqlType> {
        match self {
            Value::Text(_) => Some(SqlType::Text),
            Value::Integer(_) => Some(SqlType::Integer),
            Value::Real(_) => Some(SqlType::Real),
            Value::Boolean(_) => Some(SqlType::Boolean),
            Value::Timestamp(_) => Some(SqlType::Timestamp),
            Value::Blob(_) => Some(SqlType::Blob),
            Value::Null => None,
        }
    }

    /// Render this value as SQL text, per the dialect rules in spec.md §6:
    /// strings single-quoted with doubled inner quotes, booleans as `1`/`0`,
    /// timestamps as millisecond-precision ISO-8601 with a trailing `Z`,
    /// blobs as `x'...'` hex, and `NULL` for the null value.
    pub fn render(&self) -> String {
        match self {
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => format!("{r:?}"),
            Value::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Timestamp(t) => {
                format!("'{}'", t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Blob(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("x'");
                for byte in bytes {
                    let _ = write!(out, "{byte:02x}");
                }
                out.push('\'');
                out
            }
            Value::Null => "NULL".to_string(),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+ $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Integer(v as i64)
            }
        })+
    };
}
impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(v as f64)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}
impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Converts a JSON value decoded from config/untyped input into a `Value`.
///
/// Objects and arrays have no SQL literal representation, so they fail with
/// `InvalidLiteral` — this is the concrete path that makes that error
/// variant reachable, since the typed half of the expression factory
/// (`expr(x)` over native Rust scalars) rejects bad input at compile time
/// instead.
#[cfg(feature = "serde_json")]
impl TryFrom<serde_json::Value> for Value {
    type Error = QueryError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as J;
        match json {
            J::Null => Ok(Value::Null),
            J::Bool(b) => Ok(Value::Boolean(b)),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(QueryError::InvalidLiteral(format!(
                        "number `{n}` has no i64/f64 representation"
                    )))
                }
            }
            J::String(s) => Ok(Value::Text(s)),
            J::Array(_) => Err(QueryError::InvalidLiteral(
                "arrays have no SQL literal representation".to_string(),
            )),
            J::Object(_) => Err(QueryError::InvalidLiteral(
                "objects have no SQL literal representation".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_quoted_with_doubled_inner_quotes() {
        assert_eq!(Value::Text("O'Brien".to_string()).render(), "'O''Brien'");
    }

    #[test]
    fn booleans_render_as_one_and_zero() {
        assert_eq!(Value::Boolean(true).render(), "1");
        assert_eq!(Value::Boolean(false).render(), "0");
    }

    #[test]
    fn blobs_render_as_hex_literal() {
        assert_eq!(Value::Blob(vec![0xde, 0xad]).render(), "x'dead'");
    }

    #[test]
    fn null_renders_as_null_keyword() {
        assert_eq!(Value::Null.render(), "NULL");
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_array_is_an_invalid_literal() {
        let json = serde_json::json!([1, 2, 3]);
        assert!(matches!(
            Value::try_from(json),
            Err(QueryError::InvalidLiteral(_))
        ));
    }
}

//! SQL values, result rows and bound statements.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StorageError, StorageResult};

/// Text layout used when a timestamp is stored as text.
pub const TIMESTAMP_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A value bound to, or read from, a SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Returns the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a timestamp the way text-typed timestamp columns store it.
    pub fn timestamp_text(ts: &DateTime<Utc>) -> String {
        ts.format(TIMESTAMP_TEXT_FORMAT).to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Null => serde_json::Value::Null,
            SqlValue::Bool(b) => serde_json::Value::Bool(*b),
            SqlValue::Integer(i) => serde_json::Value::from(*i),
            SqlValue::Float(f) => serde_json::Value::from(*f),
            SqlValue::Text(s) => serde_json::Value::String(s.clone()),
            SqlValue::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(s) => write!(f, "'{}'", s),
            SqlValue::Timestamp(ts) => write!(f, "'{}'", ts.to_rfc3339()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// A statement ready for execution: SQL with positional placeholders and
/// the values bound to them, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// SQL using the dialect's positional placeholders.
    pub sql: String,
    /// Values in placeholder order.
    pub params: Vec<SqlValue>,
}

impl BoundStatement {
    /// Creates a statement with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A single result row.
///
/// Column names are shared between all rows of one result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from shared column names and its values.
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Returns the value of a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    fn require(&self, column: &str) -> StorageResult<&SqlValue> {
        self.get(column).ok_or_else(|| {
            StorageError::Backend(BackendError::SerializationError {
                message: format!("column '{}' not present in result", column),
            })
        })
    }

    /// Reads a non-null text column.
    pub fn get_string(&self, column: &str) -> StorageResult<String> {
        self.get_opt_string(column)?.ok_or_else(|| null_error(column))
    }

    /// Reads a nullable text column.
    pub fn get_opt_string(&self, column: &str) -> StorageResult<Option<String>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) => Ok(Some(s.clone())),
            SqlValue::Integer(i) => Ok(Some(i.to_string())),
            other => Err(type_error(column, "text", other)),
        }
    }

    /// Reads a non-null integer column.
    pub fn get_i64(&self, column: &str) -> StorageResult<i64> {
        self.get_opt_i64(column)?.ok_or_else(|| null_error(column))
    }

    /// Reads a nullable integer column.
    pub fn get_opt_i64(&self, column: &str) -> StorageResult<Option<i64>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(i) => Ok(Some(*i)),
            SqlValue::Bool(b) => Ok(Some(i64::from(*b))),
            other => Err(type_error(column, "integer", other)),
        }
    }

    /// Reads a boolean column; integer 0/1 is accepted.
    pub fn get_bool(&self, column: &str) -> StorageResult<bool> {
        match self.require(column)? {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Integer(i) => Ok(*i != 0),
            SqlValue::Null => Err(null_error(column)),
            other => Err(type_error(column, "boolean", other)),
        }
    }

    /// Reads a nullable timestamp column; text in the stored layout or
    /// RFC 3339 is accepted.
    pub fn get_opt_timestamp(&self, column: &str) -> StorageResult<Option<DateTime<Utc>>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Timestamp(ts) => Ok(Some(*ts)),
            SqlValue::Text(s) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| type_error(column, "timestamp", &SqlValue::Text(s.clone()))),
            other => Err(type_error(column, "timestamp", other)),
        }
    }

    /// Converts the row to a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn null_error(column: &str) -> StorageError {
    StorageError::Backend(BackendError::SerializationError {
        message: format!("column '{}' is NULL", column),
    })
}

fn type_error(column: &str, expected: &str, actual: &SqlValue) -> StorageError {
    StorageError::Backend(BackendError::SerializationError {
        message: format!("column '{}' is not {}: {}", column, expected, actual),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_row() -> Row {
        let columns: Arc<[String]> = vec![
            "uuid".to_string(),
            "count".to_string(),
            "created_at".to_string(),
            "deleted".to_string(),
        ]
        .into();
        Row::new(
            columns,
            vec![
                SqlValue::from("org-1"),
                SqlValue::Integer(3),
                SqlValue::from("2024-05-01 10:30:00.000"),
                SqlValue::Null,
            ],
        )
    }

    #[test]
    fn test_typed_accessors() {
        let row = sample_row();
        assert_eq!(row.get_string("uuid").unwrap(), "org-1");
        assert_eq!(row.get_i64("count").unwrap(), 3);
        assert_eq!(row.get_opt_string("deleted").unwrap(), None);
        assert_eq!(
            row.get_opt_timestamp("created_at").unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_and_null_columns_error() {
        let row = sample_row();
        assert!(row.get_string("nope").is_err());
        assert!(row.get_string("deleted").is_err());
        assert!(row.get_i64("uuid").is_err());
    }

    #[test]
    fn test_to_json() {
        let json = sample_row().to_json();
        assert_eq!(json["uuid"], "org-1");
        assert_eq!(json["count"], 3);
        assert!(json["deleted"].is_null());
    }

    #[test]
    fn test_timestamp_text_layout() {
        let ts = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(SqlValue::timestamp_text(&ts), "2023-01-02 03:04:05.000");
    }
}

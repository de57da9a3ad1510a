//! SQLite executor implementation.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params_from_iter;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Serialize};

use crate::core::SqlExecutor;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{BoundStatement, Row, SqlValue};

const BACKEND_NAME: &str = "sqlite";

/// Runs search statements against a SQLite database.
pub struct SqliteExecutor {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteExecutorConfig,
    is_memory: bool,
}

impl Debug for SqliteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteExecutor")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .field("pool_connections", &self.pool.state().connections)
            .finish()
    }
}

/// Configuration for the SQLite executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteExecutorConfig {
    /// Maximum number of connections in the pool. In-memory databases
    /// always use a single connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for file databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteExecutorConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqliteExecutorConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_connections == 0 {
            errors.push("Max connections cannot be 0".to_string());
        }
        if self.min_connections > self.max_connections {
            errors.push("Min connections cannot exceed max connections".to_string());
        }
        if self.connection_timeout_ms == 0 {
            errors.push("Connection timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl SqliteExecutor {
    /// Creates an executor over a fresh in-memory database.
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_config(":memory:", SqliteExecutorConfig::default())
    }

    /// Opens or creates a file database.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteExecutorConfig::default())
    }

    /// Creates an executor with custom configuration.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteExecutorConfig,
    ) -> StorageResult<Self> {
        config.validate().map_err(StorageError::InvalidConfig)?;

        let is_memory = path.as_ref().to_string_lossy() == ":memory:";
        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        };

        let init_sql = connection_pragmas(&config, is_memory);
        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let manager = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch(&init_sql)
        });

        // Every pooled connection to ":memory:" is its own database, so the
        // pool holds exactly one connection that is never recycled.
        let builder = if is_memory {
            Pool::builder()
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            Pool::builder()
                .max_size(config.max_connections)
                .min_idle(Some(config.min_connections))
        };

        let pool = builder
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| {
                StorageError::Backend(BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: e.to_string(),
                })
            })?;

        tracing::debug!(
            is_memory,
            max_connections = pool.max_size(),
            "sqlite executor ready"
        );

        Ok(Self {
            pool,
            config,
            is_memory,
        })
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the executor configuration.
    pub fn config(&self) -> &SqliteExecutorConfig {
        &self.config
    }

    /// Runs a script of statements without parameters, such as a schema.
    pub async fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        let pool = self.pool.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let conn = get_connection(&pool)?;
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await?
    }
}

fn connection_pragmas(config: &SqliteExecutorConfig, is_memory: bool) -> String {
    let mut sql = String::new();
    if config.enable_foreign_keys {
        sql.push_str("PRAGMA foreign_keys = ON;");
    }
    if config.enable_wal && !is_memory {
        sql.push_str("PRAGMA journal_mode = WAL;");
    }
    sql
}

fn get_connection(
    pool: &Pool<SqliteConnectionManager>,
) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
    pool.get().map_err(|e| {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: e.to_string(),
        })
    })
}

fn read_value(value: ValueRef<'_>, column: &str) -> StorageResult<SqlValue> {
    match value {
        ValueRef::Null => Ok(SqlValue::Null),
        ValueRef::Integer(i) => Ok(SqlValue::Integer(i)),
        ValueRef::Real(f) => Ok(SqlValue::Float(f)),
        ValueRef::Text(bytes) => Ok(SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err(StorageError::Backend(BackendError::SerializationError {
            message: format!("column '{}' holds a blob, which searches do not read", column),
        })),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Timestamp(ts) => {
                ToSqlOutput::Owned(Value::Text(SqlValue::timestamp_text(ts)))
            }
        })
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn product_name(&self) -> &str {
        "SQLite"
    }

    async fn query(&self, statement: &BoundStatement) -> StorageResult<Vec<Row>> {
        let pool = self.pool.clone();
        let statement = statement.clone();
        tokio::task::spawn_blocking(move || -> StorageResult<Vec<Row>> {
            let conn = get_connection(&pool)?;
            let mut stmt = conn.prepare(&statement.sql)?;
            let columns: Arc<[String]> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for (idx, column) in columns.iter().enumerate() {
                    values.push(read_value(row.get_ref(idx)?, column)?);
                }
                result.push(Row::new(columns.clone(), values));
            }
            Ok(result)
        })
        .await?
    }

    async fn execute(&self, statement: &BoundStatement) -> StorageResult<u64> {
        let pool = self.pool.clone();
        let statement = statement.clone();
        tokio::task::spawn_blocking(move || -> StorageResult<u64> {
            let conn = get_connection(&pool)?;
            let affected = conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
            Ok(affected as u64)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    async fn executor() -> SqliteExecutor {
        let executor = SqliteExecutor::in_memory().unwrap();
        executor
            .execute_batch(
                "CREATE TABLE things (uuid TEXT PRIMARY KEY, flag INTEGER, score REAL, seen_at TEXT);",
            )
            .await
            .unwrap();
        executor
    }

    #[tokio::test]
    async fn test_in_memory_database_survives_between_calls() {
        let executor = executor().await;
        let inserted = executor
            .execute(&BoundStatement::with_params(
                "INSERT INTO things (uuid, flag, score, seen_at) VALUES (?1, ?2, ?3, ?4)",
                vec![
                    "t1".into(),
                    true.into(),
                    1.5.into(),
                    Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap().into(),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let rows = executor
            .query(&BoundStatement::new("SELECT uuid, flag, score, seen_at FROM things"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_string("uuid").unwrap(), "t1");
        assert!(rows[0].get_bool("flag").unwrap());
        assert_eq!(rows[0].get("score"), Some(&SqlValue::Float(1.5)));
        assert_eq!(
            rows[0].get_string("seen_at").unwrap(),
            "2024-05-01 10:30:00.000"
        );
    }

    #[tokio::test]
    async fn test_null_parameter() {
        let executor = executor().await;
        executor
            .execute(&BoundStatement::with_params(
                "INSERT INTO things (uuid, flag) VALUES (?1, ?2)",
                vec!["t2".into(), SqlValue::Null],
            ))
            .await
            .unwrap();
        let rows = executor
            .query(&BoundStatement::new("SELECT flag FROM things WHERE flag IS NULL"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("flag").unwrap().is_null());
    }

    #[test]
    fn test_config_validation() {
        let config = SqliteExecutorConfig {
            max_connections: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let result = SqliteExecutor::with_config(":memory:", config);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_product_name_detects_dialect() {
        let executor = SqliteExecutor::in_memory().unwrap();
        assert!(executor.is_memory());
        assert_eq!(
            crate::dialect::DialectKind::from_product_name(executor.product_name()).unwrap(),
            crate::dialect::DialectKind::Sqlite
        );
    }
}

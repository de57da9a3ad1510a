//! PostgreSQL executor implementation.

use std::error::Error;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime, SslMode};
use postgres_types::private::BytesMut;
use postgres_types::{IsNull, ToSql, Type, to_sql_checked};
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;

use crate::core::SqlExecutor;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{BoundStatement, Row, SqlValue};

const BACKEND_NAME: &str = "postgres";

/// Runs search statements against PostgreSQL.
pub struct PostgresExecutor {
    pool: Pool,
    config: PostgresConfig,
}

impl Debug for PostgresExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresExecutor")
            .field("config", &self.config)
            .field("pool_size", &self.pool.status().size)
            .finish()
    }
}

/// Configuration for the PostgreSQL executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// PostgreSQL host.
    #[serde(default = "default_host")]
    pub host: String,

    /// PostgreSQL port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_dbname")]
    pub dbname: String,

    /// Database user.
    #[serde(default = "default_user")]
    pub user: String,

    /// Database password.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// SSL mode.
    #[serde(default)]
    pub ssl_mode: PostgresSslMode,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Statement timeout in milliseconds, applied to every connection.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

/// SSL mode for PostgreSQL connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostgresSslMode {
    /// Disable SSL.
    Disable,
    /// Prefer SSL, but allow non-SSL.
    #[default]
    Prefer,
    /// Require SSL.
    Require,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_dbname() -> String {
    "reports".to_string()
}

fn default_user() -> String {
    "reports".to_string()
}

fn default_max_connections() -> usize {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_statement_timeout_ms() -> u64 {
    30000
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: default_user(),
            password: None,
            ssl_mode: PostgresSslMode::default(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

impl PostgresConfig {
    /// Reads the configuration from environment variables.
    ///
    /// - `REPORT_SEARCH_PG_HOST` (default: "localhost")
    /// - `REPORT_SEARCH_PG_PORT` (default: 5432)
    /// - `REPORT_SEARCH_PG_DBNAME` (default: "reports")
    /// - `REPORT_SEARCH_PG_USER` (default: "reports")
    /// - `REPORT_SEARCH_PG_PASSWORD`
    /// - `REPORT_SEARCH_PG_MAX_CONNECTIONS` (default: 10)
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("REPORT_SEARCH_PG_HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("REPORT_SEARCH_PG_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            dbname: std::env::var("REPORT_SEARCH_PG_DBNAME").unwrap_or_else(|_| default_dbname()),
            user: std::env::var("REPORT_SEARCH_PG_USER").unwrap_or_else(|_| default_user()),
            password: std::env::var("REPORT_SEARCH_PG_PASSWORD").ok(),
            max_connections: std::env::var("REPORT_SEARCH_PG_MAX_CONNECTIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_max_connections),
            ..Default::default()
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push("Host cannot be empty".to_string());
        }
        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }
        if self.max_connections == 0 {
            errors.push("Max connections cannot be 0".to_string());
        }
        if self.statement_timeout_ms == 0 {
            errors.push("Statement timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl PostgresExecutor {
    /// Creates an executor and verifies connectivity.
    pub async fn new(config: PostgresConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::InvalidConfig)?;
        let pool = Self::create_pool(&config)?;

        let client = pool.get().await.map_err(connection_failed)?;
        let row = client.query_one("SHOW server_version", &[]).await?;
        let version: String = row.try_get(0)?;
        drop(client);

        tracing::info!(
            host = %config.host,
            dbname = %config.dbname,
            server_version = %version,
            max_connections = config.max_connections,
            "postgres executor ready"
        );

        Ok(Self { pool, config })
    }

    /// Creates an executor from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Returns the executor configuration.
    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Runs a script of statements without parameters, such as a schema.
    pub async fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        let client = self.pool.get().await.map_err(connection_failed)?;
        client.batch_execute(sql).await?;
        Ok(())
    }

    fn create_pool(config: &PostgresConfig) -> StorageResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.dbname = Some(config.dbname.clone());
        cfg.user = Some(config.user.clone());
        cfg.password = config.password.clone();
        cfg.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        cfg.options = Some(format!(
            "-c statement_timeout={}",
            config.statement_timeout_ms
        ));
        cfg.ssl_mode = Some(match config.ssl_mode {
            PostgresSslMode::Disable => SslMode::Disable,
            PostgresSslMode::Prefer => SslMode::Prefer,
            PostgresSslMode::Require => SslMode::Require,
        });

        cfg.builder(NoTls)
            .map_err(|e| {
                StorageError::Backend(BackendError::Internal {
                    backend_name: BACKEND_NAME.to_string(),
                    message: format!("Failed to create pool builder: {}", e),
                    source: None,
                })
            })?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| {
                StorageError::Backend(BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: e.to_string(),
                })
            })
    }
}

fn connection_failed(err: deadpool_postgres::PoolError) -> StorageError {
    StorageError::Backend(BackendError::ConnectionFailed {
        backend_name: BACKEND_NAME.to_string(),
        message: err.to_string(),
    })
}

fn params(statement: &BoundStatement) -> Vec<&(dyn ToSql + Sync)> {
    statement
        .params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect()
}

fn read_row(row: &tokio_postgres::Row, columns: &Arc<[String]>) -> StorageResult<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, column) in row.columns().iter().enumerate() {
        values.push(read_value(row, idx, column.type_(), column.name())?);
    }
    Ok(Row::new(columns.clone(), values))
}

fn read_value(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
    name: &str,
) -> StorageResult<SqlValue> {
    let value: SqlValue = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(i64::from).into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(i64::from).into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(f64::from).into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(idx)?.into()
        }
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)?
            .map(|u| u.to_string())
            .into(),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(idx)?.into(),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|ts| ts.and_utc())
            .into(),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
            .into(),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(|v| v.to_string())
            .into(),
        _ => {
            return Err(StorageError::Backend(BackendError::SerializationError {
                message: format!("column '{}' has unsupported type {}", name, ty),
            }));
        }
    };
    Ok(value)
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) => b.to_sql(ty, out),
            SqlValue::Integer(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            SqlValue::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            SqlValue::Text(s) => match *ty {
                Type::UUID => uuid::Uuid::parse_str(s)?.to_sql(ty, out),
                _ => s.to_sql(ty, out),
            },
            SqlValue::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => ts.naive_utc().to_sql(ty, out),
                Type::DATE => ts.date_naive().to_sql(ty, out),
                _ => ts.to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[async_trait]
impl SqlExecutor for PostgresExecutor {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn product_name(&self) -> &str {
        "PostgreSQL"
    }

    async fn query(&self, statement: &BoundStatement) -> StorageResult<Vec<Row>> {
        let client = self.pool.get().await.map_err(connection_failed)?;
        let rows = client.query(statement.sql.as_str(), &params(statement)).await?;

        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let columns: Arc<[String]> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        rows.iter().map(|row| read_row(row, &columns)).collect()
    }

    async fn execute(&self, statement: &BoundStatement) -> StorageResult<u64> {
        let client = self.pool.get().await.map_err(connection_failed)?;
        Ok(client.execute(statement.sql.as_str(), &params(statement)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PostgresConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 5432);
        assert_eq!(config.statement_timeout_ms, 30000);
        assert_eq!(config.ssl_mode, PostgresSslMode::Prefer);
    }

    #[test]
    fn test_password_is_not_serialized() {
        let config = PostgresConfig {
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_validate_reports_every_error() {
        let config = PostgresConfig {
            host: String::new(),
            max_connections: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_integer_adapts_to_column_width() {
        let mut out = BytesMut::new();
        SqlValue::Integer(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(out.len(), 4);

        let mut out = BytesMut::new();
        let overflow = SqlValue::Integer(i64::MAX).to_sql(&Type::INT2, &mut out);
        assert!(overflow.is_err());
    }

    #[test]
    fn test_null_writes_nothing() {
        let mut out = BytesMut::new();
        let result = SqlValue::Null.to_sql(&Type::TEXT, &mut out).unwrap();
        assert!(matches!(result, IsNull::Yes));
        assert!(out.is_empty());
    }
}

//! Statement execution abstraction.
//!
//! The engine never talks to a database driver directly. Statements are
//! rendered and bound by the engine and handed to a [`SqlExecutor`], which
//! runs them and returns plain [`Row`]s. Results are turned into caller types
//! by a [`RowMapper`].

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{BoundStatement, Row};

/// Runs bound statements against one database.
///
/// Implementations hand out pooled connections per call and are shared
/// between concurrent searches.
///
/// # Example
///
/// ```ignore
/// use report_search::core::SqlExecutor;
/// use report_search::types::BoundStatement;
///
/// async fn count_rows<E: SqlExecutor>(executor: &E) -> report_search::StorageResult<usize> {
///     let rows = executor.query(&BoundStatement::new("SELECT uuid FROM tags")).await?;
///     Ok(rows.len())
/// }
/// ```
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Database product name as reported by connection metadata, used to
    /// detect the dialect.
    fn product_name(&self) -> &str;

    /// Runs a query and returns all rows.
    async fn query(&self, statement: &BoundStatement) -> StorageResult<Vec<Row>>;

    /// Runs a statement that returns no rows and reports the affected count.
    async fn execute(&self, statement: &BoundStatement) -> StorageResult<u64>;
}

/// Maps a result row to a caller type.
pub trait RowMapper<T>: Send + Sync {
    /// Maps one row.
    fn map_row(&self, row: &Row) -> StorageResult<T>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&Row) -> StorageResult<T> + Send + Sync,
{
    fn map_row(&self, row: &Row) -> StorageResult<T> {
        self(row)
    }
}

/// Maps rows to JSON objects keyed by column name.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRowMapper;

impl RowMapper<serde_json::Value> for JsonRowMapper {
    fn map_row(&self, row: &Row) -> StorageResult<serde_json::Value> {
        Ok(row.to_json())
    }
}

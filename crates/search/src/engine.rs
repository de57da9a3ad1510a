//! The search engine facade.
//!
//! [`SearchEngine`] ties an executor, its dialect and the configuration
//! together and runs entity searches end to end.

use std::sync::Arc;
use std::time::Instant;

use crate::config::SearchConfig;
use crate::core::{RowMapper, SqlExecutor};
use crate::dialect::DialectKind;
use crate::error::{StorageError, StorageResult};
use crate::search::{EntityQuery, HierarchyValidator, SearchEntity, Searcher, execute};
use crate::types::{BatchParams, Page};

/// Runs entity searches against one database.
///
/// The engine is stateless between calls and can be shared behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use report_search::{SearchConfig, SearchEngine, JsonRowMapper};
/// use report_search::backends::sqlite::SqliteExecutor;
/// use report_search::search::entities::{OrganizationQuery, Organizations};
///
/// let executor = Arc::new(SqliteExecutor::in_memory()?);
/// let engine = SearchEngine::new(executor, SearchConfig::default())?;
/// let page = engine
///     .search(&engine.query::<Organizations>().with_text("kabul"), &JsonRowMapper)
///     .await?;
/// ```
pub struct SearchEngine {
    executor: Arc<dyn SqlExecutor>,
    dialect: DialectKind,
    config: SearchConfig,
}

impl SearchEngine {
    /// Creates an engine.
    ///
    /// The dialect comes from the configuration or, when absent, from the
    /// executor's product name.
    pub fn new(executor: Arc<dyn SqlExecutor>, config: SearchConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::InvalidConfig)?;
        let dialect = match config.dialect {
            Some(dialect) => dialect,
            None => DialectKind::from_product_name(executor.product_name())?,
        };
        tracing::info!(
            backend = executor.name(),
            product = executor.product_name(),
            dialect = %dialect,
            "search engine ready"
        );
        Ok(Self {
            executor,
            dialect,
            config,
        })
    }

    /// Dialect statements are rendered for.
    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    /// The configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The executor.
    pub fn executor(&self) -> &Arc<dyn SqlExecutor> {
        &self.executor
    }

    /// A new query using the configured default page size.
    pub fn query<E: SearchEntity>(&self) -> EntityQuery<E> {
        EntityQuery::new().with_page(0, self.config.default_page_size)
    }

    /// A searcher rendering for this engine's dialect.
    pub fn searcher<E: SearchEntity>(&self) -> Searcher<E> {
        Searcher::new(self.dialect)
    }

    /// Runs a search and maps every row.
    pub async fn search<E, T, M>(&self, query: &EntityQuery<E>, mapper: &M) -> StorageResult<Page<T>>
    where
        E: SearchEntity,
        M: RowMapper<T> + ?Sized,
    {
        let page_size = self.config.clamp_page_size(query.common.page_size);
        self.run(query, query.common.page_num, page_size, mapper)
            .await
    }

    /// Loads the related rows of every key in one statement and groups them
    /// per key, in key order. Keys without rows get an empty group.
    ///
    /// Batch loads are never paged.
    pub async fn batch_search<E, T, M>(
        &self,
        query: &EntityQuery<E>,
        batch: &BatchParams,
        keys: &[String],
        mapper: &M,
    ) -> StorageResult<Vec<Vec<T>>>
    where
        E: SearchEntity,
        T: Clone,
        M: RowMapper<T> + ?Sized,
    {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = query
            .clone()
            .with_page(0, 0)
            .with_batch(batch.with_batch_uuids(keys.iter().cloned()));
        let page = self.run(&query, 0, 0, mapper).await?;
        Ok(page.group_by_batch(keys))
    }

    /// A validator for hierarchy edits on this engine's database.
    pub fn hierarchy_validator(&self) -> HierarchyValidator<'_> {
        HierarchyValidator::new(self.executor.as_ref(), self.dialect)
    }

    async fn run<E, T, M>(
        &self,
        query: &EntityQuery<E>,
        page_num: u32,
        page_size: u32,
        mapper: &M,
    ) -> StorageResult<Page<T>>
    where
        E: SearchEntity,
        M: RowMapper<T> + ?Sized,
    {
        let (outer, _) = self.searcher::<E>().build_query(query)?;

        let started = Instant::now();
        let page = execute(self.executor.as_ref(), &outer, page_num, page_size, mapper).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if elapsed_ms >= self.config.slow_query_threshold_ms {
            tracing::warn!(
                query = E::NAME,
                dialect = %self.dialect,
                rows = page.len(),
                elapsed_ms,
                "slow search"
            );
        } else {
            tracing::debug!(
                query = E::NAME,
                rows = page.len(),
                total_count = ?page.total_count,
                elapsed_ms,
                "search completed"
            );
        }
        Ok(page)
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("backend", &self.executor.name())
            .field("dialect", &self.dialect)
            .field("config", &self.config)
            .finish()
    }
}

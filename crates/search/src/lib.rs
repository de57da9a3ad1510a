//! Report Search Engine
//!
//! This crate builds and runs the search and batch-loading SQL behind a
//! reporting application's read side: paged, sorted, filtered and free-text
//! searches over entities such as organizations, locations, tasks, people
//! and reports, plus single-statement batch loads of related rows for a
//! graph API layer.
//!
//! Statements are rendered for PostgreSQL, Microsoft SQL Server or SQLite
//! from one description, and hierarchical filters (organizations, locations,
//! tasks) are expanded with recursive common table expressions.
//!
//! # Executor Features
//!
//! ```toml
//! [dependencies]
//! report-search = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! - `sqlite` (default) - SQLite executor with in-memory and file modes
//! - `postgres` - PostgreSQL executor via deadpool-postgres
//!
//! SQL Server statements are rendered by the engine; running them needs a
//! caller-supplied [`SqlExecutor`].
//!
//! # Architecture
//!
//! - [`types`] - queries, batch parameters, hierarchies, pages and SQL values
//! - [`dialect`] - per-database rendering of pagination, text search and recursion
//! - [`search`] - statement assembly, entity searchers and execution
//! - [`core`] - the executor and row-mapper seams
//! - [`backends`] - bundled executors
//! - [`engine`] - the [`SearchEngine`] facade
//! - [`config`] - engine configuration
//! - [`error`] - error types
//!
//! # Rendering a Search
//!
//! ```
//! use report_search::dialect::DialectKind;
//! use report_search::search::Searcher;
//! use report_search::search::entities::{OrganizationFilters, OrganizationQuery, Organizations};
//! use report_search::types::{HierarchyFilter, Status};
//!
//! let query = OrganizationQuery::new()
//!     .with_text("kabul")
//!     .with_filters(OrganizationFilters {
//!         status: Some(Status::Active),
//!         org: Some(HierarchyFilter::children(["org-a".to_string()])),
//!         ..Default::default()
//!     });
//!
//! let statement = Searcher::<Organizations>::new(DialectKind::Postgres)
//!     .bind_statement(&query)
//!     .unwrap();
//! assert!(statement.sql.starts_with("WITH RECURSIVE"));
//! ```
//!
//! # Running a Search
//!
//! ```no_run
//! use std::sync::Arc;
//! use report_search::{JsonRowMapper, SearchConfig, SearchEngine};
//! use report_search::backends::sqlite::SqliteExecutor;
//! use report_search::search::entities::Organizations;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SearchEngine::new(Arc::new(SqliteExecutor::in_memory()?), SearchConfig::default())?;
//! let page = engine
//!     .search(&engine.query::<Organizations>().with_text("kabul"), &JsonRowMapper)
//!     .await?;
//! println!("{} of {:?}", page.len(), page.total_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use config::SearchConfig;
pub use engine::SearchEngine;
pub use error::{
    BackendError, SearchError, SearchResult, StorageError, StorageResult, ValidationError,
};
pub use types::{
    BatchParams, BoundStatement, Hierarchy, HierarchyFilter, Page, RecurseStrategy, Row,
    SearchQuery, SortOrder, SqlValue, Status,
};

// Re-export core traits
pub use core::{JsonRowMapper, RowMapper, SqlExecutor};
pub use dialect::{Dialect, DialectKind};
pub use search::{EntityQuery, SearchEntity, Searcher};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

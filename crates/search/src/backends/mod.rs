//! Bundled [`SqlExecutor`](crate::core::SqlExecutor) implementations.
//!
//! Each executor is gated behind a feature flag.
//!
//! | Executor | Feature | Description |
//! |----------|---------|-------------|
//! | SQLite | `sqlite` | Embedded database, in-memory or file-backed |
//! | PostgreSQL | `postgres` | Pooled connections via deadpool-postgres |
//!
//! SQL Server has no bundled executor: its statements are rendered by the
//! engine and run by a caller-supplied executor reporting the product name
//! `Microsoft SQL Server`.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

//! PostgreSQL executor.
//!
//! Connection pooling uses deadpool-postgres. Parameters are sent with the
//! types PostgreSQL infers for their placeholders, so integers adapt to the
//! column width and text adapts to `uuid` columns.
//!
//! # Example
//!
//! ```no_run
//! use report_search::backends::postgres::{PostgresConfig, PostgresExecutor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = PostgresExecutor::new(PostgresConfig::default()).await?;
//!
//! // Or from REPORT_SEARCH_PG_* environment variables
//! let executor = PostgresExecutor::from_env().await?;
//! # Ok(())
//! # }
//! ```

mod executor;

pub use executor::{PostgresConfig, PostgresExecutor, PostgresSslMode};

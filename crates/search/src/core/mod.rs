//! Core abstractions at the database boundary.
//!
//! - [`SqlExecutor`] - runs bound statements; implemented per database
//! - [`RowMapper`] - turns result rows into caller types

mod executor;

pub use executor::{JsonRowMapper, RowMapper, SqlExecutor};

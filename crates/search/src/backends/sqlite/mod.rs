//! SQLite executor.
//!
//! Runs search statements on a pooled SQLite database, either in memory
//! (handy for tests) or file-backed.
//!
//! # Example
//!
//! ```no_run
//! use report_search::backends::sqlite::SqliteExecutor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = SqliteExecutor::in_memory()?;
//! let on_disk = SqliteExecutor::open("./data/reports.db")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Value Mapping
//!
//! | `SqlValue` | SQLite |
//! |------------|--------|
//! | `Bool` | INTEGER 0/1 |
//! | `Integer` | INTEGER |
//! | `Float` | REAL |
//! | `Text` | TEXT |
//! | `Timestamp` | TEXT, `YYYY-MM-DD HH:MM:SS.fff` in UTC |

mod executor;

pub use executor::{SqliteExecutor, SqliteExecutorConfig};

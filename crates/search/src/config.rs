//! Engine configuration.
//!
//! # Example
//!
//! ```rust
//! use report_search::SearchConfig;
//!
//! let config: SearchConfig = serde_json::from_str(
//!     r#"{ "dialect": "postgres", "max_page_size": 500 }"#,
//! ).unwrap();
//! assert_eq!(config.clamp_page_size(0), 500);
//! assert_eq!(config.default_page_size, 10);
//! ```

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;
use crate::types::DEFAULT_PAGE_SIZE;

/// Configuration for a [`SearchEngine`](crate::SearchEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Dialect to render for; detected from the executor when absent.
    #[serde(default)]
    pub dialect: Option<DialectKind>,

    /// Page size of queries created by the engine.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page size served. Unlimited requests (0) are not capped.
    #[serde(default)]
    pub max_page_size: Option<u32>,

    /// Statements slower than this are logged at warn level.
    #[serde(default = "default_slow_query_threshold_ms")]
    pub slow_query_threshold_ms: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_slow_query_threshold_ms() -> u64 {
    1000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            default_page_size: default_page_size(),
            max_page_size: None,
            slow_query_threshold_ms: default_slow_query_threshold_ms(),
        }
    }
}

impl SearchConfig {
    /// Creates a configuration for a fixed dialect.
    pub fn for_dialect(dialect: DialectKind) -> Self {
        Self {
            dialect: Some(dialect),
            ..Default::default()
        }
    }

    /// Applies the page size cap to an explicit page size.
    ///
    /// A request for every row (0) is returned unchanged.
    pub fn clamp_page_size(&self, requested: u32) -> u32 {
        match self.max_page_size {
            Some(max) if requested > max => max,
            _ => requested,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(max) = self.max_page_size {
            if max == 0 {
                errors.push("Max page size cannot be 0".to_string());
            }
            if self.default_page_size > max {
                errors.push("Default page size cannot exceed max page size".to_string());
            }
        }

        if self.slow_query_threshold_ms == 0 {
            errors.push("Slow query threshold cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

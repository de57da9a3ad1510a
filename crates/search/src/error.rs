//! Error types for the search engine.
//!
//! This module defines all error types used throughout the crate, following a
//! hierarchy that separates caller-contract violations (search errors),
//! write-path validation errors and database failures (backend errors).

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Write-path validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search construction errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Invalid engine or executor configuration
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

/// Errors raised while building a search.
///
/// These are caller-contract violations and are never retried.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Two filters that cannot be combined were both supplied.
    #[error("conflicting filters for {entity}: {message}")]
    ConflictingFilters { entity: String, message: String },

    /// The batch parameters cannot be applied.
    #[error("invalid batch parameters: {message}")]
    InvalidBatch { message: String },

    /// A named parameter is referenced in the SQL but was never bound.
    #[error("missing value for named parameter :{name}")]
    MissingParameter { name: String },

    /// The database product is not one of the supported dialects.
    #[error("unsupported database dialect: {product_name}")]
    UnsupportedDialect { product_name: String },

    /// The requested page cannot be served.
    #[error("invalid pagination: {message}")]
    InvalidPagination { message: String },

    /// The hierarchy request is malformed.
    #[error("invalid hierarchy request on {hierarchy}: {message}")]
    InvalidHierarchy { hierarchy: String, message: String },
}

/// Errors raised when validating a write against a hierarchy.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The edit would make a node its own ancestor.
    #[error("hierarchy cycle in {hierarchy}: {parent} is a descendant of {node}")]
    HierarchyCycle {
        hierarchy: String,
        node: String,
        parent: String,
    },

    /// A node was proposed as its own parent.
    #[error("node {node} cannot be its own parent in {hierarchy}")]
    SelfReference { hierarchy: String, node: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// A row value could not be converted to the requested type.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for engine operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for search construction.
pub type SearchResult<T> = Result<T, SearchError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "runtime".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_filters_display() {
        let err = SearchError::ConflictingFilters {
            entity: "reports".to_string(),
            message: "org_uuid cannot be combined with advisor_org".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "conflicting filters for reports: org_uuid cannot be combined with advisor_org"
        );
    }

    #[test]
    fn test_missing_parameter_display() {
        let err = SearchError::MissingParameter {
            name: "orgUuid".to_string(),
        };
        assert_eq!(err.to_string(), "missing value for named parameter :orgUuid");
    }

    #[test]
    fn test_hierarchy_cycle_display() {
        let err = ValidationError::HierarchyCycle {
            hierarchy: "organizations".to_string(),
            node: "a".to_string(),
            parent: "c".to_string(),
        };
        assert!(err.to_string().contains("c is a descendant of a"));
    }

    #[test]
    fn test_storage_error_from_sub_errors() {
        let err: StorageError = SearchError::InvalidBatch {
            message: "no keys".to_string(),
        }
        .into();
        assert!(matches!(err, StorageError::Search(_)));

        let err: StorageError = ValidationError::SelfReference {
            hierarchy: "tasks".to_string(),
            node: "t1".to_string(),
        }
        .into();
        assert!(matches!(err, StorageError::Validation(_)));
        assert_eq!(err.to_string(), "node t1 cannot be its own parent in tasks");
    }
}

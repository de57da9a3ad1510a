//! Core types for search queries and results.
//!
//! - [`SearchQuery`] - paging, sorting, text and batch parameters shared by all entities
//! - [`BatchParams`] - the four batch-load relation shapes
//! - [`Hierarchy`] - recursive structures (organizations, locations, tasks)
//! - [`Page`] - a page of mapped results with its metadata
//! - [`SqlValue`], [`Row`], [`BoundStatement`] - values crossing the database boundary

pub mod batch;
mod hierarchy;
mod page;
mod query;
mod value;

pub use batch::{
    BatchParams, FkBatchParams, M2mBatchParams, RecursiveFkBatchParams, RecursiveM2mBatchParams,
    relations,
};
pub use hierarchy::{Hierarchy, HierarchyLink, NO_PARENT_SENTINEL};
pub use page::Page;
pub use query::{
    DEFAULT_PAGE_SIZE, HierarchyFilter, RecurseStrategy, SearchQuery, SortOrder, Status,
};
pub use value::{BoundStatement, Row, SqlValue, TIMESTAMP_TEXT_FORMAT};

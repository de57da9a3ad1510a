//! Search statement construction and execution.
//!
//! - [`assembler`] - ordered-clause SQL builder with named and list parameters
//! - [`bind`] - rewrites named parameters into dialect placeholders
//! - [`batch`] - batch-load clauses for the four relation shapes
//! - [`hierarchy`] - recursive closures and the hierarchy edit validator
//! - [`searcher`] - the generic entity searcher
//! - [`entities`] - the searchable entities
//! - [`execute`] - runs a statement and assembles the page
//!
//! # Statement Lifecycle
//!
//! ```text
//! EntityQuery<E>
//!   └── Searcher::build_query      outer + inner assemblers
//!         ├── BatchStrategy        joins, "batchUuid", key restriction
//!         ├── text search          dialect text clause, search_rank
//!         └── E::apply_filters     predicates (inner), closures (outer)
//!   └── execute
//!         ├── Dialect::paginate
//!         ├── bind                 :name / <name> -> positional placeholders
//!         ├── SqlExecutor::query
//!         └── RowMapper            Page<T> with total count and batch keys
//! ```

pub mod assembler;
pub mod batch;
pub mod bind;
pub mod entities;
pub mod execute;
pub mod hierarchy;
pub mod searcher;

pub use assembler::{ClauseAssembler, DateComparison};
pub use batch::{BATCH_KEY_COLUMN, BATCH_KEYS_PARAM, BatchStrategy};
pub use bind::{bind, bind_assembled};
pub use execute::execute;
pub use hierarchy::{HierarchyMatch, HierarchyValidator, ROOT_COLUMN, hierarchy_predicate};
pub use searcher::{
    EntityQuery, LinkColumn, SEARCH_RANK_COLUMN, SearchContext, SearchEntity, Searcher,
    TEXT_PARAM, TEXT_PREFIX_PARAM,
};

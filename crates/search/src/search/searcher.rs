//! Generic entity searcher.
//!
//! Every searchable entity describes itself with a [`SearchEntity`]
//! implementation (table, columns, sort fields, filters), and a single
//! [`Searcher`] turns an [`EntityQuery`] into the two-level statement:
//!
//! ```text
//! [WITH [RECURSIVE] ...]
//! SELECT tasks.*[, COUNT(*) OVER() AS "totalCount"]
//! FROM ( SELECT tasks.uuid, tasks.short_name, ... FROM tasks WHERE ... ) tasks
//! ORDER BY tasks.short_name ASC, tasks.uuid ASC
//! ```
//!
//! A text search without an explicit sort field selects a `search_rank`
//! in the inner query and orders by it first.
//!
//! Pagination is appended by the dialect when the statement is executed.

use std::fmt;
use std::marker::PhantomData;

use crate::dialect::{DialectKind, LIKE_ESCAPE, strip_wildcards};
use crate::error::{SearchError, SearchResult};
use crate::types::{
    BatchParams, BoundStatement, Hierarchy, HierarchyFilter, SearchQuery, SortOrder,
};

use super::assembler::ClauseAssembler;
use super::batch::BatchStrategy;
use super::bind::bind_assembled;
use super::hierarchy::{HierarchyMatch, hierarchy_predicate};

/// Name of the scalar parameter carrying the text term.
pub const TEXT_PARAM: &str = "text";

/// Name of the scalar parameter carrying the text term as a prefix pattern.
pub const TEXT_PREFIX_PARAM: &str = "textPrefix";

/// Result column holding the relevance of a text match.
pub const SEARCH_RANK_COLUMN: &str = "search_rank";

/// Shortest text that is also matched as a key prefix.
const MIN_UUID_PREFIX: usize = 4;

/// Static description of a searchable entity.
pub trait SearchEntity: Send + Sync + 'static {
    /// Sort fields.
    type SortBy: Copy + Default + fmt::Debug + Send + Sync;

    /// Entity-specific filters; the default value filters nothing.
    type Filters: Default + Clone + fmt::Debug + Send + Sync;

    /// Name used in logs and errors.
    const NAME: &'static str;

    /// Table name, also used as the alias of the inner query.
    const TABLE: &'static str;

    /// Columns selected by the inner query; must contain `uuid`.
    const COLUMNS: &'static [&'static str];

    /// Columns matched by text search; empty disables text search.
    const TEXT_COLUMNS: &'static [&'static str];

    /// Result column a sort field orders by.
    fn sort_column(sort_by: Self::SortBy) -> &'static str;

    /// Adds the entity's filters.
    fn apply_filters(filters: &Self::Filters, ctx: &mut SearchContext<'_>) -> SearchResult<()>;
}

/// The assemblers a filter writes to.
///
/// Predicates go to `inner`; common table expressions and their parameters
/// go to `outer`.
pub struct SearchContext<'a> {
    /// Outer statement; owns the WITH namespace.
    pub outer: &'a mut ClauseAssembler,
    /// Inner filtered subquery.
    pub inner: &'a mut ClauseAssembler,
}

/// A column on a link table relating an entity to a hierarchy node.
#[derive(Debug, Clone, Copy)]
pub struct LinkColumn<'a> {
    /// Link table.
    pub table: &'a str,
    /// Link-table column referencing the entity.
    pub owner_column: &'a str,
    /// Link-table column referencing the hierarchy node.
    pub target_column: &'a str,
}

impl SearchContext<'_> {
    /// Dialect of the statement.
    pub fn dialect_kind(&self) -> DialectKind {
        self.inner.dialect_kind()
    }

    /// Builds a hierarchical predicate over `columns` without adding it.
    pub fn hierarchy_predicate(
        &mut self,
        hierarchy: &Hierarchy,
        columns: &[&str],
        param: &str,
        filter: &HierarchyFilter,
    ) -> SearchResult<Option<String>> {
        hierarchy_predicate(
            self.outer,
            HierarchyMatch {
                hierarchy,
                columns,
                param,
                keys: &filter.uuids,
                strategy: filter.recurse_strategy,
            },
        )
    }

    /// Restricts the entity to rows where any of `columns` matches the filter.
    pub fn add_hierarchy_filter(
        &mut self,
        hierarchy: &Hierarchy,
        columns: &[&str],
        param: &str,
        filter: &HierarchyFilter,
    ) -> SearchResult<()> {
        if let Some(predicate) = self.hierarchy_predicate(hierarchy, columns, param, filter)? {
            self.inner.add_where(predicate);
        }
        Ok(())
    }

    /// Restricts the entity to rows linked through `link` to a matching node.
    ///
    /// `owner_key` is the entity column the link table references. The
    /// sentinel matches entities with no link row at all.
    pub fn add_linked_hierarchy_filter(
        &mut self,
        hierarchy: &Hierarchy,
        owner_key: &str,
        link: LinkColumn<'_>,
        param: &str,
        filter: &HierarchyFilter,
    ) -> SearchResult<()> {
        if filter.uuids.is_empty() {
            return Ok(());
        }
        let (has_sentinel, keys) = hierarchy.split_sentinel(&filter.uuids);
        let mut alternatives = Vec::new();

        if has_sentinel {
            alternatives.push(format!(
                "NOT EXISTS (SELECT 1 FROM {t} WHERE {t}.{o} = {k})",
                t = link.table,
                o = link.owner_column,
                k = owner_key
            ));
        }

        let target = format!("{}.{}", link.table, link.target_column);
        let matched = HierarchyFilter {
            uuids: keys,
            recurse_strategy: filter.recurse_strategy,
        };
        if let Some(predicate) =
            self.hierarchy_predicate(hierarchy, &[target.as_str()], param, &matched)?
        {
            alternatives.push(format!(
                "{k} IN (SELECT {t}.{o} FROM {t} WHERE {p})",
                k = owner_key,
                t = link.table,
                o = link.owner_column,
                p = predicate
            ));
        }

        match alternatives.len() {
            0 => {}
            1 => self.inner.add_where(alternatives.remove(0)),
            _ => self
                .inner
                .add_where(format!("({})", alternatives.join(" OR "))),
        }
        Ok(())
    }
}

/// A search for one entity: the common parameters plus its filters.
pub struct EntityQuery<E: SearchEntity> {
    /// Text, paging, sorting and batch parameters.
    pub common: SearchQuery<E::SortBy>,
    /// Entity filters.
    pub filters: E::Filters,
}

impl<E: SearchEntity> EntityQuery<E> {
    /// A query with default paging and no filters.
    pub fn new() -> Self {
        Self {
            common: SearchQuery::default(),
            filters: E::Filters::default(),
        }
    }

    /// Sets the text term.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.common.text = Some(text.into());
        self
    }

    /// Sets the page number and size.
    pub fn with_page(mut self, page_num: u32, page_size: u32) -> Self {
        self.common.page_num = page_num;
        self.common.page_size = page_size;
        self
    }

    /// Sets the sort field and direction.
    pub fn sorted_by(mut self, sort_by: E::SortBy, sort_order: SortOrder) -> Self {
        self.common.sort_by = Some(sort_by);
        self.common.sort_order = sort_order;
        self
    }

    /// Replaces the filters.
    pub fn with_filters(mut self, filters: E::Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Makes the query a batch load.
    pub fn with_batch(mut self, batch: BatchParams) -> Self {
        self.common.batch = Some(batch);
        self
    }
}

impl<E: SearchEntity> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SearchEntity> Clone for EntityQuery<E> {
    fn clone(&self) -> Self {
        Self {
            common: self.common.clone(),
            filters: self.filters.clone(),
        }
    }
}

impl<E: SearchEntity> fmt::Debug for EntityQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityQuery")
            .field("entity", &E::NAME)
            .field("common", &self.common)
            .field("filters", &self.filters)
            .finish()
    }
}

/// Builds search statements for one entity.
pub struct Searcher<E> {
    dialect: DialectKind,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SearchEntity> Searcher<E> {
    /// Creates a searcher rendering for the given dialect.
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            _entity: PhantomData,
        }
    }

    /// Dialect the searcher renders for.
    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect
    }

    /// Composes the outer and inner assemblers for a query.
    ///
    /// The returned outer assembler renders the complete statement without
    /// pagination and carries every parameter.
    pub fn build_query(
        &self,
        query: &EntityQuery<E>,
    ) -> SearchResult<(ClauseAssembler, ClauseAssembler)> {
        let table = E::TABLE;
        let mut outer = ClauseAssembler::new(self.dialect);
        let mut inner = ClauseAssembler::new(self.dialect);

        for column in E::COLUMNS {
            inner.add_select(format!("{}.{}", table, column));
        }
        inner.add_from(table);

        if let Some(batch) = &query.common.batch {
            if batch.table() != table {
                return Err(SearchError::InvalidBatch {
                    message: format!(
                        "batch load of {} cannot return {}",
                        batch.table(),
                        E::NAME
                    ),
                });
            }
            batch.add_query(&mut outer, &mut inner)?;
        }

        let ranked = match query.common.text_term() {
            Some(text) => self.add_text_query(&mut inner, text, query.common.sort_by.is_none()),
            None => false,
        };

        E::apply_filters(
            &query.filters,
            &mut SearchContext {
                outer: &mut outer,
                inner: &mut inner,
            },
        )?;

        outer.add_select(format!("{}.*", table));
        if let Some(total_count) = outer.dialect().total_count_select() {
            outer.add_select(total_count);
        }
        outer.add_from(format!("( {} ) {}", inner.build(), table));
        outer.merge_args_from(&inner);
        Self::add_order_by_clauses(
            &mut outer,
            query.common.sort_by,
            query.common.sort_order,
            ranked,
        );

        Ok((outer, inner))
    }

    /// Renders the statement for a query, pagination included.
    pub fn build_statement(&self, query: &EntityQuery<E>) -> SearchResult<String> {
        let (outer, _) = self.build_query(query)?;
        Ok(outer.dialect().paginate(
            &outer.build(),
            query.common.page_num,
            query.common.page_size,
        ))
    }

    /// Renders and binds the statement for a query.
    pub fn bind_statement(&self, query: &EntityQuery<E>) -> SearchResult<BoundStatement> {
        let (outer, _) = self.build_query(query)?;
        let sql = outer.dialect().paginate(
            &outer.build(),
            query.common.page_num,
            query.common.page_size,
        );
        bind_assembled(&outer, &sql)
    }

    /// Orders by relevance when `ranked`, then by the requested field (or
    /// the entity's default), then by key so paging is stable.
    pub fn add_order_by_clauses(
        outer: &mut ClauseAssembler,
        sort_by: Option<E::SortBy>,
        sort_order: SortOrder,
        ranked: bool,
    ) {
        if ranked {
            outer.add_order_by(format!("{}.{} DESC", E::TABLE, SEARCH_RANK_COLUMN));
        }
        let column = E::sort_column(sort_by.unwrap_or_default());
        outer.add_order_by(format!("{}.{} {}", E::TABLE, column, sort_order.as_sql()));
        if column != "uuid" {
            outer.add_order_by(format!("{}.uuid ASC", E::TABLE));
        }
    }

    /// Adds the text predicate and, when `with_rank`, the relevance column.
    /// Returns whether the rank was selected.
    fn add_text_query(&self, inner: &mut ClauseAssembler, text: &str, with_rank: bool) -> bool {
        let term = strip_wildcards(text);
        if E::TEXT_COLUMNS.is_empty() || term.is_empty() {
            return false;
        }
        let dialect = inner.dialect();
        let columns = E::TEXT_COLUMNS
            .iter()
            .map(|c| format!("{}.{}", E::TABLE, c))
            .collect::<Vec<_>>();
        inner.add_where(dialect.text_clause(&columns, TEXT_PARAM));
        inner.add_scalar_arg(TEXT_PARAM, dialect.text_value(text));
        if !with_rank {
            return false;
        }

        // Prefix matches on the leading text column and on the key add one
        // point each.
        let like = dialect.like_keyword();
        let mut scores = Vec::new();
        scores.extend(dialect.rank_clause(&columns, TEXT_PARAM));
        scores.push(format!(
            "CASE WHEN {} {} :{} {} THEN 1 ELSE 0 END",
            columns[0], like, TEXT_PREFIX_PARAM, LIKE_ESCAPE
        ));
        if term.chars().count() >= MIN_UUID_PREFIX {
            scores.push(format!(
                "CASE WHEN {}.uuid {} :{} {} THEN 1 ELSE 0 END",
                E::TABLE, like, TEXT_PREFIX_PARAM, LIKE_ESCAPE
            ));
        }
        inner.add_select(format!("({}) AS {}", scores.join(" + "), SEARCH_RANK_COLUMN));
        inner.add_scalar_arg(TEXT_PREFIX_PARAM, format!("{}%", dialect.escape_like(&term)));
        true
    }
}

impl<E> Clone for Searcher<E> {
    fn clone(&self) -> Self {
        Self {
            dialect: self.dialect,
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Searcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher")
            .field("dialect", &self.dialect)
            .finish()
    }
}

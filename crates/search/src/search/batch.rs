//! Batch-load clause strategies.
//!
//! Each batch parameter shape adds three things to a search: the joins it
//! needs (inner FROM), the key each row belongs to selected as
//! `"batchUuid"` (inner SELECT), and a restriction to the keys of the
//! current batch (inner WHERE). Recursive shapes also register a
//! root-tracking closure on the outer assembler.

use crate::error::{SearchError, SearchResult};
use crate::types::{
    BatchParams, FkBatchParams, M2mBatchParams, RecursiveFkBatchParams, RecursiveM2mBatchParams,
};

use super::assembler::ClauseAssembler;
use super::hierarchy::{ROOT_COLUMN, add_batch_closure};

/// Result column carrying the batch key of each row.
pub const BATCH_KEY_COLUMN: &str = "batchUuid";

/// List parameter carrying the keys of the current batch.
pub const BATCH_KEYS_PARAM: &str = "batchUuids";

/// Adds batch-load clauses to a search.
pub trait BatchStrategy {
    /// Adds joins, the batch key column and the key restriction.
    fn add_query(&self, outer: &mut ClauseAssembler, inner: &mut ClauseAssembler)
    -> SearchResult<()>;
}

fn require_keys(batch_uuids: &[String], table: &str) -> SearchResult<()> {
    if batch_uuids.is_empty() {
        return Err(SearchError::InvalidBatch {
            message: format!("batch load of {} has no keys", table),
        });
    }
    Ok(())
}

impl BatchStrategy for FkBatchParams {
    fn add_query(
        &self,
        _outer: &mut ClauseAssembler,
        inner: &mut ClauseAssembler,
    ) -> SearchResult<()> {
        require_keys(&self.batch_uuids, &self.table)?;
        let key = format!("{}.{}", self.table, self.foreign_key);
        inner.add_select(format!(r#"{} AS "{}""#, key, BATCH_KEY_COLUMN));
        inner.add_where(format!("{} IN ( <{}> )", key, BATCH_KEYS_PARAM));
        inner.add_list_arg(BATCH_KEYS_PARAM, self.batch_uuids.iter().cloned());
        Ok(())
    }
}

impl BatchStrategy for M2mBatchParams {
    fn add_query(
        &self,
        _outer: &mut ClauseAssembler,
        inner: &mut ClauseAssembler,
    ) -> SearchResult<()> {
        require_keys(&self.batch_uuids, &self.table)?;
        inner.add_from(format!(
            "LEFT JOIN {jt} ON {jt}.{left} = {t}.{fk}",
            jt = self.join_table,
            left = self.join_left_key,
            t = self.table,
            fk = self.foreign_key
        ));
        let key = format!("{}.{}", self.join_table, self.join_right_key);
        inner.add_select(format!(r#"{} AS "{}""#, key, BATCH_KEY_COLUMN));
        inner.add_where(format!("{} IN ( <{}> )", key, BATCH_KEYS_PARAM));
        inner.add_list_arg(BATCH_KEYS_PARAM, self.batch_uuids.iter().cloned());
        inner.set_distinct(true);
        Ok(())
    }
}

/// Joins the root-tracking closure of the batch keys on `column` and tags
/// every row with the root it was reached from.
fn join_batch_closure(
    outer: &mut ClauseAssembler,
    inner: &mut ClauseAssembler,
    hierarchy: &crate::types::Hierarchy,
    strategy: crate::types::RecurseStrategy,
    batch_uuids: &[String],
    column: &str,
) -> SearchResult<()> {
    let cte = add_batch_closure(outer, hierarchy, strategy, BATCH_KEYS_PARAM)?;
    outer.add_list_arg(BATCH_KEYS_PARAM, batch_uuids.iter().cloned());

    // Diamonds in the hierarchy reach a node more than once per root.
    let alias = format!("{}_keys", cte);
    inner.add_from(format!(
        "JOIN (SELECT DISTINCT uuid, {root} FROM {cte}) {alias} ON {column} = {alias}.uuid",
        root = ROOT_COLUMN,
    ));
    let key = format!("{}.{}", alias, ROOT_COLUMN);
    inner.add_select(format!(r#"{} AS "{}""#, key, BATCH_KEY_COLUMN));
    inner.add_where(format!("{} IN ( <{}> )", key, BATCH_KEYS_PARAM));
    inner.add_list_arg(BATCH_KEYS_PARAM, batch_uuids.iter().cloned());
    inner.set_distinct(true);
    Ok(())
}

impl BatchStrategy for RecursiveFkBatchParams {
    fn add_query(
        &self,
        outer: &mut ClauseAssembler,
        inner: &mut ClauseAssembler,
    ) -> SearchResult<()> {
        if !self.recurse_strategy.is_recursive() {
            return self.flat().add_query(outer, inner);
        }
        require_keys(&self.batch_uuids, &self.table)?;
        let column = format!("{}.{}", self.table, self.foreign_key);
        join_batch_closure(
            outer,
            inner,
            &self.hierarchy,
            self.recurse_strategy,
            &self.batch_uuids,
            &column,
        )
    }
}

impl BatchStrategy for RecursiveM2mBatchParams {
    fn add_query(
        &self,
        outer: &mut ClauseAssembler,
        inner: &mut ClauseAssembler,
    ) -> SearchResult<()> {
        if !self.recurse_strategy.is_recursive() {
            return self.flat().add_query(outer, inner);
        }
        require_keys(&self.batch_uuids, &self.table)?;
        inner.add_from(format!(
            "JOIN {jt} ON {jt}.{left} = {t}.{fk}",
            jt = self.join_table,
            left = self.join_left_key,
            t = self.table,
            fk = self.foreign_key
        ));
        let column = format!("{}.{}", self.join_table, self.join_right_key);
        join_batch_closure(
            outer,
            inner,
            &self.hierarchy,
            self.recurse_strategy,
            &self.batch_uuids,
            &column,
        )
    }
}

impl BatchStrategy for BatchParams {
    fn add_query(
        &self,
        outer: &mut ClauseAssembler,
        inner: &mut ClauseAssembler,
    ) -> SearchResult<()> {
        match self {
            BatchParams::Fk(p) => p.add_query(outer, inner),
            BatchParams::M2m(p) => p.add_query(outer, inner),
            BatchParams::RecursiveFk(p) => p.add_query(outer, inner),
            BatchParams::RecursiveM2m(p) => p.add_query(outer, inner),
        }
    }
}

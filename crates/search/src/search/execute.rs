//! Statement execution and result assembly.

use crate::core::{RowMapper, SqlExecutor};
use crate::dialect::{Dialect, TOTAL_COUNT_COLUMN};
use crate::error::{SearchError, StorageResult};
use crate::types::{Page, Row};

use super::assembler::ClauseAssembler;
use super::batch::BATCH_KEY_COLUMN;
use super::bind::bind_assembled;

/// Paginates, binds and runs an assembled search, mapping every row.
///
/// `page_size == 0` returns every row. The total count is taken from the
/// first row when the dialect reports it; an empty first page has a total
/// of zero, and an empty later page has an unknown total.
pub async fn execute<T, M>(
    executor: &dyn SqlExecutor,
    outer: &ClauseAssembler,
    page_num: u32,
    page_size: u32,
    mapper: &M,
) -> StorageResult<Page<T>>
where
    M: RowMapper<T> + ?Sized,
{
    if page_size == 0 && page_num > 0 {
        return Err(SearchError::InvalidPagination {
            message: format!("page {} requested without a page size", page_num),
        }
        .into());
    }

    let dialect = outer.dialect();
    let sql = dialect.paginate(&outer.build(), page_num, page_size);
    let statement = bind_assembled(outer, &sql)?;
    tracing::debug!(
        backend = executor.name(),
        dialect = %dialect.kind(),
        sql = %statement.sql,
        params = statement.params.len(),
        "executing search statement"
    );

    let rows = executor.query(&statement).await?;
    let total_count = read_total_count(dialect, &rows, page_num)?;

    let mut items = Vec::with_capacity(rows.len());
    let mut batch_keys = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(mapper.map_row(row)?);
        batch_keys.push(read_batch_key(row)?);
    }

    Ok(Page::new(items, page_num, page_size, total_count, batch_keys))
}

fn read_total_count(
    dialect: &dyn Dialect,
    rows: &[Row],
    page_num: u32,
) -> StorageResult<Option<u64>> {
    if dialect.total_count_select().is_none() {
        return Ok(None);
    }
    let Some(first) = rows.first() else {
        return Ok((page_num == 0).then_some(0));
    };
    if first.get(TOTAL_COUNT_COLUMN).is_none() {
        return Ok(None);
    }
    Ok(first
        .get_opt_i64(TOTAL_COUNT_COLUMN)?
        .and_then(|count| u64::try_from(count).ok()))
}

fn read_batch_key(row: &Row) -> StorageResult<Option<String>> {
    if row.get(BATCH_KEY_COLUMN).is_none() {
        return Ok(None);
    }
    row.get_opt_string(BATCH_KEY_COLUMN)
}

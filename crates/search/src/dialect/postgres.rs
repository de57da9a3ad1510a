//! PostgreSQL dialect.

use super::{Dialect, DialectKind, TOTAL_COUNT_SELECT, page_offset, strip_wildcards};

/// PostgreSQL: `LIMIT`/`OFFSET`, window total count, full-text search.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

fn document(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("coalesce({}, '')", c))
        .collect::<Vec<_>>()
        .join(" || ' ' || ")
}

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn paginate(&self, sql: &str, page_num: u32, page_size: u32) -> String {
        if page_size == 0 {
            return sql.to_string();
        }
        format!(
            "{} LIMIT {} OFFSET {}",
            sql,
            page_size,
            page_offset(page_num, page_size)
        )
    }

    fn total_count_select(&self) -> Option<&'static str> {
        Some(TOTAL_COUNT_SELECT)
    }

    fn like_keyword(&self) -> &'static str {
        "ILIKE"
    }

    fn text_clause(&self, columns: &[String], param: &str) -> String {
        format!(
            "to_tsvector('simple', {}) @@ plainto_tsquery('simple', :{})",
            document(columns),
            param
        )
    }

    fn text_value(&self, text: &str) -> String {
        strip_wildcards(text)
    }

    fn rank_clause(&self, columns: &[String], param: &str) -> Option<String> {
        Some(format!(
            "ts_rank(to_tsvector('simple', {}), plainto_tsquery('simple', :{}))",
            document(columns),
            param
        ))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn recursive_keyword(&self) -> bool {
        true
    }

    fn cycle_safe_union(&self) -> &'static str {
        "UNION"
    }
}

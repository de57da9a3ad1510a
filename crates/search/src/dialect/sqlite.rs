//! SQLite dialect.

use super::{Dialect, DialectKind, LIKE_ESCAPE, page_offset, strip_wildcards};

/// SQLite: `LIMIT`/`OFFSET`, no window total count, `LIKE` text search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
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
        None
    }

    fn like_keyword(&self) -> &'static str {
        "LIKE"
    }

    fn text_clause(&self, columns: &[String], param: &str) -> String {
        let matches = columns
            .iter()
            .map(|c| format!("{} LIKE :{} {}", c, param, LIKE_ESCAPE))
            .collect::<Vec<_>>();
        format!("({})", matches.join(" OR "))
    }

    fn text_value(&self, text: &str) -> String {
        format!("%{}%", self.escape_like(&strip_wildcards(text)))
    }

    fn rank_clause(&self, columns: &[String], param: &str) -> Option<String> {
        // One point per matching column.
        let scores = columns
            .iter()
            .map(|c| {
                format!(
                    "CASE WHEN {} LIKE :{} {} THEN 1 ELSE 0 END",
                    c, param, LIKE_ESCAPE
                )
            })
            .collect::<Vec<_>>();
        Some(format!("({})", scores.join(" + ")))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }

    fn recursive_keyword(&self) -> bool {
        true
    }

    fn cycle_safe_union(&self) -> &'static str {
        "UNION"
    }
}

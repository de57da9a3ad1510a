//! Microsoft SQL Server dialect.

use super::{
    Dialect, DialectKind, TOTAL_COUNT_SELECT, escape_like_chars, page_offset, quoted_end,
    strip_wildcards,
};

/// SQL Server: `OFFSET ... FETCH NEXT`, window total count, `CONTAINS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

/// Returns true if the statement has a top-level `ORDER BY`.
///
/// Quoted literals and identifiers are skipped.
fn has_order_by(sql: &str) -> bool {
    let chars: Vec<char> = sql.chars().collect();
    let mut depth = 0i32;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\'' | '"' => {
                i = quoted_end(&chars, i);
                continue;
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && keyword_at(&chars, i, "ORDER BY") => return true,
            _ => {}
        }
        i += 1;
    }
    false
}

fn keyword_at(chars: &[char], idx: usize, keyword: &str) -> bool {
    let boundary = idx == 0 || !chars[idx - 1].is_ascii_alphanumeric();
    boundary
        && keyword
            .chars()
            .enumerate()
            .all(|(k, c)| chars.get(idx + k).is_some_and(|x| x.eq_ignore_ascii_case(&c)))
}

impl Dialect for MssqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn paginate(&self, sql: &str, page_num: u32, page_size: u32) -> String {
        if page_size == 0 {
            return sql.to_string();
        }
        // OFFSET/FETCH is only valid after an ORDER BY.
        let ordered = if has_order_by(sql) {
            sql.to_string()
        } else {
            format!("{} ORDER BY (SELECT NULL)", sql)
        };
        format!(
            "{} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            ordered,
            page_offset(page_num, page_size),
            page_size
        )
    }

    fn total_count_select(&self) -> Option<&'static str> {
        Some(TOTAL_COUNT_SELECT)
    }

    fn like_keyword(&self) -> &'static str {
        "LIKE"
    }

    fn text_clause(&self, columns: &[String], param: &str) -> String {
        format!("CONTAINS(({}), :{})", columns.join(", "), param)
    }

    fn text_value(&self, text: &str) -> String {
        format!("\"{}*\"", strip_wildcards(text))
    }

    fn rank_clause(&self, _columns: &[String], _param: &str) -> Option<String> {
        // CONTAINS only filters; a score needs a CONTAINSTABLE join.
        None
    }

    fn escape_like(&self, text: &str) -> String {
        escape_like_chars(text, &['\\', '%', '_', '['])
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@P{}", index)
    }

    fn recursive_keyword(&self) -> bool {
        false
    }

    fn cycle_safe_union(&self) -> &'static str {
        // Only UNION ALL is allowed in recursive members; a cycle fails at the
        // server default recursion limit instead of looping.
        "UNION ALL"
    }
}

//! SQL dialect adapters.
//!
//! Statements are assembled once in a portable shape and finished by a
//! [`Dialect`], which owns everything that differs between databases:
//!
//! | Behavior            | PostgreSQL            | SQL Server                     | SQLite           |
//! |---------------------|-----------------------|--------------------------------|------------------|
//! | Pagination          | `LIMIT n OFFSET m`    | `OFFSET m ROWS FETCH NEXT n ROWS ONLY` | `LIMIT n OFFSET m` |
//! | Total count         | `COUNT(*) OVER()`     | `COUNT(*) OVER()`              | not available    |
//! | Text search         | `to_tsvector @@ plainto_tsquery` | `CONTAINS`          | `LIKE`           |
//! | Placeholders        | `$1`                  | `@P1`                          | `?1`             |
//! | Recursive CTE       | `WITH RECURSIVE`      | `WITH`                         | `WITH RECURSIVE` |
//!
//! The dialect of a database is detected once from its product name with
//! [`DialectKind::from_product_name`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

mod mssql;
mod postgres;
mod sqlite;

pub use mssql::MssqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Select fragment producing the out-of-band total count.
pub const TOTAL_COUNT_SELECT: &str = r#"COUNT(*) OVER() AS "totalCount""#;

/// Result column holding the total count.
pub const TOTAL_COUNT_COLUMN: &str = "totalCount";

/// Escape clause for patterns produced by [`Dialect::escape_like`].
pub const LIKE_ESCAPE: &str = r"ESCAPE '\'";

/// Per-database SQL behaviors.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the kind of this dialect.
    fn kind(&self) -> DialectKind;

    /// Appends pagination to a statement.
    ///
    /// `page_size == 0` returns the statement unchanged.
    fn paginate(&self, sql: &str, page_num: u32, page_size: u32) -> String;

    /// Select fragment adding the total count to every row, if supported.
    fn total_count_select(&self) -> Option<&'static str>;

    /// Keyword used for pattern matching.
    fn like_keyword(&self) -> &'static str;

    /// Predicate matching the text parameter against the given columns.
    fn text_clause(&self, columns: &[String], param: &str) -> String;

    /// Converts user text into the value bound to the text parameter.
    fn text_value(&self, text: &str) -> String;

    /// Relevance score of a text match over the given columns, if the
    /// database can compute one from the text parameter.
    fn rank_clause(&self, columns: &[String], param: &str) -> Option<String>;

    /// Escapes pattern characters so user text matches literally in a
    /// `LIKE ... ESCAPE '\'` comparison.
    fn escape_like(&self, text: &str) -> String {
        escape_like_chars(text, &['\\', '%', '_'])
    }

    /// Positional placeholder for the 1-based parameter index.
    fn placeholder(&self, index: usize) -> String;

    /// Whether recursive common table expressions need `WITH RECURSIVE`.
    fn recursive_keyword(&self) -> bool;

    /// Set operator for recursive expressions that must terminate on cyclic data.
    fn cycle_safe_union(&self) -> &'static str;
}

/// The supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// PostgreSQL.
    Postgres,
    /// Microsoft SQL Server (T-SQL).
    Mssql,
    /// SQLite.
    Sqlite,
}

static POSTGRES: PostgresDialect = PostgresDialect;
static MSSQL: MssqlDialect = MssqlDialect;
static SQLITE: SqliteDialect = SqliteDialect;

impl DialectKind {
    /// Returns the adapter for this dialect.
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Postgres => &POSTGRES,
            DialectKind::Mssql => &MSSQL,
            DialectKind::Sqlite => &SQLITE,
        }
    }

    /// Maps a database product name, as reported by connection metadata, to
    /// a dialect.
    pub fn from_product_name(product_name: &str) -> Result<Self, SearchError> {
        let name = product_name.to_ascii_lowercase();
        if name.contains("postgres") {
            Ok(DialectKind::Postgres)
        } else if name.contains("sql server") {
            Ok(DialectKind::Mssql)
        } else if name.contains("sqlite") {
            Ok(DialectKind::Sqlite)
        } else {
            Err(SearchError::UnsupportedDialect {
                product_name: product_name.to_string(),
            })
        }
    }

    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::Mssql => "mssql",
            DialectKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DialectKind::Postgres),
            "mssql" | "sqlserver" => Ok(DialectKind::Mssql),
            "sqlite" => Ok(DialectKind::Sqlite),
            _ => DialectKind::from_product_name(s),
        }
    }
}

/// Removes quotes and wildcards from user text.
pub(crate) fn strip_wildcards(text: &str) -> String {
    text.trim().replace(['"', '*'], "")
}

/// Prefixes every special character with a backslash.
pub(crate) fn escape_like_chars(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Index just past the quoted section opening at `start`.
///
/// A doubled quote closes the section and immediately opens the next one,
/// so escaped quotes are skipped as well.
pub(crate) fn quoted_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        i += 1;
        if chars[i - 1] == quote {
            break;
        }
    }
    i
}

/// Row offset of a page, computed without overflow.
pub(crate) fn page_offset(page_num: u32, page_size: u32) -> u64 {
    u64::from(page_num) * u64::from(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_product_name() {
        assert_eq!(
            DialectKind::from_product_name("PostgreSQL").unwrap(),
            DialectKind::Postgres
        );
        assert_eq!(
            DialectKind::from_product_name("Microsoft SQL Server").unwrap(),
            DialectKind::Mssql
        );
        assert_eq!(
            DialectKind::from_product_name("SQLite").unwrap(),
            DialectKind::Sqlite
        );
        assert!(matches!(
            DialectKind::from_product_name("Oracle"),
            Err(SearchError::UnsupportedDialect { .. })
        ));
    }

    #[test]
    fn test_from_str_and_display() {
        assert_eq!("postgresql".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("MSSQL".parse::<DialectKind>().unwrap(), DialectKind::Mssql);
        assert_eq!(DialectKind::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn test_page_size_zero_is_unchanged_everywhere() {
        let sql = "SELECT t.* FROM t ORDER BY t.uuid ASC";
        for kind in [DialectKind::Postgres, DialectKind::Mssql, DialectKind::Sqlite] {
            assert_eq!(kind.dialect().paginate(sql, 3, 0), sql, "{}", kind);
        }
    }

    #[test]
    fn test_page_offset_does_not_overflow() {
        assert_eq!(page_offset(u32::MAX, u32::MAX), 18446744065119617025);
    }

    #[test]
    fn test_strip_wildcards() {
        assert_eq!(strip_wildcards(r#"  "kabul*" "#), "kabul");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(
            DialectKind::Sqlite.dialect().escape_like(r"50%_off\"),
            r"50\%\_off\\"
        );
        assert_eq!(DialectKind::Mssql.dialect().escape_like("[a]"), r"\[a]");
    }

    #[test]
    fn test_quoted_end_skips_doubled_quotes() {
        let chars: Vec<char> = "'it''s' x".chars().collect();
        let mut i = 0;
        while chars[i] == '\'' {
            i = quoted_end(&chars, i);
        }
        assert_eq!(chars[i..].iter().collect::<String>(), " x");
    }

    #[test]
    fn test_total_count_support() {
        assert!(DialectKind::Postgres.dialect().total_count_select().is_some());
        assert!(DialectKind::Mssql.dialect().total_count_select().is_some());
        assert!(DialectKind::Sqlite.dialect().total_count_select().is_none());
    }
}

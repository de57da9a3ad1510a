//! Named and list parameter binding.
//!
//! Rewrites `:name` references into the dialect's positional placeholders
//! and expands `<name>` list references into one placeholder per element.
//! Text inside single-quoted literals and double-quoted identifiers is never
//! rewritten, and PostgreSQL `::type` casts are left alone. A name that is
//! referenced several times is bound once per reference.

use std::collections::HashMap;

use crate::dialect::{Dialect, quoted_end};
use crate::error::{SearchError, SearchResult};
use crate::types::{BoundStatement, SqlValue};

use super::assembler::ClauseAssembler;

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Binds a rendered statement against the given parameters.
pub fn bind(
    sql: &str,
    scalar_args: &HashMap<String, SqlValue>,
    list_args: &HashMap<String, Vec<SqlValue>>,
    dialect: &dyn Dialect,
) -> SearchResult<BoundStatement> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut params: Vec<SqlValue> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = quoted_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).copied().is_some_and(is_ident_start) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = scalar_args
                    .get(&name)
                    .ok_or_else(|| SearchError::MissingParameter { name: name.clone() })?;
                params.push(value.clone());
                out.push_str(&dialect.placeholder(params.len()));
                i = end;
            }
            '<' => match list_reference(&chars, i, list_args) {
                Some((values, end)) => {
                    if values.is_empty() {
                        // IN (NULL) matches nothing.
                        out.push_str("NULL");
                    } else {
                        let placeholders = values
                            .iter()
                            .map(|value| {
                                params.push(value.clone());
                                dialect.placeholder(params.len())
                            })
                            .collect::<Vec<_>>();
                        out.push_str(&placeholders.join(", "));
                    }
                    i = end;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(BoundStatement::with_params(out, params))
}

/// Recognizes `<name>` at `start` when `name` is a registered list
/// parameter; returns its values and the index after the closing `>`.
fn list_reference<'a>(
    chars: &[char],
    start: usize,
    list_args: &'a HashMap<String, Vec<SqlValue>>,
) -> Option<(&'a [SqlValue], usize)> {
    let first = *chars.get(start + 1)?;
    if !is_ident_start(first) {
        return None;
    }
    let mut end = start + 1;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    if chars.get(end) != Some(&'>') {
        return None;
    }
    let name: String = chars[start + 1..end].iter().collect();
    list_args.get(&name).map(|values| (values.as_slice(), end + 1))
}

/// Binds an assembled statement, optionally with the SQL already finished by
/// the dialect (for example with pagination appended).
pub fn bind_assembled(assembler: &ClauseAssembler, sql: &str) -> SearchResult<BoundStatement> {
    bind(
        sql,
        assembler.scalar_args(),
        assembler.list_args(),
        assembler.dialect(),
    )
}

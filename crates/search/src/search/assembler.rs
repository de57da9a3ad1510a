//! Ordered-clause SQL assembly.
//!
//! A [`ClauseAssembler`] collects WITH, SELECT, FROM, WHERE, GROUP BY and
//! ORDER BY fragments plus the named parameters they reference, and renders
//! them in SQL clause order. Scalar parameters are written as `:name`; list
//! parameters are written as `IN ( <name> )` and expanded when the statement
//! is bound (see [`bind`](super::bind)).
//!
//! Searches use two assemblers: the *outer* one owns the WITH namespace, the
//! total count and the ordering, and the *inner* one holds the filtered
//! subquery that the outer statement selects from.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::dialect::{Dialect, DialectKind};
use crate::types::SqlValue;

/// Direction of a date range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparison {
    /// On or after the value.
    After,
    /// On or before the value.
    Before,
}

impl DateComparison {
    fn operator(&self) -> &'static str {
        match self {
            DateComparison::After => ">=",
            DateComparison::Before => "<=",
        }
    }
}

/// Collects SQL clauses and their parameters.
#[derive(Debug, Clone)]
pub struct ClauseAssembler {
    dialect: DialectKind,
    with_clauses: Vec<String>,
    with_names: Vec<String>,
    recursive: bool,
    distinct: bool,
    select_clauses: Vec<String>,
    from_clauses: Vec<String>,
    additional_from_clauses: Vec<String>,
    where_clauses: Vec<String>,
    group_by_clauses: Vec<String>,
    order_by_clauses: Vec<String>,
    scalar_args: HashMap<String, SqlValue>,
    list_args: HashMap<String, Vec<SqlValue>>,
}

impl ClauseAssembler {
    /// Creates an empty assembler for the given dialect.
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            with_clauses: Vec::new(),
            with_names: Vec::new(),
            recursive: false,
            distinct: false,
            select_clauses: Vec::new(),
            from_clauses: Vec::new(),
            additional_from_clauses: Vec::new(),
            where_clauses: Vec::new(),
            group_by_clauses: Vec::new(),
            order_by_clauses: Vec::new(),
            scalar_args: HashMap::new(),
            list_args: HashMap::new(),
        }
    }

    /// Returns the dialect kind.
    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect
    }

    /// Returns the dialect adapter.
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect.dialect()
    }

    /// Adds a complete WITH fragment (`name AS (...)`).
    pub fn add_with(&mut self, fragment: impl Into<String>) {
        self.with_clauses.push(fragment.into());
    }

    /// Registers a named common table expression and returns the name it was
    /// given, unique within this assembler.
    ///
    /// `render` receives the final name and returns the full fragment.
    pub fn register_with<F>(&mut self, name_hint: &str, recursive: bool, render: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        let mut name = name_hint.to_string();
        let mut suffix = 2;
        while self.with_names.contains(&name) {
            name = format!("{}_{}", name_hint, suffix);
            suffix += 1;
        }
        let fragment = render(&name);
        self.with_clauses.push(fragment);
        self.with_names.push(name.clone());
        self.recursive |= recursive;
        name
    }

    /// Marks the WITH clause as recursive.
    pub fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    /// Renders `SELECT DISTINCT` instead of `SELECT`.
    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    /// Adds a SELECT fragment.
    pub fn add_select(&mut self, fragment: impl Into<String>) {
        self.select_clauses.push(fragment.into());
    }

    /// Adds a FROM fragment; fragments are joined with spaces, so JOINs are
    /// added here after the base table.
    pub fn add_from(&mut self, fragment: impl Into<String>) {
        self.from_clauses.push(fragment.into());
    }

    /// Adds a comma-separated FROM entry rendered after all FROM fragments.
    pub fn add_additional_from(&mut self, fragment: impl Into<String>) {
        self.additional_from_clauses.push(fragment.into());
    }

    /// Adds a WHERE fragment; fragments are combined with AND.
    pub fn add_where(&mut self, fragment: impl Into<String>) {
        self.where_clauses.push(fragment.into());
    }

    /// Adds a GROUP BY fragment.
    pub fn add_group_by(&mut self, fragment: impl Into<String>) {
        self.group_by_clauses.push(fragment.into());
    }

    /// Adds an ORDER BY fragment.
    pub fn add_order_by(&mut self, fragment: impl Into<String>) {
        self.order_by_clauses.push(fragment.into());
    }

    /// Adds several ORDER BY fragments in order.
    pub fn add_all_order_by<I, S>(&mut self, fragments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by_clauses
            .extend(fragments.into_iter().map(Into::into));
    }

    /// Binds a scalar parameter referenced as `:name`.
    pub fn add_scalar_arg(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.scalar_args.insert(name.into(), value.into());
    }

    /// Binds a list parameter referenced as `<name>`.
    pub fn add_list_arg<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.list_args
            .insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    /// Copies all parameters of another assembler into this one.
    pub fn merge_args_from(&mut self, other: &ClauseAssembler) {
        for (name, value) in &other.scalar_args {
            self.scalar_args.insert(name.clone(), value.clone());
        }
        for (name, values) in &other.list_args {
            self.list_args.insert(name.clone(), values.clone());
        }
    }

    /// Scalar parameters.
    pub fn scalar_args(&self) -> &HashMap<String, SqlValue> {
        &self.scalar_args
    }

    /// List parameters.
    pub fn list_args(&self) -> &HashMap<String, Vec<SqlValue>> {
        &self.list_args
    }

    /// `field = :param`.
    pub fn add_equals_clause(
        &mut self,
        param: &str,
        field: &str,
        value: impl Into<SqlValue>,
    ) {
        self.add_where(format!("{} = :{}", field, param));
        self.add_scalar_arg(param, value);
    }

    /// `field IN ( <param> )`; nothing is added for an empty list.
    pub fn add_in_list_clause<I, V>(&mut self, param: &str, field: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return;
        }
        self.add_where(format!("{} IN ( <{}> )", field, param));
        self.list_args.insert(param.to_string(), values);
    }

    /// Pattern match of one or several fields against `:param`, OR-combined.
    pub fn add_like_clause(&mut self, param: &str, fields: &[&str], value: impl Into<SqlValue>) {
        let keyword = self.dialect().like_keyword();
        let matches = fields
            .iter()
            .map(|f| format!("{} {} :{}", f, keyword, param))
            .collect::<Vec<_>>();
        match matches.as_slice() {
            [] => return,
            [single] => self.add_where(single.clone()),
            _ => self.add_where(format!("({})", matches.join(" OR "))),
        }
        self.add_scalar_arg(param, value);
    }

    /// One bound of a date range.
    pub fn add_date_range_clause(
        &mut self,
        param: &str,
        field: &str,
        comparison: DateComparison,
        value: DateTime<Utc>,
    ) {
        self.add_where(format!("{} {} :{}", field, comparison.operator(), param));
        self.add_scalar_arg(param, value);
    }

    /// `field IS NULL` or `field IS NOT NULL`.
    pub fn add_is_null_clause(&mut self, field: &str, is_null: bool) {
        if is_null {
            self.add_where(format!("{} IS NULL", field));
        } else {
            self.add_where(format!("{} IS NOT NULL", field));
        }
    }

    /// Returns true when no WHERE fragment has been added.
    pub fn has_where(&self) -> bool {
        !self.where_clauses.is_empty()
    }

    /// Renders the statement. Rendering does not modify the assembler.
    pub fn build(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.with_clauses.is_empty() {
            let keyword = if self.recursive && self.dialect().recursive_keyword() {
                "WITH RECURSIVE"
            } else {
                "WITH"
            };
            parts.push(format!("{} {}", keyword, self.with_clauses.join(", ")));
        }

        if !self.select_clauses.is_empty() {
            let keyword = if self.distinct {
                "SELECT DISTINCT"
            } else {
                "SELECT"
            };
            parts.push(format!("{} {}", keyword, self.select_clauses.join(", ")));
        }

        if !self.from_clauses.is_empty() {
            let mut from = format!("FROM {}", self.from_clauses.join(" "));
            if !self.additional_from_clauses.is_empty() {
                from.push_str(", ");
                from.push_str(&self.additional_from_clauses.join(", "));
            }
            parts.push(from);
        }

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.group_by_clauses.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by_clauses.join(", ")));
        }

        if !self.order_by_clauses.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_clauses.join(", ")));
        }

        parts.join(" ")
    }
}

//! Recursive hierarchy clauses.
//!
//! Hierarchical filters ("this organization and everything below it") are
//! expressed as a recursive common table expression seeded with the
//! requested keys:
//!
//! ```text
//! organizations_closure(uuid) AS (
//!     SELECT organizations.uuid FROM organizations
//!         WHERE organizations.uuid IN ( <orgUuid> )
//!     UNION ALL
//!     SELECT c.uuid FROM organizations_closure p, organizations c
//!         WHERE c.parent_org_uuid = p.uuid
//! )
//! ```
//!
//! The seed keys are always part of the closure. The expression is
//! registered on the outer assembler, which owns the WITH namespace, and the
//! caller receives a predicate over the closure for the inner query.
//!
//! Read-side closures use `UNION ALL` and assume acyclic data; writes are
//! checked with [`HierarchyValidator::ensure_acyclic`].

use crate::core::SqlExecutor;
use crate::dialect::DialectKind;
use crate::error::{SearchError, SearchResult, StorageResult, ValidationError};
use crate::types::{Hierarchy, HierarchyLink, RecurseStrategy};

use super::assembler::ClauseAssembler;
use super::bind::bind_assembled;

/// Column of the closure holding the seed a row was reached from.
pub const ROOT_COLUMN: &str = "root_uuid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Children,
    Parents,
}

impl Direction {
    fn from_strategy(hierarchy: &Hierarchy, strategy: RecurseStrategy) -> SearchResult<Self> {
        match strategy {
            RecurseStrategy::Children => Ok(Direction::Children),
            RecurseStrategy::Parents => Ok(Direction::Parents),
            RecurseStrategy::None => Err(SearchError::InvalidHierarchy {
                hierarchy: hierarchy.to_string(),
                message: "a closure needs the CHILDREN or PARENTS strategy".to_string(),
            }),
        }
    }
}

/// Renders `name(uuid[, root_uuid]) AS (seed UNION step)`.
fn closure_cte(
    hierarchy: &Hierarchy,
    name: &str,
    seed_param: &str,
    direction: Direction,
    rooted: bool,
    union: &str,
) -> String {
    let table = hierarchy.table;
    let (columns, seed_root, step_root) = if rooted {
        (
            format!("uuid, {}", ROOT_COLUMN),
            format!(", {}.uuid", table),
            format!(", p.{}", ROOT_COLUMN),
        )
    } else {
        ("uuid".to_string(), String::new(), String::new())
    };

    let step = match (hierarchy.link, direction) {
        (HierarchyLink::SelfReference { parent_column }, Direction::Children) => format!(
            "SELECT c.uuid{} FROM {} p, {} c WHERE c.{} = p.uuid",
            step_root, name, table, parent_column
        ),
        (HierarchyLink::SelfReference { parent_column }, Direction::Parents) => format!(
            "SELECT c.{pc}{} FROM {} p, {} c WHERE c.uuid = p.uuid AND c.{pc} IS NOT NULL",
            step_root,
            name,
            table,
            pc = parent_column
        ),
        (
            HierarchyLink::LinkTable {
                table: link_table,
                child_column,
                parent_column,
            },
            Direction::Children,
        ) => format!(
            "SELECT c.{}{} FROM {} p, {} c WHERE c.{} = p.uuid",
            child_column, step_root, name, link_table, parent_column
        ),
        (
            HierarchyLink::LinkTable {
                table: link_table,
                child_column,
                parent_column,
            },
            Direction::Parents,
        ) => format!(
            "SELECT c.{}{} FROM {} p, {} c WHERE c.{} = p.uuid",
            parent_column, step_root, name, link_table, child_column
        ),
    };

    format!(
        "{name}({columns}) AS (SELECT {table}.uuid{seed_root} FROM {table} \
         WHERE {table}.uuid IN ( <{seed_param}> ) {union} {step})"
    )
}

fn or_group(predicates: Vec<String>) -> String {
    if predicates.len() == 1 {
        predicates.into_iter().next().unwrap_or_default()
    } else {
        format!("({})", predicates.join(" OR "))
    }
}

/// A hierarchical match of one or more columns against a set of keys.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyMatch<'a> {
    /// Hierarchy the keys belong to.
    pub hierarchy: &'a Hierarchy,
    /// Columns compared with the closure; any column matching is enough.
    pub columns: &'a [&'a str],
    /// Name of the list parameter carrying the keys.
    pub param: &'a str,
    /// Requested keys; the sentinel matches NULL columns.
    pub keys: &'a [String],
    /// Expansion of the keys.
    pub strategy: RecurseStrategy,
}

/// Builds the predicate for a hierarchical match.
///
/// Any closure expression and the key parameter are registered on `outer`.
/// Returns `None` when there are no keys. When every key is the sentinel the
/// predicate is a plain `IS NULL` test and no expression is registered.
pub fn hierarchy_predicate(
    outer: &mut ClauseAssembler,
    matcher: HierarchyMatch<'_>,
) -> SearchResult<Option<String>> {
    if matcher.keys.is_empty() || matcher.columns.is_empty() {
        return Ok(None);
    }
    let hierarchy = matcher.hierarchy;
    let (has_sentinel, real_keys) = hierarchy.split_sentinel(matcher.keys);

    let mut alternatives = Vec::new();

    if has_sentinel {
        alternatives.push(or_group(
            matcher
                .columns
                .iter()
                .map(|c| format!("{} IS NULL", c))
                .collect(),
        ));
    }

    if !real_keys.is_empty() {
        let predicate = if matcher.strategy.is_recursive() {
            let direction = Direction::from_strategy(hierarchy, matcher.strategy)?;
            let cte = outer.register_with(&format!("{}_closure", hierarchy.table), true, |name| {
                closure_cte(hierarchy, name, matcher.param, direction, false, "UNION ALL")
            });
            or_group(
                matcher
                    .columns
                    .iter()
                    .map(|c| format!("{} IN (SELECT uuid FROM {})", c, cte))
                    .collect(),
            )
        } else {
            or_group(
                matcher
                    .columns
                    .iter()
                    .map(|c| format!("{} IN ( <{}> )", c, matcher.param))
                    .collect(),
            )
        };
        outer.add_list_arg(matcher.param, real_keys);
        alternatives.push(predicate);
    }

    Ok(Some(or_group(alternatives)))
}

/// Registers a closure that tracks the seed each node was reached from,
/// seeded by the list parameter `param`. Returns the expression name; its
/// columns are `uuid` and [`ROOT_COLUMN`].
pub fn add_batch_closure(
    outer: &mut ClauseAssembler,
    hierarchy: &Hierarchy,
    strategy: RecurseStrategy,
    param: &str,
) -> SearchResult<String> {
    let direction = Direction::from_strategy(hierarchy, strategy)?;
    Ok(outer.register_with(
        &format!("{}_batch_closure", hierarchy.table),
        true,
        |name| closure_cte(hierarchy, name, param, direction, true, "UNION ALL"),
    ))
}

/// Computes hierarchy closures and validates hierarchy edits.
pub struct HierarchyValidator<'a> {
    executor: &'a dyn SqlExecutor,
    dialect: DialectKind,
}

impl<'a> HierarchyValidator<'a> {
    /// Creates a validator running on the given executor.
    pub fn new(executor: &'a dyn SqlExecutor, dialect: DialectKind) -> Self {
        Self { executor, dialect }
    }

    /// Returns the distinct keys of the closure of `seeds`, seeds included,
    /// in key order.
    ///
    /// Closures computed here use the dialect's cycle-safe set operator, so
    /// they terminate even on data that already contains a cycle.
    pub async fn closure(
        &self,
        hierarchy: &Hierarchy,
        seeds: &[String],
        strategy: RecurseStrategy,
    ) -> StorageResult<Vec<String>> {
        if seeds.is_empty() {
            return Ok(Vec::new());
        }
        let direction = Direction::from_strategy(hierarchy, strategy)?;

        let mut qb = ClauseAssembler::new(self.dialect);
        let union = qb.dialect().cycle_safe_union();
        let cte = qb.register_with(&format!("{}_closure", hierarchy.table), true, |name| {
            closure_cte(hierarchy, name, "seeds", direction, false, union)
        });
        qb.set_distinct(true);
        qb.add_select("uuid");
        qb.add_from(cte);
        qb.add_order_by("uuid");
        qb.add_list_arg("seeds", seeds.iter().cloned());

        let statement = bind_assembled(&qb, &qb.build())?;
        tracing::debug!(
            hierarchy = %hierarchy,
            seeds = seeds.len(),
            sql = %statement.sql,
            "computing hierarchy closure"
        );
        let rows = self.executor.query(&statement).await?;
        rows.iter().map(|row| row.get_string("uuid")).collect()
    }

    /// Rejects an edit that would make `new_parent` the parent of `node`
    /// when `node` is `new_parent` itself or one of its ancestors.
    ///
    /// Clearing the parent (`None` or the sentinel) is always accepted.
    pub async fn ensure_acyclic(
        &self,
        hierarchy: &Hierarchy,
        node: &str,
        new_parent: Option<&str>,
    ) -> StorageResult<()> {
        let Some(parent) = new_parent.filter(|p| !hierarchy.is_sentinel(p)) else {
            return Ok(());
        };
        if parent == node {
            return Err(ValidationError::SelfReference {
                hierarchy: hierarchy.to_string(),
                node: node.to_string(),
            }
            .into());
        }

        let ancestors = self
            .closure(hierarchy, &[parent.to_string()], RecurseStrategy::Parents)
            .await?;
        if ancestors.iter().any(|a| a == node) {
            tracing::warn!(
                hierarchy = %hierarchy,
                node,
                parent,
                "rejected hierarchy edit that would create a cycle"
            );
            return Err(ValidationError::HierarchyCycle {
                hierarchy: hierarchy.to_string(),
                node: node.to_string(),
                parent: parent.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

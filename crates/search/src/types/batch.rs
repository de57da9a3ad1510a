//! Batch-load parameters.
//!
//! A batch parameter value describes one logical relation ("children of an
//! organization", "tasks of an organization", ...) and carries the keys of the
//! current batch. The batch-loading layer coalesces requests by comparing
//! parameter values, so equality and hashing only look at the relation
//! identity and never at [`batch_uuids`](FkBatchParams::batch_uuids).

use std::hash::{Hash, Hasher};

use super::hierarchy::Hierarchy;
use super::query::RecurseStrategy;

/// Rows of `table` whose `foreign_key` column equals a batch key.
#[derive(Debug, Clone)]
pub struct FkBatchParams {
    /// Table of the returned entity.
    pub table: String,
    /// Foreign-key column on `table`.
    pub foreign_key: String,
    /// Keys of the current batch.
    pub batch_uuids: Vec<String>,
}

impl FkBatchParams {
    /// Creates parameters for a foreign-key relation.
    pub fn new(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            batch_uuids: Vec::new(),
        }
    }
}

impl PartialEq for FkBatchParams {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.foreign_key == other.foreign_key
    }
}

impl Eq for FkBatchParams {}

impl Hash for FkBatchParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.foreign_key.hash(state);
    }
}

/// Rows of `table` related to a batch key through a join table.
///
/// `join_table.join_left_key` matches `table.foreign_key`, and
/// `join_table.join_right_key` holds the batch key.
#[derive(Debug, Clone)]
pub struct M2mBatchParams {
    /// Table of the returned entity.
    pub table: String,
    /// Column on `table` joined to the join table.
    pub foreign_key: String,
    /// Join table.
    pub join_table: String,
    /// Join-table column matching `table.foreign_key`.
    pub join_left_key: String,
    /// Join-table column holding the batch key.
    pub join_right_key: String,
    /// Keys of the current batch.
    pub batch_uuids: Vec<String>,
}

impl M2mBatchParams {
    /// Creates parameters for a many-to-many relation.
    pub fn new(
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        join_table: impl Into<String>,
        join_left_key: impl Into<String>,
        join_right_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            join_table: join_table.into(),
            join_left_key: join_left_key.into(),
            join_right_key: join_right_key.into(),
            batch_uuids: Vec::new(),
        }
    }
}

impl PartialEq for M2mBatchParams {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
            && self.foreign_key == other.foreign_key
            && self.join_table == other.join_table
            && self.join_left_key == other.join_left_key
            && self.join_right_key == other.join_right_key
    }
}

impl Eq for M2mBatchParams {}

impl Hash for M2mBatchParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.foreign_key.hash(state);
        self.join_table.hash(state);
        self.join_left_key.hash(state);
        self.join_right_key.hash(state);
    }
}

/// Rows of `table` whose `foreign_key` lies in the hierarchy closure of a
/// batch key (the key itself included).
#[derive(Debug, Clone)]
pub struct RecursiveFkBatchParams {
    /// Table of the returned entity.
    pub table: String,
    /// Column on `table` matched against the closure.
    pub foreign_key: String,
    /// Hierarchy walked from each batch key.
    pub hierarchy: Hierarchy,
    /// Direction of the walk.
    pub recurse_strategy: RecurseStrategy,
    /// Keys of the current batch.
    pub batch_uuids: Vec<String>,
}

impl RecursiveFkBatchParams {
    /// Creates parameters for a recursive foreign-key relation.
    pub fn new(
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        hierarchy: Hierarchy,
        recurse_strategy: RecurseStrategy,
    ) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            hierarchy,
            recurse_strategy,
            batch_uuids: Vec::new(),
        }
    }

    /// The equivalent non-recursive relation.
    pub fn flat(&self) -> FkBatchParams {
        FkBatchParams {
            table: self.table.clone(),
            foreign_key: self.foreign_key.clone(),
            batch_uuids: self.batch_uuids.clone(),
        }
    }
}

impl PartialEq for RecursiveFkBatchParams {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
            && self.foreign_key == other.foreign_key
            && self.hierarchy == other.hierarchy
            && self.recurse_strategy == other.recurse_strategy
    }
}

impl Eq for RecursiveFkBatchParams {}

impl Hash for RecursiveFkBatchParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.foreign_key.hash(state);
        self.hierarchy.hash(state);
        self.recurse_strategy.hash(state);
    }
}

/// Rows of `table` related through a join table to any node in the
/// hierarchy closure of a batch key.
#[derive(Debug, Clone)]
pub struct RecursiveM2mBatchParams {
    /// Table of the returned entity.
    pub table: String,
    /// Column on `table` joined to the join table.
    pub foreign_key: String,
    /// Join table.
    pub join_table: String,
    /// Join-table column matching `table.foreign_key`.
    pub join_left_key: String,
    /// Join-table column matched against the closure.
    pub join_right_key: String,
    /// Hierarchy walked from each batch key.
    pub hierarchy: Hierarchy,
    /// Direction of the walk.
    pub recurse_strategy: RecurseStrategy,
    /// Keys of the current batch.
    pub batch_uuids: Vec<String>,
}

impl RecursiveM2mBatchParams {
    /// Creates parameters for a recursive many-to-many relation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        join_table: impl Into<String>,
        join_left_key: impl Into<String>,
        join_right_key: impl Into<String>,
        hierarchy: Hierarchy,
        recurse_strategy: RecurseStrategy,
    ) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            join_table: join_table.into(),
            join_left_key: join_left_key.into(),
            join_right_key: join_right_key.into(),
            hierarchy,
            recurse_strategy,
            batch_uuids: Vec::new(),
        }
    }

    /// The equivalent non-recursive relation.
    pub fn flat(&self) -> M2mBatchParams {
        M2mBatchParams {
            table: self.table.clone(),
            foreign_key: self.foreign_key.clone(),
            join_table: self.join_table.clone(),
            join_left_key: self.join_left_key.clone(),
            join_right_key: self.join_right_key.clone(),
            batch_uuids: self.batch_uuids.clone(),
        }
    }
}

impl PartialEq for RecursiveM2mBatchParams {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
            && self.foreign_key == other.foreign_key
            && self.join_table == other.join_table
            && self.join_left_key == other.join_left_key
            && self.join_right_key == other.join_right_key
            && self.hierarchy == other.hierarchy
            && self.recurse_strategy == other.recurse_strategy
    }
}

impl Eq for RecursiveM2mBatchParams {}

impl Hash for RecursiveM2mBatchParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.foreign_key.hash(state);
        self.join_table.hash(state);
        self.join_left_key.hash(state);
        self.join_right_key.hash(state);
        self.hierarchy.hash(state);
        self.recurse_strategy.hash(state);
    }
}

/// Any of the four batch parameter shapes.
///
/// Derived equality compares the variant first, so shapes never compare
/// equal to each other, and delegates to the identity-only comparisons above.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BatchParams {
    /// Foreign-key relation.
    Fk(FkBatchParams),
    /// Many-to-many relation.
    M2m(M2mBatchParams),
    /// Recursive foreign-key relation.
    RecursiveFk(RecursiveFkBatchParams),
    /// Recursive many-to-many relation.
    RecursiveM2m(RecursiveM2mBatchParams),
}

impl BatchParams {
    /// Table of the returned entity.
    pub fn table(&self) -> &str {
        match self {
            BatchParams::Fk(p) => &p.table,
            BatchParams::M2m(p) => &p.table,
            BatchParams::RecursiveFk(p) => &p.table,
            BatchParams::RecursiveM2m(p) => &p.table,
        }
    }

    /// Keys of the current batch.
    pub fn batch_uuids(&self) -> &[String] {
        match self {
            BatchParams::Fk(p) => &p.batch_uuids,
            BatchParams::M2m(p) => &p.batch_uuids,
            BatchParams::RecursiveFk(p) => &p.batch_uuids,
            BatchParams::RecursiveM2m(p) => &p.batch_uuids,
        }
    }

    /// Replaces the keys of the current batch.
    pub fn set_batch_uuids(&mut self, uuids: Vec<String>) {
        match self {
            BatchParams::Fk(p) => p.batch_uuids = uuids,
            BatchParams::M2m(p) => p.batch_uuids = uuids,
            BatchParams::RecursiveFk(p) => p.batch_uuids = uuids,
            BatchParams::RecursiveM2m(p) => p.batch_uuids = uuids,
        }
    }

    /// Returns a copy carrying the given batch keys.
    pub fn with_batch_uuids<I, S>(&self, uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut params = self.clone();
        params.set_batch_uuids(uuids.into_iter().map(Into::into).collect());
        params
    }
}

impl From<FkBatchParams> for BatchParams {
    fn from(p: FkBatchParams) -> Self {
        BatchParams::Fk(p)
    }
}

impl From<M2mBatchParams> for BatchParams {
    fn from(p: M2mBatchParams) -> Self {
        BatchParams::M2m(p)
    }
}

impl From<RecursiveFkBatchParams> for BatchParams {
    fn from(p: RecursiveFkBatchParams) -> Self {
        BatchParams::RecursiveFk(p)
    }
}

impl From<RecursiveM2mBatchParams> for BatchParams {
    fn from(p: RecursiveM2mBatchParams) -> Self {
        BatchParams::RecursiveM2m(p)
    }
}

/// The relations the graph layer batch-loads.
pub mod relations {
    use super::*;

    /// Positions belonging to an organization.
    pub fn positions_of_organization() -> BatchParams {
        FkBatchParams::new("positions", "organization_uuid").into()
    }

    /// Direct child organizations.
    pub fn child_organizations() -> BatchParams {
        FkBatchParams::new("organizations", "parent_org_uuid").into()
    }

    /// All descendant organizations, the key itself excluded.
    pub fn descendant_organizations() -> BatchParams {
        RecursiveFkBatchParams::new(
            "organizations",
            "parent_org_uuid",
            Hierarchy::ORGANIZATIONS,
            RecurseStrategy::Children,
        )
        .into()
    }

    /// The organization and all its ancestors.
    pub fn ascendant_organizations() -> BatchParams {
        RecursiveFkBatchParams::new(
            "organizations",
            "uuid",
            Hierarchy::ORGANIZATIONS,
            RecurseStrategy::Parents,
        )
        .into()
    }

    /// Tasks the organization is tasked with.
    pub fn tasks_of_tasked_organization() -> BatchParams {
        M2mBatchParams::new(
            "tasks",
            "uuid",
            "task_tasked_organizations",
            "task_uuid",
            "organization_uuid",
        )
        .into()
    }

    /// Direct child locations.
    pub fn child_locations() -> BatchParams {
        M2mBatchParams::new(
            "locations",
            "uuid",
            "location_relationships",
            "child_location_uuid",
            "parent_location_uuid",
        )
        .into()
    }

    /// All descendant locations, the key itself excluded.
    pub fn descendant_locations() -> BatchParams {
        RecursiveM2mBatchParams::new(
            "locations",
            "uuid",
            "location_relationships",
            "child_location_uuid",
            "parent_location_uuid",
            Hierarchy::LOCATIONS,
            RecurseStrategy::Children,
        )
        .into()
    }

    /// The location and all its ancestors.
    pub fn ascendant_locations() -> BatchParams {
        RecursiveFkBatchParams::new(
            "locations",
            "uuid",
            Hierarchy::LOCATIONS,
            RecurseStrategy::Parents,
        )
        .into()
    }

    /// Reports attached to an event.
    pub fn reports_of_event() -> BatchParams {
        FkBatchParams::new("reports", "event_uuid").into()
    }

    /// Direct child tasks.
    pub fn child_tasks() -> BatchParams {
        FkBatchParams::new("tasks", "parent_task_uuid").into()
    }

    /// All descendant tasks, the key itself excluded.
    pub fn descendant_tasks() -> BatchParams {
        RecursiveFkBatchParams::new(
            "tasks",
            "parent_task_uuid",
            Hierarchy::TASKS,
            RecurseStrategy::Children,
        )
        .into()
    }

    /// The task and all its ancestors.
    pub fn ascendant_tasks() -> BatchParams {
        RecursiveFkBatchParams::new("tasks", "uuid", Hierarchy::TASKS, RecurseStrategy::Parents)
            .into()
    }
}

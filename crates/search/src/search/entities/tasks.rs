use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, LinkColumn, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, Status};

use super::{add_date_range, add_null_flag, add_optional_equals, add_status};

/// Task search.
#[derive(Debug, Clone, Copy)]
pub struct Tasks;

/// Task sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskSortBy {
    /// Short name.
    #[default]
    Name,
    /// Category.
    Category,
    /// Creation time.
    CreatedAt,
}

/// Task filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFilters {
    /// Category.
    pub category: Option<String>,
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Parent task; the sentinel selects top-level tasks.
    pub parent_task: Option<HierarchyFilter>,
    /// Whether the task has a parent.
    pub has_parent_task: Option<bool>,
    /// Organization the task is assigned to.
    pub tasked_org: Option<HierarchyFilter>,
    /// Position responsible for the task.
    pub responsible_position_uuid: Option<String>,
    /// Earliest planned completion.
    pub planned_completion_start: Option<DateTime<Utc>>,
    /// Latest planned completion.
    pub planned_completion_end: Option<DateTime<Utc>>,
}

/// Query for tasks.
pub type TaskQuery = EntityQuery<Tasks>;

impl SearchEntity for Tasks {
    type SortBy = TaskSortBy;
    type Filters = TaskFilters;

    const NAME: &'static str = "task";
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "short_name",
        "long_name",
        "category",
        "status",
        "parent_task_uuid",
        "planned_completion",
        "created_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["short_name", "long_name"];

    fn sort_column(sort_by: TaskSortBy) -> &'static str {
        match sort_by {
            TaskSortBy::Name => "short_name",
            TaskSortBy::Category => "category",
            TaskSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &TaskFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_optional_equals(ctx, "category", "tasks.category", filters.category.as_deref());
        add_status(ctx, "tasks.status", filters.status);
        add_date_range(
            ctx,
            "plannedCompletion",
            "tasks.planned_completion",
            filters.planned_completion_start,
            filters.planned_completion_end,
        );
        add_null_flag(ctx, "tasks.parent_task_uuid", filters.has_parent_task);

        if let Some(parent_task) = &filters.parent_task {
            ctx.add_hierarchy_filter(
                &Hierarchy::TASKS,
                &["tasks.parent_task_uuid"],
                "parentTaskUuid",
                parent_task,
            )?;
        }

        if let Some(tasked_org) = &filters.tasked_org {
            ctx.add_linked_hierarchy_filter(
                &Hierarchy::ORGANIZATIONS,
                "tasks.uuid",
                LinkColumn {
                    table: "task_tasked_organizations",
                    owner_column: "task_uuid",
                    target_column: "organization_uuid",
                },
                "taskedOrgUuid",
                tasked_org,
            )?;
        }

        if let Some(position) = filters.responsible_position_uuid.as_deref() {
            ctx.inner.add_where(
                "tasks.uuid IN (SELECT task_responsible_positions.task_uuid \
                 FROM task_responsible_positions \
                 WHERE task_responsible_positions.position_uuid = :responsiblePositionUuid)",
            );
            ctx.inner
                .add_scalar_arg("responsiblePositionUuid", position);
        }
        Ok(())
    }
}

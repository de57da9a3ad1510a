use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::assembler::DateComparison;
use crate::search::searcher::{EntityQuery, LinkColumn, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, Status};

use super::{add_optional_equals, add_status};

/// Event search.
#[derive(Debug, Clone, Copy)]
pub struct Events;

/// Event sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSortBy {
    /// Name.
    #[default]
    Name,
    /// Creation time.
    CreatedAt,
    /// Start date.
    StartDate,
}

/// Event filters.
///
/// Organization, location and task keys always include their descendants.
/// A single sentinel key matches events where the reference is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilters {
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Event type.
    pub event_type: Option<String>,
    /// Event series.
    pub event_series_uuid: Option<String>,
    /// Owner organizations.
    pub owner_org_uuids: Vec<String>,
    /// Host organizations.
    pub host_org_uuids: Vec<String>,
    /// Admin organizations.
    pub admin_org_uuids: Vec<String>,
    /// Locations.
    pub location_uuids: Vec<String>,
    /// Tasks.
    pub task_uuids: Vec<String>,
    /// A date the event must span.
    pub include_date: Option<DateTime<Utc>>,
    /// Events ending on or after this date.
    pub start_date: Option<DateTime<Utc>>,
    /// Events starting on or before this date.
    pub end_date: Option<DateTime<Utc>>,
}

/// Query for events.
pub type EventQuery = EntityQuery<Events>;

/// Adds owner, host and admin organization filters; shared with event series.
pub(super) fn add_org_role_filters(
    ctx: &mut SearchContext<'_>,
    table: &str,
    owner: &[String],
    host: &[String],
    admin: &[String],
) -> SearchResult<()> {
    for (column, param, keys) in [
        ("owner_org_uuid", "ownerOrgUuid", owner),
        ("host_org_uuid", "hostOrgUuid", host),
        ("admin_org_uuid", "adminOrgUuid", admin),
    ] {
        let column = format!("{}.{}", table, column);
        ctx.add_hierarchy_filter(
            &Hierarchy::ORGANIZATIONS,
            &[column.as_str()],
            param,
            &HierarchyFilter::children(keys.iter().cloned()),
        )?;
    }
    Ok(())
}

impl SearchEntity for Events {
    type SortBy = EventSortBy;
    type Filters = EventFilters;

    const NAME: &'static str = "event";
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "name",
        "description",
        "type",
        "status",
        "event_series_uuid",
        "owner_org_uuid",
        "host_org_uuid",
        "admin_org_uuid",
        "location_uuid",
        "start_date",
        "end_date",
        "created_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn sort_column(sort_by: EventSortBy) -> &'static str {
        match sort_by {
            EventSortBy::Name => "name",
            EventSortBy::CreatedAt => "created_at",
            EventSortBy::StartDate => "start_date",
        }
    }

    fn apply_filters(filters: &EventFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_status(ctx, "events.status", filters.status);
        add_optional_equals(ctx, "type", "events.type", filters.event_type.as_deref());
        add_optional_equals(
            ctx,
            "eventSeriesUuid",
            "events.event_series_uuid",
            filters.event_series_uuid.as_deref(),
        );

        add_org_role_filters(
            ctx,
            "events",
            &filters.owner_org_uuids,
            &filters.host_org_uuids,
            &filters.admin_org_uuids,
        )?;

        ctx.add_hierarchy_filter(
            &Hierarchy::LOCATIONS,
            &["events.location_uuid"],
            "locationUuid",
            &HierarchyFilter::children(filters.location_uuids.iter().cloned()),
        )?;

        ctx.add_linked_hierarchy_filter(
            &Hierarchy::TASKS,
            "events.uuid",
            LinkColumn {
                table: "event_tasks",
                owner_column: "event_uuid",
                target_column: "task_uuid",
            },
            "taskUuid",
            &HierarchyFilter::children(filters.task_uuids.iter().cloned()),
        )?;

        if let Some(date) = filters.include_date {
            ctx.inner.add_date_range_clause(
                "includeDateStart",
                "events.end_date",
                DateComparison::After,
                date,
            );
            ctx.inner.add_date_range_clause(
                "includeDateEnd",
                "events.start_date",
                DateComparison::Before,
                date,
            );
        }
        if let Some(start) = filters.start_date {
            ctx.inner
                .add_date_range_clause("startDate", "events.end_date", DateComparison::After, start);
        }
        if let Some(end) = filters.end_date {
            ctx.inner
                .add_date_range_clause("endDate", "events.start_date", DateComparison::Before, end);
        }
        Ok(())
    }
}

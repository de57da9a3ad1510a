use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};
use crate::types::Status;

use super::add_status;
use super::events::add_org_role_filters;

/// Event series search.
#[derive(Debug, Clone, Copy)]
pub struct EventSeries;

/// Event series sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSeriesSortBy {
    /// Name.
    #[default]
    Name,
    /// Creation time.
    CreatedAt,
}

/// Event series filters; organization keys include their descendants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSeriesFilters {
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Owner organizations.
    pub owner_org_uuids: Vec<String>,
    /// Host organizations.
    pub host_org_uuids: Vec<String>,
    /// Admin organizations.
    pub admin_org_uuids: Vec<String>,
}

/// Query for event series.
pub type EventSeriesQuery = EntityQuery<EventSeries>;

impl SearchEntity for EventSeries {
    type SortBy = EventSeriesSortBy;
    type Filters = EventSeriesFilters;

    const NAME: &'static str = "event series";
    const TABLE: &'static str = "event_series";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "name",
        "description",
        "status",
        "owner_org_uuid",
        "host_org_uuid",
        "admin_org_uuid",
        "created_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn sort_column(sort_by: EventSeriesSortBy) -> &'static str {
        match sort_by {
            EventSeriesSortBy::Name => "name",
            EventSeriesSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &EventSeriesFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_status(ctx, "event_series.status", filters.status);
        add_org_role_filters(
            ctx,
            "event_series",
            &filters.owner_org_uuids,
            &filters.host_org_uuids,
            &filters.admin_org_uuids,
        )
    }
}

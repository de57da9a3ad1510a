use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, Status};

use super::{add_optional_equals, add_status};

/// Location search.
#[derive(Debug, Clone, Copy)]
pub struct Locations;

/// Location sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationSortBy {
    /// Name.
    #[default]
    Name,
    /// Creation time.
    CreatedAt,
}

/// Location filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationFilters {
    /// Location type.
    pub location_type: Option<String>,
    /// Lifecycle status.
    pub status: Option<Status>,
    /// The locations themselves, expanded through the location hierarchy.
    pub location: Option<HierarchyFilter>,
}

/// Query for locations.
pub type LocationQuery = EntityQuery<Locations>;

impl SearchEntity for Locations {
    type SortBy = LocationSortBy;
    type Filters = LocationFilters;

    const NAME: &'static str = "location";
    const TABLE: &'static str = "locations";
    const COLUMNS: &'static [&'static str] = &["uuid", "name", "type", "status", "created_at"];
    const TEXT_COLUMNS: &'static [&'static str] = &["name"];

    fn sort_column(sort_by: LocationSortBy) -> &'static str {
        match sort_by {
            LocationSortBy::Name => "name",
            LocationSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &LocationFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_optional_equals(ctx, "type", "locations.type", filters.location_type.as_deref());
        add_status(ctx, "locations.status", filters.status);
        if let Some(location) = &filters.location {
            ctx.add_hierarchy_filter(
                &Hierarchy::LOCATIONS,
                &["locations.uuid"],
                "locationUuid",
                location,
            )?;
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, Status};

use super::{add_null_flag, add_status};

/// Position search.
#[derive(Debug, Clone, Copy)]
pub struct Positions;

/// Position sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSortBy {
    /// Name.
    #[default]
    Name,
    /// Code.
    Code,
    /// Creation time.
    CreatedAt,
}

/// Position filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionFilters {
    /// Position types; empty matches every type.
    pub types: Vec<String>,
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Owning organization.
    pub organization: Option<HierarchyFilter>,
    /// Location.
    pub location: Option<HierarchyFilter>,
    /// Whether someone currently holds the position.
    pub is_filled: Option<bool>,
}

/// Query for positions.
pub type PositionQuery = EntityQuery<Positions>;

impl SearchEntity for Positions {
    type SortBy = PositionSortBy;
    type Filters = PositionFilters;

    const NAME: &'static str = "position";
    const TABLE: &'static str = "positions";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "name",
        "code",
        "type",
        "status",
        "organization_uuid",
        "location_uuid",
        "current_person_uuid",
        "created_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["name", "code"];

    fn sort_column(sort_by: PositionSortBy) -> &'static str {
        match sort_by {
            PositionSortBy::Name => "name",
            PositionSortBy::Code => "code",
            PositionSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &PositionFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        ctx.inner
            .add_in_list_clause("types", "positions.type", filters.types.iter().cloned());
        add_status(ctx, "positions.status", filters.status);
        add_null_flag(ctx, "positions.current_person_uuid", filters.is_filled);

        if let Some(organization) = &filters.organization {
            ctx.add_hierarchy_filter(
                &Hierarchy::ORGANIZATIONS,
                &["positions.organization_uuid"],
                "orgUuid",
                organization,
            )?;
        }
        if let Some(location) = &filters.location {
            ctx.add_hierarchy_filter(
                &Hierarchy::LOCATIONS,
                &["positions.location_uuid"],
                "locationUuid",
                location,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::search::entities::test_support::render;

    #[test]
    fn test_two_closures_share_one_with_clause() {
        let query = PositionQuery::new().with_filters(PositionFilters {
            organization: Some(HierarchyFilter::children(["o1"])),
            location: Some(HierarchyFilter::parents(["l1"])),
            types: vec!["ADVISOR".to_string(), "PRINCIPAL".to_string()],
            ..Default::default()
        });
        let sql = render(DialectKind::Postgres, &query);
        assert!(sql.starts_with(
            "WITH RECURSIVE organizations_closure(uuid) AS (SELECT organizations.uuid"
        ));
        assert!(sql.contains("), locations_closure(uuid) AS (SELECT locations.uuid"));
        assert_eq!(sql.matches("WITH").count(), 1);
        assert!(sql.contains("positions.type IN ( <types> )"));
    }

    #[test]
    fn test_mssql_omits_recursive_keyword() {
        let query = PositionQuery::new().with_filters(PositionFilters {
            organization: Some(HierarchyFilter::children(["o1"])),
            ..Default::default()
        });
        let sql = render(DialectKind::Mssql, &query);
        assert!(sql.starts_with("WITH organizations_closure(uuid) AS"));
    }
}

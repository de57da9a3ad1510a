use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, LinkColumn, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, Status};

use super::{add_null_flag, add_optional_equals, add_status};

/// Person search.
#[derive(Debug, Clone, Copy)]
pub struct People;

/// Person sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonSortBy {
    /// Name.
    #[default]
    Name,
    /// Rank.
    Rank,
    /// Creation time.
    CreatedAt,
}

/// Person filters.
///
/// Organization and location are those of the position the person
/// currently holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonFilters {
    /// Role.
    pub role: Option<String>,
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Organization of the current position.
    pub org: Option<HierarchyFilter>,
    /// Location of the current position.
    pub location: Option<HierarchyFilter>,
    /// Rank.
    pub rank: Option<String>,
    /// Whether a biography is present.
    pub has_biography: Option<bool>,
}

/// Query for people.
pub type PersonQuery = EntityQuery<People>;

const CURRENT_POSITION_ORG: LinkColumn<'static> = LinkColumn {
    table: "positions",
    owner_column: "current_person_uuid",
    target_column: "organization_uuid",
};

const CURRENT_POSITION_LOCATION: LinkColumn<'static> = LinkColumn {
    table: "positions",
    owner_column: "current_person_uuid",
    target_column: "location_uuid",
};

impl SearchEntity for People {
    type SortBy = PersonSortBy;
    type Filters = PersonFilters;

    const NAME: &'static str = "person";
    const TABLE: &'static str = "people";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "name",
        "role",
        "status",
        "rank",
        "biography",
        "created_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["name"];

    fn sort_column(sort_by: PersonSortBy) -> &'static str {
        match sort_by {
            PersonSortBy::Name => "name",
            PersonSortBy::Rank => "rank",
            PersonSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &PersonFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_optional_equals(ctx, "role", "people.role", filters.role.as_deref());
        add_status(ctx, "people.status", filters.status);
        add_optional_equals(ctx, "rank", "people.rank", filters.rank.as_deref());
        add_null_flag(ctx, "people.biography", filters.has_biography);

        if let Some(org) = &filters.org {
            ctx.add_linked_hierarchy_filter(
                &Hierarchy::ORGANIZATIONS,
                "people.uuid",
                CURRENT_POSITION_ORG,
                "orgUuid",
                org,
            )?;
        }
        if let Some(location) = &filters.location {
            ctx.add_linked_hierarchy_filter(
                &Hierarchy::LOCATIONS,
                "people.uuid",
                CURRENT_POSITION_LOCATION,
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
    use crate::search::entities::test_support::render_inner;

    #[test]
    fn test_org_goes_through_current_position() {
        let query = PersonQuery::new().with_filters(PersonFilters {
            org: Some(HierarchyFilter::exact(["o1"])),
            has_biography: Some(false),
            ..Default::default()
        });
        let inner = render_inner(DialectKind::Sqlite, &query);
        assert!(inner.ends_with(
            "WHERE people.biography IS NULL AND people.uuid IN (SELECT positions.current_person_uuid \
             FROM positions WHERE positions.organization_uuid IN ( <orgUuid> ))"
        ));
    }
}

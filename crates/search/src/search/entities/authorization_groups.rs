use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};
use crate::types::Status;

use super::add_status;

/// Authorization group search.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGroups;

/// Authorization group sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationGroupSortBy {
    /// Name.
    #[default]
    Name,
    /// Creation time.
    CreatedAt,
}

/// Authorization group filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationGroupFilters {
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Object (position, organization, ...) that is a member of the group.
    pub related_object_uuid: Option<String>,
}

/// Query for authorization groups.
pub type AuthorizationGroupQuery = EntityQuery<AuthorizationGroups>;

impl SearchEntity for AuthorizationGroups {
    type SortBy = AuthorizationGroupSortBy;
    type Filters = AuthorizationGroupFilters;

    const NAME: &'static str = "authorization group";
    const TABLE: &'static str = "authorization_groups";
    const COLUMNS: &'static [&'static str] =
        &["uuid", "name", "description", "status", "created_at"];
    const TEXT_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn sort_column(sort_by: AuthorizationGroupSortBy) -> &'static str {
        match sort_by {
            AuthorizationGroupSortBy::Name => "name",
            AuthorizationGroupSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(
        filters: &AuthorizationGroupFilters,
        ctx: &mut SearchContext<'_>,
    ) -> SearchResult<()> {
        add_status(ctx, "authorization_groups.status", filters.status);
        if let Some(related) = filters.related_object_uuid.as_deref() {
            ctx.inner.add_where(
                "authorization_groups.uuid IN \
                 (SELECT authorization_group_related_objects.authorization_group_uuid \
                 FROM authorization_group_related_objects \
                 WHERE authorization_group_related_objects.related_object_uuid = :relatedObjectUuid)",
            );
            ctx.inner.add_scalar_arg("relatedObjectUuid", related);
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, Status};

use super::{add_null_flag, add_optional_equals, add_status};

/// Organization search.
#[derive(Debug, Clone, Copy)]
pub struct Organizations;

/// Organization sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationSortBy {
    /// Short name.
    #[default]
    Name,
    /// Organization type.
    Type,
    /// Creation time.
    CreatedAt,
}

/// Organization filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationFilters {
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Organization type.
    pub org_type: Option<String>,
    /// Parent organization; the sentinel selects top-level organizations.
    pub parent_org: Option<HierarchyFilter>,
    /// Whether the organization has a parent.
    pub has_parent_org: Option<bool>,
    /// The organizations themselves, expanded through the hierarchy.
    pub org: Option<HierarchyFilter>,
    /// Email network, matched against the identification code.
    pub email_network: Option<String>,
}

/// Query for organizations.
pub type OrganizationQuery = EntityQuery<Organizations>;

impl SearchEntity for Organizations {
    type SortBy = OrganizationSortBy;
    type Filters = OrganizationFilters;

    const NAME: &'static str = "organization";
    const TABLE: &'static str = "organizations";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "short_name",
        "long_name",
        "identification_code",
        "type",
        "status",
        "parent_org_uuid",
        "created_at",
        "updated_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] =
        &["short_name", "long_name", "identification_code"];

    fn sort_column(sort_by: OrganizationSortBy) -> &'static str {
        match sort_by {
            OrganizationSortBy::Name => "short_name",
            OrganizationSortBy::Type => "type",
            OrganizationSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &OrganizationFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_status(ctx, "organizations.status", filters.status);
        add_optional_equals(ctx, "type", "organizations.type", filters.org_type.as_deref());

        if let Some(parent_org) = &filters.parent_org {
            ctx.add_hierarchy_filter(
                &Hierarchy::ORGANIZATIONS,
                &["organizations.parent_org_uuid"],
                "parentOrgUuid",
                parent_org,
            )?;
        }
        add_null_flag(ctx, "organizations.parent_org_uuid", filters.has_parent_org);

        if let Some(org) = &filters.org {
            ctx.add_hierarchy_filter(
                &Hierarchy::ORGANIZATIONS,
                &["organizations.uuid"],
                "orgUuid",
                org,
            )?;
        }

        if let Some(network) = filters.email_network.as_deref() {
            ctx.inner.add_like_clause(
                "emailNetwork",
                &["organizations.identification_code"],
                format!("%{}%", network),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::search::entities::test_support::{render, render_inner};

    #[test]
    fn test_top_level_sentinel() {
        let query = OrganizationQuery::new().with_filters(OrganizationFilters {
            parent_org: Some(HierarchyFilter::children(["-1"])),
            ..Default::default()
        });
        let sql = render(DialectKind::Postgres, &query);
        assert!(!sql.contains("WITH"));
        assert!(sql.contains("WHERE organizations.parent_org_uuid IS NULL"));
    }

    #[test]
    fn test_status_and_type() {
        let query = OrganizationQuery::new().with_filters(OrganizationFilters {
            status: Some(Status::Active),
            org_type: Some("ADVISOR_ORG".to_string()),
            has_parent_org: Some(true),
            ..Default::default()
        });
        let inner = render_inner(DialectKind::Sqlite, &query);
        assert!(inner.ends_with(
            "WHERE organizations.status = :status AND organizations.type = :type \
             AND organizations.parent_org_uuid IS NOT NULL"
        ));
    }

    #[test]
    fn test_sort_by_type_descending() {
        let query = OrganizationQuery::new()
            .sorted_by(OrganizationSortBy::Type, crate::types::SortOrder::Desc);
        let sql = render(DialectKind::Mssql, &query);
        assert!(sql.ends_with("ORDER BY organizations.type DESC, organizations.uuid ASC"));
    }
}

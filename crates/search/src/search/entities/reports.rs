use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};
use crate::types::{Hierarchy, HierarchyFilter, NO_PARENT_SENTINEL, Status};

use super::{add_date_range, add_optional_equals};

/// Report search.
#[derive(Debug, Clone, Copy)]
pub struct Reports;

/// Report sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportSortBy {
    /// Engagement date.
    EngagementDate,
    /// Creation time.
    #[default]
    CreatedAt,
    /// Last update time.
    UpdatedAt,
    /// Release time.
    ReleasedAt,
}

/// Report filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFilters {
    /// Reports are always active; `Inactive` matches nothing.
    pub status: Option<Status>,
    /// Author.
    pub author_uuid: Option<String>,
    /// Attendee.
    pub attendee_uuid: Option<String>,
    /// States; empty matches every state.
    pub states: Vec<String>,
    /// Earliest engagement date.
    pub engagement_date_start: Option<DateTime<Utc>>,
    /// Latest engagement date.
    pub engagement_date_end: Option<DateTime<Utc>>,
    /// Earliest creation time.
    pub created_at_start: Option<DateTime<Utc>>,
    /// Latest creation time.
    pub created_at_end: Option<DateTime<Utc>>,
    /// Earliest update time.
    pub updated_at_start: Option<DateTime<Utc>>,
    /// Latest update time.
    pub updated_at_end: Option<DateTime<Utc>>,
    /// Earliest release time.
    pub released_at_start: Option<DateTime<Utc>>,
    /// Latest release time.
    pub released_at_end: Option<DateTime<Utc>>,
    /// Advisor or principal organization. Cannot be combined with
    /// `advisor_org_uuid` or `principal_org_uuid`.
    pub org: Option<HierarchyFilter>,
    /// Advisor organization; the sentinel matches reports without one.
    pub advisor_org_uuid: Option<String>,
    /// Include descendants of the advisor organization.
    pub include_advisor_org_children: bool,
    /// Principal organization; the sentinel matches reports without one.
    pub principal_org_uuid: Option<String>,
    /// Include descendants of the principal organization.
    pub include_principal_org_children: bool,
    /// Location; the sentinel matches reports without a location.
    pub location_uuid: Option<String>,
    /// Task; the sentinel matches reports without tasks.
    pub task_uuid: Option<String>,
    /// Event.
    pub event_uuid: Option<String>,
    /// Authorization groups; an empty list matches nothing.
    pub authorization_group_uuids: Option<Vec<String>>,
}

/// Query for reports.
pub type ReportQuery = EntityQuery<Reports>;

impl SearchEntity for Reports {
    type SortBy = ReportSortBy;
    type Filters = ReportFilters;

    const NAME: &'static str = "report";
    const TABLE: &'static str = "reports";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "intent",
        "key_outcomes",
        "state",
        "engagement_date",
        "created_at",
        "updated_at",
        "released_at",
        "advisor_org_uuid",
        "principal_org_uuid",
        "location_uuid",
        "event_uuid",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["intent", "key_outcomes"];

    fn sort_column(sort_by: ReportSortBy) -> &'static str {
        match sort_by {
            ReportSortBy::EngagementDate => "engagement_date",
            ReportSortBy::CreatedAt => "created_at",
            ReportSortBy::UpdatedAt => "updated_at",
            ReportSortBy::ReleasedAt => "released_at",
        }
    }

    fn apply_filters(filters: &ReportFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        if filters.org.is_some()
            && (filters.advisor_org_uuid.is_some() || filters.principal_org_uuid.is_some())
        {
            return Err(SearchError::ConflictingFilters {
                entity: Self::NAME.to_string(),
                message: "org cannot be combined with advisor_org_uuid or principal_org_uuid"
                    .to_string(),
            });
        }

        if filters.status == Some(Status::Inactive) {
            ctx.inner.add_where("1 = 0");
        }

        if let Some(author) = filters.author_uuid.as_deref() {
            ctx.inner.add_where(
                "reports.uuid IN (SELECT report_people.report_uuid FROM report_people \
                 WHERE report_people.is_author = :isAuthor AND report_people.person_uuid = :authorUuid)",
            );
            ctx.inner.add_scalar_arg("isAuthor", true);
            ctx.inner.add_scalar_arg("authorUuid", author);
        }
        if let Some(attendee) = filters.attendee_uuid.as_deref() {
            ctx.inner.add_where(
                "reports.uuid IN (SELECT report_people.report_uuid FROM report_people \
                 WHERE report_people.is_attendee = :isAttendee AND report_people.person_uuid = :attendeeUuid)",
            );
            ctx.inner.add_scalar_arg("isAttendee", true);
            ctx.inner.add_scalar_arg("attendeeUuid", attendee);
        }

        ctx.inner
            .add_in_list_clause("states", "reports.state", filters.states.iter().cloned());

        add_date_range(
            ctx,
            "engagementDate",
            "reports.engagement_date",
            filters.engagement_date_start,
            filters.engagement_date_end,
        );
        add_date_range(
            ctx,
            "createdAt",
            "reports.created_at",
            filters.created_at_start,
            filters.created_at_end,
        );
        add_date_range(
            ctx,
            "updatedAt",
            "reports.updated_at",
            filters.updated_at_start,
            filters.updated_at_end,
        );
        add_date_range(
            ctx,
            "releasedAt",
            "reports.released_at",
            filters.released_at_start,
            filters.released_at_end,
        );

        if let Some(org) = &filters.org {
            ctx.add_hierarchy_filter(
                &Hierarchy::ORGANIZATIONS,
                &["reports.advisor_org_uuid", "reports.principal_org_uuid"],
                "orgUuid",
                org,
            )?;
        }
        add_side_org_filter(
            ctx,
            "reports.advisor_org_uuid",
            "advisorOrgUuid",
            filters.advisor_org_uuid.as_deref(),
            filters.include_advisor_org_children,
        )?;
        add_side_org_filter(
            ctx,
            "reports.principal_org_uuid",
            "principalOrgUuid",
            filters.principal_org_uuid.as_deref(),
            filters.include_principal_org_children,
        )?;

        match filters.location_uuid.as_deref() {
            Some(NO_PARENT_SENTINEL) => ctx.inner.add_is_null_clause("reports.location_uuid", true),
            location => add_optional_equals(ctx, "locationUuid", "reports.location_uuid", location),
        }

        match filters.task_uuid.as_deref() {
            Some(NO_PARENT_SENTINEL) => ctx.inner.add_where(
                "NOT EXISTS (SELECT 1 FROM report_tasks \
                 WHERE report_tasks.report_uuid = reports.uuid)",
            ),
            Some(task) => {
                ctx.inner.add_where(
                    "reports.uuid IN (SELECT report_tasks.report_uuid FROM report_tasks \
                     WHERE report_tasks.task_uuid = :taskUuid)",
                );
                ctx.inner.add_scalar_arg("taskUuid", task);
            }
            None => {}
        }

        add_optional_equals(ctx, "eventUuid", "reports.event_uuid", filters.event_uuid.as_deref());

        if let Some(groups) = &filters.authorization_group_uuids {
            ctx.inner.add_where(
                "reports.uuid IN (SELECT report_authorization_groups.report_uuid \
                 FROM report_authorization_groups \
                 WHERE report_authorization_groups.authorization_group_uuid IN ( <authorizationGroupUuids> ))",
            );
            ctx.inner
                .add_list_arg("authorizationGroupUuids", groups.iter().cloned());
        }
        Ok(())
    }
}

/// Advisor or principal organization: the sentinel matches NULL, otherwise
/// an exact match or the organization and its descendants.
fn add_side_org_filter(
    ctx: &mut SearchContext<'_>,
    column: &str,
    param: &str,
    org_uuid: Option<&str>,
    include_children: bool,
) -> SearchResult<()> {
    let Some(org_uuid) = org_uuid else {
        return Ok(());
    };
    let filter = if include_children {
        HierarchyFilter::children([org_uuid])
    } else {
        HierarchyFilter::exact([org_uuid])
    };
    ctx.add_hierarchy_filter(&Hierarchy::ORGANIZATIONS, &[column], param, &filter)
}

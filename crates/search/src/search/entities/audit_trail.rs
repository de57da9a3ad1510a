use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};

use super::{add_date_range, add_optional_equals};

/// Audit trail search.
#[derive(Debug, Clone, Copy)]
pub struct AuditTrail;

/// Audit trail sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditTrailSortBy {
    /// Creation time.
    #[default]
    CreatedAt,
}

/// Audit trail filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditTrailFilters {
    /// User who made the change.
    pub user_uuid: Option<String>,
    /// Type of the changed object.
    pub related_object_type: Option<String>,
    /// Key of the changed object.
    pub related_object_uuid: Option<String>,
    /// Earliest entry time.
    pub created_at_start: Option<DateTime<Utc>>,
    /// Latest entry time.
    pub created_at_end: Option<DateTime<Utc>>,
}

/// Query for audit trail entries.
pub type AuditTrailQuery = EntityQuery<AuditTrail>;

impl SearchEntity for AuditTrail {
    type SortBy = AuditTrailSortBy;
    type Filters = AuditTrailFilters;

    const NAME: &'static str = "audit trail";
    const TABLE: &'static str = "audit_trail";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "user_uuid",
        "update_type",
        "object_type",
        "object_uuid",
        "details",
        "created_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["details"];

    fn sort_column(sort_by: AuditTrailSortBy) -> &'static str {
        match sort_by {
            AuditTrailSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(filters: &AuditTrailFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_optional_equals(ctx, "userUuid", "audit_trail.user_uuid", filters.user_uuid.as_deref());
        add_optional_equals(
            ctx,
            "objectType",
            "audit_trail.object_type",
            filters.related_object_type.as_deref(),
        );
        add_optional_equals(
            ctx,
            "objectUuid",
            "audit_trail.object_uuid",
            filters.related_object_uuid.as_deref(),
        );
        add_date_range(
            ctx,
            "createdAt",
            "audit_trail.created_at",
            filters.created_at_start,
            filters.created_at_end,
        );
        Ok(())
    }
}

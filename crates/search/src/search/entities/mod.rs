//! Searchable entities.
//!
//! Each module defines the entity marker implementing
//! [`SearchEntity`](super::SearchEntity), its sort fields, its filters and a
//! query alias such as [`ReportQuery`].

use chrono::{DateTime, Utc};

use crate::types::Status;

use super::assembler::DateComparison;
use super::searcher::SearchContext;

mod audit_trail;
mod authorization_groups;
mod event_series;
mod events;
mod locations;
mod organizations;
mod people;
mod positions;
mod reports;
mod subscriptions;
mod tags;
mod tasks;

pub use audit_trail::{AuditTrail, AuditTrailFilters, AuditTrailQuery, AuditTrailSortBy};
pub use authorization_groups::{
    AuthorizationGroupFilters, AuthorizationGroupQuery, AuthorizationGroupSortBy,
    AuthorizationGroups,
};
pub use event_series::{EventSeries, EventSeriesFilters, EventSeriesQuery, EventSeriesSortBy};
pub use events::{EventFilters, EventQuery, EventSortBy, Events};
pub use locations::{LocationFilters, LocationQuery, LocationSortBy, Locations};
pub use organizations::{OrganizationFilters, OrganizationQuery, OrganizationSortBy, Organizations};
pub use people::{People, PersonFilters, PersonQuery, PersonSortBy};
pub use positions::{PositionFilters, PositionQuery, PositionSortBy, Positions};
pub use reports::{ReportFilters, ReportQuery, ReportSortBy, Reports};
pub use subscriptions::{SubscriptionFilters, SubscriptionQuery, SubscriptionSortBy, Subscriptions};
pub use tags::{TagFilters, TagQuery, TagSortBy, Tags};
pub use tasks::{TaskFilters, TaskQuery, TaskSortBy, Tasks};

fn add_status(ctx: &mut SearchContext<'_>, column: &str, status: Option<Status>) {
    if let Some(status) = status {
        ctx.inner.add_equals_clause("status", column, status.as_str());
    }
}

fn add_optional_equals(ctx: &mut SearchContext<'_>, param: &str, column: &str, value: Option<&str>) {
    if let Some(value) = value {
        ctx.inner.add_equals_clause(param, column, value);
    }
}

/// Adds the present bounds of `[start, end]` on `column`. Parameters are
/// named `{param}Start` and `{param}End`.
fn add_date_range(
    ctx: &mut SearchContext<'_>,
    param: &str,
    column: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) {
    if let Some(start) = start {
        ctx.inner.add_date_range_clause(
            &format!("{}Start", param),
            column,
            DateComparison::After,
            start,
        );
    }
    if let Some(end) = end {
        ctx.inner
            .add_date_range_clause(&format!("{}End", param), column, DateComparison::Before, end);
    }
}

fn add_null_flag(ctx: &mut SearchContext<'_>, column: &str, present: Option<bool>) {
    if let Some(present) = present {
        ctx.inner.add_is_null_clause(column, !present);
    }
}

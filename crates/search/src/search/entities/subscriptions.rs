use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};

use super::add_optional_equals;

/// Subscription search.
#[derive(Debug, Clone, Copy)]
pub struct Subscriptions;

/// Subscription sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionSortBy {
    /// Creation time.
    #[default]
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

/// Subscription filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionFilters {
    /// Subscribing position.
    pub subscriber_uuid: Option<String>,
    /// Type of the subscribed object.
    pub subscribed_object_type: Option<String>,
}

/// Query for subscriptions.
pub type SubscriptionQuery = EntityQuery<Subscriptions>;

impl SearchEntity for Subscriptions {
    type SortBy = SubscriptionSortBy;
    type Filters = SubscriptionFilters;

    const NAME: &'static str = "subscription";
    const TABLE: &'static str = "subscriptions";
    const COLUMNS: &'static [&'static str] = &[
        "uuid",
        "subscriber_uuid",
        "subscribed_object_type",
        "subscribed_object_uuid",
        "created_at",
        "updated_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &[];

    fn sort_column(sort_by: SubscriptionSortBy) -> &'static str {
        match sort_by {
            SubscriptionSortBy::CreatedAt => "created_at",
            SubscriptionSortBy::UpdatedAt => "updated_at",
        }
    }

    fn apply_filters(filters: &SubscriptionFilters, ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        add_optional_equals(
            ctx,
            "subscriberUuid",
            "subscriptions.subscriber_uuid",
            filters.subscriber_uuid.as_deref(),
        );
        add_optional_equals(
            ctx,
            "subscribedObjectType",
            "subscriptions.subscribed_object_type",
            filters.subscribed_object_type.as_deref(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::search::entities::test_support::render_inner;

    #[test]
    fn test_text_is_ignored_without_text_columns() {
        let query = SubscriptionQuery::new().with_text("anything");
        assert!(!render_inner(DialectKind::Sqlite, &query).contains("WHERE"));
    }
}

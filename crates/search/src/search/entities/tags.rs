use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::search::searcher::{EntityQuery, SearchContext, SearchEntity};

/// Tag search.
#[derive(Debug, Clone, Copy)]
pub struct Tags;

/// Tag sort fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagSortBy {
    /// Name.
    #[default]
    Name,
    /// Creation time.
    CreatedAt,
}

/// Tags have no filters beyond text search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagFilters {}

/// Query for tags.
pub type TagQuery = EntityQuery<Tags>;

impl SearchEntity for Tags {
    type SortBy = TagSortBy;
    type Filters = TagFilters;

    const NAME: &'static str = "tag";
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static [&'static str] = &["uuid", "name", "description", "created_at"];
    const TEXT_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn sort_column(sort_by: TagSortBy) -> &'static str {
        match sort_by {
            TagSortBy::Name => "name",
            TagSortBy::CreatedAt => "created_at",
        }
    }

    fn apply_filters(_filters: &TagFilters, _ctx: &mut SearchContext<'_>) -> SearchResult<()> {
        Ok(())
    }
}

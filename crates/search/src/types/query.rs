//! Search query types shared by every entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::batch::BatchParams;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How a hierarchical filter expands its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurseStrategy {
    /// Match the keys only.
    #[default]
    None,
    /// Match the keys and all their descendants.
    Children,
    /// Match the keys and all their ancestors.
    Parents,
}

impl RecurseStrategy {
    /// Returns true when the strategy walks the hierarchy.
    pub fn is_recursive(&self) -> bool {
        !matches!(self, RecurseStrategy::None)
    }
}

/// Lifecycle status shared by most entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Active.
    Active,
    /// Inactive.
    Inactive,
}

impl Status {
    /// Returns the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "ACTIVE",
            Status::Inactive => "INACTIVE",
        }
    }
}

/// A filter on a hierarchical key (organization, location, task).
///
/// A key equal to the hierarchy's sentinel matches rows whose column is NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyFilter {
    /// Keys to match.
    pub uuids: Vec<String>,
    /// Expansion applied to the keys.
    #[serde(default)]
    pub recurse_strategy: RecurseStrategy,
}

impl HierarchyFilter {
    /// Matches the given keys only.
    pub fn exact<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(uuids, RecurseStrategy::None)
    }

    /// Matches the given keys and their descendants.
    pub fn children<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(uuids, RecurseStrategy::Children)
    }

    /// Matches the given keys and their ancestors.
    pub fn parents<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(uuids, RecurseStrategy::Parents)
    }

    fn new<I, S>(uuids: I, recurse_strategy: RecurseStrategy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uuids: uuids.into_iter().map(Into::into).collect(),
            recurse_strategy,
        }
    }
}

/// Parameters common to every entity search.
///
/// `page_size == 0` means unlimited. A blank `text` disables text search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery<S> {
    /// Free-text term.
    #[serde(default)]
    pub text: Option<String>,

    /// Zero-based page number.
    #[serde(default)]
    pub page_num: u32,

    /// Rows per page; 0 disables paging.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Entity-specific sort field. When absent, text searches order by
    /// relevance and other searches by the entity's default field.
    #[serde(default)]
    pub sort_by: Option<S>,

    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortOrder,

    /// Batch-load parameters, set by the batch-loading layer.
    #[serde(skip)]
    pub batch: Option<BatchParams>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl<S> Default for SearchQuery<S> {
    fn default() -> Self {
        Self {
            text: None,
            page_num: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_order: SortOrder::default(),
            batch: None,
        }
    }
}

impl<S> SearchQuery<S> {
    /// Returns the text term if it is present and not blank.
    pub fn text_term(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Returns true when the query is a batch load.
    pub fn is_batch(&self) -> bool {
        self.batch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_disables_text_search() {
        let mut query: SearchQuery<()> = SearchQuery::default();
        assert_eq!(query.text_term(), None);
        query.text = Some("   ".to_string());
        assert_eq!(query.text_term(), None);
        query.text = Some(" kabul ".to_string());
        assert_eq!(query.text_term(), Some("kabul"));
    }

    #[test]
    fn test_query_deserialization_defaults() {
        let query: SearchQuery<()> = serde_json::from_str(r#"{"text":"x"}"#).unwrap();
        assert_eq!(query.page_num, 0);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert!(query.sort_by.is_none());
        assert!(query.batch.is_none());
    }

    #[test]
    fn test_recurse_strategy_serde() {
        let s: RecurseStrategy = serde_json::from_str(r#""CHILDREN""#).unwrap();
        assert_eq!(s, RecurseStrategy::Children);
        assert!(s.is_recursive());
        assert!(!RecurseStrategy::None.is_recursive());
    }

    #[test]
    fn test_hierarchy_filter_constructors() {
        let f = HierarchyFilter::children(["a", "b"]);
        assert_eq!(f.uuids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.recurse_strategy, RecurseStrategy::Children);
        assert_eq!(
            HierarchyFilter::exact(["a"]).recurse_strategy,
            RecurseStrategy::None
        );
    }
}

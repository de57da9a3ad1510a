//! Paged search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,

    /// Zero-based page number that was requested.
    pub page_num: u32,

    /// Page size that was requested; 0 means unlimited.
    pub page_size: u32,

    /// Total number of matching rows, when the dialect reports it.
    pub total_count: Option<u64>,

    /// Batch key of each item, parallel to `items`.
    ///
    /// Every entry is `None` for queries that were not batched.
    pub batch_keys: Vec<Option<String>>,
}

impl<T> Page<T> {
    /// Creates a page from its parts.
    pub fn new(
        items: Vec<T>,
        page_num: u32,
        page_size: u32,
        total_count: Option<u64>,
        batch_keys: Vec<Option<String>>,
    ) -> Self {
        Self {
            items,
            page_num,
            page_size,
            total_count,
            batch_keys,
        }
    }

    /// Creates an empty page.
    pub fn empty(page_num: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), page_num, page_size, None, Vec::new())
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns the items with their batch keys.
    pub fn iter_batched(&self) -> impl Iterator<Item = (Option<&str>, &T)> {
        self.batch_keys
            .iter()
            .map(Option::as_deref)
            .zip(self.items.iter())
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_num: self.page_num,
            page_size: self.page_size,
            total_count: self.total_count,
            batch_keys: self.batch_keys,
        }
    }
}

impl<T: Clone> Page<T> {
    /// Groups items by batch key, returning one group per requested key in
    /// the order given.
    ///
    /// Keys with no rows get an empty group, so "no related rows" is
    /// distinguishable from "not requested".
    pub fn group_by_batch(&self, keys: &[String]) -> Vec<Vec<T>> {
        let mut grouped: HashMap<&str, Vec<T>> = HashMap::new();
        for (key, item) in self.iter_batched() {
            if let Some(key) = key {
                grouped.entry(key).or_default().push(item.clone());
            }
        }
        keys.iter()
            .map(|k| grouped.get(k.as_str()).cloned().unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_batch_returns_empty_groups() {
        let page = Page::new(
            vec!["c1", "c2", "c3"],
            0,
            0,
            None,
            vec![
                Some("p1".to_string()),
                Some("p1".to_string()),
                Some("p3".to_string()),
            ],
        );
        let keys = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
        let groups = page.group_by_batch(&keys);
        assert_eq!(groups, vec![vec!["c1", "c2"], vec![], vec!["c3"]]);
    }

    #[test]
    fn test_map_preserves_metadata() {
        let page = Page::new(vec![1, 2], 3, 2, Some(8), vec![None, None]);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.page_num, 3);
        assert_eq!(mapped.total_count, Some(8));
        assert_eq!(mapped.batch_keys.len(), 2);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<String> = Page::empty(0, 10);
        assert!(page.is_empty());
        assert_eq!(page.len(), 0);
        assert!(page.total_count.is_none());
    }
}

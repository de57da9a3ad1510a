//! Descriptions of the recursive structures the engine can traverse.

use std::fmt;

/// Sentinel key meaning "no parent" for the built-in hierarchies.
pub const NO_PARENT_SENTINEL: &str = "-1";

/// How a node points at its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyLink {
    /// The node table carries a parent foreign key.
    SelfReference {
        /// Column on the node table holding the parent key.
        parent_column: &'static str,
    },
    /// A separate table stores child/parent pairs.
    LinkTable {
        /// Relationship table.
        table: &'static str,
        /// Column holding the child key.
        child_column: &'static str,
        /// Column holding the parent key.
        parent_column: &'static str,
    },
}

/// A recursive parent/child structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hierarchy {
    /// Node table; its primary key column is `uuid`.
    pub table: &'static str,
    /// Parent link.
    pub link: HierarchyLink,
    /// Key value meaning "no node"; filters on it match NULL columns.
    pub sentinel: &'static str,
}

impl Hierarchy {
    /// Organizations, linked by `parent_org_uuid`.
    pub const ORGANIZATIONS: Hierarchy = Hierarchy {
        table: "organizations",
        link: HierarchyLink::SelfReference {
            parent_column: "parent_org_uuid",
        },
        sentinel: NO_PARENT_SENTINEL,
    };

    /// Locations, linked through `location_relationships`.
    pub const LOCATIONS: Hierarchy = Hierarchy {
        table: "locations",
        link: HierarchyLink::LinkTable {
            table: "location_relationships",
            child_column: "child_location_uuid",
            parent_column: "parent_location_uuid",
        },
        sentinel: NO_PARENT_SENTINEL,
    };

    /// Tasks, linked by `parent_task_uuid`.
    pub const TASKS: Hierarchy = Hierarchy {
        table: "tasks",
        link: HierarchyLink::SelfReference {
            parent_column: "parent_task_uuid",
        },
        sentinel: NO_PARENT_SENTINEL,
    };

    /// Returns true if the key is this hierarchy's sentinel.
    pub fn is_sentinel(&self, key: &str) -> bool {
        key == self.sentinel
    }

    /// Splits keys into (sentinel present, real keys).
    pub fn split_sentinel(&self, keys: &[String]) -> (bool, Vec<String>) {
        let has_sentinel = keys.iter().any(|k| self.is_sentinel(k));
        let real = keys
            .iter()
            .filter(|k| !self.is_sentinel(k))
            .cloned()
            .collect();
        (has_sentinel, real)
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentinel() {
        let keys = vec!["-1".to_string(), "a".to_string()];
        let (has_sentinel, real) = Hierarchy::ORGANIZATIONS.split_sentinel(&keys);
        assert!(has_sentinel);
        assert_eq!(real, vec!["a".to_string()]);

        let (has_sentinel, real) = Hierarchy::TASKS.split_sentinel(&["b".to_string()]);
        assert!(!has_sentinel);
        assert_eq!(real.len(), 1);
    }
}

//! Domain model types for the tagview catalog.
//!
//! This crate defines the read-only records the query engine filters over:
//! tracked file-system entries ([`Item`]), user-defined labels ([`Tag`]) and
//! their groupings ([`TagGroup`]), plus the per-query [`TagSnapshot`] bundle.
//!
//! The engine never mutates these records; keeping the catalog up to date is
//! the host application's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked file-system entry.
///
/// One row per file or directory the host application has indexed. `size` is
/// `None` for directories, which is significant for size comparisons: a
/// directory never matches `size > 10MB` (or any other size predicate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Catalog-assigned identifier.
    pub id: i64,

    /// Full path of the entry, unique within the catalog.
    pub path: String,

    /// Whether this entry is a directory.
    #[serde(default)]
    pub is_directory: bool,

    /// Size in bytes. `None` for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    /// Last modification time.
    pub modified_at: DateTime<Utc>,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Returns the final path component.
    ///
    /// This is the single derivation of an item's display name; the storage
    /// layer persists the same derivation into its `name` column so that both
    /// query backends observe identical name semantics.
    pub fn file_name(&self) -> &str {
        file_name_from_path(&self.path)
    }
}

/// Returns the final component of a path string.
///
/// Shared with the storage layer, which persists it as the `name` column at
/// insert time.
pub fn file_name_from_path(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
}

/// A user-defined tag.
///
/// Tag text is unique within a group but may repeat across groups: a `2024`
/// tag can exist in both an `events` group and an `archive` group. Queries
/// that reference a bare tag value match every group; `"group:value"` syntax
/// restricts the lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Catalog-assigned identifier.
    pub id: i64,

    /// The group this tag belongs to.
    pub group_id: i64,

    /// The tag text as the user entered it.
    pub value: String,
}

/// A logical grouping of tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagGroup {
    /// Catalog-assigned identifier.
    pub id: i64,

    /// Display name of the group, unique within the catalog.
    pub name: String,
}

/// A read-only bundle of the tag dataset, captured once per query evaluation.
///
/// The validator resolves tag references against this snapshot; it is built,
/// used, and discarded per query, so concurrent evaluations never share
/// mutable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSnapshot {
    /// All tags in the catalog.
    #[serde(default)]
    pub tags: Vec<Tag>,

    /// All tag groups in the catalog.
    #[serde(default)]
    pub groups: Vec<TagGroup>,
}

impl TagSnapshot {
    /// Creates a snapshot from owned tag and group lists.
    pub fn new(tags: Vec<Tag>, groups: Vec<TagGroup>) -> Self {
        Self { tags, groups }
    }

    /// Finds a group by name (case-insensitive).
    pub fn find_group_by_name(&self, name: &str) -> Option<&TagGroup> {
        self.groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Finds every tag whose value matches `text`, case-insensitively and
    /// exactly (not substring), optionally restricted to one group.
    ///
    /// Duplicate tag text across groups means this can return several tags
    /// for one text.
    pub fn tags_matching(&self, text: &str, group_id: Option<i64>) -> Vec<&Tag> {
        let wanted = text.to_lowercase();
        self.tags
            .iter()
            .filter(|t| group_id.map_or(true, |g| t.group_id == g))
            .filter(|t| t.value.to_lowercase() == wanted)
            .collect()
    }
}

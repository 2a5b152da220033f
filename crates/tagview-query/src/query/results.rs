//! Deterministic assembly of the matched item set.

use serde::Serialize;
use tagview_model_rs::Item;

/// The ordered result of a query evaluation.
///
/// Items are sorted by path, ascending, byte-wise. Paths are unique within
/// the catalog, so the ordering is total. Pagination is the UI layer's
/// concern; the full match set is returned. Serializable so the host
/// application can ship results across its IPC boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedItems {
    /// The matched items in display order.
    pub items: Vec<Item>,
    /// Total number of matches.
    pub total: usize,
}

impl MatchedItems {
    /// Orders the matched items and records the count.
    pub fn assemble(mut items: Vec<Item>) -> Self {
        items.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
        let total = items.len();
        Self { items, total }
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//! In-memory compiler backend: the reference semantics.
//!
//! Evaluates a validated [`Predicate`] as a pure boolean function over one
//! [`Item`] plus its resolved tag-id set, with no I/O. This backend is the
//! ground truth the relational backend is tested against; it is never used
//! for production-scale filtering.
//!
//! Timestamps are compared at second granularity, matching the integer
//! columns the storage collaborator persists.

use std::collections::HashSet;

use tagview_model_rs::Item;

use super::predicate::{Predicate, TextMatch};

/// Evaluates a validated predicate against items.
#[derive(Debug)]
pub struct MemoryFilter<'a> {
    predicate: &'a Predicate,
}

impl<'a> MemoryFilter<'a> {
    /// Creates an evaluator over a validated predicate.
    pub fn new(predicate: &'a Predicate) -> Self {
        Self { predicate }
    }

    /// Returns true if the item matches.
    ///
    /// `item_tags` is the set of tag ids attached to this item, supplied by
    /// the caller (the engine holds no item-tag associations itself).
    pub fn matches(&self, item: &Item, item_tags: &HashSet<i64>) -> bool {
        evaluate(self.predicate, item, item_tags)
    }

    /// Filters a slice of items, returning references to those that match.
    pub fn filter_items<'b, F>(&self, items: &'b [Item], mut tags_for: F) -> Vec<&'b Item>
    where
        F: FnMut(&Item) -> HashSet<i64>,
    {
        items
            .iter()
            .filter(|item| self.matches(item, &tags_for(item)))
            .collect()
    }
}

fn evaluate(predicate: &Predicate, item: &Item, item_tags: &HashSet<i64>) -> bool {
    match predicate {
        // The empty id set matches nothing, so `any` is vacuously false.
        Predicate::TagAny { tag_ids } => tag_ids.iter().any(|id| item_tags.contains(id)),

        Predicate::Name(text_match) => text_matches(text_match, item.file_name()),
        Predicate::Path(text_match) => text_matches(text_match, &item.path),

        // Directories have no size and never match a size comparison.
        Predicate::Size { op, bytes } => {
            item.size.is_some_and(|size| op.compare(size, *bytes))
        }

        Predicate::Modified { op, at } => {
            op.compare(item.modified_at.timestamp(), at.timestamp())
        }
        Predicate::Created { op, at } => {
            op.compare(item.created_at.timestamp(), at.timestamp())
        }

        Predicate::And(left, right) => {
            evaluate(left, item, item_tags) && evaluate(right, item, item_tags)
        }
        Predicate::Or(left, right) => {
            evaluate(left, item, item_tags) || evaluate(right, item, item_tags)
        }
        Predicate::Not(inner) => !evaluate(inner, item, item_tags),
    }
}

fn text_matches(text_match: &TextMatch, text: &str) -> bool {
    match text_match {
        TextMatch::Exact(expected) => text == expected,
        TextMatch::Pattern(pattern) => pattern.matches(text),
        TextMatch::AnyOf(values) => values.iter().any(|v| v == text),
    }
}

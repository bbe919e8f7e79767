//! Visible-note derivation: search, category filter, and ordering.
//!
//! Everything here is pure. The store re-runs [`visible_notes`] over its
//! cache whenever a caller asks, so any change to a note's pinned flag or
//! `updated_at` is reflected in the next derivation.

use std::cmp::Ordering;

use crate::note::Note;
use crate::types::EntityId;

/// What the sidebar is currently narrowed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Free-text search; empty matches everything.
    pub search: String,
    /// Active category; `None` means all categories.
    pub category: Option<EntityId>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        let in_category = self
            .category
            .map_or(true, |category| note.category_id == Some(category));
        in_category && matches_search(note, &self.search)
    }
}

/// Case-insensitive substring match against title or content.
pub fn matches_search(note: &Note, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    note.title.to_lowercase().contains(&needle) || note.content.to_lowercase().contains(&needle)
}

/// Pinned notes first, then most recently updated first.
pub fn compare_notes(a: &Note, b: &Note) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
}

/// Filter and order `notes` for display. The sort is stable.
pub fn visible_notes<'a, I>(notes: I, filter: &NoteFilter) -> Vec<&'a Note>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut visible: Vec<&Note> = notes.into_iter().filter(|n| filter.matches(n)).collect();
    visible.sort_by(|a, b| compare_notes(a, b));
    visible
}

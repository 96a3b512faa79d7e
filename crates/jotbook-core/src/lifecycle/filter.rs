//! Local note filtering.

use crate::models::Note;

/// Notes whose title or content contains `term`, ignoring case.
///
/// A blank term keeps every note. Order is preserved.
pub fn filter_notes(items: &[Note], term: &str) -> Vec<Note> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|note| note.matches_lowercase(&needle))
        .cloned()
        .collect()
}

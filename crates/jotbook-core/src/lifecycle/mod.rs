//! Notes fetch lifecycle.
//!
//! A [`NoteListController`] backs one mounted view. It loads the collection,
//! filters it locally and applies mutations to local state only after the
//! backend confirmed them. Responses that arrive after [`unmount`] or after a
//! newer load has started are dropped.
//!
//! [`unmount`]: NoteListController::unmount

mod filter;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::api::{ApiError, ApiResult, NotesBackend};
use crate::models::{Image, ImageId, NewImage, Note, NoteDraft, NoteId, NotePatch};

pub use filter::filter_notes;

/// View-local state; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteListState {
    pub items: Vec<Note>,
    /// `items` narrowed by `filter_term`
    pub filtered: Vec<Note>,
    pub is_loading: bool,
    /// Last failure, formatted for display
    pub error: Option<String>,
    pub filter_term: String,
}

impl NoteListState {
    fn refilter(&mut self) {
        self.filtered = filter_notes(&self.items, &self.filter_term);
    }

    fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.items.iter_mut().find(|note| note.id == id)
    }
}

/// What happened to the result of a [`NoteListController::load_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Applied to state; carries the number of notes loaded
    Applied(usize),
    /// A newer load started before this one finished
    Stale,
    /// The view was unmounted while the request was in flight
    Unmounted,
}

pub struct NoteListController<B: NotesBackend> {
    backend: B,
    state: Mutex<NoteListState>,
    load_seq: AtomicU64,
    mounted: AtomicBool,
}

impl<B: NotesBackend> NoteListController<B> {
    /// Mount a controller with empty state.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(NoteListState::default()),
            load_seq: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn snapshot(&self) -> NoteListState {
        self.lock().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Detach from the view. Later responses no longer touch state.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Fetch the full collection and replace `items`.
    ///
    /// On failure `items` is kept and `error` is set.
    pub async fn load_all(&self) -> ApiResult<LoadOutcome> {
        let ticket = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.is_mounted() {
            return Ok(LoadOutcome::Unmounted);
        }
        self.lock().is_loading = true;

        let result = self.backend.list_notes().await;

        if !self.is_mounted() {
            tracing::debug!("Discarding note list response for unmounted view");
            return Ok(LoadOutcome::Unmounted);
        }
        let mut state = self.lock();
        if self.load_seq.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Discarding stale note list response #{}", ticket);
            return Ok(LoadOutcome::Stale);
        }

        state.is_loading = false;
        match result {
            Ok(notes) => {
                let count = notes.len();
                state.items = notes;
                state.refilter();
                state.error = None;
                Ok(LoadOutcome::Applied(count))
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Narrow `filtered` to notes matching `term`. Returns the match count.
    pub fn apply_filter(&self, term: &str) -> usize {
        let mut state = self.lock();
        state.filter_term = term.to_string();
        state.refilter();
        state.filtered.len()
    }

    /// Create a note and append the server's copy.
    pub async fn create(&self, draft: NoteDraft, images: Vec<NewImage>) -> ApiResult<Note> {
        draft.validate()?;

        let result = self.backend.create_note(&draft, &images).await;
        self.settle(result, |state, note| {
            state.items.push(note.clone());
        })
    }

    /// Fetch one note and keep it in the collection, replacing any older copy.
    ///
    /// A later [`Self::update`] of the same note then works from this copy
    /// instead of asking the backend again.
    pub async fn open(&self, id: NoteId) -> ApiResult<Note> {
        let result = self.backend.get_note(id).await;
        self.settle(result, |state, note| match state.note_mut(id) {
            Some(slot) => *slot = note.clone(),
            None => state.items.push(note.clone()),
        })
    }

    /// Merge `patch` onto note `id`, send it and replace the note in place.
    pub async fn update(
        &self,
        id: NoteId,
        patch: NotePatch,
        new_image: Option<NewImage>,
    ) -> ApiResult<Note> {
        patch.validate()?;

        let loaded = self
            .lock()
            .items
            .iter()
            .find(|note| note.id == id)
            .cloned();
        let current = match loaded {
            Some(note) => note,
            None => self.fetch_for_update(id).await?,
        };

        let merged = patch.apply(&current);
        NoteDraft::new(merged.title.as_str(), merged.content.as_str()).validate()?;

        let result = self
            .backend
            .update_note(&merged, &patch.remove_image_ids, new_image.as_slice())
            .await;
        self.settle(result, |state, updated| {
            if let Some(slot) = state.note_mut(id) {
                *slot = updated.clone();
            }
        })
    }

    /// Delete a note; local state changes only once the backend confirmed.
    pub async fn remove(&self, id: NoteId) -> ApiResult<()> {
        let result = self.backend.delete_note(id).await;
        self.settle(result, |state, _| {
            state.items.retain(|note| note.id != id);
        })
    }

    /// Delete one image and drop it from its parent note.
    pub async fn remove_image(&self, note_id: NoteId, image_id: ImageId) -> ApiResult<()> {
        let result = self.backend.delete_image(image_id).await;
        self.settle(result, |state, _| {
            if let Some(note) = state.note_mut(note_id) {
                note.remove_image(image_id);
            }
        })
    }

    /// Upload an image and attach it to its note.
    pub async fn add_image(&self, note_id: NoteId, image: NewImage) -> ApiResult<Image> {
        let result = self.backend.add_image(note_id, &image).await;
        self.settle(result, |state, uploaded| {
            if let Some(note) = state.note_mut(note_id) {
                note.images.push(uploaded.clone());
            }
        })
    }

    /// Replace a note's image list with the backend's.
    pub async fn refresh_images(&self, note_id: NoteId) -> ApiResult<Vec<Image>> {
        let result = self.backend.list_images(note_id).await;
        self.settle(result, |state, images| {
            if let Some(note) = state.note_mut(note_id) {
                note.images.clone_from(images);
            }
        })
    }

    async fn fetch_for_update(&self, id: NoteId) -> ApiResult<Note> {
        let result = self.backend.get_note(id).await;
        if let Err(error) = &result {
            self.record_failure(error);
        }
        result
    }

    /// Apply a confirmed mutation, or record its failure.
    fn settle<T>(
        &self,
        result: ApiResult<T>,
        apply: impl FnOnce(&mut NoteListState, &T),
    ) -> ApiResult<T> {
        match &result {
            Ok(value) => {
                if self.is_mounted() {
                    let mut state = self.lock();
                    apply(&mut state, value);
                    state.refilter();
                    state.error = None;
                } else {
                    tracing::debug!("Ignoring confirmed mutation for unmounted view");
                }
            }
            Err(error) => self.record_failure(error),
        }
        result
    }

    fn record_failure(&self, error: &ApiError) {
        if matches!(error, ApiError::Validation(_)) || !self.is_mounted() {
            return;
        }
        tracing::warn!("Notes request failed: {}", error);
        self.lock().error = Some(error.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, NoteListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests;

//! Note model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Image, ImageId};
use crate::validation::ValidationErrors;

/// Server-assigned note identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A note owned by the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier assigned by the backend
    pub id: NoteId,
    pub title: String,
    /// Body text (`description` in the create form)
    pub content: String,
    /// Ordered tag list
    pub tags: Vec<String>,
    pub images: Vec<Image>,
    /// Creation timestamp, when the backend reports one
    pub created_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Case-insensitive substring match on title or content.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }

    /// Title truncated to `max_len` characters, falling back to the first content line
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        let source = if self.title.trim().is_empty() {
            self.content.lines().next().unwrap_or("")
        } else {
            self.title.as_str()
        };
        source.trim().chars().take(max_len).collect()
    }

    /// Remove one image by id. Returns `true` when an image was removed.
    pub fn remove_image(&mut self, image_id: ImageId) -> bool {
        let before = self.images.len();
        self.images.retain(|image| image.id != image_id);
        self.images.len() != before
    }
}

/// Fields for a note that does not exist on the server yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Title and content are required; checked before any request is made.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.content.trim().is_empty() {
            errors.push("content", "Content is required");
        }
        errors.into_result()
    }

    /// Tags joined the way the create form submits them
    #[must_use]
    pub fn joined_tags(&self) -> String {
        self.tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Partial update for an existing note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Images dropped as part of the same update
    pub remove_image_ids: Vec<ImageId>,
}

impl NotePatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.remove_image_ids.is_empty()
    }

    /// A patch may leave fields alone but cannot blank them.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if is_blank(self.title.as_deref()) {
            errors.push("title", "Title is required");
        }
        if is_blank(self.content.as_deref()) {
            errors.push("content", "Content is required");
        }
        errors.into_result()
    }

    /// Merge onto `note`. The backend replaces every field on edit, so the
    /// merged note is what gets sent.
    #[must_use]
    pub fn apply(&self, note: &Note) -> Note {
        let mut merged = note.clone();
        if let Some(title) = &self.title {
            merged.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            merged.content.clone_from(content);
        }
        if let Some(tags) = &self.tags {
            merged.tags.clone_from(tags);
        }
        merged
            .images
            .retain(|image| !self.remove_image_ids.contains(&image.id));
        merged
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().is_empty())
}

//! Data models for jotbook

mod image;
mod note;

pub use image::{Image, ImageId, NewImage};
pub use note::{Note, NoteDraft, NoteId, NotePatch};

use std::io;

use jotbook_core::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] jotbook_core::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Invalid note id: {0}")]
    InvalidNoteId(String),
    #[error("Invalid image id: {0}")]
    InvalidImageId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No password given. Pass --password or set JOTBOOK_PASSWORD")]
    MissingPassword,
    #[error("Not signed in")]
    NotLoggedIn,
}

impl CliError {
    /// Whether signing in again would fix this error.
    pub const fn is_auth(&self) -> bool {
        match self {
            Self::NotLoggedIn => true,
            Self::Api(error) => error.is_auth(),
            _ => false,
        }
    }
}

//! jotbook-core - Core library for jotbook
//!
//! This crate contains the models, session store, HTTP client and notes
//! lifecycle used by every jotbook interface.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod preferences;
pub mod session;
pub mod storage;
pub mod util;
pub mod validation;

pub use api::{ApiClient, ApiError, ApiResult, NotesApi, NotesBackend};
pub use auth::AuthApi;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use lifecycle::{LoadOutcome, NoteListController, NoteListState};
pub use models::{Image, ImageId, NewImage, Note, NoteDraft, NoteId, NotePatch};
pub use preferences::Preferences;
pub use session::{LogoutReason, Session, SessionError, SessionState, SessionStore, SessionUser};
pub use storage::{KeyValueStore, MemoryStorage};
pub use validation::ValidationErrors;

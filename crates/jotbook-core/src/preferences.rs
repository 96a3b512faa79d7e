//! User interface preferences stored next to the session token.

use crate::error::Result;
use crate::storage::{KeyValueStore, DARK_MODE_KEY};

/// Read/write access to the dark-mode flag.
///
/// Only this type writes [`DARK_MODE_KEY`]; it never touches the token key.
#[derive(Debug, Clone)]
pub struct Preferences<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Missing or unreadable values mean light mode.
    pub fn dark_mode(&self) -> Result<bool> {
        Ok(self
            .storage
            .get(DARK_MODE_KEY)?
            .is_some_and(|raw| raw.trim().eq_ignore_ascii_case("true")))
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.storage
            .set(DARK_MODE_KEY, if enabled { "true" } else { "false" })
    }

    /// Flip the flag and return the new value.
    pub fn toggle_dark_mode(&self) -> Result<bool> {
        let enabled = !self.dark_mode()?;
        self.set_dark_mode(enabled)?;
        Ok(enabled)
    }
}

//! Keychain-backed client storage, one namespace per CLI profile.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

use keyring::Entry;

use jotbook_core::{Error, KeyValueStore, Result};

const KEYRING_SERVICE_NAME: &str = "jotbook-cli";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    /// The platform credential store.
    Keychain,
    /// Process-wide map shared by every instance, for tests.
    #[cfg(test)]
    Memory,
}

/// Stores every key as its own keychain entry named `<profile>:<key>`.
///
/// Separate `jot` invocations see each other's writes, which is what lets a
/// login in one shell end up signed in everywhere.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    profile: String,
    backend: Backend,
}

impl KeyringStorage {
    pub fn new(profile_name: &str) -> Self {
        Self {
            profile: profile_name.to_string(),
            backend: Backend::Keychain,
        }
    }

    #[cfg(test)]
    pub fn in_memory(profile_name: &str) -> Self {
        Self {
            profile: profile_name.to_string(),
            backend: Backend::Memory,
        }
    }

    fn username(&self, key: &str) -> String {
        format!("{}:{key}", self.profile)
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username(key))
            .map_err(|error| Error::Storage(error.to_string()))
    }

    #[cfg(test)]
    fn with_memory<T>(f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        let mut guard = STORE
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .map_err(|_| Error::Storage("test keyring lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl KeyValueStore for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.backend {
            Backend::Keychain => match self.entry(key)?.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(error) => Err(Error::Storage(error.to_string())),
            },
            #[cfg(test)]
            Backend::Memory => {
                let username = self.username(key);
                Self::with_memory(|store| store.get(&username).cloned())
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        match self.backend {
            Backend::Keychain => self
                .entry(key)?
                .set_password(value)
                .map_err(|error| Error::Storage(error.to_string())),
            #[cfg(test)]
            Backend::Memory => {
                let username = self.username(key);
                Self::with_memory(|store| {
                    store.insert(username, value.to_string());
                })
            }
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.backend {
            Backend::Keychain => match self.entry(key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(error) => Err(Error::Storage(error.to_string())),
            },
            #[cfg(test)]
            Backend::Memory => {
                let username = self.username(key);
                Self::with_memory(|store| {
                    store.remove(&username);
                })
            }
        }
    }
}

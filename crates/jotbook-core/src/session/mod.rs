//! Session store: the single owner of "who is signed in".
//!
//! The token lives in shared persistent storage under [`TOKEN_KEY`]. Only
//! [`SessionStore::login`] and the logout paths write that key. Readers go
//! through [`SessionStore::current_user`] or [`SessionStore::bearer_token`],
//! which re-read storage on every call and collapse invalid or expired tokens
//! into a logged-out state instead of returning an error.

mod token;

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::storage::{KeyValueStore, TOKEN_KEY};
use crate::util::unix_timestamp_now;

pub use token::{decode_claims, TokenClaims};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Token could not be decoded: {0}")]
    InvalidToken(String),
    #[error("Token expired at {0}")]
    Expired(i64),
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Persistent storage error: {0}")]
    Storage(String),
}

/// Source of the current time in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        unix_timestamp_now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub const fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Identity derived from the token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub email: String,
    /// Local part of the email, used for greetings
    pub display_name: String,
    pub user_id: Option<i64>,
    /// Unix seconds
    pub expires_at: i64,
}

impl SessionUser {
    fn from_claims(claims: TokenClaims) -> Self {
        let display_name = claims
            .subject
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            email: claims.subject,
            display_name,
            user_id: claims.user_id,
            expires_at: claims.expires_at,
        }
    }

    #[must_use]
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// A validated token together with its identity
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: SessionUser,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub const fn user(&self) -> &SessionUser {
        &self.user
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Why the client is logged out; views use it to word the login prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogoutReason {
    NotSignedIn,
    UserRequested,
    Expired,
    InvalidToken,
    /// Another context removed or replaced the stored token
    ExternalChange,
    /// The backend refused the token
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedIn(Session),
    LoggedOut(LogoutReason),
}

impl SessionState {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }

    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::LoggedIn(session) => Some(session.user()),
            Self::LoggedOut(_) => None,
        }
    }
}

struct Inner<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SessionState>,
}

/// Cheaply cloneable handle; clones share one session.
pub struct SessionStore<S: KeyValueStore> {
    inner: Arc<Inner<S>>,
}

impl<S: KeyValueStore> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> fmt::Debug for SessionStore<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionStore")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Build a store and restore whatever session the storage already holds.
    pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(SessionState::LoggedOut(LogoutReason::NotSignedIn));
        let store = Self {
            inner: Arc::new(Inner {
                storage,
                clock,
                state,
            }),
        };
        store.sync_with_storage();
        store
    }

    /// Validate `token` and make it the active session.
    ///
    /// On failure nothing is written and the current state is left alone.
    pub fn login(&self, token: &str) -> Result<SessionUser, SessionError> {
        let session = self.validate(token.trim())?;
        self.inner
            .storage
            .set(TOKEN_KEY, session.token())
            .map_err(|error| SessionError::Storage(error.to_string()))?;

        let user = session.user().clone();
        tracing::debug!("Session started for {}", user.email);
        self.inner.state.send_replace(SessionState::LoggedIn(session));
        Ok(user)
    }

    /// Clear the stored token and notify subscribers.
    pub fn logout(&self) {
        self.end_session(LogoutReason::UserRequested);
    }

    /// The backend answered 401 for the current token.
    pub fn reject(&self) {
        tracing::warn!("Backend rejected the session token; signing out");
        self.end_session(LogoutReason::Rejected);
    }

    /// Current identity, or `None`. Never fails.
    pub fn current_user(&self) -> Option<SessionUser> {
        match self.sync_with_storage() {
            SessionState::LoggedIn(session) => Some(session.user),
            SessionState::LoggedOut(_) => None,
        }
    }

    /// Token for an outgoing request, read fresh from storage.
    pub fn bearer_token(&self) -> Result<String, SessionError> {
        match self.sync_with_storage() {
            SessionState::LoggedIn(session) => Ok(session.token),
            SessionState::LoggedOut(_) => Err(SessionError::NotAuthenticated),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Last known state without touching storage.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every login/logout transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Reconcile in-memory state with the shared storage.
    ///
    /// Picks up logins, logouts and token swaps made by other contexts and
    /// ends the session when the stored token has expired or is unreadable.
    pub fn sync_with_storage(&self) -> SessionState {
        let stored = match self.inner.storage.get(TOKEN_KEY) {
            Ok(stored) => stored.filter(|token| !token.trim().is_empty()),
            Err(error) => {
                tracing::warn!("Failed to read session token: {}", error);
                None
            }
        };

        match stored {
            None => {
                self.mark_logged_out(LogoutReason::ExternalChange);
            }
            Some(token) => match self.validate(token.trim()) {
                Ok(session) => {
                    self.inner.state.send_if_modified(|state| {
                        if matches!(state, SessionState::LoggedIn(current) if *current == session) {
                            false
                        } else {
                            *state = SessionState::LoggedIn(session);
                            true
                        }
                    });
                }
                Err(SessionError::Expired(expired_at)) => {
                    tracing::warn!("Session token expired at {}; signing out", expired_at);
                    self.discard_stored_token(&token);
                    self.mark_logged_out(LogoutReason::Expired);
                }
                Err(error) => {
                    tracing::warn!("Stored session token is unusable: {}", error);
                    self.discard_stored_token(&token);
                    self.mark_logged_out(LogoutReason::InvalidToken);
                }
            },
        }

        self.state()
    }

    /// Poll storage every `every` so changes made elsewhere reach subscribers.
    ///
    /// The task ends on its own once every handle to this store is dropped.
    pub fn watch_storage(&self, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner<S>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Self { inner }.sync_with_storage();
            }
        })
    }

    fn validate(&self, token: &str) -> Result<Session, SessionError> {
        let claims = decode_claims(token)?;
        if claims.expires_at <= self.inner.clock.now() {
            return Err(SessionError::Expired(claims.expires_at));
        }
        Ok(Session {
            token: token.to_string(),
            user: SessionUser::from_claims(claims),
        })
    }

    fn end_session(&self, reason: LogoutReason) {
        if let Err(error) = self.inner.storage.remove(TOKEN_KEY) {
            tracing::warn!("Failed to clear session token: {}", error);
        }
        self.mark_logged_out(reason);
    }

    /// Remove `stale` from storage unless another context already replaced it.
    fn discard_stored_token(&self, stale: &str) {
        match self.inner.storage.get(TOKEN_KEY) {
            Ok(Some(current)) if current == stale => {
                if let Err(error) = self.inner.storage.remove(TOKEN_KEY) {
                    tracing::warn!("Failed to clear session token: {}", error);
                }
            }
            Ok(_) => tracing::debug!("Session token changed before cleanup; keeping it"),
            Err(error) => tracing::warn!("Failed to re-read session token: {}", error),
        }
    }

    /// Transition to logged-out; notifies only when a session was active.
    fn mark_logged_out(&self, reason: LogoutReason) -> bool {
        self.inner.state.send_if_modified(|state| {
            if state.is_logged_in() {
                *state = SessionState::LoggedOut(reason);
                true
            } else {
                false
            }
        })
    }
}

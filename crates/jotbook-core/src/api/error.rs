//! Failed request normalization.
//!
//! Every failure the API layer can produce ends up as an [`ApiError`] whose
//! `Display` output is the message a view shows to the user.

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::session::SessionError;
use crate::util::compact_text;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Caught before any request was sent
    #[error("{0}")]
    Validation(ValidationErrors),
    /// Missing, expired or rejected token; the session has been ended
    #[error("{0}")]
    Unauthenticated(String),
    /// The request never completed
    #[error("Could not reach the server ({0}). Please try again.")]
    Network(String),
    /// Non-2xx answer; `message` is what the server said
    #[error("{message}")]
    Backend { status: u16, message: String },
    /// 2xx answer whose payload does not fit the expected shape
    #[error("Unexpected response from the server: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build the error for a non-2xx response from its status and body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = backend_message(status, body);
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthenticated(message)
        } else {
            Self::Backend {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Consume a failed response and normalize it.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    pub(crate) fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Network("request timed out".to_string())
        } else if error.is_connect() {
            Self::Network("connection failed".to_string())
        } else if error.is_decode() {
            Self::InvalidResponse(compact_text(&error.to_string()))
        } else {
            Self::Network(compact_text(&error.to_string()))
        }
    }

    /// Whether a user-initiated retry could succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotAuthenticated => {
                Self::Unauthenticated("Please log in to continue.".to_string())
            }
            SessionError::Expired(_) => {
                Self::Unauthenticated("Your session has expired. Please log in again.".to_string())
            }
            SessionError::InvalidToken(reason) => {
                Self::Unauthenticated(format!("The server issued an unusable token: {reason}"))
            }
            SessionError::Storage(reason) => {
                Self::Unauthenticated(format!("Could not store the session: {reason}"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

/// Server-supplied message for a failed response.
///
/// JSON bodies contribute `message`, `error` or `msg` (first non-blank wins),
/// any other body is used as trimmed text, and an empty body falls back to
/// `HTTP <status>`.
pub fn backend_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = [payload.message, payload.error, payload.msg]
            .into_iter()
            .flatten()
            .map(|message| message.trim().to_string())
            .find(|message| !message.is_empty())
        {
            return compact_text(&message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

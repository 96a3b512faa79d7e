//! HTTP access to the notes backend.
//!
//! [`ApiClient`] owns the configured `reqwest` client. Authenticated calls read
//! the bearer token from the [`SessionStore`] on every request and end the
//! session when the backend answers 401.

pub mod error;
mod notes;
pub mod wire;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::session::SessionStore;
use crate::storage::KeyValueStore;

pub use error::{backend_message, ApiError, ApiResult};
pub use notes::{NotesApi, NotesBackend};

/// Configured HTTP client for one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| Error::Config(format!("Failed to construct HTTP client: {error}")))?;
        Ok(Self { config, client })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, path);
        self.client.request(method, self.config.endpoint(path))
    }

    /// Send without credentials. Non-2xx answers become [`ApiError`]s.
    pub(crate) async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|error| ApiError::from_transport(&error))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let error = ApiError::from_response(response).await;
            tracing::debug!("Request failed: {:?}", error);
            Err(error)
        }
    }

    /// Send with the current bearer token.
    ///
    /// A missing or expired session fails before anything goes on the wire.
    /// A 401 answer ends the session.
    pub(crate) async fn send_authenticated<S: KeyValueStore>(
        &self,
        session: &SessionStore<S>,
        request: RequestBuilder,
    ) -> ApiResult<Response> {
        let token = session.bearer_token()?;
        match self.send(request.bearer_auth(token)).await {
            Err(ApiError::Unauthenticated(message)) => {
                session.reject();
                Err(ApiError::Unauthenticated(message))
            }
            other => other,
        }
    }
}

/// Read a JSON body; `204 No Content` and empty bodies yield `None`.
pub(crate) async fn read_json(response: Response) -> ApiResult<Option<Value>> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|error| ApiError::from_transport(&error))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    wire::parse_body(&bytes).map(Some)
}

/// Read a JSON body that must be present.
pub(crate) async fn require_json(response: Response) -> ApiResult<Value> {
    read_json(response)
        .await?
        .ok_or_else(|| ApiError::InvalidResponse("empty response body".to_string()))
}

/// Read a plain-text confirmation, trimmed.
pub(crate) async fn read_text(response: Response) -> ApiResult<String> {
    response
        .text()
        .await
        .map(|text| text.trim().to_string())
        .map_err(|error| ApiError::from_transport(&error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_keeps_normalized_base_url() {
        let config = ClientConfig::new("http://localhost:8080/").unwrap();
        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}

//! Account flows against the backend auth endpoints.
//!
//! Credentials are validated locally first; only a successful login touches
//! the [`SessionStore`].

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{read_text, ApiClient, ApiError, ApiResult};
use crate::session::{SessionStore, SessionUser};
use crate::storage::KeyValueStore;
use crate::validation::{is_valid_email, validate_credentials, validate_registration, ValidationErrors};

/// Body for login and registration. The backend keys accounts by `username`,
/// which is the email address.
#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
}

impl<'a> CredentialsBody<'a> {
    const fn new(email: &'a str, password: &'a str) -> Self {
        Self {
            email,
            username: email,
            password,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: Option<bool>,
    message: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthApi<S: KeyValueStore> {
    client: ApiClient,
    session: SessionStore<S>,
}

impl<S: KeyValueStore> AuthApi<S> {
    pub const fn new(client: ApiClient, session: SessionStore<S>) -> Self {
        Self { client, session }
    }

    /// Exchange credentials for a token and start the session.
    ///
    /// Any failure leaves the current session untouched.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<SessionUser> {
        let email = email.trim();
        validate_credentials(email, password)?;

        let request = self
            .client
            .request(Method::POST, "/api/auth/login")
            .json(&CredentialsBody::new(email, password));
        let response = self.client.send(request).await.map_err(|error| match error {
            // Wrong credentials, not a dead session.
            ApiError::Unauthenticated(message) => ApiError::Backend {
                status: 401,
                message,
            },
            other => other,
        })?;

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|error| ApiError::InvalidResponse(format!("login response: {error}")))?;
        let token = match (payload.success, payload.token) {
            (Some(false), _) | (_, None) => {
                return Err(ApiError::Backend {
                    status: 200,
                    message: payload
                        .message
                        .unwrap_or_else(|| "Login failed".to_string()),
                });
            }
            (_, Some(token)) => token,
        };

        let user = self.session.login(&token)?;
        tracing::info!("Logged in as {}", user.email);
        Ok(user)
    }

    /// Create an account. Returns the backend's confirmation text.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ApiResult<String> {
        let email = email.trim();
        validate_registration(email, password, confirm_password)?;

        let request = self
            .client
            .request(Method::POST, "/api/auth/register")
            .json(&CredentialsBody::new(email, password));
        let response = self.client.send(request).await?;
        read_text(response).await
    }

    /// Ask the backend to send a password reset mail.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        let email = email.trim();
        if !is_valid_email(email) {
            let mut errors = ValidationErrors::default();
            errors.push("email", "Please enter a valid email address");
            return Err(errors.into());
        }

        let request = self
            .client
            .request(Method::POST, "/api/auth/forgot-password")
            .json(&serde_json::json!({ "email": email }));
        let response = self.client.send(request).await?;
        read_text(response).await
    }

    /// Tell the backend, then always clear the local session.
    pub async fn logout(&self) {
        if let Ok(token) = self.session.bearer_token() {
            let request = self
                .client
                .request(Method::POST, "/api/auth/logout")
                .bearer_auth(token);
            if let Err(error) = self.client.send(request).await {
                tracing::warn!("Remote logout failed: {}", error);
            }
        }
        self.session.logout();
    }

    pub const fn session(&self) -> &SessionStore<S> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::MemoryStorage;

    fn auth() -> AuthApi<MemoryStorage> {
        // Nothing listens here; tests must fail before sending.
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        AuthApi::new(
            ApiClient::new(config).unwrap(),
            SessionStore::new(MemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn login_validates_before_sending() {
        let error = auth().login("not-an-email", "123").await.unwrap_err();
        let ApiError::Validation(errors) = error else {
            panic!("expected validation error, got {error:?}");
        };
        assert!(errors.field("email").is_some());
        assert!(errors.field("password").is_some());
    }

    #[tokio::test]
    async fn register_requires_matching_confirmation() {
        let error = auth()
            .register("a@b.com", "secret1", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Validation(ref errors) if errors.field("confirm_password").is_some()));
    }

    #[tokio::test]
    async fn forgot_password_checks_email_shape() {
        assert!(matches!(
            auth().forgot_password("nobody").await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn logout_without_session_is_local_only() {
        let auth = auth();
        auth.logout().await;
        assert!(auth.session().current_user().is_none());
    }

    #[test]
    fn credentials_body_mirrors_email_into_username() {
        let body = serde_json::to_value(CredentialsBody::new("a@b.com", "secret1")).unwrap();
        assert_eq!(body["username"], "a@b.com");
        assert_eq!(body["email"], "a@b.com");
    }
}

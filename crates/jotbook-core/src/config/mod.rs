//! Client configuration.
//!
//! Provides the `ClientConfig` used by every entry point to locate the notes
//! backend and bound request time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

pub const API_URL_ENV: &str = "JOTBOOK_API_URL";
pub const TIMEOUT_ENV: &str = "JOTBOOK_TIMEOUT_SECS";

/// Where the backend lives and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    #[serde(with = "timeout_secs")]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Build a config for `api_base_url`, normalizing the URL.
    pub fn new(api_base_url: &str) -> Result<Self> {
        Ok(Self {
            api_base_url: normalize_base_url(api_base_url)?,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Apply optional raw overrides on top of `self`. Blank values are ignored.
    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<Self> {
        if let Some(url) = normalize_text_option(api_base_url) {
            self.api_base_url = normalize_base_url(&url)?;
        }
        if let Some(raw) = normalize_text_option(timeout_secs) {
            self.request_timeout = parse_timeout_secs(&raw)?;
        }
        Ok(self)
    }

    /// Absolute URL for `path` (which must start with `/`).
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

/// Trim, strip trailing slashes and require an http(s) scheme.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(Error::Config("API base URL must not be empty".to_string()));
    }
    if !is_http_url(base) {
        return Err(Error::Config(format!(
            "API base URL must include http:// or https:// (got '{base}')"
        )));
    }
    Ok(base.to_string())
}

fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::Config(format!(
            "request timeout must be a positive number of seconds (got '{raw}')"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url(" https://notes.example.com/ ").unwrap(),
            "https://notes.example.com"
        );
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("notes.example.com").is_err());
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let config = ClientConfig::default()
            .with_overrides(Some("  ".to_string()), None)
            .unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn overrides_apply_url_and_timeout() {
        let config = ClientConfig::default()
            .with_overrides(
                Some("http://127.0.0.1:9000/".to_string()),
                Some("3".to_string()),
            )
            .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.endpoint("/notes/get"), "http://127.0.0.1:9000/notes/get");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(ClientConfig::default()
            .with_overrides(None, Some("0".to_string()))
            .is_err());
    }

    #[test]
    fn serializes_timeout_as_seconds() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(json["request_timeout"], 15);
    }
}

//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jotbook_core::config::{API_URL_ENV, TIMEOUT_ENV};
use jotbook_core::util::normalize_text_option;
use jotbook_core::ClientConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

pub const PROFILE_ENV: &str = "JOTBOOK_PROFILE";
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("jotbook").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// `--profile`, then `$JOTBOOK_PROFILE`, then the active profile, then `default`.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(std::env::var(PROFILE_ENV).ok().as_deref()))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    /// Effective client config: built-in defaults, then this profile, then
    /// `$JOTBOOK_API_URL` / `$JOTBOOK_TIMEOUT_SECS`.
    pub fn client_config(&self) -> jotbook_core::Result<ClientConfig> {
        self.client_config_with_env(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    pub fn client_config_with_env(
        &self,
        api_url_env: Option<String>,
        timeout_env: Option<String>,
    ) -> jotbook_core::Result<ClientConfig> {
        let mut config = match &self.api_base_url {
            Some(url) => ClientConfig::new(url)?,
            None => ClientConfig::default(),
        };
        if let Some(secs) = self.timeout_secs.filter(|secs| *secs > 0) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.with_overrides(api_url_env, timeout_env)
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.clone());
        self.timeout_secs = self.timeout_secs.filter(|secs| *secs > 0);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" work ")).as_deref(), Some("work"));
    }

    #[test]
    fn config_roundtrip_preserves_profiles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some(" default ".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "default".to_string(),
            CliProfile {
                api_base_url: Some(" https://notes.example.com ".to_string()),
                timeout_secs: Some(0),
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.active_profile.as_deref(), Some("default"));
        let profile = loaded.profile("default").unwrap();
        assert_eq!(
            profile.api_base_url.as_deref(),
            Some("https://notes.example.com")
        );
        assert_eq!(profile.timeout_secs, None);
    }

    #[test]
    fn missing_config_file_is_empty() {
        let dir = tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_active() {
        let config = CliProfilesConfig {
            version: 1,
            active_profile: Some("work".to_string()),
            profiles: BTreeMap::new(),
        };
        assert_eq!(config.resolve_profile_name(Some("mobile")), "mobile");
        if std::env::var(PROFILE_ENV).is_err() {
            assert_eq!(config.resolve_profile_name(None), "work");
            assert_eq!(
                CliProfilesConfig::default().resolve_profile_name(Some("  ")),
                DEFAULT_PROFILE
            );
        }
    }

    #[test]
    fn client_config_layers_env_over_profile() {
        let profile = CliProfile {
            api_base_url: Some("https://notes.example.com/".to_string()),
            timeout_secs: Some(30),
        };

        let config = profile.client_config_with_env(None, None).unwrap();
        assert_eq!(config.api_base_url, "https://notes.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        let config = profile
            .client_config_with_env(Some("http://127.0.0.1:9000".to_string()), Some("5".to_string()))
            .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn client_config_rejects_bad_profile_url() {
        let profile = CliProfile {
            api_base_url: Some("notes.example.com".to_string()),
            timeout_secs: None,
        };
        assert!(profile.client_config_with_env(None, None).is_err());
    }

    #[test]
    fn client_config_keeps_defaults_for_empty_profile() {
        let config = CliProfile::default().client_config_with_env(None, None).unwrap();
        assert_eq!(config, ClientConfig::default());

        let timeout_only = CliProfile {
            api_base_url: None,
            timeout_secs: Some(45),
        };
        let config = timeout_only.client_config_with_env(None, None).unwrap();
        assert_eq!(config.api_base_url, jotbook_core::config::DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(45));
    }
}

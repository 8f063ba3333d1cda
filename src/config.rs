//! Configuration file parser for ~/.config/guardian/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`
//! pointing at localhost endpoints. Unknown keys are accepted by serde
//! but logged as potential typos.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid URL for `{key}`: {source}")]
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the report backend.
    pub api_url: String,

    /// Base URL of the chat inference endpoint.
    pub chat_url: String,

    /// Base URL of the identity provider.
    pub auth_url: String,

    /// Page size for report fetches.
    pub page_limit: u32,

    /// Default map center latitude when nothing is selected.
    pub map_center_lat: f64,

    /// Default map center longitude when nothing is selected.
    pub map_center_lng: f64,

    /// Default map zoom level.
    pub map_zoom: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            chat_url: "http://localhost:8001".to_string(),
            auth_url: "http://localhost:8000".to_string(),
            page_limit: 100,
            map_center_lat: 31.514722,
            map_center_lng: 34.454167,
            map_zoom: 10,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "api_url",
                "chat_url",
                "auth_url",
                "page_limit",
                "map_center_lat",
                "map_center_lng",
                "map_zoom",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), api_url = %config.api_url, "Loaded configuration");
        Ok(config)
    }

    pub fn api_base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_url).map_err(|source| ConfigError::InvalidUrl {
            key: "api_url",
            source,
        })
    }

    pub fn chat_base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.chat_url).map_err(|source| ConfigError::InvalidUrl {
            key: "chat_url",
            source,
        })
    }

    pub fn auth_base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.auth_url).map_err(|source| ConfigError::InvalidUrl {
            key: "auth_url",
            source,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.page_limit, 100);
        assert_eq!(config.map_zoom, 10);
        assert!(config.api_base().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/guardian_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_limit, 100);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("guardian_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "api_url = \"https://api.example.com/v1\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_url, "https://api.example.com/v1");
        assert_eq!(config.page_limit, 100); // default
        assert_eq!(config.map_zoom, 10); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("guardian_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_url_reports_key() {
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        let err = config.api_base().unwrap_err();
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("guardian_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "page_limit = 50\ntotally_fake_key = true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_limit, 50);

        std::fs::remove_dir_all(&dir).ok();
    }
}

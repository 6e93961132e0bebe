//! Configuration management for the SecureCode Vault client.
//!
//! Loads configuration from ${SCV_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::Language;

pub mod paths {
    //! Path resolution for configuration and data files.
    //!
    //! SCV_HOME resolution order:
    //! 1. SCV_HOME environment variable (if set)
    //! 2. ~/.config/scv (default)

    use std::path::PathBuf;

    /// Returns the client home directory.
    ///
    /// Checks SCV_HOME env var first, falls back to ~/.config/scv
    pub fn scv_home() -> PathBuf {
        if let Ok(home) = std::env::var("SCV_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".scv"),
            |h| h.join(".config").join("scv"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        scv_home().join("config.toml")
    }

    /// Returns the path to the persisted session token.
    pub fn auth_path() -> PathBuf {
        scv_home().join("auth.json")
    }

    /// Returns the directory holding log files.
    pub fn logs_dir() -> PathBuf {
        scv_home().join("logs")
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API
    pub api_base: String,

    /// Front-end origin used to build share links
    pub origin: String,

    /// Per-request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Language preselected in a fresh draft
    pub default_language: Language,

    /// Whether to probe `/health` on mount
    pub probe_health: bool,
}

impl Config {
    pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
    pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Returns the API base URL, honoring `SCV_API_BASE`.
    pub fn effective_api_base(&self) -> Result<String> {
        resolve_url(
            std::env::var("SCV_API_BASE").ok().as_deref(),
            Some(&self.api_base),
            Self::DEFAULT_API_BASE,
            "API base",
        )
    }

    /// Returns the share-link origin, honoring `SCV_ORIGIN`.
    pub fn effective_origin(&self) -> Result<String> {
        resolve_url(
            std::env::var("SCV_ORIGIN").ok().as_deref(),
            Some(&self.origin),
            Self::DEFAULT_ORIGIN,
            "origin",
        )
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: Self::DEFAULT_API_BASE.to_string(),
            origin: Self::DEFAULT_ORIGIN.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            default_language: Language::default(),
            probe_health: true,
        }
    }
}

/// Picks the first non-empty URL among env override, config value and default.
///
/// The chosen value is validated and returned without a trailing slash.
fn resolve_url(
    env_value: Option<&str>,
    config_value: Option<&str>,
    default_url: &str,
    label: &str,
) -> Result<String> {
    let chosen = [env_value, config_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(default_url);

    url::Url::parse(chosen).with_context(|| format!("Invalid {label} URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.default_language, Language::Python);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "origin = \"https://vault.example.com\"\ndefault_language = \"sql\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.origin, "https://vault.example.com");
        assert_eq!(config.default_language, Language::Sql);
        assert_eq!(config.api_base, Config::DEFAULT_API_BASE);
        assert!(config.probe_health);
    }

    #[test]
    fn test_load_rejects_unknown_language() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "default_language = \"cobol\"\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), None);
        assert_eq!(
            Config::default().request_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_resolve_url_prefers_env_then_config() {
        let url = resolve_url(
            Some("https://env.test/"),
            Some("https://config.test"),
            "http://default.test",
            "API base",
        )
        .unwrap();
        assert_eq!(url, "https://env.test");

        let url = resolve_url(
            Some("   "),
            Some("https://config.test"),
            "http://default.test",
            "API base",
        )
        .unwrap();
        assert_eq!(url, "https://config.test");

        let url = resolve_url(None, Some(""), "http://default.test", "API base").unwrap();
        assert_eq!(url, "http://default.test");
    }

    #[test]
    fn test_resolve_url_rejects_garbage() {
        let err = resolve_url(None, Some("not a url"), "http://default.test", "origin")
            .unwrap_err();
        assert!(err.to_string().contains("Invalid origin URL"));
    }
}

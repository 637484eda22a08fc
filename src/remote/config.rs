//! Configuration for the issue server connection and navigator defaults.
//!
//! Configuration is stored in `config.yaml` under the platform config
//! directory and includes:
//! - Server URL and credentials
//! - Page size, current user and favorite merge strategy
//!
//! Environment variables override the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";

/// How a favorite's stored query combines with explicit route pairs when a
/// route names the favorite by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Explicit pair `i` overlays stored pair `i`; extra stored pairs stay.
    #[default]
    Positional,
    /// Stored pairs first; an explicit pair replaces the stored pair of the
    /// same field.
    ByKey,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Issues requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Login used by "assign to me"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<String>,

    #[serde(default)]
    pub favorite_merge: MergeStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            login: None,
            password: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            current_user: None,
            favorite_merge: MergeStrategy::default(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "issuenav")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .ok_or_else(|| NavigatorError::Config("cannot locate a config directory".to_string()))
    }

    /// Load configuration from the default location, then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a file, or return default if not found
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables win over the file.
    pub fn apply_env(&mut self) {
        if let Some(url) = non_empty_var("ISSUENAV_URL") {
            self.server.url = url;
        }
        if let Some(login) = non_empty_var("ISSUENAV_LOGIN") {
            self.server.login = Some(login);
        }
        if let Some(password) = non_empty_var("ISSUENAV_PASSWORD") {
            self.server.password = Some(password);
        }
        if let Some(user) = non_empty_var("ISSUENAV_USER") {
            self.current_user = Some(user);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(NavigatorError::Config(
                "page_size must be greater than 0".to_string(),
            ));
        }
        url::Url::parse(&self.server.url).map_err(|e| {
            NavigatorError::Config(format!("invalid server url '{}': {}", self.server.url, e))
        })?;
        Ok(())
    }

    /// Password as a secret, so it never ends up in debug output.
    pub fn password(&self) -> Option<SecretString> {
        self.server
            .password
            .as_ref()
            .map(|p| SecretString::from(p.clone()))
    }

    /// User acting on "assign to me"; falls back to the login.
    pub fn acting_user(&self) -> Option<&str> {
        self.current_user
            .as_deref()
            .or(self.server.login.as_deref())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        // SAFETY: tests touching the environment are serialized.
        unsafe {
            env::remove_var("ISSUENAV_URL");
            env::remove_var("ISSUENAV_LOGIN");
            env::remove_var("ISSUENAV_PASSWORD");
            env::remove_var("ISSUENAV_USER");
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.server.url, DEFAULT_SERVER_URL);
        assert_eq!(config.favorite_merge, MergeStrategy::Positional);
        assert!(config.current_user.is_none());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_file(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.server.url = "https://sonar.example.com".to_string();
        config.server.login = Some("jane".to_string());
        config.page_size = 25;
        config.favorite_merge = MergeStrategy::ByKey;
        config.save(&path).unwrap();

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded.server.url, "https://sonar.example.com");
        assert_eq!(loaded.page_size, 25);
        assert_eq!(loaded.favorite_merge, MergeStrategy::ByKey);
        assert_eq!(loaded.acting_user(), Some("jane"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "favorite_merge: by_key\n").unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.server.url, DEFAULT_SERVER_URL);
        assert_eq!(config.favorite_merge, MergeStrategy::ByKey);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        fs::write(&path, "page_size: 0\n").unwrap();
        assert!(Config::load_file(&path).is_err());

        fs::write(&path, "server:\n  url: not a url\n").unwrap();
        assert!(Config::load_file(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        // SAFETY: serialized with the other environment tests.
        unsafe {
            env::set_var("ISSUENAV_URL", "https://env.example.com");
            env::set_var("ISSUENAV_USER", "bob");
            env::set_var("ISSUENAV_LOGIN", "");
        }

        let mut config = Config::default();
        config.server.login = Some("jane".to_string());
        config.apply_env();

        assert_eq!(config.server.url, "https://env.example.com");
        assert_eq!(config.server.login.as_deref(), Some("jane"));
        assert_eq!(config.acting_user(), Some("bob"));
        clear_env();
    }
}

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEARCH_DEBOUNCE_MS,
    LOGIN_PATH, SERVER_API_URL,
};
use crate::error::{AppError, AppResult};
use crate::utils::env_utils::{read_env, read_env_u64};

/// Where the credential is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// OS credential vault
    #[default]
    Keyring,
    /// JSON file under the user config directory
    File,
    /// Process lifetime only
    Memory,
}

impl FromStr for StorageMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            "memory" | "session" => Ok(Self::Memory),
            other => Err(AppError::ConfigError(format!(
                "Unknown token storage mode '{other}', expected keyring, file or memory"
            ))),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Keyring => "keyring",
            Self::File => "file",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub api_url: String,
    pub storage_mode: StorageMode,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub login_path: String,
    pub search_debounce_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_url: SERVER_API_URL.to_string(),
            storage_mode: StorageMode::default(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            login_path: LOGIN_PATH.to_string(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

impl RuntimeConfig {
    /// Build the configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let storage_raw = read_env("TOKEN_STORAGE", &defaults.storage_mode.to_string());
        let storage_mode = storage_raw.parse().unwrap_or_else(|e| {
            warn!("{e}; falling back to {}", defaults.storage_mode);
            defaults.storage_mode
        });

        let config = Self {
            api_url: read_env("API_URL", &defaults.api_url),
            storage_mode,
            connect_timeout_secs: read_env_u64("CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            request_timeout_secs: read_env_u64("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            login_path: defaults.login_path,
            search_debounce_ms: read_env_u64("SEARCH_DEBOUNCE_MS", defaults.search_debounce_ms),
        };

        info!(
            "Runtime config: api_url={}, storage={}",
            config.api_url, config.storage_mode
        );
        config
    }

    /// Check the values a client cannot work without.
    pub fn validate(&self) -> AppResult<()> {
        let url = Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "API URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "Request timeout must be greater than zero".to_string(),
            ));
        }
        if !self.login_path.starts_with('/') {
            return Err(AppError::ConfigError(format!(
                "Login path must be absolute, got '{}'",
                self.login_path
            )));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed, ready for `format!("{base}{endpoint}")`.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// For a process that runs a single command: no later search can
    /// supersede the first, so waiting out the debounce only adds latency.
    #[must_use]
    pub const fn for_single_command(mut self) -> Self {
        self.search_debounce_ms = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base(), "http://localhost:8080");
        assert_eq!(config.storage_mode, StorageMode::Keyring);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = RuntimeConfig {
            api_url: "https://api.indhive.dev/".to_string(),
            ..RuntimeConfig::default()
        };
        assert_eq!(config.api_base(), "https://api.indhive.dev");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = RuntimeConfig {
            api_url: "ftp://example.com".to_string(),
            ..RuntimeConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_single_command_drops_search_debounce() {
        let config = RuntimeConfig {
            api_url: "https://api.indhive.dev".to_string(),
            ..RuntimeConfig::default()
        }
        .for_single_command();
        assert_eq!(config.search_debounce(), Duration::ZERO);
        assert_eq!(config.api_url, "https://api.indhive.dev");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_mode_parsing() {
        assert_eq!("FILE".parse::<StorageMode>(), Ok(StorageMode::File));
        assert_eq!("session".parse::<StorageMode>(), Ok(StorageMode::Memory));
        assert!("cookie".parse::<StorageMode>().is_err());
    }
}

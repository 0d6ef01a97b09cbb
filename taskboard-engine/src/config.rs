//! Sync configuration loaded with figment
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. A TOML file (`taskboard.toml` in the working directory unless a path is given)
//! 3. Environment variables prefixed `TASKBOARD_` (e.g. `TASKBOARD_BASE_URL`)

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "taskboard.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TASKBOARD_";

/// Settings for talking to the board backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root of the REST API; endpoint paths are joined onto it
    pub base_url: String,
    /// Per-request timeout for the HTTP backend
    pub request_timeout_ms: u64,
    /// Pending updates older than this are reported as stale
    pub confirm_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            request_timeout_ms: 10_000,
            confirm_timeout_ms: 30_000,
            user_agent: format!("taskboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SyncConfig {
    /// Load from defaults, `taskboard.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE_NAME)
    }

    /// Load using an explicit config file path. A missing file is skipped.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading sync configuration");
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
    }

    /// Reject values that would make the backend unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url".into(),
                message: "must not be empty".into(),
            });
        }
        let url = Url::parse(self.base_url.trim()).map_err(|err| ConfigError::InvalidValue {
            field: "base_url".into(),
            message: format!("'{}' is not a URL: {}", self.base_url, err),
        })?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(ConfigError::InvalidValue {
                field: "base_url".into(),
                message: format!("'{}' is not an http(s) URL with a host", self.base_url),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Age after which a pending optimistic update counts as stale
    pub fn confirm_timeout(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::milliseconds(i64::try_from(self.confirm_timeout_ms).unwrap_or(i64::MAX))
    }
}

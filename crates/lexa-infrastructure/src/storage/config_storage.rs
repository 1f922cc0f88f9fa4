//! Client configuration storage.
//!
//! Loads `ClientConfig` from a TOML file and layers environment overrides on
//! top: defaults < file < environment.

use lexa_core::error::{LexaError, Result};
use lexa_core::ClientConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::LexaPaths;

pub const ENV_BASE_URL: &str = "LEXA_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "LEXA_TIMEOUT_SECS";
pub const ENV_DOWNLOAD_DIR: &str = "LEXA_DOWNLOAD_DIR";
pub const ENV_USER_AGENT: &str = "LEXA_USER_AGENT";

/// Storage for the client configuration file (config.toml).
///
/// Read-only: lexa never writes its own config.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage reading the default path (~/.config/lexa/config.toml).
    pub fn new() -> Result<Self> {
        let path = LexaPaths::config_file().map_err(|e| LexaError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a storage with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file only, without environment overrides.
    ///
    /// A missing or empty file yields the defaults.
    pub fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[Config] No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            LexaError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Loads the file and applies process environment overrides.
    pub fn load(&self) -> Result<ClientConfig> {
        let config = self.load_file()?;
        apply_env_overrides(config, |key| std::env::var(key).ok())
    }
}

/// Applies `LEXA_*` overrides read through `lookup`.
///
/// # Errors
///
/// Returns a `Config` error when `LEXA_TIMEOUT_SECS` is not a number.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(base_url) = get(ENV_BASE_URL) {
        config.base_url = base_url;
    }
    if let Some(timeout) = get(ENV_TIMEOUT_SECS) {
        let secs = timeout.trim().parse::<u64>().map_err(|_| {
            LexaError::config(format!(
                "{} must be a number of seconds, got '{}'",
                ENV_TIMEOUT_SECS, timeout
            ))
        })?;
        // Zero disables the timeout.
        config.request_timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(dir) = get(ENV_DOWNLOAD_DIR) {
        config.download_dir = PathBuf::from(dir);
    }
    if let Some(user_agent) = get(ENV_USER_AGENT) {
        config.user_agent = user_agent;
    }

    Ok(config)
}

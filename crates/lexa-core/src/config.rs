//! Client configuration.
//!
//! Loaded by `lexa-infrastructure` from `config.toml` plus environment overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default backend address used by a local development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("lexa/", env!("CARGO_PKG_VERSION"));

/// Settings for talking to the drafting backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend root, without trailing slash (e.g. `http://localhost:8000`).
    pub base_url: String,
    /// Per-request timeout in seconds. `None` or `0` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Directory where downloaded contracts are saved.
    pub download_dir: PathBuf,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            download_dir: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// The per-request timeout; `None` or `0` seconds means no timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Joins an endpoint path onto the base URL.
    ///
    /// Tolerates a trailing slash on the base and a missing leading slash on the path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let config = ClientConfig::with_base_url("http://api.example.com/");
        assert_eq!(config.endpoint("/contract"), "http://api.example.com/contract");
        assert_eq!(config.endpoint("users/me"), "http://api.example.com/users/me");
    }

    #[test]
    fn test_default_has_no_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let config: ClientConfig = toml::from_str("request_timeout_secs = 0").unwrap();
        assert_eq!(config.request_timeout_secs, Some(0));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("request_timeout_secs = 45").unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.download_dir, PathBuf::from("."));
    }
}

//! Client Configuration
//!
//! Defaults can be overridden from the environment (a `.env` file is loaded
//! by the binary before `ClientConfig::from_env` runs).

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/sanatanisher01/Healthcare-symptoms";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the remote service, without a trailing slash.
    pub base_url: String,
    /// Repository the visitor is asked to star.
    pub repository_url: String,
    pub verify_timeout: Duration,
    pub check_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            verify_timeout: Duration::from_secs(20),
            check_timeout: Duration::from_secs(45),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("MediCheck-Client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("MEDICHECK_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "MEDICHECK_BASE_URL",
                reason: format!("'{}' is not an http(s) URL", base_url),
            });
        }

        let config = Self {
            base_url,
            repository_url: lookup("MEDICHECK_REPOSITORY_URL").unwrap_or(defaults.repository_url),
            verify_timeout: secs(&lookup, "MEDICHECK_VERIFY_TIMEOUT_SECS", defaults.verify_timeout)?,
            check_timeout: secs(&lookup, "MEDICHECK_CHECK_TIMEOUT_SECS", defaults.check_timeout)?,
            connect_timeout: secs(&lookup, "MEDICHECK_CONNECT_TIMEOUT_SECS", defaults.connect_timeout)?,
            user_agent: lookup("MEDICHECK_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        info!("Using analysis service at {}", config.base_url);
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn secs<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => {
            debug!("{key} not set, using default: {}s", default.as_secs());
            Ok(default)
        }
        Some(raw) => {
            let value: u64 = parse(key, &raw)?;
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            Ok(Duration::from_secs(value))
        }
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.verify_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("MEDICHECK_BASE_URL", "https://medicheck.example.com/"),
            ("MEDICHECK_CHECK_TIMEOUT_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://medicheck.example.com");
        assert_eq!(config.check_timeout, Duration::from_secs(90));
        assert_eq!(config.endpoint("/verify-star"), "https://medicheck.example.com/verify-star");
    }

    #[test]
    fn test_invalid_timeout() {
        let err = ClientConfig::from_lookup(lookup_from(&[("MEDICHECK_VERIFY_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MEDICHECK_VERIFY_TIMEOUT_SECS", .. }));

        let zero = ClientConfig::from_lookup(lookup_from(&[("MEDICHECK_CONNECT_TIMEOUT_SECS", "0")]));
        assert!(zero.is_err());
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(ClientConfig::from_lookup(lookup_from(&[("MEDICHECK_BASE_URL", "ftp://host")])).is_err());
    }
}

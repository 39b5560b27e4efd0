//! # Controller Configuration
//!
//! Where the controller lives and how to authenticate against it.
//!
//! ## Environment Variables
//!
//! ### `HOMEASSISTANT_URL`
//!
//! Base URL of the controller, e.g. `http://homeassistant.local:8123`. A
//! trailing `/` is ignored and `/api` is appended unless already present.
//!
//! ### `HOMEASSISTANT_TOKEN`
//!
//! Long-lived access token, sent as a bearer token.
//!
//! Both are required. Missing values are reported before any network call.
//!
//! ## Usage
//!
//! ```rust
//! use hatyper::config::ControllerConfig;
//!
//! let config = ControllerConfig::new(Some("http://ha.local:8123/"), Some("secret")).unwrap();
//! assert_eq!(config.api_url().as_str(), "http://ha.local:8123/api");
//! ```

use std::env;
use std::fmt;
use url::Url;

pub const URL_ENV: &str = "HOMEASSISTANT_URL";
pub const TOKEN_ENV: &str = "HOMEASSISTANT_TOKEN";

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent or empty
    Missing {
        /// Environment variable that would provide it
        variable: &'static str,
    },
    /// The base URL cannot be parsed
    InvalidUrl {
        url: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { variable } => write!(
                f,
                "Configuration error: {variable} is not set. \
                Set the environment variable or pass the matching command-line option."
            ),
            ConfigError::InvalidUrl { url, reason } => {
                write!(f, "Configuration error: invalid controller URL '{url}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Connection settings for the controller's REST API
#[derive(Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    api_url: Url,
    token: String,
}

impl ControllerConfig {
    /// Validate and normalize explicit settings. Empty strings count as missing.
    pub fn new(url: Option<&str>, token: Option<&str>) -> Result<Self, ConfigError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing { variable: URL_ENV })?;
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing { variable: TOKEN_ENV })?;
        Ok(ControllerConfig {
            api_url: normalize_api_url(url)?,
            token: token.to_string(),
        })
    }

    /// Load from `HOMEASSISTANT_URL` and `HOMEASSISTANT_TOKEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var(URL_ENV).ok();
        let token = env::var(TOKEN_ENV).ok();
        Self::new(url.as_deref(), token.as_deref())
    }

    /// `<base>/api`, without a trailing slash
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("api_url", &self.api_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

fn normalize_api_url(raw: &str) -> Result<Url, ConfigError> {
    let base = raw.trim_end_matches('/');
    let full = if base.ends_with("/api") {
        base.to_string()
    } else {
        format!("{base}/api")
    };
    let url = Url::parse(&full).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

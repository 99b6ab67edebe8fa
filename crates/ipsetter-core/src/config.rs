//! Configuration types for ipsetter
//!
//! The configuration is plain data read from a JSON file. Credentials are
//! derived from it separately (see [`crate::credentials`]).
//!
//! ```json
//! {
//!   "access_token": "dop_v1_...",
//!   "dns_config": { "domain": "example.com", "name": "home", "ttl": 1800 },
//!   "ip_source_url": "http://checkip.amazonaws.com/",
//!   "state_path": "/var/lib/ipsetter/state.json"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable that overrides `access_token`
pub const ACCESS_TOKEN_ENV: &str = "IPSETTER_ACCESS_TOKEN";

/// Default public IP echo service
pub const DEFAULT_IP_SOURCE_URL: &str = "http://checkip.amazonaws.com/";

/// Main configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider API token
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub access_token: String,

    /// The record to keep up to date
    pub dns_config: DnsConfig,

    /// URL answering with the caller's public IP as plain text
    #[serde(default = "default_ip_source_url")]
    pub ip_source_url: String,

    /// Where to remember the identifier of the record last written.
    /// Unset means every run lists the domain.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

// Custom Debug implementation that hides the access token
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &"<REDACTED>")
            .field("dns_config", &self.dns_config)
            .field("ip_source_url", &self.ip_source_url)
            .field("state_path", &self.state_path)
            .finish()
    }
}

/// The DNS record that will be kept pointed at this host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Domain the record lives in (e.g. "example.com")
    pub domain: String,
    /// Record name relative to the domain (e.g. "home")
    pub name: String,
    /// TTL in seconds
    pub ttl: u32,
}

impl Config {
    /// Read, override from the environment, and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read a config file without validating it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_json(&content).map_err(|e| match e {
            Error::Json(json) => Error::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                json
            )),
            other => other,
        })
    }

    /// Parse a config document without validating it
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Replace the access token with `IPSETTER_ACCESS_TOKEN` when it is set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            self.apply_token_override(token);
        }
    }

    fn apply_token_override(&mut self, token: String) {
        let token = token.trim();
        if !token.is_empty() {
            self.access_token = token.to_string();
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(Error::config(format!(
                "access token must be specified in config or via {ACCESS_TOKEN_ENV}"
            )));
        }
        if self.dns_config.domain.is_empty() {
            return Err(Error::config("domain must be specified in config"));
        }
        if self.dns_config.name.is_empty() {
            return Err(Error::config("name must be specified in config"));
        }
        if self.dns_config.ttl == 0 {
            return Err(Error::config("ttl must be specified in config"));
        }
        if self.ip_source_url.is_empty() {
            return Err(Error::config("ip_source_url cannot be empty"));
        }
        if !self.ip_source_url.starts_with("https://") && !self.ip_source_url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "ip_source_url must use HTTP or HTTPS scheme. Got: {}",
                self.ip_source_url
            )));
        }
        if let Some(path) = &self.state_path {
            if path.as_os_str().is_empty() {
                return Err(Error::config("state_path cannot be empty when set"));
            }
        }

        Ok(())
    }
}

fn default_ip_source_url() -> String {
    DEFAULT_IP_SOURCE_URL.to_string()
}

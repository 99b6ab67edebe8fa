//! Credential providers
//!
//! Providers ask a [`TokenSource`] for the bearer token on every request
//! instead of holding configuration themselves.

use crate::config::Config;
use crate::error::{Error, Result};

/// Supplies the bearer token for provider API calls
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Result<String>;
}

/// A fixed token, typically taken from [`Config::access_token`]
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Fails on an empty token so a provider is never built without one
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("access token cannot be empty"));
        }
        Ok(Self { token })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.access_token.clone())
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"<REDACTED>")
            .finish()
    }
}

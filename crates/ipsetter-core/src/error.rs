//! Error types for ipsetter
//!
//! Provider implementations return the low-level variants (`Http`,
//! `Authentication`, `NotFound`, ...). The setter wraps them into the
//! phase-level variants (`ProviderList`, `ProviderFetch`, `ProviderWrite`)
//! so the caller can tell which step of the pass failed and for what target.

use std::fmt;

use thiserror::Error;

/// Result type alias for ipsetter operations
pub type Result<T> = std::result::Result<T, Error>;

/// The write call a `ProviderWrite` error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Edit,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteAction::Create => "create",
            WriteAction::Edit => "edit",
        })
    }
}

/// Core error type for ipsetter
#[derive(Error, Debug)]
pub enum Error {
    /// The public IP could not be obtained or parsed
    #[error("Could not discover public IP: {0}")]
    Discovery(String),

    /// Listing the domain's records failed
    #[error("Could not list records for domain {domain}: {source}")]
    ProviderList {
        domain: String,
        #[source]
        source: Box<Error>,
    },

    /// Fetching a single remembered record failed for a reason other than not-found
    #[error("Could not fetch record {id} in domain {domain}: {source}")]
    ProviderFetch {
        domain: String,
        id: String,
        #[source]
        source: Box<Error>,
    },

    /// A create or edit call failed
    #[error("Could not {action} record '{name}' in domain {domain}: {source}")]
    ProviderWrite {
        action: WriteAction,
        domain: String,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// The provider answered in a way none of the known outcomes covers
    #[error("Unknown outcome: {0}")]
    UnknownOutcome(String),

    /// Record (or domain) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an unknown outcome error
    pub fn unknown_outcome(msg: impl Into<String>) -> Self {
        Self::UnknownOutcome(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Wrap a listing failure with its domain
    pub fn list_failed(domain: impl Into<String>, source: Error) -> Self {
        Self::ProviderList {
            domain: domain.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a single-record fetch failure with its target
    pub fn fetch_failed(domain: impl Into<String>, id: impl Into<String>, source: Error) -> Self {
        Self::ProviderFetch {
            domain: domain.into(),
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a create/edit failure with its target
    pub fn write_failed(
        action: WriteAction,
        domain: impl Into<String>,
        name: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::ProviderWrite {
            action,
            domain: domain.into(),
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// True for a bare provider "not found" answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True if this error, or the provider error it wraps, is an unknown outcome
    pub fn is_unknown_outcome(&self) -> bool {
        match self {
            Self::UnknownOutcome(_) => true,
            Self::ProviderList { source, .. }
            | Self::ProviderFetch { source, .. }
            | Self::ProviderWrite { source, .. } => source.is_unknown_outcome(),
            _ => false,
        }
    }
}

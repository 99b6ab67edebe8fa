// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for ipsetter.
//
// ## Architecture
//
// GETs a plain-text echo service (default `http://checkip.amazonaws.com/`)
// that answers with the caller's public address, trims it and parses it.
// One request per `current()` call: no polling, no caching.

use ipsetter_core::traits::{IpSource, IpVersion};
use ipsetter_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

pub use ipsetter_core::config::DEFAULT_IP_SOURCE_URL;

/// Default HTTP timeout for the echo request (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Only accept addresses of this version (None = either)
    version: Option<IpVersion>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL answering with a bare IP (e.g., "http://checkip.amazonaws.com/")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            version: None,
            client,
        })
    }

    /// Reject answers of any other IP version
    pub fn with_version(mut self, version: IpVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the raw answer of the echo service
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::discovery(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::discovery(format!(
                "{} answered with HTTP {}",
                self.url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::discovery(format!("Failed to read response from {}: {}", self.url, e)))
    }
}

/// Parse an echo-service answer, enforcing `version` if set
fn parse_ip(text: &str, version: Option<IpVersion>) -> Result<IpAddr> {
    let text = text.trim();
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::discovery(format!("Invalid IP address: '{}'", text)))?;

    match version {
        Some(expected) if IpVersion::of(&ip) != expected => Err(Error::discovery(format!(
            "Expected {:?} address, got: {}",
            expected, ip
        ))),
        _ => Ok(ip),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let body = self.fetch().await?;
        let ip = parse_ip(&body, self.version)?;
        tracing::debug!(url = %self.url, ip = %ip, "Fetched public IP");
        Ok(ip)
    }

    fn version(&self) -> Option<IpVersion> {
        self.version
    }
}

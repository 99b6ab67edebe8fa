// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP echo services: `ipsetter-ip-http` crate

use async_trait::async_trait;
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of a concrete address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Trait for public IP discovery
///
/// One call, one answer: implementations do not poll, watch or cache across
/// calls.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error::Discovery)`: If the address is unavailable or malformed
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the IP version this source is restricted to
    ///
    /// Returns `None` if the implementation answers with either version.
    fn version(&self) -> Option<IpVersion> {
        None
    }
}

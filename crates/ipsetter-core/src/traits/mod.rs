//! Core traits for ipsetter
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: List, fetch, create and edit DNS records
//! - [`StateStore`]: Remember the identifier of the record last written

pub mod dns_provider;
pub mod ip_source;
pub mod state_store;

pub use dns_provider::DnsProvider;
pub use ip_source::{IpSource, IpVersion};
pub use state_store::{StateRecord, StateStore, state_key};

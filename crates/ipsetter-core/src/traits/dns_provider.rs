// # DNS Provider Trait
//
// Defines the capability the record setter needs from a DNS provider.
//
// ## Implementations
//
// - DigitalOcean: `ipsetter-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use ipsetter_core::DnsProvider;
//
// let records = provider.list_records("example.com").await?;
// for record in &records {
//     println!("{} {} {}", record.record_type, record.name, record.data);
// }
// ```

use async_trait::async_trait;

use crate::record::{EditRequest, RecordId, RemoteRecord};

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - `list_records` returns the **complete** listing. If the provider
///   paginates, the implementation drains every page before returning; a
///   partial listing would make the resolver create duplicates.
/// - `get_record` fails with `Error::NotFound` (and nothing else) when the
///   provider answers "no such record". The setter relies on that to fall
///   back to creation.
/// - Each method performs its calls and returns. No retries, no backoff, no
///   caching between calls; the caller decides what a failure means.
/// - A response that claims success but cannot be interpreted is reported as
///   `Error::UnknownOutcome`.
///
/// # Security
///
/// Implementations must never log or `Debug`-print their credential.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record of `domain`, in the provider's listing order
    async fn list_records(&self, domain: &str) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Fetch a single record by identifier
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteRecord)`: The record as it exists now
    /// - `Err(Error::NotFound)`: The identifier no longer denotes a live record
    /// - `Err(Error)`: Any other failure
    async fn get_record(&self, domain: &str, id: &RecordId)
    -> Result<RemoteRecord, crate::Error>;

    /// Create a new record, returning it with its provider-assigned identifier
    async fn create_record(
        &self,
        domain: &str,
        request: &EditRequest,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Edit the record `id`, returning the record as the provider now holds it
    async fn edit_record(
        &self,
        domain: &str,
        id: &RecordId,
        request: &EditRequest,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

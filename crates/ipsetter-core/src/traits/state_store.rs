// # State Store Trait
//
// Remembers which provider record a previous run wrote, so the next run can
// fetch that single record instead of listing the whole domain.
//
// The remembered identifier is a hint only. It can be stale (record deleted
// or replaced out of band) and the setter treats it that way: a not-found
// answer falls through to creation, a mismatching record falls back to a
// full listing. Nothing in the store is needed for a correct pass.
//
// ## Implementations
//
// - File-based: `FileStateStore` (JSON, atomic writes, backup recovery)
// - In-memory: `MemoryStateStore`

use async_trait::async_trait;
use std::net::IpAddr;

use crate::record::RecordId;

/// What a previous run observed for one record
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// Identifier of the record last created or updated
    pub record_id: RecordId,
    /// The IP that was written
    pub last_ip: IpAddr,
    /// Timestamp of the write
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Create a state record stamped with the current time
    pub fn new(record_id: RecordId, last_ip: IpAddr) -> Self {
        Self {
            record_id,
            last_ip,
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Key under which a record is remembered: `"{name}.{domain}"`
pub fn state_key(domain: &str, name: &str) -> String {
    format!("{name}.{domain}")
}

/// Trait for state store implementations
///
/// # Implementation Guidelines
///
/// - **Async I/O only**: use async file operations, never blocking I/O
/// - **Explicit flush**: `flush()` must persist all pending changes
/// - **No background tasks**
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the state record stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The stored record
    /// - `Ok(None)`: Nothing stored
    /// - `Err(Error)`: Storage error
    async fn get_record(&self, key: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Store (create or replace) the state record for `key`
    async fn set_record(&self, key: &str, record: &StateRecord) -> Result<(), crate::Error>;

    /// Delete the state record for `key` (no error if absent)
    async fn delete_record(&self, key: &str) -> Result<(), crate::Error>;

    /// List all keys in the store
    async fn list_records(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

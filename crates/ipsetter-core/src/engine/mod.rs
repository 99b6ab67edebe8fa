//! One-shot pass engine
//!
//! The Engine ties the pieces of a single run together:
//! - Discovering the public IP via IpSource
//! - Looking up the remembered record identifier in the optional StateStore
//! - Setting the record via RecordSetter
//! - Remembering the identifier of the current record for the next run
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌──────────────┐      ┌──────────────┐
//! │  IpSource   │─ ip ▶│    Engine    │─────▶│ RecordSetter │──▶ DnsProvider
//! └─────────────┘      └──────────────┘      └──────────────┘
//!                             │ ▲
//!                   remember  ▼ │  hint
//!                      ┌──────────────┐
//!                      │  StateStore  │ (optional)
//!                      └──────────────┘
//! ```
//!
//! The store only ever saves a listing. It is written when the pass wrote a
//! record or the current record differs from the hint. Failing to read or
//! write it is logged and otherwise ignored.

use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::RecordId;
use crate::setter::{Outcome, RecordSetter};
use crate::traits::{IpSource, StateRecord, StateStore, state_key};

/// What one pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// The IP the record was reconciled against
    pub ip: IpAddr,
    /// What the setter did with it
    pub outcome: Outcome,
}

/// Runs one reconciliation pass for a single record
pub struct Engine {
    /// Source of the public IP
    ip_source: Box<dyn IpSource>,

    /// Setter bound to a DNS provider and TTL
    setter: RecordSetter,

    /// Remembered identifiers, if persistence is configured
    state_store: Option<Box<dyn StateStore>>,

    domain: String,
    name: String,
}

impl Engine {
    /// Create an engine for the A record `name` in `domain`
    pub fn new(
        ip_source: Box<dyn IpSource>,
        setter: RecordSetter,
        domain: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            ip_source,
            setter,
            state_store: None,
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// Remember current record identifiers in `store`
    pub fn with_state_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discover the IP and point the record at it.
    ///
    /// Errors from discovery and from the setter end the pass; store errors
    /// never do.
    pub async fn run_once(&self) -> Result<PassReport> {
        let ip = self.discover().await?;
        let outcome = self.reconcile(ip).await?;
        Ok(PassReport { ip, outcome })
    }

    /// First half of [`run_once`](Self::run_once): ask the IP source
    pub async fn discover(&self) -> Result<IpAddr> {
        let ip = self.ip_source.current().await?;
        info!(
            domain = %self.domain,
            name = %self.name,
            ip = %ip,
            "Discovered public IP"
        );
        Ok(ip)
    }

    /// Second half of [`run_once`](Self::run_once): point the record at `ip`
    pub async fn reconcile(&self, ip: IpAddr) -> Result<Outcome> {
        let key = state_key(&self.domain, &self.name);
        let hint = self.remembered_id(&key).await;

        let outcome = self
            .setter
            .set_ip_with_hint(&self.domain, &self.name, ip, hint.as_ref())
            .await?;

        // A current record found by listing becomes the hint for the next pass
        let id = outcome.record_id();
        if outcome.wrote() || hint.as_ref() != Some(id) {
            self.remember(&key, id, ip).await;
        }

        if let Some(store) = &self.state_store {
            if let Err(e) = store.flush().await {
                warn!("Failed to flush state store: {}", e);
            }
        }

        Ok(outcome)
    }

    async fn remembered_id(&self, key: &str) -> Option<RecordId> {
        let store = self.state_store.as_ref()?;
        match store.get_record(key).await {
            Ok(Some(record)) => {
                debug!(key, record_id = %record.record_id, "Using remembered record");
                Some(record.record_id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read state for {}, listing instead: {}", key, e);
                None
            }
        }
    }

    async fn remember(&self, key: &str, id: &RecordId, ip: IpAddr) {
        let Some(store) = &self.state_store else {
            return;
        };

        let record = StateRecord::new(id.clone(), ip);
        if let Err(e) = store.set_record(key, &record).await {
            warn!("Record is current but state for {} not saved: {}", key, e);
        }
    }
}

//! Record setter
//!
//! One reconciliation pass against a [`DnsProvider`]:
//!
//! 1. Read the current remote state (full listing, or one remembered record)
//! 2. Ask the [`resolver`](crate::resolver) what to do
//! 3. Perform at most one write (create XOR edit)
//!
//! Provider failures are wrapped with the phase and target that failed and
//! returned as-is. The only failure that is not an error is "not found" on a
//! remembered identifier, which means the record has to be created again.

use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::error::{Error, Result, WriteAction};
use crate::record::{DesiredState, EditRequest, RecordId, RemoteRecord};
use crate::resolver::{Decision, resolve};
use crate::traits::DnsProvider;

/// Result of a successful reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No A record with the name existed; this one was created
    Created(RemoteRecord),
    /// `previous` carried other data and was edited into `current`
    Updated {
        previous: RemoteRecord,
        current: RemoteRecord,
    },
    /// This record already pointed at the IP; nothing was written
    AlreadyCurrent(RemoteRecord),
}

impl Outcome {
    /// The record that now points at the IP
    pub fn record(&self) -> &RemoteRecord {
        match self {
            Outcome::Created(record) | Outcome::AlreadyCurrent(record) => record,
            Outcome::Updated { current, .. } => current,
        }
    }

    /// Identifier of the record that now points at the IP
    pub fn record_id(&self) -> &RecordId {
        &self.record().id
    }

    /// True if the pass performed a write
    pub fn wrote(&self) -> bool {
        !matches!(self, Outcome::AlreadyCurrent(_))
    }
}

/// Where the remote state of a pass came from
enum RemoteView {
    Listing(Vec<RemoteRecord>),
    Remembered(RemoteRecord),
    Gone,
}

/// Sets an A record through a [`DnsProvider`]
pub struct RecordSetter {
    /// DNS provider to read and write records with
    provider: Box<dyn DnsProvider>,

    /// TTL applied to every record this setter writes
    ttl: u32,
}

impl RecordSetter {
    /// Create a setter writing records with the given TTL
    pub fn new(provider: Box<dyn DnsProvider>, ttl: u32) -> Self {
        Self { provider, ttl }
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Point the A record `name` in `domain` at `ip`.
    ///
    /// If records already exist for `name`, only the first one carrying a
    /// different IP is edited. If all of them carry `ip`, nothing is written.
    pub async fn set_ip(&self, domain: &str, name: &str, ip: IpAddr) -> Result<Outcome> {
        self.set_ip_with_hint(domain, name, ip, None).await
    }

    /// Like [`set_ip`](Self::set_ip), starting from a remembered record identifier.
    ///
    /// The remembered record is fetched instead of listing the domain. If the
    /// provider no longer knows it, a fresh record is created. If it now
    /// denotes something other than the A record `name`, the hint is dropped
    /// and the domain is listed.
    pub async fn set_ip_with_hint(
        &self,
        domain: &str,
        name: &str,
        ip: IpAddr,
        remembered: Option<&RecordId>,
    ) -> Result<Outcome> {
        let desired = DesiredState::new(domain, name, ip, self.ttl)?;

        let view = match remembered {
            Some(id) => self.fetch_remembered(&desired, id).await?,
            None => RemoteView::Listing(self.list(&desired).await?),
        };

        self.reconcile(&desired, view).await
    }

    /// Run the resolver over a remote view and perform the resulting write
    async fn reconcile(&self, desired: &DesiredState, view: RemoteView) -> Result<Outcome> {
        let proposed = desired.proposed_value();
        let records = match view {
            RemoteView::Listing(records) => records,
            RemoteView::Remembered(record) => vec![record],
            RemoteView::Gone => Vec::new(),
        };

        match resolve(&records, desired.name(), &proposed) {
            Decision::NeedsCreate => {
                let created = self.create(desired).await?;
                Ok(Outcome::Created(created))
            }
            Decision::NeedsUpdate(target) => {
                let current = self.update(desired, target).await?;
                Ok(Outcome::Updated {
                    previous: target.clone(),
                    current,
                })
            }
            Decision::AlreadyCurrent(current) => {
                info!(
                    domain = desired.domain(),
                    name = desired.name(),
                    record_id = %current.id,
                    ip = %desired.ip(),
                    "Record already up to date"
                );
                Ok(Outcome::AlreadyCurrent(current.clone()))
            }
        }
    }

    async fn list(&self, desired: &DesiredState) -> Result<Vec<RemoteRecord>> {
        debug!(
            provider = self.provider_name(),
            domain = desired.domain(),
            "Listing records"
        );

        let records = self
            .provider
            .list_records(desired.domain())
            .await
            .map_err(|e| Error::list_failed(desired.domain(), e))?;

        debug!(
            domain = desired.domain(),
            records = records.len(),
            "Listing complete"
        );
        Ok(records)
    }

    async fn fetch_remembered(&self, desired: &DesiredState, id: &RecordId) -> Result<RemoteView> {
        debug!(
            provider = self.provider_name(),
            domain = desired.domain(),
            record_id = %id,
            "Fetching remembered record"
        );

        match self.provider.get_record(desired.domain(), id).await {
            Ok(record) if record.is_a_named(desired.name()) => Ok(RemoteView::Remembered(record)),
            Ok(record) => {
                warn!(
                    domain = desired.domain(),
                    record_id = %id,
                    found_type = %record.record_type,
                    found_name = %record.name,
                    "Remembered record no longer matches, listing the domain instead"
                );
                Ok(RemoteView::Listing(self.list(desired).await?))
            }
            Err(e) if e.is_not_found() => {
                warn!(
                    domain = desired.domain(),
                    record_id = %id,
                    "Remembered record not found, a new one will be created"
                );
                Ok(RemoteView::Gone)
            }
            Err(e) => Err(Error::fetch_failed(desired.domain(), id.as_str(), e)),
        }
    }

    async fn create(&self, desired: &DesiredState) -> Result<RemoteRecord> {
        let request = desired.edit_request();
        info!(
            provider = self.provider_name(),
            domain = desired.domain(),
            name = desired.name(),
            ip = %desired.ip(),
            ttl = request.ttl,
            "Creating record"
        );

        let created = self
            .provider
            .create_record(desired.domain(), &request)
            .await
            .map_err(|e| Error::write_failed(WriteAction::Create, desired.domain(), desired.name(), e))?;

        confirm_write(WriteAction::Create, desired, &request, &created)?;

        debug!(record_id = %created.id, "Created record");
        Ok(created)
    }

    async fn update(&self, desired: &DesiredState, target: &RemoteRecord) -> Result<RemoteRecord> {
        let request = desired.edit_request();
        info!(
            provider = self.provider_name(),
            domain = desired.domain(),
            name = desired.name(),
            record_id = %target.id,
            previous = %target.data,
            ip = %desired.ip(),
            "Updating record"
        );

        let updated = self
            .provider
            .edit_record(desired.domain(), &target.id, &request)
            .await
            .map_err(|e| Error::write_failed(WriteAction::Edit, desired.domain(), desired.name(), e))?;

        confirm_write(WriteAction::Edit, desired, &request, &updated)?;

        debug!(record_id = %updated.id, "Updated record");
        Ok(updated)
    }
}

/// A write that "succeeded" but returned something else than requested is
/// not a known outcome.
fn confirm_write(
    action: WriteAction,
    desired: &DesiredState,
    request: &EditRequest,
    returned: &RemoteRecord,
) -> Result<()> {
    if request.is_satisfied_by(returned) {
        return Ok(());
    }

    Err(Error::write_failed(
        action,
        desired.domain(),
        desired.name(),
        Error::unknown_outcome(format!(
            "provider reported success but returned {} record '{}' with data '{}' (requested '{}')",
            returned.record_type, returned.name, returned.data, request.data
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;

    #[test]
    fn outcome_exposes_record_identifier() {
        let record = RemoteRecord {
            id: RecordId::from(7),
            record_type: RecordType::A,
            name: "home".to_string(),
            data: "203.0.113.5".to_string(),
            ttl: 1800,
        };

        assert_eq!(Outcome::Created(record.clone()).record_id(), &RecordId::from(7));
        assert!(Outcome::Created(record.clone()).wrote());

        let current = Outcome::AlreadyCurrent(record);
        assert_eq!(current.record_id(), &RecordId::from(7));
        assert!(!current.wrote());
    }

    #[test]
    fn confirm_write_rejects_mismatching_response() {
        let desired =
            DesiredState::new("example.com", "home", "203.0.113.5".parse().unwrap(), 1800)
                .unwrap();
        let request = desired.edit_request();
        let returned = RemoteRecord {
            id: RecordId::from(7),
            record_type: RecordType::A,
            name: "home".to_string(),
            data: "198.51.100.1".to_string(),
            ttl: 1800,
        };

        let err = confirm_write(WriteAction::Edit, &desired, &request, &returned).unwrap_err();
        assert!(err.is_unknown_outcome());
    }
}

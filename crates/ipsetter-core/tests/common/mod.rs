//! Test doubles shared by the contract tests
//!
//! The doubles count every call so tests can assert how many reads and writes
//! a pass performed, and which record a write targeted.

#![allow(dead_code)]

use ipsetter_core::error::{Error, Result};
use ipsetter_core::record::{EditRequest, RecordId, RecordType, RemoteRecord};
use ipsetter_core::traits::{DnsProvider, IpSource, StateRecord, StateStore};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build an A record
pub fn a_record(id: u64, name: &str, data: &str) -> RemoteRecord {
    record(id, "A", name, data)
}

/// Build a record of any type
pub fn record(id: u64, kind: &str, name: &str, data: &str) -> RemoteRecord {
    RemoteRecord {
        id: RecordId::from(id),
        record_type: RecordType::from(kind),
        name: name.to_string(),
        data: data.to_string(),
        ttl: 1800,
    }
}

pub fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}

/// Which call of the mock provider should fail, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    List,
    Get,
    Create,
    Edit,
}

/// An in-memory DNS provider that tracks calls
///
/// `get_record` answers `NotFound` for identifiers it does not hold. Writes
/// modify the held records so a second pass sees the first one's result.
pub struct MockDnsProvider {
    records: Arc<std::sync::Mutex<Vec<RemoteRecord>>>,
    next_id: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    edit_calls: Arc<AtomicUsize>,
    /// Identifiers passed to edit_record, in call order
    edited_ids: Arc<std::sync::Mutex<Vec<RecordId>>>,
    failure: Failure,
    /// Answer writes with a record carrying this data instead of the request's
    lying_data: Option<String>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<RemoteRecord>) -> Self {
        Self {
            records: Arc::new(std::sync::Mutex::new(records)),
            next_id: Arc::new(AtomicUsize::new(1000)),
            list_calls: Arc::new(AtomicUsize::new(0)),
            get_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            edit_calls: Arc::new(AtomicUsize::new(0)),
            edited_ids: Arc::new(std::sync::Mutex::new(Vec::new())),
            failure: Failure::None,
            lying_data: None,
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = failure;
        self
    }

    pub fn answering_writes_with(mut self, data: &str) -> Self {
        self.lying_data = Some(data.to_string());
        self
    }

    /// Create a new MockDnsProvider that shares records and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            next_id: Arc::clone(&other.next_id),
            list_calls: Arc::clone(&other.list_calls),
            get_calls: Arc::clone(&other.get_calls),
            create_calls: Arc::clone(&other.create_calls),
            edit_calls: Arc::clone(&other.edit_calls),
            edited_ids: Arc::clone(&other.edited_ids),
            failure: other.failure,
            lying_data: other.lying_data.clone(),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn edit_calls(&self) -> usize {
        self.edit_calls.load(Ordering::SeqCst)
    }

    /// Total number of create and edit calls
    pub fn write_calls(&self) -> usize {
        self.create_calls() + self.edit_calls()
    }

    /// Total number of calls of any kind
    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.get_calls() + self.write_calls()
    }

    pub fn edited_ids(&self) -> Vec<RecordId> {
        self.edited_ids.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<RemoteRecord> {
        self.records.lock().unwrap().clone()
    }

    fn answer(&self, id: RecordId, request: &EditRequest) -> RemoteRecord {
        RemoteRecord {
            id,
            record_type: request.record_type.clone(),
            name: request.name.clone(),
            data: self.lying_data.clone().unwrap_or_else(|| request.data.clone()),
            ttl: request.ttl,
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _domain: &str) -> Result<Vec<RemoteRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure == Failure::List {
            return Err(Error::http("connection refused"));
        }
        Ok(self.records())
    }

    async fn get_record(&self, _domain: &str, id: &RecordId) -> Result<RemoteRecord> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure == Failure::Get {
            return Err(Error::auth("invalid token"));
        }
        self.records()
            .into_iter()
            .find(|record| &record.id == id)
            .ok_or_else(|| Error::not_found(format!("record {id}")))
    }

    async fn create_record(&self, _domain: &str, request: &EditRequest) -> Result<RemoteRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure == Failure::Create {
            return Err(Error::rate_limited("too many requests"));
        }

        let id = RecordId::from(self.next_id.fetch_add(1, Ordering::SeqCst) as u64);
        let created = self.answer(id, request);
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn edit_record(
        &self,
        _domain: &str,
        id: &RecordId,
        request: &EditRequest,
    ) -> Result<RemoteRecord> {
        self.edit_calls.fetch_add(1, Ordering::SeqCst);
        self.edited_ids.lock().unwrap().push(id.clone());
        if self.failure == Failure::Edit {
            return Err(Error::provider("mock", "server error (HTTP 500)"));
        }

        let edited = self.answer(id.clone(), request);
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|record| &record.id == id) {
            Some(existing) => *existing = edited.clone(),
            None => return Err(Error::not_found(format!("record {id}"))),
        }
        Ok(edited)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source that always answers with the same address
pub struct FixedIpSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }
}

/// An IP source whose discovery always fails
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::discovery("echo service unreachable"))
    }
}

/// A state store that fails every operation
pub struct BrokenStateStore {
    set_calls: Arc<AtomicUsize>,
}

impl BrokenStateStore {
    pub fn new() -> Self {
        Self {
            set_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            set_calls: Arc::clone(&other.set_calls),
        }
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for BrokenStateStore {
    async fn get_record(&self, _key: &str) -> Result<Option<StateRecord>> {
        Err(Error::state_store("disk on fire"))
    }

    async fn set_record(&self, _key: &str, _record: &StateRecord) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::state_store("disk on fire"))
    }

    async fn delete_record(&self, _key: &str) -> Result<()> {
        Err(Error::state_store("disk on fire"))
    }

    async fn list_records(&self) -> Result<Vec<String>> {
        Err(Error::state_store("disk on fire"))
    }

    async fn flush(&self) -> Result<()> {
        Err(Error::state_store("disk on fire"))
    }
}

//! DNS record model
//!
//! `RemoteRecord` is what a provider reports, `EditRequest` is what we submit,
//! and `DesiredState` is the input of one reconciliation pass.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wire name of the only record type this crate writes
pub const A_RECORD_TYPE: &str = "A";

/// DNS record type as reported by a provider
///
/// Only `A` is ever matched or written; every other type is kept verbatim so
/// it can be logged, and is otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => A_RECORD_TYPE,
            RecordType::Other(kind) => kind,
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case(A_RECORD_TYPE) {
            RecordType::A
        } else {
            RecordType::Other(value)
        }
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        RecordType::from(value.to_string())
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => A_RECORD_TYPE.to_string(),
            RecordType::Other(kind) => kind,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-assigned record identifier, opaque to the core
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A record as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Provider-assigned identifier
    pub id: RecordId,
    /// Record type
    pub record_type: RecordType,
    /// Record name relative to the domain (e.g. "home")
    pub name: String,
    /// Record data; the textual IP for A records
    pub data: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl RemoteRecord {
    /// True for an A record carrying the given name
    pub fn is_a_named(&self, name: &str) -> bool {
        self.record_type == RecordType::A && self.name == name
    }
}

/// Payload submitted to create or edit a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRequest {
    pub record_type: RecordType,
    pub name: String,
    pub data: String,
    pub ttl: u32,
}

impl EditRequest {
    /// Edit request for an A record pointing `name` at `ip`
    pub fn a_record(name: impl Into<String>, ip: Ipv4Addr, ttl: u32) -> Self {
        Self {
            record_type: RecordType::A,
            name: name.into(),
            data: ip.to_string(),
            ttl,
        }
    }

    /// True if `record` carries everything this request asked for
    pub fn is_satisfied_by(&self, record: &RemoteRecord) -> bool {
        record.record_type == self.record_type
            && record.name == self.name
            && record.data == self.data
    }
}

/// Input of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    domain: String,
    name: String,
    ip: Ipv4Addr,
    ttl: u32,
}

impl DesiredState {
    /// Build the desired state, rejecting anything an A record cannot express
    pub fn new(
        domain: impl Into<String>,
        name: impl Into<String>,
        ip: IpAddr,
        ttl: u32,
    ) -> Result<Self> {
        let domain = domain.into();
        let name = name.into();

        if domain.is_empty() {
            return Err(Error::invalid_input("domain cannot be empty"));
        }
        if name.is_empty() {
            return Err(Error::invalid_input("record name cannot be empty"));
        }
        if ttl == 0 {
            return Err(Error::invalid_input("ttl must be > 0"));
        }
        let ip = match ip {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => {
                return Err(Error::invalid_input(format!(
                    "an A record cannot point to IPv6 address {v6}"
                )));
            }
        };

        Ok(Self {
            domain,
            name,
            ip,
            ttl,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Textual form compared against `RemoteRecord::data`
    pub fn proposed_value(&self) -> String {
        self.ip.to_string()
    }

    pub fn edit_request(&self) -> EditRequest {
        EditRequest::a_record(self.name.clone(), self.ip, self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_keeps_unknown_kinds_verbatim() {
        assert_eq!(RecordType::from("A"), RecordType::A);
        assert_eq!(RecordType::from("a"), RecordType::A);
        assert_eq!(RecordType::from("MX"), RecordType::Other("MX".to_string()));
        assert_eq!(RecordType::from("AAAA").as_str(), "AAAA");
    }

    #[test]
    fn record_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&RecordType::A).unwrap();
        assert_eq!(json, "\"A\"");
        let kind: RecordType = serde_json::from_str("\"CNAME\"").unwrap();
        assert_eq!(kind, RecordType::Other("CNAME".to_string()));
    }

    #[test]
    fn desired_state_rejects_ipv6() {
        let err = DesiredState::new("example.com", "home", "2001:db8::1".parse().unwrap(), 300)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn desired_state_rejects_empty_fields_and_zero_ttl() {
        let ip: IpAddr = "203.0.113.5".parse().unwrap();
        assert!(DesiredState::new("", "home", ip, 300).is_err());
        assert!(DesiredState::new("example.com", "", ip, 300).is_err());
        assert!(DesiredState::new("example.com", "home", ip, 0).is_err());
    }

    #[test]
    fn edit_request_mirrors_desired_state() {
        let desired =
            DesiredState::new("example.com", "home", "203.0.113.5".parse().unwrap(), 1800)
                .unwrap();
        let request = desired.edit_request();

        assert_eq!(request.record_type, RecordType::A);
        assert_eq!(request.name, "home");
        assert_eq!(request.data, "203.0.113.5");
        assert_eq!(request.ttl, 1800);
    }

    #[test]
    fn edit_request_satisfaction_ignores_ttl() {
        let request = EditRequest::a_record("home", Ipv4Addr::new(203, 0, 113, 5), 1800);
        let mut record = RemoteRecord {
            id: RecordId::from(42),
            record_type: RecordType::A,
            name: "home".to_string(),
            data: "203.0.113.5".to_string(),
            ttl: 3600,
        };
        assert!(request.is_satisfied_by(&record));

        record.data = "198.51.100.1".to_string();
        assert!(!request.is_satisfied_by(&record));
    }
}

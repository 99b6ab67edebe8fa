// # DigitalOcean DNS Provider
//
// This crate provides a DigitalOcean DNS provider implementation for ipsetter.
//
// ## Behavior
//
// - One HTTP request per trait call, except `list_records`, which drains every
//   page of the listing before returning
// - Full error propagation: no retries, no backoff, no caching
// - HTTP timeout configured (30 seconds)
// - Status mapping: 401/403 authentication, 404 not found, 429 rate limited,
//   5xx server error, anything else a provider error carrying DigitalOcean's
//   `message` field
// - A success status other than the documented one is an unknown outcome
//
// ## Security Requirements
//
// - The API token is fetched from a `TokenSource` per request and NEVER logged
// - `Debug` output redacts it
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - List records: GET `/domains/:domain/records?page=N&per_page=200`
// - Get record: GET `/domains/:domain/records/:id`
// - Create record: POST `/domains/:domain/records` (201)
// - Update record: PUT `/domains/:domain/records/:id` (200)

use async_trait::async_trait;
use ipsetter_core::credentials::TokenSource;
use ipsetter_core::record::{EditRequest, RecordId, RecordType, RemoteRecord};
use ipsetter_core::traits::DnsProvider;
use ipsetter_core::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// DigitalOcean API base URL
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page size the API accepts
const PAGE_SIZE: u32 = 200;

/// Upper bound on listing pages, against a `next` link that never ends
const MAX_PAGES: u32 = 1000;

const PROVIDER_NAME: &str = "digitalocean";

/// A domain record as the DigitalOcean API represents it
#[derive(Debug, Clone, Deserialize)]
struct DomainRecord {
    id: u64,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    ttl: u32,
}

impl From<DomainRecord> for RemoteRecord {
    fn from(record: DomainRecord) -> Self {
        RemoteRecord {
            id: RecordId::from(record.id),
            record_type: RecordType::from(record.record_type),
            name: record.name,
            data: record.data,
            ttl: record.ttl,
        }
    }
}

/// Request body of a create or update call
#[derive(Debug, Serialize)]
struct DomainRecordEditRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    data: &'a str,
    ttl: u32,
}

impl<'a> From<&'a EditRequest> for DomainRecordEditRequest<'a> {
    fn from(request: &'a EditRequest) -> Self {
        Self {
            record_type: request.record_type.as_str(),
            name: &request.name,
            data: &request.data,
            ttl: request.ttl,
        }
    }
}

/// Body of single-record responses
#[derive(Debug, Deserialize)]
struct DomainRecordRoot {
    domain_record: DomainRecord,
}

/// Body of listing responses
#[derive(Debug, Deserialize)]
struct DomainRecordsRoot {
    domain_records: Vec<DomainRecord>,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Default, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

/// Body of error responses
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// DigitalOcean DNS provider
///
/// Stateless between calls. All coordination (whether to list, fetch, create
/// or edit) belongs to the caller.
///
/// # Security
///
/// The Debug implementation does NOT expose the token source.
pub struct DigitalOceanProvider {
    /// Source of the bearer token
    /// ⚠️ NEVER log its value
    token_source: Arc<dyn TokenSource>,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API root, without trailing slash
    base_url: String,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("token_source", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a provider talking to the public DigitalOcean API
    pub fn new(token_source: Arc<dyn TokenSource>) -> Result<Self> {
        Self::with_base_url(token_source, DIGITALOCEAN_API_BASE)
    }

    /// Create a provider talking to another API root (tests, proxies)
    pub fn with_base_url(
        token_source: Arc<dyn TokenSource>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("DigitalOcean API base URL cannot be empty"));
        }

        Ok(Self {
            token_source,
            client,
            base_url,
        })
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/domains/{}/records", self.base_url, domain)
    }

    fn record_url(&self, domain: &str, id: &RecordId) -> String {
        format!("{}/domains/{}/records/{}", self.base_url, domain, id)
    }

    /// Send a request with bearer auth and map transport failures
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.token_source.token()?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::http(format!("DigitalOcean request failed: {}", e)))
    }

    /// Check the response status and decode its body.
    ///
    /// Anything but `expected` is an error: a failure status is classified,
    /// another success status is an unknown outcome.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        expected: StatusCode,
        context: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{}: failed to read response: {}", context, e)))?;

        if status != expected {
            return Err(classify_status(status, &body, context));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::unknown_outcome(format!(
                "{}: DigitalOcean answered {} with an unreadable body: {}",
                context, status, e
            ))
        })
    }

    /// Fetch one page of a listing, returning the next page number if any
    async fn list_page(
        &self,
        domain: &str,
        page: u32,
    ) -> Result<(Vec<RemoteRecord>, Option<u32>)> {
        let request = self
            .client
            .get(self.records_url(domain))
            .query(&[("page", page), ("per_page", PAGE_SIZE)]);

        let response = self.send(request).await?;
        let root: DomainRecordsRoot = Self::decode(
            response,
            StatusCode::OK,
            &format!("list records of {}", domain),
        )
        .await?;

        let next = root
            .links
            .and_then(|links| links.pages)
            .and_then(|pages| pages.next)
            .map(|next| next_page_number(&next))
            .transpose()?;

        let records = root.domain_records.into_iter().map(Into::into).collect();
        Ok((records, next))
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    /// List every record of a domain
    ///
    /// # API Calls
    ///
    /// ```http
    /// GET /domains/:domain/records?page=1&per_page=200
    /// GET /domains/:domain/records?page=2&per_page=200
    /// ...until links.pages.next is absent
    /// ```
    async fn list_records(&self, domain: &str) -> Result<Vec<RemoteRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            tracing::debug!(domain, page, "Listing DigitalOcean records");
            let (mut batch, next) = self.list_page(domain, page).await?;
            records.append(&mut batch);

            match next {
                None => break,
                Some(next) if next <= page => {
                    return Err(Error::unknown_outcome(format!(
                        "list records of {}: page {} links back to page {}",
                        domain, page, next
                    )));
                }
                Some(_) if page >= MAX_PAGES => {
                    return Err(Error::unknown_outcome(format!(
                        "list records of {}: more than {} pages",
                        domain, MAX_PAGES
                    )));
                }
                Some(next) => page = next,
            }
        }

        tracing::debug!(domain, records = records.len(), "Listed DigitalOcean records");
        Ok(records)
    }

    /// Fetch one record; 404 becomes `Error::NotFound`
    async fn get_record(&self, domain: &str, id: &RecordId) -> Result<RemoteRecord> {
        let response = self
            .send(self.client.get(self.record_url(domain, id)))
            .await?;
        let root: DomainRecordRoot = Self::decode(
            response,
            StatusCode::OK,
            &format!("get record {} of {}", id, domain),
        )
        .await?;

        Ok(root.domain_record.into())
    }

    /// Create a record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /domains/:domain/records
    /// {"type": "A", "name": "home", "data": "203.0.113.5", "ttl": 1800}
    /// ```
    async fn create_record(&self, domain: &str, request: &EditRequest) -> Result<RemoteRecord> {
        let body = DomainRecordEditRequest::from(request);
        let response = self
            .send(self.client.post(self.records_url(domain)).json(&body))
            .await?;
        let root: DomainRecordRoot = Self::decode(
            response,
            StatusCode::CREATED,
            &format!("create record {} in {}", request.name, domain),
        )
        .await?;

        tracing::debug!(domain, record_id = root.domain_record.id, "DigitalOcean record created");
        Ok(root.domain_record.into())
    }

    /// Update a record in place
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /domains/:domain/records/:id
    /// {"type": "A", "name": "home", "data": "203.0.113.5", "ttl": 1800}
    /// ```
    async fn edit_record(
        &self,
        domain: &str,
        id: &RecordId,
        request: &EditRequest,
    ) -> Result<RemoteRecord> {
        let body = DomainRecordEditRequest::from(request);
        let response = self
            .send(self.client.put(self.record_url(domain, id)).json(&body))
            .await?;
        let root: DomainRecordRoot = Self::decode(
            response,
            StatusCode::OK,
            &format!("update record {} in {}", id, domain),
        )
        .await?;

        Ok(root.domain_record.into())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Map a non-expected status to an error
fn classify_status(status: StatusCode, body: &str, context: &str) -> Error {
    if status.is_success() {
        return Error::unknown_outcome(format!(
            "{}: DigitalOcean answered with unexpected status {}",
            context, status
        ));
    }

    let message = serde_json::from_str::<ApiError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions (HTTP {})",
            context,
            status.as_u16()
        )),
        404 => Error::not_found(format!("{}: {}", context, message)),
        429 => Error::rate_limited(format!("{}: {}", context, message)),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: server error (HTTP {}): {}", context, status.as_u16(), message),
        ),
        code => Error::provider(
            PROVIDER_NAME,
            format!("{}: HTTP {}: {}", context, code, message),
        ),
    }
}

/// Extract the `page` query parameter of a `links.pages.next` URL
fn next_page_number(next: &str) -> Result<u32> {
    let url = reqwest::Url::parse(next).map_err(|e| {
        Error::unknown_outcome(format!("unreadable next page link '{}': {}", next, e))
    })?;

    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .ok_or_else(|| {
            Error::unknown_outcome(format!("next page link '{}' has no page number", next))
        })
}

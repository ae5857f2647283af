//! # anl-idol
//!
//! HTTP client for the IDOL search engine.
//!
//! Two endpoints are involved:
//! - the ACI port, for `action=Query` with `ResponseFormat=simplejson`
//! - the index port, for `DREDELETEREF` and `DREADDDATA` (IDX payloads)
//!
//! They are often the same host on different ports; both are configurable.

pub mod aci;
pub mod index;

mod error;

pub use error::IdolError;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default `MaxResults` for queries.
pub const DEFAULT_MAX_RESULTS: u32 = 1000;

// ── Types ──────────────────────────────────────────────────────────

/// Field name to values, as IDOL prints a document.
pub type IdolDocument = BTreeMap<String, Vec<String>>;

/// One query hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdolHit {
    pub reference: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// First `DOCUMENT` of the hit content.
    #[serde(default)]
    pub document: IdolDocument,
    /// Fields to write in addition to `document` when reindexing.
    #[serde(default)]
    pub fields: Vec<(String, serde_json::Value)>,
}

impl IdolHit {
    /// First value of `field`, if the document has one.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.document
            .get(field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for one IDOL instance.
#[derive(Debug, Clone)]
pub struct IdolClient {
    http: reqwest::Client,
    aci_url: String,
    index_url: String,
    max_results: u32,
}

impl IdolClient {
    /// Create a client for the given ACI and index endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`IdolError::Http`] if the underlying `reqwest::Client` fails
    /// to build.
    pub fn new(aci_url: &str, index_url: &str, timeout: Duration) -> Result<Self, IdolError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent("annoloop/0.1")
                .timeout(timeout)
                .build()?,
            aci_url: aci_url.trim_end_matches('/').to_string(),
            index_url: index_url.trim_end_matches('/').to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// Override `MaxResults` for queries.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

/// Check an HTTP response status, returning the body text on success.
pub(crate) async fn response_text(resp: reqwest::Response) -> Result<String, IdolError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(IdolError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

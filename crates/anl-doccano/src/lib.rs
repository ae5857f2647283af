//! # anl-doccano
//!
//! HTTP client for the Doccano annotation service.
//!
//! Covers the slice of the Doccano REST API that annoloop needs:
//! - token login (`v1/auth-token`) and identity (`v1/me`)
//! - project listing (`v1/projects`)
//! - document upload and annotated download (`v1/projects/{id}/docs/...`)

pub mod auth;
pub mod documents;
pub mod projects;

mod error;
mod http;

pub use error::DoccanoError;

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Types ──────────────────────────────────────────────────────────

/// The logged-in Doccano account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoccanoUser {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_staff: bool,
}

/// A project as listed by Doccano.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoccanoProject {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_type: String,
}

// ── Client ─────────────────────────────────────────────────────────

/// Authenticated HTTP client for one Doccano server.
#[derive(Debug, Clone)]
pub struct DoccanoClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DoccanoClient {
    /// Build an unauthenticated client. Use [`DoccanoClient::login`] to
    /// obtain a token.
    ///
    /// # Errors
    ///
    /// Returns [`DoccanoError::Http`] if the underlying `reqwest::Client`
    /// fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DoccanoError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent("annoloop/0.1")
                .timeout(timeout)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: String::new(),
        })
    }

    /// The server this client talks to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            builder
        } else {
            builder.header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
        }
    }
}

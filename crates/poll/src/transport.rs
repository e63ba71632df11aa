//! Transport boundary to the search store.
//!
//! The polling client only needs two operations: force pending writes to
//! become visible (`refresh`) and run a search. They live behind a trait so
//! tests can script responses without a network.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::request::SearchRequest;

/// The two store operations the polling client depends on.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Force recently written documents in the given indices to become
    /// visible to subsequent searches.
    async fn refresh(&self, index_pattern: &str) -> Result<(), TransportError>;

    /// Execute the search and return the raw response body.
    async fn search(&self, request: &SearchRequest) -> Result<Bytes, TransportError>;
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL of the search store, e.g. `https://localhost:9200`.
    pub base_url: String,
    /// Username for basic auth; auth is skipped when unset.
    pub username: Option<String>,
    /// Password for basic auth.
    pub password: Option<String>,
    /// Skip TLS certificate verification (self-signed dev clusters).
    pub insecure_tls: bool,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            insecure_tls: false,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_insecure_tls(mut self) -> Self {
        self.insecure_tls = true;
        self
    }
}

/// JSON-over-HTTP(S) implementation of [`SearchTransport`].
pub struct HttpTransport {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if config.insecure_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            http,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(url);
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_deref());
        }
        builder
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::UnexpectedStatus { status, body })
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn refresh(&self, index_pattern: &str) -> Result<(), TransportError> {
        let url = format!("{}/{}/_refresh", self.base_url, index_pattern);
        let response = self
            .request(&url)
            .query(&[("expand_wildcards", "all")])
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<Bytes, TransportError> {
        let url = format!("{}/{}/_search", self.base_url, request.index_pattern());
        let response = self
            .request(&url)
            .query(&[("expand_wildcards", "open,hidden")])
            .json(&request.body())
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?)
    }
}

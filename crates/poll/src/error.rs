//! Error types for the polling client.

use std::time::Duration;

use crate::result::SearchResult;

/// Errors raised by the underlying search transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request could not be sent or the response body not read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status code.
    #[error("search store returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Errors returned by [`PollClient::poll`](crate::client::PollClient::poll).
///
/// Only a false condition is ever retried. Every variant below is terminal
/// for the polling session in which it occurs.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The search request failed validation. Surfaced before any network
    /// call is made.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// The pre-search index refresh failed. A refresh failure indicates a
    /// broken target, not data that is still settling, so it is never
    /// retried.
    #[error("failed to refresh indices `{index_pattern}`: {source}")]
    Refresh {
        index_pattern: String,
        #[source]
        source: TransportError,
    },

    /// A search attempt failed at the transport layer. Never retried, so
    /// that a broken query is not disguised as data that is not yet
    /// visible.
    #[error("search transport error: {0}")]
    Transport(#[from] TransportError),

    /// The search response could not be decoded. Treated exactly like a
    /// transport failure: terminal, never retried.
    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The condition was still unmet when the deadline elapsed. Carries the
    /// last decoded result and the attempt count for diagnostics.
    #[error("condition not met after {attempts} attempts in {elapsed:?}; last result: {last}")]
    Timeout {
        attempts: u32,
        elapsed: Duration,
        last: Box<SearchResult>,
    },

    /// The caller cancelled the poll. Distinct from [`PollError::Timeout`]:
    /// the deadline may have been far away still.
    #[error("polling cancelled after {attempts} attempts")]
    Cancelled {
        attempts: u32,
        last: Option<Box<SearchResult>>,
    },
}

impl PollError {
    /// The last decoded result observed before the failure, if any.
    pub fn last_result(&self) -> Option<&SearchResult> {
        match self {
            PollError::Timeout { last, .. } => Some(last),
            PollError::Cancelled { last: Some(last), .. } => Some(last),
            _ => None,
        }
    }
}

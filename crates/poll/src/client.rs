//! Poll-until-condition search client.
//!
//! Provides [`PollClient`] for repeating a search against a near-real-time
//! store until a caller-supplied [`Condition`] holds, with backoff between
//! attempts, an overall deadline, and prompt cancellation at every
//! suspension point. Only a false condition is retried: transport and
//! decode failures end the session immediately, so a broken query is never
//! mistaken for data that has not become visible yet.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::condition::{AllOf, Condition, MatchesReportedTotal, MinHits};
use crate::error::{PollError, TransportError};
use crate::request::SearchRequest;
use crate::result::SearchResult;
use crate::transport::{HttpTransport, SearchTransport, TransportConfig};

/// Overall deadline for a poll call unless overridden. Sized to dominate
/// the store's refresh latency.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// First inter-attempt backoff interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Cap for the growing backoff interval.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(1);

const BACKOFF_FACTOR: f64 = 1.5;

/// The store returns at most this many hits unless a size is requested.
const DEFAULT_PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-call configuration for [`PollClient::poll`].
///
/// Without a condition the first decoded response is returned as-is.
pub struct PollOptions {
    condition: Option<Box<dyn Condition>>,
    timeout: Duration,
    interval: Duration,
    max_interval: Duration,
    cancellation: Option<CancellationToken>,
}

impl PollOptions {
    pub fn new() -> Self {
        Self {
            condition: None,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            cancellation: None,
        }
    }

    /// Set the success condition to poll for.
    pub fn condition(mut self, condition: impl Condition + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Override the overall deadline (default [`DEFAULT_TIMEOUT`]).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the first backoff interval (default [`DEFAULT_INTERVAL`]).
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the backoff cap (default [`DEFAULT_MAX_INTERVAL`]).
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    /// Attach a cancellation handle. Cancelling it interrupts the network
    /// call and the backoff sleep promptly and ends the poll with
    /// [`PollError::Cancelled`].
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client that polls a search store until a condition is satisfied.
///
/// Holds only the transport; every call owns its own request, condition,
/// and session state, so independent calls may run concurrently. A single
/// [`SearchRequest`] must not be shared between concurrent calls, because
/// conditions mutate it between attempts.
pub struct PollClient {
    transport: Arc<dyn SearchTransport>,
}

impl PollClient {
    pub fn new(transport: Arc<dyn SearchTransport>) -> Self {
        Self { transport }
    }

    /// Convenience constructor over [`HttpTransport`].
    pub fn http(config: TransportConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Search until at least `min` hits are visible and the page covers the
    /// reported total, growing the requested page size as needed.
    ///
    /// Any condition already set on `options` is replaced. When `min`
    /// exceeds the store's default page size the request is pre-sized so a
    /// successful search does not need a follow-up attempt just to fetch
    /// the full page.
    pub async fn poll_min_hits(
        &self,
        request: &mut SearchRequest,
        min: usize,
        options: PollOptions,
    ) -> Result<SearchResult, PollError> {
        if min > DEFAULT_PAGE_SIZE {
            request.set_size(min);
        }
        let options = options.condition(AllOf::default().and(MinHits(min)).and(MatchesReportedTotal));
        self.poll(request, options).await
    }

    /// Execute one polling session: refresh the target indices, then
    /// repeatedly search, decode, and evaluate until the condition holds,
    /// the deadline elapses, or the caller cancels.
    ///
    /// Failure modes: [`PollError::InvalidRequest`] before any network
    /// call; [`PollError::Refresh`], [`PollError::Transport`], and
    /// [`PollError::Decode`] immediately and without retry;
    /// [`PollError::Timeout`] carrying the last decoded result and attempt
    /// count; [`PollError::Cancelled`] when the cancellation handle fires.
    pub async fn poll(
        &self,
        request: &mut SearchRequest,
        options: PollOptions,
    ) -> Result<SearchResult, PollError> {
        request.validate()?;

        let PollOptions {
            mut condition,
            timeout,
            interval,
            max_interval,
            cancellation,
        } = options;

        let index_pattern = request.index_pattern();
        let started = Instant::now();
        let deadline = started + timeout;

        info!(
            indices = %index_pattern,
            timeout_ms = timeout.as_millis() as u64,
            "Polling for search condition"
        );

        let refreshed = tokio::select! {
            biased;
            _ = cancelled(&cancellation) => {
                return Err(PollError::Cancelled { attempts: 0, last: None });
            }
            refreshed = self.transport.refresh(&index_pattern) => refreshed,
        };
        refreshed.map_err(|source| PollError::Refresh {
            index_pattern: index_pattern.clone(),
            source,
        })?;

        let mut attempts: u32 = 0;
        let mut delay = interval;
        let mut last: Option<SearchResult> = None;

        loop {
            let raw = tokio::select! {
                biased;
                _ = cancelled(&cancellation) => {
                    return Err(PollError::Cancelled { attempts, last: last.map(Box::new) });
                }
                raw = self.transport.search(request) => raw?,
                // A hung search must not carry the session past its deadline.
                _ = tokio::time::sleep_until(deadline) => {
                    warn!(attempts, "Search still in flight at deadline");
                    return Err(PollError::Timeout {
                        attempts,
                        elapsed: started.elapsed(),
                        last: Box::new(last.unwrap_or_default()),
                    });
                }
            };
            let result = SearchResult::from_slice(&raw)?;
            attempts += 1;

            let met = match condition.as_mut() {
                Some(condition) => condition.is_met(&result),
                None => true,
            };
            debug!(
                attempt = attempts,
                hits = result.hit_count(),
                total = result.hits.total.value,
                met,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Evaluated search attempt"
            );

            if met {
                info!(attempts, hits = result.hit_count(), "Search condition met");
                return Ok(result);
            }
            if let Some(condition) = condition.as_mut() {
                condition.prepare_retry(&result, request);
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    last = %result,
                    "Search condition still unmet at deadline"
                );
                return Err(PollError::Timeout {
                    attempts,
                    elapsed: started.elapsed(),
                    last: Box::new(result),
                });
            }

            // Never sleep past the deadline.
            let wait = delay.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancelled(&cancellation) => {
                    return Err(PollError::Cancelled { attempts, last: Some(Box::new(result)) });
                }
                _ = tokio::time::sleep(wait) => {}
            }

            delay = delay.mul_f64(BACKOFF_FACTOR).min(max_interval);
            last = Some(result);
        }
    }
}

/// Resolves when the token is cancelled; pends forever without a token.
async fn cancelled(token: &Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_the_documented_knobs() {
        let options = PollOptions::default();
        assert!(options.condition.is_none());
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert_eq!(options.interval, DEFAULT_INTERVAL);
        assert_eq!(options.max_interval, DEFAULT_MAX_INTERVAL);
        assert!(options.cancellation.is_none());
    }

    #[test]
    fn options_builder_overrides_every_knob() {
        let options = PollOptions::new()
            .condition(MinHits(3))
            .timeout(Duration::from_secs(1))
            .interval(Duration::from_millis(10))
            .max_interval(Duration::from_millis(50))
            .cancellation(CancellationToken::new());
        assert!(options.condition.is_some());
        assert_eq!(options.timeout, Duration::from_secs(1));
        assert_eq!(options.interval, Duration::from_millis(10));
        assert_eq!(options.max_interval, Duration::from_millis(50));
        assert!(options.cancellation.is_some());
    }
}

//! Success conditions evaluated against each decoded search response.
//!
//! A condition decides whether polling is done, and may adjust the request
//! between attempts, for example growing the requested page size once the
//! true total is known. The two concerns are separate methods so that
//! composite conditions can run every member's adjustment even when another
//! member already failed the attempt.

use tracing::debug;

use crate::request::SearchRequest;
use crate::result::SearchResult;

/// A predicate over the latest decoded search result.
///
/// `is_met` must be free of side effects on the request; any adjustment for
/// the next attempt belongs in `prepare_retry`, which the polling client
/// calls after a failed attempt and before the backoff sleep.
pub trait Condition: Send {
    /// Whether the latest decoded result satisfies this condition.
    fn is_met(&mut self, result: &SearchResult) -> bool;

    /// Adjust the request before the next attempt. Called on every failed
    /// attempt, for every member of a composite, regardless of which member
    /// caused the failure; implementations must guard their own
    /// applicability.
    fn prepare_retry(&mut self, result: &SearchResult, request: &mut SearchRequest) {
        let _ = (result, request);
    }
}

/// Pure predicates can be written as closures.
impl<F> Condition for F
where
    F: FnMut(&SearchResult) -> bool + Send,
{
    fn is_met(&mut self, result: &SearchResult) -> bool {
        self(result)
    }
}

// ---------------------------------------------------------------------------
// AllOf
// ---------------------------------------------------------------------------

/// Conjunction of conditions.
///
/// Every member is evaluated on every attempt (`is_met` folds with `&=`
/// instead of short-circuiting), so a later member's retry adjustment still
/// runs when an earlier member already evaluated false.
#[derive(Default)]
pub struct AllOf {
    conditions: Vec<Box<dyn Condition>>,
}

impl AllOf {
    pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
        Self { conditions }
    }

    /// Fluent append, e.g. `AllOf::default().and(MinHits(5)).and(MatchesReportedTotal)`.
    pub fn and(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }
}

impl Condition for AllOf {
    fn is_met(&mut self, result: &SearchResult) -> bool {
        let mut met = true;
        for condition in &mut self.conditions {
            met &= condition.is_met(result);
        }
        met
    }

    fn prepare_retry(&mut self, result: &SearchResult, request: &mut SearchRequest) {
        for condition in &mut self.conditions {
            condition.prepare_retry(result, request);
        }
    }
}

// ---------------------------------------------------------------------------
// MinHits
// ---------------------------------------------------------------------------

/// Met once the page holds at least this many hits. Pure predicate.
#[derive(Debug, Clone, Copy)]
pub struct MinHits(pub usize);

impl Condition for MinHits {
    fn is_met(&mut self, result: &SearchResult) -> bool {
        result.hit_count() >= self.0
    }
}

// ---------------------------------------------------------------------------
// MatchesReportedTotal
// ---------------------------------------------------------------------------

/// Met once the page covers the reported total. While it does not, the
/// retry adjustment grows the request's size override to the reported total
/// so the next attempt can return everything in one page instead of looping
/// against the store's default page size.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchesReportedTotal;

impl Condition for MatchesReportedTotal {
    fn is_met(&mut self, result: &SearchResult) -> bool {
        result.hit_count() as u64 >= result.hits.total.value
    }

    fn prepare_retry(&mut self, result: &SearchResult, request: &mut SearchRequest) {
        let total = result.hits.total.value;
        if (result.hit_count() as u64) < total {
            debug!(size = total, "Growing request size to reported total");
            request.set_size(total as usize);
        }
    }
}

pub mod client;
pub mod condition;
pub mod error;
pub mod request;
pub mod result;
pub mod transport;

pub use client::{PollClient, PollOptions, DEFAULT_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_TIMEOUT};
pub use condition::{AllOf, Condition, MatchesReportedTotal, MinHits};
pub use error::{PollError, TransportError};
pub use request::SearchRequest;
pub use result::{SearchHit, SearchHits, SearchResult, TotalHits, TotalRelation};
pub use transport::{HttpTransport, SearchTransport, TransportConfig};

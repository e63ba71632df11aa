//! Decoded search responses.
//!
//! The store reports every field value as a one-or-more-element sequence,
//! even for inherently scalar fields. Decoding preserves that wrapping:
//! unwrapping to a scalar is a policy decision that belongs to whatever
//! compares the values, not to the decoder.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub hits: SearchHits,
    /// Raw aggregation bodies, passed through untouched for callers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregations: BTreeMap<String, Value>,
}

impl SearchResult {
    /// Decode a raw response body. Malformed JSON and mistyped
    /// sub-structures surface as decode errors, which the polling client
    /// treats as terminal.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Number of hits returned in this page of results.
    pub fn hit_count(&self) -> usize {
        self.hits.hits.len()
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits returned, total {} ({})",
            self.hits.hits.len(),
            self.hits.total.value,
            self.hits.total.relation,
        )
    }
}

/// The hits section of a search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub total: TotalHits,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Reported total hit count with its relation marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalHits {
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub relation: TotalRelation,
}

/// Whether a reported total is exact or a lower bound (the store caps
/// exact counting on large result sets).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    #[default]
    Eq,
    Gte,
}

impl fmt::Display for TotalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalRelation::Eq => write!(f, "exact"),
            TotalRelation::Gte => write!(f, "at least"),
        }
    }
}

/// A single document hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    /// Name of the backing index the document lives in.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Relevance score; absent when the store sorts by field instead.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// The raw source document.
    #[serde(rename = "_source", default)]
    pub source: Value,
    /// Field projection. Values keep the store's sequence wrapping even for
    /// single-valued fields.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<Value>>,
}

impl SearchHit {
    /// Decode the raw source document into a typed value.
    pub fn parse_source<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A response body the way the store actually shapes it.
    const RESPONSE: &str = r#"{
        "took": 3,
        "timed_out": false,
        "hits": {
            "total": { "value": 2, "relation": "eq" },
            "hits": [
                {
                    "_index": "traces-apm-default",
                    "_id": "doc-1",
                    "_score": 1.0,
                    "_source": { "service": { "name": "web" }, "trace": { "id": "abc" } },
                    "fields": { "service.name": ["web"], "trace.id": ["abc"] }
                },
                {
                    "_index": "traces-apm-default",
                    "_id": "doc-2",
                    "_score": null,
                    "_source": { "service": { "name": "worker" } },
                    "fields": { "service.name": ["worker"] }
                }
            ]
        }
    }"#;

    #[test]
    fn decodes_store_shaped_response() {
        let result = SearchResult::from_slice(RESPONSE.as_bytes()).expect("decode");
        assert_eq!(result.hit_count(), 2);
        assert_eq!(result.hits.total.value, 2);
        assert_eq!(result.hits.total.relation, TotalRelation::Eq);

        let hit = &result.hits.hits[0];
        assert_eq!(hit.index, "traces-apm-default");
        assert_eq!(hit.id, "doc-1");
        assert_eq!(hit.score, Some(1.0));
        assert_eq!(hit.source["service"]["name"], json!("web"));
    }

    #[test]
    fn field_values_keep_their_sequence_wrapping() {
        let result = SearchResult::from_slice(RESPONSE.as_bytes()).expect("decode");
        let hit = &result.hits.hits[0];
        assert_eq!(hit.fields["service.name"], vec![json!("web")]);
        assert_eq!(hit.fields["trace.id"], vec![json!("abc")]);
    }

    #[test]
    fn null_score_decodes_as_absent() {
        let result = SearchResult::from_slice(RESPONSE.as_bytes()).expect("decode");
        assert_eq!(result.hits.hits[1].score, None);
    }

    #[test]
    fn gte_relation_is_decoded() {
        let body = r#"{"hits": {"total": {"value": 10000, "relation": "gte"}, "hits": []}}"#;
        let result = SearchResult::from_slice(body.as_bytes()).expect("decode");
        assert_eq!(result.hits.total.relation, TotalRelation::Gte);
        assert_eq!(result.to_string(), "0 hits returned, total 10000 (at least)");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(SearchResult::from_slice(b"not json").is_err());
        // hits must be an object, not a scalar
        assert!(SearchResult::from_slice(br#"{"hits": 3}"#).is_err());
    }

    #[test]
    fn parse_source_decodes_typed_documents() {
        #[derive(Deserialize)]
        struct Service {
            name: String,
        }
        #[derive(Deserialize)]
        struct Doc {
            service: Service,
        }

        let result = SearchResult::from_slice(RESPONSE.as_bytes()).expect("decode");
        let doc: Doc = result.hits.hits[0].parse_source().expect("typed source");
        assert_eq!(doc.service.name, "web");
    }

    #[test]
    fn aggregations_pass_through_untouched() {
        let body = r#"{
            "hits": {"total": {"value": 0, "relation": "eq"}, "hits": []},
            "aggregations": {"services": {"buckets": [{"key": "web", "doc_count": 7}]}}
        }"#;
        let result = SearchResult::from_slice(body.as_bytes()).expect("decode");
        assert_eq!(
            result.aggregations["services"]["buckets"][0]["key"],
            json!("web"),
        );
    }

    #[test]
    fn display_summarises_the_page() {
        let result = SearchResult::from_slice(RESPONSE.as_bytes()).expect("decode");
        assert_eq!(result.to_string(), "2 hits returned, total 2 (exact)");
    }
}

//! Mutable search request descriptor.
//!
//! A [`SearchRequest`] names the indices to search and carries the query
//! body, optional sort keys, and an optional result-size override. Retry
//! conditions may enlarge the size override between attempts, so the request
//! lives as a mutable value for one polling session and must not be shared
//! between concurrent sessions.

use serde_json::{json, Value};

use crate::error::PollError;

/// A search request against one or more indices, aliases, or patterns.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Index entries, each a single index/alias/pattern name without commas.
    indices: Vec<String>,
    query: Option<Value>,
    sort: Option<Vec<String>>,
    size: Option<usize>,
}

impl SearchRequest {
    /// Create a request from a comma-separated index pattern, e.g.
    /// `"traces-*,logs-*"`.
    pub fn new(pattern: &str) -> Self {
        Self::from_indices(pattern.split(','))
    }

    /// Create a request from individual index entries.
    pub fn from_indices<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            query: None,
            sort: None,
            size: None,
        }
    }

    /// Set the query body (the store's query DSL as opaque JSON).
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Set the sort-key sequence, e.g. `["@timestamp:asc"]`.
    pub fn with_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = Some(sort.into_iter().map(Into::into).collect());
        self
    }

    /// Set the result-size override.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Overwrite the result-size override in place. Used by retry conditions
    /// to request a larger page on the next attempt.
    pub fn set_size(&mut self, size: usize) {
        self.size = Some(size);
    }

    /// Current result-size override, if any.
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// The index entries this request targets.
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    /// The comma-joined pattern used on the transport path.
    pub fn index_pattern(&self) -> String {
        self.indices.join(",")
    }

    /// Check the request is well formed: at least one index entry, and no
    /// entry empty or containing a comma.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.indices.is_empty() {
            return Err(PollError::InvalidRequest("no indices to search".into()));
        }
        for entry in &self.indices {
            if entry.is_empty() {
                return Err(PollError::InvalidRequest("empty index entry".into()));
            }
            if entry.contains(',') {
                return Err(PollError::InvalidRequest(format!(
                    "index entry `{entry}` must not contain commas"
                )));
            }
        }
        Ok(())
    }

    /// The JSON body sent to the search endpoint. Always projects all
    /// fields so hits carry the store's `fields` encoding alongside
    /// `_source`.
    pub fn body(&self) -> Value {
        let mut body = json!({ "fields": ["*"] });
        if let Some(query) = &self.query {
            body["query"] = query.clone();
        }
        if let Some(size) = self.size {
            body["size"] = json!(size);
        }
        if let Some(sort) = &self.sort {
            body["sort"] = json!(sort);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_splits_comma_separated_patterns() {
        let request = SearchRequest::new("traces-*,logs-*,metrics-*");
        assert_eq!(request.indices(), ["traces-*", "logs-*", "metrics-*"]);
        assert_eq!(request.index_pattern(), "traces-*,logs-*,metrics-*");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_index_set() {
        let request = SearchRequest::from_indices(Vec::<String>::new());
        let err = request.validate().expect_err("empty index set");
        assert!(err.to_string().contains("no indices"));
    }

    #[test]
    fn validate_rejects_empty_entries() {
        let request = SearchRequest::new("traces-*,,logs-*");
        assert!(request.validate().is_err());
    }

    #[test]
    fn validate_rejects_commas_in_entries() {
        let request = SearchRequest::from_indices(["traces-*,logs-*"]);
        let err = request.validate().expect_err("comma in entry");
        assert!(err.to_string().contains("commas"));
    }

    #[test]
    fn body_always_projects_all_fields() {
        let body = SearchRequest::new("traces-*").body();
        assert_eq!(body["fields"], json!(["*"]));
        assert!(body.get("query").is_none());
        assert!(body.get("size").is_none());
        assert!(body.get("sort").is_none());
    }

    #[test]
    fn body_carries_query_sort_and_size() {
        let body = SearchRequest::new("traces-*")
            .with_query(json!({ "match_all": {} }))
            .with_sort(["@timestamp:asc"])
            .with_size(500)
            .body();
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(body["sort"], json!(["@timestamp:asc"]));
        assert_eq!(body["size"], json!(500));
    }

    #[test]
    fn set_size_overwrites_previous_override() {
        let mut request = SearchRequest::new("traces-*").with_size(10);
        request.set_size(250);
        assert_eq!(request.size(), Some(250));
        assert_eq!(request.body()["size"], json!(250));
    }
}

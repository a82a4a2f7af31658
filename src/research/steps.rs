//! Collaborator contract for one research run
//!
//! The coordinator drives the loop; everything that talks to a model or the
//! network sits behind [`ResearchSteps`]. Two result shapes cross this
//! boundary untyped (model output is untrusted) and are validated here:
//! [`QueryPlan`] for the first round and [`AnalysisResult`] after each round.

use crate::research::activity::ActivityTracker;
use crate::research::state::ResearchState;
use crate::types::{AppError, Finding, Result, SearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[async_trait]
pub trait ResearchSteps: Send + Sync {
    /// Plan the first round. Expected shape: `{"searchQueries": [..]}`.
    async fn generate_search_queries(
        &self,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Value>;

    /// Run one query.
    async fn search(
        &self,
        query: &str,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Vec<SearchResult>>;

    /// Turn a round's search results into findings.
    async fn process_search_results(
        &self,
        results: Vec<SearchResult>,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Vec<Finding>>;

    /// Judge sufficiency. Expected shape: `{"sufficient": bool, "queries": [..]}`.
    async fn analyze_findings(
        &self,
        state: &ResearchState,
        queries_used: &[String],
        iteration: usize,
        tracker: &dyn ActivityTracker,
    ) -> Result<Value>;

    /// Write the final report from everything gathered.
    async fn generate_report(
        &self,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<String>;
}

/// First-round plan as returned by query generation.
///
/// Fields other than `searchQueries` are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    pub search_queries: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryPlan {
    /// Validate raw query-generation output.
    ///
    /// Absent payloads, non-objects and objects without a `searchQueries`
    /// list are all rejected. Non-string entries in the list are dropped,
    /// as they are for [`AnalysisResult`].
    pub fn from_value(value: Value) -> Result<Self> {
        let invalid = || {
            AppError::Research(
                "Initial queries generation failed or returned invalid format".into(),
            )
        };

        let Value::Object(mut extra) = value else {
            return Err(invalid());
        };
        let search_queries = match extra.remove("searchQueries") {
            Some(Value::Array(items)) => string_entries(&items),
            _ => return Err(invalid()),
        };

        Ok(Self {
            search_queries,
            extra,
        })
    }
}

/// Analysis payload that is not a JSON object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("analysis result is not an object: {0}")]
pub struct MalformedAnalysis(pub String);

/// Validated sufficiency judgment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub sufficient: bool,
    pub queries: Vec<String>,
}

impl AnalysisResult {
    /// Validate raw analysis output.
    ///
    /// `sufficient` is coerced by truthiness (missing, `null`, `false`, `0`
    /// and `""` are falsy). `queries` keeps the string entries of an array;
    /// anything else becomes an empty list.
    pub fn validate(value: Value) -> std::result::Result<Self, MalformedAnalysis> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(MalformedAnalysis(other.to_string())),
        };

        let sufficient = map.get("sufficient").is_some_and(is_truthy);
        let queries = match map.get("queries") {
            Some(Value::Array(items)) => string_entries(items),
            _ => Vec::new(),
        };

        Ok(Self {
            sufficient,
            queries,
        })
    }

    /// Queries not already present in the set just searched.
    pub fn next_queries(&self, searched: &[String]) -> Vec<String> {
        self.queries
            .iter()
            .filter(|query| !searched.contains(query))
            .cloned()
            .collect()
    }
}

fn string_entries(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(ToString::to_string)
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

//! Mock implementations for testing.
//!
//! Mock LLM clients, factories, search and research collaborators shared
//! across the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use deepdive::llm::{LLMClient, LLMClientFactory};
use deepdive::research::{
    ActivityStatus, ActivityTracker, ActivityType, ResearchState, ResearchSteps,
};
use deepdive::tools::{SearchHit, WebSearch};
use deepdive::types::{AppError, Finding, Result, SearchResult};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

// ============= LLM Mocks =============

/// Produces a reply from `(model, system, prompt)`.
pub type Responder = Arc<dyn Fn(&str, &str, &str) -> Result<String> + Send + Sync>;

/// One recorded model call.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
}

/// Mock LLM client bound to one model name.
pub struct MockLLMClient {
    model: String,
    should_fail: bool,
    responder: Responder,
    calls: Arc<Mutex<Vec<ModelCall>>>,
}

impl MockLLMClient {
    fn reply(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        self.calls.lock().push(ModelCall {
            model: self.model.clone(),
            system: system.map(ToString::to_string),
            prompt: prompt.to_string(),
        });
        if self.should_fail {
            return Err(AppError::LLM(format!("Mock failure for {}", self.model)));
        }
        (self.responder)(&self.model, system.unwrap_or_default(), prompt)
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.reply(None, prompt)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.reply(Some(system), prompt)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock factory with per-model failure injection and call recording.
#[derive(Clone)]
pub struct MockFactory {
    responder: Responder,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<ModelCall>>>,
}

impl MockFactory {
    /// Every model answers with the same text.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::with_responder(move |_, _, _| Ok(text.clone()))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every call to `model` fail.
    pub fn failing_model(self, model: &str) -> Self {
        self.failing.lock().insert(model.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().clone()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.model).collect()
    }
}

impl LLMClientFactory for MockFactory {
    fn create(&self, model: &str) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(MockLLMClient {
            model: model.to_string(),
            should_fail: self.failing.lock().contains(model),
            responder: self.responder.clone(),
            calls: self.calls.clone(),
        }))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

// ============= Search Mock =============

/// Canned search hits keyed by query. Unknown queries fail.
#[derive(Default)]
pub struct MockSearch {
    hits: HashMap<String, Vec<SearchHit>>,
    pages: HashMap<String, String>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, query: &str, url: &str, snippet: &str) -> Self {
        self.hits
            .entry(query.to_string())
            .or_default()
            .push(SearchHit {
                title: format!("Page at {}", url),
                url: url.to_string(),
                description: snippet.to_string(),
            });
        self
    }

    pub fn with_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.hits
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .ok_or_else(|| AppError::Search(format!("No results for {}", query)))
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Search(format!("Failed to fetch {}", url)))
    }
}

// ============= Research Step Mocks =============

/// Scripted [`ResearchSteps`] for driving the coordinator.
///
/// Searches return `results_per_query` results (one by default) unless the
/// query is marked failing.
/// Each result becomes one finding. Analyses are replayed in order; once the
/// script runs out every analysis reports sufficient.
pub struct ScriptedSteps {
    plan: Value,
    failing_queries: HashSet<String>,
    results_per_query: usize,
    analyses: Mutex<VecDeque<Value>>,
    fail_processing: bool,
    fail_analysis: bool,
    pub searched: Mutex<Vec<String>>,
    pub processed_batches: Mutex<Vec<usize>>,
    pub analyzed_rounds: Mutex<Vec<Vec<String>>>,
    pub findings_at_analysis: Mutex<Vec<usize>>,
    pub reports: Mutex<usize>,
}

impl ScriptedSteps {
    pub fn new(plan: Value) -> Self {
        Self {
            plan,
            failing_queries: HashSet::new(),
            results_per_query: 1,
            analyses: Mutex::new(VecDeque::new()),
            fail_processing: false,
            fail_analysis: false,
            searched: Mutex::new(Vec::new()),
            processed_batches: Mutex::new(Vec::new()),
            analyzed_rounds: Mutex::new(Vec::new()),
            findings_at_analysis: Mutex::new(Vec::new()),
            reports: Mutex::new(0),
        }
    }

    pub fn with_queries(queries: &[&str]) -> Self {
        Self::new(json!({ "searchQueries": queries }))
    }

    pub fn then_analysis(self, analysis: Value) -> Self {
        self.analyses.lock().push_back(analysis);
        self
    }

    pub fn failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn results_per_query(mut self, count: usize) -> Self {
        self.results_per_query = count;
        self
    }

    pub fn failing_processing(mut self) -> Self {
        self.fail_processing = true;
        self
    }

    pub fn failing_analysis(mut self) -> Self {
        self.fail_analysis = true;
        self
    }
}

#[async_trait]
impl ResearchSteps for ScriptedSteps {
    async fn generate_search_queries(
        &self,
        _state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Value> {
        tracker.add(ActivityType::Planning, ActivityStatus::Complete, "planned");
        Ok(self.plan.clone())
    }

    async fn search(
        &self,
        query: &str,
        _state: &ResearchState,
        _tracker: &dyn ActivityTracker,
    ) -> Result<Vec<SearchResult>> {
        self.searched.lock().push(query.to_string());
        if self.failing_queries.contains(query) {
            return Err(AppError::Search(format!("search for {} failed", query)));
        }
        Ok((1..=self.results_per_query)
            .map(|n| SearchResult {
                title: format!("{} #{}", query, n),
                url: format!("https://example.com/{}/{}", query, n),
                content: format!("content about {} ({})", query, n),
            })
            .collect())
    }

    async fn process_search_results(
        &self,
        results: Vec<SearchResult>,
        _state: &ResearchState,
        _tracker: &dyn ActivityTracker,
    ) -> Result<Vec<Finding>> {
        self.processed_batches.lock().push(results.len());
        if self.fail_processing {
            return Err(AppError::LLM("extraction exploded".to_string()));
        }
        Ok(results
            .into_iter()
            .map(|r| Finding::new(r.content, r.url))
            .collect())
    }

    async fn analyze_findings(
        &self,
        state: &ResearchState,
        queries_used: &[String],
        _iteration: usize,
        _tracker: &dyn ActivityTracker,
    ) -> Result<Value> {
        self.analyzed_rounds.lock().push(queries_used.to_vec());
        self.findings_at_analysis.lock().push(state.findings.len());
        if self.fail_analysis {
            return Err(AppError::LLM("analysis exploded".to_string()));
        }
        Ok(self
            .analyses
            .lock()
            .pop_front()
            .unwrap_or_else(|| json!({ "sufficient": true })))
    }

    async fn generate_report(
        &self,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<String> {
        *self.reports.lock() += 1;
        tracker.add(ActivityType::Report, ActivityStatus::Complete, "report");
        Ok(format!(
            "# {}\n\n{} findings",
            state.topic(),
            state.findings.len()
        ))
    }
}

// ============= Trackers =============

/// Records every activity.
#[derive(Default)]
pub struct RecordingTracker {
    pub events: Mutex<Vec<(ActivityType, ActivityStatus, String)>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self, status: ActivityStatus) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(_, s, _)| *s == status)
            .map(|(_, _, message)| message.clone())
            .collect()
    }
}

impl ActivityTracker for RecordingTracker {
    fn add(&self, activity_type: ActivityType, status: ActivityStatus, message: &str) {
        self.events
            .lock()
            .push((activity_type, status, message.to_string()));
    }
}

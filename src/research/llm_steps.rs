//! Default [`ResearchSteps`] implementation
//!
//! Every model call goes through [`ModelFallback`] and is retried up to
//! `max_retry_attempts` times. Each prompt is a variable body (page content,
//! combined findings) wrapped in fixed instructions. The body budget starts
//! at `max_content_chars` and halves after each failed attempt; an oversized
//! body is truncated before the retry, never before the first attempt.

use crate::{
    llm::{LLMClientFactory, ModelFallback, TaskCategory},
    research::{
        activity::{ActivityStatus, ActivityTracker, ActivityType},
        state::ResearchState,
        steps::{AnalysisResult, ResearchSteps},
        utils::{
            capture_error, combine_findings, delay, extract_json, log_attempt_failure,
            log_prompt_reduction, truncate_chars,
        },
    },
    tools::{SearchHit, WebSearch},
    types::{AppError, Finding, Result, SearchResult},
    utils::ResearchLimits,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;

/// Prompts are never reduced below this many characters.
const MIN_PROMPT_CHARS: usize = 1_000;

const PLANNING_SYSTEM: &str = "You are a research planner. \
    Respond only with a JSON object of the form {\"searchQueries\": [\"...\"]}.";

const EXTRACTION_SYSTEM: &str = "You extract the facts from a web page that are relevant \
    to a research topic. Respond with a concise plain-text summary.";

const ANALYSIS_SYSTEM: &str = "You judge whether research findings answer a topic. \
    Respond only with a JSON object of the form \
    {\"sufficient\": true|false, \"queries\": [\"...\"], \"gaps\": [\"...\"]}.";

const REPORT_SYSTEM: &str = "You write thorough, well-structured research reports in markdown, \
    citing the sources you were given.";

pub struct LlmResearchSteps {
    factory: Arc<dyn LLMClientFactory>,
    fallback: ModelFallback,
    search: Arc<dyn WebSearch>,
    limits: ResearchLimits,
}

impl LlmResearchSteps {
    pub fn new(
        factory: Arc<dyn LLMClientFactory>,
        fallback: ModelFallback,
        search: Arc<dyn WebSearch>,
        limits: ResearchLimits,
    ) -> Self {
        Self {
            factory,
            fallback,
            search,
            limits,
        }
    }

    async fn call_model(&self, task: TaskCategory, system: &str, prompt: &str) -> Result<String> {
        self.fallback
            .dispatch(task, |model| async move {
                let client = self.factory.create(&model)?;
                client.generate_with_system(system, prompt).await
            })
            .await
    }

    /// Call a model and parse its reply, retrying on failure.
    ///
    /// `render` wraps `body` into the full prompt. Only `body` is truncated.
    #[allow(clippy::too_many_arguments)]
    async fn generate_with_retry<T, R, P>(
        &self,
        task: TaskCategory,
        activity_type: ActivityType,
        system: &str,
        body: String,
        render: R,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
        parse: P,
    ) -> Result<T>
    where
        R: Fn(&str) -> String + Send + Sync,
        P: Fn(&str) -> Result<T> + Send + Sync,
        T: Send,
    {
        let mut body = body;
        let mut budget = self.limits.max_content_chars;
        let mut last_error = None;

        for attempt in 0..self.limits.max_retry_attempts {
            if attempt > 0 && body.chars().count() > budget {
                body = truncate_chars(&body, budget);
                log_prompt_reduction(tracker, activity_type, &render(&body));
            }
            let prompt = render(&body);

            let outcome = match self.call_model(task, system, &prompt).await {
                Ok(reply) => {
                    state
                        .progress
                        .add_tokens(estimate_tokens(&prompt) + estimate_tokens(&reply));
                    parse(&reply)
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    log_attempt_failure(tracker, activity_type, attempt, &e.to_string());
                    last_error = Some(e);
                    if attempt + 1 < self.limits.max_retry_attempts {
                        let floor = MIN_PROMPT_CHARS.min(self.limits.max_content_chars);
                        budget = (budget / 2).max(floor);
                        delay(self.limits.retry_delay()).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(AppError::AllModelsFailed(task)))
    }

    async fn fetch_result(&self, hit: SearchHit) -> Option<SearchResult> {
        let content = match self.search.fetch(&hit.url).await {
            Ok(page) if !page.trim().is_empty() => page,
            Ok(_) => hit.description.clone(),
            Err(e) => {
                tracing::debug!(url = %hit.url, error = %e, "Falling back to search snippet");
                hit.description.clone()
            }
        };

        if content.trim().is_empty() {
            return None;
        }

        Some(SearchResult {
            title: hit.title,
            url: hit.url,
            content: truncate_chars(&content, self.limits.max_content_chars),
        })
    }

    async fn extract_finding(
        &self,
        result: &SearchResult,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Option<Finding> {
        let render = |content: &str| {
            format!(
                "Research topic: {}\n\nSource title: {}\nSource URL: {}\n\nContent:\n{}\n\n\
                 Summarize the facts in this content that help answer the research topic.",
                state.topic(),
                result.title,
                result.url,
                content
            )
        };

        match self
            .generate_with_retry(
                TaskCategory::Extraction,
                ActivityType::Extract,
                EXTRACTION_SYSTEM,
                result.content.clone(),
                render,
                state,
                tracker,
                non_empty_text,
            )
            .await
        {
            Ok(summary) => Some(Finding::new(summary, result.url.clone())),
            Err(e) => capture_error(
                e,
                &format!("Extraction from {}", result.url),
                Some(tracker),
                Some(ActivityType::Extract),
                None,
            ),
        }
    }
}

#[async_trait]
impl ResearchSteps for LlmResearchSteps {
    async fn generate_search_queries(
        &self,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Value> {
        tracker.add(
            ActivityType::Planning,
            ActivityStatus::Pending,
            "Planning research queries",
        );

        let clarifications = state
            .clarifications
            .iter()
            .map(|c| format!("- {} {}", c.question, c.answer))
            .collect::<Vec<_>>()
            .join("\n");
        let context = format!(
            "Research topic: {}\n\nClarifications:\n{}",
            state.topic(),
            if clarifications.is_empty() {
                "(none)"
            } else {
                clarifications.as_str()
            }
        );
        let render = |context: &str| {
            format!(
                "{}\n\nGenerate 3-5 diverse web search queries that together cover the topic.",
                context
            )
        };

        match self
            .generate_with_retry(
                TaskCategory::Planning,
                ActivityType::Planning,
                PLANNING_SYSTEM,
                context,
                render,
                state,
                tracker,
                extract_json,
            )
            .await
        {
            Ok(plan) => {
                let planned = plan
                    .get("searchQueries")
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                state.progress.add_steps(planned as u32);
                tracker.add(
                    ActivityType::Planning,
                    ActivityStatus::Complete,
                    &format!("Planned {} search queries", planned),
                );
                Ok(plan)
            }
            Err(e) => Ok(capture_error(
                e,
                "Research planning",
                Some(tracker),
                Some(ActivityType::Planning),
                Value::Null,
            )),
        }
    }

    async fn search(
        &self,
        query: &str,
        _state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Vec<SearchResult>> {
        tracker.add(
            ActivityType::Search,
            ActivityStatus::Pending,
            &format!("Searching for \"{}\"", query),
        );

        let hits = match self
            .search
            .search(query, self.limits.max_search_results)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                tracker.add(
                    ActivityType::Search,
                    ActivityStatus::Error,
                    &format!("Search for \"{}\" failed: {}", query, e),
                );
                return Err(e);
            }
        };

        let results: Vec<SearchResult> = join_all(
            hits.into_iter()
                .take(self.limits.max_search_results)
                .map(|hit| self.fetch_result(hit)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        tracker.add(
            ActivityType::Search,
            ActivityStatus::Complete,
            &format!("Found {} results for \"{}\"", results.len(), query),
        );

        Ok(results)
    }

    async fn process_search_results(
        &self,
        results: Vec<SearchResult>,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<Vec<Finding>> {
        if results.is_empty() {
            tracker.add(
                ActivityType::Extract,
                ActivityStatus::Warning,
                "No search results to process",
            );
            return Ok(Vec::new());
        }

        tracker.add(
            ActivityType::Extract,
            ActivityStatus::Pending,
            &format!("Extracting findings from {} results", results.len()),
        );

        let findings: Vec<Finding> = join_all(
            results
                .iter()
                .map(|result| self.extract_finding(result, state, tracker)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        tracker.add(
            ActivityType::Extract,
            ActivityStatus::Complete,
            &format!("Extracted {} findings", findings.len()),
        );

        Ok(findings)
    }

    async fn analyze_findings(
        &self,
        state: &ResearchState,
        queries_used: &[String],
        iteration: usize,
        tracker: &dyn ActivityTracker,
    ) -> Result<Value> {
        tracker.add(
            ActivityType::Analyze,
            ActivityStatus::Pending,
            &format!(
                "Analyzing findings (iteration {} of {})",
                iteration, self.limits.max_iterations
            ),
        );

        let searched = queries_used
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n");
        let render = |findings: &str| {
            format!(
                "Research topic: {}\n\nQueries just searched:\n{}\n\n\
                 This is iteration {} of at most {}.\n\nFindings so far:\n{}\n\n\
                 Decide whether the findings are sufficient to write a complete report. \
                 If not, propose new search queries that fill the gaps.",
                state.topic(),
                searched,
                iteration,
                self.limits.max_iterations,
                findings
            )
        };

        match self
            .generate_with_retry(
                TaskCategory::Analysis,
                ActivityType::Analyze,
                ANALYSIS_SYSTEM,
                combine_findings(&state.findings),
                render,
                state,
                tracker,
                extract_json,
            )
            .await
        {
            Ok(analysis) => {
                let sufficient = AnalysisResult::validate(analysis.clone())
                    .is_ok_and(|result| result.sufficient);
                tracker.add(
                    ActivityType::Analyze,
                    ActivityStatus::Complete,
                    if sufficient {
                        "Findings are sufficient"
                    } else {
                        "More research needed"
                    },
                );
                Ok(analysis)
            }
            Err(e) => Ok(capture_error(
                e,
                "Findings analysis",
                Some(tracker),
                Some(ActivityType::Analyze),
                json!({ "sufficient": false, "queries": [] }),
            )),
        }
    }

    async fn generate_report(
        &self,
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Result<String> {
        tracker.add(
            ActivityType::Report,
            ActivityStatus::Pending,
            "Generating report",
        );

        let render = |findings: &str| {
            format!(
                "Research topic: {}\n\nFindings:\n{}\n\n\
                 Write the final research report.",
                state.topic(),
                findings
            )
        };

        let report = self
            .generate_with_retry(
                TaskCategory::Report,
                ActivityType::Report,
                REPORT_SYSTEM,
                combine_findings(&state.findings),
                render,
                state,
                tracker,
                non_empty_text,
            )
            .await
            .inspect_err(|e| {
                tracker.add(
                    ActivityType::Report,
                    ActivityStatus::Error,
                    &format!("Report generation failed: {}", e),
                );
            })?;

        tracker.add(
            ActivityType::Report,
            ActivityStatus::Complete,
            "Report generated",
        );

        Ok(report)
    }
}

fn non_empty_text(reply: &str) -> Result<String> {
    let text = reply.trim();
    if text.is_empty() {
        return Err(AppError::LLM("Model returned an empty reply".to_string()));
    }
    Ok(text.to_string())
}

/// Rough token count, four characters per token.
fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text() {
        assert_eq!(non_empty_text("  summary \n").unwrap(), "summary");
        assert!(non_empty_text(" \n ").is_err());
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}

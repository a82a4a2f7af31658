use crate::{
    research::{
        activity::{ActivityTracker, StreamTracker},
        state::ResearchState,
        steps::{AnalysisResult, QueryPlan, ResearchSteps},
        stream::{DataStream, StreamMessage},
    },
    types::{Result, SearchResult},
};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Why the loop stopped. None of these is an error; every one proceeds to
/// the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Analysis judged the findings sufficient.
    Sufficient,
    /// Analysis proposed nothing outside the set just searched.
    NoNewQueries,
    /// The iteration budget ran out.
    MaxIterations,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Termination::Sufficient => "sufficient",
            Termination::NoNewQueries => "no_new_queries",
            Termination::MaxIterations => "max_iterations",
        };
        f.write_str(name)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct ResearchRun {
    /// The first-round plan, as returned by query generation.
    pub initial_plan: QueryPlan,
    /// Rounds executed, never more than the configured maximum.
    pub iterations: usize,
    pub termination: Termination,
    pub report: String,
}

/// Drives bounded research rounds over a [`ResearchSteps`] implementation.
pub struct ResearchCoordinator {
    steps: Arc<dyn ResearchSteps>,
    max_iterations: usize,
}

impl ResearchCoordinator {
    pub fn new(steps: Arc<dyn ResearchSteps>, max_iterations: usize) -> Self {
        Self {
            steps,
            max_iterations,
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Execute deep research on `state.topic()`, reporting through `stream`.
    ///
    /// Returns the initial query plan.
    pub async fn research(
        &self,
        state: &mut ResearchState,
        stream: Arc<dyn DataStream>,
    ) -> Result<QueryPlan> {
        self.run_streaming(state, stream)
            .await
            .map(|run| run.initial_plan)
    }

    /// Like [`research`](Self::research) but returns the whole run summary.
    pub async fn run_streaming(
        &self,
        state: &mut ResearchState,
        stream: Arc<dyn DataStream>,
    ) -> Result<ResearchRun> {
        let tracker = StreamTracker::new(stream.clone(), state.progress.clone());
        self.run(state, stream.as_ref(), &tracker).await
    }

    /// Run the full loop with an explicit tracker.
    ///
    /// Query generation and report failures abort the run, as do processing
    /// and analysis failures. Individual search failures are dropped.
    pub async fn run(
        &self,
        state: &mut ResearchState,
        stream: &dyn DataStream,
        tracker: &dyn ActivityTracker,
    ) -> Result<ResearchRun> {
        // Step 1: Generate initial search queries
        let raw_plan = self.steps.generate_search_queries(state, tracker).await?;
        let initial_plan = QueryPlan::from_value(raw_plan)?;

        let mut current_queries = initial_plan.search_queries.clone();
        let mut iteration = 0;
        let mut termination = if current_queries.is_empty() {
            Termination::NoNewQueries
        } else {
            Termination::MaxIterations
        };

        while !current_queries.is_empty() && iteration < self.max_iterations {
            iteration += 1;
            tracing::info!(
                "Research iteration {}/{} with {} queries",
                iteration,
                self.max_iterations,
                current_queries.len()
            );

            let results = self.search_all(&current_queries, state, tracker).await;
            tracing::debug!(results = results.len(), "Search round settled");

            let new_findings = self
                .steps
                .process_search_results(results, state, tracker)
                .await?;
            state.findings.extend(new_findings);
            tracing::debug!(total = state.findings.len(), "Findings collected so far");

            let raw_analysis = self
                .steps
                .analyze_findings(state, &current_queries, iteration, tracker)
                .await?;
            let analysis = AnalysisResult::validate(raw_analysis).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding malformed analysis result");
                AnalysisResult::default()
            });

            if analysis.sufficient {
                tracing::info!("Sufficient information gathered after iteration {}", iteration);
                termination = Termination::Sufficient;
                break;
            }

            current_queries = analysis.next_queries(&current_queries);
            if current_queries.is_empty() {
                tracing::info!("No new queries generated, ending research");
                termination = Termination::NoNewQueries;
                break;
            }
        }

        tracing::info!(
            iterations = iteration,
            termination = %termination,
            findings = state.findings.len(),
            "Research loop finished"
        );

        let report = self.steps.generate_report(state, tracker).await?;
        stream.write_data(StreamMessage::Report(report.clone()));

        Ok(ResearchRun {
            initial_plan,
            iterations: iteration,
            termination,
            report,
        })
    }

    /// Fan out one search per query and wait for all of them to settle.
    ///
    /// Failed and empty searches are dropped; the rest are flattened in query
    /// order.
    async fn search_all(
        &self,
        queries: &[String],
        state: &ResearchState,
        tracker: &dyn ActivityTracker,
    ) -> Vec<SearchResult> {
        let outcomes = join_all(
            queries
                .iter()
                .map(|query| self.steps.search(query, state, tracker)),
        )
        .await;

        queries
            .iter()
            .zip(outcomes)
            .filter_map(|(query, outcome)| match outcome {
                Ok(results) if !results.is_empty() => Some(results),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(query = %query, error = %e, "Dropping failed search");
                    None
                }
            })
            .flatten()
            .collect()
    }
}

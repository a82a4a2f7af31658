//! Iterative Research Coordination
//!
//! This module turns a topic into search queries, fans the queries out
//! concurrently, accumulates findings, asks an analysis model whether enough
//! is known, and either stops with a report or refines the queries for
//! another round.
//!
//! # Architecture
//!
//! - [`coordinator::ResearchCoordinator`] - Runs the bounded round loop
//! - [`steps::ResearchSteps`] - The collaborator contract (planning, search,
//!   extraction, analysis, report)
//! - [`llm_steps::LlmResearchSteps`] - Default collaborators backed by
//!   [`ModelFallback`](crate::llm::ModelFallback) and web search
//! - [`activity`] and [`stream`] - Progress events and the output sink
//!
//! # Usage
//!
//! ```ignore
//! use deepdive::research::{ResearchCoordinator, ResearchState, MemoryStream};
//!
//! let coordinator = ResearchCoordinator::new(steps, config.research.max_iterations);
//! let stream = Arc::new(MemoryStream::new());
//! let mut state = ResearchState::new("What limits solid-state battery lifetimes?");
//!
//! let run = coordinator.run_streaming(&mut state, stream.clone()).await?;
//! println!("{}", run.report);
//! ```
//!
//! # Research Workflow
//!
//! 1. **Planning** - Generate the first round of search queries
//! 2. **Search** - Run every query concurrently; failed searches are dropped
//! 3. **Extraction** - Summarize results into findings
//! 4. **Analysis** - Stop when sufficient, otherwise take the new queries
//! 5. **Report** - Synthesize all findings, whatever ended the loop

/// Progress events and trackers.
pub mod activity;
/// Bounded round loop.
pub mod coordinator;
/// Model- and search-backed collaborators.
pub mod llm_steps;
/// Mutable run state.
pub mod state;
/// Collaborator contract and validated result shapes.
pub mod steps;
/// Output sink for activities and the final report.
pub mod stream;
/// Error capture, retry logging and findings formatting.
pub mod utils;

pub use activity::{ActivityEvent, ActivityStatus, ActivityTracker, ActivityType, StreamTracker};
pub use coordinator::{ResearchCoordinator, ResearchRun, Termination};
pub use llm_steps::LlmResearchSteps;
pub use state::{ProgressSnapshot, ResearchProgress, ResearchState};
pub use steps::{AnalysisResult, MalformedAnalysis, QueryPlan, ResearchSteps};
pub use stream::{ChannelStream, DataStream, MemoryStream, StreamMessage};

use crate::types::{Clarification, Finding};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Step and token counters shared between a run and its collaborators.
///
/// Collaborators only hold shared references to the state while searches are
/// in flight, so the counters are atomics.
#[derive(Debug, Default)]
pub struct ResearchProgress {
    completed_steps: AtomicU32,
    total_steps: AtomicU32,
    tokens_used: AtomicU64,
}

/// Point-in-time copy of [`ResearchProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub completed_steps: u32,
    pub total_steps: u32,
    pub tokens_used: u64,
}

impl ResearchProgress {
    pub fn complete_step(&self) {
        self.completed_steps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_steps(&self, steps: u32) {
        self.total_steps.fetch_add(steps, Ordering::Relaxed);
    }

    pub fn add_tokens(&self, tokens: u64) {
        self.tokens_used.fetch_add(tokens, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed_steps: self.completed_steps.load(Ordering::Relaxed),
            total_steps: self.total_steps.load(Ordering::Relaxed),
            tokens_used: self.tokens_used.load(Ordering::Relaxed),
        }
    }
}

/// Accumulator threaded through every round of a run.
///
/// `findings` is append-only and kept in discovery order; the coordinator is
/// the only writer.
#[derive(Debug, Clone)]
pub struct ResearchState {
    topic: String,
    pub clarifications: Vec<Clarification>,
    pub findings: Vec<Finding>,
    pub progress: Arc<ResearchProgress>,
}

impl ResearchState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            clarifications: Vec::new(),
            findings: Vec::new(),
            progress: Arc::new(ResearchProgress::default()),
        }
    }

    pub fn with_clarifications(mut self, clarifications: Vec<Clarification>) -> Self {
        self.clarifications = clarifications;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

//! Ordered model fallback
//!
//! Every LLM-backed research step names a [`TaskCategory`]. The
//! [`ModelFallback`] dispatcher looks up the ordered candidate list for that
//! category and tries each model in turn until one invocation succeeds.
//!
//! ```rust,ignore
//! let fallback = ModelFallback::new(ModelCandidates::default());
//! let text = fallback
//!     .dispatch(TaskCategory::Planning, |model| async move {
//!         factory.create(&model)?.generate(&prompt).await
//!     })
//!     .await?;
//! ```

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Free model tried first for every task.
pub const FREE_MODEL: &str = "mistralai/mistral-7b-instruct";

/// Paid model used when the free one is unavailable.
pub const FALLBACK_MODEL: &str = "openai/gpt-3.5-turbo";

/// Category of work a model call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Planning,
    Extraction,
    Analysis,
    Report,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::Planning,
        TaskCategory::Extraction,
        TaskCategory::Analysis,
        TaskCategory::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Planning => "PLANNING",
            TaskCategory::Extraction => "EXTRACTION",
            TaskCategory::Analysis => "ANALYSIS",
            TaskCategory::Report => "REPORT",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-category candidate lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates {
    by_task: HashMap<TaskCategory, Vec<String>>,
    default_model: String,
}

impl ModelCandidates {
    /// Candidates with no per-task lists; every task uses `default_model` alone.
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            by_task: HashMap::new(),
            default_model: default_model.into(),
        }
    }

    /// Set the ordered list for one task category.
    pub fn with_task<I, S>(mut self, task: TaskCategory, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_task
            .insert(task, models.into_iter().map(Into::into).collect());
        self
    }

    /// Ordered candidates for `task`.
    ///
    /// An unconfigured or empty list degrades to the single default model.
    pub fn candidates(&self, task: TaskCategory) -> Vec<&str> {
        match self.by_task.get(&task) {
            Some(models) if !models.is_empty() => models.iter().map(String::as_str).collect(),
            _ => vec![self.default_model.as_str()],
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

impl Default for ModelCandidates {
    fn default() -> Self {
        TaskCategory::ALL
            .iter()
            .fold(Self::new(FREE_MODEL), |candidates, task| {
                candidates.with_task(*task, [FREE_MODEL, FALLBACK_MODEL])
            })
    }
}

/// First-success-wins dispatcher over [`ModelCandidates`].
#[derive(Debug, Clone)]
pub struct ModelFallback {
    candidates: Arc<ModelCandidates>,
}

impl ModelFallback {
    pub fn new(candidates: ModelCandidates) -> Self {
        Self {
            candidates: Arc::new(candidates),
        }
    }

    pub fn candidates(&self) -> &ModelCandidates {
        &self.candidates
    }

    /// Invoke `invoke` with each candidate model for `task`, strictly in order.
    ///
    /// Returns the first successful result unmodified. Each failed candidate
    /// produces one warning log. When every candidate fails the error is
    /// [`AppError::AllModelsFailed`] carrying `task`.
    pub async fn dispatch<T, F, Fut>(&self, task: TaskCategory, mut invoke: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for model in self.candidates.candidates(task) {
            match invoke(model.to_string()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        task = %task,
                        model = %model,
                        error = %e,
                        "Model call failed for {}, trying fallback",
                        model
                    );
                }
            }
        }

        Err(AppError::AllModelsFailed(task))
    }
}

impl Default for ModelFallback {
    fn default() -> Self {
        Self::new(ModelCandidates::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_default_candidates_order() {
        let candidates = ModelCandidates::default();
        for task in TaskCategory::ALL {
            assert_eq!(candidates.candidates(task), vec![FREE_MODEL, FALLBACK_MODEL]);
        }
    }

    #[test]
    fn test_unconfigured_task_uses_default_model() {
        let candidates = ModelCandidates::new("solo-model")
            .with_task(TaskCategory::Planning, ["a", "b"])
            .with_task(TaskCategory::Report, Vec::<String>::new());

        assert_eq!(candidates.candidates(TaskCategory::Planning), vec!["a", "b"]);
        assert_eq!(candidates.candidates(TaskCategory::Analysis), vec!["solo-model"]);
        assert_eq!(candidates.candidates(TaskCategory::Report), vec!["solo-model"]);
    }

    #[test]
    fn test_task_category_serde_names() {
        let json = serde_json::to_string(&TaskCategory::Extraction).unwrap();
        assert_eq!(json, "\"EXTRACTION\"");
        let parsed: TaskCategory = serde_json::from_str("\"REPORT\"").unwrap();
        assert_eq!(parsed, TaskCategory::Report);
    }

    #[tokio::test]
    async fn test_first_success_stops_iteration() {
        let fallback = ModelFallback::new(
            ModelCandidates::new("x").with_task(TaskCategory::Planning, ["a", "b", "c"]),
        );
        let tried = Mutex::new(Vec::new());

        let result = fallback
            .dispatch(TaskCategory::Planning, |model| {
                tried.lock().push(model.clone());
                async move {
                    if model == "a" {
                        Err(AppError::LLM("unavailable".into()))
                    } else {
                        Ok(format!("answer from {}", model))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, "answer from b");
        assert_eq!(*tried.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_all_candidates_fail() {
        let fallback = ModelFallback::default();

        let result: Result<String> = fallback
            .dispatch(TaskCategory::Report, |_model| async {
                Err(AppError::LLM("down".into()))
            })
            .await;

        match result {
            Err(AppError::AllModelsFailed(task)) => assert_eq!(task, TaskCategory::Report),
            other => panic!("expected AllModelsFailed, got {:?}", other),
        }
    }
}

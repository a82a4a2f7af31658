//! # deepdive - Iterative Deep Research Server
//!
//! Turns a research topic into a markdown report by planning web searches,
//! summarizing what they return, and asking an analysis model whether the
//! evidence is sufficient or more rounds are needed.
//!
//! ## Overview
//!
//! deepdive can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `deepdive` binary
//! 2. **As a library** - Drive [`ResearchCoordinator`] with your own collaborators
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use deepdive::{AppState, DeepDiveConfig};
//! use deepdive::research::{MemoryStream, ResearchCoordinator, ResearchState};
//! use std::sync::Arc;
//!
//! let config = DeepDiveConfig::load_or_default("deepdive.toml")?;
//! let state = AppState::from_config(config);
//!
//! let coordinator = ResearchCoordinator::new(state.steps.clone(), 3);
//! let mut research = ResearchState::new("History of the transistor");
//! let run = coordinator
//!     .run_streaming(&mut research, Arc::new(MemoryStream::new()))
//!     .await?;
//! println!("{}", run.report);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`llm`] - LLM client, OpenRouter provider and model fallback
//! - [`research`] - The research round loop and its collaborators
//! - [`tools`] - Web search
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

/// HTTP API handlers and routes.
pub mod api;
/// LLM clients and per-task model fallback.
pub mod llm;
/// Iterative research coordination.
pub mod research;
/// Web search and page fetching.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, LLMClientFactory, ModelFallback, OpenRouterFactory, TaskCategory};
pub use research::{ResearchCoordinator, ResearchSteps};
pub use tools::{DaedraSearch, WebSearch};
pub use types::{AppError, Result};
pub use utils::toml_config::DeepDiveConfig;

use crate::research::LlmResearchSteps;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded TOML configuration
    pub config: Arc<DeepDiveConfig>,
    /// Creates a client per model name
    pub llm_factory: Arc<dyn LLMClientFactory>,
    /// Per-task model candidates
    pub fallback: ModelFallback,
    /// Collaborators driven by the research loop
    pub steps: Arc<dyn ResearchSteps>,
}

impl AppState {
    /// Wire the default model- and search-backed collaborators.
    pub fn new(
        config: DeepDiveConfig,
        llm_factory: Arc<dyn LLMClientFactory>,
        search: Arc<dyn WebSearch>,
    ) -> Self {
        let fallback = ModelFallback::new(config.models.candidates());
        let steps = Arc::new(LlmResearchSteps::new(
            llm_factory.clone(),
            fallback.clone(),
            search,
            config.research.clone(),
        ));

        Self {
            config: Arc::new(config),
            llm_factory,
            fallback,
            steps,
        }
    }

    /// OpenRouter models and DuckDuckGo search, as configured.
    pub fn from_config(config: DeepDiveConfig) -> Self {
        let api_key = config.provider.api_key().unwrap_or_else(|| {
            tracing::warn!(
                "{} is not set; every model call will fail",
                config.provider.api_key_env
            );
            String::new()
        });
        let factory = Arc::new(OpenRouterFactory::new(
            api_key,
            config.provider.base_url.clone(),
            config.provider.temperature,
        ));

        Self::new(config, factory, Arc::new(DaedraSearch::new()))
    }

    /// Replace the research collaborators.
    pub fn with_steps(mut self, steps: Arc<dyn ResearchSteps>) -> Self {
        self.steps = steps;
        self
    }
}

//! LLM Provider Clients and Model Fallback
//!
//! This module provides a unified interface for interacting with the model
//! provider behind every research step.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait a provider client implements
//! - [`LLMClientFactory`] - Creates a client bound to one model identifier
//! - [`ModelFallback`] - Tries an ordered list of models per [`TaskCategory`]
//!   until one call succeeds
//!
//! # Example
//!
//! ```ignore
//! use deepdive::llm::{LLMClientFactory, ModelFallback, OpenRouterFactory, TaskCategory};
//!
//! let factory = OpenRouterFactory::new(api_key, "https://openrouter.ai/api/v1", 0.7);
//! let fallback = ModelFallback::default();
//!
//! let answer = fallback
//!     .dispatch(TaskCategory::Planning, |model| async {
//!         factory.create(&model)?.generate("What is 2+2?").await
//!     })
//!     .await?;
//! ```

/// Core LLM client and factory traits.
pub mod client;
/// Ordered model fallback per task category.
pub mod fallback;
/// OpenAI-compatible chat completions client (OpenRouter by default).
pub mod openrouter;

pub use client::{LLMClient, LLMClientFactory};
pub use fallback::{ModelCandidates, ModelFallback, TaskCategory};
pub use openrouter::{OpenRouterClient, OpenRouterFactory};

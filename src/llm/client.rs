//! LLM client abstractions
//!
//! Research steps only ever see these two traits. The concrete provider is
//! chosen once at startup; model identifiers are chosen per call by the
//! fallback dispatcher.

use crate::types::Result;
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Creates a client bound to one model identifier.
pub trait LLMClientFactory: Send + Sync {
    /// Build a client for `model`
    fn create(&self, model: &str) -> Result<Box<dyn LLMClient>>;

    /// Human-readable provider name, used in logs
    fn provider_name(&self) -> &str;
}

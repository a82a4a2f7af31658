//! OpenRouter client
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. OpenRouter is
//! the default, but a local Ollama (`http://localhost:11434/v1`) works with
//! the same client.

use crate::llm::client::{LLMClient, LLMClientFactory};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn parse_error_message(status: u16, payload: &Value) -> String {
    payload
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("OpenRouter request failed with status {status}"))
}

/// Client for a single OpenRouter model.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        base_url: String,
        model: String,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            api_key,
            base_url,
            model,
            temperature,
        }
    }

    async fn chat(&self, messages: Vec<Value>) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(endpoint(&self.base_url, "/chat/completions"))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", "DeepDive")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("OpenRouter request failed: {}", e)))?;

        let status = response.status();
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(AppError::LLM(parse_error_message(
                status.as_u16(),
                &payload,
            )));
        }

        payload
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .filter(|content| !content.trim().is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| AppError::LLM("No content returned from model.".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenRouterClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![json!({ "role": "user", "content": prompt })])
            .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            json!({ "role": "system", "content": system }),
            json!({ "role": "user", "content": prompt }),
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Builds [`OpenRouterClient`]s that share one connection pool.
#[derive(Clone)]
pub struct OpenRouterFactory {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    temperature: f32,
}

impl OpenRouterFactory {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, temperature: f32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            temperature,
        }
    }
}

impl LLMClientFactory for OpenRouterFactory {
    fn create(&self, model: &str) -> Result<Box<dyn LLMClient>> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::LLM("Missing OpenRouter API Key".to_string()));
        }

        Ok(Box::new(OpenRouterClient::new(
            self.http.clone(),
            self.api_key.clone(),
            self.base_url.clone(),
            model.to_string(),
            self.temperature,
        )))
    }

    fn provider_name(&self) -> &str {
        "OpenRouter"
    }
}

//! TOML-based configuration for DeepDive
//!
//! This module provides declarative configuration for the server, the model
//! provider, research limits and the per-task model candidate lists via a
//! TOML file (`deepdive.toml`). Values are fixed at process start.

use crate::llm::fallback::{ModelCandidates, TaskCategory, FALLBACK_MODEL, FREE_MODEL};
use crate::llm::openrouter::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from deepdive.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepDiveConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub research: ResearchLimits,

    #[serde(default)]
    pub models: ModelsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// ============= Research Limits =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchLimits {
    /// Maximum number of research rounds
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Maximum search hits kept per query
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Character budget for page content and prompts
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Attempts per LLM-backed step
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: usize,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_iterations() -> usize {
    3
}

fn default_max_search_results() -> usize {
    5
}

fn default_max_content_chars() -> usize {
    20_000
}

fn default_max_retry_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for ResearchLimits {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_search_results: default_max_search_results(),
            max_content_chars: default_max_content_chars(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ResearchLimits {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ============= Model Candidates =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model used for any task without its own list
    #[serde(default = "default_model")]
    pub default: String,

    #[serde(default = "default_candidates")]
    pub planning: Vec<String>,

    #[serde(default = "default_candidates")]
    pub extraction: Vec<String>,

    #[serde(default = "default_candidates")]
    pub analysis: Vec<String>,

    #[serde(default = "default_candidates")]
    pub report: Vec<String>,
}

fn default_model() -> String {
    FREE_MODEL.to_string()
}

fn default_candidates() -> Vec<String> {
    vec![FREE_MODEL.to_string(), FALLBACK_MODEL.to_string()]
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            planning: default_candidates(),
            extraction: default_candidates(),
            analysis: default_candidates(),
            report: default_candidates(),
        }
    }
}

impl ModelsConfig {
    /// Build the immutable candidate table handed to the fallback dispatcher
    pub fn candidates(&self) -> ModelCandidates {
        ModelCandidates::new(self.default.clone())
            .with_task(TaskCategory::Planning, self.planning.clone())
            .with_task(TaskCategory::Extraction, self.extraction.clone())
            .with_task(TaskCategory::Analysis, self.analysis.clone())
            .with_task(TaskCategory::Report, self.report.clone())
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DeepDiveConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: DeepDiveConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(path)) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.research.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.research.max_retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.research.max_content_chars == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_content_chars must be greater than 0".to_string(),
            ));
        }
        if self.models.default.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "models.default must name a model".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "provider.temperature {} is outside 0.0..=2.0",
                self.provider.temperature
            )));
        }

        Ok(())
    }
}

/// TOML-based configuration (server, provider, research limits, models).
pub mod toml_config;

pub use toml_config::{ConfigError, DeepDiveConfig, ModelsConfig, ResearchLimits};

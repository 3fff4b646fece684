//! Configuration management for the voice gateway
//!
//! Supports loading configuration from:
//! - config files (`config/default`, then `config/{env}`)
//! - Environment variables (`VOICE_GATEWAY` prefix, `__` separator)
//!
//! Settings are validated once at startup; the agent registry is built
//! from the loaded profiles and never changes afterwards.

pub mod agent;
pub mod settings;

pub use agent::{AgentProfile, AgentRegistry};
pub use settings::{
    load_settings, LlmProviderConfig, ObservabilityConfig, PipelineConfig, ProviderConfig,
    QuotaConfig, RuntimeEnvironment, ServerConfig, Settings, SttProviderConfig, TtsProviderConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

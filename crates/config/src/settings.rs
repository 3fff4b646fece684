//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::agent::AgentProfile;
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    /// Staging mode
    Staging,
    /// Production mode
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Pipeline configuration (stage timeouts, history depth)
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Collaborator service endpoints
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Quota accounting configuration
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Additional agent profiles, merged over the built-in ones
    #[serde(default)]
    pub agents: Vec<AgentProfile>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings before serving
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        for (field, value) in [
            (
                "pipeline.transcription_timeout_seconds",
                self.pipeline.transcription_timeout_seconds,
            ),
            (
                "pipeline.reply_timeout_seconds",
                self.pipeline.reply_timeout_seconds,
            ),
            (
                "pipeline.synthesis_timeout_seconds",
                self.pipeline.synthesis_timeout_seconds,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "timeout must be at least 1 second".to_string(),
                });
            }
        }

        if self.quota.default_daily_limit_seconds <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "quota.default_daily_limit_seconds".to_string(),
                message: "daily limit must be positive".to_string(),
            });
        }

        for profile in &self.agents {
            if profile.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "agents".to_string(),
                    message: "agent profile id must not be empty".to_string(),
                });
            }
            if profile.daily_quota_seconds <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("agents.{}.daily_quota_seconds", profile.id),
                    message: "daily quota must be positive".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted audio upload size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Timeout for the transcription stage (seconds)
    #[serde(default = "default_transcription_timeout")]
    pub transcription_timeout_seconds: u64,

    /// Timeout for the reply-generation stage (seconds)
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_seconds: u64,

    /// Timeout for the synthesis stage (seconds)
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_seconds: u64,

    /// Recent turns handed to the reply stage for continuity
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_transcription_timeout() -> u64 {
    30
}
fn default_reply_timeout() -> u64 {
    20
}
fn default_synthesis_timeout() -> u64 {
    30
}
fn default_history_turns() -> usize {
    8
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transcription_timeout_seconds: default_transcription_timeout(),
            reply_timeout_seconds: default_reply_timeout(),
            synthesis_timeout_seconds: default_synthesis_timeout(),
            history_turns: default_history_turns(),
        }
    }
}

/// Collaborator service endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// Speech-to-text service
    #[serde(default)]
    pub stt: SttProviderConfig,

    /// Reply-generation service
    #[serde(default)]
    pub llm: LlmProviderConfig,

    /// Speech-synthesis service
    #[serde(default)]
    pub tts: TtsProviderConfig,
}

/// Speech-to-text provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttProviderConfig {
    /// Service base URL
    #[serde(default = "default_stt_endpoint")]
    pub endpoint: String,

    /// Provider label used when the service does not report one
    #[serde(default = "default_stt_label")]
    pub provider_label: String,

    /// HTTP client timeout (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_stt_endpoint() -> String {
    "http://127.0.0.1:8091".to_string()
}
fn default_stt_label() -> String {
    "faster-whisper".to_string()
}
fn default_provider_timeout() -> u64 {
    60
}

impl Default for SttProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_stt_endpoint(),
            provider_label: default_stt_label(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Reply-generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Service base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model name/ID
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key (for hosted providers)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-p sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// HTTP client timeout (seconds)
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// Maximum retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff in milliseconds (doubles each retry)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_llm_model() -> String {
    "qwen2.5:7b-instruct-q4_K_M".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_llm_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    100
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Speech-synthesis provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsProviderConfig {
    /// Service base URL
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    /// Provider label used when the service does not report one
    #[serde(default = "default_tts_label")]
    pub provider_label: String,

    /// HTTP client timeout (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_tts_endpoint() -> String {
    "http://127.0.0.1:8092".to_string()
}
fn default_tts_label() -> String {
    "piper".to_string()
}

impl Default for TtsProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            provider_label: default_tts_label(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Quota accounting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Daily ceiling applied to agents without an explicit quota (seconds)
    #[serde(default = "default_daily_limit")]
    pub default_daily_limit_seconds: f64,

    /// Records untouched for this many days are evicted
    #[serde(default = "default_record_ttl_days")]
    pub record_ttl_days: i64,

    /// Interval between eviction sweeps (seconds)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_daily_limit() -> f64 {
    600.0
}
fn default_record_ttl_days() -> i64 {
    7
}
fn default_sweep_interval() -> u64 {
    3600
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_daily_limit_seconds: default_daily_limit(),
            record_ttl_days: default_record_ttl_days(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (VOICE_GATEWAY prefix)
/// 2. config/{env} (if env specified)
/// 3. config/default
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOICE_GATEWAY")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.pipeline.transcription_timeout_seconds, 30);
        assert_eq!(settings.quota.default_daily_limit_seconds, 600.0);
        assert!(settings.agents.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut settings = Settings::default();
        settings.pipeline.reply_timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_nonpositive_quota_rejected() {
        let mut settings = Settings::default();
        settings.quota.default_daily_limit_seconds = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_agent_id_rejected() {
        let mut settings = Settings::default();
        settings.agents.push(AgentProfile {
            id: "  ".to_string(),
            ..AgentProfile::default()
        });
        assert!(settings.validate().is_err());
    }
}

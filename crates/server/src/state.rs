//! Application state

use std::sync::Arc;
use std::time::Duration;

use voice_gateway_config::{AgentRegistry, Settings};
use voice_gateway_core::{QuotaStore, ReplyGenerator, SpeechSynthesizer, SpeechToText};
use voice_gateway_llm::{HttpReplyGenerator, ReplyBackendConfig};
use voice_gateway_pipeline::{
    ConversationLog, HttpSynthesizer, HttpTranscriber, PipelineOrchestrator, StageTimeouts,
    SynthesizerConfig, TranscriberConfig,
};
use voice_gateway_quota::{InMemoryQuotaStore, QuotaCeilings};

use crate::ServerError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub registry: Arc<AgentRegistry>,
    pub quota: Arc<InMemoryQuotaStore>,
    pub orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    /// Build the full component graph from settings
    pub fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let stt = HttpTranscriber::new(TranscriberConfig {
            endpoint: config.providers.stt.endpoint.clone(),
            provider_label: config.providers.stt.provider_label.clone(),
            timeout: Duration::from_secs(config.providers.stt.timeout_seconds),
        })
        .map_err(|e| ServerError::Startup(e.to_string()))?;

        let llm = HttpReplyGenerator::new(ReplyBackendConfig {
            endpoint: config.providers.llm.endpoint.clone(),
            model: config.providers.llm.model.clone(),
            api_key: config.providers.llm.api_key.clone(),
            temperature: config.providers.llm.temperature,
            top_p: config.providers.llm.top_p,
            timeout: Duration::from_secs(config.providers.llm.timeout_seconds),
            max_retries: config.providers.llm.max_retries,
            initial_backoff: Duration::from_millis(config.providers.llm.initial_backoff_ms),
        })
        .map_err(|e| ServerError::Startup(e.to_string()))?;

        let tts = HttpSynthesizer::new(SynthesizerConfig {
            endpoint: config.providers.tts.endpoint.clone(),
            provider_label: config.providers.tts.provider_label.clone(),
            timeout: Duration::from_secs(config.providers.tts.timeout_seconds),
        })
        .map_err(|e| ServerError::Startup(e.to_string()))?;

        Self::with_collaborators(config, Arc::new(stt), Arc::new(llm), Arc::new(tts))
    }

    /// Build state around injected collaborators (used by tests)
    pub fn with_collaborators(
        config: Settings,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn ReplyGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self, ServerError> {
        let registry = Arc::new(AgentRegistry::with_profiles(config.agents.clone()));
        let quota = Arc::new(InMemoryQuotaStore::new(QuotaCeilings::new(
            registry.quota_ceilings(),
            config.quota.default_daily_limit_seconds,
        )));
        let conversations = Arc::new(ConversationLog::new(config.pipeline.history_turns));
        let timeouts = StageTimeouts {
            transcription: Duration::from_secs(config.pipeline.transcription_timeout_seconds),
            reply: Duration::from_secs(config.pipeline.reply_timeout_seconds),
            synthesis: Duration::from_secs(config.pipeline.synthesis_timeout_seconds),
        };

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            registry.clone(),
            quota.clone() as Arc<dyn QuotaStore>,
            stt,
            llm,
            tts,
            conversations,
            timeouts,
        ));

        Ok(Self {
            config: Arc::new(config),
            registry,
            quota,
            orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_default_settings() {
        let state = AppState::from_settings(Settings::default()).unwrap();
        assert_eq!(state.registry.known_agents().len(), 2);
        assert_eq!(state.quota.record_count(), 0);
    }
}

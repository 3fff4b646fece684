//! Pipeline orchestrator
//!
//! Sequences admission, the three processing stages and settlement for one
//! request. Stages run strictly in order because each stage's output is
//! the next stage's input; the only await points are the collaborator
//! calls, each bounded by its own timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use voice_gateway_config::AgentRegistry;
use voice_gateway_core::{
    GatewayError, PipelineRequest, PipelineResult, QuotaStore, ReplyGenerator, ReplyRequest,
    SpeechSynthesizer, SpeechToText, Stage, StageError, StageReport,
};

use crate::classify::classify_stage_failure;
use crate::conversation::ConversationLog;

/// Per-stage call deadlines
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub transcription: Duration,
    pub reply: Duration,
    pub synthesis: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            transcription: Duration::from_secs(30),
            reply: Duration::from_secs(20),
            synthesis: Duration::from_secs(30),
        }
    }
}

/// Orchestrates one assist request end to end
///
/// Depends only on the collaborator traits; concrete clients and stores
/// are injected at startup. A denied admission runs zero stages and
/// settles nothing. Settlement happens strictly after the last stage in
/// the same task, so a caller that abandons the returned future also
/// abandons the in-flight stage call and is never charged.
pub struct PipelineOrchestrator {
    registry: Arc<AgentRegistry>,
    quota: Arc<dyn QuotaStore>,
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn ReplyGenerator>,
    tts: Arc<dyn SpeechSynthesizer>,
    conversations: Arc<ConversationLog>,
    timeouts: StageTimeouts,
}

impl PipelineOrchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        quota: Arc<dyn QuotaStore>,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn ReplyGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
        conversations: Arc<ConversationLog>,
        timeouts: StageTimeouts,
    ) -> Self {
        Self {
            registry,
            quota,
            stt,
            llm,
            tts,
            conversations,
            timeouts,
        }
    }

    /// Run the full pipeline for one request
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResult, GatewayError> {
        let request_id = uuid::Uuid::new_v4();

        if request.audio.is_empty() {
            return Err(GatewayError::missing_input());
        }

        let profile = self.registry.resolve(&request.agent_id);
        let estimate = estimate_cost_seconds(request.audio.len());

        let admission = self
            .quota
            .check_admission(&request.user_id, &profile.id, estimate)
            .await
            .map_err(|e| GatewayError::internal(e.to_string()))?;

        if !admission.allowed {
            tracing::info!(
                %request_id,
                user_id = %request.user_id,
                agent_id = %profile.id,
                estimate,
                remaining = admission.remaining_seconds,
                "admission denied"
            );
            return Err(GatewayError::quota_exceeded(admission.remaining_seconds));
        }

        // The billing clock starts at admission acceptance
        let clock = Instant::now();
        let mut stages = Vec::with_capacity(3);

        let stage_start = Instant::now();
        let transcription = self
            .bounded(
                Stage::Transcription,
                self.timeouts.transcription,
                self.stt.transcribe(&request.audio, &request.filename),
            )
            .await?;
        if transcription.is_blank() {
            tracing::info!(%request_id, provider = %transcription.provider, "transcript empty");
            return Err(GatewayError::no_speech_detected());
        }
        stages.push(StageReport {
            stage: Stage::Transcription,
            provider: transcription.provider.clone(),
            elapsed_ms: stage_start.elapsed().as_millis() as u64,
        });

        let mut reply_request = ReplyRequest::new(&transcription.text, profile.system_prompt.clone())
            .with_max_tokens(profile.max_reply_tokens);
        if let Some(conversation_id) = &request.conversation_id {
            reply_request = reply_request
                .with_history(self.conversations.recent(conversation_id))
                .with_conversation(conversation_id.clone());
        }

        let stage_start = Instant::now();
        let reply = self
            .bounded(
                Stage::Reply,
                self.timeouts.reply,
                self.llm.generate_reply(reply_request),
            )
            .await?;
        if reply.text.trim().is_empty() {
            return Err(classify_stage_failure(
                Stage::Reply,
                &StageError::InvalidResponse("empty reply text".to_string()),
            ));
        }
        stages.push(StageReport {
            stage: Stage::Reply,
            provider: reply.provider.clone(),
            elapsed_ms: stage_start.elapsed().as_millis() as u64,
        });

        let voice = request
            .voice
            .clone()
            .unwrap_or_else(|| profile.default_voice.clone());

        let stage_start = Instant::now();
        let speech = self
            .bounded(
                Stage::Synthesis,
                self.timeouts.synthesis,
                self.tts.synthesize(&reply.text, &voice),
            )
            .await?;
        stages.push(StageReport {
            stage: Stage::Synthesis,
            provider: speech.provider.clone(),
            elapsed_ms: stage_start.elapsed().as_millis() as u64,
        });

        // Settle the actual wall-clock cost, never the admission estimate
        let total_duration_seconds = clock.elapsed().as_secs_f64();
        let quota_remaining_seconds = self
            .quota
            .settle(&request.user_id, &profile.id, total_duration_seconds)
            .await
            .map_err(|e| GatewayError::internal(e.to_string()))?;

        if let Some(conversation_id) = &request.conversation_id {
            self.conversations
                .record_exchange(conversation_id, &transcription.text, &reply.text);
        }

        tracing::info!(
            %request_id,
            user_id = %request.user_id,
            agent_id = %profile.id,
            voice = %speech.voice,
            total_seconds = total_duration_seconds,
            remaining = quota_remaining_seconds,
            "pipeline complete"
        );

        Ok(PipelineResult {
            transcript: transcription.text,
            reply_text: reply.text,
            audio: speech.audio,
            mime_type: speech.mime_type,
            agent_id: profile.id.clone(),
            voice: speech.voice,
            stages,
            total_duration_seconds,
            quota_used_seconds: total_duration_seconds,
            quota_remaining_seconds,
        })
    }

    /// Await a stage call under its deadline, classifying any failure
    async fn bounded<T>(
        &self,
        stage: Stage,
        limit: Duration,
        call: impl Future<Output = Result<T, StageError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                tracing::warn!(%stage, %error, "stage failed");
                Err(classify_stage_failure(stage, &error))
            }
            Err(_) => {
                tracing::warn!(%stage, timeout_ms = limit.as_millis() as u64, "stage timed out");
                Err(classify_stage_failure(stage, &StageError::Timeout(limit)))
            }
        }
    }
}

/// Pre-admission cost estimate from the upload size
///
/// A crude proxy for audio duration, used only to gate admission; billing
/// uses the measured wall-clock time.
fn estimate_cost_seconds(audio_len: usize) -> f64 {
    let size_mb = audio_len as f64 / (1024.0 * 1024.0);
    (size_mb * 10.0).max(5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_has_floor() {
        assert_eq!(estimate_cost_seconds(1), 5.0);
        assert_eq!(estimate_cost_seconds(512 * 1024), 5.0);
    }

    #[test]
    fn test_estimate_scales_with_size() {
        assert_eq!(estimate_cost_seconds(1024 * 1024), 10.0);
        assert_eq!(estimate_cost_seconds(3 * 1024 * 1024), 30.0);
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = StageTimeouts::default();
        assert_eq!(timeouts.transcription, Duration::from_secs(30));
        assert_eq!(timeouts.reply, Duration::from_secs(20));
        assert_eq!(timeouts.synthesis, Duration::from_secs(30));
    }
}

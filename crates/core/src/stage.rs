//! Stage payloads and the assembled pipeline result
//!
//! Each of the three processing stages produces a typed payload with a
//! provider label and stage-specific metrics; the orchestrator composes
//! them into a `PipelineResult`.

use serde::{Deserialize, Serialize};

use crate::conversation::Turn;

/// The three sequential processing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcription,
    Reply,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcription => "transcription",
            Stage::Reply => "reply",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of the transcription stage
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Transcribed text
    pub text: String,
    /// Provider that produced it
    pub provider: String,
    /// Recognition confidence, when the provider reports one
    pub confidence: Option<f32>,
    /// Detected audio duration, when the provider reports one
    pub duration_ms: Option<u64>,
}

impl Transcription {
    pub fn new(text: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            confidence: None,
            duration_ms: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// True when the stage produced no usable text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Input to the reply-generation stage
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    /// Transcribed user utterance
    pub user_text: String,
    /// Instructions from the resolved agent profile
    pub system_prompt: String,
    /// Generation budget from the resolved agent profile
    pub max_tokens: u32,
    /// Recent turns of the conversation being continued, oldest first
    pub history: Vec<Turn>,
    /// Conversation being continued, if any
    pub conversation_id: Option<String>,
}

impl ReplyRequest {
    pub fn new(user_text: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            system_prompt: system_prompt.into(),
            max_tokens: 256,
            history: Vec::new(),
            conversation_id: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Output of the reply-generation stage
#[derive(Debug, Clone)]
pub struct Reply {
    /// Generated reply text
    pub text: String,
    /// Provider that produced it
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Completion tokens, when the provider reports them
    pub tokens: Option<u32>,
}

impl Reply {
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            model: model.into(),
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// Output of the synthesis stage
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    /// Synthesized audio bytes
    pub audio: Vec<u8>,
    /// MIME type of the audio
    pub mime_type: String,
    /// Provider that produced it
    pub provider: String,
    /// Voice actually used
    pub voice: String,
}

impl SynthesizedSpeech {
    pub fn new(audio: Vec<u8>, provider: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            audio,
            mime_type: "audio/wav".to_string(),
            provider: provider.into(),
            voice: voice.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn size_bytes(&self) -> usize {
        self.audio.len()
    }
}

/// Timing record for one completed stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub provider: String,
    pub elapsed_ms: u64,
}

/// Everything a successful pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Transcript of the uploaded audio
    pub transcript: String,
    /// Generated reply text
    pub reply_text: String,
    /// Synthesized reply audio
    pub audio: Vec<u8>,
    /// MIME type of `audio`
    pub mime_type: String,
    /// Agent profile that served the request
    pub agent_id: String,
    /// Voice used for synthesis
    pub voice: String,
    /// Per-stage provider and timing reports, in stage order
    pub stages: Vec<StageReport>,
    /// Wall-clock seconds from admission acceptance to synthesis completion
    pub total_duration_seconds: f64,
    /// Quota charged for this call
    pub quota_used_seconds: f64,
    /// Quota the user still has for this agent today
    pub quota_remaining_seconds: f64,
}

impl PipelineResult {
    /// Provider label recorded for a stage, if that stage ran
    pub fn provider_for(&self, stage: Stage) -> Option<&str> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.provider.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_transcription() {
        assert!(Transcription::new("", "whisper").is_blank());
        assert!(Transcription::new("   \n\t", "whisper").is_blank());
        assert!(!Transcription::new("hello", "whisper").is_blank());
    }

    #[test]
    fn test_reply_request_builder() {
        let req = ReplyRequest::new("hi", "You are helpful")
            .with_max_tokens(64)
            .with_conversation("c-9");
        assert_eq!(req.max_tokens, 64);
        assert_eq!(req.conversation_id.as_deref(), Some("c-9"));
        assert!(req.history.is_empty());
    }

    #[test]
    fn test_provider_lookup() {
        let result = PipelineResult {
            transcript: "hi".into(),
            reply_text: "hello".into(),
            audio: vec![0u8; 4],
            mime_type: "audio/wav".into(),
            agent_id: "general".into(),
            voice: "alloy".into(),
            stages: vec![StageReport {
                stage: Stage::Transcription,
                provider: "whisper".into(),
                elapsed_ms: 12,
            }],
            total_duration_seconds: 0.2,
            quota_used_seconds: 0.2,
            quota_remaining_seconds: 599.8,
        };
        assert_eq!(result.provider_for(Stage::Transcription), Some("whisper"));
        assert_eq!(result.provider_for(Stage::Synthesis), None);
    }
}

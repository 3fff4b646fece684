//! Pipeline request type

/// Agent selected when the caller names none
pub const DEFAULT_AGENT_ID: &str = "general";

/// User identity assumed when the caller supplies none
pub const DEFAULT_USER_ID: &str = "anonymous";

/// One inbound assist request
///
/// Owned exclusively by a single pipeline run; never shared across
/// requests.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Raw uploaded audio
    pub audio: Vec<u8>,
    /// Original filename, forwarded to the transcription provider
    pub filename: String,
    /// Behavior profile to use
    pub agent_id: String,
    /// Pre-identified opaque user
    pub user_id: String,
    /// Explicit voice override; profile default when absent
    pub voice: Option<String>,
    /// Conversation to continue, if any
    pub conversation_id: Option<String>,
}

impl PipelineRequest {
    pub fn new(audio: Vec<u8>) -> Self {
        Self {
            audio,
            filename: "recording.webm".to_string(),
            agent_id: DEFAULT_AGENT_ID.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            voice: None,
            conversation_id: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Uploaded payload size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.audio.len() as f64 / (1024.0 * 1024.0)
    }
}

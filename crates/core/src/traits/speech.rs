//! Speech processing traits

use async_trait::async_trait;

use crate::error::StageError;
use crate::stage::{SynthesizedSpeech, Transcription};

/// Speech-to-Text collaborator
///
/// Implementations are expected to fail fast with a kind-tagged
/// `StageError` rather than an opaque fault.
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(HttpTranscriber::new(config)?);
/// let transcription = stt.transcribe(&audio, "recording.webm").await?;
/// println!("Transcribed: {}", transcription.text);
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe an uploaded audio payload
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcription, StageError>;

    /// Provider label for logging and response metadata
    fn provider_name(&self) -> &str;
}

/// Text-to-Speech collaborator
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Synthesize text with the given voice
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedSpeech, StageError>;

    /// Provider label for logging and response metadata
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStt;

    #[async_trait]
    impl SpeechToText for MockStt {
        async fn transcribe(
            &self,
            _audio: &[u8],
            _filename: &str,
        ) -> Result<Transcription, StageError> {
            Ok(Transcription::new("test transcription", "mock-stt").with_confidence(0.95))
        }

        fn provider_name(&self) -> &str {
            "mock-stt"
        }
    }

    struct MockTts;

    #[async_trait]
    impl SpeechSynthesizer for MockTts {
        async fn synthesize(
            &self,
            _text: &str,
            voice: &str,
        ) -> Result<SynthesizedSpeech, StageError> {
            Ok(SynthesizedSpeech::new(vec![0u8; 8], "mock-tts", voice))
        }

        fn provider_name(&self) -> &str {
            "mock-tts"
        }
    }

    #[tokio::test]
    async fn test_mock_stt() {
        let stt = MockStt;
        let result = stt.transcribe(&[0u8; 4], "a.wav").await.unwrap();
        assert_eq!(result.text, "test transcription");
        assert_eq!(result.confidence, Some(0.95));
        assert_eq!(stt.provider_name(), "mock-stt");
    }

    #[tokio::test]
    async fn test_mock_tts() {
        let tts = MockTts;
        let speech = tts.synthesize("hello", "alloy").await.unwrap();
        assert_eq!(speech.voice, "alloy");
        assert_eq!(speech.size_bytes(), 8);
    }
}

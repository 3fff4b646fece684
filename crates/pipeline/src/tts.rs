//! HTTP speech-synthesis client

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_gateway_core::{SpeechSynthesizer, StageError, SynthesizedSpeech};

/// Synthesis client configuration
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    /// Service base URL
    pub endpoint: String,
    /// Label reported when the service does not name its engine
    pub provider_label: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8092".to_string(),
            provider_label: "piper".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP text-to-speech client
#[derive(Clone)]
pub struct HttpSynthesizer {
    client: Client,
    config: SynthesizerConfig,
}

impl HttpSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Result<Self, StageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StageError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedSpeech, StageError> {
        let request = SynthesizeRequest {
            text: text.to_string(),
            voice: voice.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/synthesize", self.config.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StageError::Timeout(self.config.timeout)
                } else {
                    StageError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StageError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| StageError::InvalidResponse(e.to_string()))?;

        let audio = BASE64
            .decode(&body.audio)
            .map_err(|e| StageError::InvalidResponse(format!("audio is not valid base64: {e}")))?;

        let provider = body
            .provider
            .unwrap_or_else(|| self.config.provider_label.clone());
        let voice = body.voice.unwrap_or_else(|| voice.to_string());
        let mut speech = SynthesizedSpeech::new(audio, provider, voice);
        if let Some(mime_type) = body.mime_type {
            speech = speech.with_mime_type(mime_type);
        }

        Ok(speech)
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_label
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest {
    text: String,
    voice: String,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    /// Base64 encoded audio
    audio: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    voice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_decodes_audio() {
        let body: SynthesizeResponse =
            serde_json::from_str(r#"{"audio": "YWJj", "mime_type": "audio/ogg"}"#).unwrap();
        let audio = BASE64.decode(&body.audio).unwrap();
        assert_eq!(audio, b"abc");
        assert_eq!(body.mime_type.as_deref(), Some("audio/ogg"));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        assert!(BASE64.decode("not base64!!!").is_err());
    }
}

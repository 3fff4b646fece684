//! HTTP transcription client
//!
//! Posts the uploaded audio, base64 encoded, to the remote transcription
//! service and maps transport faults to kind-tagged stage errors.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_gateway_core::{SpeechToText, StageError, Transcription};

/// Transcription client configuration
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    /// Service base URL
    pub endpoint: String,
    /// Label reported when the service does not name its engine
    pub provider_label: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8091".to_string(),
            provider_label: "faster-whisper".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP speech-to-text client
#[derive(Clone)]
pub struct HttpTranscriber {
    client: Client,
    config: TranscriberConfig,
}

impl HttpTranscriber {
    pub fn new(config: TranscriberConfig) -> Result<Self, StageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StageError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SpeechToText for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcription, StageError> {
        let request = TranscribeRequest {
            audio: BASE64.encode(audio),
            filename: filename.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/transcribe", self.config.endpoint))
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

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| StageError::InvalidResponse(e.to_string()))?;

        let provider = body
            .provider
            .unwrap_or_else(|| self.config.provider_label.clone());
        let mut transcription = Transcription::new(body.text, provider);
        if let Some(confidence) = body.confidence {
            transcription = transcription.with_confidence(confidence);
        }
        if let Some(duration_ms) = body.duration_ms {
            transcription = transcription.with_duration_ms(duration_ms);
        }

        Ok(transcription)
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_label
    }
}

#[derive(Debug, Serialize)]
struct TranscribeRequest {
    audio: String,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encodes_audio() {
        let request = TranscribeRequest {
            audio: BASE64.encode(b"abc"),
            filename: "clip.wav".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["audio"], "YWJj");
        assert_eq!(json["filename"], "clip.wav");
    }

    #[test]
    fn test_response_tolerates_missing_metrics() {
        let body: TranscribeResponse =
            serde_json::from_str(r#"{"text": "hello there"}"#).unwrap();
        assert_eq!(body.text, "hello there");
        assert!(body.provider.is_none());
        assert!(body.confidence.is_none());
    }
}

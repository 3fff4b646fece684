//! HTTP reply-generation backend
//!
//! Speaks the Ollama chat API. Network faults and timeouts are retried
//! with exponential backoff; provider rejections (4xx) fail immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_gateway_core::{Reply, ReplyGenerator, ReplyRequest, StageError};

use crate::prompt::{build_messages, Message};

/// Reply backend configuration
#[derive(Debug, Clone)]
pub struct ReplyBackendConfig {
    /// Service base URL
    pub endpoint: String,
    /// Model name/ID
    pub model: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Top-p sampling
    pub top_p: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for ReplyBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b-instruct-q4_K_M".to_string(),
            api_key: None,
            temperature: 0.7,
            top_p: 0.9,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

/// HTTP reply generator
#[derive(Clone)]
pub struct HttpReplyGenerator {
    client: Client,
    config: ReplyBackendConfig,
}

impl HttpReplyGenerator {
    pub fn new(config: ReplyBackendConfig) -> Result<Self, StageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StageError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    async fn execute_request(&self, request: &ChatRequest) -> Result<ChatResponse, StageError> {
        let mut builder = self.client.post(self.api_url("/chat")).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                StageError::Timeout(self.config.timeout)
            } else {
                StageError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            // 5xx is transient and retryable, 4xx is a hard rejection
            if status.is_server_error() {
                return Err(StageError::Unavailable(format!(
                    "server error {status}: {message}"
                )));
            }
            return Err(StageError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StageError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &StageError) -> bool {
        matches!(error, StageError::Unavailable(_) | StageError::Timeout(_))
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate_reply(&self, request: ReplyRequest) -> Result<Reply, StageError> {
        let messages = build_messages(&request);
        let chat_request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            options: ChatOptions {
                temperature: Some(self.config.temperature),
                top_p: Some(self.config.top_p),
                num_predict: Some(request.max_tokens as i32),
            },
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max = self.config.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "reply request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&chat_request).await {
                Ok(result) => {
                    let mut reply =
                        Reply::new(result.message.content, "ollama", self.config.model.clone());
                    if let Some(tokens) = result.eval_count {
                        reply = reply.with_tokens(tokens as u32);
                    }
                    return Ok(reply);
                }
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| StageError::Unavailable("max retries exceeded".to_string())))
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

// Chat API wire types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[allow(dead_code)]
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ReplyBackendConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_retries, 3);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(HttpReplyGenerator::is_retryable(&StageError::Unavailable(
            "connection refused".into()
        )));
        assert!(HttpReplyGenerator::is_retryable(&StageError::Timeout(
            Duration::from_secs(30)
        )));
        assert!(!HttpReplyGenerator::is_retryable(&StageError::Provider {
            status: 400,
            message: "bad request".into()
        }));
        assert!(!HttpReplyGenerator::is_retryable(
            &StageError::InvalidResponse("truncated body".into())
        ));
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "test-model".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            stream: false,
            options: ChatOptions {
                temperature: Some(0.5),
                top_p: None,
                num_predict: Some(128),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["options"]["num_predict"], 128);
        assert!(json["options"].get("top_p").is_none());
    }
}

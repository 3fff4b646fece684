//! Error types
//!
//! Every failure that leaves the gateway carries a structured kind so that
//! clients can branch on semantics rather than message text. Collaborators
//! raise kind-tagged `StageError`s; the pipeline maps them onto the closed
//! `ErrorKind` taxonomy.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of failure kinds surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No audio supplied with the request
    MissingInput,
    /// Admission denied, daily quota exhausted
    QuotaExceeded,
    /// Transcription succeeded but yielded no usable text
    NoSpeechDetected,
    /// Transcription collaborator failed
    SttFailed,
    /// Reply-generation collaborator failed
    LlmFailed,
    /// Speech-synthesis collaborator failed
    TtsFailed,
    /// Anything unclassified
    Internal,
}

impl ErrorKind {
    /// Stable wire code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "MISSING_INPUT",
            ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorKind::NoSpeechDetected => "NO_SPEECH_DETECTED",
            ErrorKind::SttFailed => "STT_FAILED",
            ErrorKind::LlmFailed => "LLM_FAILED",
            ErrorKind::TtsFailed => "TTS_FAILED",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Default HTTP status for this kind
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::MissingInput | ErrorKind::NoSpeechDetected => 400,
            ErrorKind::QuotaExceeded => 429,
            ErrorKind::SttFailed | ErrorKind::LlmFailed | ErrorKind::TtsFailed => 502,
            ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A classified pipeline failure
///
/// Carries the kind, a human-readable message and, for quota rejections,
/// the seconds the caller still has available today.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    pub remaining_seconds: Option<f64>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            remaining_seconds: None,
        }
    }

    pub fn missing_input() -> Self {
        Self::new(ErrorKind::MissingInput, "no audio supplied")
    }

    pub fn quota_exceeded(remaining_seconds: f64) -> Self {
        Self {
            kind: ErrorKind::QuotaExceeded,
            message: format!(
                "daily quota exhausted, {remaining_seconds:.0} seconds remaining today"
            ),
            remaining_seconds: Some(remaining_seconds),
        }
    }

    pub fn no_speech_detected() -> Self {
        Self::new(
            ErrorKind::NoSpeechDetected,
            "no speech detected in the supplied audio",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for GatewayError {}

/// Failure raised by a stage collaborator
///
/// Collaborator clients map their transport faults onto these variants so
/// the pipeline never has to inspect message text.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("stage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("service unreachable: {0}")]
    Unavailable(String),

    #[error("provider error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Failure raised by a quota store backend
///
/// The in-memory store is infallible; the variant exists for
/// persistent-backed implementations.
#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("quota backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(ErrorKind::QuotaExceeded.code(), "QUOTA_EXCEEDED");
        assert_eq!(ErrorKind::NoSpeechDetected.code(), "NO_SPEECH_DETECTED");
        assert_eq!(ErrorKind::Internal.code(), "INTERNAL");
    }

    #[test]
    fn test_kind_http_status() {
        assert_eq!(ErrorKind::MissingInput.http_status(), 400);
        assert_eq!(ErrorKind::QuotaExceeded.http_status(), 429);
        assert_eq!(ErrorKind::SttFailed.http_status(), 502);
        assert_eq!(ErrorKind::LlmFailed.http_status(), 502);
        assert_eq!(ErrorKind::TtsFailed.http_status(), 502);
        assert_eq!(ErrorKind::Internal.http_status(), 500);
    }

    #[test]
    fn test_quota_exceeded_carries_remaining() {
        let err = GatewayError::quota_exceeded(3.0);
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        assert_eq!(err.remaining_seconds, Some(3.0));
    }

    #[test]
    fn test_display_includes_code() {
        let err = GatewayError::missing_input();
        assert!(err.to_string().starts_with("MISSING_INPUT"));
    }
}

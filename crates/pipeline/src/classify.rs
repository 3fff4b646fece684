//! Stage failure classification
//!
//! Pure mapping from a kind-tagged collaborator fault to the client-facing
//! taxonomy. The failing stage alone determines the kind; message text is
//! carried along for humans but never inspected.

use voice_gateway_core::{ErrorKind, GatewayError, Stage, StageError};

/// Classify a failed stage call
pub fn classify_stage_failure(stage: Stage, error: &StageError) -> GatewayError {
    let kind = match stage {
        Stage::Transcription => ErrorKind::SttFailed,
        Stage::Reply => ErrorKind::LlmFailed,
        Stage::Synthesis => ErrorKind::TtsFailed,
    };
    GatewayError::new(kind, format!("{stage} stage failed: {error}"))
}

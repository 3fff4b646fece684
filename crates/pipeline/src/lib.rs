//! Quota-gated pipeline orchestration
//!
//! The orchestrator admits or rejects each request against the caller's
//! daily quota, then runs the three processing stages in order
//! (transcription, reply generation, speech synthesis), aggregates
//! per-stage metadata and settles the actual wall-clock cost. Stage
//! failures are classified into the stable client-facing taxonomy.
//!
//! This crate also carries the HTTP clients for the transcription and
//! synthesis services and the in-memory conversation log used for reply
//! continuity.

pub mod classify;
pub mod conversation;
pub mod orchestrator;
pub mod stt;
pub mod tts;

pub use classify::classify_stage_failure;
pub use conversation::ConversationLog;
pub use orchestrator::{PipelineOrchestrator, StageTimeouts};
pub use stt::{HttpTranscriber, TranscriberConfig};
pub use tts::{HttpSynthesizer, SynthesizerConfig};

//! Core traits and types for the voice gateway
//!
//! This crate provides the foundational types used across all other crates:
//! - The failure taxonomy surfaced to clients (`ErrorKind`, `GatewayError`)
//! - Pipeline request/result types
//! - Conversation turn types
//! - Traits for pluggable collaborators (STT, reply generation, TTS) and
//!   the quota store

pub mod conversation;
pub mod error;
pub mod request;
pub mod stage;
pub mod traits;

pub use conversation::{Turn, TurnRole};
pub use error::{ErrorKind, GatewayError, QuotaError, StageError};
pub use request::PipelineRequest;
pub use stage::{
    PipelineResult, Reply, ReplyRequest, Stage, StageReport, SynthesizedSpeech, Transcription,
};
pub use traits::{Admission, QuotaStore, ReplyGenerator, SpeechSynthesizer, SpeechToText};

//! Traits for pluggable collaborators
//!
//! The orchestrator depends only on these interfaces; concrete
//! implementations (HTTP clients, in-memory stores, test mocks) are
//! injected at startup.

pub mod llm;
pub mod quota;
pub mod speech;

pub use llm::ReplyGenerator;
pub use quota::{Admission, QuotaStore};
pub use speech::{SpeechSynthesizer, SpeechToText};

//! Voice Gateway Server
//!
//! HTTP endpoints for the assist pipeline, the per-user quota status
//! query, health probes and Prometheus metrics.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{
    init_metrics, metrics_handler, record_error, record_llm_latency, record_stt_latency,
    record_total_latency, record_tts_latency,
};
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Startup error: {0}")]
    Startup(String),
}

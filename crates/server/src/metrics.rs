//! Prometheus metrics
//!
//! Request counters and per-stage latency histograms, exposed at
//! `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder
///
/// Safe to call more than once; later calls return the existing handle.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Some(handle.clone());
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle.clone());
            Some(handle)
        }
        Err(e) => {
            tracing::error!("failed to install metrics recorder: {}", e);
            None
        }
    }
}

/// Render the current metrics snapshot
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// Record transcription stage latency
pub fn record_stt_latency(ms: u64) {
    metrics::histogram!("voice_gateway_stt_latency_ms").record(ms as f64);
}

/// Record reply-generation stage latency
pub fn record_llm_latency(ms: u64) {
    metrics::histogram!("voice_gateway_llm_latency_ms").record(ms as f64);
}

/// Record synthesis stage latency
pub fn record_tts_latency(ms: u64) {
    metrics::histogram!("voice_gateway_tts_latency_ms").record(ms as f64);
}

/// Record full pipeline latency
pub fn record_total_latency(ms: u64) {
    metrics::histogram!("voice_gateway_total_latency_ms").record(ms as f64);
    metrics::counter!("voice_gateway_requests_total").increment(1);
}

/// Record a classified failure
pub fn record_error(kind: &str) {
    metrics::counter!("voice_gateway_errors_total", "kind" => kind.to_string()).increment(1);
}

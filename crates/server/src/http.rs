//! HTTP Endpoints
//!
//! REST API for the voice gateway. The assist endpoint takes the raw
//! audio upload as the request body and returns the synthesized reply
//! audio with the run's metadata in response headers; failures come back
//! as a structured JSON payload carrying the stable error-kind code.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Json, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voice_gateway_core::request::DEFAULT_USER_ID;
use voice_gateway_core::{GatewayError, PipelineRequest, PipelineResult, QuotaStore, Stage};

use crate::metrics::{
    metrics_handler, record_error, record_llm_latency, record_stt_latency, record_total_latency,
    record_tts_latency,
};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );
    let max_body = state.config.server.max_body_bytes;

    Router::new()
        // Assist pipeline
        .route("/api/assist", post(assist))
        // Quota status query
        .route("/api/quota/:user_id", get(quota_status))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Middleware
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns a permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000 for safety
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    // credentials cannot be combined with wildcard headers, so name the
    // ones the client actually sends
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-user-id"),
        ])
        .allow_credentials(true)
}

/// Assist request parameters
#[derive(Debug, Deserialize)]
struct AssistParams {
    agent: Option<String>,
    voice: Option<String>,
    conversation: Option<String>,
    filename: Option<String>,
}

/// Run the assist pipeline on the uploaded audio
async fn assist(
    State(state): State<AppState>,
    Query(params): Query<AssistParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER_ID);

    let mut request = PipelineRequest::new(body.to_vec()).with_user(user_id);
    if let Some(agent) = params.agent {
        request = request.with_agent(agent);
    }
    if let Some(voice) = params.voice {
        request = request.with_voice(voice);
    }
    if let Some(conversation) = params.conversation {
        request = request.with_conversation(conversation);
    }
    if let Some(filename) = params.filename {
        request = request.with_filename(filename);
    }

    match state.orchestrator.run(request).await {
        Ok(result) => {
            for report in &result.stages {
                match report.stage {
                    Stage::Transcription => record_stt_latency(report.elapsed_ms),
                    Stage::Reply => record_llm_latency(report.elapsed_ms),
                    Stage::Synthesis => record_tts_latency(report.elapsed_ms),
                }
            }
            record_total_latency((result.total_duration_seconds * 1000.0) as u64);
            assemble_response(result)
        }
        Err(err) => {
            record_error(err.kind.code());
            error_response(err)
        }
    }
}

/// Translate a pipeline result into the transport response
///
/// Audio bytes in the body, run metadata in headers. Header values are
/// escaped to ASCII where necessary.
fn assemble_response(result: PipelineResult) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, metadata_header(&result.mime_type));
    headers.insert("x-transcript", metadata_header(&result.transcript));
    headers.insert("x-reply", metadata_header(&result.reply_text));
    headers.insert("x-agent", metadata_header(&result.agent_id));
    headers.insert("x-voice", metadata_header(&result.voice));
    headers.insert(
        "x-duration-seconds",
        metadata_header(&format!("{:.3}", result.total_duration_seconds)),
    );
    headers.insert(
        "x-quota-used-seconds",
        metadata_header(&format!("{:.3}", result.quota_used_seconds)),
    );
    headers.insert(
        "x-quota-remaining-seconds",
        metadata_header(&format!("{:.3}", result.quota_remaining_seconds)),
    );
    for report in &result.stages {
        let name = match report.stage {
            Stage::Transcription => "x-stt-provider",
            Stage::Reply => "x-llm-provider",
            Stage::Synthesis => "x-tts-provider",
        };
        headers.insert(name, metadata_header(&report.provider));
    }

    (headers, result.audio).into_response()
}

/// Translate a classified failure into the transport response
fn error_response(err: GatewayError) -> Response {
    let status = StatusCode::from_u16(err.kind.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut body = serde_json::json!({
        "success": false,
        "error": err.kind.code(),
        "message": err.message,
    });
    if let Some(remaining) = err.remaining_seconds {
        body["remaining_seconds"] = remaining.into();
    }

    (status, Json(body)).into_response()
}

/// Header value from arbitrary text, escaping when it is not valid ASCII
fn metadata_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| {
        let escaped: String = value.chars().flat_map(|c| c.escape_default()).collect();
        HeaderValue::from_str(&escaped).unwrap_or_else(|_| HeaderValue::from_static(""))
    })
}

/// Remaining quota per known agent, without consuming any
async fn quota_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut agents = serde_json::Map::new();
    for profile in state.registry.known_agents() {
        let admission = state
            .quota
            .check_admission(&user_id, &profile.id, 0.0)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, agent_id = %profile.id, error = %e, "quota query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        agents.insert(
            profile.id.clone(),
            serde_json::json!({
                "remaining_seconds": admission.remaining_seconds,
                "daily_limit_seconds": admission.limit_seconds,
            }),
        );
    }

    Ok(Json(serde_json::json!({
        "user_id": user_id,
        "agents": agents,
    })))
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "quota_records": state.quota.record_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_gateway_config::Settings;
    use voice_gateway_core::{ErrorKind, StageReport};

    #[test]
    fn test_router_creation() {
        let state = AppState::from_settings(Settings::default()).unwrap();
        let _ = create_router(state);
    }

    #[test]
    fn test_error_response_statuses() {
        assert_eq!(
            error_response(GatewayError::missing_input()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(GatewayError::quota_exceeded(3.0)).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            error_response(GatewayError::new(ErrorKind::TtsFailed, "down")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_response(GatewayError::internal("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_metadata_header_accepts_ascii() {
        let value = metadata_header("hello world");
        assert_eq!(value.to_str().unwrap(), "hello world");
    }

    #[test]
    fn test_metadata_header_escapes_non_ascii() {
        let value = metadata_header("नमस्ते");
        // escaped form is always readable ASCII
        assert!(value.to_str().unwrap().is_ascii());
        assert!(!value.is_empty());
    }

    #[test]
    fn test_assemble_response_sets_metadata() {
        let result = PipelineResult {
            transcript: "hi".into(),
            reply_text: "hello".into(),
            audio: vec![1, 2, 3],
            mime_type: "audio/wav".into(),
            agent_id: "general".into(),
            voice: "alloy".into(),
            stages: vec![StageReport {
                stage: Stage::Reply,
                provider: "ollama".into(),
                elapsed_ms: 40,
            }],
            total_duration_seconds: 0.5,
            quota_used_seconds: 0.5,
            quota_remaining_seconds: 599.5,
        };

        let response = assemble_response(result);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("x-transcript").unwrap(), "hi");
        assert_eq!(headers.get("x-llm-provider").unwrap(), "ollama");
        assert_eq!(headers.get("x-quota-remaining-seconds").unwrap(), "599.500");
        assert!(headers.get("x-stt-provider").is_none());
    }
}

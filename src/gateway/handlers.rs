//! HTTP request handlers.

use axum::{
    body::Body,
    extract::{Extension, Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::server::{AppState, RequestId};
use super::types::{ChatCompletionRequest, RegisterProviderRequest};
use crate::config::ApiKey;
use crate::dispatch::ResponseEnvelope;
use crate::error::Error;

/// Request header: pin the request to a named provider instead of rotating.
pub const SPINDLE_PIN_HEADER: &str = "x-spindle-provider";

/// Response header: provider that served the request.
pub const SPINDLE_PROVIDER_HEADER: &str = "x-spindle-provider";
/// Response header: correlation ID (UUID v4), attached by middleware.
pub const SPINDLE_REQUEST_ID_HEADER: &str = "x-spindle-request-id";
/// Response header: wall-clock latency in milliseconds (integer).
pub const SPINDLE_LATENCY_MS_HEADER: &str = "x-spindle-latency-ms";

/// Convert an upstream envelope into the inbound HTTP response.
///
/// Status and body pass through verbatim (non-2xx included); of the upstream
/// headers only Content-Type is forwarded, defaulting to application/json.
fn envelope_response(envelope: ResponseEnvelope) -> Result<Response, Error> {
    let content_type = envelope
        .headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    Response::builder()
        .status(envelope.status_code)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(envelope.body))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Handle POST /v1/chat/completions
pub async fn chat_completions(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, Error> {
    let start = std::time::Instant::now();

    let pinned = headers
        .get(SPINDLE_PIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    tracing::info!(
        request_id = %request_id.0,
        model = %request.model,
        pinned = ?pinned,
        "Received chat completion request"
    );

    let (provider_name, envelope) = state
        .gateway
        .handle_chat_completion(&request, pinned.as_deref())
        .await?;

    let mut response = envelope_response(envelope)?;
    let latency_ms = start.elapsed().as_millis() as u64;
    let response_headers = response.headers_mut();
    response_headers.insert(
        HeaderName::from_static(SPINDLE_LATENCY_MS_HEADER),
        HeaderValue::from(latency_ms),
    );
    if let Ok(value) = HeaderValue::from_str(&provider_name) {
        response_headers.insert(HeaderName::from_static(SPINDLE_PROVIDER_HEADER), value);
    }

    Ok(response)
}

/// Handle GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "spindle",
        "providers": state.gateway.providers().len()
    }))
}

/// Handle GET /providers - list registered providers.
///
/// Secrets are never serialized; only whether one is configured.
pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let providers: Vec<serde_json::Value> = state
        .gateway
        .providers()
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "base_url": p.base_url,
                "requires_credential": p.requires_credential,
                "credential_configured": state.gateway.credential_configured(&p.name),
            })
        })
        .collect();

    Json(serde_json::json!({
        "providers": providers
    }))
}

/// Handle POST /providers - register a provider at runtime.
pub async fn register_provider(
    State(state): State<AppState>,
    Json(request): Json<RegisterProviderRequest>,
) -> Result<Response, Error> {
    state
        .gateway
        .register(&request.name, &request.url, request.requires_credential)?;

    if let Some(key) = request.api_key {
        state
            .gateway
            .set_credential(&request.name, ApiKey::from(key))?;
    }

    tracing::info!(provider = %request.name, "Registered provider via admin API");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "registered": request.name })),
    )
        .into_response())
}

/// Handle DELETE /providers/{name} - deregister a provider.
pub async fn deregister_provider(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, Error> {
    state.gateway.deregister(&name)?;
    tracing::info!(provider = %name, "Deregistered provider via admin API");
    Ok(StatusCode::NO_CONTENT)
}

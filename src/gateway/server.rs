//! HTTP server setup and configuration.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::facade::Gateway;
use super::handlers::{self, SPINDLE_REQUEST_ID_HEADER};
use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub config: Arc<Config>,
}

/// Correlation ID assigned to each inbound request.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

/// Assign a correlation ID, expose it to handlers, and echo it back on the
/// response (error responses included).
async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId(Uuid::new_v4());
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.0.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SPINDLE_REQUEST_ID_HEADER), value);
    }
    response
}

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // OpenAI-compatible endpoint
        .route("/v1/chat/completions", post(handlers::chat_completions))
        // spindle extensions
        .route("/health", get(handlers::health))
        .route(
            "/providers",
            get(handlers::list_providers).post(handlers::register_provider),
        )
        .route("/providers/:name", delete(handlers::deregister_provider))
        // State and middleware
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let listen_addr = config.server.listen.clone();

    let gateway = Gateway::from_config(&config)?;

    let state = AppState {
        gateway: Arc::new(gateway),
        config: Arc::new(config),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Starting spindle gateway server");

    axum::serve(listener, app).await?;

    Ok(())
}

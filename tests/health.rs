//! Integration tests for the /health and /providers admin surface.
//!
//! Verifies that:
//! - GET /health reports service identity and provider count
//! - GET /providers lists registered providers without leaking secrets
//! - POST /providers registers at runtime; duplicates get 409
//! - DELETE /providers/{name} deregisters; unknown names get 400

use std::sync::Arc;

use axum::body::Body;
use http::Request;
use tower::ServiceExt;

use spindle::config::{ApiKey, Config};
use spindle::gateway::{create_router, AppState, Gateway};

/// Build a spindle test app around an already-populated gateway.
fn test_app(gateway: Gateway) -> axum::Router {
    let config = Config::parse_str(
        r#"
        [server]
        listen = "127.0.0.1:0"
    "#,
    )
    .unwrap();

    let state = AppState {
        gateway: Arc::new(gateway),
        config: Arc::new(config),
    };
    create_router(state)
}

/// Parse the response body as JSON and return (status_code, json_value).
async fn parse_body(response: axum::response::Response) -> (http::StatusCode, serde_json::Value) {
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap_or_default();
    (status, json)
}

#[tokio::test]
async fn test_health_reports_provider_count() {
    let gateway = Gateway::new(reqwest::Client::new());
    gateway
        .register("a", "https://a.example.com/v1", false)
        .unwrap();
    gateway
        .register("b", "https://b.example.com/v1", true)
        .unwrap();
    let app = test_app(gateway);

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (status, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "spindle");
    assert_eq!(json["providers"], 2);
}

#[tokio::test]
async fn test_list_providers_never_leaks_secrets() {
    let gateway = Gateway::new(reqwest::Client::new());
    gateway
        .register("openai", "https://api.example.com/v1", true)
        .unwrap();
    gateway
        .set_credential("openai", ApiKey::from("sk-very-secret"))
        .unwrap();
    let app = test_app(gateway);

    let request = Request::get("/providers").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (status, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::OK);
    let provider = &json["providers"][0];
    assert_eq!(provider["name"], "openai");
    assert_eq!(provider["base_url"], "https://api.example.com/v1");
    assert_eq!(provider["requires_credential"], true);
    assert_eq!(provider["credential_configured"], true);

    let raw = json.to_string();
    assert!(
        !raw.contains("sk-very-secret"),
        "secret must not appear in listing: {}",
        raw
    );
}

#[tokio::test]
async fn test_register_provider_via_admin_api() {
    let app = test_app(Gateway::new(reqwest::Client::new()));

    let body = serde_json::json!({
        "name": "local",
        "url": "http://localhost:11434/v1",
        "requires_credential": true,
        "api_key": "sk-local"
    });
    let request = Request::post("/providers")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let (status, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::CREATED);
    assert_eq!(json["registered"], "local");

    let request = Request::get("/providers").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (_, json) = parse_body(response).await;
    assert_eq!(json["providers"][0]["name"], "local");
    assert_eq!(json["providers"][0]["credential_configured"], true);
}

#[tokio::test]
async fn test_register_duplicate_returns_409() {
    let gateway = Gateway::new(reqwest::Client::new());
    gateway
        .register("openai", "https://first.example.com/v1", false)
        .unwrap();
    let app = test_app(gateway);

    let body = serde_json::json!({
        "name": "openai",
        "url": "https://second.example.com/v1"
    });
    let request = Request::post("/providers")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let (status, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "duplicate_provider");

    // First registration's data is preserved unchanged
    let request = Request::get("/providers").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (_, json) = parse_body(response).await;
    assert_eq!(json["providers"][0]["base_url"], "https://first.example.com/v1");
}

#[tokio::test]
async fn test_deregister_provider() {
    let gateway = Gateway::new(reqwest::Client::new());
    gateway
        .register("gone-soon", "https://x.example.com/v1", false)
        .unwrap();
    let app = test_app(gateway);

    let request = Request::delete("/providers/gone-soon")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::NO_CONTENT);

    let request = Request::delete("/providers/gone-soon")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (status, json) = parse_body(response).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "unknown_provider");
}

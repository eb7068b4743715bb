use std::sync::{Arc, OnceLock};

use anonchat_backend::{
    handlers::{DispatchSettings, Dispatcher},
    middleware::SECRET_HEADER,
    repositories::Repositories,
    router,
    state::AppState,
    transport::TelegramClient,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

#[path = "support/mod.rs"]
mod support;

async fn integration_guard() -> tokio::sync::MutexGuard<'static, ()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(())).lock().await
}

async fn test_app() -> Router {
    let pool = support::fresh_pool().await;
    let config = support::test_config();
    // Nothing listens here; outbound calls fail fast and are only logged.
    let client = TelegramClient::with_base_url("http://127.0.0.1:9", &config.bot_token)
        .expect("client");
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(client),
        Repositories::postgres(pool.clone()),
        DispatchSettings::from(&config),
    ));
    router(AppState::new(pool, config, dispatcher))
}

fn group_update() -> Value {
    json!({
        "update_id": 7,
        "message": {
            "message_id": 1,
            "from": {"id": 42},
            "chat": {"id": -100, "type": "group"},
            "text": "hi"
        }
    })
}

fn webhook_request(secret: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/telegram/webhook")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SECRET_HEADER, secret);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn health_reports_ok_when_database_is_up() {
    let _guard = integration_guard().await;
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn webhook_rejects_missing_or_wrong_secret() {
    let _guard = integration_guard().await;
    let app = test_app().await;

    let missing = app
        .clone()
        .oneshot(webhook_request(None, group_update().to_string()))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .oneshot(webhook_request(Some("nope"), group_update().to_string()))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_accepts_valid_update() {
    let _guard = integration_guard().await;
    let app = test_app().await;

    let response = app
        .oneshot(webhook_request(
            Some("webhook-secret"),
            group_update().to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhook_rejects_malformed_payload() {
    let _guard = integration_guard().await;
    let app = test_app().await;

    let response = app
        .oneshot(webhook_request(Some("webhook-secret"), "{not json".into()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

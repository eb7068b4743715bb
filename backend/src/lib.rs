//! Anonymous one-to-one chat matchmaking bot.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notices;
pub mod repositories;
pub mod services;
pub mod state;
pub mod transport;
pub mod types;
pub mod utils;
pub mod validation;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use middleware::{log_error_responses, verify_webhook_secret, WebhookSecret};
use state::AppState;

/// HTTP surface: the secret-checked webhook plus a health probe.
pub fn router(state: AppState) -> Router {
    let secret = WebhookSecret::new(state.config.webhook_secret.as_deref());
    let webhook = Router::new()
        .route(handlers::webhook::WEBHOOK_PATH, post(handlers::webhook::receive))
        .route_layer(axum_middleware::from_fn_with_state(
            secret,
            verify_webhook_secret,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(webhook)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(log_error_responses)),
        )
        .with_state(state)
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::error::AppError;
use crate::models::update::Update;
use crate::state::AppState;

pub const WEBHOOK_PATH: &str = "/telegram/webhook";

/// Accepts one platform update. Processing happens on a spawned task so the
/// platform always gets its 200 promptly.
pub async fn receive(
    State(state): State<AppState>,
    payload: Result<Json<Update>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(update) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "malformed webhook payload");
        AppError::BadRequest(rejection.body_text())
    })?;
    tracing::debug!(update_id = update.update_id, "webhook update received");
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move { dispatcher.handle(update).await });
    Ok(StatusCode::OK)
}

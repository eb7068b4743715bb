use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;

/// Header the platform sets on webhook calls when a secret was registered.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Expected webhook secret. `None` disables the check.
#[derive(Debug, Clone, Default)]
pub struct WebhookSecret(Option<Arc<str>>);

impl WebhookSecret {
    pub fn new(secret: Option<&str>) -> Self {
        Self(secret.filter(|s| !s.is_empty()).map(Arc::from))
    }

    pub fn accepts(&self, presented: Option<&str>) -> bool {
        match (&self.0, presented) {
            (None, _) => true,
            (Some(expected), Some(presented)) => {
                constant_time_eq(expected.as_bytes(), presented.as_bytes())
            }
            (Some(_), None) => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn verify_webhook_secret(
    State(secret): State<WebhookSecret>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if !secret.accepts(presented) {
        return Err(AppError::Unauthorized("invalid webhook secret".into()));
    }
    Ok(next.run(request).await)
}

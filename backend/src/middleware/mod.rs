pub mod logging;
pub mod webhook_secret;

pub use logging::log_error_responses;
pub use webhook_secret::{verify_webhook_secret, WebhookSecret, SECRET_HEADER};

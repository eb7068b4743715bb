use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Expiry date as shown to users, e.g. `05 March 2026`.
pub fn format_expiry(expires_at: DateTime<Utc>, tz: &Tz) -> String {
    expires_at.with_timezone(tz).format("%d %B %Y").to_string()
}

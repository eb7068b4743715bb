//! Active chat pairs.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::UserId;

/// One side of an active pair. Every pair is stored as two mirrored rows.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActiveChat {
    pub user_id: UserId,
    pub partner_id: UserId,
    pub started_at: DateTime<Utc>,
}

/// Process-local bookkeeping for an active pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    /// Short code shown to both sides and used in logs.
    pub code: String,
    pub started_at: DateTime<Utc>,
}

impl SessionMeta {
    /// Seconds left until media may be shared, zero once the window has passed.
    pub fn media_lock_remaining(&self, lock: Duration, now: DateTime<Utc>) -> u64 {
        let unlock_at = self.started_at + lock;
        if now >= unlock_at {
            0
        } else {
            // Rounded up; never reports 0s while still locked.
            let millis = (unlock_at - now).num_milliseconds();
            ((millis + 999) / 1000) as u64
        }
    }
}

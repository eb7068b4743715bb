//! Active pairs and the media cool-down that starts with each one.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ChatError, PolicyViolation};
use crate::models::{ActiveChat, SessionMeta};
use crate::repositories::SessionRepository;
use crate::types::UserId;
use crate::utils::tag::session_code;

/// Active pairs plus the process-local metadata that goes with them.
///
/// Pairs live in the database. The session code and start time used for the
/// media cool-down are kept in memory and are lost on restart; a pair without
/// metadata is treated as past its cool-down.
pub struct SessionManager {
    repo: Arc<dyn SessionRepository>,
    meta: Mutex<HashMap<UserId, SessionMeta>>,
    media_lock: Duration,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn SessionRepository>, media_lock_seconds: u64) -> Self {
        Self {
            repo,
            meta: Mutex::new(HashMap::new()),
            media_lock: Duration::seconds(media_lock_seconds as i64),
        }
    }

    fn meta_map(&self) -> MutexGuard<'_, HashMap<UserId, SessionMeta>> {
        self.meta
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn get_partner(&self, user_id: UserId) -> Result<Option<UserId>, ChatError> {
        Ok(self.repo.get_partner(user_id).await?)
    }

    pub async fn find_chat(&self, user_id: UserId) -> Result<Option<ActiveChat>, ChatError> {
        Ok(self.repo.find_chat(user_id).await?)
    }

    /// Records metadata for a pair the match engine just created.
    pub fn open(&self, a: UserId, b: UserId, now: DateTime<Utc>) -> SessionMeta {
        let meta = SessionMeta {
            code: session_code(),
            started_at: now,
        };
        let mut map = self.meta_map();
        map.insert(a, meta.clone());
        map.insert(b, meta.clone());
        tracing::info!(user_id = %a, partner_id = %b, session = %meta.code, "session opened");
        meta
    }

    /// Pairs two specific users. `None` when either is already in a chat.
    pub async fn connect(
        &self,
        a: UserId,
        b: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionMeta>, ChatError> {
        if a == b {
            return Err(ChatError::Validation("cannot pair a user with themselves".into()));
        }
        if !self.repo.connect(a, b, now).await? {
            tracing::info!(user_id = %a, partner_id = %b, "connect refused, one side is busy");
            return Ok(None);
        }
        Ok(Some(self.open(a, b, now)))
    }

    /// Ends the pair containing `user_id` for both sides. Safe without a pair.
    pub async fn disconnect(&self, user_id: UserId) -> Result<Option<UserId>, ChatError> {
        let partner = self.repo.disconnect(user_id).await?;
        let session = self.forget(user_id, partner);
        if let Some(partner) = partner {
            tracing::info!(user_id = %user_id, partner_id = %partner, session = ?session, "session closed");
        }
        Ok(partner)
    }

    /// Drops metadata for a pair removed elsewhere, e.g. by a ban.
    pub fn forget(&self, user_id: UserId, partner: Option<UserId>) -> Option<String> {
        let mut map = self.meta_map();
        let removed = map.remove(&user_id);
        if let Some(partner) = partner {
            map.remove(&partner);
        }
        removed.map(|meta| meta.code)
    }

    pub fn meta(&self, user_id: UserId) -> Option<SessionMeta> {
        self.meta_map().get(&user_id).cloned()
    }

    /// Media cool-down check for the sender's current pair.
    pub fn check_media(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(), PolicyViolation> {
        let Some(meta) = self.meta(user_id) else {
            return Ok(());
        };
        match meta.media_lock_remaining(self.media_lock, now) {
            0 => Ok(()),
            remaining_secs => Err(PolicyViolation::MediaLocked { remaining_secs }),
        }
    }
}

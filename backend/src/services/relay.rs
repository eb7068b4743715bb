//! Forwarding between partners: link filter, control-text suppression and
//! recovery when the partner can no longer be reached.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::audit_log::AuditLogService;
use super::session::SessionManager;
use crate::error::{ChatError, PolicyViolation};
use crate::models::intent::is_control_text;
use crate::models::update::MediaRef;
use crate::transport::Messenger;
use crate::types::UserId;
use crate::validation::contains_link;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// Commands and menu labels are dropped without telling anyone.
    Suppressed,
    /// Delivery failed; the pair has been closed.
    PartnerGone { partner: UserId },
}

/// Forwards chat content to the sender's partner.
pub struct RelayRouter {
    sessions: Arc<SessionManager>,
    messenger: Arc<dyn Messenger>,
    audit: AuditLogService,
}

impl RelayRouter {
    pub fn new(
        sessions: Arc<SessionManager>,
        messenger: Arc<dyn Messenger>,
        audit: AuditLogService,
    ) -> Self {
        Self {
            sessions,
            messenger,
            audit,
        }
    }

    async fn partner_of(&self, sender: UserId) -> Result<UserId, ChatError> {
        self.sessions
            .get_partner(sender)
            .await?
            .ok_or(ChatError::NotFound("active chat"))
    }

    pub async fn relay_text(&self, sender: UserId, text: &str) -> Result<RelayOutcome, ChatError> {
        let partner = self.partner_of(sender).await?;
        if contains_link(text) {
            tracing::info!(user_id = %sender, "link blocked");
            return Err(PolicyViolation::LinkBlocked.into());
        }
        if is_control_text(text) {
            return Ok(RelayOutcome::Suppressed);
        }

        match self.messenger.send_text(partner.into(), text, None).await {
            Ok(()) => Ok(RelayOutcome::Delivered),
            Err(err) => {
                tracing::warn!(user_id = %sender, partner_id = %partner, error = %err, "text delivery failed");
                self.partner_gone(sender, partner).await
            }
        }
    }

    pub async fn relay_media(
        &self,
        sender: UserId,
        message_id: i64,
        media: &MediaRef,
        now: DateTime<Utc>,
    ) -> Result<RelayOutcome, ChatError> {
        let partner = self.partner_of(sender).await?;
        self.sessions.check_media(sender, now)?;
        if media.caption.as_deref().is_some_and(contains_link) {
            tracing::info!(user_id = %sender, "link in caption blocked");
            return Err(PolicyViolation::LinkBlocked.into());
        }

        if let Err(err) = self
            .messenger
            .copy_message(partner.into(), sender.into(), message_id)
            .await
        {
            tracing::warn!(user_id = %sender, partner_id = %partner, error = %err, "media delivery failed");
            return self.partner_gone(sender, partner).await;
        }
        self.audit.media_evidence(sender, partner, media, now).await;
        Ok(RelayOutcome::Delivered)
    }

    async fn partner_gone(
        &self,
        sender: UserId,
        partner: UserId,
    ) -> Result<RelayOutcome, ChatError> {
        self.sessions.disconnect(sender).await?;
        Ok(RelayOutcome::PartnerGone { partner })
    }
}

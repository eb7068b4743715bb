use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::config::LogChannels;
use crate::models::audit_log::{AuditChannel, AuditEvent, AuditRecord};
use crate::models::update::{MediaKind, MediaRef};
use crate::transport::Messenger;
use crate::types::UserId;

/// Best-effort audit sink posting records to the configured channels.
///
/// A channel without an id is disabled; failures are logged and dropped so
/// auditing never blocks the action being audited.
#[derive(Clone)]
pub struct AuditLogService {
    messenger: Arc<dyn Messenger>,
    channels: LogChannels,
}

impl AuditLogService {
    pub fn new(messenger: Arc<dyn Messenger>, channels: LogChannels) -> Self {
        for (channel, id) in [
            (AuditChannel::Moderation, channels.reports),
            (AuditChannel::Media, channels.media),
            (AuditChannel::Payments, channels.payments),
        ] {
            if id.is_none() {
                tracing::warn!(?channel, "audit channel not configured, logging disabled");
            }
        }
        Self {
            messenger,
            channels,
        }
    }

    pub async fn record_event(&self, record: AuditRecord) {
        tracing::info!(
            event = ?record.event,
            actor_id = ?record.actor_id,
            target_id = ?record.target_id,
            "audit event"
        );
        let Some(chat) = self.channels.get(record.channel()) else {
            return;
        };
        if let Err(err) = self
            .messenger
            .send_text(chat, &record.render(), None)
            .await
        {
            tracing::warn!(error = %err, channel = ?record.channel(), "failed to post audit record");
        }
    }

    /// Mirrors relayed media to the evidence channel. Stickers are skipped.
    pub async fn media_evidence(
        &self,
        from: UserId,
        to: UserId,
        media: &MediaRef,
        now: DateTime<Utc>,
    ) {
        if media.kind.is_ephemeral() {
            return;
        }
        let Some(chat) = self.channels.media else {
            return;
        };
        let caption = AuditRecord::new(AuditEvent::MediaEvidence, now)
            .actor(from)
            .target(to)
            .metadata(json!({
                "kind": media.kind.as_str(),
                "caption": media.caption.as_deref().unwrap_or("[No text]"),
            }))
            .render();

        let result = if media.kind == MediaKind::VideoNote {
            // Round videos take no caption, so the description goes first.
            match self.messenger.send_text(chat, &caption, None).await {
                Ok(()) => self.messenger.send_media(chat, media, None, None).await,
                Err(err) => Err(err),
            }
        } else {
            self.messenger
                .send_media(chat, media, Some(caption), None)
                .await
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, from = %from, to = %to, "failed to post media evidence");
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::UserId;

/// Logically separate audit sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditChannel {
    /// Bans, reports and appeals.
    Moderation,
    /// Relayed media evidence.
    Media,
    Payments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Report,
    Ban,
    Unban,
    BanAppeal,
    MediaEvidence,
    PaymentApproved,
    PaymentRejected,
    VipGranted,
    VipRevoked,
}

impl AuditEvent {
    pub fn channel(&self) -> AuditChannel {
        match self {
            AuditEvent::Report | AuditEvent::Ban | AuditEvent::Unban | AuditEvent::BanAppeal => {
                AuditChannel::Moderation
            }
            AuditEvent::MediaEvidence => AuditChannel::Media,
            AuditEvent::PaymentApproved
            | AuditEvent::PaymentRejected
            | AuditEvent::VipGranted
            | AuditEvent::VipRevoked => AuditChannel::Payments,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AuditEvent::Report => "🚨 NEW REPORT",
            AuditEvent::Ban => "🔨 USER BANNED",
            AuditEvent::Unban => "🔓 USER UNBANNED",
            AuditEvent::BanAppeal => "📩 BAN APPEAL",
            AuditEvent::MediaEvidence => "🕵️ EVIDENCE LOG",
            AuditEvent::PaymentApproved => "🧾 PAYMENT VERIFIED",
            AuditEvent::PaymentRejected => "❌ PAYMENT REJECTED",
            AuditEvent::VipGranted => "💎 VIP GRANTED",
            AuditEvent::VipRevoked => "📉 VIP REMOVED",
        }
    }
}

/// Structured record handed to the audit sink.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub occurred_at: DateTime<Utc>,
    pub event: AuditEvent,
    pub actor_id: Option<UserId>,
    pub target_id: Option<UserId>,
    pub metadata: Option<Value>,
}

impl AuditRecord {
    pub fn new(event: AuditEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            occurred_at,
            event,
            actor_id: None,
            target_id: None,
            metadata: None,
        }
    }

    pub fn actor(mut self, actor: UserId) -> Self {
        self.actor_id = Some(actor);
        self
    }

    pub fn target(mut self, target: UserId) -> Self {
        self.target_id = Some(target);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn channel(&self) -> AuditChannel {
        self.event.channel()
    }

    /// Plain-text rendering posted to the channel.
    pub fn render(&self) -> String {
        let mut lines = vec![self.event.title().to_string(), "━━━━━━━━━━━".to_string()];
        if let Some(actor) = self.actor_id {
            lines.push(format!("From: {}", actor));
        }
        if let Some(target) = self.target_id {
            lines.push(format!("Target: {}", target));
        }
        if let Some(Value::Object(fields)) = &self.metadata {
            for (key, value) in fields {
                let value = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                lines.push(format!("{}: {}", key, value));
            }
        }
        lines.push(format!(
            "Time: {}",
            self.occurred_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.join("\n")
    }
}

use anyhow::{anyhow, Context};
use chrono_tz::Tz;
use std::env;
use std::net::SocketAddr;

use crate::models::audit_log::AuditChannel;
use crate::types::{ChatId, UserId};

const DEFAULT_MEDIA_LOCK_SECONDS: u64 = 120;

/// Audit channel ids. A missing or invalid id disables that channel only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogChannels {
    pub reports: Option<ChatId>,
    pub media: Option<ChatId>,
    pub payments: Option<ChatId>,
}

impl LogChannels {
    pub fn get(&self, channel: AuditChannel) -> Option<ChatId> {
        match channel {
            AuditChannel::Moderation => self.reports,
            AuditChannel::Media => self.media,
            AuditChannel::Payments => self.payments,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bot_token: String,
    pub admin_id: UserId,
    pub http_addr: SocketAddr,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub log_channels: LogChannels,
    pub broadcast_channel: Option<ChatId>,
    pub media_lock_seconds: u64,
    pub payment_qr: Option<String>,
    pub time_zone: Tz,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;
        let admin_raw = env::var("ADMIN_ID").context("ADMIN_ID must be set")?;
        let admin_id: UserId = admin_raw
            .parse()
            .map_err(|_| anyhow!("Invalid ADMIN_ID value: {}", admin_raw))?;

        let http_addr = match env::var("HTTP_ADDR") {
            Ok(addr) => addr
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_ADDR value: {}", addr))?,
            Err(_) => {
                let port: u16 = env::var("PORT")
                    .ok()
                    .and_then(|port| port.parse().ok())
                    .unwrap_or(8080);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let log_channels = LogChannels {
            reports: optional_channel("LOG_CHANNEL_REPORTS"),
            media: optional_channel("LOG_CHANNEL_MEDIA"),
            payments: optional_channel("LOG_CHANNEL_PAYMENTS"),
        };

        let media_lock_seconds = env::var("MEDIA_LOCK_SECONDS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_MEDIA_LOCK_SECONDS);

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        Ok(Config {
            database_url,
            bot_token,
            admin_id,
            http_addr,
            webhook_url: non_empty("WEBHOOK_URL"),
            webhook_secret: non_empty("WEBHOOK_SECRET"),
            log_channels,
            broadcast_channel: optional_channel("CHANNEL_ID"),
            media_lock_seconds,
            payment_qr: non_empty("PAYMENT_QR_FILE"),
            time_zone,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn optional_channel(key: &str) -> Option<ChatId> {
    let raw = non_empty(key)?;
    match parse_channel(&raw) {
        Some(id) => Some(id),
        None => {
            tracing::warn!(key, value = %raw, "invalid channel id, feature disabled");
            None
        }
    }
}

fn parse_channel(raw: &str) -> Option<ChatId> {
    raw.parse().ok()
}

//! Bot API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Button, Menu, Messenger, TransportError};
use crate::models::update::{MediaKind, MediaRef, Update};
use crate::types::ChatId;

const API_BASE: &str = "https://api.telegram.org";
/// Must exceed the long-poll timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(75);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> anyhow::Result<Self> {
        Self::with_base_url(API_BASE, bot_token)
    }

    pub fn with_base_url(api_base: &str, bot_token: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize HTTP client: {}", e))?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
    ) -> Result<T, TransportError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;
        let parsed: ApiResponse<T> = response.json().await?;
        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Api {
                method,
                description: parsed
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TransportError> {
        let mut body = json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(secret) = secret {
            body["secret_token"] = json!(secret);
        }
        self.call::<bool>("setWebhook", &body).await.map(|_| ())
    }

    pub async fn delete_webhook(&self, drop_pending: bool) -> Result<(), TransportError> {
        self.call::<bool>(
            "deleteWebhook",
            &json!({ "drop_pending_updates": drop_pending }),
        )
        .await
        .map(|_| ())
    }
}

fn media_method(kind: MediaKind) -> (&'static str, &'static str) {
    match kind {
        MediaKind::Photo => ("sendPhoto", "photo"),
        MediaKind::Video => ("sendVideo", "video"),
        MediaKind::Voice => ("sendVoice", "voice"),
        MediaKind::Audio => ("sendAudio", "audio"),
        MediaKind::VideoNote => ("sendVideoNote", "video_note"),
        MediaKind::Document => ("sendDocument", "document"),
        MediaKind::Sticker => ("sendSticker", "sticker"),
    }
}

fn reply_markup(menu: &Menu) -> Value {
    if let Some(rows) = menu.reply_rows() {
        let keyboard: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(|text| json!({ "text": text })).collect())
            .collect();
        return json!({ "keyboard": keyboard, "resize_keyboard": true });
    }
    let Menu::Inline(rows) = menu else {
        return Value::Null;
    };
    let inline: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match button {
                    Button::Action { text, action } => {
                        json!({ "text": text, "callback_data": action.encode() })
                    }
                    Button::Link { text, url } => json!({ "text": text, "url": url }),
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": inline })
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        menu: Option<Menu>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "chat_id": chat, "text": text });
        if let Some(menu) = menu {
            body["reply_markup"] = reply_markup(&menu);
        }
        self.call::<Value>("sendMessage", &body).await.map(|_| ())
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: i64,
    ) -> Result<(), TransportError> {
        let body = json!({
            "chat_id": to,
            "from_chat_id": from,
            "message_id": message_id,
        });
        self.call::<Value>("copyMessage", &body).await.map(|_| ())
    }

    async fn send_media(
        &self,
        chat: ChatId,
        media: &MediaRef,
        caption: Option<String>,
        menu: Option<Menu>,
    ) -> Result<(), TransportError> {
        let (method, field) = media_method(media.kind);
        let mut body = json!({ "chat_id": chat });
        body[field] = json!(media.file_id);
        // Round videos and stickers carry no caption.
        if let Some(caption) = caption {
            if !matches!(media.kind, MediaKind::VideoNote | MediaKind::Sticker) {
                body["caption"] = json!(caption);
            }
        }
        if let Some(menu) = menu {
            body["reply_markup"] = reply_markup(&menu);
        }
        self.call::<Value>(method, &body).await.map(|_| ())
    }

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<String>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "callback_query_id": query_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<bool>("answerCallbackQuery", &body)
            .await
            .map(|_| ())
    }
}

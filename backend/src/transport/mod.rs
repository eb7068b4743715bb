//! Outbound messaging collaborator.
//!
//! The core only needs to deliver text or media to a chat and learn whether
//! delivery worked. Everything platform specific lives behind [`Messenger`].

pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::intent::{labels, CallbackAction};
use crate::models::update::MediaRef;
use crate::types::ChatId;

pub use telegram::TelegramClient;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} rejected: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

/// Inline button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Action { text: String, action: CallbackAction },
    Link { text: String, url: String },
}

impl Button {
    pub fn action(text: impl Into<String>, action: CallbackAction) -> Self {
        Button::Action {
            text: text.into(),
            action,
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Link {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// Keyboard shown with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Menu {
    /// Idle main menu.
    Main,
    /// Exit and report, shown while searching or chatting.
    InChat,
    /// Single cancel button while a reason is awaited.
    Cancel,
    Inline(Vec<Vec<Button>>),
}

impl Menu {
    /// Reply-keyboard rows, `None` for inline menus.
    pub fn reply_rows(&self) -> Option<Vec<Vec<&'static str>>> {
        let rows = match self {
            Menu::Main => vec![
                vec![labels::CHAT, labels::RECHAT],
                vec![labels::SETTINGS, labels::PREMIUM],
                vec![labels::HELP, labels::ABOUT],
            ],
            Menu::InChat => vec![vec![labels::EXIT, labels::REPORT]],
            Menu::Cancel => vec![vec![labels::CANCEL]],
            Menu::Inline(_) => return None,
        };
        Some(rows)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        menu: Option<Menu>,
    ) -> Result<(), TransportError>;

    /// Re-sends an existing message to another chat without the forward header.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: i64,
    ) -> Result<(), TransportError>;

    async fn send_media(
        &self,
        chat: ChatId,
        media: &MediaRef,
        caption: Option<String>,
        menu: Option<Menu>,
    ) -> Result<(), TransportError>;

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<String>,
    ) -> Result<(), TransportError>;
}

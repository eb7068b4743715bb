//! Inbound updates from the Bot API and the events the dispatcher consumes.

use serde::Deserialize;

use super::intent::CallbackAction;
use crate::types::{ChatId, UserId};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<Sender>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Sizes in ascending order; the last one is the original.
    #[serde(default)]
    pub photo: Option<Vec<FileRef>>,
    #[serde(default)]
    pub video: Option<FileRef>,
    #[serde(default)]
    pub voice: Option<FileRef>,
    #[serde(default)]
    pub audio: Option<FileRef>,
    #[serde(default)]
    pub video_note: Option<FileRef>,
    #[serde(default)]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub sticker: Option<FileRef>,
}

impl Message {
    /// The media payload carried by this message, if any.
    pub fn media(&self) -> Option<MediaRef> {
        let (kind, file) = if let Some(sizes) = &self.photo {
            (MediaKind::Photo, sizes.last()?)
        } else if let Some(file) = &self.video {
            (MediaKind::Video, file)
        } else if let Some(file) = &self.voice {
            (MediaKind::Voice, file)
        } else if let Some(file) = &self.audio {
            (MediaKind::Audio, file)
        } else if let Some(file) = &self.video_note {
            (MediaKind::VideoNote, file)
        } else if let Some(file) = &self.document {
            (MediaKind::Document, file)
        } else if let Some(file) = &self.sticker {
            (MediaKind::Sticker, file)
        } else {
            return None;
        };
        Some(MediaRef {
            kind,
            file_id: file.file_id.clone(),
            caption: self.caption.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Voice,
    Audio,
    VideoNote,
    Document,
    Sticker,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Voice => "voice",
            MediaKind::Audio => "audio",
            MediaKind::VideoNote => "video_note",
            MediaKind::Document => "document",
            MediaKind::Sticker => "sticker",
        }
    }

    /// Stickers are ephemeral and never mirrored to the evidence channel.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, MediaKind::Sticker)
    }
}

/// Reference to media already stored by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file_id: String,
    pub caption: Option<String>,
}

/// What the dispatcher sees for one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Text {
        from: UserId,
        text: String,
    },
    Media {
        from: UserId,
        message_id: i64,
        media: MediaRef,
    },
    Callback {
        from: UserId,
        query_id: String,
        /// `None` when the payload is not a known action.
        action: Option<CallbackAction>,
    },
}

impl InboundEvent {
    pub fn user(&self) -> UserId {
        match self {
            InboundEvent::Text { from, .. }
            | InboundEvent::Media { from, .. }
            | InboundEvent::Callback { from, .. } => *from,
        }
    }
}

impl Update {
    /// Private-chat messages and button presses; everything else is ignored.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            return Some(InboundEvent::Callback {
                from: query.from.id,
                action: query.data.as_deref().and_then(CallbackAction::decode),
                query_id: query.id,
            });
        }

        let message = self.message?;
        if !message.chat.is_private() {
            return None;
        }
        let from = message.from.as_ref()?.id;
        if let Some(text) = message.text.clone() {
            return Some(InboundEvent::Text { from, text });
        }
        let media = message.media()?;
        Some(InboundEvent::Media {
            from,
            message_id: message.message_id,
            media,
        })
    }
}

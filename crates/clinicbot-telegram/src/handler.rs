// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering and conversion of incoming Telegram messages.
//!
//! Only private chats reach the clinic inbox. The message is reduced to
//! the sender's identity and its text into a channel-agnostic
//! [`InboundMessage`].

use clinicbot_core::types::{ContactProfile, InboundMessage};
use clinicbot_core::LanguageCode;
use teloxide::types::{ChatKind, Message};

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Text of a message, falling back to a media caption.
///
/// Returns `None` for stickers, locations, and other non-text updates.
pub fn message_text(msg: &Message) -> Option<&str> {
    msg.text()
        .or_else(|| msg.caption())
        .filter(|t| !t.trim().is_empty())
}

/// Identity of the sender as seen on this message.
///
/// The contact id is the chat id, which is where replies must go.
pub fn sender_profile(msg: &Message) -> ContactProfile {
    let mut profile = ContactProfile::new(msg.chat.id.0.to_string());
    if let Some(user) = msg.from.as_ref() {
        profile.username = user.username.clone();
        profile.first_name = Some(user.first_name.clone()).filter(|n| !n.is_empty());
        profile.last_name = user.last_name.clone();
        profile.language = user
            .language_code
            .as_deref()
            .and_then(LanguageCode::from_tag);
    }
    profile
}

/// Converts a Telegram message and its text into an [`InboundMessage`].
pub fn to_inbound_message(msg: &Message, text: &str) -> InboundMessage {
    InboundMessage {
        id: msg.id.0.to_string(),
        sender: sender_profile(msg),
        text: text.to_string(),
        timestamp: msg.date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
    }
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handling of inbound patient messages: directory, log, auto-reply, alerts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use clinicbot_core::notification::fields;
use clinicbot_core::settings::Greeting;
use clinicbot_core::types::{Contact, Direction, InboundMessage};
use clinicbot_core::{
    BotSettings, ClinicError, DispatchResult, NotificationCategory, NotificationEvent,
};

use crate::dispatcher::Dispatcher;
use crate::routing::AUTO_REPLY_CATEGORY;

/// What happened to one inbound message.
#[derive(Debug, Clone)]
pub struct InboundOutcome {
    pub contact: Contact,
    pub created: bool,
    /// Welcome or offline reply, if one was attempted.
    pub auto_reply: Option<DispatchResult>,
    /// `new_contact` / `new_message` dispatches, in order.
    pub notifications: Vec<DispatchResult>,
}

pub struct InboundRouter {
    dispatcher: Arc<Dispatcher>,
}

impl InboundRouter {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Records the message and its sender, then replies and alerts operators.
    pub async fn handle(&self, msg: InboundMessage) -> Result<InboundOutcome, ClinicError> {
        let storage = self.dispatcher.storage();

        let (contact, created) = storage.upsert_contact(&msg.sender).await?;
        storage
            .append_conversation(&contact.channel_id, Direction::Inbound, &msg.text)
            .await?;
        clinicbot_prometheus::record_inbound();

        let mut outcome = InboundOutcome {
            contact,
            created,
            auto_reply: None,
            notifications: Vec::new(),
        };
        if outcome.contact.blocked {
            debug!(contact = %outcome.contact.channel_id, "ignoring message from blocked contact");
            return Ok(outcome);
        }

        let settings = storage.get_settings().await?;
        let received_at = DateTime::parse_from_rfc3339(&msg.timestamp)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let greeting = self
            .greeting_kind(&settings, created, &msg, received_at)
            .and_then(|kind| settings.greeting(kind, outcome.contact.language))
            .filter(|t| !t.trim().is_empty());
        if let Some(text) = greeting {
            let event = NotificationEvent::new(NotificationCategory::from(AUTO_REPLY_CATEGORY))
                .with(fields::MESSAGE, text)
                .to(outcome.contact.channel_id.clone());
            outcome.auto_reply = Some(self.dispatcher.dispatch(event).await);
        }

        let name = outcome.contact.display_name();
        let username = outcome
            .contact
            .username
            .as_deref()
            .map(|u| format!("@{u}"))
            .unwrap_or_else(|| "-".into());

        if created {
            let event = NotificationEvent::new(NotificationCategory::NewContact)
                .with(fields::NAME, name.clone())
                .with(fields::USERNAME, username.clone())
                .with(fields::CONTACT_ID, outcome.contact.channel_id.clone());
            outcome.notifications.push(self.dispatcher.dispatch(event).await);
        }
        if !msg.is_command() {
            let event = NotificationEvent::new(NotificationCategory::NewMessage)
                .with(fields::NAME, name)
                .with(fields::USERNAME, username)
                .with(fields::CONTACT_ID, outcome.contact.channel_id.clone())
                .with(fields::MESSAGE, msg.text.clone());
            outcome.notifications.push(self.dispatcher.dispatch(event).await);
        }

        Ok(outcome)
    }

    /// Welcome for `/start` and first contact; offline outside working hours.
    fn greeting_kind(
        &self,
        settings: &BotSettings,
        created: bool,
        msg: &InboundMessage,
        received_at: DateTime<Utc>,
    ) -> Option<Greeting> {
        if !settings.active || !settings.auto_responder {
            return None;
        }
        if created || is_start_command(&msg.text) {
            return Some(Greeting::Welcome);
        }
        if !settings.is_working_time(self.dispatcher.local_time(received_at)) {
            return Some(Greeting::Offline);
        }
        None
    }
}

fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|cmd| cmd == "/start" || cmd.starts_with("/start@"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command_forms() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("  /start ref123"));
        assert!(is_start_command("/start@clinic_bot"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("start"));
        assert!(!is_start_command(""));
    }
}

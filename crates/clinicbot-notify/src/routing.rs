// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static routing: per-category group chats and message formats.

use std::borrow::Cow;
use std::collections::BTreeMap;

use clinicbot_config::model::NotificationsConfig;
use clinicbot_core::NotificationCategory;

/// Category used for admin replies to a contact.
pub const REPLY_CATEGORY: &str = "reply";
/// Category used for welcome and offline messages.
pub const AUTO_REPLY_CATEGORY: &str = "auto_reply";

const NEW_APPOINTMENT_FORMAT: &str = "New appointment\n\
Name: {name}\n\
Phone: {phone}\n\
Email: {email}\n\
Date: {date} {time}\n\
Service: {service}\n\
Note: {message}";

const APPOINTMENT_REMINDER_FORMAT: &str = "Appointment reminder\n\
Name: {name}\n\
Phone: {phone}\n\
Date: {date} {time}\n\
Service: {service}";

const NEW_MESSAGE_FORMAT: &str = "New message from {name} ({username})\n{message}";

const NEW_CONTACT_FORMAT: &str = "New contact: {name} ({username})\nChat id: {contact_id}";

const DAILY_SUMMARY_FORMAT: &str = "Daily summary for {date}\n\
New contacts: {new_contacts}\n\
Incoming messages: {inbound}\n\
Outgoing messages: {outbound}";

/// Group destinations and format overrides, keyed by category name.
#[derive(Debug, Clone, Default)]
pub struct NotificationRouting {
    groups: BTreeMap<String, String>,
    formats: BTreeMap<String, String>,
}

impl NotificationRouting {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            groups: config.groups.clone(),
            formats: config.formats.clone(),
        }
    }

    /// Group chat configured for the category, if any.
    pub fn group_for(&self, category: &NotificationCategory) -> Option<&str> {
        self.groups
            .get(category.as_str())
            .map(String::as_str)
            .filter(|g| !g.trim().is_empty())
    }

    /// Format string for the category: configured override, else the built-in one.
    ///
    /// Unlisted custom categories get a `key: {key}` line per payload field.
    pub fn format_for<'a>(
        &'a self,
        category: &NotificationCategory,
        payload: &BTreeMap<String, String>,
    ) -> Cow<'a, str> {
        if let Some(format) = self.formats.get(category.as_str()) {
            return Cow::Borrowed(format);
        }
        match category {
            NotificationCategory::NewAppointment => Cow::Borrowed(NEW_APPOINTMENT_FORMAT),
            NotificationCategory::AppointmentReminder => Cow::Borrowed(APPOINTMENT_REMINDER_FORMAT),
            NotificationCategory::NewMessage => Cow::Borrowed(NEW_MESSAGE_FORMAT),
            NotificationCategory::NewContact => Cow::Borrowed(NEW_CONTACT_FORMAT),
            NotificationCategory::DailySummary => Cow::Borrowed(DAILY_SUMMARY_FORMAT),
            NotificationCategory::Custom(name)
                if name == REPLY_CATEGORY || name == AUTO_REPLY_CATEGORY =>
            {
                Cow::Borrowed("{message}")
            }
            NotificationCategory::Custom(name) => {
                let mut lines = vec![name.clone()];
                lines.extend(payload.keys().map(|k| format!("{k}: {{{k}}}")));
                Cow::Owned(lines.join("\n"))
            }
        }
    }
}

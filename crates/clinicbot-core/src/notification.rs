// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification events and dispatch results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::NotificationToggles;

/// Reason reported when the master switch is off.
pub const REASON_BOT_DISABLED: &str = "bot disabled";
/// Reason reported when the event's category toggle is off.
pub const REASON_CATEGORY_DISABLED: &str = "category disabled";
/// Reason reported when no destination could be resolved.
pub const REASON_NO_DESTINATION: &str = "no destination";

/// Well-known payload keys, usable as `{key}` placeholders in formats.
pub mod fields {
    pub const NAME: &str = "name";
    pub const PHONE: &str = "phone";
    pub const EMAIL: &str = "email";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const SERVICE: &str = "service";
    pub const MESSAGE: &str = "message";
    pub const CONTACT_ID: &str = "contact_id";
    pub const USERNAME: &str = "username";
}

/// Kind of business event being announced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationCategory {
    NewAppointment,
    AppointmentReminder,
    NewMessage,
    NewContact,
    DailySummary,
    /// Any other category (manual tests, admin replies). Never toggled off.
    Custom(String),
}

impl NotificationCategory {
    /// Names of the categories with a settings toggle.
    pub const BUILTIN: [&'static str; 5] = [
        "new_appointment",
        "appointment_reminder",
        "new_message",
        "new_contact",
        "daily_summary",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::NewAppointment => "new_appointment",
            Self::AppointmentReminder => "appointment_reminder",
            Self::NewMessage => "new_message",
            Self::NewContact => "new_contact",
            Self::DailySummary => "daily_summary",
            Self::Custom(name) => name,
        }
    }

    /// Whether the settings allow this category. Custom categories always pass.
    pub fn is_enabled(&self, toggles: &NotificationToggles) -> bool {
        match self {
            Self::NewAppointment => toggles.new_appointment,
            Self::AppointmentReminder => toggles.appointment_reminder,
            Self::NewMessage => toggles.new_message,
            Self::NewContact => toggles.new_contact,
            Self::DailySummary => toggles.daily_summary,
            Self::Custom(_) => true,
        }
    }

    /// Categories offered by the admin "send test notification" action.
    pub fn is_testable(&self) -> bool {
        matches!(self, Self::NewAppointment | Self::AppointmentReminder)
    }
}

impl From<&str> for NotificationCategory {
    fn from(s: &str) -> Self {
        match s {
            "new_appointment" => Self::NewAppointment,
            "appointment_reminder" => Self::AppointmentReminder,
            "new_message" => Self::NewMessage,
            "new_contact" => Self::NewContact,
            "daily_summary" => Self::DailySummary,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for NotificationCategory {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<NotificationCategory> for String {
    fn from(c: NotificationCategory) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient event handed to the dispatcher once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub category: NotificationCategory,
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
    /// Explicit chat id or `@username`. `None` routes to the configured group or operators.
    #[serde(default)]
    pub destination: Option<String>,
}

impl NotificationEvent {
    pub fn new(category: NotificationCategory) -> Self {
        Self {
            category,
            payload: BTreeMap::new(),
            destination: None,
        }
    }

    /// Adds a payload field.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Sends to an explicit destination instead of the configured routing.
    pub fn to(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Aggregate outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Every destination accepted the message.
    Sent,
    /// Some destinations accepted the message.
    PartiallySent,
    /// No destination accepted the message, or none resolved.
    Failed,
    /// Short-circuited by settings; no channel call was made.
    NotSent,
}

impl DispatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::PartiallySent => "partially_sent",
            Self::Failed => "failed",
            Self::NotSent => "not_sent",
        }
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered { message_id: String },
    /// `error` is the raw channel error text.
    Failed { error: String },
}

/// Delivery attempt for a single destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub destination: String,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered { .. })
    }

    /// The channel error, if this attempt failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            DeliveryOutcome::Failed { error } => Some(error),
            DeliveryOutcome::Delivered { .. } => None,
        }
    }
}

/// Result surfaced to the dispatch caller. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub status: DispatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Rendered message text, when rendering happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub deliveries: Vec<DeliveryReport>,
}

impl DispatchResult {
    pub fn not_sent(reason: &str) -> Self {
        Self {
            status: DispatchStatus::NotSent,
            reason: Some(reason.to_string()),
            message: None,
            deliveries: Vec::new(),
        }
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            status: DispatchStatus::Failed,
            reason: Some(reason.to_string()),
            message: None,
            deliveries: Vec::new(),
        }
    }

    /// Aggregates per-destination reports into a status.
    pub fn from_deliveries(message: String, deliveries: Vec<DeliveryReport>) -> Self {
        let delivered = deliveries.iter().filter(|d| d.is_delivered()).count();
        let status = if delivered == 0 {
            DispatchStatus::Failed
        } else if delivered == deliveries.len() {
            DispatchStatus::Sent
        } else {
            DispatchStatus::PartiallySent
        };
        Self {
            status,
            reason: None,
            message: Some(message),
            deliveries,
        }
    }

    pub fn delivered_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_delivered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.deliveries.len() - self.delivered_count()
    }
}

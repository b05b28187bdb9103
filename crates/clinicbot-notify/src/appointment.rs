// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment notices handed over by the booking side.

use serde::{Deserialize, Serialize};

use clinicbot_core::notification::fields;
use clinicbot_core::{NotificationCategory, NotificationEvent};

/// Placeholder for appointment fields the booking form left empty.
const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentKind {
    New,
    Reminder,
}

impl AppointmentKind {
    pub fn category(self) -> NotificationCategory {
        match self {
            Self::New => NotificationCategory::NewAppointment,
            Self::Reminder => NotificationCategory::AppointmentReminder,
        }
    }
}

/// Typed appointment fields, converted into a notification event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentNotice {
    pub kind: AppointmentKind,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Explicit chat id or `@username`; `None` uses the configured routing.
    #[serde(default)]
    pub destination: Option<String>,
}

impl AppointmentNotice {
    pub fn new(kind: AppointmentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            phone: None,
            email: None,
            date: None,
            time: None,
            service: None,
            message: None,
            destination: None,
        }
    }

    pub fn into_event(self) -> NotificationEvent {
        let optional = [
            (fields::PHONE, self.phone),
            (fields::EMAIL, self.email),
            (fields::DATE, self.date),
            (fields::TIME, self.time),
            (fields::SERVICE, self.service),
            (fields::MESSAGE, self.message),
        ];

        let mut event = NotificationEvent::new(self.kind.category()).with(fields::NAME, self.name);
        for (key, value) in optional {
            let value = value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| MISSING.to_string());
            event = event.with(key, value);
        }
        event.destination = self.destination.filter(|d| !d.trim().is_empty());
        event
    }
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The notification dispatcher.
//!
//! Turns a [`NotificationEvent`] into one rendered message and attempts one
//! channel send per resolved destination. Delivery problems are reported in
//! the returned [`DispatchResult`]; `dispatch` itself never fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc};
use tracing::{debug, info, warn};

use clinicbot_core::notification::{
    REASON_BOT_DISABLED, REASON_CATEGORY_DISABLED, REASON_NO_DESTINATION, fields,
};
use clinicbot_core::types::{Direction, OutboundMessage};
use clinicbot_core::{
    BotSettings, ChannelAdapter, ClinicError, DeliveryOutcome, DeliveryReport, Destination,
    DispatchResult, NotificationCategory, NotificationEvent, StorageAdapter,
};

use crate::appointment::{AppointmentKind, AppointmentNotice};
use crate::render::render;
use crate::routing::{NotificationRouting, REPLY_CATEGORY};

/// Routes notification events to the external channel.
pub struct Dispatcher {
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    routing: NotificationRouting,
    utc_offset: FixedOffset,
}

impl Dispatcher {
    /// Creates a dispatcher with no configured groups and UTC local time.
    pub fn new(storage: Arc<dyn StorageAdapter>, channel: Arc<dyn ChannelAdapter>) -> Self {
        Self {
            storage,
            channel,
            routing: NotificationRouting::default(),
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_routing(mut self, routing: NotificationRouting) -> Self {
        self.routing = routing;
        self
    }

    /// Sets the clinic's local offset. Out-of-range values keep UTC.
    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => self.utc_offset = offset,
            None => warn!(minutes, "ignoring out-of-range UTC offset"),
        }
        self
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Wall-clock time at the clinic for `at`.
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.utc_offset).naive_local()
    }

    /// Dispatches one event. Failures are returned as data.
    pub async fn dispatch(&self, event: NotificationEvent) -> DispatchResult {
        let category = event.category.clone();
        let result = self.dispatch_event(event).await;

        clinicbot_prometheus::record_dispatch(category.as_str(), result.status);
        info!(
            category = %category,
            status = result.status.as_str(),
            delivered = result.delivered_count(),
            failed = result.failed_count(),
            reason = result.reason.as_deref().unwrap_or(""),
            "notification dispatched"
        );
        result
    }

    async fn dispatch_event(&self, event: NotificationEvent) -> DispatchResult {
        let settings = match self.storage.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "could not load bot settings");
                return DispatchResult::failed(&format!("settings unavailable: {e}"));
            }
        };

        if !settings.active {
            return DispatchResult::not_sent(REASON_BOT_DISABLED);
        }
        if !event.category.is_enabled(&settings.notifications) {
            return DispatchResult::not_sent(REASON_CATEGORY_DISABLED);
        }

        let format = self.routing.format_for(&event.category, &event.payload);
        let message = render(&format, &event.payload);

        let destinations = resolve_destinations(
            &event,
            self.routing.group_for(&event.category),
            &settings,
        );
        if destinations.is_empty() {
            let mut result = DispatchResult::failed(REASON_NO_DESTINATION);
            result.message = Some(message);
            return result;
        }

        let mut deliveries = Vec::with_capacity(destinations.len());
        for destination in destinations {
            deliveries.push(self.deliver(destination, &message).await);
        }
        DispatchResult::from_deliveries(message, deliveries)
    }

    /// One send attempt. Never affects other destinations.
    async fn deliver(&self, raw: String, message: &str) -> DeliveryReport {
        let destination = match raw.parse::<Destination>() {
            Ok(destination) => destination,
            Err(e) => {
                clinicbot_prometheus::record_delivery(false);
                warn!(destination = %raw, error = %e, "unusable destination");
                return DeliveryReport {
                    destination: raw,
                    outcome: DeliveryOutcome::Failed {
                        error: e.to_string(),
                    },
                };
            }
        };

        let outbound = OutboundMessage {
            destination: destination.clone(),
            content: message.to_string(),
        };
        let outcome = match self.channel.send(outbound).await {
            Ok(id) => {
                clinicbot_prometheus::record_delivery(true);
                self.log_outbound(&destination, message).await;
                DeliveryOutcome::Delivered { message_id: id.0 }
            }
            Err(e) => {
                clinicbot_prometheus::record_delivery(false);
                let error = match e {
                    ClinicError::Channel { message, .. } => message,
                    other => other.to_string(),
                };
                warn!(destination = %destination, error = %error, "delivery failed");
                DeliveryOutcome::Failed { error }
            }
        };

        DeliveryReport {
            destination: destination.to_string(),
            outcome,
        }
    }

    /// Appends a delivered message to the recipient's conversation, if known.
    async fn log_outbound(&self, destination: &Destination, message: &str) {
        let found = match destination {
            Destination::ChatId(id) => self.storage.find_contact(&id.to_string()).await,
            Destination::Username(name) => self.storage.find_contact_by_username(name).await,
        };
        let contact = match found {
            Ok(Some(contact)) => contact,
            Ok(None) => return,
            Err(e) => {
                warn!(destination = %destination, error = %e, "contact lookup failed");
                return;
            }
        };
        if let Err(e) = self
            .storage
            .append_conversation(&contact.channel_id, Direction::Outbound, message)
            .await
        {
            warn!(contact = %contact.channel_id, error = %e, "failed to log outbound message");
        }
    }

    /// Announces a booking event. Never fails the caller.
    pub async fn notify_appointment(&self, notice: AppointmentNotice) -> DispatchResult {
        self.dispatch(notice.into_event()).await
    }

    /// Sends a synthetic appointment notification to `destination`.
    pub async fn send_test(
        &self,
        destination: &str,
        category: NotificationCategory,
    ) -> Result<DispatchResult, ClinicError> {
        if !category.is_testable() {
            return Err(ClinicError::Validation(format!(
                "category `{category}` cannot be tested; use new_appointment or appointment_reminder"
            )));
        }
        let destination: Destination = destination.parse()?;

        let kind = match category {
            NotificationCategory::AppointmentReminder => AppointmentKind::Reminder,
            _ => AppointmentKind::New,
        };
        let today = self.local_time(Utc::now()).format("%Y-%m-%d").to_string();
        let notice = AppointmentNotice {
            kind,
            name: "Test Patient".into(),
            phone: Some("+905551112233".into()),
            email: Some("test@example.com".into()),
            date: Some(today),
            time: Some("10:00".into()),
            service: Some("Hair Transplant".into()),
            message: Some("This is a test notification.".into()),
            destination: Some(destination.to_string()),
        };

        debug!(destination = %destination, category = %category, "sending test notification");
        Ok(self.notify_appointment(notice).await)
    }

    /// Sends an operator's reply to a patient.
    pub async fn reply_to_contact(
        &self,
        contact_id: &str,
        text: &str,
    ) -> Result<DispatchResult, ClinicError> {
        if text.trim().is_empty() {
            return Err(ClinicError::Validation("reply text must not be empty".into()));
        }
        let contact = self
            .storage
            .find_contact(contact_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("contact", contact_id))?;
        if contact.blocked {
            return Err(ClinicError::Validation(format!(
                "contact {contact_id} is blocked"
            )));
        }

        let event = NotificationEvent::new(NotificationCategory::from(REPLY_CATEGORY))
            .with(fields::MESSAGE, text)
            .to(contact.channel_id);
        Ok(self.dispatch(event).await)
    }

    /// Renders a stored template for a contact and sends it as a reply.
    ///
    /// `{name}` and `{username}` come from the contact; `extra` adds or
    /// overrides placeholders.
    pub async fn send_template(
        &self,
        template_id: &str,
        contact_id: &str,
        extra: BTreeMap<String, String>,
    ) -> Result<DispatchResult, ClinicError> {
        let template = self
            .storage
            .get_template(template_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("template", template_id))?;
        let contact = self
            .storage
            .find_contact(contact_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("contact", contact_id))?;

        let mut payload = BTreeMap::new();
        payload.insert(fields::NAME.to_string(), contact.display_name());
        payload.insert(
            fields::USERNAME.to_string(),
            contact
                .username
                .as_deref()
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| "-".into()),
        );
        payload.extend(extra);

        let body = render(&template.body, &payload);
        self.reply_to_contact(contact_id, &body).await
    }

    /// Sends the activity summary for the local day containing `now`.
    pub async fn send_daily_summary(&self, now: DateTime<Utc>) -> Result<DispatchResult, ClinicError> {
        let local = self.local_time(now);
        let since = day_start_utc(local, self.utc_offset);
        let stats = self.storage.conversation_stats_since(&since).await?;

        let event = NotificationEvent::new(NotificationCategory::DailySummary)
            .with(fields::DATE, local.format("%Y-%m-%d").to_string())
            .with("new_contacts", stats.new_contacts.to_string())
            .with("inbound", stats.inbound.to_string())
            .with("outbound", stats.outbound.to_string());
        Ok(self.dispatch(event).await)
    }
}

/// Destinations for an event, deduplicated in order.
///
/// An explicit destination wins outright. Otherwise the category's group
/// chat, else every active operator.
fn resolve_destinations(
    event: &NotificationEvent,
    group: Option<&str>,
    settings: &BotSettings,
) -> Vec<String> {
    let explicit = event.destination.as_deref().map(str::trim);
    if let Some(explicit) = explicit.filter(|d| !d.is_empty()) {
        return vec![explicit.to_string()];
    }
    if let Some(group) = group {
        return vec![group.trim().to_string()];
    }

    let mut out: Vec<String> = Vec::new();
    for operator in settings.active_operators() {
        let raw = match operator.destination() {
            Ok(destination) => destination.to_string(),
            Err(_) if !operator.id.trim().is_empty() => operator.id.trim().to_string(),
            Err(_) => operator.username.trim().to_string(),
        };
        if !raw.is_empty() && !out.contains(&raw) {
            out.push(raw);
        }
    }
    out
}

/// Local midnight of `local`'s day, as a stored UTC timestamp.
fn day_start_utc(local: NaiveDateTime, offset: FixedOffset) -> String {
    let midnight = local.date().and_time(NaiveTime::MIN);
    let utc = midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    utc.and_utc().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clinicbot_core::settings::Operator;

    fn operator(id: &str, username: &str, active: bool) -> Operator {
        Operator {
            id: id.into(),
            name: "Op".into(),
            username: username.into(),
            active,
        }
    }

    fn settings_with(operators: Vec<Operator>) -> BotSettings {
        BotSettings {
            operators,
            ..BotSettings::default()
        }
    }

    #[test]
    fn explicit_destination_ignores_routing() {
        let settings = settings_with(vec![operator("1", "", true)]);
        let event = NotificationEvent::new(NotificationCategory::NewAppointment).to(" @someone ");
        assert_eq!(
            resolve_destinations(&event, Some("-100"), &settings),
            vec!["@someone"]
        );
    }

    #[test]
    fn group_beats_operators() {
        let settings = settings_with(vec![operator("1", "", true)]);
        let event = NotificationEvent::new(NotificationCategory::NewAppointment);
        assert_eq!(
            resolve_destinations(&event, Some("-1001234567890"), &settings),
            vec!["-1001234567890"]
        );
    }

    #[test]
    fn operators_are_active_only_and_deduplicated() {
        let settings = settings_with(vec![
            operator("111", "", true),
            operator("", "doctor_ops", true),
            operator("222", "", false),
            operator("111", "dup", true),
            operator("", "@bad name", true),
        ]);
        let event = NotificationEvent::new(NotificationCategory::NewMessage);
        assert_eq!(
            resolve_destinations(&event, None, &settings),
            vec!["111", "@doctor_ops", "@bad name"]
        );
    }

    #[test]
    fn no_operators_no_destinations() {
        let event = NotificationEvent::new(NotificationCategory::NewMessage);
        assert!(resolve_destinations(&event, None, &BotSettings::default()).is_empty());
    }

    #[test]
    fn day_start_honours_offset() {
        let local = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let istanbul = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(day_start_utc(local, istanbul), "2025-05-31T21:00:00.000Z");
        assert_eq!(day_start_utc(local, Utc.fix()), "2025-06-01T00:00:00.000Z");
    }
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound routing: directory upsert, conversation log, auto-replies, alerts.

use std::sync::Arc;
use std::time::Duration;

use clinicbot_core::settings::Operator;
use clinicbot_core::types::{Direction, InboundMessage, LanguageCode};
use clinicbot_core::{BotSettingsPatch, ChannelAdapter, Destination, DispatchStatus};
use clinicbot_notify::InboundLoop;
use clinicbot_test_utils::{TestHarness, inbound_message};
use tokio_util::sync::CancellationToken;

// 2025-06-01 is a Sunday (closed by default); 2025-06-02 a Monday.
const SUNDAY_NOON: &str = "2025-06-01T12:00:00.000Z";
const MONDAY_TEN: &str = "2025-06-02T10:00:00.000Z";

fn at(mut msg: InboundMessage, timestamp: &str) -> InboundMessage {
    msg.timestamp = timestamp.to_string();
    msg
}

fn ops_group() -> BotSettingsPatch {
    BotSettingsPatch {
        operators: Some(vec![Operator {
            id: "900".into(),
            name: "Front desk".into(),
            username: String::new(),
            active: true,
        }]),
        ..BotSettingsPatch::default()
    }
}

#[tokio::test]
async fn first_message_creates_contact_and_welcomes_in_their_language() {
    let harness = TestHarness::builder().build().await.unwrap();
    let mut msg = at(inbound_message("42", "Hi, how much is FUE?"), MONDAY_TEN);
    msg.sender.first_name = Some("John".into());
    msg.sender.language = Some(LanguageCode::En);

    let outcome = harness.receive(msg).await.unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.contact.channel_id, "42");
    let reply = outcome.auto_reply.unwrap();
    assert_eq!(reply.status, DispatchStatus::Sent);
    assert!(reply.message.unwrap().starts_with("Hello!"));

    let log = harness.storage.list_conversation("42").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].direction, Direction::Inbound);
    assert_eq!(log[0].text, "Hi, how much is FUE?");
    assert_eq!(log[1].direction, Direction::Outbound);
}

#[tokio::test]
async fn upsert_is_idempotent_across_messages() {
    let harness = TestHarness::builder().build().await.unwrap();
    let first = harness
        .receive(at(inbound_message("42", "merhaba"), MONDAY_TEN))
        .await
        .unwrap();
    let second = harness
        .receive(at(inbound_message("42", "fiyat?"), MONDAY_TEN))
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert!(second.auto_reply.is_none(), "open hours, known contact");
    let contacts = harness
        .storage
        .list_contacts(&Default::default())
        .await
        .unwrap();
    assert_eq!(contacts.len(), 1);
}

#[tokio::test]
async fn offline_reply_outside_working_hours() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .receive(at(inbound_message("42", "merhaba"), MONDAY_TEN))
        .await
        .unwrap();
    harness.mock_channel.clear_sent().await;

    let outcome = harness
        .receive(at(inbound_message("42", "orada mısınız?"), SUNDAY_NOON))
        .await
        .unwrap();

    let reply = outcome.auto_reply.unwrap();
    assert!(reply.message.unwrap().contains("mesai saatleri dışındayız"));
    let sent = harness.mock_channel.sent_to(&Destination::ChatId(42)).await;
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn start_command_always_welcomes_and_skips_new_message_alert() {
    let harness = TestHarness::builder()
        .with_settings(ops_group())
        .build()
        .await
        .unwrap();
    harness
        .receive(at(inbound_message("42", "merhaba"), MONDAY_TEN))
        .await
        .unwrap();

    let outcome = harness
        .receive(at(inbound_message("42", "/start"), MONDAY_TEN))
        .await
        .unwrap();

    assert!(outcome.auto_reply.unwrap().message.unwrap().starts_with("Merhaba!"));
    assert!(outcome.notifications.is_empty());
}

#[tokio::test]
async fn operators_are_alerted_about_new_contacts_and_messages() {
    let harness = TestHarness::builder()
        .with_settings(ops_group())
        .build()
        .await
        .unwrap();
    let mut msg = at(inbound_message("42", "Saç ekimi fiyatı nedir?"), MONDAY_TEN);
    msg.sender.username = Some("ahmet_k".into());

    let outcome = harness.receive(msg).await.unwrap();

    assert_eq!(outcome.notifications.len(), 2);
    assert!(outcome.notifications.iter().all(|r| r.status == DispatchStatus::Sent));
    let alerts = harness.mock_channel.sent_to(&Destination::ChatId(900)).await;
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].content.contains("@ahmet_k"));
    assert!(alerts[1].content.contains("Saç ekimi fiyatı nedir?"));
}

#[tokio::test]
async fn blocked_contacts_are_logged_but_ignored() {
    let harness = TestHarness::builder()
        .with_settings(ops_group())
        .build()
        .await
        .unwrap();
    harness
        .receive(at(inbound_message("42", "merhaba"), MONDAY_TEN))
        .await
        .unwrap();
    harness.storage.set_contact_blocked("42", true).await.unwrap();
    harness.mock_channel.clear_sent().await;

    let outcome = harness
        .receive(at(inbound_message("42", "spam"), SUNDAY_NOON))
        .await
        .unwrap();

    assert!(outcome.auto_reply.is_none());
    assert!(outcome.notifications.is_empty());
    assert_eq!(harness.mock_channel.sent_count().await, 0);
    let log = harness.storage.list_conversation("42").await.unwrap();
    assert_eq!(log.last().unwrap().text, "spam");
}

#[tokio::test]
async fn inactive_bot_records_but_never_replies() {
    let harness = TestHarness::builder()
        .with_settings(BotSettingsPatch::active(false))
        .build()
        .await
        .unwrap();

    let outcome = harness
        .receive(at(inbound_message("42", "merhaba"), SUNDAY_NOON))
        .await
        .unwrap();

    assert!(outcome.created);
    assert!(outcome.auto_reply.is_none());
    assert!(
        outcome
            .notifications
            .iter()
            .all(|r| r.status == DispatchStatus::NotSent)
    );
    assert_eq!(harness.mock_channel.sent_count().await, 0);
    assert_eq!(harness.storage.list_conversation("42").await.unwrap().len(), 1);
}

#[tokio::test]
async fn inbound_loop_processes_until_cancelled() {
    let harness = TestHarness::builder().build().await.unwrap();
    let channel: Arc<dyn ChannelAdapter> = harness.mock_channel.clone();
    let inbound_loop = InboundLoop::new(
        channel,
        clinicbot_notify::InboundRouter::new(harness.dispatcher.clone()),
    );

    harness
        .mock_channel
        .inject_message(inbound_message("7", "merhaba"))
        .await;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move { inbound_loop.run(token).await });

    let mut contacts = Vec::new();
    for _ in 0..50 {
        contacts = harness
            .storage
            .list_contacts(&Default::default())
            .await
            .unwrap();
        if !contacts.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(contacts.len(), 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop did not stop")
        .unwrap()
        .unwrap();
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles temp SQLite storage, a [`MockChannel`], a
//! [`Dispatcher`] and an [`InboundRouter`], the same wiring `serve` uses.

use std::sync::Arc;

use clinicbot_config::model::{NotificationsConfig, StorageConfig};
use clinicbot_core::types::{ContactProfile, InboundMessage, now_timestamp};
use clinicbot_core::{BotSettingsPatch, ClinicError, StorageAdapter};
use clinicbot_notify::{Dispatcher, InboundOutcome, InboundRouter, NotificationRouting};
use clinicbot_storage::SqliteStorage;

use crate::mock_channel::MockChannel;

/// Builds an inbound text message from `channel_id`, timestamped now.
pub fn inbound_message(channel_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        id: format!("in-{channel_id}-{}", text.len()),
        sender: ContactProfile::new(channel_id),
        text: text.to_string(),
        timestamp: now_timestamp(),
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    notifications: NotificationsConfig,
    settings: Option<BotSettingsPatch>,
    utc_offset_minutes: i32,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            notifications: NotificationsConfig::default(),
            settings: None,
            utc_offset_minutes: 0,
        }
    }

    /// Route a category to a group chat.
    pub fn with_group(mut self, category: &str, destination: &str) -> Self {
        self.notifications
            .groups
            .insert(category.to_string(), destination.to_string());
        self
    }

    /// Override a category's message format.
    pub fn with_format(mut self, category: &str, format: &str) -> Self {
        self.notifications
            .formats
            .insert(category.to_string(), format.to_string());
        self
    }

    /// Settings applied on top of the defaults before the harness is returned.
    pub fn with_settings(mut self, patch: BotSettingsPatch) -> Self {
        self.settings = Some(patch);
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ClinicError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ClinicError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        if let Some(patch) = self.settings {
            storage.update_settings(patch).await?;
        }

        let mock_channel = Arc::new(MockChannel::new());
        let dispatcher = Arc::new(
            Dispatcher::new(storage.clone(), mock_channel.clone())
                .with_routing(NotificationRouting::new(&self.notifications))
                .with_utc_offset(self.utc_offset_minutes),
        );
        let router = InboundRouter::new(dispatcher.clone());

        Ok(TestHarness {
            mock_channel,
            storage,
            dispatcher,
            router,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock channel and temp storage.
pub struct TestHarness {
    /// The mock channel adapter.
    pub mock_channel: Arc<MockChannel>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub dispatcher: Arc<Dispatcher>,
    pub router: InboundRouter,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs an inbound message through the router.
    pub async fn receive(&self, msg: InboundMessage) -> Result<InboundOutcome, ClinicError> {
        self.router.handle(msg).await
    }
}

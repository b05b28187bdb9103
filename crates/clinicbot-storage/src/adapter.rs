// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use clinicbot_config::model::StorageConfig;
use clinicbot_core::types::{
    Contact, ContactFilter, ContactProfile, ConversationEntry, ConversationStats, Direction,
    MessageTemplate, NewTemplate, TemplateFilter, TemplatePatch,
};
use clinicbot_core::{
    AdapterType, BotSettings, BotSettingsPatch, ClinicError, HealthStatus, PluginAdapter,
    StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ClinicError> {
        self.db.get().ok_or_else(|| ClinicError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ClinicError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ClinicError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ClinicError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ClinicError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ClinicError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Contact directory ---

    async fn find_contact(&self, channel_id: &str) -> Result<Option<Contact>, ClinicError> {
        queries::contacts::find_contact(self.db()?, channel_id).await
    }

    async fn find_contact_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Contact>, ClinicError> {
        queries::contacts::find_contact_by_username(self.db()?, username).await
    }

    async fn upsert_contact(
        &self,
        profile: &ContactProfile,
    ) -> Result<(Contact, bool), ClinicError> {
        queries::contacts::upsert_contact(self.db()?, profile).await
    }

    async fn set_contact_blocked(
        &self,
        channel_id: &str,
        blocked: bool,
    ) -> Result<Contact, ClinicError> {
        queries::contacts::set_blocked(self.db()?, channel_id, blocked).await
    }

    async fn set_contact_tags(
        &self,
        channel_id: &str,
        tags: &BTreeSet<String>,
    ) -> Result<Contact, ClinicError> {
        queries::contacts::set_tags(self.db()?, channel_id, tags).await
    }

    async fn set_contact_notes(
        &self,
        channel_id: &str,
        notes: &str,
    ) -> Result<Contact, ClinicError> {
        queries::contacts::set_notes(self.db()?, channel_id, notes).await
    }

    async fn list_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ClinicError> {
        queries::contacts::list_contacts(self.db()?, filter).await
    }

    // --- Message templates ---

    async fn create_template(
        &self,
        template: &NewTemplate,
    ) -> Result<MessageTemplate, ClinicError> {
        queries::templates::create_template(self.db()?, template).await
    }

    async fn get_template(&self, id: &str) -> Result<Option<MessageTemplate>, ClinicError> {
        queries::templates::get_template(self.db()?, id).await
    }

    async fn update_template(
        &self,
        id: &str,
        patch: TemplatePatch,
    ) -> Result<MessageTemplate, ClinicError> {
        queries::templates::update_template(self.db()?, id, patch).await
    }

    async fn delete_template(&self, id: &str) -> Result<(), ClinicError> {
        queries::templates::delete_template(self.db()?, id).await
    }

    async fn list_templates(
        &self,
        filter: &TemplateFilter,
    ) -> Result<Vec<MessageTemplate>, ClinicError> {
        queries::templates::list_templates(self.db()?, filter).await
    }

    // --- Conversation log ---

    async fn append_conversation(
        &self,
        contact_id: &str,
        direction: Direction,
        text: &str,
    ) -> Result<ConversationEntry, ClinicError> {
        queries::conversations::append_entry(self.db()?, contact_id, direction, text).await
    }

    async fn list_conversation(
        &self,
        contact_id: &str,
    ) -> Result<Vec<ConversationEntry>, ClinicError> {
        queries::conversations::list_entries(self.db()?, contact_id).await
    }

    async fn conversation_stats_since(
        &self,
        since: &str,
    ) -> Result<ConversationStats, ClinicError> {
        queries::conversations::stats_since(self.db()?, since).await
    }

    // --- Bot settings ---

    async fn get_settings(&self) -> Result<BotSettings, ClinicError> {
        queries::settings::get_settings(self.db()?).await
    }

    async fn update_settings(&self, patch: BotSettingsPatch) -> Result<BotSettings, ClinicError> {
        queries::settings::update_settings(self.db()?, patch).await
    }
}

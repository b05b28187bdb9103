// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait: contact directory, template store, conversation
//! log, and the bot settings document.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::ClinicError;
use crate::settings::{BotSettings, BotSettingsPatch};
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Contact, ContactFilter, ContactProfile, ConversationEntry, ConversationStats, Direction,
    MessageTemplate, NewTemplate, TemplateFilter, TemplatePatch,
};

/// Adapter for the persistence backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ClinicError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ClinicError>;

    // --- Contact directory ---

    async fn find_contact(&self, channel_id: &str) -> Result<Option<Contact>, ClinicError>;

    /// Case-insensitive lookup; a leading `@` is ignored.
    async fn find_contact_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Contact>, ClinicError>;

    /// Creates the contact if absent, otherwise overwrites the identity
    /// fields present in `profile`. Returns the stored contact and whether
    /// it was created.
    async fn upsert_contact(
        &self,
        profile: &ContactProfile,
    ) -> Result<(Contact, bool), ClinicError>;

    async fn set_contact_blocked(
        &self,
        channel_id: &str,
        blocked: bool,
    ) -> Result<Contact, ClinicError>;

    /// Replaces the whole tag set.
    async fn set_contact_tags(
        &self,
        channel_id: &str,
        tags: &BTreeSet<String>,
    ) -> Result<Contact, ClinicError>;

    async fn set_contact_notes(&self, channel_id: &str, notes: &str)
        -> Result<Contact, ClinicError>;

    async fn list_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ClinicError>;

    // --- Message templates ---

    async fn create_template(&self, template: &NewTemplate)
        -> Result<MessageTemplate, ClinicError>;

    async fn get_template(&self, id: &str) -> Result<Option<MessageTemplate>, ClinicError>;

    async fn update_template(
        &self,
        id: &str,
        patch: TemplatePatch,
    ) -> Result<MessageTemplate, ClinicError>;

    async fn delete_template(&self, id: &str) -> Result<(), ClinicError>;

    async fn list_templates(
        &self,
        filter: &TemplateFilter,
    ) -> Result<Vec<MessageTemplate>, ClinicError>;

    // --- Conversation log ---

    async fn append_conversation(
        &self,
        contact_id: &str,
        direction: Direction,
        text: &str,
    ) -> Result<ConversationEntry, ClinicError>;

    /// Entries for one contact, oldest first.
    async fn list_conversation(
        &self,
        contact_id: &str,
    ) -> Result<Vec<ConversationEntry>, ClinicError>;

    /// Activity since `since` (a stored timestamp string).
    async fn conversation_stats_since(&self, since: &str)
        -> Result<ConversationStats, ClinicError>;

    // --- Bot settings ---

    /// Returns the settings document, creating defaults on first use.
    async fn get_settings(&self) -> Result<BotSettings, ClinicError>;

    /// Merges `patch` into the stored document and returns the result.
    async fn update_settings(&self, patch: BotSettingsPatch) -> Result<BotSettings, ClinicError>;

    /// Flips the master switch.
    async fn toggle_active(&self, active: bool) -> Result<BotSettings, ClinicError> {
        self.update_settings(BotSettingsPatch::active(active)).await
    }
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation log operations.

use clinicbot_core::types::{now_timestamp, ConversationEntry, ConversationStats, Direction};
use clinicbot_core::ClinicError;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;

/// Append one entry to a contact's log. The contact must exist.
pub async fn append_entry(
    db: &Database,
    contact_id: &str,
    direction: Direction,
    text: &str,
) -> Result<ConversationEntry, ClinicError> {
    let entry_contact = contact_id.to_string();
    let text = text.to_string();
    let created_at = now_timestamp();
    let entry = db
        .connection()
        .call(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM contacts WHERE channel_id = ?1",
                    params![entry_contact],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }
            conn.execute(
                "INSERT INTO conversation_entries (contact_id, direction, text, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![entry_contact, direction.to_string(), text, created_at],
            )?;
            Ok(Some(ConversationEntry {
                id: conn.last_insert_rowid(),
                contact_id: entry_contact,
                direction,
                text,
                created_at,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    entry.ok_or_else(|| ClinicError::not_found("contact", contact_id))
}

/// All entries for a contact, oldest first. Unknown contacts yield an empty list.
pub async fn list_entries(
    db: &Database,
    contact_id: &str,
) -> Result<Vec<ConversationEntry>, ClinicError> {
    let contact_id = contact_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, contact_id, direction, text, created_at
                 FROM conversation_entries WHERE contact_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![contact_id], |row| {
                let direction: String = row.get(2)?;
                Ok(ConversationEntry {
                    id: row.get(0)?,
                    contact_id: row.get(1)?,
                    direction: direction.parse::<Direction>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    text: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// New contacts and message counts at or after `since`.
pub async fn stats_since(db: &Database, since: &str) -> Result<ConversationStats, ClinicError> {
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            let new_contacts: i64 = conn.query_row(
                "SELECT COUNT(*) FROM contacts WHERE created_at >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            let (inbound, outbound): (i64, i64) = conn.query_row(
                "SELECT
                     COALESCE(SUM(direction = 'inbound'), 0),
                     COALESCE(SUM(direction = 'outbound'), 0)
                 FROM conversation_entries WHERE created_at >= ?1",
                params![since],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(ConversationStats {
                new_contacts: new_contacts.max(0) as u64,
                inbound: inbound.max(0) as u64,
                outbound: outbound.max(0) as u64,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

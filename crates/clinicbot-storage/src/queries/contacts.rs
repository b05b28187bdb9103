// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact directory operations.

use std::collections::BTreeSet;

use clinicbot_core::types::{normalize_tags, now_timestamp, Contact, ContactFilter, ContactProfile};
use clinicbot_core::{ClinicError, LanguageCode};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::queries::{decode_tags, encode_tags};

const CONTACT_COLUMNS: &str = "channel_id, username, first_name, last_name, language, tags, notes, blocked, created_at, updated_at";

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    let language: Option<String> = row.get(4)?;
    let tags: String = row.get(5)?;
    Ok(Contact {
        channel_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        language: language.and_then(|l| l.parse::<LanguageCode>().ok()),
        tags: decode_tags(&tags),
        notes: row.get(6)?,
        blocked: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn select_contact(conn: &rusqlite::Connection, channel_id: &str) -> rusqlite::Result<Option<Contact>> {
    conn.query_row(
        &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE channel_id = ?1"),
        params![channel_id],
        row_to_contact,
    )
    .optional()
}

/// Blank strings count as absent.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Look up a contact by channel id.
pub async fn find_contact(db: &Database, channel_id: &str) -> Result<Option<Contact>, ClinicError> {
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| select_contact(conn, &channel_id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a contact by username, ignoring case and a leading `@`.
pub async fn find_contact_by_username(
    db: &Database,
    username: &str,
) -> Result<Option<Contact>, ClinicError> {
    let username = username.trim().trim_start_matches('@').to_string();
    if username.is_empty() {
        return Ok(None);
    }
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts
                     WHERE username = ?1 COLLATE NOCASE
                     ORDER BY updated_at DESC LIMIT 1"
                ),
                params![username],
                row_to_contact,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or refresh a contact. Returns the stored row and whether it was created.
///
/// Identity fields present in `profile` overwrite stored ones; absent fields
/// keep their stored value. Tags, notes, and the blocked flag are never touched.
pub async fn upsert_contact(
    db: &Database,
    profile: &ContactProfile,
) -> Result<(Contact, bool), ClinicError> {
    let channel_id = profile.channel_id.trim().to_string();
    if channel_id.is_empty() {
        return Err(ClinicError::Validation(
            "contact channel id must not be empty".into(),
        ));
    }
    let username = present(&profile.username).map(|u| u.trim_start_matches('@').to_string());
    let first_name = present(&profile.first_name);
    let last_name = present(&profile.last_name);
    let language = profile.language.map(|l| l.to_string());
    let now = now_timestamp();

    let stored = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existed = select_contact(&tx, &channel_id)?.is_some();
            tx.execute(
                "INSERT INTO contacts (channel_id, username, first_name, last_name, language, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(channel_id) DO UPDATE SET
                     username = COALESCE(excluded.username, contacts.username),
                     first_name = COALESCE(excluded.first_name, contacts.first_name),
                     last_name = COALESCE(excluded.last_name, contacts.last_name),
                     language = COALESCE(excluded.language, contacts.language),
                     updated_at = excluded.updated_at",
                params![channel_id, username, first_name, last_name, language, now],
            )?;
            let contact = select_contact(&tx, &channel_id)?;
            tx.commit()?;
            Ok(contact.map(|c| (c, !existed)))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    stored.ok_or_else(|| ClinicError::Internal("contact vanished during upsert".into()))
}

/// Run an UPDATE on one contact and return the refreshed row, or `NotFound`.
async fn update_contact<P>(
    db: &Database,
    channel_id: &str,
    sql: &'static str,
    values: P,
) -> Result<Contact, ClinicError>
where
    P: rusqlite::Params + Send + 'static,
{
    let id = channel_id.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(sql, values)?;
            if changed == 0 {
                return Ok(None);
            }
            select_contact(conn, &id)
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    updated.ok_or_else(|| ClinicError::not_found("contact", channel_id))
}

/// Block or unblock a contact.
pub async fn set_blocked(db: &Database, channel_id: &str, blocked: bool) -> Result<Contact, ClinicError> {
    update_contact(
        db,
        channel_id,
        "UPDATE contacts SET blocked = ?2, updated_at = ?3 WHERE channel_id = ?1",
        (channel_id.to_string(), blocked, now_timestamp()),
    )
    .await
}

/// Replace a contact's tag set.
pub async fn set_tags(
    db: &Database,
    channel_id: &str,
    tags: &BTreeSet<String>,
) -> Result<Contact, ClinicError> {
    let tags = encode_tags(&normalize_tags(tags));
    update_contact(
        db,
        channel_id,
        "UPDATE contacts SET tags = ?2, updated_at = ?3 WHERE channel_id = ?1",
        (channel_id.to_string(), tags, now_timestamp()),
    )
    .await
}

/// Replace a contact's free-form notes.
pub async fn set_notes(db: &Database, channel_id: &str, notes: &str) -> Result<Contact, ClinicError> {
    update_contact(
        db,
        channel_id,
        "UPDATE contacts SET notes = ?2, updated_at = ?3 WHERE channel_id = ?1",
        (channel_id.to_string(), notes.to_string(), now_timestamp()),
    )
    .await
}

/// List contacts matching `filter`, newest first.
pub async fn list_contacts(db: &Database, filter: &ContactFilter) -> Result<Vec<Contact>, ClinicError> {
    let contacts = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map([], row_to_contact)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(contacts.into_iter().filter(|c| c.matches(filter)).collect())
}

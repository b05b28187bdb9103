// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single bot settings document.
//!
//! Stored as JSON in row `id = 1`. Reads of a missing row create it from defaults.

use clinicbot_core::types::now_timestamp;
use clinicbot_core::{BotSettings, BotSettingsPatch, ClinicError};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;

fn decode(document: &str) -> Result<BotSettings, ClinicError> {
    serde_json::from_str(document).map_err(|e| ClinicError::Storage {
        source: Box::new(e),
    })
}

fn encode(settings: &BotSettings) -> Result<String, ClinicError> {
    serde_json::to_string(settings).map_err(|e| ClinicError::Storage {
        source: Box::new(e),
    })
}

fn read_document(conn: &rusqlite::Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT document FROM bot_settings WHERE id = 1",
        [],
        |row| row.get(0),
    )
    .optional()
}

fn write_document(conn: &rusqlite::Connection, document: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bot_settings (id, document, updated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at",
        params![document, now_timestamp()],
    )?;
    Ok(())
}

/// Current settings, seeding the defaults on first read.
pub async fn get_settings(db: &Database) -> Result<BotSettings, ClinicError> {
    let defaults = encode(&BotSettings::default())?;
    let document = db
        .connection()
        .call(move |conn| {
            if let Some(document) = read_document(conn)? {
                return Ok(document);
            }
            write_document(conn, &defaults)?;
            Ok(defaults)
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    decode(&document)
}

/// Read, merge, validate and write back in one writer call (last write wins).
pub async fn update_settings(
    db: &Database,
    patch: BotSettingsPatch,
) -> Result<BotSettings, ClinicError> {
    db.connection()
        .call(move |conn| {
            let mut settings = match read_document(conn)? {
                Some(document) => match decode(&document) {
                    Ok(settings) => settings,
                    Err(e) => return Ok(Err(e)),
                },
                None => BotSettings::default(),
            };
            if let Err(e) = patch.apply(&mut settings) {
                return Ok(Err(e));
            }
            let document = match encode(&settings) {
                Ok(document) => document,
                Err(e) => return Ok(Err(e)),
            };
            write_document(conn, &document)?;
            Ok(Ok(settings))
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

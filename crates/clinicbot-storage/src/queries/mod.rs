// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod contacts;
pub mod conversations;
pub mod settings;
pub mod templates;

use std::collections::BTreeSet;

/// Tags are stored as a JSON array column.
pub(crate) fn encode_tags(tags: &BTreeSet<String>) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes a tag column; malformed values read as empty.
pub(crate) fn decode_tags(raw: &str) -> BTreeSet<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder substitution for notification formats and template bodies.

use std::collections::BTreeMap;

/// Replaces every `{key}` in `format` with `payload[key]`.
///
/// Placeholders whose key is missing from the payload stay literal. Values
/// are inserted verbatim; nothing is escaped and substituted text is never
/// scanned again.
pub fn render(format: &str, payload: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match payload.get(key.trim()) {
                    Some(value) if !key.trim().is_empty() => out.push_str(value),
                    _ => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                // Unterminated or nested brace: emit it and keep scanning.
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

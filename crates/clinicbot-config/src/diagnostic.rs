// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for `clinicbot.toml`.
//!
//! Figment errors and semantic problems are both reported as [`ConfigError`].
//! Unknown keys and misspelled notification categories carry a Jaro-Winkler
//! "did you mean" hint; when the TOML text is at hand the offending key is
//! underlined in it.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use clinicbot_core::NotificationCategory;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion (`bot_tken` -> `bot_token`).
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Name under which in-memory TOML is registered as a source.
pub const INLINE_SOURCE: &str = "<inline>";

/// Categories that have a built-in message format.
const FORMATTED_CATEGORIES: [&str; 7] = [
    "new_appointment",
    "appointment_reminder",
    "new_message",
    "new_contact",
    "daily_summary",
    "reply",
    "auto_reply",
];

/// One problem with the clinicbot configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", section_label(.section))]
    #[diagnostic(
        code(clinicbot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted table the key was found in; empty for the top level.
        section: String,
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a clinicbot setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(clinicbot::config::invalid_type), help("`{key}` expects {expected}"))]
    InvalidType {
        /// Full dotted key, e.g. `gateway.port`.
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing `{key}` in {}", section_label(.section))]
    #[diagnostic(
        code(clinicbot::config::missing_key),
        help("{}", missing_key_help(section, key))
    )]
    MissingKey { section: String, key: String },

    /// A `[notifications.groups]` or `[notifications.formats]` key that is not
    /// a notification category clinicbot knows.
    #[error("`{category}` is not a notification category (in [notifications.{table}])")]
    #[diagnostic(
        code(clinicbot::config::unknown_category),
        help("{}", unknown_key_help(suggestion.as_deref(), valid))
    )]
    UnknownCategory {
        table: &'static str,
        category: String,
        suggestion: Option<String>,
        valid: String,
    },

    #[error("validation error: {message}")]
    #[diagnostic(code(clinicbot::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(clinicbot::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid}"),
        None => format!("valid keys: {valid}"),
    }
}

fn missing_key_help(section: &str, key: &str) -> String {
    if section.is_empty() {
        format!("add `{key} = ...` at the top of clinicbot.toml")
    } else {
        format!("add `{key} = ...` under `[{section}]` in clinicbot.toml")
    }
}

/// Converts every error inside a figment error into a [`ConfigError`].
///
/// `sources` pairs a file path (or [`INLINE_SOURCE`]) with its TOML text and is
/// only used to place spans.
pub fn from_figment(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &path, field, sources);
                    ConfigError::UnknownKey {
                        section: path.join("."),
                        key: field.clone(),
                        suggestion: suggest_key(field, &expected[..]),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    section: path.join("."),
                    key: field.to_string(),
                },
                Kind::InvalidType(found, expected) => {
                    // Here the path ends at the offending key itself.
                    let (span, src) = match path.split_last() {
                        Some((field, table)) => locate(&error, table, field, sources),
                        None => (None, None),
                    };
                    ConfigError::InvalidType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Finds the TOML text an error came from and the key's span in it.
fn locate(
    error: &figment::Error,
    table: &[String],
    field: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = match file {
        Some(file) => sources.iter().find(|(name, _)| *name == file),
        None => sources.iter().find(|(name, _)| name == INLINE_SOURCE),
    };

    source
        .and_then(|(name, content)| {
            let offset = find_key_offset(content, table, field)?;
            Some((
                SourceSpan::new(offset.into(), field.len()),
                NamedSource::new(name, content.clone()),
            ))
        })
        .map_or((None, None), |(span, src)| (Some(span), Some(src)))
}

/// Byte offset of `field` as a key inside the `[table]` section of `content`.
///
/// Dotted tables match their header (`[notifications.groups]`); an empty table
/// searches from the start of the file.
pub fn find_key_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let start = if table.is_empty() {
        0
    } else {
        let header = format!("[{}]", table.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let key = line.trim_start();
        // The next header ends the section.
        if key.starts_with('[') {
            return None;
        }
        let is_key = key
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_key {
            return Some(offset + line.len() - key.len());
        }
        offset += line.len();
    }
    None
}

/// Closest of `candidates` to `unknown`, if any is similar enough.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .map(|key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|&(_, score)| score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Checks a `[notifications.groups]` key.
///
/// Only built-in categories are routed to groups, so anything else is an error.
pub fn check_group_category(category: &str) -> Option<ConfigError> {
    if NotificationCategory::BUILTIN.contains(&category) {
        return None;
    }
    Some(ConfigError::UnknownCategory {
        table: "groups",
        category: category.to_string(),
        suggestion: suggest_key(category, &NotificationCategory::BUILTIN),
        valid: NotificationCategory::BUILTIN.join(", "),
    })
}

/// Checks a `[notifications.formats]` key.
///
/// Custom categories may carry a format too; only near misses of a formatted
/// category (`new_mesage`) are reported.
pub fn check_format_category(category: &str) -> Option<ConfigError> {
    if FORMATTED_CATEGORIES.contains(&category) {
        return None;
    }
    let suggestion = suggest_key(category, &FORMATTED_CATEGORIES)?;
    Some(ConfigError::UnknownCategory {
        table: "formats",
        category: category.to_string(),
        suggestion: Some(suggestion),
        valid: FORMATTED_CATEGORIES.join(", "),
    })
}

/// Writes each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

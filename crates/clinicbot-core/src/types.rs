// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the clinicbot crates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ClinicError;

/// Identifier of a message accepted by the external channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Observability,
}

/// Current UTC time in the millisecond RFC 3339 form stored in every table.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

// --- Languages ---

/// Languages the clinic serves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LanguageCode {
    Tr,
    En,
    Ru,
    Ka,
}

impl LanguageCode {
    /// Every supported language, in admin display order.
    pub const ALL: [LanguageCode; 4] = [Self::Tr, Self::En, Self::Ru, Self::Ka];

    /// Maps an IETF tag reported by the channel (`en-US`, `ru`) to a supported language.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next().unwrap_or(tag);
        primary.parse().ok()
    }
}

/// A string localized per [`LanguageCode`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<LanguageCode, String>);

impl LocalizedText {
    /// Builds a localized text from `(language, text)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (LanguageCode, S)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(l, s)| (l, s.into())).collect())
    }

    /// Returns the non-empty text for `language`, if any.
    pub fn get(&self, language: LanguageCode) -> Option<&str> {
        self.0
            .get(&language)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Resolves `language`, then `fallback`, then any non-empty translation.
    pub fn resolve(&self, language: Option<LanguageCode>, fallback: LanguageCode) -> Option<&str> {
        language
            .and_then(|l| self.get(l))
            .or_else(|| self.get(fallback))
            .or_else(|| {
                self.0
                    .values()
                    .map(String::as_str)
                    .find(|s| !s.trim().is_empty())
            })
    }
}

// --- Destinations ---

/// Where a message is delivered on the external channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Numeric chat id (private chats are positive, groups negative).
    ChatId(i64),
    /// Public `@username` (stored without the `@`).
    Username(String),
}

impl FromStr for Destination {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix('@') {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ClinicError::Validation(format!(
                    "invalid username destination `{s}`"
                )));
            }
            return Ok(Self::Username(name.to_string()));
        }
        // i64 parsing accepts `+905551112233`; a phone number is not a chat id.
        if s.starts_with('+') {
            return Err(ClinicError::Validation(format!(
                "destination `{s}` looks like a phone number, not a chat id"
            )));
        }
        s.parse::<i64>().map(Self::ChatId).map_err(|_| {
            ClinicError::Validation(format!(
                "destination `{s}` is neither a chat id nor an @username"
            ))
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChatId(id) => write!(f, "{id}"),
            Self::Username(name) => write!(f, "@{name}"),
        }
    }
}

// --- Contacts ---

/// A directory entry for one external-channel identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Channel-specific id (Telegram chat id). Unique.
    pub channel_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<LanguageCode>,
    pub tags: BTreeSet<String>,
    pub notes: String,
    pub blocked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Contact {
    /// Human-readable name: full name, then `@username`, then the channel id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        match &self.username {
            Some(u) if !u.is_empty() => format!("@{u}"),
            _ => self.channel_id.clone(),
        }
    }

    /// Case-insensitive match against a directory filter.
    pub fn matches(&self, filter: &ContactFilter) -> bool {
        if let Some(tag) = filter.tag.as_deref() {
            if !has_tag(&self.tags, tag) {
                return false;
            }
        }

        let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty())
        else {
            return true;
        };
        let term = term.to_lowercase();
        let hit = |s: &str| s.to_lowercase().contains(&term);

        hit(&self.channel_id)
            || self.username.as_deref().is_some_and(hit)
            || self.first_name.as_deref().is_some_and(hit)
            || self.last_name.as_deref().is_some_and(hit)
            || self.tags.iter().any(|t| hit(t))
    }
}

/// Identity fields observed for a contact; input to an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub channel_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub language: Option<LanguageCode>,
}

impl ContactProfile {
    /// Profile carrying only the channel id.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ..Self::default()
        }
    }
}

/// Filter for listing contacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// Exact tag match ignoring case in any script (`Срочно` matches `срочно`).
/// A blank filter tag matches everything.
fn has_tag(tags: &BTreeSet<String>, wanted: &str) -> bool {
    let wanted = wanted.trim();
    if wanted.is_empty() {
        return true;
    }
    let wanted = wanted.to_lowercase();
    tags.iter().any(|t| t.to_lowercase() == wanted)
}

/// Trims tags and drops empty ones.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// --- Templates ---

/// A named, language-tagged reusable message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub title: String,
    pub body: String,
    pub language: LanguageCode,
    pub tags: BTreeSet<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MessageTemplate {
    /// Applies a template filter (language exact, search/tag case-insensitive).
    pub fn matches(&self, filter: &TemplateFilter) -> bool {
        if filter.language.is_some_and(|l| l != self.language) {
            return false;
        }
        if let Some(tag) = filter.tag.as_deref() {
            if !has_tag(&self.tags, tag) {
                return false;
            }
        }
        match filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                self.title.to_lowercase().contains(&term)
                    || self.body.to_lowercase().contains(&term)
                    || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
            }
        }
    }
}

/// Input for creating a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTemplate {
    pub title: String,
    pub body: String,
    pub language: LanguageCode,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl NewTemplate {
    /// Rejects empty titles and bodies.
    pub fn validate(&self) -> Result<(), ClinicError> {
        validate_template_text(&self.title, &self.body)
    }
}

/// Partial update for a template; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub language: Option<LanguageCode>,
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
}

impl TemplatePatch {
    /// Overwrites the present fields of `template` and re-validates it.
    pub fn apply(self, template: &mut MessageTemplate) -> Result<(), ClinicError> {
        if let Some(title) = self.title {
            template.title = title;
        }
        if let Some(body) = self.body {
            template.body = body;
        }
        if let Some(language) = self.language {
            template.language = language;
        }
        if let Some(tags) = self.tags {
            template.tags = normalize_tags(tags);
        }
        validate_template_text(&template.title, &template.body)
    }
}

fn validate_template_text(title: &str, body: &str) -> Result<(), ClinicError> {
    if title.trim().is_empty() {
        return Err(ClinicError::Validation("template title must not be empty".into()));
    }
    if body.trim().is_empty() {
        return Err(ClinicError::Validation("template body must not be empty".into()));
    }
    Ok(())
}

/// Filter for listing templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateFilter {
    #[serde(default)]
    pub language: Option<LanguageCode>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

// --- Conversation log ---

/// Direction of a logged message relative to the clinic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One logged message in a contact's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: i64,
    pub contact_id: String,
    pub direction: Direction,
    pub text: String,
    pub created_at: String,
}

/// Activity counters since a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub new_contacts: u64,
    pub inbound: u64,
    pub outbound: u64,
}

// --- Channel messages ---

/// A text message received from the external channel.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Channel message id.
    pub id: String,
    /// Identity of the sender; `channel_id` is the chat to reply to.
    pub sender: ContactProfile,
    pub text: String,
    pub timestamp: String,
}

impl InboundMessage {
    /// True for bot commands such as `/start`.
    pub fn is_command(&self) -> bool {
        self.text.trim_start().starts_with('/')
    }
}

/// A text message to deliver through the external channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: Destination,
    pub content: String,
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the clinicbot service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.
//!
//! Only deployment-level concerns live here. The admin-editable bot settings
//! (working hours, greetings, operators, toggles) are persisted in storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level clinicbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClinicConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Notification routing and message formats.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Service identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Clinic local time as an offset from UTC, in minutes.
    ///
    /// Working hours and the daily summary window are evaluated in this zone.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

fn default_service_name() -> String {
    "clinicbot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Istanbul (UTC+3).
fn default_utc_offset_minutes() -> i32 {
    180
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("clinicbot").join("clinicbot.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "clinicbot.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Admin HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether the admin API is served.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind to.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1` routes. Without one every API call is rejected.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

/// Notification routing configuration.
///
/// ```toml
/// [notifications.groups]
/// new_appointment = "-1001234567890"
///
/// [notifications.formats]
/// new_message = "{name}: {message}"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Group chat (id or `@username`) per category. Takes precedence over operators.
    #[serde(default)]
    pub groups: BTreeMap<String, String>,

    /// Message format per category, overriding the built-in one.
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

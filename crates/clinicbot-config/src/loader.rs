// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./clinicbot.toml` > `~/.config/clinicbot/clinicbot.toml`
//! > `/etc/clinicbot/clinicbot.toml` with environment variable overrides via
//! the `CLINICBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ClinicConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/clinicbot/clinicbot.toml";
/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "clinicbot.toml";

/// `~/.config/clinicbot/clinicbot.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clinicbot/clinicbot.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/clinicbot/clinicbot.toml` (system-wide)
/// 3. `~/.config/clinicbot/clinicbot.toml` (user XDG config)
/// 4. `./clinicbot.toml` (local directory)
/// 5. `CLINICBOT_*` environment variables
pub fn load_config() -> Result<ClinicConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ClinicConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClinicConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ClinicConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClinicConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ClinicConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `CLINICBOT_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that
/// `CLINICBOT_TELEGRAM_BOT_TOKEN` becomes `telegram.bot_token`, not
/// `telegram.bot.token`. Notification maps are file-only.
fn env_provider() -> Env {
    Env::prefixed("CLINICBOT_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ["service", "telegram", "storage", "gateway"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_first_section_only() {
        assert_eq!(map_env_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(map_env_key("gateway_bearer_token"), "gateway.bearer_token");
        assert_eq!(
            map_env_key("service_utc_offset_minutes"),
            "service.utc_offset_minutes"
        );
        assert_eq!(map_env_key("storage_wal_mode"), "storage.wal_mode");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind hosts, non-empty paths, and parseable group destinations.

use clinicbot_core::Destination;

use crate::diagnostic::{ConfigError, check_format_category, check_group_category};
use crate::model::ClinicConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Offsets span UTC-12:00 to UTC+14:00.
const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -720..=840;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ClinicConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !UTC_OFFSET_RANGE.contains(&config.service.utc_offset_minutes) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.utc_offset_minutes must be between -720 and 840, got {}",
                config.service.utc_offset_minutes
            ),
        });
    }

    if config
        .telegram
        .bot_token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        errors.push(ConfigError::Validation {
            message: "telegram.bot_token must not be empty when set".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config
        .gateway
        .bearer_token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        errors.push(ConfigError::Validation {
            message: "gateway.bearer_token must not be empty when set".to_string(),
        });
    }

    for (category, destination) in &config.notifications.groups {
        errors.extend(check_group_category(category));
        if let Err(e) = destination.parse::<Destination>() {
            errors.push(ConfigError::Validation {
                message: format!("notifications.groups.{category}: {e}"),
            });
        }
    }

    for (category, format) in &config.notifications.formats {
        errors.extend(check_format_category(category));
        if format.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("notifications.formats.{category} must not be empty"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_mentions(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = ClinicConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ClinicConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(validation_mentions(&errors, "database_path"));
    }

    #[test]
    fn out_of_range_offset_fails_validation() {
        let mut config = ClinicConfig::default();
        config.service.utc_offset_minutes = 900;
        let errors = validate_config(&config).unwrap_err();
        assert!(validation_mentions(&errors, "utc_offset_minutes"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = ClinicConfig::default();
        config.service.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(validation_mentions(&errors, "log_level"));
    }

    #[test]
    fn bad_group_destination_fails_validation() {
        let mut config = ClinicConfig::default();
        config
            .notifications
            .groups
            .insert("new_appointment".into(), "clinic group".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(validation_mentions(&errors, "notifications.groups.new_appointment"));
    }

    #[test]
    fn misspelled_group_category_gets_suggestion() {
        let mut config = ClinicConfig::default();
        config
            .notifications
            .groups
            .insert("new_apointment".into(), "-100123".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownCategory { table: "groups", suggestion, .. }
                if suggestion.as_deref() == Some("new_appointment")
        )));
    }

    #[test]
    fn misspelled_format_category_fails_but_custom_one_passes() {
        let mut config = ClinicConfig::default();
        config
            .notifications
            .formats
            .insert("vip_followup".into(), "{name}: {message}".into());
        assert!(validate_config(&config).is_ok());

        config
            .notifications
            .formats
            .insert("new_mesage".into(), "{message}".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownCategory { table: "formats", suggestion, .. }
                if suggestion.as_deref() == Some("new_message")
        )));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = ClinicConfig::default();
        config.gateway.host = "0.0.0.0".to_string();
        config.gateway.bearer_token = Some("secret".to_string());
        config.storage.database_path = "/tmp/test.db".to_string();
        config
            .notifications
            .groups
            .insert("new_appointment".into(), "-1001234567890".into());
        config
            .notifications
            .groups
            .insert("daily_summary".into(), "@clinic_staff".into());
        config
            .notifications
            .formats
            .insert("reply".into(), "{message}".into());
        assert!(validate_config(&config).is_ok());
    }
}

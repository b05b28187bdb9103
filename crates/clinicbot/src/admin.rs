// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot admin commands: `send-test`, `summary` and `config`.

use std::sync::Arc;

use clinicbot_config::model::ClinicConfig;
use clinicbot_core::{
    ChannelAdapter, ClinicError, DispatchResult, NotificationCategory, StorageAdapter,
};
use clinicbot_notify::Dispatcher;

use crate::serve::{build_dispatcher, init_tracing, open_storage, open_telegram};

const REDACTED: &str = "[redacted]";

/// Sends a sample notification of `category` to `to` and prints the result.
pub async fn run_send_test(config: &ClinicConfig, to: &str, category: &str) -> Result<(), ClinicError> {
    init_tracing(&config.service.log_level);
    let (storage, dispatcher) = one_shot_dispatcher(config).await?;

    let result = dispatcher
        .send_test(to, NotificationCategory::from(category))
        .await;
    storage.close().await?;

    print_result(&result?)
}

/// Sends today's summary through the configured routing and prints the result.
pub async fn run_summary(config: &ClinicConfig) -> Result<(), ClinicError> {
    init_tracing(&config.service.log_level);
    let (storage, dispatcher) = one_shot_dispatcher(config).await?;

    let result = dispatcher.send_daily_summary(chrono::Utc::now()).await;
    storage.close().await?;

    print_result(&result?)
}

/// Builds a dispatcher without long polling; sending needs only the Bot API.
async fn one_shot_dispatcher(
    config: &ClinicConfig,
) -> Result<(Arc<dyn StorageAdapter>, Dispatcher), ClinicError> {
    let storage = open_storage(config).await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(open_telegram(config)?);
    let dispatcher = build_dispatcher(config, storage.clone(), channel);
    Ok((storage, dispatcher))
}

fn print_result(result: &DispatchResult) -> Result<(), ClinicError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| ClinicError::Internal(format!("failed to encode dispatch result: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Prints what `serve` would run with.
pub fn print_config_summary(config: &ClinicConfig) {
    println!("clinicbot: configuration is valid");
    println!("  service          {} (log level {})", config.service.name, config.service.log_level);
    println!("  utc offset       {} min", config.service.utc_offset_minutes);
    println!("  database         {}", config.storage.database_path);
    println!(
        "  telegram         {}",
        if config.telegram.bot_token.is_some() {
            "token set"
        } else {
            "no token (serve will refuse to start)"
        }
    );
    if config.gateway.enabled {
        println!(
            "  gateway          {}:{}{}",
            config.gateway.host,
            config.gateway.port,
            if config.gateway.bearer_token.is_some() {
                ""
            } else {
                " (no bearer token, /v1 rejects all requests)"
            }
        );
    } else {
        println!("  gateway          disabled");
    }
    for (category, destination) in &config.notifications.groups {
        println!("  group            {category} -> {destination}");
    }
    for category in config.notifications.formats.keys() {
        println!("  format override  {category}");
    }
}

/// Prints the effective configuration as TOML with secrets redacted.
pub fn print_config(config: &ClinicConfig) -> Result<(), ClinicError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| ClinicError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

fn redacted(config: &ClinicConfig) -> ClinicConfig {
    let mut config = config.clone();
    if config.telegram.bot_token.is_some() {
        config.telegram.bot_token = Some(REDACTED.to_string());
    }
    if config.gateway.bearer_token.is_some() {
        config.gateway.bearer_token = Some(REDACTED.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_secrets() {
        let mut config = ClinicConfig::default();
        config.telegram.bot_token = Some("123:secret".into());
        config.gateway.bearer_token = Some("admin-secret".into());

        let shown = toml::to_string_pretty(&redacted(&config)).unwrap();
        assert!(!shown.contains("secret"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn unset_secrets_stay_unset() {
        let config = redacted(&ClinicConfig::default());
        assert!(config.telegram.bot_token.is_none());
        assert!(config.gateway.bearer_token.is_none());
    }

    #[test]
    fn shown_config_parses_back() {
        let mut config = ClinicConfig::default();
        config
            .notifications
            .groups
            .insert("new_appointment".into(), "-1001234567890".into());
        let shown = toml::to_string_pretty(&redacted(&config)).unwrap();
        let parsed = clinicbot_config::load_and_validate_str(&shown).unwrap();
        assert_eq!(
            parsed.notifications.groups.get("new_appointment").map(String::as_str),
            Some("-1001234567890")
        );
    }
}

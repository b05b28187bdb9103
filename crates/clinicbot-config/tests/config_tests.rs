// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the clinicbot configuration system.

use clinicbot_config::diagnostic::{ConfigError, suggest_key};
use clinicbot_config::model::ClinicConfig;
use clinicbot_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_clinic_config() {
    let toml = r#"
[service]
name = "istanbul-clinic"
log_level = "debug"
utc_offset_minutes = 240

[telegram]
bot_token = "123:ABC"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[gateway]
enabled = false
host = "0.0.0.0"
port = 8080
bearer_token = "s3cret"

[notifications.groups]
new_appointment = "-1001234567890"
daily_summary = "@clinic_staff"

[notifications.formats]
new_message = "{name}: {message}"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "istanbul-clinic");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.service.utc_offset_minutes, 240);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert!(!config.gateway.enabled);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("s3cret"));
    assert_eq!(
        config.notifications.groups.get("new_appointment").map(String::as_str),
        Some("-1001234567890")
    );
    assert_eq!(
        config.notifications.groups.get("daily_summary").map(String::as_str),
        Some("@clinic_staff")
    );
    assert_eq!(
        config.notifications.formats.get("new_message").map(String::as_str),
        Some("{name}: {message}")
    );
}

/// Unknown field in [telegram] section produces an UnknownField error.
#[test]
fn unknown_field_in_telegram_produces_error() {
    let toml = r#"
[telegram]
bot_tken = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("bot_tken"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "clinicbot");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.service.utc_offset_minutes, 180);
    assert!(config.telegram.bot_token.is_none());
    assert!(config.storage.database_path.ends_with("clinicbot.db"));
    assert!(config.storage.wal_mode);
    assert!(config.gateway.enabled);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 3000);
    assert!(config.gateway.bearer_token.is_none());
    assert!(config.notifications.groups.is_empty());
    assert!(config.notifications.formats.is_empty());
}

/// A dotted override (what `CLINICBOT_TELEGRAM_BOT_TOKEN` maps to) lands on telegram.bot_token.
#[test]
fn dotted_override_sets_telegram_bot_token() {
    use figment::{providers::Serialized, Figment};

    let config: ClinicConfig = Figment::new()
        .merge(Serialized::defaults(ClinicConfig::default()))
        .merge(("telegram.bot_token", "xyz-from-env"))
        .extract()
        .expect("should set bot_token via dot notation");

    assert_eq!(config.telegram.bot_token.as_deref(), Some("xyz-from-env"));
}

/// Later providers win over the TOML file.
#[test]
fn override_beats_toml_value() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[gateway]
port = 4000
"#;

    let config: ClinicConfig = Figment::new()
        .merge(Serialized::defaults(ClinicConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("gateway.port", 5000))
        .extract()
        .expect("should merge override");

    assert_eq!(config.gateway.port, 5000);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: ClinicConfig = Figment::new()
        .merge(Serialized::defaults(ClinicConfig::default()))
        .merge(Toml::file("/nonexistent/path/clinicbot.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.service.name, "clinicbot");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn diagnostic_bot_tken_suggests_bot_token() {
    let suggestion = suggest_key("bot_tken", &["bot_token"]);
    assert_eq!(suggestion, Some("bot_token".to_string()));
}

#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    let suggestion = suggest_key("zzzzzz", &["name", "log_level", "utc_offset_minutes"]);
    assert!(suggestion.is_none(), "should not suggest for distant typo");
}

/// Error output from load_and_validate_str names the unknown key and a suggestion.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[storage]
databse_path = "x.db"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "databse_path"
                && suggestion.as_deref() == Some("database_path")
                && valid_keys.contains("wal_mode")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'databse_path', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[gateway]
port = "not_a_number"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("port"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        section: "telegram".to_string(),
        key: "bot_tken".to_string(),
        suggestion: Some("bot_token".to_string()),
        valid_keys: "bot_token".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `bot_token`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("bot_tken"), "rendered report should mention the key");
}

/// Unknown keys in inline TOML name their table and point into the text.
#[test]
fn diagnostic_unknown_key_names_section() {
    let toml = "[service]\nname = \"clinic\"\n\n[gateway]\nprot = 9000\n";

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let error = errors
        .iter()
        .find(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "prot"))
        .unwrap_or_else(|| panic!("expected UnknownKey for prot, got: {errors:?}"));
    let ConfigError::UnknownKey {
        suggestion, span, ..
    } = error
    else {
        unreachable!()
    };
    assert_eq!(suggestion.as_deref(), Some("port"));
    if let Some(span) = span {
        assert_eq!(&toml[span.offset()..span.offset() + span.len()], "prot");
    }
}

/// Group keys must be built-in categories; the error suggests the closest one.
#[test]
fn validation_rejects_misspelled_group_category() {
    let toml = r#"
[notifications.groups]
daily_sumary = "-100555"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown category should fail");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownCategory { category, suggestion, .. }
                if category == "daily_sumary" && suggestion.as_deref() == Some("daily_summary")
        )),
        "got: {errors:?}"
    );
}

#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[service]
name = "test"

[notifications.groups]
new_contact = "-100555"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.service.name, "test");
}

/// A group that is neither a chat id nor an @username is rejected at startup.
#[test]
fn validation_catches_unparseable_group() {
    let toml = r#"
[notifications.groups]
new_appointment = "reception desk"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad group should fail");
    let has_validation_error = errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("new_appointment"))
    });
    assert!(has_validation_error, "got: {errors:?}");
}

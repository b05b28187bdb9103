// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `clinicbot doctor` command implementation.
//!
//! Runs diagnostic checks against the deployment: configuration, the SQLite
//! file, Telegram credentials and gateway authentication.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use clinicbot_config::model::ClinicConfig;
use clinicbot_core::{ClinicError, HealthStatus, PluginAdapter};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `clinicbot doctor` command.
///
/// With `deep`, also checks database integrity and asks Telegram who the bot is.
pub async fn run_doctor(
    config: &ClinicConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), ClinicError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![
        check_config(config_path),
        check_database(&config.storage.database_path).await,
        check_telegram_token(config),
        check_gateway_auth(config),
    ];

    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_telegram_reachable(config).await);
    }

    println!();
    println!("  clinicbot doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Check configuration loads without errors.
fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => clinicbot_config::load_and_validate_path(path),
        None => clinicbot_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the database file exists and answers a query.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new("Database", CheckStatus::Fail, format!("open failed: {e}"), start);
        }
    };

    let contacts = conn
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
        })
        .await;

    match contacts {
        Ok(count) => CheckResult::new(
            "Database",
            CheckStatus::Pass,
            format!("connected ({count} contacts)"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

fn check_telegram_token(config: &ClinicConfig) -> CheckResult {
    let start = Instant::now();
    match config.telegram.bot_token.as_deref() {
        Some(token) if token.contains(':') => {
            CheckResult::new("Telegram token", CheckStatus::Pass, "configured", start)
        }
        Some(_) => CheckResult::new(
            "Telegram token",
            CheckStatus::Warn,
            "does not look like a Bot API token (<id>:<secret>)",
            start,
        ),
        None => CheckResult::new(
            "Telegram token",
            CheckStatus::Fail,
            "telegram.bot_token is not set",
            start,
        ),
    }
}

fn check_gateway_auth(config: &ClinicConfig) -> CheckResult {
    let start = Instant::now();
    if !config.gateway.enabled {
        return CheckResult::new("Gateway auth", CheckStatus::Pass, "gateway disabled", start);
    }
    if config.gateway.bearer_token.is_some() {
        CheckResult::new("Gateway auth", CheckStatus::Pass, "bearer token set", start)
    } else {
        CheckResult::new(
            "Gateway auth",
            CheckStatus::Warn,
            "no bearer token, every /v1 request will be rejected",
            start,
        )
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "DB integrity",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let rows = conn
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await;

    match rows {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

/// Deep check: the Bot API accepts the token.
async fn check_telegram_reachable(config: &ClinicConfig) -> CheckResult {
    let start = Instant::now();
    let channel = match clinicbot_telegram::TelegramChannel::new(&config.telegram) {
        Ok(channel) => channel,
        Err(e) => {
            return CheckResult::new("Telegram API", CheckStatus::Warn, format!("skipped: {e}"), start);
        }
    };

    let health = tokio::time::timeout(Duration::from_secs(5), channel.health_check()).await;
    match health {
        Ok(Ok(HealthStatus::Healthy)) => {
            CheckResult::new("Telegram API", CheckStatus::Pass, "reachable", start)
        }
        Ok(Ok(HealthStatus::Degraded(msg))) => {
            CheckResult::new("Telegram API", CheckStatus::Warn, msg, start)
        }
        Ok(Ok(HealthStatus::Unhealthy(msg))) => {
            CheckResult::new("Telegram API", CheckStatus::Fail, msg, start)
        }
        Ok(Err(e)) => CheckResult::new("Telegram API", CheckStatus::Fail, e.to_string(), start),
        Err(_) => CheckResult::new("Telegram API", CheckStatus::Fail, "timeout (5s)", start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn migrated_db(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("doctor.db").display().to_string();
        let mut config = ClinicConfig::default();
        config.storage.database_path = path.clone();
        let storage = crate::serve::open_storage(&config).await.unwrap();
        storage.close().await.unwrap();
        path
    }

    #[test]
    fn plain_lines_carry_status_tag() {
        let result = CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: "not found".to_string(),
            duration: Duration::from_millis(5),
        };
        let line = format_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("not found"));
        assert!(line.contains("(5ms)"));
    }

    #[tokio::test]
    async fn check_database_missing_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db").display().to_string();
        let result = check_database(&path).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn check_database_counts_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = migrated_db(&dir).await;
        let result = check_database(&path).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.message.contains("0 contacts"));
    }

    #[tokio::test]
    async fn check_db_integrity_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = migrated_db(&dir).await;
        assert_eq!(check_db_integrity(&path).await.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn check_db_integrity_missing_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db").display().to_string();
        assert_eq!(check_db_integrity(&path).await.status, CheckStatus::Warn);
    }

    #[test]
    fn missing_token_fails() {
        let result = check_telegram_token(&ClinicConfig::default());
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[test]
    fn gateway_without_token_warns() {
        let mut config = ClinicConfig::default();
        assert_eq!(check_gateway_auth(&config).status, CheckStatus::Warn);

        config.gateway.bearer_token = Some("admin".into());
        assert_eq!(check_gateway_auth(&config).status, CheckStatus::Pass);

        config.gateway.bearer_token = None;
        config.gateway.enabled = false;
        assert_eq!(check_gateway_auth(&config).status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn unreachable_telegram_is_skipped_without_token() {
        let result = check_telegram_reachable(&ClinicConfig::default()).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.starts_with("skipped"));
    }
}

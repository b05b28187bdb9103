// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clinicbot - notification and contact routing for the clinic's Telegram bot.
//!
//! This is the binary entry point.

mod admin;
mod doctor;
mod serve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clinicbot_config::{ClinicConfig, ConfigError};

/// Clinicbot - notification and contact routing for the clinic's Telegram bot.
#[derive(Parser, Debug)]
#[command(name = "clinicbot", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard lookup.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: Telegram polling, inbound routing and the admin API.
    Serve,
    /// Send a sample notification to a single destination.
    SendTest {
        /// Chat id or @username.
        #[arg(long)]
        to: String,
        /// Notification category to sample.
        #[arg(long, default_value = "new_appointment")]
        category: String,
    },
    /// Send today's summary to the configured destinations.
    Summary,
    /// Run diagnostic checks against the environment.
    Doctor {
        /// Also run slower checks (database integrity, Telegram reachability).
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration and print a short summary.
    Check,
    /// Print the effective configuration as TOML, secrets redacted.
    Show,
}

fn load_config(path: Option<&Path>) -> Result<ClinicConfig, Vec<ConfigError>> {
    match path {
        Some(path) => clinicbot_config::load_and_validate_path(path),
        None => clinicbot_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            clinicbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::SendTest { to, category }) => {
            admin::run_send_test(&config, &to, &category).await
        }
        Some(Commands::Summary) => admin::run_summary(&config).await,
        Some(Commands::Doctor { deep, plain }) => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await
        }
        Some(Commands::Config { action }) => match action {
            ConfigCommand::Check => {
                admin::print_config_summary(&config);
                Ok(())
            }
            ConfigCommand::Show => admin::print_config(&config),
        },
        None => {
            println!("clinicbot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("clinicbot: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = clinicbot_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.service.name, "clinicbot");
        assert_eq!(config.service.utc_offset_minutes, 180);
        assert!(config.telegram.bot_token.is_none());
    }

    #[test]
    fn parses_send_test_with_default_category() {
        let cli = Cli::try_parse_from(["clinicbot", "send-test", "--to", "@night_shift"]).unwrap();
        match cli.command {
            Some(Commands::SendTest { to, category }) => {
                assert_eq!(to, "@night_shift");
                assert_eq!(category, "new_appointment");
            }
            other => panic!("expected send-test, got {other:?}"),
        }
    }

    #[test]
    fn send_test_requires_destination() {
        assert!(Cli::try_parse_from(["clinicbot", "send-test"]).is_err());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["clinicbot", "config", "check", "--config", "/tmp/c.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Check
            })
        ));
    }

    #[test]
    fn doctor_flags() {
        let cli = Cli::try_parse_from(["clinicbot", "doctor", "--deep", "--plain"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Doctor {
                deep: true,
                plain: true
            })
        ));
    }
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `clinicbot serve` command implementation.
//!
//! Starts SQLite storage, the Telegram channel, the notification dispatcher,
//! the inbound loop and the admin API, then runs until SIGINT/SIGTERM.

use std::sync::Arc;

use clinicbot_config::model::ClinicConfig;
use clinicbot_core::error::ClinicError;
use clinicbot_core::{ChannelAdapter, StorageAdapter};
use clinicbot_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig};
use clinicbot_notify::{Dispatcher, InboundLoop, InboundRouter, NotificationRouting, shutdown};
use clinicbot_prometheus::PrometheusAdapter;
use clinicbot_storage::SqliteStorage;
use clinicbot_telegram::TelegramChannel;
use tracing::{debug, error, info, warn};

/// Opens and migrates the configured SQLite database.
pub async fn open_storage(config: &ClinicConfig) -> Result<Arc<dyn StorageAdapter>, ClinicError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Creates the Telegram channel without starting long polling.
pub fn open_telegram(config: &ClinicConfig) -> Result<TelegramChannel, ClinicError> {
    TelegramChannel::new(&config.telegram).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token in clinicbot.toml \
             or the CLINICBOT_TELEGRAM_BOT_TOKEN environment variable"
        );
        e
    })
}

/// Wires a dispatcher with the configured routing and clinic time zone.
pub fn build_dispatcher(
    config: &ClinicConfig,
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
) -> Dispatcher {
    Dispatcher::new(storage, channel)
        .with_routing(NotificationRouting::new(&config.notifications))
        .with_utc_offset(config.service.utc_offset_minutes)
}

/// Runs the `clinicbot serve` command.
pub async fn run_serve(config: ClinicConfig) -> Result<(), ClinicError> {
    init_tracing(&config.service.log_level);

    info!(name = config.service.name.as_str(), "starting clinicbot serve");

    // Metrics are optional; a failed recorder install only loses /metrics.
    let prometheus_adapter = match PrometheusAdapter::new() {
        Ok(adapter) => {
            info!("prometheus metrics enabled");
            Some(adapter)
        }
        Err(e) => {
            warn!(error = %e, "prometheus initialization failed, continuing without metrics");
            None
        }
    };
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        prometheus_adapter.as_ref().map(|adapter| {
            let handle = adapter.handle().clone();
            Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>
        });

    let storage = open_storage(&config).await?;

    let mut telegram = open_telegram(&config)?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);
    info!("telegram channel connected");

    let dispatcher = Arc::new(build_dispatcher(&config, storage.clone(), channel.clone()));

    let cancel = shutdown::install_signal_handler();

    let gateway_task = if config.gateway.enabled {
        let state = GatewayState {
            storage: storage.clone(),
            dispatcher: dispatcher.clone(),
            auth: AuthConfig {
                bearer_token: config.gateway.bearer_token.clone(),
            },
            health: HealthState::new(prometheus_render),
        };
        let server_config = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        let gw_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) =
                clinicbot_gateway::start_server(&server_config, state, gw_cancel.clone()).await
            {
                error!(error = %e, "gateway server failed, shutting down");
                gw_cancel.cancel();
            }
        }))
    } else {
        debug!("gateway disabled by configuration");
        None
    };

    let inbound = InboundLoop::new(channel.clone(), InboundRouter::new(dispatcher));
    let result = inbound.run(cancel.clone()).await;

    // The inbound loop can also end on its own (channel closed).
    cancel.cancel();

    if let Some(task) = gateway_task {
        if let Err(e) = task.await {
            warn!(error = %e, "gateway task did not finish cleanly");
        }
    }

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "telegram channel shutdown failed");
    }
    storage.close().await?;

    info!("clinicbot serve shutdown complete");
    result
}

/// Initializes the tracing subscriber with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clinicbot={log_level},warn")));

    // A second init (tests, repeated commands) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

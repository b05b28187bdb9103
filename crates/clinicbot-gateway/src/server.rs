// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the admin API.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use clinicbot_core::{ClinicError, StorageAdapter};
use clinicbot_notify::Dispatcher;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub storage: Arc<dyn StorageAdapter>,
    pub dispatcher: Arc<Dispatcher>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors `GatewayConfig` from clinicbot-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the full router: public health/metrics plus the authenticated `/v1` API.
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated public routes (health + metrics for systemd and Prometheus).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/contacts",
            get(handlers::list_contacts).post(handlers::upsert_contact),
        )
        .route("/v1/contacts/{id}", get(handlers::get_contact))
        .route("/v1/contacts/{id}/blocked", put(handlers::set_contact_blocked))
        .route("/v1/contacts/{id}/tags", put(handlers::set_contact_tags))
        .route("/v1/contacts/{id}/notes", put(handlers::set_contact_notes))
        .route(
            "/v1/contacts/{id}/messages",
            get(handlers::list_contact_messages).post(handlers::reply_to_contact),
        )
        .route(
            "/v1/templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route(
            "/v1/templates/{id}",
            axum::routing::patch(handlers::update_template).delete(handlers::delete_template),
        )
        .route("/v1/templates/{id}/send", post(handlers::send_template))
        .route(
            "/v1/settings",
            get(handlers::get_settings).patch(handlers::update_settings),
        )
        .route("/v1/settings/active", put(handlers::set_active))
        .route(
            "/v1/notifications/test",
            post(handlers::send_test_notification),
        )
        .route(
            "/v1/notifications/summary",
            post(handlers::send_daily_summary),
        )
        .route(
            "/v1/notifications/appointment",
            post(handlers::notify_appointment),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the admin API until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ClinicError> {
    if state.auth.bearer_token.is_none() {
        tracing::warn!("gateway.bearer_token is not set; every /v1 request will be rejected");
    }

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ClinicError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ClinicError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for clinicbot.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text via [`PrometheusAdapter::render`], which the
//! gateway exposes at `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use clinicbot_core::{AdapterType, ClinicError, HealthStatus, PluginAdapter};

pub use recording::{record_delivery, record_dispatch, record_inbound, register_metrics};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and keeps a handle for rendering.
#[derive(Clone)]
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, ClinicError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            ClinicError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wraps an existing handle without touching the global recorder.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, ClinicError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ClinicError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_adapter() -> (metrics_exporter_prometheus::PrometheusRecorder, PrometheusAdapter) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let adapter = PrometheusAdapter::from_handle(recorder.handle());
        (recorder, adapter)
    }

    #[tokio::test]
    async fn adapter_identity_and_health() {
        let (_recorder, adapter) = local_adapter();
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Observability);
        assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[test]
    fn render_reflects_local_recorder() {
        let (recorder, adapter) = local_adapter();
        metrics::with_local_recorder(&recorder, record_inbound);
        assert!(adapter.render().contains("clinicbot_inbound_messages_total 1"));
    }
}

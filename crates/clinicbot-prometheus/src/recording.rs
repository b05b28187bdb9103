// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder collects these.
//! Without a recorder every call is a no-op.

use clinicbot_core::DispatchStatus;
use metrics::describe_counter;

/// Register all clinicbot metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "clinicbot_dispatch_total",
        "Notification dispatches by category and aggregate status"
    );
    describe_counter!(
        "clinicbot_deliveries_total",
        "Per-destination delivery attempts by outcome"
    );
    describe_counter!(
        "clinicbot_inbound_messages_total",
        "Inbound patient messages handled"
    );
}

/// Record one dispatch with its aggregate status.
pub fn record_dispatch(category: &str, status: DispatchStatus) {
    metrics::counter!(
        "clinicbot_dispatch_total",
        "category" => category.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
}

/// Record one delivery attempt.
pub fn record_delivery(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    metrics::counter!("clinicbot_deliveries_total", "outcome" => outcome).increment(1);
}

/// Record one handled inbound message.
pub fn record_inbound() {
    metrics::counter!("clinicbot_inbound_messages_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn counters_render_with_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_dispatch("new_appointment", DispatchStatus::PartiallySent);
            record_delivery(true);
            record_delivery(false);
            record_delivery(false);
        });

        let text = handle.render();
        assert!(text.contains(
            "clinicbot_dispatch_total{category=\"new_appointment\",status=\"partially_sent\"} 1"
        ));
        assert!(text.contains("clinicbot_deliveries_total{outcome=\"failed\"} 2"));
        assert!(text.contains("clinicbot_deliveries_total{outcome=\"delivered\"} 1"));
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_dispatch("daily_summary", DispatchStatus::NotSent);
        record_inbound();
    }
}

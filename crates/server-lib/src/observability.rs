//! Observability infrastructure for the dashboard server
//!
//! Provides:
//! - Prometheus metrics (prediction latency, store query latency, ticket
//!   gauge, model version)
//! - Structured JSON event logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DashboardMetricsInner> = OnceLock::new();

struct DashboardMetricsInner {
    prediction_latency_seconds: Histogram,
    query_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    tickets_total: IntGauge,
    model_version_info: GaugeVec,
}

impl DashboardMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "sla_dashboard_prediction_latency_seconds",
                "Time spent running one SLA-violation prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            query_latency_seconds: register_histogram!(
                "sla_dashboard_query_latency_seconds",
                "Time spent in ticket-store queries",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register query_latency_seconds"),

            predictions_total: register_int_counter!(
                "sla_dashboard_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "sla_dashboard_prediction_errors_total",
                "Total number of failed prediction calls"
            )
            .expect("Failed to register prediction_errors_total"),

            tickets_total: register_int_gauge!(
                "sla_dashboard_tickets_total",
                "Number of tickets in the store"
            )
            .expect("Failed to register tickets_total"),

            model_version_info: register_gauge_vec!(
                "sla_dashboard_model_version_info",
                "Information about the loaded classifier artifact",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Metrics handle; clones share the global instance.
#[derive(Clone)]
pub struct DashboardMetrics {
    _private: (),
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DashboardMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_query_latency(&self, duration_secs: f64) {
        self.inner().query_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn set_tickets_total(&self, count: i64) {
        self.inner().tickets_total.set(count);
    }

    pub fn set_model_version(&self, version: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version])
            .set(1.0);
    }
}

/// Structured logger for dashboard events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: &str, ticket_count: u64) {
        info!(
            event = "server_started",
            service = %self.service,
            server_version = %version,
            model_version = %model_version,
            ticket_count = ticket_count,
            "SLA dashboard server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service,
            reason = %reason,
            "SLA dashboard server shutting down"
        );
    }

    /// Log a served prediction
    pub fn log_prediction(
        &self,
        client_address: Option<&str>,
        sla_violated: bool,
        confidence: f64,
        days_to_due: i64,
        model_version: &str,
    ) {
        info!(
            event = "prediction_served",
            service = %self.service,
            client_address = client_address.unwrap_or("unknown"),
            sla_violated = sla_violated,
            confidence = confidence,
            days_to_due = days_to_due,
            model_version = %model_version,
            "Served SLA-violation prediction"
        );
    }

    /// Log a failed prediction with the error's type and chain
    pub fn log_prediction_error(&self, kind: &str, message: &str) {
        error!(
            event = "prediction_failed",
            service = %self.service,
            kind = %kind,
            message = %message,
            "Prediction call failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_handle_records_without_panicking() {
        let metrics = DashboardMetrics::new();
        metrics.observe_prediction_latency(0.001);
        metrics.observe_query_latency(0.002);
        metrics.inc_predictions();
        metrics.inc_prediction_errors();
        metrics.set_tickets_total(42);
        metrics.set_model_version("2024-05");
    }

    #[test]
    fn structured_logger_creation() {
        let logger = StructuredLogger::new("sla-server");
        assert_eq!(logger.service, "sla-server");
    }
}

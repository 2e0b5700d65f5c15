//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Attached connections and registered users
//! - Messages routed by kind and outcome
//! - Push notifications and durable presence writes by outcome

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "social_server";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Realtime gauges: attached connections and registered users
pub static REALTIME_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("realtime_active", "Live realtime connections and registered users")
            .namespace(NAMESPACE),
        &["kind"], // "connections", "users"
    )
    .expect("Failed to create REALTIME_ACTIVE metric")
});

/// Messages routed, by target kind and delivery outcome
pub static MESSAGES_ROUTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_routed_total", "Messages accepted by the router").namespace(NAMESPACE),
        &["kind", "outcome"], // direct|group, delivered|pushed|offline|persist_failed
    )
    .expect("Failed to create MESSAGES_ROUTED_TOTAL metric")
});

/// Push notification attempts by outcome
pub static PUSH_NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("push_notifications_total", "Push fallback attempts").namespace(NAMESPACE),
        &["outcome"], // sent|failed|disabled|no_token|lookup_failed
    )
    .expect("Failed to create PUSH_NOTIFICATIONS_TOTAL metric")
});

/// Durable presence writes by result
pub static PRESENCE_WRITES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("presence_writes_total", "Durable presence writes").namespace(NAMESPACE),
        &["result"], // ok|failed
    )
    .expect("Failed to create PRESENCE_WRITES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(REALTIME_ACTIVE.clone()))
        .expect("Failed to register REALTIME_ACTIVE");
    registry
        .register(Box::new(MESSAGES_ROUTED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_ROUTED_TOTAL");
    registry
        .register(Box::new(PUSH_NOTIFICATIONS_TOTAL.clone()))
        .expect("Failed to register PUSH_NOTIFICATIONS_TOTAL");
    registry
        .register(Box::new(PRESENCE_WRITES_TOTAL.clone()))
        .expect("Failed to register PRESENCE_WRITES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to update the realtime gauges
pub fn set_realtime_gauges(connections: usize, users: usize) {
    REALTIME_ACTIVE
        .with_label_values(&["connections"])
        .set(connections as f64);
    REALTIME_ACTIVE
        .with_label_values(&["users"])
        .set(users as f64);
}

pub fn record_message_routed(kind: &str, outcome: &str) {
    MESSAGES_ROUTED_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn record_push(outcome: &str) {
    PUSH_NOTIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_presence_write(ok: bool) {
    PRESENCE_WRITES_TOTAL
        .with_label_values(&[if ok { "ok" } else { "failed" }])
        .inc();
}

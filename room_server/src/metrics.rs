//! Prometheus metrics for monitoring room server health.
//!
//! Metrics are recorded through the `metrics` facade and exported in
//! Prometheus text format when a listener is installed.
//!
//! # Metrics Categories
//!
//! - **Connection Metrics**: Active WebSocket connections
//! - **Room Metrics**: Live rooms, hands started
//! - **Message Metrics**: Inbound messages by kind, rejections by reason
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use room_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connections_active(10);
//! metrics::messages_total("move");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Connection Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment rejected upgrade attempts.
pub fn auth_failures_total() {
    metrics::counter!("auth_failures_total").increment(1);
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Set current live room count.
pub fn rooms_active(count: usize) {
    metrics::gauge!("rooms_active").set(count as f64);
}

/// Increment hands started counter.
pub fn hands_started_total() {
    metrics::counter!("hands_started_total").increment(1);
}

// ============================================================================
// Message Metrics
// ============================================================================

/// Increment inbound message counter for one message kind.
pub fn messages_total(kind: &'static str) {
    metrics::counter!("messages_total", "kind" => kind).increment(1);
}

/// Increment rejected message counter for one failure reason.
pub fn messages_rejected_total(reason: &'static str) {
    metrics::counter!("messages_rejected_total", "reason" => reason).increment(1);
}

/// Increment connections dropped for falling behind on pushes.
pub fn slow_consumers_total() {
    metrics::counter!("slow_consumers_total").increment(1);
}

//! Structured logging configuration.
//!
//! Library crates log through the `log` facade; `init` bridges those
//! records into the tracing subscriber so both end up on the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG` and default to `info`.
///
/// # Example
///
/// ```no_run
/// use room_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `room_id` - Optional room the event concerns
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use room_server::logging::log_security_event;
///
/// log_security_event(
///     "auth_rejected",
///     None,
///     Some("lobby"),
///     "Token signature mismatch"
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<&str>,
    room_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        room_id = room_id,
        "SECURITY: {}",
        message
    );
}

/// Log how long a room operation took, warning when it is slow
pub fn log_performance(operation: &str, duration_ms: u64, room_id: Option<&str>) {
    if duration_ms > 250 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            room_id = room_id,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::trace!(
            operation = operation,
            duration_ms = duration_ms,
            room_id = room_id,
            "Performance metric"
        );
    }
}

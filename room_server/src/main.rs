//! Room server: one actor per room, one WebSocket per player.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::{info, warn};
use pico_args::Arguments;
use poker_room::{auth::JwtAuthenticator, room::RoomRegistry};
use room_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};

const HELP: &str = "\
Run a multi-room poker server

USAGE:
  room_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  JWT_SECRET               Access token signing secret (required, 32+ chars)
  METRICS_BIND             Prometheus listener address (optional)
  ROOM_MAX_SEATS           Seats per room [default: 9]
  ROOM_SMALL_BLIND         Small blind [default: 50]
  ROOM_BIG_BLIND           Big blind [default: 100]
  ROOM_DEFAULT_BUY_IN      Buy-in when a join names none [default: 1000]
  ROOM_MIN_BUY_IN          Smallest buy-in [default: 1]
  ROOM_MAX_BUY_IN          Largest buy-in [default: 1000000]
  WS_BURST_LIMIT           Messages per second per connection [default: 10]
  WS_SUSTAINED_LIMIT       Messages per minute per connection [default: 100]
  (A .env file in the working directory is loaded first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        match metrics::init_metrics(metrics_bind) {
            Ok(()) => info!("Prometheus metrics on http://{}/metrics", metrics_bind),
            Err(e) => warn!("{}", e),
        }
    }

    info!(
        "Rooms: {} seats, blinds {}/{}, buy-in {} ({}-{})",
        config.room.max_seats,
        config.room.small_blind,
        config.room.big_blind,
        config.room.default_buy_in,
        config.room.min_buy_in,
        config.room.max_buy_in
    );

    let registry = Arc::new(RoomRegistry::new(config.room.clone()));
    let authenticator = Arc::new(JwtAuthenticator::new(&config.jwt_secret));
    let state = AppState::new(registry, authenticator, config.limits);
    let app = api::create_router(state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

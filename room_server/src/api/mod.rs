//! HTTP/WebSocket API for the room server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: CORS middleware
//! - **JWT**: Access tokens verified before any WebSocket upgrade
//! - **Actor Model**: Room state owned by one actor task per room
//!
//! # Modules
//!
//! - [`websocket`]: Live play, one connection per player per room
//! - [`rooms`]: Read-only room listings
//! - [`rate_limiter`]: Per-connection message limits
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                 - Server health status
//! GET  /api/v1/rooms           - List live rooms
//! GET  /api/v1/rooms/{room_id} - Describe one live room
//! GET  /ws/{room_id}           - WebSocket (token required)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use poker_room::{auth::JwtAuthenticator, room::{RoomConfig, RoomRegistry}};
//! use room_server::api::{AppState, create_router, rate_limiter::MessageLimits};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(
//!     Arc::new(RoomRegistry::new(RoomConfig::default())),
//!     Arc::new(JwtAuthenticator::new("a-secret-of-at-least-32-characters")),
//!     MessageLimits::default(),
//! );
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod rate_limiter;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use poker_room::{auth::Authenticator, room::RoomRegistry};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower_http::cors::CorsLayer;

use rate_limiter::MessageLimits;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is behind an `Arc` or `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub authenticator: Arc<dyn Authenticator>,
    pub limits: MessageLimits,
    /// Open WebSocket connections across all rooms
    pub connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        registry: Arc<RoomRegistry>,
        authenticator: Arc<dyn Authenticator>,
        limits: MessageLimits,
    ) -> Self {
        Self {
            registry,
            authenticator,
            limits,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/{room_id}", get(rooms::get_room));

    Router::new()
        .route("/health", get(health_check))
        // WebSocket route handles its own auth via cookie or query parameter
        .route("/ws/{room_id}", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","rooms":{"active_count":2},"connections":5,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let room_count = state.registry.room_count().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": {
            "active_count": room_count
        },
        "connections": state.connections.load(Ordering::Relaxed),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

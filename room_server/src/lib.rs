//! WebSocket front door for poker rooms.
//!
//! Wires a [`poker_room::room::RoomRegistry`] and an
//! [`poker_room::auth::Authenticator`] into an axum router, with
//! environment configuration, structured logging and Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

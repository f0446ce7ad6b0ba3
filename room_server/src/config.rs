//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_room::room::RoomConfig;
use std::net::SocketAddr;

use crate::api::rate_limiter::MessageLimits;

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus listener, if metrics are exported
    pub metrics_bind: Option<SocketAddr>,
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Settings for every room the registry creates
    pub room: RoomConfig,
    /// Per-connection message limits
    pub limits: MessageLimits,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND")?.unwrap_or(default_bind()),
        };
        let metrics_bind = parse_addr("METRICS_BIND")?;

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let defaults = RoomConfig::default();
        let room = RoomConfig {
            max_seats: parse_env_or("ROOM_MAX_SEATS", defaults.max_seats),
            small_blind: parse_env_or("ROOM_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("ROOM_BIG_BLIND", defaults.big_blind),
            default_buy_in: parse_env_or("ROOM_DEFAULT_BUY_IN", defaults.default_buy_in),
            min_buy_in: parse_env_or("ROOM_MIN_BUY_IN", defaults.min_buy_in),
            max_buy_in: parse_env_or("ROOM_MAX_BUY_IN", defaults.max_buy_in),
            outbound_capacity: parse_env_or("ROOM_OUTBOUND_CAPACITY", defaults.outbound_capacity),
        };

        let default_limits = MessageLimits::default();
        let limits = MessageLimits {
            burst: parse_env_or("WS_BURST_LIMIT", default_limits.burst),
            sustained: parse_env_or("WS_SUSTAINED_LIMIT", default_limits.sustained),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            jwt_secret,
            room,
            limits,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        self.room.validate().map_err(|reason| ConfigError::Invalid {
            var: "ROOM_*".to_string(),
            reason,
        })?;

        if self.limits.burst == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_BURST_LIMIT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.limits.sustained < self.limits.burst {
            return Err(ConfigError::Invalid {
                var: "WS_SUSTAINED_LIMIT".to_string(),
                reason: format!("Must be at least the burst limit ({})", self.limits.burst),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

/// Parse an optional socket address, rejecting malformed values.
fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not an IP:PORT address"),
            }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

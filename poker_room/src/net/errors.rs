//! Session gateway error types.

use thiserror::Error;

use crate::{
    game::HandError,
    room::RoomError,
};

/// Everything that can go wrong handling one inbound message. None of
/// these close the connection; each becomes an `error` reply to the sender.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or unknown inbound message
    #[error("Invalid message: {0}")]
    Protocol(String),

    /// Room or hand engine rejection
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Unexpected failure inside the server
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<HandError> for GatewayError {
    fn from(err: HandError) -> Self {
        Self::Room(RoomError::Hand(err))
    }
}

impl GatewayError {
    /// Message safe to send to the client.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::Protocol(_) => "Invalid message format".to_string(),
            GatewayError::Room(RoomError::RoomClosed) | GatewayError::Internal(_) => {
                "Internal server error".to_string()
            }
            GatewayError::Room(err) => err.to_string(),
        }
    }

    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::Protocol(_) => "protocol",
            GatewayError::Internal(_) => "internal",
            GatewayError::Room(err) => match err {
                RoomError::RoomFull => "room_full",
                RoomError::HandInProgress => "hand_in_progress",
                RoomError::NotEnoughPlayers => "not_enough_players",
                RoomError::NotHost => "not_host",
                RoomError::NotSeated => "not_seated",
                RoomError::AlreadySeated => "already_seated",
                RoomError::NoActiveHand => "no_active_hand",
                RoomError::InvalidBuyIn { .. } => "invalid_buy_in",
                RoomError::UnknownConnection => "unknown_connection",
                RoomError::RoomClosed => "room_closed",
                RoomError::Hand(hand) => match hand {
                    HandError::InvalidConfiguration(_) => "invalid_configuration",
                    HandError::DeckExhausted => "deck_exhausted",
                    HandError::NotYourTurn => "not_your_turn",
                    HandError::InvalidAmount => "invalid_amount",
                    HandError::BelowMinimumRaise { .. } => "below_minimum_raise",
                    HandError::HandAlreadyComplete => "hand_already_complete",
                    HandError::NotComplete => "not_complete",
                },
            },
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

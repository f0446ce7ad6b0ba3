//! Room error types.

use thiserror::Error;

use crate::game::{Chips, HandError};

/// Room errors
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RoomError {
    /// Every seat is taken
    #[error("Room is full")]
    RoomFull,

    /// Start requested while a hand is live
    #[error("Hand already in progress")]
    HandInProgress,

    /// Fewer than two connected seats with chips
    #[error("Need at least 2 players to start")]
    NotEnoughPlayers,

    /// Only the host may start a hand
    #[error("Only the host can start the game")]
    NotHost,

    /// Action from a connection with no seat
    #[error("You have not joined this room")]
    NotSeated,

    /// Join from a connection that already holds a seat
    #[error("Already seated")]
    AlreadySeated,

    /// Move or state query with no hand running
    #[error("No hand in progress")]
    NoActiveHand,

    /// Buy-in outside the configured range
    #[error("Buy-in must be between {min} and {max} chips")]
    InvalidBuyIn { min: Chips, max: Chips },

    /// Connection is not attached to this room
    #[error("Unknown connection")]
    UnknownConnection,

    /// The room actor has shut down
    #[error("Room is closed")]
    RoomClosed,

    /// Hand engine rejection
    #[error(transparent)]
    Hand(#[from] HandError),
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;

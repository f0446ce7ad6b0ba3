//! Hand engine error types.

use thiserror::Error;

use super::entities::Chips;

/// Reasons the hand engine refuses a start or an action.
///
/// Every refusal leaves the hand exactly as it was.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HandError {
    /// Bad seat list, stacks, or blinds
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The dealer ran out of cards
    #[error("Deck exhausted")]
    DeckExhausted,

    /// Someone other than the current actor tried to act
    #[error("Not your turn")]
    NotYourTurn,

    /// Bet or raise with a non-positive amount
    #[error("Invalid amount")]
    InvalidAmount,

    /// Raise-to total under the minimum while chips remain behind
    #[error("Raise must be at least {minimum}")]
    BelowMinimumRaise { minimum: Chips },

    /// The hand has terminated; no more actions
    #[error("Hand already complete")]
    HandAlreadyComplete,

    /// Settlement requested while the hand is still live
    #[error("Hand not complete")]
    NotComplete,
}

/// Result type for hand engine operations
pub type HandResult<T> = Result<T, HandError>;

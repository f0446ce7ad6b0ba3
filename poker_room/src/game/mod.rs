//! Hand engine - one No-Limit Hold'em hand at a time.
//!
//! This module provides:
//! - Card, deck, and action entities
//! - Hand evaluation ([`functional`])
//! - The [`Dealer`] seam for dealing and ranking
//! - Main/side pot construction ([`pot`])
//! - The [`Hand`] betting engine and its settlement

pub mod dealer;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod hand;
pub mod pot;
pub mod views;

pub use dealer::{Dealer, RankedHand, ShuffledDealer, StackedDealer};
pub use entities::{Blinds, Card, Chips, Phase, PlayerAction, SeatIndex, SeatStatus};
pub use errors::{HandError, HandResult};
pub use hand::{Hand, HandSeat};
pub use views::{PlayerView, PotSummary, Settlement, TableSnapshot};

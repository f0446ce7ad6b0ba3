//! # Poker Room
//!
//! No-Limit Texas Hold'em rooms that run concurrently and never share state.
//!
//! Clients attach to a room by name, take a seat with a buy-in, and the
//! room's host starts hands. Every change to a room is pushed to all of its
//! connections, each receiving a view that shows only its own hole cards.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, hand evaluation, pots, and the single-hand engine
//! - [`room`]: seats, hand lifecycle, the room actor, and the registry
//! - [`net`]: JSON protocol and per-connection sessions
//! - [`auth`]: access-token verification
//!
//! ## Example
//!
//! ```
//! use poker_room::game::{Blinds, Hand, PlayerAction, ShuffledDealer};
//!
//! let mut hand = Hand::start(
//!     &[0, 1],
//!     &[1000, 1000],
//!     Blinds::default(),
//!     Box::new(ShuffledDealer::new()),
//! )
//! .unwrap();
//!
//! // Heads-up: the small blind acts first before the flop.
//! assert_eq!(hand.current_actor(), Some(0));
//! hand.apply_action(0, PlayerAction::Fold, 0).unwrap();
//! assert!(hand.is_complete());
//! ```

pub mod auth;
pub mod game;
pub mod net;
pub mod room;

pub use auth::{Authenticator, Identity, JwtAuthenticator};
pub use net::{ClientMessage, ServerMessage, Session};
pub use room::{RoomConfig, RoomError, RoomRegistry};

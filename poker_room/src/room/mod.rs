//! Room module providing isolated, concurrently running tables.
//!
//! This module implements:
//! - Room: synchronous seat list, hand lifecycle, and snapshots
//! - RoomActor: async actor that owns one Room and serializes every mutation
//! - RoomRegistry: lazily creates rooms and forgets them once empty
//!
//! ## Architecture
//!
//! Each room runs in its own Tokio task with an mpsc inbox. Connections
//! attach with an outbound queue; the actor pushes every broadcast into
//! those queues before replying, so all peers observe the same order of
//! events. Rooms never share locks with each other.
//!
//! ## Example
//!
//! ```no_run
//! use poker_room::{auth::Identity, room::{RoomConfig, RoomRegistry}};
//! use tokio::sync::mpsc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = RoomRegistry::new(RoomConfig::default());
//!     let room = registry.get_or_create("lobby").await;
//!
//!     let connection = Uuid::new_v4();
//!     let (outbound, mut inbox) = mpsc::channel(64);
//!     room.attach(connection, Identity::new("1", "alice"), outbound).await.unwrap();
//!     room.join(connection, Some(1000)).await.unwrap();
//!     println!("{:?}", inbox.recv().await);
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod state;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use errors::{RoomError, RoomResult};
pub use manager::RoomRegistry;
pub use messages::{ConnectionId, Departure, RoomId, RoomMessage, RoomSummary};
pub use state::{ActionOutcome, DealerFactory, JoinOutcome, Room, Seat};

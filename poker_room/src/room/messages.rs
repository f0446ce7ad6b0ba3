//! Room actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::errors::{RoomError, RoomResult};
use crate::{
    auth::Identity,
    game::{Chips, PlayerAction, SeatIndex},
    net::messages::ServerMessage,
};

/// Identifies one attached connection within a room.
pub type ConnectionId = Uuid;

/// Room identifier, taken from the connection path
pub type RoomId = String;

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Register a connection and the queue its pushes go to
    Attach {
        connection: ConnectionId,
        identity: Identity,
        outbound: mpsc::Sender<ServerMessage>,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// Take a seat; `None` uses the room's default buy-in
    Join {
        connection: ConnectionId,
        buy_in: Option<Chips>,
        response: oneshot::Sender<RoomResult<SeatIndex>>,
    },

    /// Deal the next hand
    Start {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// Player action on the live hand
    Move {
        connection: ConnectionId,
        action: PlayerAction,
        amount: Chips,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// Push a personal snapshot to the requesting connection
    GetState {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// Transport closed
    Disconnect {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResult<Departure>>,
    },

    /// Lightweight status for listings
    Summary {
        response: oneshot::Sender<RoomSummary>,
    },
}

impl RoomMessage {
    /// Answer a message the actor will never handle.
    pub(crate) fn reject(self, error: RoomError) {
        match self {
            RoomMessage::Attach { response, .. }
            | RoomMessage::Start { response, .. }
            | RoomMessage::Move { response, .. }
            | RoomMessage::GetState { response, .. } => {
                let _ = response.send(Err(error));
            }
            RoomMessage::Join { response, .. } => {
                let _ = response.send(Err(error));
            }
            RoomMessage::Disconnect { response, .. } => {
                let _ = response.send(Err(error));
            }
            RoomMessage::Summary { .. } => {}
        }
    }
}

/// What happened to the room after a connection left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Nobody is left; the actor has shut down.
    RoomEmpty,
    /// Others remain, with this many connected seats.
    Remaining(usize),
}

/// Room summary for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub seats: usize,
    pub connected_seats: usize,
    pub connections: usize,
    pub hand_number: u64,
    pub hand_in_progress: bool,
}

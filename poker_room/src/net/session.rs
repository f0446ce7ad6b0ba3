//! Per-connection protocol dispatch.
//!
//! A [`Session`] is opened once the connection's identity is verified. It
//! attaches to a room, turns inbound [`ClientMessage`]s into room calls,
//! and detaches on close. Pushes from the room arrive on the receiver
//! returned by [`Session::open`]; only errors are returned directly.

use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    errors::{GatewayError, GatewayResult},
    messages::{ClientMessage, ServerMessage},
};
use crate::{
    auth::Identity,
    game::{Chips, HandError, PlayerAction, SeatIndex},
    room::{ConnectionId, Departure, RoomError, RoomHandle, RoomRegistry},
};

/// Attempts at attaching before giving up on a room that keeps closing
/// underneath us.
const ATTACH_ATTEMPTS: usize = 3;

pub struct Session {
    connection: ConnectionId,
    identity: Identity,
    room: RoomHandle,
    registry: Arc<RoomRegistry>,
    seat: Option<SeatIndex>,
}

impl Session {
    /// Attach `identity` to `room_id`, creating the room if needed.
    pub async fn open(
        registry: Arc<RoomRegistry>,
        room_id: &str,
        identity: Identity,
    ) -> GatewayResult<(Self, mpsc::Receiver<ServerMessage>)> {
        let connection = Uuid::new_v4();
        for _ in 0..ATTACH_ATTEMPTS {
            let room = registry.get_or_create(room_id).await;
            let (outbound, inbox) = mpsc::channel(registry.config().outbound_capacity);
            match room.attach(connection, identity.clone(), outbound).await {
                Ok(()) => {
                    debug!(
                        "Session {} opened for {} in room {}",
                        connection, identity.username, room_id
                    );
                    let session = Self {
                        connection,
                        identity,
                        room,
                        registry,
                        seat: None,
                    };
                    return Ok((session, inbox));
                }
                // Lost a race with the room shutting down; a fresh one will
                // be created on the next pass.
                Err(RoomError::RoomClosed) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(GatewayError::Internal(format!(
            "room {room_id} kept closing during attach"
        )))
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn room_id(&self) -> &str {
        self.room.room_id()
    }

    pub fn seat(&self) -> Option<SeatIndex> {
        self.seat
    }

    /// Parse and dispatch one text frame. Returns the reply to send if it
    /// failed.
    pub async fn handle_text(&mut self, text: &str) -> Option<ServerMessage> {
        let result = match ClientMessage::from_json(text) {
            Ok(message) => self.handle(message).await,
            Err(e) => Err(e),
        };
        result.err().map(|e| self.reject(&e))
    }

    /// Turn a failure into the `error` reply for this connection.
    pub fn reject(&self, error: &GatewayError) -> ServerMessage {
        match error {
            GatewayError::Internal(_) | GatewayError::Room(RoomError::RoomClosed) => warn!(
                "Session {} in room {}: {}",
                self.connection,
                self.room.room_id(),
                error
            ),
            _ => debug!(
                "Session {} in room {}: {}",
                self.connection,
                self.room.room_id(),
                error
            ),
        }
        ServerMessage::error(error.client_message())
    }

    pub async fn handle(&mut self, message: ClientMessage) -> GatewayResult<()> {
        match message {
            ClientMessage::Join { chips } => {
                let buy_in = chips.map(buy_in_chips);
                let seat = self.room.join(self.connection, buy_in).await?;
                self.seat = Some(seat);
            }
            ClientMessage::Start => self.room.start(self.connection).await?,
            ClientMessage::Move { kind, amount } => {
                let amount = match kind {
                    PlayerAction::Bet | PlayerAction::Raise => bet_chips(amount)?,
                    _ => 0,
                };
                self.room.submit(self.connection, kind, amount).await?;
            }
            ClientMessage::GetState => self.room.request_state(self.connection).await?,
        }
        Ok(())
    }

    /// Detach from the room and drop it from the registry if it emptied.
    pub async fn close(self) {
        match self.room.disconnect(self.connection).await {
            Ok(Departure::RoomEmpty) => {
                self.registry.remove(&self.room).await;
            }
            Ok(Departure::Remaining(count)) => {
                debug!(
                    "Session {} closed, {} seats still connected in room {}",
                    self.connection,
                    count,
                    self.room.room_id()
                );
            }
            // Already dropped by the room as a slow consumer.
            Err(RoomError::UnknownConnection) => {}
            Err(e) => warn!("Session {} close failed: {}", self.connection, e),
        }
        if self.room.is_closed() {
            self.registry.remove(&self.room).await;
        }
    }
}

fn buy_in_chips(chips: i64) -> Chips {
    // Out-of-range values are clamped and then refused by the room's own
    // buy-in limits, so the error names the configured range.
    Chips::try_from(chips.max(0)).unwrap_or(Chips::MAX)
}

fn bet_chips(amount: i64) -> GatewayResult<Chips> {
    if amount <= 0 {
        return Err(HandError::InvalidAmount.into());
    }
    // Oversized bets are all-ins anyway.
    Ok(Chips::try_from(amount).unwrap_or(Chips::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomConfig;

    fn registry() -> Arc<RoomRegistry> {
        Arc::new(RoomRegistry::new(RoomConfig::default()))
    }

    #[test]
    fn test_amount_conversion() {
        assert_eq!(bet_chips(300).expect("valid"), 300);
        assert!(matches!(
            bet_chips(0),
            Err(GatewayError::Room(RoomError::Hand(HandError::InvalidAmount)))
        ));
        assert!(bet_chips(-5).is_err());
        assert_eq!(bet_chips(i64::MAX).expect("clamped"), Chips::MAX);
        assert_eq!(buy_in_chips(-1), 0);
        assert_eq!(buy_in_chips(i64::MAX), Chips::MAX);
    }

    #[tokio::test]
    async fn test_join_and_state_flow() {
        let registry = registry();
        let (mut session, mut inbox) =
            Session::open(registry.clone(), "lobby", Identity::new("1", "alice"))
                .await
                .expect("open");

        assert_eq!(session.handle_text(r#"{"action":"join","chips":1500}"#).await, None);
        assert_eq!(session.seat(), Some(0));
        assert_eq!(
            inbox.recv().await,
            Some(ServerMessage::Joined {
                player_id: 0,
                players_count: 1
            })
        );

        assert_eq!(session.handle_text(r#"{"action":"get_state"}"#).await, None);
        match inbox.recv().await {
            Some(ServerMessage::State { state }) => assert_eq!(state.players[0].stack, 1500),
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_errors_are_unicast_replies() {
        let registry = registry();
        let (mut session, _inbox) =
            Session::open(registry.clone(), "lobby", Identity::new("1", "alice"))
                .await
                .expect("open");

        assert_eq!(
            session.handle_text("{").await,
            Some(ServerMessage::error("Invalid message format"))
        );
        assert_eq!(
            session.handle_text(r#"{"action":"start"}"#).await,
            Some(ServerMessage::error("You have not joined this room"))
        );
        assert_eq!(
            session.handle_text(r#"{"action":"join","chips":-5}"#).await,
            Some(ServerMessage::error(
                "Buy-in must be between 1 and 1000000 chips"
            ))
        );
        assert_eq!(session.handle_text(r#"{"action":"join"}"#).await, None);
        assert_eq!(
            session.handle_text(r#"{"action":"join"}"#).await,
            Some(ServerMessage::error("Already seated"))
        );
        assert_eq!(
            session.handle_text(r#"{"action":"start"}"#).await,
            Some(ServerMessage::error("Need at least 2 players to start"))
        );
        assert_eq!(
            session
                .handle_text(r#"{"action":"move","move":"raise","amount":-10}"#)
                .await,
            Some(ServerMessage::error("Invalid amount"))
        );
    }

    #[tokio::test]
    async fn test_last_session_close_removes_room() {
        let registry = registry();
        let (alice, _a) = Session::open(registry.clone(), "lobby", Identity::new("1", "alice"))
            .await
            .expect("open");
        let (bob, _b) = Session::open(registry.clone(), "lobby", Identity::new("2", "bob"))
            .await
            .expect("open");
        assert_eq!(registry.room_count().await, 1);

        alice.close().await;
        assert_eq!(registry.room_count().await, 1);
        bob.close().await;
        assert_eq!(registry.room_count().await, 0);
    }
}

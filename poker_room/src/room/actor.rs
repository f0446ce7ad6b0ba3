//! Room actor implementation with async message handling.

use log::{debug, error, info, warn};
use std::collections::HashMap;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

use super::{
    errors::{RoomError, RoomResult},
    messages::{ConnectionId, Departure, RoomId, RoomMessage, RoomSummary},
    state::{ActionOutcome, Room},
};
use crate::{
    auth::Identity,
    game::{Chips, PlayerAction, SeatIndex},
    net::messages::ServerMessage,
};

/// Inbox depth per room
const INBOX_CAPACITY: usize = 100;

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    /// Create a new room handle
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    /// Get room ID
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// The actor has stopped taking messages.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Both handles point at the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> RoomResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomError::RoomClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<RoomResult<T>>) -> RoomMessage,
    ) -> RoomResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| RoomError::RoomClosed)?
    }

    pub async fn attach(
        &self,
        connection: ConnectionId,
        identity: Identity,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> RoomResult<()> {
        self.request(|response| RoomMessage::Attach {
            connection,
            identity,
            outbound,
            response,
        })
        .await
    }

    pub async fn join(&self, connection: ConnectionId, buy_in: Option<Chips>) -> RoomResult<SeatIndex> {
        self.request(|response| RoomMessage::Join {
            connection,
            buy_in,
            response,
        })
        .await
    }

    pub async fn start(&self, connection: ConnectionId) -> RoomResult<()> {
        self.request(|response| RoomMessage::Start {
            connection,
            response,
        })
        .await
    }

    pub async fn submit(
        &self,
        connection: ConnectionId,
        action: PlayerAction,
        amount: Chips,
    ) -> RoomResult<()> {
        self.request(|response| RoomMessage::Move {
            connection,
            action,
            amount,
            response,
        })
        .await
    }

    pub async fn request_state(&self, connection: ConnectionId) -> RoomResult<()> {
        self.request(|response| RoomMessage::GetState {
            connection,
            response,
        })
        .await
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> RoomResult<Departure> {
        self.request(|response| RoomMessage::Disconnect {
            connection,
            response,
        })
        .await
    }

    pub async fn summary(&self) -> RoomResult<RoomSummary> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Summary { response: tx }).await?;
        rx.await.map_err(|_| RoomError::RoomClosed)
    }
}

/// One attached client.
struct Connection {
    identity: Identity,
    seat: Option<SeatIndex>,
    outbound: mpsc::Sender<ServerMessage>,
}

/// Room actor managing a single table
pub struct RoomActor {
    /// Table state
    room: Room,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Attached connections and their outbound queues
    connections: HashMap<ConnectionId, Connection>,

    /// Set once the last connection is gone
    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor
    ///
    /// # Returns
    ///
    /// * `(RoomActor, RoomHandle)` - Actor and handle for sending messages
    pub fn new(room: Room) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = RoomHandle::new(sender, room.id().to_string());
        let actor = Self {
            room,
            inbox,
            connections: HashMap::new(),
            is_closed: false,
        };
        (actor, handle)
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        info!("Room {} starting", self.room.id());

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }

        // Anything that raced the shutdown is refused so callers can retry
        // against a fresh room.
        self.inbox.close();
        while let Some(message) = self.inbox.recv().await {
            message.reject(RoomError::RoomClosed);
        }

        info!("Room {} closed", self.room.id());
    }

    /// Handle a room message
    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Attach {
                connection,
                identity,
                outbound,
                response,
            } => {
                let result = self.handle_attach(connection, identity, outbound);
                let _ = response.send(result);
            }

            RoomMessage::Join {
                connection,
                buy_in,
                response,
            } => {
                let result = self.handle_join(connection, buy_in);
                self.log_rejection(connection, "join", &result);
                self.seal_if_closed();
                let _ = response.send(result);
            }

            RoomMessage::Start {
                connection,
                response,
            } => {
                let result = self.handle_start(connection);
                self.log_rejection(connection, "start", &result);
                self.seal_if_closed();
                let _ = response.send(result);
            }

            RoomMessage::Move {
                connection,
                action,
                amount,
                response,
            } => {
                let result = self.handle_move(connection, action, amount);
                self.log_rejection(connection, action.label(), &result);
                self.seal_if_closed();
                let _ = response.send(result);
            }

            RoomMessage::GetState {
                connection,
                response,
            } => {
                let result = self.handle_get_state(connection);
                self.seal_if_closed();
                let _ = response.send(result);
            }

            RoomMessage::Disconnect {
                connection,
                response,
            } => {
                let result = self.handle_disconnect(connection);
                self.seal_if_closed();
                let _ = response.send(result);
            }

            RoomMessage::Summary { response } => {
                let _ = response.send(self.summary());
            }
        }
    }

    /// Stop accepting messages before replying, so a caller told the room
    /// is empty never finds its handle still open.
    fn seal_if_closed(&mut self) {
        if self.is_closed {
            self.inbox.close();
        }
    }

    fn log_rejection<T>(&self, connection: ConnectionId, what: &str, result: &RoomResult<T>) {
        if let Err(e) = result {
            debug!(
                "Room {}: {} from connection {} rejected: {}",
                self.room.id(),
                what,
                connection,
                e
            );
        }
    }

    fn handle_attach(
        &mut self,
        connection: ConnectionId,
        identity: Identity,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> RoomResult<()> {
        // Leaves room for reconnects that race their old connection's
        // teardown.
        if self.connections.len() >= 2 * self.room.config().max_seats {
            return Err(RoomError::RoomFull);
        }
        debug!(
            "Room {}: connection {} attached for {}",
            self.room.id(),
            connection,
            identity.username
        );
        self.connections.insert(
            connection,
            Connection {
                identity,
                seat: None,
                outbound,
            },
        );
        Ok(())
    }

    fn seat_of(&self, connection: ConnectionId) -> RoomResult<SeatIndex> {
        self.connections
            .get(&connection)
            .ok_or(RoomError::UnknownConnection)?
            .seat
            .ok_or(RoomError::NotSeated)
    }

    fn handle_join(&mut self, connection: ConnectionId, buy_in: Option<Chips>) -> RoomResult<SeatIndex> {
        let conn = self
            .connections
            .get(&connection)
            .ok_or(RoomError::UnknownConnection)?;
        if conn.seat.is_some() {
            return Err(RoomError::AlreadySeated);
        }
        let identity = conn.identity.clone();
        let buy_in = buy_in.unwrap_or(self.room.config().default_buy_in);

        let outcome = self.room.join(identity, buy_in)?;
        if let Some(conn) = self.connections.get_mut(&connection) {
            conn.seat = Some(outcome.seat);
        }

        let players_count = self.room.connected_count();
        self.unicast(
            connection,
            ServerMessage::Joined {
                player_id: outcome.seat,
                players_count,
            },
        );
        if outcome.reclaimed && self.room.hand_in_progress() {
            let state = Box::new(self.room.snapshot(Some(outcome.seat)));
            self.unicast(connection, ServerMessage::State { state });
        }
        self.fan_out(Some(connection), |_, _| ServerMessage::PlayerJoined {
            player_id: outcome.seat,
            players_count,
        });
        Ok(outcome.seat)
    }

    fn handle_start(&mut self, connection: ConnectionId) -> RoomResult<()> {
        let seat = self.seat_of(connection)?;
        if self.room.host_seat() != Some(seat) {
            return Err(RoomError::NotHost);
        }
        let outcome = self.room.begin_hand()?;
        self.fan_out(None, |room, seat| ServerMessage::GameStarted {
            state: Box::new(room.snapshot(seat)),
        });
        if let ActionOutcome::Completed(_) = outcome {
            self.publish(outcome);
        }
        Ok(())
    }

    fn handle_move(
        &mut self,
        connection: ConnectionId,
        action: PlayerAction,
        amount: Chips,
    ) -> RoomResult<()> {
        let seat = self.seat_of(connection)?;
        let outcome = self.room.submit_action(seat, action, amount)?;
        self.publish(outcome);
        Ok(())
    }

    fn handle_get_state(&mut self, connection: ConnectionId) -> RoomResult<()> {
        let seat = self
            .connections
            .get(&connection)
            .ok_or(RoomError::UnknownConnection)?
            .seat;
        let state = Box::new(self.room.snapshot(seat));
        self.unicast(connection, ServerMessage::State { state });
        Ok(())
    }

    fn handle_disconnect(&mut self, connection: ConnectionId) -> RoomResult<Departure> {
        let conn = self
            .connections
            .remove(&connection)
            .ok_or(RoomError::UnknownConnection)?;
        debug!(
            "Room {}: connection {} for {} detached",
            self.room.id(),
            connection,
            conn.identity.username
        );
        self.release(conn.seat);

        if self.is_closed {
            Ok(Departure::RoomEmpty)
        } else {
            Ok(Departure::Remaining(self.room.connected_count()))
        }
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.room.id().to_string(),
            seats: self.room.seats().len(),
            connected_seats: self.room.connected_count(),
            connections: self.connections.len(),
            hand_number: self.room.hand_number(),
            hand_in_progress: self.room.hand_in_progress(),
        }
    }

    /// Broadcast the result of a hand mutation to everyone.
    fn publish(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Continued => self.fan_out(None, |room, seat| ServerMessage::Update {
                state: Box::new(room.snapshot(seat)),
            }),
            ActionOutcome::Completed(settlement) => {
                self.fan_out(None, move |room, seat| ServerMessage::HandComplete {
                    state: Box::new(room.snapshot(seat)),
                    result: settlement.clone(),
                })
            }
        }
    }

    /// Queue a message built for each recipient's own seat on every
    /// connection except `skip`. A connection whose queue is full or gone
    /// is dropped and its seat released.
    fn fan_out<F>(&mut self, skip: Option<ConnectionId>, build: F)
    where
        F: Fn(&Room, Option<SeatIndex>) -> ServerMessage,
    {
        let room = &self.room;
        let mut dropped = Vec::new();
        self.connections.retain(|id, conn| {
            if skip == Some(*id) {
                return true;
            }
            match conn.outbound.try_send(build(room, conn.seat)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Room {}: connection {} is not keeping up, dropping it",
                        room.id(),
                        id
                    );
                    dropped.push(conn.seat);
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Room {}: connection {} went away", room.id(), id);
                    dropped.push(conn.seat);
                    false
                }
            }
        });
        for seat in dropped {
            self.release(seat);
        }
    }

    fn unicast(&mut self, connection: ConnectionId, message: ServerMessage) {
        let Some(conn) = self.connections.get(&connection) else {
            return;
        };
        if conn.outbound.try_send(message).is_err() {
            warn!(
                "Room {}: connection {} is not keeping up, dropping it",
                self.room.id(),
                connection
            );
            if let Some(conn) = self.connections.remove(&connection) {
                self.release(conn.seat);
            }
        }
    }

    /// Free whatever a departed connection held, tell the others, and close
    /// the room once nobody is left.
    fn release(&mut self, seat: Option<SeatIndex>) {
        if let Some(seat) = seat {
            match self.room.leave(seat) {
                Ok(Some(outcome)) => self.publish(outcome),
                Ok(None) => {}
                Err(e) => error!("Room {}: releasing seat {} failed: {}", self.room.id(), seat, e),
            }
        }

        if self.connections.is_empty() {
            self.is_closed = true;
            return;
        }
        if seat.is_some() {
            let players_count = self.room.connected_count();
            self.fan_out(None, |_, _| ServerMessage::PlayerLeft { players_count });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{game::Phase, room::config::RoomConfig};
    use uuid::Uuid;

    fn spawn_room() -> RoomHandle {
        let (actor, handle) = RoomActor::new(Room::new("unit", RoomConfig::default()));
        tokio::spawn(actor.run());
        handle
    }

    async fn attach(
        handle: &RoomHandle,
        name: &str,
    ) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let connection = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(64);
        handle
            .attach(connection, Identity::new(name, name), tx)
            .await
            .expect("attach");
        (connection, rx)
    }

    #[tokio::test]
    async fn test_join_unicasts_and_broadcasts() {
        let handle = spawn_room();
        let (alice, mut alice_rx) = attach(&handle, "alice").await;
        let (bob, mut bob_rx) = attach(&handle, "bob").await;

        assert_eq!(handle.join(alice, None).await, Ok(0));
        assert_eq!(
            alice_rx.recv().await,
            Some(ServerMessage::Joined {
                player_id: 0,
                players_count: 1
            })
        );
        assert_eq!(
            bob_rx.recv().await,
            Some(ServerMessage::PlayerJoined {
                player_id: 0,
                players_count: 1
            })
        );

        assert_eq!(handle.join(bob, Some(500)).await, Ok(1));
        assert_eq!(handle.join(bob, Some(500)).await, Err(RoomError::AlreadySeated));
    }

    #[tokio::test]
    async fn test_only_host_starts() {
        let handle = spawn_room();
        let (alice, mut alice_rx) = attach(&handle, "alice").await;
        let (bob, _bob_rx) = attach(&handle, "bob").await;
        handle.join(alice, None).await.expect("join");
        handle.join(bob, None).await.expect("join");

        assert_eq!(handle.start(bob).await, Err(RoomError::NotHost));
        handle.start(alice).await.expect("start");

        // Skip joined + player_joined.
        alice_rx.recv().await;
        alice_rx.recv().await;
        match alice_rx.recv().await {
            Some(ServerMessage::GameStarted { state }) => {
                assert_eq!(state.phase, Phase::PreFlop);
                assert!(state.hole_cards.is_some());
            }
            other => panic!("expected game_started, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_move_from_unseated_connection() {
        let handle = spawn_room();
        let (watcher, _rx) = attach(&handle, "watcher").await;
        assert_eq!(
            handle.submit(watcher, PlayerAction::Check, 0).await,
            Err(RoomError::NotSeated)
        );
        assert_eq!(
            handle.submit(Uuid::new_v4(), PlayerAction::Check, 0).await,
            Err(RoomError::UnknownConnection)
        );
    }

    #[tokio::test]
    async fn test_last_disconnect_closes_room() {
        let handle = spawn_room();
        let (alice, _alice_rx) = attach(&handle, "alice").await;
        let (bob, mut bob_rx) = attach(&handle, "bob").await;
        handle.join(alice, None).await.expect("join");

        assert_eq!(handle.disconnect(alice).await, Ok(Departure::Remaining(0)));
        // player_joined, then player_left
        bob_rx.recv().await;
        assert_eq!(
            bob_rx.recv().await,
            Some(ServerMessage::PlayerLeft { players_count: 0 })
        );

        assert_eq!(handle.disconnect(bob).await, Ok(Departure::RoomEmpty));
        assert!(matches!(
            handle.summary().await,
            Err(RoomError::RoomClosed)
        ));
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_slow_consumer_is_dropped() {
        let handle = spawn_room();
        let (alice, _alice_rx) = attach(&handle, "alice").await;
        let slow = Uuid::new_v4();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        handle
            .attach(slow, Identity::new("slow", "slow"), slow_tx)
            .await
            .expect("attach");
        handle.join(slow, None).await.expect("join");
        handle.join(alice, None).await.expect("join");

        // The slow queue held "joined"; "player_joined" overflowed it.
        let summary = handle.summary().await.expect("summary");
        assert_eq!(summary.connections, 1);
        assert_eq!(summary.connected_seats, 1);
    }
}

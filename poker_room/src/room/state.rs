//! Cross-hand table state for one room.
//!
//! `Room` is plain synchronous state. Every mutation goes through `&mut
//! self`; the room actor owns the only instance, which is what serializes
//! concurrent players.

use log::{debug, info};
use std::sync::Arc;

use super::{
    config::RoomConfig,
    errors::{RoomError, RoomResult},
};
use crate::{
    auth::Identity,
    game::{
        Chips, Dealer, Hand, Phase, PlayerAction, PlayerView, PotSummary, SeatIndex, SeatStatus,
        Settlement, ShuffledDealer, TableSnapshot,
    },
};

/// Builds a fresh dealer for every hand.
pub type DealerFactory = Arc<dyn Fn() -> Box<dyn Dealer> + Send + Sync>;

pub fn shuffled_dealers() -> DealerFactory {
    Arc::new(|| -> Box<dyn Dealer> { Box::new(ShuffledDealer::new()) })
}

/// A chair at the table. Seats are never removed, so indices stay stable
/// and a returning player reclaims their chair and chips.
#[derive(Debug, Clone)]
pub struct Seat {
    pub index: SeatIndex,
    pub identity: Identity,
    pub stack: Chips,
    pub connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub seat: SeatIndex,
    /// A disconnected seat with the same identity was taken back.
    pub reclaimed: bool,
}

/// What a mutation did to the live hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Continued,
    Completed(Box<Settlement>),
}

pub struct Room {
    id: String,
    config: RoomConfig,
    seats: Vec<Seat>,
    hand: Option<Hand>,
    /// Result of the most recent finished hand, kept for snapshots.
    settlement: Option<Settlement>,
    hand_number: u64,
    last_small_blind: Option<SeatIndex>,
    dealers: DealerFactory,
}

impl Room {
    pub fn new(id: impl Into<String>, config: RoomConfig) -> Self {
        Self::with_dealers(id, config, shuffled_dealers())
    }

    pub fn with_dealers(id: impl Into<String>, config: RoomConfig, dealers: DealerFactory) -> Self {
        Self {
            id: id.into(),
            config,
            seats: Vec::new(),
            hand: None,
            settlement: None,
            hand_number: 0,
            last_small_blind: None,
            dealers,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn hand(&self) -> Option<&Hand> {
        self.hand.as_ref()
    }

    pub fn hand_in_progress(&self) -> bool {
        self.hand.as_ref().is_some_and(|hand| !hand.is_complete())
    }

    pub fn connected_count(&self) -> usize {
        self.seats.iter().filter(|s| s.connected).count()
    }

    /// Seat allowed to start hands: seat 0 while it is connected, otherwise
    /// the lowest connected seat.
    pub fn host_seat(&self) -> Option<SeatIndex> {
        self.seats.iter().find(|s| s.connected).map(|s| s.index)
    }

    /// Take a seat. A disconnected seat held by the same identity is
    /// reclaimed with its stack; otherwise the next index is assigned and
    /// `buy_in` becomes the stack.
    pub fn join(&mut self, identity: Identity, buy_in: Chips) -> RoomResult<JoinOutcome> {
        if let Some(seat) = self
            .seats
            .iter_mut()
            .find(|s| s.identity.user_id == identity.user_id)
        {
            if seat.connected {
                return Err(RoomError::AlreadySeated);
            }
            seat.connected = true;
            seat.identity = identity;
            info!(
                "Room {}: {} reclaimed seat {} with {} chips",
                self.id, seat.identity.username, seat.index, seat.stack
            );
            return Ok(JoinOutcome {
                seat: seat.index,
                reclaimed: true,
            });
        }

        if self.seats.len() >= self.config.max_seats {
            return Err(RoomError::RoomFull);
        }
        if !(self.config.min_buy_in..=self.config.max_buy_in).contains(&buy_in) {
            return Err(RoomError::InvalidBuyIn {
                min: self.config.min_buy_in,
                max: self.config.max_buy_in,
            });
        }

        let index = self.seats.len();
        info!(
            "Room {}: {} took seat {} with {} chips",
            self.id, identity.username, index, buy_in
        );
        self.seats.push(Seat {
            index,
            identity,
            stack: buy_in,
            connected: true,
        });
        Ok(JoinOutcome {
            seat: index,
            reclaimed: false,
        })
    }

    /// Mark a seat disconnected. If it was the seat to act, it folds now so
    /// the hand keeps moving.
    pub fn leave(&mut self, seat: SeatIndex) -> RoomResult<Option<ActionOutcome>> {
        let entry = self.seats.get_mut(seat).ok_or(RoomError::NotSeated)?;
        entry.connected = false;
        info!("Room {}: seat {} disconnected", self.id, seat);

        let acting = self
            .hand
            .as_ref()
            .is_some_and(|hand| hand.current_actor() == Some(seat));
        if !acting {
            return Ok(None);
        }
        self.fold_absent_actors()?;
        self.conclude().map(Some)
    }

    /// Deal the next hand to every connected seat with chips.
    pub fn begin_hand(&mut self) -> RoomResult<ActionOutcome> {
        if self.hand_in_progress() {
            return Err(RoomError::HandInProgress);
        }
        let participants: Vec<&Seat> = self
            .seats
            .iter()
            .filter(|s| s.connected && s.stack > 0)
            .collect();
        if participants.len() < 2 {
            return Err(RoomError::NotEnoughPlayers);
        }

        // The small blind moves one participant clockwise each hand.
        let small_blind = match self.last_small_blind {
            None => 0,
            Some(last) => participants
                .iter()
                .position(|s| s.index > last)
                .unwrap_or(0),
        };
        let mut order: Vec<SeatIndex> = participants.iter().map(|s| s.index).collect();
        order.rotate_left(small_blind);
        let stacks: Vec<Chips> = order.iter().map(|&i| self.seats[i].stack).collect();

        let hand = Hand::start(&order, &stacks, self.config.blinds(), (self.dealers)())?;
        self.hand_number += 1;
        self.last_small_blind = order.first().copied();
        self.settlement = None;
        self.hand = Some(hand);
        info!(
            "Room {}: hand #{} started, seats {:?}",
            self.id, self.hand_number, order
        );
        self.conclude()
    }

    pub fn submit_action(
        &mut self,
        seat: SeatIndex,
        action: PlayerAction,
        amount: Chips,
    ) -> RoomResult<ActionOutcome> {
        let hand = self.hand.as_mut().ok_or(RoomError::NoActiveHand)?;
        hand.apply_action(seat, action, amount)?;
        debug!(
            "Room {}: seat {} {} {}",
            self.id,
            seat,
            action.label(),
            amount
        );
        self.fold_absent_actors()?;
        self.conclude()
    }

    /// A disconnected seat can never act, so fold it whenever the action
    /// reaches it.
    fn fold_absent_actors(&mut self) -> RoomResult<()> {
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        while let Some(actor) = hand.current_actor() {
            if self.seats.get(actor).is_some_and(|s| s.connected) {
                break;
            }
            debug!("Room {}: folding absent seat {}", self.id, actor);
            hand.apply_action(actor, PlayerAction::Fold, 0)?;
        }
        Ok(())
    }

    /// Settle a finished hand once and write the stacks back to the seats.
    fn conclude(&mut self) -> RoomResult<ActionOutcome> {
        let Some(hand) = self.hand.as_ref() else {
            return Ok(ActionOutcome::Continued);
        };
        if !hand.is_complete() || self.settlement.is_some() {
            return Ok(ActionOutcome::Continued);
        }
        let settlement = hand.settle()?;
        for (&seat, &stack) in &settlement.stacks {
            if let Some(entry) = self.seats.get_mut(seat) {
                entry.stack = stack;
            }
        }
        info!(
            "Room {}: hand #{} complete. {}",
            self.id, self.hand_number, settlement.message
        );
        self.settlement = Some(settlement.clone());
        Ok(ActionOutcome::Completed(Box::new(settlement)))
    }

    /// Public table state, plus `viewer`'s own hole cards if `viewer` is a
    /// connected seat dealt into the current hand. Every seat is listed in
    /// seat order, dealt in or not.
    pub fn snapshot(&self, viewer: Option<SeatIndex>) -> TableSnapshot {
        let Some(hand) = self.hand.as_ref() else {
            return self.waiting_snapshot();
        };

        let complete = hand.is_complete();
        let players = self
            .seats
            .iter()
            .map(|seat| {
                let idle = idle_view(seat);
                let Some(hs) = hand.seat(seat.index) else {
                    return idle;
                };
                let stack = match &self.settlement {
                    Some(settlement) => settlement.stacks.get(&hs.seat).copied().unwrap_or(hs.stack),
                    None => hs.stack,
                };
                PlayerView {
                    stack,
                    active: hs.status != SeatStatus::Folded,
                    bet: hs.bet,
                    folded: hs.status == SeatStatus::Folded,
                    all_in: hs.status == SeatStatus::AllIn,
                    in_hand: true,
                    ..idle
                }
            })
            .collect();

        let hole_cards = viewer
            .filter(|&v| self.seats.get(v).is_some_and(|s| s.connected))
            .and_then(|v| hand.hole_cards(v));
        let pots = PotSummary::from_pots(hand.pots());

        TableSnapshot {
            hand_number: self.hand_number,
            phase: hand.phase(),
            pot: pots.total,
            pots,
            board_cards: hand.board().to_vec(),
            players,
            current_player: hand.current_actor(),
            min_raise: if complete { 0 } else { hand.min_raise_to() },
            active: !complete,
            last_action: hand.last_action(),
            hole_cards,
        }
    }

    fn waiting_snapshot(&self) -> TableSnapshot {
        let players = self.seats.iter().map(idle_view).collect();
        TableSnapshot {
            hand_number: self.hand_number,
            phase: Phase::Waiting,
            pot: 0,
            pots: PotSummary::default(),
            board_cards: Vec::new(),
            players,
            current_player: None,
            min_raise: 0,
            active: false,
            last_action: None,
            hole_cards: None,
        }
    }
}

/// A seat with no part in a live hand.
fn idle_view(seat: &Seat) -> PlayerView {
    PlayerView {
        id: seat.index,
        username: seat.identity.username.clone(),
        stack: seat.stack,
        active: false,
        bet: 0,
        folded: false,
        all_in: false,
        in_hand: false,
        connected: seat.connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Card, HandError, StackedDealer};

    fn card(code: &str) -> Card {
        code.parse().expect("valid card")
    }

    fn stacked_room() -> Room {
        let dealers: DealerFactory = Arc::new(|| -> Box<dyn Dealer> {
            Box::new(StackedDealer::new(
                vec![
                    [card("As"), card("Ah")],
                    [card("Kc"), card("Qd")],
                    [card("7c"), card("2d")],
                ],
                ["2c", "7d", "9h", "Js", "3s"].iter().map(|c| card(c)).collect(),
            ))
        });
        Room::with_dealers("test", RoomConfig::default(), dealers)
    }

    fn alice() -> Identity {
        Identity::new("1", "alice")
    }

    fn bob() -> Identity {
        Identity::new("2", "bob")
    }

    // === Join Tests ===

    #[test]
    fn test_join_assigns_sequential_seats() {
        let mut room = stacked_room();
        assert_eq!(room.join(alice(), 1000).expect("join").seat, 0);
        assert_eq!(room.join(bob(), 1000).expect("join").seat, 1);
        assert_eq!(room.connected_count(), 2);
        assert_eq!(room.host_seat(), Some(0));
    }

    #[test]
    fn test_join_rejects_when_full() {
        let config = RoomConfig {
            max_seats: 2,
            ..RoomConfig::default()
        };
        let mut room = Room::new("full", config);
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        assert_eq!(
            room.join(Identity::new("3", "carol"), 1000),
            Err(RoomError::RoomFull)
        );
    }

    #[test]
    fn test_departed_seats_stay_reserved_for_their_owner() {
        let config = RoomConfig {
            max_seats: 2,
            ..RoomConfig::default()
        };
        let mut room = Room::new("reserved", config);
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.leave(1).expect("leave");

        // Bob's chair is held for him, not handed to a newcomer.
        assert_eq!(
            room.join(Identity::new("3", "carol"), 1000),
            Err(RoomError::RoomFull)
        );
        assert_eq!(room.join(bob(), 1000).map(|o| o.seat), Ok(1));
    }

    #[test]
    fn test_join_rejects_bad_buy_in() {
        let mut room = stacked_room();
        assert!(matches!(
            room.join(alice(), 0),
            Err(RoomError::InvalidBuyIn { .. })
        ));
    }

    #[test]
    fn test_rejoin_reclaims_seat_and_stack() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 700).expect("join");
        assert_eq!(room.join(bob(), 1000), Err(RoomError::AlreadySeated));

        room.leave(1).expect("leave");
        assert_eq!(room.connected_count(), 1);
        let outcome = room.join(bob(), 5000).expect("rejoin");
        assert_eq!(outcome, JoinOutcome { seat: 1, reclaimed: true });
        assert_eq!(room.seats()[1].stack, 700);
    }

    // === Hand Lifecycle Tests ===

    #[test]
    fn test_begin_hand_requires_two_players() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        assert_eq!(room.begin_hand(), Err(RoomError::NotEnoughPlayers));
    }

    #[test]
    fn test_begin_hand_twice() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        assert_eq!(room.begin_hand(), Ok(ActionOutcome::Continued));
        assert_eq!(room.hand_number(), 1);
        assert_eq!(room.begin_hand(), Err(RoomError::HandInProgress));
    }

    #[test]
    fn test_submit_without_hand() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        assert_eq!(
            room.submit_action(0, PlayerAction::Check, 0),
            Err(RoomError::NoActiveHand)
        );
    }

    #[test]
    fn test_completed_hand_reconciles_stacks() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.begin_hand().expect("start");

        let outcome = room.submit_action(0, PlayerAction::Fold, 0).expect("fold");
        let ActionOutcome::Completed(settlement) = outcome else {
            panic!("hand should be complete");
        };
        assert_eq!(settlement.winners, vec![1]);
        assert_eq!(room.seats()[0].stack, 950);
        assert_eq!(room.seats()[1].stack, 1050);
        assert!(!room.hand_in_progress());
    }

    #[test]
    fn test_small_blind_rotates() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.join(Identity::new("3", "carol"), 1000).expect("join");

        room.begin_hand().expect("hand 1");
        assert_eq!(room.hand().map(|h| h.seats()[0].seat), Some(0));
        while let Some(actor) = room.hand().and_then(|h| h.current_actor()) {
            room.submit_action(actor, PlayerAction::Fold, 0).expect("fold");
        }

        room.begin_hand().expect("hand 2");
        assert_eq!(room.hand_number(), 2);
        assert_eq!(room.hand().map(|h| h.seats()[0].seat), Some(1));
    }

    #[test]
    fn test_busted_seat_sits_out() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.seats[1].stack = 0;
        assert_eq!(room.begin_hand(), Err(RoomError::NotEnoughPlayers));
    }

    #[test]
    fn test_oversized_table_refuses_to_deal_and_stays_usable() {
        let config = RoomConfig {
            max_buy_in: Chips::MAX,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());

        let mut room = Room::new("huge", config);
        room.join(alice(), 3_000_000_000).expect("join");
        room.join(bob(), 3_000_000_000).expect("join");
        assert!(matches!(
            room.begin_hand(),
            Err(RoomError::Hand(HandError::InvalidConfiguration(_)))
        ));
        assert!(!room.hand_in_progress());
        assert_eq!(room.hand_number(), 0);
        assert_eq!(room.snapshot(Some(0)).phase, Phase::Waiting);
    }

    // === Disconnect Tests ===

    #[test]
    fn test_leave_on_turn_auto_folds() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.begin_hand().expect("start");
        assert_eq!(room.hand().and_then(|h| h.current_actor()), Some(0));

        let outcome = room.leave(0).expect("leave");
        assert!(matches!(outcome, Some(ActionOutcome::Completed(_))));
        assert_eq!(room.seats()[1].stack, 1050);
    }

    #[test]
    fn test_absent_seat_folded_when_action_reaches_it() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.begin_hand().expect("start");

        // Bob is not on the clock, so leaving changes nothing yet.
        assert_eq!(room.leave(1), Ok(None));
        let outcome = room.submit_action(0, PlayerAction::Call, 0).expect("call");
        assert!(matches!(outcome, ActionOutcome::Completed(_)));
        assert_eq!(room.seats()[0].stack, 1100);
    }

    // === Snapshot Tests ===

    #[test]
    fn test_snapshot_shows_only_viewer_hole_cards() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.begin_hand().expect("start");

        let mine = room.snapshot(Some(0));
        assert_eq!(mine.hole_cards, Some([card("As"), card("Ah")]));
        let theirs = room.snapshot(Some(1));
        assert_eq!(theirs.hole_cards, Some([card("Kc"), card("Qd")]));
        assert_eq!(room.snapshot(None).hole_cards, None);

        let json = serde_json::to_string(&theirs).expect("serialize");
        assert!(!json.contains("\"As\""));
        assert!(!json.contains("\"Ah\""));
    }

    #[test]
    fn test_snapshot_hides_cards_from_disconnected_viewer() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.begin_hand().expect("start");
        room.leave(1).expect("leave");
        assert_eq!(room.snapshot(Some(1)).hole_cards, None);
    }

    #[test]
    fn test_waiting_snapshot() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        let snapshot = room.snapshot(Some(0));
        assert_eq!(snapshot.phase, Phase::Waiting);
        assert_eq!(snapshot.players.len(), 1);
        assert!(!snapshot.active);
        assert_eq!(snapshot.hole_cards, None);
    }

    #[test]
    fn test_snapshot_lists_every_seat_in_seat_order() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.join(Identity::new("3", "carol"), 1000).expect("join");
        room.begin_hand().expect("hand 1");
        while let Some(actor) = room.hand().and_then(|h| h.current_actor()) {
            room.submit_action(actor, PlayerAction::Fold, 0).expect("fold");
        }

        // Hand 2 is dealt from seat 1, and dave arrives while it is live.
        room.begin_hand().expect("hand 2");
        room.join(Identity::new("4", "dave"), 800).expect("join");
        let snapshot = room.snapshot(None);
        let ids: Vec<SeatIndex> = snapshot.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        let dave = &snapshot.players[3];
        assert!(!dave.in_hand);
        assert!(!dave.active);
        assert_eq!(dave.stack, 800);
        assert_eq!(dave.bet, 0);
        assert!(snapshot.players[..3].iter().all(|p| p.in_hand));
        // Seat 1 posted the small blind, seat 2 the big blind.
        assert_eq!(snapshot.players[1].bet, 50);
        assert_eq!(snapshot.players[2].bet, 100);
    }

    #[test]
    fn test_live_snapshot_fields() {
        let mut room = stacked_room();
        room.join(alice(), 1000).expect("join");
        room.join(bob(), 1000).expect("join");
        room.begin_hand().expect("start");
        let snapshot = room.snapshot(None);
        assert_eq!(snapshot.hand_number, 1);
        assert_eq!(snapshot.phase, Phase::PreFlop);
        assert_eq!(snapshot.pot, 150);
        assert_eq!(snapshot.current_player, Some(0));
        assert_eq!(snapshot.min_raise, 200);
        assert!(snapshot.active);
        assert_eq!(snapshot.players[1].bet, 100);
    }
}

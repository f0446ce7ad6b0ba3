//! A single No-Limit Hold'em hand, from blinds to settlement.
//!
//! Participants are given in position order: position 0 posts the small
//! blind, position 1 the big blind. Heads-up, the small blind is also the
//! button, so it acts first pre-flop and last afterwards.

use log::debug;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{
    dealer::Dealer,
    entities::{ActionKind, Blinds, Card, Chips, LastAction, Phase, PlayerAction, SeatIndex, SeatStatus},
    errors::{HandError, HandResult},
    pot::{self, Contribution, Pot},
    views::{PotAward, Settlement},
};

/// Cards a hand can consume: two per player, five board cards, three burns.
const BOARD_AND_BURNS: usize = 8;
const DECK_SIZE: usize = 52;

/// Most participants a single deck supports.
pub const MAX_PARTICIPANTS: usize = (DECK_SIZE - BOARD_AND_BURNS) / 2;

/// Per-participant state within a hand.
#[derive(Clone, Debug)]
pub struct HandSeat {
    pub seat: SeatIndex,
    pub hole_cards: [Card; 2],
    pub stack: Chips,
    /// Chips put in on the current street.
    pub bet: Chips,
    /// Chips put in over the whole hand, current street included.
    pub contributed: Chips,
    pub status: SeatStatus,
    acted: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Termination {
    Showdown,
    Uncontested(SeatIndex),
}

pub struct Hand {
    blinds: Blinds,
    phase: Phase,
    board: Vec<Card>,
    seats: Vec<HandSeat>,
    /// Position of the seat expected to act.
    actor: Option<usize>,
    current_bet: Chips,
    /// Size of the last full bet or raise on this street.
    last_raise: Chips,
    last_action: Option<LastAction>,
    termination: Option<Termination>,
    /// Board cards drawn at the deal, revealed street by street.
    upcoming: VecDeque<Card>,
    dealer: Box<dyn Dealer>,
}

impl std::fmt::Debug for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hand")
            .field("phase", &self.phase)
            .field("board", &self.board)
            .field("actor", &self.actor)
            .field("current_bet", &self.current_bet)
            .field("termination", &self.termination)
            .finish_non_exhaustive()
    }
}

impl Hand {
    /// Deal a new hand: post blinds, deal hole cards, and find the first
    /// actor. A hand where nobody can act runs straight out to showdown.
    ///
    /// The whole board is drawn here, so a short deck fails the deal
    /// instead of a later street. The chips at the table must fit in
    /// [`Chips`]; every pot, payout and stack is bounded by that total.
    pub fn start(
        seats: &[SeatIndex],
        stacks: &[Chips],
        blinds: Blinds,
        mut dealer: Box<dyn Dealer>,
    ) -> HandResult<Self> {
        if seats.len() < 2 {
            return Err(HandError::InvalidConfiguration(
                "at least two seats are required".to_string(),
            ));
        }
        if seats.len() > MAX_PARTICIPANTS {
            return Err(HandError::InvalidConfiguration(format!(
                "at most {MAX_PARTICIPANTS} seats can be dealt in"
            )));
        }
        if seats.len() != stacks.len() {
            return Err(HandError::InvalidConfiguration(
                "every seat needs exactly one stack".to_string(),
            ));
        }
        if seats.iter().collect::<BTreeSet<_>>().len() != seats.len() {
            return Err(HandError::InvalidConfiguration(
                "duplicate seat index".to_string(),
            ));
        }
        if stacks.contains(&0) {
            return Err(HandError::InvalidConfiguration(
                "every stack must be positive".to_string(),
            ));
        }
        let total: u64 = stacks.iter().map(|&stack| u64::from(stack)).sum();
        if total > u64::from(Chips::MAX) {
            return Err(HandError::InvalidConfiguration(format!(
                "{total} chips at the table exceed the limit of {}",
                Chips::MAX
            )));
        }
        if blinds.small == 0 || blinds.small > blinds.big {
            return Err(HandError::InvalidConfiguration(format!(
                "invalid blinds {}/{}",
                blinds.small, blinds.big
            )));
        }

        let hole_cards = dealer.deal_hole_cards(seats.len());
        if hole_cards.len() != seats.len() {
            return Err(HandError::DeckExhausted);
        }
        let mut upcoming = VecDeque::with_capacity(5);
        for count in [3, 1, 1] {
            let street = dealer.deal_board(count);
            if street.len() != count {
                return Err(HandError::DeckExhausted);
            }
            upcoming.extend(street);
        }

        let seats = seats
            .iter()
            .zip(stacks)
            .zip(hole_cards)
            .map(|((&seat, &stack), hole_cards)| HandSeat {
                seat,
                hole_cards,
                stack,
                bet: 0,
                contributed: 0,
                status: SeatStatus::Active,
                acted: false,
            })
            .collect();

        let mut hand = Self {
            blinds,
            phase: Phase::PreFlop,
            board: Vec::with_capacity(5),
            seats,
            actor: None,
            current_bet: 0,
            last_raise: blinds.big,
            last_action: None,
            termination: None,
            upcoming,
            dealer,
        };
        hand.commit(0, blinds.small);
        hand.commit(1, blinds.big);
        hand.current_bet = hand.seats.iter().map(|s| s.bet).max().unwrap_or(0);

        let first = if hand.seats.len() == 2 { 0 } else { 2 };
        match hand.find_actor(first) {
            Some(pos) => hand.actor = Some(pos),
            None => hand.close_round(),
        }
        debug!(
            "hand started with {} seats, first actor {:?}",
            hand.seats.len(),
            hand.current_actor()
        );
        Ok(hand)
    }

    /// Apply one move from `seat`.
    ///
    /// `amount` is only read for bets and raises and is the raise-to total
    /// for the street. All validation happens before any state changes.
    pub fn apply_action(
        &mut self,
        seat: SeatIndex,
        action: PlayerAction,
        amount: Chips,
    ) -> HandResult<()> {
        let pos = self.actor.ok_or(HandError::HandAlreadyComplete)?;
        if self.seats[pos].seat != seat {
            return Err(HandError::NotYourTurn);
        }

        match action {
            PlayerAction::Fold => {
                let player = &mut self.seats[pos];
                player.status = SeatStatus::Folded;
                player.acted = true;
                self.last_action = Some(LastAction {
                    kind: ActionKind::Fold,
                    actor: seat,
                    amount: None,
                });
            }
            PlayerAction::Check | PlayerAction::Call => self.check_or_call(pos),
            PlayerAction::Bet | PlayerAction::Raise => {
                if amount == 0 {
                    return Err(HandError::InvalidAmount);
                }
                let player = &self.seats[pos];
                let all_in_to = player.bet + player.stack;
                let target = amount.min(all_in_to);
                let is_all_in = target == all_in_to;
                if target <= self.current_bet {
                    if !is_all_in {
                        return Err(HandError::BelowMinimumRaise {
                            minimum: self.min_raise_to(),
                        });
                    }
                    // All-in for no more than the current bet is a call.
                    self.check_or_call(pos);
                } else {
                    if target < self.min_raise_to() && !is_all_in {
                        return Err(HandError::BelowMinimumRaise {
                            minimum: self.min_raise_to(),
                        });
                    }
                    self.raise_to(pos, target);
                }
            }
        }

        self.advance(pos);
        Ok(())
    }

    fn check_or_call(&mut self, pos: usize) {
        let owed = self.current_bet.saturating_sub(self.seats[pos].bet);
        let paid = owed.min(self.seats[pos].stack);
        self.commit(pos, paid);
        self.seats[pos].acted = true;
        self.last_action = Some(LastAction {
            kind: ActionKind::CheckCall,
            actor: self.seats[pos].seat,
            amount: Some(paid),
        });
    }

    fn raise_to(&mut self, pos: usize, target: Chips) {
        let owed = target - self.seats[pos].bet;
        self.commit(pos, owed);
        let raise = target - self.current_bet;
        // Short all-ins do not reopen the minimum.
        if raise >= self.last_raise {
            self.last_raise = raise;
        }
        self.current_bet = target;
        for (i, other) in self.seats.iter_mut().enumerate() {
            if i != pos && other.status == SeatStatus::Active {
                other.acted = false;
            }
        }
        self.seats[pos].acted = true;
        self.last_action = Some(LastAction {
            kind: ActionKind::BetRaise,
            actor: self.seats[pos].seat,
            amount: Some(target),
        });
    }

    fn commit(&mut self, pos: usize, amount: Chips) {
        let player = &mut self.seats[pos];
        let amount = amount.min(player.stack);
        player.stack -= amount;
        player.bet += amount;
        player.contributed += amount;
        if player.stack == 0 && player.status == SeatStatus::Active {
            player.status = SeatStatus::AllIn;
        }
    }

    fn able_to_act(&self) -> usize {
        self.seats
            .iter()
            .filter(|s| s.status == SeatStatus::Active)
            .count()
    }

    fn contesting(&self) -> impl Iterator<Item = &HandSeat> {
        self.seats.iter().filter(|s| s.status != SeatStatus::Folded)
    }

    fn needs_action(&self, pos: usize) -> bool {
        let player = &self.seats[pos];
        if player.status != SeatStatus::Active {
            return false;
        }
        if player.bet < self.current_bet {
            return true;
        }
        // A lone seat with chips has nobody left to bet against.
        !player.acted && self.able_to_act() > 1
    }

    fn find_actor(&self, from: usize) -> Option<usize> {
        let n = self.seats.len();
        (0..n).map(|i| (from + i) % n).find(|&pos| self.needs_action(pos))
    }

    fn advance(&mut self, from: usize) {
        let contesting: Vec<SeatIndex> = self.contesting().map(|s| s.seat).collect();
        if let [survivor] = contesting[..] {
            self.return_uncalled();
            self.actor = None;
            self.termination = Some(Termination::Uncontested(survivor));
            debug!("hand ended uncontested, seat {survivor} wins");
            return;
        }
        match self.find_actor((from + 1) % self.seats.len()) {
            Some(pos) => self.actor = Some(pos),
            None => self.close_round(),
        }
    }

    /// Give back the part of the top bet nobody matched.
    fn return_uncalled(&mut self) {
        let Some((top, top_bet)) = self
            .seats
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| s.bet)
            .map(|(i, s)| (i, s.bet))
        else {
            return;
        };
        let matched = self
            .seats
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != top)
            .map(|(_, s)| s.bet)
            .max()
            .unwrap_or(0);
        if top_bet > matched {
            let refund = top_bet - matched;
            let player = &mut self.seats[top];
            player.stack += refund;
            player.bet -= refund;
            player.contributed -= refund;
            if player.status == SeatStatus::AllIn {
                player.status = SeatStatus::Active;
            }
            debug!("returned {refund} uncalled chips to seat {}", player.seat);
        }
    }

    /// Finish the street and deal the next one. Streets where fewer than
    /// two seats can act are dealt without betting.
    fn close_round(&mut self) {
        self.return_uncalled();
        self.actor = None;
        loop {
            for player in &mut self.seats {
                player.bet = 0;
                player.acted = false;
            }
            self.current_bet = 0;
            self.last_raise = self.blinds.big;

            let (next, count) = match self.phase {
                Phase::PreFlop => (Phase::Flop, 3),
                Phase::Flop => (Phase::Turn, 1),
                Phase::Turn => (Phase::River, 1),
                Phase::River => {
                    self.phase = Phase::Showdown;
                    self.termination = Some(Termination::Showdown);
                    return;
                }
                Phase::Waiting | Phase::Showdown => return,
            };
            let count = count.min(self.upcoming.len());
            self.board.extend(self.upcoming.drain(..count));
            self.phase = next;

            let first = if self.seats.len() == 2 { 1 } else { 0 };
            if let Some(pos) = self.find_actor(first) {
                self.actor = Some(pos);
                return;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.termination.is_some()
    }

    pub fn current_actor(&self) -> Option<SeatIndex> {
        self.actor.map(|pos| self.seats[pos].seat)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn blinds(&self) -> Blinds {
        self.blinds
    }

    pub fn seats(&self) -> &[HandSeat] {
        &self.seats
    }

    pub fn seat(&self, seat: SeatIndex) -> Option<&HandSeat> {
        self.seats.iter().find(|s| s.seat == seat)
    }

    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    pub fn last_action(&self) -> Option<LastAction> {
        self.last_action
    }

    /// Smallest legal raise-to total for the current street.
    pub fn min_raise_to(&self) -> Chips {
        self.current_bet + self.last_raise
    }

    pub fn hole_cards(&self, seat: SeatIndex) -> Option<[Card; 2]> {
        self.seat(seat).map(|s| s.hole_cards)
    }

    /// Chips in stacks plus chips committed. Constant for the life of a
    /// hand.
    pub fn chips_in_play(&self) -> Chips {
        self.seats.iter().map(|s| s.stack + s.contributed).sum()
    }

    pub fn pots(&self) -> Vec<Pot> {
        let contributions: Vec<Contribution> = self
            .seats
            .iter()
            .map(|s| Contribution {
                seat: s.seat,
                amount: s.contributed,
                folded: s.status == SeatStatus::Folded,
            })
            .collect();
        pot::build_pots(&contributions)
    }

    /// Work out who wins what. Read-only: the caller applies the returned
    /// stacks.
    pub fn settle(&self) -> HandResult<Settlement> {
        let termination = self.termination.ok_or(HandError::NotComplete)?;
        let pots = self.pots();

        let mut hands = BTreeMap::new();
        let mut awards = Vec::with_capacity(pots.len());
        match termination {
            Termination::Uncontested(survivor) => {
                for pot in pots {
                    awards.push(PotAward {
                        amount: pot.amount,
                        eligible: pot.eligible,
                        winners: BTreeSet::from([survivor]),
                    });
                }
            }
            Termination::Showdown => {
                let contenders: Vec<(SeatIndex, [Card; 2])> =
                    self.contesting().map(|s| (s.seat, s.hole_cards)).collect();
                let ranked = self.dealer.rank(&contenders, &self.board);
                let strengths: BTreeMap<SeatIndex, _> = ranked
                    .iter()
                    .map(|r| (r.seat, &r.strength))
                    .collect();
                for pot in pots {
                    let best = pot
                        .eligible
                        .iter()
                        .filter_map(|seat| strengths.get(seat))
                        .max()
                        .copied();
                    let winners = pot
                        .eligible
                        .iter()
                        .copied()
                        .filter(|seat| best.is_some() && strengths.get(seat).copied() == best)
                        .collect();
                    awards.push(PotAward {
                        amount: pot.amount,
                        eligible: pot.eligible,
                        winners,
                    });
                }
                hands = ranked.into_iter().map(|r| (r.seat, r.description)).collect();
            }
        }

        let mut pot_distribution: BTreeMap<SeatIndex, Chips> = BTreeMap::new();
        for award in &awards {
            for (seat, share) in pot::split(award.amount, &award.winners) {
                *pot_distribution.entry(seat).or_default() += share;
            }
        }
        let stacks = self
            .seats
            .iter()
            .map(|s| {
                let payout = pot_distribution.get(&s.seat).copied().unwrap_or(0);
                (s.seat, s.stack + payout)
            })
            .collect();
        let winners: Vec<SeatIndex> = pot_distribution
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(seat, _)| *seat)
            .collect();

        let message = match termination {
            Termination::Uncontested(survivor) => {
                format!("Player {survivor} wins uncontested")
            }
            Termination::Showdown => {
                let names: Vec<String> = winners
                    .iter()
                    .map(|seat| match hands.get(seat) {
                        Some(hand) => format!("Player {seat} ({hand})"),
                        None => format!("Player {seat}"),
                    })
                    .collect();
                format!("Winner(s): {}", names.join(", "))
            }
        };

        Ok(Settlement {
            winners,
            hands,
            pot_distribution,
            pots: awards,
            stacks,
            message,
        })
    }
}

//! Serializable views of a table handed to clients.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{
    entities::{Card, Chips, LastAction, Phase, SeatIndex},
    pot::Pot,
};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PotSummary {
    pub total: Chips,
    pub main: Chips,
    /// Sum of every side pot.
    pub side: Chips,
    pub breakdown: Vec<Pot>,
}

impl PotSummary {
    pub fn from_pots(pots: Vec<Pot>) -> Self {
        let total = pots.iter().map(|p| p.amount).sum();
        let main = pots.first().map_or(0, |p| p.amount);
        Self {
            total,
            main,
            side: total - main,
            breakdown: pots,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: SeatIndex,
    pub username: String,
    pub stack: Chips,
    /// Still contesting the pot (not folded).
    pub active: bool,
    pub bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    /// Dealt into the current hand. Seats that joined mid-hand or sat out
    /// are listed with this unset.
    pub in_hand: bool,
    pub connected: bool,
}

/// Publicly observable table state, plus the viewer's own hole cards.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub hand_number: u64,
    pub phase: Phase,
    pub pot: Chips,
    pub pots: PotSummary,
    pub board_cards: Vec<Card>,
    pub players: Vec<PlayerView>,
    pub current_player: Option<SeatIndex>,
    pub min_raise: Chips,
    /// Whether a hand is still being played.
    pub active: bool,
    pub last_action: Option<LastAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<[Card; 2]>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PotAward {
    pub amount: Chips,
    pub eligible: BTreeSet<SeatIndex>,
    pub winners: BTreeSet<SeatIndex>,
}

/// Outcome of a finished hand.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Settlement {
    pub winners: Vec<SeatIndex>,
    /// Hand descriptions, only present when the hand reached showdown.
    pub hands: BTreeMap<SeatIndex, String>,
    pub pot_distribution: BTreeMap<SeatIndex, Chips>,
    pub pots: Vec<PotAward>,
    /// Final stacks after payouts.
    pub stacks: BTreeMap<SeatIndex, Chips>,
    pub message: String,
}

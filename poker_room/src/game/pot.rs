//! Main pot and side pots.
//!
//! Pots are layered by contribution level. Each level is capped by a
//! contesting seat's total contribution; every seat pays into a layer up
//! to that cap, and only non-folded seats that reached it are eligible.

use serde::Serialize;
use std::collections::BTreeSet;

use super::entities::{Chips, SeatIndex};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: BTreeSet<SeatIndex>,
}

/// One seat's total chips committed this hand.
#[derive(Clone, Copy, Debug)]
pub struct Contribution {
    pub seat: SeatIndex,
    pub amount: Chips,
    pub folded: bool,
}

/// Build the main pot followed by side pots, smallest cap first.
///
/// Chips a folded seat put in above the highest contesting level go to the
/// last pot, so the pots always add up to the total contributed.
pub fn build_pots(contributions: &[Contribution]) -> Vec<Pot> {
    let mut levels: Vec<Chips> = contributions
        .iter()
        .filter(|c| !c.folded && c.amount > 0)
        .map(|c| c.amount)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
    let mut floor: Chips = 0;
    for level in levels {
        let amount = contributions
            .iter()
            .map(|c| c.amount.min(level) - c.amount.min(floor))
            .sum();
        let eligible = contributions
            .iter()
            .filter(|c| !c.folded && c.amount >= level)
            .map(|c| c.seat)
            .collect();
        pots.push(Pot { amount, eligible });
        floor = level;
    }

    let excess: Chips = contributions
        .iter()
        .map(|c| c.amount - c.amount.min(floor))
        .sum();
    if excess > 0 {
        match pots.last_mut() {
            Some(pot) => pot.amount += excess,
            None => pots.push(Pot {
                amount: excess,
                eligible: BTreeSet::new(),
            }),
        }
    }
    pots
}

/// Split `amount` evenly among `winners`. Leftover chips go one apiece to
/// the winners with the lowest seat indices.
pub fn split(amount: Chips, winners: &BTreeSet<SeatIndex>) -> Vec<(SeatIndex, Chips)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let count = winners.len() as Chips;
    let share = amount / count;
    let remainder = (amount % count) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(i, &seat)| (seat, share + Chips::from(i < remainder)))
        .collect()
}

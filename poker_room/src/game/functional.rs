//! Hand evaluation.
//!
//! `eval` takes any number of cards (normally two hole cards plus the
//! board) and returns the best five-card hand as a [`SubHand`]. `SubHand`s
//! order by rank first and then by tie-break values, so comparing two of
//! them compares the hands.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use super::entities::{ACE, Card, Suit, Value};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// Best five-card hand: its rank and the values that break ties within
/// that rank, most significant first.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubHand {
    pub rank: Rank,
    pub values: Vec<Value>,
}

impl SubHand {
    /// Human-readable summary such as "full house, kings over fours".
    pub fn describe(&self) -> String {
        let first = self.values.first().copied().unwrap_or(0);
        let second = self.values.get(1).copied().unwrap_or(0);
        match self.rank {
            Rank::HighCard => format!("high card, {}", value_name(first)),
            Rank::OnePair => format!("pair of {}", value_plural(first)),
            Rank::TwoPair => format!(
                "two pair, {} and {}",
                value_plural(first),
                value_plural(second)
            ),
            Rank::ThreeOfAKind => format!("three of a kind, {}", value_plural(first)),
            Rank::Straight => format!("straight, {} high", value_name(first)),
            Rank::Flush => format!("flush, {} high", value_name(first)),
            Rank::FullHouse => format!(
                "full house, {} over {}",
                value_plural(first),
                value_plural(second)
            ),
            Rank::FourOfAKind => format!("four of a kind, {}", value_plural(first)),
            Rank::StraightFlush if first == ACE => "royal flush".to_string(),
            Rank::StraightFlush => format!("straight flush, {} high", value_name(first)),
        }
    }
}

fn value_name(value: Value) -> &'static str {
    match value {
        2 => "deuce",
        3 => "three",
        4 => "four",
        5 => "five",
        6 => "six",
        7 => "seven",
        8 => "eight",
        9 => "nine",
        10 => "ten",
        11 => "jack",
        12 => "queen",
        13 => "king",
        14 => "ace",
        _ => "unknown",
    }
}

fn value_plural(value: Value) -> String {
    match value {
        6 => "sixes".to_string(),
        v => format!("{}s", value_name(v)),
    }
}

/// Highest card of a five-long run within `values` (sorted descending,
/// deduplicated). The ace also plays low in the wheel.
fn straight_high(values: &[Value]) -> Option<Value> {
    let has = |v: Value| values.contains(&v) || (v == 1 && values.contains(&ACE));
    (5..=ACE)
        .rev()
        .find(|&high| (high - 4..=high).all(|v| has(v)))
}

/// Evaluate the best five-card hand available within `cards`.
///
/// Fewer than five cards are allowed; the hand is then judged on what is
/// there, which only matters for partial boards.
pub fn eval(cards: &[Card]) -> SubHand {
    let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
    let mut suits: BTreeMap<Suit, Vec<Value>> = BTreeMap::new();
    for card in cards {
        *counts.entry(card.0).or_default() += 1;
        suits.entry(card.1).or_default().push(card.0);
    }

    let distinct: Vec<Value> = counts.keys().rev().copied().collect();

    let flush = suits.into_values().find(|values| values.len() >= 5).map(|mut values| {
        values.sort_unstable_by(|a, b| b.cmp(a));
        values
    });

    if let Some(high) = flush.as_deref().and_then(straight_high) {
        return SubHand {
            rank: Rank::StraightFlush,
            values: vec![high],
        };
    }

    // Groups ordered by (count, value), biggest first.
    let mut groups: Vec<(usize, Value)> = counts.iter().map(|(&v, &c)| (c, v)).collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let kickers = |exclude: &[Value], n: usize| -> Vec<Value> {
        distinct
            .iter()
            .copied()
            .filter(|v| !exclude.contains(v))
            .take(n)
            .collect()
    };

    if let Some(&(4, quad)) = groups.first() {
        let mut values = vec![quad];
        values.extend(kickers(&[quad], 1));
        return SubHand {
            rank: Rank::FourOfAKind,
            values,
        };
    }

    if let Some(&(3, trips)) = groups.first() {
        let pair = groups[1..]
            .iter()
            .filter(|(count, _)| *count >= 2)
            .map(|(_, value)| *value)
            .max();
        if let Some(pair) = pair {
            return SubHand {
                rank: Rank::FullHouse,
                values: vec![trips, pair],
            };
        }
    }

    if let Some(values) = flush {
        return SubHand {
            rank: Rank::Flush,
            values: values.into_iter().take(5).collect(),
        };
    }

    if let Some(high) = straight_high(&distinct) {
        return SubHand {
            rank: Rank::Straight,
            values: vec![high],
        };
    }

    match groups.as_slice() {
        [(3, trips), ..] => {
            let mut values = vec![*trips];
            values.extend(kickers(&[*trips], 2));
            SubHand {
                rank: Rank::ThreeOfAKind,
                values,
            }
        }
        [(2, high), (2, low), ..] => {
            let mut values = vec![*high, *low];
            values.extend(kickers(&[*high, *low], 1));
            SubHand {
                rank: Rank::TwoPair,
                values,
            }
        }
        [(2, pair), ..] => {
            let mut values = vec![*pair];
            values.extend(kickers(&[*pair], 3));
            SubHand {
                rank: Rank::OnePair,
                values,
            }
        }
        _ => SubHand {
            rank: Rank::HighCard,
            values: kickers(&[], 5),
        },
    }
}

/// Indices of every hand tied for best.
pub fn argmax(hands: &[SubHand]) -> Vec<usize> {
    let mut best: Vec<usize> = Vec::new();
    for (idx, hand) in hands.iter().enumerate() {
        match best.first().map(|&b| hand.cmp(&hands[b])) {
            None | Some(Ordering::Greater) => best = vec![idx],
            Some(Ordering::Equal) => best.push(idx),
            Some(Ordering::Less) => {}
        }
    }
    best
}

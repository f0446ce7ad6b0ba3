//! Card dealing and hand ranking behind one seam, so the hand engine never
//! touches a deck directly and tests can stack the cards.

use std::collections::VecDeque;

use super::{
    entities::{Card, Deck, SeatIndex},
    functional::{self, SubHand},
};

/// A contender's best hand at showdown.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RankedHand {
    pub seat: SeatIndex,
    pub strength: SubHand,
    pub description: String,
}

pub trait Dealer: Send {
    /// Deal two hole cards to each of `players` players, in position order.
    fn deal_hole_cards(&mut self, players: usize) -> Vec<[Card; 2]>;

    /// Deal `count` community cards for the next street.
    fn deal_board(&mut self, count: usize) -> Vec<Card>;

    /// Rank each contender's best five cards out of hole cards plus board.
    fn rank(&self, contenders: &[(SeatIndex, [Card; 2])], board: &[Card]) -> Vec<RankedHand> {
        contenders
            .iter()
            .map(|(seat, hole)| {
                let mut cards = hole.to_vec();
                cards.extend_from_slice(board);
                let strength = functional::eval(&cards);
                RankedHand {
                    seat: *seat,
                    description: strength.describe(),
                    strength,
                }
            })
            .collect()
    }
}

/// Deals from a freshly shuffled 52-card deck, burning one card before
/// each street.
#[derive(Debug)]
pub struct ShuffledDealer {
    deck: Deck,
}

impl ShuffledDealer {
    pub fn new() -> Self {
        let mut deck = Deck::default();
        deck.shuffle();
        Self { deck }
    }
}

impl Default for ShuffledDealer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dealer for ShuffledDealer {
    fn deal_hole_cards(&mut self, players: usize) -> Vec<[Card; 2]> {
        let first: Vec<Card> = (0..players).filter_map(|_| self.deck.deal_card()).collect();
        let second: Vec<Card> = (0..players).filter_map(|_| self.deck.deal_card()).collect();
        first.into_iter().zip(second).map(|(a, b)| [a, b]).collect()
    }

    fn deal_board(&mut self, count: usize) -> Vec<Card> {
        self.deck.deal_card();
        (0..count).filter_map(|_| self.deck.deal_card()).collect()
    }
}

/// Deals pre-arranged cards. Hole cards go out in position order and the
/// board comes off the queue with no burns.
#[derive(Clone, Debug, Default)]
pub struct StackedDealer {
    hole_cards: VecDeque<[Card; 2]>,
    board: VecDeque<Card>,
}

impl StackedDealer {
    pub fn new(hole_cards: Vec<[Card; 2]>, board: Vec<Card>) -> Self {
        Self {
            hole_cards: hole_cards.into(),
            board: board.into(),
        }
    }
}

impl Dealer for StackedDealer {
    fn deal_hole_cards(&mut self, players: usize) -> Vec<[Card; 2]> {
        (0..players).filter_map(|_| self.hole_cards.pop_front()).collect()
    }

    fn deal_board(&mut self, count: usize) -> Vec<Card> {
        (0..count).filter_map(|_| self.board.pop_front()).collect()
    }
}

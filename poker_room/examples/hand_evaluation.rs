//! Hand Evaluation Example
//!
//! Ranks a few showdowns the way a room settles them: every seat's hole
//! cards plus the shared board, best five cards, ties split.
//!
//! Run with `cargo run --example hand_evaluation`.

use poker_room::game::{
    Card,
    functional::{SubHand, argmax, eval},
};

fn cards(codes: &str) -> Vec<Card> {
    codes
        .split_whitespace()
        .filter_map(|code| code.parse().ok())
        .collect()
}

fn showdown(title: &str, board: &str, holes: &[(&str, &str)]) {
    println!("=== {title} ===");
    let board = cards(board);
    println!(
        "Board: {}",
        board.iter().map(Card::code).collect::<Vec<_>>().join(" ")
    );

    let hands: Vec<SubHand> = holes
        .iter()
        .map(|(name, hole)| {
            let mut available = cards(hole);
            available.extend_from_slice(&board);
            let best = eval(&available);
            println!("  {name:<6} {hole:<6} -> {}", best.describe());
            best
        })
        .collect();

    let winners: Vec<&str> = argmax(&hands).into_iter().map(|i| holes[i].0).collect();
    if winners.len() == 1 {
        println!("Winner: {}\n", winners[0]);
    } else {
        println!("Split between: {}\n", winners.join(", "));
    }
}

fn main() {
    println!("=== Poker Hand Evaluation Example ===\n");

    showdown(
        "Kicker decides",
        "Ah 9c 7d 4s 2h",
        &[("alice", "As Kd"), ("bob", "Ac Qd")],
    );

    showdown(
        "Flush over straight",
        "Th 9h 8c 2h 3d",
        &[("alice", "Jc 7s"), ("bob", "Ah 5h"), ("carol", "Kd Kc")],
    );

    showdown(
        "Board plays, pot is split",
        "Ts Jd Qc Kh Ac",
        &[("alice", "2c 3d"), ("bob", "4h 5s"), ("carol", "9s 9d")],
    );

    showdown(
        "Wheel straight",
        "Ad 2c 3h 9s Kd",
        &[("alice", "4c 5d"), ("bob", "Ac Kc")],
    );
}

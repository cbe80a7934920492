//! Board module tests.
//!
//! Tests are organized into separate files by category:
//! - `perft.rs` - Move counts against published perft numbers
//! - `legality.rs` - Classification, pins, castling and en passant
//! - `notation.rs` - Move token parsing and algebraic output
//! - `variants.rs` - Fairy pieces and variant rules
//! - `mate.rs` - Checkmate, stalemate and game-end detection
//! - `proptest.rs` - Property-based tests over random games

mod legality;
mod mate;
mod perft;
mod variants;

use crate::board::{apply_move, find_legal, parse_move, Position, Square, Variant};

/// Parse a FEN for a variant, panicking on bad test data
pub(super) fn fen(variant: Variant, text: &str) -> Position {
    Position::try_from_fen(variant, text).unwrap()
}

/// Play a sequence of moves in any accepted notation
pub(super) fn play_all(mut pos: Position, moves: &[&str]) -> Position {
    for text in moves {
        let mv = parse_move(&pos, pos.flags(), pos.ep_file(), text)
            .unwrap_or_else(|e| panic!("{text}: {e}"));
        pos = apply_move(&pos, &mv);
    }
    pos
}

/// Play one board move given by squares
pub(super) fn play(pos: &Position, from: Square, to: Square) -> Position {
    let mv = find_legal(pos, pos.flags(), pos.ep_file(), from, to, None).unwrap();
    apply_move(pos, &mv)
}

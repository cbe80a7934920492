//! Producing the next position from a move.

use super::check::{board_edits, is_in_check, NO_KING};
use super::state::{EpFile, Position};
use super::{Color, Move, MoveKind, Piece, Square};

/// The position after `mv`, which the caller has already found legal.
///
/// Handles captures into holdings (promoted pieces go back as pawns, kings
/// never), drops out of holdings, castling-right loss, the en-passant file,
/// move counters and 3-check counting.
#[must_use]
pub fn apply_move(pos: &Position, mv: &Move) -> Position {
    let variant = pos.variant();
    let side = mv.color;
    let mut next = pos.clone();

    if variant.has_drops() {
        if mv.is_drop() {
            next.holdings_mut(side).take(mv.piece);
        } else if let Some(victim) = captured_occupant(pos, mv) {
            let piece = if victim.promoted { Piece::Pawn } else { victim.piece };
            if piece != Piece::King {
                next.holdings_mut(side).add(piece);
            }
        }
    }

    for (sq, occ) in board_edits(pos, mv, variant.is_atomic()) {
        next.set(sq, occ);
    }

    update_castling(&mut next, mv);

    next.ep = match mv.from {
        Some(from) if mv.piece == Piece::Pawn && from.1 == mv.to.1 && from.0.abs_diff(mv.to.0) == 2 => {
            EpFile::File(from.1)
        }
        _ => EpFile::None,
    };
    next.halfmove_clock = if mv.piece == Piece::Pawn || mv.is_capture() {
        0
    } else {
        next.halfmove_clock + 1
    };
    if side == Color::Black {
        next.fullmove_number += 1;
    }
    next.side_to_move = side.opponent();

    if variant.checks_to_win().is_some() {
        let checks = is_in_check(&next, next.flags(), None);
        if checks > 0 && checks != NO_KING {
            next.checks_given[side.index()] = next.checks_given[side.index()].saturating_add(1);
        }
    }
    next
}

fn captured_occupant(pos: &Position, mv: &Move) -> Option<super::Occupant> {
    let from = mv.from?;
    let sq = match mv.kind {
        MoveKind::EnPassant => Square(from.0, mv.to.1),
        kind if kind.is_castle() => return None,
        _ => mv.to,
    };
    pos.get(sq).filter(|o| o.color != mv.color)
}

/// Drop rights whose king or rook has left its square.
fn update_castling(next: &mut Position, mv: &Move) {
    if mv.piece == Piece::King && mv.from.is_some() {
        next.castling.clear_side(mv.color);
    }
    let height = next.dims.height;
    for color in Color::BOTH {
        let rank = color.back_rank(height);
        let side = next.castling.side(color);
        let Some(kf) = side.king_file else { continue };
        let king_home = next
            .get(Square(rank, kf))
            .is_some_and(|o| o.color == color && o.piece == Piece::King);
        if !king_home {
            next.castling.clear_side(color);
            continue;
        }
        for rook_file in [side.h_rook, side.a_rook].into_iter().flatten() {
            let rook_home = next
                .get(Square(rank, rook_file))
                .is_some_and(|o| o.color == color && o.piece == Piece::Rook);
            let moved_from = mv.from == Some(Square(rank, rook_file)) && !mv.kind.is_castle();
            if !rook_home || moved_from {
                next.castling.clear_rook(color, rook_file);
            }
        }
    }
}

//! Check detection.
//!
//! Moves are tried on a scratch position through [`Simulation`], which
//! records every square it overwrites and puts them back when dropped.

use std::ops::Deref;

use super::flags::PositionFlags;
use super::movegen::Generator;
use super::state::{EpFile, Position};
use super::{Color, Move, MoveKind, Occupant, Piece, Square};

/// Check count reported when the side to move has no royal piece
pub const NO_KING: u32 = 1000;

/// Square edits that carry out `mv` on the board grid, in application order.
///
/// Holdings, rights and counters are not touched; see [`crate::board::apply_move`].
pub(crate) fn board_edits(pos: &Position, mv: &Move, atomic: bool) -> Vec<(Square, Option<Occupant>)> {
    let mut edits = Vec::with_capacity(4);
    let width = pos.dimensions().width;
    let mover = |piece| Some(Occupant::new(mv.color, piece));
    match (mv.kind, mv.from) {
        (MoveKind::Drop, _) | (_, None) => edits.push((mv.to, mover(mv.piece))),
        (MoveKind::CastleKingside | MoveKind::CastleQueenside, Some(from)) => {
            let h_side = mv.kind == MoveKind::CastleKingside;
            let (rook_file, rook_dest) = if h_side {
                (width - 1, mv.to.1 - 1)
            } else {
                (0, mv.to.1 + 1)
            };
            let rook = pos.get(Square(from.0, rook_file));
            edits.push((from, None));
            edits.push((Square(from.0, rook_file), None));
            edits.push((mv.to, pos.get(from)));
            edits.push((Square(from.0, rook_dest), rook));
        }
        (MoveKind::CastleHSide | MoveKind::CastleASide, Some(from)) => {
            let (king_dest, rook_dest) = frc_destinations(width, mv.kind == MoveKind::CastleHSide);
            let rook = pos.get(mv.to);
            edits.push((from, None));
            edits.push((mv.to, None));
            edits.push((Square(from.0, king_dest), pos.get(from)));
            edits.push((Square(from.0, rook_dest), rook));
        }
        (kind, Some(from)) => {
            if kind == MoveKind::EnPassant {
                edits.push((Square(from.0, mv.to.1), None));
            }
            let moved = match (pos.get(from), mv.promotion) {
                (Some(_), Some(promo)) => Some(Occupant {
                    color: mv.color,
                    piece: promo,
                    promoted: true,
                }),
                (occ, None) => occ,
                (None, Some(_)) => None,
            };
            edits.push((from, None));
            edits.push((mv.to, moved));
            if atomic && mv.is_capture() {
                edits.push((mv.to, None));
                for (sq, occ) in explosion_victims(pos, mv.to) {
                    if occ.piece != Piece::Pawn {
                        edits.push((sq, None));
                    }
                }
            }
        }
    }
    edits
}

/// King and rook destination files for king-takes-rook castling
pub(crate) fn frc_destinations(width: usize, h_side: bool) -> (usize, usize) {
    if h_side {
        (width - 2, width - 3)
    } else {
        (2, 3)
    }
}

/// Occupied squares around (not including) `center`
pub(crate) fn explosion_victims(pos: &Position, center: Square) -> Vec<(Square, Occupant)> {
    let mut out = Vec::with_capacity(8);
    for dr in -1..=1 {
        for df in -1..=1 {
            if dr == 0 && df == 0 {
                continue;
            }
            if let Some(sq) = center.offset(dr, df) {
                if let Some(occ) = pos.get(sq) {
                    out.push((sq, occ));
                }
            }
        }
    }
    out
}

/// A move played on a scratch position, undone on drop.
pub(crate) struct Simulation<'a> {
    pos: &'a mut Position,
    saved: Vec<(Square, Option<Occupant>)>,
}

impl<'a> Simulation<'a> {
    pub(crate) fn new(pos: &'a mut Position) -> Self {
        Simulation {
            pos,
            saved: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, sq: Square, occ: Option<Occupant>) {
        self.saved.push((sq, self.pos.get(sq)));
        self.pos.set(sq, occ);
    }

    pub(crate) fn play(&mut self, mv: &Move, flags: PositionFlags) {
        let edits = board_edits(self.pos, mv, flags.contains(PositionFlags::ATOMIC_CAPTURE));
        for (sq, occ) in edits {
            self.set(sq, occ);
        }
    }
}

impl Deref for Simulation<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.pos
    }
}

impl Drop for Simulation<'_> {
    fn drop(&mut self) {
        while let Some((sq, occ)) = self.saved.pop() {
            self.pos.set(sq, occ);
        }
    }
}

/// Number of enemy pieces attacking the king of the side to move after `mv`.
///
/// `None` asks about the position as it stands. Returns [`NO_KING`] when the
/// side to move has no king, and 0 in atomic chess when the enemy king is gone.
#[must_use]
pub fn is_in_check(pos: &Position, flags: PositionFlags, mv: Option<&Move>) -> u32 {
    let mut scratch = pos.clone();
    checks_after(&mut scratch, flags, mv)
}

/// [`is_in_check`] on a caller-owned scratch position, restored before returning.
pub(crate) fn checks_after(scratch: &mut Position, flags: PositionFlags, mv: Option<&Move>) -> u32 {
    let mut sim = Simulation::new(scratch);
    if let Some(mv) = mv {
        sim.play(mv, flags);
    }
    checks_on(&sim, flags.side_to_move(), flags)
}

fn checks_on(pos: &Position, side: Color, flags: PositionFlags) -> u32 {
    let Some(king) = pos.find_king(side) else {
        return NO_KING;
    };
    if flags.contains(PositionFlags::ATOMIC_CAPTURE) && pos.find_king(side.opponent()).is_none() {
        return 0;
    }
    let mut attackers = attackers_of(pos, king, side.opponent(), flags);
    if pos.variant().is_xiangqi() && generals_face(pos, king, side) {
        attackers += 1;
    }
    attackers
}

/// Distinct pieces of `by` with a pseudo-legal move onto `target`
pub(crate) fn attackers_of(pos: &Position, target: Square, by: Color, flags: PositionFlags) -> u32 {
    let opp_flags = if flags.side_to_move() == by {
        flags
    } else {
        flags.flipped()
    };
    let mut gen = Generator::new(pos, opp_flags, EpFile::None);
    gen.board_moves();
    let mut from: Vec<Square> = gen
        .moves
        .iter()
        .filter(|m| m.to == target)
        .filter_map(|m| m.from)
        .collect();
    from.sort_unstable();
    from.dedup();
    from.len() as u32
}

/// Xiangqi: the two generals on one file with nothing between them
fn generals_face(pos: &Position, king: Square, side: Color) -> bool {
    let Some(other) = pos.find_king(side.opponent()) else {
        return false;
    };
    if other.1 != king.1 {
        return false;
    }
    let (lo, hi) = if king.0 < other.0 {
        (king.0, other.0)
    } else {
        (other.0, king.0)
    };
    (lo + 1..hi).all(|r| pos.get(Square(r, king.1)).is_none())
}

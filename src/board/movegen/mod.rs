//! Pseudo-legal move generation.
//!
//! Moves follow each piece's movement rules for the variant but may leave
//! the mover's king attacked; [`crate::board::generate_legal`] filters them.
//! Castling is generated by the legality layer since it needs attack tests.

mod castling;
mod drops;
mod leapers;
mod pawns;
mod sliders;

pub(crate) use castling::generate_castles;

use super::flags::PositionFlags;
use super::state::{EpFile, Position};
use super::{Color, Move, MoveKind, MoveList, Occupant, Piece, Square};

/// Generate every pseudo-legal move for the side named by `flags`.
///
/// An unknown en-passant file (`EpFile::Unknown`) offers en-passant captures
/// on every file where the geometry allows one.
#[must_use]
pub fn generate_pseudo_legal(pos: &Position, flags: PositionFlags, ep: EpFile) -> MoveList {
    let mut gen = Generator::new(pos, flags, ep);
    gen.board_moves();
    if pos.variant().has_drops() {
        gen.drop_moves();
    }
    gen.moves
}

/// Collects moves for one side of one position.
pub(crate) struct Generator<'a> {
    pub(crate) pos: &'a Position,
    pub(crate) flags: PositionFlags,
    pub(crate) ep: EpFile,
    pub(crate) side: Color,
    pub(crate) moves: MoveList,
}

impl<'a> Generator<'a> {
    pub(crate) fn new(pos: &'a Position, flags: PositionFlags, ep: EpFile) -> Self {
        Generator {
            pos,
            flags,
            ep,
            side: flags.side_to_move(),
            moves: MoveList::new(),
        }
    }

    pub(crate) fn board_moves(&mut self) {
        let own: Vec<(Square, Occupant)> = self.pos.pieces(self.side).collect();
        for (from, occ) in own {
            self.piece_moves(from, occ.piece);
        }
    }

    /// Moves of one piece kind from `from`, under this variant's movement rules.
    pub(crate) fn piece_moves(&mut self, from: Square, piece: Piece) {
        let variant = self.pos.variant();
        match piece {
            Piece::Pawn => self.pawn_moves(from),
            Piece::Knight if variant.is_xiangqi() => self.horse_moves(from),
            Piece::Knight => self.knight_moves(from),
            Piece::Bishop => self.slide(from, &DIAGONALS),
            Piece::Rook => self.slide(from, &ORTHOGONALS),
            Piece::Queen => {
                self.slide(from, &DIAGONALS);
                self.slide(from, &ORTHOGONALS);
            }
            Piece::King if variant.royal_knight() => self.knight_moves(from),
            Piece::King if variant.is_xiangqi() => self.general_moves(from),
            Piece::Man if variant.man_is_silver() => self.silver_moves(from),
            Piece::King | Piece::Man => self.king_step_moves(from),
            Piece::Ferz if variant.is_xiangqi() => self.advisor_moves(from),
            Piece::Ferz => self.step(from, &DIAGONALS),
            Piece::Alfil if variant.is_xiangqi() => self.elephant_moves(from),
            Piece::Alfil => self.alfil_moves(from),
            Piece::Wazir => self.step(from, &ORTHOGONALS),
            Piece::Archbishop => {
                self.slide(from, &DIAGONALS);
                self.knight_moves(from);
            }
            Piece::Chancellor => {
                self.slide(from, &ORTHOGONALS);
                self.knight_moves(from);
            }
            Piece::Cannon => self.cannon_moves(from),
            Piece::Nightrider => self.nightrider_moves(from),
        }
    }

    /// Square displaced from `sq`, if it lies on the board
    #[inline]
    pub(crate) fn target(&self, sq: Square, dr: isize, df: isize) -> Option<Square> {
        sq.offset(dr, df).filter(|t| self.pos.contains(*t))
    }

    /// What stands on `sq` relative to the mover
    #[inline]
    pub(crate) fn contents(&self, sq: Square) -> Contents {
        match self.pos.get(sq) {
            None => Contents::Empty,
            Some(o) if o.color == self.side => Contents::Own,
            Some(o) => Contents::Enemy(o.piece),
        }
    }

    /// Push a non-pawn move to `to` unless it lands on an own piece.
    ///
    /// Returns true if the square was empty (sliders keep going).
    pub(crate) fn push_to(&mut self, from: Square, to: Square) -> bool {
        let piece = match self.pos.get(from) {
            Some(o) => o.piece,
            None => return false,
        };
        match self.contents(to) {
            Contents::Empty => {
                self.moves
                    .push(Move::new(MoveKind::Normal, self.side, piece, from, to));
                true
            }
            Contents::Enemy(captured) => {
                self.moves.push(
                    Move::new(MoveKind::Capture, self.side, piece, from, to).with_capture(captured),
                );
                false
            }
            Contents::Own => false,
        }
    }
}

/// Occupancy of a square seen from the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Contents {
    Empty,
    Own,
    Enemy(Piece),
}

pub(crate) const ORTHOGONALS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const DIAGONALS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const KNIGHT_JUMPS: [(isize, isize); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Variant;

    fn count_from(pos: &Position, from: Square) -> usize {
        generate_pseudo_legal(pos, pos.flags(), pos.ep_file())
            .iter()
            .filter(|m| m.from == Some(from))
            .count()
    }

    #[test]
    fn test_start_position_pseudo_moves() {
        let pos = Position::start(Variant::Normal);
        assert_eq!(generate_pseudo_legal(&pos, pos.flags(), EpFile::None).len(), 20);
    }

    #[test]
    fn test_knight_in_corner() {
        let pos = Position::try_from_fen(Variant::Normal, "7k/8/8/8/8/8/8/N6K w - - 0 1").unwrap();
        assert_eq!(count_from(&pos, Square(0, 0)), 2);
    }

    #[test]
    fn test_compound_pieces() {
        let pos =
            Position::try_from_fen(Variant::Capablanca, "9k/10/10/10/4A5/10/10/K9 w - - 0 1")
                .unwrap();
        // Archbishop on e4: diagonals reach 4 + 4 + 3 + 3 = 14 squares, plus 8 knight squares
        assert_eq!(count_from(&pos, Square(3, 4)), 22);
    }

    #[test]
    fn test_capture_kind_and_piece() {
        let pos = Position::try_from_fen(Variant::Normal, "7k/8/8/3p4/8/8/8/3R3K w - - 0 1").unwrap();
        let moves = generate_pseudo_legal(&pos, pos.flags(), EpFile::None);
        let capture = moves
            .iter()
            .find(|m| m.to == Square(4, 3))
            .expect("rook reaches d5");
        assert_eq!(capture.kind, MoveKind::Capture);
        assert_eq!(capture.captured, Some(Piece::Pawn));
        assert!(!moves.contains_squares(Some(Square(0, 3)), Square(5, 3)));
    }
}

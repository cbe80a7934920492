//! Move types and move list.

use std::fmt;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::{Color, Piece};
use super::square::Square;

/// Classification of a move.
///
/// The last three kinds are verdicts rather than playable moves: they are
/// returned by [`crate::board::classify`] and [`crate::board::disambiguate`]
/// for input that does not name exactly one legal move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MoveKind {
    /// Quiet move to an empty square
    Normal,
    /// Move onto an enemy piece
    Capture,
    /// Pawn captures the pawn that just double-stepped
    EnPassant,
    /// King moves toward the high-file rook, rook jumps over
    CastleKingside,
    /// King moves toward the low-file rook, rook jumps over
    CastleQueenside,
    /// Shuffle-variant castle encoded as king takes its own high-file rook
    CastleHSide,
    /// Shuffle-variant castle encoded as king takes its own low-file rook
    CastleASide,
    /// Pawn reaches the promotion zone (with or without capture)
    Promotion,
    /// Piece placed from holdings
    Drop,
    /// More than one legal move matches
    Ambiguous,
    /// Input cannot describe any move in this position
    Impossible,
    /// Input describes a move the rules forbid
    Illegal,
}

impl MoveKind {
    /// True for the four castling kinds
    #[inline]
    #[must_use]
    pub const fn is_castle(self) -> bool {
        matches!(
            self,
            MoveKind::CastleKingside
                | MoveKind::CastleQueenside
                | MoveKind::CastleHSide
                | MoveKind::CastleASide
        )
    }

    /// True for castling toward the high-file side
    #[inline]
    #[must_use]
    pub const fn is_h_side_castle(self) -> bool {
        matches!(self, MoveKind::CastleKingside | MoveKind::CastleHSide)
    }

    /// True for kinds that describe a playable move
    #[inline]
    #[must_use]
    pub const fn is_playable(self) -> bool {
        !matches!(
            self,
            MoveKind::Ambiguous | MoveKind::Impossible | MoveKind::Illegal
        )
    }
}

/// A fully resolved move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    pub kind: MoveKind,
    pub color: Color,
    /// Moving (or dropped) piece kind
    pub piece: Piece,
    /// Source square; `None` for drops
    pub from: Option<Square>,
    pub to: Square,
    pub promotion: Option<Piece>,
    /// Captured piece kind, if any (the rook for king-takes-rook castles is not a capture)
    pub captured: Option<Piece>,
}

impl Move {
    /// Create a board move (not a drop)
    #[must_use]
    pub const fn new(kind: MoveKind, color: Color, piece: Piece, from: Square, to: Square) -> Self {
        Move {
            kind,
            color,
            piece,
            from: Some(from),
            to,
            promotion: None,
            captured: None,
        }
    }

    /// Create a drop from holdings
    #[must_use]
    pub const fn drop(color: Color, piece: Piece, to: Square) -> Self {
        Move {
            kind: MoveKind::Drop,
            color,
            piece,
            from: None,
            to,
            promotion: None,
            captured: None,
        }
    }

    /// Builder: set the promotion piece
    #[must_use]
    pub const fn with_promotion(mut self, piece: Piece) -> Self {
        self.promotion = Some(piece);
        self
    }

    /// Builder: set the captured piece
    #[must_use]
    pub const fn with_capture(mut self, piece: Piece) -> Self {
        self.captured = Some(piece);
        self
    }

    #[inline]
    #[must_use]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_drop(&self) -> bool {
        matches!(self.kind, MoveKind::Drop)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            None => write!(f, "{}@{}", self.piece.san_char(), self.to),
            Some(from) => {
                write!(f, "{from}{}", self.to)?;
                if let Some(p) = self.promotion {
                    write!(f, "{}", p.to_char())?;
                }
                Ok(())
            }
        }
    }
}

/// Growable list of moves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    #[must_use]
    pub fn new() -> Self {
        MoveList {
            moves: Vec::with_capacity(64),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    pub(crate) fn retain<F: FnMut(&Move) -> bool>(&mut self, f: F) {
        self.moves.retain(f);
    }

    /// True if some move in the list goes from `from` to `to`
    #[must_use]
    pub fn contains_squares(&self, from: Option<Square>, to: Square) -> bool {
        self.moves.iter().any(|m| m.from == from && m.to == to)
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.moves[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_display() {
        let mv = Move::new(MoveKind::Normal, Color::White, Piece::Pawn, Square(1, 4), Square(3, 4));
        assert_eq!(mv.to_string(), "e2e4");
        let promo = Move::new(MoveKind::Promotion, Color::White, Piece::Pawn, Square(6, 0), Square(7, 0))
            .with_promotion(Piece::Queen);
        assert_eq!(promo.to_string(), "a7a8q");
        let drop = Move::drop(Color::Black, Piece::Knight, Square(2, 5));
        assert_eq!(drop.to_string(), "N@f3");
    }

    #[test]
    fn test_kind_predicates() {
        assert!(MoveKind::CastleHSide.is_castle());
        assert!(MoveKind::CastleHSide.is_h_side_castle());
        assert!(!MoveKind::CastleQueenside.is_h_side_castle());
        assert!(!MoveKind::Ambiguous.is_playable());
        assert!(MoveKind::Drop.is_playable());
    }
}

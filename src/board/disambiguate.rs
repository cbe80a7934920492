//! Resolving partially specified moves (short algebraic notation).

use super::flags::PositionFlags;
use super::legality::generate_legal;
use super::state::{EpFile, Position};
use super::{Move, Piece};

/// A move described only in part, as short algebraic notation does.
///
/// Every `None` field matches anything. A missing promotion on a promoting
/// move means the variant's default promotion piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PartialMove {
    pub piece: Option<Piece>,
    pub from_file: Option<usize>,
    pub from_rank: Option<usize>,
    pub to_file: Option<usize>,
    pub to_rank: Option<usize>,
    pub promotion: Option<Piece>,
    /// The notation marked the move as a capture
    pub capture: bool,
}

impl PartialMove {
    /// Same source, destination and piece, ignoring promotion
    fn matches_squares(&self, pos: &Position, mv: &Move) -> bool {
        let Some(from) = mv.from else { return false };
        let piece_ok = match self.piece {
            None => true,
            Some(p) => pos.get(from).is_some_and(|o| o.piece == p),
        };
        piece_ok
            && self.from_file.map_or(true, |f| f == from.1)
            && self.from_rank.map_or(true, |r| r == from.0)
            && self.to_file.map_or(true, |f| f == mv.to.1)
            && self.to_rank.map_or(true, |r| r == mv.to.0)
    }

    /// Full match; an `x` in the notation rules out quiet moves
    fn matches(&self, pos: &Position, mv: &Move) -> bool {
        if !self.matches_squares(pos, mv) || (self.capture && !mv.is_capture()) {
            return false;
        }
        match mv.promotion {
            None => self.promotion.is_none(),
            Some(p) => p == self.promotion.unwrap_or_else(|| pos.variant().default_promotion()),
        }
    }
}

/// Result of [`disambiguate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disambiguation {
    /// Exactly one legal move matches
    Unique(Move),
    /// Several legal moves match; `candidate` is one of them, a capture if any is
    Ambiguous { count: usize, candidate: Move },
    /// No legal move matches, but a move breaking the rules does
    Illegal(Move),
    /// Nothing on the board fits the description
    Impossible,
}

/// Find the legal move described by `spec`.
///
/// When no legal move matches, the search is repeated with check ignored so
/// that a move leaving the king attacked is reported as illegal rather than
/// impossible.
#[must_use]
pub fn disambiguate(
    pos: &Position,
    flags: PositionFlags,
    ep: EpFile,
    spec: &PartialMove,
) -> Disambiguation {
    let (legal, _) = generate_legal(pos, flags, ep);
    let found: Vec<Move> = legal
        .iter()
        .filter(|m| spec.matches(pos, m))
        .copied()
        .collect();
    match found.len() {
        1 => return Disambiguation::Unique(found[0]),
        0 => {}
        count => {
            let candidate = found
                .iter()
                .find(|m| m.is_capture())
                .copied()
                .unwrap_or(found[0]);
            return Disambiguation::Ambiguous { count, candidate };
        }
    }

    let (loose, _) = generate_legal(pos, flags | PositionFlags::IGNORE_CHECK, ep);
    let near_miss = loose
        .iter()
        .find(|m| spec.matches(pos, m))
        .or_else(|| legal.iter().find(|m| spec.matches_squares(pos, m)))
        .or_else(|| loose.iter().find(|m| spec.matches_squares(pos, m)));
    match near_miss {
        Some(mv) => Disambiguation::Illegal(*mv),
        None => Disambiguation::Impossible,
    }
}

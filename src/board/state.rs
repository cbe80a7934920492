use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::flags::PositionFlags;
use super::variant::{Dimensions, Variant};
use super::{CastlingRights, Color, Occupant, Piece, Square};

/// En-passant availability for the next move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EpFile {
    /// No double step was just played
    #[default]
    None,
    /// Not known (positions from remote servers); e.p. is offered optimistically
    Unknown,
    /// A pawn just double-stepped on this file
    File(usize),
}

impl EpFile {
    /// True if an en-passant capture onto `file` may be generated
    #[inline]
    #[must_use]
    pub fn allows(self, file: usize) -> bool {
        match self {
            EpFile::None => false,
            EpFile::Unknown => true,
            EpFile::File(f) => f == file,
        }
    }
}

/// Pieces in hand for one side (drop variants).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Holdings([u8; Piece::COUNT]);

impl Holdings {
    #[inline]
    #[must_use]
    pub fn count(&self, piece: Piece) -> u8 {
        self.0[piece.index()]
    }

    pub fn add(&mut self, piece: Piece) {
        self.0[piece.index()] = self.0[piece.index()].saturating_add(1);
    }

    /// Take one piece out; false if none was held
    pub fn take(&mut self, piece: Piece) -> bool {
        let slot = &mut self.0[piece.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Held piece kinds with their counts, in piece order
    pub fn iter(&self) -> impl Iterator<Item = (Piece, u8)> + '_ {
        Piece::ALL
            .iter()
            .map(|&p| (p, self.count(p)))
            .filter(|&(_, n)| n > 0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&n| n == 0)
    }
}

/// A position: the square grid plus everything needed to judge the next move.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub(crate) variant: Variant,
    pub(crate) dims: Dimensions,
    /// Rank-major grid, `rank * width + file`
    pub(crate) squares: Vec<Option<Occupant>>,
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) ep: EpFile,
    pub(crate) holdings: [Holdings; 2],
    pub(crate) checks_given: [u8; 2],
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
}

impl Position {
    /// An empty board for the variant, White to move, no rights.
    #[must_use]
    pub fn empty(variant: Variant) -> Self {
        let dims = variant.dimensions();
        Position {
            variant,
            dims,
            squares: vec![None; dims.area()],
            side_to_move: Color::White,
            castling: CastlingRights::none(),
            ep: EpFile::None,
            holdings: [Holdings::default(); 2],
            checks_given: [0; 2],
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The variant's start position; shuffle variants draw from the thread RNG.
    #[must_use]
    pub fn start(variant: Variant) -> Self {
        Self::start_with_rng(variant, &mut rand::thread_rng())
    }

    /// The variant's start position, shuffling with the given RNG.
    #[must_use]
    pub fn start_with_rng<R: rand::Rng + ?Sized>(variant: Variant, rng: &mut R) -> Self {
        let placement = variant.new_game_placement(rng);
        let mut pos = Position::empty(variant);
        if super::fen::parse_placement(&mut pos, &placement).is_ok() {
            pos.castling = pos.derive_castling_rights();
        }
        pos
    }

    /// Castling rights implied by kings and rooks standing on their home rank.
    ///
    /// The king must be on a castling file for standard castling, or anywhere
    /// between two rooks for king-takes-rook castling.
    #[must_use]
    pub fn derive_castling_rights(&self) -> CastlingRights {
        use super::variant::CastlingStyle;
        let mut rights = CastlingRights::none();
        let width = self.dims.width;
        for color in Color::BOTH {
            let rank = color.back_rank(self.dims.height);
            let king_file = (0..width).find(|&f| {
                self.get(Square(rank, f))
                    .is_some_and(|o| o.color == color && o.piece == Piece::King)
            });
            let Some(kf) = king_file else { continue };
            let rook_at = |f: usize| {
                self.get(Square(rank, f))
                    .is_some_and(|o| o.color == color && o.piece == Piece::Rook)
            };
            let side = rights.side_mut(color);
            match self.variant.castling_style() {
                CastlingStyle::Forbidden => continue,
                CastlingStyle::Standard => {
                    if kf != width >> 1 && kf != (width - 1) >> 1 {
                        continue;
                    }
                    side.h_rook = rook_at(width - 1).then_some(width - 1);
                    side.a_rook = rook_at(0).then_some(0);
                }
                CastlingStyle::KingTakesRook => {
                    side.h_rook = (kf + 1..width).rev().find(|&f| rook_at(f));
                    side.a_rook = (0..kf).find(|&f| rook_at(f));
                }
            }
            if side.h_rook.is_some() || side.a_rook.is_some() {
                side.king_file = Some(kf);
            }
        }
        rights
    }

    #[inline]
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, sq: Square) -> bool {
        self.dims.contains(sq.0, sq.1)
    }

    #[inline]
    fn idx(&self, sq: Square) -> usize {
        sq.0 * self.dims.width + sq.1
    }

    /// Occupant of a square; off-board squares read as empty
    #[inline]
    #[must_use]
    pub fn get(&self, sq: Square) -> Option<Occupant> {
        if self.contains(sq) {
            self.squares[self.idx(sq)]
        } else {
            None
        }
    }

    /// Place or clear a square; off-board writes are ignored
    #[inline]
    pub fn set(&mut self, sq: Square, occupant: Option<Occupant>) {
        if self.contains(sq) {
            let idx = self.idx(sq);
            self.squares[idx] = occupant;
        }
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    /// Flags for this position's side to move
    #[inline]
    #[must_use]
    pub fn flags(&self) -> PositionFlags {
        PositionFlags::for_side(self.variant, self.side_to_move)
    }

    #[inline]
    #[must_use]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn set_castling(&mut self, rights: CastlingRights) {
        self.castling = rights;
    }

    #[inline]
    #[must_use]
    pub fn ep_file(&self) -> EpFile {
        self.ep
    }

    pub fn set_ep_file(&mut self, ep: EpFile) {
        self.ep = ep;
    }

    #[inline]
    #[must_use]
    pub fn holdings(&self, color: Color) -> &Holdings {
        &self.holdings[color.index()]
    }

    pub fn holdings_mut(&mut self, color: Color) -> &mut Holdings {
        &mut self.holdings[color.index()]
    }

    /// Checks delivered by `color` so far (3-check)
    #[inline]
    #[must_use]
    pub fn checks_given(&self, color: Color) -> u8 {
        self.checks_given[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// All on-board squares, file-major (a1, a2, ..., b1, ...)
    pub fn squares_file_major(&self) -> impl Iterator<Item = Square> {
        let Dimensions { width, height } = self.dims;
        (0..width).flat_map(move |f| (0..height).map(move |r| Square(r, f)))
    }

    /// Squares holding pieces of `color`, rank-major
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Occupant)> + '_ {
        let width = self.dims.width;
        self.squares.iter().enumerate().filter_map(move |(i, o)| match o {
            Some(occ) if occ.color == color => Some((Square(i / width, i % width), *occ)),
            _ => None,
        })
    }

    /// Number of pieces `color` has on the board
    #[must_use]
    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces(color).count()
    }

    /// First royal piece of `color`, scanning file by file
    #[must_use]
    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.squares_file_major()
            .find(|&sq| self.get(sq).is_some_and(|o| o.color == color && o.piece == Piece::King))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..self.dims.height).rev() {
            write!(f, "{:>2} ", rank + 1)?;
            for file in 0..self.dims.width {
                let c = self
                    .get(Square(rank, file))
                    .map_or('.', Occupant::to_fen_char);
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for file in 0..self.dims.width {
            write!(f, "{} ", Square::file_char(file))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_layout() {
        let pos = Position::start(Variant::Normal);
        assert_eq!(
            pos.get(Square(0, 4)),
            Some(Occupant::new(Color::White, Piece::King))
        );
        assert_eq!(
            pos.get(Square(7, 3)),
            Some(Occupant::new(Color::Black, Piece::Queen))
        );
        assert_eq!(pos.piece_count(Color::White), 16);
        assert!(pos.castling().has(Color::White, true));
        assert!(pos.castling().has(Color::Black, false));
    }

    #[test]
    fn test_xiangqi_has_no_castling() {
        let pos = Position::start(Variant::Xiangqi);
        assert!(pos.castling().is_empty());
        assert_eq!(pos.find_king(Color::Black), Some(Square(9, 4)));
    }

    #[test]
    fn test_holdings() {
        let mut h = Holdings::default();
        assert!(!h.take(Piece::Knight));
        h.add(Piece::Knight);
        h.add(Piece::Knight);
        assert_eq!(h.count(Piece::Knight), 2);
        assert!(h.take(Piece::Knight));
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![(Piece::Knight, 1)]);
    }

    #[test]
    fn test_ep_file_allows() {
        assert!(EpFile::Unknown.allows(3));
        assert!(EpFile::File(3).allows(3));
        assert!(!EpFile::File(2).allows(3));
        assert!(!EpFile::None.allows(3));
    }

    #[test]
    fn test_off_board_reads_empty() {
        let pos = Position::start(Variant::Normal);
        assert_eq!(pos.get(Square(8, 0)), None);
    }
}

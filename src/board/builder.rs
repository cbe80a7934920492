//! Fluent builder for setting up positions square by square.
//!
//! Position editing goes through this builder; leaving the editor calls
//! [`PositionBuilder::build`], which rejects positions no game can start from.
//!
//! # Example
//! ```
//! use referee::board::{Color, Piece, PositionBuilder, Square, Variant};
//!
//! let pos = PositionBuilder::new(Variant::Normal)
//!     .piece(Square(0, 4), Color::White, Piece::King)
//!     .piece(Square(7, 4), Color::Black, Piece::King)
//!     .piece(Square(1, 0), Color::White, Piece::Pawn)
//!     .side_to_move(Color::White)
//!     .build()
//!     .unwrap();
//! assert_eq!(pos.piece_count(Color::White), 2);
//! ```

use super::check::{is_in_check, NO_KING};
use super::error::SetupError;
use super::state::{EpFile, Position};
use super::variant::Variant;
use super::{Color, Occupant, Piece, Square};

/// A fluent builder for [`Position`] values.
#[derive(Clone, Debug)]
pub struct PositionBuilder {
    pos: Position,
    derive_castling: bool,
}

impl PositionBuilder {
    /// Start from an empty board of the variant.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        PositionBuilder {
            pos: Position::empty(variant),
            derive_castling: true,
        }
    }

    /// Start from an existing position (the editor opens on the current board).
    #[must_use]
    pub fn from_position(pos: &Position) -> Self {
        PositionBuilder {
            pos: pos.clone(),
            derive_castling: false,
        }
    }

    /// Place a piece, replacing whatever stood there.
    #[must_use]
    pub fn piece(mut self, square: Square, color: Color, piece: Piece) -> Self {
        self.pos.set(square, Some(Occupant::new(color, piece)));
        self.derive_castling = true;
        self
    }

    /// Empty one square.
    #[must_use]
    pub fn clear(mut self, square: Square) -> Self {
        self.pos.set(square, None);
        self.derive_castling = true;
        self
    }

    /// Empty the whole board, keeping the side to move.
    #[must_use]
    pub fn clear_board(mut self) -> Self {
        let side = self.pos.side_to_move();
        self.pos = Position::empty(self.pos.variant());
        self.pos.set_side_to_move(side);
        self.derive_castling = true;
        self
    }

    #[must_use]
    pub fn side_to_move(mut self, color: Color) -> Self {
        self.pos.set_side_to_move(color);
        self
    }

    /// Put a piece into a side's holdings (drop variants).
    #[must_use]
    pub fn hold(mut self, color: Color, piece: Piece) -> Self {
        self.pos.holdings_mut(color).add(piece);
        self
    }

    #[must_use]
    pub fn halfmove_clock(mut self, clock: u32) -> Self {
        self.pos.halfmove_clock = clock;
        self
    }

    /// Check the position and hand it out.
    ///
    /// Castling rights are re-derived from the kings and rooks on their home
    /// squares whenever pieces were edited; the en-passant file is cleared.
    pub fn build(self) -> Result<Position, SetupError> {
        let mut pos = self.pos;
        if self.derive_castling {
            pos.castling = pos.derive_castling_rights();
        }
        pos.ep = EpFile::None;
        validate(&pos)?;
        Ok(pos)
    }
}

fn validate(pos: &Position) -> Result<(), SetupError> {
    let variant = pos.variant();
    let height = pos.dimensions().height;
    if !variant.ignores_check() {
        for color in Color::BOTH {
            let kings = pos.count_pieces(color, Piece::King);
            if kings == 0 && !variant.is_atomic() {
                return Err(SetupError::MissingKing { color });
            }
        }
    }
    let promotes = !variant.promotion_pieces().is_empty();
    if promotes {
        for color in Color::BOTH {
            if let Some((square, _)) = pos
                .pieces(color)
                .find(|(sq, o)| o.piece == Piece::Pawn && (sq.0 == 0 || sq.0 + 1 == height))
            {
                return Err(SetupError::PawnOnEdgeRank { square });
            }
        }
    }
    if !variant.ignores_check() {
        let waiting = pos.side_to_move().opponent();
        let attacked = is_in_check(pos, pos.flags().flipped(), None);
        if attacked > 0 && attacked != NO_KING {
            return Err(SetupError::OpponentInCheck { color: waiting });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kings() -> PositionBuilder {
        PositionBuilder::new(Variant::Normal)
            .piece(Square(0, 4), Color::White, Piece::King)
            .piece(Square(7, 4), Color::Black, Piece::King)
    }

    #[test]
    fn test_two_kings_build() {
        let pos = kings().build().unwrap();
        assert_eq!(pos.piece_count(Color::White), 1);
        assert!(pos.castling().is_empty());
    }

    #[test]
    fn test_side_to_move() {
        let pos = kings().side_to_move(Color::Black).build().unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn test_castling_rights_rederived() {
        let pos = kings()
            .piece(Square(0, 7), Color::White, Piece::Rook)
            .build()
            .unwrap();
        assert!(pos.castling().has(Color::White, true));
        assert!(!pos.castling().has(Color::White, false));
    }

    #[test]
    fn test_clear_square() {
        let start = Position::start(Variant::Normal);
        let pos = PositionBuilder::from_position(&start)
            .clear(Square(0, 0))
            .build()
            .unwrap();
        assert!(pos.get(Square(0, 0)).is_none());
        assert!(!pos.castling().has(Color::White, false));
        assert!(pos.castling().has(Color::White, true));
    }

    #[test]
    fn test_rejections() {
        let missing = PositionBuilder::new(Variant::Normal)
            .piece(Square(0, 4), Color::White, Piece::King)
            .build();
        assert_eq!(
            missing.unwrap_err(),
            SetupError::MissingKing {
                color: Color::Black
            }
        );
        let pawn = kings().piece(Square(7, 0), Color::White, Piece::Pawn).build();
        assert!(matches!(pawn, Err(SetupError::PawnOnEdgeRank { .. })));
        // Black in check with White to move
        let check = kings().piece(Square(3, 4), Color::White, Piece::Rook).build();
        assert!(matches!(check, Err(SetupError::OpponentInCheck { .. })));
        // suicide has no royal king
        assert!(PositionBuilder::new(Variant::Suicide).build().is_ok());
    }
}

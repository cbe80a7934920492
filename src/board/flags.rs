//! Per-ply position flags.

use bitflags::bitflags;

use super::types::Color;
use super::variant::{CastlingStyle, Variant};

bitflags! {
    /// Rule switches in force for one ply.
    ///
    /// Derived from the ply parity and the variant; nothing else feeds them.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PositionFlags: u16 {
        const WHITE_ON_MOVE = 1 << 0;
        const WHITE_KCASTLE_OK = 1 << 1;
        const WHITE_QCASTLE_OK = 1 << 2;
        const BLACK_KCASTLE_OK = 1 << 3;
        const BLACK_QCASTLE_OK = 1 << 4;
        /// Moves that leave the own king attacked are allowed
        const IGNORE_CHECK = 1 << 5;
        /// Pawns may try diagonal moves onto empty squares
        const KRIEGSPIEL_CAPTURE = 1 << 6;
        /// Captures explode the 3x3 neighbourhood
        const ATOMIC_CAPTURE = 1 << 7;
        /// Castling is encoded as king takes own rook
        const FRC_TYPE_CASTLING = 1 << 8;
        /// A capture must be played if one exists
        const MANDATORY_CAPTURE = 1 << 9;

        const ALL_CASTLING = Self::WHITE_KCASTLE_OK.bits()
            | Self::WHITE_QCASTLE_OK.bits()
            | Self::BLACK_KCASTLE_OK.bits()
            | Self::BLACK_QCASTLE_OK.bits();
    }
}

impl PositionFlags {
    /// Flags for the position before the move at `ply` (ply 0 = White to move).
    #[must_use]
    pub fn for_ply(variant: Variant, ply: usize) -> Self {
        Self::for_side(variant, Color::at_ply(ply))
    }

    /// Flags with an explicit side to move (positions set up with Black to move).
    #[must_use]
    pub fn for_side(variant: Variant, side: Color) -> Self {
        let mut flags = PositionFlags::empty();
        if side == Color::White {
            flags |= PositionFlags::WHITE_ON_MOVE;
        }
        match variant.castling_style() {
            CastlingStyle::Forbidden => {}
            CastlingStyle::Standard => flags |= PositionFlags::ALL_CASTLING,
            CastlingStyle::KingTakesRook => {
                flags |= PositionFlags::ALL_CASTLING | PositionFlags::FRC_TYPE_CASTLING;
            }
        }
        if variant.ignores_check() {
            flags |= PositionFlags::IGNORE_CHECK;
        }
        if variant.kriegspiel_captures() {
            flags |= PositionFlags::KRIEGSPIEL_CAPTURE;
        }
        if variant.is_atomic() {
            flags |= PositionFlags::ATOMIC_CAPTURE;
        }
        if variant.mandatory_capture() {
            flags |= PositionFlags::MANDATORY_CAPTURE;
        }
        flags
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(self) -> Color {
        if self.contains(PositionFlags::WHITE_ON_MOVE) {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Castling toward the given wing is permitted for `color`
    #[inline]
    #[must_use]
    pub fn may_castle(self, color: Color, h_side: bool) -> bool {
        let bit = match (color, h_side) {
            (Color::White, true) => PositionFlags::WHITE_KCASTLE_OK,
            (Color::White, false) => PositionFlags::WHITE_QCASTLE_OK,
            (Color::Black, true) => PositionFlags::BLACK_KCASTLE_OK,
            (Color::Black, false) => PositionFlags::BLACK_QCASTLE_OK,
        };
        self.contains(bit)
    }

    /// The same flags with the other side to move
    #[inline]
    #[must_use]
    pub fn flipped(self) -> Self {
        self ^ PositionFlags::WHITE_ON_MOVE
    }
}

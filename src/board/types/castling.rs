//! Castling rights type.
//!
//! Rights are stored as files rather than bits so the same type serves
//! orthodox castling and shuffle variants where the rooks start anywhere.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::Color;

/// Castling rights of one side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SideRights {
    /// File of the king that may castle
    pub king_file: Option<usize>,
    /// File of the rook on the higher-file ("h") side
    pub h_rook: Option<usize>,
    /// File of the rook on the lower-file ("a") side
    pub a_rook: Option<usize>,
}

/// Castling rights for both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CastlingRights([SideRights; 2]);

impl CastlingRights {
    /// No castling rights
    #[must_use]
    pub const fn none() -> Self {
        CastlingRights([
            SideRights {
                king_file: None,
                h_rook: None,
                a_rook: None,
            },
            SideRights {
                king_file: None,
                h_rook: None,
                a_rook: None,
            },
        ])
    }

    /// Full rights for both sides given the king and rook files.
    #[must_use]
    pub const fn with_files(king_file: usize, a_rook: usize, h_rook: usize) -> Self {
        let side = SideRights {
            king_file: Some(king_file),
            h_rook: Some(h_rook),
            a_rook: Some(a_rook),
        };
        CastlingRights([side, side])
    }

    #[inline]
    #[must_use]
    pub const fn side(&self, color: Color) -> SideRights {
        self.0[color.index()]
    }

    #[inline]
    pub fn side_mut(&mut self, color: Color) -> &mut SideRights {
        &mut self.0[color.index()]
    }

    /// Rook file for one wing if that right is still held
    #[inline]
    #[must_use]
    pub fn rook_file(&self, color: Color, h_side: bool) -> Option<usize> {
        let side = self.side(color);
        side.king_file?;
        if h_side {
            side.h_rook
        } else {
            side.a_rook
        }
    }

    /// Check if a specific castling right is set
    #[inline]
    #[must_use]
    pub fn has(&self, color: Color, h_side: bool) -> bool {
        self.rook_file(color, h_side).is_some()
    }

    /// Drop both rights of a side (its king moved)
    pub fn clear_side(&mut self, color: Color) {
        *self.side_mut(color) = SideRights::default();
    }

    /// Drop the right tied to a rook on `file` (the rook moved or was taken)
    pub fn clear_rook(&mut self, color: Color, file: usize) {
        let side = self.side_mut(color);
        if side.h_rook == Some(file) {
            side.h_rook = None;
        }
        if side.a_rook == Some(file) {
            side.a_rook = None;
        }
    }

    /// True when neither side holds any right
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Color::BOTH
            .iter()
            .all(|&c| !self.has(c, true) && !self.has(c, false))
    }
}

//! Piece and color types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Piece kinds, orthodox and fairy.
///
/// Movement of a kind can depend on the variant (the king moves as a knight
/// in knightmate, the man moves as a silver general in makruk); see
/// [`crate::board::movegen`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    /// One diagonal step (shatranj queen, xiangqi advisor, makruk met)
    Ferz,
    /// Two-square diagonal jump (shatranj bishop, xiangqi elephant)
    Alfil,
    /// Bishop plus knight
    Archbishop,
    /// Rook plus knight
    Chancellor,
    /// One orthogonal step
    Wazir,
    /// Non-royal king mover
    Man,
    /// Rook mover that captures by jumping one screen
    Cannon,
    /// Repeated knight leaps in one direction
    Nightrider,
}

impl Piece {
    /// Number of piece kinds
    pub const COUNT: usize = 14;

    /// All piece kinds in index order
    pub const ALL: [Piece; Piece::COUNT] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
        Piece::Ferz,
        Piece::Alfil,
        Piece::Archbishop,
        Piece::Chancellor,
        Piece::Wazir,
        Piece::Man,
        Piece::Cannon,
        Piece::Nightrider,
    ];

    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Parse a piece from its letter, in either case.
    #[must_use]
    pub fn from_char(c: char) -> Option<Piece> {
        match c.to_ascii_lowercase() {
            'p' => Some(Piece::Pawn),
            'n' => Some(Piece::Knight),
            'b' => Some(Piece::Bishop),
            'r' => Some(Piece::Rook),
            'q' => Some(Piece::Queen),
            'k' => Some(Piece::King),
            'f' => Some(Piece::Ferz),
            'e' => Some(Piece::Alfil),
            'a' => Some(Piece::Archbishop),
            'c' => Some(Piece::Chancellor),
            'w' => Some(Piece::Wazir),
            'm' => Some(Piece::Man),
            'o' => Some(Piece::Cannon),
            'h' => Some(Piece::Nightrider),
            _ => None,
        }
    }

    /// Lowercase letter of this piece
    #[inline]
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
            Piece::Ferz => 'f',
            Piece::Alfil => 'e',
            Piece::Archbishop => 'a',
            Piece::Chancellor => 'c',
            Piece::Wazir => 'w',
            Piece::Man => 'm',
            Piece::Cannon => 'o',
            Piece::Nightrider => 'h',
        }
    }

    /// Letter with case based on color (uppercase for White)
    #[inline]
    #[must_use]
    pub fn to_fen_char(self, color: Color) -> char {
        let c = self.to_char();
        if color == Color::White {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// Uppercase letter used in algebraic notation
    #[inline]
    #[must_use]
    pub fn san_char(self) -> char {
        self.to_char().to_ascii_uppercase()
    }
}

/// Chess colors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Both colors in index order (White=0, Black=1)
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Returns the opposite color
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Side to move at a given ply when White moves first at ply 0
    #[inline]
    #[must_use]
    pub const fn at_ply(ply: usize) -> Color {
        if ply % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Pawn forward direction (+1 for White, -1 for Black)
    #[inline]
    #[must_use]
    pub(crate) const fn forward(self) -> isize {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Back rank for this color on a board of the given height
    #[inline]
    #[must_use]
    pub(crate) const fn back_rank(self, height: usize) -> usize {
        match self {
            Color::White => 0,
            Color::Black => height - 1,
        }
    }

    /// Lowercase protocol name ("white"/"black")
    #[must_use]
    pub const fn protocol_name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// A piece standing on a square.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Occupant {
    pub color: Color,
    pub piece: Piece,
    /// Set on pieces created by promotion; they demote when captured into holdings.
    pub promoted: bool,
}

impl Occupant {
    #[inline]
    #[must_use]
    pub const fn new(color: Color, piece: Piece) -> Self {
        Occupant {
            color,
            piece,
            promoted: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_fen_char(self) -> char {
        self.piece.to_fen_char(self.color)
    }

    /// Parse a FEN letter: uppercase is White.
    #[must_use]
    pub fn from_fen_char(c: char) -> Option<Self> {
        let piece = Piece::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Occupant::new(color, piece))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_letters_round_trip() {
        for piece in Piece::ALL {
            assert_eq!(Piece::from_char(piece.to_char()), Some(piece));
            assert_eq!(Piece::from_char(piece.san_char()), Some(piece));
        }
        assert_eq!(Piece::from_char('x'), None);
    }

    #[test]
    fn test_color_at_ply() {
        assert_eq!(Color::at_ply(0), Color::White);
        assert_eq!(Color::at_ply(3), Color::Black);
        assert_eq!(Color::White.opponent(), Color::Black);
    }

    #[test]
    fn test_occupant_fen_case() {
        let w = Occupant::from_fen_char('Q').unwrap();
        assert_eq!(w.color, Color::White);
        let b = Occupant::from_fen_char('o').unwrap();
        assert_eq!((b.color, b.piece), (Color::Black, Piece::Cannon));
        assert_eq!(b.to_fen_char(), 'o');
    }
}

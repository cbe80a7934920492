//! Square type for boards of up to 16x16 squares.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::error::SquareError;

/// Largest supported board dimension
pub const MAX_DIMENSION: usize = 16;

/// A square on the board, represented as (rank, file).
///
/// Squares carry no board size; range checks happen against a
/// [`crate::board::Dimensions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Square(pub usize, pub usize); // (rank, file)

impl Square {
    /// Create a new square with bounds checking against the largest board
    #[must_use]
    pub fn new(rank: usize, file: usize) -> Option<Self> {
        if rank < MAX_DIMENSION && file < MAX_DIMENSION {
            Some(Square(rank, file))
        } else {
            None
        }
    }

    /// Get the rank (0 = rank 1)
    #[inline]
    #[must_use]
    pub const fn rank(self) -> usize {
        self.0
    }

    /// Get the file (0 = file a)
    #[inline]
    #[must_use]
    pub const fn file(self) -> usize {
        self.1
    }

    /// Square displaced by a (rank, file) delta, if it stays non-negative
    #[inline]
    #[must_use]
    pub fn offset(self, dr: isize, df: isize) -> Option<Self> {
        let r = self.0 as isize + dr;
        let f = self.1 as isize + df;
        if r < 0 || f < 0 {
            None
        } else {
            Some(Square(r as usize, f as usize))
        }
    }

    /// File letter for a file index
    #[inline]
    #[must_use]
    pub fn file_char(file: usize) -> char {
        (b'a' + file as u8) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Square::file_char(self.1), self.0 + 1)
    }
}

impl TryFrom<(usize, usize)> for Square {
    type Error = SquareError;

    fn try_from((rank, file): (usize, usize)) -> Result<Self, Self::Error> {
        if rank >= MAX_DIMENSION {
            return Err(SquareError::RankOutOfBounds { rank });
        }
        if file >= MAX_DIMENSION {
            return Err(SquareError::FileOutOfBounds { file });
        }
        Ok(Square(rank, file))
    }
}

/// Parse a square at the start of `s`, returning it and the bytes consumed.
///
/// Ranks of ten or more use two digits ("a10").
pub(crate) fn parse_square_prefix(s: &str) -> Option<(Square, usize)> {
    let bytes = s.as_bytes();
    let file = match bytes.first() {
        Some(b @ b'a'..=b'p') => (b - b'a') as usize,
        _ => return None,
    };
    let digits = bytes[1..]
        .iter()
        .take(2)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let rank: usize = s[1..=digits].parse().ok()?;
    if rank == 0 || rank > MAX_DIMENSION {
        return None;
    }
    Some((Square(rank - 1, file), 1 + digits))
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_square_prefix(s) {
            Some((sq, used)) if used == s.len() => Ok(sq),
            _ => Err(SquareError::InvalidNotation {
                notation: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_display() {
        assert_eq!(Square(0, 0).to_string(), "a1");
        assert_eq!(Square(9, 8).to_string(), "i10");
    }

    #[test]
    fn test_square_parse() {
        assert_eq!("e4".parse::<Square>(), Ok(Square(3, 4)));
        assert_eq!("a10".parse::<Square>(), Ok(Square(9, 0)));
        assert!("e".parse::<Square>().is_err());
        assert!("e0".parse::<Square>().is_err());
        assert!("e4x".parse::<Square>().is_err());
    }

    #[test]
    fn test_square_prefix_consumes_digits() {
        assert_eq!(parse_square_prefix("e2e4"), Some((Square(1, 4), 2)));
        assert_eq!(parse_square_prefix("b10c9"), Some((Square(9, 1), 3)));
    }

    #[test]
    fn test_offset() {
        assert_eq!(Square(1, 1).offset(-1, -1), Some(Square(0, 0)));
        assert_eq!(Square(0, 0).offset(-1, 0), None);
    }
}

//! Error types for board operations.

use std::fmt;

use super::{Color, Square};

/// Error type for FEN parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN string has too few parts (needs at least 2)
    TooFewParts { found: usize },
    /// Invalid piece character in position string
    InvalidPiece { char: char },
    /// Invalid castling character
    InvalidCastling { char: char },
    /// Invalid side to move (must be 'w' or 'b')
    InvalidSideToMove { found: String },
    /// Invalid en passant square
    InvalidEnPassant { found: String },
    /// Wrong number of ranks for the variant's board
    RankCount { expected: usize, found: usize },
    /// A rank does not describe exactly the board's width
    RankWidth {
        rank: usize,
        files: usize,
        expected: usize,
    },
    /// Invalid character inside the holdings brackets
    InvalidHoldings { char: char },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => {
                write!(f, "FEN must have at least 2 parts, found {found}")
            }
            FenError::InvalidPiece { char } => {
                write!(f, "Invalid piece character '{char}' in FEN")
            }
            FenError::InvalidCastling { char } => {
                write!(f, "Invalid castling character '{char}' in FEN")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "Invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "Invalid en passant square '{found}'")
            }
            FenError::RankCount { expected, found } => {
                write!(f, "FEN has {found} ranks, board has {expected}")
            }
            FenError::RankWidth {
                rank,
                files,
                expected,
            } => {
                write!(f, "Rank {rank} has {files} files, board has {expected}")
            }
            FenError::InvalidHoldings { char } => {
                write!(f, "Invalid holdings character '{char}' in FEN")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// Error type for square parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Rank out of bounds
    RankOutOfBounds { rank: usize },
    /// File out of bounds
    FileOutOfBounds { file: usize },
    /// Invalid algebraic notation
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::RankOutOfBounds { rank } => {
                write!(f, "Rank {rank} out of bounds")
            }
            SquareError::FileOutOfBounds { file } => {
                write!(f, "File {file} out of bounds")
            }
            SquareError::InvalidNotation { notation } => {
                write!(f, "Invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}

/// Error type for resolving a move token against a position.
///
/// The variants mirror the verdict kinds of [`crate::board::MoveKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// Empty move string
    Empty,
    /// The text is not a move token at all
    Unparseable { notation: String },
    /// More than one legal move matches
    Ambiguous { notation: String, count: usize },
    /// The text cannot describe a move in this position
    Impossible { notation: String },
    /// The text describes a move the rules forbid
    Illegal { notation: String },
    /// Token is a game result, not a move
    GameEnd { notation: String },
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::Empty => write!(f, "Empty move string"),
            NotationError::Unparseable { notation } => {
                write!(f, "Cannot parse move '{notation}'")
            }
            NotationError::Ambiguous { notation, count } => {
                write!(f, "Ambiguous move '{notation}' ({count} candidates)")
            }
            NotationError::Impossible { notation } => {
                write!(f, "Impossible move '{notation}'")
            }
            NotationError::Illegal { notation } => {
                write!(f, "Illegal move '{notation}'")
            }
            NotationError::GameEnd { notation } => {
                write!(f, "'{notation}' is a game result, not a move")
            }
        }
    }
}

impl std::error::Error for NotationError {}

/// Error type for positions rejected when leaving the position editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// A side has no king in a variant where the king is royal
    MissingKing { color: Color },
    /// A pawn stands where it could never have arrived
    PawnOnEdgeRank { square: Square },
    /// The side not on move is already in check
    OpponentInCheck { color: Color },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::MissingKing { color } => write!(f, "{color} has no king"),
            SetupError::PawnOnEdgeRank { square } => {
                write!(f, "Pawn on {square} cannot stand on the first or last rank")
            }
            SetupError::OpponentInCheck { color } => {
                write!(f, "{color} is in check but not on move")
            }
        }
    }
}

impl std::error::Error for SetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fen_error_rank_width() {
        let err = FenError::RankWidth {
            rank: 3,
            files: 9,
            expected: 8,
        };
        let text = err.to_string();
        assert!(text.contains('9'));
        assert!(text.contains('8'));
    }

    #[test]
    fn test_fen_error_invalid_piece() {
        let err = FenError::InvalidPiece { char: 'z' };
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn test_square_error_invalid_notation() {
        let err = SquareError::InvalidNotation {
            notation: "xyz".to_string(),
        };
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn test_notation_error_ambiguous_reports_count() {
        let err = NotationError::Ambiguous {
            notation: "Nd2".to_string(),
            count: 2,
        };
        assert!(err.to_string().contains("Nd2"));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_error_clone() {
        let err = NotationError::Illegal {
            notation: "e2e5".to_string(),
        };
        assert_eq!(err.clone(), err);
    }
}

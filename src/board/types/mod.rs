//! Core board types.
//!
//! - `Piece`, `Color` and `Occupant` - piece kinds, colors, and a piece on a square
//! - `Square` - (rank, file) coordinates for boards up to 16x16
//! - `Move`, `MoveKind` and `MoveList` - resolved moves and their classification
//! - `CastlingRights` - per-side king and rook files that may still castle

mod castling;
mod moves;
mod piece;
mod square;

pub use castling::{CastlingRights, SideRights};
pub use moves::{Move, MoveKind, MoveList};
pub use piece::{Color, Occupant, Piece};
pub use square::{Square, MAX_DIMENSION};

pub(crate) use square::parse_square_prefix;

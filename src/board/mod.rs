//! Board model and move legality.
//!
//! Positions are plain square grids sized by the variant (8x8 up to 12x8 and
//! 9x10). Move generation works square by square from each piece's step and
//! slide rules, so fairy pieces and odd board sizes need no precomputed tables.
//!
//! # Example
//! ```
//! use referee::board::{generate_legal, Position, Variant};
//!
//! let pos = Position::start(Variant::Normal);
//! let (moves, in_check) = generate_legal(&pos, pos.flags(), pos.ep_file());
//! assert_eq!(moves.len(), 20);
//! assert!(!in_check);
//! ```

mod apply;
mod builder;
mod check;
mod disambiguate;
mod end;
mod error;
mod fen;
mod flags;
mod legality;
mod movegen;
mod san;
mod state;
mod types;
mod variant;

#[cfg(test)]
mod tests;

pub use apply::apply_move;
pub use builder::PositionBuilder;
pub use check::{is_in_check, NO_KING};
pub use disambiguate::{disambiguate, Disambiguation, PartialMove};
pub use end::evaluate_end;
pub use error::{FenError, NotationError, SetupError, SquareError};
pub use flags::PositionFlags;
pub use legality::{
    classify, classify_drop, find_legal, find_legal_drop, generate_legal, mate_test, MateStatus,
};
pub use movegen::generate_pseudo_legal;
pub use san::{parse_move, resolve_move, to_algebraic, MoveToken};
pub use state::{EpFile, Holdings, Position};
pub use types::{
    CastlingRights, Color, Move, MoveKind, MoveList, Occupant, Piece, SideRights, Square,
    MAX_DIMENSION,
};
pub use variant::{BareKingRule, CastlingStyle, Dimensions, StalematePolicy, Variant};

pub(crate) use types::parse_square_prefix;

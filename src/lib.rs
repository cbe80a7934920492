//! A referee for xboard-protocol chess engines.
//!
//! The crate keeps the authoritative game: it checks every move against the
//! rules of the chosen variant ([`board`]), drives one or two external
//! engines over the xboard text protocol ([`engine`]), runs the chess clocks
//! ([`clock`]), and ties these together in a mode-driven [`session`].

pub mod board;
pub mod clock;
pub mod config;
pub mod engine;
pub mod result;
pub mod session;
pub mod sync;
pub mod timer;
pub mod trace;

pub use board::{Color, Move, Piece, Position, Square, Variant};
pub use config::{ConfigError, EngineConfig, SessionConfig};
pub use engine::Slot;
pub use result::{EndSource, GameResult};
pub use session::{EventLoop, Notice, Session, SessionError, SessionMode};

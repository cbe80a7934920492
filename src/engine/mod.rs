//! Engine protocol driver.
//!
//! Keeps an external xboard-protocol engine in step with the referee's game:
//! it starts the process, negotiates features, formats outgoing commands for
//! the capabilities the engine declared, and classifies what comes back.
//! Deciding what a classified line *means* for the game is left to
//! [`crate::session`].

mod command;
mod error;
mod features;
mod output;
pub mod scanner;
mod session;
mod transport;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use command::{BoardSetup, Command, MoveText};
pub use error::EngineError;
pub use features::{
    parse_features, Capabilities, FeatureItem, FeatureKey, FeatureKind, FeatureValue, TimeSupport,
};
pub use output::{classify_line, EngineLine, ErrorReply, TellKind, Thinking};
pub use session::{EngineSession, EngineState};
pub use transport::{
    EngineEvent, Incoming, Launcher, MemoryHandle, MemoryLauncher, ProcessLauncher, Transport,
};

/// Which of the two engine seats.
///
/// Sessions live in a two-element array indexed by slot; an engine's
/// opponent is `slot.other()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::First, Slot::Second];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }

    #[inline]
    #[must_use]
    pub const fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::First => f.write_str("first"),
            Slot::Second => f.write_str("second"),
        }
    }
}

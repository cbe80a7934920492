//! Session modes.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::Color;

/// Which source may move next: the user, an engine, a server, or a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SessionMode {
    #[default]
    BeginningOfGame,
    /// The first engine plays `engine_color`, the user the other side
    PlayerVsEngine { engine_color: Color },
    EngineVsEngine,
    /// Playing on a server; the user has `local`
    RemotePlaying { local: Color },
    RemoteObserving,
    RemoteExamining,
    EditGame,
    EditPosition,
    AnalyzeLive,
    AnalyzeLoadedGame,
    ReplayLoadedGame,
    Training,
    EndOfGame,
}

impl SessionMode {
    /// Modes where an engine plays and the clocks run
    #[must_use]
    pub const fn is_machine(self) -> bool {
        matches!(
            self,
            SessionMode::PlayerVsEngine { .. } | SessionMode::EngineVsEngine
        )
    }

    #[must_use]
    pub const fn is_analysis(self) -> bool {
        matches!(self, SessionMode::AnalyzeLive | SessionMode::AnalyzeLoadedGame)
    }

    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(
            self,
            SessionMode::RemotePlaying { .. }
                | SessionMode::RemoteObserving
                | SessionMode::RemoteExamining
        )
    }

    /// Modes in which the clocks run
    #[must_use]
    pub const fn is_timed(self) -> bool {
        self.is_machine() || matches!(self, SessionMode::RemotePlaying { .. })
    }

    /// Modes where a user may enter a move at all
    #[must_use]
    pub const fn accepts_user_moves(self) -> bool {
        matches!(
            self,
            SessionMode::BeginningOfGame
                | SessionMode::PlayerVsEngine { .. }
                | SessionMode::RemotePlaying { .. }
                | SessionMode::RemoteExamining
                | SessionMode::EditGame
                | SessionMode::AnalyzeLive
                | SessionMode::Training
        )
    }

    /// Modes where stepping through the game is allowed
    #[must_use]
    pub const fn allows_navigation(self) -> bool {
        matches!(
            self,
            SessionMode::BeginningOfGame
                | SessionMode::EditGame
                | SessionMode::AnalyzeLive
                | SessionMode::AnalyzeLoadedGame
                | SessionMode::ReplayLoadedGame
                | SessionMode::RemoteExamining
                | SessionMode::EndOfGame
        )
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::BeginningOfGame => f.write_str("beginning of game"),
            SessionMode::PlayerVsEngine { engine_color } => {
                write!(f, "machine plays {}", engine_color.protocol_name())
            }
            SessionMode::EngineVsEngine => f.write_str("two machines"),
            SessionMode::RemotePlaying { local } => {
                write!(f, "playing {} on server", local.protocol_name())
            }
            SessionMode::RemoteObserving => f.write_str("observing"),
            SessionMode::RemoteExamining => f.write_str("examining"),
            SessionMode::EditGame => f.write_str("edit game"),
            SessionMode::EditPosition => f.write_str("edit position"),
            SessionMode::AnalyzeLive => f.write_str("analyze"),
            SessionMode::AnalyzeLoadedGame => f.write_str("analyze file"),
            SessionMode::ReplayLoadedGame => f.write_str("replay"),
            SessionMode::Training => f.write_str("training"),
            SessionMode::EndOfGame => f.write_str("end of game"),
        }
    }
}

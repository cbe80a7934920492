//! Game results and where they came from.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::Color;

/// Final (or pending) result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Unfinished,
}

impl GameResult {
    /// PGN-style tag: `1-0`, `0-1`, `1/2-1/2` or `*`
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Unfinished => "*",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<GameResult> {
        match tag {
            "1-0" => Some(GameResult::WhiteWins),
            "0-1" => Some(GameResult::BlackWins),
            "1/2-1/2" => Some(GameResult::Draw),
            "*" => Some(GameResult::Unfinished),
            _ => None,
        }
    }

    /// The result in which `color` wins
    #[must_use]
    pub const fn win_for(color: Color) -> GameResult {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }

    #[must_use]
    pub const fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWins => Some(Color::White),
            GameResult::BlackWins => Some(Color::Black),
            GameResult::Draw | GameResult::Unfinished => None,
        }
    }

    /// True for a decided game (win or draw)
    #[must_use]
    pub const fn is_decisive_or_drawn(self) -> bool {
        !matches!(self, GameResult::Unfinished)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Who declared the game over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EndSource {
    /// A local move produced mate or stalemate, or the user resigned
    Player,
    /// An engine announced the result
    Engine(crate::engine::Slot),
    /// The remote server reported it
    Remote,
    /// A loaded game ended
    File,
    /// The referee adjudicated (flag fall, forfeit, variant rule)
    Adjudication,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for result in [
            GameResult::WhiteWins,
            GameResult::BlackWins,
            GameResult::Draw,
            GameResult::Unfinished,
        ] {
            assert_eq!(GameResult::from_tag(result.tag()), Some(result));
        }
        assert_eq!(GameResult::from_tag("2-0"), None);
    }

    #[test]
    fn test_winner() {
        assert_eq!(GameResult::win_for(Color::Black).winner(), Some(Color::Black));
        assert_eq!(GameResult::Draw.winner(), None);
        assert!(!GameResult::Unfinished.is_decisive_or_drawn());
    }
}

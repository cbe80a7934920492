//! Engine-vs-engine match bookkeeping.

use crate::board::Color;
use crate::engine::Slot;
use crate::result::GameResult;

/// Score and schedule of an N-game match between the two engines.
///
/// The first engine has White in odd-numbered games.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchState {
    games: u32,
    /// 1-based number of the game being played
    game: u32,
    wins: [u32; 2],
    draws: u32,
    finished: bool,
}

impl MatchState {
    #[must_use]
    pub fn new(games: u32) -> Self {
        MatchState {
            games,
            game: 1,
            wins: [0; 2],
            draws: 0,
            finished: games == 0,
        }
    }

    #[must_use]
    pub fn game_number(&self) -> u32 {
        self.game
    }

    #[must_use]
    pub fn games(&self) -> u32 {
        self.games
    }

    /// The engine playing `color` in the current game
    #[must_use]
    pub fn slot_for(&self, color: Color) -> Slot {
        let first_is_white = self.game % 2 == 1;
        match (color, first_is_white) {
            (Color::White, true) | (Color::Black, false) => Slot::First,
            _ => Slot::Second,
        }
    }

    #[must_use]
    pub fn wins(&self, slot: Slot) -> u32 {
        self.wins[slot.index()]
    }

    #[must_use]
    pub fn draws(&self) -> u32 {
        self.draws
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop the match early; the remaining games are not played.
    pub fn abort(&mut self) {
        self.finished = true;
    }

    /// Score the current game and move on. Returns true while games remain.
    pub fn record(&mut self, result: GameResult) -> bool {
        match result.winner() {
            Some(color) => self.wins[self.slot_for(color).index()] += 1,
            None if result == GameResult::Draw => self.draws += 1,
            None => {}
        }
        self.game += 1;
        self.finished = self.game > self.games;
        !self.finished
    }

    /// `Match A vs. B: final score W-L-D`, from the first engine's side.
    #[must_use]
    pub fn final_score(&self, first: &str, second: &str) -> String {
        format!(
            "Match {first} vs. {second}: final score {}-{}-{}",
            self.wins[0], self.wins[1], self.draws
        )
    }
}

//! The ply arena.
//!
//! Plies are numbered from the start of the game; ply 0 has White to move,
//! so a game set up with Black to move starts at ply 1. Storage is a ring of
//! the retained plies with three indices:
//!
//! - `earliest`: oldest ply still stored
//! - `current`: the ply on display
//! - `latest`: the furthest ply known
//!
//! Lookups by ply number are O(1). With a retention limit, the oldest plies
//! are dropped as the game grows.

use std::collections::VecDeque;

use crate::board::{Move, Position};
use crate::clock::ClockSnapshot;
use crate::engine::Thinking;

/// The move that left a ply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlyRecord {
    pub mv: Move,
    pub san: String,
    pub coordinate: String,
    /// What the engine reported while finding the move
    pub thinking: Option<Thinking>,
}

#[derive(Clone, Debug)]
pub struct GameHistory {
    earliest: usize,
    current: usize,
    /// `positions[i]` is ply `earliest + i`
    positions: VecDeque<Position>,
    /// Clocks when each stored ply was reached
    clocks: VecDeque<ClockSnapshot>,
    /// `moves[i]` leads from ply `earliest + i` to the next
    moves: VecDeque<PlyRecord>,
    retain: Option<usize>,
}

impl GameHistory {
    #[must_use]
    pub fn new(start: Position, start_ply: usize, clocks: ClockSnapshot) -> Self {
        GameHistory {
            earliest: start_ply,
            current: start_ply,
            positions: VecDeque::from([start]),
            clocks: VecDeque::from([clocks]),
            moves: VecDeque::new(),
            retain: None,
        }
    }

    /// Keep at most `plies` moves; older ones are forgotten.
    #[must_use]
    pub fn with_retention(mut self, plies: usize) -> Self {
        self.retain = Some(plies.max(1));
        self
    }

    /// Start over from `start`.
    pub fn reset(&mut self, start: Position, start_ply: usize, clocks: ClockSnapshot) {
        let retain = self.retain;
        *self = GameHistory::new(start, start_ply, clocks);
        self.retain = retain;
    }

    #[must_use]
    pub fn earliest(&self) -> usize {
        self.earliest
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn latest(&self) -> usize {
        self.earliest + self.moves.len()
    }

    /// Number of moves stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[must_use]
    pub fn position(&self, ply: usize) -> Option<&Position> {
        self.positions.get(ply.checked_sub(self.earliest)?)
    }

    #[must_use]
    pub fn clocks_at(&self, ply: usize) -> Option<ClockSnapshot> {
        self.clocks.get(ply.checked_sub(self.earliest)?).copied()
    }

    /// The move played from `ply`
    #[must_use]
    pub fn record(&self, ply: usize) -> Option<&PlyRecord> {
        self.moves.get(ply.checked_sub(self.earliest)?)
    }

    /// Position at the first stored ply
    pub fn start_position(&self) -> &Position {
        &self.positions[0]
    }

    pub fn current_position(&self) -> &Position {
        &self.positions[self.current - self.earliest]
    }

    pub fn latest_position(&self) -> &Position {
        &self.positions[self.positions.len() - 1]
    }

    /// Moves from the earliest stored ply, in order
    pub fn records(&self) -> impl Iterator<Item = &PlyRecord> + '_ {
        self.moves.iter()
    }

    /// Append a move at the current ply, dropping any plies after it.
    pub fn push(&mut self, record: PlyRecord, next: Position, clocks: ClockSnapshot) {
        self.truncate_after_current();
        self.moves.push_back(record);
        self.positions.push_back(next);
        self.clocks.push_back(clocks);
        self.current = self.latest();
        if let Some(limit) = self.retain {
            while self.moves.len() > limit {
                self.moves.pop_front();
                self.positions.pop_front();
                self.clocks.pop_front();
                self.earliest += 1;
            }
            self.current = self.current.max(self.earliest);
        }
    }

    /// Forget every ply after the current one. Returns how many went.
    pub fn truncate_after_current(&mut self) -> usize {
        let keep = self.current - self.earliest;
        let dropped = self.moves.len() - keep;
        self.moves.truncate(keep);
        self.positions.truncate(keep + 1);
        self.clocks.truncate(keep + 1);
        dropped
    }

    /// Take back the latest move.
    pub fn rollback_latest(&mut self) -> Option<PlyRecord> {
        let record = self.moves.pop_back()?;
        self.positions.pop_back();
        self.clocks.pop_back();
        self.current = self.current.min(self.latest());
        Some(record)
    }

    /// Attach engine output to the latest move.
    pub fn set_latest_thinking(&mut self, thinking: Thinking) {
        if let Some(record) = self.moves.back_mut() {
            record.thinking = Some(thinking);
        }
    }

    pub fn forward(&mut self) -> bool {
        if self.current < self.latest() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn backward(&mut self) -> bool {
        if self.current > self.earliest {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn to_start(&mut self) {
        self.current = self.earliest;
    }

    pub fn to_end(&mut self) {
        self.current = self.latest();
    }
}

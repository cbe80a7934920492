//! The game clocks.
//!
//! Two counters of remaining milliseconds, one running at a time. The clock
//! does not own a timer: after [`ClockManager::start`], [`ClockManager::switch`]
//! or [`ClockManager::tick`] the caller re-arms its tick timer for
//! [`ClockManager::next_tick`], which lands on the next whole second (or tenth
//! of a second under ten seconds) of the running side's display.

pub mod time;

use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::Color;
use crate::timer::SharedTime;

pub use time::{centiseconds, format_clock, format_level_base, parse_time_text, TimeControl};

/// Slack for a tick that wakes up slightly early (ms).
const FUDGE_MS: i64 = 25;

/// Both clocks at one instant, stored with every ply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockSnapshot {
    pub white_ms: i64,
    pub black_ms: i64,
}

impl ClockSnapshot {
    #[must_use]
    pub const fn get(&self, color: Color) -> i64 {
        match color {
            Color::White => self.white_ms,
            Color::Black => self.black_ms,
        }
    }
}

/// A flag that has just fallen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagFall {
    pub color: Color,
    /// The other side's flag fell earlier
    pub both: bool,
}

/// Delay until the next interesting boundary of a clock showing `remaining_ms`.
///
/// Whole seconds normally, tenths once ten seconds or less remain.
#[must_use]
pub fn next_tick_length(remaining_ms: i64) -> i64 {
    let nominal = if remaining_ms > 0 && remaining_ms <= time::TENTHS_THRESHOLD_MS {
        100
    } else {
        1000
    };
    let next = remaining_ms % nominal;
    if next <= 0 {
        next + nominal
    } else {
        next
    }
}

/// Remaining time per side, which side is running, and flag state.
pub struct ClockManager {
    time: SharedTime,
    enabled: bool,
    base_ms: i64,
    increment_ms: i64,
    moves_per_session: u32,
    remaining: [i64; 2],
    fallen: [bool; 2],
    moves_made: [u32; 2],
    on_move: Color,
    running: bool,
    tick_start: Instant,
    intended_tick_ms: i64,
}

impl std::fmt::Debug for ClockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockManager")
            .field("enabled", &self.enabled)
            .field("remaining", &self.remaining)
            .field("on_move", &self.on_move)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl ClockManager {
    /// Clocks for `control`. Disabled clocks never run or fall.
    #[must_use]
    pub fn new(control: &TimeControl, enabled: bool, time: SharedTime) -> Self {
        let now = time.now();
        let mut clock = ClockManager {
            time,
            enabled: enabled && !control.is_fixed_per_move(),
            base_ms: 0,
            increment_ms: 0,
            moves_per_session: 0,
            remaining: [0; 2],
            fallen: [false; 2],
            moves_made: [0; 2],
            on_move: Color::White,
            running: false,
            tick_start: now,
            intended_tick_ms: 0,
        };
        clock.reset(
            control.base_ms(),
            control.increment_ms(),
            control.moves_per_session(),
        );
        clock
    }

    /// Stop the clocks and set both to a fresh control.
    ///
    /// `moves_per_session` of 0 means the base time covers the whole game.
    pub fn reset(&mut self, base_ms: u64, increment_ms: u64, moves_per_session: u32) {
        self.running = false;
        self.base_ms = i64::try_from(base_ms).unwrap_or(i64::MAX);
        self.increment_ms = i64::try_from(increment_ms).unwrap_or(i64::MAX);
        self.moves_per_session = moves_per_session;
        self.remaining = [self.base_ms; 2];
        self.fallen = [false; 2];
        self.moves_made = [0; 2];
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn on_move(&self) -> Color {
        self.on_move
    }

    /// Set whose clock runs next (new game, loaded position). Stops the clocks.
    pub fn set_on_move(&mut self, color: Color) {
        self.stop();
        self.on_move = color;
    }

    /// Start the clock of the side on move; restarts it if already running.
    pub fn start(&mut self) -> Option<FlagFall> {
        self.running = false;
        if let Some(fall) = self.check_flags() {
            return Some(fall);
        }
        if !self.enabled {
            return None;
        }
        self.tick_start = self.time.now();
        self.intended_tick_ms = next_tick_length(self.remaining[self.on_move.index()]);
        self.running = true;
        None
    }

    /// Stop both clocks, charging the running side for the partial tick.
    pub fn stop(&mut self) -> Option<FlagFall> {
        if !self.running {
            return None;
        }
        self.running = false;
        let elapsed = self.elapsed_ms();
        self.remaining[self.on_move.index()] -= elapsed;
        self.check_flags()
    }

    /// A move was completed: charge the mover, apply increment and session
    /// bonus, and hand the clock to the other side.
    ///
    /// The other clock runs afterwards only if the mover's clock was running.
    pub fn switch(&mut self) -> Option<FlagFall> {
        let mover = self.on_move;
        let was_running = self.running;
        let mut fall = None;
        if was_running {
            let elapsed = self.elapsed_ms();
            self.remaining[mover.index()] -= elapsed;
            fall = self.check_flags();
        }
        if self.enabled {
            self.apply_time_control(mover);
        }
        self.on_move = mover.opponent();
        self.running = false;
        if fall.is_some() || !was_running {
            return fall;
        }
        self.tick_start = self.time.now();
        self.intended_tick_ms = next_tick_length(self.remaining[self.on_move.index()]);
        self.running = true;
        None
    }

    fn apply_time_control(&mut self, mover: Color) {
        let idx = mover.index();
        self.moves_made[idx] += 1;
        self.remaining[idx] += self.increment_ms;
        if self.moves_per_session > 0 && self.moves_made[idx] % self.moves_per_session == 0 {
            self.remaining[idx] += self.base_ms;
        }
    }

    /// The tick timer fired: charge the running side and compute the next tick.
    pub fn tick(&mut self) -> Option<FlagFall> {
        if !self.running {
            return None;
        }
        let now = self.time.now();
        let last_tick = self.elapsed_ms();
        let mut fudge = self.intended_tick_ms - last_tick;
        if !(0..=FUDGE_MS).contains(&fudge) {
            fudge = 0;
        }
        let idx = self.on_move.index();
        self.remaining[idx] -= last_tick;
        let fall = self.check_flags();
        self.tick_start = now;
        self.intended_tick_ms = next_tick_length(self.remaining[idx] - fudge) + fudge;
        fall
    }

    /// When the tick timer should fire next, if the clock runs.
    #[must_use]
    pub fn next_tick(&self) -> Option<Duration> {
        if !self.running {
            return None;
        }
        let ms = u64::try_from(self.intended_tick_ms.max(1)).unwrap_or(1);
        Some(Duration::from_millis(ms))
    }

    /// Remaining time as of the last tick, switch or stop.
    #[must_use]
    pub fn remaining(&self, side: Color) -> i64 {
        self.remaining[side.index()]
    }

    /// Remaining time including the current partial tick.
    #[must_use]
    pub fn remaining_now(&self, side: Color) -> i64 {
        let mut ms = self.remaining[side.index()];
        if self.running && side == self.on_move {
            ms -= self.elapsed_ms();
        }
        ms
    }

    #[must_use]
    pub fn flag_fallen(&self, side: Color) -> bool {
        self.fallen[side.index()]
    }

    #[must_use]
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            white_ms: self.remaining_now(Color::White),
            black_ms: self.remaining_now(Color::Black),
        }
    }

    /// Put both clocks back to a stored state (takeback, rollback).
    ///
    /// Flags are raised again only for clocks that are still out of time.
    pub fn restore(&mut self, snapshot: ClockSnapshot, on_move: Color) {
        let was_running = self.running;
        self.running = false;
        self.remaining = [snapshot.white_ms, snapshot.black_ms];
        for color in Color::BOTH {
            self.fallen[color.index()] = self.enabled && self.remaining[color.index()] <= 0;
        }
        if on_move != self.on_move {
            let made = &mut self.moves_made[on_move.index()];
            *made = made.saturating_sub(1);
        }
        self.on_move = on_move;
        if was_running && self.enabled {
            self.tick_start = self.time.now();
            self.intended_tick_ms = next_tick_length(self.remaining[on_move.index()]);
            self.running = true;
        }
    }

    fn elapsed_ms(&self) -> i64 {
        let elapsed = self.time.now().saturating_duration_since(self.tick_start);
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    }

    fn check_flags(&mut self) -> Option<FlagFall> {
        for color in Color::BOTH {
            let idx = color.index();
            if self.remaining[idx] <= 0 && !self.fallen[idx] && self.enabled {
                self.fallen[idx] = true;
                return Some(FlagFall {
                    color,
                    both: self.fallen[color.opponent().index()],
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::timer::{ManualClock, TimeSource};

    fn clocks(base_ms: u64, increment_ms: u64, mps: u32) -> (ClockManager, ManualClock) {
        let manual = ManualClock::new();
        let time: SharedTime = Arc::new(manual.clone());
        let mut clock = ClockManager::new(&TimeControl::default(), true, time);
        clock.reset(base_ms, increment_ms, mps);
        (clock, manual)
    }

    #[test]
    fn test_next_tick_length() {
        assert_eq!(next_tick_length(60_000), 1000);
        assert_eq!(next_tick_length(60_400), 400);
        assert_eq!(next_tick_length(9_950), 50);
        assert_eq!(next_tick_length(10_000), 100);
        assert_eq!(next_tick_length(-300), 700);
    }

    #[test]
    fn test_ticks_land_on_second_boundaries() {
        let (mut clock, manual) = clocks(60_400, 0, 0);
        assert_eq!(clock.start(), None);
        assert_eq!(clock.next_tick(), Some(Duration::from_millis(400)));
        manual.advance_ms(400);
        clock.tick();
        assert_eq!(clock.remaining(Color::White), 60_000);
        assert_eq!(clock.next_tick(), Some(Duration::from_millis(1000)));
        assert_eq!(clock.remaining(Color::Black), 60_400);
    }

    #[test]
    fn test_switch_charges_mover_and_adds_increment() {
        let (mut clock, manual) = clocks(60_000, 2_000, 0);
        clock.start();
        manual.advance_ms(3_500);
        assert_eq!(clock.switch(), None);
        assert_eq!(clock.remaining(Color::White), 58_500);
        assert_eq!(clock.on_move(), Color::Black);
        assert!(clock.is_running());
        manual.advance_ms(1_000);
        assert_eq!(clock.remaining_now(Color::Black), 59_000);
        clock.stop();
        assert_eq!(clock.remaining(Color::Black), 59_000);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_session_bonus() {
        let (mut clock, _) = clocks(10_000, 0, 2);
        for _ in 0..4 {
            clock.switch();
        }
        assert_eq!(clock.remaining(Color::White), 20_000);
        assert_eq!(clock.remaining(Color::Black), 20_000);
    }

    #[test]
    fn test_flag_fall_reported_once() {
        let (mut clock, manual) = clocks(1_000, 0, 0);
        clock.start();
        manual.advance_ms(1_200);
        let fall = clock.tick().unwrap();
        assert_eq!(fall.color, Color::White);
        assert!(!fall.both);
        manual.advance_ms(500);
        assert_eq!(clock.tick(), None);
        assert!(clock.flag_fallen(Color::White));
    }

    #[test]
    fn test_both_flags() {
        let (mut clock, manual) = clocks(1_000, 0, 0);
        clock.start();
        manual.advance_ms(1_500);
        assert!(clock.switch().is_some());
        clock.start();
        manual.advance_ms(1_500);
        let fall = clock.tick().unwrap();
        assert_eq!(fall.color, Color::Black);
        assert!(fall.both);
    }

    #[test]
    fn test_restore_snapshot() {
        let (mut clock, manual) = clocks(60_000, 0, 0);
        let before = clock.snapshot();
        clock.start();
        manual.advance_ms(5_000);
        clock.switch();
        clock.restore(before, Color::White);
        assert_eq!(clock.remaining(Color::White), 60_000);
        assert_eq!(clock.on_move(), Color::White);
        assert!(clock.is_running());
    }

    #[test]
    fn test_disabled_clock_never_runs() {
        let manual = ManualClock::new();
        let mut clock = ClockManager::new(&TimeControl::default(), false, Arc::new(manual.clone()));
        assert_eq!(clock.start(), None);
        assert!(!clock.is_running());
        manual.advance_ms(10 * 60_000);
        clock.switch();
        assert_eq!(clock.remaining(Color::White), 300_000);
        assert!(!clock.flag_fallen(Color::White));
    }
}

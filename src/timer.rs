//! One-shot timers for the event loop.
//!
//! The referee is single-threaded: nothing fires on its own. The event loop
//! asks the [`Scheduler`] for the next deadline, sleeps on its input channel
//! until then, and collects the timers that are due. Each [`TimerKind`] has at
//! most one pending deadline; scheduling a kind again replaces the old one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::engine::Slot;

/// Where "now" comes from. Tests substitute a [`ManualClock`].
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Shared handle to a time source.
pub type SharedTime = Arc<dyn TimeSource>;

/// The monotonic system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        ManualClock(Arc::new(Mutex::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock();
        *now += by;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

/// Duration from `now` until `deadline`, or `None` when it has passed.
#[inline]
#[must_use]
pub fn duration_until(deadline: Instant, now: Instant) -> Option<Duration> {
    if deadline > now {
        Some(deadline - now)
    } else {
        None
    }
}

/// What a timer is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Next clock decrement
    ClockTick,
    /// Give up waiting for `feature done=1` from an engine
    FeatureTimeout(Slot),
    /// Both engines must answer their pings before a two-engine game starts
    WaitForEngines,
    /// Step a loaded game forward
    ReplayStep,
    /// Start the next game of a match
    NextMatchGame,
}

impl TimerKind {
    /// True when the timer belongs to one engine and dies with it
    #[must_use]
    pub fn references(self, slot: Slot) -> bool {
        matches!(self, TimerKind::FeatureTimeout(s) if s == slot)
    }
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    kind: TimerKind,
    deadline: Instant,
    seq: u64,
}

/// Pending one-shot timers, at most one per kind.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire `delay` after `now`, cancelling any earlier arming.
    pub fn schedule(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.schedule_at(kind, now + delay);
    }

    pub fn schedule_at(&mut self, kind: TimerKind, deadline: Instant) {
        self.cancel(kind);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            kind,
            deadline,
            seq,
        });
        crate::trace_debug!("timer {kind:?} armed");
    }

    /// Cancel `kind`. Returns whether it was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.kind != kind);
        before != self.pending.len()
    }

    /// Cancel every timer that refers to `slot`.
    pub fn cancel_for_engine(&mut self, slot: Slot) {
        self.pending.retain(|p| !p.kind.references(slot));
    }

    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|p| p.kind == kind)
    }

    #[must_use]
    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.pending
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.deadline)
    }

    /// Earliest pending deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    /// Remove and return the earliest timer due at `now`.
    ///
    /// Timers with equal deadlines come out in the order they were armed.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerKind> {
        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= now)
            .min_by_key(|(_, p)| (p.deadline, p.seq))?;
        Some(self.pending.swap_remove(idx).kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_replaces_previous_deadline() {
        let clock = ManualClock::new();
        let now = clock.now();
        let mut timers = Scheduler::new();
        timers.schedule(TimerKind::ReplayStep, now, Duration::from_millis(100));
        timers.schedule(TimerKind::ReplayStep, now, Duration::from_millis(500));
        assert_eq!(timers.len(), 1);
        clock.advance_ms(200);
        assert_eq!(timers.pop_due(clock.now()), None);
        clock.advance_ms(300);
        assert_eq!(timers.pop_due(clock.now()), Some(TimerKind::ReplayStep));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_due_timers_in_deadline_order() {
        let clock = ManualClock::new();
        let now = clock.now();
        let mut timers = Scheduler::new();
        timers.schedule(TimerKind::NextMatchGame, now, Duration::from_millis(30));
        timers.schedule(TimerKind::ClockTick, now, Duration::from_millis(10));
        timers.schedule(TimerKind::ReplayStep, now, Duration::from_millis(10));
        assert_eq!(timers.next_deadline(), Some(now + Duration::from_millis(10)));
        clock.advance_ms(50);
        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(clock.now())).collect();
        assert_eq!(
            fired,
            vec![
                TimerKind::ClockTick,
                TimerKind::ReplayStep,
                TimerKind::NextMatchGame
            ]
        );
    }

    #[test]
    fn test_cancel_for_engine() {
        let now = Instant::now();
        let mut timers = Scheduler::new();
        timers.schedule(TimerKind::FeatureTimeout(Slot::First), now, Duration::from_secs(10));
        timers.schedule(TimerKind::FeatureTimeout(Slot::Second), now, Duration::from_secs(10));
        timers.schedule(TimerKind::ClockTick, now, Duration::from_secs(1));
        timers.cancel_for_engine(Slot::Second);
        assert!(timers.is_pending(TimerKind::FeatureTimeout(Slot::First)));
        assert!(!timers.is_pending(TimerKind::FeatureTimeout(Slot::Second)));
        assert!(timers.cancel(TimerKind::ClockTick));
        assert!(!timers.cancel(TimerKind::ClockTick));
    }

    #[test]
    fn test_duration_until() {
        let now = Instant::now();
        assert_eq!(duration_until(now, now), None);
        assert_eq!(
            duration_until(now + Duration::from_millis(5), now),
            Some(Duration::from_millis(5))
        );
    }
}

//! Flags shared between the event loop and engine reader threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared "stop" signal.
///
/// Reader threads poll it between lines; once set, they deliver nothing more
/// and exit when their stream ends. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        StopFlag(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns a guard that sets the flag when dropped.
    #[must_use]
    pub fn guard(&self) -> StopOnDrop {
        StopOnDrop(self.clone())
    }
}

/// Sets its [`StopFlag`] when dropped, detaching whatever thread watches it.
#[derive(Debug)]
pub struct StopOnDrop(StopFlag);

impl StopOnDrop {
    #[must_use]
    pub fn flag(&self) -> &StopFlag {
        &self.0
    }
}

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!other.is_stopped());
        flag.stop();
        assert!(other.is_stopped());
    }

    #[test]
    fn test_guard_stops_on_drop() {
        let flag = StopFlag::new();
        {
            let guard = flag.guard();
            assert!(!guard.flag().is_stopped());
        }
        assert!(flag.is_stopped());
    }

    #[test]
    fn test_reader_thread_detaches() {
        let flag = StopFlag::new();
        let seen = flag.clone();
        let handle = std::thread::spawn(move || {
            let mut polls = 0u32;
            while !seen.is_stopped() {
                polls += 1;
                std::thread::yield_now();
            }
            polls
        });
        flag.stop();
        assert!(handle.join().is_ok());
    }
}

//! Single-threaded dispatch of engine output and timers.
//!
//! Engine reader threads only ever send [`Incoming`] events down a channel;
//! all game state lives on the thread running the loop.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::config::SessionConfig;
use crate::engine::{Incoming, Launcher};
use crate::timer::{duration_until, SharedTime};

use super::{Notice, Session, SessionError};

pub struct EventLoop {
    session: Session,
    events: Receiver<Incoming>,
    time: SharedTime,
}

impl EventLoop {
    pub fn new(
        config: SessionConfig,
        launcher: Box<dyn Launcher>,
        time: SharedTime,
    ) -> Result<Self, SessionError> {
        let (tx, rx) = mpsc::channel();
        let session = Session::new(config, launcher, time.clone(), tx)?;
        Ok(EventLoop {
            session,
            events: rx,
            time,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Handle every queued event and every due timer, until neither is
    /// left. Returns how many were handled.
    pub fn run_pending(&mut self) -> usize {
        let mut total = 0;
        loop {
            let mut handled = 0;
            while let Ok(incoming) = self.events.try_recv() {
                self.session.handle_incoming(incoming);
                handled += 1;
            }
            handled += self.session.fire_due_timers();
            if handled == 0 {
                return total;
            }
            total += handled;
        }
    }

    /// Block until an event arrives or a timer falls due, waiting at most
    /// `max_wait`, then handle everything pending.
    pub fn run_once(&mut self, max_wait: Duration) -> usize {
        let wait = match self.session.next_deadline() {
            Some(deadline) => duration_until(deadline, self.time.now())
                .unwrap_or(Duration::ZERO)
                .min(max_wait),
            None => max_wait,
        };
        match self.events.recv_timeout(wait) {
            Ok(incoming) => {
                self.session.handle_incoming(incoming);
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => self.run_pending(),
        }
    }

    /// Run until `done` says so, passing every notice to `on_notice`.
    pub fn run_until<D, N>(&mut self, mut done: D, mut on_notice: N)
    where
        D: FnMut(&Session) -> bool,
        N: FnMut(Notice),
    {
        const POLL: Duration = Duration::from_millis(100);
        loop {
            for notice in self.session.take_notices() {
                on_notice(notice);
            }
            if done(&self.session) {
                return;
            }
            self.run_once(POLL);
        }
    }

    /// Quit the engines and hand back the session.
    pub fn shutdown(mut self) -> Session {
        self.session.shutdown();
        self.session
    }
}

//! The game session.
//!
//! A [`Session`] owns the game history, the clocks and both engine seats, and
//! decides what every event means for the game in the current
//! [`SessionMode`]. It never blocks waiting for an engine: engine output
//! arrives as [`Incoming`] events and deadlines as [`TimerKind`] firings,
//! both fed in by the [`EventLoop`].
//!
//! Everything the front end should show is queued as a [`Notice`] and
//! drained with [`Session::take_notices`].

mod engine_io;
mod error;
mod event_loop;
mod history;
mod match_play;
mod mode;
mod moves;
mod transitions;

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::board::{Color, Move, Position};
use crate::clock::{ClockManager, FlagFall};
use crate::config::SessionConfig;
use crate::engine::{
    BoardSetup, Command, EngineError, EngineSession, EngineState, Incoming, Launcher, MoveText,
    Slot, TellKind, Thinking,
};
use crate::result::{EndSource, GameResult};
use crate::timer::{Scheduler, SharedTime, TimerKind};

pub use error::SessionError;
pub use event_loop::EventLoop;
pub use history::{GameHistory, PlyRecord};
pub use match_play::MatchState;
pub use mode::SessionMode;

/// Delay before re-checking whether both engines answered their pings
const WAIT_FOR_ENGINES_MS: u64 = 1000;

/// Something for the user to see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    /// A move was refused or could not be understood
    MoveError(String),
    /// An engine failed; `os_code` is the OS error when there was one
    Fatal { message: String, os_code: Option<i32> },
    EngineMessage { slot: Slot, kind: TellKind, text: String },
    Hint { slot: Slot, text: String },
    Thinking { slot: Slot, thinking: Thinking },
    /// Progress of an analysing engine
    SearchStatus { slot: Slot, depth: u32, nodes: u64, time_cs: u64 },
    MovePlayed { ply: usize, san: String },
    GameEnd { result: GameResult, detail: String },
    MatchOver(String),
    ModeChanged(SessionMode),
    /// A local move to be sent to the server
    Remote(String),
}

pub struct Session {
    config: SessionConfig,
    mode: SessionMode,
    history: GameHistory,
    clock: ClockManager,
    engines: [EngineSession; 2],
    launcher: Box<dyn Launcher>,
    events: Sender<Incoming>,
    timers: Scheduler,
    time: SharedTime,
    notices: Vec<Notice>,
    result: GameResult,
    result_detail: String,
    end_source: Option<EndSource>,
    /// Set while a game end is being processed
    ending: bool,
    match_state: Option<MatchState>,
    /// Engine-vs-engine: the second engine still needs `go`
    first_move: bool,
    /// Engine-vs-engine start is waiting for both engines
    awaiting_engines: bool,
    /// Latest thinking per engine, attached to its next move
    thinking: [Option<Thinking>; 2],
    /// Moves of a loaded game, from the history's first ply
    loaded: Option<Vec<Move>>,
    /// Board being set up in EditPosition
    edit_board: Option<Position>,
    /// The game started from a position engines must be sent
    setup_start: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("current", &self.history.current())
            .field("latest", &self.history.latest())
            .field("result", &self.result)
            .field("engines", &self.engines)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session at the configured start position. No engine is started yet.
    pub fn new(
        config: SessionConfig,
        launcher: Box<dyn Launcher>,
        time: SharedTime,
        events: Sender<Incoming>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let start = config.start_position()?;
        let side = start.side_to_move();
        let mut clock = ClockManager::new(&config.time_control, config.clock_mode, time.clone());
        clock.set_on_move(side);
        let history = GameHistory::new(start, start_ply(side), clock.snapshot());
        let engines = [
            EngineSession::new(Slot::First, config.first.clone()),
            EngineSession::new(Slot::Second, config.second.clone()),
        ];
        let match_state = (config.match_games > 0).then(|| MatchState::new(config.match_games));
        let setup_start = config.start_fen.is_some() || config.variant.is_shuffle();
        Ok(Session {
            config,
            mode: SessionMode::BeginningOfGame,
            history,
            clock,
            engines,
            launcher,
            events,
            timers: Scheduler::new(),
            time,
            notices: Vec::new(),
            result: GameResult::Unfinished,
            result_detail: String::new(),
            end_source: None,
            ending: false,
            match_state,
            first_move: false,
            awaiting_engines: false,
            thinking: [None, None],
            loaded: None,
            edit_board: None,
            setup_start,
        })
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    #[must_use]
    pub fn clock(&self) -> &ClockManager {
        &self.clock
    }

    #[must_use]
    pub fn engine(&self, slot: Slot) -> &EngineSession {
        &self.engines[slot.index()]
    }

    #[must_use]
    pub fn result(&self) -> GameResult {
        self.result
    }

    #[must_use]
    pub fn result_detail(&self) -> &str {
        &self.result_detail
    }

    #[must_use]
    pub fn end_source(&self) -> Option<EndSource> {
        self.end_source
    }

    #[must_use]
    pub fn match_state(&self) -> Option<&MatchState> {
        self.match_state.as_ref()
    }

    /// The board being edited, in EditPosition
    #[must_use]
    pub fn edit_board(&self) -> Option<&Position> {
        self.edit_board.as_ref()
    }

    /// Drain the queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Earliest pending timer
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    #[must_use]
    pub fn is_timer_pending(&self, kind: TimerKind) -> bool {
        self.timers.is_pending(kind)
    }

    /// Fire every timer due at the current time. Returns how many fired.
    pub fn fire_due_timers(&mut self) -> usize {
        let now = self.time.now();
        let mut fired = 0;
        while let Some(kind) = self.timers.pop_due(now) {
            self.handle_timer(kind);
            fired += 1;
        }
        fired
    }

    pub fn handle_timer(&mut self, kind: TimerKind) {
        crate::trace_debug!("timer {kind:?} fired");
        match kind {
            TimerKind::ClockTick => {
                let fall = self.clock.tick();
                self.rearm_clock();
                if let Some(fall) = fall {
                    self.on_flag_fall(fall);
                }
            }
            TimerKind::FeatureTimeout(slot) => {
                crate::trace_warn!("{slot} engine: no feature done=1, assuming protocol 1");
                self.on_negotiation_complete(slot, true);
            }
            TimerKind::WaitForEngines => self.try_start_two_machines(),
            TimerKind::ReplayStep => self.replay_step(),
            TimerKind::NextMatchGame => self.next_match_game(),
        }
    }

    /// Quit both engines.
    pub fn shutdown(&mut self) {
        let grace = Duration::from_millis(self.config.quit_grace_ms);
        for slot in Slot::BOTH {
            self.timers.cancel_for_engine(slot);
            self.engines[slot.index()].terminate(grace);
        }
        self.timers = Scheduler::new();
    }

    /// End the game.
    ///
    /// Stops the clocks, tells the engines, and idles or quits them. In a
    /// match the next game is scheduled, or the final score reported.
    pub fn game_ends(&mut self, result: GameResult, detail: &str, source: EndSource) {
        if self.ending {
            return;
        }
        self.ending = true;
        let prior = self.mode;
        crate::trace_info!("game ends in {prior}: {result} {{{detail}}} ({source:?})");

        let _ = self.clock.stop();
        self.timers.cancel(TimerKind::ClockTick);
        self.timers.cancel(TimerKind::WaitForEngines);
        self.awaiting_engines = false;
        self.result = result;
        self.result_detail = detail.to_string();
        self.end_source = Some(source);
        self.notify(Notice::GameEnd {
            result,
            detail: detail.to_string(),
        });

        let playing = prior.is_machine() || prior == SessionMode::BeginningOfGame;
        if playing {
            for slot in Slot::BOTH {
                if self.engine_ready(slot) {
                    let _ = self.send_to(
                        slot,
                        Command::Result {
                            result,
                            detail: detail.to_string(),
                        },
                    );
                }
            }
        }

        let next = match prior {
            SessionMode::EditGame
            | SessionMode::ReplayLoadedGame
            | SessionMode::AnalyzeLive
            | SessionMode::AnalyzeLoadedGame => prior,
            _ => SessionMode::EndOfGame,
        };
        self.set_mode(next);

        if playing {
            self.idle_engines(result);
        }
        if prior == SessionMode::EngineVsEngine {
            self.match_game_over(result);
        }
        self.ending = false;
    }

    /// After a game: reusable engines are parked, the rest quit.
    fn idle_engines(&mut self, result: GameResult) {
        let grace = Duration::from_millis(self.config.quit_grace_ms);
        for slot in Slot::BOTH {
            if !self.engine_ready(slot) {
                continue;
            }
            let engine = &mut self.engines[slot.index()];
            engine.color = None;
            engine.offered_draw = 0;
            let reuse = engine.caps().reuse;
            if reuse {
                if self.send_to(slot, Command::Force).is_ok() {
                    let _ = self.ping_engine(slot);
                    let engine = &mut self.engines[slot.index()];
                    engine.maybe_thinking = false;
                    engine.set_state(EngineState::Ready);
                }
            } else if result != GameResult::Unfinished {
                self.timers.cancel_for_engine(slot);
                self.engines[slot.index()].terminate(grace);
            }
        }
    }

    fn match_game_over(&mut self, result: GameResult) {
        let Some(state) = self.match_state.as_mut() else {
            return;
        };
        if state.is_finished() {
            return;
        }
        let more = if result == GameResult::Unfinished {
            state.abort();
            false
        } else {
            state.record(result)
        };
        if more {
            let delay = Duration::from_millis(self.config.match_delay_ms);
            self.schedule(TimerKind::NextMatchGame, delay);
        } else {
            let first = self.engines[0].display_name();
            let second = self.engines[1].display_name();
            let score = self
                .match_state
                .as_ref()
                .map(|state| state.final_score(&first, &second))
                .unwrap_or_default();
            crate::trace_info!("{score}");
            self.notify(Notice::MatchOver(score));
        }
    }

    fn next_match_game(&mut self) {
        if self.match_state.as_ref().map_or(true, MatchState::is_finished) {
            return;
        }
        let started = self.reset().and_then(|()| self.two_machines());
        if let Err(err) = started {
            crate::trace_warn!("next match game not started: {err}");
            self.notify(Notice::Info(err.to_string()));
            if let Some(state) = self.match_state.as_mut() {
                state.abort();
            }
        }
    }

    /// True once a match has played out, or at once when no match is set.
    #[must_use]
    pub fn match_finished(&self) -> bool {
        self.match_state.as_ref().map_or(true, MatchState::is_finished)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn set_mode(&mut self, mode: SessionMode) {
        if self.mode != mode {
            crate::trace_info!("mode: {} -> {}", self.mode, mode);
            self.mode = mode;
            self.notify(Notice::ModeChanged(mode));
        }
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        let now = self.time.now();
        self.timers.schedule(kind, now, delay);
    }

    fn engine_ready(&self, slot: Slot) -> bool {
        let engine = &self.engines[slot.index()];
        engine.is_alive() && engine.init_done()
    }

    /// Send one command; a write failure takes the engine down.
    fn send_to(&mut self, slot: Slot, command: Command) -> Result<(), SessionError> {
        match self.engines[slot.index()].send(command) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.engine_failed(slot, err)),
        }
    }

    fn ping_engine(&mut self, slot: Slot) -> Result<(), SessionError> {
        match self.engines[slot.index()].ping() {
            Ok(()) => Ok(()),
            Err(err) => Err(self.engine_failed(slot, err)),
        }
    }

    /// An engine died or refused to run: report it, tear it down, and
    /// leave any mode that depended on it.
    fn engine_failed(&mut self, slot: Slot, err: EngineError) -> SessionError {
        crate::trace_warn!("{slot} engine failed: {err}");
        self.notify(Notice::Fatal {
            message: err.to_string(),
            os_code: err.os_code(),
        });
        self.timers.cancel_for_engine(slot);
        self.engines[slot.index()].kill();
        if self.awaiting_engines {
            self.awaiting_engines = false;
            self.timers.cancel(TimerKind::WaitForEngines);
            if let Some(state) = self.match_state.as_mut() {
                state.abort();
            }
        }
        if self.mode.is_machine() {
            self.game_ends(GameResult::Unfinished, &err.to_string(), EndSource::Engine(slot));
        } else if self.mode.is_analysis() {
            self.timers.cancel(TimerKind::ReplayStep);
            self.set_mode(SessionMode::EditGame);
        }
        SessionError::Engine(err)
    }

    fn start_engine(&mut self, slot: Slot) -> Result<(), SessionError> {
        if !self.config.engine(slot).is_configured() {
            return Err(SessionError::NoEngine(slot));
        }
        let events = self.events.clone();
        let started = self.engines[slot.index()].start(self.launcher.as_mut(), events);
        if let Err(err) = started {
            return Err(self.engine_failed(slot, err));
        }
        if self.engines[slot.index()].is_negotiating() {
            let delay = Duration::from_millis(self.config.feature_timeout_ms);
            self.schedule(TimerKind::FeatureTimeout(slot), delay);
        }
        Ok(())
    }

    /// Set an engine up for a new game: init string, variant, time
    /// control, search options, then a ping.
    fn init_engine(&mut self, slot: Slot) -> Result<(), SessionError> {
        let variant = self.config.variant;
        {
            let engine = &mut self.engines[slot.index()];
            if !engine.is_negotiating() && !engine.caps().supports_variant(variant.name()) {
                let err = EngineError::UnsupportedVariant {
                    name: engine.display_name(),
                    variant: variant.name().to_string(),
                };
                return Err(self.engine_failed(slot, err));
            }
            engine.color = None;
            engine.maybe_thinking = false;
            engine.offered_draw = 0;
            engine.board_ply = None;
        }
        self.thinking[slot.index()] = None;
        self.send_to(slot, Command::Raw(self.config.init_string.clone()))?;
        if variant != crate::board::Variant::Normal {
            self.send_to(slot, Command::Variant(variant.name().to_string()))?;
        }
        self.send_to(slot, Command::TimeControl(self.config.time_control))?;
        if let Some(depth) = self.config.search_depth {
            self.send_to(slot, Command::Sd(depth))?;
        }
        let post = if self.config.show_thinking {
            Command::Post
        } else {
            Command::NoPost
        };
        self.send_to(slot, post)?;
        let ponder = if self.config.ponder {
            Command::Hard
        } else {
            Command::Easy
        };
        self.send_to(slot, ponder)?;
        self.ping_engine(slot)?;
        self.engines[slot.index()].set_init_done(true);
        Ok(())
    }

    /// Start and initialise the engine if needed. Returns true when it was.
    fn ensure_engine(&mut self, slot: Slot) -> Result<bool, SessionError> {
        let mut fresh = false;
        if !self.engines[slot.index()].is_alive() {
            self.start_engine(slot)?;
            fresh = true;
        }
        if fresh || !self.engines[slot.index()].init_done() {
            self.init_engine(slot)?;
            fresh = true;
        }
        Ok(fresh)
    }

    /// Put the engine in force mode at the current ply, sending it the
    /// board, the missing moves, or undos as needed.
    fn sync_engine(&mut self, slot: Slot) -> Result<(), SessionError> {
        self.send_to(slot, Command::Force)?;
        let target = self.history.current();
        let earliest = self.history.earliest();
        let latest = self.history.latest();
        let known = self.engines[slot.index()]
            .board_ply
            .filter(|&ply| ply >= earliest && ply <= latest);
        let from = match known {
            Some(ply) if ply > target => {
                for _ in target..ply {
                    self.send_to(slot, Command::Undo)?;
                }
                self.engines[slot.index()].board_ply = Some(target);
                return Ok(());
            }
            Some(ply) => ply,
            None => {
                if self.setup_start || earliest > 0 {
                    let setup = BoardSetup::from_position(self.history.start_position());
                    self.send_to(slot, Command::Board(setup))?;
                }
                earliest
            }
        };
        self.engines[slot.index()].board_ply = Some(from);
        for ply in from..target {
            self.send_move(slot, ply)?;
        }
        Ok(())
    }

    /// Send the move played from `ply`.
    fn send_move(&mut self, slot: Slot, ply: usize) -> Result<(), SessionError> {
        let Some(record) = self.history.record(ply) else {
            return Ok(());
        };
        let text = MoveText {
            san: record.san.clone(),
            coordinate: record.coordinate.clone(),
        };
        self.send_to(slot, Command::Move(text))?;
        self.engines[slot.index()].board_ply = Some(ply + 1);
        Ok(())
    }

    fn send_undo(&mut self, slot: Slot) -> Result<(), SessionError> {
        self.send_to(slot, Command::Undo)?;
        let engine = &mut self.engines[slot.index()];
        engine.board_ply = engine.board_ply.and_then(|ply| ply.checked_sub(1));
        Ok(())
    }

    /// `time`/`otim` for the engine's colour.
    fn send_time(&mut self, slot: Slot) -> Result<(), SessionError> {
        if !self.clock.is_enabled() {
            return Ok(());
        }
        let Some(color) = self.engines[slot.index()].color else {
            return Ok(());
        };
        let own_ms = self.clock.remaining_now(color);
        let opponent_ms = self.clock.remaining_now(color.opponent());
        self.send_to(slot, Command::Time { own_ms, opponent_ms })
    }

    /// Time, colour and `go` for an engine about to move.
    fn engine_go(&mut self, slot: Slot, color: Color) -> Result<(), SessionError> {
        self.send_time(slot)?;
        self.send_to(slot, Command::Color(color))?;
        self.send_to(slot, Command::Go)?;
        let engine = &mut self.engines[slot.index()];
        engine.set_state(EngineState::Thinking);
        engine.maybe_thinking = true;
        Ok(())
    }

    fn side_to_move(&self) -> Color {
        self.history.current_position().side_to_move()
    }

    fn start_clocks(&mut self) {
        let side = self.history.latest_position().side_to_move();
        self.clock.set_on_move(side);
        let fall = self.clock.start();
        self.rearm_clock();
        if let Some(fall) = fall {
            self.on_flag_fall(fall);
        }
    }

    fn stop_clocks(&mut self) {
        let _ = self.clock.stop();
        self.timers.cancel(TimerKind::ClockTick);
    }

    fn rearm_clock(&mut self) {
        match self.clock.next_tick() {
            Some(delay) => self.schedule(TimerKind::ClockTick, delay),
            None => {
                self.timers.cancel(TimerKind::ClockTick);
            }
        }
    }

    fn on_flag_fall(&mut self, fall: FlagFall) {
        crate::trace_info!("{} flag fell (both: {})", fall.color, fall.both);
        if !self.config.auto_flag || !self.mode.is_timed() {
            self.notify(Notice::Info(format!("{}'s flag fell", fall.color)));
            return;
        }
        if fall.both {
            self.game_ends(GameResult::Draw, "Both flags fell", EndSource::Adjudication);
        } else {
            let winner = fall.color.opponent();
            let detail = format!("{winner} wins on time");
            self.game_ends(GameResult::win_for(winner), &detail, EndSource::Adjudication);
        }
    }

    /// Move of the loaded game played from the current ply
    fn next_loaded_move(&self) -> Option<Move> {
        let index = self.history.current() - self.history.earliest();
        self.loaded.as_ref()?.get(index).copied()
    }
}

/// Ply number of a position: White's turns are even.
fn start_ply(side: Color) -> usize {
    match side {
        Color::White => 0,
        Color::Black => 1,
    }
}

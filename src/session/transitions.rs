//! Mode changes: entering and leaving play, analysis, replay and editing.

use crate::board::{
    apply_move, evaluate_end, parse_move, Color, Occupant, Piece, Position, PositionBuilder,
    Square,
};
use crate::engine::{Command, EngineState, Slot};
use crate::result::{EndSource, GameResult};
use crate::timer::TimerKind;

use std::time::Duration;

use super::{start_ply, Notice, Session, SessionError, SessionMode, WAIT_FOR_ENGINES_MS};

impl Session {
    /// Switch to `mode`, doing whatever the switch implies for the engines.
    pub fn request_mode_transition(&mut self, mode: SessionMode) -> Result<(), SessionError> {
        if mode == self.mode {
            return Ok(());
        }
        match mode {
            SessionMode::BeginningOfGame => self.reset(),
            SessionMode::PlayerVsEngine { engine_color } => self.machine_plays(engine_color),
            SessionMode::EngineVsEngine => self.two_machines(),
            SessionMode::EditGame => self.edit_game(),
            SessionMode::EditPosition => self.edit_position(),
            SessionMode::AnalyzeLive => self.analyze(false),
            SessionMode::AnalyzeLoadedGame => self.analyze(true),
            SessionMode::ReplayLoadedGame => self.replay(),
            SessionMode::Training => self.training(),
            SessionMode::RemotePlaying { .. }
            | SessionMode::RemoteObserving
            | SessionMode::RemoteExamining => self.remote(mode),
            SessionMode::EndOfGame => Err(SessionError::WrongMode {
                mode: self.mode,
                action: "end the game without a result",
            }),
        }
    }

    /// Back to the start position with engines re-initialised.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.edit_board = None;
        self.leave_mode()?;
        for kind in [
            TimerKind::ClockTick,
            TimerKind::ReplayStep,
            TimerKind::WaitForEngines,
        ] {
            self.timers.cancel(kind);
        }
        self.loaded = None;
        self.first_move = false;
        self.thinking = [None, None];
        self.result = GameResult::Unfinished;
        self.result_detail.clear();
        self.end_source = None;

        let start = self.config.start_position()?;
        self.setup_start = self.config.start_fen.is_some() || self.config.variant.is_shuffle();
        self.reset_game(start);
        self.set_mode(SessionMode::BeginningOfGame);
        for slot in Slot::BOTH {
            if self.engines[slot.index()].is_alive() {
                self.init_engine(slot)?;
            }
        }
        Ok(())
    }

    fn reset_game(&mut self, start: Position) {
        let side = start.side_to_move();
        let tc = &self.config.time_control;
        let (base, inc, mps) = (tc.base_ms(), tc.increment_ms(), tc.moves_per_session());
        self.clock.reset(base, inc, mps);
        self.clock.set_on_move(side);
        self.timers.cancel(TimerKind::ClockTick);
        self.history.reset(start, start_ply(side), self.clock.snapshot());
    }

    /// Undo whatever the current mode set up in the engines.
    fn leave_mode(&mut self) -> Result<(), SessionError> {
        self.awaiting_engines = false;
        self.timers.cancel(TimerKind::WaitForEngines);
        match self.mode {
            SessionMode::EditPosition => self.edit_position_done()?,
            SessionMode::PlayerVsEngine { .. } => {
                self.stop_clocks();
                if self.engine_ready(Slot::First) {
                    self.send_to(Slot::First, Command::Force)?;
                    self.ping_engine(Slot::First)?;
                    let engine = &mut self.engines[Slot::First.index()];
                    engine.maybe_thinking = false;
                    engine.color = None;
                    engine.set_state(EngineState::Ready);
                }
            }
            SessionMode::EngineVsEngine => {
                self.game_ends(GameResult::Unfinished, "Game aborted", EndSource::Player);
            }
            SessionMode::AnalyzeLive | SessionMode::AnalyzeLoadedGame => {
                self.timers.cancel(TimerKind::ReplayStep);
                if self.engine_ready(Slot::First) {
                    self.send_to(Slot::First, Command::Exit)?;
                    self.engines[Slot::First.index()].set_state(EngineState::Ready);
                }
            }
            SessionMode::ReplayLoadedGame => {
                self.timers.cancel(TimerKind::ReplayStep);
            }
            SessionMode::RemotePlaying { .. } => self.stop_clocks(),
            _ => {}
        }
        Ok(())
    }

    /// Forget plies after the current one and wind the clocks back to it.
    fn truncate_game(&mut self) {
        if self.history.truncate_after_current() == 0 {
            return;
        }
        let side = self.side_to_move();
        if let Some(snapshot) = self.history.clocks_at(self.history.current()) {
            self.clock.restore(snapshot, side);
        }
        self.result = GameResult::Unfinished;
    }

    fn game_over_here(&self) -> bool {
        let pos = self.history.current_position();
        evaluate_end(pos, pos.flags(), pos.ep_file()).is_some()
    }

    /// The first engine takes `color` and the user the other side.
    fn machine_plays(&mut self, color: Color) -> Result<(), SessionError> {
        let side = self.side_to_move();
        if side != color {
            return Err(SessionError::NotYourTurn { to_move: side });
        }
        if self.game_over_here() {
            return Err(SessionError::NoGame);
        }
        self.leave_mode()?;
        self.truncate_game();
        self.ensure_engine(Slot::First)?;
        self.sync_engine(Slot::First)?;
        self.engines[Slot::First.index()].color = Some(color);
        self.result = GameResult::Unfinished;
        self.set_mode(SessionMode::PlayerVsEngine {
            engine_color: color,
        });
        self.engine_go(Slot::First, color)?;
        self.start_clocks();
        Ok(())
    }

    /// Both engines play each other from the current position.
    ///
    /// Play starts once both have answered their pings; see
    /// [`Session::try_start_two_machines`].
    pub(super) fn two_machines(&mut self) -> Result<(), SessionError> {
        for slot in Slot::BOTH {
            if !self.config.engine(slot).is_configured() {
                return Err(SessionError::NoEngine(slot));
            }
        }
        if self.game_over_here() {
            return Err(SessionError::NoGame);
        }
        self.leave_mode()?;
        self.truncate_game();
        self.ensure_engine(Slot::First)?;
        self.sync_engine(Slot::First)?;
        if !self.engines[Slot::Second.index()].is_alive() {
            self.start_engine(Slot::Second)?;
        }
        self.init_engine(Slot::Second)?;
        self.sync_engine(Slot::Second)?;
        self.result = GameResult::Unfinished;
        self.awaiting_engines = true;
        self.try_start_two_machines();
        Ok(())
    }

    /// Start the engine-vs-engine game if both engines are ready, else look
    /// again shortly.
    pub(super) fn try_start_two_machines(&mut self) {
        if !self.awaiting_engines {
            return;
        }
        let ready = self.engines.iter().all(|engine| {
            engine.is_alive() && !engine.is_negotiating() && engine.is_synchronized()
        });
        if !ready {
            if !self.timers.is_pending(TimerKind::WaitForEngines) {
                let delay = Duration::from_millis(WAIT_FOR_ENGINES_MS);
                self.schedule(TimerKind::WaitForEngines, delay);
            }
            return;
        }
        self.awaiting_engines = false;
        self.timers.cancel(TimerKind::WaitForEngines);
        if let Err(err) = self.begin_two_machines() {
            crate::trace_warn!("engine-vs-engine start failed: {err}");
        }
    }

    fn begin_two_machines(&mut self) -> Result<(), SessionError> {
        let white = self
            .match_state
            .as_ref()
            .map_or(Slot::First, |state| state.slot_for(Color::White));
        self.engines[white.index()].color = Some(Color::White);
        self.engines[white.other().index()].color = Some(Color::Black);
        self.set_mode(SessionMode::EngineVsEngine);
        self.first_move = true;
        for slot in Slot::BOTH {
            let opponent = self.engines[slot.other().index()].display_name();
            self.send_to(slot, Command::Computer)?;
            self.send_to(slot, Command::Name(opponent))?;
        }
        let side = self.side_to_move();
        let mover = if side == Color::White {
            white
        } else {
            white.other()
        };
        self.engine_go(mover, side)?;
        self.start_clocks();
        Ok(())
    }

    fn edit_game(&mut self) -> Result<(), SessionError> {
        self.leave_mode()?;
        self.truncate_game();
        if self.engine_ready(Slot::First) {
            self.sync_engine(Slot::First)?;
        }
        self.set_mode(SessionMode::EditGame);
        Ok(())
    }

    fn analyze(&mut self, loaded: bool) -> Result<(), SessionError> {
        if loaded && self.loaded.is_none() {
            return Err(SessionError::NoGame);
        }
        self.leave_mode()?;
        self.truncate_game();
        self.ensure_engine(Slot::First)?;
        let engine = &self.engines[Slot::First.index()];
        if !engine.is_negotiating() && !engine.caps().analyze {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "analyze with this engine",
            });
        }
        self.sync_engine(Slot::First)?;
        self.send_to(Slot::First, Command::Analyze)?;
        self.engines[Slot::First.index()].set_state(EngineState::Analyzing);
        self.stop_clocks();
        if loaded {
            self.set_mode(SessionMode::AnalyzeLoadedGame);
            self.schedule(
                TimerKind::ReplayStep,
                Duration::from_millis(self.config.replay_delay_ms),
            );
        } else {
            self.set_mode(SessionMode::AnalyzeLive);
        }
        Ok(())
    }

    fn replay(&mut self) -> Result<(), SessionError> {
        if self.loaded.is_none() {
            return Err(SessionError::NoGame);
        }
        self.leave_mode()?;
        self.set_mode(SessionMode::ReplayLoadedGame);
        self.schedule(
            TimerKind::ReplayStep,
            Duration::from_millis(self.config.replay_delay_ms),
        );
        Ok(())
    }

    fn training(&mut self) -> Result<(), SessionError> {
        if self.loaded.is_none() {
            return Err(SessionError::NoGame);
        }
        self.leave_mode()?;
        self.set_mode(SessionMode::Training);
        Ok(())
    }

    fn remote(&mut self, mode: SessionMode) -> Result<(), SessionError> {
        self.leave_mode()?;
        self.set_mode(mode);
        if matches!(mode, SessionMode::RemotePlaying { .. }) {
            self.start_clocks();
        }
        Ok(())
    }

    /// The replay timer fired: play the next move of the loaded game.
    pub(super) fn replay_step(&mut self) {
        if !matches!(
            self.mode,
            SessionMode::ReplayLoadedGame | SessionMode::AnalyzeLoadedGame
        ) {
            return;
        }
        let Some(mv) = self.next_loaded_move() else {
            self.loaded_game_exhausted();
            return;
        };
        let before = self.history.current();
        self.commit_move(mv, None);
        if self.mode == SessionMode::AnalyzeLoadedGame
            && self.engine_ready(Slot::First)
            && self.engines[Slot::First.index()].board_ply == Some(before)
            && self.send_move(Slot::First, before).is_err()
        {
            return;
        }
        if self.next_loaded_move().is_some() {
            self.schedule(
                TimerKind::ReplayStep,
                Duration::from_millis(self.config.replay_delay_ms),
            );
        } else {
            self.loaded_game_exhausted();
        }
    }

    pub(super) fn loaded_game_exhausted(&mut self) {
        self.timers.cancel(TimerKind::ReplayStep);
        self.notify(Notice::Info("End of game".to_string()));
        match self.mode {
            SessionMode::ReplayLoadedGame => self.set_mode(SessionMode::EditGame),
            SessionMode::Training => self.set_mode(SessionMode::ReplayLoadedGame),
            _ => {}
        }
    }

    fn edit_position(&mut self) -> Result<(), SessionError> {
        self.leave_mode()?;
        self.edit_board = Some(self.history.current_position().clone());
        self.set_mode(SessionMode::EditPosition);
        Ok(())
    }

    fn editing(&mut self) -> Result<&mut Position, SessionError> {
        let mode = self.mode;
        match self.edit_board.as_mut() {
            Some(board) if mode == SessionMode::EditPosition => Ok(board),
            _ => Err(SessionError::WrongMode {
                mode,
                action: "edit the board",
            }),
        }
    }

    /// Put a piece on, or clear, a square of the board being edited.
    pub fn edit_square(
        &mut self,
        square: Square,
        piece: Option<(Color, Piece)>,
    ) -> Result<(), SessionError> {
        let board = self.editing()?;
        board.set(
            square,
            piece.map(|(color, piece)| Occupant {
                color,
                piece,
                promoted: false,
            }),
        );
        Ok(())
    }

    pub fn edit_side_to_move(&mut self, color: Color) -> Result<(), SessionError> {
        self.editing()?.set_side_to_move(color);
        Ok(())
    }

    /// Empty the board being edited.
    pub fn edit_clear_board(&mut self) -> Result<(), SessionError> {
        let board = self.editing()?;
        let mut empty = Position::empty(board.variant());
        empty.set_side_to_move(board.side_to_move());
        *board = empty;
        Ok(())
    }

    /// Validate the edited board and continue from it in EditGame.
    ///
    /// An invalid board stays in EditPosition for further editing.
    fn edit_position_done(&mut self) -> Result<(), SessionError> {
        let Some(board) = self.edit_board.take() else {
            return Ok(());
        };
        let pos = match PositionBuilder::from_position(&board).build() {
            Ok(pos) => pos,
            Err(err) => {
                self.edit_board = Some(board);
                return Err(err.into());
            }
        };
        self.install_position(pos)?;
        self.set_mode(SessionMode::EditGame);
        Ok(())
    }

    /// Start a fresh history at `pos` and send it to the engines.
    fn install_position(&mut self, pos: Position) -> Result<(), SessionError> {
        self.setup_start = true;
        self.result = GameResult::Unfinished;
        self.result_detail.clear();
        self.end_source = None;
        self.reset_game(pos);
        for slot in Slot::BOTH {
            if self.engine_ready(slot) {
                self.engines[slot.index()].board_ply = None;
                self.sync_engine(slot)?;
            }
        }
        Ok(())
    }

    /// Set up `pos` with `side` to move and continue in EditGame.
    pub fn load_position(&mut self, pos: &Position, side: Color) -> Result<(), SessionError> {
        if self.mode.is_remote() {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "load a position",
            });
        }
        let pos = PositionBuilder::from_position(pos)
            .side_to_move(side)
            .build()?;
        self.edit_board = None;
        self.leave_mode()?;
        self.loaded = None;
        self.install_position(pos)?;
        self.set_mode(SessionMode::EditGame);
        Ok(())
    }

    /// Load a game: `start` and the moves played from it.
    ///
    /// Every move is checked before anything changes. The game is then
    /// replayed from the start, one move per replay delay.
    pub fn load_game<I, S>(&mut self, start: &Position, moves: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.mode.is_remote() {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "load a game",
            });
        }
        let start = PositionBuilder::from_position(start).build()?;
        let mut pos = start.clone();
        let mut parsed = Vec::new();
        for text in moves {
            let mv = parse_move(&pos, pos.flags(), pos.ep_file(), text.as_ref())?;
            pos = apply_move(&pos, &mv);
            parsed.push(mv);
        }
        self.edit_board = None;
        self.leave_mode()?;
        self.install_position(start)?;
        self.loaded = Some(parsed);
        self.set_mode(SessionMode::ReplayLoadedGame);
        self.schedule(
            TimerKind::ReplayStep,
            Duration::from_millis(self.config.replay_delay_ms),
        );
        Ok(())
    }
}

//! Moves from the user, the server and loaded games; navigation.

use crate::board::{
    apply_move, evaluate_end, find_legal, find_legal_drop, parse_move, to_algebraic, Move,
    MoveKind, NotationError, Piece, Position, PositionFlags, Square,
};
use crate::engine::{Command, EngineState, Slot, Thinking};
use crate::result::{EndSource, GameResult};

use super::{Notice, PlyRecord, Session, SessionError, SessionMode};

impl Session {
    /// The user moves a piece from `from` to `to`.
    pub fn apply_user_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<char>,
    ) -> Result<(), SessionError> {
        self.check_user_may_move()?;
        let pos = self.history.current_position();
        let flags = self.user_flags(pos);
        let notation = match promotion {
            Some(p) => format!("{from}{to}{p}"),
            None => format!("{from}{to}"),
        };
        let mv = find_legal(pos, flags, pos.ep_file(), from, to, promotion)
            .map_err(|kind| rejected(kind, notation))?;
        self.finish_user_move(mv)
    }

    /// The user drops a piece from hand.
    pub fn apply_user_drop(&mut self, piece: Piece, to: Square) -> Result<(), SessionError> {
        self.check_user_may_move()?;
        let pos = self.history.current_position();
        let flags = self.user_flags(pos);
        let notation = format!("{}@{to}", piece.san_char());
        let mv = find_legal_drop(pos, flags, piece, to).map_err(|kind| rejected(kind, notation))?;
        self.finish_user_move(mv)
    }

    /// The user types a move in SAN or coordinate notation.
    pub fn apply_user_notation(&mut self, text: &str) -> Result<(), SessionError> {
        self.check_user_may_move()?;
        let pos = self.history.current_position();
        let flags = self.user_flags(pos);
        let mv = parse_move(pos, flags, pos.ep_file(), text)?;
        self.finish_user_move(mv)
    }

    fn user_flags(&self, pos: &Position) -> PositionFlags {
        if self.config.test_legality {
            pos.flags()
        } else {
            pos.flags() | PositionFlags::IGNORE_CHECK
        }
    }

    fn check_user_may_move(&self) -> Result<(), SessionError> {
        if !self.mode.accepts_user_moves() {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "move",
            });
        }
        let side = self.side_to_move();
        match self.mode {
            SessionMode::PlayerVsEngine { engine_color } if side == engine_color => {
                Err(SessionError::NotYourTurn { to_move: side })
            }
            SessionMode::RemotePlaying { local } if side != local => {
                Err(SessionError::NotYourTurn { to_move: side })
            }
            SessionMode::Training if self.next_loaded_move().is_none() => {
                Err(SessionError::NoGame)
            }
            _ => Ok(()),
        }
    }

    fn finish_user_move(&mut self, mv: Move) -> Result<(), SessionError> {
        if self.mode == SessionMode::Training {
            return self.training_move(mv);
        }
        let starting = self.mode == SessionMode::BeginningOfGame;
        if starting {
            self.start_play(mv)?;
        }
        let before = self.history.current();
        self.commit_move(mv, None);

        match self.mode {
            SessionMode::PlayerVsEngine { engine_color } => {
                self.send_time(Slot::First)?;
                self.send_move(Slot::First, before)?;
                if starting {
                    self.send_to(Slot::First, Command::Color(engine_color))?;
                    self.send_to(Slot::First, Command::Go)?;
                    self.start_clocks();
                }
                let engine = &mut self.engines[Slot::First.index()];
                engine.set_state(EngineState::Thinking);
                engine.maybe_thinking = true;
            }
            SessionMode::EditGame | SessionMode::AnalyzeLive => {
                if self.engine_ready(Slot::First)
                    && self.engines[Slot::First.index()].board_ply == Some(before)
                {
                    self.send_move(Slot::First, before)?;
                }
            }
            SessionMode::RemotePlaying { .. } | SessionMode::RemoteExamining => {
                let san = self.history.record(before).map(|r| r.san.clone());
                if let Some(san) = san {
                    self.notify(Notice::Remote(san));
                }
            }
            _ => {}
        }

        if matches!(
            self.mode,
            SessionMode::EditGame | SessionMode::PlayerVsEngine { .. }
        ) {
            let pos = self.history.latest_position();
            if let Some((result, detail)) = evaluate_end(pos, pos.flags(), pos.ep_file()) {
                self.game_ends(result, &detail, EndSource::Player);
            }
        }
        Ok(())
    }

    /// The first move out of BeginningOfGame: the engine takes the other
    /// side when there is one, otherwise the game is edited by hand.
    fn start_play(&mut self, mv: Move) -> Result<(), SessionError> {
        if !self.config.first.is_configured() {
            self.set_mode(SessionMode::EditGame);
            return Ok(());
        }
        let engine_color = mv.color.opponent();
        self.ensure_engine(Slot::First)?;
        self.sync_engine(Slot::First)?;
        self.engines[Slot::First.index()].color = Some(engine_color);
        self.result = GameResult::Unfinished;
        self.set_mode(SessionMode::PlayerVsEngine { engine_color });
        Ok(())
    }

    fn training_move(&mut self, mv: Move) -> Result<(), SessionError> {
        let Some(expected) = self.next_loaded_move() else {
            return Err(SessionError::NoGame);
        };
        if expected != mv {
            let pos = self.history.current_position();
            let (_, san) = to_algebraic(pos, pos.flags(), pos.ep_file(), &expected);
            return Err(SessionError::WrongMove { expected: san });
        }
        self.commit_move(mv, None);
        if let Some(reply) = self.next_loaded_move() {
            self.commit_move(reply, None);
        }
        if self.next_loaded_move().is_none() {
            self.loaded_game_exhausted();
        }
        Ok(())
    }

    /// Play `mv` at the current ply: record it, run the clocks, tell the user.
    pub(super) fn commit_move(&mut self, mv: Move, thinking: Option<Thinking>) {
        let pos = self.history.current_position();
        let (_, san) = to_algebraic(pos, pos.flags(), pos.ep_file(), &mv);
        let next = apply_move(pos, &mv);
        let fall = if self.mode.is_timed() {
            self.clock.switch()
        } else {
            self.clock.set_on_move(next.side_to_move());
            None
        };
        let record = PlyRecord {
            mv,
            san: san.clone(),
            coordinate: mv.to_string(),
            thinking,
        };
        self.history.push(record, next, self.clock.snapshot());
        let ply = self.history.latest();
        crate::trace_debug!("ply {ply}: {san}");
        self.notify(Notice::MovePlayed { ply, san });
        self.rearm_clock();
        if let Some(fall) = fall {
            self.on_flag_fall(fall);
        }
    }

    /// A move relayed from the server.
    pub fn apply_remote_move(&mut self, text: &str) -> Result<(), SessionError> {
        if !self.mode.is_remote() {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "take a server move",
            });
        }
        self.history.to_end();
        let side = self.side_to_move();
        if let SessionMode::RemotePlaying { local } = self.mode {
            if side == local {
                return Err(SessionError::NotYourTurn { to_move: side });
            }
        }
        let pos = self.history.current_position();
        let mv = parse_move(pos, pos.flags(), pos.ep_file(), text)?;
        self.commit_move(mv, None);
        let pos = self.history.latest_position();
        if let Some((result, detail)) = evaluate_end(pos, pos.flags(), pos.ep_file()) {
            self.game_ends(result, &detail, EndSource::Remote);
        }
        Ok(())
    }

    /// The server announced the end of the game.
    pub fn remote_game_ends(&mut self, result: GameResult, detail: &str) -> Result<(), SessionError> {
        if !self.mode.is_remote() {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "take a server result",
            });
        }
        self.game_ends(result, detail, EndSource::Remote);
        Ok(())
    }

    /// One ply forward. Returns false at the end of the game.
    pub fn step_forward(&mut self) -> Result<bool, SessionError> {
        self.check_navigation()?;
        let before = self.history.current();
        if !self.history.forward() {
            return Ok(false);
        }
        if self.engine_follows_navigation()
            && self.engines[Slot::First.index()].board_ply == Some(before)
        {
            self.send_move(Slot::First, before)?;
        }
        Ok(true)
    }

    /// One ply back. Returns false at the start of the game.
    pub fn step_backward(&mut self) -> Result<bool, SessionError> {
        self.check_navigation()?;
        let before = self.history.current();
        if !self.history.backward() {
            return Ok(false);
        }
        if self.engine_follows_navigation()
            && self.engines[Slot::First.index()].board_ply == Some(before)
        {
            self.send_undo(Slot::First)?;
        }
        Ok(true)
    }

    fn check_navigation(&self) -> Result<(), SessionError> {
        if self.mode.allows_navigation() {
            Ok(())
        } else {
            Err(SessionError::WrongMode {
                mode: self.mode,
                action: "step through the game",
            })
        }
    }

    fn engine_follows_navigation(&self) -> bool {
        matches!(self.mode, SessionMode::EditGame | SessionMode::AnalyzeLive)
            && self.engine_ready(Slot::First)
    }

    /// Offer the engine a draw.
    pub fn offer_draw(&mut self) -> Result<(), SessionError> {
        let SessionMode::PlayerVsEngine { .. } = self.mode else {
            return Err(SessionError::WrongMode {
                mode: self.mode,
                action: "offer a draw",
            });
        };
        if self.engines[Slot::First.index()].offered_draw > 0 {
            self.game_ends(GameResult::Draw, "Draw agreed", EndSource::Player);
            return Ok(());
        }
        self.send_to(Slot::First, Command::Draw)
    }

    /// The user gives up: the engine's side, or the side to move, loses.
    pub fn resign(&mut self) -> Result<(), SessionError> {
        let loser = match self.mode {
            SessionMode::PlayerVsEngine { engine_color } => engine_color.opponent(),
            SessionMode::RemotePlaying { local } => local,
            SessionMode::EditGame | SessionMode::BeginningOfGame => self.side_to_move(),
            mode => {
                return Err(SessionError::WrongMode {
                    mode,
                    action: "resign",
                })
            }
        };
        let detail = format!("{loser} resigns");
        self.game_ends(GameResult::win_for(loser.opponent()), &detail, EndSource::Player);
        Ok(())
    }

    /// Ask the first engine for a hint.
    pub fn request_hint(&mut self) -> Result<(), SessionError> {
        if !self.engine_ready(Slot::First) {
            return Err(SessionError::NoEngine(Slot::First));
        }
        self.send_to(Slot::First, Command::Hint)
    }
}

fn rejected(kind: MoveKind, notation: String) -> SessionError {
    let err = match kind {
        MoveKind::Impossible => NotationError::Impossible { notation },
        _ => NotationError::Illegal { notation },
    };
    SessionError::IllegalMove(err)
}

//! What engine output means for the game.

use std::time::Duration;

use crate::board::{evaluate_end, parse_move, Color};
use crate::engine::{
    classify_line, Command, EngineError, EngineEvent, EngineLine, EngineState, ErrorReply,
    FeatureItem, Incoming, Slot, TimeSupport,
};
use crate::result::{EndSource, GameResult};
use crate::timer::TimerKind;

use super::{Notice, Session, SessionMode};

/// After `feature done=0` the engine gets this long to finish
const DONE_ZERO_TIMEOUT_MS: u64 = 3_600_000;

const FORFEIT: &str = "Forfeit due to illegal move";

impl Session {
    /// Act on one event from an engine reader.
    ///
    /// Events from an engine that has since been restarted are dropped.
    pub fn handle_incoming(&mut self, incoming: Incoming) {
        let slot = incoming.slot;
        let engine = &self.engines[slot.index()];
        if incoming.generation != engine.generation() || !engine.is_alive() {
            crate::trace_debug!("{slot} engine: dropping stale event");
            return;
        }
        match incoming.event {
            EngineEvent::Line(line) => self.handle_line(slot, &line),
            EngineEvent::Closed => {
                let err = EngineError::Closed {
                    name: engine.display_name(),
                };
                let _ = self.engine_failed(slot, err);
            }
        }
    }

    fn handle_line(&mut self, slot: Slot, line: &str) {
        crate::trace_debug!("{slot} -> {line}");
        match classify_line(line) {
            EngineLine::Empty | EngineLine::Comment(_) => {}
            EngineLine::Move(text) => self.handle_machine_move(slot, &text),
            EngineLine::Feature(items) => self.handle_features(slot, &items),
            EngineLine::Pong(token) => {
                self.engines[slot.index()].record_pong(token);
                self.try_start_two_machines();
            }
            EngineLine::Tell { kind, text } => self.notify(Notice::EngineMessage { slot, kind, text }),
            EngineLine::Hint(text) => self.notify(Notice::Hint { slot, text }),
            EngineLine::Error(reply) => self.handle_error_reply(slot, reply),
            EngineLine::StartupFailure(message) => {
                if self.history.is_empty() {
                    let err = EngineError::StartupFailure {
                        name: self.engines[slot.index()].display_name(),
                        message,
                    };
                    let _ = self.engine_failed(slot, err);
                } else {
                    self.notify(Notice::Info(message));
                }
            }
            EngineLine::Thinking(thinking) => {
                if self.config.show_thinking || self.mode.is_analysis() {
                    self.notify(Notice::Thinking {
                        slot,
                        thinking: thinking.clone(),
                    });
                }
                self.thinking[slot.index()] = Some(thinking);
            }
            EngineLine::Continuation(text) => {
                if let Some(thinking) = self.thinking[slot.index()].as_mut() {
                    if !thinking.pv.is_empty() {
                        thinking.pv.push(' ');
                    }
                    thinking.pv.push_str(&text);
                }
            }
            EngineLine::Stat01 {
                time_cs,
                nodes,
                depth,
                ..
            } => {
                if self.mode.is_analysis() {
                    self.notify(Notice::SearchStatus {
                        slot,
                        depth,
                        nodes,
                        time_cs,
                    });
                }
            }
            EngineLine::OnlyMove(text) => {
                if self.config.show_thinking {
                    let name = self.engines[slot.index()].display_name();
                    self.notify(Notice::Info(format!("{name}: only move {text}")));
                }
            }
            EngineLine::Other(text) => {
                crate::trace_debug!("{slot} engine: unrecognised output {text:?}");
                // anything unrecognised ends negotiation at protocol 1
                if self.engines[slot.index()].is_negotiating() {
                    self.on_negotiation_complete(slot, true);
                }
            }
            claim => self.handle_claim(slot, claim),
        }
    }

    fn handle_features(&mut self, slot: Slot, items: &[FeatureItem]) {
        let done = match self.engines[slot.index()].apply_features(items) {
            Ok(done) => done,
            Err(err) => {
                let _ = self.engine_failed(slot, err);
                return;
            }
        };
        match done {
            Some(true) => self.on_negotiation_complete(slot, false),
            Some(false) if self.engines[slot.index()].is_negotiating() => {
                let delay = Duration::from_millis(DONE_ZERO_TIMEOUT_MS);
                self.schedule(TimerKind::FeatureTimeout(slot), delay);
            }
            _ => {}
        }
    }

    /// Feature negotiation is over, by `done=1` or by giving up on it.
    pub(super) fn on_negotiation_complete(&mut self, slot: Slot, fallback: bool) {
        self.timers.cancel(TimerKind::FeatureTimeout(slot));
        let engine = &self.engines[slot.index()];
        if !engine.is_negotiating() {
            return;
        }
        let variant = self.config.variant.name();
        if !engine.caps().supports_variant(variant) {
            let err = EngineError::UnsupportedVariant {
                name: engine.display_name(),
                variant: variant.to_string(),
            };
            let _ = self.engine_failed(slot, err);
            return;
        }
        if let Err(err) = self.engines[slot.index()].complete_negotiation(fallback) {
            let _ = self.engine_failed(slot, err);
            return;
        }
        crate::trace_info!(
            "{slot} engine negotiated protocol {}",
            self.engines[slot.index()].caps().protocol_version
        );
        self.try_start_two_machines();
    }

    fn handle_machine_move(&mut self, slot: Slot, text: &str) {
        let mode = self.mode;
        if !self.engines[slot.index()].is_synchronized() {
            // the move predates our last command
            if mode != SessionMode::BeginningOfGame {
                crate::trace_debug!("{slot} engine: undoing stale move {text}");
                let _ = self.send_to(slot, Command::Undo);
            }
            return;
        }
        let may_move = match mode {
            SessionMode::BeginningOfGame => return,
            SessionMode::PlayerVsEngine { .. } => slot == Slot::First,
            SessionMode::EngineVsEngine => true,
            _ => false,
        };
        let side = self.history.latest_position().side_to_move();
        if !may_move || self.engines[slot.index()].color != Some(side) {
            crate::trace_debug!("{slot} engine: move {text} out of turn in {mode}");
            let _ = self.send_to(slot, Command::Undo);
            return;
        }

        self.history.to_end();
        let pos = self.history.latest_position();
        let mv = match parse_move(pos, pos.flags(), pos.ep_file(), text) {
            Ok(mv) => mv,
            Err(err) => {
                crate::trace_warn!("{slot} engine: bad move {text}: {err}");
                let name = self.engines[slot.index()].display_name();
                self.notify(Notice::MoveError(format!("Illegal move \"{text}\" from {name}")));
                if mode == SessionMode::EngineVsEngine {
                    let winner = side.opponent();
                    self.game_ends(GameResult::win_for(winner), FORFEIT, EndSource::Adjudication);
                }
                return;
            }
        };

        let engine = &mut self.engines[slot.index()];
        if engine.caps().time == TimeSupport::Unconfirmed {
            engine.caps_mut().time = TimeSupport::Confirmed;
        }
        engine.offered_draw = engine.offered_draw.saturating_sub(1);
        let next_state = if self.config.ponder {
            EngineState::Pondering
        } else {
            EngineState::Ready
        };
        engine.set_state(next_state);
        let ply = self.history.latest();
        let thinking = self.thinking[slot.index()].take();
        self.commit_move(mv, thinking);
        self.engines[slot.index()].board_ply = Some(ply + 1);

        if self.mode == SessionMode::EngineVsEngine && self.relay_move(slot.other(), ply).is_err() {
            return;
        }
        if self.mode.is_machine() {
            let pos = self.history.latest_position();
            if let Some((result, detail)) = evaluate_end(pos, pos.flags(), pos.ep_file()) {
                self.game_ends(result, &detail, EndSource::Adjudication);
            }
        }
    }

    /// Pass a move on to the engine that has to answer it.
    fn relay_move(&mut self, slot: Slot, ply: usize) -> Result<(), super::SessionError> {
        self.send_time(slot)?;
        self.send_move(slot, ply)?;
        if std::mem::take(&mut self.first_move) {
            if let Some(color) = self.engines[slot.index()].color {
                self.send_to(slot, Command::Color(color))?;
            }
            self.send_to(slot, Command::Go)?;
        }
        let engine = &mut self.engines[slot.index()];
        engine.set_state(EngineState::Thinking);
        engine.maybe_thinking = true;
        Ok(())
    }

    fn handle_error_reply(&mut self, slot: Slot, reply: ErrorReply) {
        let negotiating = self.engines[slot.index()].is_negotiating();
        match reply {
            ErrorReply::Ignored => {}
            ErrorReply::Protover => {
                if negotiating {
                    self.on_negotiation_complete(slot, true);
                }
            }
            ErrorReply::Draw => self.engines[slot.index()].caps_mut().draw = false,
            ErrorReply::Time => {
                let caps = self.engines[slot.index()].caps_mut();
                if caps.time != TimeSupport::Confirmed {
                    caps.time = TimeSupport::Off;
                }
            }
            ErrorReply::Analyze => {
                self.engines[slot.index()].caps_mut().analyze = false;
                if self.mode.is_analysis() && slot == Slot::First {
                    let name = self.engines[slot.index()].display_name();
                    self.notify(Notice::Info(format!("{name} does not support analysis")));
                    self.timers.cancel(TimerKind::ReplayStep);
                    self.engines[slot.index()].set_state(EngineState::Ready);
                    self.set_mode(SessionMode::EditGame);
                }
            }
            ErrorReply::IllegalMove { notation } => self.engine_rejected_move(slot, notation),
            ErrorReply::Other(text) => {
                if negotiating {
                    self.on_negotiation_complete(slot, true);
                } else {
                    let name = self.engines[slot.index()].display_name();
                    self.notify(Notice::Info(format!("{name}: {text}")));
                }
            }
        }
    }

    /// The engine refused the last move it was sent: take it back.
    fn engine_rejected_move(&mut self, slot: Slot, notation: Option<String>) {
        let mode = self.mode;
        if matches!(mode, SessionMode::BeginningOfGame | SessionMode::EndOfGame) {
            return;
        }
        if self.history.latest() <= self.history.earliest() {
            return;
        }
        let Some(record) = self.history.rollback_latest() else {
            return;
        };
        let mover = record.mv.color;
        let ply = self.history.latest();
        if let Some(snapshot) = self.history.clocks_at(ply) {
            self.clock.restore(snapshot, mover);
        }
        self.rearm_clock();
        self.engines[slot.index()].board_ply = Some(ply);
        let text = notation.unwrap_or(record.coordinate);
        crate::trace_warn!("{slot} engine rejected {text}");
        self.notify(Notice::MoveError(format!(
            "Illegal move \"{text}\" (rejected by {slot} chess program)"
        )));
        if mode == SessionMode::EngineVsEngine {
            let winner = mover.opponent();
            self.game_ends(GameResult::win_for(winner), FORFEIT, EndSource::Engine(slot));
        }
    }

    /// Results, resignations, mate announcements and draw offers.
    fn handle_claim(&mut self, slot: Slot, claim: EngineLine) {
        let engine = &self.engines[slot.index()];
        let Some(own) = engine.color else {
            return;
        };
        if !self.mode.is_machine() || !engine.is_synchronized() {
            return;
        }
        let source = EndSource::Engine(slot);
        let mated = |winner: Color| (GameResult::win_for(winner), format!("{winner} mates"));
        let (result, detail) = match claim {
            EngineLine::Result { result, detail } => (result, detail.unwrap_or_default()),
            EngineLine::Resign(color) => {
                let loser = color.unwrap_or(own);
                (GameResult::win_for(loser.opponent()), format!("{loser} resigns"))
            }
            EngineLine::Mates(winner) => mated(winner),
            EngineLine::ComputerMates => mated(own),
            EngineLine::OpponentMates => mated(own.opponent()),
            EngineLine::Checkmate => {
                mated(self.history.latest_position().side_to_move().opponent())
            }
            EngineLine::Draw => (GameResult::Draw, "Draw".to_string()),
            EngineLine::OfferDraw => {
                self.engine_offers_draw(slot);
                return;
            }
            _ => return,
        };
        self.game_ends(result, &detail, source);
    }

    fn engine_offers_draw(&mut self, slot: Slot) {
        self.engines[slot.index()].offered_draw = 2;
        if self.mode == SessionMode::EngineVsEngine {
            let other = slot.other();
            if self.engines[other.index()].offered_draw > 0 {
                self.game_ends(GameResult::Draw, "Draw agreed", EndSource::Engine(slot));
            } else {
                let _ = self.send_to(other, Command::Draw);
            }
        } else {
            let name = self.engines[slot.index()].display_name();
            self.notify(Notice::Info(format!("{name} offers a draw")));
        }
    }
}

//! Per-engine protocol state.

use std::fmt;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::board::Color;
use crate::config::EngineConfig;

use super::command::Command;
use super::error::EngineError;
use super::features::{Capabilities, FeatureItem, FeatureKey, FeatureValue};
use super::transport::{Incoming, Launcher, Transport};
use super::Slot;

/// Poll interval while waiting for an engine to exit after `quit`
const EXIT_POLL_MS: u64 = 10;

/// Where an engine is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Starting,
    NegotiatingFeatures,
    Ready,
    Thinking,
    Pondering,
    Analyzing,
    Terminated,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One engine seat: its process, what it agreed to, and the liveness tokens.
pub struct EngineSession {
    slot: Slot,
    config: EngineConfig,
    state: EngineState,
    caps: Capabilities,
    transport: Option<Box<dyn Transport>>,
    generation: u64,
    last_ping: u32,
    last_pong: u32,
    ping_after_negotiation: bool,
    /// Feature negotiation is open; kept apart from `state`, which may
    /// already say `Thinking` for a `go` that is still held back
    negotiating: bool,
    /// Commands held back until negotiation completes
    pending: Vec<Command>,
    init_done: bool,
    /// Color this engine plays, if any
    pub color: Option<Color>,
    /// The engine may be searching; a `force` is needed before it is reused
    pub maybe_thinking: bool,
    /// Plies for which the engine's last draw offer stands
    pub offered_draw: u8,
    /// Games won in the current match
    pub match_wins: u32,
    /// Ply the engine's board stands at, when known
    pub board_ply: Option<usize>,
}

impl fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSession")
            .field("slot", &self.slot)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("last_ping", &self.last_ping)
            .field("last_pong", &self.last_pong)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl EngineSession {
    #[must_use]
    pub fn new(slot: Slot, config: EngineConfig) -> Self {
        let caps = Capabilities::new(config.protocol_version, config.reuse);
        EngineSession {
            slot,
            config,
            state: EngineState::NotStarted,
            caps,
            transport: None,
            generation: 0,
            last_ping: 0,
            last_pong: 0,
            ping_after_negotiation: false,
            negotiating: false,
            pending: Vec::new(),
            init_done: false,
            color: None,
            maybe_thinking: false,
            offered_draw: 0,
            match_wins: 0,
            board_ply: None,
        }
    }

    #[must_use]
    pub fn slot(&self) -> Slot {
        self.slot
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            crate::trace_info!("{} engine: {} -> {}", self.slot, self.state, state);
            self.state = state;
        }
    }

    #[must_use]
    pub fn caps(&self) -> &Capabilities {
        &self.caps
    }

    pub fn caps_mut(&mut self) -> &mut Capabilities {
        &mut self.caps
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Launch generation; events tagged with an older one are stale
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The engine's own name if it gave one, else the configured name
    #[must_use]
    pub fn display_name(&self) -> String {
        self.caps
            .my_name
            .clone()
            .unwrap_or_else(|| self.config.display_name())
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.transport.is_some() && !matches!(self.state, EngineState::Terminated)
    }

    #[must_use]
    pub fn is_negotiating(&self) -> bool {
        self.negotiating
    }

    #[must_use]
    pub fn init_done(&self) -> bool {
        self.init_done
    }

    pub fn set_init_done(&mut self, done: bool) {
        self.init_done = done;
    }

    /// Start the process and announce the protocol.
    ///
    /// Engines speaking version 2 or later enter feature negotiation; the
    /// caller arms the fallback timer. Version 1 engines are ready at once.
    pub fn start(
        &mut self,
        launcher: &mut dyn Launcher,
        events: Sender<Incoming>,
    ) -> Result<(), EngineError> {
        self.generation += 1;
        self.caps = Capabilities::new(self.config.protocol_version, self.config.reuse);
        self.last_ping = 0;
        self.last_pong = 0;
        self.ping_after_negotiation = false;
        self.negotiating = false;
        self.pending.clear();
        self.init_done = false;
        self.maybe_thinking = false;
        self.offered_draw = 0;
        self.board_ply = None;
        self.set_state(EngineState::Starting);
        let transport = match launcher.launch(self.slot, self.generation, &self.config, events) {
            Ok(transport) => transport,
            Err(err) => {
                self.set_state(EngineState::Terminated);
                return Err(err);
            }
        };
        self.transport = Some(transport);
        self.send(Command::XBoard)?;
        if self.config.protocol_version > 1 {
            self.send(Command::Protover(self.config.protocol_version))?;
            self.negotiating = true;
            self.set_state(EngineState::NegotiatingFeatures);
        } else {
            self.set_state(EngineState::Ready);
        }
        Ok(())
    }

    /// Send a command, or hold it while features are still being negotiated.
    pub fn send(&mut self, command: Command) -> Result<(), EngineError> {
        let handshake = matches!(
            command,
            Command::XBoard | Command::Protover(_) | Command::Accepted(_) | Command::Rejected(_)
        );
        if self.is_negotiating() && !handshake {
            self.pending.push(command);
            return Ok(());
        }
        let lines = command.render(&self.caps);
        self.write_lines(&lines)
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<(), EngineError> {
        let name = self.display_name();
        let Some(transport) = self.transport.as_ref() else {
            return Err(EngineError::Closed { name });
        };
        let failed = lines.iter().find_map(|line| {
            crate::trace_debug!("{name} <- {line}");
            transport.send(line).err()
        });
        match failed {
            None => Ok(()),
            Some(source) => {
                self.kill();
                Err(EngineError::Write { name, source })
            }
        }
    }

    /// Acknowledge and record a batch of features.
    ///
    /// Returns the value of `done` when the batch contained it.
    pub fn apply_features(&mut self, items: &[FeatureItem]) -> Result<Option<bool>, EngineError> {
        let mut done = None;
        for item in items {
            match item {
                FeatureItem::Accepted { key, value } => {
                    self.send(Command::Accepted(key.name().to_string()))?;
                    if *key == FeatureKey::Done {
                        done = Some(matches!(value, FeatureValue::Int(n) if *n != 0));
                    } else {
                        self.caps.apply(*key, value);
                    }
                }
                FeatureItem::Rejected { name } => {
                    crate::trace_warn!("{} engine: rejected feature {name}", self.slot);
                    self.send(Command::Rejected(name.clone()))?;
                }
            }
        }
        Ok(done)
    }

    /// Leave negotiation and flush held commands.
    ///
    /// With `fallback` the engine is assumed to speak the oldest dialect.
    pub fn complete_negotiation(&mut self, fallback: bool) -> Result<(), EngineError> {
        if fallback {
            self.caps.protocol_version = 1;
        }
        self.negotiating = false;
        if self.state == EngineState::NegotiatingFeatures {
            self.set_state(EngineState::Ready);
        }
        let held = std::mem::take(&mut self.pending);
        for command in held {
            self.send(command)?;
        }
        if std::mem::take(&mut self.ping_after_negotiation) {
            self.ping()?;
        }
        Ok(())
    }

    /// Send a new liveness token when the engine takes pings.
    pub fn ping(&mut self) -> Result<(), EngineError> {
        if self.is_negotiating() {
            self.ping_after_negotiation = true;
            return Ok(());
        }
        if !self.caps.ping {
            return Ok(());
        }
        self.last_ping += 1;
        self.send(Command::Ping(self.last_ping))
    }

    pub fn record_pong(&mut self, token: u32) {
        self.last_pong = token;
    }

    /// No ping is outstanding
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.last_ping == self.last_pong
    }

    #[must_use]
    pub fn last_ping(&self) -> u32 {
        self.last_ping
    }

    /// `quit`, wait up to `grace` for the process to exit, then kill it.
    pub fn terminate(&mut self, grace: Duration) {
        let Some(transport) = self.transport.take() else {
            self.set_state(EngineState::Terminated);
            return;
        };
        let _ = transport.send("quit");
        let deadline = Instant::now() + grace;
        while !transport.has_exited() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(EXIT_POLL_MS));
        }
        if !transport.has_exited() {
            crate::trace_warn!("{} engine ignored quit, killing it", self.slot);
            transport.kill();
        }
        self.negotiating = false;
        self.pending.clear();
        self.set_state(EngineState::Terminated);
    }

    /// Tear the engine down at once, without `quit`.
    pub fn kill(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.kill();
        }
        self.negotiating = false;
        self.pending.clear();
        self.set_state(EngineState::Terminated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::features::parse_features;
    use crate::engine::transport::MemoryLauncher;
    use std::sync::mpsc;

    fn started(version: u32) -> (EngineSession, MemoryLauncher) {
        let mut launcher = MemoryLauncher::new();
        let (tx, _rx) = mpsc::channel();
        let mut config = EngineConfig::from_command_line("scripted");
        config.protocol_version = version;
        let mut engine = EngineSession::new(Slot::First, config);
        engine.start(&mut launcher, tx).unwrap();
        (engine, launcher)
    }

    #[test]
    fn test_start_announces_protocol() {
        let (engine, launcher) = started(2);
        assert_eq!(engine.state(), EngineState::NegotiatingFeatures);
        assert_eq!(launcher.handle(Slot::First).sent(), vec!["xboard", "protover 2"]);

        let (engine, launcher) = started(1);
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(launcher.handle(Slot::First).sent(), vec!["xboard"]);
    }

    #[test]
    fn test_commands_held_until_done() {
        let (mut engine, launcher) = started(2);
        let handle = launcher.handle(Slot::First);
        handle.take_sent();
        engine.send(Command::New).unwrap();
        engine.ping().unwrap();
        assert!(handle.sent().is_empty());

        let done = engine
            .apply_features(&parse_features("ping=1 usermove=1 bogus=1 done=1"))
            .unwrap();
        assert_eq!(done, Some(true));
        engine.complete_negotiation(false).unwrap();
        assert_eq!(
            handle.sent(),
            vec![
                "accepted ping",
                "accepted usermove",
                "rejected bogus",
                "accepted done",
                "new",
                "ping 1"
            ]
        );
        assert!(!engine.is_synchronized());
        engine.record_pong(1);
        assert!(engine.is_synchronized());
    }

    #[test]
    fn test_go_during_negotiation_is_still_held() {
        let (mut engine, launcher) = started(2);
        let handle = launcher.handle(Slot::First);
        handle.take_sent();
        engine.send(Command::Go).unwrap();
        engine.set_state(EngineState::Thinking);
        engine.send(Command::Force).unwrap();
        assert!(engine.is_negotiating());
        assert!(handle.sent().is_empty());

        engine.complete_negotiation(true).unwrap();
        assert!(!engine.is_negotiating());
        assert_eq!(engine.state(), EngineState::Thinking);
        assert_eq!(handle.sent(), vec!["go", "force"]);
    }

    #[test]
    fn test_fallback_uses_oldest_dialect() {
        let (mut engine, _launcher) = started(2);
        engine.ping().unwrap();
        engine.complete_negotiation(true).unwrap();
        assert_eq!(engine.caps().protocol_version, 1);
        assert_eq!(engine.state(), EngineState::Ready);
        // no ping feature, so no token is outstanding
        assert!(engine.is_synchronized());
    }

    #[test]
    fn test_write_failure_terminates() {
        let (mut engine, launcher) = started(1);
        launcher.handle(Slot::First).set_fail_writes(true);
        let err = engine.send(Command::Force).unwrap_err();
        assert!(matches!(err, EngineError::Write { .. }));
        assert_eq!(engine.state(), EngineState::Terminated);
        assert!(!engine.is_alive());
        assert!(launcher.handle(Slot::First).was_killed());
    }

    #[test]
    fn test_terminate_quits_then_kills() {
        let (mut engine, launcher) = started(1);
        engine.terminate(Duration::from_millis(0));
        let handle = launcher.handle(Slot::First);
        assert_eq!(handle.sent().last().map(String::as_str), Some("quit"));
        assert!(!handle.was_killed());

        let (mut engine, launcher) = started(1);
        let handle = launcher.handle(Slot::First);
        handle.set_exit_on_quit(false);
        engine.terminate(Duration::from_millis(20));
        assert!(handle.was_killed());
        assert_eq!(engine.state(), EngineState::Terminated);
    }
}

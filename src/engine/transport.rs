//! Engine process plumbing.
//!
//! A [`Launcher`] starts an engine and hands back a [`Transport`] for writing
//! to it. Output comes back on an `mpsc` channel as [`Incoming`] events, each
//! tagged with the seat and the launch generation so that lines from a
//! process that has since been replaced can be told apart.
//!
//! [`ProcessLauncher`] runs real programs with one reader thread per engine;
//! [`MemoryLauncher`] is a scripted stand-in for tests.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command as ProcessCommand, Stdio};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use super::error::EngineError;
use super::Slot;
use crate::config::EngineConfig;
use crate::sync::{StopFlag, StopOnDrop};

/// Something an engine did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Line(String),
    /// The output stream ended
    Closed,
}

/// Forward every line of `reader` until EOF or a read error, then report
/// the stream closed. Bytes that are not UTF-8 are replaced, never fatal.
fn pump_lines<R, F>(mut reader: R, stop: &StopFlag, mut deliver: F)
where
    R: BufRead,
    F: FnMut(EngineEvent) -> bool,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if stop.is_stopped() || !deliver(EngineEvent::Line(line)) {
            return;
        }
    }
    if !stop.is_stopped() {
        deliver(EngineEvent::Closed);
    }
}

/// An [`EngineEvent`] addressed to a seat and launch generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incoming {
    pub slot: Slot,
    pub generation: u64,
    pub event: EngineEvent,
}

/// Write side of a running engine.
pub trait Transport: Send {
    /// Write one line; the newline is added here.
    fn send(&self, line: &str) -> io::Result<()>;
    /// True once the process has gone away
    fn has_exited(&self) -> bool;
    fn kill(&self);
}

/// Starts engines.
pub trait Launcher {
    fn launch(
        &mut self,
        slot: Slot,
        generation: u64,
        config: &EngineConfig,
        events: Sender<Incoming>,
    ) -> Result<Box<dyn Transport>, EngineError>;
}

/// Runs engines as child processes talking over pipes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessLauncher;

struct ProcessTransport {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    _reader: StopOnDrop,
}

impl Transport for ProcessTransport {
    fn send(&self, line: &str) -> io::Result<()> {
        let mut stdin = self.stdin.lock();
        stdin.write_all(line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()
    }

    fn has_exited(&self) -> bool {
        // an error here means the child cannot be waited on any more
        self.child.lock().try_wait().map_or(true, |status| status.is_some())
    }

    fn kill(&self) {
        let mut child = self.child.lock();
        if child.kill().is_ok() {
            let _ = child.wait();
        }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(
        &mut self,
        slot: Slot,
        generation: u64,
        config: &EngineConfig,
        events: Sender<Incoming>,
    ) -> Result<Box<dyn Transport>, EngineError> {
        let spawn_error = |source: io::Error| EngineError::Spawn {
            program: config.program.clone(),
            source,
        };
        let mut command = ProcessCommand::new(&config.program);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &config.dir {
            command.current_dir(dir);
        }
        let mut child = command.spawn().map_err(spawn_error)?;
        let missing = || spawn_error(io::Error::new(io::ErrorKind::BrokenPipe, "no pipe"));
        let stdin = child.stdin.take().ok_or_else(missing)?;
        let stdout = child.stdout.take().ok_or_else(missing)?;

        let stop = StopFlag::new();
        let seen = stop.clone();
        let spawned = thread::Builder::new()
            .name(format!("{slot}-engine-reader"))
            .spawn(move || {
                let deliver = |event| {
                    events
                        .send(Incoming {
                            slot,
                            generation,
                            event,
                        })
                        .is_ok()
                };
                pump_lines(BufReader::new(stdout), &seen, deliver);
            });
        if let Err(source) = spawned {
            let _ = child.kill();
            return Err(spawn_error(source));
        }
        crate::trace_info!("started {} as {slot} engine", config.program);
        Ok(Box::new(ProcessTransport {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            _reader: stop.guard(),
        }))
    }
}

#[derive(Debug)]
struct Wire {
    sent: Vec<String>,
    events: Option<(Sender<Incoming>, Slot, u64)>,
    launches: usize,
    fail_spawn: bool,
    fail_writes: bool,
    exit_on_quit: bool,
    exited: bool,
    killed: bool,
}

impl Default for Wire {
    fn default() -> Self {
        Wire {
            sent: Vec::new(),
            events: None,
            launches: 0,
            fail_spawn: false,
            fail_writes: false,
            exit_on_quit: true,
            exited: false,
            killed: false,
        }
    }
}

/// Test-side view of one scripted engine.
///
/// Everything the referee writes is recorded; replies are injected with
/// [`MemoryHandle::reply`] and arrive through the same channel a real reader
/// thread would use.
#[derive(Clone, Debug, Default)]
pub struct MemoryHandle(Arc<Mutex<Wire>>);

impl MemoryHandle {
    /// Every line written since the last [`MemoryHandle::take_sent`]
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.0.lock().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.0.lock().sent)
    }

    /// Deliver a line as if the engine printed it. False when not running.
    pub fn reply(&self, line: &str) -> bool {
        self.deliver(EngineEvent::Line(line.to_string()))
    }

    /// Close the engine's output stream.
    pub fn close(&self) -> bool {
        let delivered = self.deliver(EngineEvent::Closed);
        self.0.lock().exited = true;
        delivered
    }

    fn deliver(&self, event: EngineEvent) -> bool {
        let wire = self.0.lock();
        match &wire.events {
            Some((tx, slot, generation)) => tx
                .send(Incoming {
                    slot: *slot,
                    generation: *generation,
                    event,
                })
                .is_ok(),
            None => false,
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.0.lock().fail_writes = fail;
    }

    pub fn set_fail_spawn(&self, fail: bool) {
        self.0.lock().fail_spawn = fail;
    }

    /// Whether `quit` makes the engine exit at once (default true)
    pub fn set_exit_on_quit(&self, exit: bool) {
        self.0.lock().exit_on_quit = exit;
    }

    #[must_use]
    pub fn launches(&self) -> usize {
        self.0.lock().launches
    }

    #[must_use]
    pub fn was_killed(&self) -> bool {
        self.0.lock().killed
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        let wire = self.0.lock();
        wire.events.is_some() && !wire.exited
    }
}

struct MemoryTransport(MemoryHandle);

impl Transport for MemoryTransport {
    fn send(&self, line: &str) -> io::Result<()> {
        let mut wire = self.0 .0.lock();
        if wire.fail_writes || wire.exited {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine pipe closed"));
        }
        wire.sent.push(line.to_string());
        if line == "quit" && wire.exit_on_quit {
            wire.exited = true;
        }
        Ok(())
    }

    fn has_exited(&self) -> bool {
        self.0 .0.lock().exited
    }

    fn kill(&self) {
        let mut wire = self.0 .0.lock();
        wire.killed = true;
        wire.exited = true;
    }
}

/// Launches scripted in-memory engines, one [`MemoryHandle`] per seat.
#[derive(Clone, Debug, Default)]
pub struct MemoryLauncher {
    handles: [MemoryHandle; 2],
}

impl MemoryLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handle(&self, slot: Slot) -> MemoryHandle {
        self.handles[slot.index()].clone()
    }
}

impl Launcher for MemoryLauncher {
    fn launch(
        &mut self,
        slot: Slot,
        generation: u64,
        config: &EngineConfig,
        events: Sender<Incoming>,
    ) -> Result<Box<dyn Transport>, EngineError> {
        let handle = self.handle(slot);
        {
            let mut wire = handle.0.lock();
            if wire.fail_spawn {
                return Err(EngineError::Spawn {
                    program: config.program.clone(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such engine"),
                });
            }
            wire.launches += 1;
            wire.exited = false;
            wire.killed = false;
            wire.events = Some((events, slot, generation));
        }
        Ok(Box::new(MemoryTransport(handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_memory_round_trip() {
        let (tx, rx) = mpsc::channel();
        let mut launcher = MemoryLauncher::new();
        let config = EngineConfig::from_command_line("scripted");
        let transport = launcher.launch(Slot::Second, 3, &config, tx).unwrap();
        transport.send("xboard").unwrap();
        let handle = launcher.handle(Slot::Second);
        assert_eq!(handle.sent(), vec!["xboard"]);
        assert!(handle.reply("feature done=1"));
        assert_eq!(
            rx.try_recv().unwrap(),
            Incoming {
                slot: Slot::Second,
                generation: 3,
                event: EngineEvent::Line("feature done=1".to_string())
            }
        );
    }

    #[test]
    fn test_quit_and_failures() {
        let (tx, _rx) = mpsc::channel();
        let mut launcher = MemoryLauncher::new();
        let config = EngineConfig::from_command_line("scripted");
        let handle = launcher.handle(Slot::First);
        handle.set_fail_spawn(true);
        assert!(matches!(
            launcher.launch(Slot::First, 1, &config, tx.clone()),
            Err(EngineError::Spawn { .. })
        ));
        handle.set_fail_spawn(false);
        let transport = launcher.launch(Slot::First, 2, &config, tx).unwrap();
        transport.send("quit").unwrap();
        assert!(transport.has_exited());
        assert!(transport.send("new").is_err());
    }

    #[test]
    fn test_reader_survives_bad_utf8() {
        let output: &[u8] = b"feature myname=\"Caf\xe9\"\r\nmove e7e5\n";
        let mut events = Vec::new();
        pump_lines(output, &StopFlag::new(), |event| {
            events.push(event);
            true
        });
        assert_eq!(
            events,
            vec![
                EngineEvent::Line("feature myname=\"Caf\u{fffd}\"".to_string()),
                EngineEvent::Line("move e7e5".to_string()),
                EngineEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_reader_stops_quietly_when_detached() {
        let stop = StopFlag::new();
        stop.stop();
        let mut events = Vec::new();
        pump_lines(&b"move e7e5\n"[..], &stop, |event| {
            events.push(event);
            true
        });
        assert!(events.is_empty());
    }

    #[test]
    fn test_spawn_failure_for_missing_program() {
        let (tx, _rx) = mpsc::channel();
        let config = EngineConfig::from_command_line("/nonexistent/referee-test-engine");
        let result = ProcessLauncher.launch(Slot::First, 1, &config, tx);
        assert!(matches!(result, Err(EngineError::Spawn { .. })));
    }
}

use std::env;
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use referee::engine::ProcessLauncher;
use referee::session::{EventLoop, Notice, Session, SessionMode};
use referee::timer::SystemClock;
use referee::{Color, SessionConfig, Slot};

const USAGE: &str = "usage: referee -fcp <engine> [-scp <engine>] [-tc <min> -inc <sec> | -st <sec>] \
[-variant <name>] [-mg <games>] [-fen <fen>] [-xclock] [-autoflag]";

const POLL: Duration = Duration::from_millis(50);

fn main() -> ExitCode {
    let config = match SessionConfig::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("referee: {err}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    if !config.first.is_configured() {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }
    let two_engines = config.second.is_configured();

    let mut event_loop =
        match EventLoop::new(config, Box::new(ProcessLauncher), Arc::new(SystemClock)) {
            Ok(event_loop) => event_loop,
            Err(err) => {
                eprintln!("referee: {err}");
                return ExitCode::from(2);
            }
        };

    let failed = if two_engines {
        run_match(&mut event_loop)
    } else {
        run_console(&mut event_loop)
    };
    event_loop.shutdown();
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Engine against engine until the game, or the match, is over.
fn run_match(event_loop: &mut EventLoop) -> bool {
    if let Err(err) = event_loop
        .session_mut()
        .request_mode_transition(SessionMode::EngineVsEngine)
    {
        print_notices(event_loop.session_mut());
        eprintln!("referee: {err}");
        return true;
    }
    let mut failed = false;
    event_loop.run_until(
        |session| session.mode() == SessionMode::EndOfGame && session.match_finished(),
        |notice| failed |= print_notice(&notice),
    );
    failed
}

/// The user plays against the first engine, one command per line.
fn run_console(event_loop: &mut EventLoop) -> bool {
    let input = spawn_stdin_reader();
    let mut failed = false;
    loop {
        event_loop.run_once(POLL);
        for notice in event_loop.session_mut().take_notices() {
            failed |= print_notice(&notice);
        }
        match input.try_recv() {
            Ok(line) => {
                if !console_command(event_loop.session_mut(), line.trim()) {
                    return failed;
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => return failed,
        }
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Returns false on `quit`.
fn console_command(session: &mut Session, line: &str) -> bool {
    let outcome = match line {
        "" => Ok(()),
        "quit" => return false,
        "new" => session.reset(),
        "go" => {
            let side = session.history().current_position().side_to_move();
            session.request_mode_transition(SessionMode::PlayerVsEngine { engine_color: side })
        }
        "white" | "black" => {
            let user = if line == "white" { Color::White } else { Color::Black };
            session.request_mode_transition(SessionMode::PlayerVsEngine {
                engine_color: user.opponent(),
            })
        }
        "force" => session.request_mode_transition(SessionMode::EditGame),
        "analyze" => session.request_mode_transition(SessionMode::AnalyzeLive),
        "back" => session.step_backward().map(|_| ()),
        "forward" => session.step_forward().map(|_| ()),
        "draw" => session.offer_draw(),
        "resign" => session.resign(),
        "hint" => session.request_hint(),
        "status" => {
            println!("{}", status_line(session));
            Ok(())
        }
        text => session.apply_user_notation(text),
    };
    if let Err(err) = outcome {
        println!("Error: {err}");
    }
    true
}

fn status_line(session: &Session) -> String {
    let pos = session.history().current_position();
    let first = session.engine(Slot::First);
    format!(
        "{} | {} | {} to move | {} {}",
        session.mode(),
        pos.to_fen(),
        pos.side_to_move(),
        first.display_name(),
        first.state()
    )
}

fn print_notices(session: &mut Session) {
    for notice in session.take_notices() {
        print_notice(&notice);
    }
}

/// Print one notice. Returns true for fatal errors.
fn print_notice(notice: &Notice) -> bool {
    match notice {
        Notice::Info(text) | Notice::Remote(text) => println!("{text}"),
        Notice::MoveError(text) => println!("Illegal move: {text}"),
        Notice::Fatal { message, os_code } => {
            match os_code {
                Some(code) => eprintln!("referee: {message} (os error {code})"),
                None => eprintln!("referee: {message}"),
            }
            return true;
        }
        Notice::EngineMessage { slot, text, .. } => println!("[{slot}] {text}"),
        Notice::Hint { text, .. } => println!("Hint: {text}"),
        Notice::Thinking { slot, thinking } => println!(
            "[{slot}] {} {} {} {} {}",
            thinking.depth, thinking.score, thinking.time_cs, thinking.nodes, thinking.pv
        ),
        Notice::SearchStatus {
            slot,
            depth,
            nodes,
            time_cs,
        } => println!("[{slot}] depth {depth} nodes {nodes} time {time_cs}"),
        Notice::MovePlayed { ply, san } => {
            let number = ply.div_ceil(2);
            if ply % 2 == 1 {
                println!("{number}. {san}");
            } else {
                println!("{number}... {san}");
            }
        }
        Notice::GameEnd { result, detail } => println!("{result} {{{detail}}}"),
        Notice::MatchOver(score) => println!("{score}"),
        Notice::ModeChanged(mode) => println!("# {mode}"),
    }
    false
}

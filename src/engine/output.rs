//! Incoming engine lines.
//!
//! [`classify_line`] sorts one line of engine output into an [`EngineLine`]
//! without looking at game state. Whether a move is stale, or whom a
//! resignation favours, is decided by the session that owns the game.

use crate::board::Color;
use crate::result::GameResult;

use super::features::{parse_features, FeatureItem};
use super::scanner::{scan, scan_exact};

/// Search statistics from a thinking line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thinking {
    pub depth: u32,
    pub score: i32,
    pub time_cs: u64,
    pub nodes: u64,
    pub pv: String,
}

/// How an `Error`/`Illegal move` reply should be handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorReply {
    /// Complaint about a command the engine may legitimately not know
    Ignored,
    /// The engine does not understand `protover`: dialect 1
    Protover,
    /// Stop forwarding draw offers
    Draw,
    /// The engine does not take `time`/`otim`
    Time,
    Analyze,
    /// The engine rejects a move the referee sent it
    IllegalMove { notation: Option<String> },
    Other(String),
}

/// Which `tell...` command produced a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TellKind {
    User,
    UserError,
    Opponent,
    Others,
    All,
    AskUser,
}

/// One classified line of engine output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineLine {
    Empty,
    Comment(String),
    /// `move X`, or the legacy `N ... X`
    Move(String),
    Feature(Vec<FeatureItem>),
    Pong(u32),
    Tell { kind: TellKind, text: String },
    Hint(String),
    Error(ErrorReply),
    /// The program could not start properly
    StartupFailure(String),
    Result { result: GameResult, detail: Option<String> },
    /// `White resigns`/`Black resigns`, or `None` for the engine itself
    Resign(Option<Color>),
    /// `White mates`/`Black mates`
    Mates(Color),
    /// The engine claims to have mated its opponent
    ComputerMates,
    /// The engine's opponent has mated it
    OpponentMates,
    /// The side to move is mated
    Checkmate,
    Draw,
    OfferDraw,
    Thinking(Thinking),
    OnlyMove(String),
    Stat01 {
        time_cs: u64,
        nodes: u64,
        depth: u32,
        left: u32,
        total: u32,
        current: Option<String>,
    },
    /// Indented line extending the previous principal variation
    Continuation(String),
    Other(String),
}

const STARTUP_FAILURES: [&str; 4] = ["not found", "no such file", "can't alloc", "permission denied"];

const IGNORED_ERRORS: [&str; 12] = [
    "name", "rating", "?", "result", "board", "bk", "computer", "variant", "hint", "random",
    "depth", "accepted",
];

/// Classify one line of engine output.
#[must_use]
pub fn classify_line(raw: &str) -> EngineLine {
    let cleaned: String = raw.chars().filter(|&c| c != '\u{7}').collect();
    let line = cleaned.trim_end_matches(['\r', '\n']);

    if line.trim().is_empty() {
        return EngineLine::Empty;
    }
    if line.starts_with(' ') || line.starts_with('\t') {
        return EngineLine::Continuation(line.trim().to_string());
    }
    if let Some(comment) = line.strip_prefix('#') {
        return EngineLine::Comment(comment.trim().to_string());
    }
    if let Some(mv) = line.strip_prefix("move ") {
        return EngineLine::Move(mv.trim().to_string());
    }
    if let Some(mv) = legacy_move(line) {
        return EngineLine::Move(mv);
    }
    if let Some(body) = line.strip_prefix("feature ") {
        return EngineLine::Feature(parse_features(body));
    }
    if let Some(caps) = scan_exact(line, "pong #") {
        if let Some(n) = caps.int(0).and_then(|n| u32::try_from(n).ok()) {
            return EngineLine::Pong(n);
        }
    }
    if let Some(tell) = tell(line) {
        return tell;
    }
    if let Some(caps) = scan(line, "Hint: *") {
        return EngineLine::Hint(caps.get(0).unwrap_or("").trim().to_string());
    }
    if line.starts_with("Error") || line.starts_with("Illegal move") {
        return EngineLine::Error(error_reply(line));
    }
    let lower = line.to_ascii_lowercase();
    if STARTUP_FAILURES.iter().any(|p| lower.contains(p)) {
        return EngineLine::StartupFailure(line.to_string());
    }
    if let Some(result) = result_line(line) {
        return result;
    }
    if line.starts_with("White resign") {
        return EngineLine::Resign(Some(Color::White));
    }
    if line.starts_with("Black resign") {
        return EngineLine::Resign(Some(Color::Black));
    }
    if line.starts_with("resign") || line.starts_with("computer resigns") {
        return EngineLine::Resign(None);
    }
    if line.starts_with("opponent mates") {
        return EngineLine::OpponentMates;
    }
    if line.starts_with("computer mates") {
        return EngineLine::ComputerMates;
    }
    if line.starts_with("checkmate") {
        return EngineLine::Checkmate;
    }
    if line.starts_with("White") && !line[5..].starts_with('(') && !line.contains("Black") {
        return EngineLine::Mates(Color::White);
    }
    if line.starts_with("Black") && !line[5..].starts_with('(') {
        return EngineLine::Mates(Color::Black);
    }
    if lower.contains("offer") && lower.contains("draw") {
        return EngineLine::OfferDraw;
    }
    if line.starts_with("Draw") || lower.contains("game is a draw") {
        return EngineLine::Draw;
    }
    if let Some(caps) = scan(line, "(only move) *") {
        return EngineLine::OnlyMove(caps.get(0).unwrap_or("").trim().to_string());
    }
    if let Some(stat) = stat01(line) {
        return stat;
    }
    if let Some(thinking) = thinking(line) {
        return EngineLine::Thinking(thinking);
    }
    EngineLine::Other(line.to_string())
}

fn legacy_move(line: &str) -> Option<String> {
    let mut words = line.split_whitespace();
    let (_, dots, mv) = (words.next()?, words.next()?, words.next()?);
    (dots == "...").then(|| mv.to_string())
}

fn tell(line: &str) -> Option<EngineLine> {
    const TELLS: [(&str, TellKind); 6] = [
        ("tellusererror ", TellKind::UserError),
        ("telluser ", TellKind::User),
        ("tellopponent ", TellKind::Opponent),
        ("tellothers ", TellKind::Others),
        ("tellall ", TellKind::All),
        ("askuser ", TellKind::AskUser),
    ];
    TELLS.iter().find_map(|&(prefix, kind)| {
        line.strip_prefix(prefix).map(|text| EngineLine::Tell {
            kind,
            text: text.trim().to_string(),
        })
    })
}

fn error_reply(line: &str) -> ErrorReply {
    // substring tests are case-sensitive
    if IGNORED_ERRORS.iter().any(|w| line.contains(w)) {
        return ErrorReply::Ignored;
    }
    if line.contains("protover") {
        return ErrorReply::Protover;
    }
    if line.contains("draw") {
        return ErrorReply::Draw;
    }
    if line.contains("time") || line.contains("otim") {
        return ErrorReply::Time;
    }
    if line.contains("analyze") {
        return ErrorReply::Analyze;
    }
    if line.contains("llegal") {
        let notation = line
            .split_once(':')
            .and_then(|(_, tail)| tail.split_whitespace().next())
            .map(str::to_string);
        return ErrorReply::IllegalMove { notation };
    }
    ErrorReply::Other(line.to_string())
}

fn result_line(line: &str) -> Option<EngineLine> {
    let result = if line.starts_with("1-0") {
        GameResult::WhiteWins
    } else if line.starts_with("0-1") {
        GameResult::BlackWins
    } else if line.starts_with("1/2") {
        GameResult::Draw
    } else if line == "*" || line.starts_with("* ") {
        GameResult::Unfinished
    } else {
        return None;
    };
    let detail = line
        .split_once('{')
        .map(|(_, tail)| tail.split('}').next().unwrap_or(tail).trim().to_string());
    Some(EngineLine::Result { result, detail })
}

fn stat01(line: &str) -> Option<EngineLine> {
    let caps = scan(line, "stat01: # # # # #")?;
    let num = |i: usize| caps.int(i).and_then(|n| u64::try_from(n).ok());
    let small = |i: usize| caps.int(i).and_then(|n| u32::try_from(n).ok());
    let current = caps.rest().split_whitespace().next().map(str::to_string);
    Some(EngineLine::Stat01 {
        time_cs: num(0)?,
        nodes: num(1)?,
        depth: small(2)?,
        left: small(3)?,
        total: small(4)?,
        current,
    })
}

/// `<ply>[ext] <score> <time> <nodes> [pv]`. A non-blank character after
/// the ply marks an engine reporting whole seconds.
fn thinking(line: &str) -> Option<Thinking> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let depth = line[..digits].parse().ok()?;
    let mut rest = &line[digits..];
    let ext = rest.chars().next()?;
    let seconds = !ext.is_whitespace();
    if seconds {
        rest = &rest[ext.len_utf8()..];
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
    }
    let mut words = rest.split_whitespace();
    let score = words.next()?.parse().ok()?;
    let time: u64 = words.next()?.parse().ok()?;
    let nodes = words.next()?.parse().ok()?;
    let pv = words.collect::<Vec<_>>().join(" ");
    Some(Thinking {
        depth,
        score,
        time_cs: if seconds { time * 100 } else { time },
        nodes,
        pv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves() {
        assert_eq!(classify_line("move e2e4"), EngineLine::Move("e2e4".to_string()));
        assert_eq!(classify_line("12. ... Nf6"), EngineLine::Move("Nf6".to_string()));
        assert_eq!(classify_line("move Nf3\u{7}\r"), EngineLine::Move("Nf3".to_string()));
    }

    #[test]
    fn test_pong_and_tell() {
        assert_eq!(classify_line("pong 3"), EngineLine::Pong(3));
        assert_eq!(
            classify_line("tellusererror out of book"),
            EngineLine::Tell {
                kind: TellKind::UserError,
                text: "out of book".to_string()
            }
        );
        assert_eq!(classify_line("Hint: e4"), EngineLine::Hint("e4".to_string()));
    }

    #[test]
    fn test_error_replies() {
        let reply = |s: &str| match classify_line(s) {
            EngineLine::Error(r) => r,
            other => panic!("not an error reply: {other:?}"),
        };
        assert_eq!(reply("Error (unknown command): protover"), ErrorReply::Protover);
        assert_eq!(reply("Error (unknown command): setboard"), ErrorReply::Ignored);
        assert_eq!(reply("Error (unknown command): otim"), ErrorReply::Time);
        assert_eq!(reply("Error (unknown command): draw"), ErrorReply::Draw);
        assert_eq!(reply("Error (unknown command): analyze"), ErrorReply::Analyze);
        assert_eq!(
            reply("Error (unknown command): Rating"),
            ErrorReply::Other("Error (unknown command): Rating".to_string())
        );
        assert_eq!(reply("Error (unknown command): rating"), ErrorReply::Ignored);
        assert_eq!(
            reply("Illegal move: e2e5"),
            ErrorReply::IllegalMove {
                notation: Some("e2e5".to_string())
            }
        );
        assert_eq!(
            reply("Illegal move (no piece): e3e4"),
            ErrorReply::IllegalMove {
                notation: Some("e3e4".to_string())
            }
        );
    }

    #[test]
    fn test_results() {
        assert_eq!(
            classify_line("1-0 {White mates}"),
            EngineLine::Result {
                result: GameResult::WhiteWins,
                detail: Some("White mates".to_string())
            }
        );
        assert_eq!(
            classify_line("1/2-1/2 {Draw by repetition}"),
            EngineLine::Result {
                result: GameResult::Draw,
                detail: Some("Draw by repetition".to_string())
            }
        );
        assert_eq!(
            classify_line("0-1"),
            EngineLine::Result {
                result: GameResult::BlackWins,
                detail: None
            }
        );
        assert_eq!(classify_line("resign"), EngineLine::Resign(None));
        assert_eq!(classify_line("White resigns"), EngineLine::Resign(Some(Color::White)));
        assert_eq!(classify_line("Black mates"), EngineLine::Mates(Color::Black));
        assert_eq!(classify_line("offer draw"), EngineLine::OfferDraw);
        assert_eq!(classify_line("Draw"), EngineLine::Draw);
        assert_eq!(classify_line("computer mates"), EngineLine::ComputerMates);
    }

    #[test]
    fn test_thinking() {
        assert_eq!(
            classify_line("9 -35 120 40000 e4 e5 Nf3"),
            EngineLine::Thinking(Thinking {
                depth: 9,
                score: -35,
                time_cs: 120,
                nodes: 40000,
                pv: "e4 e5 Nf3".to_string()
            })
        );
        match classify_line("4. 12 3 900 d4") {
            EngineLine::Thinking(t) => assert_eq!(t.time_cs, 300),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            classify_line("(only move) Kh1"),
            EngineLine::OnlyMove("Kh1".to_string())
        );
        assert_eq!(
            classify_line("stat01: 150 31337 6 3 20 Nc3"),
            EngineLine::Stat01 {
                time_cs: 150,
                nodes: 31337,
                depth: 6,
                left: 3,
                total: 20,
                current: Some("Nc3".to_string())
            }
        );
        assert_eq!(
            classify_line("   Bb5 a6"),
            EngineLine::Continuation("Bb5 a6".to_string())
        );
    }

    #[test]
    fn test_misc() {
        assert_eq!(classify_line(""), EngineLine::Empty);
        assert_eq!(classify_line("# book move"), EngineLine::Comment("book move".to_string()));
        assert!(matches!(
            classify_line("sh: crafty: not found"),
            EngineLine::StartupFailure(_)
        ));
        assert!(matches!(
            classify_line("feature done=1"),
            EngineLine::Feature(items) if items.len() == 1
        ));
        assert_eq!(
            classify_line("Crafty v23.4"),
            EngineLine::Other("Crafty v23.4".to_string())
        );
    }
}

//! Outgoing engine commands.
//!
//! Commands are built as values and rendered to protocol lines only when they
//! are written, so anything queued during feature negotiation comes out in the
//! dialect the engine finally agreed to.

use crate::board::{Color, Move, Position};
use crate::clock::{centiseconds, TimeControl};
use crate::result::GameResult;

use super::features::Capabilities;

/// A move in both notations; [`Command::Move`] picks one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveText {
    pub san: String,
    pub coordinate: String,
}

impl MoveText {
    #[must_use]
    pub fn new(san: impl Into<String>, mv: &Move) -> Self {
        MoveText {
            san: san.into(),
            coordinate: mv.to_string(),
        }
    }
}

/// A position for engines, in both `setboard` and `edit` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSetup {
    pub fen: String,
    /// White pieces as `Pa2`
    pub white: Vec<String>,
    /// Black pieces, also uppercase
    pub black: Vec<String>,
    pub black_to_move: bool,
}

impl BoardSetup {
    #[must_use]
    pub fn from_position(pos: &Position) -> Self {
        let list = |color: Color| {
            pos.pieces(color)
                .map(|(sq, occ)| format!("{}{sq}", occ.piece.san_char()))
                .collect()
        };
        BoardSetup {
            fen: pos.to_fen(),
            white: list(Color::White),
            black: list(Color::Black),
            black_to_move: pos.side_to_move() == Color::Black,
        }
    }
}

/// Everything the referee says to an engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    XBoard,
    Protover(u32),
    Accepted(String),
    Rejected(String),
    New,
    Variant(String),
    /// `level ...` or `st ...`
    TimeControl(TimeControl),
    Sd(u32),
    /// `time` then `otim`, both in milliseconds here
    Time { own_ms: i64, opponent_ms: i64 },
    Move(MoveText),
    Ping(u32),
    Force,
    Go,
    PlayOther,
    /// `white`/`black`, sent only to engines that take colors
    Color(Color),
    Undo,
    Remove,
    Result { result: GameResult, detail: String },
    Analyze,
    Exit,
    Hint,
    Draw,
    /// `.` while analysing
    AnalysisStatus,
    Quit,
    Easy,
    Hard,
    Post,
    NoPost,
    Computer,
    /// Opponent's name, for engines with `name=1`
    Name(String),
    Random,
    Board(BoardSetup),
    Raw(String),
}

impl Command {
    /// Protocol lines for an engine with `caps`, possibly none.
    #[must_use]
    pub fn render(&self, caps: &Capabilities) -> Vec<String> {
        let line = |s: &str| vec![s.to_string()];
        match self {
            Command::XBoard => line("xboard"),
            Command::Protover(n) => vec![format!("protover {n}")],
            Command::Accepted(name) => vec![format!("accepted {name}")],
            Command::Rejected(name) => vec![format!("rejected {name}")],
            Command::New => line("new"),
            Command::Variant(name) => vec![format!("variant {name}")],
            Command::TimeControl(tc) => vec![tc.protocol_line()],
            Command::Sd(depth) => vec![format!("sd {depth}")],
            Command::Time {
                own_ms,
                opponent_ms,
            } => {
                if !caps.time.sends_time() {
                    return Vec::new();
                }
                vec![
                    format!("time {}", centiseconds(*own_ms)),
                    format!("otim {}", centiseconds(*opponent_ms)),
                ]
            }
            Command::Move(text) => {
                let mv = if caps.san { &text.san } else { &text.coordinate };
                if caps.usermove {
                    vec![format!("usermove {mv}")]
                } else {
                    vec![mv.clone()]
                }
            }
            Command::Ping(n) => vec![format!("ping {n}")],
            Command::Force => line("force"),
            Command::Go => line("go"),
            Command::PlayOther => line("playother"),
            Command::Color(color) if caps.colors => line(color.protocol_name()),
            Command::Color(_) => Vec::new(),
            Command::Undo => line("undo"),
            Command::Remove => line("remove"),
            Command::Result { result, detail } => vec![format!("result {} {{{detail}}}", result.tag())],
            Command::Analyze => line("analyze"),
            Command::Exit => line("exit"),
            Command::Hint => line("hint"),
            Command::Draw if caps.draw => line("draw"),
            Command::Draw => Vec::new(),
            Command::AnalysisStatus => line("."),
            Command::Quit => line("quit"),
            Command::Easy => line("easy"),
            Command::Hard => line("hard"),
            Command::Post => line("post"),
            Command::NoPost => line("nopost"),
            Command::Computer => line("computer"),
            Command::Name(name) if caps.name => vec![format!("name {name}")],
            Command::Name(_) => Vec::new(),
            Command::Random => line("random"),
            Command::Board(setup) => render_board(setup, caps),
            Command::Raw(text) => text.lines().map(str::to_string).collect(),
        }
    }
}

fn render_board(setup: &BoardSetup, caps: &Capabilities) -> Vec<String> {
    if caps.setboard {
        return vec![format!("setboard {}", setup.fen)];
    }
    let mut lines = Vec::with_capacity(setup.white.len() + setup.black.len() + 5);
    // the edit dialect has no side-to-move command; a dummy move hands Black the turn
    if setup.black_to_move {
        lines.push("a2a3".to_string());
    }
    lines.push("edit".to_string());
    lines.push("#".to_string());
    lines.extend(setup.white.iter().cloned());
    lines.push("c".to_string());
    lines.extend(setup.black.iter().cloned());
    lines.push(".".to_string());
    lines
}

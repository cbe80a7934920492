//! Time controls and clock formatting.
//!
//! Engines get times in centiseconds (`time`/`otim`) and controls as
//! `level <mps> <base> <inc>` with the base in minutes or `min:ss`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Low-time display threshold: below this the clock shows tenths.
pub const TENTHS_THRESHOLD_MS: i64 = 10_000;

/// How a game is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeControl {
    /// `moves_per_session` moves in `base_ms`, then the same again
    Conventional { moves_per_session: u32, base_ms: u64 },
    /// `base_ms` for the game plus `increment_ms` after every move
    Incremental { base_ms: u64, increment_ms: u64 },
    /// Exactly `seconds` per move; the game clocks do not run
    FixedPerMove { seconds: u32 },
}

impl Default for TimeControl {
    fn default() -> Self {
        TimeControl::Conventional {
            moves_per_session: 40,
            base_ms: 5 * 60_000,
        }
    }
}

impl TimeControl {
    /// Build from `level`-style parameters: an increment wins over a session length.
    #[must_use]
    pub fn from_level(moves_per_session: u32, base_ms: u64, increment_ms: Option<u64>) -> Self {
        match increment_ms {
            Some(increment_ms) => TimeControl::Incremental {
                base_ms,
                increment_ms,
            },
            None => TimeControl::Conventional {
                moves_per_session,
                base_ms,
            },
        }
    }

    /// Starting time on each clock
    #[must_use]
    pub fn base_ms(&self) -> u64 {
        match *self {
            TimeControl::Conventional { base_ms, .. } | TimeControl::Incremental { base_ms, .. } => {
                base_ms
            }
            TimeControl::FixedPerMove { seconds } => u64::from(seconds) * 1000,
        }
    }

    #[must_use]
    pub fn increment_ms(&self) -> u64 {
        match *self {
            TimeControl::Incremental { increment_ms, .. } => increment_ms,
            _ => 0,
        }
    }

    /// Moves per session, 0 when the control does not repeat
    #[must_use]
    pub fn moves_per_session(&self) -> u32 {
        match *self {
            TimeControl::Conventional {
                moves_per_session, ..
            } => moves_per_session,
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_fixed_per_move(&self) -> bool {
        matches!(self, TimeControl::FixedPerMove { .. })
    }

    /// The engine command announcing this control (`st` or `level`)
    #[must_use]
    pub fn protocol_line(&self) -> String {
        match *self {
            TimeControl::FixedPerMove { seconds } => format!("st {seconds}"),
            _ => format!(
                "level {} {} {}",
                self.moves_per_session(),
                format_level_base(self.base_ms()),
                self.increment_ms() / 1000
            ),
        }
    }
}

/// Base time for `level`: whole minutes, or `min:ss` when seconds remain.
#[must_use]
pub fn format_level_base(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    if seconds == 0 {
        minutes.to_string()
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Parse a time string of the form `M` or `M:SS` into milliseconds.
#[must_use]
pub fn parse_time_text(text: &str) -> Option<u64> {
    let text = text.trim();
    let (min, sec) = match text.split_once(':') {
        Some((m, s)) => {
            if s.len() != 2 {
                return None;
            }
            (m.parse::<u64>().ok()?, s.parse::<u64>().ok()?)
        }
        None => (text.parse::<u64>().ok()?, 0),
    };
    if sec >= 60 {
        return None;
    }
    Some((min * 60 + sec) * 1000)
}

/// Milliseconds to protocol centiseconds; never less than 1.
#[inline]
#[must_use]
pub fn centiseconds(ms: i64) -> i64 {
    (ms / 10).max(1)
}

/// Clock display text.
///
/// Under ten seconds the clock shows tenths rounded up ("9.9"); otherwise
/// whole seconds rounded up as `m:ss`, `h:mm:ss` or `d:hh:mm:ss`, with a
/// leading `-` once the flag has fallen.
#[must_use]
pub fn format_clock(ms: i64) -> String {
    if ms > 0 && ms <= 9_900 {
        let tenths = (ms + 99) / 100;
        return format!("{}.{}", tenths / 10, tenths % 10);
    }
    let mut seconds = (ms + 999).div_euclid(1000);
    let sign = if seconds < 0 { "-" } else { "" };
    seconds = seconds.abs();
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{sign}{days}:{hours:02}:{minutes:02}:{secs:02}")
    } else if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{sign}{minutes}:{secs:02}")
    }
}

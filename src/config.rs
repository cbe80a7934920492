//! Session and engine configuration.
//!
//! Settings come from three places: [`Default`], xboard-style command-line
//! flags ([`SessionConfig::from_args`]) and named options set one at a time
//! ([`SessionConfig::apply_option`]). Whatever the source, a configuration is
//! checked with [`SessionConfig::validate`] before any engine is started.

use std::fmt;
use std::path::PathBuf;

use crate::board::{FenError, Position, Variant};
use crate::clock::{parse_time_text, TimeControl};
use crate::engine::Slot;

/// Default wait for `feature done=1` (ms)
pub const DEFAULT_FEATURE_TIMEOUT_MS: u64 = 10_000;
/// Default grace period between `quit` and killing an engine (ms)
pub const DEFAULT_QUIT_GRACE_MS: u64 = 500;
/// Default pause between match games (ms)
pub const DEFAULT_MATCH_DELAY_MS: u64 = 10_000;

/// Configuration errors. All of them are reported before an engine starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownOption { name: String },
    MissingValue { option: String },
    InvalidValue { option: String, value: String },
    /// Time strings are `M` or `M:SS`
    InvalidTime { text: String },
    UnknownVariant { name: String },
    /// The base time must be positive unless a fixed time per move is set
    NonPositiveTime,
    /// An engine mode was requested without a program for `slot`
    MissingEngine { slot: Slot },
    InvalidPosition { source: FenError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption { name } => write!(f, "Unknown option '{name}'"),
            ConfigError::MissingValue { option } => write!(f, "Option '{option}' needs a value"),
            ConfigError::InvalidValue { option, value } => {
                write!(f, "Invalid value '{value}' for option '{option}'")
            }
            ConfigError::InvalidTime { text } => write!(f, "Bad time control '{text}'"),
            ConfigError::UnknownVariant { name } => write!(f, "Unknown variant '{name}'"),
            ConfigError::NonPositiveTime => write!(f, "Time control must be positive"),
            ConfigError::MissingEngine { slot } => write!(f, "No {slot} chess program configured"),
            ConfigError::InvalidPosition { source } => write!(f, "Bad start position: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPosition { source } => Some(source),
            _ => None,
        }
    }
}

impl From<FenError> for ConfigError {
    fn from(source: FenError) -> Self {
        ConfigError::InvalidPosition { source }
    }
}

/// How to run one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub protocol_version: u32,
    /// Keep the process between games; the engine may turn this off, never on
    pub reuse: bool,
    /// Display name; the engine's `myname` feature replaces it
    pub name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: String::new(),
            args: Vec::new(),
            dir: None,
            protocol_version: 2,
            reuse: true,
            name: None,
        }
    }
}

impl EngineConfig {
    /// From a command line such as `"crafty xboard"`: program then arguments.
    #[must_use]
    pub fn from_command_line(line: &str) -> Self {
        let mut words = line.split_whitespace().map(str::to_string);
        EngineConfig {
            program: words.next().unwrap_or_default(),
            args: words.collect(),
            ..EngineConfig::default()
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.program.is_empty()
    }

    /// Configured name, else the program's file name
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        std::path::Path::new(&self.program)
            .file_name()
            .map_or_else(|| self.program.clone(), |n| n.to_string_lossy().into_owned())
    }
}

/// Every tunable of a referee session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SessionConfig {
    pub variant: Variant,
    pub time_control: TimeControl,
    /// `sd` limit sent to engines
    pub search_depth: Option<u32>,
    pub clock_mode: bool,
    /// End the game when a flag falls
    pub auto_flag: bool,
    /// Check user and engine moves against the rules
    pub test_legality: bool,
    pub ponder: bool,
    pub show_thinking: bool,
    pub feature_timeout_ms: u64,
    pub quit_grace_ms: u64,
    /// Number of games in a match; 0 plays no match
    pub match_games: u32,
    pub match_delay_ms: u64,
    pub replay_delay_ms: u64,
    /// Sent to an engine at the start of every game, line by line
    pub init_string: String,
    pub first: EngineConfig,
    pub second: EngineConfig,
    pub start_fen: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            variant: Variant::Normal,
            time_control: TimeControl::default(),
            search_depth: None,
            clock_mode: true,
            auto_flag: false,
            test_legality: true,
            ponder: false,
            show_thinking: false,
            feature_timeout_ms: DEFAULT_FEATURE_TIMEOUT_MS,
            quit_grace_ms: DEFAULT_QUIT_GRACE_MS,
            match_games: 0,
            match_delay_ms: DEFAULT_MATCH_DELAY_MS,
            replay_delay_ms: 1_000,
            init_string: "new\nrandom\n".to_string(),
            first: EngineConfig::default(),
            second: EngineConfig::default(),
            start_fen: None,
        }
    }
}

fn parse_bool(option: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(invalid(option, value)),
    }
}

fn parse_num<T: std::str::FromStr>(option: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(option, value))
}

fn invalid(option: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    }
}

/// Time control pieces collected from separate options.
#[derive(Default)]
struct TimeParts {
    base_ms: Option<u64>,
    increment_s: Option<u64>,
    mps: Option<u32>,
    st: Option<u32>,
}

impl TimeParts {
    fn from_control(tc: &TimeControl) -> Self {
        match *tc {
            TimeControl::Conventional {
                moves_per_session,
                base_ms,
            } => TimeParts {
                base_ms: Some(base_ms),
                mps: Some(moves_per_session),
                ..TimeParts::default()
            },
            TimeControl::Incremental {
                base_ms,
                increment_ms,
            } => TimeParts {
                base_ms: Some(base_ms),
                increment_s: Some(increment_ms / 1000),
                ..TimeParts::default()
            },
            TimeControl::FixedPerMove { seconds } => TimeParts {
                st: Some(seconds),
                ..TimeParts::default()
            },
        }
    }

    fn build(&self, fallback: &TimeControl) -> TimeControl {
        if let Some(seconds) = self.st {
            return TimeControl::FixedPerMove { seconds };
        }
        let base_ms = self.base_ms.unwrap_or_else(|| fallback.base_ms());
        let mps = self.mps.unwrap_or(40);
        TimeControl::from_level(mps, base_ms, self.increment_s.map(|s| s * 1000))
    }
}

impl SessionConfig {
    /// Set one option by name (case-insensitive, spaces ignored).
    pub fn apply_option(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let mut parts = TimeParts::from_control(&self.time_control);
        match normalized.as_str() {
            "variant" => {
                self.variant = Variant::from_name(value).ok_or_else(|| ConfigError::UnknownVariant {
                    name: value.to_string(),
                })?;
            }
            "timecontrol" | "tc" => {
                parts.st = None;
                parts.base_ms = Some(parse_time_text(value).ok_or_else(|| ConfigError::InvalidTime {
                    text: value.to_string(),
                })?);
                self.time_control = parts.build(&self.time_control);
            }
            "timeincrement" | "inc" => {
                parts.st = None;
                parts.increment_s = Some(parse_num(name, value)?);
                self.time_control = parts.build(&self.time_control);
            }
            "movespersession" | "mps" => {
                parts.st = None;
                parts.increment_s = None;
                parts.mps = Some(parse_num(name, value)?);
                self.time_control = parts.build(&self.time_control);
            }
            "searchtime" | "st" => {
                parts.st = Some(parse_num(name, value)?);
                self.time_control = parts.build(&self.time_control);
            }
            "searchdepth" | "depth" => {
                let depth: u32 = parse_num(name, value)?;
                self.search_depth = (depth > 0).then_some(depth);
            }
            "clockmode" | "clock" => self.clock_mode = parse_bool(name, value)?,
            "autoflag" | "autocallflag" => self.auto_flag = parse_bool(name, value)?,
            "testlegality" => self.test_legality = parse_bool(name, value)?,
            "ponder" | "pondernextmove" => self.ponder = parse_bool(name, value)?,
            "showthinking" => self.show_thinking = parse_bool(name, value)?,
            "featuretimeout" | "timeout" => self.feature_timeout_ms = parse_num(name, value)?,
            "quitgrace" => self.quit_grace_ms = parse_num(name, value)?,
            "matchgames" | "mg" => self.match_games = parse_num(name, value)?,
            "matchdelay" => self.match_delay_ms = parse_num(name, value)?,
            "replaydelay" => self.replay_delay_ms = parse_num(name, value)?,
            "initstring" => self.init_string = value.replace("\\n", "\n"),
            "fen" => self.start_fen = Some(value.to_string()),
            "firstchessprogram" | "fcp" => self.set_program(Slot::First, value),
            "secondchessprogram" | "scp" => self.set_program(Slot::Second, value),
            "firstdirectory" | "fd" => self.first.dir = Some(PathBuf::from(value)),
            "seconddirectory" | "sd" => self.second.dir = Some(PathBuf::from(value)),
            "firstprotocolversion" => self.first.protocol_version = parse_num(name, value)?,
            "secondprotocolversion" => self.second.protocol_version = parse_num(name, value)?,
            "reuse" | "reusefirst" => self.first.reuse = parse_bool(name, value)?,
            "reuse2" | "reusesecond" => self.second.reuse = parse_bool(name, value)?,
            "firstname" => self.first.name = Some(value.to_string()),
            "secondname" => self.second.name = Some(value.to_string()),
            _ => {
                return Err(ConfigError::UnknownOption {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn set_program(&mut self, slot: Slot, line: &str) {
        let engine = self.engine_mut(slot);
        let parsed = EngineConfig::from_command_line(line);
        engine.program = parsed.program;
        engine.args = parsed.args;
    }

    /// Parse xboard-style flags (`-fcp prog -tc 5 -inc 2 -xclock ...`).
    ///
    /// Boolean flags take an optional `true`/`false`; `-xflag` turns one off.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        const BOOLEAN: [&str; 6] = ["clock", "autoflag", "ponder", "reuse", "reuse2", "testlegality"];
        let mut config = SessionConfig::default();
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            let Some(flag) = arg.strip_prefix('-') else {
                return Err(ConfigError::UnknownOption { name: arg.clone() });
            };
            i += 1;
            let lowered = flag.to_ascii_lowercase();
            if let Some(negated) = lowered.strip_prefix('x').filter(|n| BOOLEAN.contains(n)) {
                config.apply_option(negated, "false")?;
                continue;
            }
            if BOOLEAN.contains(&lowered.as_str()) {
                let explicit = args
                    .get(i)
                    .filter(|v| parse_bool(flag, v).is_ok())
                    .cloned();
                if explicit.is_some() {
                    i += 1;
                }
                config.apply_option(&lowered, explicit.as_deref().unwrap_or("true"))?;
                continue;
            }
            let value = args.get(i).ok_or_else(|| ConfigError::MissingValue {
                option: arg.clone(),
            })?;
            i += 1;
            config.apply_option(flag, value)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn engine(&self, slot: Slot) -> &EngineConfig {
        match slot {
            Slot::First => &self.first,
            Slot::Second => &self.second,
        }
    }

    pub fn engine_mut(&mut self, slot: Slot) -> &mut EngineConfig {
        match slot {
            Slot::First => &mut self.first,
            Slot::Second => &mut self.second,
        }
    }

    /// The configured start position, or the variant's standard one.
    pub fn start_position(&self) -> Result<Position, ConfigError> {
        match &self.start_fen {
            Some(fen) => Ok(Position::try_from_fen(self.variant, fen)?),
            None => Ok(Position::start(self.variant)),
        }
    }

    /// Check the configuration before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.time_control {
            TimeControl::FixedPerMove { seconds: 0 } => {
                return Err(invalid("st", "0"));
            }
            TimeControl::FixedPerMove { .. } => {}
            _ if self.time_control.base_ms() == 0 => return Err(ConfigError::NonPositiveTime),
            _ => {}
        }
        if let Some(fen) = &self.start_fen {
            Position::try_from_fen(self.variant, fen)?;
        }
        if self.match_games > 0 {
            for slot in Slot::BOTH {
                if !self.engine(slot).is_configured() {
                    return Err(ConfigError::MissingEngine { slot });
                }
            }
        }
        Ok(())
    }

    /// Validate for a mode that needs the engine in `slot`.
    pub fn require_engine(&self, slot: Slot) -> Result<(), ConfigError> {
        if self.engine(slot).is_configured() {
            Ok(())
        } else {
            Err(ConfigError::MissingEngine { slot })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.feature_timeout_ms, 10_000);
        assert_eq!(config.match_delay_ms, 10_000);
        assert!(config.first.reuse);
        assert_eq!(config.first.protocol_version, 2);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_from_args() {
        let config = SessionConfig::from_args([
            "-fcp", "fairymax -x", "-scp", "crafty", "-variant", "Crazyhouse", "-tc", "2:30",
            "-inc", "3", "-mg", "4", "-xclock", "-autoflag", "-reuse2", "false", "-depth", "9",
        ])
        .unwrap();
        assert_eq!(config.first.program, "fairymax");
        assert_eq!(config.first.args, vec!["-x".to_string()]);
        assert_eq!(config.variant, Variant::Crazyhouse);
        assert_eq!(
            config.time_control,
            TimeControl::Incremental {
                base_ms: 150_000,
                increment_ms: 3_000
            }
        );
        assert_eq!(config.match_games, 4);
        assert!(!config.clock_mode);
        assert!(config.auto_flag);
        assert!(!config.second.reuse);
        assert_eq!(config.search_depth, Some(9));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_apply_option_case_insensitive() {
        let mut config = SessionConfig::default();
        config.apply_option("Moves Per Session", "30").unwrap();
        config.apply_option("TC", "10").unwrap();
        assert_eq!(
            config.time_control,
            TimeControl::Conventional {
                moves_per_session: 30,
                base_ms: 600_000
            }
        );
        config.apply_option("st", "5").unwrap();
        assert_eq!(config.time_control, TimeControl::FixedPerMove { seconds: 5 });
    }

    #[test]
    fn test_rejections() {
        let mut config = SessionConfig::default();
        assert!(matches!(
            config.apply_option("tc", "5:7"),
            Err(ConfigError::InvalidTime { .. })
        ));
        assert!(matches!(
            config.apply_option("variant", "bogus"),
            Err(ConfigError::UnknownVariant { .. })
        ));
        assert!(matches!(
            config.apply_option("frobnicate", "1"),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(matches!(
            SessionConfig::from_args(["-tc"]),
            Err(ConfigError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = SessionConfig::default();
        config.apply_option("tc", "0").unwrap();
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveTime));

        let mut config = SessionConfig::default();
        config.match_games = 2;
        config.first = EngineConfig::from_command_line("fairymax");
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingEngine { slot: Slot::Second })
        );

        let mut config = SessionConfig::default();
        config.start_fen = Some("not a fen".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_display_name() {
        let engine = EngineConfig::from_command_line("/usr/games/gnuchess -x");
        assert_eq!(engine.display_name(), "gnuchess");
        let named = EngineConfig {
            name: Some("Fairy-Max".to_string()),
            ..engine
        };
        assert_eq!(named.display_name(), "Fairy-Max");
    }
}

//! Rejections of session entry points.

use std::fmt;

use crate::board::{Color, NotationError, SetupError};
use crate::config::ConfigError;
use crate::engine::{EngineError, Slot};

use super::mode::SessionMode;

#[derive(Debug)]
pub enum SessionError {
    /// The request makes no sense in the current mode
    WrongMode { mode: SessionMode, action: &'static str },
    /// It is the other side's move
    NotYourTurn { to_move: Color },
    IllegalMove(NotationError),
    /// Training: the move differs from the game being studied
    WrongMove { expected: String },
    /// No game loaded, or the game is already over
    NoGame,
    Setup(SetupError),
    /// An engine died while handling the request
    Engine(EngineError),
    Config(ConfigError),
    /// An engine mode was requested without that engine
    NoEngine(Slot),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::WrongMode { mode, action } => {
                write!(f, "Cannot {action} in {mode} mode")
            }
            SessionError::NotYourTurn { to_move } => write!(f, "It is {to_move}'s turn"),
            SessionError::IllegalMove(err) => write!(f, "{err}"),
            SessionError::WrongMove { expected } => write!(f, "Wrong move, the game continues {expected}"),
            SessionError::NoGame => f.write_str("No game in progress"),
            SessionError::Setup(err) => write!(f, "{err}"),
            SessionError::Engine(err) => write!(f, "{err}"),
            SessionError::Config(err) => write!(f, "{err}"),
            SessionError::NoEngine(slot) => write!(f, "No {slot} chess program"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::IllegalMove(err) => Some(err),
            SessionError::Setup(err) => Some(err),
            SessionError::Engine(err) => Some(err),
            SessionError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NotationError> for SessionError {
    fn from(err: NotationError) -> Self {
        SessionError::IllegalMove(err)
    }
}

impl From<SetupError> for SessionError {
    fn from(err: SetupError) -> Self {
        SessionError::Setup(err)
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err)
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

//! Fatal engine errors.

use std::fmt;
use std::io;

/// Errors that end an engine session.
///
/// Each one tears the offending engine down; the session decides what
/// happens to the game.
#[derive(Debug)]
pub enum EngineError {
    /// The program could not be started
    Spawn { program: String, source: io::Error },
    /// A write to the engine failed
    Write { name: String, source: io::Error },
    /// The engine's output stream ended
    Closed { name: String },
    /// The engine's `variants` feature does not list the game's variant
    UnsupportedVariant { name: String, variant: String },
    /// The engine printed a startup failure message
    StartupFailure { name: String, message: String },
}

impl EngineError {
    /// OS error code, when the failure came from the operating system
    #[must_use]
    pub fn os_code(&self) -> Option<i32> {
        match self {
            EngineError::Spawn { source, .. } | EngineError::Write { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Spawn { program, source } => {
                write!(f, "Startup failure on '{program}': {source}")
            }
            EngineError::Write { name, source } => {
                write!(f, "Error writing to {name} chess program: {source}")
            }
            EngineError::Closed { name } => write!(f, "Error: {name} chess program exited unexpectedly"),
            EngineError::UnsupportedVariant { name, variant } => {
                write!(f, "Variant {variant} not supported by {name}")
            }
            EngineError::StartupFailure { name, message } => {
                write!(f, "Failed to start {name} chess program: {message}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Spawn { source, .. } | EngineError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

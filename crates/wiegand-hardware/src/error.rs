//! Error types for the Wiegand decoder.
//!
//! Attach and sample failures are fatal to the session that hit them: they
//! are reported once through the `error` event and never retried. Frames that
//! fail parity are not errors at all and never show up here.

use crate::session::SessionState;
use std::path::PathBuf;
use wiegand_core::Line;

/// Result type alias for decoder operations.
pub type Result<T> = std::result::Result<T, WiegandError>;

/// Errors that can occur while running a Wiegand session.
#[derive(Debug, thiserror::Error)]
pub enum WiegandError {
    /// A line's value resource could not be opened at start.
    #[error("Failed to attach {line} at {}: {source}", path.display())]
    Attach {
        line: Line,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line's value could not be read while handling an edge.
    #[error("Failed to sample {line}: {message}")]
    Sample { line: Line, message: String },

    /// Lifecycle operation not allowed in the current state.
    #[error("Cannot {operation} session in state {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Session configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WiegandError {
    /// Create a new attach error.
    pub fn attach(line: Line, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Attach {
            line,
            path: path.into(),
            source,
        }
    }

    /// Create a new sample error.
    pub fn sample(line: Line, message: impl Into<String>) -> Self {
        Self::Sample {
            line,
            message: message.into(),
        }
    }

    /// Create a new invalid state error.
    pub fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_attach_error() {
        let error = WiegandError::attach(
            Line::D0,
            "/sys/class/gpio/gpio17/value",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert!(matches!(error, WiegandError::Attach { .. }));
        assert_eq!(
            error.to_string(),
            "Failed to attach D0 at /sys/class/gpio/gpio17/value: No such file or directory"
        );
    }

    #[test]
    fn test_sample_error() {
        let error = WiegandError::sample(Line::D1, "unexpected value 0x7f");
        assert_eq!(error.to_string(), "Failed to sample D1: unexpected value 0x7f");
    }

    #[test]
    fn test_invalid_state_error() {
        let error = WiegandError::invalid_state("start", SessionState::Ready);
        assert_eq!(error.to_string(), "Cannot start session in state Ready");
    }
}

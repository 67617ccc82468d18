//! Error types for tkey-shamir.

use thiserror::Error;

/// Main error type for all driver operations.
#[derive(Debug, Error)]
pub enum TkeyError {
    /// Caller-supplied argument violates a documented invariant.
    ///
    /// Always detected before any I/O.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Payload does not fit the command's fixed frame.
    #[error("Encoding error: {command} payload of {len} bytes exceeds maximum {max}")]
    Encoding {
        /// Command being encoded.
        command: &'static str,
        /// Offered payload length.
        len: usize,
        /// Capacity of the payload field.
        max: usize,
    },

    /// I/O error on the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream reached EOF before a complete frame arrived.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Read did not complete within the configured timeout.
    #[error("Read timed out after {0}s")]
    Timeout(u64),

    /// Response frame was malformed or did not match the request.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Device answered NOK.
    #[error("{command} rejected by device")]
    Status {
        /// Name of the response command that carried the NOK.
        command: &'static str,
    },

    /// The unbounded read timeout could not be restored after a bounded read.
    #[error("Failed to restore read timeout: {0}")]
    TimeoutRestore(#[source] Box<TkeyError>),

    /// A round of a split failed; no shares are returned.
    #[error("split failed at {step}: {source}")]
    Split {
        /// Failing step.
        step: &'static str,
        /// Underlying error.
        #[source]
        source: Box<TkeyError>,
    },

    /// A round of a combine failed; no secret is returned.
    #[error("combine failed at {step}: {source}")]
    Combine {
        /// Failing step.
        step: &'static str,
        /// Underlying error.
        #[source]
        source: Box<TkeyError>,
    },
}

impl TkeyError {
    /// True if this error (or the step error it wraps) is a device NOK.
    pub fn is_status(&self) -> bool {
        match self {
            TkeyError::Status { .. } => true,
            TkeyError::Split { source, .. } | TkeyError::Combine { source, .. } => {
                source.is_status()
            }
            _ => false,
        }
    }

    /// True if this error was raised by argument validation.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, TkeyError::InvalidParameter(_))
    }

    pub(crate) fn split(step: &'static str, source: TkeyError) -> Self {
        TkeyError::Split {
            step,
            source: Box::new(source),
        }
    }

    pub(crate) fn combine(step: &'static str, source: TkeyError) -> Self {
        TkeyError::Combine {
            step,
            source: Box::new(source),
        }
    }
}

/// Result type alias using TkeyError.
pub type Result<T> = std::result::Result<T, TkeyError>;

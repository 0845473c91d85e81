//! AVI muxer error types.

use thiserror::Error;

/// Errors that can occur while writing an AVI container.
#[derive(Error, Debug)]
pub enum AviError {
    /// The writer was already finalized.
    #[error("Invalid state: AVI writer is already finalized")]
    InvalidState,

    /// Frame payload rejected (empty, larger than its buffer, wrong raw size).
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Stream parameters that cannot describe a video stream.
    #[error("Invalid stream config: {0}")]
    InvalidConfig(String),

    /// A size or offset no longer fits the 32-bit RIFF fields.
    #[error("Size overflow: {field} = {value} exceeds 32-bit RIFF limit")]
    SizeOverflow { field: &'static str, value: u64 },

    /// I/O error while creating, writing, seeking or flushing the output.
    ///
    /// The inner error is part of the message and not reported as a source,
    /// so alternate (`{:#}`) chains print it once.
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for AviError {
    fn from(err: std::io::Error) -> Self {
        AviError::Io(err)
    }
}

impl AviError {
    /// Contract violations are bugs in the caller, not environmental failures.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, AviError::InvalidState | AviError::InvalidFrame(_))
    }
}

/// Convenience Result type for AVI operations.
pub type AviResult<T> = Result<T, AviError>;

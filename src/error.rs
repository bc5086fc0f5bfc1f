//! Errors surfaced while decoding a FIT stream.

use thiserror::Error;

/// An error decoding a FIT stream.
///
/// All variants are fatal to the current iteration: no partially decoded frame
/// is ever emitted.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed FIT file header.
    #[error("Malformed FIT header: {0}.")]
    Header(&'static str),
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated:#06x}) and found ({found:#06x}) CRC values do not match.")]
    Crc { found: u16, calculated: u16 },
    /// Unexpectedly reached the end of the stream.
    #[error("Expected {expected} bytes, got {got} at offset {offset}.")]
    UnexpectedEof {
        expected: usize,
        got: usize,
        offset: usize,
    },
    /// Structurally invalid record content.
    #[error("Parsing error at offset {offset}: {reason}.")]
    Parse { offset: usize, reason: String },
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

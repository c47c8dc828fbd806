//! Error types for the codec core.

use std::path::PathBuf;

use thiserror::Error;

use crate::grid::Mode;

/// Error variants for prediction, entropy coding and container I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// The leading magic value of a container did not match.
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        /// Magic value the reader was looking for.
        expected: u32,
        /// Magic value actually read.
        found: u32,
    },

    /// A fixed field or array ended before it was complete.
    #[error("truncated input while reading {field}")]
    Truncated {
        /// Name of the field that could not be read in full.
        field: &'static str,
    },

    /// The rANS decoder needed another byte but the payload was exhausted.
    #[error("rANS underflow: payload, model and symbol count do not match")]
    RansUnderflow,

    /// Container mode flag is neither 0 nor 1.
    #[error("invalid mode flag: {0}")]
    InvalidMode(i32),

    /// A header field holds a value that cannot describe a valid record.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// A stored frequency table cannot form a static model.
    #[error("invalid model: {0}")]
    InvalidModel(&'static str),

    /// Symbol outside the coder alphabet.
    #[error("symbol {0} outside the alphabet")]
    SymbolOutOfRange(u32),

    /// A symbol with zero frequency cannot be encoded.
    #[error("zero frequency")]
    ZeroFrequency,

    /// Escape symbols and the escape list disagree.
    #[error("escape list does not match escape symbols")]
    EscapeMismatch,

    /// A buffer's length disagrees with the shape it is paired with.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Length implied by the shape.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Only gray (1) and RGB (3) grids reach the core.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    /// Record was produced in a different numeric domain.
    #[error("mode mismatch: expected {expected:?}, found {found:?}")]
    ModeMismatch {
        /// Domain the caller decodes into.
        expected: Mode,
        /// Domain recorded in the container.
        found: Mode,
    },

    /// Predictor parameters out of range.
    #[error("invalid predictor parameters: {0}")]
    InvalidParams(&'static str),

    /// Opening or creating a file failed.
    #[error("{}: {source}", path.display())]
    File {
        /// Offending path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred during encoding or decoding.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

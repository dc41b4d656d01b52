// error.rs - Error kinds reported by the automaton, the decoder and the driver

use thiserror::Error;

/// Errors raised synchronously at the offending call.
///
/// Nothing is constructed when one of these is returned: a failed decode
/// yields no `Pattern`, a failed constructor yields no `Grid`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConwayError {
    /// Header line is missing, or lacks the `x = ` / `, y = ` markers
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// Row or column count is unparsable, below 1, or the board exceeds `MAX_CELLS`
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Pattern shape disagrees with the requested grid shape
    #[error("dimension mismatch: pattern is {pattern_rows}x{pattern_cols}, grid is {rows}x{cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        pattern_rows: usize,
        pattern_cols: usize,
    },

    /// Stepping interval below 1ms
    #[error("invalid interval: {0}ms (must be at least 1ms)")]
    InvalidInterval(u64),
}

impl ConwayError {
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        Self::MalformedHeader(reason.into())
    }

    pub fn invalid_dimensions(reason: impl Into<String>) -> Self {
        Self::InvalidDimensions(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ConwayError>;

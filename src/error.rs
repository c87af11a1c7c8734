//! See [`DecodeError`].

use thiserror::Error;

/// Error types for decoding a detector grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Invalid grid configuration: {reason}")]
    Configuration { reason: String },

    #[error(
        "Tensor access ({x}, {y}, {channel}) is outside the grid bounds \
            ({rows}, {cols}, {channels})"
    )]
    IndexOutOfRange {
        x: usize,
        y: usize,
        channel: usize,
        rows: usize,
        cols: usize,
        channels: usize,
    },

    #[error("Non-finite {what} for box {b} in cell ({cx}, {cy})")]
    NumericDegenerate {
        cx: usize,
        cy: usize,
        b: usize,
        what: &'static str,
    },
}

impl DecodeError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration { reason: reason.into() }
    }
}

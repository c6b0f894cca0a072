//! Error types for screen buffer operations.

use thiserror::Error;

/// Errors surfaced by the direct [`ScreenBuffer`](crate::ScreenBuffer) API.
///
/// These indicate programmer errors against the buffer; the command
/// executor always clamps indices before touching the grid and never
/// produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("cell ({x}, {y}) is outside the {cols}x{rows} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        cols: usize,
        rows: usize,
    },

    #[error("row of length {got} does not match grid width {expected}")]
    LengthMismatch { got: usize, expected: usize },
}

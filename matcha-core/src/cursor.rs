//! Cursor state and styles for terminal emulation.
//!
//! The cursor is a pure value: position, visibility and visual style.
//! Clamping into a grid happens through the `clamped` helper; the screen
//! buffer applies it on every cursor store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorStyle {
    #[default]
    Block,
    Underline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Column, 0-indexed
    pub x: usize,
    /// Row, 0-indexed
    pub y: usize,
    pub visible: bool,
    pub style: CursorStyle,
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor {
            x: 0,
            y: 0,
            visible: true,
            style: CursorStyle::Block,
        }
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this cursor clamped into `[0, cols) x [0, rows)`.
    pub fn clamped(mut self, cols: usize, rows: usize) -> Self {
        self.x = self.x.min(cols.saturating_sub(1));
        self.y = self.y.min(rows.saturating_sub(1));
        self
    }
}

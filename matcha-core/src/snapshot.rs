//! Terminal snapshot for testing and debugging
//!
//! Snapshots capture the visible terminal state in a serializable format
//! for deterministic testing, golden files and headless inspection.

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::term::Term;

/// A snapshot of the visible terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    /// Row text, trailing spaces trimmed.
    pub lines: Vec<String>,
    pub cursor: CursorSnapshot,
    pub scroll_top: usize,
    pub scroll_bottom: usize,
    /// Window title, if one was set.
    pub title: Option<String>,
}

/// Snapshot of cursor state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub x: usize,
    pub y: usize,
    pub visible: bool,
    pub style: String,
}

impl From<Cursor> for CursorSnapshot {
    fn from(cursor: Cursor) -> Self {
        CursorSnapshot {
            x: cursor.x,
            y: cursor.y,
            visible: cursor.visible,
            style: format!("{:?}", cursor.style),
        }
    }
}

impl Snapshot {
    pub fn from_term(term: &Term) -> Self {
        let rows = term.rows();
        Snapshot {
            rows,
            cols: term.cols(),
            lines: (0..rows).map(|y| term.row_text(y)).collect(),
            cursor: CursorSnapshot::from(term.cursor()),
            scroll_top: term.scroll_top(),
            scroll_bottom: term.scroll_bottom(),
            title: if term.title().is_empty() {
                None
            } else {
                Some(term.title().to_string())
            },
        }
    }

    /// All rows joined by newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Text of a single row; empty for out-of-range rows.
    pub fn row_text(&self, y: usize) -> String {
        self.lines.get(y).cloned().unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

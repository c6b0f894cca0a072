//! Matcha Terminal Core
//!
//! This crate provides the platform-independent terminal emulator core:
//! - Screen buffer with primary and alternate grids
//! - Cell representation with character, colors and attributes
//! - Cursor state management
//! - Command executor applying the parser's output
//! - Color palettes and OSC palette overrides
//! - Serializable snapshots for deterministic testing
//!
//! This crate has NO GUI dependencies and can be used headlessly.

pub mod buffer;
pub mod cell;
pub mod color;
pub mod cursor;
pub mod error;
pub mod event;
pub mod row;
pub mod snapshot;
pub mod term;

pub use buffer::ScreenBuffer;
pub use cell::{Cell, StyleFlags};
pub use color::{Palette, Rgba};
pub use cursor::{Cursor, CursorStyle};
pub use error::BufferError;
pub use event::TermEvent;
pub use row::Row;
pub use snapshot::Snapshot;
pub use term::{Modes, Term};

pub const DEFAULT_ROWS: usize = 24;
pub const DEFAULT_COLS: usize = 80;

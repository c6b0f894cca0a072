//! Matcha Terminal Parser
//!
//! This crate implements a VT-compatible escape sequence parser.
//! It converts a stream of bytes into semantic terminal commands.
//!
//! The parser is:
//! - Stateful: maintains parsing state across chunk boundaries
//! - Streaming: can accept arbitrary chunk sizes
//! - Deterministic: same input always produces same output
//!
//! Supported sequences:
//! - C0 control characters (BEL, BS, HT, LF, CR, ESC, etc.)
//! - CSI sequences (cursor movement, erase, SGR, modes, etc.)
//! - OSC sequences (window title, palette, clipboard)
//! - DCS sequences (consumed and discarded)

pub mod command;
pub mod parser;

pub use command::{c0, Command};
pub use parser::Parser;

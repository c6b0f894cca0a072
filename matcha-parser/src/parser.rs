//! VT escape sequence parser.
//!
//! Implements a state machine that parses terminal escape sequences
//! in the style of the DEC VT500 series parser.
//!
//! The parser is designed to:
//! - Handle arbitrary chunk boundaries (streaming)
//! - Be deterministic
//! - Not crash on malformed input
//! - Support UTF-8 text
//!
//! References:
//! - ECMA-48: https://ecma-international.org/wp-content/uploads/ECMA-48_5th_edition_june_1991.pdf
//! - XTerm Control Sequences: https://invisible-island.net/xterm/ctlseqs/ctlseqs.pdf

use crate::command::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    OscString,
    DcsEntry,
    DcsParam,
    DcsPassthrough,
}

const MAX_PARAMS: usize = 32;
const MAX_INTERMEDIATES: usize = 4;
const MAX_OSC_PAYLOAD: usize = 65536;

/// Streaming escape-sequence parser.
///
/// Feed it bytes (or codepoints) in any chunking; sequences split across
/// chunks are carried in parser state until completed.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    params: Vec<u16>,
    current_param: Option<u16>,
    intermediates: String,
    osc_command: u16,
    osc_num: String,
    osc_data: String,
    osc_has_command: bool,
    utf8_buf: Vec<u8>,
    utf8_remaining: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            state: State::Ground,
            params: Vec::with_capacity(MAX_PARAMS),
            current_param: None,
            intermediates: String::new(),
            osc_command: 0,
            osc_num: String::new(),
            osc_data: String::new(),
            osc_has_command: false,
            utf8_buf: Vec::with_capacity(4),
            utf8_remaining: 0,
        }
    }

    /// Consume a chunk of raw bytes and return the commands it completes.
    ///
    /// Partial UTF-8 sequences at the end of the chunk are buffered and
    /// completed by the next call. Invalid UTF-8 becomes U+FFFD.
    pub fn feed(&mut self, input: &[u8]) -> Vec<Command> {
        let mut out = Vec::new();
        for &byte in input {
            if self.utf8_remaining > 0 {
                if byte & 0xC0 == 0x80 {
                    self.utf8_buf.push(byte);
                    self.utf8_remaining -= 1;
                    if self.utf8_remaining == 0 {
                        let decoded = std::str::from_utf8(&self.utf8_buf)
                            .ok()
                            .and_then(|s| s.chars().next())
                            .unwrap_or(char::REPLACEMENT_CHARACTER);
                        self.utf8_buf.clear();
                        self.advance(decoded, &mut out);
                    }
                    continue;
                }
                // aborted multibyte sequence
                self.utf8_buf.clear();
                self.utf8_remaining = 0;
                self.advance(char::REPLACEMENT_CHARACTER, &mut out);
            }

            if self.state == State::Ground && byte >= 0x80 {
                let remaining = match byte {
                    0xC2..=0xDF => 1,
                    0xE0..=0xEF => 2,
                    0xF0..=0xF4 => 3,
                    _ => 0,
                };
                if remaining > 0 {
                    self.utf8_buf.push(byte);
                    self.utf8_remaining = remaining;
                } else {
                    self.advance(char::REPLACEMENT_CHARACTER, &mut out);
                }
                continue;
            }

            self.advance(byte as char, &mut out);
        }
        out
    }

    /// Codepoint-level variant of [`feed`](Self::feed).
    pub fn feed_str(&mut self, input: &str) -> Vec<Command> {
        let mut out = Vec::new();
        for c in input.chars() {
            self.advance(c, &mut out);
        }
        out
    }

    /// Return to Ground and clear all accumulated state.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.clear_csi();
        self.clear_osc();
        self.utf8_buf.clear();
        self.utf8_remaining = 0;
    }

    fn advance(&mut self, c: char, out: &mut Vec<Command>) {
        match self.state {
            State::Ground => self.ground(c, out),
            State::Escape => self.escape(c),
            State::EscapeIntermediate => self.escape_intermediate(c),
            State::CsiEntry => self.csi_entry(c, out),
            State::CsiParam => self.csi_param(c, out),
            State::CsiIntermediate => self.csi_intermediate(c, out),
            State::OscString => self.osc_string(c, out),
            State::DcsEntry => self.dcs_entry(c),
            State::DcsParam => self.dcs_param(c),
            State::DcsPassthrough => self.dcs_passthrough(c),
        }
    }

    fn ground(&mut self, c: char, out: &mut Vec<Command>) {
        match c {
            '\x1b' => self.state = State::Escape,
            '\x00'..='\x1a' | '\x1c'..='\x1f' => out.push(Command::Control(c as u8)),
            '\x7f' => {}
            _ => out.push(Command::Print(c)),
        }
    }

    fn escape(&mut self, c: char) {
        match c {
            '[' => {
                self.clear_csi();
                self.state = State::CsiEntry;
            }
            ']' => {
                self.clear_osc();
                self.state = State::OscString;
            }
            'P' => self.state = State::DcsEntry,
            // ST terminator, consumed silently
            '\\' => self.state = State::Ground,
            // IND, RI, NEL recognized but not dispatched
            'D' | 'M' | 'E' => self.state = State::Ground,
            '\x20'..='\x2f' => self.state = State::EscapeIntermediate,
            _ => self.state = State::Ground,
        }
    }

    fn escape_intermediate(&mut self, c: char) {
        match c {
            '\x20'..='\x2f' => {}
            _ => self.state = State::Ground,
        }
    }

    fn csi_entry(&mut self, c: char, out: &mut Vec<Command>) {
        match c {
            '0'..='9' => {
                self.push_digit(c);
                self.state = State::CsiParam;
            }
            ';' => {
                self.push_param(0);
                self.state = State::CsiParam;
            }
            '<' | '=' | '>' | '?' => {
                self.collect(c);
                self.state = State::CsiParam;
            }
            '\x20'..='\x2f' => {
                self.collect(c);
                self.state = State::CsiIntermediate;
            }
            '@'..='~' => {
                if let Some(v) = self.current_param.take() {
                    self.push_param(v);
                }
                self.emit_csi(c, out);
            }
            _ => self.state = State::Ground,
        }
    }

    fn csi_param(&mut self, c: char, out: &mut Vec<Command>) {
        match c {
            '0'..='9' => self.push_digit(c),
            ';' => {
                let v = self.current_param.take().unwrap_or(0);
                self.push_param(v);
            }
            '<' | '=' | '>' | '?' => self.collect(c),
            '\x20'..='\x2f' => {
                let v = self.current_param.take().unwrap_or(0);
                self.push_param(v);
                self.collect(c);
                self.state = State::CsiIntermediate;
            }
            '@'..='~' => {
                let v = self.current_param.take().unwrap_or(0);
                self.push_param(v);
                self.emit_csi(c, out);
            }
            _ => self.state = State::Ground,
        }
    }

    fn csi_intermediate(&mut self, c: char, out: &mut Vec<Command>) {
        match c {
            '\x20'..='\x2f' => self.collect(c),
            '@'..='~' => self.emit_csi(c, out),
            _ => self.state = State::Ground,
        }
    }

    fn osc_string(&mut self, c: char, out: &mut Vec<Command>) {
        match c {
            '\x07' => {
                self.emit_osc(out);
                self.state = State::Ground;
            }
            '\x1b' => {
                self.emit_osc(out);
                self.state = State::Escape;
            }
            ';' if !self.osc_has_command => {
                self.osc_command = self.osc_num.parse().unwrap_or(0);
                self.osc_has_command = true;
            }
            _ => {
                if self.osc_has_command {
                    if self.osc_data.len() < MAX_OSC_PAYLOAD {
                        self.osc_data.push(c);
                    }
                } else if self.osc_num.len() < MAX_OSC_PAYLOAD {
                    self.osc_num.push(c);
                }
            }
        }
    }

    fn dcs_entry(&mut self, c: char) {
        match c {
            '\x07' => self.state = State::Ground,
            '\x1b' => self.state = State::Escape,
            '0'..='9' | ';' => self.state = State::DcsParam,
            '@'..='~' => self.state = State::DcsPassthrough,
            _ => {}
        }
    }

    fn dcs_param(&mut self, c: char) {
        match c {
            '\x07' => self.state = State::Ground,
            '\x1b' => self.state = State::Escape,
            '@'..='~' => self.state = State::DcsPassthrough,
            _ => {}
        }
    }

    fn dcs_passthrough(&mut self, c: char) {
        match c {
            '\x07' => self.state = State::Ground,
            '\x1b' => self.state = State::Escape,
            _ => {}
        }
    }

    fn push_digit(&mut self, c: char) {
        let digit = c as u16 - '0' as u16;
        let value = self.current_param.unwrap_or(0);
        self.current_param = Some(value.saturating_mul(10).saturating_add(digit));
    }

    fn push_param(&mut self, value: u16) {
        if self.params.len() < MAX_PARAMS {
            self.params.push(value);
        }
    }

    fn collect(&mut self, c: char) {
        if self.intermediates.len() < MAX_INTERMEDIATES {
            self.intermediates.push(c);
        }
    }

    fn emit_csi(&mut self, final_char: char, out: &mut Vec<Command>) {
        out.push(Command::Csi {
            final_byte: final_char as u8,
            params: std::mem::take(&mut self.params),
            intermediates: std::mem::take(&mut self.intermediates),
        });
        self.current_param = None;
        self.state = State::Ground;
    }

    fn emit_osc(&mut self, out: &mut Vec<Command>) {
        let command = if self.osc_has_command { self.osc_command } else { 0 };
        let data = if self.osc_has_command {
            std::mem::take(&mut self.osc_data)
        } else {
            std::mem::take(&mut self.osc_num)
        };
        out.push(Command::Osc { command, data });
        self.clear_osc();
    }

    fn clear_csi(&mut self) {
        self.params.clear();
        self.current_param = None;
        self.intermediates.clear();
    }

    fn clear_osc(&mut self) {
        self.osc_command = 0;
        self.osc_num.clear();
        self.osc_data.clear();
        self.osc_has_command = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Vec<Command> {
        let mut parser = Parser::new();
        parser.feed(input)
    }

    #[test]
    fn test_print_ascii() {
        let commands = parse_all(b"Hello");
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], Command::Print('H'));
        assert_eq!(commands[4], Command::Print('o'));
    }

    #[test]
    fn test_control_characters() {
        let commands = parse_all(b"\x07\x08\x09\x0A\x0D");
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], Command::Control(0x07));
        assert_eq!(commands[1], Command::Control(0x08));
        assert_eq!(commands[2], Command::Control(0x09));
        assert_eq!(commands[3], Command::Control(0x0A));
        assert_eq!(commands[4], Command::Control(0x0D));
    }

    #[test]
    fn test_del_dropped() {
        let commands = parse_all(b"A\x7fB");
        assert_eq!(
            commands,
            vec![Command::Print('A'), Command::Print('B')]
        );
    }

    #[test]
    fn test_csi_cursor_up() {
        let commands = parse_all(b"\x1b[5A");
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            Command::Csi { final_byte, params, intermediates } => {
                assert_eq!(*final_byte, b'A');
                assert_eq!(params, &vec![5]);
                assert!(intermediates.is_empty());
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_cursor_position() {
        let commands = parse_all(b"\x1b[10;20H");
        match &commands[0] {
            Command::Csi { final_byte, params, .. } => {
                assert_eq!(*final_byte, b'H');
                assert_eq!(params, &vec![10, 20]);
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_private_mode() {
        let commands = parse_all(b"\x1b[?25h");
        match &commands[0] {
            Command::Csi { final_byte, params, intermediates } => {
                assert_eq!(*final_byte, b'h');
                assert_eq!(intermediates, "?");
                assert_eq!(params, &vec![25]);
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_sgr() {
        let commands = parse_all(b"\x1b[1;31;42m");
        match &commands[0] {
            Command::Csi { final_byte, params, .. } => {
                assert_eq!(*final_byte, b'm');
                assert_eq!(params, &vec![1, 31, 42]);
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_empty_params() {
        let commands = parse_all(b"\x1b[;H");
        match &commands[0] {
            Command::Csi { final_byte, params, .. } => {
                assert_eq!(*final_byte, b'H');
                assert_eq!(params, &vec![0, 0]);
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_no_params() {
        let commands = parse_all(b"\x1b[m");
        match &commands[0] {
            Command::Csi { final_byte, params, .. } => {
                assert_eq!(*final_byte, b'm');
                assert!(params.is_empty());
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_intermediate_bytes() {
        // DECSCUSR-shaped sequence with a space intermediate
        let commands = parse_all(b"\x1b[4 q");
        match &commands[0] {
            Command::Csi { final_byte, params, intermediates } => {
                assert_eq!(*final_byte, b'q');
                assert_eq!(params, &vec![4]);
                assert_eq!(intermediates, " ");
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_osc_title_bel() {
        let commands = parse_all(b"\x1b]2;My Title\x07");
        assert_eq!(
            commands,
            vec![Command::Osc { command: 2, data: String::from("My Title") }]
        );
    }

    #[test]
    fn test_osc_with_st() {
        let commands = parse_all(b"\x1b]0;Window Title\x1b\\");
        assert_eq!(
            commands,
            vec![Command::Osc { command: 0, data: String::from("Window Title") }]
        );
    }

    #[test]
    fn test_osc_without_separator() {
        let commands = parse_all(b"\x1b]stray\x07");
        assert_eq!(
            commands,
            vec![Command::Osc { command: 0, data: String::from("stray") }]
        );
    }

    #[test]
    fn test_osc_empty_data() {
        let commands = parse_all(b"\x1b]2;\x07");
        assert_eq!(
            commands,
            vec![Command::Osc { command: 2, data: String::new() }]
        );
    }

    #[test]
    fn test_dcs_discarded() {
        let commands = parse_all(b"\x1bPq#0;1;2\x1b\\after");
        let printed: String = commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Print(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(printed, "after");
        assert!(!commands.iter().any(Command::is_csi));
    }

    #[test]
    fn test_esc_index_is_silent() {
        let commands = parse_all(b"\x1bDX");
        assert_eq!(commands, vec![Command::Print('X')]);
    }

    #[test]
    fn test_utf8_basic() {
        let commands = parse_all("Hello 世界".as_bytes());
        let chars: Vec<char> = commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Print(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(chars, vec!['H', 'e', 'l', 'l', 'o', ' ', '世', '界']);
    }

    #[test]
    fn test_utf8_split_across_feeds() {
        let bytes = "é".as_bytes();
        let mut parser = Parser::new();
        let first = parser.feed(&bytes[..1]);
        assert!(first.is_empty());
        let second = parser.feed(&bytes[1..]);
        assert_eq!(second, vec![Command::Print('é')]);
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let commands = parse_all(&[0xFF, b'A']);
        assert_eq!(
            commands,
            vec![Command::Print('\u{FFFD}'), Command::Print('A')]
        );
    }

    #[test]
    fn test_chunk_boundary() {
        let mut parser = Parser::new();
        let mut commands = Vec::new();

        commands.extend(parser.feed(b"\x1b["));
        assert!(commands.is_empty());

        commands.extend(parser.feed(b"5"));
        assert!(commands.is_empty());

        commands.extend(parser.feed(b"A"));
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            Command::Csi { final_byte, params, .. } => {
                assert_eq!(*final_byte, b'A');
                assert_eq!(params, &vec![5]);
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_control_aborts_csi() {
        let commands = parse_all(b"\x1b[3\x18Hello");
        let printed: String = commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Print(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(printed, "Hello");
        assert!(!commands.iter().any(Command::is_csi));
    }

    #[test]
    fn test_esc_inside_osc_starts_new_sequence() {
        // A stray ESC terminates the OSC; the '[' then opens a CSI.
        let commands = parse_all(b"\x1b]2;part\x1b[31m");
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            Command::Osc { command: 2, data: String::from("part") }
        );
        assert!(commands[1].is_csi());
    }

    #[test]
    fn test_param_overflow_saturates() {
        let commands = parse_all(b"\x1b[99999999999A");
        match &commands[0] {
            Command::Csi { params, .. } => assert_eq!(params, &vec![u16::MAX]),
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_reset_clears_pending_state() {
        let mut parser = Parser::new();
        parser.feed(b"\x1b[12;3");
        parser.reset();
        let commands = parser.feed(b"A");
        assert_eq!(commands, vec![Command::Print('A')]);
    }

    #[test]
    fn test_feed_matches_feed_str() {
        let input = "ab\x1b[31mc\x1b]2;t\x07d";
        let mut a = Parser::new();
        let mut b = Parser::new();
        assert_eq!(a.feed(input.as_bytes()), b.feed_str(input));
    }
}

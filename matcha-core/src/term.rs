//! Terminal controller
//!
//! `Term` is the main entry point of the engine. It owns the parser, a
//! primary and an alternate screen buffer, the active text style, the
//! scrolling region, mode flags, the title strings and palette overrides,
//! and applies the parser's command stream to the active buffer.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use matcha_parser::{c0, Command, Parser};

use crate::buffer::ScreenBuffer;
use crate::cell::{Cell, StyleFlags};
use crate::color::{parse_color_spec, Palette, Rgba};
use crate::cursor::Cursor;
use crate::event::TermEvent;
use crate::snapshot::Snapshot;

/// Terminal mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modes {
    /// Application cursor keys (DECCKM)
    pub cursor_keys: bool,
    /// Bracketed paste (DECSET 2004)
    pub bracketed_paste: bool,
    /// Insert/replace mode (IRM)
    pub insert: bool,
    /// Linefeed/newline mode (LNM): LF implies CR
    pub newline: bool,
}

/// The terminal state machine.
#[derive(Debug, Clone)]
pub struct Term {
    main: ScreenBuffer,
    alt: ScreenBuffer,
    using_alt: bool,
    parser: Parser,
    current_style: Cell,
    saved_cursor: Option<Cursor>,
    scroll_top: usize,
    scroll_bottom: usize,
    modes: Modes,
    title: String,
    icon_name: String,
    palette: Palette,
    events: Vec<TermEvent>,
}

impl Default for Term {
    fn default() -> Self {
        Term::new(crate::DEFAULT_ROWS, crate::DEFAULT_COLS)
    }
}

impl Term {
    /// Create a terminal with the given dimensions (clamped to >= 1x1).
    pub fn new(rows: usize, cols: usize) -> Self {
        let main = ScreenBuffer::new(rows, cols);
        let rows = main.rows();
        let cols = main.cols();
        Term {
            alt: ScreenBuffer::new(rows, cols),
            main,
            using_alt: false,
            parser: Parser::new(),
            current_style: Cell::default(),
            saved_cursor: None,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            modes: Modes::default(),
            title: String::new(),
            icon_name: String::new(),
            palette: Palette::new(),
            events: Vec::new(),
        }
    }

    /// Feed raw bytes through the parser and apply the resulting commands.
    pub fn write(&mut self, bytes: &[u8]) {
        let commands = self.parser.feed(bytes);
        for command in commands {
            self.apply(command);
        }
    }

    /// Codepoint-level variant of [`write`](Self::write).
    pub fn write_str(&mut self, input: &str) {
        let commands = self.parser.feed_str(input);
        for command in commands {
            self.apply(command);
        }
    }

    /// Apply one command to the terminal state.
    ///
    /// Public so tests and embedders can drive the executor with
    /// synthesized command streams, bypassing the parser.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Print(c) => self.print(c),
            Command::Control(byte) => self.execute(byte),
            Command::Csi {
                final_byte,
                params,
                intermediates,
            } => self.csi_dispatch(final_byte, &params, &intermediates),
            Command::Osc { command, data } => self.osc_dispatch(command, data),
        }
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// The active screen buffer.
    pub fn screen(&self) -> &ScreenBuffer {
        if self.using_alt {
            &self.alt
        } else {
            &self.main
        }
    }

    /// Mutable access to the active screen buffer, for embedders and test
    /// harnesses that stage grid content directly.
    pub fn screen_mut(&mut self) -> &mut ScreenBuffer {
        self.buffer_mut()
    }

    fn buffer_mut(&mut self) -> &mut ScreenBuffer {
        if self.using_alt {
            &mut self.alt
        } else {
            &mut self.main
        }
    }

    pub fn rows(&self) -> usize {
        self.screen().rows()
    }

    pub fn cols(&self) -> usize {
        self.screen().cols()
    }

    pub fn cursor(&self) -> Cursor {
        self.screen().cursor()
    }

    /// Cell at `(x, y)` of the active buffer, or `None` out of bounds.
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.screen().get(x, y).ok()
    }

    /// Full-grid stringification: rows joined by `\n`.
    pub fn contents(&self) -> String {
        self.screen().contents()
    }

    /// One row's text with trailing spaces trimmed.
    pub fn row_text(&self, y: usize) -> String {
        self.screen()
            .get_row(y)
            .map(|row| row.text().trim_end().to_string())
            .unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn is_using_alt(&self) -> bool {
        self.using_alt
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn scroll_bottom(&self) -> usize {
        self.scroll_bottom
    }

    /// The style template applied to printed characters.
    pub fn current_style(&self) -> Cell {
        self.current_style
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Drain queued outbound events (bell, clipboard requests).
    pub fn take_events(&mut self) -> Vec<TermEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_term(self)
    }

    // ------------------------------------------------------------------
    // Engine operations
    // ------------------------------------------------------------------

    /// Resize both buffers, re-clamp cursors, reset the scroll region
    /// bottom to the new last row (and the top when it falls outside).
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.main.resize(rows, cols);
        self.alt.resize(rows, cols);
        let main_cursor = self.main.cursor();
        self.main.set_cursor(main_cursor);
        let alt_cursor = self.alt.cursor();
        self.alt.set_cursor(alt_cursor);

        let rows = self.main.rows();
        self.scroll_bottom = rows - 1;
        if self.scroll_top >= rows {
            self.scroll_top = 0;
        }
    }

    /// Clear the active screen and home the cursor.
    pub fn clear(&mut self) {
        self.buffer_mut().clear();
        let cursor = self.screen().cursor();
        self.buffer_mut().set_cursor(Cursor {
            x: 0,
            y: 0,
            ..cursor
        });
    }

    /// Full reset: buffers, parser, style, modes, region, titles,
    /// palette overrides, saved cursor and queued events.
    pub fn reset(&mut self) {
        let rows = self.main.rows();
        let cols = self.main.cols();
        self.main = ScreenBuffer::new(rows, cols);
        self.alt = ScreenBuffer::new(rows, cols);
        self.using_alt = false;
        self.parser.reset();
        self.current_style = Cell::default();
        self.saved_cursor = None;
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.modes = Modes::default();
        self.title.clear();
        self.icon_name.clear();
        self.palette.reset();
        self.events.clear();
    }

    // ------------------------------------------------------------------
    // Control characters
    // ------------------------------------------------------------------

    fn execute(&mut self, byte: u8) {
        match byte {
            c0::BEL => self.events.push(TermEvent::Bell),
            c0::BS => {
                let mut cursor = self.screen().cursor();
                if cursor.x > 0 {
                    cursor.x -= 1;
                    self.buffer_mut().set_cursor(cursor);
                }
            }
            c0::HT => self.tab(),
            c0::LF => self.linefeed(),
            c0::CR => {
                let mut cursor = self.screen().cursor();
                cursor.x = 0;
                self.buffer_mut().set_cursor(cursor);
            }
            _ => trace!("ignored control 0x{:02X}", byte),
        }
    }

    fn linefeed(&mut self) {
        let mut cursor = self.screen().cursor();
        cursor.y += 1;
        if self.modes.newline {
            cursor.x = 0;
        }
        let cursor = self.scroll_if_below(cursor);
        self.buffer_mut().set_cursor(cursor);
    }

    fn tab(&mut self) {
        let mut cursor = self.screen().cursor();
        let next = (cursor.x / 8 + 1) * 8;
        if next >= self.cols() {
            cursor.x = 0;
            cursor.y += 1;
            cursor = self.scroll_if_below(cursor);
        } else {
            cursor.x = next;
        }
        self.buffer_mut().set_cursor(cursor);
    }

    /// Scroll the region when the cursor has crossed its bottom margin,
    /// clamping the cursor onto the margin.
    fn scroll_if_below(&mut self, mut cursor: Cursor) -> Cursor {
        if cursor.y > self.scroll_bottom {
            let (top, bottom) = (self.scroll_top, self.scroll_bottom);
            self.buffer_mut().scroll_region_up(top, bottom, 1);
            cursor.y = self.scroll_bottom;
        }
        cursor
    }

    // ------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------

    fn print(&mut self, ch: char) {
        let Cursor { x, y, .. } = self.screen().cursor();
        if self.modes.insert {
            self.buffer_mut().insert_cells(x, y, 1);
        }
        let cell = self.current_style.with_char(ch);
        self.buffer_mut().put(x, y, cell);

        let mut cursor = self.screen().cursor();
        cursor.x += 1;
        if cursor.x == self.cols() {
            cursor.x = 0;
            cursor.y += 1;
            cursor = self.scroll_if_below(cursor);
        }
        self.buffer_mut().set_cursor(cursor);
    }

    // ------------------------------------------------------------------
    // CSI dispatch
    // ------------------------------------------------------------------

    fn csi_dispatch(&mut self, final_byte: u8, params: &[u16], intermediates: &str) {
        if intermediates == "?" {
            match final_byte {
                b'h' => self.dec_private_modes(params, true),
                b'l' => self.dec_private_modes(params, false),
                _ => debug!(
                    "unhandled private CSI: params={:?} final={}",
                    params, final_byte as char
                ),
            }
            return;
        }
        if !intermediates.is_empty() {
            debug!(
                "unhandled CSI with intermediates {:?}: final={}",
                intermediates, final_byte as char
            );
            return;
        }

        match final_byte {
            // Cursor movement
            b'A' => self.cursor_up(one(params, 0)),
            b'B' => self.cursor_down(one(params, 0)),
            b'C' => {
                let mut cursor = self.screen().cursor();
                cursor.x = cursor.x.saturating_add(one(params, 0));
                self.buffer_mut().set_cursor(cursor);
            }
            b'D' => {
                let mut cursor = self.screen().cursor();
                cursor.x = cursor.x.saturating_sub(one(params, 0));
                self.buffer_mut().set_cursor(cursor);
            }
            b'E' => {
                // CNL: down then to column 0
                self.cursor_down(one(params, 0));
                let mut cursor = self.screen().cursor();
                cursor.x = 0;
                self.buffer_mut().set_cursor(cursor);
            }
            b'F' => {
                // CPL: up then to column 0
                self.cursor_up(one(params, 0));
                let mut cursor = self.screen().cursor();
                cursor.x = 0;
                self.buffer_mut().set_cursor(cursor);
            }
            b'G' => {
                let mut cursor = self.screen().cursor();
                cursor.x = one(params, 0) - 1;
                self.buffer_mut().set_cursor(cursor);
            }
            b'H' | b'f' => {
                let mut cursor = self.screen().cursor();
                cursor.y = one(params, 0) - 1;
                cursor.x = one(params, 1) - 1;
                self.buffer_mut().set_cursor(cursor);
            }
            b'd' => {
                let mut cursor = self.screen().cursor();
                cursor.y = one(params, 0) - 1;
                self.buffer_mut().set_cursor(cursor);
            }

            // Erase
            b'J' => match zero(params, 0) {
                0 => self.buffer_mut().clear_from_cursor(),
                1 => self.buffer_mut().clear_to_cursor(),
                2 | 3 => self.buffer_mut().clear(),
                _ => {}
            },
            b'K' => {
                let Cursor { x, y, .. } = self.screen().cursor();
                let cols = self.cols();
                match zero(params, 0) {
                    0 => self.buffer_mut().erase_cells(x, y, cols - x),
                    1 => self.buffer_mut().erase_cells(0, y, x + 1),
                    2 => self.buffer_mut().clear_row(y),
                    _ => {}
                }
            }
            b'X' => {
                let Cursor { x, y, .. } = self.screen().cursor();
                self.buffer_mut().erase_cells(x, y, one(params, 0));
            }

            // Insert/delete
            b'@' => {
                let Cursor { x, y, .. } = self.screen().cursor();
                self.buffer_mut().insert_cells(x, y, one(params, 0));
            }
            b'P' => {
                let Cursor { x, y, .. } = self.screen().cursor();
                self.buffer_mut().delete_cells(x, y, one(params, 0));
            }
            b'L' => {
                let y = self.screen().cursor().y;
                if y >= self.scroll_top && y <= self.scroll_bottom {
                    let bottom = self.scroll_bottom;
                    self.buffer_mut().insert_lines(y, bottom, one(params, 0));
                }
            }
            b'M' => {
                let y = self.screen().cursor().y;
                if y >= self.scroll_top && y <= self.scroll_bottom {
                    let bottom = self.scroll_bottom;
                    self.buffer_mut().delete_lines(y, bottom, one(params, 0));
                }
            }

            // Scroll
            b'S' => {
                let (top, bottom) = (self.scroll_top, self.scroll_bottom);
                self.buffer_mut()
                    .scroll_region_up(top, bottom, one(params, 0));
            }
            b'T' => {
                let (top, bottom) = (self.scroll_top, self.scroll_bottom);
                self.buffer_mut()
                    .scroll_region_down(top, bottom, one(params, 0));
            }
            b'r' => self.set_scroll_region(params),

            // Attributes and modes
            b'm' => self.sgr(params),
            b'h' => self.ansi_modes(params, true),
            b'l' => self.ansi_modes(params, false),

            // Cursor save/restore
            b's' => self.saved_cursor = Some(self.screen().cursor()),
            b'u' => {
                if let Some(saved) = self.saved_cursor {
                    self.buffer_mut().set_cursor(saved);
                }
            }

            _ => debug!(
                "unhandled CSI: params={:?} final={}",
                params, final_byte as char
            ),
        }
    }

    fn cursor_up(&mut self, n: usize) {
        let mut cursor = self.screen().cursor();
        cursor.y = cursor
            .y
            .saturating_sub(n)
            .clamp(self.scroll_top, self.scroll_bottom);
        self.buffer_mut().set_cursor(cursor);
    }

    fn cursor_down(&mut self, n: usize) {
        let mut cursor = self.screen().cursor();
        cursor.y = cursor
            .y
            .saturating_add(n)
            .clamp(self.scroll_top, self.scroll_bottom);
        self.buffer_mut().set_cursor(cursor);
    }

    fn set_scroll_region(&mut self, params: &[u16]) {
        let rows = self.rows();
        let top = (one(params, 0) - 1).min(rows - 1);
        let bottom_param = match params.get(1) {
            Some(0) | None => rows,
            Some(&v) => v as usize,
        };
        let bottom = bottom_param.saturating_sub(1).min(rows - 1);
        if top <= bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        }
    }

    // ------------------------------------------------------------------
    // SGR
    // ------------------------------------------------------------------

    fn sgr(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.current_style = Cell::default();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            let param = params[i];
            match param {
                0 => self.current_style = Cell::default(),
                1 => self.current_style.flags.insert(StyleFlags::BOLD),
                22 => self.current_style.flags.remove(StyleFlags::BOLD),
                3 => self.current_style.flags.insert(StyleFlags::ITALIC),
                23 => self.current_style.flags.remove(StyleFlags::ITALIC),
                4 => self.current_style.flags.insert(StyleFlags::UNDERLINE),
                24 => self.current_style.flags.remove(StyleFlags::UNDERLINE),

                30..=37 => {
                    self.current_style.fg = Some(self.palette.resolve((param - 30) as u8));
                }
                90..=97 => {
                    self.current_style.fg = Some(self.palette.resolve((param - 90 + 8) as u8));
                }
                39 => self.current_style.fg = None,
                40..=47 => {
                    self.current_style.bg = Some(self.palette.resolve((param - 40) as u8));
                }
                100..=107 => {
                    self.current_style.bg = Some(self.palette.resolve((param - 100 + 8) as u8));
                }
                49 => self.current_style.bg = None,

                38 | 48 => {
                    let (color, consumed) = self.extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        if param == 38 {
                            self.current_style.fg = Some(color);
                        } else {
                            self.current_style.bg = Some(color);
                        }
                    }
                    i += consumed;
                }

                _ => trace!("ignored SGR code {}", param),
            }
            i += 1;
        }
    }

    /// Parse the tail of an extended color introducer (38/48) and report
    /// how many parameters it consumed.
    fn extended_color(&self, rest: &[u16]) -> (Option<Rgba>, usize) {
        match rest.first().copied() {
            Some(5) => match rest.get(1) {
                Some(&index) => (Some(self.palette.resolve(index.min(255) as u8)), 2),
                None => (None, 1),
            },
            Some(2) => {
                if rest.len() >= 4 {
                    (Some(Rgba::from_rgb(rest[1], rest[2], rest[3])), 4)
                } else {
                    (None, rest.len())
                }
            }
            // unknown color-space byte: consume just it and continue
            Some(_) => (None, 1),
            None => (None, 0),
        }
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    fn ansi_modes(&mut self, params: &[u16], set: bool) {
        for &param in params {
            match param {
                4 => self.modes.insert = set,
                20 => self.modes.newline = set,
                _ => debug!("unhandled ANSI mode {} (set={})", param, set),
            }
        }
    }

    fn dec_private_modes(&mut self, params: &[u16], set: bool) {
        for &param in params {
            match param {
                1 => self.modes.cursor_keys = set,
                25 => {
                    let mut cursor = self.screen().cursor();
                    cursor.visible = set;
                    self.buffer_mut().set_cursor(cursor);
                }
                1049 => {
                    if set {
                        self.enter_alt_screen();
                    } else {
                        self.leave_alt_screen();
                    }
                }
                2004 => self.modes.bracketed_paste = set,
                _ => debug!("unhandled private mode {} (set={})", param, set),
            }
        }
    }

    fn enter_alt_screen(&mut self) {
        if !self.using_alt {
            self.alt = ScreenBuffer::new(self.main.rows(), self.main.cols());
            self.using_alt = true;
        }
    }

    fn leave_alt_screen(&mut self) {
        self.using_alt = false;
    }

    // ------------------------------------------------------------------
    // OSC dispatch
    // ------------------------------------------------------------------

    fn osc_dispatch(&mut self, command: u16, data: String) {
        match command {
            0 => {
                self.icon_name = data.clone();
                self.title = data;
            }
            1 => self.icon_name = data,
            2 => self.title = data,
            4 => self.osc_set_palette(&data),
            10 => {
                if let Some(color) = parse_color_spec(&data) {
                    self.palette.set_foreground(color);
                }
            }
            11 => {
                if let Some(color) = parse_color_spec(&data) {
                    self.palette.set_background(color);
                }
            }
            52 => {
                let mut parts = data.splitn(2, ';');
                let selector = parts.next().unwrap_or_default().to_string();
                let payload = parts.next().unwrap_or_default().to_string();
                self.events.push(TermEvent::ClipboardStore {
                    selector,
                    data: payload,
                });
            }
            _ => debug!("unhandled OSC {}: {}", command, data),
        }
    }

    /// OSC 4 payload: `idx;spec` pairs, any number of them.
    fn osc_set_palette(&mut self, data: &str) {
        let mut parts = data.split(';');
        while let (Some(index), Some(spec)) = (parts.next(), parts.next()) {
            let index = match index.parse::<usize>() {
                Ok(i) if i < 256 => i,
                _ => continue,
            };
            if let Some(color) = parse_color_spec(spec) {
                self.palette.set_indexed(index as u8, color);
            }
        }
    }
}

/// Parameter at `index` defaulting to 1; 0 also means 1.
fn one(params: &[u16], index: usize) -> usize {
    match params.get(index) {
        Some(0) | None => 1,
        Some(&v) => v as usize,
    }
}

/// Parameter at `index` defaulting to 0.
fn zero(params: &[u16], index: usize) -> u16 {
    params.get(index).copied().unwrap_or(0)
}

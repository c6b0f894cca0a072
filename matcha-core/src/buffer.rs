//! Screen buffer: the cell grid plus its cursor.
//!
//! The buffer is a pure data container. It owns every mutation primitive
//! the controller composes (scrolls, line and cell edits, cursor-relative
//! clears) but none of the policy: when to scroll, which margins apply and
//! how parameters default are controller decisions.
//!
//! Invariants held by every operation: the grid is exactly `rows` rows of
//! exactly `cols` cells, and the cursor stays inside `[0, cols) x [0, rows)`
//! (resize leaves cursor re-clamping to the controller).

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::cursor::Cursor;
use crate::error::BufferError;
use crate::row::Row;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBuffer {
    rows: usize,
    cols: usize,
    grid: Vec<Row>,
    cursor: Cursor,
}

impl ScreenBuffer {
    /// Create a buffer of empty cells. Dimensions are clamped to at
    /// least 1x1.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        ScreenBuffer {
            rows,
            cols,
            grid: (0..rows).map(|_| Row::new(cols)).collect(),
            cursor: Cursor::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Store the cursor, clamped into the grid.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor.clamped(self.cols, self.rows);
    }

    /// Offset the cursor, then clamp.
    pub fn move_cursor_relative(&mut self, dx: isize, dy: isize) {
        let x = self.cursor.x.saturating_add_signed(dx);
        let y = self.cursor.y.saturating_add_signed(dy);
        self.set_cursor(Cursor { x, y, ..self.cursor });
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<(), BufferError> {
        if x >= self.cols || y >= self.rows {
            return Err(BufferError::OutOfBounds {
                x,
                y,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub fn get(&self, x: usize, y: usize) -> Result<Cell, BufferError> {
        self.check_bounds(x, y)?;
        Ok(self.grid[y].cells()[x])
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), BufferError> {
        self.check_bounds(x, y)?;
        self.grid[y].set(x, cell);
        Ok(())
    }

    /// Infallible store used by the executor, which clamps first.
    pub(crate) fn put(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(row) = self.grid.get_mut(y) {
            row.set(x, cell);
        }
    }

    pub fn get_row(&self, y: usize) -> Result<&Row, BufferError> {
        self.check_bounds(0, y)?;
        Ok(&self.grid[y])
    }

    pub fn set_row(&mut self, y: usize, row: Row) -> Result<(), BufferError> {
        self.check_bounds(0, y)?;
        if row.len() != self.cols {
            return Err(BufferError::LengthMismatch {
                got: row.len(),
                expected: self.cols,
            });
        }
        self.grid[y] = row;
        Ok(())
    }

    pub fn clear(&mut self) {
        for row in &mut self.grid {
            row.clear();
        }
    }

    pub fn clear_row(&mut self, y: usize) {
        if let Some(row) = self.grid.get_mut(y) {
            row.clear();
        }
    }

    /// Empty cells from the cursor to end-of-line and all rows below.
    pub fn clear_from_cursor(&mut self) {
        let Cursor { x, y, .. } = self.cursor;
        self.grid[y].clear_range(x, self.cols);
        for row in y + 1..self.rows {
            self.grid[row].clear();
        }
    }

    /// Empty all rows above the cursor and cells from start-of-line to the
    /// cursor inclusive.
    pub fn clear_to_cursor(&mut self) {
        let Cursor { x, y, .. } = self.cursor;
        for row in 0..y {
            self.grid[row].clear();
        }
        self.grid[y].clear_range(0, x + 1);
    }

    /// Drop the top `n` rows and append `n` empty rows at the bottom.
    /// `n >= rows` clears everything; `n == 0` is a no-op.
    pub fn scroll_up(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if n >= self.rows {
            self.clear();
            return;
        }
        self.grid.drain(..n);
        for _ in 0..n {
            self.grid.push(Row::new(self.cols));
        }
    }

    /// Drop the bottom `n` rows and insert `n` empty rows at the top.
    pub fn scroll_down(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if n >= self.rows {
            self.clear();
            return;
        }
        self.grid.truncate(self.rows - n);
        for _ in 0..n {
            self.grid.insert(0, Row::new(self.cols));
        }
    }

    /// Scroll rows `[top, bottom]` up by `n`; blank rows appear at the
    /// bottom of the region. Rows outside the region are untouched.
    pub fn scroll_region_up(&mut self, top: usize, bottom: usize, n: usize) {
        if n == 0 || top > bottom || top >= self.rows {
            return;
        }
        let bottom = bottom.min(self.rows - 1);
        let n = n.min(bottom - top + 1);
        for i in top..(bottom + 1 - n) {
            self.grid.swap(i, i + n);
        }
        for i in (bottom + 1 - n)..=bottom {
            self.grid[i] = Row::new(self.cols);
        }
    }

    /// Scroll rows `[top, bottom]` down by `n`; blank rows appear at the
    /// top of the region.
    pub fn scroll_region_down(&mut self, top: usize, bottom: usize, n: usize) {
        if n == 0 || top > bottom || top >= self.rows {
            return;
        }
        let bottom = bottom.min(self.rows - 1);
        let n = n.min(bottom - top + 1);
        for i in ((top + n)..=bottom).rev() {
            self.grid.swap(i, i - n);
        }
        for i in top..(top + n) {
            self.grid[i] = Row::new(self.cols);
        }
    }

    /// Insert `n` blank rows at `y`, shifting rows down within
    /// `[y, bottom]`; rows shifted past `bottom` are lost.
    pub fn insert_lines(&mut self, y: usize, bottom: usize, n: usize) {
        self.scroll_region_down(y, bottom, n);
    }

    /// Delete `n` rows at `y`, shifting rows up within `[y, bottom]`;
    /// blank rows appear at `bottom`.
    pub fn delete_lines(&mut self, y: usize, bottom: usize, n: usize) {
        self.scroll_region_up(y, bottom, n);
    }

    /// Insert `n` blank cells at `(x, y)`, shifting the row tail right.
    pub fn insert_cells(&mut self, x: usize, y: usize, n: usize) {
        if let Some(row) = self.grid.get_mut(y) {
            row.insert_cells(x, n);
        }
    }

    /// Delete `n` cells at `(x, y)`, shifting the row tail left.
    pub fn delete_cells(&mut self, x: usize, y: usize, n: usize) {
        if let Some(row) = self.grid.get_mut(y) {
            row.delete_cells(x, n);
        }
    }

    /// Erase `n` cells starting at `(x, y)` without shifting.
    pub fn erase_cells(&mut self, x: usize, y: usize, n: usize) {
        if let Some(row) = self.grid.get_mut(y) {
            row.clear_range(x, x.saturating_add(n));
        }
    }

    /// Resize the grid, preserving content within the intersection of the
    /// old and new bounds. The cursor is intentionally left as-is; the
    /// controller re-clamps after resizing both of its buffers.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) {
        let new_rows = new_rows.max(1);
        let new_cols = new_cols.max(1);

        for row in &mut self.grid {
            row.resize(new_cols);
        }
        if new_rows > self.rows {
            for _ in self.rows..new_rows {
                self.grid.push(Row::new(new_cols));
            }
        } else {
            self.grid.truncate(new_rows);
        }

        self.rows = new_rows;
        self.cols = new_cols;
    }

    /// Full-grid stringification: rows joined by `\n`, each row the
    /// concatenation of its cell characters.
    pub fn contents(&self) -> String {
        self.grid
            .iter()
            .map(Row::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

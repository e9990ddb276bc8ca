//! Screen buffer management
//!
//! A `ScreenBuffer` is a virtual VGA text mode grid: cells, a cursor with its
//! pending pen (attributes and colors applied to the next write), one saved
//! cursor slot and the render settings the compositor consumes.
//!
//! The buffer grows downward instead of scrolling when `auto_expand` is set,
//! which is how most art gets decoded: a piece taller than the screen is kept
//! whole rather than losing its top rows.

use std::fmt;

use tracing::{debug, trace};

use super::cell::{Attr, Cell};
use super::color::{Palette, Rgb};
use super::cp437;
use crate::geometry::Rect;

/// Cursor position plus the pen applied to written cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub x: usize,
    pub y: usize,
    pub pen: Cell,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            pen: Cell::BLANK,
        }
    }
}

/// Virtual text mode screen.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
    cursor: CursorState,
    /// Saved (x, y); the pen is not part of the saved state.
    saved: (usize, usize),
    scroll_region: (usize, usize),
    scroll_region_active: bool,
    /// Grow the buffer instead of scrolling when a write runs off the bottom.
    pub auto_expand: bool,
    /// Palette that SGR color indices resolve against.
    pub palette: Palette,
    /// Render blinking cells with a bright background instead of hiding them.
    pub disable_blink: bool,
    /// Horizontal pixels between glyphs at render time.
    pub padding: usize,
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new(80, 25)
    }
}

impl ScreenBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            (0, 0)
        } else {
            (width, height)
        };
        Self {
            cells: vec![Cell::BLANK; width * height],
            width,
            height,
            cursor: CursorState::default(),
            saved: (0, 0),
            scroll_region: (0, 0),
            scroll_region_active: false,
            auto_expand: false,
            palette: Palette::default(),
            disable_blink: false,
            padding: 0,
        }
    }

    /// Empty buffer carrying the render settings of `self`.
    fn empty_like(&self, width: usize, height: usize) -> Self {
        let mut screen = Self::new(width, height);
        screen.auto_expand = self.auto_expand;
        screen.palette = self.palette.clone();
        screen.disable_blink = self.disable_blink;
        screen.padding = self.padding;
        screen
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        if y < self.height {
            Some(&self.cells[y * self.width..(y + 1) * self.width])
        } else {
            None
        }
    }

    /// Cursor position as (x, y).
    pub fn position(&self) -> (usize, usize) {
        (self.cursor.x, self.cursor.y)
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Attributes and colors the next write will use.
    pub fn pen(&self) -> Cell {
        self.cursor.pen
    }

    /// Active scroll region as 1-based (top, bottom) rows.
    pub fn scroll_region(&self) -> Option<(usize, usize)> {
        self.scroll_region_active.then_some(self.scroll_region)
    }

    fn cursor_offset(&self) -> usize {
        self.cursor.y * self.width + self.cursor.x
    }

    /// Resize the grid. The top-left intersection of the old and new extents
    /// is preserved; new cells are blank. The cursor is pulled back inside.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        if width == 0 || height == 0 {
            debug!("resize to empty extent {}x{}", width, height);
            self.cells.clear();
            self.width = 0;
            self.height = 0;
            self.cursor.x = 0;
            self.cursor.y = 0;
            return;
        }

        debug!("resize {}x{} -> {}x{}", self.width, self.height, width, height);
        let mut cells = vec![Cell::BLANK; width * height];
        let keep_w = width.min(self.width);
        for y in 0..height.min(self.height) {
            let src = y * self.width;
            let dst = y * width;
            cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }
        self.cells = cells;
        self.width = width;
        self.height = height;
        self.cursor.x = self.cursor.x.min(width - 1);
        self.cursor.y = self.cursor.y.min(height - 1);
    }

    /// New buffer holding the part of `rect` that lies inside this one.
    pub fn crop(&self, rect: Rect) -> ScreenBuffer {
        let visible = Rect::from_size(self.width as i32, self.height as i32).intersect(&rect);
        if visible.is_empty() {
            debug!("crop {} is outside of {}x{}", rect, self.width, self.height);
            return self.empty_like(0, 0);
        }
        debug!("crop {} -> {}", rect, visible);
        if visible.width() as usize == self.width {
            self.crop_contiguous(visible)
        } else {
            self.crop_by_rows(visible)
        }
    }

    /// Full-width crop: the rows are adjacent in memory, one copy suffices.
    fn crop_contiguous(&self, visible: Rect) -> ScreenBuffer {
        let (w, h) = (visible.width() as usize, visible.height() as usize);
        let mut cropped = self.empty_like(w, h);
        let start = visible.min.y as usize * self.width + visible.min.x as usize;
        cropped.cells.copy_from_slice(&self.cells[start..start + w * h]);
        cropped
    }

    fn crop_by_rows(&self, visible: Rect) -> ScreenBuffer {
        let (w, h) = (visible.width() as usize, visible.height() as usize);
        let mut cropped = self.empty_like(w, h);
        for (dy, y) in (visible.min.y as usize..visible.max.y as usize).enumerate() {
            let src = y * self.width + visible.min.x as usize;
            cropped.cells[dy * w..(dy + 1) * w].copy_from_slice(&self.cells[src..src + w]);
        }
        debug_assert_eq!(cropped.cells.len(), w * h);
        cropped
    }

    /// Drop the top row, shift everything up and blank the bottom row.
    pub fn scroll_up(&mut self) {
        if self.is_empty() {
            return;
        }
        debug!("scroll up");
        let w = self.width;
        self.cells.rotate_left(w);
        let len = self.cells.len();
        self.cells[len - w..].fill(Cell::BLANK);
        self.cursor.y = self.cursor.y.saturating_sub(1);
    }

    /// Drop the bottom row, shift everything down and blank the top row.
    pub fn scroll_down(&mut self) {
        if self.is_empty() {
            return;
        }
        debug!("scroll down");
        let w = self.width;
        self.cells.rotate_right(w);
        self.cells[..w].fill(Cell::BLANK);
        self.cursor.y = (self.cursor.y + 1).min(self.height - 1);
    }

    /// Append `rows` blank rows at the bottom.
    fn grow(&mut self, rows: usize) {
        debug!(
            "auto-expanding by {} rows to {}x{}",
            rows,
            self.width,
            self.height + rows
        );
        self.cells
            .resize(self.cells.len() + rows * self.width, Cell::BLANK);
        self.height += rows;
    }

    /// Set or disable the scroll region. The region is tracked only; scroll
    /// operations still act on the whole buffer.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        if (top == 1 && bottom >= self.height) || (top == 0 && bottom == 0) {
            self.scroll_region_active = false;
            return;
        }
        self.scroll_region = (top, bottom.min(self.height));
        self.scroll_region_active = true;
        trace!("scroll region {:?}", self.scroll_region);
    }

    /// Move the cursor to (x, y), clamped to the grid. With auto-expand the
    /// cursor may rest on the single row just past the bottom, which the next
    /// write adds.
    pub fn goto(&mut self, x: usize, y: usize) {
        let (ox, oy) = (self.cursor.x, self.cursor.y);
        self.cursor.x = x.min(self.width.saturating_sub(1));
        let last = self.height.saturating_sub(1);
        self.cursor.y = if self.auto_expand && y >= last {
            y.min(self.height)
        } else {
            y.min(last)
        };
        trace!(
            "goto({}, {}): ({}, {}) -> ({}, {})",
            x, y, ox, oy, self.cursor.x, self.cursor.y
        );
    }

    /// Move the cursor relative to its position; an axis with a zero delta is
    /// left untouched.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        fn step(pos: usize, delta: i32, len: usize) -> usize {
            let max = len.saturating_sub(1) as i64;
            (pos as i64 + i64::from(delta)).clamp(0, max) as usize
        }
        if dx != 0 {
            self.cursor.x = step(self.cursor.x, dx, self.width);
        }
        if dy != 0 {
            self.cursor.y = step(self.cursor.y, dy, self.height);
        }
    }

    pub fn save_cursor(&mut self) {
        self.saved = (self.cursor.x, self.cursor.y);
    }

    /// Restore the saved position, clamped like `goto` in case the buffer
    /// shrank since.
    pub fn load_cursor(&mut self) {
        let (x, y) = self.saved;
        self.goto(x, y);
    }

    pub fn set_attribute(&mut self, attr: Attr) {
        self.cursor.pen.insert_attribute(attr);
        trace!("attr to {}", self.cursor.pen.attributes());
    }

    pub fn clear_attribute(&mut self, attr: Attr) {
        self.cursor.pen.remove_attribute(attr);
        trace!("attr to {}", self.cursor.pen.attributes());
    }

    pub fn clear_attributes(&mut self) {
        self.cursor.pen.clear_attributes();
    }

    /// Reset attributes and both colors to the blank cell defaults.
    pub fn reset_attributes(&mut self) {
        self.cursor.pen = Cell::BLANK;
    }

    pub fn set_foreground_color(&mut self, color: Rgb) {
        trace!("fg to {}", color);
        self.cursor.pen.set_foreground(color);
    }

    pub fn set_background_color(&mut self, color: Rgb) {
        trace!("bg to {}", color);
        self.cursor.pen.set_background(color);
    }

    /// Write one code point with the current pen and advance the cursor,
    /// wrapping at the right edge.
    ///
    /// When the cursor sits past the end of the grid a single compensating
    /// step runs first: grow by one row (auto-expand) or scroll up one line.
    /// If the cursor still does not fit, the write is dropped.
    pub fn write_code_point(&mut self, code: u8) {
        if self.cursor_offset() >= self.cells.len() {
            if self.auto_expand && self.width > 0 {
                self.grow(1);
            } else {
                self.scroll_up();
            }
        }

        let offset = self.cursor_offset();
        let Some(cell) = self.cells.get_mut(offset) else {
            debug!(
                "dropping {:#04x} at ({}, {}) outside {}x{}",
                code, self.cursor.x, self.cursor.y, self.width, self.height
            );
            return;
        };
        *cell = self.cursor.pen.with_code_point(code);
        trace!(
            "text at ({}, {}) [{}]: {:#04x}",
            self.cursor.x, self.cursor.y, offset, code
        );

        self.cursor.x += 1;
        if self.cursor.x == self.width {
            self.cursor.x = 0;
            self.cursor.y += 1;
        }
    }

    /// Write a character, mapped to its CP437 code point (`?` if it has none).
    pub fn write_character(&mut self, ch: char) {
        self.write_code_point(cp437::from_char(ch).unwrap_or(b'?'));
    }

    pub fn write_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.write_character(ch);
        }
    }

    /// Write raw code points.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_code_point(b);
        }
    }

    /// Raw code points, every row terminated by `\n`.
    pub fn text_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width.max(1)) {
            out.extend(row.iter().map(|c| c.code_point()));
            out.push(b'\n');
        }
        out
    }
}

impl fmt::Display for ScreenBuffer {
    /// The grid as text, CP437 translated to Unicode.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cp437::decode(&self.text_bytes()))
    }
}

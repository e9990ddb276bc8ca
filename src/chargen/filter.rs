//! Mask filters
//!
//! Every filter wraps a shared inner mask and only carries its own geometry.
//! A filter never looks at pixels outside the character cell being queried,
//! and `sub_mask` clips the inner mask along with the filter's own bounds,
//! so clipping a filtered mask and filtering a clipped mask give the same
//! pixels.

use std::sync::Arc;

use super::mask::{GlyphMask, Mask};
use crate::geometry::{Point, Rect};

/// Appends one transparent column to every character, the way VGA blanks
/// the ninth column of 9-pixel text.
#[derive(Debug, Clone)]
pub struct AddColumn {
    inner: Arc<GlyphMask>,
    size: Point,
    bounds: Rect,
}

impl AddColumn {
    pub fn new(inner: Arc<GlyphMask>) -> Self {
        let src = inner.character_size();
        let b = inner.bounds();
        let wide = |x: i32| (x / src.x) * (src.x + 1) + x % src.x;
        let max_x = if b.max.x % src.x == 0 {
            (b.max.x / src.x) * (src.x + 1)
        } else {
            wide(b.max.x)
        };
        Self {
            size: Point::new(src.x + 1, src.y),
            bounds: Rect::new(wide(b.min.x), b.min.y, max_x, b.max.y),
            inner,
        }
    }
}

impl Mask for AddColumn {
    fn at(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let (c, lx) = (x / self.size.x, x % self.size.x);
        let w = self.size.x - 1;
        lx != w && self.inner.at(c * w + lx, y)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn character_size(&self) -> Point {
        self.size
    }

    fn character_count(&self) -> usize {
        self.inner.character_count()
    }

    fn sub_mask(&self, r: Rect) -> Option<GlyphMask> {
        let bounds = self.bounds.intersect(&r);
        if bounds.is_empty() {
            return None;
        }
        Some(GlyphMask::AddColumn(Self {
            bounds,
            ..self.clone()
        }))
    }
}

/// Slants every character to the right.
///
/// Output pixel `x` on row `y` samples source column
/// `x + (w >> 2) - (h >> 2) + (y % h) / (h >> 2)`, so each quarter of the
/// cell moves one pixel further left than the one above it. For an 8x16
/// glyph the top quarter moves right by two:
///
/// ```text
/// ###_____  ->  __###___   rows 0-3
/// _##_____  ->  __##____   rows 4-7
/// _##_##__  ->  _##_##__   rows 8-b
/// ###__##_  ->  ##__##__   rows c-f
/// ```
#[derive(Debug, Clone)]
pub struct Italics {
    inner: Arc<GlyphMask>,
    size: Point,
    bounds: Rect,
}

impl Italics {
    pub fn new(inner: Arc<GlyphMask>) -> Self {
        Self {
            size: inner.character_size(),
            bounds: inner.bounds(),
            inner,
        }
    }
}

impl Mask for Italics {
    fn at(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let Point { x: w, y: h } = self.size;
        let ox = (x / w) * w;
        let step_x = w >> 2;
        let step_y = (h >> 2).max(1);
        let fx = x + step_x - step_y + (y % h) / step_y;
        if fx < ox || fx >= ox + w {
            return false;
        }
        self.inner.at(fx, y)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn character_size(&self) -> Point {
        self.size
    }

    fn character_count(&self) -> usize {
        self.inner.character_count()
    }

    fn sub_mask(&self, r: Rect) -> Option<GlyphMask> {
        let bounds = self.bounds.intersect(&r);
        if bounds.is_empty() {
            return None;
        }
        let inner = self.inner.sub_mask(r)?;
        Some(GlyphMask::Italics(Self {
            inner: Arc::new(inner),
            size: self.size,
            bounds,
        }))
    }
}

/// Doubles the resolution and fills in half dots along diagonals.
///
/// A diagonal in the source
///
/// ```text
/// _#      __##
/// #_  ->  _###
///         ###_
///         ##__
/// ```
///
/// gains a half dot on either side of the step, while a solid corner stays
/// square.
#[derive(Debug, Clone)]
pub struct RoundCharacters {
    inner: Arc<GlyphMask>,
    size: Point,
    bounds: Rect,
}

impl RoundCharacters {
    pub fn new(inner: Arc<GlyphMask>) -> Self {
        let src = inner.character_size();
        Self {
            size: Point::new(src.x << 1, src.y << 1),
            bounds: inner.bounds().scale(2),
            inner,
        }
    }
}

impl Mask for RoundCharacters {
    fn at(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let (sx, sy) = (x >> 1, y >> 1);
        if self.inner.at(sx, sy) {
            return true;
        }

        let w = self.size.x >> 1;
        let ox = (sx / w) * w;
        let src = |px: i32, py: i32| px >= ox && px < ox + w && self.inner.at(px, py);

        // Even output pixels look at the west/north neighbour, odd ones at
        // the east/south neighbour.
        let hx = if x & 1 == 0 { -1 } else { 1 };
        let hy = if y & 1 == 0 { -1 } else { 1 };
        !src(sx + hx, sy + hy) && src(sx, sy + hy) && src(sx + hx, sy)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn character_size(&self) -> Point {
        self.size
    }

    fn character_count(&self) -> usize {
        self.inner.character_count()
    }

    fn sub_mask(&self, r: Rect) -> Option<GlyphMask> {
        let bounds = self.bounds.intersect(&r);
        if bounds.is_empty() {
            return None;
        }
        // Source pixels covering any part of `r`.
        let src = Rect::new(
            r.min.x >> 1,
            r.min.y >> 1,
            (r.max.x + 1) >> 1,
            (r.max.y + 1) >> 1,
        );
        let inner = self.inner.sub_mask(src)?;
        Some(GlyphMask::Rounded(Self {
            inner: Arc::new(inner),
            size: self.size,
            bounds,
        }))
    }
}

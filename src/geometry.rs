//! Integer geometry shared by the glyph masks, the screen buffer and the raster.
//!
//! Coordinates are signed so filters can probe neighbours left of / above a
//! glyph without special casing; a `Rect` is half-open (`min` inclusive,
//! `max` exclusive), the same convention the rest of the crate uses for
//! pixel and cell ranges.

use std::fmt;

/// A point in pixel or cell space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Half-open rectangle `[min.x, max.x) × [min.y, max.y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Rectangle from two corners; the corners are swapped if needed so that
    /// `min <= max` on both axes.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Rectangle at the origin with the given size.
    pub fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Size as a point (`x` = width, `y` = height).
    pub fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min.x && x < self.max.x && y >= self.min.y && y < self.max.y
    }

    /// The largest rectangle contained by both; empty rectangles collapse to
    /// the zero rectangle so they compare equal.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        };
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }

    /// Translate by `p`.
    pub fn offset(&self, p: Point) -> Rect {
        Rect {
            min: Point::new(self.min.x + p.x, self.min.y + p.y),
            max: Point::new(self.max.x + p.x, self.max.y + p.y),
        }
    }

    /// Multiply both corners by `factor`.
    pub fn scale(&self, factor: i32) -> Rect {
        Rect {
            min: Point::new(self.min.x * factor, self.min.y * factor),
            max: Point::new(self.max.x * factor, self.max.y * factor),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 2, 20, 8);
        assert_eq!(a.intersect(&b), Rect::new(5, 2, 10, 8));
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 8, 4);
        let i = a.intersect(&b);
        assert!(i.is_empty());
        assert_eq!(i, Rect::default());
    }

    #[test]
    fn test_new_normalizes_corners() {
        let r = Rect::new(10, 8, 2, 1);
        assert_eq!(r.min, Point::new(2, 1));
        assert_eq!(r.size(), Point::new(8, 7));
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::from_size(3, 2);
        assert!(r.contains(0, 0));
        assert!(r.contains(2, 1));
        assert!(!r.contains(3, 1));
        assert!(!r.contains(0, 2));
        assert!(!r.contains(-1, 0));
    }

    #[test]
    fn test_scale_and_offset() {
        let r = Rect::new(1, 2, 3, 4).scale(2).offset(Point::new(1, 0));
        assert_eq!(r, Rect::new(3, 4, 7, 8));
    }
}

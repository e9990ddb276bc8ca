//! Indexed raster images.

use std::io::{self, Write};

use crate::chargen::Mask;
use crate::core::term::{Palette, Rgb};
use crate::geometry::{Point, Rect};

/// Width × height image of palette indices, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedImage {
    width: usize,
    height: usize,
    palette: Palette,
    pix: Vec<u8>,
}

impl PalettedImage {
    /// Image filled with palette index 0.
    pub fn new(width: usize, height: usize, palette: Palette) -> Self {
        Self {
            width,
            height,
            palette,
            pix: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// All pixel indices, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pix
    }

    /// `rows` pixel rows starting at row `y`, clamped to the image.
    pub fn rows(&self, y: usize, rows: usize) -> &[u8] {
        let start = (y * self.width).min(self.pix.len());
        let end = ((y + rows) * self.width).min(self.pix.len());
        &self.pix[start..end]
    }

    pub fn index_at(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pix[y * self.width + x])
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<Rgb> {
        self.index_at(x, y)
            .and_then(|i| self.palette.get(usize::from(i)))
    }

    /// Paint `rect`, clipped to the image, with palette entry `index`.
    pub fn fill_rect(&mut self, rect: Rect, index: u8) {
        let r = rect.intersect(&self.bounds());
        for y in r.min.y..r.max.y {
            let row = y as usize * self.width;
            self.pix[row + r.min.x as usize..row + r.max.x as usize].fill(index);
        }
    }

    /// Paint the opaque pixels of `mask` with palette entry `index`. Mask
    /// pixel `src + (dx, dy)` lands on `dst.min + (dx, dy)` for every
    /// offset inside `dst`.
    pub fn draw_mask(&mut self, dst: Rect, mask: &dyn Mask, src: Point, index: u8) {
        let r = dst.intersect(&self.bounds());
        for y in r.min.y..r.max.y {
            let sy = src.y + (y - dst.min.y);
            let row = y as usize * self.width;
            for x in r.min.x..r.max.x {
                if mask.at(src.x + (x - dst.min.x), sy) {
                    self.pix[row + x as usize] = index;
                }
            }
        }
    }

    /// Write as a binary (P6) portable pixmap.
    pub fn write_ppm<W: Write>(&self, out: W) -> io::Result<()> {
        write_ppm(out, self.width, self.height, &self.pix, &self.palette)
    }
}

/// Write a window of palette indices as a binary (P6) portable pixmap.
pub(crate) fn write_ppm<W: Write>(
    mut out: W,
    width: usize,
    height: usize,
    pix: &[u8],
    palette: &Palette,
) -> io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    let mut line = Vec::with_capacity(width * 3);
    for row in pix.chunks(width.max(1)).take(height) {
        line.clear();
        for &i in row {
            let c = palette.get(usize::from(i)).unwrap_or_default();
            line.extend_from_slice(&[c.r, c.g, c.b]);
        }
        out.write_all(&line)?;
    }
    out.flush()
}

//! Glyph masks
//!
//! A mask is a bilevel image holding every glyph of a font side by side:
//! character `c` occupies columns `c * w .. (c + 1) * w` of a strip `h`
//! pixels tall. For a 4x6 font the word "Gopher" looks like
//!
//! ```text
//! _##_________#___________
//! #____#__##__#____##_#_#_
//! #_#_#_#_#_#_##__#_#_##__
//! #_#_#_#_#_#_#_#_##__#___
//! _##__#__##__#_#__##_#___
//! ________#_______________
//! ```
//!
//! and is stored one character after the other, each character row by row,
//! most significant bit first:
//!
//! ```text
//! G = 01101000 10101010 01100000
//! o = 00000100 10101010 01000000
//! ```
//!
//! Legacy ROMs pad every scan line to a wider `stride_x`; the extra bits are
//! never visible.

use std::sync::Arc;

use super::filter::{AddColumn, Italics, RoundCharacters};
use crate::geometry::{Point, Rect};

/// Read-only view of a bilevel glyph strip.
pub trait Mask {
    /// Whether the pixel at (x, y) is opaque. Anything outside `bounds` is
    /// transparent.
    fn at(&self, x: i32, y: i32) -> bool;

    /// Area in which `at` can return `true`.
    fn bounds(&self) -> Rect;

    /// Pixel size of one character cell.
    fn character_size(&self) -> Point;

    fn character_count(&self) -> usize;

    /// The part of this mask visible through `r`, sharing its pixels.
    /// `None` when nothing is visible.
    fn sub_mask(&self, r: Rect) -> Option<GlyphMask>;
}

/// Layout of a raw bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskOptions {
    /// Character cell size in pixels.
    pub size: Point,
    /// Bits per character scan line; defaults to the cell width.
    pub stride_x: Option<i32>,
}

impl MaskOptions {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: Point::new(width, height),
            stride_x: None,
        }
    }

    pub fn with_stride(mut self, stride_x: i32) -> Self {
        self.stride_x = Some(stride_x);
        self
    }

    fn stride(&self) -> i32 {
        match self.stride_x {
            Some(s) if s >= self.size.x => s,
            _ => self.size.x,
        }
    }
}

/// Bit-packed base atlas.
#[derive(Debug, Clone)]
pub struct BitmapMask {
    data: Arc<[u8]>,
    size: Point,
    stride_x: i32,
    characters: usize,
    bounds: Rect,
}

impl BitmapMask {
    /// Mask over raw ROM bits. Returns `None` for an empty cell size.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>, opts: MaskOptions) -> Option<Self> {
        if opts.size.x < 1 || opts.size.y < 1 {
            return None;
        }
        let data = data.into();
        let stride_x = opts.stride();
        let bits_per_char = stride_x as usize * opts.size.y as usize;
        let characters = data.len() * 8 / bits_per_char;
        Some(Self {
            data,
            size: opts.size,
            stride_x,
            characters,
            bounds: Rect::from_size(opts.size.x * characters as i32, opts.size.y),
        })
    }

    /// Mask from an 8-bit luminance image of `width` pixels per row, glyphs
    /// laid out side by side every `stride_x` pixels. Values of 0x80 and up
    /// are opaque.
    pub fn from_pixels(pixels: &[u8], width: usize, opts: MaskOptions) -> Option<Self> {
        if opts.size.x < 1 || opts.size.y < 1 || width == 0 {
            return None;
        }
        let (w, h) = (opts.size.x as usize, opts.size.y as usize);
        let src_stride = opts.stride() as usize;
        let characters = width / src_stride;
        let height = pixels.len() / width;
        let mut data = vec![0u8; (characters * w * h + 7) >> 3];
        let mut bit = 0usize;
        for c in 0..characters {
            for y in 0..h {
                for x in 0..w {
                    let lum = if y < height {
                        pixels[y * width + c * src_stride + x]
                    } else {
                        0
                    };
                    if lum >= 0x80 {
                        data[bit >> 3] |= 0x80 >> (bit & 7);
                    }
                    bit += 1;
                }
            }
        }
        Self::from_bytes(data, MaskOptions::new(opts.size.x, opts.size.y))
    }

    /// Raw backing bits.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bit test without the bounds check, for (x, y) inside the strip.
    fn bit(&self, x: i32, y: i32) -> bool {
        let c = (x / self.size.x) as usize;
        let lx = (x % self.size.x) as usize;
        let stride = self.stride_x as usize;
        let bit = c * stride * self.size.y as usize + y as usize * stride + lx;
        match self.data.get(bit >> 3) {
            Some(byte) => byte & (0x80 >> (bit & 7)) != 0,
            None => false,
        }
    }
}

impl Mask for BitmapMask {
    fn at(&self, x: i32, y: i32) -> bool {
        self.bounds.contains(x, y) && self.bit(x, y)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn character_size(&self) -> Point {
        self.size
    }

    fn character_count(&self) -> usize {
        self.characters
    }

    fn sub_mask(&self, r: Rect) -> Option<GlyphMask> {
        let bounds = self.bounds.intersect(&r);
        if bounds.is_empty() {
            return None;
        }
        Some(GlyphMask::Bitmap(Self {
            bounds,
            ..self.clone()
        }))
    }
}

/// A base atlas or a filter stacked on one.
///
/// Cloning is cheap: the bitmap bits and every wrapped mask are shared.
#[derive(Debug, Clone)]
pub enum GlyphMask {
    Bitmap(BitmapMask),
    AddColumn(AddColumn),
    Italics(Italics),
    Rounded(RoundCharacters),
}

impl GlyphMask {
    /// Append a transparent column to every character.
    pub fn add_column(self) -> GlyphMask {
        GlyphMask::AddColumn(AddColumn::new(Arc::new(self)))
    }

    /// Shear every character to the right.
    pub fn italics(self) -> GlyphMask {
        GlyphMask::Italics(Italics::new(Arc::new(self)))
    }

    /// Double the resolution, smoothing diagonals.
    pub fn rounded(self) -> GlyphMask {
        GlyphMask::Rounded(RoundCharacters::new(Arc::new(self)))
    }

    fn as_mask(&self) -> &dyn Mask {
        match self {
            GlyphMask::Bitmap(m) => m,
            GlyphMask::AddColumn(m) => m,
            GlyphMask::Italics(m) => m,
            GlyphMask::Rounded(m) => m,
        }
    }
}

impl From<BitmapMask> for GlyphMask {
    fn from(mask: BitmapMask) -> Self {
        GlyphMask::Bitmap(mask)
    }
}

impl Mask for GlyphMask {
    fn at(&self, x: i32, y: i32) -> bool {
        self.as_mask().at(x, y)
    }

    fn bounds(&self) -> Rect {
        self.as_mask().bounds()
    }

    fn character_size(&self) -> Point {
        self.as_mask().character_size()
    }

    fn character_count(&self) -> usize {
        self.as_mask().character_count()
    }

    fn sub_mask(&self, r: Rect) -> Option<GlyphMask> {
        self.as_mask().sub_mask(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chargen::render_ascii;
    use pretty_assertions::assert_eq;

    /// "Gopher" in a 4x6 font.
    fn gopher() -> BitmapMask {
        BitmapMask::from_bytes(
            vec![
                0x68, 0xaa, 0x60, 0x04, 0xaa, 0x40, 0x0c, 0xaa, 0xc8, 0x88, 0xca, 0xa0, 0x06,
                0xac, 0x60, 0x0a, 0xc8, 0x80,
            ],
            MaskOptions::new(4, 6),
        )
        .unwrap()
    }

    #[test]
    fn test_bit_addressing() {
        let mask = gopher();
        assert_eq!(mask.character_count(), 6);
        assert_eq!(mask.bounds(), Rect::from_size(24, 6));
        assert_eq!(
            render_ascii(&mask, mask.bounds()),
            "_##_________#___________\n\
             #____#__##__#____##_#_#_\n\
             #_#_#_#_#_#_##__#_#_##__\n\
             #_#_#_#_#_#_#_#_##__#___\n\
             _##__#__##__#_#__##_#___\n\
             ________#_______________\n"
        );
    }

    #[test]
    fn test_out_of_range_is_transparent() {
        let mask = gopher();
        assert!(!mask.at(-1, 1));
        assert!(!mask.at(0, -1));
        assert!(!mask.at(24, 1));
        assert!(!mask.at(0, 6));
        assert!(mask.at(0, 1));
    }

    #[test]
    fn test_empty_cell_size_yields_none() {
        assert!(BitmapMask::from_bytes(vec![0xff], MaskOptions::new(0, 8)).is_none());
        assert!(BitmapMask::from_bytes(vec![0xff], MaskOptions::new(8, -1)).is_none());
    }

    #[test]
    fn test_stride_padding() {
        // 3x2 glyphs padded to 4 bits per scan line: "#_#." "_#_."
        let mask =
            BitmapMask::from_bytes(vec![0xa4, 0x4a], MaskOptions::new(3, 2).with_stride(4))
                .unwrap();
        assert_eq!(mask.character_count(), 2);
        assert_eq!(render_ascii(&mask, mask.bounds()), "#_#_#_\n_#_#_#\n");
    }

    #[test]
    fn test_sub_mask_clips_but_keeps_coordinates() {
        let mask = gopher();
        let o = mask.sub_mask(Rect::new(4, 0, 8, 6)).unwrap();
        assert_eq!(o.bounds(), Rect::new(4, 0, 8, 6));
        assert!(!o.at(0, 1));
        assert!(o.at(5, 1));
        assert!(mask.sub_mask(Rect::new(30, 0, 40, 6)).is_none());
    }

    #[test]
    fn test_from_pixels_matches_from_bytes() {
        let mask = gopher();
        let bounds = mask.bounds();
        // Re-rasterize with a two pixel gap between glyphs.
        let stride = 6usize;
        let width = stride * 6;
        let mut pixels = vec![0u8; width * 6];
        for y in 0..6 {
            for x in 0..24 {
                if mask.at(x, y) {
                    let (c, lx) = (x as usize / 4, x as usize % 4);
                    pixels[y as usize * width + c * stride + lx] = 0xff;
                }
            }
        }
        let again =
            BitmapMask::from_pixels(&pixels, width, MaskOptions::new(4, 6).with_stride(6))
                .unwrap();
        assert_eq!(again.bounds(), bounds);
        assert_eq!(render_ascii(&again, bounds), render_ascii(&mask, bounds));
    }
}

//! Fonts
//!
//! A `Font` is a glyph mask plus per-code-point lookup.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::mask::{BitmapMask, GlyphMask, Mask, MaskOptions};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone)]
pub struct Font {
    mask: GlyphMask,
}

impl Font {
    pub fn new(mask: GlyphMask) -> Self {
        Self { mask }
    }

    /// Font over raw ROM bits; `None` for an empty cell size.
    pub fn from_bytes(data: impl Into<std::sync::Arc<[u8]>>, opts: MaskOptions) -> Option<Self> {
        BitmapMask::from_bytes(data, opts).map(|m| Self::new(m.into()))
    }

    /// Read a raw ROM image from disk.
    pub fn load(path: &Path, opts: MaskOptions) -> Result<Self> {
        let data = fs::read(path).map_err(|source| Error::ReadFont {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Self::from_bytes(data, opts).ok_or(Error::FontGeometry {
            width: opts.size.x.max(0) as usize,
            height: opts.size.y.max(0) as usize,
            stride: opts.stride_x.unwrap_or(opts.size.x).max(0) as usize,
        })?;
        debug!(
            "Loaded font {}: {} glyphs of {}x{}",
            path.display(),
            font.character_count(),
            font.size().x,
            font.size().y
        );
        Ok(font)
    }

    /// Glyph cell size in pixels.
    pub fn size(&self) -> Point {
        self.mask.character_size()
    }

    pub fn character_count(&self) -> usize {
        self.mask.character_count()
    }

    pub fn mask(&self) -> &GlyphMask {
        &self.mask
    }

    /// Cell of `code` inside the mask.
    pub fn glyph_rect(&self, code: u8) -> Rect {
        let size = self.size();
        let x = size.x * i32::from(code);
        Rect::new(x, 0, x + size.x, size.y)
    }

    /// Mask clipped to the glyph for `code`, in mask coordinates. `None`
    /// when the font has no such glyph.
    pub fn glyph(&self, code: u8) -> Option<GlyphMask> {
        if usize::from(code) >= self.character_count() {
            return None;
        }
        self.mask.sub_mask(self.glyph_rect(code))
    }

    /// Same font with every glyph slanted.
    pub fn italics(&self) -> Font {
        Font::new(self.mask.clone().italics())
    }

    /// Same font with a blank ninth column.
    pub fn with_added_column(&self) -> Font {
        Font::new(self.mask.clone().add_column())
    }

    /// Same font at double resolution with rounded diagonals.
    pub fn smoothed(&self) -> Font {
        Font::new(self.mask.clone().rounded())
    }
}

impl From<GlyphMask> for Font {
    fn from(mask: GlyphMask) -> Self {
        Self::new(mask)
    }
}

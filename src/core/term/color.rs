//! Colors and palettes
//!
//! Cells store literal 24-bit RGB values, independent of any palette. A
//! `Palette` is only consulted when an SGR sequence selects a color by index
//! and when the compositor builds the indexed output image.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 24-bit RGB triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` value; the top byte is ignored.
    pub const fn from_u32(v: u32) -> Self {
        Self {
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
        }
    }

    /// Packed `0xRRGGBB` value.
    pub const fn to_u32(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Squared euclidean distance in RGB space.
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("expected #rrggbb, got {:?}", s));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb::from_u32)
            .map_err(|e| format!("invalid color {:?}: {}", s, e))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// Color names for the first 16 colors.
pub const BLACK: Rgb = Rgb::from_u32(0x000000);
pub const RED: Rgb = Rgb::from_u32(0xaa0000);
pub const GREEN: Rgb = Rgb::from_u32(0x00aa00);
pub const YELLOW: Rgb = Rgb::from_u32(0xaa5500);
pub const BLUE: Rgb = Rgb::from_u32(0x0000aa);
pub const MAGENTA: Rgb = Rgb::from_u32(0xaa00aa);
pub const CYAN: Rgb = Rgb::from_u32(0x00aaaa);
pub const WHITE: Rgb = Rgb::from_u32(0xaaaaaa);
pub const BRIGHT_BLACK: Rgb = Rgb::from_u32(0x555555);
pub const BRIGHT_RED: Rgb = Rgb::from_u32(0xff5555);
pub const BRIGHT_GREEN: Rgb = Rgb::from_u32(0x55ff55);
pub const BRIGHT_YELLOW: Rgb = Rgb::from_u32(0xffff55);
pub const BRIGHT_BLUE: Rgb = Rgb::from_u32(0x5555ff);
pub const BRIGHT_MAGENTA: Rgb = Rgb::from_u32(0xff55ff);
pub const BRIGHT_CYAN: Rgb = Rgb::from_u32(0x55ffff);
pub const BRIGHT_WHITE: Rgb = Rgb::from_u32(0xffffff);

/// The CGA colors in attribute order; bright variants are 8 slots higher.
pub const CGA: [Rgb; 16] = [
    BLACK,
    RED,
    GREEN,
    YELLOW,
    BLUE,
    MAGENTA,
    CYAN,
    WHITE,
    BRIGHT_BLACK,
    BRIGHT_RED,
    BRIGHT_GREEN,
    BRIGHT_YELLOW,
    BRIGHT_BLUE,
    BRIGHT_MAGENTA,
    BRIGHT_CYAN,
    BRIGHT_WHITE,
];

/// Ordered, append-only color table. Indices of existing entries never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::vga()
    }
}

impl Palette {
    /// Largest palette an indexed image can address.
    pub const MAX_COLORS: usize = 256;

    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    /// The 16 CGA colors.
    pub fn cga() -> Self {
        Self::new(CGA.to_vec())
    }

    /// The 256-color VGA palette: CGA colors, a 6×6×6 color cube and a
    /// 24-step grey ramp.
    pub fn vga() -> Self {
        let mut colors = Vec::with_capacity(256);
        colors.extend_from_slice(&CGA);
        for r in 0..6u8 {
            for g in 0..6u8 {
                for b in 0..6u8 {
                    colors.push(Rgb::new(0x37 + r * 0x28, 0x37 + g * 0x28, 0x37 + b * 0x28));
                }
            }
        }
        for i in 0..24u8 {
            let v = 10 * i + 8;
            colors.push(Rgb::new(v, v, v));
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    /// Index of the first entry equal to `color`.
    pub fn index_of(&self, color: Rgb) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    /// Index of `color`, appending it if it is not present yet.
    pub fn get_or_insert(&mut self, color: Rgb) -> usize {
        match self.index_of(color) {
            Some(i) => i,
            None => {
                self.colors.push(color);
                self.colors.len() - 1
            }
        }
    }

    /// Index of the entry closest to `color`; `None` for an empty palette.
    pub fn nearest(&self, color: Rgb) -> Option<usize> {
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.distance_sq(color))
            .map(|(i, _)| i)
    }

    pub fn iter(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.colors.iter().copied()
    }

    pub fn as_slice(&self) -> &[Rgb] {
        &self.colors
    }
}

impl From<Vec<Rgb>> for Palette {
    fn from(colors: Vec<Rgb>) -> Self {
        Self::new(colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vga_palette_layout() {
        let palette = Palette::vga();
        assert_eq!(palette.len(), 256);
        assert_eq!(palette.index_of(BLACK), Some(0));
        assert_eq!(palette.index_of(BRIGHT_WHITE), Some(15));
        assert_eq!(palette.get(16), Some(Rgb::new(0x37, 0x37, 0x37)));
        assert_eq!(palette.get(231), Some(Rgb::new(0xff, 0xff, 0xff)));
        assert_eq!(palette.get(232), Some(Rgb::new(8, 8, 8)));
        assert_eq!(palette.get(255), Some(Rgb::new(238, 238, 238)));
    }

    #[test]
    fn test_get_or_insert_keeps_indices() {
        let mut palette = Palette::cga();
        assert_eq!(palette.get_or_insert(RED), 1);
        let orange = Rgb::new(0xff, 0x80, 0x00);
        assert_eq!(palette.get_or_insert(orange), 16);
        assert_eq!(palette.get_or_insert(orange), 16);
        assert_eq!(palette.index_of(RED), Some(1));
        assert_eq!(palette.len(), 17);
    }

    #[test]
    fn test_nearest() {
        let palette = Palette::cga();
        assert_eq!(palette.nearest(Rgb::new(0xa0, 0x05, 0x00)), Some(1));
        assert_eq!(Palette::new(Vec::new()).nearest(RED), None);
    }

    #[test]
    fn test_rgb_round_trip_through_text() {
        let c: Rgb = "#aa5500".parse().unwrap();
        assert_eq!(c, YELLOW);
        assert_eq!(c.to_string(), "#aa5500");
        assert_eq!(c.to_u32(), 0xaa5500);
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }
}

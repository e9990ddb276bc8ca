//! Screen cells
//!
//! Unlike 16-bit VGA text memory, a cell carries 24-bit colors and extended
//! attributes. It is packed into one `u64` so that whole grids copy, scroll
//! and compare cheaply:
//!
//! ```text
//!  63    56 55    48 47    40 39    32 31    24 23    16 15     8 7      0
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! |  back  |  back  |  back  |  fore  |  fore  |  fore  |  attr  |  code  |
//! |  red   |  green |  blue  |  red   |  green |  blue  |        |  point |
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! ```
//!
//! The attribute byte holds the `Attr` flags, lowest bit first.

use std::fmt;

use bitflags::bitflags;

use super::color::{Rgb, BLACK, WHITE};

bitflags! {
    /// Rendition attributes of a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u8 {
        const BOLD        = 0b0000_0001;
        const FAINT       = 0b0000_0010;
        /// Rendered with the sheared (italic) glyph set.
        const STANDOUT    = 0b0000_0100;
        const UNDERLINE   = 0b0000_1000;
        const BLINK       = 0b0001_0000;
        const CROSSED_OUT = 0b0010_0000;
        /// Foreground and background swapped at render time.
        const REVERSE     = 0b0100_0000;
        /// Foreground replaced by background at render time.
        const CONCEAL     = 0b1000_0000;
    }
}

const ATTR_NAMES: [(Attr, &str); 8] = [
    (Attr::BOLD, "bold"),
    (Attr::FAINT, "faint"),
    (Attr::STANDOUT, "standout"),
    (Attr::UNDERLINE, "underline"),
    (Attr::BLINK, "blink"),
    (Attr::CROSSED_OUT, "crossed-out"),
    (Attr::REVERSE, "reverse"),
    (Attr::CONCEAL, "conceal"),
];

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<none>");
        }
        let mut first = true;
        for (flag, name) in ATTR_NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

const CODE_MASK: u64 = 0x0000_0000_0000_00ff;
const ATTR_MASK: u64 = 0x0000_0000_0000_ff00;
const FG_MASK: u64 = 0x0000_00ff_ffff_0000;
const BG_MASK: u64 = 0xffff_ff00_0000_0000;

const ATTR_SHIFT: u32 = 8;
const FG_SHIFT: u32 = 16;
const BG_SHIFT: u32 = 40;

/// A single screen position: code point, attributes and two colors.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell(u64);

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl Cell {
    /// A space in light grey on black.
    pub const BLANK: Cell = Cell::new(b' ', WHITE, BLACK);

    pub const fn new(code: u8, fg: Rgb, bg: Rgb) -> Self {
        Cell(code as u64 | (fg.to_u32() as u64) << FG_SHIFT | (bg.to_u32() as u64) << BG_SHIFT)
    }

    /// Raw packed representation.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Reset to a space with the given colors and no attributes.
    pub fn reset(&mut self, fg: Rgb, bg: Rgb) {
        *self = Cell::new(b' ', fg, bg);
    }

    pub fn code_point(self) -> u8 {
        (self.0 & CODE_MASK) as u8
    }

    pub fn set_code_point(&mut self, code: u8) {
        self.0 = (self.0 & !CODE_MASK) | u64::from(code);
    }

    /// Copy of this cell with a different code point.
    pub fn with_code_point(mut self, code: u8) -> Self {
        self.set_code_point(code);
        self
    }

    pub fn foreground(self) -> Rgb {
        Rgb::from_u32(((self.0 & FG_MASK) >> FG_SHIFT) as u32)
    }

    pub fn set_foreground(&mut self, color: Rgb) {
        self.0 = (self.0 & !FG_MASK) | u64::from(color.to_u32()) << FG_SHIFT;
    }

    pub fn background(self) -> Rgb {
        Rgb::from_u32(((self.0 & BG_MASK) >> BG_SHIFT) as u32)
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.0 = (self.0 & !BG_MASK) | u64::from(color.to_u32()) << BG_SHIFT;
    }

    pub fn attributes(self) -> Attr {
        Attr::from_bits_truncate(((self.0 & ATTR_MASK) >> ATTR_SHIFT) as u8)
    }

    /// Replace all attributes.
    pub fn set_attributes(&mut self, attr: Attr) {
        self.0 = (self.0 & !ATTR_MASK) | u64::from(attr.bits()) << ATTR_SHIFT;
    }

    pub fn insert_attribute(&mut self, attr: Attr) {
        self.0 |= u64::from(attr.bits()) << ATTR_SHIFT;
    }

    pub fn remove_attribute(&mut self, attr: Attr) {
        self.0 &= !(u64::from(attr.bits()) << ATTR_SHIFT);
    }

    pub fn clear_attributes(&mut self) {
        self.0 &= !ATTR_MASK;
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell({:#04x} fg={} bg={} attr={})",
            self.code_point(),
            self.foreground(),
            self.background(),
            self.attributes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::color::{BRIGHT_WHITE, RED};

    #[test]
    fn test_blank_layout() {
        assert_eq!(Cell::BLANK.bits(), 0x0000_00aa_aaaa_0020);
        assert_eq!(Cell::BLANK.code_point(), 0x20);
        assert_eq!(Cell::BLANK.foreground(), WHITE);
        assert_eq!(Cell::BLANK.background(), BLACK);
        assert!(Cell::BLANK.attributes().is_empty());
    }

    #[test]
    fn test_attribute_display() {
        let mut a = Attr::empty();
        assert_eq!(a.to_string(), "<none>");
        a |= Attr::BOLD;
        assert_eq!(a.to_string(), "bold");
        a |= Attr::FAINT | Attr::STANDOUT;
        assert_eq!(a.to_string(), "bold,faint,standout");
        let b = Attr::UNDERLINE | Attr::BLINK | Attr::REVERSE | Attr::CONCEAL;
        assert_eq!(b.to_string(), "underline,blink,reverse,conceal");
    }

    #[test]
    fn test_cell_fields_are_independent() {
        let mut c = Cell::BLANK;
        c.set_foreground(BLACK);
        c.set_background(BRIGHT_WHITE);
        c.insert_attribute(Attr::BOLD);
        c.set_code_point(0x2a);
        assert_eq!(c.foreground(), BLACK);
        assert_eq!(c.background(), BRIGHT_WHITE);
        assert_eq!(c.attributes(), Attr::BOLD);
        assert_eq!(c.code_point(), 0x2a);

        c.set_attributes(Attr::REVERSE);
        assert_eq!(c.attributes(), Attr::REVERSE);
        c.insert_attribute(Attr::BOLD);
        c.remove_attribute(Attr::REVERSE);
        assert_eq!(c.attributes(), Attr::BOLD);
        assert_eq!(c.code_point(), 0x2a);
        assert_eq!(c.background(), BRIGHT_WHITE);
    }

    #[test]
    fn test_reset() {
        let mut c = Cell::new(b'x', RED, RED);
        c.insert_attribute(Attr::BLINK | Attr::UNDERLINE);
        c.reset(WHITE, BLACK);
        assert_eq!(c, Cell::BLANK);
    }

    #[test]
    fn test_clear_attributes_keeps_colors() {
        let mut c = Cell::new(b'x', RED, BLACK);
        c.insert_attribute(Attr::all());
        c.clear_attributes();
        assert!(c.attributes().is_empty());
        assert_eq!(c.foreground(), RED);
        assert_eq!(c.code_point(), b'x');
    }
}

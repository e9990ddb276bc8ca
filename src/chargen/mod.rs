//! Bitmapped monospaced "character generator" fonts.

pub mod catalog;
pub mod filter;
pub mod font;
pub mod mask;

pub use catalog::FontInfo;
pub use filter::{AddColumn, Italics, RoundCharacters};
pub use font::Font;
pub use mask::{BitmapMask, GlyphMask, Mask, MaskOptions};

use crate::geometry::Rect;

/// Draw `rect` of a mask as text, `#` for opaque and `_` for transparent
/// pixels, one line per row.
pub fn render_ascii(mask: &dyn Mask, rect: Rect) -> String {
    let mut out = String::with_capacity(((rect.width() + 1) * rect.height()).max(0) as usize);
    for y in rect.min.y..rect.max.y {
        for x in rect.min.x..rect.max.x {
            out.push(if mask.at(x, y) { '#' } else { '_' });
        }
        out.push('\n');
    }
    out
}

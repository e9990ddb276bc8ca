//! Known character generator ROMs.
//!
//! Maps the font names used in SAUCE records (and a few shorthands) to the
//! ROM file that holds the glyphs and its cell size. The ROM images
//! themselves are not bundled; they are looked up in a font directory.

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontInfo {
    /// Canonical name, as written in SAUCE records.
    pub name: &'static str,
    /// ROM file name inside the font directory.
    pub rom: &'static str,
    pub size: Point,
}

const fn font(name: &'static str, rom: &'static str, w: i32, h: i32) -> FontInfo {
    FontInfo {
        name,
        rom,
        size: Point::new(w, h),
    }
}

pub const FONTS: &[FontInfo] = &[
    font("Amiga MicroKnight", "amiga_microknight.bin", 8, 16),
    font("Amiga MicroKnight+", "amiga_microknight+.bin", 8, 16),
    font("Amiga mOsOul", "amiga_mosoul.bin", 8, 16),
    font("Amiga P0T-NOoDLE", "amiga_p0t-noodle.bin", 8, 16),
    font("Amiga Topaz 1", "amiga_topaz_1.bin", 8, 16),
    font("Amiga Topaz 1+", "amiga_topaz_1+.bin", 8, 16),
    font("Amiga Topaz 2", "amiga_topaz_2.bin", 8, 16),
    font("Amiga Topaz 2+", "amiga_topaz_2+.bin", 8, 16),
    font("Atari ATASCII", "atari_atascii.bin", 8, 8),
    font("IBM EGA", "ibm_ega43.bin", 8, 16),
    font("IBM EGA43", "ibm_ega43.bin", 8, 16),
    font("IBM VGA", "ibm_vga.bin", 8, 16),
    font("IBM VGA 437", "ibm_vga_437.bin", 8, 16),
    font("IBM VGA 737", "ibm_vga_737.bin", 8, 16),
    font("IBM VGA 775", "ibm_vga_775.bin", 8, 16),
    font("IBM VGA 850", "ibm_vga_850.bin", 8, 16),
    font("IBM VGA 852", "ibm_vga_852.bin", 8, 16),
    font("IBM VGA 855", "ibm_vga_855.bin", 8, 16),
    font("IBM VGA 857", "ibm_vga_857.bin", 8, 16),
    font("IBM VGA 860", "ibm_vga_860.bin", 8, 16),
    font("IBM VGA 861", "ibm_vga_861.bin", 8, 16),
    font("IBM VGA 862", "ibm_vga_862.bin", 8, 16),
    font("IBM VGA 863", "ibm_vga_863.bin", 8, 16),
    font("IBM VGA 865", "ibm_vga_865.bin", 8, 16),
    font("IBM VGA 866", "ibm_vga_866.bin", 8, 16),
    font("IBM VGA 866b", "ibm_vga_866b.bin", 8, 16),
    font("IBM VGA 866c", "ibm_vga_866c.bin", 8, 16),
    font("IBM VGA 866u", "ibm_vga_866u.bin", 8, 16),
    font("IBM VGA 869", "ibm_vga_869.bin", 8, 16),
    font("IBM VGA 1251", "ibm_vga_1251.bin", 8, 16),
    font("IBM VGA50", "ibm_vga50.bin", 8, 8),
    font("IBM VGA50 437", "ibm_vga50_437.bin", 8, 8),
    font("IBM VGA50 850", "ibm_vga50_850.bin", 8, 8),
    font("IBM VGA50 865", "ibm_vga50_865.bin", 8, 8),
    font("IBM VGA50 866", "ibm_vga50_866.bin", 8, 8),
    font("IBM VGA50 1251", "ibm_vga50_1251.bin", 8, 8),
];

/// Shorthand names accepted on the command line.
pub const ALIASES: &[(&str, &str)] = &[
    ("amiga", "Amiga Topaz 1"),
    ("topaz", "Amiga Topaz 1"),
    ("topaz1", "Amiga Topaz 1"),
    ("topaz1+", "Amiga Topaz 1+"),
    ("topaz2", "Amiga Topaz 2"),
    ("topaz2+", "Amiga Topaz 2+"),
    ("mosoul", "Amiga mOsOul"),
    ("microknight", "Amiga MicroKnight"),
    ("microknight+", "Amiga MicroKnight+"),
    ("potnoodle", "Amiga P0T-NOoDLE"),
    ("atari", "Atari ATASCII"),
    ("atascii", "Atari ATASCII"),
    ("8x8", "IBM VGA50"),
    ("8x16", "IBM VGA"),
    ("ega", "IBM EGA"),
    ("ega43", "IBM EGA43"),
    ("vga", "IBM VGA"),
    ("vga50", "IBM VGA50"),
    ("dos", "IBM VGA 437"),
    ("msdos", "IBM VGA 437"),
    ("cp437", "IBM VGA 437"),
    ("cp737", "IBM VGA 737"),
    ("cp775", "IBM VGA 775"),
    ("cp850", "IBM VGA 850"),
    ("cp852", "IBM VGA 852"),
    ("cp855", "IBM VGA 855"),
    ("cp857", "IBM VGA 857"),
    ("cp860", "IBM VGA 860"),
    ("cp861", "IBM VGA 861"),
    ("cp862", "IBM VGA 862"),
    ("cp863", "IBM VGA 863"),
    ("cp865", "IBM VGA 865"),
    ("cp866", "IBM VGA 866"),
    ("cp869", "IBM VGA 869"),
];

/// Font used when a record names none.
pub const DEFAULT_FONT: &str = "IBM VGA";

fn clean_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Find a font by canonical name or alias. Matching ignores case,
/// surrounding whitespace and the difference between spaces and
/// underscores; a blank name selects the default font.
pub fn lookup(name: &str) -> Option<&'static FontInfo> {
    let name = if name.trim().is_empty() {
        DEFAULT_FONT
    } else {
        name
    };
    let clean = clean_name(name);
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == clean)
        .map(|(_, target)| clean_name(target))
        .unwrap_or(clean);
    FONTS.iter().find(|f| clean_name(f.name) == canonical)
}

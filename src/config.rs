//! Configuration for decoding and rendering.
//!
//! This module provides:
//! - TOML configuration file loading (default `~/.textmode/config.toml`)
//! - Built-in base palettes (`vga`, `cga`) or an explicit color list
//! - Font selection by ROM file or by SAUCE font name
//! - Applying SAUCE record hints on top of a configuration
//!
//! # Configuration File
//!
//! ```toml
//! [screen]
//! width = 80
//! height = 25
//! auto_expand = true
//!
//! [font]
//! # Either a raw ROM image...
//! path = "fonts/ibm_vga.bin"
//! width = 8
//! height = 16
//! # ...or a known font looked up in `dir`.
//! name = "IBM VGA"
//! dir = "/usr/share/textmode/fonts"
//! letter_spacing = "9px"   # legacy, 8px or 9px
//! smooth = false
//!
//! [render]
//! disable_blink = false
//! padding = 0
//! delay = 40
//! viewport_rows = 25
//! palette_name = "vga"
//! # palette = ["#000000", "#aa0000", ...]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chargen::{catalog, Font, MaskOptions};
use crate::core::term::{Palette, Rgb, ScreenBuffer};
use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub screen: ScreenConfig,
    pub font: FontConfig,
    pub render: RenderConfig,
}

/// Virtual screen settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: usize,
    pub height: usize,
    /// Grow the buffer instead of scrolling at the bottom.
    pub auto_expand: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 25,
            auto_expand: true,
        }
    }
}

/// Horizontal glyph spacing, as recorded in SAUCE flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterSpacing {
    /// Not specified; rendered as 8 pixels.
    #[default]
    #[serde(rename = "legacy")]
    Legacy,
    #[serde(rename = "8px")]
    EightPixel,
    /// VGA style, with a blank ninth column.
    #[serde(rename = "9px")]
    NinePixel,
}

/// Font settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Raw ROM image; takes precedence over `name`.
    pub path: Option<PathBuf>,
    /// Known font name or alias, see [`catalog`].
    pub name: Option<String>,
    /// Directory holding the ROMs of known fonts.
    pub dir: Option<PathBuf>,
    /// Cell size of the ROM at `path`.
    pub width: usize,
    pub height: usize,
    /// Bits per scan line in the ROM at `path`, if wider than `width`.
    pub stride: Option<usize>,
    pub letter_spacing: LetterSpacing,
    /// Double the resolution with rounded diagonals.
    pub smooth: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            name: None,
            dir: None,
            width: 8,
            height: 16,
            stride: None,
            letter_spacing: LetterSpacing::Legacy,
            smooth: false,
        }
    }
}

impl FontConfig {
    /// Directory searched for known font ROMs.
    pub fn font_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .or_else(|| home_dir().map(|home| home.join(".textmode").join("fonts")))
            .unwrap_or_else(|| PathBuf::from("fonts"))
    }

    /// Load the configured font and apply the spacing and smoothing filters.
    pub fn load_font(&self) -> Result<Font> {
        let font = match &self.path {
            Some(path) => {
                let mut opts = MaskOptions::new(self.width as i32, self.height as i32);
                if let Some(stride) = self.stride {
                    opts = opts.with_stride(stride as i32);
                }
                if self.width == 0 || self.height == 0 || self.stride.is_some_and(|s| s == 0) {
                    return Err(Error::FontGeometry {
                        width: self.width,
                        height: self.height,
                        stride: self.stride.unwrap_or(self.width),
                    });
                }
                Font::load(path, opts)?
            }
            None => {
                let name = self.name.as_deref().unwrap_or_default();
                let info = catalog::lookup(name)
                    .ok_or_else(|| Error::UnknownFont(name.to_string()))?;
                let path = self.font_dir().join(info.rom);
                debug!("Font {:?} resolves to {}", info.name, path.display());
                Font::load(&path, MaskOptions::new(info.size.x, info.size.y))?
            }
        };

        let font = match self.letter_spacing {
            LetterSpacing::NinePixel => font.with_added_column(),
            LetterSpacing::Legacy | LetterSpacing::EightPixel => font,
        };
        Ok(if self.smooth { font.smoothed() } else { font })
    }
}

/// Raster output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Draw blinking cells with a bright background instead of hiding them.
    pub disable_blink: bool,
    /// Extra pixels between glyphs.
    pub padding: usize,
    /// Animation frame delay in hundredths of a second.
    pub delay: u16,
    /// Text rows visible in a scroller frame.
    pub viewport_rows: usize,
    /// Built-in base palette: "vga" or "cga".
    pub palette_name: String,
    /// Explicit base palette; overrides `palette_name`.
    pub palette: Option<Vec<Rgb>>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            disable_blink: false,
            padding: 0,
            delay: 40,
            viewport_rows: 25,
            palette_name: "vga".to_string(),
            palette: None,
        }
    }
}

impl RenderConfig {
    /// The base palette SGR indices resolve against.
    pub fn palette(&self) -> Palette {
        match &self.palette {
            Some(colors) if !colors.is_empty() => Palette::new(colors.clone()),
            _ => palette_by_name(&self.palette_name),
        }
    }
}

/// Built-in palette by name; unknown names select VGA.
pub fn palette_by_name(name: &str) -> Palette {
    match name.to_lowercase().as_str() {
        "cga" | "ega" | "16" => Palette::cga(),
        _ => Palette::vga(),
    }
}

/// Names accepted by [`palette_by_name`].
pub fn palette_names() -> Vec<&'static str> {
    vec!["vga", "cga"]
}

impl Config {
    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `~/.textmode/config.toml` if it exists, defaults otherwise.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".textmode").join("config.toml"))
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Empty screen buffer with these settings.
    pub fn screen_buffer(&self) -> ScreenBuffer {
        let mut screen = ScreenBuffer::new(self.screen.width, self.screen.height);
        screen.auto_expand = self.screen.auto_expand;
        screen.palette = self.render.palette();
        screen.disable_blink = self.render.disable_blink;
        screen.padding = self.render.padding;
        screen
    }
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

/// Aspect ratio hint from a SAUCE record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Legacy,
    /// Meant to be stretched to the display aspect ratio.
    Stretch,
    /// Square pixels.
    Square,
}

/// Rendering hints read from a SAUCE record by an external parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SauceHints {
    pub font_name: Option<String>,
    /// iCE colors: blink bit selects bright backgrounds.
    pub non_blink: bool,
    pub letter_spacing: LetterSpacing,
    pub aspect_ratio: AspectRatio,
    /// Character width of the piece, 0 if unknown.
    pub columns: u16,
    /// Number of lines, 0 if unknown.
    pub rows: u16,
}

impl SauceHints {
    /// Override `config` with whatever this record specifies.
    pub fn apply(&self, config: &mut Config) {
        if self.non_blink {
            config.render.disable_blink = true;
        }
        if self.letter_spacing != LetterSpacing::Legacy {
            config.font.letter_spacing = self.letter_spacing;
        }
        if let Some(name) = self.font_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                config.font.name = Some(name.to_string());
            }
        }
        if self.columns > 0 {
            config.screen.width = usize::from(self.columns);
        }
        if self.rows > 0 {
            config.screen.height = usize::from(self.rows);
        }
        debug!(
            "SAUCE hints applied: {:?}, aspect ratio {:?}",
            self.font_name, self.aspect_ratio
        );
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chargen::Mask;
    use crate::core::term::color::RED;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.screen.width, 80);
        assert_eq!(config.screen.height, 25);
        assert!(config.screen.auto_expand);
        assert_eq!(config.font.width, 8);
        assert_eq!(config.font.height, 16);
        assert_eq!(config.font.letter_spacing, LetterSpacing::Legacy);
        assert_eq!(config.render.delay, 40);
        assert_eq!(config.render.viewport_rows, 25);
        assert_eq!(config.render.palette().len(), 256);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = "[screen]\nwidth = 132\n\n[font]\nletter_spacing = \"9px\"\n"
            .parse()
            .unwrap();
        assert_eq!(config.screen.width, 132);
        assert_eq!(config.screen.height, 25);
        assert_eq!(config.font.letter_spacing, LetterSpacing::NinePixel);
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_palette_from_file() {
        let config: Config = "[render]\npalette = [\"#000000\", \"#aa0000\"]\n"
            .parse()
            .unwrap();
        let palette = config.render.palette();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(1), Some(RED));

        let config: Config = "[render]\npalette_name = \"CGA\"\n".parse().unwrap();
        assert_eq!(config.render.palette().len(), 16);
    }

    #[test]
    fn test_invalid_toml() {
        assert!("[screen]\nwidth = \"wide\"\n".parse::<Config>().is_err());
        assert!("[render]\npalette = [\"#12\"]\n".parse::<Config>().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/textmode.toml")).unwrap_err();
        assert!(matches!(err, Error::ReadConfig { .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.font.name = Some("IBM VGA50".to_string());
        config.render.palette = Some(vec![RED]);
        let text = config.to_toml().unwrap();
        assert_eq!(text.parse::<Config>().unwrap(), config);
    }

    #[test]
    fn test_screen_buffer_carries_settings() {
        let mut config = Config::default();
        config.screen.width = 40;
        config.screen.height = 10;
        config.render.disable_blink = true;
        config.render.padding = 1;
        config.render.palette_name = "cga".to_string();
        let screen = config.screen_buffer();
        assert_eq!((screen.width(), screen.height()), (40, 10));
        assert!(screen.auto_expand);
        assert!(screen.disable_blink);
        assert_eq!(screen.padding, 1);
        assert_eq!(screen.palette.len(), 16);
    }

    #[test]
    fn test_sauce_hints() {
        let mut config = Config::default();
        let hints = SauceHints {
            font_name: Some("IBM VGA50".to_string()),
            non_blink: true,
            letter_spacing: LetterSpacing::NinePixel,
            columns: 160,
            ..SauceHints::default()
        };
        hints.apply(&mut config);
        assert!(config.render.disable_blink);
        assert_eq!(config.font.letter_spacing, LetterSpacing::NinePixel);
        assert_eq!(config.font.name.as_deref(), Some("IBM VGA50"));
        assert_eq!(config.screen.width, 160);
        assert_eq!(config.screen.height, 25);
    }

    #[test]
    fn test_empty_hints_change_nothing() {
        let mut config = Config::default();
        SauceHints::default().apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_font_name() {
        let font = FontConfig {
            name: Some("Nonexistent 3000".to_string()),
            ..FontConfig::default()
        };
        let err = font.load_font().unwrap_err();
        assert!(matches!(err, Error::UnknownFont(name) if name == "Nonexistent 3000"));
    }

    #[test]
    fn test_load_font_applies_filters() {
        let dir = std::env::temp_dir().join(format!("textmode-font-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("ibm_vga50.bin"), vec![0xffu8; 8 * 256]).unwrap();

        let mut font = FontConfig {
            name: Some("vga50".to_string()),
            dir: Some(dir.clone()),
            letter_spacing: LetterSpacing::NinePixel,
            ..FontConfig::default()
        };
        let loaded = font.load_font().unwrap();
        assert_eq!(loaded.size().x, 9);
        assert_eq!(loaded.size().y, 8);
        assert_eq!(loaded.character_count(), 256);

        font.smooth = true;
        let loaded = font.load_font().unwrap();
        assert_eq!(loaded.size().x, 18);
        assert_eq!(loaded.mask().character_size().y, 16);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_zero_font_geometry() {
        let font = FontConfig {
            path: Some(PathBuf::from("whatever.bin")),
            width: 0,
            ..FontConfig::default()
        };
        assert!(matches!(
            font.load_font().unwrap_err(),
            Error::FontGeometry { width: 0, .. }
        ));
    }
}

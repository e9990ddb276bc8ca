//! textmode - render ANSI art to raster images
//!
//! Decoding and rendering are separate steps:
//!
//! ```text
//! bytes ──VtParser──▶ ScreenBuffer ──Compositor(Font)──▶ PalettedImage / Animation
//! ```
//!
//! ```no_run
//! use textmode::{render::BlinkPhase, Compositor, Config};
//!
//! # fn main() -> textmode::Result<()> {
//! let config = Config::default();
//! let file = std::fs::File::open("art.ans")?;
//! let screen = textmode::decode(file, &config)?;
//! let mut compositor = Compositor::new(config.font.load_font()?);
//! let image = compositor.render(&screen, BlinkPhase::On);
//! image.write_ppm(std::fs::File::create("art.ppm")?)?;
//! # Ok(())
//! # }
//! ```

pub mod chargen;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod render;

use std::io::Read;
use std::rc::Rc;

pub use crate::chargen::Font;
pub use crate::config::{Config, SauceHints};
pub use crate::core::term::{ScreenBuffer, VtParser};
pub use crate::diagnostics::{Diagnostic, DiagnosticSink};
pub use crate::error::{Error, Result};
pub use crate::render::Compositor;

/// Decode an ANSI stream into a screen buffer set up from `config`.
pub fn decode<R: Read>(reader: R, config: &Config) -> Result<ScreenBuffer> {
    let mut screen = config.screen_buffer();
    VtParser::new().decode(reader, &mut screen)?;
    Ok(screen)
}

/// Like [`decode`], reporting skipped sequences to `diagnostics`.
pub fn decode_with_diagnostics<R: Read>(
    reader: R,
    config: &Config,
    diagnostics: Rc<dyn DiagnosticSink>,
) -> Result<ScreenBuffer> {
    let mut screen = config.screen_buffer();
    VtParser::with_diagnostics(diagnostics).decode(reader, &mut screen)?;
    Ok(screen)
}

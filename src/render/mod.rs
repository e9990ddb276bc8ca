//! Rasterizing screen buffers.
//!
//! The [`Compositor`] turns a [`ScreenBuffer`](crate::core::term::ScreenBuffer)
//! into a [`PalettedImage`], or into an [`Animation`] of blink phases and
//! scroll positions. Container encoding (GIF, PNG) is left to the caller;
//! [`PalettedImage::write_ppm`] covers quick inspection.

pub mod animation;
pub mod compositor;
pub mod image;

pub use animation::{Animation, BlinkPhase, Frame};
pub use compositor::Compositor;
pub use image::PalettedImage;

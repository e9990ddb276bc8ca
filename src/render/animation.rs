//! Multi-frame output.
//!
//! Frames never own pixels: each one is a window of rows into one of the
//! pre-rendered blink phase images held by the `Animation`.

use std::io::{self, Write};

use super::image::{self, PalettedImage};
use crate::core::term::Palette;

/// Which of the two pre-rendered images is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlinkPhase {
    /// Blinking glyphs hidden.
    Off,
    /// Blinking glyphs drawn.
    On,
}

impl BlinkPhase {
    fn index(self) -> usize {
        match self {
            BlinkPhase::Off => 0,
            BlinkPhase::On => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub phase: BlinkPhase,
    /// First pixel row of the window.
    pub offset: usize,
    /// Display time in hundredths of a second.
    pub delay: u16,
}

impl Frame {
    /// Pixel indices of this frame, borrowed from the animation.
    pub fn pixels<'a>(&self, animation: &'a Animation) -> &'a [u8] {
        animation
            .image(self.phase)
            .rows(self.offset, animation.height)
    }

    pub fn delay(&self) -> u16 {
        self.delay
    }
}

#[derive(Debug, Clone)]
pub struct Animation {
    images: [PalettedImage; 2],
    width: usize,
    height: usize,
    frames: Vec<Frame>,
}

impl Animation {
    /// Empty animation over the two phase images with a `height` pixel tall
    /// viewport.
    pub(crate) fn new(off: PalettedImage, on: PalettedImage, height: usize) -> Self {
        Self {
            width: off.width(),
            height: height.min(off.height()),
            images: [off, on],
            frames: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Palette shared by every frame.
    pub fn palette(&self) -> &Palette {
        self.images[0].palette()
    }

    pub fn image(&self, phase: BlinkPhase) -> &PalettedImage {
        &self.images[phase.index()]
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Sum of all frame delays, in hundredths of a second.
    pub fn duration(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.delay)).sum()
    }

    /// Write one frame as a binary portable pixmap.
    pub fn write_frame_ppm<W: Write>(&self, frame: &Frame, out: W) -> io::Result<()> {
        image::write_ppm(
            out,
            self.width,
            self.height,
            frame.pixels(self),
            self.palette(),
        )
    }
}

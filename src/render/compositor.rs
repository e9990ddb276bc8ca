//! Screen buffer to raster compositor
//!
//! Renders a `ScreenBuffer` through a `Font` into an indexed image, and
//! builds blink and scroll animations from the two blink phase renders.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use super::animation::{Animation, BlinkPhase, Frame};
use super::image::PalettedImage;
use crate::chargen::Font;
use crate::core::term::{Attr, Palette, Rgb, ScreenBuffer};
use crate::diagnostics::{Diagnostic, DiagnosticSink, NullSink};
use crate::geometry::{Point, Rect};

/// Shortest frame delay the scroller emits, in hundredths of a second.
pub const MIN_SCROLL_DELAY: u16 = 5;

/// Times the final scroller frame is repeated.
const HOLD_FRAMES: usize = 10;

/// Palette entries and the color → index lookup for one render.
struct WorkingPalette {
    palette: Palette,
    index: HashMap<Rgb, u8>,
}

impl WorkingPalette {
    fn index(&self, color: Rgb) -> u8 {
        self.index.get(&color).copied().unwrap_or(0)
    }

    /// Bright counterpart of a base color slot, if there is one.
    fn brighten(&self, index: u8) -> u8 {
        if index < 8 && usize::from(index) + 8 < self.palette.len() {
            index + 8
        } else {
            index
        }
    }
}

pub struct Compositor {
    regular: Font,
    italics: Font,
    diagnostics: Rc<dyn DiagnosticSink>,
    progress: Option<Box<dyn FnMut(f64)>>,
}

impl Compositor {
    pub fn new(font: Font) -> Self {
        Self::with_diagnostics(font, Rc::new(NullSink))
    }

    pub fn with_diagnostics(font: Font, diagnostics: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            italics: font.italics(),
            regular: font,
            diagnostics,
            progress: None,
        }
    }

    /// Install a callback receiving the fraction of work done, from 0 to 1.
    pub fn on_progress(&mut self, progress: impl FnMut(f64) + 'static) {
        self.progress = Some(Box::new(progress));
    }

    pub fn font(&self) -> &Font {
        &self.regular
    }

    /// Pixel size of an image rendered from `screen`.
    pub fn image_size(&self, screen: &ScreenBuffer) -> Point {
        let glyph = self.regular.size();
        Point::new(
            screen.width() as i32 * (glyph.x + screen.padding as i32),
            screen.height() as i32 * glyph.y,
        )
    }

    /// Render the whole buffer in one blink phase.
    pub fn render(&mut self, screen: &ScreenBuffer, phase: BlinkPhase) -> PalettedImage {
        self.report_progress(0.0);
        let im = self.render_span(screen, phase, 0.0, 1.0);
        if screen.height() == 0 {
            self.report_progress(1.0);
        }
        im
    }

    /// Two frame blink loop: blinking glyphs hidden, then shown.
    pub fn animate(&mut self, screen: &ScreenBuffer, delay: u16) -> Animation {
        let (off, on) = self.render_phases(screen);
        let height = off.height();
        let mut animation = Animation::new(off, on, height);
        for phase in [BlinkPhase::Off, BlinkPhase::On] {
            animation.push(Frame {
                phase,
                offset: 0,
                delay,
            });
        }
        animation
    }

    /// Scroll through the buffer one pixel row per frame, showing
    /// `viewport_rows` text rows at a time.
    ///
    /// A buffer that fits the viewport becomes a plain blink loop. Frame
    /// delays are at least `MIN_SCROLL_DELAY`.
    pub fn scroller(
        &mut self,
        screen: &ScreenBuffer,
        delay: u16,
        viewport_rows: usize,
    ) -> Animation {
        let delay = delay.max(MIN_SCROLL_DELAY);
        let viewport_rows = viewport_rows.max(1);
        if screen.height() <= viewport_rows {
            return self.animate(screen, delay);
        }

        let (off, on) = self.render_phases(screen);
        let glyph_height = self.regular.size().y.max(1) as usize;
        let mut animation = Animation::new(off, on, viewport_rows * glyph_height);

        // Blink phase flips every two text rows of travel.
        let last = (screen.height() - viewport_rows) * glyph_height;
        for offset in 0..=last {
            let phase = if (offset / (2 * glyph_height)) % 2 == 0 {
                BlinkPhase::Off
            } else {
                BlinkPhase::On
            };
            animation.push(Frame {
                phase,
                offset,
                delay,
            });
        }
        if let Some(&hold) = animation.frames().last() {
            for _ in 0..HOLD_FRAMES {
                animation.push(hold);
            }
        }
        debug!(
            "Scroller: {} frames of {}x{}",
            animation.frame_count(),
            animation.width(),
            animation.height()
        );
        animation
    }

    fn render_phases(&mut self, screen: &ScreenBuffer) -> (PalettedImage, PalettedImage) {
        self.report_progress(0.0);
        let off = self.render_span(screen, BlinkPhase::Off, 0.0, 0.5);
        let on = self.render_span(screen, BlinkPhase::On, 0.5, 1.0);
        if screen.height() == 0 {
            self.report_progress(1.0);
        }
        (off, on)
    }

    /// Render one phase, reporting progress from `lo` up to `hi`.
    fn render_span(
        &mut self,
        screen: &ScreenBuffer,
        phase: BlinkPhase,
        lo: f64,
        hi: f64,
    ) -> PalettedImage {
        let working = self.working_palette(screen);
        let glyph = self.regular.size();
        let stride_x = glyph.x + screen.padding as i32;
        let size = self.image_size(screen);
        debug!(
            "Rendering {}x{} cells into {}x{} pixels, {} colors, phase {:?}",
            screen.width(),
            screen.height(),
            size.x,
            size.y,
            working.palette.len(),
            phase
        );

        let mut im = PalettedImage::new(
            size.x as usize,
            size.y as usize,
            working.palette.clone(),
        );
        let rows = screen.height();
        for y in 0..rows {
            let Some(row) = screen.row(y) else {
                continue;
            };
            for (x, cell) in row.iter().enumerate() {
                let attr = cell.attributes();
                let mut fg = working.index(cell.foreground());
                let mut bg = working.index(cell.background());
                let mut font = &self.regular;

                if attr.contains(Attr::CONCEAL) {
                    fg = bg;
                } else {
                    if attr.contains(Attr::REVERSE) {
                        std::mem::swap(&mut fg, &mut bg);
                    }
                    if attr.contains(Attr::BOLD) {
                        fg = working.brighten(fg);
                    }
                    if attr.contains(Attr::BLINK) && screen.disable_blink {
                        bg = working.brighten(bg);
                    }
                    if attr.contains(Attr::STANDOUT) {
                        font = &self.italics;
                    }
                }

                let min = Point::new(x as i32 * stride_x, y as i32 * glyph.y);
                let r = Rect::new(min.x, min.y, min.x + stride_x, min.y + glyph.y);
                im.fill_rect(r, bg);

                let visible =
                    screen.disable_blink || !attr.contains(Attr::BLINK) || phase == BlinkPhase::On;
                let code = cell.code_point();
                if visible {
                    if let Some(mask) = font.glyph(code) {
                        let dst = Rect::new(min.x, min.y, min.x + glyph.x, min.y + glyph.y);
                        im.draw_mask(dst, &mask, font.glyph_rect(code).min, fg);
                    } else {
                        trace!("No glyph for {:#04x} at ({}, {})", code, x, y);
                    }
                }

                if attr.contains(Attr::CROSSED_OUT) {
                    let mid = r.min.y + glyph.y / 2;
                    im.fill_rect(Rect::new(r.min.x, mid, r.max.x, mid + 1), fg);
                }
                if attr.contains(Attr::UNDERLINE) {
                    im.fill_rect(Rect::new(r.min.x, r.max.y - 2, r.max.x, r.max.y - 1), fg);
                }
            }
            self.report_progress(lo + (hi - lo) * (y + 1) as f64 / rows as f64);
        }
        im
    }

    /// Base palette followed by every buffer color it lacks, in first-seen
    /// order. Colors past the indexed image limit fall back to the nearest
    /// entry.
    fn working_palette(&self, screen: &ScreenBuffer) -> WorkingPalette {
        let mut colors: Vec<Rgb> = screen.palette.iter().take(Palette::MAX_COLORS).collect();
        let mut index = HashMap::new();
        for (i, &c) in colors.iter().enumerate() {
            index.entry(c).or_insert(i as u8);
        }

        for cell in screen.cells() {
            for color in [cell.foreground(), cell.background()] {
                if index.contains_key(&color) {
                    continue;
                }
                let i = if colors.len() < Palette::MAX_COLORS {
                    colors.push(color);
                    colors.len() - 1
                } else {
                    self.diagnostics.report(&Diagnostic::PaletteFull(color));
                    nearest(&colors, color)
                };
                index.insert(color, i as u8);
            }
        }

        WorkingPalette {
            palette: Palette::new(colors),
            index,
        }
    }

    fn report_progress(&mut self, fraction: f64) {
        if let Some(progress) = self.progress.as_mut() {
            progress(fraction.clamp(0.0, 1.0));
        }
    }
}

fn nearest(colors: &[Rgb], color: Rgb) -> usize {
    colors
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| c.distance_sq(color))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::chargen::MaskOptions;
    use crate::core::term::color::{BLACK, BLUE, BRIGHT_RED, BRIGHT_WHITE, RED, WHITE};
    use crate::diagnostics::CollectingSink;

    /// 4x4 font: glyph 0 blank, glyph 1 solid, glyph 2 left column only.
    fn font() -> Font {
        Font::from_bytes(
            vec![0x00, 0x00, 0xff, 0xff, 0x88, 0x88],
            MaskOptions::new(4, 4),
        )
        .unwrap()
    }

    /// Blank buffer over the CGA palette. Blanks are spaces, which the
    /// test font has no glyph for.
    fn screen(width: usize, height: usize) -> ScreenBuffer {
        let mut s = ScreenBuffer::new(width, height);
        s.palette = Palette::cga();
        s
    }

    fn put(s: &mut ScreenBuffer, x: usize, y: usize, code: u8, attr: Attr) {
        s.goto(x, y);
        s.clear_attributes();
        s.set_attribute(attr);
        s.write_code_point(code);
        s.clear_attributes();
    }

    #[test]
    fn test_image_geometry() {
        let mut s = screen(3, 2);
        s.padding = 1;
        let mut c = Compositor::new(font());
        let im = c.render(&s, BlinkPhase::On);
        assert_eq!((im.width(), im.height()), (15, 8));
        assert_eq!(im.palette().len(), 16);
    }

    #[test]
    fn test_glyph_and_background() {
        let mut s = screen(2, 1);
        s.set_foreground_color(RED);
        s.set_background_color(BLUE);
        s.goto(1, 0);
        s.write_code_point(2);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        assert_eq!(im.color_at(0, 0), Some(BLACK));
        assert_eq!(im.color_at(4, 0), Some(RED));
        assert_eq!(im.color_at(5, 3), Some(BLUE));
    }

    #[test]
    fn test_bold_brightens_base_colors() {
        let mut s = screen(1, 1);
        s.set_foreground_color(RED);
        put(&mut s, 0, 0, 1, Attr::BOLD);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        assert_eq!(im.color_at(0, 0), Some(BRIGHT_RED));
    }

    #[test]
    fn test_reverse_and_conceal() {
        let mut s = screen(2, 1);
        put(&mut s, 0, 0, 2, Attr::REVERSE);
        put(&mut s, 1, 0, 1, Attr::CONCEAL);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        // Reversed: glyph column in black over light grey.
        assert_eq!(im.color_at(0, 0), Some(BLACK));
        assert_eq!(im.color_at(1, 0), Some(WHITE));
        // Concealed solid glyph disappears into the background.
        assert_eq!(im.color_at(5, 1), Some(BLACK));
    }

    #[test]
    fn test_blink_phases() {
        let mut s = screen(1, 1);
        put(&mut s, 0, 0, 1, Attr::BLINK);
        let mut c = Compositor::new(font());
        assert_eq!(c.render(&s, BlinkPhase::Off).color_at(1, 1), Some(BLACK));
        assert_eq!(c.render(&s, BlinkPhase::On).color_at(1, 1), Some(WHITE));
    }

    #[test]
    fn test_disabled_blink_brightens_background() {
        let mut s = screen(1, 1);
        s.disable_blink = true;
        put(&mut s, 0, 0, 2, Attr::BLINK);
        let im = Compositor::new(font()).render(&s, BlinkPhase::Off);
        assert_eq!(im.color_at(0, 0), Some(WHITE));
        assert_eq!(im.color_at(1, 0), s.palette.get(8));
    }

    #[test]
    fn test_lines() {
        let mut s = screen(1, 2);
        put(&mut s, 0, 0, 0, Attr::UNDERLINE);
        put(&mut s, 0, 1, 0, Attr::CROSSED_OUT);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        assert_eq!(im.color_at(0, 2), Some(WHITE));
        assert_eq!(im.color_at(3, 3), Some(BLACK));
        assert_eq!(im.color_at(2, 6), Some(WHITE));
        assert_eq!(im.color_at(2, 5), Some(BLACK));
    }

    #[test]
    fn test_missing_glyph_renders_background_only() {
        let mut s = screen(1, 1);
        s.set_background_color(BLUE);
        s.write_code_point(200);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        assert!(im.pixels().iter().all(|&i| im.palette().get(usize::from(i)) == Some(BLUE)));
    }

    #[test]
    fn test_new_colors_extend_palette() {
        let mut s = screen(2, 1);
        let orange = Rgb::new(0xff, 0x80, 0x00);
        s.set_foreground_color(orange);
        s.write_code_point(1);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        assert_eq!(im.palette().len(), 17);
        assert_eq!(im.palette().get(16), Some(orange));
        assert_eq!(im.index_at(0, 0), Some(16));
    }

    #[test]
    fn test_full_palette_falls_back_to_nearest() {
        let mut s = ScreenBuffer::new(1, 1);
        s.set_foreground_color(Rgb::new(0xfe, 0xfe, 0xfe));
        s.write_code_point(1);
        let sink = Rc::new(CollectingSink::new());
        let mut c = Compositor::with_diagnostics(font(), sink.clone());
        let im = c.render(&s, BlinkPhase::On);
        assert_eq!(im.palette().len(), 256);
        assert_eq!(im.color_at(0, 0), Some(BRIGHT_WHITE));
        assert_eq!(
            sink.take(),
            vec![Diagnostic::PaletteFull(Rgb::new(0xfe, 0xfe, 0xfe))]
        );
    }

    #[test]
    fn test_progress_is_monotonic() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut c = Compositor::new(font());
        c.on_progress(move |f| log.borrow_mut().push(f));
        c.render(&screen(2, 4), BlinkPhase::On);
        let seen = seen.borrow();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_animate_has_two_frames() {
        let mut c = Compositor::new(font());
        let anim = c.animate(&screen(2, 2), 40);
        let frames = anim.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].phase, BlinkPhase::Off);
        assert_eq!(frames[1].phase, BlinkPhase::On);
        assert!(frames.iter().all(|f| f.delay == 40 && f.offset == 0));
        assert_eq!(anim.height(), 8);
    }

    #[test]
    fn test_scroller_short_buffer_is_blink_loop() {
        let mut c = Compositor::new(font());
        let anim = c.scroller(&screen(2, 3), 1, 25);
        assert_eq!(anim.frame_count(), 2);
        assert!(anim.frames().iter().all(|f| f.delay == MIN_SCROLL_DELAY));
    }

    #[test]
    fn test_scroller_frames() {
        let mut c = Compositor::new(font());
        let anim = c.scroller(&screen(2, 6), 10, 2);
        // Four rows of 4 pixels to travel, both ends included, plus the hold.
        assert_eq!(anim.frame_count(), 17 + HOLD_FRAMES);
        assert_eq!(anim.height(), 8);
        let frames = anim.frames();
        assert_eq!(frames[0].offset, 0);
        assert_eq!(frames[16].offset, 16);
        assert_eq!(frames[7].phase, BlinkPhase::Off);
        assert_eq!(frames[8].phase, BlinkPhase::On);
        assert_eq!(frames[16].phase, BlinkPhase::Off);
        assert!(frames[17..].iter().all(|f| *f == frames[16]));
        assert_eq!(frames[16].pixels(&anim).len(), 8 * 8);
    }

    #[test]
    fn test_italic_standout() {
        let mut s = screen(1, 1);
        put(&mut s, 0, 0, 2, Attr::STANDOUT);
        let im = Compositor::new(font()).render(&s, BlinkPhase::On);
        // A 4x4 italic glyph samples column x + y.
        assert_eq!(im.color_at(0, 0), Some(WHITE));
        assert_eq!(im.color_at(0, 1), Some(BLACK));
        assert_eq!(im.color_at(0, 2), Some(BLACK));
    }
}

//! Decode, render and animate through the public API.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use textmode::chargen::MaskOptions;
use textmode::core::term::color::{BLACK, BLUE, BRIGHT_RED, WHITE};
use textmode::core::term::Attr;
use textmode::diagnostics::{CollectingSink, Diagnostic};
use textmode::render::BlinkPhase;
use textmode::{Compositor, Config, Font};

const FULL_BLOCK: u8 = 0xdb;
const LOWER_HALF: u8 = 0xdc;

/// 8x8 font with 256 glyphs: a full block, a lower half block, the rest
/// blank.
fn font() -> Font {
    let mut rom = vec![0u8; 256 * 8];
    rom[usize::from(FULL_BLOCK) * 8..][..8].fill(0xff);
    rom[usize::from(LOWER_HALF) * 8 + 4..][..4].fill(0xff);
    Font::from_bytes(rom, MaskOptions::new(8, 8)).unwrap()
}

fn config(width: usize, height: usize) -> Config {
    let mut config = Config::default();
    config.screen.width = width;
    config.screen.height = height;
    config.render.palette_name = "cga".to_string();
    config
}

#[test]
fn test_colored_blocks() {
    let input = b"\x1b[1;31m\xdb\x1b[0;44m \x1b[m\xdc";
    let screen = textmode::decode(&input[..], &config(3, 1)).unwrap();
    assert_eq!(screen.text_bytes(), b"\xdb \xdc\n".to_vec());
    assert!(screen.cell(0, 0).unwrap().attributes().contains(Attr::BOLD));

    let image = Compositor::new(font()).render(&screen, BlinkPhase::On);
    assert_eq!((image.width(), image.height()), (24, 8));
    assert_eq!(image.color_at(3, 3), Some(BRIGHT_RED));
    assert_eq!(image.color_at(11, 3), Some(BLUE));
    assert_eq!(image.color_at(20, 2), Some(BLACK));
    assert_eq!(image.color_at(20, 6), Some(WHITE));
}

#[test]
fn test_sauce_trailer_stops_decoding() {
    let input = b"AB\x1aSAUCE00 title\x1b[31mCD";
    let screen = textmode::decode(&input[..], &config(4, 1)).unwrap();
    assert_eq!(screen.text_bytes(), b"AB  \n".to_vec());
}

#[test]
fn test_auto_expand_follows_content() {
    let input = b"one\r\ntwo\r\nthree";
    let screen = textmode::decode(&input[..], &config(5, 1)).unwrap();
    assert_eq!(screen.height(), 3);
    assert_eq!(screen.to_string(), "one  \ntwo  \nthree\n");

    let mut fixed = config(5, 1);
    fixed.screen.auto_expand = false;
    let screen = textmode::decode(&input[..], &fixed).unwrap();
    assert_eq!(screen.height(), 1);
    assert_eq!(screen.to_string(), "three\n");
}

#[test]
fn test_unknown_sequences_are_reported() {
    let sink = Rc::new(CollectingSink::new());
    let input = b"\x1b[5y\xdb";
    let screen =
        textmode::decode_with_diagnostics(&input[..], &config(2, 1), sink.clone()).unwrap();
    assert_eq!(screen.cell(0, 0).unwrap().code_point(), FULL_BLOCK);
    assert_eq!(
        sink.take(),
        vec![Diagnostic::UnknownCsi {
            final_byte: b'y',
            private: None,
            params: vec![5],
        }]
    );
}

#[test]
fn test_blink_animation() {
    let input = b"\x1b[5m\xdb";
    let screen = textmode::decode(&input[..], &config(1, 1)).unwrap();
    let mut compositor = Compositor::new(font());
    let animation = compositor.animate(&screen, 50);
    assert_eq!(animation.frame_count(), 2);
    assert_eq!(animation.duration(), 100);

    let palette = animation.palette();
    let color = |frame: usize| {
        let pixels = animation.frames()[frame].pixels(&animation);
        palette.get(usize::from(pixels[0]))
    };
    assert_eq!(color(0), Some(BLACK));
    assert_eq!(color(1), Some(WHITE));
}

#[test]
fn test_ice_colors_keep_glyph_visible() {
    let input = b"\x1b[5;41m\xdc";
    let mut config = config(1, 1);
    config.render.disable_blink = true;
    let screen = textmode::decode(&input[..], &config).unwrap();
    let image = Compositor::new(font()).render(&screen, BlinkPhase::Off);
    assert_eq!(image.color_at(0, 0), Some(BRIGHT_RED));
    assert_eq!(image.color_at(0, 7), Some(WHITE));
}

#[test]
fn test_scroller_over_tall_buffer() {
    let input = vec![&b"\x1b[0m\xdb"[..]; 10].join(&b"\r\n"[..]);
    let screen = textmode::decode(&input[..], &config(2, 1)).unwrap();
    assert_eq!(screen.height(), 10);

    let mut compositor = Compositor::new(font());
    let animation = compositor.scroller(&screen, 1, 4);
    // Six rows of eight pixels, both ends included, then the final hold.
    assert_eq!(animation.frame_count(), 49 + 10);
    assert_eq!(animation.height(), 32);
    let frames = animation.frames();
    assert!(frames.iter().all(|f| f.delay == 5));
    assert_eq!(frames[48].offset, 48);
    assert_eq!(frames[48].pixels(&animation).len(), 16 * 32);
}

#[test]
fn test_nine_pixel_spacing_widens_cells() {
    let input = b"\xdb\xdb";
    let screen = textmode::decode(&input[..], &config(2, 1)).unwrap();
    let mut compositor = Compositor::new(font().with_added_column());
    let image = compositor.render(&screen, BlinkPhase::On);
    assert_eq!(image.width(), 18);
    assert_eq!(image.color_at(7, 0), Some(WHITE));
    assert_eq!(image.color_at(8, 0), Some(BLACK));
    assert_eq!(image.color_at(9, 0), Some(WHITE));
}

#[test]
fn test_parsed_config_drives_decoding() {
    let config: Config = "[screen]\nwidth = 2\nheight = 1\nauto_expand = false\n"
        .parse()
        .unwrap();
    let screen = textmode::decode(&b"abc"[..], &config).unwrap();
    assert_eq!(screen.to_string(), "c \n");
}

#[test]
fn test_far_cursor_moves_grow_one_row() {
    let screen = textmode::decode(&b"\x1b[4000000000dX"[..], &Config::default()).unwrap();
    assert_eq!(screen.height(), 26);
    assert_eq!(screen.cell(0, 25).unwrap().code_point(), b'X');

    let screen = textmode::decode(&b"\x1b[4000000000EY"[..], &Config::default()).unwrap();
    assert_eq!(screen.height(), 26);
    assert_eq!(screen.cell(0, 25).unwrap().code_point(), b'Y');
}

//! ANSI escape sequence parser
//!
//! Parses the permissive VT100/ANSI subset found in text-mode art and
//! updates a `ScreenBuffer`. The parser is push driven: `feed` takes one byte
//! at a time, `decode` pumps a whole reader through it.
//!
//! Input is never rejected. Unknown sequences are consumed and reported to
//! the diagnostics sink; a sequence cut off by the end of input is dropped.

use std::io::{self, Read};
use std::rc::Rc;

use tracing::trace;

use super::cell::Attr;
use super::color::{Rgb, BLACK, WHITE};
use super::state::ScreenBuffer;
use crate::diagnostics::{Diagnostic, DiagnosticSink, NullSink};

const BS: u8 = 0x08;
const TAB: u8 = 0x09;
const LF: u8 = 0x0a;
const VT: u8 = 0x0b;
const FF: u8 = 0x0c;
const CR: u8 = 0x0d;
const SO: u8 = 0x0e;
const SI: u8 = 0x0f;
const SUB: u8 = 0x1a;
const ESC: u8 = 0x1b;

/// Marker that follows `SUB` when a SAUCE record trails the art.
const SAUCE: &[u8; 5] = b"SAUCE";

/// Most parameters kept per CSI sequence; extra ones are parsed and dropped.
const MAX_PARAMS: usize = 32;

/// Whether the parser wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Continue,
    /// The stream reached its end marker; further bytes are ignored.
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ParserState {
    #[default]
    Ground,
    /// CR seen; a directly following LF makes it one newline.
    CarriageReturn,
    /// SUB seen, `matched` bytes of the SAUCE marker seen after it.
    Substitute { matched: usize },
    Escape,
    /// Swallow one byte (charset designators, `ESC #`, `ESC @`).
    EscapeSkip,
    /// Right after `ESC [`.
    CsiEntry,
    /// Private prefix seen, nothing else yet.
    CsiPrivate,
    CsiParam,
    Done,
}

/// Parser state machine
pub struct VtParser {
    state: ParserState,
    params: Vec<u32>,
    current_param: Option<u32>,
    private: Option<u8>,
    diagnostics: Rc<dyn DiagnosticSink>,
}

impl Default for VtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VtParser {
    pub fn new() -> Self {
        Self::with_diagnostics(Rc::new(NullSink))
    }

    pub fn with_diagnostics(diagnostics: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            state: ParserState::Ground,
            params: Vec::with_capacity(MAX_PARAMS),
            current_param: None,
            private: None,
            diagnostics,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Pump `reader` through the parser until end of input or the SAUCE
    /// marker. Only read errors are returned.
    pub fn decode<R: Read>(&mut self, mut reader: R, screen: &mut ScreenBuffer) -> io::Result<()> {
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for &byte in &buf[..n] {
                if self.feed(byte, screen) == Status::Done {
                    return Ok(());
                }
            }
        }
        self.finish(screen);
        Ok(())
    }

    /// Flush state at end of input. A pending `SUB` that turned out not to
    /// start a SAUCE marker is written out; any other partial sequence is
    /// dropped.
    pub fn finish(&mut self, screen: &mut ScreenBuffer) {
        if let ParserState::Substitute { matched } = self.state {
            screen.write_code_point(SUB);
            screen.write_bytes(&SAUCE[..matched]);
        }
        if self.state != ParserState::Done {
            self.state = ParserState::Ground;
        }
    }

    /// Feed a single byte to the parser
    pub fn feed(&mut self, byte: u8, screen: &mut ScreenBuffer) -> Status {
        trace!("read: {:#04x}", byte);
        match self.state {
            ParserState::Ground => self.ground(byte, screen),
            ParserState::CarriageReturn => {
                self.state = ParserState::Ground;
                if byte == LF {
                    newline(screen);
                } else {
                    self.ground(byte, screen);
                }
            }
            ParserState::Substitute { matched } => self.substitute(matched, byte, screen),
            ParserState::Escape => self.escape(byte, screen),
            ParserState::EscapeSkip => self.state = ParserState::Ground,
            ParserState::CsiEntry => {
                if (b'<'..=b'?').contains(&byte) {
                    self.private = Some(byte);
                    self.state = ParserState::CsiPrivate;
                } else {
                    self.csi_first(byte, screen);
                }
            }
            ParserState::CsiPrivate => self.csi_first(byte, screen),
            ParserState::CsiParam => self.csi_param(byte, screen),
            ParserState::Done => {}
        }
        if self.state == ParserState::Done {
            Status::Done
        } else {
            Status::Continue
        }
    }

    fn ground(&mut self, byte: u8, screen: &mut ScreenBuffer) {
        match byte {
            BS => backspace(screen),
            // No tab stops: a tab is eight literal spaces.
            TAB => screen.write_bytes(b"        "),
            LF => newline(screen),
            VT => self.report(Diagnostic::Unimplemented("vertical tab")),
            FF => self.report(Diagnostic::Unimplemented("form feed")),
            CR => self.state = ParserState::CarriageReturn,
            SUB => self.state = ParserState::Substitute { matched: 0 },
            ESC => self.state = ParserState::Escape,
            _ => screen.write_code_point(byte),
        }
    }

    fn substitute(&mut self, matched: usize, byte: u8, screen: &mut ScreenBuffer) {
        if byte == SAUCE[matched] {
            self.state = if matched + 1 == SAUCE.len() {
                trace!("SAUCE record follows, done");
                ParserState::Done
            } else {
                ParserState::Substitute {
                    matched: matched + 1,
                }
            };
            return;
        }
        // Not a marker: SUB is an ordinary glyph, replay what was held back.
        trace!("SUB followed by {:?}", String::from_utf8_lossy(&SAUCE[..matched]));
        screen.write_code_point(SUB);
        screen.write_bytes(&SAUCE[..matched]);
        self.state = ParserState::Ground;
        self.ground(byte, screen);
    }

    fn escape(&mut self, byte: u8, screen: &mut ScreenBuffer) {
        self.state = ParserState::Ground;
        match byte {
            // Escaped control codes are printed, not interpreted.
            BS | TAB | LF | VT | FF | CR | SO | SI | SUB | ESC => screen.write_code_point(byte),
            b'7' => screen.save_cursor(),
            b'8' => screen.load_cursor(),
            b'[' => {
                self.params.clear();
                self.current_param = None;
                self.private = None;
                self.state = ParserState::CsiEntry;
            }
            // Private mode switches carry no argument bytes.
            b'=' | b'>' => self.report(Diagnostic::Unimplemented("private mode")),
            b'#' => {
                self.report(Diagnostic::Unimplemented("DEC line attributes"));
                self.state = ParserState::EscapeSkip;
            }
            b'@' => self.state = ParserState::EscapeSkip,
            b'(' | b')' | b'-' | b'*' | b'.' | b'+' | b'/' => {
                self.report(Diagnostic::Unimplemented("character set designation"));
                self.state = ParserState::EscapeSkip;
            }
            b']' => self.report(Diagnostic::Unimplemented("operating system command")),
            // Index, next line, tab set, reverse index, single shifts, DCS,
            // guarded areas, SOS, DECID
            b'D' | b'E' | b'H' | b'M' | b'N' | b'O' | b'P' | b'V' | b'W' | b'X' | b'Z' => {}
            _ => self.report(Diagnostic::UnknownEscape(byte)),
        }
    }

    /// First byte of a CSI sequence after the optional private prefix.
    fn csi_first(&mut self, byte: u8, screen: &mut ScreenBuffer) {
        match byte {
            0x20..=0x3f => {
                self.state = ParserState::CsiParam;
                self.csi_param(byte, screen);
            }
            ESC => self.state = ParserState::Escape,
            // A stray control byte before any parameter is dropped.
            0x00..=0x1f => self.state = ParserState::Ground,
            _ => {
                self.state = ParserState::Ground;
                self.execute_csi(byte, screen);
            }
        }
    }

    fn csi_param(&mut self, byte: u8, screen: &mut ScreenBuffer) {
        if byte.is_ascii_digit() {
            let digit = u32::from(byte - b'0');
            self.current_param = Some(
                self.current_param
                    .unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add(digit),
            );
            return;
        }

        if (0x20..=0x3f).contains(&byte) {
            // Field separator; anything in this range ends a field.
            let n = self.current_param.take().unwrap_or(0);
            self.push_param(n);
            return;
        }

        if let Some(n) = self.current_param.take() {
            self.push_param(n);
        }
        self.state = ParserState::Ground;
        match byte {
            // Backspace aborts the sequence after taking effect.
            BS => backspace(screen),
            ESC => self.state = ParserState::Escape,
            0x00..=0x1f => screen.write_code_point(byte),
            _ => self.execute_csi(byte, screen),
        }
    }

    fn push_param(&mut self, n: u32) {
        if self.params.len() < MAX_PARAMS {
            self.params.push(n);
        }
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.report(&diagnostic);
    }

    fn execute_csi(&mut self, final_byte: u8, screen: &mut ScreenBuffer) {
        let params = std::mem::take(&mut self.params);
        trace!("CSI {:?} {:?} {}", self.private, params, final_byte as char);
        // First parameter, with zero or absent meaning `default`.
        let first = |default: u32| match params.first() {
            Some(&n) if n > 0 => n,
            _ => default,
        };
        let count = |default: u32| first(default).min(i32::MAX as u32) as i32;

        match final_byte {
            // Cursor movement
            b'A' | b'e' => screen.move_by(0, -count(1)),
            b'B' => screen.move_by(0, count(1)),
            b'C' | b'a' => screen.move_by(count(1), 0),
            b'D' => screen.move_by(-count(1), 0),
            b'E' => {
                // CNL - Cursor Next Line
                let (_, y) = screen.position();
                screen.goto(0, y.saturating_add(first(1) as usize));
            }
            b'F' => {
                // CPL - Cursor Preceding Line
                let (_, y) = screen.position();
                screen.goto(0, y.saturating_sub(first(1) as usize));
            }
            b'G' | b'`' => {
                // CHA - Cursor Character Absolute
                let (_, y) = screen.position();
                screen.goto(first(1) as usize - 1, y);
            }
            b'd' => {
                // VPA - Line Position Absolute
                let (x, _) = screen.position();
                screen.goto(x, first(1) as usize - 1);
            }
            b'H' | b'f' => {
                // CUP - Cursor Position [row;column]
                let row = params.first().copied().unwrap_or(1).max(1) as usize;
                let col = params.get(1).copied().unwrap_or(1).max(1) as usize;
                screen.goto(col - 1, row - 1);
            }

            // Recognized, consumed, no effect
            b'I' | b'Z' => self.report(Diagnostic::Unimplemented("tabulation")),
            b'J' => self.report(Diagnostic::Unimplemented("erase in display")),
            b'K' => self.report(Diagnostic::Unimplemented("erase in line")),
            b'g' | b'W' => self.report(Diagnostic::Unimplemented("tab stops")),

            // SGR - Select Graphic Rendition
            b'm' => self.execute_sgr(&params, screen),

            // 24-bit color, SyncTERM style: <ESC>[{0|1};r;g;bt
            b't' => {
                if let [mode, r, g, b] = params[..] {
                    let color = Rgb::new(clamp_u8(r), clamp_u8(g), clamp_u8(b));
                    match mode {
                        0 => screen.set_background_color(color),
                        1 => screen.set_foreground_color(color),
                        _ => {}
                    }
                }
            }

            // DECSTBM - Set Scrolling Region [top;bottom]
            b'r' if self.private.is_some() => match params[..] {
                [top, bottom, ..] if top < bottom => {
                    screen.set_scroll_region(top as usize, bottom as usize)
                }
                _ => screen.set_scroll_region(0, 0),
            },
            b'r' => {}

            _ => self.report(Diagnostic::UnknownCsi {
                final_byte,
                private: self.private,
                params: params.clone(),
            }),
        }

        self.params = params;
        self.params.clear();
    }

    fn execute_sgr(&self, params: &[u32], screen: &mut ScreenBuffer) {
        if params.is_empty() {
            screen.reset_attributes();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => screen.reset_attributes(),
                1 => screen.set_attribute(Attr::BOLD),
                2 => screen.set_attribute(Attr::FAINT),
                3 => screen.set_attribute(Attr::STANDOUT),
                4 => screen.set_attribute(Attr::UNDERLINE),
                5 | 6 => screen.set_attribute(Attr::BLINK),
                7 => screen.set_attribute(Attr::REVERSE),
                8 => screen.set_attribute(Attr::CONCEAL),
                9 => screen.set_attribute(Attr::CROSSED_OUT),

                22 => screen.clear_attributes(),
                23 => screen.clear_attribute(Attr::STANDOUT),
                24 => screen.clear_attribute(Attr::UNDERLINE),
                25 => screen.clear_attribute(Attr::BLINK),
                27 => screen.clear_attribute(Attr::REVERSE),
                28 => screen.clear_attribute(Attr::CONCEAL),
                29 => screen.clear_attribute(Attr::CROSSED_OUT),

                n @ 30..=37 => {
                    if let Some(color) = self.palette_color(screen, n - 30) {
                        screen.set_foreground_color(color);
                    }
                }
                38 => {
                    let (skip, color) = self.extended_color(screen, &params[i..]);
                    if let Some(color) = color {
                        screen.set_foreground_color(color);
                    }
                    i += skip;
                }
                39 => screen.set_foreground_color(WHITE),

                n @ 40..=47 => {
                    if let Some(color) = self.palette_color(screen, n - 40) {
                        screen.set_background_color(color);
                    }
                }
                48 => {
                    let (skip, color) = self.extended_color(screen, &params[i..]);
                    if let Some(color) = color {
                        screen.set_background_color(color);
                    }
                    i += skip;
                }
                49 => screen.set_background_color(BLACK),

                _ => {}
            }
            i += 1;
        }
    }

    fn palette_color(&self, screen: &ScreenBuffer, index: u32) -> Option<Rgb> {
        let color = screen.palette.get(index as usize);
        if color.is_none() {
            self.report(Diagnostic::ColorOutOfRange(index));
        }
        color
    }

    /// Parse `38;5;n` / `38;2;r;g;b` (or 48). `args[0]` is the 38/48 itself.
    /// Returns the number of extra arguments consumed and the color, if any.
    fn extended_color(&self, screen: &ScreenBuffer, args: &[u32]) -> (usize, Option<Rgb>) {
        match args {
            [_, 2, r, g, b, ..] => (4, Some(Rgb::new(clamp_u8(*r), clamp_u8(*g), clamp_u8(*b)))),
            [_, 5, n, ..] => (2, self.palette_color(screen, *n)),
            [_, 2, ..] => (1, None),
            [_, 5] => (1, None),
            [_, _, ..] => {
                self.report(Diagnostic::Unimplemented("extended color mode"));
                (1, None)
            }
            _ => (0, None),
        }
    }
}

fn clamp_u8(n: u32) -> u8 {
    n.min(255) as u8
}

fn newline(screen: &mut ScreenBuffer) {
    let (_, y) = screen.position();
    screen.goto(0, y + 1);
}

fn backspace(screen: &mut ScreenBuffer) {
    screen.move_by(-1, 0);
    screen.write_code_point(b' ');
    screen.move_by(-1, 0);
}

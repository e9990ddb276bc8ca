//! Diagnostics sink
//!
//! Unsupported sequences and lossy color decisions are never errors, but
//! callers may want to know about them. The parser and the compositor report
//! them to a sink handed over at construction; the default sink drops them.

use std::cell::RefCell;
use std::fmt;

use crate::core::term::Rgb;

/// Something the decoder or renderer skipped or approximated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `ESC` followed by a byte with no meaning.
    UnknownEscape(u8),
    /// CSI sequence with an unknown final byte.
    UnknownCsi {
        final_byte: u8,
        private: Option<u8>,
        params: Vec<u32>,
    },
    /// Recognized sequence that is consumed but has no effect.
    Unimplemented(&'static str),
    /// Palette index past the end of the active palette.
    ColorOutOfRange(u32),
    /// Rendered palette is full; the color was approximated.
    PaletteFull(Rgb),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownEscape(b) => write!(f, "unknown escape: <ESC>{}", printable(*b)),
            Diagnostic::UnknownCsi {
                final_byte,
                private,
                params,
            } => {
                write!(f, "unknown CSI sequence: <ESC>[")?;
                if let Some(p) = private {
                    write!(f, "{}", *p as char)?;
                }
                let params: Vec<String> = params.iter().map(u32::to_string).collect();
                write!(f, "{}{}", params.join(";"), printable(*final_byte))
            }
            Diagnostic::Unimplemented(what) => write!(f, "not implemented: {}", what),
            Diagnostic::ColorOutOfRange(n) => write!(f, "palette index {} out of range", n),
            Diagnostic::PaletteFull(c) => write!(f, "palette full, approximating {}", c),
        }
    }
}

fn printable(b: u8) -> String {
    if b.is_ascii_graphic() {
        (b as char).to_string()
    } else {
        format!("\\x{:02x}", b)
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Forwards to the `tracing` debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::debug!("{}", diagnostic);
    }
}

/// Keeps everything for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    seen: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }

    /// Take the collected diagnostics, leaving the sink empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.seen.take()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.seen.borrow_mut().push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.report(&Diagnostic::UnknownEscape(b'q'));
        sink.report(&Diagnostic::ColorOutOfRange(300));
        assert_eq!(sink.len(), 2);
        let seen = sink.take();
        assert_eq!(seen[1], Diagnostic::ColorOutOfRange(300));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::UnknownCsi {
            final_byte: b'y',
            private: Some(b'?'),
            params: vec![1, 25],
        };
        assert_eq!(d.to_string(), "unknown CSI sequence: <ESC>[?1;25y");
        assert_eq!(
            Diagnostic::UnknownEscape(0x07).to_string(),
            "unknown escape: <ESC>\\x07"
        );
    }
}

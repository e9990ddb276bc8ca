//! Text-mode screen emulation: cells, colors, the screen buffer and the
//! escape sequence parser.

pub mod cell;
pub mod color;
pub mod cp437;
pub mod parser;
pub mod state;

pub use cell::{Attr, Cell};
pub use color::{Palette, Rgb};
pub use parser::VtParser;
pub use state::ScreenBuffer;

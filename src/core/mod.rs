//! Core text-mode emulation components.
//!
//! This module contains the character-cell side of the renderer:
//!
//! - **term**: cell model, palettes, the screen buffer and the ANSI escape
//!   sequence parser that drives it
//!
//! # Architecture
//!
//! ```text
//! VtParser (byte stream)
//! └── ScreenBuffer
//!     ├── cells (row-major grid of packed Cell values)
//!     ├── cursor (position + pen) and one saved position
//!     └── palette / padding / blink policy (consumed by the compositor)
//! ```

pub mod term;

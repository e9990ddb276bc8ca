//! Error types
//!
//! Decoding never fails on malformed input; the only error the parser can
//! return is a read failure on its source. Everything else here comes from
//! loading configuration and fonts.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read font {}: {source}", path.display())]
    ReadFont {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid font geometry: {width}x{height} with stride {stride}")]
    FontGeometry {
        width: usize,
        height: usize,
        stride: usize,
    },

    #[error("Unknown font: {0}")]
    UnknownFont(String),
}

pub type Result<T> = std::result::Result<T, Error>;

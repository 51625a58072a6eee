//! Texture assets: decoded RGBA images and an asynchronous loader.
//!
//! Textures are decoded off the render thread. A load hands back a
//! [`PendingTexture`], a one-shot completion that the frame loop polls once
//! per frame until it settles.
//!
//! # Invariants
//! - A pending load yields its result exactly once; later polls report
//!   [`LoadPoll::Consumed`].
//! - Decoded pixels are always tightly packed RGBA8 (`width * height * 4` bytes).

mod loader;

pub use loader::{LoadPoll, PendingTexture, TextureLoader};

use std::path::{Path, PathBuf};

/// Errors from texture loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    PixelBufferSize { expected: usize, actual: usize },
    #[error("texture load for {0} ended without a result")]
    Disconnected(PathBuf),
}

/// A decoded texture in RGBA8 layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    source: PathBuf,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    /// Wrap an already decoded RGBA8 buffer.
    pub fn from_rgba8(
        source: impl Into<PathBuf>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::PixelBufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            source: source.into(),
            width,
            height,
            pixels,
        })
    }

    /// A single-color texture, useful as a stand-in when no file is at hand.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            source: PathBuf::from("<solid>"),
            width,
            height,
            pixels,
        }
    }

    /// Read and decode an image file. Format is guessed from the content.
    pub fn decode_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            source: path.to_path_buf(),
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

pub fn crate_info() -> &'static str {
    "earthview-assets v0.1.0"
}

//! minedraw-core: layered block-texture grid model for MineDraw.
//!
//! Design rules:
//! - Grid dimensions are fixed for the lifetime of a document.
//! - Document operations never redraw; they report whether anything changed
//!   and the caller decides when to mark the display dirty.
//! - Everything that reaches disk or the store is plain serde JSON, in the same
//!   shape the web editor reads (`{ layers, activeLayerId }`).
//! - Failures around storage and assets are recovered locally and logged.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;
pub mod config;
pub mod demo;
pub mod document;
pub mod io;
pub mod layer;
pub mod render;
pub mod storage;

pub use catalog::{Catalog, CatalogError, Category, TextureEntry};
pub use config::{ConfigError, EditorConfig};
pub use document::{Document, DocumentError, PaintMode};
pub use io::{ImportError, DRAWING_FILE_EXT};
pub use layer::{Grid, Layer, LayerId};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError};

/// Default grid width, in cells.
pub const GRID_WIDTH: u32 = 50;
/// Default grid height, in cells.
pub const GRID_HEIGHT: u32 = 30;
/// Edge length of one cell once rasterized, in pixels.
pub const BLOCK_SIZE: u32 = 32;
/// Layer made active when a document is created or an import names no valid layer.
pub const DEFAULT_ACTIVE_LAYER_ID: LayerId = 2;

/// Largest rasterized width or height, in pixels.
pub const MAX_SURFACE_SIDE: u32 = 32_768;

/// Reference to a texture asset, by path (`textures/block/dirt.png`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureRef(pub String);

impl TextureRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without directory or `.png` extension (any case).
    pub fn stem(&self) -> &str {
        let file = self.0.rsplit('/').next().unwrap_or(&self.0);
        match file.len().checked_sub(4) {
            Some(cut)
                if file.is_char_boundary(cut) && file[cut..].eq_ignore_ascii_case(".png") =>
            {
                &file[..cut]
            }
            _ => file,
        }
    }
}

impl fmt::Display for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextureRef {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

/// Width and height of a document grid, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether signed cell coordinates land inside the grid.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pixel size of the rasterized grid, or `None` if it does not fit in `u32`.
    pub fn checked_pixel_size(&self, block_size: u32) -> Option<(u32, u32)> {
        Some((
            self.width.checked_mul(block_size)?,
            self.height.checked_mul(block_size)?,
        ))
    }

    /// Pixel size of the rasterized grid for a given block size. Saturates;
    /// configurations are validated against [`MAX_SURFACE_SIDE`] up front.
    pub fn pixel_size(&self, block_size: u32) -> (u32, u32) {
        (
            self.width.saturating_mul(block_size),
            self.height.saturating_mul(block_size),
        )
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT)
    }
}

//! PNG export: background plus every visible layer, at full resolution.

use anyhow::Context;
use image::{ImageFormat, RgbaImage};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

use super::assets::{load_tile, TextureSource};
use super::background::BackgroundPreset;
use super::compose::{composite, visible_textures, CompositeStats};
use crate::{Document, TextureRef};

/// Rasterize the document over a background. Textures are loaded up front;
/// ones that fail are logged and left out.
pub fn render_document(
    document: &Document,
    background: BackgroundPreset,
    source: &dyn TextureSource,
    block_size: u32,
) -> (RgbaImage, CompositeStats) {
    let (w, h) = document.dimensions().pixel_size(block_size);
    let mut image = RgbaImage::new(w, h);
    background.paint(&mut image);

    let mut tiles: HashMap<TextureRef, RgbaImage> = HashMap::new();
    for texture in visible_textures(document) {
        match load_tile(source, texture, block_size) {
            Ok(tile) => {
                tiles.insert(texture.clone(), tile);
            }
            Err(e) => warn!(path = %texture, error = %e, "texture left out of export"),
        }
    }

    let stats = composite(&mut image, document, block_size, &tiles);
    (image, stats)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Render and write a PNG file.
pub fn export_png(
    path: impl AsRef<Path>,
    document: &Document,
    background: BackgroundPreset,
    source: &dyn TextureSource,
    block_size: u32,
) -> anyhow::Result<CompositeStats> {
    let path = path.as_ref();
    let (image, stats) = render_document(document, background, source, block_size);
    let bytes = encode_png(&image).context("encode png")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write png: {}", path.display()))?;

    info!(
        path = %path.display(),
        background = %background,
        drawn = stats.drawn,
        skipped = stats.skipped,
        "png exported"
    );
    Ok(stats)
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

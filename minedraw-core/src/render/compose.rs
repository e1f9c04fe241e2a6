//! Layer compositing shared by the live display and PNG export.

use image::imageops;
use image::{Rgba, RgbaImage};
use std::collections::BTreeSet;
use tracing::trace;

use super::assets::TileLookup;
use crate::{Dimensions, Document, TextureRef};

/// Grid line colour of the overlay.
pub const GRID_LINE: Rgba<u8> = Rgba([0xdd, 0xdd, 0xdd, 0xff]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Cells drawn from a ready tile.
    pub drawn: usize,
    /// Occupied cells whose tile was not available.
    pub skipped: usize,
}

/// Every texture referenced by a visible layer.
pub fn visible_textures(document: &Document) -> BTreeSet<&TextureRef> {
    document
        .visible_layers()
        .flat_map(|layer| layer.grid.occupied().map(|(_, _, t)| t))
        .collect()
}

/// Draw all visible layers, bottom to top, over `target`. Empty cells and
/// cells whose tile is not ready are skipped.
pub fn composite<L: TileLookup + ?Sized>(
    target: &mut RgbaImage,
    document: &Document,
    block_size: u32,
    tiles: &L,
) -> CompositeStats {
    let mut stats = CompositeStats::default();
    for layer in document.visible_layers() {
        for (x, y, texture) in layer.grid.occupied() {
            match tiles.tile(texture) {
                Some(tile) => {
                    imageops::overlay(
                        target,
                        tile,
                        i64::from(x * block_size),
                        i64::from(y * block_size),
                    );
                    stats.drawn += 1;
                }
                None => stats.skipped += 1,
            }
        }
        trace!(layer = layer.id, "layer composited");
    }
    stats
}

/// Transparent image with a line on every cell boundary.
pub fn grid_overlay(dimensions: Dimensions, block_size: u32) -> RgbaImage {
    let (w, h) = dimensions.pixel_size(block_size);
    let mut img = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return img;
    }
    for col in 0..=dimensions.width {
        let x = (col * block_size).min(w - 1);
        for y in 0..h {
            img.put_pixel(x, y, GRID_LINE);
        }
    }
    for row in 0..=dimensions.height {
        let y = (row * block_size).min(h - 1);
        for x in 0..w {
            img.put_pixel(x, y, GRID_LINE);
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PaintMode;
    use std::collections::HashMap;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn tiles() -> HashMap<TextureRef, RgbaImage> {
        let mut map = HashMap::new();
        map.insert(TextureRef::new("red.png"), RgbaImage::from_pixel(4, 4, RED));
        map.insert(TextureRef::new("blue.png"), RgbaImage::from_pixel(4, 4, BLUE));
        map
    }

    #[test]
    fn upper_layers_cover_lower_ones() {
        let mut doc = Document::new(Dimensions::new(3, 2));
        doc.select(1).unwrap();
        doc.paint(1, 1, Some(&"red.png".into()), PaintMode::Paint);
        doc.select(3).unwrap();
        doc.paint(1, 1, Some(&"blue.png".into()), PaintMode::Paint);

        let mut img = RgbaImage::new(12, 8);
        let stats = composite(&mut img, &doc, 4, &tiles());
        assert_eq!(stats, CompositeStats { drawn: 2, skipped: 0 });
        assert_eq!(*img.get_pixel(5, 5), BLUE);
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 0]));

        doc.toggle_visibility(3);
        let mut img = RgbaImage::new(12, 8);
        composite(&mut img, &doc, 4, &tiles());
        assert_eq!(*img.get_pixel(5, 5), RED);
    }

    #[test]
    fn unknown_tiles_are_skipped() {
        let mut doc = Document::new(Dimensions::new(2, 2));
        doc.paint(0, 0, Some(&"lava.png".into()), PaintMode::Paint);
        let mut img = RgbaImage::new(8, 8);
        let stats = composite(&mut img, &doc, 4, &tiles());
        assert_eq!(stats.skipped, 1);
        assert_eq!(visible_textures(&doc).len(), 1);
    }

    #[test]
    fn grid_overlay_marks_cell_edges() {
        let img = grid_overlay(Dimensions::new(2, 2), 4);
        assert_eq!(*img.get_pixel(0, 2), GRID_LINE);
        assert_eq!(*img.get_pixel(4, 1), GRID_LINE);
        assert_eq!(*img.get_pixel(7, 1), GRID_LINE);
        assert_eq!(*img.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }
}

//! Frame-driven redraw: repaint the display surface only when something
//! marked it dirty.

use image::{imageops, RgbaImage};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::assets::{AssetCache, TextureSource};
use super::compose::{composite, grid_overlay, visible_textures, CompositeStats};
use crate::{Dimensions, Document};

/// Whether the display surface is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawFlag {
    dirty: bool,
}

impl RedrawFlag {
    pub fn mark(&mut self) {
        self.dirty = true;
    }

    pub fn is_set(&self) -> bool {
        self.dirty
    }

    /// Read and clear.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Owns the display surface and the texture cache feeding it.
pub struct FrameScheduler {
    assets: AssetCache,
    surface: RgbaImage,
    /// Cell-boundary lines drawn over the layers, when shown.
    grid: Option<RgbaImage>,
    dimensions: Dimensions,
    block_size: u32,
    frames: u64,
    last: CompositeStats,
}

impl FrameScheduler {
    pub fn new(source: Arc<dyn TextureSource>, dimensions: Dimensions, block_size: u32) -> Self {
        let (w, h) = dimensions.pixel_size(block_size);
        Self {
            assets: AssetCache::new(source, block_size),
            surface: RgbaImage::new(w, h),
            grid: None,
            dimensions,
            block_size,
            frames: 0,
            last: CompositeStats::default(),
        }
    }

    /// One frame. Finished texture loads re-mark the flag; if it is set the
    /// surface is repainted and the flag cleared. Returns whether a repaint
    /// happened.
    pub fn tick(&mut self, document: &Document, flag: &mut RedrawFlag) -> bool {
        if self.assets.poll() > 0 {
            flag.mark();
        }
        if !flag.take() {
            return false;
        }
        self.repaint(document);
        true
    }

    fn repaint(&mut self, document: &Document) {
        for texture in visible_textures(document) {
            self.assets.request(texture);
        }
        for px in self.surface.pixels_mut() {
            px.0 = [0; 4];
        }
        self.last = composite(&mut self.surface, document, self.block_size, &self.assets);
        if let Some(grid) = &self.grid {
            imageops::overlay(&mut self.surface, grid, 0, 0);
        }
        self.frames += 1;
        debug!(
            frame = self.frames,
            drawn = self.last.drawn,
            skipped = self.last.skipped,
            "repainted"
        );
    }

    /// Tick until every requested texture has resolved and the flag is clear,
    /// waiting at most `timeout` for each batch of loads.
    pub fn settle(&mut self, document: &Document, flag: &mut RedrawFlag, timeout: Duration) {
        self.tick(document, flag);
        while self.assets.pending() > 0 {
            if self.assets.wait_idle(timeout) > 0 {
                flag.mark();
            }
            if !self.tick(document, flag) {
                break;
            }
        }
    }

    /// Show or hide the grid overlay. Returns true when that changed, in which
    /// case the caller should mark the flag.
    pub fn set_grid_visible(&mut self, visible: bool) -> bool {
        if visible == self.grid.is_some() {
            return false;
        }
        self.grid = visible.then(|| grid_overlay(self.dimensions, self.block_size));
        debug!(visible, "grid overlay toggled");
        true
    }

    pub fn grid_visible(&self) -> bool {
        self.grid.is_some()
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Number of repaints so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_stats(&self) -> CompositeStats {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::assets::{AssetState, MemoryTextureSource};
    use crate::render::compose::GRID_LINE;
    use crate::{PaintMode, TextureRef};
    use image::Rgba;

    const GREEN: Rgba<u8> = Rgba([0, 200, 0, 255]);

    fn scheduler() -> FrameScheduler {
        let source =
            MemoryTextureSource::new().with("grass.png", RgbaImage::from_pixel(2, 2, GREEN));
        FrameScheduler::new(Arc::new(source), Dimensions::new(4, 3), 2)
    }

    #[test]
    fn clean_flag_skips_repaint() {
        let mut sched = scheduler();
        let doc = Document::new(Dimensions::new(4, 3));
        let mut flag = RedrawFlag::default();
        assert!(!sched.tick(&doc, &mut flag));
        assert_eq!(sched.frames(), 0);
    }

    #[test]
    fn pending_texture_is_skipped_then_drawn_after_load() {
        let mut sched = scheduler();
        let mut doc = Document::new(Dimensions::new(4, 3));
        let mut flag = RedrawFlag::default();
        doc.paint(1, 1, Some(&"grass.png".into()), PaintMode::Paint);
        flag.mark();

        assert!(sched.tick(&doc, &mut flag));
        assert!(!flag.is_set());
        assert_eq!(sched.last_stats().skipped, 1);

        sched.settle(&doc, &mut flag, Duration::from_secs(5));
        assert_eq!(sched.last_stats().drawn, 1);
        assert_eq!(*sched.surface().get_pixel(2, 2), GREEN);
        assert!(!flag.is_set());
    }

    #[test]
    fn failed_texture_does_not_redirty() {
        let mut sched = scheduler();
        let mut doc = Document::new(Dimensions::new(4, 3));
        let mut flag = RedrawFlag::default();
        let lava = TextureRef::new("lava.png");
        doc.paint(0, 0, Some(&lava), PaintMode::Paint);
        flag.mark();

        sched.settle(&doc, &mut flag, Duration::from_secs(5));
        assert_eq!(sched.assets().state(&lava), AssetState::Failed);
        let frames = sched.frames();
        assert!(!sched.tick(&doc, &mut flag));
        assert_eq!(sched.frames(), frames);
    }

    #[test]
    fn grid_overlay_follows_visibility() {
        let mut sched = scheduler();
        let doc = Document::new(Dimensions::new(4, 3));
        let mut flag = RedrawFlag::default();

        assert!(sched.set_grid_visible(true));
        assert!(!sched.set_grid_visible(true));
        flag.mark();
        sched.tick(&doc, &mut flag);
        assert_eq!(*sched.surface().get_pixel(0, 0), GRID_LINE);
        assert_eq!(*sched.surface().get_pixel(2, 1), GRID_LINE);
        assert_eq!(sched.surface().get_pixel(1, 1).0[3], 0);

        assert!(sched.set_grid_visible(false));
        flag.mark();
        sched.tick(&doc, &mut flag);
        assert!(sched.surface().pixels().all(|px| px.0[3] == 0));
    }

    #[test]
    fn repaint_clears_erased_cells() {
        let mut sched = scheduler();
        let mut doc = Document::new(Dimensions::new(4, 3));
        let mut flag = RedrawFlag::default();
        doc.paint(0, 0, Some(&"grass.png".into()), PaintMode::Paint);
        flag.mark();
        sched.settle(&doc, &mut flag, Duration::from_secs(5));
        assert_eq!(*sched.surface().get_pixel(0, 0), GREEN);

        doc.paint(0, 0, None, PaintMode::Erase);
        flag.mark();
        assert!(sched.tick(&doc, &mut flag));
        assert_eq!(*sched.surface().get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }
}

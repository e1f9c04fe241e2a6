// View over the drawing surface: zoom level and pointer to cell mapping.

use egui::{Pos2, Rect, Vec2};
use minedraw_core::Dimensions;
use tracing::{debug, trace};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;
/// Zoom change per button press.
pub const ZOOM_STEP: f32 = 0.1;
/// Zoom change per pinch event.
pub const PINCH_STEP: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasView {
    pub dimensions: Dimensions,
    pub block_size: u32,
    zoom: f32,
}

impl CanvasView {
    pub fn new(dimensions: Dimensions, block_size: u32) -> Self {
        Self {
            dimensions,
            block_size,
            zoom: 1.0,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Zoom as a whole percentage, the way it is shown to the user.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        debug!(zoom = self.zoom, "zoom changed");
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    /// Apply a pinch gesture. Only the direction of `factor` matters: above 1
    /// zooms in one pinch step, below 1 zooms out.
    pub fn pinch(&mut self, factor: f32) -> f32 {
        if factor > 1.0 {
            self.set_zoom(self.zoom + PINCH_STEP)
        } else if factor < 1.0 {
            self.set_zoom(self.zoom - PINCH_STEP)
        } else {
            self.zoom
        }
    }

    /// Unscaled size of the rasterized surface, in pixels.
    pub fn surface_size(&self) -> Vec2 {
        let (w, h) = self.dimensions.pixel_size(self.block_size);
        Vec2::new(w as f32, h as f32)
    }

    /// On-screen size at the current zoom.
    pub fn display_size(&self) -> Vec2 {
        self.surface_size() * self.zoom
    }

    /// Rectangle the surface occupies when drawn with its top-left at `origin`.
    pub fn display_rect(&self, origin: Pos2) -> Rect {
        Rect::from_min_size(origin, self.display_size())
    }

    /// Map a pointer position to a cell, given the rectangle the surface is
    /// displayed in. The result may lie outside the grid; painting there is a
    /// no-op.
    pub fn cell_at(&self, rect: Rect, pointer: Pos2) -> (i32, i32) {
        let surface = self.surface_size();
        let scale = Vec2::new(
            surface.x / rect.width().max(f32::EPSILON),
            surface.y / rect.height().max(f32::EPSILON),
        );
        let offset = (pointer - rect.min) * scale;
        let block = self.block_size.max(1) as f32;
        let cell = (
            (offset.x / block).floor() as i32,
            (offset.y / block).floor() as i32,
        );
        trace!(x = cell.0, y = cell.1, "pointer mapped to cell");
        cell
    }

    /// Cell under the pointer, only if it lies inside the grid.
    pub fn cell_in_grid(&self, rect: Rect, pointer: Pos2) -> Option<(u32, u32)> {
        let (x, y) = self.cell_at(rect, pointer);
        self.dimensions
            .contains(x, y)
            .then_some((x as u32, y as u32))
    }

    /// Surface-space rectangle covered by a cell.
    pub fn cell_rect(&self, x: u32, y: u32) -> Rect {
        let block = self.block_size as f32;
        Rect::from_min_size(
            Pos2::new(x as f32 * block, y as f32 * block),
            Vec2::splat(block),
        )
    }
}

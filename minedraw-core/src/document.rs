//! The layer stack and the drawing operations over it.
//!
//! Every mutating operation returns whether the document actually changed so
//! the session can mark the display dirty; nothing here renders.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, trace};

use crate::layer::{Layer, LayerId};
use crate::{Dimensions, TextureRef, DEFAULT_ACTIVE_LAYER_ID};

/// How a single `paint` call treats the target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// Write the given texture. Painting with no texture erases.
    Paint,
    /// Clear the cell.
    Erase,
    /// Clear the cell because the current stroke started on the selected texture.
    StrokeDelete,
}

/// An ordered layer stack (bottom to top) plus the layer receiving edits.
///
/// Only serialized directly; reading goes through `io::parse_drawing`, which
/// validates against the expected dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub layers: Vec<Layer>,
    #[serde(rename = "activeLayerId")]
    pub active_layer_id: LayerId,
    #[serde(skip)]
    dimensions: Dimensions,
}

impl Document {
    /// A fresh document with the three default layers, "Principal" active.
    pub fn new(dimensions: Dimensions) -> Self {
        info!(
            width = dimensions.width,
            height = dimensions.height,
            "creating new document"
        );
        Self {
            layers: Layer::defaults(dimensions),
            active_layer_id: DEFAULT_ACTIVE_LAYER_ID,
            dimensions,
        }
    }

    /// Build a document from untrusted layers, checking shape and ids.
    ///
    /// A missing or dangling `active` falls back to the default layer id when
    /// present, otherwise to the top layer.
    pub fn from_layers(
        layers: Vec<Layer>,
        active: Option<LayerId>,
        dimensions: Dimensions,
    ) -> Result<Self, DocumentError> {
        let mut doc = Self {
            layers,
            active_layer_id: active.unwrap_or(DEFAULT_ACTIVE_LAYER_ID),
            dimensions,
        };
        doc.validate()?;
        doc.repair_active_layer();
        Ok(doc)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Check layer ids are unique and every grid matches the document size.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.layers.is_empty() {
            return Err(DocumentError::Empty);
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                return Err(DocumentError::DuplicateLayerId { id: layer.id });
            }
            let found = layer.grid.dimensions();
            if found != Some(self.dimensions) {
                return Err(DocumentError::DimensionMismatch {
                    id: layer.id,
                    expected: self.dimensions,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Point the active id back at an existing layer if it dangles.
    pub fn repair_active_layer(&mut self) {
        if self.layer(self.active_layer_id).is_some() {
            return;
        }
        let fallback = if self.layer(DEFAULT_ACTIVE_LAYER_ID).is_some() {
            Some(DEFAULT_ACTIVE_LAYER_ID)
        } else {
            self.layers.last().map(|l| l.id)
        };
        if let Some(id) = fallback {
            debug!(
                from = self.active_layer_id,
                to = id,
                "active layer missing, falling back"
            );
            self.active_layer_id = id;
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layer(self.active_layer_id)
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        let id = self.active_layer_id;
        self.layer_mut(id)
    }

    /// Content of the active layer at a cell.
    pub fn cell(&self, x: i32, y: i32) -> Option<&TextureRef> {
        if !self.dimensions.contains(x, y) {
            return None;
        }
        self.active_layer()
            .and_then(|layer| layer.grid.get(x as u32, y as u32))
    }

    /// Write one cell of the active layer.
    ///
    /// Out-of-bounds coordinates are ignored. Returns true only when the cell
    /// value actually changed.
    pub fn paint(
        &mut self,
        x: i32,
        y: i32,
        texture: Option<&TextureRef>,
        mode: PaintMode,
    ) -> bool {
        if !self.dimensions.contains(x, y) {
            trace!(x, y, "paint outside grid ignored");
            return false;
        }
        let value = match mode {
            PaintMode::Paint => texture.cloned(),
            PaintMode::Erase | PaintMode::StrokeDelete => None,
        };
        match self.active_layer_mut() {
            Some(layer) => layer.grid.set(x as u32, y as u32, value),
            None => false,
        }
    }

    /// Empty every cell of the active layer. Returns true if anything changed.
    pub fn clear_active_layer(&mut self) -> bool {
        let Some(layer) = self.active_layer_mut() else {
            return false;
        };
        let changed = layer.grid.fill(None);
        info!(layer = layer.id, cells = changed, "cleared layer");
        changed > 0
    }

    /// Write `texture` to every cell of the active layer.
    pub fn fill_active_layer(&mut self, texture: &TextureRef) -> bool {
        let Some(layer) = self.active_layer_mut() else {
            return false;
        };
        let changed = layer.grid.fill(Some(texture));
        info!(layer = layer.id, texture = %texture, cells = changed, "filled layer");
        changed > 0
    }

    /// Change which layer receives edits. Does not affect rendering order.
    pub fn select(&mut self, id: LayerId) -> Result<(), DocumentError> {
        if self.layer(id).is_none() {
            return Err(DocumentError::UnknownLayer { id });
        }
        debug!(layer = id, "selected layer");
        self.active_layer_id = id;
        Ok(())
    }

    /// Flip a layer's visibility. Returns the new state, or `None` for an unknown id.
    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<bool> {
        let layer = self.layer_mut(id)?;
        layer.visible = !layer.visible;
        debug!(layer = id, visible = layer.visible, "toggled layer visibility");
        Some(layer.visible)
    }

    /// Swap a layer with the one above it. No-op for the top layer.
    pub fn move_up(&mut self, id: LayerId) -> bool {
        match self.position(id) {
            Some(index) if index + 1 < self.layers.len() => {
                self.layers.swap(index, index + 1);
                debug!(layer = id, to = index + 1, "moved layer up");
                true
            }
            _ => false,
        }
    }

    /// Swap a layer with the one below it. No-op for the bottom layer.
    pub fn move_down(&mut self, id: LayerId) -> bool {
        match self.position(id) {
            Some(index) if index > 0 => {
                self.layers.swap(index, index - 1);
                debug!(layer = id, to = index - 1, "moved layer down");
                true
            }
            _ => false,
        }
    }

    /// Topmost visible content at a cell, scanning layers top to bottom.
    pub fn pick(&self, x: i32, y: i32) -> Option<&TextureRef> {
        if !self.dimensions.contains(x, y) {
            return None;
        }
        self.layers
            .iter()
            .rev()
            .filter(|layer| layer.visible)
            .find_map(|layer| layer.grid.get(x as u32, y as u32))
    }

    /// Layers in paint order, skipping hidden ones.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|layer| layer.visible)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Dimensions::default())
    }
}

/// Errors from building or editing a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document has no layers")]
    Empty,

    #[error("duplicate layer id: {id}")]
    DuplicateLayerId { id: LayerId },

    #[error("unknown layer id: {id}")]
    UnknownLayer { id: LayerId },

    #[error("layer {id} has grid {found:?}, expected {expected:?}")]
    DimensionMismatch {
        id: LayerId,
        expected: Dimensions,
        found: Option<Dimensions>,
    },
}

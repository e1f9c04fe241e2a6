//! Layers and their cell grids.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Dimensions, TextureRef};

/// Stable identifier of a layer within a document.
pub type LayerId = u32;

/// Row-major matrix of cells; `rows[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<Option<TextureRef>>>,
}

impl Grid {
    pub fn empty(dims: Dimensions) -> Self {
        Self {
            rows: vec![vec![None; dims.width as usize]; dims.height as usize],
        }
    }

    /// Shape of the grid, or `None` when rows have differing lengths.
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.rows.first().map_or(0, Vec::len);
        if self.rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Dimensions::new(width as u32, self.rows.len() as u32))
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&TextureRef> {
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .and_then(Option::as_ref)
    }

    /// Write a cell. Returns true if the stored value changed.
    pub fn set(&mut self, x: u32, y: u32, value: Option<TextureRef>) -> bool {
        let Some(cell) = self
            .rows
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        else {
            return false;
        };
        if *cell == value {
            return false;
        }
        trace!(x, y, value = ?value, "cell written");
        *cell = value;
        true
    }

    /// Set every cell to `value`. Returns the number of cells that changed.
    pub fn fill(&mut self, value: Option<&TextureRef>) -> usize {
        let mut changed = 0;
        for cell in self.rows.iter_mut().flatten() {
            if cell.as_ref() != value {
                *cell = value.cloned();
                changed += 1;
            }
        }
        changed
    }

    /// Iterate occupied cells as `(x, y, texture)`, row by row.
    pub fn occupied(&self) -> impl Iterator<Item = (u32, u32, &TextureRef)> {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, cell)| cell.as_ref().map(|t| (x as u32, y as u32, t)))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.occupied().next().is_none()
    }
}

/// One independently toggleable grid, composited in stack order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    #[serde(rename = "gridData")]
    pub grid: Grid,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, dims: Dimensions) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            grid: Grid::empty(dims),
        }
    }

    /// The three layers every fresh document starts with, bottom to top.
    pub fn defaults(dims: Dimensions) -> Vec<Layer> {
        vec![
            Layer::new(1, "Arrière-plan", dims),
            Layer::new(2, "Principal", dims),
            Layer::new(3, "Détails", dims),
        ]
    }
}

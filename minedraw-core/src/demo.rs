//! A small landscape used as a sample drawing: ground, a tree, a house and
//! some flowers, spread across the three default layers.

use crate::layer::Grid;
use crate::{Dimensions, Document, TextureRef};

const DIRT: &str = "textures/block/dirt.png";
const GRASS_TOP: &str = "textures/block/grass_block_top.png";
const COBBLESTONE: &str = "textures/block/cobblestone.png";
const OAK_LOG: &str = "textures/block/oak_log.png";
const OAK_LEAVES: &str = "textures/block/oak_leaves.png";
const OAK_PLANKS: &str = "textures/block/oak_planks.png";
const DANDELION: &str = "textures/block/dandelion.png";
const POPPY: &str = "textures/block/poppy.png";
const GRASS: &str = "textures/block/grass.png";

/// Row where the grass surface sits on the default 50 x 30 grid.
const GROUND_LEVEL: i32 = 22;

fn put(grid: &mut Grid, x: i32, y: i32, texture: &str) {
    if x >= 0 && y >= 0 {
        grid.set(x as u32, y as u32, Some(TextureRef::new(texture)));
    }
}

fn clear(grid: &mut Grid, x: i32, y: i32) {
    if x >= 0 && y >= 0 {
        grid.set(x as u32, y as u32, None);
    }
}

/// Build the sample drawing. Cells that fall outside smaller grids are dropped.
pub fn demo_document(dimensions: Dimensions) -> Document {
    let mut doc = Document::new(dimensions);
    let width = dimensions.width as i32;
    let height = dimensions.height as i32;

    let mut background = Grid::empty(dimensions);
    let mut main = Grid::empty(dimensions);
    let mut details = Grid::empty(dimensions);

    // Background: two cobblestone clouds.
    for (x, y) in [(10, 5), (11, 5), (12, 5), (9, 6), (13, 6)] {
        put(&mut background, x, y, COBBLESTONE);
    }
    for (x, y) in [(35, 8), (36, 8), (34, 9), (37, 9)] {
        put(&mut background, x, y, COBBLESTONE);
    }

    // Main: dirt below a grass surface.
    let ground = &mut main;
    for y in GROUND_LEVEL + 1..height {
        for x in 0..width {
            put(ground, x, y, DIRT);
        }
    }
    for x in 0..width {
        put(ground, x, GROUND_LEVEL, GRASS_TOP);
    }

    // Tree: four logs topped by a 5 x 3 canopy.
    let tree_x = 15;
    for dy in 1..=4 {
        put(ground, tree_x, GROUND_LEVEL - dy, OAK_LOG);
    }
    for dy in -6..=-4 {
        for dx in -2..=2 {
            put(ground, tree_x + dx, GROUND_LEVEL + dy, OAK_LEAVES);
        }
    }

    // House: plank floor and walls, a door, two windows, stepped log roof.
    let house_x = 30;
    for x in 1..8 {
        put(ground, house_x + x, GROUND_LEVEL, OAK_PLANKS);
    }
    for y in 1..=4 {
        put(ground, house_x + 1, GROUND_LEVEL - y, OAK_PLANKS);
        put(ground, house_x + 7, GROUND_LEVEL - y, OAK_PLANKS);
    }
    for x in 2..=6 {
        put(ground, house_x + x, GROUND_LEVEL - 4, OAK_PLANKS);
    }
    clear(ground, house_x + 4, GROUND_LEVEL - 1);
    clear(ground, house_x + 4, GROUND_LEVEL - 2);
    put(ground, house_x + 2, GROUND_LEVEL - 2, COBBLESTONE);
    put(ground, house_x + 6, GROUND_LEVEL - 2, COBBLESTONE);
    for (step, (from, to)) in [(0, 9), (1, 8), (2, 7), (3, 6), (4, 5)].into_iter().enumerate() {
        for x in from..to {
            put(ground, house_x + x, GROUND_LEVEL - 5 - step as i32, OAK_LOG);
        }
    }

    // Details: flowers on the grass.
    let flowers = [
        (5, DANDELION),
        (8, POPPY),
        (12, DANDELION),
        (20, GRASS),
        (22, POPPY),
        (25, DANDELION),
        (40, GRASS),
        (43, POPPY),
        (45, DANDELION),
    ];
    for (x, texture) in flowers {
        put(&mut details, x, GROUND_LEVEL - 1, texture);
    }

    for (layer, grid) in doc.layers.iter_mut().zip([background, main, details]) {
        layer.grid = grid;
    }
    doc
}

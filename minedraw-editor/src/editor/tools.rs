// Drawing tools for the grid editor.

use minedraw_core::{Document, PaintMode, TextureRef};
use tracing::{debug, trace};

pub trait Tool {
    /// Apply the tool to one cell of the active layer. Returns true if the
    /// cell changed.
    fn apply(&self, document: &mut Document, x: i32, y: i32) -> bool;

    fn name(&self) -> &str;

    fn mode(&self) -> PaintMode;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brush {
    pub texture: TextureRef,
}

impl Brush {
    pub fn new(texture: TextureRef) -> Self {
        Self { texture }
    }
}

impl Tool for Brush {
    fn apply(&self, document: &mut Document, x: i32, y: i32) -> bool {
        trace!(x, y, texture = %self.texture, "brush");
        document.paint(x, y, Some(&self.texture), PaintMode::Paint)
    }

    fn name(&self) -> &str {
        "Brush"
    }

    fn mode(&self) -> PaintMode {
        PaintMode::Paint
    }
}

/// Clears cells. `stroke_delete` marks an eraser that came from painting over
/// the selected texture rather than from erase mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Eraser {
    pub stroke_delete: bool,
}

impl Eraser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stroke_delete() -> Self {
        Self {
            stroke_delete: true,
        }
    }
}

impl Tool for Eraser {
    fn apply(&self, document: &mut Document, x: i32, y: i32) -> bool {
        trace!(x, y, stroke_delete = self.stroke_delete, "eraser");
        document.paint(x, y, None, self.mode())
    }

    fn name(&self) -> &str {
        "Eraser"
    }

    fn mode(&self) -> PaintMode {
        if self.stroke_delete {
            PaintMode::StrokeDelete
        } else {
            PaintMode::Erase
        }
    }
}

/// What the user currently has in hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolState {
    pub selected: Option<TextureRef>,
    pub erasing: bool,
}

impl ToolState {
    /// Selecting a texture always leaves erase mode.
    pub fn select(&mut self, texture: TextureRef) {
        debug!(texture = %texture, "texture selected");
        self.selected = Some(texture);
        self.erasing = false;
    }

    pub fn toggle_erasing(&mut self) -> bool {
        self.erasing = !self.erasing;
        debug!(erasing = self.erasing, "erase mode toggled");
        self.erasing
    }

    /// Preview is only shown for a selected texture outside erase mode.
    pub fn preview_texture(&self) -> Option<&TextureRef> {
        match (&self.selected, self.erasing) {
            (Some(texture), false) => Some(texture),
            _ => None,
        }
    }
}

/// One pointer-down to pointer-up interval. The tool is fixed when the stroke
/// begins and used for every cell it visits.
pub struct Stroke {
    tool: Box<dyn Tool>,
    changed: usize,
}

impl Stroke {
    /// Classify a stroke starting at `(x, y)`:
    /// erase mode or no texture erases; landing on a cell of the active layer
    /// that already holds the selected texture deletes for the whole stroke;
    /// anything else paints.
    pub fn begin(document: &Document, tools: &ToolState, x: i32, y: i32) -> Self {
        let tool: Box<dyn Tool> = match (&tools.selected, tools.erasing) {
            (Some(texture), false) if document.cell(x, y) == Some(texture) => {
                Box::new(Eraser::stroke_delete())
            }
            (Some(texture), false) => Box::new(Brush::new(texture.clone())),
            _ => Box::new(Eraser::new()),
        };
        debug!(x, y, tool = tool.name(), mode = ?tool.mode(), "stroke started");
        Self { tool, changed: 0 }
    }

    /// Apply the stroke's tool at a cell.
    pub fn visit(&mut self, document: &mut Document, x: i32, y: i32) -> bool {
        let changed = self.tool.apply(document, x, y);
        if changed {
            self.changed += 1;
        }
        changed
    }

    pub fn mode(&self) -> PaintMode {
        self.tool.mode()
    }

    pub fn tool_name(&self) -> &str {
        self.tool.name()
    }

    /// Cells changed so far.
    pub fn changed(&self) -> usize {
        self.changed
    }
}

impl std::fmt::Debug for Stroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stroke")
            .field("tool", &self.tool.name())
            .field("mode", &self.tool.mode())
            .field("changed", &self.changed)
            .finish()
    }
}

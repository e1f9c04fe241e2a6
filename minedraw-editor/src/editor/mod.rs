// Editor module for MineDraw.

pub mod canvas;
pub mod history;
pub mod input;
pub mod session;
pub mod tools;

pub use canvas::CanvasView;
pub use history::History;
pub use input::{Action, Input};
pub use session::{EditError, Session};
pub use tools::{Brush, Eraser, Stroke, Tool, ToolState};

//! minedraw-editor: interactive editing on top of `minedraw-core`.
//!
//! [`Session`] owns the document and routes pointer and keyboard input to
//! strokes, undo/redo, layer operations and autosave.

pub mod editor;

pub use editor::{Action, CanvasView, EditError, History, Input, Session, Stroke, ToolState};

//! Rasterizing documents: backgrounds, the texture cache, the redraw
//! scheduler and PNG export.

pub mod assets;
pub mod background;
pub mod compose;
pub mod export;
pub mod scheduler;

pub use assets::{
    AssetCache, AssetError, AssetState, FsTextureSource, MemoryTextureSource, TextureSource,
    TileLookup,
};
pub use background::BackgroundPreset;
pub use compose::{composite, grid_overlay, CompositeStats};
pub use export::{encode_png, export_png, render_document, RenderError};
pub use scheduler::{FrameScheduler, RedrawFlag};

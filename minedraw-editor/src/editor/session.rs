//! The editing session: one document plus everything that acts on it.
//!
//! Every mutation goes through [`Session`], which takes history snapshots,
//! marks the redraw flag and autosaves to the key-value store. Storage
//! failures are logged and never roll back the in-memory document.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use minedraw_core::io::{self as drawing_io, export_filename, ImportError};
use minedraw_core::render::{self, BackgroundPreset, FrameScheduler, RedrawFlag, TextureSource};
use minedraw_core::storage::{self, Preferences};
use minedraw_core::{
    Document, DocumentError, EditorConfig, FileStore, KeyValueStore, LayerId, MemoryStore,
    PaintMode, TextureRef,
};

use super::canvas::CanvasView;
use super::history::History;
use super::input::{self, Action, Input};
use super::tools::{Stroke, ToolState};

pub struct Session {
    document: Document,
    history: History,
    tools: ToolState,
    stroke: Option<Stroke>,
    preview: Option<(u32, u32)>,
    redraw: RedrawFlag,
    redraw_requests: u64,
    store: Box<dyn KeyValueStore>,
    preferences: Preferences,
    view: CanvasView,
    config: EditorConfig,
}

impl Session {
    /// Start a session on `store`, restoring the autosaved document and view
    /// preferences when present. A corrupt autosave is logged and replaced by
    /// a fresh document.
    pub fn open(config: EditorConfig, store: Box<dyn KeyValueStore>) -> Self {
        let dimensions = config.dimensions();
        let document = match storage::load_document(store.as_ref(), dimensions) {
            Ok(Some(document)) => {
                info!(layers = document.layers.len(), "restored autosaved drawing");
                document
            }
            Ok(None) => Document::new(dimensions),
            Err(e) => {
                error!(error = %e, "error loading autosaved drawing");
                Document::new(dimensions)
            }
        };
        let preferences = Preferences::load(
            store.as_ref(),
            Preferences {
                background: config.background,
                show_grid: config.show_grid,
            },
        );

        let mut redraw = RedrawFlag::default();
        redraw.mark();
        Self {
            document,
            history: History::new(config.history_depth),
            tools: ToolState::default(),
            stroke: None,
            preview: None,
            redraw,
            redraw_requests: 1,
            store,
            preferences,
            view: CanvasView::new(dimensions, config.block_size),
            config,
        }
    }

    /// Open with a file-backed store in the configured storage directory.
    pub fn open_with_file_store(config: EditorConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid editor config")?;
        let store: Box<dyn KeyValueStore> = match config.storage_dir() {
            Some(dir) => {
                fs::create_dir_all(&dir)
                    .with_context(|| format!("create storage dir: {}", dir.display()))?;
                debug!(dir = %dir.display(), "using file store");
                Box::new(FileStore::new(dir))
            }
            None => {
                warn!("no data directory available, drawing will not be persisted");
                Box::new(MemoryStore::new())
            }
        };
        Ok(Self::open(config, store))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CanvasView {
        &mut self.view
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw.is_set()
    }

    /// How many times the display has been marked stale since the session
    /// opened, including the initial paint.
    pub fn redraw_requests(&self) -> u64 {
        self.redraw_requests
    }

    /// Cell and texture to ghost under the pointer while not drawing.
    pub fn preview(&self) -> Option<(u32, u32, &TextureRef)> {
        let (x, y) = self.preview?;
        let texture = self.tools.preview_texture()?;
        Some((x, y, texture))
    }

    fn mark_dirty(&mut self) {
        self.redraw.mark();
        self.redraw_requests += 1;
    }

    fn persist(&mut self) {
        if let Err(e) = storage::save_document(self.store.as_mut(), &self.document) {
            error!(error = %e, "error saving drawing");
        }
    }

    /// Run one frame of the redraw loop, with the grid overlay following the
    /// show-grid preference. Returns whether the surface was repainted.
    pub fn frame(&mut self, scheduler: &mut FrameScheduler) -> bool {
        if scheduler.set_grid_visible(self.preferences.show_grid) {
            self.redraw.mark();
        }
        scheduler.tick(&self.document, &mut self.redraw)
    }

    /// Write one cell of the active layer directly, outside any stroke.
    pub fn paint(
        &mut self,
        x: i32,
        y: i32,
        texture: Option<&TextureRef>,
        mode: PaintMode,
    ) -> bool {
        let changed = self.document.paint(x, y, texture, mode);
        if changed {
            self.mark_dirty();
        }
        changed
    }

    pub fn select_texture(&mut self, texture: TextureRef) {
        self.tools.select(texture);
    }

    pub fn toggle_eraser(&mut self) -> bool {
        self.tools.toggle_erasing()
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        self.history.snapshot(&self.document);
        self.preview = None;

        let mut stroke = Stroke::begin(&self.document, &self.tools, x, y);
        if stroke.visit(&mut self.document, x, y) {
            self.mark_dirty();
        }
        self.stroke = Some(stroke);
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        let changed = match self.stroke.as_mut() {
            Some(stroke) => stroke.visit(&mut self.document, x, y),
            None => {
                self.preview = self
                    .view
                    .dimensions
                    .contains(x, y)
                    .then_some((x as u32, y as u32));
                false
            }
        };
        if changed {
            self.mark_dirty();
        }
    }

    /// End the stroke, if any, and autosave.
    pub fn pointer_up(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            debug!(tool = stroke.tool_name(), changed = stroke.changed(), "stroke finished");
        }
        self.persist();
    }

    /// Pointer left the canvas: same as releasing, and the preview goes away.
    pub fn pointer_leave(&mut self) {
        self.preview = None;
        self.pointer_up();
    }

    /// Take the topmost visible texture at a cell into the hand. An empty cell
    /// switches to erase mode; a cell outside the grid does nothing.
    pub fn eyedropper(&mut self, x: i32, y: i32) {
        if !self.document.dimensions().contains(x, y) {
            return;
        }
        match self.document.pick(x, y).cloned() {
            Some(texture) => {
                info!(x, y, texture = %texture, "picked texture");
                self.tools.select(texture);
            }
            None => {
                debug!(x, y, "picked empty cell, switching to eraser");
                self.tools.erasing = true;
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.document) {
            return false;
        }
        self.mark_dirty();
        self.persist();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.document) {
            return false;
        }
        self.mark_dirty();
        self.persist();
        true
    }

    /// Empty the active layer. Undoable.
    pub fn clear_layer(&mut self) -> bool {
        self.history.snapshot(&self.document);
        let changed = self.document.clear_active_layer();
        self.mark_dirty();
        self.persist();
        changed
    }

    /// Cover the active layer with the selected texture, or empty it while
    /// erase mode is on. Needs a selected texture either way. Undoable.
    pub fn fill_layer(&mut self) -> Result<bool, EditError> {
        let texture = self
            .tools
            .selected
            .clone()
            .ok_or(EditError::NoTextureSelected)?;
        self.history.snapshot(&self.document);
        let changed = if self.tools.erasing {
            self.document.clear_active_layer()
        } else {
            self.document.fill_active_layer(&texture)
        };
        self.mark_dirty();
        self.persist();
        Ok(changed)
    }

    pub fn select_layer(&mut self, id: LayerId) -> Result<(), EditError> {
        self.document.select(id)?;
        Ok(())
    }

    pub fn toggle_layer_visibility(&mut self, id: LayerId) -> Result<bool, EditError> {
        let visible = self
            .document
            .toggle_visibility(id)
            .ok_or(DocumentError::UnknownLayer { id })?;
        self.mark_dirty();
        self.persist();
        Ok(visible)
    }

    pub fn move_layer_up(&mut self, id: LayerId) -> bool {
        let moved = self.document.move_up(id);
        if moved {
            self.mark_dirty();
            self.persist();
        }
        moved
    }

    pub fn move_layer_down(&mut self, id: LayerId) -> bool {
        let moved = self.document.move_down(id);
        if moved {
            self.mark_dirty();
            self.persist();
        }
        moved
    }

    pub fn set_background(&mut self, background: BackgroundPreset) {
        self.preferences.background = background;
        if let Err(e) = Preferences::save_background(self.store.as_mut(), background) {
            error!(error = %e, "error saving background preference");
        }
        info!(background = %background, "background changed");
        self.mark_dirty();
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.preferences.show_grid = !self.preferences.show_grid;
        if let Err(e) = Preferences::save_show_grid(self.store.as_mut(), self.preferences.show_grid)
        {
            error!(error = %e, "error saving grid preference");
        }
        self.mark_dirty();
        self.preferences.show_grid
    }

    /// Replace the document with an imported drawing. On failure the current
    /// document is left untouched. Undoable.
    pub fn import_json(&mut self, text: &str) -> Result<(), ImportError> {
        let imported = drawing_io::parse_drawing(text, self.document.dimensions())?;
        self.history.snapshot(&self.document);
        info!(
            layers = imported.layers.len(),
            active = imported.active_layer_id,
            "drawing imported"
        );
        self.document = imported;
        self.mark_dirty();
        self.persist();
        Ok(())
    }

    pub fn import_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read drawing: {}", path.display()))?;
        self.import_json(&text)
            .with_context(|| format!("import drawing: {}", path.display()))
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        drawing_io::to_json(&self.document)
    }

    /// Write the drawing as `minedraw-<millis>.json` into `dir`.
    pub fn export_json_to(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let path = dir.as_ref().join(export_filename(drawing_io::DRAWING_FILE_EXT));
        drawing_io::save_drawing(&path, &self.document)?;
        Ok(path)
    }

    /// Render background and visible layers to `minedraw-<millis>.png` in `dir`.
    pub fn export_png_to(
        &self,
        dir: impl AsRef<Path>,
        source: &dyn TextureSource,
    ) -> anyhow::Result<PathBuf> {
        let path = dir.as_ref().join(export_filename("png"));
        render::export_png(
            &path,
            &self.document,
            self.preferences.background,
            source,
            self.config.block_size,
        )?;
        Ok(path)
    }

    /// Apply one mapped input. Actions the session cannot perform itself
    /// (PNG export needs a destination) are handed back to the caller.
    pub fn handle(&mut self, input: Input) -> Option<Action> {
        match input {
            Input::Down { x, y } => self.pointer_down(x, y),
            Input::Move { x, y } => self.pointer_move(x, y),
            Input::Up => {
                if self.is_drawing() {
                    self.pointer_up();
                }
            }
            Input::Leave => {
                if self.is_drawing() || self.preview.is_some() {
                    self.pointer_leave();
                }
            }
            Input::Pick { x, y } => self.eyedropper(x, y),
            Input::Zoom(factor) => {
                self.view.pinch(factor);
            }
            Input::Action(Action::Undo) => {
                self.undo();
            }
            Input::Action(Action::Redo) => {
                self.redo();
            }
            Input::Action(Action::ToggleEraser) => {
                self.toggle_eraser();
            }
            Input::Action(action @ Action::ExportPng) => return Some(action),
        }
        None
    }

    /// Map and apply a raw egui event. `rect` is where the surface is displayed.
    pub fn handle_event(&mut self, event: &egui::Event, rect: egui::Rect) -> Option<Action> {
        let input = input::translate(event, &self.view, rect)?;
        self.handle(input)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no texture selected")]
    NoTextureSelected,
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use minedraw_core::storage::{BACKGROUND_KEY, LAYERS_KEY, SHOW_GRID_KEY};
    use minedraw_core::StoreError;

    fn tex(name: &str) -> TextureRef {
        TextureRef::new(format!("textures/block/{name}.png"))
    }

    fn session() -> Session {
        Session::open(EditorConfig::default(), Box::new(MemoryStore::new()))
    }

    /// Store whose writes always fail.
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, value: &str) -> Result<(), StoreError> {
            Err(StoreError::QuotaExceeded {
                needed: value.len(),
                quota: 0,
            })
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn repeated_paint_marks_redraw_once() {
        let mut s = session();
        let start = s.redraw_requests();
        assert!(s.paint(5, 5, Some(&tex("dirt")), PaintMode::Paint));
        assert!(!s.paint(5, 5, Some(&tex("dirt")), PaintMode::Paint));
        assert_eq!(s.redraw_requests(), start + 1);
    }

    #[test]
    fn stroke_paints_and_autosaves_on_release() {
        let mut s = session();
        s.select_texture(tex("stone"));
        s.pointer_down(1, 1);
        s.pointer_move(2, 1);
        s.pointer_move(3, 1);
        assert!(s.store().get(LAYERS_KEY).unwrap().is_none());
        s.pointer_up();

        assert!(!s.is_drawing());
        assert_eq!(s.document().cell(3, 1), Some(&tex("stone")));
        assert_eq!(s.history().undo_len(), 1);
        let saved = s.store().get(LAYERS_KEY).unwrap().unwrap();
        assert!(saved.contains("textures/block/stone.png"));
    }

    #[test]
    fn stroke_delete_over_mixed_cells() {
        let mut s = session();
        s.select_texture(tex("dirt"));
        s.paint(0, 0, Some(&tex("stone")), PaintMode::Paint);
        s.paint(1, 0, Some(&tex("dirt")), PaintMode::Paint);

        s.pointer_down(1, 0);
        s.pointer_move(0, 0);
        s.pointer_leave();

        assert_eq!(s.document().cell(0, 0), None);
        assert_eq!(s.document().cell(1, 0), None);
    }

    #[test]
    fn undo_reverts_whole_stroke() {
        let mut s = session();
        let before = s.document().clone();
        s.select_texture(tex("stone"));
        s.pointer_down(0, 0);
        for x in 1..10 {
            s.pointer_move(x, 0);
        }
        s.pointer_up();

        assert!(s.undo());
        assert_eq!(s.document(), &before);
        assert!(s.redo());
        assert_eq!(s.document().cell(9, 0), Some(&tex("stone")));
    }

    #[test]
    fn eyedropper_picks_topmost_visible() {
        let mut s = session();
        s.select_layer(1).unwrap();
        s.paint(4, 4, Some(&tex("dirt")), PaintMode::Paint);
        s.select_layer(3).unwrap();
        s.paint(4, 4, Some(&tex("poppy")), PaintMode::Paint);

        s.eyedropper(4, 4);
        assert_eq!(s.tools().selected, Some(tex("poppy")));

        s.toggle_layer_visibility(3).unwrap();
        s.toggle_eraser();
        s.eyedropper(4, 4);
        assert_eq!(s.tools().selected, Some(tex("dirt")));
        assert!(!s.tools().erasing);

        s.eyedropper(0, 0);
        assert!(s.tools().erasing);

        s.tools.erasing = false;
        s.eyedropper(-3, 100);
        assert!(!s.tools().erasing);
    }

    #[test]
    fn layer_order_and_visibility_skip_history() {
        let mut s = session();
        assert!(s.move_layer_up(1));
        assert!(!s.move_layer_up(3));
        assert_eq!(s.toggle_layer_visibility(2).unwrap(), false);
        assert!(s.toggle_layer_visibility(42).is_err());
        assert_eq!(s.history().undo_len(), 0);

        let ids: Vec<_> = s.document().layers.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(s.store().get(LAYERS_KEY).unwrap().is_some());
    }

    #[test]
    fn fill_needs_a_texture() {
        let mut s = session();
        assert!(matches!(s.fill_layer(), Err(EditError::NoTextureSelected)));
        assert_eq!(s.history().undo_len(), 0);

        s.select_texture(tex("sand"));
        assert!(s.fill_layer().unwrap());
        assert!(s.document().active_layer().unwrap().grid.occupied().count() == 1500);

        assert!(s.clear_layer());
        assert!(s.document().active_layer().unwrap().grid.is_empty());
        s.undo();
        assert_eq!(s.document().cell(49, 29), Some(&tex("sand")));
    }

    #[test]
    fn fill_in_erase_mode_empties_layer() {
        let mut s = session();
        s.select_texture(tex("sand"));
        s.fill_layer().unwrap();

        s.toggle_eraser();
        assert!(s.fill_layer().unwrap());
        assert!(s.document().active_layer().unwrap().grid.is_empty());
        assert_eq!(s.tools().selected, Some(tex("sand")));

        s.undo();
        assert_eq!(s.document().cell(0, 0), Some(&tex("sand")));
    }

    #[test]
    fn undo_restores_active_layer_selection() {
        let mut s = session();
        s.select_layer(3).unwrap();
        s.select_texture(tex("stone"));
        s.pointer_down(0, 0);
        s.pointer_up();
        let before = s.document().clone();

        s.clear_layer();
        s.select_layer(1).unwrap();
        s.undo();
        assert_eq!(s.document(), &before);
        assert_eq!(s.document().active_layer_id, 3);
    }

    #[test]
    fn grid_preference_drives_overlay() {
        use image::Rgba;
        use minedraw_core::render::compose::GRID_LINE;
        use minedraw_core::render::MemoryTextureSource;
        use std::sync::Arc;

        let config = EditorConfig {
            grid_width: 4,
            grid_height: 3,
            block_size: 2,
            ..EditorConfig::default()
        };
        let mut s = Session::open(config.clone(), Box::new(MemoryStore::new()));
        let mut scheduler = FrameScheduler::new(
            Arc::new(MemoryTextureSource::new()),
            config.dimensions(),
            config.block_size,
        );

        assert!(s.preferences().show_grid);
        assert!(s.frame(&mut scheduler));
        assert_eq!(*scheduler.surface().get_pixel(0, 0), GRID_LINE);
        assert_eq!(*scheduler.surface().get_pixel(2, 1), GRID_LINE);

        s.toggle_grid();
        assert!(s.frame(&mut scheduler));
        assert!(scheduler
            .surface()
            .pixels()
            .all(|px| *px == Rgba([0, 0, 0, 0])));

        s.toggle_grid();
        assert!(s.frame(&mut scheduler));
        assert_eq!(*scheduler.surface().get_pixel(0, 0), GRID_LINE);
    }

    #[test]
    fn import_replaces_document_and_is_undoable() {
        let mut s = session();
        s.paint(0, 0, Some(&tex("dirt")), PaintMode::Paint);
        let before = s.document().clone();

        let mut other = Document::default();
        other.paint(7, 7, Some(&tex("glass")), PaintMode::Paint);
        other.select(3).unwrap();
        let json = drawing_io::to_json(&other).unwrap();

        s.import_json(&json).unwrap();
        assert_eq!(s.document(), &other);
        assert_eq!(s.document().active_layer_id, 3);

        assert!(s.undo());
        assert_eq!(s.document(), &before);
        assert_eq!(s.document().active_layer_id, 2);

        assert!(s.redo());
        assert_eq!(s.document(), &other);
    }

    #[test]
    fn bad_import_leaves_document_untouched() {
        let mut s = session();
        s.paint(0, 0, Some(&tex("dirt")), PaintMode::Paint);
        let before = s.document().clone();

        assert!(matches!(
            s.import_json(r#"{"activeLayerId": 2}"#),
            Err(ImportError::MissingLayers)
        ));
        assert!(s.import_json("not json").is_err());
        assert_eq!(s.document(), &before);
        assert_eq!(s.history().undo_len(), 0);
    }

    #[test]
    fn preferences_are_persisted() {
        let mut s = session();
        s.set_background(BackgroundPreset::NightStars);
        assert!(!s.toggle_grid());
        assert_eq!(
            s.store().get(BACKGROUND_KEY).unwrap().as_deref(),
            Some("night-stars")
        );
        assert_eq!(s.store().get(SHOW_GRID_KEY).unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn storage_failure_keeps_editing() {
        let mut s = Session::open(EditorConfig::default(), Box::new(FullStore));
        s.select_texture(tex("stone"));
        s.pointer_down(2, 2);
        s.pointer_up();
        assert_eq!(s.document().cell(2, 2), Some(&tex("stone")));
    }

    #[test]
    fn preview_follows_pointer_when_idle() {
        let mut s = session();
        s.pointer_move(3, 3);
        assert!(s.preview().is_none());

        s.select_texture(tex("stone"));
        s.pointer_move(3, 3);
        assert_eq!(s.preview(), Some((3, 3, &tex("stone"))));
        s.pointer_move(60, 3);
        assert!(s.preview().is_none());

        s.pointer_move(1, 1);
        s.pointer_down(1, 1);
        assert!(s.preview().is_none());
    }

    #[test]
    fn keyboard_actions() {
        let mut s = session();
        s.select_texture(tex("stone"));
        s.pointer_down(0, 0);
        s.pointer_up();

        assert_eq!(s.handle(Input::Action(Action::Undo)), None);
        assert_eq!(s.document().cell(0, 0), None);
        s.handle(Input::Action(Action::Redo));
        assert_eq!(s.document().cell(0, 0), Some(&tex("stone")));
        s.handle(Input::Action(Action::ToggleEraser));
        assert!(s.tools().erasing);
        assert_eq!(
            s.handle(Input::Action(Action::ExportPng)),
            Some(Action::ExportPng)
        );
        s.handle(Input::Zoom(2.0));
        assert!((s.view().zoom() - 1.02).abs() < 1e-6);
    }
}

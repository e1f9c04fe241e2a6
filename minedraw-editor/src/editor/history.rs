// Undo/redo history module for the editor.

use minedraw_core::Document;
use std::collections::VecDeque;
use tracing::{debug, trace};

const DEFAULT_MAX_STATES: usize = 50;

/// Whole-document snapshots: layers plus the active layer. The undo side is
/// bounded; the oldest entry is dropped when it overflows.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Document>,
    redo: Vec<Document>,
    max_states: usize,
}

impl History {
    pub fn new(max_states: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_states: max_states.max(1),
        }
    }

    /// Record the document as it is before a mutating action. Clears redo.
    pub fn snapshot(&mut self, document: &Document) {
        self.undo.push_back(document.clone());
        if self.undo.len() > self.max_states {
            self.undo.pop_front();
            trace!(max = self.max_states, "evicted oldest undo entry");
        }
        self.redo.clear();
        debug!(depth = self.undo.len(), "snapshot taken");
    }

    /// Restore the previous snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(document, previous));
        debug!(undo = self.undo.len(), redo = self.redo.len(), "undo");
        true
    }

    /// Re-apply the last undone state. Returns false when there is nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(std::mem::replace(document, next));
        if self.undo.len() > self.max_states {
            self.undo.pop_front();
        }
        debug!(undo = self.undo.len(), redo = self.redo.len(), "redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    /// Oldest snapshot still kept.
    pub fn oldest(&self) -> Option<&Document> {
        self.undo.front()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STATES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minedraw_core::{Dimensions, Layer, PaintMode, TextureRef};

    fn dirt() -> TextureRef {
        TextureRef::new("textures/block/dirt.png")
    }

    #[test]
    fn undo_restores_exact_prior_document() {
        let mut doc = Document::default();
        let mut history = History::default();
        let before = doc.clone();

        history.snapshot(&doc);
        doc.paint(5, 5, Some(&dirt()), PaintMode::Paint);
        assert!(history.undo(&mut doc));
        assert_eq!(doc, before);
    }

    #[test]
    fn redo_after_undo_restores_edit() {
        let mut doc = Document::default();
        let mut history = History::default();

        history.snapshot(&doc);
        doc.paint(5, 5, Some(&dirt()), PaintMode::Paint);
        let edited = doc.clone();

        history.undo(&mut doc);
        assert!(history.redo(&mut doc));
        assert_eq!(doc, edited);
        assert!(!history.redo(&mut doc));
    }

    #[test]
    fn empty_history_is_a_no_op() {
        let mut doc = Document::default();
        let before = doc.clone();
        let mut history = History::default();
        assert!(!history.undo(&mut doc));
        assert!(!history.redo(&mut doc));
        assert_eq!(doc, before);
    }

    #[test]
    fn new_snapshot_clears_redo() {
        let mut doc = Document::default();
        let mut history = History::default();
        history.snapshot(&doc);
        doc.paint(1, 1, Some(&dirt()), PaintMode::Paint);
        history.undo(&mut doc);
        assert!(history.can_redo());

        history.snapshot(&doc);
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_is_bounded_and_evicts_oldest() {
        let mut doc = Document::new(Dimensions::new(10, 10));
        let mut history = History::new(3);

        for i in 0..5 {
            history.snapshot(&doc);
            doc.paint(i, 0, Some(&dirt()), PaintMode::Paint);
            assert!(history.undo_len() <= 3);
        }
        assert_eq!(history.undo_len(), 3);

        // Snapshots 0 and 1 were evicted; the oldest kept one has two cells painted.
        let oldest = history.oldest().unwrap();
        let painted = oldest
            .layers
            .iter()
            .map(|l| l.grid.occupied().count())
            .sum::<usize>();
        assert_eq!(painted, 2);
    }

    #[test]
    fn undo_restores_active_layer() {
        let mut doc = Document::default();
        let mut history = History::default();
        history.snapshot(&doc);

        doc.layers.retain(|l| l.id != 1);
        doc.layers.push(Layer::new(9, "new", doc.dimensions()));
        doc.select(9).unwrap();
        let replaced = doc.clone();

        history.undo(&mut doc);
        assert_eq!(doc.active_layer_id, 2);
        assert_eq!(doc.layers.len(), 3);

        history.redo(&mut doc);
        assert_eq!(doc, replaced);
        assert_eq!(doc.active_layer_id, 9);
    }
}

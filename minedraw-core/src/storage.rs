//! Local key-value persistence: the autosaved document and view preferences.
//!
//! Storage failures are never fatal. Callers log them and keep the in-memory
//! document as it is.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, trace};

use crate::render::BackgroundPreset;
use crate::{io as drawing_io, Dimensions, Document};

/// Autosaved `{ layers, activeLayerId }` document.
pub const LAYERS_KEY: &str = "minedraw_layers";
/// Chosen background preset name.
pub const BACKGROUND_KEY: &str = "minedraw_background";
/// Grid overlay preference, `"true"` or `"false"`.
pub const SHOW_GRID_KEY: &str = "minedraw_showGrid";

/// A string-to-string store, in the manner of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, value)?;
        trace!(key, bytes = value.len(), "store write");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

/// In-memory store with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total stored bytes past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Autosave the document.
pub fn save_document(store: &mut dyn KeyValueStore, document: &Document) -> Result<(), StoreError> {
    let json = serde_json::to_string(document).map_err(StoreError::Serialize)?;
    store.set(LAYERS_KEY, &json)?;
    debug!(bytes = json.len(), "document autosaved");
    Ok(())
}

/// Restore the autosaved document, if there is one.
pub fn load_document(
    store: &dyn KeyValueStore,
    dimensions: Dimensions,
) -> Result<Option<Document>, StoreError> {
    let Some(json) = store.get(LAYERS_KEY)? else {
        return Ok(None);
    };
    let document = drawing_io::parse_drawing(&json, dimensions)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    debug!(layers = document.layers.len(), "document restored from store");
    Ok(Some(document))
}

/// View preferences persisted next to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub background: BackgroundPreset,
    pub show_grid: bool,
}

impl Preferences {
    /// Read preferences, keeping `defaults` for anything missing or unreadable.
    pub fn load(store: &dyn KeyValueStore, defaults: Preferences) -> Preferences {
        let mut prefs = defaults;

        match store.get(BACKGROUND_KEY) {
            Ok(Some(name)) => match BackgroundPreset::from_str(&name) {
                Ok(bg) => prefs.background = bg,
                Err(_) => error!(value = %name, "unknown background preference"),
            },
            Ok(None) => {}
            Err(e) => error!(error = %e, "error loading background preference"),
        }

        match store.get(SHOW_GRID_KEY) {
            Ok(Some(value)) => prefs.show_grid = value == "true",
            Ok(None) => {}
            Err(e) => error!(error = %e, "error loading grid preference"),
        }

        prefs
    }

    pub fn save_background(
        store: &mut dyn KeyValueStore,
        background: BackgroundPreset,
    ) -> Result<(), StoreError> {
        store.set(BACKGROUND_KEY, background.as_ref())
    }

    pub fn save_show_grid(store: &mut dyn KeyValueStore, show: bool) -> Result<(), StoreError> {
        store.set(SHOW_GRID_KEY, if show { "true" } else { "false" })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    #[error("store quota exceeded: need {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("serialize document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("stored document is unreadable: {0}")]
    Corrupt(String),
}

//! Drawing files: JSON export and validated import.
//!
//! The file shape is the same one autosave writes:
//! `{ "layers": [{ id, name, visible, gridData }], "activeLayerId": n }`.

use anyhow::Context;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::layer::{Layer, LayerId};
use crate::{Dimensions, Document, DocumentError};

/// Extension used for exported drawings.
pub const DRAWING_FILE_EXT: &str = "json";
/// Prefix of every exported file name.
pub const EXPORT_PREFIX: &str = "minedraw";

/// Pretty JSON for a drawing download.
pub fn to_json(document: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// Parse and validate an uploaded drawing.
///
/// The text must be a JSON object whose `layers` field is an array. Grids must
/// match `dimensions` and layer ids must be unique. A missing or unknown
/// `activeLayerId` falls back to the default layer.
pub fn parse_drawing(text: &str, dimensions: Dimensions) -> Result<Document, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;

    let layers = match value.get("layers") {
        Some(layers @ Value::Array(_)) => layers.clone(),
        _ => return Err(ImportError::MissingLayers),
    };
    let layers: Vec<Layer> = serde_json::from_value(layers).map_err(ImportError::InvalidLayer)?;

    let active = value
        .get("activeLayerId")
        .and_then(Value::as_u64)
        .and_then(|id| LayerId::try_from(id).ok());
    if active.is_none() {
        warn!("drawing has no usable activeLayerId, using default");
    }

    Ok(Document::from_layers(layers, active, dimensions)?)
}

/// `minedraw-<unix millis>.<ext>`, the name given to downloads.
pub fn export_filename(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        EXPORT_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        extension
    )
}

/// Save a drawing to disk as pretty JSON.
pub fn save_drawing(path: impl AsRef<Path>, document: &Document) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let json = to_json(document).context("serialize drawing to json")?;
    fs::write(path, json).with_context(|| format!("write drawing file: {}", path.display()))?;
    info!(path = %path.display(), layers = document.layers.len(), "drawing exported");
    Ok(())
}

/// Load and validate a drawing from disk.
pub fn load_drawing(path: impl AsRef<Path>, dimensions: Dimensions) -> anyhow::Result<Document> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read drawing file: {}", path.display()))?;
    let document = parse_drawing(&data, dimensions)
        .with_context(|| format!("import drawing: {}", path.display()))?;
    info!(path = %path.display(), layers = document.layers.len(), "drawing imported");
    Ok(document)
}

/// Why an uploaded drawing was rejected. Messages are shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid JSON format: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid JSON format: expected a `layers` array")]
    MissingLayers,

    #[error("invalid layer: {0}")]
    InvalidLayer(#[source] serde_json::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

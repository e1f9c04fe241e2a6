//! Texture catalog: the manifest of available block textures, their
//! categories, and accent-insensitive search.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::TextureRef;

/// Localized display names keyed by texture name (`oak_planks`).
pub type Translations = HashMap<String, String>;

/// Closed set of catalog categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Stone,
    Wood,
    Dirt,
    Glass,
    Wool,
    Concrete,
    Terracotta,
    Ore,
    Plant,
    Other,
}

impl Category {
    /// Classify a texture path by filename substrings. Rules are checked in
    /// order and the first match wins.
    pub fn of_path(path: &str) -> Category {
        let p = path.to_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| p.contains(n));

        if any(&["stone", "cobblestone", "andesite", "diorite", "granite", "basalt"])
            || (p.contains("brick") && !p.contains("clay"))
        {
            return Category::Stone;
        }
        if any(&[
            "wood", "oak", "spruce", "birch", "jungle", "acacia", "dark_oak", "crimson", "warped",
            "plank", "log",
        ]) {
            return Category::Wood;
        }
        if any(&["dirt", "grass", "podzol", "mycelium", "sand", "gravel"]) {
            return Category::Dirt;
        }
        if p.contains("glass") && !p.contains("pane_top") {
            return Category::Glass;
        }
        if p.contains("wool") {
            return Category::Wool;
        }
        if p.contains("concrete") && !p.contains("powder") {
            return Category::Concrete;
        }
        if any(&["terracotta", "glazed", "clay"]) {
            return Category::Terracotta;
        }
        if any(&[
            "ore", "diamond", "emerald", "gold", "iron", "coal", "lapis", "redstone", "quartz",
        ]) {
            return Category::Ore;
        }
        if any(&[
            "leaves", "flower", "plant", "sapling", "vine", "wheat", "carrot", "potato",
            "beetroot", "melon", "pumpkin", "cactus", "mushroom", "fungus", "roots",
        ]) {
            return Category::Plant;
        }
        Category::Other
    }
}

/// One texture available for painting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureEntry {
    pub path: TextureRef,
    /// Canonical name: the file stem.
    pub name: String,
    pub localized_name: String,
    pub category: Category,
}

impl TextureEntry {
    pub fn new(path: impl Into<String>, translations: &Translations) -> Self {
        let path = TextureRef::new(path);
        let name = path.stem().to_string();
        let localized_name = translations
            .get(&name)
            .cloned()
            .unwrap_or_else(|| humanize(&name));
        let category = Category::of_path(path.as_str());
        Self {
            path,
            name,
            localized_name,
            category,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        normalize(&self.name).contains(needle) || normalize(&self.localized_name).contains(needle)
    }
}

/// Read-only list of textures, built once from a manifest.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<TextureEntry>,
}

impl Catalog {
    pub fn from_manifest<S: Into<String>>(
        paths: impl IntoIterator<Item = S>,
        translations: &Translations,
    ) -> Self {
        let entries: Vec<_> = paths
            .into_iter()
            .map(|p| TextureEntry::new(p, translations))
            .collect();
        info!(textures = entries.len(), "texture catalog loaded");
        Self { entries }
    }

    /// Load a manifest file, with an optional translations file.
    pub fn load(manifest: impl AsRef<Path>, translations: Option<&Path>) -> anyhow::Result<Self> {
        let paths = read_manifest(manifest)?;
        let translations = match translations {
            Some(path) => read_translations(path)?,
            None => Translations::new(),
        };
        Ok(Self::from_manifest(paths, &translations))
    }

    pub fn entries(&self) -> &[TextureEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, path: &TextureRef) -> Option<&TextureEntry> {
        self.entries.iter().find(|e| &e.path == path)
    }

    /// Entries whose canonical or localized name contains `term`, ignoring case
    /// and accents, optionally limited to one category. An empty term matches all.
    pub fn search(&self, term: &str, category: Option<Category>) -> Vec<&TextureEntry> {
        let needle = normalize(term);
        let hits: Vec<_> = self
            .entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .filter(|e| e.matches(&needle))
            .collect();
        debug!(term, category = ?category, hits = hits.len(), "catalog search");
        hits
    }
}

/// Lowercase and strip combining diacritics (`Pierre Taillée` -> `pierre taillee`).
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

/// `oak_planks` -> `Oak Planks`.
pub fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Recursively list `.png` files under `dir` as `/`-separated paths relative to
/// `base`, sorted. A missing directory yields an empty list.
pub fn generate_manifest(base: impl AsRef<Path>, dir: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let (base, dir) = (base.as_ref(), dir.as_ref());
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "texture directory not found, manifest is empty");
        return Ok(Vec::new());
    }

    let mut textures = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("scan texture dir: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_png = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        textures.push(joined);
    }
    textures.sort();

    info!(dir = %dir.display(), textures = textures.len(), "generated texture manifest");
    Ok(textures)
}

/// Write a manifest as pretty JSON.
pub fn write_manifest(path: impl AsRef<Path>, textures: &[String]) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(textures).context("serialize manifest")?;
    fs::write(path, json).with_context(|| format!("write manifest: {}", path.display()))?;
    Ok(())
}

pub fn read_manifest(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    let data =
        fs::read_to_string(path).with_context(|| format!("read manifest: {}", path.display()))?;
    let paths = serde_json::from_str(&data).map_err(CatalogError::ManifestFormat)?;
    Ok(paths)
}

pub fn read_translations(path: impl AsRef<Path>) -> anyhow::Result<Translations> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read translations: {}", path.display()))?;
    let map = serde_json::from_str(&data).map_err(CatalogError::TranslationsFormat)?;
    Ok(map)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("manifest must be a JSON array of paths: {0}")]
    ManifestFormat(#[source] serde_json::Error),

    #[error("translations must be a JSON object of names: {0}")]
    TranslationsFormat(#[source] serde_json::Error),
}

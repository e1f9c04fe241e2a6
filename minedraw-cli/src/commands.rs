use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use strum::IntoEnumIterator;
use tracing::{info, warn};

use minedraw_core::catalog::{self, Catalog};
use minedraw_core::demo::demo_document;
use minedraw_core::io::{export_filename, load_drawing, save_drawing};
use minedraw_core::render::{export_png, BackgroundPreset, FsTextureSource};
use minedraw_core::{Category, EditorConfig, LayerId, MemoryStore, TextureRef};
use minedraw_editor::Session;

pub fn parse_cell(arg: &str) -> Result<(i32, i32), String> {
    let (x, y) = arg
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {arg:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in {arg:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in {arg:?}: {e}"))?;
    Ok((x, y))
}

pub fn manifest(base: &Path, dir: &Path, out: &Path) -> Result<()> {
    let textures = catalog::generate_manifest(base, base.join(dir))?;
    catalog::write_manifest(out, &textures)?;
    println!("Generated {} with {} textures", out.display(), textures.len());
    Ok(())
}

pub fn demo(config: &EditorConfig, out: &Path) -> Result<()> {
    let document = demo_document(config.dimensions());
    save_drawing(out, &document)?;
    println!("Wrote demo drawing to {}", out.display());
    Ok(())
}

pub fn render(
    config: &EditorConfig,
    drawing: &Path,
    out: Option<PathBuf>,
    background: Option<BackgroundPreset>,
    textures: Option<PathBuf>,
) -> Result<()> {
    let document = load_drawing(drawing, config.dimensions())?;
    let source = FsTextureSource::new(textures.unwrap_or_else(|| config.texture_root.clone()));
    let out = out.unwrap_or_else(|| PathBuf::from(export_filename("png")));
    let background = background.unwrap_or(config.background);

    let stats = export_png(&out, &document, background, &source, config.block_size)?;
    if stats.skipped > 0 {
        warn!(skipped = stats.skipped, "some cells were left out");
    }
    println!("Rendered {} ({} cells)", out.display(), stats.drawn);
    Ok(())
}

pub fn search(
    manifest: &Path,
    translations: Option<&Path>,
    term: &str,
    category: Option<Category>,
) -> Result<()> {
    let catalog = Catalog::load(manifest, translations)
        .with_context(|| format!("load catalog: {}", manifest.display()))?;
    let found = catalog.search(term, category);

    for entry in &found {
        println!("{:<12} {:<32} {}", entry.category, entry.localized_name, entry.path);
    }
    if term.is_empty() && category.is_none() {
        for category in Category::iter() {
            let count = found.iter().filter(|e| e.category == category).count();
            println!("{category}: {count}");
        }
    }
    info!(term, matches = found.len(), "search finished");
    Ok(())
}

pub fn info(config: &EditorConfig, drawing: &Path) -> Result<()> {
    let document = load_drawing(drawing, config.dimensions())?;
    let dims = document.dimensions();
    println!("{} x {} cells", dims.width, dims.height);

    for layer in document.layers.iter().rev() {
        let marker = if layer.id == document.active_layer_id { "*" } else { " " };
        let visibility = if layer.visible { "visible" } else { "hidden" };
        println!(
            "{marker} {:>3}  {:<16} {:<8} {} cells",
            layer.id,
            layer.name,
            visibility,
            layer.grid.occupied().count()
        );
    }

    let distinct: BTreeSet<&TextureRef> = document
        .layers
        .iter()
        .flat_map(|l| l.grid.occupied().map(|(_, _, t)| t))
        .collect();
    println!("{} distinct textures", distinct.len());
    Ok(())
}

/// Replay one stroke over `cells` and save the drawing in place.
pub fn paint(
    config: &EditorConfig,
    drawing: &Path,
    texture: Option<String>,
    layer: Option<LayerId>,
    cells: &[(i32, i32)],
) -> Result<()> {
    let mut session = Session::open(config.clone(), Box::new(MemoryStore::new()));
    session.import_file(drawing)?;
    if let Some(id) = layer {
        session.select_layer(id)?;
    }
    match texture {
        Some(path) => session.select_texture(TextureRef::new(path)),
        None => {
            session.toggle_eraser();
        }
    }

    let Some((&(x, y), rest)) = cells.split_first() else {
        return Ok(());
    };
    session.pointer_down(x, y);
    for &(x, y) in rest {
        session.pointer_move(x, y);
    }
    session.pointer_up();

    save_drawing(drawing, session.document())?;
    info!(
        layer = session.document().active_layer_id,
        cells = cells.len(),
        "stroke applied"
    );
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use minedraw_core::config::CONFIG_FILE_NAME;
use minedraw_core::render::BackgroundPreset;
use minedraw_core::{Category, EditorConfig, LayerId};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "minedraw",
    version,
    about = "Block-texture pixel art: manifests, drawings and PNG export",
    arg_required_else_help = true
)]
struct Cli {
    /// Editor configuration (TOML). Missing file means defaults.
    #[arg(long, global = true, value_name = "FILE", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
    /// More log output; repeat for trace level. RUST_LOG overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a texture directory and write the sorted manifest
    Manifest {
        /// Directory the manifest paths are relative to
        #[arg(long, value_name = "DIR", default_value = ".")]
        base: PathBuf,
        /// Directory to scan, relative to the base
        #[arg(long, value_name = "DIR", default_value = "textures/block")]
        dir: PathBuf,
        #[arg(long, short, value_name = "FILE", default_value = "textures.json")]
        out: PathBuf,
    },
    /// Write the sample landscape drawing
    Demo {
        #[arg(long, short, value_name = "FILE", default_value = "demo-drawing.json")]
        out: PathBuf,
    },
    /// Render a drawing to PNG
    Render {
        drawing: PathBuf,
        #[arg(long, short, value_name = "FILE")]
        out: Option<PathBuf>,
        /// day, day-sun, night-moon or night-stars
        #[arg(long, value_name = "PRESET")]
        background: Option<BackgroundPreset>,
        /// Root that texture paths are resolved against
        #[arg(long, value_name = "DIR")]
        textures: Option<PathBuf>,
    },
    /// Search the texture catalog
    Search {
        #[arg(default_value = "")]
        term: String,
        #[arg(long, value_name = "FILE", default_value = "textures.json")]
        manifest: PathBuf,
        /// JSON object mapping texture names to display names
        #[arg(long, value_name = "FILE")]
        translations: Option<PathBuf>,
        #[arg(long, value_name = "CATEGORY")]
        category: Option<Category>,
    },
    /// Summarize a drawing's layers
    Info { drawing: PathBuf },
    /// Paint cells into a drawing, one stroke per invocation
    Paint {
        drawing: PathBuf,
        /// Texture to paint; omit to erase
        #[arg(long, value_name = "PATH")]
        texture: Option<String>,
        /// Layer to paint on instead of the saved active one
        #[arg(long, value_name = "ID")]
        layer: Option<LayerId>,
        /// Cells as x,y in stroke order
        #[arg(value_name = "X,Y", required = true, value_parser = commands::parse_cell)]
        cells: Vec<(i32, i32)>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = EditorConfig::load_or_default(&cli.config)
        .with_context(|| format!("load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Manifest { base, dir, out } => {
            commands::manifest(&base, &dir, &out)?;
        }
        Command::Demo { out } => {
            commands::demo(&config, &out)?;
        }
        Command::Render {
            drawing,
            out,
            background,
            textures,
        } => {
            commands::render(&config, &drawing, out, background, textures)?;
        }
        Command::Search {
            term,
            manifest,
            translations,
            category,
        } => {
            commands::search(&manifest, translations.as_deref(), &term, category)?;
        }
        Command::Info { drawing } => {
            commands::info(&config, &drawing)?;
        }
        Command::Paint {
            drawing,
            texture,
            layer,
            cells,
        } => {
            commands::paint(&config, &drawing, texture, layer, &cells)?;
        }
    }
    Ok(())
}

//! Editor configuration, read from `minedraw.toml`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::render::BackgroundPreset;
use crate::{Dimensions, BLOCK_SIZE, GRID_HEIGHT, GRID_WIDTH, MAX_SURFACE_SIDE};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "minedraw.toml";

fn default_history_depth() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Pixels per cell when rasterizing.
    pub block_size: u32,
    /// Maximum number of undo snapshots kept.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    /// Directory backing the key-value store. `None` uses the platform data dir.
    pub storage_dir: Option<PathBuf>,
    /// Root that texture paths are resolved against.
    pub texture_root: PathBuf,
    pub background: BackgroundPreset,
    pub show_grid: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            block_size: BLOCK_SIZE,
            history_depth: default_history_depth(),
            storage_dir: None,
            texture_root: PathBuf::from("."),
            background: BackgroundPreset::default(),
            show_grid: true,
        }
    }
}

impl EditorConfig {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.grid_width, self.grid_height)
    }

    /// Where the store lives: the configured directory, else `<data dir>/minedraw`.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("minedraw")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("grid_width", self.grid_width),
            ("grid_height", self.grid_height),
            ("block_size", self.block_size),
        ];
        for (name, value) in fields {
            if value == 0 {
                error!(field = name, "configuration value must be positive");
                return Err(ConfigError::Zero {
                    field: name.to_string(),
                });
            }
        }

        if self.history_depth == 0 {
            error!("history_depth must be positive");
            return Err(ConfigError::Zero {
                field: "history_depth".into(),
            });
        }

        let fits = self
            .dimensions()
            .checked_pixel_size(self.block_size)
            .filter(|&(w, h)| w <= MAX_SURFACE_SIDE && h <= MAX_SURFACE_SIDE);
        if fits.is_none() {
            error!(
                grid_width = self.grid_width,
                grid_height = self.grid_height,
                block_size = self.block_size,
                "rasterized grid too large"
            );
            return Err(ConfigError::SurfaceTooLarge {
                width: self.grid_width,
                height: self.grid_height,
                block_size: self.block_size,
            });
        }

        if self.block_size > 256 {
            warn!(
                block_size = self.block_size,
                "unusually large block size, exports will be big"
            );
        }
        Ok(())
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parse config file: {}", path.display()))?;
        config.validate()?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self).context("serialize config")?;
        fs::write(path, text).with_context(|| format!("write config file: {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("{width} x {height} cells at {block_size} px exceeds {} px per side", MAX_SURFACE_SIDE)]
    SurfaceTooLarge {
        width: u32,
        height: u32,
        block_size: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dimensions(), Dimensions::new(50, 30));
        assert_eq!(config.history_depth, 50);
    }

    #[test]
    fn zero_sizes_rejected() {
        let config = EditorConfig {
            grid_width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Zero { .. })));
    }

    #[test]
    fn oversized_surface_rejected() {
        let overflowing = EditorConfig {
            block_size: 100_000_000,
            ..Default::default()
        };
        assert!(matches!(
            overflowing.validate(),
            Err(ConfigError::SurfaceTooLarge { .. })
        ));

        let too_wide = EditorConfig {
            grid_width: 2_000,
            block_size: 32,
            ..Default::default()
        };
        assert!(too_wide.validate().is_err());

        let at_limit = EditorConfig {
            grid_width: 1_024,
            grid_height: 1_024,
            block_size: 32,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn oversized_toml_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "block_size = 100000000\n").unwrap();
        assert!(EditorConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EditorConfig =
            toml::from_str("grid_width = 16\nbackground = \"night-moon\"\n").unwrap();
        assert_eq!(config.grid_width, 16);
        assert_eq!(config.grid_height, GRID_HEIGHT);
        assert_eq!(config.background, BackgroundPreset::NightMoon);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load_or_default(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = EditorConfig {
            block_size: 16,
            show_grid: false,
            storage_dir: Some(dir.path().join("store")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load_or_default(&path).unwrap(), config);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use mapdoc::Tileset;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::legacy::DEFAULT_EVENT_CAPACITY;

/// Codec settings, read from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mod names written into container headers
    pub mods: Vec<String>,
    /// Container version written on export
    pub version: u32,
    /// Slot count of the legacy event stream; the oldest saves use 300
    pub legacy_event_capacity: usize,
    /// Tileset files (JSON) made available to every imported map
    pub tilesets: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mods: vec!["core".to_string()],
            version: 1,
            legacy_event_capacity: DEFAULT_EVENT_CAPACITY,
            tilesets: Vec::new(),
        }
    }
}

impl Config {
    /// `~/.config/mapsave/config.json`, or the platform equivalent
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mapsave")
            .join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let mut config: Config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        // tileset paths are relative to the config file
        if let Some(base) = path.parent() {
            for tileset in &mut config.tilesets {
                if tileset.is_relative() {
                    *tileset = base.join(&*tileset);
                }
            }
        }
        tracing::debug!(path = %path.display(), tilesets = config.tilesets.len(), "loaded config");
        Ok(config)
    }

    /// The file at [`Config::default_path`] if present, defaults otherwise
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_tilesets(&self) -> Result<Vec<Tileset>> {
        self.tilesets.iter().map(|path| load_tileset(path)).collect()
    }
}

pub fn load_tileset(path: &Path) -> Result<Tileset> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("tileset {}: {e}", path.display())))?;
    let tileset: Tileset = serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("tileset {}: {e}", path.display())))?;
    tracing::debug!(name = %tileset.name, tiles = tileset.tile_count(), "loaded tileset");
    Ok(tileset)
}

//! Legacy split-file saves
//!
//! A legacy map is three gzip'd siblings sharing a base name:
//!
//! ```text
//! <base>.idx   width, height, atlas, regenerate date, stair-up position (u32 each)
//! <base>.map   u32[width * height] raw tile ids, resolved through "legacy_id"
//! <base>.obj   optional, up to N records of (id, x, y, extra, kind) as u32
//! ```
//!
//! There is no magic number and no intern table; the format is read-only.

use std::path::{Path, PathBuf};

use crate::codec::BinaryReader;
use crate::error::{Error, Result};
use super::stream;

/// Size of one event record in the `.obj` stream
pub const EVENT_SIZE: usize = 20;

/// Event slot count of current-era saves
pub const DEFAULT_EVENT_CAPACITY: usize = 400;

/// Feature event id → (param1, map chip legacy id)
const FEATURES: [(u32, u32); 14] = [
    (21, 726), // placeholder door
    (21, 726),
    (21, 726),
    (14, 234),
    (14, 234),
    (10, 232), // stairs up
    (11, 231), // stairs down
    (21, 728),
    (23, 727),
    (31, 729),
    (32, 234),
    (21, 730),
    (21, 732),
    (21, 733),
];

/// Look up a feature event id in the static feature table
pub fn feature_entry(id: u32) -> Option<(u32, u32)> {
    FEATURES.get(id as usize).copied()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyHeader {
    pub width: u32,
    pub height: u32,
    pub atlas: u32,
    pub regenerate_date: u32,
    pub stair_up_pos: u32,
}

impl LegacyHeader {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            width: reader.read_u32_le()?,
            height: reader.read_u32_le()?,
            atlas: reader.read_u32_le()?,
            regenerate_date: reader.read_u32_le()?,
            stair_up_pos: reader.read_u32_le()?,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One raw slot of the `.obj` stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEvent {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub extra: u32,
    pub kind: u32,
}

impl CellEvent {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            id: reader.read_u32_le()?,
            x: reader.read_u32_le()?,
            y: reader.read_u32_le()?,
            extra: reader.read_u32_le()?,
            kind: reader.read_u32_le()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyItem {
    pub legacy_id: u32,
    pub x: u32,
    pub y: u32,
    pub own_state: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyCharacter {
    pub legacy_id: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFeature {
    /// Map chip legacy id from the feature table
    pub legacy_id: u32,
    pub x: u32,
    pub y: u32,
    pub param1: u32,
    pub param2: u32,
    pub param3: u32,
}

/// A decoded legacy save, ids still unresolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyMap {
    pub header: LegacyHeader,
    pub tiles: Vec<u32>,
    pub items: Vec<LegacyItem>,
    pub characters: Vec<LegacyCharacter>,
    pub features: Vec<LegacyFeature>,
}

impl LegacyMap {
    /// Sort one event into its bucket; empty slots and unknown kinds are dropped
    pub fn push_event(&mut self, event: CellEvent) {
        if event.id == 0 {
            return;
        }
        match event.kind {
            0 => self.items.push(LegacyItem {
                legacy_id: event.id,
                x: event.x,
                y: event.y,
                own_state: event.extra,
            }),
            1 => self.characters.push(LegacyCharacter {
                legacy_id: event.id,
                x: event.x,
                y: event.y,
            }),
            2 => match feature_entry(event.id) {
                // extra packs two decimal fields; no range check, values wrap as plain u32 math
                Some((param1, legacy_id)) => self.features.push(LegacyFeature {
                    legacy_id,
                    x: event.x,
                    y: event.y,
                    param1,
                    param2: event.extra % 1000,
                    param3: event.extra / 1000,
                }),
                None => tracing::warn!(id = event.id, x = event.x, y = event.y, "unknown feature event, skipping"),
            },
            kind => tracing::warn!(kind, id = event.id, "unknown event kind, skipping"),
        }
    }
}

/// Decode the three already-decompressed streams
pub fn decode(idx: &[u8], map: &[u8], obj: Option<&[u8]>, event_capacity: usize) -> Result<LegacyMap> {
    let header = LegacyHeader::read(&mut BinaryReader::new(idx))?;
    let tiles = BinaryReader::new(map).read_u32_array(header.cell_count())?;
    tracing::debug!(width = header.width, height = header.height, atlas = header.atlas, "read legacy header");

    let mut legacy = LegacyMap { header, tiles, ..Default::default() };
    if let Some(obj) = obj {
        let mut reader = BinaryReader::new(obj);
        let mut slots = 0;
        while slots < event_capacity && !reader.is_empty() {
            legacy.push_event(CellEvent::read(&mut reader)?);
            slots += 1;
        }
        if slots < event_capacity {
            tracing::debug!(slots, "event stream ended early");
        }
    }
    Ok(legacy)
}

/// The sibling files of one legacy save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPaths {
    pub idx: PathBuf,
    pub map: PathBuf,
    pub obj: PathBuf,
}

impl LegacyPaths {
    pub fn new(path: &Path) -> Self {
        Self {
            idx: path.with_extension("idx"),
            map: path.with_extension("map"),
            obj: path.with_extension("obj"),
        }
    }

    /// `path` names an `.idx` file, or has one next to it
    pub fn detect(path: &Path) -> bool {
        let has_idx_ext = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("idx"));
        has_idx_ext || path.with_extension("idx").is_file()
    }

    /// `path` is one of the three files, by name or by identity on disk
    pub fn contains(&self, path: &Path) -> bool {
        [&self.idx, &self.map, &self.obj].into_iter().any(|own| {
            own.as_path() == path
                || matches!(
                    (own.canonicalize(), path.canonicalize()),
                    (Ok(a), Ok(b)) if a == b
                )
        })
    }
}

/// Read and decode a legacy save from disk
pub fn read(path: &Path, event_capacity: usize) -> Result<LegacyMap> {
    let paths = LegacyPaths::new(path);
    if !paths.map.is_file() {
        return Err(Error::MissingRequiredEntity(format!(
            "legacy tile file {} not found",
            paths.map.display()
        )));
    }
    let idx = stream::read_gzip(&paths.idx)?;
    let map = stream::read_gzip(&paths.map)?;
    let obj = if paths.obj.is_file() {
        Some(stream::read_gzip(&paths.obj)?)
    } else {
        None
    };
    decode(&idx, &map, obj.as_deref(), event_capacity)
}

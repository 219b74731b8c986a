use serde::{Deserialize, Serialize};

use crate::property::{Properties, Property};

/// Reference to a tile: tileset index within the document plus tile id within the tileset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    pub tileset: usize,
    pub id: u32,
}

impl TileRef {
    pub fn new(tileset: usize, id: u32) -> Self {
        Self { tileset, id }
    }
}

/// A single tile definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub properties: Properties,
}

impl Tile {
    pub fn new(id: u32, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Property>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// External id (the `"id"` property), e.g. `core.putit`
    pub fn external_id(&self) -> Option<String> {
        self.properties.get("id").map(Property::as_string)
    }

    /// Numeric id used by the oldest save format (the `"legacy_id"` property)
    pub fn legacy_id(&self) -> Option<u32> {
        self.properties
            .get("legacy_id")
            .and_then(Property::as_int)
            .and_then(|v| u32::try_from(v).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default)]
    pub tiles: Vec<Tile>,
}

impl Tileset {
    pub fn new(name: impl Into<String>, tile_width: u32, tile_height: u32) -> Self {
        Self {
            name: name.into(),
            tile_width,
            tile_height,
            tiles: Vec::new(),
        }
    }

    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, id: u32) -> Option<&Tile> {
        // Tiles are usually stored densely by id
        match self.tiles.get(id as usize) {
            Some(tile) if tile.id == id => Some(tile),
            _ => self.tiles.iter().find(|t| t.id == id),
        }
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Option<&Tile> {
        self.tiles
            .iter()
            .find(|t| t.external_id().as_deref() == Some(external_id))
    }

    pub fn find_by_legacy_id(&self, legacy_id: u32) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.legacy_id() == Some(legacy_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_tile_lookup() {
        let mut tileset = Tileset::new("core.item", 48, 48);
        tileset.add_tile(Tile::new(3, 48, 48));
        tileset.add_tile(Tile::new(7, 48, 96).with_property("legacy_id", "12"));

        assert!(tileset.tile(0).is_none());
        assert_eq!(tileset.tile(7).unwrap().height, 96);
        assert_eq!(tileset.find_by_legacy_id(12).unwrap().id, 7);
        assert!(tileset.find_by_legacy_id(3).is_none());
    }
}

//! In-memory tile map document
//!
//! The host side of the map save codec:
//! 1. `property` - String-keyed property bags shared by maps, layers, objects and tiles
//! 2. `tileset` - Tilesets and the tile definitions cells/objects point at
//! 3. `layer` - Tile layers (row-major grids) and object layers
//!
//! A [`MapDocument`] ties them together. Positions on objects are in pixels;
//! the codec is responsible for translating to and from tile units.

mod layer;
mod property;
mod tileset;

pub use layer::{Layer, MapObject, ObjectLayer, TileLayer};
pub use property::{Properties, Property};
pub use tileset::{Tile, TileRef, Tileset};

use serde::{Deserialize, Serialize};

/// A tile map with its tilesets, layers and map-level properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub tilesets: Vec<Tileset>,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl MapDocument {
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            width,
            height,
            tile_width,
            tile_height,
            properties: Properties::new(),
            tilesets: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Add a tileset, returning its index for use in [`TileRef`]s
    pub fn add_tileset(&mut self, tileset: Tileset) -> usize {
        self.tilesets.push(tileset);
        self.tilesets.len() - 1
    }

    pub fn tileset_index(&self, name: &str) -> Option<usize> {
        self.tilesets.iter().position(|t| t.name == name)
    }

    pub fn tile(&self, tile_ref: TileRef) -> Option<&Tile> {
        self.tilesets.get(tile_ref.tileset)?.tile(tile_ref.id)
    }

    /// Find a tile by its external id, searching every tileset in order
    pub fn find_tile(&self, external_id: &str) -> Option<TileRef> {
        self.tilesets.iter().enumerate().find_map(|(index, tileset)| {
            tileset
                .find_by_external_id(external_id)
                .map(|tile| TileRef::new(index, tile.id))
        })
    }

    /// Find a tile by external id within the named tileset only
    pub fn find_tile_in(&self, tileset: &str, external_id: &str) -> Option<TileRef> {
        let index = self.tileset_index(tileset)?;
        self.tilesets[index]
            .find_by_external_id(external_id)
            .map(|tile| TileRef::new(index, tile.id))
    }

    pub fn add_layer(&mut self, layer: impl Into<Layer>) {
        self.layers.push(layer.into());
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Tiles(layer) if layer.name == name => Some(layer),
            _ => None,
        })
    }

    pub fn tile_layer_mut(&mut self, name: &str) -> Option<&mut TileLayer> {
        self.layers.iter_mut().find_map(|l| match l {
            Layer::Tiles(layer) if layer.name == name => Some(layer),
            _ => None,
        })
    }

    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Objects(layer) if layer.name == name => Some(layer),
            _ => None,
        })
    }

    pub fn object_layer_mut(&mut self, name: &str) -> Option<&mut ObjectLayer> {
        self.layers.iter_mut().find_map(|l| match l {
            Layer::Objects(layer) if layer.name == name => Some(layer),
            _ => None,
        })
    }
}

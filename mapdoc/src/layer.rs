use serde::{Deserialize, Serialize};

use crate::property::{Properties, Property};
use crate::tileset::TileRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Tiles(TileLayer),
    Objects(ObjectLayer),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Tiles(l) => &l.name,
            Layer::Objects(l) => &l.name,
        }
    }
}

impl From<TileLayer> for Layer {
    fn from(layer: TileLayer) -> Self {
        Layer::Tiles(layer)
    }
}

impl From<ObjectLayer> for Layer {
    fn from(layer: ObjectLayer) -> Self {
        Layer::Objects(layer)
    }
}

/// Row-major grid of optional tile references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<Option<TileRef>>,
    #[serde(default)]
    pub properties: Properties,
}

impl TileLayer {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            cells: vec![None; width as usize * height as usize],
            properties: Properties::new(),
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<TileRef> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    /// Set a cell; coordinates outside the layer are ignored
    pub fn set_cell(&mut self, x: u32, y: u32, tile: Option<TileRef>) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = tile;
        }
    }
}

/// A placed object; `x`/`y` are pixels, with tile objects anchored at their bottom-left corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub tile: Option<TileRef>,
    #[serde(default)]
    pub properties: Properties,
}

impl MapObject {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            tile: None,
            properties: Properties::new(),
        }
    }

    pub fn with_tile(mut self, tile: TileRef) -> Self {
        self.tile = Some(tile);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.properties.insert(key.into(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
    #[serde(default)]
    pub properties: Properties,
}

impl ObjectLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            properties: Properties::new(),
        }
    }

    pub fn add_object(&mut self, object: MapObject) {
        self.objects.push(object);
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_are_row_major() {
        let mut layer = TileLayer::new("Tiles", 3, 2);
        layer.set_cell(2, 1, Some(TileRef::new(0, 9)));
        assert_eq!(layer.cells[5], Some(TileRef::new(0, 9)));
        assert_eq!(layer.cell(2, 1), Some(TileRef::new(0, 9)));
        assert_eq!(layer.cell(3, 1), None);

        // out of range is a no-op
        layer.set_cell(9, 9, Some(TileRef::new(0, 1)));
        assert_eq!(layer.cells.iter().filter(|c| c.is_some()).count(), 1);
    }
}

// src/ir_map.rs
use macroquad::prelude::*;
use std::collections::HashMap;

/// Typed value of a Tiled custom property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool` property
    Bool(bool),
    /// `int` or `object` property
    I64(i64),
    /// `float` property
    F32(f32),
    /// `string`, `file`, `color` or `class` property
    String(String),
}

/// Custom properties attached to a map, layer, object or tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Empty property set.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, name: String, value: PropertyValue) {
        self.0.insert(name, value);
    }

    /// Raw lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Boolean lookup.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer lookup.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer lookup, `None` if it does not fit in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Float lookup.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.0.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// String lookup.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Canonical, format-agnostic map.
#[derive(Debug, Clone)]
pub struct IrMap {
    pub tile_w: u32,
    pub tile_h: u32,
    pub infinite: bool,
    pub properties: Properties,
    pub tilesets: Vec<IrTileset>, // must be sorted by first_gid
    pub layers: Vec<IrLayer>,     // draw order: array order
}

/// One frame of a tile animation, in tileset-local ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrFrame {
    pub local_id: u32,
    pub duration_ms: u32,
}

/// Per-tile metadata carried by a tileset.
#[derive(Debug, Clone)]
pub struct IrTileMetadata {
    pub id: u32,
    pub properties: Properties,
    pub animation: Vec<IrFrame>,
}

/// One image atlas with a regular grid.
#[derive(Debug, Clone)]
pub struct IrTileset {
    pub first_gid: u32,
    pub image: String,
    pub tile_w: u32,
    pub tile_h: u32,
    pub tilecount: u32, // 0 if unknown
    pub columns: u32,
    pub spacing: u32, // 0 if not used
    pub margin: u32,  // 0 if not used
    pub properties: Properties,
    pub tiles: Vec<IrTileMetadata>,
}

impl IrTileset {
    /// Last gid this tileset claims; unbounded when the tile count is
    /// unknown (0).
    pub fn last_gid(&self) -> u32 {
        if self.tilecount == 0 {
            return crate::spatial::GID_MASK;
        }
        self.first_gid + self.tilecount - 1
    }
}

/// A rectangular block of tiles in an infinite map.
#[derive(Debug, Clone)]
pub struct IrChunk {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
}

/// Tile storage: fixed maps are flat, infinite maps are chunked.
#[derive(Debug, Clone)]
pub enum TileStorage {
    Flat {
        width: usize,
        height: usize,
        data: Vec<u32>, // raw GIDs (including flip flags ok)
    },
    Chunked {
        chunks: Vec<IrChunk>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrObjectShape {
    Rectangle,
    Point,
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
    Tile { gid: u32 },
}

/// An entry of an object layer.
#[derive(Debug, Clone)]
pub struct IrObject {
    pub id: u32,
    pub name: String,
    pub class_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub visible: bool,
    pub shape: IrObjectShape,
    pub properties: Properties,
}

impl IrObject {
    /// Gid for tile objects.
    pub fn gid(&self) -> Option<u32> {
        match self.shape {
            IrObjectShape::Tile { gid } => Some(gid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IrLayerKind {
    Tiles(TileStorage),
    Objects { objects: Vec<IrObject> },
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct IrLayer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub offset: Vec2, // world offset for this layer
    pub properties: Properties,
    pub kind: IrLayerKind,
}

impl IrLayer {
    /// Tile storage if this is a tile layer.
    pub fn tiles(&self) -> Option<&TileStorage> {
        match &self.kind {
            IrLayerKind::Tiles(storage) => Some(storage),
            _ => None,
        }
    }

    /// Objects if this is an object layer.
    pub fn objects(&self) -> Option<&[IrObject]> {
        match &self.kind {
            IrLayerKind::Objects { objects } => Some(objects),
            _ => None,
        }
    }
}

#![warn(missing_docs)]

//! Tiled JSON maps for Macroquad: culled and animated rendering, per-tile
//! collision with remotely synced overrides, and a visual collision
//! debugger.

mod collision;
mod command;
mod config;
#[allow(missing_docs)]
mod debug;
mod error;
#[allow(missing_docs)]
mod ir_map;
mod loader {
    pub mod assets;
    pub mod fetch;
    pub mod json_loader;
}
#[allow(missing_docs)]
mod map;
mod objects;
#[allow(missing_docs)]
mod render;
mod session;
#[allow(missing_docs)]
mod spatial;
#[allow(missing_docs)]
mod tileset;

pub use collision::{
    is_floor, CollisionOverrides, CollisionResolver, CollisionRules, HttpOverrideBackend,
    Identity, MemoryOverrideBackend, OverrideBackend, OverrideKey, OverridePayload,
    OverrideStore, Role, FLOOR_LAYER,
};
pub use command::{DrawCommand, TileRegion};
pub use config::DebugConfig;
pub use debug::*;
pub use error::{MapError, OverrideError};
pub use ir_map::{
    IrChunk, IrLayer, IrLayerKind, IrMap, IrObject, IrObjectShape, IrTileset, Properties,
    PropertyValue, TileStorage,
};
pub use loader::assets::{load_first_texture, sprite_candidates};
pub use loader::fetch::Location;
pub use loader::json_loader::{decode_map_str, decode_map_to_ir};
pub use map::{LayerId, Map, TileWorld};
pub use objects::{process_map_objects, MapEntity, MapObjects};
pub use render::{plan_draw, visible_tile_region, Camera, MapRenderer};
pub use session::MapSession;
pub use spatial::{for_each_filled_tile, for_each_tile, for_each_tile_in_layer, TileId};
pub use tileset::{AnimationFrame, TileAnimation, TilesetAtlas, TilesetRange};

#![allow(dead_code)]

use macroquad_tiled_collision::{
    decode_map_str, DebugConfig, Identity, Location, MapSession, OverrideStore, Role, TileWorld,
};
use std::fs;
use std::path::PathBuf;

pub const TILE: f32 = 16.0;

/// `width x height` flat layer with the given `(x, y, gid)` cells filled.
pub fn flat_layer(name: &str, width: usize, height: usize, cells: &[(usize, usize, u32)]) -> String {
    let mut data = vec![0u32; width * height];
    for &(x, y, gid) in cells {
        data[y * width + x] = gid;
    }
    serde_json::json!({
        "type": "tilelayer",
        "name": name,
        "width": width,
        "height": height,
        "data": data,
    })
    .to_string()
}

pub fn map_json(layers: &[String]) -> String {
    format!(
        r#"{{"tilewidth":16,"tileheight":16,"layers":[{}],
            "tilesets":[{{"firstgid":1,"image":"tiles.png","tilewidth":16,"tileheight":16,"tilecount":64,"columns":8}}]}}"#,
        layers.join(",")
    )
}

pub fn world(json: &str) -> TileWorld {
    TileWorld::from_ir(decode_map_str(json, &Location::parse("maps/test.json")).expect("decode"))
}

/// Walls with tile 5 at (10,12), a floor with a tile at (0,0) and a
/// decorative layer.
pub fn town() -> TileWorld {
    world(&map_json(&[
        flat_layer("floor", 20, 20, &[(0, 0, 1), (10, 12, 1)]),
        flat_layer("Walls", 20, 20, &[(10, 12, 5), (11, 12, 5)]),
        flat_layer("decor", 20, 20, &[(3, 3, 9)]),
    ]))
}

pub fn session_with(world: TileWorld, store: OverrideStore, identity: impl Identity + 'static) -> MapSession {
    MapSession::new(world, store, Box::new(identity), DebugConfig::default())
}

pub fn admin_session(world: TileWorld) -> MapSession {
    session_with(world, OverrideStore::local(), Role::Admin)
}

pub fn tile_box(x: i32, y: i32) -> (f32, f32, f32, f32) {
    (x as f32 * TILE, y as f32 * TILE, TILE, TILE)
}

/// Write `contents` under a per-test temp directory and return the path.
pub fn temp_file(dir: &str, name: &str, contents: &[u8]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(dir);
    fs::create_dir_all(&path).expect("create temp dir");
    path.push(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

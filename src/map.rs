use crate::ir_map::*;
use crate::loader::assets::load_texture_from;
use crate::loader::fetch::Location;
use crate::loader::json_loader::decode_map_to_ir;
use crate::render::{plan_draw, Camera};
use crate::spatial::{for_each_tile, TileId};
use crate::tileset::TilesetAtlas;
use anyhow::Context;
use macroquad::prelude::*;

/// Index of a layer inside [`TileWorld::layers`].
pub type LayerId = usize;

/// Object names accepted as the player spawn point, compared lowercase.
const PLAYER_START_NAMES: &[&str] = &["player", "player_start", "spawn", "start"];

/// Everything about a map that does not need a graphics context: layers,
/// tile size and the tileset atlas.
#[derive(Debug, Clone)]
pub struct TileWorld {
    pub tile_w: u32,
    pub tile_h: u32,
    pub infinite: bool,
    pub properties: Properties,
    layers: Vec<IrLayer>,
    atlas: TilesetAtlas,
}

impl TileWorld {
    pub fn from_ir(ir: IrMap) -> Self {
        let atlas = TilesetAtlas::from_ir(&ir.tilesets);
        Self {
            tile_w: ir.tile_w,
            tile_h: ir.tile_h,
            infinite: ir.infinite,
            properties: ir.properties,
            layers: ir.layers,
            atlas,
        }
    }

    pub fn layers(&self) -> &[IrLayer] {
        &self.layers
    }

    pub fn atlas(&self) -> &TilesetAtlas {
        &self.atlas
    }

    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().position(|l| l.name == name)
    }

    pub fn layer(&self, name: &str) -> Option<&IrLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Tile layers in draw order.
    pub fn tile_layers(&self) -> impl Iterator<Item = (LayerId, &IrLayer)> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.tiles().is_some())
    }

    /// Object layers in document order.
    pub fn object_layers(&self) -> impl Iterator<Item = &IrLayer> {
        self.layers.iter().filter(|l| l.objects().is_some())
    }

    /// Non-empty tile at a tile coordinate of a named layer.
    pub fn tile_at(&self, layer: &str, x: i32, y: i32) -> Option<TileId> {
        self.layer(layer)?.tiles()?.tile_at(x, y)
    }

    /// Visit every cell of the named tile layer; returns false when no such
    /// tile layer exists.
    pub fn for_each_tile_in_layer<F>(&self, layer: &str, visit: F) -> bool
    where
        F: FnMut(TileId, i32, i32),
    {
        match self.layer(layer).and_then(IrLayer::tiles) {
            Some(storage) => {
                for_each_tile(storage, visit);
                true
            }
            None => false,
        }
    }

    /// World-space position of the first player spawn object.
    pub fn find_player_start(&self) -> Option<Vec2> {
        self.object_layers()
            .flat_map(|l| l.objects().unwrap_or_default())
            .find(|o| PLAYER_START_NAMES.contains(&o.name.to_lowercase().as_str()))
            .map(|o| vec2(o.x, o.y))
    }

    /// Tile coordinate containing a world position.
    #[inline]
    pub fn world_to_tile(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.tile_w.max(1) as f32).floor() as i32,
            (p.y / self.tile_h.max(1) as f32).floor() as i32,
        )
    }

    /// World-space rectangle of a tile.
    #[inline]
    pub fn tile_rect(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            (x * self.tile_w as i32) as f32,
            (y * self.tile_h as i32) as f32,
            self.tile_w as f32,
            self.tile_h as f32,
        )
    }
}

/// A loaded map: its world plus one texture per tileset range.
pub struct Map {
    world: TileWorld,
    textures: Vec<Texture2D>,
    source: Location,
}

impl Map {
    /// Fetch the document at `source` (path or URL), then every tileset
    /// image. Any failure aborts the whole load.
    pub async fn load(source: &str) -> anyhow::Result<Self> {
        let (ir, loc) =
            decode_map_to_ir(source).with_context(|| format!("Loading map {source}"))?;
        Self::from_ir(ir, loc).await
    }

    pub async fn from_ir(ir: IrMap, source: Location) -> anyhow::Result<Self> {
        let world = TileWorld::from_ir(ir);

        let mut textures = Vec::with_capacity(world.atlas.ranges().len());
        for ts in world.atlas.ranges() {
            let loc = Location::parse(&ts.image);
            let tex = load_texture_from(&loc)
                .await
                .with_context(|| format!("Loading texture {}", ts.image))?;
            textures.push(tex);
        }

        log::info!(
            "Map {} ready: {} tilesets, {} animated tiles",
            source,
            textures.len(),
            world.atlas.animated_tile_count()
        );

        Ok(Self {
            world,
            textures,
            source,
        })
    }

    pub fn world(&self) -> &TileWorld {
        &self.world
    }

    pub fn into_world(self) -> TileWorld {
        self.world
    }

    pub fn source(&self) -> &Location {
        &self.source
    }

    /// Draw visible tiles using the wall clock for animations.
    pub fn draw(&self, camera: &Camera) {
        let elapsed_ms = (get_time() * 1000.0) as u64;
        self.draw_at(camera, elapsed_ms);
    }

    pub fn draw_at(&self, camera: &Camera, elapsed_ms: u64) {
        for cmd in plan_draw(&self.world, camera, elapsed_ms) {
            let Some(tex) = self.textures.get(cmd.tileset_index) else {
                continue;
            };
            let opacity = self.world.layers[cmd.layer_index].opacity;
            draw_texture_ex(
                tex,
                cmd.dest.x,
                cmd.dest.y,
                Color::new(1.0, 1.0, 1.0, opacity),
                DrawTextureParams {
                    source: Some(cmd.src),
                    dest_size: Some(cmd.dest_size),
                    flip_x: cmd.flip_x,
                    flip_y: cmd.flip_y,
                    ..Default::default()
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::json_loader::decode_map_str;

    fn world(json: &str) -> TileWorld {
        TileWorld::from_ir(decode_map_str(json, &Location::parse("t.json")).expect("decode"))
    }

    #[test]
    fn finds_player_start_across_object_layers() {
        let w = world(
            r#"{"tilewidth":16,"tileheight":16,"layers":[
                {"type":"objectgroup","name":"npcs","objects":[{"id":1,"name":"elder","x":5,"y":5}]},
                {"type":"objectgroup","name":"spawns","objects":[{"id":2,"name":"Player","x":48,"y":64}]}
            ]}"#,
        );
        assert_eq!(w.find_player_start(), Some(vec2(48.0, 64.0)));
    }

    #[test]
    fn no_player_start_is_none() {
        let w = world(r#"{"tilewidth":16,"tileheight":16,"layers":[]}"#);
        assert_eq!(w.find_player_start(), None);
    }

    #[test]
    fn named_layer_iteration_and_lookup() {
        let w = world(
            r#"{"tilewidth":16,"tileheight":16,"layers":[
                {"type":"tilelayer","name":"Walls","width":2,"height":1,"data":[0,3]}
            ],"tilesets":[{"firstgid":1,"image":"t.png","tilewidth":16,"tileheight":16,"tilecount":4,"columns":2}]}"#,
        );
        let mut n = 0;
        assert!(w.for_each_tile_in_layer("Walls", |_, _, _| n += 1));
        assert_eq!(n, 2);
        assert!(!w.for_each_tile_in_layer("Nope", |_, _, _| {}));
        assert_eq!(w.tile_at("Walls", 1, 0), Some(TileId(3)));
        assert_eq!(w.world_to_tile(vec2(17.0, -1.0)), (1, -1));
    }

    #[test]
    fn world_clones_are_independent_copies() {
        let ir = decode_map_str(
            r#"{"tilewidth":16,"tileheight":16,"layers":[
                {"type":"tilelayer","name":"Walls","width":2,"height":1,"data":[1,0]}
            ],"tilesets":[{"firstgid":1,"image":"t.png","tilewidth":16,"tileheight":16,"tilecount":4,"columns":2}]}"#,
            &Location::parse("t.json"),
        )
        .expect("decode");
        let w = TileWorld::from_ir(ir.clone());
        let copy = w.clone();
        drop(w);
        assert_eq!(copy.layers().len(), ir.layers.len());
        assert_eq!(copy.tile_at("Walls", 0, 0), Some(TileId(1)));
        assert!(format!("{copy:?}").contains("Walls"));
    }
}

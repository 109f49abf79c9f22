use crate::command::{DrawCommand, TileRegion};
use crate::map::TileWorld;
use crate::spatial::TileCoord;
use macroquad::prelude::*;

const CULL_MARGIN_TILES: i32 = 1;

/// View into the world: top-left world position, canvas size in screen
/// pixels, and a uniform zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl Camera {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            zoom: 1.0,
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    #[inline]
    fn scale(&self) -> f32 {
        if self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    /// Size of the visible world area.
    pub fn world_extent(&self) -> Vec2 {
        vec2(self.width, self.height) / self.scale()
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - vec2(self.x, self.y)) * self.scale()
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen / self.scale() + vec2(self.x, self.y)
    }
}

/// Tile rectangle covering the camera plus a one-tile margin. `offset` is
/// the layer's world offset.
pub fn visible_tile_region(cam: &Camera, tile_w: u32, tile_h: u32, offset: Vec2) -> TileRegion {
    let tw = tile_w.max(1) as f32;
    let th = tile_h.max(1) as f32;
    let min = vec2(cam.x, cam.y) - offset;
    let max = min + cam.world_extent();

    TileRegion {
        start_x: (min.x / tw).floor() as i32 - CULL_MARGIN_TILES,
        start_y: (min.y / th).floor() as i32 - CULL_MARGIN_TILES,
        end_x: (max.x / tw).ceil() as i32 + CULL_MARGIN_TILES,
        end_y: (max.y / th).ceil() as i32 + CULL_MARGIN_TILES,
    }
}

fn clamp_region(region: TileRegion, bounds: Option<(TileCoord, TileCoord)>) -> TileRegion {
    match bounds {
        Some((min, max)) => TileRegion {
            start_x: region.start_x.max(min.x),
            start_y: region.start_y.max(min.y),
            end_x: region.end_x.min(max.x),
            end_y: region.end_y.min(max.y),
        },
        None => TileRegion {
            start_x: 0,
            start_y: 0,
            end_x: 0,
            end_y: 0,
        },
    }
}

/// Blits needed to draw every visible tile of every visible tile layer,
/// in layer order then row-major order. Animated tiles are swapped for the
/// frame showing at `elapsed_ms`.
pub fn plan_draw(world: &TileWorld, cam: &Camera, elapsed_ms: u64) -> Vec<DrawCommand> {
    let atlas = world.atlas();
    let scale = cam.scale();
    let mut out = Vec::new();

    for (layer_index, layer) in world.layers().iter().enumerate() {
        if !layer.visible {
            continue;
        }
        let Some(storage) = layer.tiles() else {
            continue;
        };

        let region = visible_tile_region(cam, world.tile_w, world.tile_h, layer.offset);
        let region = clamp_region(region, storage.bounds());

        for y in region.start_y..region.end_y {
            for x in region.start_x..region.end_x {
                let Some(raw) = storage.tile_at(x, y) else {
                    continue;
                };
                let gid = atlas.animated_gid(raw, elapsed_ms);
                let Some(tileset_index) = atlas.resolve_index(gid) else {
                    continue;
                };
                let ts = &atlas.ranges()[tileset_index];
                let local = gid.clean() - ts.first_gid;

                // oversized tiles are anchored to the bottom-left of their cell
                let world_pos = layer.offset
                    + vec2(
                        (x * world.tile_w as i32) as f32,
                        ((y + 1) * world.tile_h as i32) as f32 - ts.tile_h as f32,
                    );

                out.push(DrawCommand {
                    layer_index,
                    tileset_index,
                    src: ts.source_rect(local),
                    dest: cam.world_to_screen(world_pos),
                    dest_size: vec2(ts.tile_w as f32, ts.tile_h as f32) * scale,
                    flip_x: raw.flip_h(),
                    flip_y: raw.flip_v(),
                });
            }
        }
    }
    out
}

/// Whether a tile is inside the camera's culled region.
pub fn tile_visible(world: &TileWorld, cam: &Camera, x: i32, y: i32) -> bool {
    visible_tile_region(cam, world.tile_w, world.tile_h, Vec2::ZERO).contains(x, y)
}

mod auth;
mod overrides;
mod remote;

pub use auth::{Identity, Role};
pub use overrides::{CollisionOverrides, OverrideKey, OverrideStore};
pub use remote::{HttpOverrideBackend, MemoryOverrideBackend, OverrideBackend, OverridePayload};

use crate::config::DebugConfig;
use crate::ir_map::IrLayer;
use crate::map::TileWorld;
use macroquad::prelude::{vec2, Rect};

/// The one layer that is never collidable and never overridable.
pub const FLOOR_LAYER: &str = "floor";

/// Layer property that forces a layer's default collidability.
pub const COLLIDES_PROPERTY: &str = "collides";

#[inline]
pub fn is_floor(layer_name: &str) -> bool {
    layer_name == FLOOR_LAYER
}

/// Static collision classification of layers plus the query inset.
#[derive(Debug, Clone)]
pub struct CollisionRules {
    keywords: Vec<String>,
    inset: f32,
}

impl Default for CollisionRules {
    fn default() -> Self {
        Self::from_config(&DebugConfig::default())
    }
}

impl CollisionRules {
    pub fn from_config(config: &DebugConfig) -> Self {
        Self {
            keywords: config
                .non_collidable_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            inset: config.collision_inset.max(0.0),
        }
    }

    pub fn inset(&self) -> f32 {
        self.inset
    }

    /// Default collidability of a tile layer before overrides.
    pub fn layer_collidable(&self, layer: &IrLayer) -> bool {
        if is_floor(&layer.name) || layer.tiles().is_none() {
            return false;
        }
        if let Some(forced) = layer.properties.get_bool(COLLIDES_PROPERTY) {
            return forced;
        }
        let name = layer.name.to_lowercase();
        !self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

/// Answers "is this spot blocked" for one world and its overrides.
pub struct CollisionResolver<'a> {
    world: &'a TileWorld,
    overrides: &'a CollisionOverrides,
    rules: &'a CollisionRules,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(
        world: &'a TileWorld,
        overrides: &'a CollisionOverrides,
        rules: &'a CollisionRules,
    ) -> Self {
        Self {
            world,
            overrides,
            rules,
        }
    }

    /// Effective collision of one tile: `None` when the layer is the floor
    /// or there is no tile, otherwise the override if any, else the layer
    /// default.
    pub fn tile_state(&self, layer: &IrLayer, x: i32, y: i32) -> Option<bool> {
        if is_floor(&layer.name) {
            return None;
        }
        layer.tiles()?.tile_at(x, y)?;
        Some(
            self.overrides
                .get(x, y, &layer.name)
                .unwrap_or_else(|| self.rules.layer_collidable(layer)),
        )
    }

    /// Whether the box `(x, y, width, height)` touches a collidable tile.
    ///
    /// The box is shrunk by the inset on every side and only its four
    /// corners are sampled.
    pub fn is_blocked(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let inset_x = self.rules.inset.min(width.max(0.0) / 2.0);
        let inset_y = self.rules.inset.min(height.max(0.0) / 2.0);
        let left = x + inset_x;
        let top = y + inset_y;
        let right = (x + width - inset_x).max(left);
        let bottom = (y + height - inset_y).max(top);

        let corners = [(left, top), (right, top), (left, bottom), (right, bottom)];

        for (_, layer) in self.world.tile_layers() {
            if is_floor(&layer.name) {
                continue;
            }
            for &(cx, cy) in &corners {
                let (tx, ty) = self.world.world_to_tile(vec2(cx, cy) - layer.offset);
                if self.tile_state(layer, tx, ty) == Some(true) {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_rect_blocked(&self, r: Rect) -> bool {
        self.is_blocked(r.x, r.y, r.w, r.h)
    }
}

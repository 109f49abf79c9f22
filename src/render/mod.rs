mod cull;

pub use cull::*;

use crate::map::Map;

/// Owns the current map, if any, and draws it. Drawing before a map is set
/// is skipped and reported once.
#[derive(Default)]
pub struct MapRenderer {
    map: Option<Map>,
    warned_unready: bool,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current map; the previous one is dropped.
    pub fn set_map(&mut self, map: Map) {
        self.map = Some(map);
        self.warned_unready = false;
    }

    pub fn clear(&mut self) {
        self.map = None;
    }

    pub fn map(&self) -> Option<&Map> {
        self.map.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.map.is_some()
    }

    /// Returns whether anything was drawn.
    pub fn draw(&mut self, camera: &Camera) -> bool {
        match &self.map {
            Some(map) => {
                map.draw(camera);
                true
            }
            None => {
                if !self.warned_unready {
                    log::warn!("draw_map called before the map finished loading; skipping");
                    self.warned_unready = true;
                }
                false
            }
        }
    }
}

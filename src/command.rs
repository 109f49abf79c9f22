use macroquad::prelude::{Rect, Vec2};

/// One tile blit produced by the culling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub layer_index: usize,
    pub tileset_index: usize,
    pub src: Rect,
    pub dest: Vec2,
    pub dest_size: Vec2,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// A rectangle of tile coordinates, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl TileRegion {
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.start_x && x < self.end_x && y >= self.start_y && y < self.end_y
    }

    pub fn width(&self) -> i32 {
        (self.end_x - self.start_x).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.end_y - self.start_y).max(0)
    }
}

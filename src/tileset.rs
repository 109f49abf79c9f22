use crate::ir_map::IrTileset;
use crate::spatial::TileId;
use macroquad::prelude::Rect;
use std::collections::HashMap;

/// One frame of an animated tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub local_id: u32,
    pub duration_ms: u32,
}

/// Frames of one animated tile plus their summed duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileAnimation {
    pub frames: Vec<AnimationFrame>,
    pub total_ms: u64,
}

impl TileAnimation {
    pub fn new(frames: Vec<AnimationFrame>) -> Self {
        let total_ms = frames.iter().map(|f| u64::from(f.duration_ms)).sum();
        Self { frames, total_ms }
    }

    /// Local id of the frame showing `elapsed_ms` after the clock origin:
    /// the first frame whose cumulative duration exceeds
    /// `elapsed_ms mod total_ms`.
    pub fn frame_at(&self, elapsed_ms: u64) -> Option<u32> {
        let first = self.frames.first()?;
        if self.total_ms == 0 {
            return Some(first.local_id);
        }
        let t = elapsed_ms % self.total_ms;
        let mut acc = 0u64;
        for frame in &self.frames {
            acc += u64::from(frame.duration_ms);
            if acc > t {
                return Some(frame.local_id);
            }
        }
        self.frames.last().map(|f| f.local_id)
    }
}

/// Grid geometry of one tileset image.
#[derive(Debug, Clone)]
pub struct TilesetRange {
    pub first_gid: u32,
    pub image: String,
    pub columns: u32,
    pub tilecount: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub spacing: u32,
    pub margin: u32,
}

impl TilesetRange {
    /// Source rectangle of a local id inside the tileset image.
    pub fn source_rect(&self, local: u32) -> Rect {
        let cols = self.columns.max(1);
        let col = local % cols;
        let row = local / cols;
        let sx = self.margin + col * (self.tile_w + self.spacing);
        let sy = self.margin + row * (self.tile_h + self.spacing);
        Rect::new(sx as f32, sy as f32, self.tile_w as f32, self.tile_h as f32)
    }
}

/// Resolves global tile ids to tilesets and holds the animation table.
///
/// Ranges are kept sorted ascending by `first_gid`; resolution scans them
/// from the highest start down and stops at the first range that starts at
/// or below the gid.
#[derive(Debug, Clone, Default)]
pub struct TilesetAtlas {
    ranges: Vec<TilesetRange>,
    // first_gid -> local id -> animation
    animations: HashMap<u32, HashMap<u32, TileAnimation>>,
}

impl TilesetAtlas {
    pub fn from_ir(tilesets: &[IrTileset]) -> Self {
        let mut ranges = Vec::with_capacity(tilesets.len());
        let mut animations = HashMap::new();

        for ts in tilesets {
            ranges.push(TilesetRange {
                first_gid: ts.first_gid,
                image: ts.image.clone(),
                columns: ts.columns,
                tilecount: ts.tilecount,
                tile_w: ts.tile_w,
                tile_h: ts.tile_h,
                spacing: ts.spacing,
                margin: ts.margin,
            });

            let table: HashMap<u32, TileAnimation> = ts
                .tiles
                .iter()
                .filter(|t| !t.animation.is_empty())
                .map(|t| {
                    let frames = t
                        .animation
                        .iter()
                        .map(|f| AnimationFrame {
                            local_id: f.local_id,
                            duration_ms: f.duration_ms,
                        })
                        .collect();
                    (t.id, TileAnimation::new(frames))
                })
                .collect();
            if !table.is_empty() {
                animations.insert(ts.first_gid, table);
            }
        }

        ranges.sort_by_key(|r| r.first_gid);
        Self { ranges, animations }
    }

    pub fn ranges(&self) -> &[TilesetRange] {
        &self.ranges
    }

    /// Index into [`Self::ranges`] of the tileset owning `gid`.
    pub fn resolve_index(&self, gid: TileId) -> Option<usize> {
        let clean = gid.clean();
        if clean == 0 {
            return None;
        }
        self.ranges.iter().rposition(|r| r.first_gid <= clean)
    }

    /// Tileset owning `gid` and the tile's local id inside it.
    #[inline]
    pub fn resolve(&self, gid: TileId) -> Option<(&TilesetRange, u32)> {
        let idx = self.resolve_index(gid)?;
        let ts = &self.ranges[idx];
        Some((ts, gid.clean() - ts.first_gid))
    }

    /// Animation of a tile, if its tileset declares one.
    pub fn animation(&self, gid: TileId) -> Option<&TileAnimation> {
        let (ts, local) = self.resolve(gid)?;
        self.animations.get(&ts.first_gid)?.get(&local)
    }

    /// Gid to draw for `gid` at `elapsed_ms`; non-animated tiles map to
    /// themselves (flip flags are dropped).
    pub fn animated_gid(&self, gid: TileId, elapsed_ms: u64) -> TileId {
        let Some((ts, local)) = self.resolve(gid) else {
            return TileId(gid.clean());
        };
        let frame = self
            .animations
            .get(&ts.first_gid)
            .and_then(|table| table.get(&local))
            .and_then(|anim| anim.frame_at(elapsed_ms));
        match frame {
            Some(local_frame) => TileId(ts.first_gid + local_frame),
            None => TileId(gid.clean()),
        }
    }

    /// Number of animated tiles across all tilesets.
    pub fn animated_tile_count(&self) -> usize {
        self.animations.values().map(HashMap::len).sum()
    }
}

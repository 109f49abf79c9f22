use crate::ir_map::{IrChunk, TileStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

impl TileId {
    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
}

/// Tile coordinate in layer space (not pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl IrChunk {
    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && ((x - self.x) as usize) < self.width
            && ((y - self.y) as usize) < self.height
    }

    fn get(&self, x: i32, y: i32) -> Option<TileId> {
        if !self.contains(x, y) {
            return None;
        }
        let idx = (y - self.y) as usize * self.width + (x - self.x) as usize;
        self.data.get(idx).copied().map(TileId)
    }
}

impl TileStorage {
    /// Tile at a tile coordinate; `None` outside the stored area or when the
    /// cell is empty.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<TileId> {
        let id = match self {
            TileStorage::Flat {
                width,
                height,
                data,
            } => {
                if x < 0 || y < 0 || x as usize >= *width || y as usize >= *height {
                    return None;
                }
                data.get(y as usize * *width + x as usize).copied().map(TileId)
            }
            TileStorage::Chunked { chunks } => chunks.iter().find_map(|c| c.get(x, y)),
        }?;
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Number of cells (empty or not) this storage holds.
    pub fn cell_count(&self) -> usize {
        match self {
            TileStorage::Flat { data, .. } => data.len(),
            TileStorage::Chunked { chunks } => chunks.iter().map(|c| c.width * c.height).sum(),
        }
    }

    /// Inclusive-exclusive tile bounds `(min, max)` of the stored area.
    pub fn bounds(&self) -> Option<(TileCoord, TileCoord)> {
        match self {
            TileStorage::Flat { width, height, .. } => Some((
                TileCoord { x: 0, y: 0 },
                TileCoord {
                    x: *width as i32,
                    y: *height as i32,
                },
            )),
            TileStorage::Chunked { chunks } => {
                let mut it = chunks.iter();
                let first = it.next()?;
                let mut min = TileCoord { x: first.x, y: first.y };
                let mut max = TileCoord {
                    x: first.x + first.width as i32,
                    y: first.y + first.height as i32,
                };
                for c in it {
                    min.x = min.x.min(c.x);
                    min.y = min.y.min(c.y);
                    max.x = max.x.max(c.x + c.width as i32);
                    max.y = max.y.max(c.y + c.height as i32);
                }
                Some((min, max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_lookup_masks_nothing_but_skips_empty() {
        let storage = TileStorage::Flat {
            width: 2,
            height: 2,
            data: vec![0, 3, 4 | FLIP_H, 0],
        };
        assert_eq!(storage.tile_at(0, 0), None);
        assert_eq!(storage.tile_at(1, 0), Some(TileId(3)));
        assert_eq!(storage.tile_at(0, 1).map(TileId::clean), Some(4));
        assert_eq!(storage.tile_at(2, 0), None);
        assert_eq!(storage.tile_at(-1, 0), None);
    }

    #[test]
    fn chunked_lookup_offsets_by_origin() {
        let storage = TileStorage::Chunked {
            chunks: vec![IrChunk {
                x: -16,
                y: 16,
                width: 16,
                height: 16,
                data: {
                    let mut d = vec![0; 256];
                    d[17] = 9; // local (1,1)
                    d
                },
            }],
        };
        assert_eq!(storage.tile_at(-15, 17), Some(TileId(9)));
        assert_eq!(storage.tile_at(1, 1), None);
        assert_eq!(storage.cell_count(), 256);
    }

    #[test]
    fn flip_flags_are_stripped_by_clean() {
        let id = TileId(7 | FLIP_H | FLIP_V | FLIP_D);
        assert_eq!(id.clean(), 7);
        assert!(id.flip_h() && id.flip_v() && id.flip_d());
    }
}

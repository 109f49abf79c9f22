use super::TileId;
use crate::ir_map::{IrLayer, TileStorage};

/// Visit every cell of a tile storage exactly once, empty cells included.
///
/// Chunked storage is walked chunk by chunk with coordinates offset by the
/// chunk origin; flat storage derives `(x, y)` from the index and the row
/// stride. Callers never need to know which form they were given.
pub fn for_each_tile<F>(storage: &TileStorage, mut visit: F)
where
    F: FnMut(TileId, i32, i32),
{
    match storage {
        TileStorage::Flat { width, data, .. } => {
            if *width == 0 {
                return;
            }
            for (idx, gid) in data.iter().enumerate() {
                let x = (idx % *width) as i32;
                let y = (idx / *width) as i32;
                visit(TileId(*gid), x, y);
            }
        }
        TileStorage::Chunked { chunks } => {
            for chunk in chunks {
                if chunk.width == 0 {
                    continue;
                }
                for (idx, gid) in chunk.data.iter().take(chunk.width * chunk.height).enumerate() {
                    let x = chunk.x + (idx % chunk.width) as i32;
                    let y = chunk.y + (idx / chunk.width) as i32;
                    visit(TileId(*gid), x, y);
                }
            }
        }
    }
}

/// Like [`for_each_tile`] but skips empty cells.
pub fn for_each_filled_tile<F>(storage: &TileStorage, mut visit: F)
where
    F: FnMut(TileId, i32, i32),
{
    for_each_tile(storage, |id, x, y| {
        if !id.is_empty() {
            visit(id, x, y);
        }
    });
}

/// [`for_each_tile`] over a layer; object layers visit nothing.
pub fn for_each_tile_in_layer<F>(layer: &IrLayer, visit: F)
where
    F: FnMut(TileId, i32, i32),
{
    if let Some(storage) = layer.tiles() {
        for_each_tile(storage, visit);
    }
}

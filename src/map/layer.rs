use glam::Vec2;

use crate::math::Aabb;
use crate::tiles::{lookup_tile, Tile, Tileset};

const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
const FLIP_MASK: u32 = FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY;

/// A tile resolved at a world coordinate, with its collision box already
/// translated to the tile's origin.
pub struct TileHit<'a> {
    pub tile: &'a Tile,
    pub aabb: Option<Aabb>,
}

/// One tile-grid layer: a flat gid array plus the tile pixel size.
#[derive(Debug)]
pub struct Layer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    tile_width: f32,
    tile_height: f32,
    gids: Vec<u32>,
}

impl Layer {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        tile_width: f32,
        tile_height: f32,
        gids: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(gids.len(), (width * height) as usize);
        Self { name: name.into(), width, height, tile_width, tile_height, gids }
    }

    /// Resolve the tile occupying a world pixel coordinate.
    ///
    /// Flip flags in the gid's high bits are masked off before lookup. Off-map
    /// coordinates and empty cells return `None`.
    pub fn tile_at<'a>(
        &self,
        tilesets: &'a [Tileset],
        world_x: f32,
        world_y: f32,
    ) -> Option<TileHit<'a>> {
        let col = (world_x / self.tile_width).floor();
        let row = (world_y / self.tile_height).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        let (col, row) = (col as u32, row as u32);

        let gid = self.gids[(row * self.width + col) as usize] & !FLIP_MASK;
        if gid == 0 {
            return None;
        }
        let tile = lookup_tile(tilesets, gid)?;
        let origin = Vec2::new(col as f32 * self.tile_width, row as f32 * self.tile_height);
        Some(TileHit { tile, aabb: tile.aabb.map(|a| a.offset(origin)) })
    }
}

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec2;
use serde_json::Value;

use crate::map::data::{fold_properties, TilesetFile};
use crate::math::Aabb;

/// One tile's collision data. Built once at tileset load, immutable after.
///
/// The stored box is tile-local; [`crate::map::layer::Layer::tile_at`]
/// translates it to world coordinates per query. Tiles without a box are
/// non-solid.
#[derive(Debug, Clone)]
pub struct Tile {
    pub index: u32,
    pub aabb: Option<Aabb>,
    pub oneway: bool,
    pub properties: HashMap<String, Value>,
}

impl Tile {
    fn plain(index: u32) -> Self {
        Self { index, aabb: None, oneway: false, properties: HashMap::new() }
    }
}

/// Maps a global tile id to per-tile collision data.
#[derive(Debug)]
pub struct Tileset {
    pub firstgid: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    tiles: Vec<Tile>,
}

impl Tileset {
    pub fn from_file(path: &Path, firstgid: u32) -> Result<Self> {
        log::debug!("loading tileset: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading tileset {}", path.display()))?;
        let data: TilesetFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing tileset {}", path.display()))?;
        Ok(Self::from_data(&data, firstgid))
    }

    pub fn from_data(data: &TilesetFile, firstgid: u32) -> Self {
        let mut tiles: Vec<Tile> =
            (0..data.tilecount).map(Tile::plain).collect();
        for td in &data.tiles {
            let Some(tile) = tiles.get_mut(td.id as usize) else {
                continue;
            };
            if let Some(group) = &td.objectgroup {
                // Tiled allows several collision shapes; this engine keeps one.
                if let Some(rect) = group.objects.first() {
                    let half = Vec2::new(rect.width / 2.0, rect.height / 2.0);
                    let center = Vec2::new(rect.x, rect.y) + half;
                    tile.aabb = Some(Aabb::new(center, half));
                }
            }
            tile.properties = fold_properties(&td.properties);
            tile.oneway = tile.properties.get("oneway") == Some(&Value::Bool(true));
        }
        Self {
            firstgid,
            tile_width: data.tilewidth as f32,
            tile_height: data.tileheight as f32,
            tiles,
        }
    }

    /// Direct construction for dynamically built maps.
    pub fn with_tiles(
        firstgid: u32,
        tile_width: f32,
        tile_height: f32,
        tiles: Vec<Tile>,
    ) -> Self {
        Self { firstgid, tile_width, tile_height, tiles }
    }

    /// A tileset whose tile 0 is a full solid square, handy as ground fill.
    pub fn solid_square(firstgid: u32, size: f32) -> Self {
        let half = Vec2::splat(size / 2.0);
        let tile = Tile {
            index: 0,
            aabb: Some(Aabb::new(half, half)),
            oneway: false,
            properties: HashMap::new(),
        };
        Self::with_tiles(firstgid, size, size, vec![tile])
    }

    pub fn tile(&self, gid: u32) -> Option<&Tile> {
        let index = gid.checked_sub(self.firstgid)?;
        self.tiles.get(index as usize)
    }
}

/// Resolve a gid against a tileset list the way the map does: last tileset
/// whose firstgid does not exceed the id wins.
pub fn lookup_tile<'a>(tilesets: &'a [Tileset], gid: u32) -> Option<&'a Tile> {
    tilesets
        .iter()
        .rev()
        .find(|ts| ts.firstgid <= gid)
        .and_then(|ts| ts.tile(gid))
}

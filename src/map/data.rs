//! serde models of the Tiled JSON files the game ships with.
//!
//! Only the fields the simulation consumes are modelled; the renderer reads
//! the same files separately for tile art.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct MapFile {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub layers: Vec<LayerData>,
    #[serde(default)]
    pub tilesets: Vec<TilesetRef>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// External tileset reference, resolved relative to the map file.
#[derive(Debug, Deserialize)]
pub struct TilesetRef {
    pub firstgid: u32,
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct LayerData {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Tile layers only: gids with flip flags in the high bits.
    #[serde(default)]
    pub data: Vec<u32>,
    /// Object layers only.
    #[serde(default)]
    pub objects: Vec<ObjectData>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectData {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Deserialize)]
pub struct TilesetFile {
    pub tilewidth: u32,
    pub tileheight: u32,
    pub tilecount: u32,
    #[serde(default)]
    pub tiles: Vec<TileData>,
}

/// Per-tile extras: at most one collision rect plus a property list.
#[derive(Debug, Deserialize)]
pub struct TileData {
    pub id: u32,
    #[serde(default)]
    pub objectgroup: Option<ObjectGroupData>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectGroupData {
    #[serde(default)]
    pub objects: Vec<CollisionRect>,
}

#[derive(Debug, Deserialize)]
pub struct CollisionRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Tiled's `[{name, type, value}]` property triple.
#[derive(Debug, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: Value,
}

/// Fold a Tiled property list into a plain name->value map.
pub fn fold_properties(props: &[Property]) -> HashMap<String, Value> {
    props
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect()
}

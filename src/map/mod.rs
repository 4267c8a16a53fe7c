//! Map loading and the per-frame simulation driver.
//!
//! A [`Map`] owns the ECS world, the tile layers, and the broad-phase grid.
//! The game layer calls [`Map::update`] once per frame with the current
//! input, then drains [`MapEvent`]s and reads [`Map::draw_list`].

pub mod data;
pub mod layer;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde_json::Value;

use crate::ecs::components::{
    ActorState, Animation, BodyBox, Collisions, Contacts, GridMembership, InteractCollisions,
    Kinematic, Name, Player, PlayerController, Position, PrevPosition, PrevVelocity, Properties,
    Scripts, Velocity,
};
use crate::ecs::systems::{collision, controller, physics, spatial};
use crate::events::MapEvent;
use crate::input::InputSource;
use crate::map::data::{fold_properties, MapFile, ObjectData};
use crate::map::layer::Layer;
use crate::spatial::{AreaGrid, DEFAULT_CELL_SIZE};
use crate::tiles::Tileset;

/// Half-extents for point objects that don't carry a size in the map file.
pub const DEFAULT_ACTOR_HALF: Vec2 = Vec2::splat(8.0);

/// What a map object becomes when spawned. The set is closed: an unknown
/// type string in the map file is a load error, not a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Actor,
    Npc,
    StaticActor,
    Marker,
    Camera,
    CameraMarker,
}

impl EntityKind {
    pub fn parse(kind: &str) -> Result<Self> {
        Ok(match kind {
            "Actor" => Self::Actor,
            "NPC" => Self::Npc,
            "StaticActor" => Self::StaticActor,
            "Marker" => Self::Marker,
            "Camera" => Self::Camera,
            "CameraMarker" => Self::CameraMarker,
            other => bail!("unknown entity type {other:?}"),
        })
    }
}

/// Broad-phase tuning. The defaults match the shipped maps.
#[derive(Debug, Clone, Copy)]
pub struct MapConfig {
    pub grid_cell_width: f32,
    pub grid_cell_height: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { grid_cell_width: DEFAULT_CELL_SIZE, grid_cell_height: DEFAULT_CELL_SIZE }
    }
}

/// Everything needed to spawn one simulated actor.
#[derive(Debug, Clone)]
pub struct ActorSpawn {
    pub name: String,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub half: Vec2,
    pub kinematic: bool,
    pub player: bool,
    pub talk: Option<String>,
    pub properties: HashMap<String, Value>,
}

impl ActorSpawn {
    pub fn new(name: impl Into<String>, pos: Vec2) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Actor,
            pos,
            half: DEFAULT_ACTOR_HALF,
            kinematic: false,
            player: false,
            talk: None,
            properties: HashMap::new(),
        }
    }

    pub fn half(mut self, half: Vec2) -> Self {
        self.half = half;
        self
    }

    pub fn kinematic(mut self) -> Self {
        self.kinematic = true;
        self
    }

    pub fn talk(mut self, script: impl Into<String>) -> Self {
        self.talk = Some(script.into());
        self
    }
}

/// One entry of [`Map::draw_list`].
#[derive(Debug, Clone, Copy)]
pub struct DrawInfo {
    pub entity: hecs::Entity,
    pub position: Vec2,
    pub half: Vec2,
    pub animation: &'static str,
    pub flip: bool,
}

pub struct Map {
    world: hecs::World,
    layers: Vec<Layer>,
    tilesets: Vec<Tileset>,
    grid: AreaGrid,
    /// Simulated actors in spawn order; update order follows it.
    actors: Vec<hecs::Entity>,
    by_name: HashMap<String, hecs::Entity>,
    pub width: u32,
    pub height: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    properties: HashMap<String, Value>,
    events: Vec<MapEvent>,
}

impl Map {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, MapConfig::default())
    }

    pub fn load_with_config(path: impl AsRef<Path>, config: MapConfig) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading map: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading map {}", path.display()))?;
        let data: MapFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing map {}", path.display()))?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tilesets = Vec::with_capacity(data.tilesets.len());
        for ts_ref in &data.tilesets {
            tilesets.push(Tileset::from_file(&dir.join(&ts_ref.source), ts_ref.firstgid)?);
        }

        let mut map = Self::from_parts(
            data.width,
            data.height,
            data.tilewidth as f32,
            data.tileheight as f32,
            Vec::new(),
            tilesets,
            config,
        );
        map.properties = fold_properties(&data.properties);

        for layer in &data.layers {
            match layer.kind.as_str() {
                "tilelayer" => {
                    let expected = (layer.width * layer.height) as usize;
                    if layer.data.len() != expected {
                        bail!(
                            "tile layer {:?}: {} gids for a {}x{} grid",
                            layer.name,
                            layer.data.len(),
                            layer.width,
                            layer.height
                        );
                    }
                    map.layers.push(Layer::new(
                        layer.name.clone(),
                        layer.width,
                        layer.height,
                        map.tile_width,
                        map.tile_height,
                        layer.data.clone(),
                    ));
                }
                "objectgroup" => {
                    for object in &layer.objects {
                        map.spawn_map_object(object)?;
                    }
                }
                other => bail!("unsupported layer type: {other}"),
            }
        }
        Ok(map)
    }

    /// Assemble a map directly, without a file. Tests and generated maps.
    pub fn from_parts(
        width: u32,
        height: u32,
        tile_width: f32,
        tile_height: f32,
        layers: Vec<Layer>,
        tilesets: Vec<Tileset>,
        config: MapConfig,
    ) -> Self {
        let pixel_width = width as f32 * tile_width;
        let pixel_height = height as f32 * tile_height;
        Self {
            world: hecs::World::new(),
            layers,
            tilesets,
            grid: AreaGrid::new(
                pixel_width,
                pixel_height,
                config.grid_cell_width,
                config.grid_cell_height,
            ),
            actors: Vec::new(),
            by_name: HashMap::new(),
            width,
            height,
            tile_width,
            tile_height,
            properties: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Instantiate one object-layer entry.
    pub fn spawn_map_object(&mut self, object: &ObjectData) -> Result<hecs::Entity> {
        let kind = EntityKind::parse(&object.kind)
            .with_context(|| format!("object {:?}", object.name))?;
        let properties = fold_properties(&object.properties);

        let entity = match kind {
            EntityKind::Actor | EntityKind::Npc | EntityKind::StaticActor => {
                // sized objects are placed by their top-left corner in the
                // file; point objects already carry their center
                let (pos, half) = if object.width > 0.0 && object.height > 0.0 {
                    let half = Vec2::new(object.width / 2.0, object.height / 2.0);
                    (Vec2::new(object.x, object.y) + half, half)
                } else {
                    (Vec2::new(object.x, object.y), DEFAULT_ACTOR_HALF)
                };
                let talk = if kind == EntityKind::Npc {
                    properties
                        .get("cutsceneTalk")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                } else {
                    None
                };
                let mut spawn = ActorSpawn::new(object.name.clone(), pos).half(half);
                spawn.kind = kind;
                spawn.kinematic = matches!(kind, EntityKind::Npc | EntityKind::StaticActor);
                spawn.talk = talk;
                spawn.properties = properties;
                self.spawn_actor(spawn)
            }
            EntityKind::Marker | EntityKind::Camera | EntityKind::CameraMarker => {
                let entity = self.world.spawn((
                    Name(object.name.clone()),
                    kind,
                    Position(Vec2::new(object.x, object.y)),
                    Properties(properties),
                ));
                self.by_name.insert(object.name.clone(), entity);
                entity
            }
        };
        Ok(entity)
    }

    pub fn spawn_actor(&mut self, spawn: ActorSpawn) -> hecs::Entity {
        let entity = self.world.spawn((
            Name(spawn.name.clone()),
            spawn.kind,
            Position(spawn.pos),
            PrevPosition(spawn.pos),
            Velocity(Vec2::ZERO),
            PrevVelocity(Vec2::ZERO),
            BodyBox { half: spawn.half },
            Contacts::default(),
            Collisions::default(),
            InteractCollisions::default(),
            GridMembership::default(),
            Properties(spawn.properties),
        ));
        if spawn.kinematic {
            let _ = self.world.insert_one(entity, Kinematic);
        }
        if spawn.talk.is_some() {
            let _ = self.world.insert_one(entity, Scripts { talk: spawn.talk });
        }
        if spawn.player {
            let _ = self.world.insert(
                entity,
                (
                    Player,
                    ActorState::Idle,
                    Animation::default(),
                    PlayerController::default(),
                ),
            );
        }
        self.actors.push(entity);
        self.by_name.insert(spawn.name, entity);
        spatial::update_actor_areas(&mut self.world, &mut self.grid, entity);
        entity
    }

    pub fn spawn_player(&mut self, name: impl Into<String>, pos: Vec2) -> hecs::Entity {
        let mut spawn = ActorSpawn::new(name, pos);
        spawn.player = true;
        self.spawn_actor(spawn)
    }

    pub fn despawn(&mut self, entity: hecs::Entity) {
        spatial::clear_actor_areas(&mut self.world, &mut self.grid, entity);
        self.actors.retain(|e| *e != entity);
        self.by_name.retain(|_, e| *e != entity);
        let _ = self.world.despawn(entity);
    }

    /// One simulation frame. `delta` is in frames, 1.0 at the nominal rate.
    pub fn update(&mut self, delta: f32, input: &dyn InputSource) {
        let actors = self.actors.clone();
        let tile_size = Vec2::new(self.tile_width, self.tile_height);

        for &entity in &actors {
            controller::update(&mut self.world, entity, delta, input);
            physics::update_actor(
                &mut self.world,
                &self.layers,
                &self.tilesets,
                tile_size,
                entity,
                delta,
            );
            spatial::update_actor_areas(&mut self.world, &mut self.grid, entity);
        }

        collision::check_collisions(&mut self.world, &self.grid);

        for &entity in &actors {
            collision::respond(&mut self.world, entity);
            controller::update_response(&mut self.world, entity, input, &mut self.events);
        }
    }

    /// Events buffered since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }

    pub fn find_entity(&self, name: &str) -> Option<hecs::Entity> {
        self.by_name.get(name).copied()
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<hecs::Entity> {
        self.world
            .query::<&EntityKind>()
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(e, _)| e)
            .collect()
    }

    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    /// Script to run when the player enters this map.
    pub fn cutscene_enter(&self) -> Option<&str> {
        self.properties.get("cutsceneEnter").and_then(Value::as_str)
    }

    /// Script to run when the player leaves this map.
    pub fn cutscene_leave(&self) -> Option<&str> {
        self.properties.get("cutsceneLeave").and_then(Value::as_str)
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_width
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_height
    }

    /// Actor render states in world coordinates, unordered.
    pub fn draw_list(&self) -> Vec<DrawInfo> {
        self.world
            .query::<(&Position, &BodyBox, Option<&Animation>)>()
            .iter()
            .map(|(entity, (pos, body, anim))| {
                let anim = anim.copied().unwrap_or_default();
                DrawInfo {
                    entity,
                    position: pos.0,
                    half: body.half,
                    animation: anim.key,
                    flip: anim.flip,
                }
            })
            .collect()
    }
}

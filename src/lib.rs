//! Simulation core for a narrative 2D platformer.
//!
//! Everything visual lives outside this crate: the renderer consumes
//! [`Map::draw_list`], the game layer feeds an [`input::InputSource`] into
//! [`Map::update`] once per frame and drains [`events::MapEvent`]s afterwards.
//! What lives *inside* is the tile-map actor physics: kinematic integration
//! with tile raycasts, a fixed-cell broad-phase grid, the two-pass
//! detect-then-respond actor collision step, and the player controller FSM.

pub mod ecs;
pub mod events;
pub mod input;
pub mod map;
pub mod math;
pub mod spatial;
pub mod tiles;

pub use events::MapEvent;
pub use map::{ActorSpawn, EntityKind, Map, MapConfig};
pub use math::Aabb;

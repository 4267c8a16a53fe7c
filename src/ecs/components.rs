use std::collections::HashMap;

use bitflags::bitflags;
use glam::Vec2;
use serde_json::Value;

use crate::math::Aabb;

/// Map-object name, unique per map.
#[derive(Debug, Clone)]
pub struct Name(pub String);

/// Current world position in map pixels. Single source of truth — the
/// world-space collision box is derived from it via [`BodyBox::aabb`].
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Position at the start of this frame's physics step.
#[derive(Debug, Clone, Copy)]
pub struct PrevPosition(pub Vec2);

/// Velocity in pixels/frame.
#[derive(Debug, Clone, Copy)]
pub struct Velocity(pub Vec2);

/// Velocity at the start of this frame's physics step.
#[derive(Debug, Clone, Copy)]
pub struct PrevVelocity(pub Vec2);

/// Collision half-extents. World boxes are always centered on the position.
#[derive(Debug, Clone, Copy)]
pub struct BodyBox {
    pub half: Vec2,
}

impl BodyBox {
    /// Physical collision box at `pos`.
    pub fn aabb(&self, pos: Vec2) -> Aabb {
        Aabb::new(pos, self.half)
    }

    /// Enlarged proximity box used for the player's NPC-dialogue range:
    /// 4x the half-width, 2x the half-height.
    pub fn interact_aabb(&self, pos: Vec2) -> Aabb {
        Aabb::new(pos, Vec2::new(self.half.x * 4.0, self.half.y * 2.0))
    }
}

bitflags! {
    /// Which sides of an actor are being pushed against something.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Sides: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

/// Per-side contact state, split by source. Tile contacts come from the
/// physics raycasts, object contacts from collision response; both roll into
/// the previous-frame sets at the top of each physics step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contacts {
    pub tile: Sides,
    pub object: Sides,
    pub prev_tile: Sides,
    pub prev_object: Sides,
}

impl Contacts {
    /// Shift current flags into the previous-frame sets and clear.
    pub fn roll(&mut self) {
        self.prev_tile = self.tile;
        self.prev_object = self.object;
        self.tile = Sides::empty();
        self.object = Sides::empty();
    }

    /// Combined tile-or-object contact on the given side.
    pub fn pushes(&self, side: Sides) -> bool {
        (self.tile | self.object).contains(side)
    }

    /// Previous frame's tile contact on the given side.
    pub fn pushed_tile(&self, side: Sides) -> bool {
        self.prev_tile.contains(side)
    }
}

/// One actor-pair contact record for this frame. Two symmetric records exist
/// per overlapping pair, one on each actor, with negated overlaps.
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    pub other: hecs::Entity,
    /// Signed penetration, pointing from `other` toward the owning actor.
    pub overlap: Vec2,
    pub speed1: Vec2,
    pub speed2: Vec2,
    pub old_pos1: Vec2,
    pub old_pos2: Vec2,
    pub pos1: Vec2,
    pub pos2: Vec2,
}

/// Physical contacts accumulated by detection, consumed by response.
/// Cleared and rebuilt every frame.
#[derive(Debug, Default)]
pub struct Collisions(pub Vec<Collision>);

/// Interact-box contacts (player proximity to NPCs). Cleared and rebuilt
/// every frame.
#[derive(Debug, Default)]
pub struct InteractCollisions(pub Vec<Collision>);

/// Which broad-phase cells this actor currently occupies. `areas` and `ids`
/// are parallel: `ids[k]` is the actor's index inside the cell list for
/// `areas[k]`.
#[derive(Debug, Default)]
pub struct GridMembership {
    pub areas: Vec<(i32, i32)>,
    pub ids: Vec<usize>,
}

/// Immovable: participates in detection but never receives position
/// correction from response.
#[derive(Debug, Clone, Copy)]
pub struct Kinematic;

/// The controllable hero. Uses the interact box for grid placement and
/// proximity queries.
#[derive(Debug, Clone, Copy)]
pub struct Player;

/// Player FSM states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Idle,
    Walk,
    Jump,
    WallLeft,
    WallRight,
}

/// Animation selection for the renderer. The controller only swaps `key`
/// when the clip actually changes, so playback is never restarted per frame.
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub key: &'static str,
    pub flip: bool,
}

impl Default for Animation {
    fn default() -> Self {
        Self { key: "idle", flip: false }
    }
}

/// Player controller state: jump edge detection plus the interaction
/// contacts tracked across frames for prompt enter/leave events. `prompts`
/// keeps the record from the frame the prompt appeared, so the closest-NPC
/// search runs on slightly stale positions.
#[derive(Debug, Default)]
pub struct PlayerController {
    pub was_up_pressed: bool,
    pub tracked: Vec<Collision>,
    pub prompts: Vec<Collision>,
}

/// Cutscene script hooks attached to an entity.
#[derive(Debug, Clone, Default)]
pub struct Scripts {
    pub talk: Option<String>,
}

/// Raw map-object properties, kept for the game layer.
#[derive(Debug, Clone, Default)]
pub struct Properties(pub HashMap<String, Value>);

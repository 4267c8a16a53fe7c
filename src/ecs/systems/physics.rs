use glam::Vec2;

use crate::ecs::components::{
    BodyBox, Contacts, Position, PrevPosition, PrevVelocity, Sides, Velocity,
};
use crate::map::layer::Layer;
use crate::math::Aabb;
use crate::tiles::Tileset;

// ---------------------------------------------------------------------------
// Tunables (all in pixels and frames)
// ---------------------------------------------------------------------------

/// Downward acceleration per frame².
pub const PHYS_GRAVITY: f32 = 0.18;
/// Initial upward speed of a full jump.
pub const PHYS_JUMP_VEL: f32 = 3.9;
/// Upward speed a released jump decays to (short hop).
pub const PHYS_MIN_JUMP_VEL: f32 = 0.6;
/// Horizontal walk speed.
pub const PHYS_WALK_VEL: f32 = 1.6;
/// Terminal fall speed.
pub const PHYS_MAX_Y_VEL: f32 = 3.0;
/// Per-frame velocity decay on the ground.
pub const PHYS_VEL_DECAY: f32 = 0.8;
/// Per-frame horizontal decay while airborne.
pub const PHYS_VEL_DECAY_AIR: f32 = 0.9;
/// Fraction of walk speed gained per frame of air steering.
pub const PHYS_AIR_CONTROL: f32 = 0.2;
/// Gravity multiplier while sliding down a wall.
pub const PHYS_GRAVITY_WALL_FACTOR: f32 = 0.27;
/// Horizontal kick of a wall jump, as a fraction of jump speed.
pub const PHYS_JUMP_WALL_FACTOR_X: f32 = 0.5;
/// Vertical kick of a wall jump, as a fraction of jump speed.
pub const PHYS_JUMP_WALL_FACTOR_Y: f32 = 0.87;
/// Fall-speed threshold applied on grabbing a wall.
pub const PHYS_MAX_Y_VEL_WALL_TOUCH: f32 = 0.25;

// ---------------------------------------------------------------------------
// Tile probing
// ---------------------------------------------------------------------------

struct SolidHit {
    aabb: Aabb,
    oneway: bool,
}

/// First layer (in map order) holding a boxed tile at this pixel.
fn solid_tile_at(layers: &[Layer], tilesets: &[Tileset], x: f32, y: f32) -> Option<SolidHit> {
    for layer in layers {
        if let Some(hit) = layer.tile_at(tilesets, x, y) {
            if let Some(aabb) = hit.aabb {
                return Some(SolidHit { aabb, oneway: hit.tile.oneway });
            }
        }
    }
    None
}

/// Sample points along a leading edge: from `from` to `to` inclusive,
/// stepping by one tile dimension, the last sample clamped to `to`.
fn edge_samples(from: f32, to: f32, step: f32) -> impl Iterator<Item = f32> {
    let mut cursor = from;
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let sample = cursor.min(to);
        if sample >= to {
            done = true;
        }
        cursor += step;
        Some(sample)
    })
}

/// Scan below the actor for a tile it rests on. One-way platforms block from
/// above, so they are not skipped here. Returns the tile box's top edge.
fn probe_ground(layers: &[Layer], tilesets: &[Tileset], body: &Aabb, tile_w: f32) -> Option<f32> {
    let y = body.bottom() + 1.0;
    for x in edge_samples(body.left() + 2.0, body.right() - 2.0, tile_w) {
        if let Some(hit) = solid_tile_at(layers, tilesets, x, y) {
            if body.overlaps(&hit.aabb) {
                return Some(hit.aabb.top());
            }
        }
    }
    None
}

/// Scan above the actor. One-way platforms never block from below. Returns
/// the tile box's bottom edge.
fn probe_ceiling(layers: &[Layer], tilesets: &[Tileset], body: &Aabb, tile_w: f32) -> Option<f32> {
    let y = body.top() - 1.0;
    for x in edge_samples(body.left() + 2.0, body.right() - 2.0, tile_w) {
        if let Some(hit) = solid_tile_at(layers, tilesets, x, y) {
            if !hit.oneway && body.overlaps(&hit.aabb) {
                return Some(hit.aabb.bottom());
            }
        }
    }
    None
}

/// Scan one pixel outside a vertical edge of the actor. Returns the facing
/// edge of the first overlapping non-oneway tile, in scan order (top-down).
fn probe_wall(
    layers: &[Layer],
    tilesets: &[Tileset],
    body: &Aabb,
    tile_h: f32,
    x: f32,
    facing_left: bool,
) -> Option<f32> {
    for y in edge_samples(body.top() + 2.0, body.bottom() - 2.0, tile_h) {
        if let Some(hit) = solid_tile_at(layers, tilesets, x, y) {
            if !hit.oneway && body.overlaps(&hit.aabb) {
                return Some(if facing_left { hit.aabb.right() } else { hit.aabb.left() });
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Integration
// ---------------------------------------------------------------------------

/// Integrate one actor against the tile map.
///
/// Rolls contact flags, integrates velocity, then runs the four directional
/// probes in order ground, ceiling, left wall, right wall — snapping the
/// position on each hit. Ties between tiles resolve by scan order, never by
/// distance.
pub fn update_actor(
    world: &mut hecs::World,
    layers: &[Layer],
    tilesets: &[Tileset],
    tile_size: Vec2,
    entity: hecs::Entity,
    delta: f32,
) {
    let Ok((pos, prev_pos, vel, prev_vel, body, contacts)) = world.query_one_mut::<(
        &mut Position,
        &mut PrevPosition,
        &mut Velocity,
        &mut PrevVelocity,
        &BodyBox,
        &mut Contacts,
    )>(entity) else {
        return;
    };

    prev_pos.0 = pos.0;
    prev_vel.0 = vel.0;
    contacts.roll();

    pos.0 += vel.0 * delta;

    if vel.0.y >= 0.0 {
        let aabb = body.aabb(pos.0);
        if let Some(top) = probe_ground(layers, tilesets, &aabb, tile_size.x) {
            pos.0.y = top - body.half.y;
            contacts.tile |= Sides::BOTTOM;
        }
    } else {
        let aabb = body.aabb(pos.0);
        if let Some(bottom) = probe_ceiling(layers, tilesets, &aabb, tile_size.x) {
            pos.0.y = bottom + body.half.y;
            // soft absorb rather than a dead stop
            vel.0.y *= 0.5;
            contacts.tile |= Sides::TOP;
        }
    }

    if vel.0.x < 0.0 {
        let aabb = body.aabb(pos.0);
        let x = aabb.left() - 1.0;
        if let Some(right) = probe_wall(layers, tilesets, &aabb, tile_size.y, x, true) {
            pos.0.x = right + body.half.x;
            vel.0.x = 0.0;
            contacts.tile |= Sides::LEFT;
        }
    } else if vel.0.x > 0.0 {
        let aabb = body.aabb(pos.0);
        let x = aabb.right() + 1.0;
        if let Some(left) = probe_wall(layers, tilesets, &aabb, tile_size.y, x, false) {
            pos.0.x = left - body.half.x;
            vel.0.x = 0.0;
            contacts.tile |= Sides::RIGHT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::Tile;
    use std::collections::HashMap;

    fn spawn_actor(world: &mut hecs::World, pos: Vec2, half: Vec2, vel: Vec2) -> hecs::Entity {
        world.spawn((
            Position(pos),
            PrevPosition(pos),
            Velocity(vel),
            PrevVelocity(vel),
            BodyBox { half },
            Contacts::default(),
        ))
    }

    fn tileset_with_box(local: Aabb, oneway: bool) -> Tileset {
        let tile = Tile { index: 0, aabb: Some(local), oneway, properties: HashMap::new() };
        Tileset::with_tiles(1, 16.0, 16.0, vec![tile])
    }

    fn single_tile_layer(cols: u32, rows: u32, col: u32, row: u32) -> Vec<u32> {
        let mut gids = vec![0u32; (cols * rows) as usize];
        gids[(row * cols + col) as usize] = 1;
        gids
    }

    #[test]
    fn falling_actor_rests_on_tile_top() {
        // Solid box spanning world (96..112, 108..124): tile (6,6) with a
        // collision rect shifted 12px down inside the tile.
        let tilesets = vec![tileset_with_box(
            Aabb::new(Vec2::new(8.0, 20.0), Vec2::new(8.0, 8.0)),
            false,
        )];
        let layers = vec![Layer::new("main", 8, 8, 16.0, 16.0, single_tile_layer(8, 8, 6, 6))];

        let mut world = hecs::World::new();
        let actor = spawn_actor(
            &mut world,
            Vec2::new(100.0, 100.0),
            Vec2::new(8.0, 8.0),
            Vec2::new(0.0, 1.0),
        );

        update_actor(&mut world, &layers, &tilesets, Vec2::splat(16.0), actor, 1.0);

        let pos = world.get::<&Position>(actor).unwrap().0;
        assert_eq!(pos.y, 100.0); // bottom == tile top (108) - half (8)
        let contacts = *world.get::<&Contacts>(actor).unwrap();
        assert!(contacts.tile.contains(Sides::BOTTOM));
        assert!(!contacts.tile.contains(Sides::TOP));
    }

    #[test]
    fn rising_actor_passes_through_oneway_ceiling() {
        let full = Aabb::new(Vec2::splat(8.0), Vec2::splat(8.0));
        let tilesets = vec![tileset_with_box(full, true)];
        // platform row above the actor
        let layers = vec![Layer::new("main", 4, 8, 16.0, 16.0, {
            let mut gids = vec![0u32; 32];
            for c in 0..4 {
                gids[2 * 4 + c] = 1; // row 2: y 32..48
            }
            gids
        })];

        let mut world = hecs::World::new();
        // rises far enough that its head probe lands inside the platform row
        let actor = spawn_actor(
            &mut world,
            Vec2::new(32.0, 60.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(0.0, -6.0),
        );

        update_actor(&mut world, &layers, &tilesets, Vec2::splat(16.0), actor, 1.0);

        let pos = world.get::<&Position>(actor).unwrap().0;
        assert_eq!(pos.y, 54.0); // unobstructed
        let contacts = *world.get::<&Contacts>(actor).unwrap();
        assert!(contacts.tile.is_empty());
        assert_eq!(world.get::<&Velocity>(actor).unwrap().0.y, -6.0);
    }

    #[test]
    fn solid_ceiling_snaps_and_halves_velocity() {
        let full = Aabb::new(Vec2::splat(8.0), Vec2::splat(8.0));
        let tilesets = vec![tileset_with_box(full, false)];
        let layers = vec![Layer::new("main", 4, 8, 16.0, 16.0, {
            let mut gids = vec![0u32; 32];
            for c in 0..4 {
                gids[2 * 4 + c] = 1; // row 2: y 32..48
            }
            gids
        })];

        let mut world = hecs::World::new();
        // top at 54 - 6 = 48, touching the ceiling; moving up penetrates it
        let actor = spawn_actor(
            &mut world,
            Vec2::new(32.0, 54.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(0.0, -2.0),
        );

        update_actor(&mut world, &layers, &tilesets, Vec2::splat(16.0), actor, 1.0);

        let pos = world.get::<&Position>(actor).unwrap().0;
        assert_eq!(pos.y, 54.0); // top snapped back to tile bottom (48) + half
        let vel = world.get::<&Velocity>(actor).unwrap().0;
        assert_eq!(vel.y, -1.0);
        let contacts = *world.get::<&Contacts>(actor).unwrap();
        assert!(contacts.tile.contains(Sides::TOP));
    }

    #[test]
    fn right_wall_stops_horizontal_motion() {
        let full = Aabb::new(Vec2::splat(8.0), Vec2::splat(8.0));
        let tilesets = vec![tileset_with_box(full, false)];
        // wall column at col 3: x 48..64
        let layers = vec![Layer::new("main", 4, 4, 16.0, 16.0, {
            let mut gids = vec![0u32; 16];
            for r in 0..4 {
                gids[r * 4 + 3] = 1;
            }
            gids
        })];

        let mut world = hecs::World::new();
        let actor = spawn_actor(
            &mut world,
            Vec2::new(38.0, 32.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(5.0, 0.0),
        );

        update_actor(&mut world, &layers, &tilesets, Vec2::splat(16.0), actor, 1.0);

        let pos = world.get::<&Position>(actor).unwrap().0;
        assert_eq!(pos.x, 42.0); // right edge resting on tile left (48)
        assert_eq!(world.get::<&Velocity>(actor).unwrap().0.x, 0.0);
        let contacts = *world.get::<&Contacts>(actor).unwrap();
        assert!(contacts.tile.contains(Sides::RIGHT));
    }

    #[test]
    fn contact_flags_roll_to_previous_frame() {
        let tilesets: Vec<Tileset> = Vec::new();
        let layers: Vec<Layer> = Vec::new();
        let mut world = hecs::World::new();
        let actor = spawn_actor(&mut world, Vec2::ZERO, Vec2::splat(4.0), Vec2::ZERO);
        {
            let mut c = world.get::<&mut Contacts>(actor).unwrap();
            c.tile |= Sides::LEFT;
        }
        update_actor(&mut world, &layers, &tilesets, Vec2::splat(16.0), actor, 1.0);
        let contacts = *world.get::<&Contacts>(actor).unwrap();
        assert!(contacts.pushed_tile(Sides::LEFT));
        assert!(contacts.tile.is_empty());
    }
}

use glam::Vec2;

use crate::ecs::components::{
    BodyBox, Collision, Collisions, Contacts, InteractCollisions, Kinematic, Player, Position,
    PrevPosition, Sides, Velocity,
};
use crate::spatial::AreaGrid;

/// Frame snapshot of one actor's body, taken before any response mutates it.
#[derive(Clone, Copy)]
struct BodySnap {
    pos: Vec2,
    old_pos: Vec2,
    vel: Vec2,
    half: Vec2,
    player: bool,
}

fn snapshot(world: &hecs::World, entity: hecs::Entity) -> Option<BodySnap> {
    let mut query = world
        .query_one::<(&Position, &PrevPosition, &Velocity, &BodyBox)>(entity)
        .ok()?;
    let (pos, old_pos, vel, body) = query.get()?;
    Some(BodySnap {
        pos: pos.0,
        old_pos: old_pos.0,
        vel: vel.0,
        half: body.half,
        player: world.satisfies::<&Player>(entity).unwrap_or(false),
    })
}

fn has_collision_with(world: &hecs::World, entity: hecs::Entity, other: hecs::Entity) -> bool {
    world
        .get::<&Collisions>(entity)
        .map(|c| c.0.iter().any(|r| r.other == other))
        .unwrap_or(false)
}

fn has_interact_collision_with(
    world: &hecs::World,
    entity: hecs::Entity,
    other: hecs::Entity,
) -> bool {
    world
        .get::<&InteractCollisions>(entity)
        .map(|c| c.0.iter().any(|r| r.other == other))
        .unwrap_or(false)
}

/// Build the symmetric pair record for `a` against `b` (overlap points toward
/// `a`; `b`'s copy is the negation).
fn pair_records(a: &BodySnap, b: &BodySnap, overlap: Vec2, other: (hecs::Entity, hecs::Entity)) -> (Collision, Collision) {
    let for_a = Collision {
        other: other.1,
        overlap,
        speed1: a.vel,
        speed2: b.vel,
        old_pos1: a.old_pos,
        old_pos2: b.old_pos,
        pos1: a.pos,
        pos2: b.pos,
    };
    let for_b = Collision {
        other: other.0,
        overlap: -overlap,
        speed1: b.vel,
        speed2: a.vel,
        old_pos1: b.old_pos,
        old_pos2: a.old_pos,
        pos1: b.pos,
        pos2: a.pos,
    };
    (for_a, for_b)
}

fn push_collision(world: &mut hecs::World, entity: hecs::Entity, record: Collision) {
    if let Ok(mut collisions) = world.get::<&mut Collisions>(entity) {
        collisions.0.push(record);
    }
}

fn push_interact(world: &mut hecs::World, entity: hecs::Entity, record: Collision) {
    if let Ok(mut collisions) = world.get::<&mut InteractCollisions>(entity) {
        collisions.0.push(record);
    }
}

/// Detection pass: enumerate actor pairs cell by cell and record every
/// physical overlap symmetrically on both actors. Actors sharing several
/// cells are paired once; the dedup check runs against records already
/// written this frame. When the player is in the pair, a second test with
/// the enlarged interact box feeds the proximity records.
pub fn check_collisions(world: &mut hecs::World, grid: &AreaGrid) {
    for (_, collisions) in world.query_mut::<&mut Collisions>() {
        collisions.0.clear();
    }
    for (_, collisions) in world.query_mut::<&mut InteractCollisions>() {
        collisions.0.clear();
    }

    let mut cell_entities = Vec::new();
    for cell in grid.cells() {
        cell_entities.clear();
        cell_entities.extend_from_slice(cell);

        for i in 0..cell_entities.len() {
            for j in i + 1..cell_entities.len() {
                let (ea, eb) = (cell_entities[i], cell_entities[j]);
                let (Some(a), Some(b)) = (snapshot(world, ea), snapshot(world, eb)) else {
                    continue;
                };

                let box_a = BodyBox { half: a.half }.aabb(a.pos);
                let box_b = BodyBox { half: b.half }.aabb(b.pos);
                if let Some(overlap) = box_a.overlap_signed(&box_b) {
                    if !has_collision_with(world, ea, eb) {
                        let (for_a, for_b) = pair_records(&a, &b, overlap, (ea, eb));
                        push_collision(world, ea, for_a);
                        push_collision(world, eb, for_b);
                    }
                }

                // proximity pass: the player's side of the pair grows to its
                // interact box, the other side keeps its physical box
                if a.player != b.player {
                    let reach_a = if a.player {
                        BodyBox { half: a.half }.interact_aabb(a.pos)
                    } else {
                        box_a
                    };
                    let reach_b = if b.player {
                        BodyBox { half: b.half }.interact_aabb(b.pos)
                    } else {
                        box_b
                    };
                    if let Some(overlap) = reach_a.overlap_signed(&reach_b) {
                        if !has_interact_collision_with(world, ea, eb) {
                            let (for_a, for_b) = pair_records(&a, &b, overlap, (ea, eb));
                            push_interact(world, ea, for_a);
                            push_interact(world, eb, for_b);
                        }
                    }
                }
            }
        }
    }
}

/// Response pass for one actor: walk its pair records in order, pick a
/// resolution axis per record, and push the actor out by its share of the
/// penetration. Corrections already applied this frame are subtracted from
/// later records so stacked contacts don't overcorrect. Kinematic actors
/// never move.
pub fn respond(world: &mut hecs::World, entity: hecs::Entity) {
    if world.satisfies::<&Kinematic>(entity).unwrap_or(false) {
        return;
    }
    let records: Vec<Collision> = match world.get::<&Collisions>(entity) {
        Ok(collisions) if !collisions.0.is_empty() => collisions.0.clone(),
        _ => return,
    };
    let half = match world.get::<&BodyBox>(entity) {
        Ok(body) => body.half,
        Err(_) => return,
    };

    let mut pos = match world.get::<&Position>(entity) {
        Ok(p) => p.0,
        Err(_) => return,
    };
    let mut vel = world.get::<&Velocity>(entity).map(|v| v.0).unwrap_or(Vec2::ZERO);
    let mut offset_sum = Vec2::ZERO;
    let mut pushed = Sides::empty();

    for record in &records {
        let corrected = record.overlap - offset_sum;

        // Degenerate touch: a zero component means the boxes merely share an
        // edge on that axis. Flag the side and stop motion into it, but
        // don't displace.
        if corrected.x == 0.0 {
            if record.pos2.x > record.pos1.x {
                pushed |= Sides::RIGHT;
                vel.x = vel.x.min(0.0);
            } else {
                pushed |= Sides::LEFT;
                vel.x = vel.x.max(0.0);
            }
            continue;
        }
        if corrected.y == 0.0 {
            if record.pos2.y > record.pos1.y {
                pushed |= Sides::BOTTOM;
                vel.y = vel.y.min(0.0);
            } else {
                pushed |= Sides::TOP;
                vel.y = vel.y.max(0.0);
            }
            continue;
        }

        // Split the penetration by how much each body moved this frame;
        // a body that didn't move takes none of the correction. Against a
        // kinematic body we absorb all of it.
        let other_kinematic = world.satisfies::<&Kinematic>(record.other).unwrap_or(false);
        let ratio = if other_kinematic {
            Vec2::ONE
        } else {
            let moved1 = (record.pos1 - record.old_pos1).abs();
            let moved2 = (record.pos2 - record.old_pos2).abs();
            Vec2::new(
                axis_ratio(moved1.x, moved2.x),
                axis_ratio(moved1.y, moved2.y),
            )
        };

        // Axis choice keys off which axes already overlapped last frame:
        // a fresh overlap on an axis is the one to undo. When both are
        // fresh the shallower axis wins.
        let other_half = world
            .get::<&BodyBox>(record.other)
            .map(|b| b.half)
            .unwrap_or(Vec2::ZERO);
        let overlapped_x_last =
            (record.old_pos1.x - record.old_pos2.x).abs() <= half.x + other_half.x;
        let overlapped_y_last =
            (record.old_pos1.y - record.old_pos2.y).abs() <= half.y + other_half.y;
        let resolve_x = !overlapped_x_last
            && (overlapped_y_last || corrected.x.abs() <= corrected.y.abs());

        if resolve_x {
            let delta = corrected.x * ratio.x;
            pos.x += delta;
            offset_sum.x += delta;
            if corrected.x < 0.0 {
                pushed |= Sides::RIGHT;
                vel.x = vel.x.min(0.0);
            } else {
                pushed |= Sides::LEFT;
                vel.x = vel.x.max(0.0);
            }
        } else {
            let delta = corrected.y * ratio.y;
            pos.y += delta;
            offset_sum.y += delta;
            if corrected.y < 0.0 {
                pushed |= Sides::BOTTOM;
                vel.y = vel.y.min(0.0);
            } else {
                pushed |= Sides::TOP;
                vel.y = vel.y.max(0.0);
            }
        }
    }

    if let Ok(mut p) = world.get::<&mut Position>(entity) {
        p.0 = pos;
    }
    if let Ok(mut v) = world.get::<&mut Velocity>(entity) {
        v.0 = vel;
    }
    if let Ok(mut contacts) = world.get::<&mut Contacts>(entity) {
        contacts.object |= pushed;
    }
}

/// This body's share of the correction on one axis. When neither body moved
/// the blame is split evenly.
fn axis_ratio(self_moved: f32, other_moved: f32) -> f32 {
    let total = self_moved + other_moved;
    if total == 0.0 {
        0.5
    } else {
        other_moved / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::GridMembership;
    use crate::ecs::systems::spatial;

    fn spawn_actor(
        world: &mut hecs::World,
        pos: Vec2,
        old_pos: Vec2,
        vel: Vec2,
    ) -> hecs::Entity {
        world.spawn((
            Position(pos),
            PrevPosition(old_pos),
            Velocity(vel),
            BodyBox { half: Vec2::splat(8.0) },
            Contacts::default(),
            Collisions::default(),
            InteractCollisions::default(),
            GridMembership::default(),
        ))
    }

    fn place_all(world: &mut hecs::World, grid: &mut AreaGrid) {
        let entities: Vec<hecs::Entity> = world
            .query_mut::<&GridMembership>()
            .into_iter()
            .map(|(e, _)| e)
            .collect();
        for e in entities {
            spatial::update_actor_areas(world, grid, e);
        }
    }

    #[test]
    fn detection_writes_symmetric_records() {
        let mut world = hecs::World::new();
        let mut grid = AreaGrid::new(256.0, 256.0, 128.0, 128.0);
        let a = spawn_actor(&mut world, Vec2::new(100.0, 100.0), Vec2::new(96.0, 100.0), Vec2::ZERO);
        let b = spawn_actor(&mut world, Vec2::new(112.0, 100.0), Vec2::new(116.0, 100.0), Vec2::ZERO);
        place_all(&mut world, &mut grid);

        check_collisions(&mut world, &grid);

        let rec_a = world.get::<&Collisions>(a).unwrap().0.clone();
        let rec_b = world.get::<&Collisions>(b).unwrap().0.clone();
        assert_eq!(rec_a.len(), 1);
        assert_eq!(rec_b.len(), 1);
        assert_eq!(rec_a[0].other, b);
        assert_eq!(rec_b[0].other, a);
        assert_eq!(rec_a[0].overlap, -rec_b[0].overlap);
        assert_eq!(rec_a[0].overlap.x, -4.0);
    }

    #[test]
    fn equal_movers_split_the_correction() {
        let mut world = hecs::World::new();
        let mut grid = AreaGrid::new(256.0, 256.0, 128.0, 128.0);
        // both walked 4px toward each other, ending 4px deep on x
        let a = spawn_actor(
            &mut world,
            Vec2::new(100.0, 100.0),
            Vec2::new(96.0, 100.0),
            Vec2::new(1.0, 0.0),
        );
        let b = spawn_actor(
            &mut world,
            Vec2::new(112.0, 100.0),
            Vec2::new(116.0, 100.0),
            Vec2::new(-1.0, 0.0),
        );
        place_all(&mut world, &mut grid);

        check_collisions(&mut world, &grid);
        respond(&mut world, a);
        respond(&mut world, b);

        assert_eq!(world.get::<&Position>(a).unwrap().0.x, 98.0);
        assert_eq!(world.get::<&Position>(b).unwrap().0.x, 114.0);
        assert_eq!(world.get::<&Velocity>(a).unwrap().0.x, 0.0);
        assert_eq!(world.get::<&Velocity>(b).unwrap().0.x, 0.0);
        assert!(world.get::<&Contacts>(a).unwrap().object.contains(Sides::RIGHT));
        assert!(world.get::<&Contacts>(b).unwrap().object.contains(Sides::LEFT));
    }

    #[test]
    fn kinematic_absorbs_nothing() {
        let mut world = hecs::World::new();
        let mut grid = AreaGrid::new(256.0, 256.0, 128.0, 128.0);
        let mover = spawn_actor(
            &mut world,
            Vec2::new(100.0, 100.0),
            Vec2::new(94.0, 100.0),
            Vec2::new(1.0, 0.0),
        );
        let wall = spawn_actor(
            &mut world,
            Vec2::new(112.0, 100.0),
            Vec2::new(112.0, 100.0),
            Vec2::ZERO,
        );
        world.insert_one(wall, Kinematic).unwrap();
        place_all(&mut world, &mut grid);

        check_collisions(&mut world, &grid);
        respond(&mut world, mover);
        respond(&mut world, wall);

        // mover takes the full 4px correction, wall stays put
        assert_eq!(world.get::<&Position>(mover).unwrap().0.x, 96.0);
        assert_eq!(world.get::<&Position>(wall).unwrap().0.x, 112.0);
    }

    fn spawn_block(world: &mut hecs::World, pos: Vec2) -> hecs::Entity {
        world.spawn((Position(pos), BodyBox { half: Vec2::splat(8.0) }, Kinematic))
    }

    #[test]
    fn later_records_are_discounted_by_applied_offsets() {
        let mut world = hecs::World::new();
        // fell 6px into two coincident platforms: 4px deep on y against both
        let actor = spawn_actor(
            &mut world,
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 94.0),
            Vec2::new(0.0, 2.0),
        );
        let lower = spawn_block(&mut world, Vec2::new(100.0, 112.0));
        let upper = spawn_block(&mut world, Vec2::new(100.0, 112.0));

        let record = |other| Collision {
            other,
            overlap: Vec2::new(16.0, -4.0),
            speed1: Vec2::new(0.0, 2.0),
            speed2: Vec2::ZERO,
            old_pos1: Vec2::new(100.0, 94.0),
            old_pos2: Vec2::new(100.0, 112.0),
            pos1: Vec2::new(100.0, 100.0),
            pos2: Vec2::new(100.0, 112.0),
        };
        world
            .get::<&mut Collisions>(actor)
            .unwrap()
            .0
            .extend([record(lower), record(upper)]);

        respond(&mut world, actor);

        // the first record pushes out by 4px; the second's penetration is
        // already covered by the applied offset, so it only clamps
        assert_eq!(world.get::<&Position>(actor).unwrap().0, Vec2::new(100.0, 96.0));
        assert_eq!(world.get::<&Velocity>(actor).unwrap().0.y, 0.0);
        assert!(world.get::<&Contacts>(actor).unwrap().object.contains(Sides::BOTTOM));
    }

    #[test]
    fn fresh_diagonal_overlap_resolves_the_shallower_axis() {
        let mut world = hecs::World::new();
        // neither axis overlapped last frame: the shallower penetration wins
        let actor = spawn_actor(
            &mut world,
            Vec2::new(100.0, 100.0),
            Vec2::new(80.0, 80.0),
            Vec2::new(2.0, 2.0),
        );
        let block = spawn_block(&mut world, Vec2::new(112.0, 110.0));
        world.get::<&mut Collisions>(actor).unwrap().0.push(Collision {
            other: block,
            overlap: Vec2::new(-4.0, -6.0),
            speed1: Vec2::new(2.0, 2.0),
            speed2: Vec2::ZERO,
            old_pos1: Vec2::new(80.0, 80.0),
            old_pos2: Vec2::new(112.0, 110.0),
            pos1: Vec2::new(100.0, 100.0),
            pos2: Vec2::new(112.0, 110.0),
        });

        respond(&mut world, actor);

        // x is 4px deep vs 6px on y: corrected on x only
        assert_eq!(world.get::<&Position>(actor).unwrap().0, Vec2::new(96.0, 100.0));
        let vel = world.get::<&Velocity>(actor).unwrap().0;
        assert_eq!(vel, Vec2::new(0.0, 2.0));
        let contacts = *world.get::<&Contacts>(actor).unwrap();
        assert!(contacts.object.contains(Sides::RIGHT));
        assert!(!contacts.object.contains(Sides::BOTTOM));

        // mirrored depths pick the y axis instead
        let faller = spawn_actor(
            &mut world,
            Vec2::new(100.0, 100.0),
            Vec2::new(80.0, 80.0),
            Vec2::new(2.0, 2.0),
        );
        let floor = spawn_block(&mut world, Vec2::new(110.0, 112.0));
        world.get::<&mut Collisions>(faller).unwrap().0.push(Collision {
            other: floor,
            overlap: Vec2::new(-6.0, -4.0),
            speed1: Vec2::new(2.0, 2.0),
            speed2: Vec2::ZERO,
            old_pos1: Vec2::new(80.0, 80.0),
            old_pos2: Vec2::new(110.0, 112.0),
            pos1: Vec2::new(100.0, 100.0),
            pos2: Vec2::new(110.0, 112.0),
        });

        respond(&mut world, faller);

        assert_eq!(world.get::<&Position>(faller).unwrap().0, Vec2::new(100.0, 96.0));
        assert_eq!(world.get::<&Velocity>(faller).unwrap().0, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn player_proximity_uses_interact_box() {
        let mut world = hecs::World::new();
        let mut grid = AreaGrid::new(256.0, 256.0, 128.0, 128.0);
        // 30px apart on x: physical boxes (8px half) are clear, but the
        // player's 32px interact half-width reaches the npc
        let player = spawn_actor(
            &mut world,
            Vec2::new(60.0, 100.0),
            Vec2::new(60.0, 100.0),
            Vec2::ZERO,
        );
        world.insert_one(player, Player).unwrap();
        let npc = spawn_actor(
            &mut world,
            Vec2::new(90.0, 100.0),
            Vec2::new(90.0, 100.0),
            Vec2::ZERO,
        );
        world.insert_one(npc, Kinematic).unwrap();
        place_all(&mut world, &mut grid);

        check_collisions(&mut world, &grid);

        assert!(world.get::<&Collisions>(player).unwrap().0.is_empty());
        let interact = world.get::<&InteractCollisions>(player).unwrap().0.clone();
        assert_eq!(interact.len(), 1);
        assert_eq!(interact[0].other, npc);
    }

    #[test]
    fn shared_cells_pair_only_once() {
        let mut world = hecs::World::new();
        let mut grid = AreaGrid::new(512.0, 512.0, 128.0, 128.0);
        // both straddle the same column boundary, so the pair shows up in
        // two cells
        let a = spawn_actor(
            &mut world,
            Vec2::new(126.0, 64.0),
            Vec2::new(126.0, 64.0),
            Vec2::ZERO,
        );
        let b = spawn_actor(
            &mut world,
            Vec2::new(130.0, 64.0),
            Vec2::new(130.0, 64.0),
            Vec2::ZERO,
        );
        place_all(&mut world, &mut grid);

        check_collisions(&mut world, &grid);

        assert_eq!(world.get::<&Collisions>(a).unwrap().0.len(), 1);
        assert_eq!(world.get::<&Collisions>(b).unwrap().0.len(), 1);
    }
}

use crate::ecs::components::{BodyBox, GridMembership, Player, Position};
use crate::math::Aabb;
use crate::spatial::AreaGrid;

/// Refresh the broad-phase cells an actor occupies.
///
/// The box's four corners are classified into 1, 2 or 4 cells — all in one
/// cell, sharing a row or column, or all distinct. A footprint that straddles
/// both a row and a column boundary at different offsets can touch a third
/// cell this misses; collision behavior depends on that approximation, so it
/// stays. The new cell set is diffed against the stored one: stale cells get
/// a swap-remove (fixing up the displaced actor's index), fresh cells an
/// append. Off-grid cells are ignored entirely.
pub fn update_actor_areas(world: &mut hecs::World, grid: &mut AreaGrid, entity: hecs::Entity) {
    let (pos, half, is_player) = {
        let Ok(mut q) = world.query_one::<(&Position, &BodyBox)>(entity) else {
            return;
        };
        let Some((pos, body)) = q.get() else {
            return;
        };
        (pos.0, body.half, world.satisfies::<&Player>(entity).unwrap_or(false))
    };

    // The player claims cells with its enlarged interact box so NPC proximity
    // pairs show up in the broad phase.
    let body = BodyBox { half };
    let aabb = if is_player { body.interact_aabb(pos) } else { body.aabb(pos) };
    let new_areas = corner_areas(grid, &aabb);

    let old_areas: Vec<(i32, i32)> = world
        .get::<&GridMembership>(entity)
        .map(|m| m.areas.clone())
        .unwrap_or_default();

    for area in &old_areas {
        if !new_areas.contains(area) {
            remove_from_area(world, grid, entity, *area);
        }
    }
    for area in new_areas {
        if !old_areas.contains(&area) {
            add_to_area(world, grid, entity, area);
        }
    }
}

/// Drop an actor from every cell it occupies (map teardown / despawn).
pub fn clear_actor_areas(world: &mut hecs::World, grid: &mut AreaGrid, entity: hecs::Entity) {
    let areas: Vec<(i32, i32)> = world
        .get::<&GridMembership>(entity)
        .map(|m| m.areas.clone())
        .unwrap_or_default();
    for area in areas {
        remove_from_area(world, grid, entity, area);
    }
}

/// Corner-cell classification: 1, 2 or 4 areas.
fn corner_areas(grid: &AreaGrid, aabb: &Aabb) -> Vec<(i32, i32)> {
    let top_left = grid.cell_coords(glam::Vec2::new(aabb.left(), aabb.top()));
    let top_right = grid.cell_coords(glam::Vec2::new(aabb.right(), aabb.top()));
    let bottom_left = grid.cell_coords(glam::Vec2::new(aabb.left(), aabb.bottom()));
    let bottom_right = grid.cell_coords(glam::Vec2::new(aabb.right(), aabb.bottom()));

    let same_col = top_left.0 == top_right.0;
    let same_row = top_left.1 == bottom_left.1;

    if same_col && same_row {
        vec![top_left]
    } else if same_col {
        vec![top_left, bottom_left]
    } else if same_row {
        vec![top_left, top_right]
    } else {
        vec![top_left, top_right, bottom_left, bottom_right]
    }
}

fn add_to_area(
    world: &mut hecs::World,
    grid: &mut AreaGrid,
    entity: hecs::Entity,
    area: (i32, i32),
) {
    let Some(cell) = grid.cell_mut(area) else {
        return; // off the map
    };
    let index = cell.len();
    cell.push(entity);
    if let Ok(mut membership) = world.get::<&mut GridMembership>(entity) {
        membership.areas.push(area);
        membership.ids.push(index);
    }
}

fn remove_from_area(
    world: &mut hecs::World,
    grid: &mut AreaGrid,
    entity: hecs::Entity,
    area: (i32, i32),
) {
    let index_in_cell = {
        let Ok(mut membership) = world.get::<&mut GridMembership>(entity) else {
            return;
        };
        let Some(k) = membership.areas.iter().position(|a| *a == area) else {
            return;
        };
        membership.areas.swap_remove(k);
        let id = membership.ids.swap_remove(k);
        id
    };

    let Some(cell) = grid.cell_mut(area) else {
        return;
    };
    cell.swap_remove(index_in_cell);

    // The entry swapped into our slot needs its membership index patched.
    if index_in_cell < cell.len() {
        let displaced = cell[index_in_cell];
        if let Ok(mut membership) = world.get::<&mut GridMembership>(displaced) {
            if let Some(k) = membership.areas.iter().position(|a| *a == area) {
                membership.ids[k] = index_in_cell;
            }
        }
    }
}

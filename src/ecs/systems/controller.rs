use crate::ecs::components::{
    ActorState, Animation, Collision, Contacts, InteractCollisions, PlayerController, Scripts,
    Sides, Velocity,
};
use crate::ecs::systems::physics::{
    PHYS_AIR_CONTROL, PHYS_GRAVITY, PHYS_GRAVITY_WALL_FACTOR, PHYS_JUMP_VEL,
    PHYS_JUMP_WALL_FACTOR_X, PHYS_JUMP_WALL_FACTOR_Y, PHYS_MAX_Y_VEL, PHYS_MAX_Y_VEL_WALL_TOUCH,
    PHYS_MIN_JUMP_VEL, PHYS_VEL_DECAY, PHYS_VEL_DECAY_AIR, PHYS_WALK_VEL,
};
use crate::events::MapEvent;
use crate::input::{Button, InputSource};

/// Player state machine. Runs before the physics step so the velocity it
/// writes is integrated this frame. Gravity is applied here, not in the
/// physics step, so grounded states fall through their own decay instead.
pub fn update(world: &mut hecs::World, entity: hecs::Entity, delta: f32, input: &dyn InputSource) {
    let left = input.is_pressed(Button::Left);
    let right = input.is_pressed(Button::Right);
    let up = input.is_pressed(Button::Up);

    let Ok((vel, contacts, state, anim, pc)) = world.query_one_mut::<(
        &mut Velocity,
        &Contacts,
        &mut ActorState,
        &mut Animation,
        &mut PlayerController,
    )>(entity) else {
        return;
    };

    let mut animation: Option<&'static str> = None;

    match *state {
        ActorState::Idle => {
            vel.0.x *= PHYS_VEL_DECAY;
            vel.0.y *= PHYS_VEL_DECAY;

            animation = Some("idle");

            if !contacts.pushes(Sides::BOTTOM) {
                log::debug!("IDLE -> JUMP (not on ground)");
                *state = ActorState::Jump;
            } else if left != right {
                log::debug!("IDLE -> WALK (direction)");
                *state = ActorState::Walk;
            } else if up && !pc.was_up_pressed {
                log::debug!("IDLE -> JUMP (direction)");
                vel.0.y = -PHYS_JUMP_VEL;
                *state = ActorState::Jump;
            }
        }
        ActorState::Walk => {
            // no walk clip shipped; the idle key stands in
            animation = Some("idle");

            if left == right {
                log::debug!("WALK -> IDLE (no input)");
                *state = ActorState::Idle;
            } else if right {
                if contacts.tile.contains(Sides::RIGHT) {
                    vel.0.x = 0.0;
                } else {
                    vel.0.x = PHYS_WALK_VEL;
                }
                anim.flip = false;
            } else {
                if contacts.tile.contains(Sides::LEFT) {
                    vel.0.x = 0.0;
                } else {
                    vel.0.x = -PHYS_WALK_VEL;
                }
                anim.flip = true;
            }

            if up && !pc.was_up_pressed {
                log::debug!("WALK -> JUMP (direction)");
                vel.0.y = -PHYS_JUMP_VEL;
                *state = ActorState::Jump;
            } else if !contacts.pushes(Sides::BOTTOM) {
                log::debug!("WALK -> JUMP (not on ground)");
                *state = ActorState::Jump;
            }
        }
        ActorState::Jump => {
            vel.0.y = (vel.0.y + PHYS_GRAVITY * delta).min(PHYS_MAX_Y_VEL);

            animation = Some(if vel.0.y < 0.0 { "jump" } else { "fall" });

            // releasing jump early caps the ascent
            if !up && vel.0.y < 0.0 {
                vel.0.y = vel.0.y.max(-PHYS_MIN_JUMP_VEL);
            }

            if right == left {
                vel.0.x *= PHYS_VEL_DECAY_AIR;
            } else if right {
                if contacts.tile.contains(Sides::RIGHT) {
                    vel.0.x = 0.0;
                } else {
                    vel.0.x = (vel.0.x + PHYS_WALK_VEL * PHYS_AIR_CONTROL).min(PHYS_WALK_VEL);
                }
                anim.flip = false;
            } else {
                if contacts.tile.contains(Sides::LEFT) {
                    vel.0.x = 0.0;
                } else {
                    vel.0.x = (vel.0.x - PHYS_WALK_VEL * PHYS_AIR_CONTROL).max(-PHYS_WALK_VEL);
                }
                anim.flip = true;
            }

            if contacts.pushes(Sides::BOTTOM) {
                if right == left {
                    log::debug!("JUMP -> IDLE (on ground)");
                    *state = ActorState::Idle;
                } else {
                    log::debug!("JUMP -> WALK (on ground, direction)");
                    *state = ActorState::Walk;
                }
                vel.0.y = 0.0;
            } else if contacts.tile.contains(Sides::RIGHT) && vel.0.y > 0.0 {
                log::debug!("JUMP -> RIGHT WALL (pushed wall)");
                *state = ActorState::WallRight;
                vel.0.y = vel.0.y.min(PHYS_MAX_Y_VEL_WALL_TOUCH);
            } else if contacts.tile.contains(Sides::LEFT) && vel.0.y > 0.0 {
                log::debug!("JUMP -> LEFT WALL (pushed wall)");
                *state = ActorState::WallLeft;
                vel.0.y = vel.0.y.max(PHYS_MAX_Y_VEL_WALL_TOUCH);
            }
        }
        ActorState::WallLeft => {
            animation = Some("wallright");
            anim.flip = true;

            vel.0.y =
                (vel.0.y + PHYS_GRAVITY * delta * PHYS_GRAVITY_WALL_FACTOR).min(PHYS_MAX_Y_VEL);

            if left == right {
                vel.0.x *= PHYS_VEL_DECAY_AIR;
            } else if left {
                // keep nudging into the wall; losing contact for one frame
                // (the prev-frame check) shouldn't drop the slide
                if contacts.tile.contains(Sides::LEFT) || contacts.pushed_tile(Sides::LEFT) {
                    vel.0.x = -0.1;
                    anim.flip = true;
                } else {
                    log::debug!("WALL LEFT -> JUMP (cleared)");
                    *state = ActorState::Jump;
                }
            } else {
                if contacts.tile.contains(Sides::LEFT) {
                    vel.0.x = 0.0;
                    log::debug!("WALL LEFT -> JUMP (input right)");
                } else {
                    vel.0.x = (vel.0.x + PHYS_WALK_VEL * PHYS_AIR_CONTROL).min(PHYS_WALK_VEL);
                    log::debug!("WALL LEFT -> JUMP (input left)");
                }
                *state = ActorState::Jump;
            }

            if up && !pc.was_up_pressed {
                log::debug!("WALL LEFT -> JUMP (input jump)");
                vel.0.y = -PHYS_JUMP_VEL * PHYS_JUMP_WALL_FACTOR_Y;
                vel.0.x = PHYS_JUMP_VEL * PHYS_JUMP_WALL_FACTOR_X;
                *state = ActorState::Jump;
            }

            if contacts.pushes(Sides::BOTTOM) {
                log::debug!("WALL LEFT -> IDLE (on ground)");
                *state = ActorState::Idle;
                vel.0.y = 0.0;
            }
        }
        ActorState::WallRight => {
            animation = Some("wallright");

            vel.0.y =
                (vel.0.y + PHYS_GRAVITY * delta * PHYS_GRAVITY_WALL_FACTOR).min(PHYS_MAX_Y_VEL);

            if right == left {
                vel.0.x *= PHYS_VEL_DECAY_AIR;
            } else if right {
                if contacts.tile.contains(Sides::RIGHT) || contacts.pushed_tile(Sides::RIGHT) {
                    vel.0.x = 0.1;
                    anim.flip = false;
                } else {
                    log::debug!("WALL RIGHT -> JUMP (cleared)");
                    *state = ActorState::Jump;
                }
            } else {
                if contacts.tile.contains(Sides::LEFT) {
                    vel.0.x = 0.0;
                } else {
                    vel.0.x = (vel.0.x - PHYS_WALK_VEL * PHYS_AIR_CONTROL).max(-PHYS_WALK_VEL);
                }
                log::debug!("WALL RIGHT -> JUMP (input left)");
                *state = ActorState::Jump;
                anim.flip = true;
            }

            if up && !pc.was_up_pressed {
                log::debug!("WALL RIGHT -> JUMP (input jump)");
                vel.0.y = -PHYS_JUMP_VEL * PHYS_JUMP_WALL_FACTOR_Y;
                vel.0.x = -PHYS_JUMP_VEL * PHYS_JUMP_WALL_FACTOR_X;
                *state = ActorState::Jump;
            }

            if contacts.pushes(Sides::BOTTOM) {
                if right == left {
                    log::debug!("WALL RIGHT -> IDLE (on ground)");
                    *state = ActorState::Idle;
                } else {
                    log::debug!("WALL RIGHT -> WALK (on ground, direction)");
                    *state = ActorState::Walk;
                }
                vel.0.y = 0.0;
            }
        }
    }

    if let Some(key) = animation {
        if anim.key != key {
            anim.key = key;
        }
    }

    pc.was_up_pressed = up;
}

/// Post-collision pass: diff the player's proximity contacts against last
/// frame to emit prompt enter/leave events, then route the interact key to
/// the closest prompted entity's talk script. The key is level-triggered,
/// matching the dialogue layer's own debouncing.
pub fn update_response(
    world: &mut hecs::World,
    entity: hecs::Entity,
    input: &dyn InputSource,
    events: &mut Vec<MapEvent>,
) {
    let current: Vec<Collision> = match world.get::<&InteractCollisions>(entity) {
        Ok(collisions) => collisions.0.clone(),
        Err(_) => return,
    };
    let Ok(mut pc) = world.get::<&mut PlayerController>(entity) else {
        return;
    };

    let previous = std::mem::take(&mut pc.tracked);
    let mut remain: Vec<Collision> = Vec::new();
    for old in &previous {
        if current.iter().any(|c| c.other == old.other) {
            remain.push(*old);
        } else {
            log::debug!("Interaction prompt removed");
            pc.prompts.retain(|p| p.other != old.other);
            events.push(MapEvent::PromptRemoved { player: entity, other: old.other });
        }
    }
    for collision in &current {
        if !remain.iter().any(|r| r.other == collision.other) {
            log::debug!("Interaction prompt added");
            pc.prompts.push(*collision);
            events.push(MapEvent::PromptAdded { player: entity, other: collision.other });
        }
    }
    pc.tracked = current;

    if input.is_pressed(Button::Interact) {
        log::debug!("Talk pressed");
        let mut closest: Option<Collision> = None;
        let mut closest_distance = f32::INFINITY;
        for collision in &pc.prompts {
            let distance = collision.pos1.distance(collision.pos2);
            if distance < closest_distance {
                closest = Some(*collision);
                closest_distance = distance;
            }
        }
        drop(pc);

        if let Some(collision) = closest {
            match world
                .get::<&Scripts>(collision.other)
                .ok()
                .and_then(|s| s.talk.clone())
            {
                Some(script) => {
                    events.push(MapEvent::ScriptRequested { target: collision.other, script });
                }
                None => log::warn!("interact target has no talk script"),
            }
        }
    }
}

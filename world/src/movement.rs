//! Move-or-interact resolution for anything that travels across the pitch.
//!
//! A step is first screened against the band of grid cells ahead of the
//! mover. When nothing in that band could stop or engage the mover the step
//! commits straight away. Otherwise the exact strip entered by the step is
//! sampled and every entity found there is interacted with, obstacles first.
//! Bombs the mover already overlaps are ignored so that a character can walk
//! off a bomb it just placed. Any other overlapping entity still counts.

use std::collections::HashSet;

use blast_arena_core::{
    geometry::{band_depth, directional_band, leading_edge},
    CharacterState, Coord, Direction, EntityId, EntityKind, Event, PIXEL_UNIT,
};
use tracing::trace;

use crate::{collision::Body, interaction::interact, World};

/// Result of resolving a single step without committing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing obstructs the step; the mover may occupy the coordinate.
    Committed(Coord),
    /// An obstacle occupies part of the destination footprint.
    Blocked(Coord),
    /// The destination footprint leaves the pitch.
    OutOfBounds(Coord),
    /// The mover is no longer registered.
    Stale,
}

/// Resolves a step of `step` pixels in `direction` and performs the resulting
/// interactions, leaving the mover's position untouched.
pub fn resolve_step(
    world: &mut World,
    mover: EntityId,
    direction: Direction,
    step: i32,
    ignore_bounds: bool,
    out_events: &mut Vec<Event>,
) -> StepOutcome {
    let Some(body) = world.entity(mover).map(Body::of) else {
        return StepOutcome::Stale;
    };
    let next = body.position.step(direction, step);

    if !ignore_bounds && !world.pitch.validate(next, body.size) {
        if body.capabilities.is_obstacle(None) {
            let _ = interact(world, mover, None, out_events);
        }
        return StepOutcome::OutOfBounds(next);
    }

    let ignored = already_overlapping(world, &body);
    let band = directional_band(body.position, body.size, direction, band_depth(step));
    let band_is_clear = world
        .entities_in_cells(&band)
        .iter()
        .filter(|other| other.id != mover && !ignored.contains(&other.id))
        .all(|other| !body.reacts_to(other));
    if band_is_clear {
        return StepOutcome::Committed(next);
    }

    let hits: Vec<Body> = world
        .entities_at(&leading_edge(body.position, body.size, direction, step))
        .into_iter()
        .filter(|other| other.id != mover && !ignored.contains(&other.id))
        .collect();

    let obstacles: Vec<EntityId> = hits
        .iter()
        .filter(|other| body.capabilities.is_obstacle(Some(other.kind)))
        .map(|other| other.id)
        .collect();
    if !obstacles.is_empty() {
        for obstacle in obstacles {
            let _ = interact(world, mover, Some(obstacle), out_events);
        }
        return StepOutcome::Blocked(next);
    }

    for hit in hits {
        let _ = interact(world, mover, Some(hit.id), out_events);
    }
    if world.entity(mover).is_none() {
        return StepOutcome::Stale;
    }
    StepOutcome::Committed(next)
}

/// Moves `mover` by `step` pixels in `direction`, interacting with whatever
/// it runs into.
///
/// Returns whether the move was committed. Eliminated characters never move.
/// Unless `ignore_bounds` is set a committed position always validates
/// against the pitch.
pub fn move_or_interact(
    world: &mut World,
    mover: EntityId,
    direction: Direction,
    step: i32,
    ignore_bounds: bool,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(entity) = world.entity(mover) else {
        return false;
    };
    if entity
        .character()
        .is_some_and(|character| character.state == CharacterState::Eliminated)
    {
        return false;
    }
    let from = entity.position;

    match resolve_step(world, mover, direction, step, ignore_bounds, out_events) {
        StepOutcome::Committed(to) => {
            world.set_position(mover, to);
            trace!(entity = mover.get(), x = to.x(), y = to.y(), "moved");
            out_events.push(Event::Moved {
                entity: mover,
                from,
                to,
            });
            true
        }
        StepOutcome::Blocked(_) | StepOutcome::OutOfBounds(_) => {
            out_events.push(Event::MoveRefused {
                entity: mover,
                direction,
            });
            false
        }
        StepOutcome::Stale => false,
    }
}

/// Directions in which `mover` could take a single pixel-unit step without
/// meeting an obstacle or leaving the pitch. Performs no interactions.
#[must_use]
pub fn available_directions(world: &World, mover: EntityId) -> Vec<Direction> {
    let Some(body) = world.entity(mover).map(Body::of) else {
        return Vec::new();
    };
    let ignored = already_overlapping(world, &body);

    Direction::ALL
        .into_iter()
        .filter(|direction| {
            let next = body.position.step(*direction, PIXEL_UNIT);
            if !world.pitch.validate(next, body.size) {
                return false;
            }
            world
                .entities_at(&leading_edge(body.position, body.size, *direction, PIXEL_UNIT))
                .iter()
                .filter(|other| other.id != mover && !ignored.contains(&other.id))
                .all(|other| !body.capabilities.is_obstacle(Some(other.kind)))
        })
        .collect()
}

/// Bombs the body already stands on.
fn already_overlapping(world: &World, body: &Body) -> HashSet<EntityId> {
    world
        .entities_overlapping(body.position, body.size)
        .into_iter()
        .filter(|other| other.id != body.id && other.kind == EntityKind::Bomb)
        .map(|other| other.id)
        .collect()
}

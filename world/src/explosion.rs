//! Queue-driven explosion propagation.
//!
//! Detonating a bomb enqueues one distance-zero segment per cardinal
//! direction. Each dequeued segment is placed, resolves its interactions and,
//! while still expandable, steps one grid cell further through the movement
//! engine. That step yields at most one successor: a continuing segment when
//! the cell is free, a terminal one when an obstacle sits there, and nothing
//! when the chain would leave the pitch. Bombs reached by a blast are queued
//! for detonation and ignited once the current blast has fully propagated.

use std::collections::VecDeque;

use blast_arena_core::{
    geometry::footprint, BlastProfile, Capabilities, Coord, Direction, EntityId, EntityKind,
    Event, PlacementError, TickPolicy, GRID_SIZE,
};
use tracing::{debug, warn};

use crate::{
    interaction::interact,
    movement::{resolve_step, StepOutcome},
    Role, Segment, World,
};

/// Segment awaiting placement.
#[derive(Clone, Copy, Debug)]
struct PendingSegment {
    origin: Coord,
    direction: Direction,
    distance: u32,
    max_distance: u32,
    expandable: bool,
    profile: BlastProfile,
    owner: Option<EntityId>,
}

/// Detonates `bomb` and every bomb its blast reaches.
///
/// Returns `false` when the handle is stale, does not name a bomb, or the
/// bomb already detonated.
pub fn detonate(world: &mut World, bomb: EntityId, out_events: &mut Vec<Event>) -> bool {
    let detonated = ignite(world, bomb, out_events);
    drain_pending(world, out_events);
    detonated
}

/// Ignites every bomb queued by blasts until the queue is empty.
pub(crate) fn drain_pending(world: &mut World, out_events: &mut Vec<Event>) {
    while let Some(bomb) = world.next_pending_detonation() {
        let _ = ignite(world, bomb, out_events);
    }
}

fn ignite(world: &mut World, bomb: EntityId, out_events: &mut Vec<Event>) -> bool {
    let Some(entity) = world.entity_mut(bomb) else {
        return false;
    };
    let position = entity.position;
    let Role::Bomb(state) = &mut entity.role else {
        return false;
    };
    if state.detonated {
        return false;
    }
    state.detonated = true;
    let (reach, profile, owner) = (state.reach, state.profile, state.owner);

    let _ = world.despawn(bomb, out_events);
    debug!(bomb = bomb.get(), reach, x = position.x(), y = position.y(), "bomb detonated");
    out_events.push(Event::Detonated {
        bomb,
        position,
        reach,
    });

    let mut queue: VecDeque<PendingSegment> = Direction::ALL
        .into_iter()
        .map(|direction| PendingSegment {
            origin: position,
            direction,
            distance: 0,
            max_distance: reach,
            expandable: true,
            profile,
            owner,
        })
        .collect();
    while let Some(pending) = queue.pop_front() {
        if let Some(successor) = propagate(world, pending, out_events) {
            queue.push_back(successor);
        }
    }
    true
}

/// Places one segment and returns the segment that should follow it.
fn propagate(
    world: &mut World,
    pending: PendingSegment,
    out_events: &mut Vec<Event>,
) -> Option<PendingSegment> {
    let expandable = pending.expandable && pending.distance < pending.max_distance;
    let segment = match spawn_segment(world, &pending, expandable, out_events) {
        Ok(segment) => segment,
        Err(reason) => {
            warn!(
                direction = ?pending.direction,
                distance = pending.distance,
                %reason,
                "explosion propagation halted"
            );
            out_events.push(Event::PropagationHalted {
                direction: pending.direction,
                distance: pending.distance,
                reason,
            });
            return None;
        }
    };

    if pending.distance == 0 {
        let caught: Vec<EntityId> = world
            .entities_at(&footprint(pending.origin, GRID_SIZE))
            .into_iter()
            .map(|body| body.id)
            .filter(|id| *id != segment)
            .collect();
        for target in caught {
            let _ = interact(world, segment, Some(target), out_events);
        }
    }

    if !expandable {
        return None;
    }

    let successor = |origin, expandable| PendingSegment {
        origin,
        distance: pending.distance + 1,
        expandable,
        ..pending
    };
    match resolve_step(world, segment, pending.direction, GRID_SIZE, false, out_events) {
        StepOutcome::Committed(next) => Some(successor(next, true)),
        StepOutcome::Blocked(next) => Some(successor(next, false)),
        StepOutcome::OutOfBounds(_) | StepOutcome::Stale => None,
    }
}

fn spawn_segment(
    world: &mut World,
    pending: &PendingSegment,
    expandable: bool,
    out_events: &mut Vec<Event>,
) -> Result<EntityId, PlacementError> {
    let now = world.now();
    let frame = world.config().explosion_frame();
    let segment = world.register(
        EntityKind::Explosion,
        pending.origin,
        GRID_SIZE,
        Capabilities::for_blast(pending.profile),
        Role::Segment(Segment {
            direction: pending.direction,
            distance: pending.distance,
            max_distance: pending.max_distance,
            expandable,
            owner: pending.owner,
            frame: 1,
            fading: false,
            last_frame: now,
        }),
        TickPolicy::Throttled(frame),
        out_events,
    )?;
    out_events.push(Event::SegmentSpawned {
        segment,
        direction: pending.direction,
        distance: pending.distance,
        expandable,
        position: pending.origin,
    });
    Ok(segment)
}

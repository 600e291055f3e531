//! Time-driven entity behaviour and game command execution.

use std::time::Duration;

use blast_arena_core::{
    geometry::footprint, Blueprint, CharacterState, Coord, Direction, EntityId, EntityKind, Event,
    GameCommand, PlacementError, GRID_SIZE, PIXEL_UNIT,
};
use tracing::{debug, trace};

use crate::{explosion, interaction, movement, Controller, Role, World};

/// Number of animation frames a blast segment climbs through before fading.
const PEAK_FRAME: u8 = 3;

/// Delivers a clock notification to `entity`.
///
/// Paused matches and stale handles are ignored.
pub fn notify(world: &mut World, entity: EntityId, running: bool, out_events: &mut Vec<Event>) {
    if !running || !world.running {
        return;
    }
    let now = world.now();
    let (fuse, frame_length, death_delay) = {
        let config = world.config();
        (config.bomb_fuse(), config.explosion_frame(), config.death_delay())
    };
    let Some(target) = world.entity_mut(entity) else {
        return;
    };

    match &mut target.role {
        Role::Bomb(bomb) => {
            if !bomb.detonated && now.saturating_sub(bomb.armed_at) >= fuse {
                let _ = explosion::detonate(world, entity, out_events);
            }
        }
        Role::Segment(segment) => {
            if now.saturating_sub(segment.last_frame) < frame_length {
                return;
            }
            segment.last_frame = now;
            if segment.fading {
                segment.frame = segment.frame.saturating_sub(1);
            } else if segment.frame >= PEAK_FRAME {
                segment.fading = true;
                segment.frame -= 1;
            } else {
                segment.frame += 1;
            }
            if segment.fading && segment.frame == 0 {
                let _ = world.despawn(entity, out_events);
            }
        }
        Role::Character(character) => match character.state {
            CharacterState::Eliminated => {
                let expired = character
                    .eliminated_at
                    .map_or(true, |at| now.saturating_sub(at) >= death_delay);
                if expired {
                    let _ = world.despawn(entity, out_events);
                }
            }
            CharacterState::Alive | CharacterState::Immune => {
                let wanders = character.controller == Controller::Wander;
                expire_boosts(world, entity, now, out_events);
                if wanders {
                    wander(world, entity, out_events);
                }
            }
        },
        Role::Block { .. } | Role::PowerUp(_) => {}
    }
}

/// Executes `command` on behalf of `entity`.
///
/// `Pause` toggles the match even when issued by a stale handle; every other
/// command is ignored while the match is paused or the actor is not a live
/// character.
pub fn issue(
    world: &mut World,
    entity: EntityId,
    command: GameCommand,
    out_events: &mut Vec<Event>,
) {
    if command == GameCommand::Pause {
        let running = !world.running;
        world.set_running(running, out_events);
        return;
    }
    if !world.running {
        return;
    }

    if let Some(direction) = command.direction() {
        let Some(character) = world
            .entity_mut(entity)
            .and_then(|target| target.character_mut())
        else {
            return;
        };
        if character.state == CharacterState::Eliminated {
            return;
        }
        character.facing = direction;
        let _ =
            movement::move_or_interact(world, entity, direction, PIXEL_UNIT, false, out_events);
        return;
    }

    if command == GameCommand::PlaceBomb {
        let kind = EntityKind::Bomb;
        let fallback = world.entity(entity).map(|target| target.position);
        if let Err(reason) = place_bomb(world, entity, out_events) {
            trace!(entity = entity.get(), %reason, "bomb placement rejected");
            out_events.push(Event::SpawnRejected {
                kind,
                position: fallback.unwrap_or_default(),
                reason,
            });
        }
    }
}

/// Arms a bomb on the grid cell beneath the centre of `owner`.
pub fn place_bomb(
    world: &mut World,
    owner: EntityId,
    out_events: &mut Vec<Event>,
) -> Result<EntityId, PlacementError> {
    let entity = world.entity(owner).ok_or(PlacementError::MissingOwner)?;
    let character = entity.character().ok_or(PlacementError::InvalidBlueprint)?;
    if character.state == CharacterState::Eliminated {
        return Err(PlacementError::MissingOwner);
    }
    let (reach, capacity) = (character.reach, character.bomb_capacity);
    let cell = entity.position.center(entity.size).round();

    if world.armed_bombs(owner) >= usize::try_from(capacity).unwrap_or(usize::MAX) {
        return Err(PlacementError::CapacityReached);
    }
    let occupied = world
        .entities_at(&footprint(cell, GRID_SIZE))
        .iter()
        .any(|body| {
            matches!(
                body.kind,
                EntityKind::Bomb | EntityKind::HardBlock | EntityKind::DestroyableBlock
            )
        });
    if occupied {
        return Err(PlacementError::Occupied);
    }

    let bomb = world.spawn(
        Blueprint::Bomb {
            owner: Some(owner),
            reach,
        },
        cell,
        out_events,
    )?;
    debug!(owner = owner.get(), bomb = bomb.get(), "bomb placed");
    Ok(bomb)
}

/// Switches a live character between the alive and immune states.
///
/// Returns whether the state changed.
pub fn set_immune(
    world: &mut World,
    entity: EntityId,
    immune: bool,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(character) = world
        .entity_mut(entity)
        .and_then(|target| target.character_mut())
    else {
        return false;
    };
    let next = match (character.state, immune) {
        (CharacterState::Alive, true) => CharacterState::Immune,
        (CharacterState::Immune, false) => CharacterState::Alive,
        _ => return false,
    };
    character.state = next;
    out_events.push(Event::ImmunityChanged { entity, immune });
    true
}

/// Acts on the entity under `target` when `entity` holds an upgrade that
/// lets it break that kind.
///
/// Returns whether anything was struck. Paused matches, eliminated actors and
/// stale handles strike nothing.
pub fn strike(
    world: &mut World,
    entity: EntityId,
    target: Coord,
    out_events: &mut Vec<Event>,
) -> bool {
    if !world.running {
        return false;
    }
    let Some(strikes) = world
        .entity(entity)
        .and_then(|actor| actor.character())
        .filter(|character| character.state != CharacterState::Eliminated)
        .map(|character| character.strikes)
    else {
        return false;
    };
    let Some(victim) = world
        .entities_at(&[target])
        .into_iter()
        .find(|body| body.id != entity && strikes.contains(body.kind))
    else {
        return false;
    };
    trace!(entity = entity.get(), target = victim.id.get(), "strike");
    interaction::attack(world, entity, victim.id, out_events)
}

/// Revokes every timed upgrade of `entity` that has worn off by `now`.
fn expire_boosts(world: &mut World, entity: EntityId, now: Duration, out_events: &mut Vec<Event>) {
    let Some(character) = world
        .entity_mut(entity)
        .and_then(|target| target.character_mut())
    else {
        return;
    };
    let mut expired = Vec::new();
    character.boosts.retain(|boost| {
        let live = boost.expires_at > now;
        if !live {
            expired.push(boost.kind);
        }
        live
    });
    for kind in expired {
        interaction::revoke(world, entity, kind);
        debug!(entity = entity.get(), ?kind, "power-up expired");
        out_events.push(Event::PowerUpExpired { entity, kind });
    }
}

/// Steps forward, turning clockwise to the first open direction when blocked.
fn wander(world: &mut World, entity: EntityId, out_events: &mut Vec<Event>) {
    let Some(facing) = world
        .entity(entity)
        .and_then(|target| target.character())
        .map(|character| character.facing)
    else {
        return;
    };
    if movement::move_or_interact(world, entity, facing, PIXEL_UNIT, false, out_events) {
        return;
    }

    let open = movement::available_directions(world, entity);
    let mut candidate = facing.clockwise();
    let turn = (0..Direction::ALL.len()).find_map(|_| {
        let current = candidate;
        candidate = candidate.clockwise();
        open.contains(&current).then_some(current)
    });
    if let Some(direction) = turn {
        if let Some(character) = world
            .entity_mut(entity)
            .and_then(|target| target.character_mut())
        {
            character.facing = direction;
        }
    }
}

impl World {
    pub(crate) fn armed_bombs(&self, owner: EntityId) -> usize {
        self.entities
            .values()
            .filter(|entity| match &entity.role {
                Role::Bomb(bomb) => bomb.owner == Some(owner) && !bomb.detonated,
                _ => false,
            })
            .count()
    }
}

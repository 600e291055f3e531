//! Double-dispatch interaction protocol and the shared attack primitive.
//!
//! [`interact`] decides which side of an encounter acts: the initiator when
//! it may act on the target and the target accepts it, otherwise the target
//! when the roles reverse cleanly. The acting side's per-kind behaviour then
//! runs, subject to a debounce window keyed by the acting side and its
//! counterpart.

use blast_arena_core::{CharacterState, EntityId, EntityKind, Event, PowerUpKind, MAX_REACH};
use tracing::{debug, trace};

use crate::{Boost, Counterpart, Role, World};

/// Resolves an encounter between `initiator` and `target`.
///
/// A `None` target stands for empty space or the pitch edge. Returns whether
/// a per-kind behaviour ran. Stale handles on either side are ignored.
pub fn interact(
    world: &mut World,
    initiator: EntityId,
    target: Option<EntityId>,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(source) = world.entity(initiator) else {
        return false;
    };

    let Some(target) = target else {
        if !record_interaction(world, initiator, Counterpart::Void) {
            return false;
        }
        do_interact(world, initiator, None, out_events);
        return true;
    };

    let Some(other) = world.entity(target) else {
        return false;
    };

    let (actor, acted_on) = if source.capabilities.can_interact_with(other.kind)
        && other.capabilities.accepts(source.kind)
    {
        (initiator, target)
    } else if other.capabilities.can_interact_with(source.kind)
        && source.capabilities.accepts(other.kind)
    {
        (target, initiator)
    } else {
        return false;
    };

    if !record_interaction(world, actor, Counterpart::Entity(acted_on)) {
        trace!(actor = actor.get(), target = acted_on.get(), "interaction debounced");
        return false;
    }
    out_events.push(Event::Interacted {
        actor,
        target: acted_on,
    });
    do_interact(world, actor, Some(acted_on), out_events);
    true
}

/// Stores the interaction time unless the pair is still inside its debounce
/// window.
fn record_interaction(world: &mut World, actor: EntityId, counterpart: Counterpart) -> bool {
    let now = world.now();
    let window = world.config().interaction_debounce();
    let Some(entity) = world.entity_mut(actor) else {
        return false;
    };
    if let Some(last) = entity.last_interactions.get(&counterpart) {
        if now.saturating_sub(*last) < window {
            return false;
        }
    }
    let _ = entity.last_interactions.insert(counterpart, now);
    true
}

fn do_interact(
    world: &mut World,
    actor: EntityId,
    target: Option<EntityId>,
    out_events: &mut Vec<Event>,
) {
    let Some(target) = target else {
        out_events.push(Event::BoundaryTouched { entity: actor });
        return;
    };
    let (Some(actor_kind), Some(target_kind)) = (
        world.entity(actor).map(|entity| entity.kind),
        world.entity(target).map(|entity| entity.kind),
    ) else {
        return;
    };

    match (actor_kind, target_kind) {
        (EntityKind::Player, EntityKind::PowerUp) => collect(world, actor, target, out_events),
        (EntityKind::Explosion, EntityKind::Bomb) => world.request_detonation(target),
        (EntityKind::Enemy | EntityKind::Explosion, _) => {
            let _ = attack(world, actor, target, out_events);
        }
        _ => {}
    }
}

/// Applies the attacker's damage to `target`.
///
/// Immune and eliminated characters are skipped, as are hits landing inside
/// the target's damage window. Breakable blocks are destroyed outright.
/// Returns whether the attack had an effect.
pub fn attack(
    world: &mut World,
    attacker: EntityId,
    target: EntityId,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(damage) = world.entity(attacker).map(|entity| entity.attack_damage) else {
        return false;
    };
    let now = world.now();
    let window = world.config().interaction_debounce();
    let Some(victim) = world.entity_mut(target) else {
        return false;
    };

    let breakable = match &mut victim.role {
        Role::Character(character) => {
            if character.state != CharacterState::Alive {
                return false;
            }
            if let Some(last) = character.last_damage {
                if now.saturating_sub(last) < window {
                    return false;
                }
            }
            character.last_damage = Some(now);
            character.health = character.health.saturating_sub(damage);
            let health = character.health;
            out_events.push(Event::Damaged {
                entity: target,
                by: attacker,
                health,
            });
            if health == 0 {
                character.state = CharacterState::Eliminated;
                character.eliminated_at = Some(now);
                debug!(entity = target.get(), by = attacker.get(), "character eliminated");
                out_events.push(Event::Eliminated { entity: target });
            }
            return true;
        }
        Role::Block { breakable } => *breakable,
        _ => false,
    };
    if !breakable {
        return false;
    }

    let _ = world.despawn(target, out_events);
    out_events.push(Event::Destroyed {
        entity: target,
        by: attacker,
    });
    true
}

fn collect(world: &mut World, collector: EntityId, pickup: EntityId, out_events: &mut Vec<Event>) {
    let Some(kind) = world.entity(pickup).and_then(|entity| match entity.role {
        Role::PowerUp(kind) => Some(kind),
        _ => None,
    }) else {
        return;
    };
    let expires_at = world.now().saturating_add(world.config().power_up_duration());
    let Some(entity) = world.entity_mut(collector) else {
        return;
    };
    let capabilities = &mut entity.capabilities;
    let Some(character) = (match &mut entity.role {
        Role::Character(character) => Some(character),
        _ => None,
    }) else {
        return;
    };

    match kind {
        PowerUpKind::Fire => {
            if character.reach >= MAX_REACH {
                return;
            }
            character.reach += 1;
        }
        PowerUpKind::TransparentBombs => capabilities.whitelist(EntityKind::Bomb),
        PowerUpKind::TransparentBlocks => capabilities.whitelist(EntityKind::DestroyableBlock),
        PowerUpKind::Hammer => {
            character.strikes = character.strikes.with(EntityKind::DestroyableBlock);
        }
    }
    if kind.is_timed() {
        character.boosts.retain(|boost| boost.kind != kind);
        character.boosts.push(Boost { kind, expires_at });
    }

    let _ = world.despawn(pickup, out_events);
    debug!(collector = collector.get(), ?kind, "power-up collected");
    out_events.push(Event::PowerUpCollected { collector, kind });
}

/// Revokes a timed upgrade from `entity`.
pub(crate) fn revoke(world: &mut World, entity: EntityId, kind: PowerUpKind) {
    let Some(target) = world.entity_mut(entity) else {
        return;
    };
    match kind {
        PowerUpKind::TransparentBombs => target.capabilities.unwhitelist(EntityKind::Bomb),
        PowerUpKind::TransparentBlocks => {
            target.capabilities.unwhitelist(EntityKind::DestroyableBlock);
        }
        PowerUpKind::Hammer => {
            if let Some(character) = target.character_mut() {
                character.strikes = character.strikes.without(EntityKind::DestroyableBlock);
            }
        }
        PowerUpKind::Fire => {}
    }
}

use std::time::Duration;

use blast_arena_core::{
    ArenaConfig, Blueprint, CharacterState, Command, Coord, Direction, EnemyVariant, EntityId,
    Event,
};
use blast_arena_world::{self as world, interaction, query, World};

fn spawn(world: &mut World, blueprint: Blueprint, x: i32, y: i32) -> EntityId {
    let mut events = Vec::new();
    world
        .spawn(blueprint, Coord::new(x, y), &mut events)
        .expect("spawn inside the pitch")
}

fn enemy() -> Blueprint {
    Blueprint::Enemy {
        speed: 1.0,
        facing: Direction::Left,
        variant: EnemyVariant::Basic,
    }
}

fn advance(world: &mut World, millis: u64) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::AdvanceClock {
            now: Duration::from_millis(millis),
        },
        &mut events,
    );
}

#[test]
fn lethal_attacks_inside_window_eliminate_exactly_once() {
    let mut world = World::default();
    let attacker = spawn(&mut world, enemy(), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 420, 300);

    let mut events = Vec::new();
    assert!(interaction::attack(&mut world, attacker, player, &mut events));
    assert!(!interaction::attack(&mut world, attacker, player, &mut events));

    let view = query::character(&world, player).expect("player lingers until removed");
    assert_eq!(view.health, 0);
    assert_eq!(view.state, CharacterState::Eliminated);
    let eliminations = events
        .iter()
        .filter(|event| matches!(event, Event::Eliminated { .. }))
        .count();
    assert_eq!(eliminations, 1);
}

#[test]
fn attacks_spaced_beyond_window_both_land() {
    let config = ArenaConfig {
        character_health: 300,
        ..ArenaConfig::default()
    };
    let mut world = World::new(config);
    let attacker = spawn(&mut world, enemy(), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 420, 300);

    let mut events = Vec::new();
    assert!(interaction::attack(&mut world, attacker, player, &mut events));
    advance(&mut world, 400);
    assert!(!interaction::attack(&mut world, attacker, player, &mut events));
    advance(&mut world, 600);
    assert!(interaction::attack(&mut world, attacker, player, &mut events));

    let healths: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::Damaged { health, .. } => Some(*health),
            _ => None,
        })
        .collect();
    assert_eq!(healths, vec![200, 100]);
}

#[test]
fn repeated_interaction_is_debounced_per_pair() {
    let config = ArenaConfig {
        character_health: 1_000,
        ..ArenaConfig::default()
    };
    let mut world = World::new(config);
    let attacker = spawn(&mut world, enemy(), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 420, 300);

    let mut events = Vec::new();
    assert!(interaction::interact(&mut world, attacker, Some(player), &mut events));
    assert!(!interaction::interact(&mut world, attacker, Some(player), &mut events));
    advance(&mut world, 499);
    assert!(!interaction::interact(&mut world, attacker, Some(player), &mut events));
    advance(&mut world, 500);
    assert!(interaction::interact(&mut world, attacker, Some(player), &mut events));

    let interactions = events
        .iter()
        .filter(|event| matches!(event, Event::Interacted { .. }))
        .count();
    assert_eq!(interactions, 2);
}

#[test]
fn reversed_roles_let_the_capable_side_act() {
    let mut world = World::default();
    let attacker = spawn(&mut world, enemy(), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 420, 300);

    let mut events = Vec::new();
    assert!(interaction::interact(&mut world, player, Some(attacker), &mut events));
    assert_eq!(
        events.first(),
        Some(&Event::Interacted {
            actor: attacker,
            target: player,
        })
    );
}

#[test]
fn mutually_inert_kinds_do_not_interact() {
    let mut world = World::default();
    let player = spawn(&mut world, Blueprint::Player, 300, 300);
    let wall = spawn(&mut world, Blueprint::HardBlock, 420, 300);

    let mut events = Vec::new();
    assert!(!interaction::interact(&mut world, player, Some(wall), &mut events));
    assert!(events.is_empty());
}

#[test]
fn immune_characters_ignore_attacks() {
    let mut world = World::default();
    let attacker = spawn(&mut world, enemy(), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 420, 300);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetImmune {
            entity: player,
            immune: true,
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::ImmunityChanged {
            entity: player,
            immune: true,
        }]
    );
    assert!(!interaction::attack(&mut world, attacker, player, &mut events));
    assert_eq!(query::character(&world, player).map(|view| view.health), Some(100));
}

#[test]
fn stale_handles_are_ignored() {
    let mut world = World::default();
    let attacker = spawn(&mut world, enemy(), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 420, 300);

    let mut events = Vec::new();
    assert!(world.despawn(player, &mut events));
    events.clear();

    assert!(!interaction::interact(&mut world, attacker, Some(player), &mut events));
    assert!(!interaction::interact(&mut world, player, None, &mut events));
    assert!(!interaction::attack(&mut world, attacker, player, &mut events));
    world::apply(
        &mut world,
        Command::Notify {
            entity: player,
            running: true,
        },
        &mut events,
    );
    assert!(events.is_empty());
}

#[test]
fn despawn_is_idempotent() {
    let mut world = World::default();
    let block = spawn(&mut world, Blueprint::DestroyableBlock, 60, 60);

    let mut events = Vec::new();
    assert!(world.despawn(block, &mut events));
    assert!(!world.despawn(block, &mut events));
    world::apply(&mut world, Command::Despawn { entity: block }, &mut events);

    let despawns = events
        .iter()
        .filter(|event| matches!(event, Event::Despawned { .. }))
        .count();
    assert_eq!(despawns, 1);
    assert!(query::snapshot(&world).iter().all(|entry| entry.id != block));
}

#[test]
fn snapshot_orders_by_draw_priority() {
    let mut world = World::default();
    let player = spawn(&mut world, Blueprint::Player, 0, 0);
    let block = spawn(&mut world, Blueprint::HardBlock, 120, 0);

    let order: Vec<EntityId> = query::snapshot(&world).iter().map(|entry| entry.id).collect();
    assert_eq!(order, vec![block, player]);
}

#[test]
fn spawn_outside_pitch_is_rejected() {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::Spawn {
            blueprint: Blueprint::HardBlock,
            position: Coord::new(750, 0),
        },
        &mut events,
    );
    assert!(matches!(
        events.as_slice(),
        [Event::SpawnRejected {
            reason: blast_arena_core::PlacementError::OutOfBounds,
            ..
        }]
    ));
}

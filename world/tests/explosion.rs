use std::collections::BTreeMap;

use blast_arena_core::{
    ArenaConfig, Blueprint, CharacterState, Command, Coord, Direction, EntityId, Event,
};
use blast_arena_world::{self as world, explosion, query, World};

fn spawn(world: &mut World, blueprint: Blueprint, x: i32, y: i32) -> EntityId {
    let mut events = Vec::new();
    world
        .spawn(blueprint, Coord::new(x, y), &mut events)
        .expect("spawn inside the pitch")
}

fn bomb(reach: u32) -> Blueprint {
    Blueprint::Bomb { owner: None, reach }
}

fn chains(events: &[Event]) -> BTreeMap<Direction, Vec<(u32, bool)>> {
    let mut chains: BTreeMap<Direction, Vec<(u32, bool)>> = BTreeMap::new();
    for event in events {
        if let Event::SegmentSpawned {
            direction,
            distance,
            expandable,
            ..
        } = event
        {
            chains
                .entry(*direction)
                .or_default()
                .push((*distance, *expandable));
        }
    }
    chains
}

#[test]
fn open_field_blast_grows_full_reach_in_every_direction() {
    let mut world = World::default();
    let bomb = spawn(&mut world, bomb(2), 300, 300);

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    let chains = chains(&events);
    assert_eq!(chains.len(), 4, "expected one chain per direction");
    for direction in Direction::ALL {
        assert_eq!(
            chains[&direction],
            vec![(0, true), (1, true), (2, false)],
            "unexpected chain towards {direction:?}"
        );
    }
    assert!(!query::is_spawned(&world, bomb));
}

#[test]
fn breakable_block_terminates_chain_and_is_destroyed() {
    let mut world = World::default();
    let bomb = spawn(&mut world, bomb(2), 300, 300);
    let block = spawn(&mut world, Blueprint::DestroyableBlock, 360, 300);

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    let chains = chains(&events);
    assert_eq!(chains[&Direction::Right], vec![(0, true), (1, false)]);
    assert_eq!(chains[&Direction::Left], vec![(0, true), (1, true), (2, false)]);
    assert!(events.contains(&Event::Destroyed {
        entity: block,
        by: find_segment(&events, Direction::Right, 0),
    }));
    assert!(!query::is_spawned(&world, block));
}

#[test]
fn hard_block_survives_and_receives_terminal_segment() {
    let mut world = World::default();
    let bomb = spawn(&mut world, bomb(3), 300, 300);
    let wall = spawn(&mut world, Blueprint::HardBlock, 300, 180);

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    assert_eq!(chains(&events)[&Direction::Up], vec![(0, true), (1, true), (2, false)]);
    assert!(query::is_spawned(&world, wall));
    let terminal = events.iter().find_map(|event| match event {
        Event::SegmentSpawned {
            direction: Direction::Up,
            distance: 2,
            position,
            ..
        } => Some(*position),
        _ => None,
    });
    assert_eq!(terminal, Some(Coord::new(300, 180)));
}

#[test]
fn wall_straddling_the_bomb_cell_stops_the_chain() {
    let mut world = World::default();
    let bomb = spawn(&mut world, bomb(2), 300, 300);
    let wall = spawn(&mut world, Blueprint::HardBlock, 330, 300);

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    let chains = chains(&events);
    assert_eq!(chains[&Direction::Right], vec![(0, true), (1, false)]);
    assert_eq!(chains[&Direction::Left], vec![(0, true), (1, true), (2, false)]);
    assert!(query::is_spawned(&world, wall));
}

#[test]
fn chain_stops_at_pitch_edge() {
    let mut world = World::default();
    let bomb = spawn(&mut world, bomb(2), 0, 0);

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    let chains = chains(&events);
    assert_eq!(chains[&Direction::Left].len(), 1);
    assert_eq!(chains[&Direction::Up].len(), 1);
    assert_eq!(chains[&Direction::Right].len(), 3);
    for chain in chains.values() {
        assert!(chain.len() <= 3, "chain exceeded reach + 1 segments");
    }
}

#[test]
fn blast_reaching_a_bomb_detonates_it_once() {
    let mut world = World::default();
    let first = spawn(&mut world, bomb(2), 300, 300);
    let second = spawn(&mut world, bomb(1), 420, 300);

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, first, &mut events));

    let detonated: Vec<EntityId> = events
        .iter()
        .filter_map(|event| match event {
            Event::Detonated { bomb, .. } => Some(*bomb),
            _ => None,
        })
        .collect();
    assert_eq!(detonated, vec![first, second]);
    assert!(!query::is_spawned(&world, second));

    let mut again = Vec::new();
    assert!(!explosion::detonate(&mut world, second, &mut again));
    assert!(again.is_empty());
}

#[test]
fn blast_eliminates_character_in_its_path() {
    let mut world = World::default();
    let bomb = spawn(&mut world, bomb(2), 300, 300);
    let player = spawn(&mut world, Blueprint::Player, 370, 310);

    let mut events = Vec::new();
    world::apply(&mut world, Command::Detonate { bomb }, &mut events);

    let eliminated = events
        .iter()
        .filter(|event| matches!(event, Event::Eliminated { entity } if *entity == player))
        .count();
    assert_eq!(eliminated, 1);
    let view = query::character(&world, player).expect("eliminated characters linger");
    assert_eq!(view.health, 0);
    assert_eq!(view.state, CharacterState::Eliminated);
}

#[test]
fn central_blast_hits_owner_standing_on_bomb_once() {
    let config = ArenaConfig {
        character_health: 300,
        ..ArenaConfig::default()
    };
    let mut world = World::new(config);
    let player = spawn(&mut world, Blueprint::Player, 310, 310);
    let bomb = spawn(
        &mut world,
        Blueprint::Bomb {
            owner: Some(player),
            reach: 1,
        },
        300,
        300,
    );

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    let hits = events
        .iter()
        .filter(|event| matches!(event, Event::Damaged { entity, .. } if *entity == player))
        .count();
    assert_eq!(hits, 1, "damage window should absorb overlapping segments");
    assert_eq!(query::character(&world, player).map(|view| view.health), Some(200));
}

#[test]
fn segments_inherit_owner_and_reach() {
    let mut world = World::default();
    let owner = spawn(&mut world, Blueprint::Player, 10, 10);
    let bomb = spawn(
        &mut world,
        Blueprint::Bomb {
            owner: Some(owner),
            reach: 1,
        },
        300,
        300,
    );

    let mut events = Vec::new();
    assert!(explosion::detonate(&mut world, bomb, &mut events));

    let segment = find_segment(&events, Direction::Down, 1);
    let view = query::segment(&world, segment).expect("segment is live");
    assert_eq!(view.owner, Some(owner));
    assert_eq!(view.max_distance, 1);
    assert!(!view.expandable);
    assert_eq!(view.frame, 1);
}

fn find_segment(events: &[Event], wanted: Direction, wanted_distance: u32) -> EntityId {
    events
        .iter()
        .find_map(|event| match event {
            Event::SegmentSpawned {
                segment,
                direction,
                distance,
                ..
            } if *direction == wanted && *distance == wanted_distance => Some(*segment),
            _ => None,
        })
        .expect("segment spawned")
}

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use blast_arena_core::{
    ArenaConfig, Blueprint, Coord, EntityKind, Event, GameCommand, PowerUpKind,
};
use blast_arena_runtime::{Match, StartError};
use blast_arena_world::query;
use tokio::{sync::broadcast, time::sleep};

fn drain(receiver: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn bomb() -> Blueprint {
    Blueprint::Bomb {
        owner: None,
        reach: 2,
    }
}

#[tokio::test(start_paused = true)]
async fn bomb_detonates_after_its_fuse() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let mut receiver = arena.subscribe();
    let bomb = arena.spawn(bomb(), Coord::new(300, 300)).expect("cell is free");

    sleep(Duration::from_millis(4_900)).await;
    assert!(arena.read(|world| query::is_spawned(world, bomb)));

    sleep(Duration::from_millis(200)).await;
    let events = drain(&mut receiver);
    assert!(events.iter().any(
        |event| matches!(event, Event::Detonated { bomb: detonated, .. } if *detonated == bomb)
    ));

    sleep(Duration::from_secs(1)).await;
    assert!(arena.snapshot().is_empty(), "explosion segments should fade out");
    arena.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn held_key_moves_the_controlled_player() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let player = arena
        .spawn(Blueprint::Player, Coord::ORIGIN)
        .expect("corner is free");
    arena.control(player);

    assert!(arena.press(GameCommand::MoveRight));
    sleep(Duration::from_millis(200)).await;
    arena.release(GameCommand::MoveRight);
    sleep(Duration::from_millis(200)).await;

    let position = arena
        .read(|world| query::position(world, player))
        .expect("player is live");
    assert_eq!(position.y(), 0);
    assert!(
        (25..=35).contains(&position.x()),
        "expected about six steps, got x = {}",
        position.x()
    );
    arena.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn pointer_steering_reaches_the_target_cell() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let player = arena
        .spawn(Blueprint::Player, Coord::ORIGIN)
        .expect("corner is free");
    arena.control(player);

    assert!(arena.steer_toward(Coord::new(130, 10)));
    sleep(Duration::from_secs(2)).await;

    let position = arena
        .read(|world| query::position(world, player))
        .expect("player is live");
    assert_eq!(position.round(), Coord::new(120, 0));
    arena.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn click_with_the_hammer_breaks_the_block_under_the_pointer() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let player = arena
        .spawn(Blueprint::Player, Coord::ORIGIN)
        .expect("corner is free");
    let _hammer = arena
        .spawn(
            Blueprint::PowerUp {
                kind: PowerUpKind::Hammer,
            },
            Coord::new(41, 0),
        )
        .expect("cell is free");
    let block = arena
        .spawn(Blueprint::DestroyableBlock, Coord::new(300, 300))
        .expect("cell is free");
    arena.control(player);

    assert!(arena.press(GameCommand::MoveRight));
    sleep(Duration::from_millis(100)).await;
    arena.release(GameCommand::MoveRight);

    assert!(arena.click(Coord::new(310, 310)));
    assert!(!arena.read(|world| query::is_spawned(world, block)));
    arena.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn click_without_the_hammer_steers_instead() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let player = arena
        .spawn(Blueprint::Player, Coord::ORIGIN)
        .expect("corner is free");
    let block = arena
        .spawn(Blueprint::DestroyableBlock, Coord::new(300, 300))
        .expect("cell is free");
    assert!(!arena.click(Coord::new(310, 310)));

    arena.control(player);
    assert!(arena.click(Coord::new(130, 10)));
    sleep(Duration::from_secs(2)).await;

    assert!(arena.read(|world| query::is_spawned(world, block)));
    let position = arena
        .read(|world| query::position(world, player))
        .expect("player is live");
    assert_eq!(position.round(), Coord::new(120, 0));
    arena.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn paused_clock_freezes_the_fuse() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let bomb = arena.spawn(bomb(), Coord::new(300, 300)).expect("cell is free");

    sleep(Duration::from_secs(1)).await;
    arena.pause();
    assert!(arena.is_paused());
    sleep(Duration::from_secs(10)).await;
    assert!(arena.read(|world| query::is_spawned(world, bomb)));
    assert!(arena.now() < Duration::from_millis(1_100));

    arena.resume();
    sleep(Duration::from_millis(4_200)).await;
    assert!(!arena.read(|world| query::is_spawned(world, bomb)));
    arena.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn callbacks_receive_events_off_the_tick() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener = arena.on_event(move |event| {
        if let Event::Spawned { kind, .. } = event {
            sink.lock().expect("sink lock").push(kind);
        }
    });

    let _ = arena
        .spawn(Blueprint::HardBlock, Coord::new(60, 60))
        .expect("cell is free");
    sleep(Duration::from_millis(10)).await;
    assert_eq!(*seen.lock().expect("sink lock"), vec![EntityKind::HardBlock]);

    arena.shutdown().await;
    listener.await.expect("listener stops with the match");
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_clock() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let bomb = arena.spawn(bomb(), Coord::new(300, 300)).expect("cell is free");

    arena.shutdown().await;
    sleep(Duration::from_secs(10)).await;
    assert!(arena.read(|world| query::is_spawned(world, bomb)));
}

#[tokio::test(start_paused = true)]
async fn despawn_is_idempotent() {
    let arena = Match::start(ArenaConfig::default()).expect("default config is valid");
    let block = arena
        .spawn(Blueprint::DestroyableBlock, Coord::new(60, 60))
        .expect("cell is free");

    assert!(arena.despawn(block));
    assert!(!arena.despawn(block));
    assert!(arena.snapshot().is_empty());
    arena.shutdown().await;
}

#[tokio::test]
async fn invalid_configuration_is_rejected() {
    let config = ArenaConfig {
        columns: 0,
        ..ArenaConfig::default()
    };
    assert!(matches!(
        Match::start(config),
        Err(StartError::InvalidConfig(_))
    ));
}

#[test]
fn starting_outside_a_runtime_fails() {
    assert!(matches!(
        Match::start(ArenaConfig::default()),
        Err(StartError::NoRuntime(_))
    ));
}

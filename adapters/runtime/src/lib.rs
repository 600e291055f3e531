#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tokio runtime adapter that runs a Blast Arena match in the background.
//!
//! A [`Match`] owns the world behind a lock and drives it with two
//! independent periodic timers: the simulation clock and the command queue
//! dispatch. World events are fanned out over a broadcast channel so
//! collaborators such as renderers or sound never block a tick.

mod shared;
mod tasks;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use blast_arena_core::{
    ArenaConfig, Blueprint, Command, ConfigError, Coord, EntityId, EntitySnapshot, Event,
    GameCommand, PlacementError,
};
use blast_arena_world::{self as world, query, World};
use thiserror::Error;
use tokio::{
    runtime::{Handle, TryCurrentError},
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use shared::{lock, Shared};

/// Reasons a match cannot be started.
#[derive(Debug, Error)]
pub enum StartError {
    /// The supplied configuration failed validation.
    #[error("invalid arena configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// The caller is not running inside a Tokio runtime.
    #[error("a match must be started from within a Tokio runtime")]
    NoRuntime(#[from] TryCurrentError),
}

/// Handle to a running match.
#[derive(Debug)]
pub struct Match {
    shared: Arc<Shared>,
    runtime: Handle,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Match {
    /// Validates `config` and starts the clock and input timers on the
    /// current Tokio runtime.
    pub fn start(config: ArenaConfig) -> Result<Self, StartError> {
        config.validate()?;
        let runtime = Handle::try_current()?;
        let tick_interval = config.tick_interval();
        let (columns, rows) = (config.columns, config.rows);

        let shared = Arc::new(Shared::new(config));
        let (shutdown, _) = watch::channel(false);
        let tasks = vec![
            runtime.spawn(tasks::clock_task(
                Arc::clone(&shared),
                tick_interval,
                shutdown.subscribe(),
            )),
            runtime.spawn(tasks::input_task(Arc::clone(&shared), shutdown.subscribe())),
        ];
        info!(columns, rows, "match started");

        Ok(Self {
            shared,
            runtime,
            shutdown,
            tasks: Mutex::new(tasks),
        })
    }

    /// Adds an entity to the arena.
    pub fn spawn(&self, blueprint: Blueprint, position: Coord) -> Result<EntityId, PlacementError> {
        let now = self.shared.now();
        let mut events = Vec::new();
        let spawned = {
            let mut world = lock(&self.shared.world);
            world::apply(&mut world, Command::AdvanceClock { now }, &mut events);
            let spawned = world.spawn(blueprint, position, &mut events);
            let mut clock = lock(&self.shared.clock);
            let now = clock.now();
            clock.scheduler.handle(&events, now);
            spawned
        };
        self.shared.publish(events);
        spawned
    }

    /// Removes an entity; repeated calls have no further effect.
    pub fn despawn(&self, entity: EntityId) -> bool {
        let events = self.shared.execute(vec![Command::Despawn { entity }]);
        !events.is_empty()
    }

    /// Executes an arbitrary world command and returns the events it produced.
    pub fn submit(&self, command: Command) -> Vec<Event> {
        self.shared.execute(vec![command])
    }

    /// Directs keyboard and pointer commands at `entity`.
    pub fn control(&self, entity: EntityId) {
        lock(&self.shared.input).actor = Some(entity);
    }

    /// Records a key press for the controlled character.
    ///
    /// Returns `false` if the press was debounced.
    pub fn press(&self, command: GameCommand) -> bool {
        let now = self.shared.now();
        let accepted = lock(&self.shared.input).queue.press(command, now);
        if accepted {
            self.shared.input_wake.notify_one();
        }
        accepted
    }

    /// Records a key release for the controlled character.
    pub fn release(&self, command: GameCommand) {
        lock(&self.shared.input).queue.release(command);
    }

    /// Steers the controlled character toward `pointer`.
    ///
    /// Returns `false` when no live character is controlled.
    pub fn steer_toward(&self, pointer: Coord) -> bool {
        let now = self.shared.now();
        let Some(actor) = lock(&self.shared.input).actor else {
            return false;
        };
        let Some(position) = query::position(&lock(&self.shared.world), actor) else {
            return false;
        };
        lock(&self.shared.input)
            .queue
            .steer_toward(position, pointer, now);
        self.shared.input_wake.notify_one();
        true
    }

    /// Handles a pointer click: the controlled character strikes whatever
    /// it can break under `pointer`, otherwise it steers toward it.
    ///
    /// Returns `false` when no live character is controlled.
    pub fn click(&self, pointer: Coord) -> bool {
        let Some(actor) = lock(&self.shared.input).actor else {
            return false;
        };
        let struck = self.shared.execute(vec![
            Command::AdvanceClock {
                now: self.shared.now(),
            },
            Command::Strike {
                entity: actor,
                target: pointer,
            },
        ]);
        if struck.is_empty() {
            return self.steer_toward(pointer);
        }
        lock(&self.shared.input).queue.stop_steering();
        true
    }

    /// Cancels pointer steering.
    pub fn stop_steering(&self) {
        lock(&self.shared.input).queue.stop_steering();
    }

    /// Switches the command queue between regular and turbo debounce.
    pub fn set_turbo(&self, turbo: bool) {
        lock(&self.shared.input).queue.set_turbo(turbo);
    }

    /// Stops the physical clock without losing registrations; match time
    /// stands still until [`Match::resume`].
    pub fn pause(&self) {
        lock(&self.shared.clock).pause();
        debug!("clock paused");
    }

    /// Restarts the physical clock after [`Match::pause`].
    pub fn resume(&self) {
        lock(&self.shared.clock).resume();
        debug!("clock resumed");
    }

    /// Reports whether the physical clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        !lock(&self.shared.clock).scheduler.is_running()
    }

    /// Current match time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.shared.now()
    }

    /// Live entities ordered by draw priority.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        query::snapshot(&lock(&self.shared.world))
    }

    /// Runs `read` against the world without mutating it.
    pub fn read<R>(&self, read: impl FnOnce(&World) -> R) -> R {
        read(&lock(&self.shared.world))
    }

    /// Subscribes to every event produced from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    /// Runs `callback` for every event on its own task until the match shuts
    /// down.
    pub fn on_event<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(Event) + Send + 'static,
    {
        let mut receiver = self.shared.events.subscribe();
        let mut shutdown = self.shutdown.subscribe();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    received = receiver.recv() => match received {
                        Ok(event) => callback(event),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event callback lagged behind the match");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    /// Stops both timers, waits for them to finish and drops every clock
    /// registration.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send_replace(true);
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(error) = task.await {
                warn!(%error, "match task ended abnormally");
            }
        }
        lock(&self.shared.clock).scheduler.unregister_all();
        info!("match stopped");
    }
}

//! State shared between the match handle and its background tasks.
//!
//! Locks are always taken in the order world, clock. The input lock is never
//! held while the world lock is being acquired.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use blast_arena_core::{ArenaConfig, Command, EntityId, Event};
use blast_arena_system_clock::TickScheduler;
use blast_arena_system_input::{CommandQueue, Config as InputConfig};
use blast_arena_world::{self as world, query, World};
use tokio::{
    sync::{broadcast, Notify},
    time::Instant,
};
use tracing::{error, trace};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Best-effort textual form of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Match time that stands still while the physical clock is paused.
#[derive(Debug)]
pub(crate) struct TimeBase {
    origin: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl TimeBase {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    fn now(&self) -> Duration {
        let reference = self.paused_at.unwrap_or_else(Instant::now);
        reference
            .saturating_duration_since(self.origin)
            .saturating_sub(self.paused_total)
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total = self
                .paused_total
                .saturating_add(Instant::now().saturating_duration_since(paused_at));
        }
    }
}

#[derive(Debug)]
pub(crate) struct ClockState {
    pub(crate) scheduler: TickScheduler,
    time: TimeBase,
}

impl ClockState {
    pub(crate) fn now(&self) -> Duration {
        self.time.now()
    }

    pub(crate) fn pause(&mut self) {
        self.scheduler.pause();
        self.time.pause();
    }

    pub(crate) fn resume(&mut self) {
        self.time.resume();
        self.scheduler.resume();
    }
}

#[derive(Debug)]
pub(crate) struct InputState {
    pub(crate) queue: CommandQueue,
    pub(crate) actor: Option<EntityId>,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) world: Mutex<World>,
    pub(crate) clock: Mutex<ClockState>,
    pub(crate) input: Mutex<InputState>,
    pub(crate) events: broadcast::Sender<Event>,
    pub(crate) input_wake: Notify,
}

impl Shared {
    pub(crate) fn new(config: ArenaConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        let queue = CommandQueue::new(InputConfig::from(&config));
        Self {
            world: Mutex::new(World::new(config)),
            clock: Mutex::new(ClockState {
                scheduler: TickScheduler::new(),
                time: TimeBase::new(),
            }),
            input: Mutex::new(InputState { queue, actor: None }),
            events,
            input_wake: Notify::new(),
        }
    }

    pub(crate) fn now(&self) -> Duration {
        lock(&self.clock).now()
    }

    /// Fans events out to subscribers; having none is not an error.
    pub(crate) fn publish(&self, events: Vec<Event>) {
        for event in events {
            let _ = self.events.send(event);
        }
    }

    /// Executes `commands` against the world and keeps the clock in sync with
    /// the resulting membership changes.
    pub(crate) fn execute(&self, commands: Vec<Command>) -> Vec<Event> {
        self.execute_with(commands, world::apply)
    }

    fn execute_with<D>(&self, commands: Vec<Command>, mut deliver: D) -> Vec<Event>
    where
        D: FnMut(&mut World, Command, &mut Vec<Event>),
    {
        let mut events = Vec::new();
        {
            let mut world = lock(&self.world);
            for command in commands {
                apply_isolated(&mut world, command, &mut events, &mut deliver);
            }
            let mut clock = lock(&self.clock);
            let now = clock.now();
            clock.scheduler.handle(&events, now);
        }
        self.publish(events.clone());
        events
    }

    /// One period of the simulation clock.
    pub(crate) fn clock_tick(&self) {
        self.clock_tick_with(world::apply);
    }

    fn clock_tick_with<D>(&self, mut deliver: D)
    where
        D: FnMut(&mut World, Command, &mut Vec<Event>),
    {
        let mut events = Vec::new();
        {
            let mut world = lock(&self.world);
            let mut clock = lock(&self.clock);
            if !clock.scheduler.is_running() {
                return;
            }
            let now = clock.now();
            world::apply(&mut world, Command::AdvanceClock { now }, &mut events);

            let mut notifications = Vec::new();
            let running = query::is_running(&world);
            clock.scheduler.tick(
                now,
                |entity| query::is_spawned(&world, entity),
                running,
                &mut notifications,
            );
            for command in notifications {
                apply_isolated(&mut world, command, &mut events, &mut deliver);
            }
            clock.scheduler.handle(&events, now);
        }
        self.publish(events);
    }

    /// One period of the command queue dispatch.
    pub(crate) fn input_tick(&self) {
        let now = self.now();
        let Some(actor) = lock(&self.input).actor else {
            return;
        };
        let position = query::position(&lock(&self.world), actor);

        let mut commands = Vec::new();
        lock(&self.input)
            .queue
            .handle(now, actor, position, &mut commands);
        if commands.is_empty() {
            return;
        }
        trace!(count = commands.len(), "dispatching held commands");
        commands.insert(0, Command::AdvanceClock { now });
        let _ = self.execute(commands);
    }

    /// Reports whether the dispatch task may sleep, and its current period.
    pub(crate) fn input_status(&self) -> (bool, Duration) {
        let input = lock(&self.input);
        (input.queue.is_idle(), input.queue.period())
    }
}

/// Entity a command acts on, removed if delivering the command panics.
fn subject_of(command: &Command) -> Option<EntityId> {
    match *command {
        Command::Despawn { entity }
        | Command::Notify { entity, .. }
        | Command::Issue { entity, .. }
        | Command::Strike { entity, .. }
        | Command::SetImmune { entity, .. } => Some(entity),
        Command::Detonate { bomb } => Some(bomb),
        Command::Spawn { .. } | Command::AdvanceClock { .. } => None,
    }
}

/// Delivers one command, despawning its subject if the delivery panics so
/// the remaining commands of the batch still run.
fn apply_isolated<D>(
    world: &mut World,
    command: Command,
    events: &mut Vec<Event>,
    deliver: &mut D,
) where
    D: FnMut(&mut World, Command, &mut Vec<Event>),
{
    let subject = subject_of(&command);
    let mut produced = Vec::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        deliver(world, command, &mut produced);
    }));
    events.append(&mut produced);
    let Err(payload) = outcome else {
        return;
    };
    let panic = panic_message(payload.as_ref());
    match subject {
        Some(entity) => {
            error!(entity = entity.get(), panic, "entity behaviour panicked; removing entity");
            let _ = world.despawn(entity, events);
        }
        None => error!(panic, "world command panicked"),
    }
}

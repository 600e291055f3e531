#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-rate simulation clock that decides which entities receive a tick.
//!
//! The scheduler is pure: it learns about entities from world events and
//! answers each physical tick with `Command::Notify` values for the world to
//! execute.

use std::{collections::BTreeMap, time::Duration};

use blast_arena_core::{Command, EntityId, Event, TickPolicy};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Registration {
    last_update: Duration,
    min_interval: Option<Duration>,
}

/// Pure system that throttles per-entity notifications on a shared clock.
#[derive(Debug)]
pub struct TickScheduler {
    registrations: BTreeMap<EntityId, Registration>,
    running: bool,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    /// Creates a running scheduler with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: BTreeMap::new(),
            running: true,
        }
    }

    /// Consumes world events, registering spawned observers and dropping
    /// despawned ones.
    pub fn handle(&mut self, events: &[Event], now: Duration) {
        for event in events {
            match event {
                Event::Spawned {
                    entity, schedule, ..
                } => {
                    let _ = self.register(*entity, *schedule, now);
                }
                Event::Despawned { entity, .. } => {
                    let _ = self.unregister(*entity);
                }
                _ => {}
            }
        }
    }

    /// Registers `entity` according to its tick policy.
    ///
    /// Returns `false` for unscheduled entities and for entities that are
    /// already registered.
    pub fn register(&mut self, entity: EntityId, policy: TickPolicy, now: Duration) -> bool {
        let min_interval = match policy {
            TickPolicy::Unscheduled => return false,
            TickPolicy::EveryTick => None,
            TickPolicy::Throttled(interval) => Some(interval),
        };
        if self.registrations.contains_key(&entity) {
            return false;
        }
        let _ = self.registrations.insert(
            entity,
            Registration {
                last_update: now,
                min_interval,
            },
        );
        true
    }

    /// Removes `entity`, returning whether it was registered.
    pub fn unregister(&mut self, entity: EntityId) -> bool {
        self.registrations.remove(&entity).is_some()
    }

    /// Drops every registration, used when a match is torn down.
    pub fn unregister_all(&mut self) {
        self.registrations.clear();
    }

    /// Stops emitting notifications without losing registrations.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Restarts notifications after [`TickScheduler::pause`].
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Reports whether the scheduler currently emits notifications.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Reports whether `entity` is registered.
    #[must_use]
    pub fn is_registered(&self, entity: EntityId) -> bool {
        self.registrations.contains_key(&entity)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Reports whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Runs one clock tick at `now`.
    ///
    /// Entries whose entity is no longer spawned are pruned first. Every
    /// remaining entry whose interval has elapsed receives a notification
    /// carrying `match_running`.
    pub fn tick<F>(
        &mut self,
        now: Duration,
        is_spawned: F,
        match_running: bool,
        out: &mut Vec<Command>,
    ) where
        F: Fn(EntityId) -> bool,
    {
        if !self.running {
            return;
        }

        let before = self.registrations.len();
        self.registrations.retain(|entity, _| is_spawned(*entity));
        let pruned = before - self.registrations.len();
        if pruned > 0 {
            trace!(pruned, "pruned stale clock registrations");
        }

        for (entity, registration) in &mut self.registrations {
            let due = registration.min_interval.map_or(true, |interval| {
                now.saturating_sub(registration.last_update) >= interval
            });
            if due {
                registration.last_update = now;
                out.push(Command::Notify {
                    entity: *entity,
                    running: match_running,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notified(commands: &[Command]) -> Vec<EntityId> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::Notify { entity, .. } => Some(*entity),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unscheduled_entities_are_not_registered() {
        let mut scheduler = TickScheduler::new();
        assert!(!scheduler.register(EntityId::new(1), TickPolicy::Unscheduled, Duration::ZERO));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn throttled_entries_wait_for_their_interval() {
        let mut scheduler = TickScheduler::new();
        let slow = EntityId::new(1);
        let fast = EntityId::new(2);
        let _ = scheduler.register(
            slow,
            TickPolicy::Throttled(Duration::from_millis(120)),
            Duration::ZERO,
        );
        let _ = scheduler.register(fast, TickPolicy::EveryTick, Duration::ZERO);

        let mut fired = Vec::new();
        for step in 1..=5u64 {
            let mut commands = Vec::new();
            scheduler.tick(Duration::from_millis(step * 50), |_| true, true, &mut commands);
            fired.push(notified(&commands));
        }
        assert_eq!(
            fired,
            vec![
                vec![fast],
                vec![fast],
                vec![slow, fast],
                vec![fast],
                vec![fast],
            ]
        );
    }

    #[test]
    fn paused_scheduler_keeps_registrations() {
        let mut scheduler = TickScheduler::new();
        let entity = EntityId::new(7);
        let _ = scheduler.register(entity, TickPolicy::EveryTick, Duration::ZERO);

        scheduler.pause();
        let mut commands = Vec::new();
        scheduler.tick(Duration::from_millis(50), |_| true, true, &mut commands);
        assert!(commands.is_empty());
        assert!(scheduler.is_registered(entity));

        scheduler.resume();
        scheduler.tick(Duration::from_millis(100), |_| true, false, &mut commands);
        assert_eq!(
            commands,
            vec![Command::Notify {
                entity,
                running: false,
            }]
        );
    }
}

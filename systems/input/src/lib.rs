#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Debounced command queue that turns held inputs into batched game commands.
//!
//! Keyboard and pointer sources converge on the same press and release path.
//! A dispatch pass runs once per debounce period while any command is held and
//! issues every held command to the controlled character.

use std::{collections::BTreeMap, time::Duration};

use blast_arena_core::{
    geometry::pointer_directions, ArenaConfig, Command, Coord, Direction, EntityId, GameCommand,
};
use tracing::trace;

/// Interval between two re-evaluations of pointer-driven steering.
pub const STEERING_INTERVAL: Duration = Duration::from_millis(300);

/// Configuration parameters required to construct the command queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    debounce: Duration,
    turbo_debounce: Duration,
}

impl Config {
    /// Creates a configuration from the regular and turbo debounce windows.
    #[must_use]
    pub const fn new(debounce: Duration, turbo_debounce: Duration) -> Self {
        Self {
            debounce,
            turbo_debounce,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_millis(30), Duration::from_millis(15))
    }
}

impl From<&ArenaConfig> for Config {
    fn from(config: &ArenaConfig) -> Self {
        Self::new(config.command_debounce(), config.turbo_command_debounce())
    }
}

#[derive(Clone, Debug)]
struct Steering {
    pointer: Coord,
    initial: Vec<Direction>,
    pressed: Vec<Direction>,
    next_refresh: Duration,
}

/// Pure system tracking held commands and dispatching them at a fixed cadence.
#[derive(Debug)]
pub struct CommandQueue {
    config: Config,
    turbo: bool,
    held: Vec<GameCommand>,
    last_accepted: BTreeMap<GameCommand, Duration>,
    next_dispatch: Option<Duration>,
    steering: Option<Steering>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl CommandQueue {
    /// Creates an idle queue using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            turbo: false,
            held: Vec::new(),
            last_accepted: BTreeMap::new(),
            next_dispatch: None,
            steering: None,
        }
    }

    /// Current dispatch period and debounce window.
    #[must_use]
    pub const fn period(&self) -> Duration {
        if self.turbo {
            self.config.turbo_debounce
        } else {
            self.config.debounce
        }
    }

    /// Switches between the regular and the turbo debounce window.
    pub fn set_turbo(&mut self, turbo: bool) {
        self.turbo = turbo;
    }

    /// Reports whether turbo mode is active.
    #[must_use]
    pub const fn is_turbo(&self) -> bool {
        self.turbo
    }

    /// Reports whether `command` is currently held.
    #[must_use]
    pub fn is_held(&self, command: GameCommand) -> bool {
        self.held.contains(&command)
    }

    /// Reports whether nothing is held and no pointer steering is active, so
    /// the dispatch task may stop.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.next_dispatch.is_none() && self.steering.is_none()
    }

    /// Reports whether pointer steering is active.
    #[must_use]
    pub const fn is_steering(&self) -> bool {
        self.steering.is_some()
    }

    /// Instant at which the next dispatch pass is due, if any command is held.
    #[must_use]
    pub const fn next_dispatch(&self) -> Option<Duration> {
        self.next_dispatch
    }

    /// Records a key press and interrupts pointer steering.
    ///
    /// Returns `false` when the press falls inside the command's debounce
    /// window and is dropped.
    pub fn press(&mut self, command: GameCommand, now: Duration) -> bool {
        self.stop_steering();
        self.accept(command, now)
    }

    /// Records a key release, stopping dispatch once nothing is held.
    pub fn release(&mut self, command: GameCommand) {
        self.held.retain(|held| *held != command);
        if self.held.is_empty() {
            self.next_dispatch = None;
        }
    }

    /// Starts steering the actor at `actor` toward `pointer`.
    pub fn steer_toward(&mut self, actor: Coord, pointer: Coord, now: Duration) {
        self.stop_steering();
        let initial = pointer_directions(actor, pointer);
        if initial.is_empty() {
            return;
        }
        trace!(?initial, "pointer steering started");
        self.steering = Some(Steering {
            pointer,
            initial,
            pressed: Vec::new(),
            next_refresh: now,
        });
    }

    /// Cancels pointer steering and releases the directions it pressed.
    pub fn stop_steering(&mut self) {
        if let Some(steering) = self.steering.take() {
            for direction in steering.pressed {
                self.release(GameCommand::from_direction(direction));
            }
        }
    }

    /// Advances the queue to `now` and issues held commands to `actor`.
    ///
    /// `actor_position` feeds pointer steering; steering stops once the actor
    /// is gone or no longer shares a direction with the initial heading.
    /// Missed dispatch periods are skipped rather than replayed.
    pub fn handle(
        &mut self,
        now: Duration,
        actor: EntityId,
        actor_position: Option<Coord>,
        out: &mut Vec<Command>,
    ) {
        self.refresh_steering(now, actor_position);

        let Some(due) = self.next_dispatch else {
            return;
        };
        if now < due {
            return;
        }

        for command in &self.held {
            out.push(Command::Issue {
                entity: actor,
                command: *command,
            });
        }
        self.held.retain(|command| *command != GameCommand::Pause);
        if self.held.is_empty() {
            self.next_dispatch = None;
            return;
        }

        let period = self.period();
        let mut next = due.saturating_add(period);
        while next <= now && !period.is_zero() {
            next = next.saturating_add(period);
        }
        self.next_dispatch = Some(next);
    }

    fn accept(&mut self, command: GameCommand, now: Duration) -> bool {
        let period = self.period();
        if let Some(last) = self.last_accepted.get(&command) {
            if now.saturating_sub(*last) < period {
                return false;
            }
        }
        let _ = self.last_accepted.insert(command, now);
        if !self.held.contains(&command) {
            self.held.push(command);
        }
        if self.next_dispatch.is_none() {
            self.next_dispatch = Some(now.saturating_add(period));
        }
        true
    }

    fn refresh_steering(&mut self, now: Duration, actor_position: Option<Coord>) {
        let Some(steering) = self.steering.as_ref() else {
            return;
        };
        if now < steering.next_refresh {
            return;
        }
        let pointer = steering.pointer;
        let stale = steering.pressed.clone();
        let initial = steering.initial.clone();
        let Some(actor) = actor_position else {
            self.stop_steering();
            return;
        };

        for direction in stale {
            self.release(GameCommand::from_direction(direction));
        }

        let latest = pointer_directions(actor, pointer);
        if !latest.iter().any(|direction| initial.contains(direction)) {
            trace!("pointer steering reached its target");
            self.steering = None;
            return;
        }

        for direction in &latest {
            let _ = self.accept(GameCommand::from_direction(*direction), now);
        }
        if let Some(steering) = self.steering.as_mut() {
            steering.pressed = latest;
            steering.next_refresh = now.saturating_add(STEERING_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turbo_shortens_the_period() {
        let mut queue = CommandQueue::default();
        assert_eq!(queue.period(), Duration::from_millis(30));
        queue.set_turbo(true);
        assert_eq!(queue.period(), Duration::from_millis(15));
    }

    #[test]
    fn pause_is_dispatched_once_per_press() {
        let mut queue = CommandQueue::default();
        let actor = EntityId::new(1);
        assert!(queue.press(GameCommand::Pause, Duration::ZERO));

        let mut commands = Vec::new();
        queue.handle(Duration::from_millis(30), actor, None, &mut commands);
        queue.handle(Duration::from_millis(60), actor, None, &mut commands);
        assert_eq!(
            commands,
            vec![Command::Issue {
                entity: actor,
                command: GameCommand::Pause,
            }]
        );
        assert!(queue.is_idle());
    }

    #[test]
    fn missed_periods_are_skipped() {
        let mut queue = CommandQueue::default();
        let actor = EntityId::new(1);
        assert!(queue.press(GameCommand::MoveLeft, Duration::ZERO));

        let mut commands = Vec::new();
        queue.handle(Duration::from_millis(100), actor, None, &mut commands);
        assert_eq!(commands.len(), 1);
        assert_eq!(queue.next_dispatch(), Some(Duration::from_millis(120)));
    }
}

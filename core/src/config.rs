//! Tunable parameters of an arena match.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{DEFAULT_COLUMNS, DEFAULT_ROWS};

/// Upper bound on the explosion reach a character can accumulate.
pub const MAX_REACH: u32 = 5;

/// Match configuration, deserialisable from TOML with per-field defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Number of grid columns on the pitch.
    pub columns: u32,
    /// Number of grid rows on the pitch.
    pub rows: u32,
    /// Period of the simulation clock in milliseconds.
    pub tick_interval_ms: u64,
    /// Base throttle for character notifications, divided by entity speed.
    pub observer_delay_ms: u64,
    /// Window during which repeated interactions between a pair are dropped.
    pub interaction_debounce_ms: u64,
    /// Minimum delay between accepted presses of the same command.
    pub command_debounce_ms: u64,
    /// Command debounce used while turbo mode is enabled.
    pub turbo_command_debounce_ms: u64,
    /// Delay between arming a bomb and its detonation.
    pub bomb_fuse_ms: u64,
    /// Duration of a single explosion animation frame.
    pub explosion_frame_ms: u64,
    /// Delay between a character's elimination and its removal.
    pub death_delay_ms: u64,
    /// Lifetime of timed upgrades such as the hammer.
    pub power_up_duration_ms: u64,
    /// Explosion reach granted to freshly spawned characters.
    pub default_reach: u32,
    /// Number of bombs a character may have armed at once.
    pub bomb_capacity: u32,
    /// Damage dealt by a single attack.
    pub attack_damage: u32,
    /// Starting and maximum health of characters.
    pub character_health: u32,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            tick_interval_ms: 50,
            observer_delay_ms: 30,
            interaction_debounce_ms: 500,
            command_debounce_ms: 30,
            turbo_command_debounce_ms: 15,
            bomb_fuse_ms: 5_000,
            explosion_frame_ms: 100,
            death_delay_ms: 500,
            power_up_duration_ms: 30_000,
            default_reach: 2,
            bomb_capacity: 1,
            attack_damage: 100,
            character_health: 100,
            event_capacity: 1_024,
        }
    }
}

impl ArenaConfig {
    /// Period of the simulation clock.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Base character notification throttle.
    #[must_use]
    pub const fn observer_delay(&self) -> Duration {
        Duration::from_millis(self.observer_delay_ms)
    }

    /// Interaction and damage debounce window.
    #[must_use]
    pub const fn interaction_debounce(&self) -> Duration {
        Duration::from_millis(self.interaction_debounce_ms)
    }

    /// Command press debounce.
    #[must_use]
    pub const fn command_debounce(&self) -> Duration {
        Duration::from_millis(self.command_debounce_ms)
    }

    /// Command press debounce in turbo mode.
    #[must_use]
    pub const fn turbo_command_debounce(&self) -> Duration {
        Duration::from_millis(self.turbo_command_debounce_ms)
    }

    /// Bomb fuse.
    #[must_use]
    pub const fn bomb_fuse(&self) -> Duration {
        Duration::from_millis(self.bomb_fuse_ms)
    }

    /// Explosion animation frame length.
    #[must_use]
    pub const fn explosion_frame(&self) -> Duration {
        Duration::from_millis(self.explosion_frame_ms)
    }

    /// Delay before an eliminated character is removed.
    #[must_use]
    pub const fn death_delay(&self) -> Duration {
        Duration::from_millis(self.death_delay_ms)
    }

    /// Lifetime of timed upgrades.
    #[must_use]
    pub const fn power_up_duration(&self) -> Duration {
        Duration::from_millis(self.power_up_duration_ms)
    }

    /// Checks that the configuration describes a playable match.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyPitch {
                columns: self.columns,
                rows: self.rows,
            });
        }
        let intervals = [
            ("tick_interval_ms", self.tick_interval_ms),
            ("observer_delay_ms", self.observer_delay_ms),
            ("interaction_debounce_ms", self.interaction_debounce_ms),
            ("command_debounce_ms", self.command_debounce_ms),
            ("turbo_command_debounce_ms", self.turbo_command_debounce_ms),
            ("bomb_fuse_ms", self.bomb_fuse_ms),
            ("explosion_frame_ms", self.explosion_frame_ms),
            ("death_delay_ms", self.death_delay_ms),
            ("power_up_duration_ms", self.power_up_duration_ms),
        ];
        if let Some(&(field, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroInterval { field });
        }
        if self.turbo_command_debounce_ms > self.command_debounce_ms {
            return Err(ConfigError::SlowTurbo {
                turbo_ms: self.turbo_command_debounce_ms,
                regular_ms: self.command_debounce_ms,
            });
        }
        let capacities = [
            ("event_capacity", self.event_capacity),
            ("character_health", usize::try_from(self.character_health).unwrap_or(usize::MAX)),
            ("bomb_capacity", usize::try_from(self.bomb_capacity).unwrap_or(usize::MAX)),
        ];
        if let Some(&(field, _)) = capacities.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroCapacity { field });
        }
        if self.default_reach > MAX_REACH {
            return Err(ConfigError::ReachTooLong {
                reach: self.default_reach,
            });
        }
        Ok(())
    }
}

/// Reasons a configuration is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The pitch has no cells along at least one axis.
    #[error("pitch must span at least one cell, got {columns}x{rows}")]
    EmptyPitch {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// A periodic interval was configured as zero.
    #[error("`{field}` must be greater than zero")]
    ZeroInterval {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A capacity or pool was configured as zero.
    #[error("`{field}` must be greater than zero")]
    ZeroCapacity {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Turbo mode would repeat commands more slowly than normal mode.
    #[error("turbo debounce ({turbo_ms} ms) exceeds the regular debounce ({regular_ms} ms)")]
    SlowTurbo {
        /// Configured turbo debounce.
        turbo_ms: u64,
        /// Configured regular debounce.
        regular_ms: u64,
    },
    /// The default reach exceeds [`MAX_REACH`].
    #[error("default reach {reach} exceeds the maximum of {max}", max = MAX_REACH)]
    ReachTooLong {
        /// Configured reach.
        reach: u32,
    },
}

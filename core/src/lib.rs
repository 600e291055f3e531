#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Blast Arena engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and subscribers to react to. Geometry primitives, capability
//! tags and match configuration live in the submodules so every layer agrees
//! on the same constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod capability;
pub mod config;
pub mod geometry;

pub use capability::{BlastProfile, Capabilities, EnemyVariant, EntityKind, KindSet};
pub use config::{ArenaConfig, ConfigError, MAX_REACH};
pub use geometry::{Coord, Direction, Pitch, GRID_SIZE, PIXEL_UNIT, SAMPLE_STEP};

/// Side length of player and enemy footprints.
pub const CHARACTER_SIZE: i32 = SAMPLE_STEP * 2;

/// Side length of power-up footprints.
pub const POWER_UP_SIZE: i32 = SAMPLE_STEP * 2;

/// Stable handle of an entity registered with the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Game-level commands produced by input sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameCommand {
    /// Step towards decreasing `y`.
    MoveUp,
    /// Step towards increasing `x`.
    MoveRight,
    /// Step towards increasing `y`.
    MoveDown,
    /// Step towards decreasing `x`.
    MoveLeft,
    /// Arm a bomb on the cell beneath the actor.
    PlaceBomb,
    /// Toggle whether the match is running.
    Pause,
}

impl GameCommand {
    /// Movement command travelling in `direction`.
    #[must_use]
    pub const fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::MoveUp,
            Direction::Right => Self::MoveRight,
            Direction::Down => Self::MoveDown,
            Direction::Left => Self::MoveLeft,
        }
    }

    /// Direction associated with a movement command.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::MoveUp => Some(Direction::Up),
            Self::MoveRight => Some(Direction::Right),
            Self::MoveDown => Some(Direction::Down),
            Self::MoveLeft => Some(Direction::Left),
            Self::PlaceBomb | Self::Pause => None,
        }
    }
}

/// Upgrades granted by power-up pickups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Extends the collector's explosion reach by one cell.
    Fire,
    /// Lets the collector walk through bombs.
    TransparentBombs,
    /// Lets the collector walk through destroyable blocks.
    TransparentBlocks,
    /// Lets the collector break destroyable blocks by pointing at them.
    Hammer,
}

impl PowerUpKind {
    /// Reports whether the upgrade wears off after the configured power-up
    /// duration.
    #[must_use]
    pub const fn is_timed(self) -> bool {
        matches!(self, Self::TransparentBombs | Self::Hammer)
    }
}

/// Lifecycle state of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterState {
    /// Moving and vulnerable.
    Alive,
    /// Moving but ignoring attacks.
    Immune,
    /// Terminal state reached when health drops to zero.
    Eliminated,
}

/// Declarative description of an entity to construct.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Blueprint {
    /// Character steered by the command queue.
    Player,
    /// Autonomous character.
    Enemy {
        /// Notification rate multiplier; larger values move faster.
        speed: f32,
        /// Initial heading.
        facing: Direction,
        /// Movement profile selecting the obstacle set.
        variant: EnemyVariant,
    },
    /// Indestructible wall block.
    HardBlock,
    /// Block destroyed by a single blast.
    DestroyableBlock,
    /// Explosive armed at spawn time.
    Bomb {
        /// Character credited with the bomb, if any.
        owner: Option<EntityId>,
        /// Number of cells the blast travels in each direction.
        reach: u32,
    },
    /// Pickup granting an upgrade.
    PowerUp {
        /// Upgrade granted on collection.
        kind: PowerUpKind,
    },
}

impl Blueprint {
    /// Kind of entity the blueprint produces.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Player => EntityKind::Player,
            Self::Enemy { .. } => EntityKind::Enemy,
            Self::HardBlock => EntityKind::HardBlock,
            Self::DestroyableBlock => EntityKind::DestroyableBlock,
            Self::Bomb { .. } => EntityKind::Bomb,
            Self::PowerUp { .. } => EntityKind::PowerUp,
        }
    }

    /// Side length of the footprint the blueprint produces.
    #[must_use]
    pub const fn size(&self) -> i32 {
        match self {
            Self::Player | Self::Enemy { .. } => CHARACTER_SIZE,
            Self::PowerUp { .. } => POWER_UP_SIZE,
            Self::HardBlock | Self::DestroyableBlock | Self::Bomb { .. } => GRID_SIZE,
        }
    }
}

/// How the simulation clock should notify an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickPolicy {
    /// The entity has no time-based behaviour.
    Unscheduled,
    /// Notify on every clock tick.
    EveryTick,
    /// Notify only once the interval has elapsed since the last notification.
    Throttled(Duration),
}

/// Read-only description of a live entity for renderers and level tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Handle of the entity.
    pub id: EntityId,
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Upper-left corner of the footprint.
    pub position: Coord,
    /// Side length of the footprint.
    pub size: i32,
    /// Whether the entity should currently be drawn.
    pub visible: bool,
    /// Rendering order hint; lower values are painted first.
    pub draw_priority: u8,
}

/// Reasons an entity could not be placed into the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The footprint extends beyond the pitch.
    #[error("footprint lies outside the pitch")]
    OutOfBounds,
    /// Another entity already claims the cell.
    #[error("cell is already occupied")]
    Occupied,
    /// The owner has no bombs left to arm.
    #[error("bomb capacity reached")]
    CapacityReached,
    /// The acting entity is not registered.
    #[error("acting entity is not spawned")]
    MissingOwner,
    /// The blueprint carries an unusable parameter.
    #[error("blueprint parameters are invalid")]
    InvalidBlueprint,
    /// The world ran out of entity handles.
    #[error("entity identifiers exhausted")]
    IdentifiersExhausted,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a new entity built from the blueprint.
    Spawn {
        /// Description of the entity to construct.
        blueprint: Blueprint,
        /// Upper-left corner of the new footprint.
        position: Coord,
    },
    /// Removes an entity; repeated requests are ignored.
    Despawn {
        /// Entity to remove.
        entity: EntityId,
    },
    /// Moves the world's monotonic clock forward.
    AdvanceClock {
        /// Time elapsed since the match started.
        now: Duration,
    },
    /// Delivers a clock notification to an entity.
    Notify {
        /// Entity being notified.
        entity: EntityId,
        /// Whether the match is running; paused matches skip behaviour.
        running: bool,
    },
    /// Executes a game command on behalf of an entity.
    Issue {
        /// Entity performing the command.
        entity: EntityId,
        /// Command to perform.
        command: GameCommand,
    },
    /// Detonates a bomb immediately.
    Detonate {
        /// Bomb to detonate.
        bomb: EntityId,
    },
    /// Acts on the entity under a pointer on behalf of a character.
    Strike {
        /// Character performing the strike.
        entity: EntityId,
        /// Pointer position in pixels.
        target: Coord,
    },
    /// Toggles immunity of a character.
    SetImmune {
        /// Character to update.
        entity: EntityId,
        /// Whether attacks should be ignored.
        immune: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that an entity joined the world.
    Spawned {
        /// Handle assigned to the entity.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Upper-left corner of its footprint.
        position: Coord,
        /// How the clock should notify the entity.
        schedule: TickPolicy,
    },
    /// Reports that a spawn or bomb placement request was rejected.
    SpawnRejected {
        /// Kind requested.
        kind: EntityKind,
        /// Position requested.
        position: Coord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that an entity left the world.
    Despawned {
        /// Handle of the removed entity.
        entity: EntityId,
        /// Kind of the removed entity.
        kind: EntityKind,
    },
    /// Confirms that an entity changed position.
    Moved {
        /// Entity that moved.
        entity: EntityId,
        /// Position before the move.
        from: Coord,
        /// Position after the move.
        to: Coord,
    },
    /// Reports that a move was refused by an obstacle or the pitch edge.
    MoveRefused {
        /// Entity whose move was refused.
        entity: EntityId,
        /// Direction of the refused move.
        direction: Direction,
    },
    /// Reports that an entity ran into the edge of the pitch.
    BoundaryTouched {
        /// Entity touching the edge.
        entity: EntityId,
    },
    /// Reports that `actor` acted upon `target`.
    Interacted {
        /// Entity whose behaviour ran.
        actor: EntityId,
        /// Entity acted upon.
        target: EntityId,
    },
    /// Reports that a character lost health.
    Damaged {
        /// Character hit.
        entity: EntityId,
        /// Attacker.
        by: EntityId,
        /// Health left after the hit.
        health: u32,
    },
    /// Reports that a character reached zero health.
    Eliminated {
        /// Character eliminated.
        entity: EntityId,
    },
    /// Reports that a breakable object was destroyed.
    Destroyed {
        /// Object destroyed.
        entity: EntityId,
        /// Attacker.
        by: EntityId,
    },
    /// Reports that a bomb detonated.
    Detonated {
        /// Bomb that detonated.
        bomb: EntityId,
        /// Cell the blast originates from.
        position: Coord,
        /// Number of cells the blast may travel.
        reach: u32,
    },
    /// Reports that a blast segment was placed.
    SegmentSpawned {
        /// Handle of the segment.
        segment: EntityId,
        /// Direction the chain travels in.
        direction: Direction,
        /// Hops from the detonation cell.
        distance: u32,
        /// Whether the chain continues past this segment.
        expandable: bool,
        /// Upper-left corner of the segment.
        position: Coord,
    },
    /// Reports that a blast chain stopped because a segment could not be placed.
    PropagationHalted {
        /// Direction of the halted chain.
        direction: Direction,
        /// Distance of the segment that could not be placed.
        distance: u32,
        /// Reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a character collected a power-up.
    PowerUpCollected {
        /// Character collecting the pickup.
        collector: EntityId,
        /// Upgrade granted.
        kind: PowerUpKind,
    },
    /// Reports that a timed upgrade wore off.
    PowerUpExpired {
        /// Character losing the upgrade.
        entity: EntityId,
        /// Upgrade revoked.
        kind: PowerUpKind,
    },
    /// Reports that a character toggled immunity.
    ImmunityChanged {
        /// Character updated.
        entity: EntityId,
        /// Whether attacks are now ignored.
        immune: bool,
    },
    /// Announces that the match was paused or resumed.
    MatchRunningChanged {
        /// Whether the match is running.
        running: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        Blueprint, Direction, EntityKind, GameCommand, PlacementError, PowerUpKind, GRID_SIZE,
    };

    #[test]
    fn movement_commands_round_trip_through_directions() {
        for direction in Direction::ALL {
            assert_eq!(
                GameCommand::from_direction(direction).direction(),
                Some(direction)
            );
        }
        assert_eq!(GameCommand::PlaceBomb.direction(), None);
    }

    #[test]
    fn blueprints_report_kind_and_size() {
        let bomb = Blueprint::Bomb {
            owner: None,
            reach: 2,
        };
        assert_eq!(bomb.kind(), EntityKind::Bomb);
        assert_eq!(bomb.size(), GRID_SIZE);
        assert!(Blueprint::Player.size() < GRID_SIZE);
    }

    #[test]
    fn only_transparency_to_bombs_and_the_hammer_wear_off() {
        assert!(PowerUpKind::TransparentBombs.is_timed());
        assert!(PowerUpKind::Hammer.is_timed());
        assert!(!PowerUpKind::Fire.is_timed());
        assert!(!PowerUpKind::TransparentBlocks.is_timed());
    }

    #[test]
    fn placement_errors_describe_themselves() {
        assert_eq!(
            PlacementError::CapacityReached.to_string(),
            "bomb capacity reached"
        );
    }
}

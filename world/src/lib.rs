#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Blast Arena.
//!
//! The world owns every live entity by stable [`EntityId`] handle. All
//! mutation flows through a `&mut World`, either via [`apply`] or the
//! operation modules ([`movement`], [`interaction`], [`explosion`]), which
//! serialises damage resolution per target without fine-grained locking.
//! Collision scans run against an immutable copy-on-read snapshot of entity
//! bodies that is rebuilt lazily after membership or positions change.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, OnceLock},
    time::Duration,
};

use blast_arena_core::{
    ArenaConfig, BlastProfile, Blueprint, Capabilities, CharacterState, Command, Coord, Direction,
    EntityId, EntityKind, Event, KindSet, PlacementError, Pitch, PowerUpKind, TickPolicy,
    MAX_REACH,
};
use tracing::{debug, trace};

pub mod behavior;
mod collision;
pub mod explosion;
pub mod interaction;
pub mod movement;

use collision::Body;

/// Slowest speed multiplier accepted for autonomous characters.
pub const MIN_SPEED: f32 = 0.1;

/// Fastest speed multiplier accepted for autonomous characters.
pub const MAX_SPEED: f32 = 10.0;

/// Represents the authoritative Blast Arena world state.
#[derive(Debug)]
pub struct World {
    config: ArenaConfig,
    pitch: Pitch,
    now: Duration,
    running: bool,
    next_id: u64,
    entities: BTreeMap<EntityId, Entity>,
    bodies: OnceLock<Arc<[Body]>>,
    pending_detonations: VecDeque<EntityId>,
}

impl World {
    /// Creates an empty world using the provided configuration.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            pitch: Pitch::from_cells(config.columns, config.rows),
            config,
            now: Duration::ZERO,
            running: true,
            next_id: 1,
            entities: BTreeMap::new(),
            bodies: OnceLock::new(),
            pending_detonations: VecDeque::new(),
        }
    }

    /// Registers a new entity built from `blueprint` with its upper-left corner
    /// at `position`.
    ///
    /// Placement is only validated against the pitch bounds; callers that need
    /// an empty cell consult [`query::entities_at`] first.
    pub fn spawn(
        &mut self,
        blueprint: Blueprint,
        position: Coord,
        out_events: &mut Vec<Event>,
    ) -> Result<EntityId, PlacementError> {
        let kind = blueprint.kind();
        let size = blueprint.size();
        let mut capabilities = Capabilities::for_kind(kind);
        let (role, schedule) = match blueprint {
            Blueprint::Player => (
                Role::Character(Character::new(&self.config, Controller::Input, Direction::Down)),
                TickPolicy::Throttled(self.config.observer_delay()),
            ),
            Blueprint::Enemy {
                speed,
                facing,
                variant,
            } => {
                if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
                    return Err(PlacementError::InvalidBlueprint);
                }
                capabilities = Capabilities::for_enemy(variant);
                (
                    Role::Character(Character::new(&self.config, Controller::Wander, facing)),
                    TickPolicy::Throttled(self.config.observer_delay().div_f32(speed)),
                )
            }
            Blueprint::HardBlock => (Role::Block { breakable: false }, TickPolicy::Unscheduled),
            Blueprint::DestroyableBlock => {
                (Role::Block { breakable: true }, TickPolicy::Unscheduled)
            }
            Blueprint::Bomb { owner, reach } => {
                if reach > MAX_REACH {
                    return Err(PlacementError::InvalidBlueprint);
                }
                (
                    Role::Bomb(Bomb {
                        owner,
                        reach,
                        profile: BlastProfile::standard(),
                        armed_at: self.now,
                        detonated: false,
                    }),
                    TickPolicy::EveryTick,
                )
            }
            Blueprint::PowerUp { kind } => (Role::PowerUp(kind), TickPolicy::Unscheduled),
        };

        self.register(
            kind,
            position,
            size,
            capabilities,
            role,
            schedule,
            out_events,
        )
    }

    /// Removes an entity from the world.
    ///
    /// Returns `false` when the entity was already absent, in which case no
    /// event is emitted.
    pub fn despawn(&mut self, entity: EntityId, out_events: &mut Vec<Event>) -> bool {
        let Some(removed) = self.entities.remove(&entity) else {
            return false;
        };
        let counterpart = Counterpart::Entity(entity);
        for other in self.entities.values_mut() {
            let _ = other.last_interactions.remove(&counterpart);
        }
        self.invalidate_bodies();
        trace!(entity = entity.get(), kind = ?removed.kind, "despawned");
        out_events.push(Event::Despawned {
            entity,
            kind: removed.kind,
        });
        true
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn register(
        &mut self,
        kind: EntityKind,
        position: Coord,
        size: i32,
        capabilities: Capabilities,
        role: Role,
        schedule: TickPolicy,
        out_events: &mut Vec<Event>,
    ) -> Result<EntityId, PlacementError> {
        if !self.pitch.validate(position, size) {
            return Err(PlacementError::OutOfBounds);
        }
        let id = EntityId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(PlacementError::IdentifiersExhausted)?;

        let _ = self.entities.insert(
            id,
            Entity {
                id,
                kind,
                position,
                size,
                capabilities,
                attack_damage: self.config.attack_damage,
                last_interactions: HashMap::new(),
                role,
            },
        );
        self.invalidate_bodies();
        trace!(entity = id.get(), ?kind, x = position.x(), y = position.y(), "spawned");
        out_events.push(Event::Spawned {
            entity: id,
            kind,
            position,
            schedule,
        });
        Ok(id)
    }

    pub(crate) fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub(crate) fn set_position(&mut self, id: EntityId, position: Coord) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = position;
            self.invalidate_bodies();
        }
    }

    /// Immutable snapshot of every live body, ordered by identifier.
    pub(crate) fn bodies(&self) -> Arc<[Body]> {
        Arc::clone(self.bodies.get_or_init(|| {
            self.entities
                .values()
                .map(Body::of)
                .collect::<Vec<_>>()
                .into()
        }))
    }

    fn invalidate_bodies(&mut self) {
        let _ = self.bodies.take();
    }

    pub(crate) const fn now(&self) -> Duration {
        self.now
    }

    pub(crate) const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub(crate) fn request_detonation(&mut self, bomb: EntityId) {
        if !self.pending_detonations.contains(&bomb) {
            self.pending_detonations.push_back(bomb);
        }
    }

    pub(crate) fn next_pending_detonation(&mut self) -> Option<EntityId> {
        self.pending_detonations.pop_front()
    }

    pub(crate) fn set_running(&mut self, running: bool, out_events: &mut Vec<Event>) {
        if self.running != running {
            self.running = running;
            debug!(running, "match running state changed");
            out_events.push(Event::MatchRunningChanged { running });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

/// Key under which an entity remembers its most recent interactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Counterpart {
    Void,
    Entity(EntityId),
}

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) position: Coord,
    pub(crate) size: i32,
    pub(crate) capabilities: Capabilities,
    pub(crate) attack_damage: u32,
    pub(crate) last_interactions: HashMap<Counterpart, Duration>,
    pub(crate) role: Role,
}

impl Entity {
    pub(crate) fn character(&self) -> Option<&Character> {
        match &self.role {
            Role::Character(character) => Some(character),
            _ => None,
        }
    }

    pub(crate) fn character_mut(&mut self) -> Option<&mut Character> {
        match &mut self.role {
            Role::Character(character) => Some(character),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Role {
    Character(Character),
    Block { breakable: bool },
    Bomb(Bomb),
    Segment(Segment),
    PowerUp(PowerUpKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Controller {
    Input,
    Wander,
}

#[derive(Clone, Debug)]
pub(crate) struct Character {
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) state: CharacterState,
    pub(crate) facing: Direction,
    pub(crate) reach: u32,
    pub(crate) bomb_capacity: u32,
    pub(crate) controller: Controller,
    pub(crate) strikes: KindSet,
    pub(crate) boosts: Vec<Boost>,
    pub(crate) last_damage: Option<Duration>,
    pub(crate) eliminated_at: Option<Duration>,
}

/// Timed upgrade held by a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Boost {
    pub(crate) kind: PowerUpKind,
    pub(crate) expires_at: Duration,
}

impl Character {
    fn new(config: &ArenaConfig, controller: Controller, facing: Direction) -> Self {
        Self {
            health: config.character_health,
            max_health: config.character_health,
            state: CharacterState::Alive,
            facing,
            reach: config.default_reach,
            bomb_capacity: config.bomb_capacity,
            controller,
            strikes: KindSet::EMPTY,
            boosts: Vec::new(),
            last_damage: None,
            eliminated_at: None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Bomb {
    pub(crate) owner: Option<EntityId>,
    pub(crate) reach: u32,
    pub(crate) profile: BlastProfile,
    pub(crate) armed_at: Duration,
    pub(crate) detonated: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Segment {
    pub(crate) direction: Direction,
    pub(crate) distance: u32,
    pub(crate) max_distance: u32,
    pub(crate) expandable: bool,
    pub(crate) owner: Option<EntityId>,
    pub(crate) frame: u8,
    pub(crate) fading: bool,
    pub(crate) last_frame: Duration,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Spawn {
            blueprint,
            position,
        } => {
            if let Err(reason) = world.spawn(blueprint, position, out_events) {
                debug!(kind = ?blueprint.kind(), %reason, "spawn rejected");
                out_events.push(Event::SpawnRejected {
                    kind: blueprint.kind(),
                    position,
                    reason,
                });
            }
        }
        Command::Despawn { entity } => {
            let _ = world.despawn(entity, out_events);
        }
        Command::AdvanceClock { now } => {
            world.now = world.now.max(now);
        }
        Command::Notify { entity, running } => {
            behavior::notify(world, entity, running, out_events);
        }
        Command::Issue { entity, command } => {
            behavior::issue(world, entity, command, out_events);
        }
        Command::Detonate { bomb } => {
            let _ = explosion::detonate(world, bomb, out_events);
        }
        Command::Strike { entity, target } => {
            let _ = behavior::strike(world, entity, target, out_events);
        }
        Command::SetImmune { entity, immune } => {
            let _ = behavior::set_immune(world, entity, immune, out_events);
        }
    }
    explosion::drain_pending(world, out_events);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use blast_arena_core::{
        ArenaConfig, Capabilities, CharacterState, Coord, Direction, EntityId, EntityKind,
        EntitySnapshot, KindSet, Pitch, PowerUpKind,
    };

    use super::{collision::Body, Role, World};

    /// Captures every live entity ordered by draw priority, then identifier.
    #[must_use]
    pub fn snapshot(world: &World) -> Vec<EntitySnapshot> {
        let mut snapshots: Vec<EntitySnapshot> = world
            .entities
            .values()
            .map(|entity| Body::of(entity).snapshot())
            .collect();
        snapshots.sort_by_key(|snapshot| (snapshot.draw_priority, snapshot.id));
        snapshots
    }

    /// Reports whether the entity is currently registered.
    #[must_use]
    pub fn is_spawned(world: &World, entity: EntityId) -> bool {
        world.entities.contains_key(&entity)
    }

    /// Kind of a live entity.
    #[must_use]
    pub fn kind(world: &World, entity: EntityId) -> Option<EntityKind> {
        world.entity(entity).map(|entity| entity.kind)
    }

    /// Upper-left corner of a live entity's footprint.
    #[must_use]
    pub fn position(world: &World, entity: EntityId) -> Option<Coord> {
        world.entity(entity).map(|entity| entity.position)
    }

    /// Capability record of a live entity.
    #[must_use]
    pub fn capabilities(world: &World, entity: EntityId) -> Option<Capabilities> {
        world.entity(entity).map(|entity| entity.capabilities)
    }

    /// Health and state of a live character.
    #[must_use]
    pub fn character(world: &World, entity: EntityId) -> Option<CharacterView> {
        let character = world.entity(entity)?.character()?;
        Some(CharacterView {
            health: character.health,
            max_health: character.max_health,
            state: character.state,
            facing: character.facing,
            reach: character.reach,
            strikes: character.strikes,
        })
    }

    /// Instant at which a timed upgrade held by `entity` wears off.
    #[must_use]
    pub fn power_up_expiry(
        world: &World,
        entity: EntityId,
        kind: PowerUpKind,
    ) -> Option<Duration> {
        world
            .entity(entity)?
            .character()?
            .boosts
            .iter()
            .find(|boost| boost.kind == kind)
            .map(|boost| boost.expires_at)
    }

    /// Remaining health of a live character.
    #[must_use]
    pub fn health(world: &World, entity: EntityId) -> Option<u32> {
        world
            .entity(entity)?
            .character()
            .map(|character| character.health)
    }

    /// Propagation state of a live explosion segment.
    #[must_use]
    pub fn segment(world: &World, entity: EntityId) -> Option<SegmentView> {
        match &world.entity(entity)?.role {
            Role::Segment(segment) => Some(SegmentView {
                direction: segment.direction,
                distance: segment.distance,
                max_distance: segment.max_distance,
                expandable: segment.expandable,
                owner: segment.owner,
                frame: segment.frame,
            }),
            _ => None,
        }
    }

    /// Entities whose bounding box contains any of `points`, ordered by
    /// identifier.
    #[must_use]
    pub fn entities_at(world: &World, points: &[Coord]) -> Vec<EntitySnapshot> {
        world
            .entities_at(points)
            .into_iter()
            .map(Body::snapshot)
            .collect()
    }

    /// Reports whether a `size`×`size` footprint at `coord` fits the pitch.
    #[must_use]
    pub fn validate(world: &World, coord: Coord, size: i32) -> bool {
        world.pitch.validate(coord, size)
    }

    /// Directions in which the entity could currently take a single step.
    #[must_use]
    pub fn available_directions(world: &World, entity: EntityId) -> Vec<Direction> {
        super::movement::available_directions(world, entity)
    }

    /// Number of live bombs credited to `owner`.
    #[must_use]
    pub fn armed_bombs(world: &World, owner: EntityId) -> usize {
        world.armed_bombs(owner)
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Reports whether the match is running.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.running
    }

    /// Play-field bounds.
    #[must_use]
    pub fn pitch(world: &World) -> Pitch {
        world.pitch
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &ArenaConfig {
        &world.config
    }

    /// Read-only description of a character.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CharacterView {
        /// Remaining health.
        pub health: u32,
        /// Health at spawn time.
        pub max_health: u32,
        /// Lifecycle state.
        pub state: CharacterState,
        /// Current heading.
        pub facing: Direction,
        /// Explosion reach of bombs the character places.
        pub reach: u32,
        /// Kinds the character can break by pointing at them.
        pub strikes: KindSet,
    }

    /// Read-only description of an explosion segment.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SegmentView {
        /// Direction the chain travels in.
        pub direction: Direction,
        /// Hops from the detonation cell.
        pub distance: u32,
        /// Reach copied from the explosive.
        pub max_distance: u32,
        /// Whether the chain continued past this segment.
        pub expandable: bool,
        /// Character credited with the blast.
        pub owner: Option<EntityId>,
        /// Current animation frame; zero once faded.
        pub frame: u8,
    }
}

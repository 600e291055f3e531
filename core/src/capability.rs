//! Capability tags describing how entity kinds obstruct and affect each other.
//!
//! Membership checks are plain bitset lookups: every [`EntityKind`] owns one
//! bit inside a [`KindSet`], and each entity carries a [`Capabilities`] record
//! built from those sets.

use serde::{Deserialize, Serialize};

/// Kinds of entities that can inhabit the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Character steered by the command queue.
    Player,
    /// Autonomous character that wanders the arena.
    Enemy,
    /// Indestructible wall block.
    HardBlock,
    /// Block removed by a single blast.
    DestroyableBlock,
    /// Armed explosive waiting for its fuse.
    Bomb,
    /// One tile of a propagating blast.
    Explosion,
    /// Pickup that upgrades the character collecting it.
    PowerUp,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Player,
        Self::Enemy,
        Self::HardBlock,
        Self::DestroyableBlock,
        Self::Bomb,
        Self::Explosion,
        Self::PowerUp,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Rendering order hint; lower values are painted first.
    #[must_use]
    pub const fn draw_priority(self) -> u8 {
        match self {
            Self::PowerUp => 0,
            Self::HardBlock | Self::DestroyableBlock => 1,
            Self::Bomb => 2,
            Self::Explosion => 3,
            Self::Enemy => 4,
            Self::Player => 5,
        }
    }

    /// Reports whether the kind carries health and a character state machine.
    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(self, Self::Player | Self::Enemy)
    }
}

/// Compact set of entity kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindSet(u16);

impl KindSet {
    /// Set containing no kinds.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from the listed kinds.
    #[must_use]
    pub const fn of(kinds: &[EntityKind]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < kinds.len() {
            bits |= kinds[index].bit();
            index += 1;
        }
        Self(bits)
    }

    /// Reports whether the set includes `kind`.
    #[must_use]
    pub const fn contains(self, kind: EntityKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Set with `kind` added.
    #[must_use]
    pub const fn with(self, kind: EntityKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Set with `kind` removed.
    #[must_use]
    pub const fn without(self, kind: EntityKind) -> Self {
        Self(self.0 & !kind.bit())
    }

    /// Kinds present in `self` but absent from `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Reports whether the set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the kinds contained in the set.
    pub fn iter(self) -> impl Iterator<Item = EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

/// Movement profiles of autonomous characters.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EnemyVariant {
    /// Walks around every block, bomb and character.
    #[default]
    Basic,
    /// Flies over destroyable blocks.
    Flying,
    /// Passes through everything except the characters it hunts.
    Ghost,
}

/// Obstacle and interaction sets carried by an explosive and inherited by
/// every blast segment it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlastProfile {
    /// Kinds that stop the blast from travelling further.
    pub obstacles: KindSet,
    /// Kinds the blast acts upon as it passes.
    pub interactions: KindSet,
}

impl BlastProfile {
    /// Profile of the standard bomb.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            obstacles: KindSet::of(&[EntityKind::HardBlock, EntityKind::DestroyableBlock]),
            interactions: KindSet::of(&[
                EntityKind::DestroyableBlock,
                EntityKind::Enemy,
                EntityKind::Player,
                EntityKind::Bomb,
            ]),
        }
    }
}

impl Default for BlastProfile {
    fn default() -> Self {
        Self::standard()
    }
}

/// Per-entity capability record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    obstacles: KindSet,
    interactions: KindSet,
    accepts: KindSet,
    whitelist: KindSet,
    void_is_obstacle: bool,
}

impl Capabilities {
    /// Default capabilities of an entity kind.
    ///
    /// Explosions receive the standard blast profile; use
    /// [`Capabilities::for_blast`] to inherit a specific explosive's sets.
    #[must_use]
    pub const fn for_kind(kind: EntityKind) -> Self {
        use EntityKind::{Bomb, DestroyableBlock, Enemy, Explosion, HardBlock, Player, PowerUp};

        match kind {
            Player => Self::new(
                KindSet::of(&[HardBlock, DestroyableBlock, Bomb, Enemy]),
                KindSet::of(&[PowerUp]),
                KindSet::of(&[Enemy, Explosion]),
            ),
            Enemy => Self::new(
                KindSet::of(&[HardBlock, DestroyableBlock, Bomb, Enemy, Player]),
                KindSet::of(&[Player]),
                KindSet::of(&[Explosion]),
            ),
            DestroyableBlock | Bomb => {
                Self::new(KindSet::EMPTY, KindSet::EMPTY, KindSet::of(&[Explosion]))
            }
            HardBlock => Self::new(KindSet::EMPTY, KindSet::EMPTY, KindSet::EMPTY),
            PowerUp => Self::new(KindSet::EMPTY, KindSet::EMPTY, KindSet::of(&[Player])),
            Explosion => Self::for_blast(BlastProfile::standard()),
        }
    }

    /// Capabilities of an autonomous character of the given variant.
    #[must_use]
    pub const fn for_enemy(variant: EnemyVariant) -> Self {
        let basic = Self::for_kind(EntityKind::Enemy);
        match variant {
            EnemyVariant::Basic => basic,
            EnemyVariant::Flying => Self {
                obstacles: basic.obstacles.without(EntityKind::DestroyableBlock),
                ..basic
            },
            EnemyVariant::Ghost => Self {
                obstacles: basic.interactions,
                ..basic
            },
        }
    }

    /// Capabilities of a blast segment inheriting the explosive's profile.
    ///
    /// Empty space never obstructs a blast, so the off-pitch sentinel is not
    /// treated as an obstacle here.
    #[must_use]
    pub const fn for_blast(profile: BlastProfile) -> Self {
        Self {
            obstacles: profile.obstacles,
            interactions: profile.interactions,
            accepts: KindSet::EMPTY,
            whitelist: KindSet::EMPTY,
            void_is_obstacle: false,
        }
    }

    const fn new(obstacles: KindSet, interactions: KindSet, accepts: KindSet) -> Self {
        Self {
            obstacles,
            interactions,
            accepts,
            whitelist: KindSet::EMPTY,
            void_is_obstacle: true,
        }
    }

    /// Reports whether `other` blocks movement.
    ///
    /// `None` stands for the absence of an entity, which counts as an obstacle
    /// for everything except blast segments.
    #[must_use]
    pub const fn is_obstacle(&self, other: Option<EntityKind>) -> bool {
        match other {
            None => self.void_is_obstacle,
            Some(kind) => self.obstacles.difference(self.whitelist).contains(kind),
        }
    }

    /// Reports whether this entity may initiate an interaction with `other`.
    #[must_use]
    pub const fn can_interact_with(&self, other: EntityKind) -> bool {
        self.interactions.difference(self.whitelist).contains(other)
    }

    /// Reports whether this entity accepts interactions initiated by `other`.
    #[must_use]
    pub const fn accepts(&self, other: EntityKind) -> bool {
        self.accepts.contains(other)
    }

    /// Reports whether the two sides can interact in either direction.
    #[must_use]
    pub const fn mutually_interactable(
        &self,
        own_kind: EntityKind,
        other: &Self,
        other_kind: EntityKind,
    ) -> bool {
        (self.can_interact_with(other_kind) && other.accepts(own_kind))
            || (other.can_interact_with(own_kind) && self.accepts(other_kind))
    }

    /// Removes `kind` from the effective obstacle and interaction sets.
    pub fn whitelist(&mut self, kind: EntityKind) {
        self.whitelist = self.whitelist.with(kind);
    }

    /// Restores `kind` to the effective obstacle and interaction sets.
    pub fn unwhitelist(&mut self, kind: EntityKind) {
        self.whitelist = self.whitelist.without(kind);
    }

    /// Kinds currently whitelisted.
    #[must_use]
    pub const fn whitelisted(&self) -> KindSet {
        self.whitelist
    }

    /// Effective obstacle set after whitelist subtraction.
    #[must_use]
    pub const fn obstacles(&self) -> KindSet {
        self.obstacles.difference(self.whitelist)
    }

    /// Effective interaction set after whitelist subtraction.
    #[must_use]
    pub const fn interactions(&self) -> KindSet {
        self.interactions.difference(self.whitelist)
    }
}

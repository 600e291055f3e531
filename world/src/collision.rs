//! Snapshot-based collision scans.

use blast_arena_core::{
    geometry::{boxes_overlap, collides_with},
    Capabilities, Coord, EntityId, EntityKind, EntitySnapshot, GRID_SIZE,
};
use rayon::prelude::*;

use crate::{Entity, Role, World};

/// Copy of the collision-relevant state of one entity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) position: Coord,
    pub(crate) size: i32,
    pub(crate) capabilities: Capabilities,
    visible: bool,
}

impl Body {
    pub(crate) fn of(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            position: entity.position,
            size: entity.size,
            capabilities: entity.capabilities,
            visible: match &entity.role {
                Role::Segment(segment) => segment.frame > 0,
                _ => true,
            },
        }
    }

    pub(crate) fn snapshot(self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            size: self.size,
            visible: self.visible,
            draw_priority: self.kind.draw_priority(),
        }
    }

    /// Reports whether `other` would stop or engage this body when met.
    pub(crate) fn reacts_to(&self, other: &Self) -> bool {
        self.capabilities.is_obstacle(Some(other.kind))
            || self
                .capabilities
                .mutually_interactable(self.kind, &other.capabilities, other.kind)
    }
}

impl World {
    /// Bodies whose bounding box contains any of `points`.
    ///
    /// The scan runs in parallel over the current snapshot; results keep the
    /// snapshot's identifier order.
    pub(crate) fn entities_at(&self, points: &[Coord]) -> Vec<Body> {
        if points.is_empty() {
            return Vec::new();
        }
        let bodies = self.bodies();
        bodies
            .par_iter()
            .filter(|body| {
                points
                    .iter()
                    .any(|point| collides_with(*point, body.position, body.size))
            })
            .copied()
            .collect()
    }

    /// Bodies overlapping any of the listed grid cells.
    pub(crate) fn entities_in_cells(&self, cells: &[Coord]) -> Vec<Body> {
        if cells.is_empty() {
            return Vec::new();
        }
        let bodies = self.bodies();
        bodies
            .par_iter()
            .filter(|body| {
                cells
                    .iter()
                    .any(|cell| boxes_overlap(*cell, GRID_SIZE, body.position, body.size))
            })
            .copied()
            .collect()
    }

    /// Bodies sharing at least one pixel with the given footprint.
    pub(crate) fn entities_overlapping(&self, origin: Coord, size: i32) -> Vec<Body> {
        let bodies = self.bodies();
        bodies
            .par_iter()
            .filter(|body| boxes_overlap(origin, size, body.position, body.size))
            .copied()
            .collect()
    }
}

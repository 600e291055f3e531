use std::{collections::BTreeMap, fmt};

use blast_arena_core::Event;

/// Running count of match events grouped by variant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EventTally {
    counts: BTreeMap<&'static str, usize>,
}

impl EventTally {
    /// Counts a single event.
    pub(crate) fn record(&mut self, event: &Event) {
        *self.counts.entry(label(event)).or_default() += 1;
    }

    /// Number of events recorded under `label`.
    #[must_use]
    pub(crate) fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or_default()
    }

    /// Total number of recorded events.
    #[must_use]
    pub(crate) fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for EventTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} events", self.total())?;
        for (label, count) in &self.counts {
            writeln!(f, "  {label:<20} {count:>6}")?;
        }
        Ok(())
    }
}

fn label(event: &Event) -> &'static str {
    match event {
        Event::Spawned { .. } => "spawned",
        Event::SpawnRejected { .. } => "spawn rejected",
        Event::Despawned { .. } => "despawned",
        Event::Moved { .. } => "moved",
        Event::MoveRefused { .. } => "move refused",
        Event::BoundaryTouched { .. } => "boundary touched",
        Event::Interacted { .. } => "interacted",
        Event::Damaged { .. } => "damaged",
        Event::Eliminated { .. } => "eliminated",
        Event::Destroyed { .. } => "destroyed",
        Event::Detonated { .. } => "detonated",
        Event::SegmentSpawned { .. } => "segment spawned",
        Event::PropagationHalted { .. } => "propagation halted",
        Event::PowerUpCollected { .. } => "power-up collected",
        Event::PowerUpExpired { .. } => "power-up expired",
        Event::ImmunityChanged { .. } => "immunity changed",
        Event::MatchRunningChanged { .. } => "running changed",
    }
}

#[cfg(test)]
mod tests {
    use blast_arena_core::{EntityId, EntityKind};

    use super::*;

    #[test]
    fn groups_events_by_variant() {
        let mut tally = EventTally::default();
        let entity = EntityId::new(1);
        tally.record(&Event::Eliminated { entity });
        tally.record(&Event::Eliminated { entity });
        tally.record(&Event::Despawned {
            entity,
            kind: EntityKind::Player,
        });

        assert_eq!(tally.count("eliminated"), 2);
        assert_eq!(tally.count("despawned"), 1);
        assert_eq!(tally.count("moved"), 0);
        assert_eq!(tally.total(), 3);
        assert!(tally.to_string().starts_with("3 events"));
    }
}

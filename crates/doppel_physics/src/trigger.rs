//! # Trigger Listener
//!
//! Turns raw sensor begin/end reports into gameplay trigger events.
//!
//! The listener latches every (plate, remote) pair it has seen enter. A
//! repeated begin report for a latched pair is swallowed, so the goal fires
//! once per contact no matter how long the remote rests on the plate.

use std::collections::HashSet;

use crate::body::{BodyId, BodyTag};

/// Gameplay-level trigger notification produced by a physics step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    /// The remote started touching the pressure plate.
    RemoteOnPlate {
        /// Plate body.
        plate: BodyId,
        /// Remote body.
        remote: BodyId,
    },
    /// The remote stopped touching the pressure plate.
    RemoteLeftPlate {
        /// Plate body.
        plate: BodyId,
        /// Remote body.
        remote: BodyId,
    },
}

/// Edge detector for pressure-plate contacts.
#[derive(Debug, Default)]
pub struct TriggerListener {
    touching: HashSet<(BodyId, BodyId)>,
}

impl TriggerListener {
    /// Creates an empty listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one begin (`started = true`) or end report.
    ///
    /// Returns an event only on a real state change of a plate/remote pair.
    /// Pairs of any other tags are ignored.
    pub fn on_contact(
        &mut self,
        a: (BodyId, BodyTag),
        b: (BodyId, BodyTag),
        started: bool,
    ) -> Option<TriggerEvent> {
        let (plate, remote) = match (a.1, b.1) {
            (BodyTag::PressurePlate, BodyTag::Remote) => (a.0, b.0),
            (BodyTag::Remote, BodyTag::PressurePlate) => (b.0, a.0),
            _ => return None,
        };

        if started {
            self.touching
                .insert((plate, remote))
                .then_some(TriggerEvent::RemoteOnPlate { plate, remote })
        } else {
            self.touching
                .remove(&(plate, remote))
                .then_some(TriggerEvent::RemoteLeftPlate { plate, remote })
        }
    }

    /// Drops every latched pair that involves `body`.
    ///
    /// Called when a body leaves the simulation so a later re-entry counts
    /// as a fresh contact.
    pub fn forget(&mut self, body: BodyId) {
        self.touching
            .retain(|(plate, remote)| *plate != body && *remote != body);
    }

    /// Number of pairs currently in contact.
    #[must_use]
    pub fn active_contacts(&self) -> usize {
        self.touching.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATE: (BodyId, BodyTag) = (BodyId(1), BodyTag::PressurePlate);
    const REMOTE: (BodyId, BodyTag) = (BodyId(2), BodyTag::Remote);

    #[test]
    fn test_enter_fires_once() {
        let mut listener = TriggerListener::new();
        assert!(listener.on_contact(PLATE, REMOTE, true).is_some());
        for _ in 0..100 {
            assert!(listener.on_contact(PLATE, REMOTE, true).is_none());
        }
        assert_eq!(listener.active_contacts(), 1);
    }

    #[test]
    fn test_order_of_pair_does_not_matter() {
        let mut listener = TriggerListener::new();
        let event = listener.on_contact(REMOTE, PLATE, true);
        assert_eq!(
            event,
            Some(TriggerEvent::RemoteOnPlate { plate: BodyId(1), remote: BodyId(2) })
        );
    }

    #[test]
    fn test_leave_then_enter_fires_again() {
        let mut listener = TriggerListener::new();
        listener.on_contact(PLATE, REMOTE, true);
        assert!(matches!(
            listener.on_contact(PLATE, REMOTE, false),
            Some(TriggerEvent::RemoteLeftPlate { .. })
        ));
        assert!(listener.on_contact(PLATE, REMOTE, true).is_some());
    }

    #[test]
    fn test_unrelated_tags_ignored() {
        let mut listener = TriggerListener::new();
        let pickup = (BodyId(3), BodyTag::Pickup);
        assert!(listener.on_contact(PLATE, pickup, true).is_none());
        assert!(listener.on_contact(REMOTE, pickup, true).is_none());
        assert_eq!(listener.active_contacts(), 0);
    }

    #[test]
    fn test_forget_resets_latch() {
        let mut listener = TriggerListener::new();
        listener.on_contact(PLATE, REMOTE, true);
        listener.forget(BodyId(2));
        assert_eq!(listener.active_contacts(), 0);
        assert!(listener.on_contact(PLATE, REMOTE, true).is_some());
    }

    #[test]
    fn test_stray_end_report_ignored() {
        let mut listener = TriggerListener::new();
        assert!(listener.on_contact(PLATE, REMOTE, false).is_none());
    }
}

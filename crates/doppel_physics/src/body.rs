//! # Physics Bodies
//!
//! Bodies are addressed by [`BodyId`], an index into the scene's body arena.
//! Every collider stores that index in its user data, so contact and query
//! results resolve to a typed [`BodyTag`] without any string comparison.

use doppel_shared::CollisionFilter;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

/// Opaque handle to a body owned by a [`crate::PhysicsScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    /// Raw arena index (for logs).
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn from_user_data(data: u128) -> Option<Self> {
        u32::try_from(data).ok().map(Self)
    }

    #[inline]
    pub(crate) const fn user_data(self) -> u128 {
        self.0 as u128
    }
}

/// How a body participates in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Never moves; exact triangle-mesh collision.
    Static,
    /// Simulated; convex-hull collision proxy.
    Dynamic,
    /// Moved explicitly by sweeps (the player capsule).
    Kinematic,
    /// Sensor volume that reports overlaps only.
    Trigger,
}

/// Gameplay role of a body, set once at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyTag {
    /// Floors, walls and other scenery.
    Level,
    /// Invisible bounding wall.
    Wall,
    /// Something the player can pick up.
    Pickup,
    /// The throwable remote.
    Remote,
    /// The goal trigger.
    PressurePlate,
    /// The player capsule.
    Character,
}

/// Arena entry for one body.
#[derive(Clone, Debug)]
pub(crate) struct BodyRecord {
    pub(crate) rigid_body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) kind: BodyKind,
    pub(crate) tag: BodyTag,
    pub(crate) filter: CollisionFilter,
    pub(crate) in_scene: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_data_round_trip() {
        let id = BodyId(42);
        assert_eq!(BodyId::from_user_data(id.user_data()), Some(id));
    }

    #[test]
    fn test_foreign_user_data_rejected() {
        assert_eq!(BodyId::from_user_data(u128::MAX), None);
    }
}

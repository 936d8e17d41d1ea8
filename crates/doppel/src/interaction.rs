//! # Pickup and Throw
//!
//! An item is either in the inventory (hidden, out of the simulation) or
//! in the world (drawn, and simulated if it has a body). Every operation
//! here moves an item across that line in both places at once.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use doppel_physics::PhysicsScene;
use doppel_shared::constants::{HAND_OFFSET, PICKUP_RADIUS, PICK_RAY_LENGTH, THROW_LIFT, THROW_SPEED};
use doppel_shared::{ActiveWorld, CollisionFilter};

use crate::collaborators::{AudioSink, SoundCue};
use crate::entity::{EntityId, EntityKind, EntityStore, RenderObject};
use crate::player_state::PlayerState;

/// Reach and throw tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Proximity pickup distance.
    pub pickup_radius: f32,
    /// Length of the pick ray.
    pub pick_ray_length: f32,
    /// Release point ahead of the camera.
    pub hand_offset: f32,
    /// Throw speed along the view direction.
    pub throw_speed: f32,
    /// Extra upward speed on release.
    pub throw_lift: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pickup_radius: PICKUP_RADIUS,
            pick_ray_length: PICK_RAY_LENGTH,
            hand_offset: HAND_OFFSET,
            throw_speed: THROW_SPEED,
            throw_lift: THROW_LIFT,
        }
    }
}

/// Held items. Each entity appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<EntityId>,
}

impl Inventory {
    /// Empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item. Returns false if it was already held.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Removes an item. Returns false if it was not held.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.items.len();
        self.items.retain(|&item| item != id);
        self.items.len() != before
    }

    /// True if `id` is held.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.items.contains(&id)
    }

    /// Number of held items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Held items in pickup order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.items.iter().copied()
    }

    /// Drops everything (level restart).
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Result of a pickup attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupOutcome {
    /// The item is now held.
    Acquired(EntityKind),
    /// No such entity.
    Missing,
    /// The entity cannot be picked up.
    NotPickable,
    /// The entity is not drawn.
    Hidden,
    /// The entity is already held.
    AlreadyHeld,
    /// Too far away.
    OutOfRange,
    /// The pick ray hit nothing that belongs to an entity.
    NothingHit,
}

impl PickupOutcome {
    /// True for [`PickupOutcome::Acquired`].
    #[must_use]
    pub const fn is_acquired(self) -> bool {
        matches!(self, Self::Acquired(_))
    }
}

/// Result of a throw attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThrowOutcome {
    /// The item left the hand at `position`.
    Thrown {
        /// Release point.
        position: Vec3,
    },
    /// The item is not in the inventory.
    NotHeld,
    /// No such entity.
    Missing,
    /// The item has no physics body to simulate.
    NoBody,
}

/// Mutable game parts an interaction touches.
pub struct InteractionContext<'a> {
    /// Entity arena.
    pub entities: &'a mut EntityStore,
    /// Physics scene.
    pub scene: &'a mut PhysicsScene,
    /// Inventory flags live here.
    pub state: &'a mut PlayerState,
    /// Pickup sound.
    pub audio: &'a mut dyn AudioSink,
}

/// Pickup, ray-pick and throw.
#[derive(Clone, Debug, Default)]
pub struct InteractionSystem {
    config: InteractionConfig,
    inventory: Inventory,
}

impl InteractionSystem {
    /// Creates the system with an empty inventory.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            inventory: Inventory::new(),
        }
    }

    /// Held items.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Empties the inventory (level restart).
    pub fn reset(&mut self) {
        self.inventory.clear();
    }

    fn eligible<'s>(&self, id: EntityId, entities: &'s EntityStore) -> Result<&'s RenderObject, PickupOutcome> {
        let object = entities.get(id).ok_or(PickupOutcome::Missing)?;
        if !object.is_pickable {
            return Err(PickupOutcome::NotPickable);
        }
        if !object.is_rendered {
            return Err(PickupOutcome::Hidden);
        }
        if self.inventory.contains(id) {
            return Err(PickupOutcome::AlreadyHeld);
        }
        Ok(object)
    }

    /// True if a proximity pickup of `id` would succeed.
    #[must_use]
    pub fn can_pickup_nearby(&self, id: EntityId, player: Vec3, entities: &EntityStore) -> bool {
        self.eligible(id, entities)
            .is_ok_and(|object| object.position().distance(player) <= self.config.pickup_radius)
    }

    /// Picks up `id` if the player stands close enough.
    pub fn try_pickup_nearby(&mut self, id: EntityId, player: Vec3, ctx: &mut InteractionContext<'_>) -> PickupOutcome {
        let distance = match self.eligible(id, ctx.entities) {
            Ok(object) => object.position().distance(player),
            Err(outcome) => return outcome,
        };
        if distance > self.config.pickup_radius {
            return PickupOutcome::OutOfRange;
        }
        self.acquire(id, ctx, true)
    }

    /// Picks up whatever pickable entity the view ray hits first.
    ///
    /// Ray pickups are silent; only proximity pickups play the cue.
    pub fn pick_by_raycast(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        world: ActiveWorld,
        ctx: &mut InteractionContext<'_>,
    ) -> PickupOutcome {
        let filter = CollisionFilter::pick_ray(world);
        let Some(hit) = ctx
            .scene
            .raycast(origin, direction, self.config.pick_ray_length, Some(filter))
        else {
            return PickupOutcome::NothingHit;
        };
        let Some(id) = ctx.entities.entity_for_body(hit.body) else {
            debug!(body = hit.body.raw(), "pick ray hit a body without an entity");
            return PickupOutcome::NothingHit;
        };
        if let Err(outcome) = self.eligible(id, ctx.entities) {
            return outcome;
        }
        self.acquire(id, ctx, false)
    }

    fn acquire(&mut self, id: EntityId, ctx: &mut InteractionContext<'_>, play_cue: bool) -> PickupOutcome {
        let Some(object) = ctx.entities.get_mut(id) else {
            return PickupOutcome::Missing;
        };
        object.is_rendered = false;
        let kind = object.kind();
        if let Some(body) = object.body() {
            if let Err(e) = ctx.scene.remove_actor(body) {
                warn!(entity = object.label(), error = %e, "picked-up item had a foreign body");
            }
        }

        match kind {
            EntityKind::Remote => ctx.state.set_remote_in_inventory(true),
            EntityKind::Note => ctx.state.set_note_in_inventory(true),
            _ => {}
        }
        self.inventory.insert(id);
        if play_cue {
            ctx.audio.play(SoundCue::Pickup, SoundCue::Pickup.default_volume());
        }
        info!(entity = object.label(), ?kind, "item picked up");
        PickupOutcome::Acquired(kind)
    }

    /// Throws a held item from just ahead of the camera.
    ///
    /// The item becomes visible, rejoins the simulation with a collision
    /// filter for `world`, and leaves the inventory.
    pub fn throw(
        &mut self,
        id: EntityId,
        origin: Vec3,
        forward: Vec3,
        world: ActiveWorld,
        ctx: &mut InteractionContext<'_>,
    ) -> ThrowOutcome {
        if !self.inventory.contains(id) {
            return ThrowOutcome::NotHeld;
        }
        let Some(object) = ctx.entities.get_mut(id) else {
            return ThrowOutcome::Missing;
        };
        let Some(body) = object.body() else {
            return ThrowOutcome::NoBody;
        };

        let forward = forward.normalize_or_zero();
        let release = origin + forward * self.config.hand_offset;
        let velocity = forward * self.config.throw_speed + Vec3::Y * self.config.throw_lift;
        let kind = object.kind();
        let filter = match kind {
            EntityKind::Remote => CollisionFilter::remote_thrown(world),
            _ => CollisionFilter::world_geometry(world.mask()),
        };

        object.is_rendered = true;
        object.set_position(release, ctx.scene);
        let placed = ctx
            .scene
            .set_collision_filter(body, filter)
            .and_then(|()| ctx.scene.add_actor(body))
            .and_then(|_| ctx.scene.set_linear_velocity(body, velocity));
        if let Err(e) = placed {
            warn!(entity = object.label(), error = %e, "thrown item could not rejoin the scene");
        }

        self.inventory.remove(id);
        match kind {
            EntityKind::Remote => ctx.state.set_remote_in_inventory(false),
            EntityKind::Note => ctx.state.set_note_in_inventory(false),
            _ => {}
        }
        info!(entity = object.label(), x = release.x, y = release.y, z = release.z, "item thrown");
        ThrowOutcome::Thrown { position: release }
    }
}

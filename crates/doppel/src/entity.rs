//! # Entity Management
//!
//! Every visible object in the level is a [`RenderObject`] stored in an
//! [`EntityStore`]. Entities are addressed by a generational [`EntityId`]:
//! - Lower 32 bits: slot index
//! - Upper 32 bits: generation, bumped when the slot is reused
//!
//! A render object optionally owns one physics body. The store keeps a
//! reverse map so raycast hits resolve back to the entity they belong to.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use doppel_physics::{BodyId, BodyKind, BodyTag, PhysicsScene};
use doppel_shared::{ActiveWorld, CollisionFilter, MeshData, MeshId, WorldMask};

use crate::collaborators::InstanceData;

/// Unique identifier for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates an ID from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation of the slot when this ID was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

/// What an entity is, for gameplay decisions that must not depend on labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Static decoration and architecture.
    Scenery,
    /// Walkable ground of one world.
    Floor,
    /// Water plane (visual; hazard heights are read from it).
    Water,
    /// The collectible note.
    Note,
    /// The world-switching remote.
    Remote,
    /// Held-item preview drawn in front of the camera.
    CloseUp,
}

/// Physics participation requested for an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    /// Triangle-mesh collider that never moves.
    Static,
    /// Simulated convex hull.
    Dynamic,
    /// Render only.
    #[default]
    None,
}

/// Everything needed to spawn one entity.
#[derive(Clone, Debug)]
pub struct EntityDesc<'a> {
    /// Human-readable name for logs.
    pub label: &'a str,
    /// Gameplay kind.
    pub kind: EntityKind,
    /// GPU mesh handle.
    pub mesh_id: MeshId,
    /// Geometry, used for the collider.
    pub mesh: &'a MeshData,
    /// Initial model matrix.
    pub transform: Mat4,
    /// Worlds the entity belongs to.
    pub world_mask: WorldMask,
    /// Physics participation.
    pub body_type: BodyType,
    /// Whether the player may pick it up.
    pub pickable: bool,
    /// Initial visibility.
    pub rendered: bool,
}

impl EntityDesc<'_> {
    fn body_tag(&self) -> BodyTag {
        match self.kind {
            EntityKind::Remote => BodyTag::Remote,
            _ if self.pickable => BodyTag::Pickup,
            _ => BodyTag::Level,
        }
    }

    fn body_filter(&self) -> CollisionFilter {
        match self.kind {
            EntityKind::Remote => CollisionFilter::remote_at_rest(),
            _ => CollisionFilter::world_geometry(self.world_mask),
        }
    }
}

/// A drawable object with optional physics.
#[derive(Clone, Debug)]
pub struct RenderObject {
    label: String,
    kind: EntityKind,
    mesh: MeshId,
    body: Option<BodyId>,
    body_type: BodyType,
    world_mask: WorldMask,
    /// Whether the player may pick it up.
    pub is_pickable: bool,
    /// Whether the object is drawn at all.
    pub is_rendered: bool,
    /// Whether the object hovers in place while untouched.
    pub idle_bob: bool,
    model: Mat4,
    scale: Vec3,
    anchor: Vec3,
}

impl RenderObject {
    /// Creates a render-only object.
    #[must_use]
    pub fn new(label: impl Into<String>, kind: EntityKind, mesh: MeshId, transform: Mat4, world_mask: WorldMask) -> Self {
        let (scale, _, translation) = transform.to_scale_rotation_translation();
        Self {
            label: label.into(),
            kind,
            mesh,
            body: None,
            body_type: BodyType::None,
            world_mask,
            is_pickable: false,
            is_rendered: true,
            idle_bob: false,
            model: transform,
            scale,
            anchor: translation,
        }
    }

    /// Debug name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gameplay kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// GPU mesh handle.
    #[must_use]
    pub const fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// Physics body, if the collider was created.
    #[must_use]
    pub const fn body(&self) -> Option<BodyId> {
        self.body
    }

    /// Requested physics participation.
    #[must_use]
    pub const fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Worlds the entity belongs to.
    #[must_use]
    pub const fn world_mask(&self) -> WorldMask {
        self.world_mask
    }

    /// Current model matrix.
    #[must_use]
    pub const fn model(&self) -> Mat4 {
        self.model
    }

    /// World-space position (model translation).
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }

    /// Resting position used for idle hovering.
    #[must_use]
    pub const fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Moves the hover anchor (level setup).
    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    /// True if drawn while `world` is active.
    #[must_use]
    pub fn visible_in(&self, world: ActiveWorld) -> bool {
        self.is_rendered && self.world_mask.intersects(world.mask())
    }

    /// Copies the simulated pose into the model matrix.
    ///
    /// Only dynamic bodies that are part of the simulation move on their
    /// own; everything else keeps its explicit transform.
    pub fn update_transform(&mut self, scene: &PhysicsScene) -> bool {
        let Some(body) = self.body else { return false };
        if self.body_type != BodyType::Dynamic || !scene.is_in_scene(body) {
            return false;
        }
        let Some((translation, rotation)) = scene.pose(body) else { return false };
        self.model = Mat4::from_scale_rotation_translation(self.scale, rotation, translation);
        true
    }

    /// Places the object, keeping rotation and scale. The body follows.
    pub fn set_position(&mut self, position: Vec3, scene: &mut PhysicsScene) {
        let (_, rotation, _) = self.model.to_scale_rotation_translation();
        self.set_transform(position, rotation, scene);
    }

    /// Places and orients the object. The body follows.
    pub fn set_transform(&mut self, position: Vec3, rotation: Quat, scene: &mut PhysicsScene) {
        self.model = Mat4::from_scale_rotation_translation(self.scale, rotation, position);
        if let Some(body) = self.body {
            if let Err(e) = scene.set_pose(body, position, rotation) {
                warn!(entity = %self.label, error = %e, "failed to move body");
            }
        }
    }

    fn instance(&self) -> InstanceData {
        InstanceData {
            model: self.model.to_cols_array_2d(),
            mesh: self.mesh.0,
            world_mask: self.world_mask.raw(),
            kind: self.kind as u32,
            _pad: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<RenderObject>,
}

/// Generational arena of render objects.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_body: HashMap<BodyId, EntityId>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True if no entity is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts an object and returns its ID.
    pub fn insert(&mut self, object: RenderObject) -> EntityId {
        let body = object.body;
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            EntityId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                object: Some(object),
            });
            EntityId::new(index, 0)
        };
        if let Some(body) = body {
            self.by_body.insert(body, id);
        }
        id
    }

    /// Spawns an entity and its collider.
    ///
    /// A mesh the physics backend rejects leaves the entity without a body
    /// instead of failing the level.
    pub fn spawn(&mut self, desc: &EntityDesc<'_>, scene: &mut PhysicsScene) -> EntityId {
        let mut object = RenderObject::new(desc.label, desc.kind, desc.mesh_id, desc.transform, desc.world_mask);
        object.is_pickable = desc.pickable;
        object.is_rendered = desc.rendered;
        object.body_type = desc.body_type;

        let created = match desc.body_type {
            BodyType::Static => Some(scene.create_static_body(desc.mesh, &desc.transform, desc.body_filter(), desc.body_tag())),
            BodyType::Dynamic => Some(scene.create_dynamic_body(desc.mesh, &desc.transform, desc.body_filter(), desc.body_tag())),
            BodyType::None => None,
        };
        match created {
            Some(Ok(body)) => object.body = Some(body),
            Some(Err(e)) => warn!(entity = desc.label, error = %e, "collider creation failed; entity has no body"),
            None => {}
        }

        let id = self.insert(object);
        debug!(entity = desc.label, index = id.index(), kind = ?desc.kind, "entity spawned");
        id
    }

    /// Removes an entity. Its body, if any, stays owned by the scene.
    pub fn despawn(&mut self, id: EntityId) -> Option<RenderObject> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        if let Some(body) = object.body {
            self.by_body.remove(&body);
        }
        Some(object)
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&RenderObject> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation == id.generation() {
            slot.object.as_ref()
        } else {
            None
        }
    }

    /// Looks up a live entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut RenderObject> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation == id.generation() {
            slot.object.as_mut()
        } else {
            None
        }
    }

    /// Entity owning `body`.
    #[must_use]
    pub fn entity_for_body(&self, body: BodyId) -> Option<EntityId> {
        self.by_body.get(&body).copied()
    }

    /// Iterates live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &RenderObject)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object
                .as_ref()
                .map(|object| (EntityId::new(index as u32, slot.generation), object))
        })
    }

    /// First entity of `kind`.
    #[must_use]
    pub fn find_kind(&self, kind: EntityKind) -> Option<EntityId> {
        self.iter().find(|(_, o)| o.kind == kind).map(|(id, _)| id)
    }

    /// Copies simulated poses into model matrices. Returns how many moved.
    pub fn sync_transforms(&mut self, scene: &PhysicsScene) -> usize {
        let mut moved = 0;
        for object in self.slots.iter_mut().filter_map(|slot| slot.object.as_mut()) {
            if object.update_transform(scene) {
                moved += 1;
            }
        }
        moved
    }

    /// Instances visible in `world`.
    #[must_use]
    pub fn render_instances(&self, world: ActiveWorld) -> Vec<InstanceData> {
        self.iter()
            .filter(|(_, o)| o.visible_in(world))
            .map(|(_, o)| o.instance())
            .collect()
    }

    /// Instances that cast shadows in `world` (everything visible except
    /// floors).
    #[must_use]
    pub fn shadow_casters(&self, world: ActiveWorld) -> Vec<InstanceData> {
        self.iter()
            .filter(|(_, o)| o.visible_in(world))
            .filter(|(_, o)| o.kind != EntityKind::Floor)
            .map(|(_, o)| o.instance())
            .collect()
    }
}

/// True if the body is a simulated dynamic body currently in the scene.
#[must_use]
pub fn is_simulated(scene: &PhysicsScene, body: BodyId) -> bool {
    scene.kind(body) == Some(BodyKind::Dynamic) && scene.is_in_scene(body)
}

//! # Physics Scene
//!
//! One rapier world shared by both game worlds.
//!
//! ```text
//!   create_*_body ──► arena (BodyId) ──► collider.user_data
//!                        │
//!   add/remove_actor ────┘  (enabled flag, idempotent)
//!
//!   step(dt) ──► rapier pipeline ──► collision channel ──► TriggerListener
//! ```
//!
//! Bodies are never deleted while the level is alive. Picking an object up
//! disables its body; throwing re-enables it. The `in_scene` flag on each
//! arena record is the single authority for that state.

use crossbeam_channel::{unbounded, Receiver};
use glam::{Mat4, Quat, Vec3};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Shape;
use rapier3d::parry::transformation::try_convex_hull;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use doppel_shared::constants::GRAVITY;
use doppel_shared::{CollisionFilter, MeshData};

use crate::body::{BodyId, BodyKind, BodyRecord, BodyTag};
use crate::character::{CharacterBody, CharacterConfig, CharacterId, CollisionFlags};
use crate::convert::{from_point, from_rotation, from_vector, to_isometry, to_point, to_rotation, to_vector};
use crate::error::{PhysicsError, PhysicsResult};
use crate::trigger::{TriggerEvent, TriggerListener};

// =============================================================================
// CONFIG
// =============================================================================

/// Physics section of the game config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity along Y.
    pub gravity: f32,
    /// Player capsule tuning.
    pub character: CharacterConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            character: CharacterConfig::default(),
        }
    }
}

/// Extent of the invisible walls around the playable area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBounds {
    /// Western edge.
    pub min_x: f32,
    /// Eastern edge.
    pub max_x: f32,
    /// Southern edge.
    pub min_z: f32,
    /// Northern edge.
    pub max_z: f32,
    /// Bottom of the walls.
    pub base_y: f32,
    /// Wall height.
    pub height: f32,
    /// Wall thickness.
    pub thickness: f32,
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self {
            min_x: -8.0,
            max_x: 35.0,
            min_z: -15.0,
            max_z: 35.0,
            base_y: -10.0,
            height: 20.0,
            thickness: 0.1,
        }
    }
}

/// Result of a successful raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// Body that was hit.
    pub body: BodyId,
    /// Distance along the ray.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

#[inline]
fn interaction_groups(filter: CollisionFilter) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(filter.group.raw()),
        Group::from_bits_truncate(filter.mask.raw()),
    )
}

fn validate_mesh(mesh: &MeshData) -> PhysicsResult<()> {
    if mesh.is_empty() {
        return Err(PhysicsError::EmptyMesh);
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(PhysicsError::MalformedIndices(mesh.indices.len()));
    }
    let vertex_count = mesh.vertex_count();
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(PhysicsError::IndexOutOfRange { index, vertex_count });
    }
    Ok(())
}

/// Ground check reach as a multiple of the capsule's contact offset.
const GROUND_REACH_FACTOR: f32 = 1.5;

/// Shortest distance that still counts as extent when checking point sets.
const DEGENERATE_DISTANCE: f32 = 1.0e-5;

/// True if some four of `points` form a tetrahedron with real volume.
///
/// The hull builder panics on coincident, collinear and coplanar sets, so
/// they are caught here.
fn spans_volume(points: &[Vec3]) -> bool {
    let Some(&origin) = points.first() else {
        return false;
    };
    let farthest = points
        .iter()
        .map(|p| *p - origin)
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .unwrap_or(Vec3::ZERO);
    if farthest.length() <= DEGENERATE_DISTANCE {
        return false;
    }
    let axis = farthest.normalize();
    let normal = points
        .iter()
        .map(|p| axis.cross(*p - origin))
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .unwrap_or(Vec3::ZERO);
    if normal.length() <= DEGENERATE_DISTANCE {
        return false;
    }
    let normal = normal.normalize();
    points
        .iter()
        .any(|p| normal.dot(*p - origin).abs() > DEGENERATE_DISTANCE)
}

/// True if at least one triangle has area.
fn has_solid_triangle(vertices: &[Vec3], triangles: &[[u32; 3]]) -> bool {
    triangles.iter().any(|&[a, b, c]| {
        let (a, b, c) = (vertices[a as usize], vertices[b as usize], vertices[c as usize]);
        (b - a).cross(c - a).length() > DEGENERATE_DISTANCE * DEGENERATE_DISTANCE
    })
}

// =============================================================================
// SCENE
// =============================================================================

/// The simulation world plus the bookkeeping the gameplay layer needs.
pub struct PhysicsScene {
    config: PhysicsConfig,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    queries_dirty: bool,
    event_collector: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    contact_force_events: Receiver<ContactForceEvent>,
    records: Vec<BodyRecord>,
    characters: Vec<CharacterBody>,
    triggers: TriggerListener,
    steps: u64,
}

impl PhysicsScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        let (collision_send, collision_events) = unbounded();
        let (force_send, contact_force_events) = unbounded();

        Self {
            gravity: vector![0.0, config.gravity, 0.0],
            config,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            queries_dirty: true,
            event_collector: ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            contact_force_events,
            records: Vec::with_capacity(64),
            characters: Vec::with_capacity(1),
            triggers: TriggerListener::new(),
            steps: 0,
        }
    }

    /// Scene configuration.
    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of bodies ever created (active or not).
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.records.len()
    }

    /// Number of bodies currently registered with the simulation.
    #[must_use]
    pub fn active_body_count(&self) -> usize {
        self.records.iter().filter(|r| r.in_scene).count()
    }

    /// Completed simulation steps.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    // -------------------------------------------------------------------------
    // Body creation
    // -------------------------------------------------------------------------

    fn register(
        &mut self,
        rigid_body: RigidBodyBuilder,
        collider: ColliderBuilder,
        kind: BodyKind,
        tag: BodyTag,
        filter: CollisionFilter,
    ) -> BodyId {
        let id = BodyId(self.records.len() as u32);
        let rigid_body = self.bodies.insert(rigid_body.build());
        let collider = collider
            .collision_groups(interaction_groups(filter))
            .user_data(id.user_data())
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, rigid_body, &mut self.bodies);

        self.records.push(BodyRecord {
            rigid_body,
            collider,
            kind,
            tag,
            filter,
            in_scene: true,
        });
        self.queries_dirty = true;
        debug!(body = id.raw(), ?kind, ?tag, "registered body");
        id
    }

    /// Creates a fixed body with exact triangle-mesh collision.
    ///
    /// Scale in `transform` is baked into the vertices; rotation and
    /// translation become the body pose.
    ///
    /// # Errors
    ///
    /// Fails on empty or malformed meshes and when the backend rejects the
    /// triangle soup. Nothing is registered on failure.
    pub fn create_static_body(
        &mut self,
        mesh: &MeshData,
        transform: &Mat4,
        filter: CollisionFilter,
        tag: BodyTag,
    ) -> PhysicsResult<BodyId> {
        validate_mesh(mesh)?;
        if mesh.triangle_count() == 0 {
            return Err(PhysicsError::TriangleMeshCooking("mesh has no triangles".into()));
        }

        let (scale, rotation, translation) = transform.to_scale_rotation_translation();
        let scaled: Vec<Vec3> = mesh.positions.iter().map(|p| Vec3::from_array(*p) * scale).collect();
        let indices: Vec<[u32; 3]> = mesh.triangles().collect();
        if !scaled.iter().all(|p| p.is_finite()) {
            return Err(PhysicsError::TriangleMeshCooking("non-finite vertex".into()));
        }
        if !has_solid_triangle(&scaled, &indices) {
            return Err(PhysicsError::TriangleMeshCooking("every triangle is degenerate".into()));
        }

        let vertices: Vec<Point<Real>> = scaled.into_iter().map(to_point).collect();
        let collider = ColliderBuilder::trimesh(vertices, indices);
        let rigid_body = RigidBodyBuilder::fixed().position(to_isometry(translation, rotation));

        Ok(self.register(rigid_body, collider, BodyKind::Static, tag, filter))
    }

    /// Creates a simulated body whose collider is the convex hull of `mesh`.
    ///
    /// # Errors
    ///
    /// Fails on empty meshes and degenerate point sets.
    pub fn create_dynamic_body(
        &mut self,
        mesh: &MeshData,
        transform: &Mat4,
        filter: CollisionFilter,
        tag: BodyTag,
    ) -> PhysicsResult<BodyId> {
        validate_mesh(mesh)?;

        let (scale, rotation, translation) = transform.to_scale_rotation_translation();
        let scaled: Vec<Vec3> = mesh.positions.iter().map(|p| Vec3::from_array(*p) * scale).collect();
        let failed = PhysicsError::ConvexHullFailed(scaled.len());
        if scaled.len() < 4 || !scaled.iter().all(|p| p.is_finite()) || !spans_volume(&scaled) {
            return Err(failed);
        }

        let points: Vec<Point<Real>> = scaled.into_iter().map(to_point).collect();
        let (hull_points, hull_indices) = try_convex_hull(&points).map_err(|e| {
            warn!(error = ?e, "convex hull rejected");
            failed.clone()
        })?;
        let shape = SharedShape::convex_mesh(hull_points, &hull_indices).ok_or(failed)?;
        let collider = ColliderBuilder::new(shape);
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(to_isometry(translation, rotation))
            .ccd_enabled(true);

        Ok(self.register(rigid_body, collider, BodyKind::Dynamic, tag, filter))
    }

    /// Creates a box-shaped sensor that reports overlaps.
    pub fn create_trigger_box(
        &mut self,
        centre: Vec3,
        half_extents: Vec3,
        filter: CollisionFilter,
        tag: BodyTag,
    ) -> BodyId {
        let rigid_body = RigidBodyBuilder::fixed().translation(to_vector(centre));
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS);
        self.register(rigid_body, collider, BodyKind::Trigger, tag, filter)
    }

    /// Creates a fixed axis-aligned box (floors and test geometry).
    pub fn create_static_box(
        &mut self,
        centre: Vec3,
        half_extents: Vec3,
        filter: CollisionFilter,
        tag: BodyTag,
    ) -> BodyId {
        let rigid_body = RigidBodyBuilder::fixed().translation(to_vector(centre));
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z);
        self.register(rigid_body, collider, BodyKind::Static, tag, filter)
    }

    /// Creates four thin walls enclosing `bounds`.
    pub fn create_bounding_walls(&mut self, bounds: &LevelBounds, filter: CollisionFilter) -> Vec<BodyId> {
        let half_t = bounds.thickness * 0.5;
        let half_h = bounds.height * 0.5;
        let y = bounds.base_y + half_h;
        let mid_x = (bounds.min_x + bounds.max_x) * 0.5;
        let mid_z = (bounds.min_z + bounds.max_z) * 0.5;
        let half_x = (bounds.max_x - bounds.min_x) * 0.5;
        let half_z = (bounds.max_z - bounds.min_z) * 0.5;

        let walls = [
            (Vec3::new(bounds.min_x, y, mid_z), Vec3::new(half_t, half_h, half_z)),
            (Vec3::new(bounds.max_x, y, mid_z), Vec3::new(half_t, half_h, half_z)),
            (Vec3::new(mid_x, y, bounds.min_z), Vec3::new(half_x, half_h, half_t)),
            (Vec3::new(mid_x, y, bounds.max_z), Vec3::new(half_x, half_h, half_t)),
        ];

        walls
            .into_iter()
            .map(|(centre, half)| self.create_static_box(centre, half, filter, BodyTag::Wall))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    fn record(&self, id: BodyId) -> PhysicsResult<&BodyRecord> {
        self.records
            .get(id.0 as usize)
            .ok_or(PhysicsError::UnknownBody(id.0))
    }

    fn set_enabled(&mut self, id: BodyId, enabled: bool) -> PhysicsResult<()> {
        let record = self
            .records
            .get_mut(id.0 as usize)
            .ok_or(PhysicsError::UnknownBody(id.0))?;
        if let Some(body) = self.bodies.get_mut(record.rigid_body) {
            body.set_enabled(enabled);
        }
        if let Some(collider) = self.colliders.get_mut(record.collider) {
            collider.set_enabled(enabled);
        }
        record.in_scene = enabled;
        self.queries_dirty = true;
        Ok(())
    }

    /// Registers a body with the simulation.
    ///
    /// Returns `Ok(false)` without touching anything if it is already there.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn add_actor(&mut self, id: BodyId) -> PhysicsResult<bool> {
        if self.record(id)?.in_scene {
            warn!(body = id.raw(), "add_actor on a body already in the scene");
            return Ok(false);
        }
        self.set_enabled(id, true)?;
        debug!(body = id.raw(), "body added to simulation");
        Ok(true)
    }

    /// Unregisters a body from the simulation.
    ///
    /// Returns `Ok(false)` without touching anything if it is not there.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn remove_actor(&mut self, id: BodyId) -> PhysicsResult<bool> {
        if !self.record(id)?.in_scene {
            debug!(body = id.raw(), "remove_actor on a body not in the scene");
            return Ok(false);
        }
        self.set_enabled(id, false)?;
        self.triggers.forget(id);
        debug!(body = id.raw(), "body removed from simulation");
        Ok(true)
    }

    /// True if the body is currently simulated. Unknown handles are not.
    #[must_use]
    pub fn is_in_scene(&self, id: BodyId) -> bool {
        self.record(id).is_ok_and(|r| r.in_scene)
    }

    /// Gameplay tag of a body.
    #[must_use]
    pub fn tag(&self, id: BodyId) -> Option<BodyTag> {
        self.record(id).ok().map(|r| r.tag)
    }

    /// Simulation kind of a body.
    #[must_use]
    pub fn kind(&self, id: BodyId) -> Option<BodyKind> {
        self.record(id).ok().map(|r| r.kind)
    }

    /// Current collision filter of a body.
    #[must_use]
    pub fn collision_filter(&self, id: BodyId) -> Option<CollisionFilter> {
        self.record(id).ok().map(|r| r.filter)
    }

    /// Replaces the collision filter of a body.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn set_collision_filter(&mut self, id: BodyId, filter: CollisionFilter) -> PhysicsResult<()> {
        let record = self
            .records
            .get_mut(id.0 as usize)
            .ok_or(PhysicsError::UnknownBody(id.0))?;
        if let Some(collider) = self.colliders.get_mut(record.collider) {
            collider.set_collision_groups(interaction_groups(filter));
        }
        record.filter = filter;
        self.queries_dirty = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pose
    // -------------------------------------------------------------------------

    fn rigid_body_mut(&mut self, id: BodyId) -> PhysicsResult<&mut RigidBody> {
        let handle = self.record(id)?.rigid_body;
        self.bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(id.0))
    }

    /// Body position and orientation.
    #[must_use]
    pub fn pose(&self, id: BodyId) -> Option<(Vec3, Quat)> {
        let record = self.record(id).ok()?;
        let body = self.bodies.get(record.rigid_body)?;
        Some((from_vector(body.translation()), from_rotation(body.rotation())))
    }

    /// Teleports a body.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn set_pose(&mut self, id: BodyId, translation: Vec3, rotation: Quat) -> PhysicsResult<()> {
        self.rigid_body_mut(id)?
            .set_position(to_isometry(translation, rotation), true);
        self.queries_dirty = true;
        Ok(())
    }

    /// Teleports a body, keeping its orientation.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn set_translation(&mut self, id: BodyId, translation: Vec3) -> PhysicsResult<()> {
        self.rigid_body_mut(id)?.set_translation(to_vector(translation), true);
        self.queries_dirty = true;
        Ok(())
    }

    /// Orients a body, keeping its position.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn set_rotation(&mut self, id: BodyId, rotation: Quat) -> PhysicsResult<()> {
        self.rigid_body_mut(id)?.set_rotation(to_rotation(rotation), true);
        self.queries_dirty = true;
        Ok(())
    }

    /// Linear velocity of a body.
    #[must_use]
    pub fn linear_velocity(&self, id: BodyId) -> Option<Vec3> {
        let record = self.record(id).ok()?;
        self.bodies.get(record.rigid_body).map(|b| from_vector(b.linvel()))
    }

    /// Sets linear velocity and clears spin.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec3) -> PhysicsResult<()> {
        let body = self.rigid_body_mut(id)?;
        body.set_linvel(to_vector(velocity), true);
        body.set_angvel(Vector::zeros(), true);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn refresh_queries(&mut self) {
        if self.queries_dirty {
            self.query_pipeline.update(&self.colliders);
            self.queries_dirty = false;
        }
    }

    fn body_of(&self, collider: ColliderHandle) -> Option<(BodyId, BodyTag)> {
        let data = self.colliders.get(collider)?.user_data;
        let id = BodyId::from_user_data(data)?;
        self.records.get(id.0 as usize).map(|r| (id, r.tag))
    }

    /// Casts a ray and returns the nearest solid, non-character body.
    ///
    /// Sensors are ignored. With a filter, only bodies that pass the
    /// bidirectional group/mask test are considered.
    pub fn raycast(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: Option<CollisionFilter>,
    ) -> Option<RaycastHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }
        self.refresh_queries();

        let ray = Ray::new(to_point(origin), to_vector(direction));
        let records = &self.records;
        let not_character = |_: ColliderHandle, collider: &Collider| {
            BodyId::from_user_data(collider.user_data)
                .and_then(|id| records.get(id.0 as usize))
                .map_or(true, |r| r.tag != BodyTag::Character)
        };
        let mut query = QueryFilter::default().exclude_sensors().predicate(&not_character);
        if let Some(filter) = filter {
            query = query.groups(interaction_groups(filter));
        }

        let (collider, distance) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            query,
        )?;
        let (body, _) = self.body_of(collider)?;
        Some(RaycastHit {
            body,
            distance,
            point: from_point(&ray.point_at(distance)),
        })
    }

    // -------------------------------------------------------------------------
    // Characters
    // -------------------------------------------------------------------------

    /// Creates the player capsule at `start` (capsule centre).
    pub fn create_character_controller(&mut self, start: Vec3, filter: CollisionFilter) -> CharacterId {
        let config = self.config.character.clone();
        let rigid_body = RigidBodyBuilder::kinematic_position_based().translation(to_vector(start));
        let collider = ColliderBuilder::capsule_y(config.height * 0.5, config.radius);
        let body = self.register(rigid_body, collider, BodyKind::Kinematic, BodyTag::Character, filter);

        let id = CharacterId(self.characters.len() as u32);
        self.characters.push(CharacterBody {
            controller: config.build_controller(),
            body,
            foot_offset: config.foot_offset(),
        });
        info!(character = id.0, x = start.x, y = start.y, z = start.z, "character created");
        id
    }

    pub(crate) fn character(&self, id: CharacterId) -> PhysicsResult<&CharacterBody> {
        self.characters
            .get(id.0 as usize)
            .ok_or(PhysicsError::UnknownCharacter(id.0))
    }

    /// Body backing a character capsule.
    #[must_use]
    pub fn character_body(&self, id: CharacterId) -> Option<BodyId> {
        self.character(id).ok().map(|c| c.body)
    }

    /// Capsule centre.
    #[must_use]
    pub fn character_position(&self, id: CharacterId) -> Option<Vec3> {
        let body = self.character(id).ok()?.body;
        self.pose(body).map(|(p, _)| p)
    }

    /// Bottom of the capsule.
    #[must_use]
    pub fn character_foot_position(&self, id: CharacterId) -> Option<Vec3> {
        let character = self.character(id).ok()?;
        let centre = self.pose(character.body)?.0;
        Some(centre - Vec3::Y * character.foot_offset)
    }

    /// Sweeps the capsule by `displacement`, resolving against bodies that
    /// pass `filter`, and moves it to the resolved position.
    ///
    /// The capsule adopts `filter` for its own collider as well, so dynamic
    /// bodies see the same world the player does.
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn sweep_character(
        &mut self,
        id: CharacterId,
        displacement: Vec3,
        filter: CollisionFilter,
        dt: f32,
    ) -> PhysicsResult<CollisionFlags> {
        let body = self.character(id)?.body;
        if self.record(body)?.filter != filter {
            self.set_collision_filter(body, filter)?;
        }
        self.refresh_queries();

        let record = self.record(body)?;
        let (rigid_handle, collider_handle) = (record.rigid_body, record.collider);
        let position = self
            .bodies
            .get(rigid_handle)
            .map(|b| *b.translation())
            .ok_or(PhysicsError::UnknownBody(body.0))?;
        let shape = self
            .colliders
            .get(collider_handle)
            .map(Collider::shape)
            .ok_or(PhysicsError::UnknownBody(body.0))?;

        let query = QueryFilter::default()
            .groups(interaction_groups(filter))
            .exclude_rigid_body(rigid_handle)
            .exclude_sensors();

        let movement = self.character(id)?.controller.move_shape(
            dt,
            &self.bodies,
            &self.colliders,
            &self.query_pipeline,
            shape,
            &Isometry::translation(position.x, position.y, position.z),
            to_vector(displacement),
            query,
            |_| {},
        );

        let end = position + movement.translation;
        // The controller only reports ground it ran into; a resting or purely
        // horizontal move needs a downward cast.
        let grounded = movement.grounded
            || (displacement.y <= 0.0 && self.ground_below(shape, end, query));

        let applied = from_vector(&movement.translation);
        if let Some(rigid) = self.bodies.get_mut(rigid_handle) {
            rigid.set_translation(end, true);
        }
        Ok(CollisionFlags::classify(displacement, applied, grounded))
    }

    /// True if something lies within the skin distance under `shape` at `at`.
    fn ground_below(&self, shape: &dyn Shape, at: Vector<Real>, query: QueryFilter) -> bool {
        let reach = self.config.character.contact_offset * GROUND_REACH_FACTOR;
        self.query_pipeline
            .cast_shape(
                &self.bodies,
                &self.colliders,
                &Isometry::translation(at.x, at.y, at.z),
                &-Vector::y(),
                shape,
                ShapeCastOptions {
                    max_time_of_impact: reach,
                    target_distance: 0.0,
                    stop_at_penetration: true,
                    compute_impact_geometry_on_penetration: false,
                },
                query,
            )
            .is_some()
    }

    /// Applies a new filter to the capsule (used on world flips).
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn set_character_filter(&mut self, id: CharacterId, filter: CollisionFilter) -> PhysicsResult<()> {
        let body = self.character(id)?.body;
        self.set_collision_filter(body, filter)
    }

    /// Teleports the capsule (respawn).
    ///
    /// # Errors
    ///
    /// Fails for handles that do not belong to this scene.
    pub fn teleport_character(&mut self, id: CharacterId, position: Vec3) -> PhysicsResult<()> {
        let body = self.character(id)?.body;
        self.set_translation(body, position)
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advances the simulation by `dt` and returns the trigger events it raised.
    ///
    /// Blocks until the step is complete. Events are resolved after the
    /// pipeline returns; nothing re-enters the scene from inside the step.
    pub fn step(&mut self, dt: f32) -> Vec<TriggerEvent> {
        if dt <= 0.0 {
            return Vec::new();
        }

        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );
        self.queries_dirty = false;
        self.steps += 1;

        let mut events = Vec::new();
        while let Ok(event) = self.collision_events.try_recv() {
            let (Some(a), Some(b)) = (self.body_of(event.collider1()), self.body_of(event.collider2())) else {
                continue;
            };
            if let Some(trigger) = self.triggers.on_contact(a, b, event.started()) {
                info!(?trigger, step = self.steps, "trigger event");
                events.push(trigger);
            }
        }
        // Force events are not consumed by gameplay.
        while self.contact_force_events.try_recv().is_ok() {}

        events
    }
}

impl Default for PhysicsScene {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_shared::{ActiveWorld, WorldMask};

    fn floor(scene: &mut PhysicsScene) -> BodyId {
        scene.create_static_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(20.0, 0.5, 20.0),
            CollisionFilter::world_geometry(WorldMask::BOTH),
            BodyTag::Level,
        )
    }

    #[test]
    fn test_scene_creation() {
        let scene = PhysicsScene::default();
        assert_eq!(scene.body_count(), 0);
        assert!((scene.config().gravity - GRAVITY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mut scene = PhysicsScene::default();
        let result = scene.create_static_body(
            &MeshData::default(),
            &Mat4::IDENTITY,
            CollisionFilter::static_default(),
            BodyTag::Level,
        );
        assert_eq!(result, Err(PhysicsError::EmptyMesh));
        assert_eq!(scene.body_count(), 0);
    }

    #[test]
    fn test_bad_indices_rejected() {
        let mut scene = PhysicsScene::default();
        let mesh = MeshData::new(vec![[0.0; 3]; 3], vec![0, 1, 7]);
        let result = scene.create_static_body(
            &mesh,
            &Mat4::IDENTITY,
            CollisionFilter::static_default(),
            BodyTag::Level,
        );
        assert!(matches!(result, Err(PhysicsError::IndexOutOfRange { index: 7, .. })));

        let mesh = MeshData::new(vec![[0.0; 3]; 3], vec![0, 1]);
        let result = scene.create_dynamic_body(
            &mesh,
            &Mat4::IDENTITY,
            CollisionFilter::static_default(),
            BodyTag::Pickup,
        );
        assert_eq!(result, Err(PhysicsError::MalformedIndices(2)));
    }

    #[test]
    fn test_degenerate_hull_rejected() {
        let mut scene = PhysicsScene::default();
        // All points coincide
        let mesh = MeshData::new(vec![[1.0, 1.0, 1.0]; 4], vec![]);
        let result = scene.create_dynamic_body(
            &mesh,
            &Mat4::IDENTITY,
            CollisionFilter::static_default(),
            BodyTag::Pickup,
        );
        assert!(matches!(result, Err(PhysicsError::ConvexHullFailed(4))));
    }

    #[test]
    fn test_flat_point_sets_rejected() {
        let mut scene = PhysicsScene::default();
        let collinear = MeshData::new((0..5).map(|i| [i as f32, 0.0, 0.0]).collect(), vec![]);
        let coplanar = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.5, 0.0, 0.5]],
            vec![],
        );
        let too_few = MeshData::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![]);

        for (mesh, count) in [(collinear, 5), (coplanar, 5), (too_few, 3)] {
            let result = scene.create_dynamic_body(
                &mesh,
                &Mat4::IDENTITY,
                CollisionFilter::static_default(),
                BodyTag::Pickup,
            );
            assert_eq!(result, Err(PhysicsError::ConvexHullFailed(count)));
        }
        assert_eq!(scene.body_count(), 0);

        // A scale of zero on one axis flattens an otherwise solid cube
        let flattened = scene.create_dynamic_body(
            &MeshData::cuboid(Vec3::splat(0.1)),
            &Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)),
            CollisionFilter::static_default(),
            BodyTag::Pickup,
        );
        assert!(matches!(flattened, Err(PhysicsError::ConvexHullFailed(_))));
        assert_eq!(scene.body_count(), 0);
    }

    #[test]
    fn test_degenerate_trimesh_rejected() {
        let mut scene = PhysicsScene::default();
        // Three triangles, all with collinear corners
        let mesh = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]],
            vec![0, 1, 2, 1, 2, 3, 0, 0, 3],
        );
        let result = scene.create_static_body(
            &mesh,
            &Mat4::IDENTITY,
            CollisionFilter::static_default(),
            BodyTag::Level,
        );
        assert!(matches!(result, Err(PhysicsError::TriangleMeshCooking(_))));
        assert_eq!(scene.body_count(), 0);
    }

    #[test]
    fn test_solid_meshes_still_build() {
        let mut scene = PhysicsScene::default();
        let cube = MeshData::cuboid(Vec3::splat(0.05));
        assert!(scene
            .create_dynamic_body(&cube, &Mat4::IDENTITY, CollisionFilter::static_default(), BodyTag::Pickup)
            .is_ok());
        assert!(scene
            .create_static_body(&cube, &Mat4::IDENTITY, CollisionFilter::static_default(), BodyTag::Level)
            .is_ok());
        assert_eq!(scene.body_count(), 2);
    }

    #[test]
    fn test_add_remove_idempotent() {
        let mut scene = PhysicsScene::default();
        let mesh = MeshData::cuboid(Vec3::splat(0.1));
        let body = scene
            .create_dynamic_body(
                &mesh,
                &Mat4::from_translation(Vec3::Y),
                CollisionFilter::world_geometry(WorldMask::BLOOM),
                BodyTag::Pickup,
            )
            .unwrap();

        assert!(scene.is_in_scene(body));
        assert_eq!(scene.add_actor(body), Ok(false));
        assert_eq!(scene.remove_actor(body), Ok(true));
        assert_eq!(scene.remove_actor(body), Ok(false));
        assert!(!scene.is_in_scene(body));
        assert_eq!(scene.add_actor(body), Ok(true));
        assert_eq!(scene.active_body_count(), 1);
    }

    #[test]
    fn test_unknown_body_is_error() {
        let mut scene = PhysicsScene::default();
        assert_eq!(scene.add_actor(BodyId(9)), Err(PhysicsError::UnknownBody(9)));
        assert!(!scene.is_in_scene(BodyId(9)));
        assert!(scene.pose(BodyId(9)).is_none());
    }

    #[test]
    fn test_dynamic_body_falls_onto_floor() {
        let mut scene = PhysicsScene::default();
        floor(&mut scene);
        let cube = scene
            .create_dynamic_body(
                &MeshData::cuboid(Vec3::splat(0.1)),
                &Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
                CollisionFilter::world_geometry(WorldMask::BLOOM),
                BodyTag::Pickup,
            )
            .unwrap();

        for _ in 0..180 {
            scene.step(1.0 / 60.0);
        }
        let (pos, _) = scene.pose(cube).unwrap();
        assert!(pos.y > 0.0 && pos.y < 0.2, "cube should rest on floor, y = {}", pos.y);
    }

    #[test]
    fn test_removed_body_does_not_move() {
        let mut scene = PhysicsScene::default();
        let cube = scene
            .create_dynamic_body(
                &MeshData::cuboid(Vec3::splat(0.1)),
                &Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
                CollisionFilter::world_geometry(WorldMask::BLOOM),
                BodyTag::Pickup,
            )
            .unwrap();
        scene.remove_actor(cube).unwrap();
        for _ in 0..30 {
            scene.step(1.0 / 60.0);
        }
        assert!((scene.pose(cube).unwrap().0.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_respects_filter_and_removal() {
        let mut scene = PhysicsScene::default();
        let target = scene.create_static_box(
            Vec3::new(0.0, 0.0, -3.0),
            Vec3::splat(0.5),
            CollisionFilter::world_geometry(WorldMask::BLOOM),
            BodyTag::Pickup,
        );

        let hit = scene.raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0, None).unwrap();
        assert_eq!(hit.body, target);
        assert!((hit.distance - 2.5).abs() < 1e-3);

        assert!(scene
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0, Some(CollisionFilter::pick_ray(ActiveWorld::Dither)))
            .is_none());
        assert!(scene
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0, Some(CollisionFilter::pick_ray(ActiveWorld::Bloom)))
            .is_some());

        scene.remove_actor(target).unwrap();
        assert!(scene.raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0, None).is_none());
        // Too short
        scene.add_actor(target).unwrap();
        assert!(scene.raycast(Vec3::ZERO, Vec3::NEG_Z, 2.0, None).is_none());
    }

    #[test]
    fn test_raycast_skips_character_and_sensors() {
        let mut scene = PhysicsScene::default();
        scene.create_character_controller(Vec3::new(0.0, 0.0, -1.0), CollisionFilter::character(ActiveWorld::Bloom));
        scene.create_trigger_box(
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::splat(0.3),
            CollisionFilter::pressure_plate(),
            BodyTag::PressurePlate,
        );
        assert!(scene.raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0, None).is_none());
    }

    #[test]
    fn test_character_lands_and_reports_down() {
        let mut scene = PhysicsScene::default();
        floor(&mut scene);
        let filter = CollisionFilter::character(ActiveWorld::Dither);
        let id = scene.create_character_controller(Vec3::new(0.0, 0.5, 0.0), filter);

        let mut landed = false;
        for _ in 0..120 {
            let flags = scene
                .sweep_character(id, Vec3::new(0.0, -0.05, 0.0), filter, 1.0 / 60.0)
                .unwrap();
            if flags.has(CollisionFlags::DOWN) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        let foot = scene.character_foot_position(id).unwrap();
        assert!(foot.y > -0.05 && foot.y < 0.1, "foot y = {}", foot.y);
    }

    #[test]
    fn test_resting_character_stays_grounded() {
        let mut scene = PhysicsScene::default();
        floor(&mut scene);
        let filter = CollisionFilter::character(ActiveWorld::Dither);
        let id = scene.create_character_controller(Vec3::new(0.0, 0.5, 0.0), filter);
        for _ in 0..60 {
            let flags = scene
                .sweep_character(id, Vec3::new(0.0, -0.05, 0.0), filter, 1.0 / 60.0)
                .unwrap();
            if flags.has(CollisionFlags::DOWN) {
                break;
            }
        }

        // Standing still and walking both submit no vertical motion
        for step in [Vec3::ZERO, Vec3::new(0.02, 0.0, 0.0), Vec3::ZERO] {
            let flags = scene.sweep_character(id, step, filter, 1.0 / 60.0).unwrap();
            assert!(flags.has(CollisionFlags::DOWN), "lost ground on {step:?}");
        }

        // Nothing underneath within reach
        scene.teleport_character(id, Vec3::new(0.0, 2.0, 0.0)).unwrap();
        let flags = scene.sweep_character(id, Vec3::ZERO, filter, 1.0 / 60.0).unwrap();
        assert!(!flags.has(CollisionFlags::DOWN));

        // A rising jump is never grounded by the downward cast
        scene.teleport_character(id, Vec3::new(0.0, 0.5, 0.0)).unwrap();
        for _ in 0..60 {
            scene.sweep_character(id, Vec3::new(0.0, -0.05, 0.0), filter, 1.0 / 60.0).unwrap();
        }
        let flags = scene.sweep_character(id, Vec3::new(0.0, 0.05, 0.0), filter, 1.0 / 60.0).unwrap();
        assert!(!flags.has(CollisionFlags::DOWN));
    }

    #[test]
    fn test_character_falls_through_other_world_floor() {
        let mut scene = PhysicsScene::default();
        scene.create_static_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(20.0, 0.5, 20.0),
            CollisionFilter::world_geometry(WorldMask::BLOOM),
            BodyTag::Level,
        );
        let filter = CollisionFilter::character(ActiveWorld::Dither);
        let id = scene.create_character_controller(Vec3::new(0.0, 0.5, 0.0), filter);
        for _ in 0..60 {
            let flags = scene
                .sweep_character(id, Vec3::new(0.0, -0.05, 0.0), filter, 1.0 / 60.0)
                .unwrap();
            assert!(!flags.has(CollisionFlags::DOWN));
        }
        assert!(scene.character_position(id).unwrap().y < -2.0);
    }

    #[test]
    fn test_bounding_walls() {
        let mut scene = PhysicsScene::default();
        let walls = scene.create_bounding_walls(&LevelBounds::default(), CollisionFilter::static_default());
        assert_eq!(walls.len(), 4);
        assert!(walls.iter().all(|w| scene.tag(*w) == Some(BodyTag::Wall)));

        // Ray from inside towards +X stops at the east wall
        let hit = scene.raycast(Vec3::new(0.0, 0.0, 0.0), Vec3::X, 100.0, None).unwrap();
        assert!((hit.point.x - (35.0 - 0.05)).abs() < 1e-3);
    }

    #[test]
    fn test_filter_update() {
        let mut scene = PhysicsScene::default();
        let body = scene.create_static_box(Vec3::ZERO, Vec3::ONE, CollisionFilter::static_default(), BodyTag::Level);
        scene.set_collision_filter(body, CollisionFilter::remote_at_rest()).unwrap();
        assert_eq!(scene.collision_filter(body), Some(CollisionFilter::remote_at_rest()));
    }
}

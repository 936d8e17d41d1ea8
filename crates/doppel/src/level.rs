//! # Level Builder
//!
//! Loads every level asset, spawns the entities and adds the fixed
//! physics furniture (pressure plate, bounding walls).
//!
//! ```text
//! asset              kind     worlds   body
//! environment        Scenery  both     static
//! dither_floor       Floor    dither   static
//! bloom_floor        Floor    bloom    static
//! dither_water       Water    dither   -
//! bloom_water        Water    bloom    -
//! jumpnrun_dither    Scenery  dither   static
//! jumpnrun_bloom     Scenery  bloom    static
//! altar              Scenery  bloom    static
//! note               Note     bloom    static, pickable
//! remote             Remote   both     dynamic, parked, pickable
//! ```
//!
//! The remote starts outside the simulation and hovers on the altar until
//! it is picked up.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::info;

use doppel_physics::{BodyId, BodyTag, LevelBounds, PhysicsScene};
use doppel_shared::constants::{PLAYER_START, PRESSURE_PLATE_CENTRE, PRESSURE_PLATE_HALF_EXTENTS};
use doppel_shared::{CollisionFilter, WorldMask};

use crate::assets::AssetSource;
use crate::entity::{BodyType, EntityDesc, EntityId, EntityKind, EntityStore};
use crate::error::GameResult;

/// Level layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Capsule centre at spawn.
    pub player_start: Vec3,
    /// Where the remote hovers before pickup.
    pub remote_position: Vec3,
    /// Where the note hovers before pickup.
    pub note_position: Vec3,
    /// Dither water surface height.
    pub dither_water_height: f32,
    /// Initial bloom water surface height.
    pub bloom_water_height: f32,
    /// Bloom water rise per second.
    pub bloom_water_rise_rate: f32,
    /// Invisible walls.
    pub bounds: LevelBounds,
    /// Pressure plate centre.
    pub plate_centre: Vec3,
    /// Pressure plate half extents.
    pub plate_half_extents: Vec3,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            player_start: PLAYER_START,
            remote_position: Vec3::new(0.2, 0.4, 0.4),
            note_position: Vec3::new(21.26, 6.5, -6.27),
            dither_water_height: -0.5,
            bloom_water_height: -1.0,
            bloom_water_rise_rate: 0.012,
            bounds: LevelBounds::default(),
            plate_centre: PRESSURE_PLATE_CENTRE,
            plate_half_extents: PRESSURE_PLATE_HALF_EXTENTS,
        }
    }
}

/// Handles to the entities and bodies gameplay addresses directly.
#[derive(Clone, Debug)]
pub struct Level {
    /// The world-switching remote.
    pub remote: EntityId,
    /// The collectible note.
    pub note: EntityId,
    /// Remote preview in front of the camera.
    pub remote_close_up: EntityId,
    /// Note preview in front of the camera.
    pub note_close_up: EntityId,
    /// Bloom water plane.
    pub bloom_water: EntityId,
    /// Dither water plane.
    pub dither_water: EntityId,
    /// Goal sensor in the pit.
    pub pressure_plate: BodyId,
    /// Bounding walls.
    pub walls: Vec<BodyId>,
}

struct Placement<'a> {
    asset: &'a str,
    kind: EntityKind,
    world_mask: WorldMask,
    body_type: BodyType,
    pickable: bool,
    rendered: bool,
    at: Option<Vec3>,
}

impl<'a> Placement<'a> {
    const fn scenery(asset: &'a str, world_mask: WorldMask) -> Self {
        Self {
            asset,
            kind: EntityKind::Scenery,
            world_mask,
            body_type: BodyType::Static,
            pickable: false,
            rendered: true,
            at: None,
        }
    }
}

fn place(
    placement: &Placement<'_>,
    assets: &mut dyn AssetSource,
    scene: &mut PhysicsScene,
    entities: &mut EntityStore,
) -> GameResult<EntityId> {
    let loaded = assets.load(placement.asset)?;
    let transform = placement.at.map_or(loaded.transform, Mat4::from_translation);
    let desc = EntityDesc {
        label: placement.asset,
        kind: placement.kind,
        mesh_id: loaded.mesh_id,
        mesh: &loaded.data,
        transform,
        world_mask: placement.world_mask,
        body_type: placement.body_type,
        pickable: placement.pickable,
        rendered: placement.rendered,
    };
    Ok(entities.spawn(&desc, scene))
}

impl Level {
    /// Builds the stock level.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GameError::Asset`] if any asset is missing or
    /// malformed, and [`crate::GameError::Physics`] if the remote body
    /// cannot be parked.
    pub fn build(
        config: &LevelConfig,
        assets: &mut dyn AssetSource,
        scene: &mut PhysicsScene,
        entities: &mut EntityStore,
    ) -> GameResult<Self> {
        for placement in [
            Placement::scenery("environment", WorldMask::BOTH),
            Placement {
                kind: EntityKind::Floor,
                ..Placement::scenery("dither_floor", WorldMask::DITHER)
            },
            Placement {
                kind: EntityKind::Floor,
                ..Placement::scenery("bloom_floor", WorldMask::BLOOM)
            },
            Placement::scenery("jumpnrun_dither", WorldMask::DITHER),
            Placement::scenery("jumpnrun_bloom", WorldMask::BLOOM),
            Placement::scenery("altar", WorldMask::BLOOM),
        ] {
            place(&placement, assets, scene, entities)?;
        }

        let water = |asset, world_mask, height: f32| Placement {
            kind: EntityKind::Water,
            body_type: BodyType::None,
            at: Some(Vec3::Y * height),
            ..Placement::scenery(asset, world_mask)
        };
        let dither_water = place(
            &water("dither_water", WorldMask::DITHER, config.dither_water_height),
            assets,
            scene,
            entities,
        )?;
        let bloom_water = place(
            &water("bloom_water", WorldMask::BLOOM, config.bloom_water_height),
            assets,
            scene,
            entities,
        )?;

        let note = place(
            &Placement {
                kind: EntityKind::Note,
                pickable: true,
                at: Some(config.note_position),
                ..Placement::scenery("note", WorldMask::BLOOM)
            },
            assets,
            scene,
            entities,
        )?;
        let remote = place(
            &Placement {
                kind: EntityKind::Remote,
                body_type: BodyType::Dynamic,
                pickable: true,
                at: Some(config.remote_position),
                ..Placement::scenery("remote", WorldMask::BOTH)
            },
            assets,
            scene,
            entities,
        )?;
        if let Some(body) = entities.get(remote).and_then(|o| o.body()) {
            scene.remove_actor(body)?;
        }
        for id in [note, remote] {
            if let Some(object) = entities.get_mut(id) {
                object.idle_bob = true;
            }
        }

        let close_up = |asset| Placement {
            kind: EntityKind::CloseUp,
            body_type: BodyType::None,
            rendered: false,
            ..Placement::scenery(asset, WorldMask::BOTH)
        };
        let remote_close_up = place(&close_up("remote"), assets, scene, entities)?;
        let note_close_up = place(&close_up("note"), assets, scene, entities)?;

        let pressure_plate = scene.create_trigger_box(
            config.plate_centre,
            config.plate_half_extents,
            CollisionFilter::pressure_plate(),
            BodyTag::PressurePlate,
        );
        let walls = scene.create_bounding_walls(&config.bounds, CollisionFilter::world_geometry(WorldMask::BOTH));

        info!(
            entities = entities.len(),
            bodies = scene.body_count(),
            "level built"
        );
        Ok(Self {
            remote,
            note,
            remote_close_up,
            note_close_up,
            bloom_water,
            dither_water,
            pressure_plate,
            walls,
        })
    }
}

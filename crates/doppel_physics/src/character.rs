//! # Character Sweep
//!
//! The gameplay controller never touches the backend directly. It submits a
//! displacement through [`CharacterMotor`] and reads back [`CollisionFlags`],
//! the same contract a scripted motor satisfies in tests.

use glam::Vec3;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::{Real, Vector};
use serde::{Deserialize, Serialize};

use doppel_shared::constants::{
    CAPSULE_HEIGHT, CAPSULE_RADIUS, CONTACT_OFFSET, SLOPE_LIMIT, STEP_OFFSET,
};
use doppel_shared::CollisionFilter;

use crate::body::BodyId;
use crate::error::PhysicsResult;
use crate::scene::PhysicsScene;

/// Tolerance used when comparing desired and applied motion.
const MOTION_EPSILON: f32 = 1.0e-4;

// =============================================================================
// COLLISION FLAGS
// =============================================================================

/// Which sides of the capsule were blocked during the last sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CollisionFlags(u8);

impl CollisionFlags {
    /// Free movement.
    pub const NONE: Self = Self(0);
    /// Blocked horizontally.
    pub const SIDES: Self = Self(1 << 0);
    /// Blocked above (ceiling).
    pub const UP: Self = Self(1 << 1);
    /// Standing on something.
    pub const DOWN: Self = Self(1 << 2);

    /// Creates flags from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Checks if a specific flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    /// Derives flags by comparing what was asked for with what was applied.
    #[must_use]
    pub fn classify(desired: Vec3, applied: Vec3, grounded: bool) -> Self {
        let mut flags = Self::NONE;
        if grounded {
            flags = flags.with(Self::DOWN);
        }
        if desired.y > MOTION_EPSILON && applied.y < desired.y - MOTION_EPSILON {
            flags = flags.with(Self::UP);
        }
        let desired_h = Vec3::new(desired.x, 0.0, desired.z);
        let applied_h = Vec3::new(applied.x, 0.0, applied.z);
        if desired_h.length() > MOTION_EPSILON
            && (desired_h - applied_h).length() > MOTION_EPSILON
        {
            flags = flags.with(Self::SIDES);
        }
        flags
    }
}

// =============================================================================
// MOTOR TRAIT
// =============================================================================

/// Sweep-and-resolve movement of a character shape.
pub trait CharacterMotor {
    /// Moves by `displacement`, sliding along whatever `filter` lets it hit.
    fn sweep_move(&mut self, displacement: Vec3, filter: CollisionFilter, dt: f32) -> CollisionFlags;

    /// Capsule centre.
    fn position(&self) -> Vec3;

    /// Bottom of the capsule.
    fn foot_position(&self) -> Vec3;
}

// =============================================================================
// CONFIG
// =============================================================================

/// Capsule and controller tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Capsule radius.
    pub radius: f32,
    /// Cylinder height between the hemispheres.
    pub height: f32,
    /// Highest ledge climbed automatically.
    pub step_offset: f32,
    /// Steepest walkable slope (radians).
    pub slope_limit: f32,
    /// Skin distance to geometry.
    pub contact_offset: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            radius: CAPSULE_RADIUS,
            height: CAPSULE_HEIGHT,
            step_offset: STEP_OFFSET,
            slope_limit: SLOPE_LIMIT,
            contact_offset: CONTACT_OFFSET,
        }
    }
}

impl CharacterConfig {
    /// Distance from the capsule centre to its lowest point.
    #[inline]
    #[must_use]
    pub fn foot_offset(&self) -> f32 {
        self.height * 0.5 + self.radius
    }

    pub(crate) fn build_controller(&self) -> KinematicCharacterController {
        KinematicCharacterController {
            up: Vector::<Real>::y_axis(),
            offset: CharacterLength::Absolute(self.contact_offset),
            slide: true,
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.step_offset),
                min_width: CharacterLength::Absolute(self.radius * 0.5),
                include_dynamic_bodies: false,
            }),
            max_slope_climb_angle: self.slope_limit,
            min_slope_slide_angle: self.slope_limit,
            snap_to_ground: None,
            ..KinematicCharacterController::default()
        }
    }
}

// =============================================================================
// SCENE-BACKED MOTOR
// =============================================================================

/// Handle to a character capsule owned by a [`PhysicsScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CharacterId(pub(crate) u32);

/// Arena entry for one character.
pub(crate) struct CharacterBody {
    pub(crate) controller: KinematicCharacterController,
    pub(crate) body: BodyId,
    pub(crate) foot_offset: f32,
}

/// [`CharacterMotor`] that sweeps a scene character.
pub struct SceneMotor<'a> {
    scene: &'a mut PhysicsScene,
    id: CharacterId,
}

impl<'a> SceneMotor<'a> {
    pub(crate) fn new(scene: &'a mut PhysicsScene, id: CharacterId) -> Self {
        Self { scene, id }
    }

    /// The character being moved.
    #[must_use]
    pub fn id(&self) -> CharacterId {
        self.id
    }
}

impl CharacterMotor for SceneMotor<'_> {
    fn sweep_move(&mut self, displacement: Vec3, filter: CollisionFilter, dt: f32) -> CollisionFlags {
        // The id was validated when the motor was created.
        self.scene
            .sweep_character(self.id, displacement, filter, dt)
            .unwrap_or(CollisionFlags::NONE)
    }

    fn position(&self) -> Vec3 {
        self.scene.character_position(self.id).unwrap_or(Vec3::ZERO)
    }

    fn foot_position(&self) -> Vec3 {
        self.scene.character_foot_position(self.id).unwrap_or(Vec3::ZERO)
    }
}

impl PhysicsScene {
    /// Borrows a character as a [`CharacterMotor`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::PhysicsError::UnknownCharacter`] for a foreign handle.
    pub fn motor(&mut self, id: CharacterId) -> PhysicsResult<SceneMotor<'_>> {
        self.character(id)?;
        Ok(SceneMotor::new(self, id))
    }
}

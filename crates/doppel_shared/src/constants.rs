//! # Tuning Constants
//!
//! Default gameplay tuning. Every value here is also the default of a field
//! in the TOML config, so a missing section plays exactly like this table.

use glam::Vec3;

// =============================================================================
// PHYSICS
// =============================================================================

/// Gravity along Y (m/s²).
pub const GRAVITY: f32 = -9.81;

/// Fixed simulation step used when the caller does not provide one.
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Largest frame delta accepted before clamping (prevents tunnelling after a stall).
pub const MAX_FRAME_DELTA: f32 = 0.1;

// =============================================================================
// CHARACTER
// =============================================================================

/// Capsule radius.
pub const CAPSULE_RADIUS: f32 = 0.15;

/// Capsule cylinder height (excluding the two hemispheres).
pub const CAPSULE_HEIGHT: f32 = 0.05;

/// Highest ledge the character climbs without jumping.
pub const STEP_OFFSET: f32 = 0.05;

/// Steepest walkable slope (radians).
pub const SLOPE_LIMIT: f32 = std::f32::consts::FRAC_PI_4;

/// Skin distance kept between the capsule and geometry.
pub const CONTACT_OFFSET: f32 = 0.01;

/// Upward velocity applied on jump.
pub const JUMP_IMPULSE: f32 = 3.5;

/// Coyote window (seconds).
pub const COYOTE_TIME: f32 = 0.1;

/// Walk speed (m/s).
pub const WALK_SPEED: f32 = 1.5;

/// Sprint speed (m/s).
pub const SPRINT_SPEED: f32 = 3.0;

/// Degrees of rotation per pixel of mouse movement.
pub const MOUSE_SENSITIVITY: f32 = 0.1;

/// Pitch limit (degrees) in both directions.
pub const PITCH_LIMIT: f32 = 89.0;

/// Initial yaw (degrees).
pub const START_YAW: f32 = -180.0;

/// Head bob amplitude.
pub const HEAD_BOB_AMPLITUDE: f32 = 0.01;

/// Head bob frequency (rad/s).
pub const HEAD_BOB_FREQUENCY: f32 = 13.0;

/// Vertical field of view (degrees).
pub const FIELD_OF_VIEW: f32 = 90.0;

/// Near clip plane.
pub const NEAR_PLANE: f32 = 0.1;

/// Far clip plane.
pub const FAR_PLANE: f32 = 100.0;

// =============================================================================
// PLAYER RESOURCES
// =============================================================================

/// Maximum health.
pub const MAX_HEALTH: f32 = 100.0;

/// Maximum stamina.
pub const MAX_STAMINA: f32 = 100.0;

/// Maximum remote charge.
pub const MAX_REMOTE_CHARGE: f32 = 100.0;

/// Stamina regained per second.
pub const STAMINA_REGEN_RATE: f32 = 20.0;

/// Stamina spent per second of sprinting.
pub const STAMINA_DRAIN_RATE: f32 = 30.0;

/// Remote charge regained per second.
pub const REMOTE_CHARGE_RATE: f32 = 50.0;

/// Charge removed per drain tick.
pub const REMOTE_DRAIN_AMOUNT: f32 = 5.0;

/// Minimum interval between damage applications (seconds).
pub const DAMAGE_INTERVAL: f32 = 2.0;

/// Minimum interval between remote drain applications (seconds).
pub const DRAIN_INTERVAL: f32 = 2.0;

/// Time regen stays off after exhaustion (seconds).
pub const EXHAUSTION_RECOVERY: f32 = 1.5;

/// Stamina required to sprint.
pub const SPRINT_THRESHOLD: f32 = 5.0;

// =============================================================================
// INTERACTION
// =============================================================================

/// Radius for proximity pickup.
pub const PICKUP_RADIUS: f32 = 0.5;

/// Length of the pick ray.
pub const PICK_RAY_LENGTH: f32 = 5.0;

/// Distance in front of the camera where rays and throws start.
pub const HAND_OFFSET: f32 = 0.21;

/// Forward speed of a throw.
pub const THROW_SPEED: f32 = 2.0;

/// Upward speed added to a throw.
pub const THROW_LIFT: f32 = 0.5;

// =============================================================================
// WORLD TRANSITION
// =============================================================================

/// Total cross-fade duration (seconds).
pub const TRANSITION_DURATION: f32 = 1.0;

/// Time into the fade at which the world flips (seconds).
pub const TRANSITION_MIDPOINT: f32 = 0.25;

/// Health restored when entering the bloom world.
pub const BLOOM_HEAL: f32 = 30.0;

/// Charge required to use the remote.
pub const MIN_SWITCH_CHARGE: f32 = 10.0;

// =============================================================================
// LEVEL
// =============================================================================

/// Player spawn point.
pub const PLAYER_START: Vec3 = Vec3::new(3.0, 1.0, -1.0);

/// Below this height the player has fallen out of the level.
pub const FALL_THRESHOLD: f32 = -5.0;

/// Above this height the remote recharges.
pub const CHARGE_ALTITUDE: f32 = 5.3;

/// Pressure plate centre.
pub const PRESSURE_PLATE_CENTRE: Vec3 = Vec3::new(29.0, -10.0, 17.0);

/// Pressure plate half extents.
pub const PRESSURE_PLATE_HALF_EXTENTS: Vec3 = Vec3::new(10.0, 0.5, 10.0);

/// Amplitude of the idle bob applied to un-held pickups.
pub const IDLE_BOB_AMPLITUDE: f32 = 0.04;

/// Angular speed of the idle bob (rad/s).
pub const IDLE_BOB_SPEED: f32 = 2.0;

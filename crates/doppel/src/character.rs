//! # First-Person Character
//!
//! Camera orientation, gravity, jumping with coyote time, sprinting and
//! head-bob. The controller never touches the physics scene directly: it
//! asks a [`CharacterMotor`] to sweep the capsule, which keeps it testable
//! against a scripted motor.
//!
//! The active world is passed in on every update; the controller keeps no
//! copy of it.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use doppel_physics::{CharacterMotor, CollisionFlags};
use doppel_shared::constants::{
    COYOTE_TIME, FAR_PLANE, FIELD_OF_VIEW, GRAVITY, HEAD_BOB_AMPLITUDE, HEAD_BOB_FREQUENCY, JUMP_IMPULSE,
    MOUSE_SENSITIVITY, NEAR_PLANE, PITCH_LIMIT, SPRINT_SPEED, START_YAW, WALK_SPEED,
};
use doppel_shared::{ActiveWorld, CollisionFilter};

/// Movement and camera tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Downward acceleration (negative).
    pub gravity: f32,
    /// Upward velocity applied by a jump.
    pub jump_impulse: f32,
    /// Grace period after leaving the ground during which a jump still works.
    pub coyote_time: f32,
    /// Horizontal speed while walking.
    pub walk_speed: f32,
    /// Horizontal speed while sprinting.
    pub sprint_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Pitch clamp in degrees.
    pub pitch_limit: f32,
    /// Initial yaw in degrees.
    pub start_yaw: f32,
    /// Initial pitch in degrees.
    pub start_pitch: f32,
    /// Head-bob height.
    pub head_bob_amplitude: f32,
    /// Head-bob angular speed.
    pub head_bob_frequency: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    /// Near clip plane.
    pub near_plane: f32,
    /// Far clip plane.
    pub far_plane: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_impulse: JUMP_IMPULSE,
            coyote_time: COYOTE_TIME,
            walk_speed: WALK_SPEED,
            sprint_speed: SPRINT_SPEED,
            mouse_sensitivity: MOUSE_SENSITIVITY,
            pitch_limit: PITCH_LIMIT,
            start_yaw: START_YAW,
            start_pitch: 0.0,
            head_bob_amplitude: HEAD_BOB_AMPLITUDE,
            head_bob_frequency: HEAD_BOB_FREQUENCY,
            field_of_view: FIELD_OF_VIEW,
            near_plane: NEAR_PLANE,
            far_plane: FAR_PLANE,
        }
    }
}

/// Directional keys held this frame plus the jump edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementInput {
    /// Move along the view direction.
    pub forward: bool,
    /// Move against the view direction.
    pub backward: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
    /// Jump pressed this frame.
    pub jump: bool,
}

impl MovementInput {
    /// True if any direction key is held.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Camera basis derived from yaw and pitch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewVectors {
    /// Look direction.
    pub forward: Vec3,
    /// Right of the look direction.
    pub right: Vec3,
    /// Camera up.
    pub up: Vec3,
}

impl ViewVectors {
    /// Builds the basis from angles in degrees.
    #[must_use]
    pub fn from_angles(yaw: f32, pitch: f32) -> Self {
        let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
        let forward = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        Self { forward, right, up }
    }
}

/// Vertical camera oscillation while walking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadBob {
    amplitude: f32,
    frequency: f32,
    timer: f32,
    active: bool,
}

impl HeadBob {
    /// Creates an idle bob.
    #[must_use]
    pub const fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
            timer: 0.0,
            active: false,
        }
    }

    /// Advances the bob. After movement stops it finishes the current
    /// half-cycle and comes to rest at zero offset.
    pub fn update(&mut self, dt: f32, moving: bool) {
        if moving {
            self.timer += dt;
            self.active = true;
        } else if self.active {
            let half_cycle = PI / self.frequency;
            let rest = (self.timer / half_cycle).ceil().max(1.0) * half_cycle;
            self.timer = (self.timer + dt).min(rest);
            if self.timer >= rest {
                self.timer = 0.0;
                self.active = false;
            }
        }
    }

    /// Current vertical offset.
    #[must_use]
    pub fn offset(&self) -> f32 {
        if self.active {
            (self.timer * self.frequency).sin() * self.amplitude
        } else {
            0.0
        }
    }

    /// True while bobbing or settling.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

/// First-person controller state.
#[derive(Clone, Debug)]
pub struct CharacterController {
    config: MovementConfig,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    vertical_velocity: f32,
    grounded: bool,
    coyote_timer: f32,
    jump_requested: bool,
    sprinting: bool,
    last_flags: CollisionFlags,
    head_bob: HeadBob,
}

impl CharacterController {
    /// Creates a controller at `position` (capsule centre).
    #[must_use]
    pub fn new(config: MovementConfig, position: Vec3) -> Self {
        Self {
            position,
            yaw: config.start_yaw,
            pitch: config.start_pitch,
            vertical_velocity: 0.0,
            grounded: false,
            coyote_timer: 0.0,
            jump_requested: false,
            sprinting: false,
            last_flags: CollisionFlags::NONE,
            head_bob: HeadBob::new(config.head_bob_amplitude, config.head_bob_frequency),
            config,
        }
    }

    /// Runs one movement step.
    ///
    /// Order: gravity, jump (consuming the request), the grounded clamp,
    /// horizontal intent, sweep, then grounded bookkeeping from the
    /// collision result.
    pub fn update<M: CharacterMotor>(
        &mut self,
        motor: &mut M,
        input: &MovementInput,
        world: ActiveWorld,
        dt: f32,
    ) -> CollisionFlags {
        if input.jump {
            self.jump_requested = true;
        }

        self.vertical_velocity += self.config.gravity * dt;

        let can_jump = self.grounded || self.coyote_timer > 0.0;
        if std::mem::take(&mut self.jump_requested) && can_jump {
            self.vertical_velocity = self.config.jump_impulse;
            self.grounded = false;
            self.coyote_timer = 0.0;
            trace!(velocity = self.vertical_velocity, "jump");
        }
        if self.grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = 0.0;
        }

        let view = self.view_vectors();
        let flat_forward = Vec3::new(view.forward.x, 0.0, view.forward.z).normalize_or_zero();
        let flat_right = Vec3::new(view.right.x, 0.0, view.right.z).normalize_or_zero();

        let mut direction = Vec3::ZERO;
        if input.forward {
            direction += flat_forward;
        }
        if input.backward {
            direction -= flat_forward;
        }
        if input.right {
            direction += flat_right;
        }
        if input.left {
            direction -= flat_right;
        }
        let speed = if self.sprinting {
            self.config.sprint_speed
        } else {
            self.config.walk_speed
        };
        let horizontal = direction.normalize_or_zero() * speed;

        let displacement = Vec3::new(horizontal.x, self.vertical_velocity, horizontal.z) * dt;
        let flags = motor.sweep_move(displacement, CollisionFilter::character(world), dt);
        self.position = motor.position();
        self.last_flags = flags;

        if flags.has(CollisionFlags::DOWN) {
            self.grounded = true;
            self.coyote_timer = self.config.coyote_time;
            self.vertical_velocity = self.vertical_velocity.max(0.0);
        } else {
            self.grounded = false;
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }
        if flags.has(CollisionFlags::UP) && self.vertical_velocity > 0.0 {
            self.vertical_velocity = 0.0;
        }

        self.head_bob.update(dt, input.is_moving() && self.grounded);
        flags
    }

    /// Applies a mouse delta (pixels; positive `dy` looks up).
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.config.mouse_sensitivity;
        self.pitch = (self.pitch + dy * self.config.mouse_sensitivity)
            .clamp(-self.config.pitch_limit, self.config.pitch_limit);
    }

    /// Sets the view angles directly (degrees).
    pub fn set_angles(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-self.config.pitch_limit, self.config.pitch_limit);
    }

    /// Queues a jump for the next update.
    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    /// Selects sprint or walk speed.
    pub fn set_sprinting(&mut self, sprinting: bool) {
        self.sprinting = sprinting;
    }

    /// Moves the controller without sweeping and clears vertical motion.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.vertical_velocity = 0.0;
        self.grounded = false;
        self.coyote_timer = 0.0;
        self.jump_requested = false;
    }

    /// Camera basis.
    #[must_use]
    pub fn view_vectors(&self) -> ViewVectors {
        ViewVectors::from_angles(self.yaw, self.pitch)
    }

    /// Look direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.view_vectors().forward
    }

    /// Capsule centre after the last update.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Camera position including head-bob.
    #[must_use]
    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Y * self.head_bob.offset()
    }

    /// Right-handed view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        let view = self.view_vectors();
        Mat4::look_to_rh(self.eye_position(), view.forward, view.up)
    }

    /// Perspective projection for `aspect` (width / height).
    #[must_use]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.config.field_of_view.to_radians(),
            aspect.max(f32::EPSILON),
            self.config.near_plane,
            self.config.far_plane,
        )
    }

    /// Projection times view.
    #[must_use]
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Yaw in degrees.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees.
    #[must_use]
    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current vertical velocity.
    #[must_use]
    pub const fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Standing on something after the last sweep.
    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Remaining coyote window; zero once it has run out.
    #[must_use]
    pub const fn coyote_timer(&self) -> f32 {
        self.coyote_timer
    }

    /// Moving at sprint speed.
    #[must_use]
    pub const fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    /// Flags from the last sweep.
    #[must_use]
    pub const fn last_flags(&self) -> CollisionFlags {
        self.last_flags
    }

    /// Head-bob state.
    #[must_use]
    pub const fn head_bob(&self) -> &HeadBob {
        &self.head_bob
    }
}

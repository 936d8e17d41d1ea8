//! # World Transition
//!
//! Owns the active world. A switch is a timed cross-fade: the overlay
//! ramps to opaque, the world flips once at the midpoint, then the overlay
//! ramps back out. Movement is blocked for the whole fade.
//!
//! ```text
//! alpha
//!   1 ┤     ╱╲
//!     │    ╱  ╲____
//!   0 ┼───╱        ╲───
//!     0  mid       duration
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use doppel_shared::constants::{BLOOM_HEAL, MIN_SWITCH_CHARGE, TRANSITION_DURATION, TRANSITION_MIDPOINT};
use doppel_shared::ActiveWorld;

use crate::collaborators::{AudioSink, SoundCue};
use crate::player_state::PlayerState;

/// Cross-fade tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Total fade length in seconds.
    pub duration: f32,
    /// Seconds into the fade at which the world flips.
    pub midpoint: f32,
    /// Health restored on arriving in bloom.
    pub bloom_heal: f32,
    /// Charge required to start a switch.
    pub min_charge: f32,
    /// World the game starts in.
    pub initial_world: ActiveWorld,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: TRANSITION_DURATION,
            midpoint: TRANSITION_MIDPOINT,
            bloom_heal: BLOOM_HEAL,
            min_charge: MIN_SWITCH_CHARGE,
            initial_world: ActiveWorld::Dither,
        }
    }
}

/// Fade progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionPhase {
    /// No fade running.
    Idle,
    /// Fade running.
    Fading {
        /// Seconds since the fade began.
        elapsed: f32,
        /// Whether the world has flipped yet.
        flipped: bool,
    },
}

/// What one tick of the fade did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransitionTick {
    /// Overlay opacity after this tick.
    pub alpha: f32,
    /// New world if the flip happened this tick.
    pub flipped: Option<ActiveWorld>,
    /// True on the tick the fade completed.
    pub finished: bool,
}

/// Single source of truth for the active world.
#[derive(Clone, Debug)]
pub struct WorldTransitionController {
    config: TransitionConfig,
    world: ActiveWorld,
    phase: TransitionPhase,
    alpha: f32,
}

impl WorldTransitionController {
    /// Creates an idle controller in the configured starting world.
    #[must_use]
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            world: config.initial_world,
            phase: TransitionPhase::Idle,
            alpha: 0.0,
            config,
        }
    }

    /// World the game is in.
    #[must_use]
    pub const fn active_world(&self) -> ActiveWorld {
        self.world
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// True while a fade runs.
    #[must_use]
    pub const fn is_fading(&self) -> bool {
        matches!(self.phase, TransitionPhase::Fading { .. })
    }

    /// Player movement is frozen during a fade.
    #[must_use]
    pub const fn blocks_movement(&self) -> bool {
        self.is_fading()
    }

    /// Overlay opacity.
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// True if a switch may start now.
    #[must_use]
    pub fn can_begin(&self, remote_held: bool, charge: f32) -> bool {
        !self.is_fading() && remote_held && charge >= self.config.min_charge
    }

    /// Starts a fade if the player holds the remote with enough charge and
    /// no fade is already running.
    pub fn try_begin(&mut self, remote_held: bool, charge: f32, audio: &mut dyn AudioSink) -> bool {
        if !self.can_begin(remote_held, charge) {
            return false;
        }
        self.phase = TransitionPhase::Fading {
            elapsed: 0.0,
            flipped: false,
        };
        audio.play(SoundCue::WorldSwitch, SoundCue::WorldSwitch.default_volume());
        info!(from = ?self.world, "world transition started");
        true
    }

    /// Advances the fade. The flip happens exactly once, even if `dt` skips
    /// past both the midpoint and the end.
    pub fn tick(&mut self, dt: f32, player: &mut PlayerState) -> TransitionTick {
        let TransitionPhase::Fading { elapsed, flipped } = self.phase else {
            self.alpha = 0.0;
            return TransitionTick::default();
        };

        let elapsed = elapsed + dt;
        let mut result = TransitionTick::default();

        let mut flipped_now = flipped;
        if !flipped && elapsed >= self.config.midpoint {
            self.world = self.world.toggled();
            flipped_now = true;
            result.flipped = Some(self.world);
            if self.world.is_bloom() {
                player.heal(self.config.bloom_heal);
            }
            info!(world = ?self.world, health = player.health(), "world switched");
        }

        if elapsed >= self.config.duration {
            self.phase = TransitionPhase::Idle;
            self.alpha = 0.0;
            result.finished = true;
        } else {
            self.phase = TransitionPhase::Fading {
                elapsed,
                flipped: flipped_now,
            };
            self.alpha = self.fade_alpha(elapsed);
        }
        result.alpha = self.alpha;
        result
    }

    /// Overlay opacity `elapsed` seconds into a fade.
    #[must_use]
    pub fn fade_alpha(&self, elapsed: f32) -> f32 {
        let (mid, end) = (self.config.midpoint, self.config.duration);
        let alpha = if elapsed < mid {
            elapsed / mid
        } else {
            (end - elapsed) / (end - mid)
        };
        alpha.clamp(0.0, 1.0)
    }

    /// Returns to the starting world with no fade (level restart).
    pub fn reset(&mut self) {
        self.world = self.config.initial_world;
        self.phase = TransitionPhase::Idle;
        self.alpha = 0.0;
    }
}

//! # Game Configuration
//!
//! One TOML document, one section per subsystem. Every field has a default,
//! so an empty file (or no file) plays with the stock tuning.
//!
//! ```toml
//! [movement]
//! sprint_speed = 4.0
//!
//! [transition]
//! duration = 1.5
//! midpoint = 0.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use doppel_physics::PhysicsConfig;

use crate::character::MovementConfig;
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::hazard::HazardConfig;
use crate::hud::HudConfig;
use crate::interaction::InteractionConfig;
use crate::level::LevelConfig;
use crate::player_state::PlayerConfig;
use crate::transition::TransitionConfig;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parse but contradict each other.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Gameplay event queue bound.
    pub event_capacity: usize,
    /// Physics scene and capsule.
    pub physics: PhysicsConfig,
    /// Character movement and camera.
    pub movement: MovementConfig,
    /// Player resources.
    pub player: PlayerConfig,
    /// Pickup and throw.
    pub interaction: InteractionConfig,
    /// World cross-fade.
    pub transition: TransitionConfig,
    /// Water, altitude and fall rules.
    pub hazards: HazardConfig,
    /// Instruction text and close-ups.
    pub hud: HudConfig,
    /// Level layout.
    pub level: LevelConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            physics: PhysicsConfig::default(),
            movement: MovementConfig::default(),
            player: PlayerConfig::default(),
            interaction: InteractionConfig::default(),
            transition: TransitionConfig::default(),
            hazards: HazardConfig::default(),
            hud: HudConfig::default(),
            level: LevelConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`GameConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Serializes to pretty TOML (for writing a template).
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.transition;
        if !(t.midpoint > 0.0 && t.midpoint < t.duration) {
            return Err(ConfigError::Invalid(format!(
                "transition midpoint {} must lie inside (0, {})",
                t.midpoint, t.duration
            )));
        }

        let p = &self.player;
        if p.max_health <= 0.0 || p.max_stamina <= 0.0 || p.max_remote_charge <= 0.0 {
            return Err(ConfigError::Invalid("player maxima must be positive".into()));
        }
        if p.damage_interval <= 0.0 || p.drain_interval <= 0.0 {
            return Err(ConfigError::Invalid("cooldown intervals must be positive".into()));
        }

        let m = &self.movement;
        if !(m.pitch_limit > 0.0 && m.pitch_limit < 90.0) {
            return Err(ConfigError::Invalid(format!(
                "pitch limit {} must lie inside (0, 90)",
                m.pitch_limit
            )));
        }
        if m.walk_speed < 0.0 || m.sprint_speed < m.walk_speed {
            return Err(ConfigError::Invalid("sprint speed must be at least walk speed".into()));
        }

        if self.interaction.pickup_radius <= 0.0 || self.interaction.pick_ray_length <= 0.0 {
            return Err(ConfigError::Invalid("pickup reach must be positive".into()));
        }

        let b = &self.level.bounds;
        if b.min_x >= b.max_x || b.min_z >= b.max_z {
            return Err(ConfigError::Invalid("level bounds are inverted".into()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event capacity must be positive".into()));
        }
        Ok(())
    }
}

//! # Game Error Types
//!
//! Startup failures. Gameplay terminal states (death, falling, winning) are
//! not errors; they travel through `TickOutcome` and the state machine.

use thiserror::Error;

use doppel_physics::PhysicsError;

use crate::assets::AssetError;
use crate::config::ConfigError;

/// Errors that can occur while setting up or restarting a game.
#[derive(Error, Debug)]
pub enum GameError {
    /// A required asset could not be loaded.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// The configuration is unreadable or inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A physics handle was used outside the scene that owns it.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Result type for game setup.
pub type GameResult<T> = Result<T, GameError>;

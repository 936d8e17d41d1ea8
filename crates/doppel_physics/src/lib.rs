//! # DOPPEL Physics
//!
//! Rapier-backed physics scene shared by the bloom and dither worlds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  BodyId   ┌──────────────┐  rapier   ┌──────────────┐
//! │   gameplay   │──────────>│ PhysicsScene │──────────>│   pipeline   │
//! │ (doppel)     │<──────────│  body arena  │<──────────│  + queries   │
//! └──────────────┘  events   └──────────────┘  channel  └──────────────┘
//! ```
//!
//! Both worlds live in the same simulation. Which shapes meet is decided
//! purely by the `(group, mask)` filter of each collider.

#![deny(unsafe_code)]

pub mod body;
pub mod character;
mod convert;
pub mod error;
pub mod scene;
pub mod trigger;

pub use body::{BodyId, BodyKind, BodyTag};
pub use character::{CharacterConfig, CharacterId, CharacterMotor, CollisionFlags, SceneMotor};
pub use error::{PhysicsError, PhysicsResult};
pub use scene::{LevelBounds, PhysicsConfig, PhysicsScene, RaycastHit};
pub use trigger::{TriggerEvent, TriggerListener};

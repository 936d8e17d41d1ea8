//! # DOPPEL
//!
//! Gameplay runtime for a first-person game played in two overlapping
//! worlds: a dithered one and a bloom-lit one.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              HOST LOOP                                  │
//! │   window, input plumbing, GPU, audio device, GameStateMachine           │
//! └───────────────┬───────────────────────────────────▲─────────────────────┘
//!                 │ InputFrame, dt                    │ RenderFrame, HudSnapshot,
//!                 ▼                                   │ SoundCue, GameEvent
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Game::tick                                │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │ InputTracker │  │  Character   │  │ Interaction  │  │ HudDirector │  │
//! │  │ edges, mouse │─>│  Controller  │  │ pickup/throw │  │ instruction │  │
//! │  └──────────────┘  └──────┬───────┘  └──────┬───────┘  └─────────────┘  │
//! │                           │                 │                           │
//! │  ┌──────────────┐  ┌──────▼─────────────────▼───────┐  ┌─────────────┐  │
//! │  │  Transition  │─>│   PhysicsScene (one world,     │  │ PlayerState │  │
//! │  │ active world │  │   two filters) + EntityStore   │  │  + Hazards  │  │
//! │  └──────────────┘  └────────────────────────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `assets`: mesh source trait and the box-built stock level
//! - `character`: first-person movement, grounding and camera
//! - `collaborators`: audio, HUD and render sink traits
//! - `config`: TOML configuration
//! - `entity`: render objects bound to physics bodies
//! - `events`: gameplay notifications for presentation layers
//! - `game_loop`: per-frame orchestration
//! - `game_state`: session state machine
//! - `hazard`: water, altitude and fall rules
//! - `hud`: instruction precedence and close-ups
//! - `input`: key edges and mouse deltas
//! - `interaction`: pickup, inventory and throw
//! - `level`: level construction
//! - `player_state`: health, stamina and remote charge
//! - `transition`: the cross-fade between worlds

#![deny(unsafe_code)]

pub mod assets;
pub mod character;
pub mod collaborators;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod game_loop;
pub mod game_state;
pub mod hazard;
pub mod hud;
pub mod input;
pub mod interaction;
pub mod level;
pub mod player_state;
pub mod transition;

// Re-export the lower layers
pub use doppel_physics as physics;
pub use doppel_shared as shared;

// Re-export commonly used types
pub use assets::{AssetError, AssetSource, LoadedMesh, ProceduralAssets};
pub use character::{CharacterController, MovementConfig, MovementInput};
pub use collaborators::{
    AudioSink, Collaborators, HudSink, InstanceData, LightParams, NullAudio, NullHud, NullRenderer, RecordingAudio,
    RecordingHud, RecordingRenderer, RenderFrame, RenderPass, SoundCue,
};
pub use config::{ConfigError, GameConfig};
pub use entity::{BodyType, EntityDesc, EntityId, EntityKind, EntityStore, RenderObject};
pub use error::{GameError, GameResult};
pub use events::{EventBus, EventReceiver, EventSender, GameEvent};
pub use game_loop::{FrameClock, FrameStats, FrameStatsAccumulator, Game, TickOutcome};
pub use game_state::{GameOverReason, GameState, GameStateMachine};
pub use hazard::{HazardConfig, HazardSide, HazardSystem, WaterHazard};
pub use hud::{CloseUp, HudConfig, HudDirector, HudSnapshot, Instruction};
pub use input::{InputFrame, InputState, InputTracker, Key};
pub use interaction::{InteractionConfig, InteractionSystem, Inventory, PickupOutcome, ThrowOutcome};
pub use level::{Level, LevelConfig};
pub use player_state::{Cooldown, PlayerConfig, PlayerState};
pub use transition::{TransitionConfig, TransitionPhase, WorldTransitionController};

//! # Collaborator Contracts
//!
//! The core never draws, plays sound, or lays out text itself. Each frame it
//! hands plain data to three sinks supplied by the host:
//!
//! ```text
//! Game::tick ──RenderFrame──> RenderPass
//!            ──HudSnapshot──> HudSink
//!            ──SoundCue─────> AudioSink
//! ```
//!
//! Null and recording implementations live here for headless runs and tests.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use doppel_shared::ActiveWorld;

use crate::hud::HudSnapshot;

// =============================================================================
// AUDIO
// =============================================================================

/// Sound effects the core can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// An item went into the inventory.
    Pickup,
    /// A world transition started.
    WorldSwitch,
    /// The player took hazard damage.
    Damage,
}

impl SoundCue {
    /// Playback volume used by the game.
    #[must_use]
    pub const fn default_volume(self) -> f32 {
        match self {
            Self::Pickup => 0.3,
            Self::WorldSwitch => 0.2,
            Self::Damage => 0.05,
        }
    }
}

/// Fire-and-forget sound playback.
pub trait AudioSink {
    /// Plays `cue` once.
    fn play(&mut self, cue: SoundCue, volume: f32);
}

/// Discards every cue.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue, _volume: f32) {}
}

/// Remembers every cue (tests and the headless driver).
#[derive(Debug, Default)]
pub struct RecordingAudio {
    /// Cues in request order.
    pub played: Vec<(SoundCue, f32)>,
}

impl RecordingAudio {
    /// How many times `cue` was played.
    #[must_use]
    pub fn count(&self, cue: SoundCue) -> usize {
        self.played.iter().filter(|(c, _)| *c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue, volume: f32) {
        self.played.push((cue, volume));
    }
}

// =============================================================================
// HUD
// =============================================================================

/// Receives the HUD state once per frame.
pub trait HudSink {
    /// Shows `snapshot`.
    fn present(&mut self, snapshot: &HudSnapshot);
}

/// Discards every snapshot.
#[derive(Debug, Default)]
pub struct NullHud;

impl HudSink for NullHud {
    fn present(&mut self, _snapshot: &HudSnapshot) {}
}

/// Keeps the latest snapshot.
#[derive(Debug, Default)]
pub struct RecordingHud {
    /// Most recent snapshot.
    pub last: Option<HudSnapshot>,
    /// Snapshots received.
    pub frames: u64,
}

impl HudSink for RecordingHud {
    fn present(&mut self, snapshot: &HudSnapshot) {
        self.last = Some(snapshot.clone());
        self.frames += 1;
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// Per-instance data for the renderer.
///
/// `#[repr(C)]` + Pod so the host can upload the slice directly.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceData {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// Mesh handle.
    pub mesh: u32,
    /// Raw world mask.
    pub world_mask: u32,
    /// Entity kind discriminant.
    pub kind: u32,
    /// Padding to 16-byte multiple.
    pub _pad: u32,
}

/// Directional light and ambient term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    /// Direction the light travels.
    pub direction: Vec3,
    /// Light colour.
    pub color: Vec3,
    /// Ambient intensity.
    pub ambient: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, -0.2).normalize(),
            color: Vec3::ONE,
            ambient: 0.25,
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderFrame<'a> {
    /// Instances visible in the active world.
    pub instances: &'a [InstanceData],
    /// Subset drawn into the shadow map.
    pub shadow_casters: &'a [InstanceData],
    /// Camera view-projection.
    pub view_projection: Mat4,
    /// Camera position.
    pub camera_position: Vec3,
    /// Scene light.
    pub light: LightParams,
    /// World being drawn; selects the post-process.
    pub active_world: ActiveWorld,
    /// Cross-fade overlay opacity in `[0, 1]`.
    pub overlay_alpha: f32,
    /// Camera below the water line.
    pub underwater: bool,
}

/// Draws one frame.
pub trait RenderPass {
    /// Renders `frame`.
    fn draw(&mut self, frame: &RenderFrame<'_>);
}

/// Draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RenderPass for NullRenderer {
    fn draw(&mut self, _frame: &RenderFrame<'_>) {}
}

/// Counts frames and remembers the last frame's summary.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// Frames drawn.
    pub frames: u64,
    /// Instance count of the last frame.
    pub last_instances: usize,
    /// World of the last frame.
    pub last_world: Option<ActiveWorld>,
    /// Overlay alpha of the last frame.
    pub last_alpha: f32,
}

impl RenderPass for RecordingRenderer {
    fn draw(&mut self, frame: &RenderFrame<'_>) {
        self.frames += 1;
        self.last_instances = frame.instances.len();
        self.last_world = Some(frame.active_world);
        self.last_alpha = frame.overlay_alpha;
    }
}

// =============================================================================
// BUNDLE
// =============================================================================

/// The three sinks borrowed for one tick.
pub struct Collaborators<'a> {
    /// Sound output.
    pub audio: &'a mut dyn AudioSink,
    /// HUD output.
    pub hud: &'a mut dyn HudSink,
    /// Frame output.
    pub render: &'a mut dyn RenderPass,
}

impl<'a> Collaborators<'a> {
    /// Bundles the sinks.
    pub fn new(audio: &'a mut dyn AudioSink, hud: &'a mut dyn HudSink, render: &'a mut dyn RenderPass) -> Self {
        Self { audio, hud, render }
    }
}

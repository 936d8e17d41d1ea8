//! # HUD Director
//!
//! Decides which instruction line to show and which close-up preview is on
//! screen. Layout and drawing belong to the host's [`crate::HudSink`].

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use doppel_shared::ActiveWorld;

use crate::player_state::PlayerState;

/// Instruction line shown at the bottom of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Near the remote.
    PickUpRemote,
    /// Remote close-up on screen.
    UseRemote,
    /// Near the note.
    PickUpNote,
    /// Note close-up on screen.
    HideNote,
    /// Standing at the pit in the dither world.
    DropRemoteInPit,
}

impl Instruction {
    /// Text for the instruction.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::PickUpRemote => "Press [E] to pick up the remote",
            Self::UseRemote => "Picked up remote. Press [LMB] to use",
            Self::PickUpNote => "Press [E] to pick up the note",
            Self::HideNote => "Press [ENTER] to hide the note",
            Self::DropRemoteInPit => "Press [F] to drop the remote into the pit",
        }
    }
}

/// Held item previewed in front of the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloseUp {
    /// The remote, spinning.
    Remote,
    /// The note, facing the camera.
    Note,
}

/// HUD tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Seconds the remote close-up stays up.
    pub remote_close_up_secs: f32,
    /// Seconds the note close-up stays up unless dismissed.
    pub note_close_up_secs: f32,
    /// Distance of the close-up from the camera.
    pub close_up_distance: f32,
    /// Horizontal centre of the pit zone (x, z).
    pub pit_centre: Vec2,
    /// Radius of the pit zone.
    pub pit_radius: f32,
    /// Lowest camera height counted as standing at the pit.
    pub pit_min_y: f32,
    /// Highest camera height counted as standing at the pit.
    pub pit_max_y: f32,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            remote_close_up_secs: 3.0,
            note_close_up_secs: 20.0,
            close_up_distance: 0.2,
            pit_centre: Vec2::new(29.0, 17.0),
            pit_radius: 5.0,
            pit_min_y: -3.0,
            pit_max_y: 3.0,
        }
    }
}

/// Facts the instruction selection depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudContext {
    /// The remote could be picked up right now.
    pub near_remote: bool,
    /// The note could be picked up right now.
    pub near_note: bool,
    /// Active world.
    pub world: ActiveWorld,
    /// Player position.
    pub player: Vec3,
}

/// Everything the HUD sink draws for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HudSnapshot {
    /// Health and its cap.
    pub health: (f32, f32),
    /// Stamina and its cap.
    pub stamina: (f32, f32),
    /// Remote charge and its cap.
    pub remote_charge: (f32, f32),
    /// Remote held.
    pub remote_in_inventory: bool,
    /// Note held.
    pub note_in_inventory: bool,
    /// Instruction line.
    pub instruction: Option<Instruction>,
    /// Whether the instruction line is drawn.
    pub show: bool,
    /// Close-up currently shown.
    pub close_up: Option<CloseUp>,
    /// Fade overlay opacity.
    pub overlay_alpha: f32,
    /// Camera under water.
    pub underwater: bool,
    /// World being shown.
    pub world: ActiveWorld,
}

impl HudSnapshot {
    /// Instruction text, if any.
    #[must_use]
    pub fn instruction_text(&self) -> Option<&'static str> {
        self.instruction.map(Instruction::text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveCloseUp {
    kind: CloseUp,
    remaining: f32,
}

/// Close-up timers and instruction precedence.
#[derive(Clone, Debug, Default)]
pub struct HudDirector {
    config: HudConfig,
    close_up: Option<ActiveCloseUp>,
}

impl HudDirector {
    /// Creates a director with nothing on screen.
    #[must_use]
    pub fn new(config: HudConfig) -> Self {
        Self { config, close_up: None }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &HudConfig {
        &self.config
    }

    /// Shows a close-up, replacing any current one.
    pub fn show_close_up(&mut self, kind: CloseUp) {
        let remaining = match kind {
            CloseUp::Remote => self.config.remote_close_up_secs,
            CloseUp::Note => self.config.note_close_up_secs,
        };
        self.close_up = Some(ActiveCloseUp { kind, remaining });
    }

    /// Hides the close-up if it is `kind`.
    pub fn hide_close_up(&mut self, kind: CloseUp) {
        if self.close_up() == Some(kind) {
            self.close_up = None;
        }
    }

    /// Hides the note close-up. Returns false if it was not shown.
    pub fn dismiss_note(&mut self) -> bool {
        let shown = self.close_up() == Some(CloseUp::Note);
        self.hide_close_up(CloseUp::Note);
        shown
    }

    /// Close-up currently shown.
    #[must_use]
    pub fn close_up(&self) -> Option<CloseUp> {
        self.close_up.map(|c| c.kind)
    }

    /// Expires close-ups.
    pub fn tick(&mut self, dt: f32) {
        if let Some(active) = &mut self.close_up {
            active.remaining -= dt;
            if active.remaining <= 0.0 {
                self.close_up = None;
            }
        }
    }

    /// True if `player` stands inside the pit zone.
    #[must_use]
    pub fn in_pit_zone(&self, player: Vec3) -> bool {
        let horizontal = Vec2::new(player.x, player.z).distance(self.config.pit_centre);
        horizontal < self.config.pit_radius && (self.config.pit_min_y..=self.config.pit_max_y).contains(&player.y)
    }

    /// Picks the single instruction to show.
    ///
    /// Remote prompts beat note prompts, which beat the pit hint.
    #[must_use]
    pub fn select_instruction(&self, ctx: &HudContext) -> Option<Instruction> {
        let close_up = self.close_up();
        if close_up == Some(CloseUp::Remote) {
            Some(Instruction::UseRemote)
        } else if ctx.near_remote {
            Some(Instruction::PickUpRemote)
        } else if close_up == Some(CloseUp::Note) {
            Some(Instruction::HideNote)
        } else if ctx.near_note {
            Some(Instruction::PickUpNote)
        } else if !ctx.world.is_bloom() && self.in_pit_zone(ctx.player) {
            Some(Instruction::DropRemoteInPit)
        } else {
            None
        }
    }

    /// Builds the frame's HUD data.
    #[must_use]
    pub fn snapshot(
        &self,
        player: &PlayerState,
        instruction: Option<Instruction>,
        world: ActiveWorld,
        overlay_alpha: f32,
        underwater: bool,
    ) -> HudSnapshot {
        let config = player.config();
        HudSnapshot {
            health: (player.health(), config.max_health),
            stamina: (player.stamina(), config.max_stamina),
            remote_charge: (player.remote_charge(), config.max_remote_charge),
            remote_in_inventory: player.has_remote(),
            note_in_inventory: player.has_note(),
            instruction,
            show: instruction.is_some(),
            close_up: self.close_up(),
            overlay_alpha,
            underwater,
            world,
        }
    }
}

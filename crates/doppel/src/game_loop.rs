//! # Doppel Game Loop
//!
//! One call to [`Game::tick`] advances the run by one frame:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. TIMING          clamp dt, resume on a pause edge                  │
//! │ 2. AMBIENT         idle hover of untouched items, bloom water rise   │
//! │ 3. RENDER          draw with the transforms of frame N-1             │
//! │ 4. TRANSITION      advance the fade, flip the world at the midpoint  │
//! │ 5. HUD             instruction line, close-up placement              │
//! │ 6. INPUT           look, pickup, throw, remote, note, sprint, pause  │
//! │ 7. CHARACTER       sweep the capsule, resources, transform sync      │
//! │ 8. HAZARDS         water damage, remote drain and recharge           │
//! │ 9. TERMINAL        death or fall ends the tick                       │
//! │ 10. PHYSICS        step the scene, pressure plate wins the run       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The active world is owned by [`WorldTransitionController`] and read once
//! per phase; nothing else stores it.

use std::time::{Duration, Instant};

use glam::{Quat, Vec3};
use tracing::{debug, info, warn};

use doppel_physics::{CharacterId, PhysicsScene, TriggerEvent};
use doppel_shared::constants::{IDLE_BOB_AMPLITUDE, IDLE_BOB_SPEED, MAX_FRAME_DELTA};
use doppel_shared::{ActiveWorld, CollisionFilter};

use crate::assets::AssetSource;
use crate::character::{CharacterController, MovementInput};
use crate::collaborators::{Collaborators, LightParams, RenderFrame};
use crate::config::GameConfig;
use crate::entity::{is_simulated, EntityId, EntityKind, EntityStore};
use crate::error::GameResult;
use crate::events::{EventBus, EventReceiver, GameEvent};
use crate::game_state::{GameOverReason, GameState, GameStateMachine};
use crate::hazard::{HazardProbe, HazardSystem};
use crate::hud::{CloseUp, HudContext, HudDirector};
use crate::input::{InputFrame, InputState, InputTracker, Key};
use crate::interaction::{InteractionContext, InteractionSystem, PickupOutcome, ThrowOutcome};
use crate::level::Level;
use crate::player_state::PlayerState;
use crate::transition::WorldTransitionController;

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Close-up spin rate in radians per second.
const CLOSE_UP_SPIN: f32 = 1.5;

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The run goes on.
    Continue,
    /// Nothing ran: the session is not in `Playing`.
    Suspended,
    /// The remote reached the pressure plate this tick.
    Won,
    /// The run ended this tick.
    Halted(GameOverReason),
}

// =============================================================================
// TIMING
// =============================================================================

/// Wall-clock delta source for hosts that do not supply their own.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Instant,
    max_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DELTA)
    }
}

impl FrameClock {
    /// Starts the clock now.
    #[must_use]
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: Instant::now(),
            max_delta,
        }
    }

    /// Seconds since the previous call, clamped so a stall does not launch
    /// the character through the floor.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        delta.min(self.max_delta)
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Time spent inside [`Game::tick`] in microseconds.
    pub tick_us: u64,
    /// Frame number.
    pub frame: u64,
    /// Events emitted this frame.
    pub events_emitted: u32,
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of tick times.
    pub tick_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            tick_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.tick_us_sum += stats.tick_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the percentage of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary of the statistics.
    pub fn log_summary(&self) {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };
        info!(
            frames = self.frames_recorded,
            avg_ms = self.avg_frame_ms(),
            avg_fps = self.avg_fps(),
            min_ms,
            max_ms = self.max_frame_us as f64 / 1000.0,
            over_budget = self.frames_over_budget,
            over_budget_pct = self.over_budget_ratio() * 100.0,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// GAME
// =============================================================================

/// A running level: scene, entities, player and every gameplay system.
///
/// The session state lives outside, in the host's [`GameStateMachine`].
pub struct Game {
    config: GameConfig,
    scene: PhysicsScene,
    entities: EntityStore,
    level: Level,
    character: CharacterId,
    controller: CharacterController,
    player: PlayerState,
    interaction: InteractionSystem,
    transition: WorldTransitionController,
    hazards: HazardSystem,
    hud: HudDirector,
    input: InputTracker,
    events: EventBus,
    light: LightParams,
    aspect: f32,
    elapsed: f32,
    bloom_water_height: f32,
    dither_water_height: f32,
    underwater: bool,
    frame: u64,
}

impl Game {
    /// Validates `config` and builds the level.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GameError::Config`] for an inconsistent
    /// configuration and [`crate::GameError::Asset`] if the level cannot
    /// be loaded.
    pub fn new(config: GameConfig, assets: &mut dyn AssetSource) -> GameResult<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_capacity);
        Self::build(config, assets, events)
    }

    fn build(config: GameConfig, assets: &mut dyn AssetSource, events: EventBus) -> GameResult<Self> {
        let mut scene = PhysicsScene::new(config.physics.clone());
        let mut entities = EntityStore::new();
        let level = Level::build(&config.level, assets, &mut scene, &mut entities)?;

        let transition = WorldTransitionController::new(config.transition.clone());
        let start = config.level.player_start;
        let character =
            scene.create_character_controller(start, CollisionFilter::character(transition.active_world()));

        info!(
            world = ?transition.active_world(),
            x = start.x,
            y = start.y,
            z = start.z,
            "game ready"
        );
        Ok(Self {
            controller: CharacterController::new(config.movement.clone(), start),
            player: PlayerState::new(config.player.clone()),
            interaction: InteractionSystem::new(config.interaction.clone()),
            hazards: HazardSystem::new(config.hazards.clone()),
            hud: HudDirector::new(config.hud.clone()),
            input: InputTracker::new(),
            light: LightParams::default(),
            aspect: 16.0 / 9.0,
            elapsed: 0.0,
            bloom_water_height: config.level.bloom_water_height,
            dither_water_height: config.level.dither_water_height,
            underwater: false,
            frame: 0,
            scene,
            entities,
            level,
            character,
            transition,
            events,
            config,
        })
    }

    /// Rebuilds the level from scratch with the same configuration.
    ///
    /// Event receivers handed out earlier stay connected.
    ///
    /// # Errors
    ///
    /// Same as [`Game::new`].
    pub fn restart(&mut self, assets: &mut dyn AssetSource) -> GameResult<()> {
        *self = Self::build(self.config.clone(), assets, self.events.clone())?;
        info!("level restarted");
        Ok(())
    }

    /// Advances the run by one frame.
    ///
    /// Does nothing but watch for the resume key unless `state` is
    /// [`GameState::Playing`].
    pub fn tick(
        &mut self,
        dt: f32,
        frame: &InputFrame,
        sinks: &mut Collaborators<'_>,
        state: &mut GameStateMachine,
    ) -> TickOutcome {
        let input = self.input.update(frame);

        // 1. Timing
        if state.state() == GameState::Paused && input.pressed(Key::Pause) && state.resume() {
            self.emit(GameEvent::Resumed);
            return TickOutcome::Suspended;
        }
        if !state.is_playing() {
            return TickOutcome::Suspended;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DELTA);
        self.elapsed += dt;
        self.frame += 1;

        // 2. Ambient animation
        self.animate_ambient(dt);

        // 3. Render with last frame's transforms
        self.render(sinks);

        // 4. Transition
        let fade = self.transition.tick(dt, &mut self.player);
        if let Some(world) = fade.flipped {
            if let Err(e) = self
                .scene
                .set_character_filter(self.character, CollisionFilter::character(world))
            {
                warn!(error = %e, "character filter not updated on world switch");
            }
            self.emit(GameEvent::WorldSwitched { world });
        }

        // 5. HUD
        self.hud.tick(dt);
        self.place_close_ups();
        self.present_hud(sinks);

        // 6. Input
        if input.pressed(Key::Pause) && state.pause() {
            self.emit(GameEvent::Paused);
            return TickOutcome::Suspended;
        }
        self.handle_input(&input, sinks);

        // 7. Character
        self.step_character(&input, dt);

        // 8. Hazards
        self.apply_hazards(dt, sinks);

        // 9. Terminal conditions
        if let Some(reason) = self.hazards.check_terminal(&self.player, self.controller.position().y) {
            if state.game_over(reason) {
                info!(?reason, frame = self.frame, "game over");
                self.emit(GameEvent::GameOver { reason });
            }
            return TickOutcome::Halted(reason);
        }

        // 10. Physics
        let mut outcome = TickOutcome::Continue;
        for trigger in self.scene.step(dt) {
            if let TriggerEvent::RemoteOnPlate { .. } = trigger {
                if state.win() {
                    info!(frame = self.frame, "remote reached the pressure plate");
                    self.emit(GameEvent::Won);
                    outcome = TickOutcome::Won;
                }
            }
        }
        outcome
    }

    fn emit(&self, event: GameEvent) {
        self.events.sender().send(event);
    }

    fn animate_ambient(&mut self, dt: f32) {
        let bob = (self.elapsed * IDLE_BOB_SPEED).sin() * IDLE_BOB_AMPLITUDE;
        for id in [self.level.remote, self.level.note] {
            let Some(object) = self.entities.get_mut(id) else { continue };
            let resting = object.idle_bob
                && object.is_rendered
                && object.body().map_or(true, |b| !is_simulated(&self.scene, b));
            if resting {
                let target = object.anchor() + Vec3::Y * bob;
                object.set_position(target, &mut self.scene);
            }
        }

        self.bloom_water_height += self.config.level.bloom_water_rise_rate * dt;
        let height = self.bloom_water_height;
        if let Some(water) = self.entities.get_mut(self.level.bloom_water) {
            let position = water.position();
            water.set_position(Vec3::new(position.x, height, position.z), &mut self.scene);
        }
    }

    fn render(&self, sinks: &mut Collaborators<'_>) {
        let world = self.transition.active_world();
        let instances = self.entities.render_instances(world);
        let shadow_casters = self.entities.shadow_casters(world);
        sinks.render.draw(&RenderFrame {
            instances: &instances,
            shadow_casters: &shadow_casters,
            view_projection: self.controller.view_projection(self.aspect),
            camera_position: self.controller.eye_position(),
            light: self.light,
            active_world: world,
            overlay_alpha: self.transition.alpha(),
            underwater: self.underwater,
        });
    }

    fn place_close_ups(&mut self) {
        let shown = self.hud.close_up();
        let view = self.controller.view_vectors();
        let anchor = self.controller.eye_position() + view.forward * self.hud.config().close_up_distance;

        for (kind, id) in [
            (CloseUp::Remote, self.level.remote_close_up),
            (CloseUp::Note, self.level.note_close_up),
        ] {
            let Some(object) = self.entities.get_mut(id) else { continue };
            object.is_rendered = shown == Some(kind);
            if !object.is_rendered {
                continue;
            }
            let facing = Quat::from_rotation_arc(Vec3::Z, -view.forward);
            let rotation = match kind {
                CloseUp::Remote => facing * Quat::from_rotation_y(self.elapsed * CLOSE_UP_SPIN),
                CloseUp::Note => facing,
            };
            object.set_transform(anchor, rotation, &mut self.scene);
        }
    }

    fn present_hud(&self, sinks: &mut Collaborators<'_>) {
        let world = self.transition.active_world();
        let player = self.controller.position();
        let ctx = HudContext {
            near_remote: self.interaction.can_pickup_nearby(self.level.remote, player, &self.entities),
            near_note: self.interaction.can_pickup_nearby(self.level.note, player, &self.entities),
            world,
            player,
        };
        let instruction = self.hud.select_instruction(&ctx);
        let snapshot = self.hud.snapshot(
            &self.player,
            instruction,
            world,
            self.transition.alpha(),
            self.underwater,
        );
        sinks.hud.present(&snapshot);
    }

    fn handle_input(&mut self, input: &InputState, sinks: &mut Collaborators<'_>) {
        let world = self.transition.active_world();
        if !self.transition.blocks_movement() {
            self.controller.look(input.mouse_delta.x, input.mouse_delta.y);
        }

        let player = self.controller.position();
        let eye = self.controller.eye_position();
        let forward = self.controller.forward();

        if input.pressed(Key::Interact) {
            let (remote, note) = (self.level.remote, self.level.note);
            let near_remote = self.interaction.can_pickup_nearby(remote, player, &self.entities);
            let near_note = self.interaction.can_pickup_nearby(note, player, &self.entities);
            let mut ctx = InteractionContext {
                entities: &mut self.entities,
                scene: &mut self.scene,
                state: &mut self.player,
                audio: &mut *sinks.audio,
            };
            let outcome = if near_remote {
                self.interaction.try_pickup_nearby(remote, player, &mut ctx)
            } else if near_note {
                self.interaction.try_pickup_nearby(note, player, &mut ctx)
            } else {
                self.interaction.pick_by_raycast(eye, forward, world, &mut ctx)
            };
            if let PickupOutcome::Acquired(kind) = outcome {
                self.on_acquired(kind);
            } else {
                debug!(?outcome, "nothing picked up");
            }
        }

        if input.pressed(Key::Throw) && self.player.has_remote() {
            let remote = self.level.remote;
            let mut ctx = InteractionContext {
                entities: &mut self.entities,
                scene: &mut self.scene,
                state: &mut self.player,
                audio: &mut *sinks.audio,
            };
            match self.interaction.throw(remote, eye, forward, world, &mut ctx) {
                ThrowOutcome::Thrown { position } => {
                    self.hud.hide_close_up(CloseUp::Remote);
                    self.emit(GameEvent::ItemThrown {
                        entity: remote,
                        position: position.to_array(),
                    });
                }
                other => warn!(outcome = ?other, "remote could not be thrown"),
            }
        }

        if input.pressed(Key::UseRemote)
            && self
                .transition
                .try_begin(self.player.has_remote(), self.player.remote_charge(), sinks.audio)
        {
            self.emit(GameEvent::TransitionStarted { from: world });
        }

        if input.pressed(Key::DismissNote) {
            self.hud.dismiss_note();
        }

        let sprinting = input.is_down(Key::Sprint)
            && input.movement().is_moving()
            && self.player.can_sprint()
            && !self.player.is_exhausted();
        self.controller.set_sprinting(sprinting);
    }

    fn on_acquired(&mut self, kind: EntityKind) {
        let (entity, close_up) = match kind {
            EntityKind::Remote => (self.level.remote, CloseUp::Remote),
            EntityKind::Note => (self.level.note, CloseUp::Note),
            _ => return,
        };
        if let Some(object) = self.entities.get_mut(entity) {
            object.idle_bob = false;
        }
        self.hud.show_close_up(close_up);
        self.emit(GameEvent::ItemPickedUp { entity, kind });
    }

    fn step_character(&mut self, input: &InputState, dt: f32) {
        let world = self.transition.active_world();
        let movement = if self.transition.blocks_movement() {
            MovementInput::default()
        } else {
            input.movement()
        };

        match self.scene.motor(self.character) {
            Ok(mut motor) => {
                self.controller.update(&mut motor, &movement, world, dt);
            }
            Err(e) => warn!(error = %e, "character motor unavailable"),
        }

        if self.controller.is_sprinting() && movement.is_moving() {
            self.player.spend_stamina(dt);
        }
        self.player.update(dt);
        self.entities.sync_transforms(&self.scene);
    }

    fn apply_hazards(&mut self, dt: f32, sinks: &mut Collaborators<'_>) {
        let position = self.controller.position();
        let feet_y = self
            .scene
            .character_foot_position(self.character)
            .map_or(position.y, |feet| feet.y);
        let probe = HazardProbe {
            world: self.transition.active_world(),
            feet_y,
            eye_y: self.controller.eye_position().y,
            bloom_water_y: self.bloom_water_height,
            dither_water_y: self.dither_water_height,
        };

        let health_before = self.player.health();
        let report = self.hazards.evaluate(&probe, dt, &mut self.player, sinks.audio);
        self.underwater = report.underwater;

        if report.damaged {
            self.emit(GameEvent::DamageTaken {
                amount: health_before - self.player.health(),
                health_remaining: self.player.health(),
            });
        }
        if report.drained {
            self.emit(GameEvent::RemoteDrained {
                charge_remaining: self.player.remote_charge(),
            });
        }
    }

    // -------------------------------------------------------------------------
    // Host access
    // -------------------------------------------------------------------------

    /// Receiver for gameplay events.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.events.receiver()
    }

    /// Sets the viewport aspect ratio (width / height).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Replaces the scene light.
    pub fn set_light(&mut self, light: LightParams) {
        self.light = light;
    }

    /// Moves the player without sweeping (respawn, scripted routes).
    pub fn teleport_player(&mut self, position: Vec3) {
        if let Err(e) = self.scene.teleport_character(self.character, position) {
            warn!(error = %e, "teleport failed");
            return;
        }
        self.controller.teleport(position);
    }

    /// Points the camera (degrees).
    pub fn set_view_angles(&mut self, yaw: f32, pitch: f32) {
        self.controller.set_angles(yaw, pitch);
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// World currently shown and simulated.
    #[must_use]
    pub const fn active_world(&self) -> ActiveWorld {
        self.transition.active_world()
    }

    /// Player resources.
    #[must_use]
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Player resources, mutably (debug tooling and scripted scenarios).
    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    /// Movement and camera state.
    #[must_use]
    pub const fn controller(&self) -> &CharacterController {
        &self.controller
    }

    /// Pickup state.
    #[must_use]
    pub const fn interaction(&self) -> &InteractionSystem {
        &self.interaction
    }

    /// Fade state.
    #[must_use]
    pub const fn transition(&self) -> &WorldTransitionController {
        &self.transition
    }

    /// HUD state.
    #[must_use]
    pub const fn hud(&self) -> &HudDirector {
        &self.hud
    }

    /// Physics scene.
    #[must_use]
    pub const fn scene(&self) -> &PhysicsScene {
        &self.scene
    }

    /// Entity arena.
    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Level handles.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// Entity of the remote.
    #[must_use]
    pub const fn remote(&self) -> EntityId {
        self.level.remote
    }

    /// Current bloom water surface.
    #[must_use]
    pub const fn bloom_water_height(&self) -> f32 {
        self.bloom_water_height
    }

    /// Seconds of simulated play.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Ticks simulated.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ProceduralAssets;
    use crate::collaborators::{NullAudio, NullHud, NullRenderer, RecordingHud, RecordingRenderer};

    const DT: f32 = 1.0 / 60.0;

    fn game() -> Game {
        Game::new(GameConfig::default(), &mut ProceduralAssets::level()).unwrap()
    }

    fn playing() -> GameStateMachine {
        let mut state = GameStateMachine::new();
        assert!(state.start());
        state
    }

    #[test]
    fn test_menu_suspends_tick() {
        let mut game = game();
        let mut state = GameStateMachine::new();
        let (mut audio, mut hud, mut render) = (NullAudio, NullHud, RecordingRenderer::default());
        let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
        let outcome = game.tick(DT, &InputFrame::new(), &mut sinks, &mut state);
        assert_eq!(outcome, TickOutcome::Suspended);
        assert_eq!(render.frames, 0);
        assert_eq!(game.frame(), 0);
    }

    #[test]
    fn test_tick_renders_and_presents() {
        let mut game = game();
        let mut state = playing();
        let (mut audio, mut hud, mut render) = (NullAudio, RecordingHud::default(), RecordingRenderer::default());
        let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
        for _ in 0..3 {
            assert_eq!(game.tick(DT, &InputFrame::new(), &mut sinks, &mut state), TickOutcome::Continue);
        }
        assert_eq!(render.frames, 3);
        assert_eq!(render.last_world, Some(ActiveWorld::Dither));
        assert_eq!(hud.frames, 3);
        assert_eq!(hud.last.as_ref().map(|s| s.health.0), Some(100.0));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut game = game();
        let mut state = playing();
        let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
        let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
        let events = game.events();

        let pause = InputFrame::new().with(Key::Pause);
        assert_eq!(game.tick(DT, &pause, &mut sinks, &mut state), TickOutcome::Suspended);
        assert_eq!(state.state(), GameState::Paused);

        // Held key is not a new edge
        assert_eq!(game.tick(DT, &pause, &mut sinks, &mut state), TickOutcome::Suspended);
        assert_eq!(state.state(), GameState::Paused);

        game.tick(DT, &InputFrame::new(), &mut sinks, &mut state);
        game.tick(DT, &pause, &mut sinks, &mut state);
        assert_eq!(state.state(), GameState::Playing);
        assert_eq!(events.drain(), vec![GameEvent::Paused, GameEvent::Resumed]);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut game = game();
        let mut state = playing();
        let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
        let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
        game.tick(5.0, &InputFrame::new(), &mut sinks, &mut state);
        assert!((game.elapsed() - MAX_FRAME_DELTA).abs() < 1e-6);
    }

    #[test]
    fn test_bloom_water_rises() {
        let mut game = game();
        let mut state = playing();
        let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
        let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
        let start = game.bloom_water_height();
        for _ in 0..60 {
            game.tick(DT, &InputFrame::new(), &mut sinks, &mut state);
        }
        let risen = game.bloom_water_height() - start;
        assert!((risen - 0.012).abs() < 1e-4);
        let water = game.entities().get(game.level().bloom_water).unwrap();
        assert!((water.position().y - game.bloom_water_height()).abs() < 1e-5);
    }

    #[test]
    fn test_parked_remote_hovers() {
        let mut game = game();
        let mut state = playing();
        let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
        let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
        let anchor = game.entities().get(game.remote()).unwrap().anchor();
        let mut highest: f32 = f32::MIN;
        for _ in 0..60 {
            game.tick(DT, &InputFrame::new(), &mut sinks, &mut state);
            let y = game.entities().get(game.remote()).unwrap().position().y;
            highest = highest.max(y);
            assert!((y - anchor.y).abs() <= IDLE_BOB_AMPLITUDE + 1e-5);
        }
        assert!(highest > anchor.y + 0.03);
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::new();
        for i in 0..100 {
            acc.record(FrameStats {
                total_us: 10_000 + (i * 100),
                tick_us: 5000,
                frame: i,
                events_emitted: 1,
            });
        }
        assert_eq!(acc.frames_recorded, 100);
        assert!(acc.avg_fps() > 50.0);
        assert!(acc.avg_fps() < 100.0);
        assert_eq!(acc.frames_over_budget, 33);
    }

    #[test]
    fn test_frame_clock_clamps() {
        let mut clock = FrameClock::new(0.05);
        std::thread::sleep(Duration::from_millis(60));
        assert!(clock.tick() <= 0.05);
    }
}

//! # Gameplay Integration Tests
//!
//! Full ticks against the stock level and a real physics scene:
//! landing, pickup, world switching, the pit and the goal plate.
//!
//! Run with: cargo test --package doppel --test gameplay_test

use doppel::{
    CloseUp, Collaborators, EntityKind, Game, GameConfig, GameEvent, GameOverReason, GameState,
    GameStateMachine, InputFrame, Key, ProceduralAssets, RecordingAudio, RecordingHud, RecordingRenderer, SoundCue,
    TickOutcome,
};
use doppel::shared::ActiveWorld;
use glam::Vec3;

const DT: f32 = 1.0 / 60.0;

const ALTAR_SPOT: Vec3 = Vec3::new(0.2, 0.3, 0.1);
const PIT_EDGE: Vec3 = Vec3::new(29.0, 0.3, 11.7);

struct Harness {
    game: Game,
    state: GameStateMachine,
    audio: RecordingAudio,
    hud: RecordingHud,
    render: RecordingRenderer,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    fn with_config(config: GameConfig) -> Self {
        let game = Game::new(config, &mut ProceduralAssets::level()).expect("stock level builds");
        let mut state = GameStateMachine::new();
        assert!(state.start());
        Self {
            game,
            state,
            audio: RecordingAudio::default(),
            hud: RecordingHud::default(),
            render: RecordingRenderer::default(),
        }
    }

    fn tick(&mut self, input: &InputFrame) -> TickOutcome {
        let mut sinks = Collaborators::new(&mut self.audio, &mut self.hud, &mut self.render);
        self.game.tick(DT, input, &mut sinks, &mut self.state)
    }

    /// Runs empty frames; stops early on anything but `Continue`.
    fn idle(&mut self, frames: u32) -> TickOutcome {
        let input = InputFrame::new();
        for _ in 0..frames {
            let outcome = self.tick(&input);
            if outcome != TickOutcome::Continue {
                return outcome;
            }
        }
        TickOutcome::Continue
    }

    fn press(&mut self, key: Key) -> TickOutcome {
        self.tick(&InputFrame::new().with(key))
    }

    fn pick_up_remote(&mut self) {
        self.game.teleport_player(ALTAR_SPOT);
        assert_eq!(self.idle(30), TickOutcome::Continue);
        self.press(Key::Interact);
        assert!(self.game.player().has_remote(), "remote should be in hand");
    }
}

/// Test: the player drops from the spawn point onto the dither floor.
#[test]
fn test_player_lands_on_dither_floor() {
    let mut h = Harness::new();
    assert_eq!(h.idle(120), TickOutcome::Continue);

    let controller = h.game.controller();
    assert!(controller.is_grounded());
    let y = controller.position().y;
    assert!(y > 0.1 && y < 0.3, "capsule centre should rest just above y = 0, got {y}");
    assert_eq!(h.game.active_world(), ActiveWorld::Dither);
    assert_eq!(h.render.frames, 120);
}

/// Test: proximity pickup parks the remote and shows its close-up.
#[test]
fn test_remote_pickup() {
    let mut h = Harness::new();
    let events = h.game.events();
    h.pick_up_remote();

    let remote = h.game.remote();
    let body = h.game.entities().get(remote).and_then(|o| o.body()).unwrap();
    assert!(h.game.interaction().inventory().contains(remote));
    assert!(!h.game.scene().is_in_scene(body));
    assert!(!h.game.entities().get(remote).unwrap().is_rendered);
    assert_eq!(h.audio.count(SoundCue::Pickup), 1);
    assert_eq!(h.game.hud().close_up(), Some(CloseUp::Remote));
    assert!(events.drain().contains(&GameEvent::ItemPickedUp {
        entity: remote,
        kind: EntityKind::Remote,
    }));

    // The close-up is drawn next frame, and the HUD tells the player what to do
    h.idle(1);
    let snapshot = h.hud.last.clone().unwrap();
    assert!(snapshot.remote_in_inventory);
    assert_eq!(snapshot.instruction_text(), Some("Picked up remote. Press [LMB] to use"));
    assert!(h.game.entities().get(h.game.level().remote_close_up).unwrap().is_rendered);
}

/// Test: the remote switches to bloom once and heals on arrival.
#[test]
fn test_world_switch_heals_in_bloom() {
    let mut h = Harness::new();
    let events = h.game.events();
    h.pick_up_remote();
    h.game.player_mut().set_health(50.0);

    h.press(Key::UseRemote);
    assert!(h.game.transition().is_fading());
    // A second click mid-fade is ignored
    h.idle(5);
    h.press(Key::UseRemote);
    h.idle(60);

    assert_eq!(h.game.active_world(), ActiveWorld::Bloom);
    assert!(!h.game.transition().is_fading());
    assert!((h.game.player().health() - 80.0).abs() < 1e-3);
    assert_eq!(h.audio.count(SoundCue::WorldSwitch), 1);

    let switches = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::WorldSwitched { .. }))
        .count();
    assert_eq!(switches, 1);
    assert_eq!(h.render.last_world, Some(ActiveWorld::Bloom));
    assert!(h.game.controller().is_grounded(), "bloom floor must carry the player");
}

/// Test: look, walking and jumping do nothing until the fade is over.
#[test]
fn test_fade_freezes_movement_and_look() {
    let mut h = Harness::new();
    h.pick_up_remote();
    h.idle(10);
    let (yaw, pitch) = (h.game.controller().yaw(), h.game.controller().pitch());
    let start = h.game.controller().position();

    h.press(Key::UseRemote);
    assert!(h.game.transition().is_fading());

    // Held walk keys, a jump edge every other frame and a moving cursor
    let busy = |i: u16| {
        let frame = InputFrame::new()
            .with(Key::Forward)
            .with(Key::Left)
            .with_cursor(400.0 + f32::from(i) * 7.0, 300.0 - f32::from(i) * 3.0);
        if i % 2 == 0 {
            frame.with(Key::Jump)
        } else {
            frame
        }
    };

    let mut frozen_frames = 0;
    let mut i = 0;
    while i < 120 {
        h.tick(&busy(i));
        i += 1;
        if !h.game.transition().is_fading() {
            break;
        }
        frozen_frames += 1;
        let controller = h.game.controller();
        assert_eq!(controller.yaw(), yaw);
        assert_eq!(controller.pitch(), pitch);
        let position = controller.position();
        let drift = Vec3::new(position.x - start.x, 0.0, position.z - start.z).length();
        assert!(drift < 1e-3, "walked {drift} during the fade");
        assert!(position.y < start.y + 1e-2, "jumped during the fade");
    }
    assert!(frozen_frames > 50, "fade lasted only {frozen_frames} frames");
    assert!(!h.game.transition().is_fading());
    assert_eq!(h.game.active_world(), ActiveWorld::Bloom);

    // The same input works again afterwards
    for _ in 0..10 {
        h.tick(&busy(i));
        i += 1;
    }
    assert_ne!(h.game.controller().yaw(), yaw);
    let position = h.game.controller().position();
    assert!(Vec3::new(position.x - start.x, 0.0, position.z - start.z).length() > 0.05);
}

/// Test: without the remote nothing happens on click.
#[test]
fn test_switch_requires_remote() {
    let mut h = Harness::new();
    h.idle(10);
    h.press(Key::UseRemote);
    h.idle(60);
    assert_eq!(h.game.active_world(), ActiveWorld::Dither);
    assert_eq!(h.audio.count(SoundCue::WorldSwitch), 0);
}

/// Test: the dither floor has a hole over the pit; falling through ends the run.
#[test]
fn test_fall_into_pit_is_game_over() {
    let mut h = Harness::new();
    let events = h.game.events();
    h.game.teleport_player(Vec3::new(29.0, 0.5, 17.0));

    let outcome = h.idle(300);
    assert_eq!(outcome, TickOutcome::Halted(GameOverReason::FellOutOfWorld));
    assert_eq!(h.state.state(), GameState::GameOver);
    assert_eq!(h.state.game_over_reason(), Some(GameOverReason::FellOutOfWorld));
    assert!(events.drain().contains(&GameEvent::GameOver {
        reason: GameOverReason::FellOutOfWorld,
    }));

    assert_eq!(h.idle(1), TickOutcome::Suspended);
}

/// Test: health running out ends the run on the same tick.
#[test]
fn test_health_depleted_is_game_over() {
    let mut h = Harness::new();
    h.idle(10);
    h.game.player_mut().set_health(0.0);
    assert_eq!(h.idle(1), TickOutcome::Halted(GameOverReason::HealthDepleted));
    assert_eq!(h.state.state(), GameState::GameOver);
}

/// Test: the remote thrown into the pit lands on the plate and wins exactly once.
#[test]
fn test_throw_into_pit_wins_once() {
    let mut h = Harness::new();
    let events = h.game.events();
    h.pick_up_remote();

    h.game.teleport_player(PIT_EDGE);
    h.game.set_view_angles(90.0, 0.0);
    assert_eq!(h.idle(30), TickOutcome::Continue);
    assert!(h.game.controller().is_grounded(), "player should stand at the pit edge");

    h.press(Key::Throw);
    assert!(!h.game.player().has_remote());
    assert_eq!(h.game.hud().close_up(), None);

    let outcome = h.idle(600);
    assert_eq!(outcome, TickOutcome::Won);
    assert_eq!(h.state.state(), GameState::Won);

    // Resting on the plate for a long time changes nothing
    for _ in 0..120 {
        assert_eq!(h.idle(1), TickOutcome::Suspended);
    }
    let wins = events.drain().into_iter().filter(|e| *e == GameEvent::Won).count();
    assert_eq!(wins, 1);
}

/// Test: the note is picked up silently by the view ray.
#[test]
fn test_note_pickup_by_ray() {
    let mut config = GameConfig::default();
    config.transition.initial_world = ActiveWorld::Bloom;
    let mut h = Harness::with_config(config);

    // Top of the bloom tower, a little under a metre from the note
    h.game.teleport_player(Vec3::new(21.26, 6.7, -5.4));
    assert_eq!(h.idle(30), TickOutcome::Continue);
    assert!(h.game.controller().is_grounded());

    let eye = h.game.controller().eye_position();
    let note = h.game.entities().get(h.game.level().note).unwrap().position();
    let dir = (note - eye).normalize();
    h.game
        .set_view_angles(dir.z.atan2(dir.x).to_degrees(), dir.y.asin().to_degrees());

    h.press(Key::Interact);
    assert!(h.game.player().has_note());
    assert_eq!(h.audio.count(SoundCue::Pickup), 0);
    assert_eq!(h.game.hud().close_up(), Some(CloseUp::Note));

    h.press(Key::DismissNote);
    assert_eq!(h.game.hud().close_up(), None);
}

/// Test: restarting rebuilds the level and keeps event receivers connected.
#[test]
fn test_restart_after_game_over() {
    let mut h = Harness::new();
    let events = h.game.events();
    h.game.teleport_player(Vec3::new(29.0, 0.5, 17.0));
    assert!(matches!(h.idle(300), TickOutcome::Halted(_)));
    events.drain();

    assert!(h.state.restart());
    h.game.restart(&mut ProceduralAssets::level()).unwrap();
    assert!(h.state.start());

    assert_eq!(h.game.player().health(), 100.0);
    assert!(h.game.controller().position().distance(Vec3::new(3.0, 1.0, -1.0)) < 1e-4);
    let remote = h.game.remote();
    let body = h.game.entities().get(remote).and_then(|o| o.body()).unwrap();
    assert!(!h.game.scene().is_in_scene(body));

    h.press(Key::Pause);
    assert_eq!(events.drain(), vec![GameEvent::Paused]);
}

//! # DOPPEL Headless Runner
//!
//! Plays a scripted route through the stock level with no window, GPU or
//! audio device: pick up the remote, switch worlds twice, then drop the
//! remote into the pit.
//!
//! ```bash
//! # Default tuning
//! ./doppel_headless
//!
//! # Custom tuning, verbose
//! RUST_LOG=debug ./doppel_headless doppel.toml
//! ```

use std::process::ExitCode;
use std::time::Instant;

use glam::Vec3;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doppel::{
    Collaborators, FrameStats, FrameStatsAccumulator, Game, GameConfig, GameStateMachine, InputFrame, Key, NullAudio,
    ProceduralAssets, RecordingHud, RecordingRenderer, TickOutcome,
};

const DT: f32 = 1.0 / 60.0;

/// Frames the final throw gets to reach the plate.
const THROW_BUDGET: u32 = 600;

enum Step {
    Idle(u32),
    Press(Key),
    Teleport(Vec3),
    Look { yaw: f32, pitch: f32 },
}

fn route() -> Vec<Step> {
    vec![
        Step::Idle(60),
        Step::Teleport(Vec3::new(0.2, 0.3, 0.1)),
        Step::Idle(30),
        Step::Press(Key::Interact),
        Step::Idle(10),
        Step::Press(Key::UseRemote),
        Step::Idle(90),
        Step::Press(Key::UseRemote),
        Step::Idle(90),
        Step::Teleport(Vec3::new(29.0, 0.3, 11.7)),
        Step::Look { yaw: 90.0, pitch: 0.0 },
        Step::Idle(30),
        Step::Press(Key::Throw),
    ]
}

struct Runner {
    game: Game,
    state: GameStateMachine,
    audio: NullAudio,
    hud: RecordingHud,
    render: RecordingRenderer,
    stats: FrameStatsAccumulator,
}

impl Runner {
    fn frame(&mut self, input: &InputFrame) -> TickOutcome {
        let start = Instant::now();
        let mut sinks = Collaborators::new(&mut self.audio, &mut self.hud, &mut self.render);
        let outcome = self.game.tick(DT, input, &mut sinks, &mut self.state);
        let elapsed = start.elapsed().as_micros() as u64;
        self.stats.record(FrameStats {
            total_us: elapsed,
            tick_us: elapsed,
            frame: self.game.frame(),
            events_emitted: 0,
        });
        outcome
    }

    fn run(&mut self, steps: &[Step]) -> TickOutcome {
        for step in steps {
            let outcome = match *step {
                Step::Idle(frames) => self.idle(frames),
                Step::Press(key) => self.frame(&InputFrame::new().with(key)),
                Step::Teleport(position) => {
                    self.game.teleport_player(position);
                    TickOutcome::Continue
                }
                Step::Look { yaw, pitch } => {
                    self.game.set_view_angles(yaw, pitch);
                    TickOutcome::Continue
                }
            };
            if outcome != TickOutcome::Continue {
                return outcome;
            }
        }
        self.idle(THROW_BUDGET)
    }

    fn idle(&mut self, frames: u32) -> TickOutcome {
        let input = InputFrame::new();
        for _ in 0..frames {
            let outcome = self.frame(&input);
            if outcome != TickOutcome::Continue {
                return outcome;
            }
        }
        TickOutcome::Continue
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "configuration rejected");
                return ExitCode::FAILURE;
            }
        },
        None => GameConfig::default(),
    };

    let game = match Game::new(config, &mut ProceduralAssets::level()) {
        Ok(game) => game,
        Err(e) => {
            error!(error = %e, "level failed to load");
            return ExitCode::FAILURE;
        }
    };
    let events = game.events();

    let mut runner = Runner {
        game,
        state: GameStateMachine::new(),
        audio: NullAudio,
        hud: RecordingHud::default(),
        render: RecordingRenderer::default(),
        stats: FrameStatsAccumulator::new(),
    };
    runner.state.start();

    let outcome = runner.run(&route());
    for event in events.drain() {
        info!(?event, "event");
    }
    runner.stats.log_summary();
    info!(
        ?outcome,
        state = %runner.state.state(),
        frames = runner.game.frame(),
        rendered = runner.render.frames,
        health = runner.game.player().health(),
        "session finished"
    );

    if outcome == TickOutcome::Won {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

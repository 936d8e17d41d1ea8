//! Benchmark for the full frame tick and level construction.
//!
//! Run with: cargo bench --package doppel --bench frame_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use doppel::{
    Collaborators, EntityStore, Game, GameConfig, GameStateMachine, InputFrame, Key, Level, LevelConfig, NullAudio,
    NullHud, NullRenderer, ProceduralAssets,
};
use doppel::physics::PhysicsScene;
use doppel::shared::ActiveWorld;

const DT: f32 = 1.0 / 60.0;

fn settled_game() -> (Game, GameStateMachine) {
    let mut game = Game::new(GameConfig::default(), &mut ProceduralAssets::level()).unwrap();
    let mut state = GameStateMachine::new();
    state.start();
    let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
    let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
    for _ in 0..60 {
        game.tick(DT, &InputFrame::new(), &mut sinks, &mut state);
    }
    (game, state)
}

fn benchmark_idle_tick(c: &mut Criterion) {
    let (mut game, mut state) = settled_game();
    let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
    let input = InputFrame::new();

    c.bench_function("game_tick_idle", |b| {
        b.iter(|| {
            let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
            black_box(game.tick(DT, black_box(&input), &mut sinks, &mut state))
        });
    });
}

fn benchmark_walking_tick(c: &mut Criterion) {
    let (mut game, mut state) = settled_game();
    let (mut audio, mut hud, mut render) = (NullAudio, NullHud, NullRenderer);
    let forward = InputFrame::new().with(Key::Forward);
    let back = InputFrame::new().with(Key::Backward);
    let mut flip = false;

    c.bench_function("game_tick_walking", |b| {
        b.iter(|| {
            flip = !flip;
            let input = if flip { &forward } else { &back };
            let mut sinks = Collaborators::new(&mut audio, &mut hud, &mut render);
            black_box(game.tick(DT, input, &mut sinks, &mut state))
        });
    });
}

fn benchmark_render_instances(c: &mut Criterion) {
    let (game, _) = settled_game();

    c.bench_function("render_instances_both_worlds", |b| {
        b.iter(|| {
            let dither = game.entities().render_instances(ActiveWorld::Dither);
            let bloom = game.entities().render_instances(ActiveWorld::Bloom);
            black_box(dither.len() + bloom.len())
        });
    });
}

fn benchmark_level_build(c: &mut Criterion) {
    c.bench_function("level_build", |b| {
        b.iter_batched(
            || (ProceduralAssets::level(), PhysicsScene::default(), EntityStore::new()),
            |(mut assets, mut scene, mut entities)| {
                black_box(Level::build(&LevelConfig::default(), &mut assets, &mut scene, &mut entities).unwrap())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_idle_tick,
    benchmark_walking_tick,
    benchmark_render_instances,
    benchmark_level_build,
);
criterion_main!(benches);

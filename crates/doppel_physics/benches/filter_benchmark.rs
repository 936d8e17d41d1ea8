//! Benchmark for filter tests and scene stepping.
//!
//! Run with: cargo bench --package doppel_physics --bench filter_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use doppel_physics::{BodyTag, PhysicsScene};
use doppel_shared::constants::FIXED_TIMESTEP;
use doppel_shared::{ActiveWorld, CollisionFilter, MeshData, WorldMask};
use glam::{Mat4, Vec3};

fn benchmark_filter_test(c: &mut Criterion) {
    let filters: Vec<CollisionFilter> = (0..32u32)
        .map(|i| CollisionFilter::new(WorldMask::from_raw(i), WorldMask::from_raw(31 - i)))
        .collect();

    c.bench_function("filter_interacts_32x32", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            for a in &filters {
                for other in &filters {
                    hits += u32::from(black_box(a).interacts(black_box(other)));
                }
            }
            hits
        });
    });
}

fn benchmark_scene_step(c: &mut Criterion) {
    let mut scene = PhysicsScene::default();
    scene.create_static_box(
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(20.0, 0.5, 20.0),
        CollisionFilter::world_geometry(WorldMask::BOTH),
        BodyTag::Level,
    );
    let cube = MeshData::cuboid(Vec3::splat(0.1));
    for i in 0..64 {
        let world = if i % 2 == 0 { WorldMask::BLOOM } else { WorldMask::DITHER };
        let at = Vec3::new((i % 8) as f32, 1.0 + (i / 8) as f32 * 0.3, (i / 8) as f32);
        let _ = scene.create_dynamic_body(
            &cube,
            &Mat4::from_translation(at),
            CollisionFilter::world_geometry(world),
            BodyTag::Pickup,
        );
    }
    let player = scene.create_character_controller(Vec3::new(0.0, 0.5, 0.0), CollisionFilter::character(ActiveWorld::Dither));

    c.bench_function("scene_step_64_bodies", |b| {
        b.iter(|| {
            let filter = CollisionFilter::character(ActiveWorld::Dither);
            let _ = scene.sweep_character(player, Vec3::new(0.01, -0.02, 0.0), filter, FIXED_TIMESTEP);
            black_box(scene.step(FIXED_TIMESTEP));
        });
    });
}

criterion_group!(benches, benchmark_filter_test, benchmark_scene_step);
criterion_main!(benches);

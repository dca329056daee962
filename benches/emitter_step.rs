//! Benchmarks for the CPU emitter step.
//!
//! Run with: `cargo bench`

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ember::{
    BlendMode, Commands, Emitter, EmitterSettings, FrameTime, MaterialLibrary, ParticleMaterial,
    ParticleRenderer, ParticleSystem, SceneGroup, ShowSettings, Vec3, EARTH_GRAVITY,
};

fn emitter(max_particles: u32) -> Emitter {
    let mut materials = MaterialLibrary::new();
    let base = materials.insert(ParticleMaterial::new("bench", BlendMode::Additive));
    let scene = Rc::new(RefCell::new(SceneGroup::default()));
    let renderer = ParticleRenderer::new(
        max_particles as usize,
        materials.lease(base).unwrap(),
        scene,
    );
    let settings = EmitterSettings::default()
        .with_max_life(1000.0)
        .with_velocity(5.0, 2.0)
        .with_gravity(EARTH_GRAVITY, 1.0)
        .with_drag(0.5)
        .with_emission(1.0e6, u64::MAX)
        .with_max_particles(max_particles)
        .with_seed(1);
    Emitter::builder(settings).renderer(renderer).build().unwrap()
}

fn bench_full_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter_step_full_pool");

    for count in [100u32, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut e = emitter(count);
            let mut commands = Commands::new();
            // Fill the pool once; later steps only integrate and render
            e.step(FrameTime::new(1.0, 1.0), &mut commands).unwrap();
            let frame = FrameTime::new(1.0 / 60.0, 1.0);
            b.iter(|| {
                e.step(black_box(frame), &mut commands).unwrap();
                black_box(e.renderer().position_bytes().len())
            })
        });
    }

    group.finish();
}

fn bench_emission_burst(c: &mut Criterion) {
    c.bench_function("emission_burst_500", |b| {
        b.iter_with_setup(
            || (emitter(500), Commands::new()),
            |(mut e, mut commands)| {
                e.step(FrameTime::new(1.0, 1.0), &mut commands).unwrap();
                black_box(e.particles().len())
            },
        )
    });
}

fn bench_system(c: &mut Criterion) {
    let settings = ShowSettings::default();
    c.bench_function("system_32_smoke_emitters", |b| {
        let mut system = ParticleSystem::new();
        let mut materials = MaterialLibrary::new();
        let base = materials.insert(ParticleMaterial::new("smoke", BlendMode::Normal));
        let scene = Rc::new(RefCell::new(SceneGroup::new(Vec3::new(0.0, -15.0, 0.0))));
        for i in 0..32 {
            let smoke = settings.smoke.clone().with_emission(100.0, u64::MAX).with_seed(i);
            let renderer = ParticleRenderer::new(
                smoke.max_particles as usize,
                materials.lease_clone(base).unwrap(),
                scene.clone(),
            );
            system.add_emitter(Emitter::builder(smoke).renderer(renderer).build().unwrap());
        }
        let mut elapsed = 0.0;
        b.iter(|| {
            elapsed += 1.0 / 60.0;
            system.step(FrameTime::new(1.0 / 60.0, elapsed)).unwrap();
            black_box(system.particle_count())
        })
    });
}

criterion_group!(benches, bench_full_pool, bench_emission_burst, bench_system);
criterion_main!(benches);

//! Property tests for emission scheduling and pool bounds.

use std::cell::RefCell;
use std::rc::Rc;

use ember::{
    BlendMode, Commands, Emitter, EmitterSettings, FrameTime, MaterialLibrary, ParticleMaterial,
    ParticleRenderer, SceneGroup, Vec3,
};
use proptest::prelude::*;

fn build(settings: EmitterSettings) -> Emitter {
    let mut materials = MaterialLibrary::new();
    let base = materials.insert(ParticleMaterial::new("spark", BlendMode::Normal));
    let scene = Rc::new(RefCell::new(SceneGroup::default()));
    let renderer = ParticleRenderer::new(
        settings.max_particles as usize,
        materials.lease(base).unwrap(),
        scene,
    );
    Emitter::builder(settings).renderer(renderer).build().unwrap()
}

fn settings(max_life: f32, rate: f32, max_emission: u64, max_particles: u32) -> EmitterSettings {
    EmitterSettings::default()
        .with_max_life(max_life)
        .with_velocity(1.0, 0.5)
        .with_gravity(Vec3::new(0.0, -9.81, 0.0), 1.0)
        .with_drag(0.5)
        .with_emission(rate, max_emission)
        .with_max_particles(max_particles)
        .with_seed(3)
}

// Power-of-two rates and sixteenth-second deltas keep every accumulator
// value exactly representable, so the count is exact too.
fn exact_rate() -> impl Strategy<Value = f32> {
    (0u32..6).prop_map(|k| (1u32 << k) as f32)
}

fn exact_deltas() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec((0u32..=16).prop_map(|n| n as f32 / 16.0), 1..40)
}

proptest! {
    #[test]
    fn emitted_count_is_floor_of_elapsed_times_rate(
        rate in exact_rate(),
        deltas in exact_deltas()
    ) {
        let mut e = build(settings(1000.0, rate, u64::MAX, 4096));
        let mut commands = Commands::new();

        let mut elapsed = 0.0f32;
        for delta in deltas {
            elapsed += delta;
            e.step(FrameTime::new(delta, elapsed), &mut commands).unwrap();
        }

        let expected = (elapsed as f64 * rate as f64).floor() as u64;
        prop_assert_eq!(e.num_particles_emitted(), expected);
    }

    #[test]
    fn pool_and_emission_stay_bounded(
        rate in 1.0f32..500.0,
        max_life in 0.05f32..3.0,
        max_particles in 1u32..64,
        max_emission in 0u64..200,
        deltas in prop::collection::vec(0.0f32..0.5, 1..60)
    ) {
        let mut e = build(settings(max_life, rate, max_emission, max_particles));
        let mut commands = Commands::new();

        let mut elapsed = 0.0f32;
        for delta in deltas {
            elapsed += delta;
            e.step(FrameTime::new(delta, elapsed), &mut commands).unwrap();
            prop_assert!(e.particles().len() <= max_particles as usize);
            prop_assert!(e.num_particles_emitted() <= max_emission);
            prop_assert_eq!(e.renderer().draw_range().len(), e.particles().len());
            for p in e.particles() {
                prop_assert!(p.age <= p.max_life);
            }
        }
    }

    #[test]
    fn inactive_emitter_stays_inactive(
        rate in 1.0f32..50.0,
        max_emission in 0u64..20,
        deltas in prop::collection::vec(0.01f32..1.0, 1..80)
    ) {
        let mut e = build(settings(0.5, rate, max_emission, 32));
        let mut commands = Commands::new();

        let mut elapsed = 0.0f32;
        let mut was_inactive = !e.is_active();
        for delta in deltas {
            elapsed += delta;
            e.step(FrameTime::new(delta, elapsed), &mut commands).unwrap();
            if was_inactive {
                prop_assert!(!e.is_active());
                prop_assert!(e.particles().is_empty());
            }
            was_inactive = !e.is_active();
        }
    }
}

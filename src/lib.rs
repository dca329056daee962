//! # Ember - CPU particle emitters
//!
//! Ember simulates short-lived point particles on the CPU and keeps their
//! attributes in fixed-size buffers ready for upload.
//!
//! An [`Emitter`] decides when particles are born, integrates gravity and
//! drag, retires them when their life runs out, and writes the survivors to
//! its [`ParticleRenderer`]. A [`ParticleSystem`] steps many emitters per
//! frame and reclaims the ones that have finished.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ember::prelude::*;
//!
//! let scene = Rc::new(RefCell::new(SceneGroup::default()));
//! let mut materials = MaterialLibrary::new();
//! let base = materials.insert(ParticleMaterial::new("spark", BlendMode::Additive));
//!
//! let settings = EmitterSettings::default()
//!     .with_max_life(2.0)
//!     .with_velocity(5.0, 1.0)
//!     .with_emission(50.0, 200)
//!     .with_max_particles(100);
//!
//! let renderer = ParticleRenderer::new(100, materials.lease_clone(base)?, scene.clone());
//! let emitter = Emitter::builder(settings)
//!     .shape(SphereShape { center: Vec3::ZERO, radius: 0.5 })
//!     .renderer(renderer)
//!     .build()?;
//!
//! let mut system = ParticleSystem::new();
//! system.add_emitter(emitter);
//!
//! let mut time = Time::new();
//! loop {
//!     let frame = time.tick();
//!     system.step(frame)?;
//!     materials.update(frame);
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Emission
//!
//! Emission is scheduled by an accumulator. Every step adds the frame delta
//! and drains it one `1 / emission_rate` period at a time, so the number of
//! particles emitted after `T` seconds is `floor(T * rate)` no matter how
//! the frames were sliced, capped by `max_emission` and by free room in the
//! pool.
//!
//! ### Cascades
//!
//! [`LifecycleHooks`] run when a particle is created, updated and removed.
//! They cannot reach other emitters directly; they queue [`Commands`] that
//! the system applies after the emitter's step. [`FireworkShow`] is a
//! complete three-level cascade built this way.
//!
//! ### Resources
//!
//! | Resource | Owner | Released by |
//! |----------|-------|-------------|
//! | particle pool | [`Emitter`] | [`Emitter::dispose`] |
//! | render buffers | [`ParticleRenderer`] | [`ParticleRenderer::dispose`] |
//! | material | [`MaterialLibrary`] | [`MaterialLease::release`], collected on update |

pub mod config;
mod emitter;
pub mod error;
pub mod fireworks;
pub mod hooks;
pub mod material;
mod particle;
pub mod renderer;
pub mod shape;
pub mod spawn;
pub mod startup;
mod system;
pub mod time;
pub mod uniforms;

pub use bytemuck;
pub use config::{EmitterSettings, ShowSettings, EARTH_GRAVITY, UNBOUNDED_EMISSION};
pub use emitter::{Emitter, EmitterBuilder};
pub use error::{ConfigError, EngineError};
pub use fireworks::{CurveTextures, FireworkShow, ShowAssets};
pub use glam::{Quat, Vec2, Vec3, Vec4};
pub use hooks::{Command, Commands, EmitterId, LifecycleHooks};
pub use material::{BlendMode, MaterialId, MaterialLease, MaterialLibrary, ParticleMaterial, Viewport};
pub use particle::{Particle, ParticleId};
pub use renderer::{LifeData, ParticleRenderer, RenderableId, Scene, SceneGroup, SceneHandle};
pub use shape::{BoxShape, EmitterShape, Origin, PointShape, SpawnPoint, SphereShape};
pub use startup::{prerequisite, BarrierState, Prerequisite, Resolver, StartupBarrier};
pub use system::ParticleSystem;
pub use time::{FrameTime, Time};
pub use uniforms::{MaterialUniforms, TextureHandle, UniformValue};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use ember::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{EmitterSettings, ShowSettings};
    pub use crate::emitter::Emitter;
    pub use crate::error::EngineError;
    pub use crate::hooks::{Commands, EmitterId, LifecycleHooks};
    pub use crate::material::{BlendMode, MaterialLibrary, ParticleMaterial, Viewport};
    pub use crate::particle::{Particle, ParticleId};
    pub use crate::renderer::{ParticleRenderer, SceneGroup};
    pub use crate::shape::{BoxShape, EmitterShape, PointShape, SphereShape};
    pub use crate::system::ParticleSystem;
    pub use crate::time::{FrameTime, Time};
    pub use crate::{Quat, Vec2, Vec3, Vec4};
    pub use std::cell::RefCell;
    pub use std::rc::Rc;
}

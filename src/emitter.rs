//! Particle emitters.
//!
//! An [`Emitter`] schedules emission, owns the live particle pool, integrates
//! forces and drives lifecycle hooks. Each step runs in a fixed order:
//!
//! 1. **Emission** - `delta` is added to an accumulator and drained one
//!    `1 / emission_rate` period at a time, so a long frame emits a catch-up
//!    burst instead of dropping particles.
//! 2. **Retirement** - particles that reached `max_life` during an earlier
//!    step leave the pool after their removal hook runs.
//! 3. **Integration** - every other particle ages (clamped to `max_life`),
//!    then gravity and drag (from the pre-update velocity, explicit Euler)
//!    move it.
//! 4. **Render** - the remaining pool is written to the renderer, so a
//!    particle is drawn once at life fraction 1.0 before it retires.
//!
//! # Example
//!
//! ```ignore
//! let emitter = Emitter::builder(
//!         EmitterSettings::default()
//!             .with_max_life(2.0)
//!             .with_emission(100.0, 500)
//!             .with_max_particles(500),
//!     )
//!     .shape(PointShape::new(Vec3::ZERO))
//!     .renderer(ParticleRenderer::new(500, lease, scene))
//!     .build()?;
//! system.add_emitter(emitter);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, warn};

use crate::config::EmitterSettings;
use crate::error::{ConfigError, EngineError};
use crate::hooks::{Commands, EmitterId, LifecycleHooks};
use crate::particle::{Particle, ParticleId};
use crate::renderer::ParticleRenderer;
use crate::shape::{EmitterShape, Origin};
use crate::spawn;
use crate::time::FrameTime;

/// Builder for [`Emitter`]. A renderer is required; the shape defaults to
/// [`Origin`] and hooks are optional.
pub struct EmitterBuilder {
    settings: EmitterSettings,
    shape: Box<dyn EmitterShape>,
    renderer: Option<ParticleRenderer>,
    hooks: Option<Box<dyn LifecycleHooks>>,
}

impl EmitterBuilder {
    /// Where particles spawn. Defaults to [`Origin`].
    pub fn shape(mut self, shape: impl EmitterShape + 'static) -> Self {
        self.shape = Box::new(shape);
        self
    }

    /// Renderer receiving the pool every step. Required.
    pub fn renderer(mut self, renderer: ParticleRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Callbacks run on particle creation, update and removal.
    pub fn hooks(mut self, hooks: impl LifecycleHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Validate the configuration and build the emitter.
    ///
    /// The renderer capacity must equal `max_particles`.
    pub fn build(self) -> Result<Emitter, ConfigError> {
        self.settings.validate()?;
        let renderer = self.renderer.ok_or(ConfigError::MissingRenderer)?;
        if renderer.capacity() != self.settings.max_particles as usize {
            return Err(ConfigError::CapacityMismatch {
                renderer: renderer.capacity(),
                max_particles: self.settings.max_particles,
            });
        }

        let rng = match self.settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Ok(Emitter {
            id: EmitterId::next(),
            particles: Vec::with_capacity(self.settings.max_particles as usize),
            settings: self.settings,
            shape: self.shape,
            renderer,
            hooks: self.hooks,
            emission_time: 0.0,
            num_particles_emitted: 0,
            rng,
            disposed: false,
        })
    }
}

/// A scheduled source of particles with shared physical parameters.
pub struct Emitter {
    id: EmitterId,
    settings: EmitterSettings,
    shape: Box<dyn EmitterShape>,
    renderer: ParticleRenderer,
    hooks: Option<Box<dyn LifecycleHooks>>,
    particles: Vec<Particle>,
    /// Unspent emission time, in seconds.
    emission_time: f64,
    num_particles_emitted: u64,
    rng: SmallRng,
    disposed: bool,
}

impl Emitter {
    /// Start building an emitter with the given settings.
    pub fn builder(settings: EmitterSettings) -> EmitterBuilder {
        EmitterBuilder {
            settings,
            shape: Box::new(Origin),
            renderer: None,
            hooks: None,
        }
    }

    /// Id assigned at build time.
    #[inline]
    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Current settings. [`stop_emission`](Self::stop_emission) zeroes the
    /// emission budget and pool size here.
    #[inline]
    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    /// The live particle pool, in emission order.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Particles emitted since the emitter was built.
    #[inline]
    pub fn num_particles_emitted(&self) -> u64 {
        self.num_particles_emitted
    }

    /// Unspent emission time, in seconds.
    #[inline]
    pub fn emission_time(&self) -> f64 {
        self.emission_time
    }

    /// The renderer fed from this emitter's pool.
    #[inline]
    pub fn renderer(&self) -> &ParticleRenderer {
        &self.renderer
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// True while emission budget remains or particles are still alive.
    pub fn is_active(&self) -> bool {
        self.num_particles_emitted < self.settings.max_emission || !self.particles.is_empty()
    }

    /// Whether the accumulator, budget and pool all allow one more particle.
    pub fn can_create_particle(&self) -> bool {
        self.emission_time >= self.settings.emission_period()
            && self.num_particles_emitted < self.settings.max_emission
            && self.particles.len() < self.settings.max_particles as usize
    }

    /// Advance the emitter by `time.delta` seconds.
    pub fn step(&mut self, time: FrameTime, commands: &mut Commands) -> Result<(), EngineError> {
        if self.disposed {
            error!(emitter = ?self.id, "step on disposed emitter");
            return Err(EngineError::EmitterDisposed(self.id));
        }

        self.update_emission(time, commands);
        self.update_particles(time, commands);

        self.renderer.update_from_particles(&self.particles)
    }

    /// Stop emitting. Live particles keep integrating and retire on schedule.
    pub fn stop_emission(&mut self) {
        self.settings.max_emission = 0;
        self.settings.max_particles = 0;
    }

    /// Flush every live particle through the removal hook, stop emission and
    /// release the renderer.
    ///
    /// Only the first call has any effect.
    pub fn dispose(&mut self, commands: &mut Commands) {
        if self.disposed {
            warn!(emitter = ?self.id, "emitter disposed twice");
            return;
        }
        self.disposed = true;

        if let Some(hooks) = self.hooks.as_mut() {
            for particle in self.particles.iter_mut() {
                hooks.on_remove(particle, commands);
            }
        }
        self.stop_emission();
        self.particles.clear();
        self.renderer.dispose();
        debug!(emitter = ?self.id, emitted = self.num_particles_emitted, "emitter disposed");
    }

    fn update_emission(&mut self, time: FrameTime, commands: &mut Commands) {
        self.emission_time += time.delta as f64;
        let period = self.settings.emission_period();
        while self.can_create_particle() {
            self.emission_time -= period;
            self.num_particles_emitted += 1;
            let particle = self.emit_particle(commands);
            self.particles.push(particle);
        }
    }

    fn emit_particle(&mut self, commands: &mut Commands) -> Particle {
        let settings = &self.settings;
        let mut particle = self.shape.emit(&mut self.rng);
        particle.id = ParticleId(self.rng.gen());
        particle.max_life = settings.max_life;

        let direction = spawn::cone_direction(&mut self.rng, settings.rotation_angular_variance);
        let speed = settings.velocity_magnitude
            + spawn::spread(&mut self.rng, settings.velocity_magnitude_variance);
        particle.velocity = settings.rotation * (direction * speed);

        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_create(&mut particle, commands);
        }
        particle
    }

    /// Retire particles that reached `max_life` on an earlier step, then
    /// integrate the rest. A particle therefore spends exactly one rendered
    /// frame at the end of its life curve before it leaves the pool.
    fn update_particles(&mut self, time: FrameTime, commands: &mut Commands) {
        let dt = time.delta;
        let gravity = self.settings.gravity * self.settings.gravity_strength;
        let drag = self.settings.drag_coefficient;
        let hooks = &mut self.hooks;

        self.particles.retain_mut(|particle| {
            if particle.is_expired() {
                if let Some(hooks) = hooks.as_mut() {
                    hooks.on_remove(particle, commands);
                }
                return false;
            }

            particle.age = (particle.age + dt).min(particle.max_life);

            let force = gravity - particle.velocity * drag;
            particle.velocity += force * dt;
            particle.position += particle.velocity * dt;

            if let Some(hooks) = hooks.as_mut() {
                hooks.on_update(particle, commands);
            }
            true
        });
    }
}

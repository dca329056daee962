//! The particle record owned by an emitter's pool.

use glam::Vec3;

/// Opaque random identity of a particle.
///
/// Tokens are drawn from the emitter's RNG and are not guaranteed to be
/// unique. Observers that key side tables by id must tolerate collisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParticleId(pub u32);

impl ParticleId {
    /// Map the token into `[0, 1)` for the renderer's data attribute.
    ///
    /// Only the top 24 bits are kept so the result is exact in `f32`.
    #[inline]
    pub fn as_unit_f32(self) -> f32 {
        (self.0 >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// A single simulated particle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    /// Seconds since emission, clamped to `max_life`.
    pub age: f32,
    pub max_life: f32,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Particle {
    /// A zeroed particle placed at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Normalized age in `[0, 1]`, or 0 for a particle without a lifetime.
    #[inline]
    pub fn life_fraction(&self) -> f32 {
        if self.max_life > 0.0 {
            self.age / self.max_life
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.max_life
    }
}

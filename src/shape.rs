//! Spawn-site strategies for emitters.
//!
//! A shape only decides where a new particle starts. Velocity, lifetime and
//! identity are filled in by the [`Emitter`](crate::Emitter).
//!
//! | Shape | Spawn site |
//! |-------|------------|
//! | [`Origin`] | Always the local origin |
//! | [`PointShape`] | A movable [`SpawnPoint`] |
//! | [`SphereShape`] | Uniform on a sphere surface |
//! | [`BoxShape`] | Uniform inside a box volume |

use glam::Vec3;
use rand::rngs::SmallRng;
use std::cell::Cell;
use std::rc::Rc;

use crate::particle::Particle;
use crate::spawn;

/// Produces freshly constructed particles positioned at a spawn site.
pub trait EmitterShape {
    /// Return a new particle whose position is the current spawn site.
    ///
    /// All other fields are left at their zero defaults.
    fn emit(&mut self, rng: &mut SmallRng) -> Particle;
}

/// Spawns every particle at the origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Origin;

impl EmitterShape for Origin {
    fn emit(&mut self, _rng: &mut SmallRng) -> Particle {
        Particle::default()
    }
}

/// Shared, movable spawn position.
///
/// Clones refer to the same position, so the owner of one handle can drag
/// a [`PointShape`] around while the emitter holds the other.
#[derive(Clone, Debug, Default)]
pub struct SpawnPoint(Rc<Cell<Vec3>>);

impl SpawnPoint {
    pub fn new(position: Vec3) -> Self {
        Self(Rc::new(Cell::new(position)))
    }

    #[inline]
    pub fn get(&self) -> Vec3 {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, position: Vec3) {
        self.0.set(position);
    }
}

/// Spawns particles at a single point that may move between emissions.
#[derive(Clone, Debug, Default)]
pub struct PointShape {
    point: SpawnPoint,
}

impl PointShape {
    pub fn new(position: Vec3) -> Self {
        Self {
            point: SpawnPoint::new(position),
        }
    }

    /// Handle for moving this shape from outside the emitter.
    pub fn spawn_point(&self) -> SpawnPoint {
        self.point.clone()
    }
}

impl EmitterShape for PointShape {
    fn emit(&mut self, _rng: &mut SmallRng) -> Particle {
        Particle::at(self.point.get())
    }
}

/// Spawns particles on the surface of a sphere.
#[derive(Clone, Copy, Debug)]
pub struct SphereShape {
    pub center: Vec3,
    pub radius: f32,
}

impl EmitterShape for SphereShape {
    fn emit(&mut self, rng: &mut SmallRng) -> Particle {
        Particle::at(self.center + spawn::random_on_sphere(rng, self.radius))
    }
}

/// Spawns particles inside an axis-aligned box.
#[derive(Clone, Copy, Debug)]
pub struct BoxShape {
    pub min: Vec3,
    pub max: Vec3,
}

impl EmitterShape for BoxShape {
    fn emit(&mut self, rng: &mut SmallRng) -> Particle {
        Particle::at(spawn::random_in_box(rng, self.min, self.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_origin_emits_default() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(Origin.emit(&mut rng), Particle::default());
    }

    #[test]
    fn test_point_shape_follows_spawn_point() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut shape = PointShape::new(Vec3::new(1.0, 2.0, 3.0));
        let handle = shape.spawn_point();

        assert_eq!(shape.emit(&mut rng).position, Vec3::new(1.0, 2.0, 3.0));

        handle.set(Vec3::new(-4.0, 0.0, 9.0));
        let p = shape.emit(&mut rng);
        assert_eq!(p.position, Vec3::new(-4.0, 0.0, 9.0));
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(p.age, 0.0);
        assert_eq!(p.max_life, 0.0);
    }

    #[test]
    fn test_sphere_shape_surface() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut shape = SphereShape {
            center: Vec3::new(0.0, 5.0, 0.0),
            radius: 2.0,
        };
        for _ in 0..50 {
            let p = shape.emit(&mut rng);
            assert!(((p.position - shape.center).length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_box_shape_inside() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut shape = BoxShape {
            min: Vec3::new(-1.0, 2.0, -3.0),
            max: Vec3::new(1.0, 2.5, 3.0),
        };
        for _ in 0..50 {
            let p = shape.emit(&mut rng);
            assert!(p.position.cmpge(shape.min).all());
            assert!(p.position.cmple(shape.max).all());
            assert_eq!(p.velocity, Vec3::ZERO);
            assert_eq!(p.max_life, 0.0);
        }
    }
}

//! Fixed-capacity render buffers fed from an emitter's particle pool.
//!
//! Each [`ParticleRenderer`] owns two attribute arrays sized once, at
//! construction, to the emitter's `max_particles`:
//!
//! | Attribute | Layout | Contents |
//! |-----------|--------|----------|
//! | position | `[f32; 3]` | particle position |
//! | data | [`LifeData`] | `(age / max_life, id)` |
//!
//! Every frame only the first `n` slots are rewritten and the draw range is
//! set to `0..n`. Nothing is allocated after construction.

use bytemuck::{Pod, Zeroable};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

use crate::error::EngineError;
use crate::material::{MaterialId, MaterialLease};
use crate::particle::Particle;
use glam::Vec3;

static NEXT_RENDERABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a renderable attached to a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderableId(u64);

/// Container that renderables attach to while they are alive.
pub trait Scene {
    fn add(&mut self, renderable: RenderableId);
    fn remove(&mut self, renderable: RenderableId);
}

/// Shared handle to the scene node renderers attach to.
pub type SceneHandle = Rc<RefCell<dyn Scene>>;

/// Simple scene node: a set of attached renderables under one offset.
#[derive(Debug, Default)]
pub struct SceneGroup {
    /// World-space offset applied to every child.
    pub position: Vec3,
    children: Vec<RenderableId>,
}

impl SceneGroup {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[RenderableId] {
        &self.children
    }

    pub fn contains(&self, renderable: RenderableId) -> bool {
        self.children.contains(&renderable)
    }
}

impl Scene for SceneGroup {
    fn add(&mut self, renderable: RenderableId) {
        if !self.children.contains(&renderable) {
            self.children.push(renderable);
        }
    }

    fn remove(&mut self, renderable: RenderableId) {
        self.children.retain(|&c| c != renderable);
    }
}

/// Per-particle data attribute.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LifeData {
    /// `age / max_life`, in `[0, 1]`.
    pub life_fraction: f32,
    /// Particle id mapped into `[0, 1)`.
    pub id: f32,
}

/// Writes particle attributes into fixed-size buffers for drawing.
pub struct ParticleRenderer {
    id: RenderableId,
    capacity: usize,
    positions: Vec<[f32; 3]>,
    data: Vec<LifeData>,
    draw_count: usize,
    /// Bumped on every update so uploaders can skip unchanged buffers.
    generation: u64,
    material: Option<MaterialLease>,
    material_id: MaterialId,
    scene: SceneHandle,
    disposed: bool,
}

impl ParticleRenderer {
    /// Allocate buffers for `capacity` particles and attach to `scene`.
    pub fn new(capacity: usize, material: MaterialLease, scene: SceneHandle) -> Self {
        let id = RenderableId(NEXT_RENDERABLE_ID.fetch_add(1, Ordering::Relaxed));
        scene.borrow_mut().add(id);

        Self {
            id,
            capacity,
            positions: vec![[0.0; 3]; capacity],
            data: vec![LifeData::default(); capacity],
            draw_count: 0,
            generation: 0,
            material_id: material.id(),
            material: Some(material),
            scene,
            disposed: false,
        }
    }

    #[inline]
    pub fn id(&self) -> RenderableId {
        self.id
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn material(&self) -> MaterialId {
        self.material_id
    }

    /// Slots considered live for drawing.
    #[inline]
    pub fn draw_range(&self) -> Range<usize> {
        0..self.draw_count
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Positions inside the draw range.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions[self.draw_range()]
    }

    /// Life data inside the draw range.
    pub fn life_data(&self) -> &[LifeData] {
        &self.data[self.draw_range()]
    }

    /// Raw bytes of the live position slots, ready for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions())
    }

    /// Raw bytes of the live data slots, ready for upload.
    pub fn data_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.life_data())
    }

    /// Overwrite slots `0..particles.len()` and set the draw range to match.
    ///
    /// The owning emitter guarantees `particles.len() <= capacity`. Extra
    /// particles are a bug: they trip a debug assertion and are dropped.
    pub fn update_from_particles(&mut self, particles: &[Particle]) -> Result<(), EngineError> {
        if self.disposed {
            error!(renderable = ?self.id, "update on disposed renderer");
            return Err(EngineError::RendererDisposed(self.id));
        }
        debug_assert!(
            particles.len() <= self.capacity,
            "{} particles exceed renderer capacity {}",
            particles.len(),
            self.capacity
        );

        let count = particles.len().min(self.capacity);
        let slots = self.positions[..count].iter_mut().zip(&mut self.data[..count]);
        for ((position, data), p) in slots.zip(particles) {
            *position = p.position.to_array();
            *data = LifeData {
                life_fraction: p.life_fraction(),
                id: p.id.as_unit_f32(),
            };
        }

        self.draw_count = count;
        self.generation += 1;
        Ok(())
    }

    /// Detach from the scene and release buffers and material.
    ///
    /// Calling this twice is harmless; the second call only logs a warning.
    pub fn dispose(&mut self) {
        if self.disposed {
            warn!(renderable = ?self.id, "renderer disposed twice");
            return;
        }
        self.disposed = true;

        self.scene.borrow_mut().remove(self.id);
        self.positions = Vec::new();
        self.data = Vec::new();
        self.draw_count = 0;
        if let Some(lease) = self.material.take() {
            lease.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{BlendMode, MaterialLibrary, ParticleMaterial};
    use crate::particle::ParticleId;
    use crate::time::FrameTime;

    fn setup(capacity: usize) -> (MaterialLibrary, Rc<RefCell<SceneGroup>>, ParticleRenderer) {
        let mut lib = MaterialLibrary::new();
        let base = lib.insert(ParticleMaterial::new("test", BlendMode::Normal));
        let lease = lib.lease_clone(base).unwrap();
        let scene = Rc::new(RefCell::new(SceneGroup::default()));
        let renderer = ParticleRenderer::new(capacity, lease, scene.clone());
        (lib, scene, renderer)
    }

    fn particle(x: f32, age: f32, id: u32) -> Particle {
        Particle {
            id: ParticleId(id),
            age,
            max_life: 2.0,
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::ZERO,
        }
    }

    #[test]
    fn test_attaches_to_scene() {
        let (_lib, scene, renderer) = setup(4);
        assert!(scene.borrow().contains(renderer.id()));
        assert_eq!(renderer.capacity(), 4);
        assert_eq!(renderer.draw_range(), 0..0);
    }

    #[test]
    fn test_update_writes_slots_and_range() {
        let (_lib, _scene, mut renderer) = setup(4);
        let particles = [particle(1.0, 0.5, 0), particle(2.0, 1.0, 256)];
        renderer.update_from_particles(&particles).unwrap();

        assert_eq!(renderer.draw_range(), 0..2);
        assert_eq!(renderer.positions(), &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(renderer.life_data()[0].life_fraction, 0.25);
        assert_eq!(renderer.life_data()[1].life_fraction, 0.5);
        assert_eq!(renderer.life_data()[1].id, ParticleId(256).as_unit_f32());
        assert_eq!(renderer.position_bytes().len(), 2 * 12);
        assert_eq!(renderer.data_bytes().len(), 2 * 8);
        assert_eq!(renderer.generation(), 1);

        // Shrinking the pool shrinks the range, capacity is untouched
        renderer.update_from_particles(&particles[..1]).unwrap();
        assert_eq!(renderer.draw_range(), 0..1);
        assert_eq!(renderer.capacity(), 4);
    }

    #[test]
    fn test_dispose_detaches_and_releases_material() {
        let (mut lib, scene, mut renderer) = setup(4);
        let material = renderer.material();
        renderer.dispose();

        assert!(renderer.is_disposed());
        assert!(!scene.borrow().contains(renderer.id()));
        assert_eq!(renderer.draw_range(), 0..0);

        lib.update(FrameTime::default());
        assert!(!lib.is_live(material));

        // Second dispose is a no-op
        renderer.dispose();
        assert!(renderer.is_disposed());
    }

    #[test]
    fn test_update_after_dispose_fails() {
        let (_lib, _scene, mut renderer) = setup(2);
        renderer.dispose();
        let result = renderer.update_from_particles(&[particle(0.0, 0.0, 1)]);
        assert!(matches!(result, Err(EngineError::RendererDisposed(_))));
    }
}

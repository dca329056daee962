//! Particle materials and their owning library.
//!
//! Materials are cloned per emitter and updated every frame (`uTime`) and on
//! viewport resize (`uResolution`). The [`MaterialLibrary`] owns every
//! material. A renderer only holds a [`MaterialLease`]: when it is disposed
//! it pushes a disposal event through the lease, and the library drops the
//! material on its next [`update`](MaterialLibrary::update). Nobody polls a
//! flag on a shared object.

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use std::collections::HashMap;
use tracing::debug;

use crate::error::EngineError;
use crate::time::FrameTime;
use crate::uniforms::MaterialUniforms;

/// Uniform receiving the elapsed time each frame.
pub const U_TIME: &str = "uTime";
/// Uniform receiving the drawable size in physical pixels.
pub const U_RESOLUTION: &str = "uResolution";

/// Identity of a material inside a [`MaterialLibrary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

/// How overlapping particles combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending.
    #[default]
    Normal,
    /// Colors add up; overlapping particles glow.
    Additive,
}

/// Viewport size notification from the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Drawable size in physical pixels.
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width * self.pixel_ratio, self.height * self.pixel_ratio)
    }
}

/// Shader parameters and render state of a particle material.
#[derive(Clone, Debug)]
pub struct ParticleMaterial {
    pub name: String,
    pub uniforms: MaterialUniforms,
    pub blend: BlendMode,
    pub transparent: bool,
    pub depth_write: bool,
}

impl ParticleMaterial {
    /// Transparent material without depth writes, the usual particle setup.
    pub fn new(name: impl Into<String>, blend: BlendMode) -> Self {
        Self {
            name: name.into(),
            uniforms: MaterialUniforms::new(),
            blend,
            transparent: true,
            depth_write: false,
        }
    }

    pub fn with_uniform<V: Into<crate::uniforms::UniformValue>>(mut self, name: &str, value: V) -> Self {
        self.uniforms.set(name, value);
        self
    }

    /// Packed numeric uniforms for upload.
    pub fn uniform_bytes(&self) -> Vec<u8> {
        self.uniforms.to_bytes()
    }
}

/// A renderer's right to dispose one material.
///
/// Dropping a lease without calling [`release`](Self::release) keeps the
/// material alive in the library.
#[derive(Debug)]
pub struct MaterialLease {
    id: MaterialId,
    notifier: Sender<MaterialId>,
}

impl MaterialLease {
    #[inline]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Notify the owning library that the material is no longer used.
    pub fn release(self) {
        // The library may already be gone; nothing left to notify then.
        let _ = self.notifier.send(self.id);
    }
}

/// Owner of every particle material.
pub struct MaterialLibrary {
    materials: HashMap<MaterialId, ParticleMaterial>,
    next_id: u64,
    disposals_tx: Sender<MaterialId>,
    disposals_rx: Receiver<MaterialId>,
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialLibrary {
    pub fn new() -> Self {
        let (disposals_tx, disposals_rx) = crossbeam_channel::unbounded();
        Self {
            materials: HashMap::new(),
            next_id: 0,
            disposals_tx,
            disposals_rx,
        }
    }

    pub fn insert(&mut self, material: ParticleMaterial) -> MaterialId {
        let id = MaterialId(self.next_id);
        self.next_id += 1;
        self.materials.insert(id, material);
        id
    }

    /// Insert an independent copy of an existing material.
    pub fn clone_material(&mut self, id: MaterialId) -> Result<MaterialId, EngineError> {
        let copy = self.get(id)?.clone();
        Ok(self.insert(copy))
    }

    /// Hand out the disposal right for a material.
    pub fn lease(&self, id: MaterialId) -> Result<MaterialLease, EngineError> {
        self.get(id)?;
        Ok(MaterialLease {
            id,
            notifier: self.disposals_tx.clone(),
        })
    }

    /// Clone `base` and lease the copy in one go.
    pub fn lease_clone(&mut self, base: MaterialId) -> Result<MaterialLease, EngineError> {
        let id = self.clone_material(base)?;
        self.lease(id)
    }

    /// Borrow a material the library still owns.
    pub fn get(&self, id: MaterialId) -> Result<&ParticleMaterial, EngineError> {
        self.materials.get(&id).ok_or(EngineError::UnknownMaterial(id))
    }

    /// Mutably borrow a material the library still owns.
    pub fn get_mut(&mut self, id: MaterialId) -> Result<&mut ParticleMaterial, EngineError> {
        self.materials.get_mut(&id).ok_or(EngineError::UnknownMaterial(id))
    }

    /// Whether the material is still owned by the library.
    pub fn is_live(&self, id: MaterialId) -> bool {
        self.get(id).is_ok()
    }

    /// Number of materials currently owned.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Drop materials whose renderers were disposed. Returns how many went.
    pub fn collect_disposed(&mut self) -> usize {
        let mut released = 0;
        for id in self.disposals_rx.try_iter() {
            if let Some(material) = self.materials.remove(&id) {
                debug!(material = %material.name, ?id, "material released");
                released += 1;
            }
        }
        released
    }

    /// Per-frame update: release disposed materials, then advance `uTime`.
    pub fn update(&mut self, time: FrameTime) {
        self.collect_disposed();
        for material in self.materials.values_mut() {
            material.uniforms.set(U_TIME, time.elapsed);
        }
    }

    /// Forward a viewport change to every live material.
    pub fn resize(&mut self, viewport: Viewport) {
        let resolution = viewport.resolution();
        for material in self.materials.values_mut() {
            material.uniforms.set(U_RESOLUTION, resolution);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::UniformValue;

    fn library_with_base() -> (MaterialLibrary, MaterialId) {
        let mut lib = MaterialLibrary::new();
        let base = lib.insert(
            ParticleMaterial::new("firework", BlendMode::Additive)
                .with_uniform(U_TIME, 0.0f32)
                .with_uniform("uSize", 0.5f32),
        );
        (lib, base)
    }

    #[test]
    fn test_clone_is_independent() {
        let (mut lib, base) = library_with_base();
        let copy = lib.clone_material(base).unwrap();
        lib.get_mut(copy).unwrap().uniforms.set("uSize", 2.0f32);

        assert_eq!(lib.get(base).unwrap().uniforms.get("uSize"), Some(&UniformValue::F32(0.5)));
        assert_eq!(lib.get(copy).unwrap().uniforms.get("uSize"), Some(&UniformValue::F32(2.0)));
    }

    #[test]
    fn test_release_is_collected_on_update() {
        let (mut lib, base) = library_with_base();
        let lease = lib.lease_clone(base).unwrap();
        let id = lease.id();
        assert_eq!(lib.len(), 2);

        lease.release();
        // Still present until the library drains its events
        assert!(lib.is_live(id));

        lib.update(FrameTime::new(0.016, 1.0));
        assert!(!lib.is_live(id));
        assert_eq!(lib.len(), 1);
        assert!(matches!(lib.get(id), Err(EngineError::UnknownMaterial(_))));
    }

    #[test]
    fn test_collect_disposed_drops_each_material_once() {
        let (mut lib, base) = library_with_base();
        let copy = lib.clone_material(base).unwrap();
        let first = lib.lease(copy).unwrap();
        let second = lib.lease(copy).unwrap();

        first.release();
        second.release();
        assert_eq!(lib.collect_disposed(), 1);
        assert_eq!(lib.collect_disposed(), 0);
        assert!(!lib.is_live(copy));
        assert!(lib.get_mut(copy).is_err());
        assert!(lib.is_live(base));
    }

    #[test]
    fn test_update_sets_time() {
        let (mut lib, base) = library_with_base();
        lib.update(FrameTime::new(0.5, 12.5));
        assert_eq!(lib.get(base).unwrap().uniforms.get(U_TIME), Some(&UniformValue::F32(12.5)));
    }

    #[test]
    fn test_resize_sets_resolution() {
        let (mut lib, base) = library_with_base();
        lib.resize(Viewport {
            width: 800.0,
            height: 600.0,
            pixel_ratio: 2.0,
        });
        assert_eq!(
            lib.get(base).unwrap().uniforms.get(U_RESOLUTION),
            Some(&UniformValue::Vec2(Vec2::new(1600.0, 1200.0)))
        );
    }

    #[test]
    fn test_unknown_material() {
        let (mut lib, _) = library_with_base();
        let missing = MaterialId(99);
        assert!(lib.lease(missing).is_err());
        assert!(lib.clone_material(missing).is_err());
    }
}

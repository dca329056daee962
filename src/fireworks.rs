//! Firework show: a fixed three-level emitter cascade.
//!
//! ```text
//! trail emitter ──on_create──▶ smoke emitter (follows the shell)
//!       │
//!       └──────on_remove──▶ stop smoke + pop emitter at the final position
//! ```
//!
//! Shells rise from the trail emitter. Each shell drags a smoke emitter
//! behind it through a [`SpawnPoint`] side table. When the shell expires its
//! smoke emitter stops and drains, and a pop emitter bursts where the shell
//! ended. Smoke and pop emitters have no hooks, so the cascade never goes
//! deeper than three levels.
//!
//! The show waits for its map textures behind a [`StartupBarrier`] and only
//! starts once both have loaded (or the timeout passed).

use glam::Vec3;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{error, info, warn};

use crate::config::{EmitterSettings, ShowSettings};
use crate::emitter::Emitter;
use crate::error::EngineError;
use crate::hooks::{Commands, EmitterId, LifecycleHooks};
use crate::material::{BlendMode, MaterialId, MaterialLibrary, ParticleMaterial, Viewport, U_RESOLUTION, U_TIME};
use crate::particle::{Particle, ParticleId};
use crate::renderer::{ParticleRenderer, SceneGroup, SceneHandle};
use crate::shape::{EmitterShape, PointShape, SpawnPoint};
use crate::startup::{BarrierState, Prerequisite, StartupBarrier};
use crate::system::ParticleSystem;
use crate::time::FrameTime;
use crate::uniforms::TextureHandle;

/// Texture used in place of a map that never loaded.
pub const FALLBACK_TEXTURE: TextureHandle = TextureHandle(0);

/// Lookup textures baked by the external keyframe curve utility.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurveTextures {
    pub firework_size: Option<TextureHandle>,
    pub firework_color: Option<TextureHandle>,
    pub firework_twinkle: Option<TextureHandle>,
    pub smoke_size: Option<TextureHandle>,
    pub smoke_color: Option<TextureHandle>,
}

/// Resources the show needs before it can start.
pub struct ShowAssets {
    pub star_map: Prerequisite<TextureHandle>,
    pub smoke_map: Prerequisite<TextureHandle>,
    pub curves: CurveTextures,
    /// Seconds to wait for the maps before falling back.
    pub load_timeout: Option<f32>,
}

/// Builds the three emitter kinds against shared materials and scene.
#[derive(Clone)]
struct EmitterFactory {
    materials: Rc<RefCell<MaterialLibrary>>,
    scene: SceneHandle,
    firework_material: MaterialId,
    smoke_material: MaterialId,
    settings: Rc<ShowSettings>,
}

impl EmitterFactory {
    fn build(
        &self,
        settings: &EmitterSettings,
        base_material: MaterialId,
        shape: impl EmitterShape + 'static,
    ) -> Result<Emitter, EngineError> {
        // Checked before the renderer attaches to the scene
        settings.validate()?;
        let lease = self.materials.borrow_mut().lease_clone(base_material)?;
        let renderer = ParticleRenderer::new(settings.max_particles as usize, lease, self.scene.clone());
        Ok(Emitter::builder(settings.clone())
            .shape(shape)
            .renderer(renderer)
            .build()?)
    }

    fn trail(&self) -> Result<Emitter, EngineError> {
        let settings = &self.settings.trail;
        settings.validate()?;
        let lease = self.materials.borrow_mut().lease_clone(self.firework_material)?;
        let renderer = ParticleRenderer::new(settings.max_particles as usize, lease, self.scene.clone());
        let hooks = TrailHooks {
            factory: self.clone(),
            links: HashMap::new(),
        };
        Ok(Emitter::builder(settings.clone())
            .shape(PointShape::default())
            .renderer(renderer)
            .hooks(hooks)
            .build()?)
    }

    fn smoke(&self, shape: PointShape) -> Result<Emitter, EngineError> {
        self.build(&self.settings.smoke, self.smoke_material, shape)
    }

    fn pop(&self, position: Vec3) -> Result<Emitter, EngineError> {
        self.build(&self.settings.pop, self.firework_material, PointShape::new(position))
    }
}

/// Smoke emitter linked to a live shell.
struct SmokeLink {
    spawn_point: SpawnPoint,
    emitter: EmitterId,
}

/// Hooks of the trail emitter, owning the shell -> smoke side table.
struct TrailHooks {
    factory: EmitterFactory,
    links: HashMap<ParticleId, SmokeLink>,
}

impl LifecycleHooks for TrailHooks {
    fn on_create(&mut self, particle: &mut Particle, commands: &mut Commands) {
        let shape = PointShape::new(particle.position);
        let spawn_point = shape.spawn_point();
        match self.factory.smoke(shape) {
            Ok(smoke) => {
                let emitter = commands.spawn(smoke);
                // Ids may collide; a collision only loses the older link
                self.links.insert(particle.id, SmokeLink { spawn_point, emitter });
            }
            Err(e) => error!(error = %e, "failed to build smoke emitter"),
        }
    }

    fn on_update(&mut self, particle: &mut Particle, _commands: &mut Commands) {
        if let Some(link) = self.links.get(&particle.id) {
            link.spawn_point.set(particle.position);
        }
    }

    fn on_remove(&mut self, particle: &mut Particle, commands: &mut Commands) {
        if let Some(link) = self.links.remove(&particle.id) {
            commands.stop(link.emitter);
        }
        match self.factory.pop(particle.position) {
            Ok(pop) => {
                commands.spawn(pop);
            }
            Err(e) => error!(error = %e, "failed to build pop emitter"),
        }
    }
}

enum ShowState {
    Loading {
        barrier: StartupBarrier<TextureHandle>,
        curves: CurveTextures,
    },
    Running,
    /// Startup failed; the reason is reported on every later update.
    Failed(String),
}

/// Self-contained firework cascade driven by per-frame ticks.
pub struct FireworkShow {
    system: ParticleSystem,
    materials: Rc<RefCell<MaterialLibrary>>,
    scene: Rc<RefCell<SceneGroup>>,
    settings: Rc<ShowSettings>,
    viewport: Viewport,
    state: ShowState,
}

impl FireworkShow {
    pub fn new(assets: ShowAssets, viewport: Viewport, settings: ShowSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        let mut barrier = StartupBarrier::new(vec![assets.star_map, assets.smoke_map]);
        if let Some(timeout) = assets.load_timeout {
            barrier = barrier.with_timeout(timeout);
        }

        Ok(Self {
            system: ParticleSystem::new(),
            materials: Rc::new(RefCell::new(MaterialLibrary::new())),
            scene: Rc::new(RefCell::new(SceneGroup::new(Vec3::new(0.0, settings.scene_offset_y, 0.0)))),
            settings: Rc::new(settings),
            viewport,
            state: ShowState::Loading {
                barrier,
                curves: assets.curves,
            },
        })
    }

    /// Whether the startup barrier has been crossed.
    pub fn is_running(&self) -> bool {
        matches!(self.state, ShowState::Running)
    }

    /// The emitters driven by this show.
    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Scene group every renderer attaches to.
    pub fn scene(&self) -> Rc<RefCell<SceneGroup>> {
        self.scene.clone()
    }

    /// Library owning the base materials and their per-emitter copies.
    pub fn materials(&self) -> Rc<RefCell<MaterialLibrary>> {
        self.materials.clone()
    }

    /// Advance the show by one frame.
    pub fn update(&mut self, time: FrameTime) -> Result<(), EngineError> {
        if let ShowState::Failed(reason) = &self.state {
            return Err(EngineError::ShowFailed(reason.clone()));
        }
        if let ShowState::Loading { barrier, curves } = &mut self.state {
            let textures = match barrier.poll(time.elapsed) {
                BarrierState::Pending => None,
                BarrierState::Ready => Some(barrier.take()?),
                BarrierState::TimedOut | BarrierState::Failed(_) => {
                    warn!(pending = ?barrier.pending(), "starting show with fallback textures");
                    Some(barrier.take_or(FALLBACK_TEXTURE)?)
                }
                BarrierState::Consumed => return Err(EngineError::NotReady(Vec::new())),
            };
            if let Some(textures) = textures {
                let curves = *curves;
                if let Err(e) = self.start(&textures, curves) {
                    error!(error = %e, "firework show failed to start");
                    self.state = ShowState::Failed(e.to_string());
                    return Err(e);
                }
            }
        }

        self.system.step(time)?;
        self.materials.borrow_mut().update(time);
        Ok(())
    }

    /// Forward a viewport change to every material.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.materials.borrow_mut().resize(viewport);
    }

    fn start(&mut self, textures: &[TextureHandle], curves: CurveTextures) -> Result<(), EngineError> {
        let (star_map, smoke_map) = match textures {
            [star, smoke] => (*star, *smoke),
            _ => return Err(EngineError::NotReady(vec!["star".into(), "smoke".into()])),
        };

        let resolution = self.viewport.resolution();
        let size = self.settings.point_size;
        let (firework_material, smoke_material) = {
            let mut materials = self.materials.borrow_mut();
            let firework = materials.insert(
                ParticleMaterial::new("firework", BlendMode::Additive)
                    .with_uniform("uMap", star_map)
                    .with_uniform(U_TIME, 0.0f32)
                    .with_uniform(U_RESOLUTION, resolution)
                    .with_uniform("uSize", size)
                    .with_uniform("uSizeOverLife", curves.firework_size)
                    .with_uniform("uColorOverLife", curves.firework_color)
                    .with_uniform("uTwinkleOverLife", curves.firework_twinkle),
            );
            let smoke = materials.insert(
                ParticleMaterial::new("smoke", BlendMode::Normal)
                    .with_uniform("uMap", smoke_map)
                    .with_uniform(U_TIME, 0.0f32)
                    .with_uniform(U_RESOLUTION, resolution)
                    .with_uniform("uSize", size)
                    .with_uniform("uSizeOverLife", curves.smoke_size)
                    .with_uniform("uColorOverLife", curves.smoke_color)
                    .with_uniform("uTwinkleOverLife", None::<TextureHandle>),
            );
            (firework, smoke)
        };

        let factory = EmitterFactory {
            materials: self.materials.clone(),
            scene: self.scene.clone(),
            firework_material,
            smoke_material,
            settings: self.settings.clone(),
        };
        let trail = factory.trail()?;
        let id = self.system.add_emitter(trail);
        info!(trail = ?id, "firework show started");

        self.state = ShowState::Running;
        Ok(())
    }
}

//! Error types for Ember.
//!
//! Configuration problems are reported when an emitter is built, never
//! silently clamped. Runtime errors only cover programmer misuse such as
//! stepping a disposed emitter or reading a prerequisite that has not loaded.

use thiserror::Error;

use crate::hooks::EmitterId;
use crate::material::MaterialId;
use crate::renderer::RenderableId;

/// Errors raised while validating emitter configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Emission rate must be finite and strictly positive.
    #[error("emission rate must be > 0, got {0}")]
    InvalidEmissionRate(f32),
    /// Particle lifetime must be finite and strictly positive.
    #[error("max life must be > 0, got {0}")]
    InvalidMaxLife(f32),
    /// The particle pool must hold at least one particle.
    #[error("max particles must be at least 1")]
    ZeroCapacity,
    /// The renderer buffer does not match the emitter's pool size.
    #[error("renderer capacity {renderer} does not match max particles {max_particles}")]
    CapacityMismatch {
        /// Slots allocated by the renderer.
        renderer: usize,
        /// Pool size requested by the settings.
        max_particles: u32,
    },
    /// A numeric field is NaN or infinite.
    #[error("{0} must be finite")]
    NonFinite(&'static str),
    /// A field that must be non-negative is negative.
    #[error("{field} must be >= 0, got {value}")]
    Negative {
        /// Name of the offending setting.
        field: &'static str,
        /// Value that was rejected.
        value: f32,
    },
    /// The builder was finished without a renderer.
    #[error("emitter requires a renderer")]
    MissingRenderer,
}

/// Errors that can occur while running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// An emitter was used after `dispose()`.
    #[error("emitter {0:?} used after dispose")]
    EmitterDisposed(EmitterId),
    /// A renderer was used after `dispose()`.
    #[error("renderer {0:?} used after dispose")]
    RendererDisposed(RenderableId),
    /// The material is unknown to the library or was already released.
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),
    /// A dependent resource was read before its startup barrier resolved.
    #[error("prerequisites not ready: {0:?}")]
    NotReady(Vec<String>),
    /// The firework show could not start; holds the original failure.
    #[error("firework show failed to start: {0}")]
    ShowFailed(String),
    /// A settings file could not be parsed.
    #[error("failed to parse settings: {0}")]
    Settings(#[from] serde_json::Error),
    /// A settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
}

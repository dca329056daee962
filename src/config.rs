//! Emitter configuration.
//!
//! [`EmitterSettings`] holds every numeric parameter an emitter needs. It is
//! plain data: clone it, tweak it with the `with_*` setters, or load it from
//! JSON. Validation happens once, when the emitter is built.
//!
//! # Example
//!
//! ```ignore
//! let smoke = EmitterSettings::default()
//!     .with_max_life(2.0)
//!     .with_velocity(4.0, 2.0)
//!     .with_emission(100.0, 500)
//!     .with_max_particles(500)
//!     .with_drag(0.5);
//! ```

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;

use crate::error::{ConfigError, EngineError};

/// `max_emission` value for emitters that never run out.
pub const UNBOUNDED_EMISSION: u64 = u64::MAX;

/// Standard gravity pointing down -Y.
pub const EARTH_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Physical and scheduling parameters of one emitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Lifetime of every emitted particle, in seconds.
    pub max_life: f32,
    /// Base launch speed.
    pub velocity_magnitude: f32,
    /// Full width of the uniform speed jitter around `velocity_magnitude`.
    pub velocity_magnitude_variance: f32,
    /// Orientation applied to the local +Y launch cone.
    pub rotation: Quat,
    /// Half-angle of the launch cone, in radians.
    pub rotation_angular_variance: f32,
    pub gravity: Vec3,
    pub gravity_strength: f32,
    pub drag_coefficient: f32,
    /// Size of the particle pool and of the renderer buffer.
    pub max_particles: u32,
    /// Particles per second.
    pub emission_rate: f32,
    /// Total particles this emitter may ever emit.
    pub max_emission: u64,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            max_life: 1.0,
            velocity_magnitude: 1.0,
            velocity_magnitude_variance: 0.0,
            rotation: Quat::IDENTITY,
            rotation_angular_variance: 0.0,
            gravity: EARTH_GRAVITY,
            gravity_strength: 0.0,
            drag_coefficient: 0.0,
            max_particles: 100,
            emission_rate: 10.0,
            max_emission: UNBOUNDED_EMISSION,
            seed: None,
        }
    }
}

impl EmitterSettings {
    pub fn with_max_life(mut self, seconds: f32) -> Self {
        self.max_life = seconds;
        self
    }

    /// Set base speed and the full width of its random jitter.
    pub fn with_velocity(mut self, magnitude: f32, variance: f32) -> Self {
        self.velocity_magnitude = magnitude;
        self.velocity_magnitude_variance = variance;
        self
    }

    /// Set cone orientation and half-angle.
    pub fn with_rotation(mut self, rotation: Quat, angular_variance: f32) -> Self {
        self.rotation = rotation;
        self.rotation_angular_variance = angular_variance;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3, strength: f32) -> Self {
        self.gravity = gravity;
        self.gravity_strength = strength;
        self
    }

    pub fn with_drag(mut self, coefficient: f32) -> Self {
        self.drag_coefficient = coefficient;
        self
    }

    pub fn with_max_particles(mut self, count: u32) -> Self {
        self.max_particles = count;
        self
    }

    /// Set emission rate (particles per second) and total emission budget.
    pub fn with_emission(mut self, rate: f32, max_emission: u64) -> Self {
        self.emission_rate = rate;
        self.max_emission = max_emission;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the settings, failing on the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("max_life", self.max_life),
            ("velocity_magnitude", self.velocity_magnitude),
            ("velocity_magnitude_variance", self.velocity_magnitude_variance),
            ("rotation_angular_variance", self.rotation_angular_variance),
            ("gravity_strength", self.gravity_strength),
            ("drag_coefficient", self.drag_coefficient),
            ("emission_rate", self.emission_rate),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(field));
            }
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFinite("gravity"));
        }
        if !self.rotation.is_finite() {
            return Err(ConfigError::NonFinite("rotation"));
        }

        if self.emission_rate <= 0.0 {
            return Err(ConfigError::InvalidEmissionRate(self.emission_rate));
        }
        if self.max_life <= 0.0 {
            return Err(ConfigError::InvalidMaxLife(self.max_life));
        }
        if self.max_particles == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let non_negative = [
            ("velocity_magnitude_variance", self.velocity_magnitude_variance),
            ("rotation_angular_variance", self.rotation_angular_variance),
            ("drag_coefficient", self.drag_coefficient),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        Ok(())
    }

    /// Seconds between two emissions.
    #[inline]
    pub fn emission_period(&self) -> f64 {
        1.0 / self.emission_rate as f64
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Settings for the three emitter kinds of the firework cascade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowSettings {
    /// Rising firework shells.
    pub trail: EmitterSettings,
    /// Smoke following each shell.
    pub smoke: EmitterSettings,
    /// Burst released where a shell expires.
    pub pop: EmitterSettings,
    /// Vertical offset of the scene group holding every renderable.
    pub scene_offset_y: f32,
    /// Base point size written into each material.
    pub point_size: f32,
}

impl Default for ShowSettings {
    fn default() -> Self {
        Self {
            trail: EmitterSettings::default()
                .with_max_life(3.0)
                .with_velocity(30.0, 0.0)
                .with_rotation(Quat::IDENTITY, PI / 8.0)
                .with_gravity(EARTH_GRAVITY, 0.4)
                .with_drag(1.0)
                .with_max_particles(100)
                .with_emission(1.0, UNBOUNDED_EMISSION),
            smoke: EmitterSettings::default()
                .with_max_life(2.0)
                .with_velocity(4.0, 2.0)
                .with_rotation(Quat::IDENTITY, PI / 8.0)
                .with_gravity(EARTH_GRAVITY, 0.0)
                .with_drag(0.5)
                .with_max_particles(500)
                .with_emission(100.0, 500),
            pop: EmitterSettings::default()
                .with_max_life(3.0)
                .with_velocity(20.0, 10.0)
                .with_rotation(Quat::IDENTITY, PI * 2.0)
                .with_gravity(EARTH_GRAVITY, 0.3)
                .with_drag(4.0)
                .with_max_particles(500)
                .with_emission(5000.0, 500),
            scene_offset_y: -15.0,
            point_size: 0.5,
        }
    }
}

impl ShowSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trail.validate()?;
        self.smoke.validate()?;
        self.pop.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(EmitterSettings::default().validate(), Ok(()));
        assert_eq!(ShowSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let s = EmitterSettings::default().with_emission(0.0, 10);
        assert_eq!(s.validate(), Err(ConfigError::InvalidEmissionRate(0.0)));

        let s = EmitterSettings::default().with_emission(-1.0, 10);
        assert_eq!(s.validate(), Err(ConfigError::InvalidEmissionRate(-1.0)));
    }

    #[test]
    fn test_rejects_bad_life_and_capacity() {
        let s = EmitterSettings::default().with_max_life(0.0);
        assert_eq!(s.validate(), Err(ConfigError::InvalidMaxLife(0.0)));

        let s = EmitterSettings::default().with_max_particles(0);
        assert_eq!(s.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_rejects_non_finite_and_negative() {
        let s = EmitterSettings::default().with_drag(f32::NAN);
        assert_eq!(s.validate(), Err(ConfigError::NonFinite("drag_coefficient")));

        let s = EmitterSettings::default().with_drag(-0.5);
        assert_eq!(
            s.validate(),
            Err(ConfigError::Negative {
                field: "drag_coefficient",
                value: -0.5
            })
        );

        let s = EmitterSettings::default().with_gravity(Vec3::new(0.0, f32::INFINITY, 0.0), 1.0);
        assert_eq!(s.validate(), Err(ConfigError::NonFinite("gravity")));
    }

    #[test]
    fn test_emission_period() {
        let s = EmitterSettings::default().with_emission(4.0, 10);
        assert_eq!(s.emission_period(), 0.25);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let s = EmitterSettings::from_json(r#"{ "max_life": 2.5, "emission_rate": 50.0 }"#).unwrap();
        assert_eq!(s.max_life, 2.5);
        assert_eq!(s.emission_rate, 50.0);
        assert_eq!(s.max_particles, EmitterSettings::default().max_particles);
        assert_eq!(s.max_emission, UNBOUNDED_EMISSION);
    }

    #[test]
    fn test_json_round_trip_show() {
        let show = ShowSettings::default();
        let json = serde_json::to_string(&show).unwrap();
        assert_eq!(ShowSettings::from_json(&json).unwrap(), show);
    }

    #[test]
    fn test_json_malformed() {
        assert!(matches!(
            EmitterSettings::from_json("{ not json"),
            Err(EngineError::Settings(_))
        ));
    }
}

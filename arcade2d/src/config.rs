//! Framework-wide defaults handed to the world and emitters at construction.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::math::Vec2;

/// Defaults applied to newly attached bodies and newly created emitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    /// Upper bound on live particles per emitter
    pub max_emitter_particles: usize,
    /// Initial per-axis velocity clamp for new bodies
    pub default_max_velocity: Vec2,
    /// Initial angular velocity clamp for new bodies
    pub default_max_angular_velocity: f32,
    /// Sides new bodies may collide on
    pub default_allow_collide: Direction,
    /// Gravity given to new bodies
    pub default_gravity: Vec2,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            max_emitter_particles: 100,
            default_max_velocity: Vec2::new(10_000.0, 10_000.0),
            default_max_angular_velocity: 1_000.0,
            default_allow_collide: Direction::ALL,
            default_gravity: Vec2::ZERO,
        }
    }
}

impl ArcadeConfig {
    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this config as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn with_max_emitter_particles(mut self, max: usize) -> Self {
        self.max_emitter_particles = max;
        self
    }

    #[must_use]
    pub fn with_default_max_velocity(mut self, max_velocity: Vec2) -> Self {
        self.default_max_velocity = max_velocity;
        self
    }

    #[must_use]
    pub fn with_default_gravity(mut self, gravity: Vec2) -> Self {
        self.default_gravity = gravity;
        self
    }
}

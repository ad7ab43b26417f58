//! Error types for bodies, sprites, and the world.

use thiserror::Error;

use crate::world::EntityId;

/// Errors surfaced by the kinematic body and the containers around it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BodyError {
    /// Body attached to an entity with a non-positive size
    #[error("Invalid body size {width}x{height}: both dimensions must be positive")]
    InvalidSize { width: f32, height: f32 },

    /// A max velocity component was negative
    #[error("Max velocity must be non-negative, got {0}")]
    NegativeMaxVelocity(f32),

    /// Timestep was negative or not finite
    #[error("Timestep must be a finite, non-negative number of seconds, got {0}")]
    NegativeTimestep(f32),

    /// Body no longer has an owning entity
    #[error("Body is detached from its entity")]
    Detached,

    /// Entity not present in the world
    #[error("Unknown entity {0:?}")]
    UnknownEntity(EntityId),

    /// Animation name not registered on the sprite
    #[error("Unknown animation {0}")]
    UnknownAnimation(String),

    /// Animation registered without frames
    #[error("Animation {0} has no frames")]
    EmptyAnimation(String),
}

/// Result type for body and world operations
pub type Result<T> = std::result::Result<T, BodyError>;

/// Reject negative or non-finite timesteps.
pub(crate) fn check_timestep(dt: f32) -> Result<()> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(())
    } else {
        Err(BodyError::NegativeTimestep(dt))
    }
}

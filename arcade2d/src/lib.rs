//! Arcade2D - sprites, particle emission, and entity physics for 2D games.
//!
//! Bodies come in two flavours: arcade-style kinematic bodies integrated by
//! this crate, and rigid bodies simulated by rapier2d.

pub mod body;
pub mod clock;
pub mod config;
pub mod direction;
pub mod error;
pub mod math;
pub mod particles;
pub mod pool;
pub mod rigid;
pub mod sprite;
pub mod visual;
pub mod world;

pub use crate::body::{integrate_axis, BodyType, KinematicBody, SolveType};
pub use crate::clock::Clock;
pub use crate::config::ArcadeConfig;
pub use crate::direction::Direction;
pub use crate::error::{BodyError, Result};
pub use crate::math::{Rectangle, Vec2};
pub use crate::particles::{EmitterSettings, Particle, ParticleEmitter};
pub use crate::pool::{BodyHandle, BodyPool};
pub use crate::rigid::{
    CollisionType, HitArea, PhysicsEvent, RigidBodySystem, RigidConfig, RigidDesc,
};
pub use crate::sprite::{Animation, Sprite, TextureHandle};
pub use crate::visual::Visual;
pub use crate::world::{CollisionPass, EntityId, NoCollisions, World};

//! Arcade-style kinematic body.
//!
//! A lightweight motion model for axis-aligned boxes that runs independently of
//! the rigid-body engine. Each step re-reads the owning visual's transform,
//! integrates gravity, acceleration and drag, then writes the result back.

use serde::{Deserialize, Serialize};

use crate::config::ArcadeConfig;
use crate::direction::Direction;
use crate::error::{check_timestep, BodyError, Result};
use crate::math::{clamp, Rectangle, Vec2};
use crate::visual::Visual;
use crate::world::EntityId;

/// Whether the integrator moves the body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Only moved by explicit position writes on the owning entity.
    Static,
    #[default]
    Dynamic,
}

/// Strategy hint for collision resolvers. The integrator ignores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveType {
    #[default]
    Displace,
    Overlap,
}

/// Advance one velocity component by `dt` seconds.
///
/// Acceleration wins over drag for the tick. Drag decelerates toward zero and
/// never crosses it; its sign is ignored. A non-zero result is clamped into
/// `[-max_velocity, max_velocity]`. Used for the x, y and angular axes.
pub fn integrate_axis(
    dt: f32,
    velocity: f32,
    acceleration: f32,
    drag: f32,
    max_velocity: f32,
) -> Result<f32> {
    check_timestep(dt)?;
    check_max(max_velocity)?;
    Ok(compute_velocity(dt, velocity, acceleration, drag, max_velocity))
}

fn compute_velocity(dt: f32, mut velocity: f32, acceleration: f32, drag: f32, max: f32) -> f32 {
    let drag = drag.abs() * dt;

    if acceleration != 0.0 {
        velocity += acceleration * dt;
    } else if drag != 0.0 {
        if velocity - drag > 0.0 {
            velocity -= drag;
        } else if velocity + drag < 0.0 {
            velocity += drag;
        } else {
            velocity = 0.0;
        }
    }

    if velocity != 0.0 {
        velocity = clamp(velocity, -max, max);
    }

    velocity
}

fn check_max(max: f32) -> Result<()> {
    if max >= 0.0 {
        Ok(())
    } else {
        Err(BodyError::NegativeMaxVelocity(max))
    }
}

/// Per-entity physics state for the arcade integrator.
///
/// `touching` and `overlap` belong to collision code: it writes them after
/// [`step`](Self::step) has reset them and before the next step runs.
/// `bounce` and `solve_type` are carried for resolvers and never read here.
#[derive(Clone, Debug)]
pub struct KinematicBody {
    /// Top-left corner of the bounding rectangle.
    pub x: f32,
    pub y: f32,
    width: f32,
    height: f32,
    /// Radians.
    pub rotation: f32,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub drag: Vec2,
    pub gravity: Vec2,
    pub bounce: Vec2,
    pub max_velocity: Vec2,
    /// Body offset relative to the anchor-corrected entity corner.
    pub offset: Vec2,
    pub scale: Vec2,

    pub angular_velocity: f32,
    pub angular_acceleration: f32,
    pub angular_drag: f32,
    pub max_angular_velocity: f32,

    pub mass: f32,
    /// When false the entity's angle is never overwritten.
    pub allow_rotation: bool,
    pub body_type: BodyType,
    pub solve_type: SolveType,

    pub allow_collide: Direction,
    pub touching: Direction,
    was_touching: Direction,
    /// Penetration depth written by collision code.
    pub overlap: Vec2,

    last_position: Vec2,
    // visual position and body corner captured by the last sync; write-back
    // publishes the displacement from here rather than re-deriving the anchor
    sync_origin: Vec2,
    synced_position: Vec2,
    attached: bool,
    entity: Option<EntityId>,
}

impl KinematicBody {
    /// Create a body for `visual`, taking its current size and transform.
    ///
    /// Fails if the visual has a non-positive dimension or the config's default
    /// max velocities are negative.
    pub fn new<V: Visual + ?Sized>(visual: &V, config: &ArcadeConfig) -> Result<Self> {
        let size = visual.size();
        check_size(size)?;
        check_max(config.default_max_velocity.x)?;
        check_max(config.default_max_velocity.y)?;
        check_max(config.default_max_angular_velocity)?;

        let mut body = Self {
            x: 0.0,
            y: 0.0,
            width: size.x,
            height: size.y,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            gravity: config.default_gravity,
            bounce: Vec2::ZERO,
            max_velocity: config.default_max_velocity,
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            angular_drag: 0.0,
            max_angular_velocity: config.default_max_angular_velocity,
            mass: 1.0,
            allow_rotation: true,
            body_type: BodyType::Dynamic,
            solve_type: SolveType::Displace,
            allow_collide: config.default_allow_collide,
            touching: Direction::NONE,
            was_touching: Direction::NONE,
            overlap: Vec2::ZERO,
            last_position: Vec2::ZERO,
            sync_origin: Vec2::ZERO,
            synced_position: Vec2::ZERO,
            attached: true,
            entity: None,
        };
        body.reset_to(visual);
        Ok(body)
    }

    #[must_use]
    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }

    /// Position at the start of the most recent step.
    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    /// Entity this body belongs to, when owned by a [`World`](crate::world::World).
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn set_entity(&mut self, entity: EntityId) {
        self.entity = Some(entity);
    }

    /// Sever the body from its entity. Further steps fail with [`BodyError::Detached`].
    pub(crate) fn detach(&mut self) {
        self.attached = false;
        self.entity = None;
    }

    /// Take a new size from the visual, for entities that resize.
    pub fn resize_from<V: Visual + ?Sized>(&mut self, visual: &V) -> Result<()> {
        let size = visual.size();
        check_size(size)?;
        self.width = size.x;
        self.height = size.y;
        Ok(())
    }

    /// Snap to the visual's transform and clear position history, so the next
    /// displacement query reports zero.
    pub fn reset_to<V: Visual + ?Sized>(&mut self, visual: &V) {
        self.sync_from_visual(visual);
        self.last_position = self.position();
    }

    /// Advance the body by `dt` seconds against its owning visual.
    ///
    /// A zero `dt` still shifts touch history and re-syncs, but moves nothing.
    pub fn step<V: Visual + ?Sized>(&mut self, dt: f32, visual: &mut V) -> Result<()> {
        if !self.attached {
            return Err(BodyError::Detached);
        }
        check_timestep(dt)?;
        self.check_limits()?;

        self.was_touching = self.touching;
        self.touching = Direction::NONE;
        self.last_position = self.position();

        self.sync_from_visual(visual);

        if self.body_type == BodyType::Static {
            return Ok(());
        }

        if dt > 0.0 {
            self.update_motion(dt);
        }

        self.sync_visual(visual);

        log::trace!(
            "body {:?} stepped to ({}, {}) v=({}, {})",
            self.entity,
            self.x,
            self.y,
            self.velocity.x,
            self.velocity.y
        );
        Ok(())
    }

    /// Fails if any velocity clamp is negative.
    pub fn check_limits(&self) -> Result<()> {
        check_max(self.max_velocity.x)?;
        check_max(self.max_velocity.y)?;
        check_max(self.max_angular_velocity)
    }

    fn update_motion(&mut self, dt: f32) {
        self.velocity += self.gravity * dt;

        self.angular_velocity = half_step(
            dt,
            self.angular_velocity,
            self.angular_acceleration,
            self.angular_drag,
            self.max_angular_velocity,
        );
        self.rotation += self.angular_velocity * dt;

        self.velocity.x = half_step(
            dt,
            self.velocity.x,
            self.acceleration.x,
            self.drag.x,
            self.max_velocity.x,
        );
        self.x += self.velocity.x * dt;

        self.velocity.y = half_step(
            dt,
            self.velocity.y,
            self.acceleration.y,
            self.drag.y,
            self.max_velocity.y,
        );
        self.y += self.velocity.y * dt;
    }

    /// Pull position and rotation from the owning visual.
    pub fn sync_from_visual<V: Visual + ?Sized>(&mut self, visual: &V) {
        let origin = visual.position();
        let corner = origin - visual.anchor().mul_elem(self.size()) + self.offset;
        self.x = corner.x;
        self.y = corner.y;
        self.rotation = visual.angle();
        self.sync_origin = origin;
        self.synced_position = corner;
    }

    /// Push position (and rotation, if allowed) back to the owning visual.
    ///
    /// The visual is moved by the body's displacement since the last
    /// `sync_from_visual`, so a body that did not move hands back the exact
    /// position it read. Calling this repeatedly without an intervening sync
    /// always writes the same value.
    ///
    /// Collision resolvers that move a body call this to publish the
    /// correction; the next step otherwise re-reads the visual.
    pub fn sync_visual<V: Visual + ?Sized>(&self, visual: &mut V) {
        visual.set_position(self.sync_origin + (self.position() - self.synced_position));
        if self.allow_rotation {
            visual.set_angle(self.rotation);
        }
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn delta_x(&self) -> f32 {
        self.x - self.last_position.x
    }

    pub fn delta_y(&self) -> f32 {
        self.y - self.last_position.y
    }

    pub fn delta(&self) -> Vec2 {
        self.position() - self.last_position
    }

    /// Touch flags from the previous tick.
    pub fn was_touching(&self) -> Direction {
        self.was_touching
    }

    pub fn is_touching(&self, dir: Direction) -> bool {
        self.touching.intersects(dir)
    }

    /// Whether collision code may correct this body on `dir`.
    pub fn allows_collision(&self, dir: Direction) -> bool {
        self.allow_collide.intersects(dir)
    }

    /// Contact on `dir` started this tick.
    pub fn just_touched(&self, dir: Direction) -> bool {
        self.touching
            .entered_since(self.was_touching)
            .intersects(dir)
    }

    /// Contact on `dir` ended this tick.
    pub fn just_separated(&self, dir: Direction) -> bool {
        self.touching
            .exited_since(self.was_touching)
            .intersects(dir)
    }

    /// `(entered, exited)` sides relative to the previous tick.
    pub fn touch_changes(&self) -> (Direction, Direction) {
        (
            self.touching.entered_since(self.was_touching),
            self.touching.exited_since(self.was_touching),
        )
    }
}

// The body moves at the mean of its old and new velocity for the tick.
fn half_step(dt: f32, old: f32, acceleration: f32, drag: f32, max: f32) -> f32 {
    let new = compute_velocity(dt, old, acceleration, drag, max);
    let averaged = old + (new - old) / 2.0;
    clamp(averaged, -max, max)
}

fn check_size(size: Vec2) -> Result<()> {
    if size.x > 0.0 && size.y > 0.0 {
        Ok(())
    } else {
        Err(BodyError::InvalidSize {
            width: size.x,
            height: size.y,
        })
    }
}

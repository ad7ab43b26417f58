// arcade2d/src/rigid.rs
//! Rigid-body physics for sprites, backed by rapier2d.
//!
//! Sprites are positioned by their anchor while rapier bodies are positioned by
//! their centre; this module converts between the two in both directions.

use anyhow::{anyhow, ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::{Rectangle, Vec2};
use crate::sprite::Sprite;
use crate::world::{EntityId, World};

// Rapier is private implementation detail: do NOT re-export it.
use rapier2d::prelude::*;

/// Which collision group a sprite's shape belongs to.
///
/// Tiles never report collisions with other tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionType {
    #[default]
    Sprite,
    Tile,
}

/// Collision area, relative to the sprite's top-left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitArea {
    Rectangle(Rectangle),
    Circle { radius: f32 },
    /// Convex polygon.
    Polygon(Vec<Vec2>),
}

/// How a sprite enters the rigid-body simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidDesc {
    /// `f32::INFINITY` creates an immovable body.
    pub mass: f32,
    pub friction: f32,
    /// Velocity decay per second; keeps top-down sprites from gliding forever.
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub hit_area: Option<HitArea>,
    pub collision_type: CollisionType,
}

impl Default for RigidDesc {
    fn default() -> Self {
        Self {
            mass: 1.0,
            friction: 0.1,
            linear_damping: 1.0,
            angular_damping: 1.0,
            hit_area: None,
            collision_type: CollisionType::Sprite,
        }
    }
}

impl RigidDesc {
    pub fn tile() -> Self {
        Self {
            mass: f32::INFINITY,
            collision_type: CollisionType::Tile,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    #[must_use]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    #[must_use]
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    #[must_use]
    pub fn with_hit_area(mut self, hit_area: HitArea) -> Self {
        self.hit_area = Some(hit_area);
        self
    }
}

/// Rigid-body world settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidConfig {
    pub gravity: Vec2,
    /// Penetration allowed between shapes before correction kicks in.
    pub collision_slop: f32,
}

impl Default for RigidConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 9.87),
            collision_slop: 0.1,
        }
    }
}

/// Engine-facing collision event. Uses EntityId only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsEvent {
    CollisionBegin { a: EntityId, b: EntityId },
}

/// Optional callback for physics events.
pub type PhysicsEventCallback = Box<dyn Fn(PhysicsEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct RigidEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    size: Vec2,
    anchor: Vec2,
    collision_type: CollisionType,
}

pub struct RigidBodySystem {
    // --- rapier internals ---
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    // Event channels
    event_recv_collision: crossbeam_channel::Receiver<CollisionEvent>,
    _event_recv_contact_force: crossbeam_channel::Receiver<ContactForceEvent>,
    event_handler: ChannelEventCollector,

    // --- mappings (engine <-> rapier) ---
    entries: HashMap<EntityId, RigidEntry>,
    body_to_entity: HashMap<RigidBodyHandle, EntityId>,

    gravity: Vec2,

    pending_events: Vec<PhysicsEvent>,
    callbacks: Vec<PhysicsEventCallback>,
}

impl Default for RigidBodySystem {
    fn default() -> Self {
        Self::new(RigidConfig::default())
    }
}

impl RigidBodySystem {
    pub fn new(config: RigidConfig) -> Self {
        let (send_col, recv_col) = crossbeam_channel::unbounded();
        let (send_force, recv_force) = crossbeam_channel::unbounded();
        let event_handler = ChannelEventCollector::new(send_col, send_force);

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.allowed_linear_error = config.collision_slop;

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),

            event_recv_collision: recv_col,
            _event_recv_contact_force: recv_force,
            event_handler,

            entries: HashMap::new(),
            body_to_entity: HashMap::new(),

            gravity: config.gravity,
            pending_events: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(PhysicsEvent) + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Return true if an entity currently has a rigid body.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Put a sprite into the simulation. Adding the same entity twice is a no-op.
    pub fn add(&mut self, entity: EntityId, sprite: &Sprite, desc: RigidDesc) -> Result<()> {
        if self.entries.contains_key(&entity) {
            return Ok(());
        }
        ensure!(
            sprite.size.x > 0.0 && sprite.size.y > 0.0,
            "sprite {:?} has no area ({}x{})",
            entity,
            sprite.size.x,
            sprite.size.y
        );
        ensure!(desc.mass > 0.0, "mass must be positive, got {}", desc.mass);
        check_damping(desc.linear_damping, desc.angular_damping)?;

        let fixed = desc.mass.is_infinite();
        let rb_type = if fixed {
            RigidBodyType::Fixed
        } else {
            RigidBodyType::Dynamic
        };

        let center = to_center(sprite.position, sprite.size, sprite.anchor);
        let mut builder = RigidBodyBuilder::new(rb_type)
            .translation(vector![center.x, center.y])
            .rotation(sprite.angle);

        // Enable CCD for dynamic bodies to prevent tunneling through thin colliders
        if !fixed {
            builder = builder
                .ccd_enabled(true)
                .linear_damping(desc.linear_damping)
                .angular_damping(desc.angular_damping);
        }
        let body = self.rigid_bodies.insert(builder.build());

        let (shape, offset) = self.shape_for(sprite.size, desc.hit_area.as_ref());
        let mut collider = ColliderBuilder::new(shape)
            .translation(vector![offset.x, offset.y])
            .friction(desc.friction)
            .restitution(0.0)
            .active_events(ActiveEvents::COLLISION_EVENTS);
        if !fixed {
            collider = collider.density(desc.mass / (sprite.size.x * sprite.size.y));
        }
        let collider =
            self.colliders
                .insert_with_parent(collider.build(), body, &mut self.rigid_bodies);

        self.entries.insert(
            entity,
            RigidEntry {
                body,
                collider,
                size: sprite.size,
                anchor: sprite.anchor,
                collision_type: desc.collision_type,
            },
        );
        self.body_to_entity.insert(body, entity);
        log::debug!("added rigid body for {:?} (fixed: {})", entity, fixed);
        Ok(())
    }

    /// Remove a body (and its collider) for an entity. Returns whether one existed.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        if let Some(entry) = self.entries.remove(&entity) {
            self.rigid_bodies.remove(
                entry.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
            self.body_to_entity.remove(&entry.body);
            true
        } else {
            false
        }
    }

    /// Change the mass of a movable body.
    pub fn set_mass(&mut self, entity: EntityId, mass: f32) -> Result<()> {
        ensure!(
            mass > 0.0 && mass.is_finite(),
            "mass must be positive and finite, got {}",
            mass
        );
        let entry = self.entry(entity)?;
        let collider = self
            .colliders
            .get_mut(entry.collider)
            .ok_or_else(|| anyhow!("collider for {:?} is gone", entity))?;
        collider.set_density(mass / (entry.size.x * entry.size.y));
        Ok(())
    }

    /// Change how quickly a body's linear and angular velocity decay.
    pub fn set_damping(&mut self, entity: EntityId, linear: f32, angular: f32) -> Result<()> {
        check_damping(linear, angular)?;
        let b = self
            .body_mut(entity)
            .ok_or_else(|| anyhow!("Entity {:?} has no rigid body", entity))?;
        b.set_linear_damping(linear);
        b.set_angular_damping(angular);
        Ok(())
    }

    pub fn set_velocity(&mut self, entity: EntityId, vel: Vec2) {
        if let Some(b) = self.body_mut(entity) {
            b.set_linvel(vector![vel.x, vel.y], true);
        }
    }

    /// Move a body so its sprite would sit at `pos` (anchor point).
    pub fn set_position(&mut self, entity: EntityId, pos: Vec2) {
        let Some(entry) = self.entries.get(&entity).copied() else {
            log::warn!("set_position on {:?} without a rigid body", entity);
            return;
        };
        let center = to_center(pos, entry.size, entry.anchor);
        if let Some(b) = self.rigid_bodies.get_mut(entry.body) {
            b.set_translation(vector![center.x, center.y], true);
        }
    }

    pub fn set_rotation(&mut self, entity: EntityId, rads: f32) {
        if let Some(b) = self.body_mut(entity) {
            b.set_rotation(rads, true);
        }
    }

    pub fn velocity(&self, entity: EntityId) -> Option<Vec2> {
        let entry = self.entries.get(&entity)?;
        let v = self.rigid_bodies.get(entry.body)?.linvel();
        Some(Vec2::new(v.x, v.y))
    }

    /// Step the simulation by `dt` seconds and copy transforms back to sprites.
    pub fn update(&mut self, dt: f32, world: &mut World) -> Result<()> {
        ensure!(
            dt.is_finite() && dt >= 0.0,
            "timestep must be non-negative, got {}",
            dt
        );
        if dt == 0.0 {
            return Ok(());
        }
        self.integration_parameters.dt = dt;

        let gravity = vector![self.gravity.x, self.gravity.y];
        let hooks = &();

        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            hooks,
            &self.event_handler,
        );

        for (&entity, entry) in &self.entries {
            let Some(body) = self.rigid_bodies.get(entry.body) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }
            let Some(sprite) = world.sprite_mut(entity) else {
                log::warn!("rigid body for {:?} outlived its sprite", entity);
                continue;
            };
            let t = body.translation();
            sprite.position = from_center(Vec2::new(t.x, t.y), entry.size, entry.anchor);
            sprite.angle = body.rotation().angle();
        }

        self.collect_events();
        Ok(())
    }

    /// Drain physics events collected since last step.
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ------------------------------
    // Private helpers
    // ------------------------------

    fn entry(&self, entity: EntityId) -> Result<RigidEntry> {
        self.entries
            .get(&entity)
            .copied()
            .ok_or_else(|| anyhow!("Entity {:?} has no rigid body", entity))
    }

    fn body_mut(&mut self, entity: EntityId) -> Option<&mut RigidBody> {
        let h = self.entries.get(&entity)?.body;
        self.rigid_bodies.get_mut(h)
    }

    // Shape plus its offset from the body centre.
    fn shape_for(&self, size: Vec2, hit: Option<&HitArea>) -> (SharedShape, Vec2) {
        let half = size / 2.0;
        match hit {
            Some(HitArea::Rectangle(r)) => (
                SharedShape::cuboid(r.width / 2.0, r.height / 2.0),
                r.center() - half,
            ),
            Some(HitArea::Circle { radius }) => (SharedShape::ball(*radius), Vec2::ZERO),
            Some(HitArea::Polygon(points)) => {
                let pts: Vec<Point<Real>> = points
                    .iter()
                    .map(|p| point![p.x - half.x, p.y - half.y])
                    .collect();
                match SharedShape::convex_hull(&pts) {
                    Some(shape) => (shape, Vec2::ZERO),
                    None => {
                        log::warn!("degenerate hit polygon, falling back to a box");
                        (SharedShape::cuboid(half.x, half.y), Vec2::ZERO)
                    }
                }
            }
            None => (SharedShape::cuboid(half.x, half.y), Vec2::ZERO),
        }
    }

    fn collect_events(&mut self) {
        while let Ok(ev) = self.event_recv_collision.try_recv() {
            if let CollisionEvent::Started(c1, c2, _) = ev {
                if let Some((a, b)) = self.map_pair(c1, c2) {
                    self.push_event(PhysicsEvent::CollisionBegin { a, b });
                }
            }
        }
    }

    fn map_pair(&self, c1: ColliderHandle, c2: ColliderHandle) -> Option<(EntityId, EntityId)> {
        let b1 = self.colliders.get(c1)?.parent()?;
        let b2 = self.colliders.get(c2)?.parent()?;
        let e1 = *self.body_to_entity.get(&b1)?;
        let e2 = *self.body_to_entity.get(&b2)?;

        let t1 = self.entries.get(&e1)?.collision_type;
        let t2 = self.entries.get(&e2)?.collision_type;
        reports_collision(t1, t2).then_some((e1, e2))
    }

    fn push_event(&mut self, e: PhysicsEvent) {
        for cb in &self.callbacks {
            cb(e);
        }
        self.pending_events.push(e);
    }
}

/// Sprite–sprite and sprite–tile contacts are reported; tile–tile are not.
pub fn reports_collision(a: CollisionType, b: CollisionType) -> bool {
    a == CollisionType::Sprite || b == CollisionType::Sprite
}

fn to_center(position: Vec2, size: Vec2, anchor: Vec2) -> Vec2 {
    position - anchor.mul_elem(size) + size / 2.0
}

fn from_center(center: Vec2, size: Vec2, anchor: Vec2) -> Vec2 {
    center + anchor.mul_elem(size) - size / 2.0
}

fn check_damping(linear: f32, angular: f32) -> Result<()> {
    ensure!(
        linear >= 0.0 && linear.is_finite() && angular >= 0.0 && angular.is_finite(),
        "damping must be non-negative, got {} / {}",
        linear,
        angular
    );
    Ok(())
}

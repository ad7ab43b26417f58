use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::body::{BodyType, KinematicBody};
use crate::config::ArcadeConfig;
use crate::error::{check_timestep, BodyError, Result};
use crate::pool::{BodyHandle, BodyPool};
use crate::sprite::Sprite;

/// Unique identifier for an entity in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Get the underlying integer ID (useful for debugging or serialization).
    pub fn to_u32(self) -> u32 {
        self.0
    }
}

/// Collision resolution run after every body has been integrated.
///
/// The pass is the only writer of `touching` and `overlap` during a tick.
/// A resolver moves a body by editing its position; the world publishes the
/// result to the sprite once the pass returns.
pub trait CollisionPass {
    fn resolve(&mut self, bodies: &mut BodyPool);
}

impl<F> CollisionPass for F
where
    F: FnMut(&mut BodyPool),
{
    fn resolve(&mut self, bodies: &mut BodyPool) {
        self(bodies)
    }
}

/// Collision pass that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCollisions;

impl CollisionPass for NoCollisions {
    fn resolve(&mut self, _bodies: &mut BodyPool) {}
}

/// Sprites plus the pool of kinematic bodies attached to them.
///
/// - Entities are identified by `EntityId`
/// - Each sprite owns at most one `BodyHandle` into the pool
/// - `step` runs integration for every body before any collision code
pub struct World {
    config: ArcadeConfig,
    next_id: u32,
    sprites: HashMap<EntityId, Sprite>,
    bodies: BodyPool,
}

impl World {
    pub fn new(config: ArcadeConfig) -> Self {
        Self {
            config,
            next_id: 1,
            sprites: HashMap::new(),
            bodies: BodyPool::new(),
        }
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    /// Add a sprite and return its `EntityId`.
    pub fn spawn(&mut self, mut sprite: Sprite) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        sprite.body = None;
        self.sprites.insert(id, sprite);
        id
    }

    /// Remove an entity, detaching its body if it has one.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let Some(sprite) = self.sprites.remove(&entity) else {
            return false;
        };
        if let Some(handle) = sprite.body {
            self.bodies.remove(handle);
        }
        log::debug!("despawned {:?}", entity);
        true
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.sprites.contains_key(&entity)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Attach a kinematic body to an entity, built from its current sprite.
    ///
    /// Returns the existing handle if the entity already has one.
    pub fn enable_body(&mut self, entity: EntityId) -> Result<BodyHandle> {
        let sprite = self
            .sprites
            .get_mut(&entity)
            .ok_or(BodyError::UnknownEntity(entity))?;

        if let Some(handle) = sprite.body {
            if self.bodies.contains(handle) {
                return Ok(handle);
            }
        }

        let mut body = KinematicBody::new(&*sprite, &self.config)?;
        body.set_entity(entity);
        let handle = self.bodies.insert(body);
        sprite.body = Some(handle);
        log::debug!("attached body {:?} to {:?}", handle, entity);
        Ok(handle)
    }

    /// Detach and return an entity's body. The returned body can no longer step.
    pub fn disable_body(&mut self, entity: EntityId) -> Option<KinematicBody> {
        let handle = self.sprites.get_mut(&entity)?.body.take()?;
        log::debug!("detached body {:?} from {:?}", handle, entity);
        self.bodies.remove(handle)
    }

    pub fn sprite(&self, entity: EntityId) -> Option<&Sprite> {
        self.sprites.get(&entity)
    }

    pub fn sprite_mut(&mut self, entity: EntityId) -> Option<&mut Sprite> {
        self.sprites.get_mut(&entity)
    }

    pub fn body(&self, entity: EntityId) -> Option<&KinematicBody> {
        let handle = self.sprites.get(&entity)?.body?;
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, entity: EntityId) -> Option<&mut KinematicBody> {
        let handle = self.sprites.get(&entity)?.body?;
        self.bodies.get_mut(handle)
    }

    pub fn sprites(&self) -> impl Iterator<Item = (EntityId, &Sprite)> {
        self.sprites.iter().map(|(&id, sprite)| (id, sprite))
    }

    pub fn bodies(&self) -> &BodyPool {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut BodyPool {
        &mut self.bodies
    }

    /// Advance every body by `dt`, then run `pass` over the whole pool.
    ///
    /// All bodies have their touch flags reset before the pass sees any of
    /// them. Positions left on bodies by the pass are written back to the
    /// sprites afterwards. Fails before touching any body if `dt` is negative
    /// or a body has a negative velocity clamp.
    pub fn step<P: CollisionPass + ?Sized>(&mut self, dt: f32, pass: &mut P) -> Result<()> {
        check_timestep(dt)?;
        for (_, body) in self.bodies.iter() {
            body.check_limits()?;
        }

        for (entity, sprite) in self.sprites.iter_mut() {
            let Some(handle) = sprite.body else {
                continue;
            };
            match self.bodies.get_mut(handle) {
                Some(body) => body.step(dt, sprite)?,
                None => log::warn!("{:?} holds stale body handle {:?}", entity, handle),
            }
        }

        pass.resolve(&mut self.bodies);

        // displacement-based write-back: bodies the pass left alone republish
        // the value their step already wrote
        for sprite in self.sprites.values_mut() {
            let Some(body) = sprite.body.and_then(|h| self.bodies.get(h)) else {
                continue;
            };
            if body.body_type == BodyType::Dynamic {
                body.sync_visual(sprite);
            }
        }

        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(ArcadeConfig::default())
    }
}

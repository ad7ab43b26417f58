//! Generational arena holding every kinematic body in a world.

use crate::body::KinematicBody;

/// Stable reference to a body slot. Goes stale once the body is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Slot index (useful for debugging).
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<KinematicBody>,
}

/// Arena of [`KinematicBody`] values addressed by [`BodyHandle`].
///
/// Freed slots are reused; each reuse bumps the slot generation so handles to
/// the previous occupant no longer resolve.
#[derive(Debug, Default)]
pub struct BodyPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodyPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: KinematicBody) -> BodyHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    /// Remove a body, returning it detached from its entity.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<KinematicBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let mut body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;

        body.detach();
        Some(body)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&KinematicBody> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut KinematicBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &KinematicBody)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut KinematicBody)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.body.as_mut().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation,
                    },
                    body,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArcadeConfig;
    use crate::math::Vec2;
    use crate::sprite::Sprite;

    fn body() -> KinematicBody {
        let spr = Sprite::new(Vec2::ZERO, Vec2::new(4.0, 4.0));
        KinematicBody::new(&spr, &ArcadeConfig::default()).unwrap()
    }

    #[test]
    fn test_insert_get_remove() {
        let mut pool = BodyPool::new();
        let a = pool.insert(body());
        let b = pool.insert(body());
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(a));

        let removed = pool.remove(a).unwrap();
        assert!(!removed.is_attached());
        assert!(pool.get(a).is_none());
        assert!(pool.remove(a).is_none());
        assert!(pool.get(b).is_some());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut pool = BodyPool::new();
        let old = pool.insert(body());
        pool.remove(old);
        let new = pool.insert(body());

        assert_eq!(old.index(), new.index());
        assert!(pool.get(old).is_none());
        assert!(pool.get_mut(old).is_none());
        assert!(pool.get(new).is_some());
    }

    #[test]
    fn test_iteration_skips_free_slots() {
        let mut pool = BodyPool::new();
        let a = pool.insert(body());
        let b = pool.insert(body());
        let c = pool.insert(body());
        pool.remove(b);

        let handles: Vec<_> = pool.iter().map(|(h, _)| h).collect();
        assert_eq!(handles, vec![a, c]);

        for (_, body) in pool.iter_mut() {
            body.velocity.x = 3.0;
        }
        assert_eq!(pool.get(c).unwrap().velocity.x, 3.0);
    }
}

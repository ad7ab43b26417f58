use std::collections::HashMap;

use crate::error::{BodyError, Result};
use crate::math::{Rectangle, Vec2};
use crate::pool::BodyHandle;
use crate::visual::Visual;

/// Opaque handle used to reference textures owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// A named sequence of frames registered on a sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<TextureHandle>,
}

/// Base visual entity: a positioned, sized, anchored box with named animations.
///
/// The sprite owns an optional handle into the world's body pool rather than
/// the body itself; see [`World::enable_body`](crate::world::World::enable_body).
#[derive(Clone, Debug)]
pub struct Sprite {
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
    /// Fractional point of the bounding box that `position` refers to.
    pub anchor: Vec2,
    /// Rotation in radians.
    pub angle: f32,
    pub scale: Vec2,
    pub visible: bool,
    animations: HashMap<String, Animation>,
    current_animation: Option<String>,
    pub(crate) body: Option<BodyHandle>,
}

impl Sprite {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            name: String::new(),
            position,
            size,
            anchor: Vec2::ZERO,
            angle: 0.0,
            scale: Vec2::ONE,
            visible: true,
            animations: HashMap::new(),
            current_animation: None,
            body: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn set_position(&mut self, x: f32, y: f32) -> &mut Self {
        self.position.set(x, y);
        self
    }

    /// Handle of the kinematic body attached to this sprite, if any.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Register a named animation. Frames must not be empty.
    pub fn add_animation(
        &mut self,
        name: impl Into<String>,
        frames: Vec<TextureHandle>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if frames.is_empty() {
            return Err(BodyError::EmptyAnimation(name));
        }
        self.animations
            .insert(name.clone(), Animation { name, frames });
        Ok(self)
    }

    /// Make `name` the active animation, starting from its first frame.
    pub fn set_active_animation(&mut self, name: &str) -> Result<&mut Self> {
        if !self.animations.contains_key(name) {
            return Err(BodyError::UnknownAnimation(name.to_string()));
        }
        self.current_animation = Some(name.to_string());
        Ok(self)
    }

    pub fn is_active_animation(&self, name: &str) -> bool {
        self.current_animation.as_deref() == Some(name)
    }

    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    /// Texture a renderer shows when the active animation starts: its first
    /// frame. Frame advancement over time belongs to the renderer.
    pub fn current_frame(&self) -> Option<TextureHandle> {
        let name = self.current_animation.as_deref()?;
        self.animations.get(name)?.frames.first().copied()
    }

    /// Axis-aligned bounds with the anchor applied.
    pub fn bounds(&self) -> Rectangle {
        let top_left = self.position - self.anchor.mul_elem(self.size);
        Rectangle::new(top_left.x, top_left.y, self.size.x, self.size.y)
    }
}

impl Visual for Sprite {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn angle(&self) -> f32 {
        self.angle
    }

    fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    fn anchor(&self) -> Vec2 {
        self.anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_registry() {
        let mut spr = Sprite::new(Vec2::ZERO, Vec2::new(16.0, 16.0)).with_name("hero");
        spr.add_animation("walk-left", vec![TextureHandle(1), TextureHandle(2)])
            .unwrap()
            .add_animation("idle", vec![TextureHandle(3)])
            .unwrap();

        assert!(!spr.is_active_animation("walk-left"));
        assert_eq!(spr.current_frame(), None);

        spr.set_active_animation("walk-left").unwrap();
        assert!(spr.is_active_animation("walk-left"));
        assert_eq!(spr.current_frame(), Some(TextureHandle(1)));

        spr.set_active_animation("idle").unwrap();
        assert!(!spr.is_active_animation("walk-left"));
        assert_eq!(spr.current_frame(), Some(TextureHandle(3)));
    }

    #[test]
    fn test_animation_errors() {
        let mut spr = Sprite::new(Vec2::ZERO, Vec2::new(8.0, 8.0));
        assert_eq!(
            spr.add_animation("empty", Vec::new()).unwrap_err(),
            BodyError::EmptyAnimation("empty".into())
        );
        assert_eq!(
            spr.set_active_animation("missing").unwrap_err(),
            BodyError::UnknownAnimation("missing".into())
        );
    }

    #[test]
    fn test_bounds_respect_anchor() {
        let spr = Sprite::new(Vec2::new(50.0, 50.0), Vec2::new(20.0, 10.0))
            .with_anchor(Vec2::new(0.5, 1.0));
        assert_eq!(spr.bounds(), Rectangle::new(40.0, 40.0, 20.0, 10.0));
    }
}

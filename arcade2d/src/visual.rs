use crate::math::Vec2;

/// Transform surface a [`KinematicBody`](crate::body::KinematicBody) reads from and
/// writes back to every step.
///
/// `position` is the point selected by `anchor` (fractional, 0..1 per axis) on
/// the entity's bounding box.
pub trait Visual {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn size(&self) -> Vec2;
    /// Rotation in radians.
    fn angle(&self) -> f32;
    fn set_angle(&mut self, angle: f32);
    fn anchor(&self) -> Vec2;
}

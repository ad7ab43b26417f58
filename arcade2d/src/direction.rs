//! Directional bitmask shared by touch tracking and collision permissions.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Sides of a body. Used both for which sides may collide and which sides
    /// are currently in contact.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Direction: u8 {
        const LEFT = 0b0001;
        const RIGHT = 0b0010;
        const UP = 0b0100;
        const DOWN = 0b1000;
        const ALL = Self::LEFT.bits() | Self::RIGHT.bits() | Self::UP.bits() | Self::DOWN.bits();
    }
}

impl Direction {
    /// No side.
    pub const NONE: Self = Self::empty();

    /// Sides set in `self` that were not set in `previous`.
    pub fn entered_since(self, previous: Direction) -> Direction {
        self.difference(previous)
    }

    /// Sides set in `previous` that are no longer set in `self`.
    pub fn exited_since(self, previous: Direction) -> Direction {
        previous.difference(self)
    }
}

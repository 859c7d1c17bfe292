//! Collision notifications.
//!
//! [`pixel_collision_detector`](crate::systems::collision::pixel_collision_detector)
//! triggers a [`PixelCollisionEvent`] for every pair of entities whose opaque
//! pixels overlap. Observers decide what a hit means (bounce, damage,
//! despawn).
use bevy_ecs::prelude::*;

/// Two entities touched at pixel level.
///
/// `a` and `b` carry no ordering guarantee.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelCollisionEvent {
    pub a: Entity,
    pub b: Entity,
}

impl PixelCollisionEvent {
    pub fn involves(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }
}

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

/// Kinematic body. Velocity is in world units per second.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct RigidBody {
    pub velocity: Vector2,
    /// When set, [`movement`](crate::systems::movement::movement) leaves the
    /// entity alone.
    pub frozen: bool,
}

impl RigidBody {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self {
            velocity: Vector2::new(vx, vy),
            frozen: false,
        }
    }
}

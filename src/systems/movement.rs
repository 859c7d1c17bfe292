use bevy_ecs::prelude::*;

use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::resources::worldtime::WorldTime;

/// Integrate velocities into positions.
pub fn movement(mut query: Query<(&mut MapPosition, &RigidBody)>, time: Res<WorldTime>) {
    let dt = time.delta_seconds();
    for (mut position, body) in query.iter_mut() {
        if body.frozen {
            continue;
        }
        position.pos = position.pos + body.velocity.scale_by(dt);
    }
}

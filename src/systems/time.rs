//! Frame clock update.
//!
//! Runs once per frame, before the schedule, with the unscaled frame time
//! reported by the window backend.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Apply `time_scale` to `dt_ms` and publish it on [`WorldTime`].
pub fn update_world_time(world: &mut World, dt_ms: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled = dt_ms * wt.time_scale;
    wt.elapsed_ms += scaled;
    wt.delta_ms = scaled;
    wt.frame_count += 1;
}

//! Frame clock.
//!
//! Animation and timeline code works in milliseconds, so the clock keeps its
//! values in milliseconds as well.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Scaled time since start.
    pub elapsed_ms: f32,
    /// Scaled duration of the current frame.
    pub delta_ms: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta_ms / 1000.0
    }
}

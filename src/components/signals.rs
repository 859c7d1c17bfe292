//! Per-entity key/value blackboard.
//!
//! Animation frames publish their payload here (see
//! [`FrameSignal`](crate::components::animation::FrameSignal)) and timeline
//! callbacks receive it as their data, so gameplay systems can read values
//! like `"speed"` or `"fade"` without knowing where they came from.

use bevy_ecs::prelude::Component;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default, Component)]
pub struct Signals {
    pub scalars: FxHashMap<String, f32>,
    pub integers: FxHashMap<String, i32>,
    pub flags: FxHashSet<String>,
}

impl Signals {
    pub fn set_scalar(&mut self, key: impl Into<String>, value: f32) {
        self.scalars.insert(key.into(), value);
    }
    pub fn get_scalar(&self, key: &str) -> Option<f32> {
        self.scalars.get(key).copied()
    }
    pub fn set_integer(&mut self, key: impl Into<String>, value: i32) {
        self.integers.insert(key.into(), value);
    }
    pub fn get_integer(&self, key: &str) -> Option<i32> {
        self.integers.get(key).copied()
    }
    pub fn clear_integer(&mut self, key: &str) {
        self.integers.remove(key);
    }
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.flags.insert(key.into());
    }
    pub fn clear_flag(&mut self, key: &str) {
        self.flags.remove(key);
    }
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }
    /// Remove a flag, reporting whether it was set.
    pub fn take_flag(&mut self, key: &str) -> bool {
        self.flags.remove(key)
    }
}

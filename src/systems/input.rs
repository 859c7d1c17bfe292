//! Input polling.
//!
//! [`update_input_state`] reads the keyboard from raylib once per frame,
//! before the schedule runs, and writes the result into [`InputState`].
use bevy_ecs::prelude::*;
use raylib::RaylibHandle;

use crate::resources::input::InputState;

pub fn update_input_state(world: &mut World, rl: &RaylibHandle) {
    let mut input = world.resource_mut::<InputState>();
    for key in input.keys_mut() {
        let binding = key.key_binding;
        key.set(rl.is_key_down(binding));
    }
}

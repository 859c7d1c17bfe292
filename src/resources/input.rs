//! Per-frame keyboard input resource.
//!
//! Captures the handful of keys the demo scenes react to. Game code reads the
//! [`InputState`] resource instead of polling the window backend.
use bevy_ecs::prelude::*;
use raylib::prelude::KeyboardKey;

/// Boolean key state with an associated keyboard binding.
#[derive(Debug, Clone, Copy)]
pub struct BoolState {
    /// Whether the key is held this frame.
    pub active: bool,
    pub key_binding: KeyboardKey,
}

impl BoolState {
    pub fn new(key_binding: KeyboardKey) -> Self {
        Self {
            active: false,
            key_binding,
        }
    }

    /// Record this frame's key state.
    pub fn set(&mut self, down: bool) {
        self.active = down;
    }
}

#[derive(Resource, Debug, Clone)]
pub struct InputState {
    pub right: BoolState,
    pub action: BoolState,
    pub back: BoolState,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            right: BoolState::new(KeyboardKey::KEY_RIGHT),
            action: BoolState::new(KeyboardKey::KEY_SPACE),
            back: BoolState::new(KeyboardKey::KEY_ESCAPE),
        }
    }
}

impl InputState {
    pub fn keys_mut(&mut self) -> [&mut BoolState; 3] {
        [
            &mut self.right,
            &mut self.action,
            &mut self.back,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_is_polled_once() {
        let mut input = InputState::default();
        let bindings: Vec<i32> = input
            .keys_mut()
            .iter()
            .map(|k| k.key_binding as i32)
            .collect();
        assert_eq!(
            bindings,
            vec![
                KeyboardKey::KEY_RIGHT as i32,
                KeyboardKey::KEY_SPACE as i32,
                KeyboardKey::KEY_ESCAPE as i32
            ]
        );
        for key in input.keys_mut() {
            key.set(true);
        }
        assert!(input.right.active && input.action.active && input.back.active);
        input.back.set(false);
        assert!(!input.back.active);
    }
}

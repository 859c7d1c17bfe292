//! Loaded GPU textures keyed by string IDs.
//!
//! Textures must only be touched from the thread owning the raylib context,
//! so the store stays outside the `World`: the main loop owns it and lends it
//! to the [`RaylibCanvas`](crate::systems::render::RaylibCanvas) each frame.

use raylib::prelude::Texture2D;
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct TextureStore {
    pub map: FxHashMap<String, Texture2D>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, texture: Texture2D) {
        self.map.insert(key.into(), texture);
    }

    pub fn get(&self, key: &str) -> Option<&Texture2D> {
        self.map.get(key)
    }
}
